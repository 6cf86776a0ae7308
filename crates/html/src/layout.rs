//! Box layout of a styled fragment onto a slide.
//!
//! This is a deliberately small subset of CSS layout: block stacking,
//! single-line flex rows and columns, margins, padding, borders and
//! absolute positioning against the body. Text size is estimated from
//! average glyph widths; there are no font metrics.

use deck_core::units::px_to_pt;
use deck_core::{
    Error, Frame, Paragraph, Picture, RectShape, Result, Slide, SlideLayout, TextBox, TextCleaner,
    TextRun, VerticalAnchor,
};
use std::path::Path;

use crate::dom::{Element, Node};
use crate::images::{self, LoadedImage};
use crate::style::{Align, ComputedStyle, Display, Edges, FlexDirection, Length, Stylesheet};

/// CSS pixels per inch.
const PX_PER_INCH: f64 = 96.0;

/// Allowed relative difference between body and slide aspect ratios.
const ASPECT_TOLERANCE: f64 = 0.01;

/// Widen estimated single-line text so it does not wrap in the viewer.
const TEXT_WIDTH_SLACK: f64 = 1.08;

/// Elements that never produce slide content.
const SKIPPED_TAGS: &[&str] = &[
    "head", "script", "style", "template", "noscript", "meta", "link", "title",
];

/// Elements that can live inside a text box.
const PHRASING_TAGS: &[&str] = &[
    "a", "abbr", "b", "br", "code", "em", "i", "small", "span", "strong", "sub", "sup", "u",
];

/// Character formatting of one run.
#[derive(Debug, Clone, PartialEq)]
struct StyledRun {
    text: String,
    font_size: f64,
    bold: bool,
    italic: bool,
    color: Option<deck_core::Color>,
    font_family: Option<String>,
    link: Option<String>,
}

impl StyledRun {
    fn new(text: String, style: &ComputedStyle, link: Option<&str>) -> Self {
        Self {
            text,
            font_size: style.font_size,
            bold: style.bold,
            italic: style.italic,
            color: style.color,
            font_family: style.font_family.clone(),
            link: link.map(str::to_string),
        }
    }

    fn to_text_run(&self, scale: f64) -> TextRun {
        TextRun {
            text: self.text.clone(),
            size_pt: (px_to_pt(self.font_size * scale) * 2.0).round() / 2.0,
            bold: self.bold,
            italic: self.italic,
            color: self.color,
            font_face: self.font_family.clone(),
            link: self.link.clone(),
        }
    }

    /// Estimated advance of one character in px.
    fn glyph_width(&self, c: char) -> f64 {
        let em = match c {
            ' ' | '\u{a0}' => 0.28,
            'i' | 'l' | 'j' | 't' | 'f' | 'I' | '.' | ',' | ':' | ';' | '\'' | '|' | '!' => 0.3,
            'm' | 'w' | 'M' | 'W' => 0.85,
            c if c.is_uppercase() || c.is_ascii_digit() => 0.66,
            _ => 0.54,
        };
        let weight = if self.bold { 1.08 } else { 1.0 };
        em * weight * self.font_size
    }
}

type Runs = Vec<StyledRun>;

#[derive(Debug)]
enum Content {
    Children(Vec<LayoutBox>),
    Text(Vec<Runs>),
    Image { image: LoadedImage, alt: String },
}

/// A styled element ready for layout.
#[derive(Debug)]
struct LayoutBox {
    style: ComputedStyle,
    content: Content,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Rect {
    x: f64,
    y: f64,
    w: f64,
    h: f64,
}

/// Lay out `body` of a fragment and append the resulting shapes to `slide`.
pub fn layout_body(
    body: &Element,
    sheet: &Stylesheet,
    cleaner: &TextCleaner,
    layout: SlideLayout,
    base_dir: &Path,
    slide: &mut Slide,
) -> Result<()> {
    let builder = TreeBuilder {
        sheet,
        cleaner,
        base_dir,
    };
    let body_style = sheet.compute(body, &ComputedStyle::default());
    let (body_w, body_h) = body_size(&body_style, layout)?;
    let root = builder.build_container(body, body_style);

    let (slide_w_in, _) = layout.inches();
    let scale = slide_w_in * PX_PER_INCH / body_w;
    slide.background = root.style.background;

    let shapes_before = slide.shapes.len();
    let mut layouter = Layouter {
        slide,
        scale,
        body: Rect {
            x: 0.0,
            y: 0.0,
            w: body_w,
            h: body_h,
        },
    };
    let content = inset(inset(layouter.body, &root.style.border_widths()), &root.style.padding);
    if let Content::Children(children) = &root.content {
        layouter.place_children(&root.style, children, content, true);
    }

    let (_, slide_height) = layout.dimensions();
    let overflowing = slide.shapes[shapes_before..]
        .iter()
        .filter(|s| s.frame().bottom() > slide_height + 1)
        .count();
    if overflowing > 0 {
        log::warn!(
            "{} shape(s) extend past the bottom of the slide{}",
            overflowing,
            slide
                .source
                .as_ref()
                .map(|p| format!(" from {}", p.display()))
                .unwrap_or_default()
        );
    }
    log::debug!("Laid out {} shapes", slide.shapes.len() - shapes_before);

    Ok(())
}

/// Body size in px, checked against the slide's aspect ratio.
fn body_size(style: &ComputedStyle, layout: SlideLayout) -> Result<(f64, f64)> {
    let (slide_w_in, _) = layout.inches();
    let slide_aspect = layout.aspect_ratio();

    let width = match style.width {
        Some(Length::Px(w)) if w > 0.0 => w,
        _ => slide_w_in * PX_PER_INCH,
    };
    let height = match style.height {
        Some(h) if h > 0.0 => h,
        _ => width / slide_aspect,
    };

    let body_aspect = width / height;
    if ((body_aspect - slide_aspect) / slide_aspect).abs() > ASPECT_TOLERANCE {
        return Err(Error::LayoutError(format!(
            "body is {}x{}px (aspect {:.3}) but {} has aspect {:.3}",
            width,
            height,
            body_aspect,
            layout.name(),
            slide_aspect
        )));
    }

    Ok((width, height))
}

fn inset(rect: Rect, edges: &Edges) -> Rect {
    Rect {
        x: rect.x + edges.left,
        y: rect.y + edges.top,
        w: (rect.w - edges.horizontal()).max(0.0),
        h: (rect.h - edges.vertical()).max(0.0),
    }
}

/// Padding plus border on each side.
fn chrome(style: &ComputedStyle) -> Edges {
    let border = style.border_widths();
    Edges {
        top: style.padding.top + border.top,
        right: style.padding.right + border.right,
        bottom: style.padding.bottom + border.bottom,
        left: style.padding.left + border.left,
    }
}

fn is_phrasing(element: &Element) -> bool {
    PHRASING_TAGS.contains(&element.tag.as_str()) && element.child_elements().all(is_phrasing)
}

struct TreeBuilder<'a> {
    sheet: &'a Stylesheet,
    cleaner: &'a TextCleaner,
    base_dir: &'a Path,
}

impl TreeBuilder<'_> {
    fn build(&self, element: &Element, parent: &ComputedStyle) -> Option<LayoutBox> {
        if SKIPPED_TAGS.contains(&element.tag.as_str()) {
            return None;
        }
        let style = self.sheet.compute(element, parent);
        if style.display == Display::None {
            return None;
        }

        if element.tag == "img" {
            return self.build_image(element, style);
        }

        let is_text_leaf = element.child_elements().all(is_phrasing)
            && !element.text_content().trim().is_empty();
        if is_text_leaf {
            let paragraphs = self.collect_paragraphs(element, &style);
            if !paragraphs.is_empty() {
                return Some(LayoutBox {
                    style,
                    content: Content::Text(paragraphs),
                });
            }
        }

        Some(self.build_container(element, style))
    }

    fn build_container(&self, element: &Element, style: ComputedStyle) -> LayoutBox {
        let mut children = Vec::new();

        for node in &element.children {
            match node {
                Node::Element(child) => {
                    if let Some(child_box) = self.build(child, &style) {
                        children.push(child_box);
                    }
                }
                Node::Text(text) if !text.trim().is_empty() => {
                    // Loose text between blocks becomes its own box.
                    let anonymous = style.inherit_for("div");
                    let runs = tidy_runs(vec![StyledRun::new(
                        self.cleaner.clean_inline(text),
                        &anonymous,
                        None,
                    )]);
                    if !runs.is_empty() {
                        children.push(LayoutBox {
                            style: anonymous,
                            content: Content::Text(vec![runs]),
                        });
                    }
                }
                Node::Text(_) => {}
            }
        }

        LayoutBox {
            style,
            content: Content::Children(children),
        }
    }

    fn build_image(&self, element: &Element, style: ComputedStyle) -> Option<LayoutBox> {
        let src = element.attr("src").unwrap_or_default();
        let loaded = images::resolve_src(self.base_dir, src).and_then(|path| images::load(&path));

        match loaded {
            Ok(image) => Some(LayoutBox {
                style,
                content: Content::Image {
                    image,
                    alt: element.attr("alt").unwrap_or_default().to_string(),
                },
            }),
            Err(e) => {
                log::warn!("Skipping image '{}': {}", src, e);
                None
            }
        }
    }

    /// Split a text leaf into paragraphs of formatted runs at `<br>`.
    fn collect_paragraphs(&self, element: &Element, style: &ComputedStyle) -> Vec<Runs> {
        let mut paragraphs = vec![Runs::new()];
        self.collect_runs(element, style, None, &mut paragraphs);

        let mut paragraphs: Vec<Runs> = paragraphs.into_iter().map(tidy_runs).collect();
        while paragraphs.last().is_some_and(Vec::is_empty) {
            paragraphs.pop();
        }
        let leading = paragraphs.iter().take_while(|p| p.is_empty()).count();
        paragraphs.split_off(leading)
    }

    fn collect_runs(
        &self,
        element: &Element,
        style: &ComputedStyle,
        link: Option<&str>,
        paragraphs: &mut Vec<Runs>,
    ) {
        for node in &element.children {
            match node {
                Node::Text(text) => {
                    let mut text = self.cleaner.clean_inline(text);
                    if style.uppercase {
                        text = text.to_uppercase();
                    }
                    if let Some(current) = paragraphs.last_mut() {
                        current.push(StyledRun::new(text, style, link));
                    }
                }
                Node::Element(child) if child.tag == "br" => paragraphs.push(Runs::new()),
                Node::Element(child) => {
                    if SKIPPED_TAGS.contains(&child.tag.as_str()) {
                        continue;
                    }
                    let child_style = self.sheet.compute(child, style);
                    if child_style.display == Display::None {
                        continue;
                    }
                    let child_link = if child.tag == "a" {
                        child.attr("href").or(link)
                    } else {
                        link
                    };
                    self.collect_runs(child, &child_style, child_link, paragraphs);
                }
            }
        }
    }
}

/// Collapse spaces across run boundaries and trim the paragraph edges.
fn tidy_runs(runs: Runs) -> Runs {
    let mut tidy: Runs = Vec::with_capacity(runs.len());
    let mut after_space = true;

    for mut run in runs {
        if after_space {
            run.text = run.text.trim_start_matches(' ').to_string();
        }
        if run.text.is_empty() {
            continue;
        }
        after_space = run.text.ends_with(' ');
        tidy.push(run);
    }

    while let Some(last) = tidy.last_mut() {
        last.text = last.text.trim_end_matches(' ').to_string();
        if last.text.is_empty() {
            tidy.pop();
        } else {
            break;
        }
    }

    tidy
}

/// Width of the paragraphs if nothing wrapped.
fn max_content_width(paragraphs: &[Runs]) -> f64 {
    paragraphs
        .iter()
        .map(|runs| {
            runs.iter()
                .map(|r| r.text.chars().map(|c| r.glyph_width(c)).sum::<f64>())
                .sum::<f64>()
        })
        .fold(0.0, f64::max)
        * TEXT_WIDTH_SLACK
}

/// Height of the paragraphs greedily word-wrapped to `width`.
fn wrapped_height(paragraphs: &[Runs], style: &ComputedStyle, width: f64) -> f64 {
    paragraphs
        .iter()
        .map(|runs| {
            let font_size = runs
                .iter()
                .map(|r| r.font_size)
                .fold(0.0, f64::max);
            let font_size = if font_size > 0.0 { font_size } else { style.font_size };
            count_lines(runs, width) as f64 * font_size * style.line_height
        })
        .sum()
}

fn count_lines(runs: &[StyledRun], width: f64) -> usize {
    let mut lines = 1;
    let mut line_width = 0.0;
    let mut word_width = 0.0;
    let mut space_width = 0.0;

    let flush = |word_width: f64, space_width: f64, line_width: &mut f64, lines: &mut usize| {
        if word_width <= 0.0 {
            return;
        }
        if *line_width > 0.0 && *line_width + space_width + word_width > width {
            *lines += 1;
            *line_width = word_width;
        } else if *line_width > 0.0 {
            *line_width += space_width + word_width;
        } else {
            *line_width = word_width;
        }
    };

    for run in runs {
        for c in run.text.chars() {
            if c == ' ' {
                flush(word_width, space_width, &mut line_width, &mut lines);
                if word_width > 0.0 {
                    space_width = 0.0;
                }
                word_width = 0.0;
                space_width += run.glyph_width(c);
            } else {
                word_width += run.glyph_width(c);
            }
        }
    }
    flush(word_width, space_width, &mut line_width, &mut lines);

    lines
}

/// Places laid-out boxes as slide shapes.
struct Layouter<'s> {
    slide: &'s mut Slide,
    scale: f64,
    /// Containing block for absolutely positioned boxes.
    body: Rect,
}

impl Layouter<'_> {
    fn frame(&self, rect: Rect) -> Frame {
        Frame::from_px(rect.x, rect.y, rect.w, rect.h, self.scale)
    }

    /// Border-box width of `node` given the outer width available to it.
    fn border_box_width(&self, node: &LayoutBox, available: f64) -> f64 {
        let style = &node.style;
        let width = match (style.width, &node.content) {
            (Some(width), _) => width.resolve(available),
            (None, Content::Image { image, .. }) => match style.height {
                Some(h) => h * image.aspect_ratio(),
                None => image.width as f64,
            },
            (None, _) => available - style.margin.horizontal(),
        };
        width.max(0.0)
    }

    /// Border-box height of `node` laid out at `border_width`.
    fn border_box_height(&self, node: &LayoutBox, border_width: f64) -> f64 {
        if let Some(height) = node.style.height {
            return height.max(0.0);
        }
        let chrome = chrome(&node.style);
        let content_width = (border_width - chrome.horizontal()).max(0.0);

        let content_height = match &node.content {
            Content::Text(paragraphs) => wrapped_height(paragraphs, &node.style, content_width),
            Content::Image { image, .. } => content_width / image.aspect_ratio(),
            Content::Children(children) => self.flow_height(&node.style, children, content_width),
        };
        content_height + chrome.vertical()
    }

    /// Margin-box height of `node` given the outer width available to it.
    fn outer_height(&self, node: &LayoutBox, available: f64) -> f64 {
        let width = self.border_box_width(node, available);
        self.border_box_height(node, width) + node.style.margin.vertical()
    }

    /// Margin-box width of `node` with no wrapping.
    fn intrinsic_width(&self, node: &LayoutBox) -> f64 {
        let style = &node.style;
        let margin = style.margin.horizontal();
        if let Some(Length::Px(width)) = style.width {
            return width + margin;
        }
        let chrome = chrome(style).horizontal();

        match &node.content {
            Content::Text(paragraphs) => max_content_width(paragraphs) + chrome + margin,
            Content::Image { .. } => self.border_box_width(node, 0.0) + margin,
            Content::Children(children) => {
                let in_flow = children.iter().filter(|c| !c.style.absolute);
                let inner = if is_row(style) {
                    let widths: Vec<f64> = in_flow.map(|c| self.intrinsic_width(c)).collect();
                    widths.iter().sum::<f64>() + gaps(style, widths.len())
                } else {
                    in_flow.map(|c| self.intrinsic_width(c)).fold(0.0, f64::max)
                };
                inner + chrome + margin
            }
        }
    }

    /// Height of in-flow children stacked or placed in a row.
    fn flow_height(
        &self,
        style: &ComputedStyle,
        children: &[LayoutBox],
        content_width: f64,
    ) -> f64 {
        let in_flow: Vec<&LayoutBox> = children.iter().filter(|c| !c.style.absolute).collect();

        if is_row(style) {
            let widths = self.row_widths(style, &in_flow, content_width);
            in_flow
                .iter()
                .zip(&widths)
                .map(|(child, width)| self.outer_height(child, *width))
                .fold(0.0, f64::max)
        } else {
            let total: f64 = in_flow
                .iter()
                .map(|child| {
                    let width = self.column_child_width(style, child, content_width);
                    self.outer_height(child, width)
                })
                .sum();
            total + gaps(style, in_flow.len())
        }
    }

    /// Outer width of each child of a flex row.
    fn row_widths(
        &self,
        style: &ComputedStyle,
        children: &[&LayoutBox],
        content_width: f64,
    ) -> Vec<f64> {
        let mut fixed = Vec::with_capacity(children.len());
        let mut widths: Vec<f64> = children
            .iter()
            .map(|child| {
                let child_style = &child.style;
                if let Some(width) = child_style.width {
                    fixed.push(true);
                    width.resolve(content_width) + child_style.margin.horizontal()
                } else if child_style.flex_grow > 0.0 {
                    fixed.push(false);
                    child_style.margin.horizontal() + chrome(child_style).horizontal()
                } else {
                    fixed.push(false);
                    self.intrinsic_width(child)
                }
            })
            .collect();

        let free = content_width - widths.iter().sum::<f64>() - gaps(style, children.len());
        let total_grow: f64 = children.iter().map(|c| c.style.flex_grow).sum();

        if free > 0.0 && total_grow > 0.0 {
            for (width, child) in widths.iter_mut().zip(children) {
                *width += free * child.style.flex_grow / total_grow;
            }
        } else if free < 0.0 {
            let shrinkable: f64 = widths
                .iter()
                .zip(&fixed)
                .filter(|(_, fixed)| !**fixed)
                .map(|(w, _)| *w)
                .sum();
            if shrinkable > 0.0 {
                let factor = ((shrinkable + free) / shrinkable).max(0.0);
                for (width, fixed) in widths.iter_mut().zip(&fixed) {
                    if !fixed {
                        *width *= factor;
                    }
                }
            }
        }

        widths
    }

    /// Outer width offered to a child of a column or block container.
    fn column_child_width(
        &self,
        parent: &ComputedStyle,
        child: &LayoutBox,
        content_width: f64,
    ) -> f64 {
        let shrinks = parent.is_flex()
            && matches!(parent.align_items, Align::Center | Align::Start | Align::End)
            && child.style.width.is_none();
        if shrinks {
            self.intrinsic_width(child).min(content_width)
        } else {
            content_width
        }
    }

    /// Place `node` with its margin box at (`x`, `y`).
    fn place(
        &mut self,
        node: &LayoutBox,
        x: f64,
        y: f64,
        outer_width: f64,
        forced_height: Option<f64>,
    ) {
        let style = &node.style;
        let width = self.border_box_width(node, outer_width);
        let definite = forced_height.is_some() || style.height.is_some();
        let height = forced_height
            .or(style.height)
            .unwrap_or_else(|| self.border_box_height(node, width));

        let border_box = Rect {
            x: x + style.margin.left,
            y: y + style.margin.top,
            w: width,
            h: height,
        };
        self.paint_box(style, border_box);

        let content = inset(inset(border_box, &style.border_widths()), &style.padding);
        match &node.content {
            Content::Text(paragraphs) => self.emit_text(style, paragraphs, content),
            Content::Image { image, alt } => self.emit_picture(style, image, alt, content),
            Content::Children(children) => self.place_children(style, children, content, definite),
        }
    }

    fn place_children(
        &mut self,
        style: &ComputedStyle,
        children: &[LayoutBox],
        content: Rect,
        definite: bool,
    ) {
        let in_flow: Vec<&LayoutBox> = children.iter().filter(|c| !c.style.absolute).collect();

        if is_row(style) {
            self.place_row(style, &in_flow, content, definite);
        } else {
            self.place_column(style, &in_flow, content, definite);
        }

        for child in children.iter().filter(|c| c.style.absolute) {
            self.place_absolute(child);
        }
    }

    fn place_row(
        &mut self,
        style: &ComputedStyle,
        children: &[&LayoutBox],
        content: Rect,
        definite: bool,
    ) {
        let widths = self.row_widths(style, children, content.w);
        let heights: Vec<f64> = children
            .iter()
            .zip(&widths)
            .map(|(child, width)| self.outer_height(child, *width))
            .collect();
        let line_height = if definite {
            content.h
        } else {
            heights.iter().copied().fold(0.0, f64::max)
        };

        let gap = style.gap;
        let free = (content.w - widths.iter().sum::<f64>() - gaps(style, children.len())).max(0.0);
        let (mut x, spacing) = distribute(style.justify_content, free, children.len(), content.x);

        for ((child, width), natural) in children.iter().zip(&widths).zip(&heights) {
            let stretch = style.align_items == Align::Stretch && child.style.height.is_none();
            let (y, forced) = if stretch {
                let forced = (line_height - child.style.margin.vertical()).max(0.0);
                (content.y, Some(forced))
            } else {
                let offset = match style.align_items {
                    Align::Center => (line_height - natural) / 2.0,
                    Align::End => line_height - natural,
                    _ => 0.0,
                };
                (content.y + offset, None)
            };

            self.place(child, x, y, *width, forced);
            x += width + gap + spacing;
        }
    }

    fn place_column(
        &mut self,
        style: &ComputedStyle,
        children: &[&LayoutBox],
        content: Rect,
        definite: bool,
    ) {
        let widths: Vec<f64> = children
            .iter()
            .map(|child| self.column_child_width(style, child, content.w))
            .collect();
        let mut heights: Vec<f64> = children
            .iter()
            .zip(&widths)
            .map(|(child, width)| self.outer_height(child, *width))
            .collect();
        let mut forced = vec![false; children.len()];

        let gap = if style.is_flex() { style.gap } else { 0.0 };
        let used = heights.iter().sum::<f64>() + gaps(style, children.len());
        let mut free = if definite { (content.h - used).max(0.0) } else { 0.0 };

        let total_grow: f64 = if style.is_flex() {
            children.iter().map(|c| c.style.flex_grow).sum()
        } else {
            0.0
        };
        if free > 0.0 && total_grow > 0.0 {
            let grown = heights.iter_mut().zip(children).zip(forced.iter_mut());
            for ((height, child), forced) in grown {
                if child.style.flex_grow > 0.0 {
                    *height += free * child.style.flex_grow / total_grow;
                    *forced = true;
                }
            }
            free = 0.0;
        }

        let justify = if style.is_flex() { style.justify_content } else { Align::Start };
        let (mut y, spacing) = distribute(justify, free, children.len(), content.y);

        let sized = children.iter().zip(&widths).zip(&heights).zip(&forced);
        for (((child, width), height), forced) in sized {
            let x = if style.is_flex() {
                match style.align_items {
                    Align::Center => content.x + (content.w - width) / 2.0,
                    Align::End => content.x + content.w - width,
                    _ => content.x,
                }
            } else {
                content.x
            };
            let forced_height = forced.then(|| (height - child.style.margin.vertical()).max(0.0));

            self.place(child, x, y, *width, forced_height);
            y += height + gap + spacing;
        }
    }

    /// Place an absolutely positioned box against the body.
    fn place_absolute(&mut self, node: &LayoutBox) {
        let style = &node.style;
        let body = self.body;

        let outer_width = match (style.left, style.right, style.width) {
            (Some(left), Some(right), None) => (body.w - left - right).max(0.0),
            (_, _, Some(width)) => width.resolve(body.w) + style.margin.horizontal(),
            _ => self.intrinsic_width(node).min(body.w),
        };

        let (outer_height, forced) = match (style.top, style.bottom, style.height) {
            (Some(top), Some(bottom), None) => {
                let height = (body.h - top - bottom).max(0.0);
                (height, Some((height - style.margin.vertical()).max(0.0)))
            }
            _ => (self.outer_height(node, outer_width), None),
        };

        let x = match (style.left, style.right) {
            (Some(left), _) => body.x + left,
            (None, Some(right)) => body.x + body.w - right - outer_width,
            (None, None) => body.x,
        };
        let y = match (style.top, style.bottom) {
            (Some(top), _) => body.y + top,
            (None, Some(bottom)) => body.y + body.h - bottom - outer_height,
            (None, None) => body.y,
        };

        self.place(node, x, y, outer_width, forced);
    }

    /// Background fill and border bars of a box.
    fn paint_box(&mut self, style: &ComputedStyle, rect: Rect) {
        if let Some(fill) = style.background {
            let frame = self.frame(rect);
            self.slide.add_shape(RectShape::new(frame, fill));
        }

        let sides = [
            (style.border_top, Rect { h: 0.0, ..rect }),
            (style.border_bottom, Rect { y: rect.y + rect.h, h: 0.0, ..rect }),
            (style.border_left, Rect { w: 0.0, ..rect }),
            (style.border_right, Rect { x: rect.x + rect.w, w: 0.0, ..rect }),
        ];
        for (border, edge) in sides {
            let Some(border) = border else { continue };
            let bar = match (edge.w == 0.0, edge.h == 0.0) {
                // Vertical side: grow inwards from the edge.
                (true, _) if edge.x > rect.x => Rect {
                    x: edge.x - border.width,
                    w: border.width,
                    ..edge
                },
                (true, _) => Rect { w: border.width, ..edge },
                (_, true) if edge.y > rect.y => Rect {
                    y: edge.y - border.width,
                    h: border.width,
                    ..edge
                },
                _ => Rect { h: border.width, ..edge },
            };
            let frame = self.frame(bar);
            self.slide.add_shape(RectShape::new(frame, border.color));
        }
    }

    fn emit_text(&mut self, style: &ComputedStyle, paragraphs: &[Runs], rect: Rect) {
        let mut text_box = TextBox::new(self.frame(rect));
        let centered = style.align_items == Align::Center || is_column_centered(style);
        text_box.anchor = if style.is_flex() && centered {
            VerticalAnchor::Middle
        } else {
            VerticalAnchor::Top
        };

        for runs in paragraphs {
            let mut paragraph = Paragraph::new(style.text_align);
            for run in runs {
                paragraph.push(run.to_text_run(self.scale));
            }
            text_box.add_paragraph(paragraph);
        }

        self.slide.add_shape(text_box);
    }

    fn emit_picture(&mut self, style: &ComputedStyle, image: &LoadedImage, alt: &str, rect: Rect) {
        let rect = if style.object_fit_contain {
            contain(rect, image.aspect_ratio())
        } else {
            rect
        };

        let frame = self.frame(rect);
        self.slide.add_shape(Picture {
            frame,
            data: image.data.clone(),
            format: image.format,
            description: alt.to_string(),
        });
    }
}

fn is_row(style: &ComputedStyle) -> bool {
    style.is_flex() && style.flex_direction == FlexDirection::Row
}

fn is_column_centered(style: &ComputedStyle) -> bool {
    style.flex_direction == FlexDirection::Column && style.justify_content == Align::Center
}

/// Total gap space between `count` flex items.
fn gaps(style: &ComputedStyle, count: usize) -> f64 {
    if style.is_flex() && count > 1 {
        style.gap * (count - 1) as f64
    } else {
        0.0
    }
}

/// Start offset and extra spacing between items for main-axis alignment.
fn distribute(justify: Align, free: f64, count: usize, start: f64) -> (f64, f64) {
    match justify {
        Align::Center => (start + free / 2.0, 0.0),
        Align::End => (start + free, 0.0),
        Align::SpaceBetween if count > 1 => (start, free / (count - 1) as f64),
        _ => (start, 0.0),
    }
}

/// The largest rect with `aspect` centered inside `rect`.
fn contain(rect: Rect, aspect: f64) -> Rect {
    if rect.h <= 0.0 || aspect <= 0.0 {
        return rect;
    }
    if rect.w / rect.h > aspect {
        let w = rect.h * aspect;
        Rect { x: rect.x + (rect.w - w) / 2.0, w, ..rect }
    } else {
        let h = rect.w / aspect;
        Rect { y: rect.y + (rect.h - h) / 2.0, h, ..rect }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;
    use deck_core::{Color, Shape, TextAlign};

    fn lay_out(html: &str) -> Result<Slide> {
        let doc = Document::parse(html).unwrap();
        let sheet = Stylesheet::builtin();
        let mut slide = Slide::new();
        layout_body(
            doc.body().unwrap(),
            &sheet,
            &TextCleaner::new(),
            SlideLayout::Widescreen16x9,
            Path::new("."),
            &mut slide,
        )?;
        Ok(slide)
    }

    fn text_boxes(slide: &Slide) -> Vec<&TextBox> {
        slide.text_boxes().collect()
    }

    fn rects(slide: &Slide) -> Vec<&RectShape> {
        slide
            .shapes
            .iter()
            .filter_map(|s| match s {
                Shape::Rect(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_body_background_becomes_slide_background() {
        let slide = lay_out(
            r#"<body class="col bg-surface" style="width: 960px; height: 540px;"><p>x</p></body>"#,
        )
        .unwrap();
        assert_eq!(slide.background, Some(Color::rgb(0x1a, 0x1a, 0x1a)));
    }

    #[test]
    fn test_aspect_mismatch_is_rejected() {
        let result = lay_out(r#"<body style="width: 960px; height: 720px;"><p>x</p></body>"#);
        assert!(matches!(result, Err(Error::LayoutError(_))));
    }

    #[test]
    fn test_scaled_body_is_accepted() {
        let slide = lay_out(
            r#"<body style="width: 1280px; height: 720px;">
                <div style="width: 1280px;">Full width</div>
            </body>"#,
        )
        .unwrap();
        let text = text_boxes(&slide)[0];
        assert_eq!(text.frame.cx, 9_144_000);
    }

    #[test]
    fn test_title_text_runs_and_formatting() {
        let slide = lay_out(
            r#"<body class="col bg-surface center" style="width: 960px; height: 540px;">
                <div class="text-center">
                    <h1 class="text-8xl text-primary" style="margin: 0 0 20px 0; text-transform: uppercase;">Raid  Stats</h1>
                    <div class="text-2xl">Week of <b>March 1</b> &ndash; March 8</div>
                </div>
            </body>"#,
        )
        .unwrap();

        let boxes = text_boxes(&slide);
        assert_eq!(boxes.len(), 2);

        let title = &boxes[0].paragraphs[0];
        assert_eq!(title.align, TextAlign::Center);
        assert_eq!(title.runs[0].text, "RAID STATS");
        assert_eq!(title.runs[0].size_pt, 72.0);
        assert!(title.runs[0].bold);
        assert_eq!(title.runs[0].color, Some(Color::rgb(0x32, 0xCD, 0x32)));

        let subtitle: Vec<(&str, bool)> = boxes[1].paragraphs[0]
            .runs
            .iter()
            .map(|r| (r.text.as_str(), r.bold))
            .collect();
        assert_eq!(subtitle, vec![("Week of ", false), ("March 1", true), (" - March 8", false)]);
        assert!(boxes[0].frame.bottom() <= boxes[1].frame.y);
    }

    #[test]
    fn test_row_splits_width_by_flex_weights() {
        let slide = lay_out(
            r#"<body class="col" style="width: 960px; height: 540px;">
                <div class="row" style="gap: 0;">
                    <div style="flex: 2;">Boss</div>
                    <div style="flex: 1;">Kills</div>
                    <div style="flex: 1;">Wipes</div>
                </div>
            </body>"#,
        )
        .unwrap();

        let widths: Vec<i64> = text_boxes(&slide).iter().map(|t| t.frame.cx).collect();
        assert_eq!(widths.len(), 3);
        assert!((widths[0] - 2 * widths[1]).abs() <= 2);
        assert_eq!(widths[1], widths[2]);
        let xs: Vec<i64> = text_boxes(&slide).iter().map(|t| t.frame.x).collect();
        assert!(xs[0] < xs[1] && xs[1] < xs[2]);
    }

    #[test]
    fn test_fixed_width_items_keep_their_width() {
        let slide = lay_out(
            r#"<body class="col" style="width: 960px; height: 540px;">
                <div class="row bg-muted" style="padding: 10px 14px;">
                    <div style="width: 30px;">#1</div>
                    <div style="flex: 1;">Name</div>
                    <div style="width: 100px; text-align: right;">12.3k</div>
                </div>
            </body>"#,
        )
        .unwrap();

        let boxes = text_boxes(&slide);
        assert_eq!(boxes[0].frame.cx, deck_core::units::px_to_emu(30.0));
        assert_eq!(boxes[2].frame.cx, deck_core::units::px_to_emu(100.0));
        assert_eq!(boxes[2].paragraphs[0].align, TextAlign::Right);
        assert_eq!(boxes[2].frame.right(), deck_core::units::px_to_emu(946.0));
        // Row background is painted before its text.
        assert!(matches!(slide.shapes[0], Shape::Rect(_)));
    }

    #[test]
    fn test_left_border_becomes_accent_bar() {
        let slide = lay_out(
            r#"<body class="col" style="width: 960px; height: 540px;">
                <div class="bg-muted" style="padding: 24px; border-left: 8px solid var(--color-primary);">
                    <div class="text-6xl">42</div>
                </div>
            </body>"#,
        )
        .unwrap();

        let rects = rects(&slide);
        assert_eq!(rects.len(), 2);
        let bar = rects[1];
        assert_eq!(bar.fill, Color::rgb(0x32, 0xCD, 0x32));
        assert_eq!(bar.frame.cx, deck_core::units::px_to_emu(8.0));
        assert_eq!(bar.frame.x, 0);
        assert_eq!(bar.frame.cy, rects[0].frame.cy);

        let text = text_boxes(&slide)[0];
        assert_eq!(text.frame.x, deck_core::units::px_to_emu(32.0));
    }

    #[test]
    fn test_absolute_footer_is_anchored_to_bottom() {
        let slide = lay_out(
            r#"<body class="col" style="width: 960px; height: 540px; position: relative;">
                <h1>Title</h1>
                <div style="position: absolute; bottom: 20px; left: 20px; right: 20px;">
                    <div class="text-xs">Data from WarcraftLogs</div>
                </div>
            </body>"#,
        )
        .unwrap();

        let footer = text_boxes(&slide)
            .into_iter()
            .find(|t| t.plain_text().starts_with("Data"))
            .unwrap();
        assert_eq!(footer.frame.x, deck_core::units::px_to_emu(20.0));
        assert_eq!(footer.frame.cx, deck_core::units::px_to_emu(920.0));
        assert_eq!(footer.frame.bottom(), deck_core::units::px_to_emu(520.0));
    }

    #[test]
    fn test_fill_height_takes_remaining_space() {
        let slide = lay_out(
            r#"<body class="col" style="width: 960px; height: 540px;">
                <div class="fit" style="height: 100px;"></div>
                <div class="fill-height bg-muted"></div>
            </body>"#,
        )
        .unwrap();

        let rect = rects(&slide)[0];
        assert_eq!(rect.frame.y, deck_core::units::px_to_emu(100.0));
        assert_eq!(rect.frame.cy, deck_core::units::px_to_emu(440.0));
    }

    #[test]
    fn test_links_and_line_breaks() {
        let slide = lay_out(
            r#"<body style="width: 960px; height: 540px;">
                <p>Top DPS: <a href="https://www.warcraftlogs.com/character/1">Thrall</a><br>Orgrimmar</p>
            </body>"#,
        )
        .unwrap();

        let text = text_boxes(&slide)[0];
        assert_eq!(text.paragraphs.len(), 2);
        let link = &text.paragraphs[0].runs[1];
        assert_eq!(link.text, "Thrall");
        assert_eq!(link.link.as_deref(), Some("https://www.warcraftlogs.com/character/1"));
        assert_eq!(text.paragraphs[1].plain_text(), "Orgrimmar");
    }

    #[test]
    fn test_missing_image_is_skipped() {
        let slide = lay_out(
            r#"<body style="width: 960px; height: 540px;"><img src="no-such-logo.png"><p>After</p></body>"#,
        )
        .unwrap();
        assert_eq!(slide.shapes.len(), 1);
        assert_eq!(slide.texts(), vec!["After".to_string()]);
    }

    #[test]
    fn test_overflow_still_lays_out() {
        let rows: String = (0..40)
            .map(|i| format!("<div class=\"text-2xl\">Row {}</div>", i))
            .collect();
        let slide = lay_out(&format!(
            r#"<body class="col" style="width: 960px; height: 540px;">{}</body>"#,
            rows
        ))
        .unwrap();
        let (_, slide_height) = SlideLayout::Widescreen16x9.dimensions();
        assert_eq!(slide.text_boxes().count(), 40);
        assert!(slide.shapes.iter().any(|s| s.frame().bottom() > slide_height));
    }

    #[test]
    fn test_count_lines_wraps_words() {
        let style = ComputedStyle::default();
        let run = StyledRun::new("aaaa aaaa aaaa".to_string(), &style, None);
        let word = run.text[..4].chars().map(|c| run.glyph_width(c)).sum::<f64>();

        assert_eq!(count_lines(std::slice::from_ref(&run), 1000.0), 1);
        assert_eq!(count_lines(std::slice::from_ref(&run), word * 1.5), 3);
    }

    #[test]
    fn test_tidy_runs_collapses_across_boundaries() {
        let style = ComputedStyle::default();
        let runs = vec![
            StyledRun::new(" Kills ".to_string(), &style, None),
            StyledRun::new(" 12 ".to_string(), &style, None),
            StyledRun::new(" ".to_string(), &style, None),
        ];
        let texts: Vec<String> = tidy_runs(runs).into_iter().map(|r| r.text).collect();
        assert_eq!(texts, vec!["Kills ".to_string(), "12".to_string()]);
    }

    #[test]
    fn test_contain_centers_image() {
        let rect = contain(Rect { x: 0.0, y: 0.0, w: 80.0, h: 80.0 }, 2.0);
        assert_eq!(rect, Rect { x: 0.0, y: 20.0, w: 80.0, h: 40.0 });
    }
}
