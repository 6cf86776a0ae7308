//! Slide part generation.
//!
//! Renders a [`Slide`] into `ppt/slides/slideN.xml` markup together with the
//! relationships its shapes need (layout, embedded pictures, hyperlinks).

use deck_core::{
    Color, Frame, ImageFormat, Paragraph, Picture, RectShape, Result, Shape, Slide, TextAlign,
    TextBox, TextRun, VerticalAnchor,
};
use quick_xml::escape::escape;
use std::fmt::Write as FmtWrite;

use crate::parts::{fmt_error, REL_HYPERLINK, REL_IMAGE, REL_SLIDE_LAYOUT};

/// One relationship of a slide part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SlideRel {
    pub id: String,
    pub rel_type: &'static str,
    pub target: String,
    pub external: bool,
}

/// A picture that must be stored under `ppt/media/`.
#[derive(Debug, Clone)]
pub(crate) struct MediaEntry<'a> {
    /// Archive path, e.g. `ppt/media/image3.png`.
    pub path: String,
    pub data: &'a [u8],
    pub format: ImageFormat,
}

/// Rendered slide part plus everything it references.
#[derive(Debug)]
pub(crate) struct RenderedSlide<'a> {
    pub xml: String,
    pub rels: Vec<SlideRel>,
    pub media: Vec<MediaEntry<'a>>,
}

/// Relationship IDs allocated while rendering one slide.
///
/// `rId1` is always the slide layout.
#[derive(Debug)]
struct RelAllocator {
    rels: Vec<SlideRel>,
}

impl RelAllocator {
    fn new() -> Self {
        Self {
            rels: vec![SlideRel {
                id: "rId1".to_string(),
                rel_type: REL_SLIDE_LAYOUT,
                target: "../slideLayouts/slideLayout1.xml".to_string(),
                external: false,
            }],
        }
    }

    fn add(&mut self, rel_type: &'static str, target: String, external: bool) -> String {
        // Hyperlinks to the same URL share one relationship.
        if let Some(existing) = self
            .rels
            .iter()
            .find(|r| r.rel_type == rel_type && r.target == target && r.external == external)
        {
            return existing.id.clone();
        }

        let id = format!("rId{}", self.rels.len() + 1);
        self.rels.push(SlideRel {
            id: id.clone(),
            rel_type,
            target,
            external,
        });
        id
    }
}

/// Render a slide.
///
/// `media_counter` numbers images across the whole package so media part
/// names never collide between slides.
pub(crate) fn render_slide<'a>(
    slide: &'a Slide,
    media_counter: &mut usize,
) -> Result<RenderedSlide<'a>> {
    let mut rels = RelAllocator::new();
    let mut media = Vec::new();
    let mut xml = String::with_capacity(4096);

    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(r#"<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">"#);
    xml.push_str("<p:cSld>");

    if let Some(background) = slide.background {
        write!(
            xml,
            r#"<p:bg><p:bgPr>{}<a:effectLst/></p:bgPr></p:bg>"#,
            solid_fill(background)
        )
        .map_err(fmt_error)?;
    }

    xml.push_str("<p:spTree>");
    xml.push_str(r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#);
    xml.push_str(r#"<p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#);

    // Shape id 1 is the group itself.
    for (index, shape) in slide.shapes.iter().enumerate() {
        let shape_id = index as u32 + 2;
        match shape {
            Shape::Rect(rect) => write_rect(&mut xml, shape_id, rect)?,
            Shape::Text(text_box) => write_text_box(&mut xml, shape_id, text_box, &mut rels)?,
            Shape::Picture(picture) => {
                *media_counter += 1;
                let file_name = format!("image{}.{}", media_counter, picture.format.extension());
                let rel_id = rels.add(REL_IMAGE, format!("../media/{}", file_name), false);
                write_picture(&mut xml, shape_id, picture, &rel_id)?;
                media.push(MediaEntry {
                    path: format!("ppt/media/{}", file_name),
                    data: &picture.data,
                    format: picture.format,
                });
            }
        }
    }

    xml.push_str("</p:spTree></p:cSld>");
    xml.push_str("<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>");
    xml.push_str("</p:sld>");

    Ok(RenderedSlide {
        xml,
        rels: rels.rels,
        media,
    })
}

/// Render the `_rels/slideN.xml.rels` part for a slide.
pub(crate) fn render_slide_rels(rels: &[SlideRel]) -> Result<String> {
    let mut xml = String::with_capacity(512);
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#);
    for rel in rels {
        write!(
            xml,
            r#"<Relationship Id="{}" Type="{}" Target="{}"{}/>"#,
            rel.id,
            rel.rel_type,
            escape(rel.target.as_str()),
            if rel.external { r#" TargetMode="External""# } else { "" }
        )
        .map_err(fmt_error)?;
    }
    xml.push_str("</Relationships>");
    Ok(xml)
}

fn write_rect(xml: &mut String, shape_id: u32, rect: &RectShape) -> Result<()> {
    write!(
        xml,
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="Rectangle {id}"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr><p:spPr>{xfrm}<a:prstGeom prst="rect"><a:avLst/></a:prstGeom>{fill}<a:ln><a:noFill/></a:ln></p:spPr></p:sp>"#,
        id = shape_id,
        xfrm = xfrm(&rect.frame),
        fill = solid_fill(rect.fill),
    )
    .map_err(fmt_error)
}

fn write_picture(
    xml: &mut String,
    shape_id: u32,
    picture: &Picture,
    rel_id: &str,
) -> Result<()> {
    write!(
        xml,
        r#"<p:pic><p:nvPicPr><p:cNvPr id="{id}" name="Picture {id}" descr="{descr}"/><p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr><p:nvPr/></p:nvPicPr><p:blipFill><a:blip r:embed="{rel}"/><a:stretch><a:fillRect/></a:stretch></p:blipFill><p:spPr>{xfrm}<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr></p:pic>"#,
        id = shape_id,
        descr = escape(picture.description.as_str()),
        rel = rel_id,
        xfrm = xfrm(&picture.frame),
    )
    .map_err(fmt_error)
}

fn write_text_box(
    xml: &mut String,
    shape_id: u32,
    text_box: &TextBox,
    rels: &mut RelAllocator,
) -> Result<()> {
    write!(
        xml,
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="TextBox {id}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr>{xfrm}<a:prstGeom prst="rect"><a:avLst/></a:prstGeom><a:noFill/></p:spPr>"#,
        id = shape_id,
        xfrm = xfrm(&text_box.frame),
    )
    .map_err(fmt_error)?;

    write!(
        xml,
        r#"<p:txBody><a:bodyPr wrap="square" lIns="0" tIns="0" rIns="0" bIns="0" anchor="{}" rtlCol="0"><a:noAutofit/></a:bodyPr><a:lstStyle/>"#,
        anchor_attr(text_box.anchor)
    )
    .map_err(fmt_error)?;

    if text_box.paragraphs.is_empty() {
        xml.push_str("<a:p/>");
    }
    for paragraph in &text_box.paragraphs {
        write_paragraph(xml, paragraph, rels)?;
    }

    xml.push_str("</p:txBody></p:sp>");
    Ok(())
}

fn write_paragraph(
    xml: &mut String,
    paragraph: &Paragraph,
    rels: &mut RelAllocator,
) -> Result<()> {
    xml.push_str("<a:p>");
    write!(xml, r#"<a:pPr algn="{}"/>"#, align_attr(paragraph.align)).map_err(fmt_error)?;

    for run in &paragraph.runs {
        if run.text.is_empty() {
            continue;
        }
        xml.push_str("<a:r>");
        write_run_properties(xml, run, rels)?;
        write!(xml, "<a:t>{}</a:t>", escape(run.text.as_str())).map_err(fmt_error)?;
        xml.push_str("</a:r>");
    }

    if let Some(last) = paragraph.runs.last() {
        write!(xml, r#"<a:endParaRPr lang="en-US" sz="{}" dirty="0"/>"#, size_attr(last.size_pt))
            .map_err(fmt_error)?;
    }
    xml.push_str("</a:p>");
    Ok(())
}

fn write_run_properties(
    xml: &mut String,
    run: &TextRun,
    rels: &mut RelAllocator,
) -> Result<()> {
    write!(
        xml,
        r#"<a:rPr lang="en-US" sz="{}" b="{}" i="{}" dirty="0">"#,
        size_attr(run.size_pt),
        run.bold as u8,
        run.italic as u8
    )
    .map_err(fmt_error)?;

    if let Some(color) = run.color {
        xml.push_str(&solid_fill(color));
    }
    if let Some(face) = &run.font_face {
        write!(xml, r#"<a:latin typeface="{}"/>"#, escape(face.as_str()))
            .map_err(fmt_error)?;
    }
    if let Some(link) = &run.link {
        let rel_id = rels.add(REL_HYPERLINK, link.clone(), true);
        write!(xml, r#"<a:hlinkClick r:id="{}"/>"#, rel_id).map_err(fmt_error)?;
    }

    xml.push_str("</a:rPr>");
    Ok(())
}

fn xfrm(frame: &Frame) -> String {
    format!(
        r#"<a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm>"#,
        frame.x, frame.y, frame.cx, frame.cy
    )
}

fn solid_fill(color: Color) -> String {
    format!(r#"<a:solidFill><a:srgbClr val="{}"/></a:solidFill>"#, color.to_hex())
}

/// Font size in hundredths of a point, clamped to the range DrawingML accepts.
fn size_attr(size_pt: f64) -> u32 {
    ((size_pt * 100.0).round() as u32).clamp(100, 400_000)
}

fn align_attr(align: TextAlign) -> &'static str {
    match align {
        TextAlign::Left => "l",
        TextAlign::Center => "ctr",
        TextAlign::Right => "r",
    }
}

fn anchor_attr(anchor: VerticalAnchor) -> &'static str {
    match anchor {
        VerticalAnchor::Top => "t",
        VerticalAnchor::Middle => "ctr",
        VerticalAnchor::Bottom => "b",
    }
}
