//! Package-level parts of a PPTX file.
//!
//! The slide master, blank layout and theme are fixed; everything that
//! depends on the deck (content types, relationships, presentation part,
//! document properties) is generated here.

use deck_core::{Deck, Error, ImageFormat, Result};
use quick_xml::escape::escape;
use std::fmt::Write as FmtWrite;

pub(crate) const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
pub(crate) const REL_CORE_PROPERTIES: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
pub(crate) const REL_EXTENDED_PROPERTIES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties";
pub(crate) const REL_SLIDE_MASTER: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
pub(crate) const REL_SLIDE_LAYOUT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
pub(crate) const REL_SLIDE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
pub(crate) const REL_THEME: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";
pub(crate) const REL_PRES_PROPS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/presProps";
pub(crate) const REL_VIEW_PROPS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/viewProps";
pub(crate) const REL_TABLE_STYLES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/tableStyles";
pub(crate) const REL_IMAGE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
pub(crate) const REL_HYPERLINK: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink";

const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;
const RELS_OPEN: &str =
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#;
const PML_NAMESPACES: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;

/// First slide ID; lower values are reserved.
pub(crate) const FIRST_SLIDE_ID: u32 = 256;

const SLIDE_MASTER_ID: u32 = 2_147_483_648;
const SLIDE_LAYOUT_ID: u32 = 2_147_483_649;

const EMPTY_SP_TREE: &str = r#"<p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr></p:spTree>"#;

/// `[Content_Types].xml`.
pub(crate) fn content_types_xml(
    slide_count: usize,
    image_formats: &[ImageFormat],
) -> Result<String> {
    let mut xml = String::with_capacity(2048);
    xml.push_str(XML_DECL);
    xml.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);
    xml.push_str(r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
    xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);

    let mut seen: Vec<ImageFormat> = Vec::new();
    for format in image_formats {
        if seen.contains(format) {
            continue;
        }
        seen.push(*format);
        write!(
            xml,
            r#"<Default Extension="{}" ContentType="{}"/>"#,
            format.extension(),
            format.mime_type()
        )
        .map_err(fmt_error)?;
    }

    let overrides: [(&str, &str); 7] = [
        (
            "/ppt/presentation.xml",
            "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml",
        ),
        (
            "/ppt/slideMasters/slideMaster1.xml",
            "application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml",
        ),
        (
            "/ppt/slideLayouts/slideLayout1.xml",
            "application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml",
        ),
        ("/ppt/theme/theme1.xml", "application/vnd.openxmlformats-officedocument.theme+xml"),
        (
            "/ppt/presProps.xml",
            "application/vnd.openxmlformats-officedocument.presentationml.presProps+xml",
        ),
        (
            "/ppt/viewProps.xml",
            "application/vnd.openxmlformats-officedocument.presentationml.viewProps+xml",
        ),
        (
            "/ppt/tableStyles.xml",
            "application/vnd.openxmlformats-officedocument.presentationml.tableStyles+xml",
        ),
    ];
    for (part, content_type) in overrides {
        write!(xml, r#"<Override PartName="{}" ContentType="{}"/>"#, part, content_type)
            .map_err(fmt_error)?;
    }

    for number in 1..=slide_count {
        write!(
            xml,
            r#"<Override PartName="/ppt/slides/slide{}.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#,
            number
        )
        .map_err(fmt_error)?;
    }

    xml.push_str(r#"<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>"#);
    xml.push_str(r#"<Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>"#);
    xml.push_str("</Types>");
    Ok(xml)
}

/// `_rels/.rels`.
pub(crate) fn root_rels_xml() -> Result<String> {
    let mut xml = String::with_capacity(512);
    xml.push_str(XML_DECL);
    xml.push_str(RELS_OPEN);
    push_rel(&mut xml, "rId1", REL_OFFICE_DOCUMENT, "ppt/presentation.xml")?;
    push_rel(&mut xml, "rId2", REL_CORE_PROPERTIES, "docProps/core.xml")?;
    push_rel(&mut xml, "rId3", REL_EXTENDED_PROPERTIES, "docProps/app.xml")?;
    xml.push_str("</Relationships>");
    Ok(xml)
}

/// Relationship ID of the n-th slide (1-based) in `presentation.xml.rels`.
///
/// `rId1` is the slide master, so slides start at `rId2`.
pub(crate) fn slide_rel_id(number: usize) -> String {
    format!("rId{}", number + 1)
}

/// `ppt/_rels/presentation.xml.rels`.
pub(crate) fn presentation_rels_xml(slide_count: usize) -> Result<String> {
    let mut xml = String::with_capacity(1024);
    xml.push_str(XML_DECL);
    xml.push_str(RELS_OPEN);
    push_rel(&mut xml, "rId1", REL_SLIDE_MASTER, "slideMasters/slideMaster1.xml")?;
    for number in 1..=slide_count {
        push_rel(
            &mut xml,
            &slide_rel_id(number),
            REL_SLIDE,
            &format!("slides/slide{}.xml", number),
        )?;
    }

    let tail = [
        (REL_PRES_PROPS, "presProps.xml"),
        (REL_VIEW_PROPS, "viewProps.xml"),
        (REL_THEME, "theme/theme1.xml"),
        (REL_TABLE_STYLES, "tableStyles.xml"),
    ];
    for (offset, (rel_type, target)) in tail.iter().enumerate() {
        let id = format!("rId{}", slide_count + 2 + offset);
        push_rel(&mut xml, &id, rel_type, target)?;
    }

    xml.push_str("</Relationships>");
    Ok(xml)
}

/// `ppt/presentation.xml`.
pub(crate) fn presentation_xml(deck: &Deck) -> Result<String> {
    let (cx, cy) = deck.dimensions();
    let mut xml = String::with_capacity(1024);
    xml.push_str(XML_DECL);
    write!(xml, r#"<p:presentation {} saveSubsetFonts="1">"#, PML_NAMESPACES)
        .map_err(fmt_error)?;
    write!(
        xml,
        r#"<p:sldMasterIdLst><p:sldMasterId id="{}" r:id="rId1"/></p:sldMasterIdLst>"#,
        SLIDE_MASTER_ID
    )
    .map_err(fmt_error)?;

    if !deck.slides.is_empty() {
        xml.push_str("<p:sldIdLst>");
        for (index, _) in deck.slides.iter().enumerate() {
            write!(
                xml,
                r#"<p:sldId id="{}" r:id="{}"/>"#,
                FIRST_SLIDE_ID + index as u32,
                slide_rel_id(index + 1)
            )
            .map_err(fmt_error)?;
        }
        xml.push_str("</p:sldIdLst>");
    }

    write!(xml, r#"<p:sldSz cx="{}" cy="{}"/>"#, cx, cy).map_err(fmt_error)?;
    xml.push_str(r#"<p:notesSz cx="6858000" cy="9144000"/>"#);
    xml.push_str("</p:presentation>");
    Ok(xml)
}

/// `docProps/core.xml`. `timestamp` is W3CDTF, e.g. `2024-05-01T20:00:00Z`.
pub(crate) fn core_props_xml(deck: &Deck, timestamp: &str) -> Result<String> {
    let title = deck.title.as_deref().unwrap_or("Presentation");
    let creator = deck.author.as_deref().unwrap_or("raid-deck");

    let mut xml = String::with_capacity(1024);
    xml.push_str(XML_DECL);
    xml.push_str(r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#);
    write!(xml, "<dc:title>{}</dc:title>", escape(title)).map_err(fmt_error)?;
    write!(xml, "<dc:creator>{}</dc:creator>", escape(creator)).map_err(fmt_error)?;
    write!(xml, "<cp:lastModifiedBy>{}</cp:lastModifiedBy>", escape(creator))
        .map_err(fmt_error)?;
    xml.push_str("<cp:revision>1</cp:revision>");
    write!(
        xml,
        r#"<dcterms:created xsi:type="dcterms:W3CDTF">{ts}</dcterms:created><dcterms:modified xsi:type="dcterms:W3CDTF">{ts}</dcterms:modified>"#,
        ts = timestamp
    )
    .map_err(fmt_error)?;
    xml.push_str("</cp:coreProperties>");
    Ok(xml)
}

/// `docProps/app.xml`.
pub(crate) fn app_props_xml(deck: &Deck) -> Result<String> {
    let mut xml = String::with_capacity(512);
    xml.push_str(XML_DECL);
    xml.push_str(r#"<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes">"#);
    xml.push_str("<Application>raid-deck</Application>");
    write!(xml, "<Slides>{}</Slides>", deck.slide_count()).map_err(fmt_error)?;
    write!(
        xml,
        "<PresentationFormat>{}</PresentationFormat>",
        presentation_format_name(deck)
    )
    .map_err(fmt_error)?;
    xml.push_str("</Properties>");
    Ok(xml)
}

fn presentation_format_name(deck: &Deck) -> &'static str {
    use deck_core::SlideLayout;
    match deck.layout {
        SlideLayout::Widescreen16x9 => "On-screen Show (16:9)",
        SlideLayout::Widescreen16x10 => "On-screen Show (16:10)",
        SlideLayout::Standard4x3 => "On-screen Show (4:3)",
        SlideLayout::Wide => "Widescreen",
    }
}

/// `ppt/slideMasters/slideMaster1.xml`.
pub(crate) fn slide_master_xml() -> Result<String> {
    let mut xml = String::with_capacity(2048);
    xml.push_str(XML_DECL);
    write!(xml, "<p:sldMaster {}>", PML_NAMESPACES).map_err(fmt_error)?;
    xml.push_str(r#"<p:cSld><p:bg><p:bgRef idx="1001"><a:schemeClr val="bg1"/></p:bgRef></p:bg>"#);
    xml.push_str(EMPTY_SP_TREE);
    xml.push_str("</p:cSld>");
    xml.push_str(r#"<p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/>"#);
    write!(
        xml,
        r#"<p:sldLayoutIdLst><p:sldLayoutId id="{}" r:id="rId1"/></p:sldLayoutIdLst>"#,
        SLIDE_LAYOUT_ID
    )
    .map_err(fmt_error)?;
    xml.push_str("<p:txStyles>");
    xml.push_str(r#"<p:titleStyle><a:lvl1pPr algn="l"><a:defRPr sz="4400" kern="1200"><a:solidFill><a:schemeClr val="tx1"/></a:solidFill><a:latin typeface="+mj-lt"/></a:defRPr></a:lvl1pPr></p:titleStyle>"#);
    xml.push_str(r#"<p:bodyStyle><a:lvl1pPr algn="l"><a:defRPr sz="2800" kern="1200"><a:solidFill><a:schemeClr val="tx1"/></a:solidFill><a:latin typeface="+mn-lt"/></a:defRPr></a:lvl1pPr></p:bodyStyle>"#);
    xml.push_str(r#"<p:otherStyle><a:defPPr><a:defRPr lang="en-US"/></a:defPPr><a:lvl1pPr algn="l"><a:defRPr sz="1800" kern="1200"><a:solidFill><a:schemeClr val="tx1"/></a:solidFill><a:latin typeface="+mn-lt"/></a:defRPr></a:lvl1pPr></p:otherStyle>"#);
    xml.push_str("</p:txStyles>");
    xml.push_str("</p:sldMaster>");
    Ok(xml)
}

/// `ppt/slideMasters/_rels/slideMaster1.xml.rels`.
pub(crate) fn slide_master_rels_xml() -> Result<String> {
    let mut xml = String::with_capacity(512);
    xml.push_str(XML_DECL);
    xml.push_str(RELS_OPEN);
    push_rel(&mut xml, "rId1", REL_SLIDE_LAYOUT, "../slideLayouts/slideLayout1.xml")?;
    push_rel(&mut xml, "rId2", REL_THEME, "../theme/theme1.xml")?;
    xml.push_str("</Relationships>");
    Ok(xml)
}

/// `ppt/slideLayouts/slideLayout1.xml`, a blank layout.
pub(crate) fn slide_layout_xml() -> Result<String> {
    let mut xml = String::with_capacity(1024);
    xml.push_str(XML_DECL);
    write!(xml, r#"<p:sldLayout {} type="blank" preserve="1">"#, PML_NAMESPACES)
        .map_err(fmt_error)?;
    xml.push_str(r#"<p:cSld name="Blank">"#);
    xml.push_str(EMPTY_SP_TREE);
    xml.push_str("</p:cSld>");
    xml.push_str("<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>");
    xml.push_str("</p:sldLayout>");
    Ok(xml)
}

/// `ppt/slideLayouts/_rels/slideLayout1.xml.rels`.
pub(crate) fn slide_layout_rels_xml() -> Result<String> {
    let mut xml = String::with_capacity(256);
    xml.push_str(XML_DECL);
    xml.push_str(RELS_OPEN);
    push_rel(&mut xml, "rId1", REL_SLIDE_MASTER, "../slideMasters/slideMaster1.xml")?;
    xml.push_str("</Relationships>");
    Ok(xml)
}

/// `ppt/theme/theme1.xml`.
pub(crate) fn theme_xml() -> Result<String> {
    let mut xml = String::with_capacity(4096);
    xml.push_str(XML_DECL);
    xml.push_str(r#"<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Raid Deck"><a:themeElements>"#);

    xml.push_str(r#"<a:clrScheme name="Raid Deck">"#);
    xml.push_str(r#"<a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1>"#);
    xml.push_str(r#"<a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1>"#);
    let scheme = [
        ("dk2", "1A1A1A"),
        ("lt2", "F5F5F5"),
        ("accent1", "32CD32"),
        ("accent2", "D4AF37"),
        ("accent3", "2C1810"),
        ("accent4", "2D2D2D"),
        ("accent5", "A0A0A0"),
        ("accent6", "404040"),
        ("hlink", "32CD32"),
        ("folHlink", "D4AF37"),
    ];
    for (slot, hex) in scheme {
        write!(xml, r#"<a:{slot}><a:srgbClr val="{hex}"/></a:{slot}>"#).map_err(fmt_error)?;
    }
    xml.push_str("</a:clrScheme>");

    xml.push_str(r#"<a:fontScheme name="Raid Deck">"#);
    xml.push_str(r#"<a:majorFont><a:latin typeface="Arial Black"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont>"#);
    xml.push_str(r#"<a:minorFont><a:latin typeface="Arial"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont>"#);
    xml.push_str("</a:fontScheme>");

    xml.push_str(r#"<a:fmtScheme name="Raid Deck">"#);
    xml.push_str("<a:fillStyleLst>");
    for _ in 0..3 {
        xml.push_str(r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#);
    }
    xml.push_str("</a:fillStyleLst>");
    xml.push_str("<a:lnStyleLst>");
    for width in [6350, 12700, 19050] {
        write!(
            xml,
            r#"<a:ln w="{}" cap="flat" cmpd="sng" algn="ctr"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:prstDash val="solid"/><a:miter lim="800000"/></a:ln>"#,
            width
        )
        .map_err(fmt_error)?;
    }
    xml.push_str("</a:lnStyleLst>");
    xml.push_str("<a:effectStyleLst>");
    for _ in 0..3 {
        xml.push_str("<a:effectStyle><a:effectLst/></a:effectStyle>");
    }
    xml.push_str("</a:effectStyleLst>");
    xml.push_str("<a:bgFillStyleLst>");
    for _ in 0..3 {
        xml.push_str(r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#);
    }
    xml.push_str("</a:bgFillStyleLst>");
    xml.push_str("</a:fmtScheme>");

    xml.push_str("</a:themeElements><a:objectDefaults/><a:extraClrSchemeLst/></a:theme>");
    Ok(xml)
}

/// `ppt/presProps.xml`.
pub(crate) fn pres_props_xml() -> String {
    format!("{}<p:presentationPr {}/>", XML_DECL, PML_NAMESPACES)
}

/// `ppt/viewProps.xml`.
pub(crate) fn view_props_xml() -> String {
    format!(
        r#"{}<p:viewPr {}><p:gridSpacing cx="76200" cy="76200"/></p:viewPr>"#,
        XML_DECL, PML_NAMESPACES
    )
}

/// `ppt/tableStyles.xml`.
pub(crate) fn table_styles_xml() -> String {
    format!(
        r#"{}<a:tblStyleLst xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" def="{{5C22544A-7EE6-4342-B048-85BDC9FD1C3A}}"/>"#,
        XML_DECL
    )
}

fn push_rel(xml: &mut String, id: &str, rel_type: &str, target: &str) -> Result<()> {
    write!(
        xml,
        r#"<Relationship Id="{}" Type="{}" Target="{}"/>"#,
        id, rel_type, target
    )
    .map_err(fmt_error)
}

pub(crate) fn fmt_error(e: std::fmt::Error) -> Error {
    Error::XmlError(e.to_string())
}
