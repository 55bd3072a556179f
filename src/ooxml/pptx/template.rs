//! Presentation template module.
//!
//! A minimal valid 16:9 presentation with no slides: one master, a "Title
//! Slide" and a "Blank" layout, the Office theme and the property parts
//! PowerPoint expects. Stub decks and the empty-plan output start from here.

use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::opc::constants::{content_type as ct, relationship_type as rt};
use crate::ooxml::opc::{OpcPackage, PackURI, Part, XmlPart};
use crate::ooxml::pptx::parts::theme::Theme;

/// 13.333 in.
pub const WIDESCREEN_CX: i64 = 12_192_000;
/// 7.5 in.
pub const WIDESCREEN_CY: i64 = 6_858_000;

const NS_DECLS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;

const XML_HEAD: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\r\n";

/// An empty presentation: masters and layouts but no slides.
pub fn presentation_xml() -> String {
    format!(
        concat!(
            "{head}<p:presentation {ns} saveSubsetFonts=\"1\">",
            "<p:sldMasterIdLst><p:sldMasterId id=\"2147483648\" r:id=\"rId1\"/></p:sldMasterIdLst>",
            "<p:sldSz cx=\"{cx}\" cy=\"{cy}\"/>",
            "<p:notesSz cx=\"6858000\" cy=\"9144000\"/>",
            "<p:defaultTextStyle>",
            "<a:defPPr><a:defRPr lang=\"nl-NL\"/></a:defPPr>",
            "<a:lvl1pPr marL=\"0\" algn=\"l\" defTabSz=\"914400\" rtl=\"0\" eaLnBrk=\"1\" latinLnBrk=\"0\" hangingPunct=\"1\">",
            "<a:defRPr sz=\"1800\" kern=\"1200\"><a:solidFill><a:schemeClr val=\"tx1\"/></a:solidFill>",
            "<a:latin typeface=\"+mn-lt\"/><a:ea typeface=\"+mn-ea\"/><a:cs typeface=\"+mn-cs\"/></a:defRPr>",
            "</a:lvl1pPr>",
            "</p:defaultTextStyle>",
            "</p:presentation>"
        ),
        head = XML_HEAD,
        ns = NS_DECLS,
        cx = WIDESCREEN_CX,
        cy = WIDESCREEN_CY,
    )
}

/// Slide master with title and body placeholders.
pub fn slide_master_xml() -> String {
    format!(
        concat!(
            "{head}<p:sldMaster {ns}>",
            "<p:cSld><p:bg><p:bgRef idx=\"1001\"><a:schemeClr val=\"bg1\"/></p:bgRef></p:bg>",
            "<p:spTree>",
            "<p:nvGrpSpPr><p:cNvPr id=\"1\" name=\"\"/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>",
            "<p:grpSpPr><a:xfrm><a:off x=\"0\" y=\"0\"/><a:ext cx=\"0\" cy=\"0\"/><a:chOff x=\"0\" y=\"0\"/><a:chExt cx=\"0\" cy=\"0\"/></a:xfrm></p:grpSpPr>",
            "<p:sp><p:nvSpPr><p:cNvPr id=\"2\" name=\"Title Placeholder 1\"/><p:cNvSpPr><a:spLocks noGrp=\"1\"/></p:cNvSpPr><p:nvPr><p:ph type=\"title\"/></p:nvPr></p:nvSpPr>",
            "<p:spPr><a:xfrm><a:off x=\"838200\" y=\"365125\"/><a:ext cx=\"10515600\" cy=\"1325563\"/></a:xfrm><a:prstGeom prst=\"rect\"><a:avLst/></a:prstGeom></p:spPr>",
            "<p:txBody><a:bodyPr vert=\"horz\" lIns=\"91440\" tIns=\"45720\" rIns=\"91440\" bIns=\"45720\" rtlCol=\"0\" anchor=\"ctr\"><a:normAutofit/></a:bodyPr><a:lstStyle/>",
            "<a:p><a:r><a:rPr lang=\"nl-NL\"/><a:t>Click to edit Master title style</a:t></a:r></a:p></p:txBody></p:sp>",
            "<p:sp><p:nvSpPr><p:cNvPr id=\"3\" name=\"Text Placeholder 2\"/><p:cNvSpPr><a:spLocks noGrp=\"1\"/></p:cNvSpPr><p:nvPr><p:ph type=\"body\" idx=\"1\"/></p:nvPr></p:nvSpPr>",
            "<p:spPr><a:xfrm><a:off x=\"838200\" y=\"1825625\"/><a:ext cx=\"10515600\" cy=\"4351338\"/></a:xfrm><a:prstGeom prst=\"rect\"><a:avLst/></a:prstGeom></p:spPr>",
            "<p:txBody><a:bodyPr vert=\"horz\" lIns=\"91440\" tIns=\"45720\" rIns=\"91440\" bIns=\"45720\" rtlCol=\"0\"><a:normAutofit/></a:bodyPr><a:lstStyle/>",
            "<a:p><a:pPr lvl=\"0\"/><a:r><a:rPr lang=\"nl-NL\"/><a:t>Click to edit Master text styles</a:t></a:r></a:p></p:txBody></p:sp>",
            "</p:spTree></p:cSld>",
            "<p:clrMap bg1=\"lt1\" tx1=\"dk1\" bg2=\"lt2\" tx2=\"dk2\" accent1=\"accent1\" accent2=\"accent2\" accent3=\"accent3\" accent4=\"accent4\" accent5=\"accent5\" accent6=\"accent6\" hlink=\"hlink\" folHlink=\"folHlink\"/>",
            "<p:sldLayoutIdLst><p:sldLayoutId id=\"2147483649\" r:id=\"rId1\"/><p:sldLayoutId id=\"2147483650\" r:id=\"rId2\"/></p:sldLayoutIdLst>",
            "<p:txStyles>",
            "<p:titleStyle><a:lvl1pPr algn=\"l\" defTabSz=\"914400\" rtl=\"0\" eaLnBrk=\"1\" latinLnBrk=\"0\" hangingPunct=\"1\"><a:lnSpc><a:spcPct val=\"90000\"/></a:lnSpc><a:spcBef><a:spcPct val=\"0\"/></a:spcBef><a:buNone/>",
            "<a:defRPr sz=\"4400\" kern=\"1200\"><a:solidFill><a:schemeClr val=\"tx1\"/></a:solidFill><a:latin typeface=\"+mj-lt\"/><a:ea typeface=\"+mj-ea\"/><a:cs typeface=\"+mj-cs\"/></a:defRPr></a:lvl1pPr></p:titleStyle>",
            "<p:bodyStyle><a:lvl1pPr marL=\"228600\" indent=\"-228600\" algn=\"l\" defTabSz=\"914400\" rtl=\"0\" eaLnBrk=\"1\" latinLnBrk=\"0\" hangingPunct=\"1\"><a:lnSpc><a:spcPct val=\"90000\"/></a:lnSpc><a:spcBef><a:spcPts val=\"1000\"/></a:spcBef><a:buFont typeface=\"Arial\"/><a:buChar char=\"&#8226;\"/>",
            "<a:defRPr sz=\"2800\" kern=\"1200\"><a:solidFill><a:schemeClr val=\"tx1\"/></a:solidFill><a:latin typeface=\"+mn-lt\"/><a:ea typeface=\"+mn-ea\"/><a:cs typeface=\"+mn-cs\"/></a:defRPr></a:lvl1pPr></p:bodyStyle>",
            "<p:otherStyle><a:defPPr><a:defRPr lang=\"nl-NL\"/></a:defPPr></p:otherStyle>",
            "</p:txStyles>",
            "</p:sldMaster>"
        ),
        head = XML_HEAD,
        ns = NS_DECLS,
    )
}

/// "Title Slide" layout: center title and subtitle.
pub fn title_layout_xml() -> String {
    format!(
        concat!(
            "{head}<p:sldLayout {ns} type=\"title\" preserve=\"1\">",
            "<p:cSld name=\"Title Slide\"><p:spTree>",
            "<p:nvGrpSpPr><p:cNvPr id=\"1\" name=\"\"/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>",
            "<p:grpSpPr><a:xfrm><a:off x=\"0\" y=\"0\"/><a:ext cx=\"0\" cy=\"0\"/><a:chOff x=\"0\" y=\"0\"/><a:chExt cx=\"0\" cy=\"0\"/></a:xfrm></p:grpSpPr>",
            "<p:sp><p:nvSpPr><p:cNvPr id=\"2\" name=\"Title 1\"/><p:cNvSpPr><a:spLocks noGrp=\"1\"/></p:cNvSpPr><p:nvPr><p:ph type=\"ctrTitle\"/></p:nvPr></p:nvSpPr>",
            "<p:spPr><a:xfrm><a:off x=\"1524000\" y=\"1122363\"/><a:ext cx=\"9144000\" cy=\"2387600\"/></a:xfrm></p:spPr>",
            "<p:txBody><a:bodyPr anchor=\"b\"/><a:lstStyle><a:lvl1pPr algn=\"ctr\"><a:defRPr sz=\"6000\"/></a:lvl1pPr></a:lstStyle>",
            "<a:p><a:r><a:rPr lang=\"nl-NL\"/><a:t>Click to edit Master title style</a:t></a:r></a:p></p:txBody></p:sp>",
            "<p:sp><p:nvSpPr><p:cNvPr id=\"3\" name=\"Subtitle 2\"/><p:cNvSpPr><a:spLocks noGrp=\"1\"/></p:cNvSpPr><p:nvPr><p:ph type=\"subTitle\" idx=\"1\"/></p:nvPr></p:nvSpPr>",
            "<p:spPr><a:xfrm><a:off x=\"1524000\" y=\"3602038\"/><a:ext cx=\"9144000\" cy=\"1655762\"/></a:xfrm></p:spPr>",
            "<p:txBody><a:bodyPr/><a:lstStyle><a:lvl1pPr marL=\"0\" indent=\"0\" algn=\"ctr\"><a:buNone/><a:defRPr sz=\"2400\"/></a:lvl1pPr></a:lstStyle>",
            "<a:p><a:r><a:rPr lang=\"nl-NL\"/><a:t>Click to edit Master subtitle style</a:t></a:r></a:p></p:txBody></p:sp>",
            "</p:spTree></p:cSld>",
            "<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>",
            "</p:sldLayout>"
        ),
        head = XML_HEAD,
        ns = NS_DECLS,
    )
}

/// "Blank" layout: no placeholders.
pub fn blank_layout_xml() -> String {
    format!(
        concat!(
            "{head}<p:sldLayout {ns} type=\"blank\" preserve=\"1\">",
            "<p:cSld name=\"Blank\"><p:spTree>",
            "<p:nvGrpSpPr><p:cNvPr id=\"1\" name=\"\"/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>",
            "<p:grpSpPr><a:xfrm><a:off x=\"0\" y=\"0\"/><a:ext cx=\"0\" cy=\"0\"/><a:chOff x=\"0\" y=\"0\"/><a:chExt cx=\"0\" cy=\"0\"/></a:xfrm></p:grpSpPr>",
            "</p:spTree></p:cSld>",
            "<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>",
            "</p:sldLayout>"
        ),
        head = XML_HEAD,
        ns = NS_DECLS,
    )
}

/// Root element of a new, empty slide.
pub fn slide_xml() -> String {
    format!(
        concat!(
            "<p:sld {ns}><p:cSld><p:spTree>",
            "<p:nvGrpSpPr><p:cNvPr id=\"1\" name=\"\"/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>",
            "<p:grpSpPr><a:xfrm><a:off x=\"0\" y=\"0\"/><a:ext cx=\"0\" cy=\"0\"/><a:chOff x=\"0\" y=\"0\"/><a:chExt cx=\"0\" cy=\"0\"/></a:xfrm></p:grpSpPr>",
            "</p:spTree></p:cSld>",
            "<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>",
            "</p:sld>"
        ),
        ns = NS_DECLS,
    )
}

pub fn pres_props_xml() -> String {
    format!("{}<p:presentationPr {}/>", XML_HEAD, NS_DECLS)
}

pub fn view_props_xml() -> String {
    format!(
        concat!(
            "{}<p:viewPr {}>",
            "<p:normalViewPr><p:restoredLeft sz=\"15620\"/><p:restoredTop sz=\"94660\"/></p:normalViewPr>",
            "<p:gridSpacing cx=\"76200\" cy=\"76200\"/>",
            "</p:viewPr>"
        ),
        XML_HEAD, NS_DECLS
    )
}

pub fn table_styles_xml() -> String {
    format!(
        "{}<a:tblStyleLst xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\" def=\"{{5C22544A-7EE6-4342-B048-85BDC9FD1C3A}}\"/>",
        XML_HEAD
    )
}

pub fn core_props_xml() -> String {
    format!(
        concat!(
            "{}<cp:coreProperties xmlns:cp=\"http://schemas.openxmlformats.org/package/2006/metadata/core-properties\" ",
            "xmlns:dc=\"http://purl.org/dc/elements/1.1/\" xmlns:dcterms=\"http://purl.org/dc/terms/\" ",
            "xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\">",
            "<dc:title>Liturgy</dc:title><cp:revision>1</cp:revision>",
            "</cp:coreProperties>"
        ),
        XML_HEAD
    )
}

pub fn app_props_xml() -> String {
    format!(
        concat!(
            "{}<Properties xmlns=\"http://schemas.openxmlformats.org/officeDocument/2006/extended-properties\">",
            "<Application>Microsoft Office PowerPoint</Application><PresentationFormat>Widescreen</PresentationFormat>",
            "</Properties>"
        ),
        XML_HEAD
    )
}

fn uri(s: &str) -> Result<PackURI> {
    PackURI::new(s).map_err(OoxmlError::InvalidFormat)
}

/// Assemble the template into a package.
pub fn blank_widescreen() -> Result<OpcPackage> {
    let mut opc = OpcPackage::new();

    let pres_uri = uri("/ppt/presentation.xml")?;
    let master_uri = uri("/ppt/slideMasters/slideMaster1.xml")?;
    let title_layout_uri = uri("/ppt/slideLayouts/slideLayout1.xml")?;
    let blank_layout_uri = uri("/ppt/slideLayouts/slideLayout2.xml")?;
    let theme_uri = uri("/ppt/theme/theme1.xml")?;
    let pres_props_uri = uri("/ppt/presProps.xml")?;
    let view_props_uri = uri("/ppt/viewProps.xml")?;
    let table_styles_uri = uri("/ppt/tableStyles.xml")?;
    let core_uri = uri("/docProps/core.xml")?;
    let app_uri = uri("/docProps/app.xml")?;

    let part = |partname: &PackURI, content_type: &str, xml: String| {
        XmlPart::new(partname.clone(), content_type.to_string(), xml.into_bytes())
    };

    // rIds inside the master and presentation XML above are fixed, so the
    // relationships are added in matching order.
    let mut master = part(&master_uri, ct::PML_SLIDE_MASTER, slide_master_xml());
    master.relate_to(&title_layout_uri, rt::SLIDE_LAYOUT);
    master.relate_to(&blank_layout_uri, rt::SLIDE_LAYOUT);
    master.relate_to(&theme_uri, rt::THEME);

    let mut pres = part(&pres_uri, ct::PML_PRESENTATION_MAIN, presentation_xml());
    pres.relate_to(&master_uri, rt::SLIDE_MASTER);
    pres.relate_to(&pres_props_uri, rt::PRES_PROPS);
    pres.relate_to(&view_props_uri, rt::VIEW_PROPS);
    pres.relate_to(&theme_uri, rt::THEME);
    pres.relate_to(&table_styles_uri, rt::TABLE_STYLES);

    for layout_uri in [&title_layout_uri, &blank_layout_uri] {
        let xml = if layout_uri == &title_layout_uri {
            title_layout_xml()
        } else {
            blank_layout_xml()
        };
        let mut layout = part(layout_uri, ct::PML_SLIDE_LAYOUT, xml);
        layout.relate_to(&master_uri, rt::SLIDE_MASTER);
        opc.add_part(Box::new(layout));
    }

    opc.add_part(Box::new(pres));
    opc.add_part(Box::new(master));
    opc.add_part(Box::new(part(&theme_uri, ct::OFC_THEME, Theme::office().to_xml()?)));
    opc.add_part(Box::new(part(&pres_props_uri, ct::PML_PRES_PROPS, pres_props_xml())));
    opc.add_part(Box::new(part(&view_props_uri, ct::PML_VIEW_PROPS, view_props_xml())));
    opc.add_part(Box::new(part(&table_styles_uri, ct::PML_TABLE_STYLES, table_styles_xml())));
    opc.add_part(Box::new(part(&core_uri, ct::OPC_CORE_PROPERTIES, core_props_xml())));
    opc.add_part(Box::new(part(&app_uri, ct::OFC_EXTENDED_PROPERTIES, app_props_xml())));

    opc.relate_to(&pres_uri, rt::OFFICE_DOCUMENT);
    opc.relate_to(&core_uri, rt::CORE_PROPERTIES);
    opc.relate_to(&app_uri, rt::EXTENDED_PROPERTIES);

    Ok(opc)
}
