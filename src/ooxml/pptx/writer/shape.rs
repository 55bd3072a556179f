/// XML for shapes created on a slide: text boxes, pictures and tables.
///
/// Each function returns one shape tree child as a string; the slide parses
/// it and inserts it with [`Slide::insert_shape`](crate::ooxml::pptx::Slide::insert_shape).
use crate::common::xml::escape_xml;
use crate::ooxml::error::Result;
use crate::ooxml::opc::constants::namespace;
use crate::ooxml::pptx::format::TextFormat;
use crate::ooxml::pptx::shapes::textframe::{LINE_BREAK, ParagraphSpec};
use crate::ooxml::pptx::shapes::{Geometry, PictureSpec, TableSpec};
use std::fmt::Write as FmtWrite;

fn write_xfrm(xml: &mut String, tag: &str, geometry: &Geometry) -> Result<()> {
    write!(
        xml,
        r#"<{0}><a:off x="{1}" y="{2}"/><a:ext cx="{3}" cy="{4}"/></{0}>"#,
        tag, geometry.x, geometry.y, geometry.cx, geometry.cy
    )?;
    Ok(())
}

fn write_rpr(xml: &mut String, tag: &str, format: &TextFormat) -> Result<()> {
    write!(xml, "<{}", tag)?;
    if let Some(size) = format.size {
        write!(xml, r#" sz="{}""#, (size * 100.0).round() as u32)?;
    }
    if let Some(bold) = format.bold {
        write!(xml, r#" b="{}""#, u8::from(bold))?;
    }
    if let Some(italic) = format.italic {
        write!(xml, r#" i="{}""#, u8::from(italic))?;
    }
    xml.push_str(r#" dirty="0""#);

    if format.fill.is_none() && format.font.is_none() {
        xml.push_str("/>");
        return Ok(());
    }
    xml.push('>');
    // CT_TextCharacterProperties: fill comes before the typefaces
    if let Some(fill) = &format.fill {
        xml.push_str(&fill.to_xml());
    }
    if let Some(font) = &format.font {
        write!(xml, r#"<a:latin typeface="{}"/>"#, escape_xml(font))?;
    }
    write!(xml, "</{}>", tag)?;
    Ok(())
}

fn write_paragraph(xml: &mut String, paragraph: &ParagraphSpec) -> Result<()> {
    xml.push_str("<a:p>");
    if paragraph.align.is_some() || paragraph.level.is_some() {
        xml.push_str("<a:pPr");
        if let Some(level) = paragraph.level {
            write!(xml, r#" lvl="{}""#, level)?;
        }
        if let Some(align) = &paragraph.align {
            write!(xml, r#" algn="{}""#, escape_xml(align))?;
        }
        xml.push_str("/>");
    }

    for run in &paragraph.runs {
        for (i, piece) in run.text.split(LINE_BREAK).enumerate() {
            if i > 0 {
                xml.push_str("<a:br>");
                write_rpr(xml, "a:rPr", &run.format)?;
                xml.push_str("</a:br>");
            }
            if piece.is_empty() {
                continue;
            }
            xml.push_str("<a:r>");
            write_rpr(xml, "a:rPr", &run.format)?;
            write!(xml, "<a:t>{}</a:t>", escape_xml(piece))?;
            xml.push_str("</a:r>");
        }
    }

    if let Some(last) = paragraph.runs.last() {
        write_rpr(xml, "a:endParaRPr", &last.format)?;
    }
    xml.push_str("</a:p>");
    Ok(())
}

/// A text box (`txBox="1"`) holding `paragraphs`.
///
/// `wrap` of `None` leaves the PowerPoint default (square).
pub fn text_box_xml(
    id: u32,
    name: &str,
    geometry: &Geometry,
    wrap: Option<bool>,
    paragraphs: &[ParagraphSpec],
) -> Result<String> {
    let mut xml = String::with_capacity(512);
    xml.push_str("<p:sp>");
    xml.push_str("<p:nvSpPr>");
    write!(xml, r#"<p:cNvPr id="{}" name="{}"/>"#, id, escape_xml(name))?;
    xml.push_str(r#"<p:cNvSpPr txBox="1"/>"#);
    xml.push_str("<p:nvPr/>");
    xml.push_str("</p:nvSpPr>");

    xml.push_str("<p:spPr>");
    write_xfrm(&mut xml, "a:xfrm", geometry)?;
    xml.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom>"#);
    xml.push_str("<a:noFill/>");
    xml.push_str("</p:spPr>");

    xml.push_str("<p:txBody>");
    match wrap {
        Some(false) => xml.push_str(r#"<a:bodyPr wrap="none" rtlCol="0">"#),
        _ => xml.push_str(r#"<a:bodyPr wrap="square" rtlCol="0">"#),
    }
    xml.push_str("<a:noAutofit/>");
    xml.push_str("</a:bodyPr>");
    xml.push_str("<a:lstStyle/>");
    if paragraphs.is_empty() {
        xml.push_str("<a:p/>");
    }
    for paragraph in paragraphs {
        write_paragraph(&mut xml, paragraph)?;
    }
    xml.push_str("</p:txBody>");
    xml.push_str("</p:sp>");
    Ok(xml)
}

/// A picture showing the image related as `r_id`.
pub fn picture_xml(id: u32, picture: &PictureSpec, r_id: &str, geometry: &Geometry) -> Result<String> {
    let mut xml = String::with_capacity(512);
    xml.push_str("<p:pic>");
    xml.push_str("<p:nvPicPr>");
    write!(xml, r#"<p:cNvPr id="{}" name="{}""#, id, escape_xml(&picture.name))?;
    if let Some(descr) = &picture.descr {
        write!(xml, r#" descr="{}""#, escape_xml(descr))?;
    }
    xml.push_str("/>");
    xml.push_str(r#"<p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr>"#);
    xml.push_str("<p:nvPr/>");
    xml.push_str("</p:nvPicPr>");

    xml.push_str("<p:blipFill>");
    write!(xml, r#"<a:blip r:embed="{}"/>"#, escape_xml(r_id))?;
    if let Some(src_rect) = &picture.src_rect {
        xml.push_str(&src_rect.to_xml());
    }
    xml.push_str("<a:stretch><a:fillRect/></a:stretch>");
    xml.push_str("</p:blipFill>");

    xml.push_str("<p:spPr>");
    write_xfrm(&mut xml, "a:xfrm", geometry)?;
    xml.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom>"#);
    xml.push_str("</p:spPr>");
    xml.push_str("</p:pic>");
    Ok(xml)
}

/// A table with the grid, text, alignment and merges of `table`.
pub fn table_xml(id: u32, name: &str, geometry: &Geometry, table: &TableSpec) -> Result<String> {
    let mut xml = String::with_capacity(1024);
    xml.push_str("<p:graphicFrame>");
    xml.push_str("<p:nvGraphicFramePr>");
    write!(xml, r#"<p:cNvPr id="{}" name="{}"/>"#, id, escape_xml(name))?;
    xml.push_str(r#"<p:cNvGraphicFramePr><a:graphicFrameLocks noGrp="1"/></p:cNvGraphicFramePr>"#);
    xml.push_str("<p:nvPr/>");
    xml.push_str("</p:nvGraphicFramePr>");
    write_xfrm(&mut xml, "p:xfrm", geometry)?;

    xml.push_str("<a:graphic>");
    write!(xml, r#"<a:graphicData uri="{}">"#, namespace::DML_TABLE_URI)?;
    xml.push_str("<a:tbl>");
    xml.push_str(r#"<a:tblPr firstRow="1" bandRow="1">"#);
    if let Some(style_id) = &table.style_id {
        write!(xml, "<a:tableStyleId>{}</a:tableStyleId>", escape_xml(style_id))?;
    }
    xml.push_str("</a:tblPr>");

    xml.push_str("<a:tblGrid>");
    for width in &table.col_widths {
        write!(xml, r#"<a:gridCol w="{}"/>"#, width)?;
    }
    xml.push_str("</a:tblGrid>");

    for row in &table.rows {
        write!(xml, r#"<a:tr h="{}">"#, row.height)?;
        for cell in &row.cells {
            xml.push_str("<a:tc");
            if let Some(span) = cell.grid_span {
                write!(xml, r#" gridSpan="{}""#, span)?;
            }
            if let Some(span) = cell.row_span {
                write!(xml, r#" rowSpan="{}""#, span)?;
            }
            if cell.h_merge {
                xml.push_str(r#" hMerge="1""#);
            }
            if cell.v_merge {
                xml.push_str(r#" vMerge="1""#);
            }
            xml.push('>');

            xml.push_str("<a:txBody><a:bodyPr/><a:lstStyle/>");
            if cell.paragraphs.is_empty() {
                xml.push_str("<a:p/>");
            }
            for (align, text) in &cell.paragraphs {
                xml.push_str("<a:p>");
                if let Some(align) = align {
                    write!(xml, r#"<a:pPr algn="{}"/>"#, escape_xml(align))?;
                }
                if !text.is_empty() {
                    write!(xml, "<a:r><a:t>{}</a:t></a:r>", escape_xml(text))?;
                }
                xml.push_str("</a:p>");
            }
            xml.push_str("</a:txBody>");

            match &cell.anchor {
                Some(anchor) => write!(xml, r#"<a:tcPr anchor="{}"/>"#, escape_xml(anchor))?,
                None => xml.push_str("<a:tcPr/>"),
            }
            xml.push_str("</a:tc>");
        }
        xml.push_str("</a:tr>");
    }

    xml.push_str("</a:tbl>");
    xml.push_str("</a:graphicData>");
    xml.push_str("</a:graphic>");
    xml.push_str("</p:graphicFrame>");
    Ok(xml)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::xml::XmlElement;
    use crate::ooxml::pptx::shapes::textframe::{self, RunSpec};
    use crate::ooxml::pptx::shapes::{CellSpec, RowSpec, Shape, ShapeKind};

    fn run(text: &str, format: TextFormat) -> RunSpec {
        RunSpec {
            text: text.to_string(),
            format,
        }
    }

    #[test]
    fn test_text_box() {
        let fill = XmlElement::parse(r#"<a:solidFill><a:srgbClr val="FF0000"/></a:solidFill>"#).unwrap();
        let paragraphs = vec![ParagraphSpec {
            align: Some("ctr".to_string()),
            level: None,
            runs: vec![
                run(
                    "Zingen & bidden\u{b}",
                    TextFormat {
                        font: Some("Georgia".to_string()),
                        size: Some(44.0),
                        bold: Some(true),
                        italic: None,
                        fill: Some(fill),
                    },
                ),
                run("samen", TextFormat::default()),
            ],
        }];
        let xml = text_box_xml(7, "TextBox 6", &Geometry::new(1, 2, 3, 4), Some(true), &paragraphs).unwrap();
        // Fill precedes latin inside rPr
        let fill_at = xml.find("<a:solidFill>").unwrap();
        let latin_at = xml.find("<a:latin").unwrap();
        assert!(fill_at < latin_at);

        let sp = XmlElement::parse(&xml).unwrap();
        let shape = Shape::from_element(&sp).unwrap();
        assert_eq!(shape.kind(), ShapeKind::Text);
        assert_eq!(shape.id(), Some(7));
        assert_eq!(shape.geometry(), Some(Geometry::new(1, 2, 3, 4)));
        assert_eq!(textframe::text(shape.text_body().unwrap()), "Zingen & bidden\u{b}samen");
        let rpr = sp.find(&["p:txBody", "a:p", "a:r", "a:rPr"]).unwrap();
        assert_eq!(rpr.attr("sz"), Some("4400"));
        assert_eq!(rpr.attr("b"), Some("1"));
    }

    #[test]
    fn test_table() {
        let table = TableSpec {
            col_widths: vec![100, 200],
            rows: vec![RowSpec {
                height: 50,
                cells: vec![
                    CellSpec {
                        paragraphs: vec![(Some("r".to_string()), "1".to_string())],
                        ..CellSpec::default()
                    },
                    CellSpec {
                        paragraphs: vec![(None, String::new())],
                        v_merge: true,
                        ..CellSpec::default()
                    },
                ],
            }],
            style_id: None,
        };
        let xml = table_xml(3, "Table 2", &Geometry::new(0, 0, 300, 50), &table).unwrap();
        let frame = XmlElement::parse(&xml).unwrap();
        assert_eq!(Shape::from_element(&frame).unwrap().kind(), ShapeKind::Table);
        assert_eq!(TableSpec::from_graphic_frame(&frame).unwrap(), table);
    }
}
