/// Text frame access for shapes.
///
/// Reading follows PowerPoint's text model: paragraphs are joined with a line
/// feed and a soft line break (`a:br`) reads as a vertical tab. Writing takes
/// the same form back apart.
use crate::common::xml::XmlElement;
use crate::ooxml::pptx::format::TextFormat;
use crate::ooxml::pptx::parts::theme::ColorContext;

/// Soft line break inside a paragraph.
pub const LINE_BREAK: char = '\u{b}';

/// Text of one `a:p`.
pub fn paragraph_text(p: &XmlElement) -> String {
    let mut out = String::new();
    for child in p.elements() {
        match child.local_name() {
            "r" | "fld" => {
                if let Some(t) = child.child("a:t") {
                    out.push_str(&t.text());
                }
            },
            "br" => out.push(LINE_BREAK),
            _ => {},
        }
    }
    out
}

/// Text of a `p:txBody` (or `a:txBody` inside table cells).
///
/// # Examples
///
/// ```rust,ignore
/// let body = shape.text_body().unwrap();
/// println!("{}", textframe::text(body));
/// ```
pub fn text(tx_body: &XmlElement) -> String {
    tx_body
        .children_named("a:p")
        .map(paragraph_text)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Replace the whole text of a text body.
///
/// One paragraph per line, every paragraph taking the first paragraph's
/// `a:pPr`, every run the first run's `a:rPr`, so a filled placeholder keeps
/// the formatting its template text had.
pub fn set_text(tx_body: &mut XmlElement, value: &str) {
    let first = tx_body.child("a:p");
    let ppr = first.and_then(|p| p.child("a:pPr")).cloned();
    let rpr = first
        .and_then(|p| p.children_named("a:r").next())
        .and_then(|r| r.child("a:rPr"))
        .cloned();
    let end_rpr = first.and_then(|p| p.child("a:endParaRPr")).cloned();

    tx_body.remove_elements(|el| el.is("a:p"));
    for line in value.split('\n') {
        let mut p = XmlElement::new("a:p");
        if let Some(ppr) = &ppr {
            p.push(ppr.clone());
        }
        for (i, piece) in line.split(LINE_BREAK).enumerate() {
            if i > 0 {
                let mut br = XmlElement::new("a:br");
                if let Some(rpr) = &rpr {
                    br.push(rpr.clone());
                }
                p.push(br);
            }
            if piece.is_empty() {
                continue;
            }
            let mut r = XmlElement::new("a:r");
            if let Some(rpr) = &rpr {
                r.push(rpr.clone());
            }
            r.push(XmlElement::new("a:t").with_text(piece));
            p.push(r);
        }
        if let Some(end_rpr) = &end_rpr {
            p.push(end_rpr.clone());
        }
        tx_body.push(p);
    }
}

/// The `p:txBody` of a `p:sp`, created empty if the shape has none.
pub fn ensure_text_body(sp: &mut XmlElement) -> &mut XmlElement {
    if sp.child("p:txBody").is_none() {
        let body = XmlElement::new("p:txBody")
            .with_child(XmlElement::new("a:bodyPr"))
            .with_child(XmlElement::new("a:lstStyle"))
            .with_child(XmlElement::new("a:p"));
        sp.insert_before("p:extLst", body);
    }
    sp.ensure_child("p:txBody")
}

/// Text and formatting of one run, ready to be written elsewhere.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSpec {
    /// May contain [`LINE_BREAK`]s.
    pub text: String,
    pub format: TextFormat,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParagraphSpec {
    /// `algn` value (`l`, `ctr`, `r`, `just`, ...)
    pub align: Option<String>,
    /// Outline level
    pub level: Option<u32>,
    pub runs: Vec<RunSpec>,
}

impl ParagraphSpec {
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

impl TextFormat {
    /// Read an `a:rPr` (or `a:endParaRPr`), resolving its fill color.
    pub fn from_rpr(rpr: &XmlElement, colors: &ColorContext) -> Self {
        let flag = |key: &str| rpr.attr(key).map(|v| v == "1" || v == "true");
        Self {
            font: rpr
                .child("a:latin")
                .and_then(|latin| latin.attr("typeface"))
                .map(str::to_string),
            size: rpr
                .attr("sz")
                .and_then(|v| v.parse::<u32>().ok())
                .map(|sz| f64::from(sz) / 100.0),
            bold: flag("b"),
            italic: flag("i"),
            fill: rpr.child("a:solidFill").map(|fill| colors.resolve_fill(fill)),
        }
    }
}

/// Read the paragraphs of a text body for re-creation on another slide.
///
/// A paragraph made of fields only (no `a:r`) is taken as plain text.
pub fn read_paragraphs(tx_body: &XmlElement, colors: &ColorContext) -> Vec<ParagraphSpec> {
    tx_body
        .children_named("a:p")
        .map(|p| {
            let ppr = p.child("a:pPr");
            let mut spec = ParagraphSpec {
                align: ppr.and_then(|ppr| ppr.attr("algn")).map(str::to_string),
                level: ppr.and_then(|ppr| ppr.attr("lvl")).and_then(|v| v.parse().ok()),
                runs: Vec::new(),
            };

            if p.child("a:r").is_none() {
                let plain = paragraph_text(p);
                if !plain.is_empty() {
                    spec.runs.push(RunSpec {
                        text: plain,
                        format: TextFormat::default(),
                    });
                }
                return spec;
            }

            for child in p.elements() {
                let format = || {
                    child
                        .child("a:rPr")
                        .map(|rpr| TextFormat::from_rpr(rpr, colors))
                        .unwrap_or_default()
                };
                match child.local_name() {
                    "r" | "fld" => spec.runs.push(RunSpec {
                        text: child.child("a:t").map(XmlElement::text).unwrap_or_default(),
                        format: format(),
                    }),
                    "br" => match spec.runs.last_mut() {
                        Some(last) => last.text.push(LINE_BREAK),
                        None => spec.runs.push(RunSpec {
                            text: LINE_BREAK.to_string(),
                            format: format(),
                        }),
                    },
                    _ => {},
                }
            }
            spec
        })
        .collect()
}

/// `Some(true)` for `wrap="square"`, `Some(false)` for `wrap="none"`.
pub fn word_wrap(tx_body: &XmlElement) -> Option<bool> {
    match tx_body.child("a:bodyPr")?.attr("wrap")? {
        "square" => Some(true),
        "none" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"<p:txBody><a:bodyPr wrap="none"/><a:lstStyle/>
        <a:p><a:pPr algn="ctr"/><a:r><a:rPr lang="nl-NL" sz="4400" b="1"><a:solidFill><a:schemeClr val="tx1"/></a:solidFill><a:latin typeface="Georgia"/></a:rPr><a:t>Welkom</a:t></a:r><a:br><a:rPr lang="nl-NL"/></a:br><a:r><a:rPr lang="nl-NL"/><a:t>allemaal</a:t></a:r></a:p>
        <a:p><a:fld id="{B6F15528}" type="slidenum"><a:t>3</a:t></a:fld></a:p>
        </p:txBody>"#;

    #[test]
    fn test_text() {
        let body = XmlElement::parse(BODY).unwrap();
        assert_eq!(text(&body), "Welkom\u{b}allemaal\n3");
        assert_eq!(word_wrap(&body), Some(false));
    }

    #[test]
    fn test_read_paragraphs() {
        let body = XmlElement::parse(BODY).unwrap();
        let paragraphs = read_paragraphs(&body, &ColorContext::default());
        assert_eq!(paragraphs.len(), 2);

        let first = &paragraphs[0];
        assert_eq!(first.align.as_deref(), Some("ctr"));
        assert_eq!(first.runs.len(), 2);
        assert_eq!(first.runs[0].text, "Welkom\u{b}");
        let format = &first.runs[0].format;
        assert_eq!(format.size, Some(44.0));
        assert_eq!(format.bold, Some(true));
        assert_eq!(format.font.as_deref(), Some("Georgia"));
        let fill = format.fill.as_ref().unwrap();
        assert_eq!(fill.child("a:srgbClr").unwrap().attr("val"), Some("000000"));

        // Field-only paragraph is plain text
        assert_eq!(paragraphs[1].text(), "3");
    }

    #[test]
    fn test_set_text_keeps_first_formatting() {
        let mut body = XmlElement::parse(BODY).unwrap();
        set_text(&mut body, "Psalm 23\nDe Heer\u{b}is mijn herder");
        assert_eq!(text(&body), "Psalm 23\nDe Heer\u{b}is mijn herder");

        let paragraphs: Vec<_> = body.children_named("a:p").collect();
        assert_eq!(paragraphs.len(), 2);
        for p in &paragraphs {
            assert_eq!(p.child("a:pPr").unwrap().attr("algn"), Some("ctr"));
            let rpr = p.child("a:r").unwrap().child("a:rPr").unwrap();
            assert_eq!(rpr.attr("sz"), Some("4400"));
        }
    }

    #[test]
    fn test_set_empty_text() {
        let mut body = XmlElement::parse(BODY).unwrap();
        set_text(&mut body, "");
        assert_eq!(body.children_named("a:p").count(), 1);
        assert_eq!(text(&body), "");
    }

    #[test]
    fn test_ensure_text_body() {
        let mut sp = XmlElement::parse("<p:sp><p:nvSpPr/><p:spPr/></p:sp>").unwrap();
        set_text(ensure_text_body(&mut sp), "Amen");
        assert_eq!(text(sp.child("p:txBody").unwrap()), "Amen");
        assert_eq!(sp.elements().last().unwrap().name(), "p:txBody");
    }
}
