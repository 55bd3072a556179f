//! Fillable fields on a slide.
//!
//! A slide has two kinds of fields. Placeholder fields are the native
//! content slots of its layout, named after their placeholder type
//! (`TITLE`, `BODY`, `BODY_2`, ...). Text-pattern fields are `{NAME}`
//! tokens typed anywhere in the slide's text.
//!
//! Extraction and filling derive placeholder names with the same
//! function, so a name read from a slide always fills the same shape.
//!
//! # Examples
//!
//! ```rust,no_run
//! use liturgy_deck::fields::{self, FieldValues};
//! use liturgy_deck::ooxml::pptx::Presentation;
//!
//! let mut pres = Presentation::open("Algemeen/Welkom.pptx")?;
//! let mut slide = pres.slide(0)?;
//! for field in fields::extract_fields(&slide) {
//!     println!("{} = {:?}", field.name, field.current_value);
//! }
//!
//! let mut values = FieldValues::new();
//! values.insert("TITLE".into(), "Goede morgen".into());
//! fields::fill_fields(&mut slide, &values);
//! pres.save_slide(&slide)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod token;

use crate::ooxml::pptx::Slide;
use crate::ooxml::pptx::shapes::textframe;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

/// Field name to value.
pub type FieldValues = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    /// A native placeholder. `position` is the shape's index among the
    /// shape tree's child elements, `idx` its `p:ph/@idx`.
    Placeholder { position: usize, idx: u32 },
    /// A `{NAME}` token in run text.
    TextPattern,
}

/// A field found on a slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub name: String,
    #[serde(flatten)]
    pub kind: FieldKind,
    /// Placeholder text, or the literal token for text-pattern fields.
    pub current_value: String,
}

impl Field {
    #[inline]
    pub fn is_placeholder(&self) -> bool {
        matches!(self.kind, FieldKind::Placeholder { .. })
    }
}

/// Placeholder names in document order, duplicates numbered from `_2`.
fn placeholder_names(slide: &Slide) -> Vec<(String, usize, u32)> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    slide
        .placeholders()
        .into_iter()
        .map(|(position, ph)| {
            let base = ph.base_field_name();
            let count = seen.entry(base.to_string()).or_insert(0);
            *count += 1;
            let name = if *count == 1 {
                base.into_owned()
            } else {
                format!("{}_{}", base, count)
            };
            (name, position, ph.idx)
        })
        .collect()
}

/// Every field on `slide`: placeholders first, then text-pattern tokens,
/// each in document order.
pub fn extract_fields(slide: &Slide) -> Vec<Field> {
    let Some(tree) = slide.sp_tree() else {
        return Vec::new();
    };
    let shapes: Vec<_> = tree.elements().collect();

    let mut fields: Vec<Field> = placeholder_names(slide)
        .into_iter()
        .map(|(name, position, idx)| {
            let current_value = shapes
                .get(position)
                .and_then(|sp| sp.child("p:txBody"))
                .map(textframe::text)
                .unwrap_or_default();
            Field {
                name,
                kind: FieldKind::Placeholder { position, idx },
                current_value,
            }
        })
        .collect();

    let mut tokens: HashSet<String> = HashSet::new();
    for run in tree.descendants().filter(|el| el.is("a:r")) {
        let Some(t) = run.child("a:t") else {
            continue;
        };
        let text = t.text();
        for name in token::token_names(&text) {
            if tokens.insert(name.to_string()) {
                fields.push(Field {
                    name: name.to_string(),
                    kind: FieldKind::TextPattern,
                    current_value: token::token(name),
                });
            }
        }
    }
    fields
}

/// Names of [`extract_fields`], in the same order.
pub fn field_names(slide: &Slide) -> Vec<String> {
    extract_fields(slide).into_iter().map(|f| f.name).collect()
}

/// Write `values` into `slide`.
///
/// A placeholder whose name is in `values` gets its whole text replaced;
/// a `{NAME}` token whose name is in `values` is replaced inside its run.
/// Names that match nothing are ignored. Returns how many placeholders
/// and runs changed.
pub fn fill_fields(slide: &mut Slide, values: &FieldValues) -> usize {
    if values.is_empty() {
        return 0;
    }
    let targets: Vec<(usize, &String)> = placeholder_names(slide)
        .into_iter()
        .filter_map(|(name, position, _)| values.get_key_value(&name).map(|(_, v)| (position, v)))
        .collect();

    let Some(tree) = slide.sp_tree_mut() else {
        return 0;
    };
    let mut changed = 0;

    for (position, value) in targets {
        if let Some(sp) = tree.elements_mut().nth(position) {
            textframe::set_text(textframe::ensure_text_body(sp), value);
            changed += 1;
        }
    }

    tree.walk_mut(&mut |el| {
        if !el.is("a:r") {
            return;
        }
        let Some(t) = el.child_mut("a:t") else {
            return;
        };
        let text = t.text();
        let filled = token::substitute(&text, values);
        if filled != text {
            let filled = filled.into_owned();
            t.set_text(filled);
            changed += 1;
        }
    });

    debug!(changed, values = values.len(), "filled slide fields");
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::xml::XmlElement;
    use crate::ooxml::opc::PackURI;
    use proptest::prelude::*;

    const PH_SLIDE: &str = r#"<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree>
        <p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>
        <p:sp><p:nvSpPr><p:cNvPr id="2" name="Title 1"/><p:cNvSpPr/><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:p><a:r><a:rPr lang="nl-NL" b="1"/><a:t>Welkom</a:t></a:r></a:p></p:txBody></p:sp>
        <p:sp><p:nvSpPr><p:cNvPr id="3" name="Content 2"/><p:cNvSpPr/><p:nvPr><p:ph type="body" idx="1"/></p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:p><a:r><a:t>Voorganger: {Voorganger}</a:t></a:r></a:p></p:txBody></p:sp>
        <p:sp><p:nvSpPr><p:cNvPr id="4" name="Content 3"/><p:cNvSpPr/><p:nvPr><p:ph type="body" idx="2"/></p:nvPr></p:nvSpPr><p:spPr/></p:sp>
        <p:sp><p:nvSpPr><p:cNvPr id="5" name="Odd 4"/><p:cNvSpPr/><p:nvPr><p:ph type="vertBody" idx="7"/></p:nvPr></p:nvSpPr><p:spPr/></p:sp>
        <p:sp><p:nvSpPr><p:cNvPr id="6" name="TextBox 5"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:p><a:r><a:t>{Datum} om {Tijd}, {Datum}</a:t></a:r></a:p></p:txBody></p:sp>
        </p:spTree></p:cSld></p:sld>"#;

    fn slide() -> Slide {
        Slide::new(
            PackURI::new("/ppt/slides/slide1.xml").unwrap(),
            XmlElement::parse(PH_SLIDE).unwrap(),
        )
    }

    fn values(pairs: &[(&str, &str)]) -> FieldValues {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_extract_order_and_names() {
        let fields = extract_fields(&slide());
        let names: Vec<_> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            ["TITLE", "BODY", "BODY_2", "PLACEHOLDER_7", "Voorganger", "Datum", "Tijd"]
        );
        assert_eq!(fields[0].current_value, "Welkom");
        assert_eq!(fields[2].current_value, "");
        assert_eq!(fields[5].current_value, "{Datum}");
        assert_eq!(fields[1].kind, FieldKind::Placeholder { position: 3, idx: 1 });
        assert!(!fields[4].is_placeholder());
    }

    #[test]
    fn test_fill_placeholders_and_tokens() {
        let mut slide = slide();
        let changed = fill_fields(
            &mut slide,
            &values(&[
                ("TITLE", "Goede morgen"),
                ("BODY_2", "Psalm 23"),
                ("Datum", "12 oktober"),
                ("Nergens", "ignored"),
            ]),
        );
        assert_eq!(changed, 3);

        let fields = extract_fields(&slide);
        assert_eq!(fields[0].current_value, "Goede morgen");
        assert_eq!(fields[2].name, "BODY_2");
        assert_eq!(fields[2].current_value, "Psalm 23");

        let text = slide.root().to_xml();
        assert!(text.contains("12 oktober om {Tijd}, 12 oktober"));
        assert!(text.contains("{Voorganger}"));
        // the title run keeps its formatting
        assert!(text.contains(r#"<a:rPr lang="nl-NL" b="1"/><a:t>Goede morgen</a:t>"#));
    }

    #[test]
    fn test_fill_with_nothing_is_noop() {
        let mut slide = slide();
        let before = slide.root().to_xml();
        assert_eq!(fill_fields(&mut slide, &FieldValues::new()), 0);
        assert_eq!(fill_fields(&mut slide, &values(&[("Unknown", "x")])), 0);
        assert_eq!(slide.root().to_xml(), before);
    }

    #[test]
    fn test_names_are_deterministic() {
        let slide = slide();
        assert_eq!(field_names(&slide), field_names(&slide));
    }

    proptest! {
        #[test]
        fn prop_extract_then_fill_leaves_no_token(value in "[A-Za-z0-9 ]{0,16}") {
            let mut slide = slide();
            let map: FieldValues = extract_fields(&slide)
                .into_iter()
                .map(|f| (f.name, value.clone()))
                .collect();
            fill_fields(&mut slide, &map);
            let xml = slide.root().to_xml();
            for name in map.keys() {
                prop_assert!(!xml.contains(&token::token(name)));
            }
        }
    }
}
