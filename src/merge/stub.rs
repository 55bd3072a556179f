//! One-slide stand-in decks for liturgy slides without content.

use crate::common::error::Result;
use crate::common::unit::inches_to_emu;
use crate::ooxml::error::OoxmlError;
use crate::ooxml::pptx::shapes::textframe::{self, ParagraphSpec, RunSpec};
use crate::ooxml::pptx::writer::text_box_xml;
use crate::ooxml::pptx::{Geometry, Presentation, TextFormat};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const STUB_FONT_SIZE: f64 = 44.0;

/// Builds stub decks, from a template deck when one is configured.
#[derive(Debug, Clone, Default)]
pub struct StubFactory {
    template: Option<PathBuf>,
}

impl StubFactory {
    pub fn new(template: Option<PathBuf>) -> Self {
        Self { template }
    }

    pub fn template(&self) -> Option<&Path> {
        self.template.as_deref()
    }

    /// A one-slide deck showing `title`.
    ///
    /// With a template, the template's first slide gets `title` in its
    /// title placeholder when it has one. A template that cannot be used
    /// falls back to the generated stub.
    pub fn build(&self, title: &str) -> Result<Presentation> {
        if let Some(template) = self.template.as_deref().filter(|p| p.is_file()) {
            match from_template(template, title) {
                Ok(pres) => return Ok(pres),
                Err(e) => warn!(template = %template.display(), error = %e, "stub template unusable"),
            }
        }
        info!(title, "creating generated stub slide");
        generated_stub(title)
    }
}

fn from_template(template: &Path, title: &str) -> Result<Presentation> {
    let mut pres = Presentation::open(template)?;
    if pres.slide_count()? == 0 {
        return Err(OoxmlError::InvalidFormat("stub template has no slides".to_string()).into());
    }
    let mut slide = pres.slide(0)?;
    let title_shape = slide.sp_tree_mut().and_then(|tree| {
        tree.elements_mut().find(|el| {
            el.is("p:sp")
                && el
                    .find(&["p:nvSpPr", "p:nvPr", "p:ph"])
                    .and_then(|ph| ph.attr("type"))
                    .is_some_and(|t| t == "title" || t == "ctrTitle")
        })
    });
    match title_shape {
        Some(sp) => {
            textframe::set_text(textframe::ensure_text_body(sp), title);
            pres.save_slide(&slide)?;
        },
        None => debug!(template = %template.display(), "stub template has no title placeholder"),
    }
    Ok(pres)
}

/// A widescreen deck with one centered, bold 44pt text box.
pub fn generated_stub(title: &str) -> Result<Presentation> {
    let mut pres = Presentation::new_blank()?;
    let layout = pres.blank_layout()?;
    let index = pres.add_slide(&layout)?;
    let mut slide = pres.slide(index)?;

    let geometry = Geometry::new(
        inches_to_emu(1.0),
        inches_to_emu(3.0),
        inches_to_emu(11.333),
        inches_to_emu(1.5),
    );
    let paragraph = ParagraphSpec {
        align: Some("ctr".to_string()),
        level: None,
        runs: vec![RunSpec {
            text: title.to_string(),
            format: TextFormat {
                size: Some(STUB_FONT_SIZE),
                bold: Some(true),
                ..TextFormat::default()
            },
        }],
    };
    let xml = text_box_xml(slide.next_shape_id(), "Title", &geometry, Some(true), &[paragraph])?;
    slide.insert_shape_xml(&xml)?;
    pres.save_slide(&slide)?;
    Ok(pres)
}
