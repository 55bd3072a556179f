//! In-process merging with the slide cloner.

use crate::common::error::Result;
use crate::merge::applicator::apply_to_slide;
use crate::merge::clone::SlideCloner;
use crate::merge::plan::{MergePlan, PlanEntry, PlanSource};
use crate::merge::source::DeckProvider;
use crate::merge::stub::StubFactory;
use crate::ooxml::pptx::Presentation;
use tracing::{debug, info, warn};

/// Assemble `plan` in memory.
///
/// The first entry whose deck opens becomes the base document and keeps
/// its theme, masters and slide size; its unplanned slides are removed.
/// Every later entry is cloned in slide by slide, with its field values
/// filled in right after each copy. An empty plan yields a blank
/// widescreen deck.
pub fn merge_with_library(plan: &MergePlan, decks: &dyn DeckProvider, stubs: &StubFactory) -> Result<Presentation> {
    let mut entries = plan.entries.iter();

    let (mut base, base_entry) = loop {
        let Some(entry) = entries.next() else {
            info!("nothing to merge, creating blank presentation");
            return Ok(Presentation::new_blank()?);
        };
        match load(entry, decks, stubs) {
            Ok(pres) => break (pres, entry),
            Err(e) => warn!(source = %entry.source, error = %e, "source deck unavailable, entry skipped"),
        }
    };
    info!(base = %base_entry.source, "theme and slide size come from the first merged deck");

    let mut kept: Vec<usize> = base_entry.slide_indices.clone();
    kept.sort_unstable();
    kept.dedup();
    let count = base.slide_count()?;
    if let Some(&past) = kept.iter().find(|&&i| i >= count) {
        warn!(source = %base_entry.source, index = past, count, "planned slide out of range");
        kept.retain(|&i| i < count);
    }
    base.retain_slides(&kept)?;
    for (position, index) in kept.iter().enumerate() {
        if let Some(values) = base_entry.fields_for(*index) {
            apply_to_slide(&mut base, position, values)?;
        }
    }

    for entry in entries {
        let source = match load(entry, decks, stubs) {
            Ok(pres) => pres,
            Err(e) => {
                warn!(source = %entry.source, error = %e, "source deck unavailable, entry skipped");
                continue;
            },
        };
        let mut cloner = SlideCloner::new(&source);
        for &index in &entry.slide_indices {
            let Some(cloned) = cloner.clone_slide(&mut base, index)? else {
                continue;
            };
            debug!(
                source = %entry.source,
                index,
                copied = cloned.copied,
                skipped = cloned.skipped,
                "cloned slide"
            );
            if let Some(values) = entry.fields_for(index) {
                apply_to_slide(&mut base, cloned.index, values)?;
            }
        }
    }

    Ok(base)
}

fn load(entry: &PlanEntry, decks: &dyn DeckProvider, stubs: &StubFactory) -> Result<Presentation> {
    match &entry.source {
        PlanSource::Deck(path) => decks.open(path),
        PlanSource::Stub { title } => stubs.build(title),
    }
}
