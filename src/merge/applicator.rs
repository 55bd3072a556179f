//! Filling liturgy field values into a merged presentation.

use crate::common::error::Result;
use crate::fields::{FieldValues, fill_fields};
use crate::ooxml::pptx::Presentation;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Fill `values_by_position` into the slides of `pres`.
///
/// Keys are 0-based output slide positions. Positions past the last slide
/// are logged and ignored. Returns the number of replacements made.
pub fn apply_fields(pres: &mut Presentation, values_by_position: &BTreeMap<usize, FieldValues>) -> Result<usize> {
    let count = pres.slide_count()?;
    let mut total = 0;
    for (&position, values) in values_by_position {
        if values.is_empty() {
            continue;
        }
        if position >= count {
            warn!(position, count, "field values for a slide that was not merged");
            continue;
        }
        total += apply_to_slide(pres, position, values)?;
    }
    debug!(replacements = total, "applied liturgy fields");
    Ok(total)
}

/// Fill `values` into the slide at `position`, saving it only when it
/// changed.
pub fn apply_to_slide(pres: &mut Presentation, position: usize, values: &FieldValues) -> Result<usize> {
    let mut slide = pres.slide(position)?;
    let replaced = fill_fields(&mut slide, values);
    if replaced > 0 {
        pres.save_slide(&slide)?;
    }
    Ok(replaced)
}
