//! Running a merge: tier selection, field post-pass and output placement.

use crate::common::error::{Error, Result};
use crate::common::fs::{persist_path, scratch_dir_for, write_atomic};
use crate::liturgy::{Liturgy, Section};
use crate::merge::applicator::apply_fields;
use crate::merge::automation::{
    AutomationError, DEFAULT_TIMEOUT, SlideAutomation, VbScriptSession, automation_supported,
};
use crate::merge::library::merge_with_library;
use crate::merge::plan::{MergePlan, PlanSource, plan_merge};
use crate::merge::source::DeckProvider;
use crate::merge::stub::StubFactory;
use crate::ooxml::pptx::Presentation;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Which strategy produced the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeTier {
    /// Native insertion by the presentation application
    Automation,
    /// In-process reconstruction
    Library,
}

/// Outcome of a successful merge.
#[derive(Debug, Clone)]
pub struct MergeReport {
    pub tier: MergeTier,
    /// Slides in the output file.
    pub slides: usize,
    pub output: PathBuf,
    /// Why automation was abandoned, when it was tried and failed.
    pub automation_error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MergeOptions {
    /// Try native automation first where it is supported.
    pub automation: bool,
    pub automation_timeout: Duration,
    /// Deck whose first slide is used for stubs.
    pub stub_template: Option<PathBuf>,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            automation: true,
            automation_timeout: DEFAULT_TIMEOUT,
            stub_template: None,
        }
    }
}

/// Merges liturgies into presentation files.
///
/// The liturgy is only read. Output is assembled in a scratch location
/// and renamed onto the destination once complete; a failed merge leaves
/// any previous file at the destination untouched.
pub struct Merger<'d> {
    decks: &'d dyn DeckProvider,
    options: MergeOptions,
    stubs: StubFactory,
}

impl<'d> Merger<'d> {
    pub fn new(decks: &'d dyn DeckProvider, options: MergeOptions) -> Self {
        let stubs = StubFactory::new(options.stub_template.clone());
        Self { decks, options, stubs }
    }

    pub fn options(&self) -> &MergeOptions {
        &self.options
    }

    pub fn decks(&self) -> &dyn DeckProvider {
        self.decks
    }

    pub fn merge(&self, liturgy: &Liturgy, output: &Path) -> Result<MergeReport> {
        info!(liturgy = %liturgy.name, output = %output.display(), "merging liturgy");
        self.merge_sections(&liturgy.sections, output)
    }

    pub fn merge_sections(&self, sections: &[Section], output: &Path) -> Result<MergeReport> {
        let plan = plan_merge(sections, self.decks);

        if !self.options.automation {
            debug!("automation disabled");
            return self.merge_plan(&plan, output, None);
        }
        if !automation_supported() {
            debug!("automation not supported on this platform");
            return self.merge_plan(&plan, output, None);
        }
        match VbScriptSession::new(self.options.automation_timeout) {
            Ok(mut session) => self.merge_plan(&plan, output, Some(&mut session)),
            Err(e) => {
                warn!(error = %e, "automation unavailable, using library merge");
                self.library_with_reason(&plan, output, Some(e.to_string()))
            },
        }
    }

    /// Merge `plan` into `output`, through `automation` first when given.
    ///
    /// Any automation failure falls back to the library merge. Only a
    /// failed library merge, or an output that cannot be placed, is an
    /// error.
    pub fn merge_plan(
        &self,
        plan: &MergePlan,
        output: &Path,
        automation: Option<&mut dyn SlideAutomation>,
    ) -> Result<MergeReport> {
        let mut reason = None;
        if let Some(session) = automation {
            match self.automation_tier(session, plan, output) {
                Ok(slides) => {
                    info!(output = %output.display(), slides, "merged with automation");
                    return Ok(MergeReport {
                        tier: MergeTier::Automation,
                        slides,
                        output: output.to_path_buf(),
                        automation_error: None,
                    });
                },
                Err(e) => {
                    warn!(error = %e, "automation merge failed, falling back to library merge");
                    reason = Some(e.to_string());
                },
            }
        }
        self.library_with_reason(plan, output, reason)
    }

    fn library_with_reason(&self, plan: &MergePlan, output: &Path, reason: Option<String>) -> Result<MergeReport> {
        match self.library_tier(plan, output) {
            Ok(slides) => {
                info!(output = %output.display(), slides, "merged with library");
                Ok(MergeReport {
                    tier: MergeTier::Library,
                    slides,
                    output: output.to_path_buf(),
                    automation_error: reason,
                })
            },
            Err(e @ Error::Output { .. }) => Err(e),
            Err(e) => Err(Error::MergeFailed {
                automation: reason,
                library: Box::new(e),
            }),
        }
    }

    fn library_tier(&self, plan: &MergePlan, output: &Path) -> Result<usize> {
        let pres = merge_with_library(plan, self.decks, &self.stubs)?;
        let slides = pres.slide_count()?;
        write_atomic(output, &pres.to_bytes()?)?;
        Ok(slides)
    }

    fn automation_tier(&self, session: &mut dyn SlideAutomation, plan: &MergePlan, output: &Path) -> Result<usize> {
        let scratch = scratch_dir_for(output)?;

        let mut inserts = Vec::with_capacity(plan.total_slides());
        for (n, entry) in plan.entries.iter().enumerate() {
            let path = match &entry.source {
                PlanSource::Deck(path) => self.decks.resolve(path),
                PlanSource::Stub { title } => {
                    let stub = scratch.path().join(format!("stub-{}.pptx", n));
                    self.stubs.build(title)?.save(&stub)?;
                    stub
                },
            };
            let path = std::path::absolute(path)?;
            inserts.extend(entry.slide_indices.iter().map(|&index| (path.clone(), index)));
        }

        let name = output.file_name().unwrap_or(OsStr::new("merged.pptx"));
        let merged = std::path::absolute(scratch.path().join(name))?;
        let slides = insert_all(session, &inserts, &merged)?;

        // The host knows nothing about fields; fill them in the saved file.
        let values = plan.fields_by_position();
        let finished = if values.is_empty() {
            merged
        } else {
            let mut pres = Presentation::open(&merged)?;
            apply_fields(&mut pres, &values)?;
            let filled = scratch.path().join("filled.pptx");
            pres.save(&filled)?;
            filled
        };
        persist_path(&finished, output)?;
        Ok(slides)
    }
}

/// Insert every `(deck, index)` through `session` and save to `output`.
///
/// The session is closed on every path. A host that inserted a different
/// number of slides than requested is a failure.
pub fn insert_all(
    session: &mut dyn SlideAutomation,
    inserts: &[(PathBuf, usize)],
    output: &Path,
) -> std::result::Result<usize, AutomationError> {
    let result = (|| -> std::result::Result<usize, AutomationError> {
        for (path, index) in inserts {
            session.insert_slide_range(path, *index, *index)?;
        }
        let inserted = session.save_as(output)?;
        if inserted != inserts.len() {
            return Err(AutomationError::CountMismatch {
                expected: inserts.len(),
                inserted,
            });
        }
        Ok(inserted)
    })();
    let closed = session.close();
    let inserted = result?;
    closed?;
    Ok(inserted)
}
