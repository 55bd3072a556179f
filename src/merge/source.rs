//! Where source decks come from.

use crate::common::error::{Error, Result};
use crate::ooxml::pptx::Presentation;
use std::path::{Path, PathBuf};

/// Read access to the decks a liturgy points at.
///
/// A deck that is missing or cannot be read is an
/// [`Error::SourceUnavailable`], which the planner and executors treat as
/// "this slide contributes nothing".
pub trait DeckProvider {
    /// On-disk location of a path recorded in a liturgy.
    fn resolve(&self, path: &Path) -> PathBuf;

    fn exists(&self, path: &Path) -> bool {
        self.resolve(path).is_file()
    }

    fn open(&self, path: &Path) -> Result<Presentation>;

    fn slide_count(&self, path: &Path) -> Result<usize> {
        let pres = self.open(path)?;
        pres.slide_count().map_err(|e| Error::SourceUnavailable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

/// Decks on the local filesystem. Relative paths are taken from `base`
/// when one is set, else from the working directory.
#[derive(Debug, Clone, Default)]
pub struct FileDecks {
    base: Option<PathBuf>,
}

impl FileDecks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base(base: impl Into<PathBuf>) -> Self {
        Self {
            base: Some(base.into()),
        }
    }
}

impl DeckProvider for FileDecks {
    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    fn open(&self, path: &Path) -> Result<Presentation> {
        let resolved = self.resolve(path);
        if !resolved.is_file() {
            return Err(Error::SourceUnavailable {
                path: resolved,
                reason: "file not found".to_string(),
            });
        }
        Presentation::open(&resolved).map_err(|e| Error::SourceUnavailable {
            path: resolved,
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_and_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let decks = FileDecks::with_base(dir.path());

        let missing = decks.open(Path::new("Liederen/weg.pptx")).err().unwrap();
        assert!(matches!(missing, Error::SourceUnavailable { .. }));

        std::fs::write(dir.path().join("kapot.pptx"), b"not a zip").unwrap();
        assert!(decks.exists(Path::new("kapot.pptx")));
        let broken = decks.open(Path::new("kapot.pptx")).err().unwrap();
        assert!(matches!(broken, Error::SourceUnavailable { .. }));
    }

    #[test]
    fn test_slide_count() {
        let dir = tempfile::tempdir().unwrap();
        let mut pres = Presentation::new_blank().unwrap();
        let layout = pres.blank_layout().unwrap();
        pres.add_slide(&layout).unwrap();
        pres.add_slide(&layout).unwrap();
        pres.save(dir.path().join("lied.pptx")).unwrap();

        let decks = FileDecks::with_base(dir.path());
        assert_eq!(decks.slide_count(Path::new("lied.pptx")).unwrap(), 2);
        // absolute paths ignore the base
        let absolute = dir.path().join("lied.pptx");
        assert_eq!(FileDecks::with_base("/elders").resolve(&absolute), absolute);
    }
}
