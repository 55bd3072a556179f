//! User settings: folder layout, file names and merge behaviour.
//!
//! Settings are stored as JSON or YAML, chosen by file extension. A
//! missing file means defaults.

use crate::common::error::{Error, Result};
use crate::common::fs::write_atomic;
use crate::merge::{FileDecks, MergeOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Folder all relative folders are taken from. Empty until configured.
    pub base_folder: String,
    pub songs_folder: String,
    #[serde(alias = "algemeen_folder")]
    pub generic_folder: String,
    pub output_folder: String,
    pub themes_folder: String,
    #[serde(alias = "collecte_filename")]
    pub offering_filename: String,
    pub stub_template_filename: String,
    /// Output file name with `{date}`, `{year}`, `{month}` and `{day}`.
    pub output_pattern: String,
    pub language: String,
    pub automation: bool,
    pub automation_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_folder: String::new(),
            songs_folder: "./Liederen".to_string(),
            generic_folder: "./Algemeen".to_string(),
            output_folder: "./Vieringen".to_string(),
            themes_folder: "./Themas".to_string(),
            offering_filename: "Collecte.pptx".to_string(),
            stub_template_filename: "StubTemplate.pptx".to_string(),
            output_pattern: "{date}_viering-generated.pptx".to_string(),
            language: "nl".to_string(),
            automation: true,
            automation_timeout_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Yaml,
}

impl Format {
    fn of(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => Format::Yaml,
            _ => Format::Json,
        }
    }
}

impl Settings {
    /// Read settings from `path`, or defaults when it does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "no settings file, using defaults");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text, Format::of(path))
    }

    fn parse(text: &str, format: Format) -> Result<Self> {
        match format {
            Format::Json => Ok(serde_json::from_str(text)?),
            Format::Yaml => serde_saphyr::from_str(text).map_err(|e| Error::Yaml(e.to_string())),
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text = match Format::of(path) {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Yaml => serde_saphyr::to_string(self).map_err(|e| Error::Yaml(e.to_string()))?,
        };
        write_atomic(path, text.as_bytes())
    }

    /// True until a base folder has been chosen.
    pub fn is_first_run(&self) -> bool {
        self.base_folder.is_empty()
    }

    /// The base folder when it is set and exists, else the working directory.
    pub fn base_path(&self) -> PathBuf {
        let base = Path::new(&self.base_folder);
        if !self.base_folder.is_empty() && base.is_dir() {
            base.to_path_buf()
        } else {
            PathBuf::from(".")
        }
    }

    fn resolve(&self, folder: &str) -> PathBuf {
        let folder = Path::new(folder);
        if folder.is_absolute() {
            return folder.to_path_buf();
        }
        let joined = self.base_path().join(folder);
        // drop `./` segments, keep everything else as given
        joined.components().filter(|c| !matches!(c, std::path::Component::CurDir)).collect()
    }

    pub fn songs_path(&self) -> PathBuf {
        self.resolve(&self.songs_folder)
    }

    pub fn generic_path(&self) -> PathBuf {
        self.resolve(&self.generic_folder)
    }

    pub fn output_path(&self) -> PathBuf {
        self.resolve(&self.output_folder)
    }

    pub fn themes_path(&self) -> PathBuf {
        self.resolve(&self.themes_folder)
    }

    /// The standard offering deck in the generic folder.
    pub fn offering_path(&self) -> PathBuf {
        self.generic_path().join(&self.offering_filename)
    }

    /// The stub template, when it exists.
    pub fn stub_template_path(&self) -> Option<PathBuf> {
        let path = self.generic_path().join(&self.stub_template_filename);
        path.is_file().then_some(path)
    }

    pub fn automation_timeout(&self) -> Duration {
        Duration::from_secs(self.automation_timeout_secs)
    }

    pub fn merge_options(&self) -> MergeOptions {
        MergeOptions {
            automation: self.automation,
            automation_timeout: self.automation_timeout(),
            stub_template: self.stub_template_path(),
        }
    }

    /// Decks with relative liturgy paths taken from the base folder.
    pub fn decks(&self) -> FileDecks {
        FileDecks::with_base(self.base_path())
    }
}
