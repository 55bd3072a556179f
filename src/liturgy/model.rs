//! Liturgy documents.
//!
//! The current schema (format version 2) is a list of sections, each a list
//! of slides. Older files, version 1 or without a version, hold a flat list
//! of items and are read as [`LegacyLiturgy`], then migrated with
//! [`migrate`](super::migrate).

use crate::common::error::{Error, Result};
use crate::fields::FieldValues;
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::warn;
use uuid::Uuid;

/// Version written by this crate.
pub const CURRENT_FORMAT_VERSION: u32 = 2;

pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn current_version() -> u32 {
    CURRENT_FORMAT_VERSION
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    #[default]
    Regular,
    Song,
}

/// One slide of a section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slide {
    #[serde(default = "new_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// 0-based slide in `source_path`.
    #[serde(default)]
    pub slide_index: usize,
    #[serde(default)]
    pub source_path: Option<PathBuf>,
    #[serde(default)]
    pub fields: FieldValues,
    /// A stub is generated at merge time; `source_path` is not read.
    #[serde(default)]
    pub is_stub: bool,
}

impl Slide {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            title: title.into(),
            slide_index: 0,
            source_path: None,
            fields: FieldValues::new(),
            is_stub: false,
        }
    }

    /// A slide showing slide `index` of `path`.
    pub fn from_source(title: impl Into<String>, path: impl Into<PathBuf>, index: usize) -> Self {
        Self {
            slide_index: index,
            source_path: Some(path.into()),
            ..Self::new(title)
        }
    }

    pub fn stub(title: impl Into<String>) -> Self {
        Self {
            is_stub: true,
            ..Self::new(title)
        }
    }

    pub fn with_fields(mut self, fields: FieldValues) -> Self {
        self.fields = fields;
        self
    }
}

/// A named group of slides: one song, one announcement, one reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    #[serde(default = "new_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "section_type", default)]
    pub kind: SectionKind,
    #[serde(default)]
    pub source_theme_path: Option<PathBuf>,
    #[serde(default)]
    pub slides: Vec<Slide>,

    /// Sheet music. Song sections only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_path: Option<PathBuf>,
    /// Song sections only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub youtube_links: Vec<String>,
    /// Folder or file the song was picked from. Song sections only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub song_source_path: Option<PathBuf>,
}

impl Section {
    pub fn new(name: impl Into<String>, kind: SectionKind) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            kind,
            source_theme_path: None,
            slides: Vec::new(),
            pdf_path: None,
            youtube_links: Vec::new(),
            song_source_path: None,
        }
    }

    pub fn with_slide(mut self, slide: Slide) -> Self {
        self.slides.push(slide);
        self
    }

    #[inline]
    pub fn is_song(&self) -> bool {
        self.kind == SectionKind::Song
    }

    pub fn has_youtube(&self) -> bool {
        !self.youtube_links.is_empty()
    }

    pub fn has_pdf(&self) -> bool {
        self.pdf_path.is_some()
    }

    /// Whether any slide points at a deck.
    pub fn has_pptx(&self) -> bool {
        self.slides.iter().any(|s| s.source_path.is_some())
    }
}

/// A liturgy in the section schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Liturgy {
    #[serde(default = "current_version")]
    pub format_version: u32,
    pub name: String,
    #[serde(default = "today")]
    pub created_date: NaiveDate,
    #[serde(default)]
    pub theme_source_path: Option<PathBuf>,
    #[serde(default)]
    pub sections: Vec<Section>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_date: Option<NaiveDate>,
    /// Service leader.
    #[serde(rename = "dienstleider", default, skip_serializing_if = "Option::is_none")]
    pub leader: Option<String>,
}

impl Liturgy {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            format_version: CURRENT_FORMAT_VERSION,
            name: name.into(),
            created_date: today(),
            theme_source_path: None,
            sections: Vec::new(),
            service_date: None,
            leader: None,
        }
    }

    pub fn slide_count(&self) -> usize {
        self.sections.iter().map(|s| s.slides.len()).sum()
    }

    pub fn section_by_id(&self, id: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }

    /// The section and slide with slide id `id`.
    pub fn slide_by_id(&self, id: &str) -> Option<(&Section, &Slide)> {
        self.sections
            .iter()
            .find_map(|section| Some((section, section.slides.iter().find(|s| s.id == id)?)))
    }

    /// Song sections in service order.
    pub fn songs(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter().filter(|s| s.is_song())
    }

    pub fn to_json(&self) -> Result<String> {
        let mut doc = Cow::Borrowed(self);
        if self.format_version != CURRENT_FORMAT_VERSION {
            doc.to_mut().format_version = CURRENT_FORMAT_VERSION;
        }
        Ok(serde_json::to_string_pretty(doc.as_ref())?)
    }

    /// Write the liturgy as JSON, replacing `path` only once the whole
    /// document is on disk.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        crate::common::fs::write_atomic(path.as_ref(), self.to_json()?.as_bytes())
    }
}

/// Item kinds of the version 1 schema. Older files use Dutch type names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LegacyItem {
    Song(LegacySong),
    #[serde(alias = "algemeen")]
    Generic(LegacyGeneric),
    #[serde(alias = "collecte")]
    Offering(LegacyOffering),
}

impl LegacyItem {
    pub fn title(&self) -> &str {
        match self {
            Self::Song(song) => &song.title,
            Self::Generic(generic) => &generic.title,
            Self::Offering(offering) => &offering.title,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacySong {
    #[serde(default)]
    pub title: String,
    /// Song folder.
    #[serde(default)]
    pub source_path: Option<PathBuf>,
    #[serde(default)]
    pub pptx_path: Option<PathBuf>,
    #[serde(default)]
    pub pdf_path: Option<PathBuf>,
    #[serde(default)]
    pub youtube_links: Vec<String>,
    #[serde(default)]
    pub is_stub: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacyGeneric {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub source_path: Option<PathBuf>,
    #[serde(default)]
    pub pptx_path: Option<PathBuf>,
    #[serde(default)]
    pub is_stub: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacyOffering {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub source_path: Option<PathBuf>,
    #[serde(default)]
    pub slide_index: usize,
    #[serde(default)]
    pub slide_title: String,
    #[serde(default)]
    pub pptx_path: Option<PathBuf>,
    #[serde(default)]
    pub is_stub: bool,
}

/// A liturgy in the version 1 flat-item schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyLiturgy {
    pub name: String,
    #[serde(default = "today")]
    pub created_date: NaiveDate,
    #[serde(default)]
    pub elements: Vec<LegacyItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_date: Option<NaiveDate>,
    #[serde(rename = "dienstleider", default, skip_serializing_if = "Option::is_none")]
    pub leader: Option<String>,
}

/// A liturgy file as read from disk, in either schema.
#[derive(Debug, Clone, PartialEq)]
pub enum LiturgyDocument {
    Legacy(LegacyLiturgy),
    Current(Liturgy),
}

#[derive(Deserialize)]
struct VersionProbe {
    #[serde(default = "legacy_version")]
    format_version: u32,
}

fn legacy_version() -> u32 {
    1
}

impl LiturgyDocument {
    /// Parse a liturgy file.
    ///
    /// Versions below 2, and files without `format_version`, are the flat
    /// item schema. Anything from 2 up is read as the section schema; a
    /// version newer than this build is read the same way with a warning.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let probe = VersionProbe::deserialize(&value)
            .map_err(|e| Error::InvalidLiturgy(format!("format_version: {}", e)))?;
        match probe.format_version {
            v if v < CURRENT_FORMAT_VERSION => Ok(Self::Legacy(serde_json::from_value(value)?)),
            v => {
                if v > CURRENT_FORMAT_VERSION {
                    warn!(
                        format_version = v,
                        supported = CURRENT_FORMAT_VERSION,
                        "liturgy written by a newer version, reading it as version 2"
                    );
                }
                Ok(Self::Current(serde_json::from_value(value)?))
            },
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&json)
    }

    pub fn format_version(&self) -> u32 {
        match self {
            Self::Legacy(_) => 1,
            Self::Current(liturgy) => liturgy.format_version,
        }
    }

    #[inline]
    pub fn is_legacy(&self) -> bool {
        matches!(self, Self::Legacy(_))
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Legacy(legacy) => &legacy.name,
            Self::Current(liturgy) => &liturgy.name,
        }
    }

    /// The document in the section schema. Legacy items are projected
    /// through the migration, without a default offering deck.
    pub fn sections(&self) -> Cow<'_, [Section]> {
        match self {
            Self::Current(liturgy) => Cow::Borrowed(&liturgy.sections),
            Self::Legacy(legacy) => Cow::Owned(super::migrate::migrate_legacy(legacy, None).sections),
        }
    }
}
