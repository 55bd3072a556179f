//! Theme decks: importing a deck as a liturgy and writing one back.

use crate::common::error::{Error, Result};
use crate::common::fs::write_atomic;
use crate::fields::extract_fields;
use crate::liturgy::{Liturgy, Section, SectionKind, Slide};
use crate::merge::{MergeReport, Merger, plan_merge};
use crate::ooxml::pptx::{ALL_SLIDES_SECTION, Presentation};
use chrono::Local;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Load the deck at `path` as a liturgy.
///
/// Every deck section becomes a section; a deck without sections gets one
/// section per slide, named after the slide. Each slide keeps its fields
/// with their current values, so nothing changes until they are edited.
/// Sections without slides are left out.
pub fn import_theme(path: &Path, name: Option<&str>) -> Result<Liturgy> {
    let unavailable = |reason: String| Error::SourceUnavailable {
        path: path.to_path_buf(),
        reason,
    };
    if !path.is_file() {
        return Err(unavailable("file not found".to_string()));
    }
    let pres = Presentation::open(path).map_err(|e| unavailable(e.to_string()))?;

    let name = match name {
        Some(name) => name.to_string(),
        None => path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default(),
    };
    let mut liturgy = Liturgy::new(name);
    liturgy.theme_source_path = Some(path.to_path_buf());

    let count = pres.slide_count()?;
    let sections = pres.sections()?;
    let unsectioned = matches!(sections.as_slice(), [(only, _)] if only == ALL_SLIDES_SECTION);

    if unsectioned {
        for index in 0..count {
            let slide = theme_slide(&pres, path, index)?;
            let mut section = Section::new(slide.title.clone(), SectionKind::Regular);
            section.source_theme_path = Some(path.to_path_buf());
            liturgy.sections.push(section.with_slide(slide));
        }
    } else {
        for (section_name, indices) in sections {
            let mut section = Section::new(section_name, SectionKind::Regular);
            section.source_theme_path = Some(path.to_path_buf());
            for index in indices.into_iter().filter(|&i| i < count) {
                section.slides.push(theme_slide(&pres, path, index)?);
            }
            if !section.slides.is_empty() {
                liturgy.sections.push(section);
            }
        }
    }

    info!(
        theme = %path.display(),
        sections = liturgy.sections.len(),
        slides = liturgy.slide_count(),
        "imported theme"
    );
    Ok(liturgy)
}

fn theme_slide(pres: &Presentation, path: &Path, index: usize) -> Result<Slide> {
    let fields = extract_fields(&pres.slide(index)?)
        .into_iter()
        .map(|field| (field.name, field.current_value))
        .collect();
    Ok(Slide::from_source(pres.slide_title(index)?, path, index).with_fields(fields))
}

/// Write `liturgy` as a theme deck to `output`, with one deck section per
/// liturgy section that contributed slides.
///
/// An existing file is first copied to a timestamped backup, whose path
/// is returned alongside the merge report.
pub fn save_as_theme(
    merger: &Merger<'_>,
    liturgy: &Liturgy,
    output: &Path,
    backup: bool,
) -> Result<(MergeReport, Option<PathBuf>)> {
    let backup_path = if backup && output.is_file() {
        Some(backup_file(output)?)
    } else {
        None
    };
    let report = merger.merge(liturgy, output)?;

    // Planning never crosses section boundaries, so per-section plans add
    // up to the merged deck.
    let mut sections: Vec<(String, Vec<usize>)> = Vec::new();
    let mut next = 0;
    for section in &liturgy.sections {
        let count = plan_merge(std::slice::from_ref(section), merger.decks()).total_slides();
        if count > 0 {
            sections.push((section.name.clone(), (next..next + count).collect()));
            next += count;
        }
    }
    if next == report.slides {
        let mut pres = Presentation::open(output)?;
        pres.set_sections(&sections)?;
        write_atomic(output, &pres.to_bytes()?)?;
    } else {
        warn!(planned = next, merged = report.slides, "slide count differs from plan, sections not written");
    }
    Ok((report, backup_path))
}

/// Copy `path` to `<path>.YYYYmmddTHHMM`, adding seconds when that name
/// is taken.
pub fn backup_file(path: &Path) -> Result<PathBuf> {
    let now = Local::now();
    let with_suffix = |suffix: String| {
        let mut name: OsString = path.as_os_str().to_owned();
        name.push(".");
        name.push(suffix);
        PathBuf::from(name)
    };

    let mut backup = with_suffix(now.format("%Y%m%dT%H%M").to_string());
    if backup.exists() {
        backup = with_suffix(now.format("%Y%m%dT%H%M%S").to_string());
    }
    std::fs::copy(path, &backup)?;
    debug!(backup = %backup.display(), "created backup");
    Ok(backup)
}

/// Theme decks in `dir`, sorted by path.
pub fn theme_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_deck = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("pptx"));
        if is_deck && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::{FileDecks, MergeOptions};

    fn write_theme(path: &Path) {
        let mut pres = Presentation::new_blank().unwrap();
        let title_layout = pres.layouts().unwrap()[0].partname.clone();
        for (title, body) in [("Welkom", "Voorganger: {Voorganger}"), ("Zegen", "Amen")] {
            let index = pres.add_slide(&title_layout).unwrap();
            let mut slide = pres.slide(index).unwrap();
            slide
                .insert_shape_xml(&format!(
                    r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Titel 1"/><p:cNvSpPr/><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:p><a:r><a:t>{}</a:t></a:r></a:p></p:txBody></p:sp>"#,
                    title
                ))
                .unwrap();
            slide
                .insert_shape_xml(&format!(
                    r#"<p:sp><p:nvSpPr><p:cNvPr id="3" name="Tekst"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:p><a:r><a:t>{}</a:t></a:r></a:p></p:txBody></p:sp>"#,
                    body
                ))
                .unwrap();
            pres.save_slide(&slide).unwrap();
        }
        pres.save(path).unwrap();
    }

    #[test]
    fn test_import_without_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Herfst.pptx");
        write_theme(&path);

        let liturgy = import_theme(&path, None).unwrap();
        assert_eq!(liturgy.name, "Herfst");
        assert_eq!(liturgy.format_version, 2);
        assert_eq!(liturgy.theme_source_path.as_deref(), Some(path.as_path()));

        let names: Vec<_> = liturgy.sections.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Welkom", "Zegen"]);
        let welkom = &liturgy.sections[0].slides[0];
        assert_eq!(welkom.slide_index, 0);
        assert_eq!(welkom.fields["TITLE"], "Welkom");
        assert_eq!(welkom.fields["Voorganger"], "{Voorganger}");
        assert_eq!(liturgy.sections[1].slides[0].slide_index, 1);
    }

    #[test]
    fn test_import_missing_file() {
        let err = import_theme(Path::new("/nergens/thema.pptx"), None).unwrap_err();
        assert!(matches!(err, Error::SourceUnavailable { .. }));
    }

    #[test]
    fn test_save_as_theme_backs_up() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Herfst.pptx");
        write_theme(&path);
        let mut liturgy = import_theme(&path, Some("Herfst")).unwrap();
        liturgy.sections.truncate(1);

        let decks = FileDecks::new();
        let merger = Merger::new(
            &decks,
            MergeOptions {
                automation: false,
                ..MergeOptions::default()
            },
        );
        let (report, backup) = save_as_theme(&merger, &liturgy, &path, true).unwrap();
        assert_eq!(report.slides, 1);

        let backup = backup.unwrap();
        let suffix = backup.extension().unwrap().to_string_lossy().into_owned();
        assert_eq!(suffix.len(), "20261014T0930".len());
        assert_eq!(Presentation::open(&backup).unwrap().slide_count().unwrap(), 2);
        let saved = Presentation::open(&path).unwrap();
        assert_eq!(saved.slide_count().unwrap(), 1);
        assert_eq!(saved.sections().unwrap(), vec![("Welkom".to_string(), vec![0])]);

        // the saved theme imports with the same section names
        let again = import_theme(&path, None).unwrap();
        assert_eq!(again.sections.len(), 1);
        assert_eq!(again.sections[0].name, "Welkom");
    }

    #[test]
    fn test_backup_name_taken_adds_seconds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("thema.pptx");
        std::fs::write(&path, b"v1").unwrap();
        let first = backup_file(&path).unwrap();
        let second = backup_file(&path).unwrap();
        assert_ne!(first, second);
        assert_eq!(std::fs::read(&second).unwrap(), b"v1");
    }

    #[test]
    fn test_theme_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.pptx", "a.PPTX", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        let files = theme_files(dir.path()).unwrap();
        let names: Vec<_> = files.iter().map(|p| p.file_name().unwrap().to_str().unwrap()).collect();
        assert_eq!(names, ["a.PPTX", "b.pptx"]);
    }
}
