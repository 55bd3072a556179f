//! Side outputs of a service: file names, a link list and a sheet music
//! archive.

use crate::common::error::Result;
use crate::common::fs::write_atomic;
use crate::liturgy::Liturgy;
use chrono::{Local, NaiveDate};
use std::io::{Cursor, Write};
use std::path::Path;
use tracing::{info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const NO_LINK: &str = "(geen YouTube link)";

/// Expand `{date}` (YYYYMMDD), `{year}`, `{month}` and `{day}` in `pattern`
/// and give the result the extension `ext` (with its dot, or empty).
pub fn output_filename(pattern: &str, date: Option<NaiveDate>, ext: &str) -> String {
    let date = date.unwrap_or_else(|| Local::now().date_naive());
    let name = pattern
        .replace("{date}", &date.format("%Y%m%d").to_string())
        .replace("{year}", &date.format("%Y").to_string())
        .replace("{month}", &date.format("%m").to_string())
        .replace("{day}", &date.format("%d").to_string());

    let stem = match Path::new(&name).extension() {
        Some(current) => &name[..name.len() - current.len() - 1],
        None => name.as_str(),
    };
    format!("{}{}", stem, ext)
}

/// Replace characters that are invalid in file names on common platforms.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Numbered list of the service with the video links and sheet music of
/// every song.
pub fn links_text(liturgy: &Liturgy) -> String {
    let date = liturgy.service_date.unwrap_or(liturgy.created_date);
    let mut lines = vec![
        format!("Liturgie: {}", liturgy.name),
        format!("Datum: {}", date.format("%Y-%m-%d")),
        String::new(),
        "=".repeat(50),
        String::new(),
    ];

    for (n, section) in liturgy.sections.iter().enumerate() {
        lines.push(format!("{}. {}", n + 1, section.name));
        if section.is_song() {
            if section.youtube_links.is_empty() {
                lines.push(format!("   {}", NO_LINK));
            }
            for link in &section.youtube_links {
                lines.push(format!("   YouTube: {}", link));
            }
            if let Some(pdf) = section.pdf_path.as_deref().and_then(Path::file_name) {
                lines.push(format!("   PDF: {}", pdf.to_string_lossy()));
            }
        }
        lines.push(String::new());
    }
    lines.join("\n")
}

pub fn export_links(liturgy: &Liturgy, output: &Path) -> Result<()> {
    write_atomic(output, links_text(liturgy).as_bytes())?;
    info!(output = %output.display(), "exported links");
    Ok(())
}

/// Zip the sheet music of every song to `output`, named
/// `NN <section name>.pdf` in service order. Songs without a PDF on disk
/// are skipped. Returns the number of files written.
pub fn export_pdfs(liturgy: &Liturgy, output: &Path) -> Result<usize> {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let mut written = 0;

    for section in liturgy.songs() {
        let Some(pdf) = section.pdf_path.as_deref() else {
            continue;
        };
        if !pdf.is_file() {
            warn!(section = %section.name, pdf = %pdf.display(), "sheet music not found, skipped");
            continue;
        }
        let ext = pdf.extension().map(|e| e.to_string_lossy().into_owned()).unwrap_or_else(|| "pdf".to_string());
        written += 1;
        let name = format!("{:02} {}.{}", written, sanitize_filename(&section.name), ext);
        zip.start_file(name, options)?;
        zip.write_all(&std::fs::read(pdf)?)?;
    }

    let bytes = zip.finish()?.into_inner();
    write_atomic(output, &bytes)?;
    info!(output = %output.display(), files = written, "exported sheet music");
    Ok(written)
}
