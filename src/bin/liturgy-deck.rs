//! Command line front end for the liturgy merge engine.
//!
//! # Usage
//!
//! ```sh
//! # Merge a liturgy into the output folder from the settings
//! liturgy-deck merge viering.json
//!
//! # Merge to an explicit file, library merge only
//! liturgy-deck merge viering.json -o Vieringen/zondag.pptx --no-automation
//!
//! # Upgrade a version 1 liturgy file
//! liturgy-deck migrate oud.json nieuw.json
//!
//! # Inspect a deck
//! liturgy-deck fields Themas/Herfst.pptx --slide 2
//! liturgy-deck sections Themas/Herfst.pptx
//! ```

use clap::{ArgAction, Parser, Subcommand};
use liturgy_deck::export::{export_links, export_pdfs, output_filename};
use liturgy_deck::fields::extract_fields;
use liturgy_deck::liturgy::{Liturgy, LiturgyDocument, migrate};
use liturgy_deck::merge::Merger;
use liturgy_deck::ooxml::pptx::Presentation;
use liturgy_deck::settings::Settings;
use liturgy_deck::theme::import_theme;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "liturgy-deck",
    about = "Assemble church service presentations from a liturgy",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Settings file (JSON, or YAML by extension)
    #[arg(long, global = true, value_name = "FILE", default_value = "settings.json")]
    settings: PathBuf,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Merge a liturgy into one presentation
    Merge {
        liturgy: PathBuf,

        /// Output file; defaults to the output folder and pattern from the settings
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,

        /// Skip native automation and merge in-process
        #[arg(long)]
        no_automation: bool,
    },

    /// Rewrite a liturgy file in the current schema
    Migrate { input: PathBuf, output: PathBuf },

    /// List the fillable fields of a deck as JSON
    Fields {
        deck: PathBuf,

        /// Only this slide (1-based)
        #[arg(long)]
        slide: Option<usize>,
    },

    /// List the sections of a deck with their slide titles
    Sections { deck: PathBuf },

    /// Turn a theme deck into a liturgy file
    ImportTheme {
        deck: PathBuf,

        #[arg(short, long, value_name = "OUTPUT")]
        output: PathBuf,

        /// Liturgy name; defaults to the deck's file name
        #[arg(long)]
        name: Option<String>,
    },

    /// Write the service order with video links as text
    ExportLinks {
        liturgy: PathBuf,

        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,
    },

    /// Zip the sheet music of all songs
    ExportPdfs {
        liturgy: PathBuf,

        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,
    },
}

fn init_logging(verbose: u8) {
    let fallback = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn load_liturgy(path: &Path, settings: &Settings) -> liturgy_deck::Result<Liturgy> {
    let offering = settings.offering_path();
    let offering = offering.is_file().then_some(offering);
    Ok(migrate(LiturgyDocument::load(path)?, offering.as_deref()))
}

/// `output`, or the settings' output folder with the pattern expanded.
fn default_output(output: Option<PathBuf>, settings: &Settings, liturgy: &Liturgy, ext: &str) -> PathBuf {
    output.unwrap_or_else(|| {
        settings
            .output_path()
            .join(output_filename(&settings.output_pattern, liturgy.service_date, ext))
    })
}

fn run(cli: Cli) -> liturgy_deck::Result<()> {
    let settings = Settings::load(&cli.settings)?;

    match cli.command {
        Command::Merge {
            liturgy,
            output,
            no_automation,
        } => {
            let liturgy = load_liturgy(&liturgy, &settings)?;
            let output = default_output(output, &settings, &liturgy, ".pptx");
            let mut options = settings.merge_options();
            options.automation &= !no_automation;

            let decks = settings.decks();
            let report = Merger::new(&decks, options).merge(&liturgy, &output)?;
            println!("{} ({} slides)", report.output.display(), report.slides);
        },
        Command::Migrate { input, output } => {
            load_liturgy(&input, &settings)?.save(&output)?;
            println!("{}", output.display());
        },
        Command::Fields { deck, slide } => {
            let pres = Presentation::open(&deck)?;
            let indices: Vec<usize> = match slide {
                Some(n) => vec![n.saturating_sub(1)],
                None => (0..pres.slide_count()?).collect(),
            };
            let mut listing = Vec::with_capacity(indices.len());
            for index in indices {
                let fields = extract_fields(&pres.slide(index)?);
                listing.push(serde_json::json!({
                    "slide": index + 1,
                    "title": pres.slide_title(index)?,
                    "fields": fields,
                }));
            }
            println!("{}", serde_json::to_string_pretty(&listing)?);
        },
        Command::Sections { deck } => {
            let pres = Presentation::open(&deck)?;
            for (name, indices) in pres.sections()? {
                println!("{}", name);
                for index in indices {
                    println!("  {:>3}  {}", index + 1, pres.slide_title(index)?);
                }
            }
        },
        Command::ImportTheme { deck, output, name } => {
            let liturgy = import_theme(&deck, name.as_deref())?;
            liturgy.save(&output)?;
            println!("{} ({} sections)", output.display(), liturgy.sections.len());
        },
        Command::ExportLinks { liturgy, output } => {
            let liturgy = load_liturgy(&liturgy, &settings)?;
            let output = default_output(output, &settings, &liturgy, ".txt");
            export_links(&liturgy, &output)?;
            println!("{}", output.display());
        },
        Command::ExportPdfs { liturgy, output } => {
            let liturgy = load_liturgy(&liturgy, &settings)?;
            let output = default_output(output, &settings, &liturgy, ".zip");
            let count = export_pdfs(&liturgy, &output)?;
            println!("{} ({} files)", output.display(), count);
        },
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        },
    }
}
