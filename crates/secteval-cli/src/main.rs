use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use secteval_core::config_file::{self, ConfigFile};
use secteval_core::{AnnotatedDocument, CorpusMetrics, SectionTitle, grade_extraction};
use secteval_datasets::{ANNOTATIONS_FILE, Corpus, FetchProgress, fetch_missing, load_annotations};
use secteval_extractors::{ExtractorRegistry, ToolPaths};
use secteval_reporting::{ExportFormat, export_results};

mod output;

use output::ColorMode;

/// Benchmark section-title extractors against hand-annotated scientific PDFs
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ListMode {
    /// Show every document
    All,
    /// Hide documents with no errors
    Errors,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate an extractor against the annotated corpus
    Evaluate {
        /// Extractor to test (see `secteval extractors`)
        extractor: String,

        /// List per-document details
        #[arg(short, long, value_name = "MODE", num_args = 0..=1, default_missing_value = "all")]
        list_errors: Option<ListMode>,

        /// Only test on the given document
        #[arg(short, long)]
        doc_id: Option<String>,

        /// Write machine-readable results to this path (.json or .csv)
        #[arg(long)]
        export: Option<PathBuf>,

        /// Data directory (dataset manifests, annotations, PDFs)
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Download any missing corpus PDFs from their source URLs
    Fetch {
        /// Data directory (dataset manifests, annotations, PDFs)
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },

    /// Time an extractor over the corpus without grading
    Time {
        /// Extractor to time
        extractor: String,

        /// Data directory (dataset manifests, annotations, PDFs)
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },

    /// List the available extractors
    Extractors,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Evaluate {
            extractor,
            list_errors,
            doc_id,
            export,
            data_dir,
            no_color,
        } => evaluate(extractor, list_errors, doc_id, export, data_dir, no_color),
        Command::Fetch { data_dir } => fetch(data_dir).await,
        Command::Time { extractor, data_dir } => time(extractor, data_dir),
        Command::Extractors => {
            let registry = ExtractorRegistry::with_defaults(resolve_tools(&config_file::load_config()));
            for name in registry.names() {
                println!("{name}");
            }
            Ok(())
        }
    }
}

/// Env vars override config-file values; CLI flags (where they exist)
/// override both.
fn resolve_tools(config: &ConfigFile) -> ToolPaths {
    let tools = config.tools.clone().unwrap_or_default();
    let from_env = |var: &str| std::env::var(var).ok().map(PathBuf::from);
    ToolPaths {
        pdffigures2_home: from_env("PDFFIGURES2_HOME")
            .or_else(|| tools.pdffigures2_home.as_deref().map(PathBuf::from)),
        grobid_home: from_env("GROBID").or_else(|| tools.grobid_home.as_deref().map(PathBuf::from)),
        parscit_home: from_env("PARSCIT")
            .or_else(|| tools.parscit_home.as_deref().map(PathBuf::from)),
        cache_dir: tools
            .cache_dir
            .as_deref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".")),
    }
}

fn resolve_data_dir(flag: Option<PathBuf>, config: &ConfigFile) -> PathBuf {
    flag.or_else(|| std::env::var("SECTEVAL_DATA_DIR").ok().map(PathBuf::from))
        .or_else(|| {
            config
                .data
                .as_ref()
                .and_then(|d| d.data_dir.as_deref().map(PathBuf::from))
        })
        .unwrap_or_else(|| PathBuf::from("data"))
}

/// Load the corpus and its annotations, keeping only annotated documents.
fn load_scored_documents(
    data_dir: &PathBuf,
) -> anyhow::Result<BTreeMap<String, AnnotatedDocument>> {
    let corpus = Corpus::load(data_dir)?;
    let annotations = load_annotations(&data_dir.join(ANNOTATIONS_FILE), &corpus)?;
    println!(
        "Have {} labelled documents",
        annotations.values().filter(|d| d.is_annotated()).count()
    );
    Ok(annotations
        .into_iter()
        .filter(|(_, doc)| doc.is_annotated())
        .collect())
}

fn evaluate(
    extractor_name: String,
    list_errors: Option<ListMode>,
    doc_id: Option<String>,
    export: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    no_color: bool,
) -> anyhow::Result<()> {
    let config = config_file::load_config();
    let data_dir = resolve_data_dir(data_dir, &config);
    let mut scored = load_scored_documents(&data_dir)?;

    if let Some(ref id) = doc_id {
        let Some(doc) = scored.remove(id) else {
            anyhow::bail!("document id {id:?} not found in the annotation set");
        };
        scored = BTreeMap::from([(id.clone(), doc)]);
    }

    let registry = ExtractorRegistry::with_defaults(resolve_tools(&config));
    let backend = registry.build(&extractor_name)?;

    let pdf_paths: Vec<PathBuf> = scored.values().map(|d| d.pdf_path.clone()).collect();
    tracing::info!(extractor = %extractor_name, documents = pdf_paths.len(), "running extraction");
    let extracted = backend.get_sections(&pdf_paths)?;

    let excluded_names: Vec<String> = config
        .data
        .as_ref()
        .and_then(|d| d.excluded_names.clone())
        .unwrap_or_else(|| {
            secteval_core::DEFAULT_EXCLUDED_NAMES
                .iter()
                .map(|s| s.to_string())
                .collect()
        });
    let excluded: Vec<&str> = excluded_names.iter().map(String::as_str).collect();

    // A document the backend produced nothing for would silently skew the
    // corpus metrics, so the whole run aborts instead.
    let mut evaluated = Vec::new();
    for (doc_id, doc) in &scored {
        let raw = extracted.get(doc_id).ok_or_else(|| {
            anyhow::anyhow!("extractor {extractor_name:?} produced no output for document {doc_id}")
        })?;
        let titles: Vec<SectionTitle> = raw.iter().map(|s| SectionTitle::new(s.as_str())).collect();
        evaluated.push(grade_extraction(doc, &titles, &excluded)?);
    }

    let metrics = CorpusMetrics::aggregate(&evaluated);
    let color = ColorMode(!no_color);
    let mut stdout = std::io::stdout();
    output::print_summary(&mut stdout, &metrics)?;
    if let Some(mode) = list_errors {
        output::list_documents(&mut stdout, &evaluated, mode == ListMode::Errors, color)?;
    }
    stdout.flush()?;

    if let Some(path) = export {
        let Some(format) = ExportFormat::from_path(&path) else {
            anyhow::bail!("cannot infer export format from {}: use .json or .csv", path.display());
        };
        export_results(&extractor_name, &evaluated, &metrics, format, &path)?;
        tracing::info!(path = %path.display(), "wrote results");
    }
    Ok(())
}

async fn fetch(data_dir: Option<PathBuf>) -> anyhow::Result<()> {
    let config = config_file::load_config();
    let data_dir = resolve_data_dir(data_dir, &config);
    let corpus = Corpus::load(&data_dir)?;

    let bar = ProgressBar::hidden();
    bar.set_style(ProgressStyle::with_template(
        "{bar:40} {pos}/{len} {msg}",
    )?);
    let summary = fetch_missing(&corpus, |event| match event {
        FetchProgress::Scanned { present, missing } => {
            println!("Already have {present} documents, need to download {missing}");
            bar.set_length(missing as u64);
            bar.set_draw_target(indicatif::ProgressDrawTarget::stderr());
        }
        FetchProgress::Downloading { doc_id, .. } => bar.set_message(doc_id),
        FetchProgress::Downloaded { .. } => bar.inc(1),
    })
    .await?;
    bar.finish_and_clear();
    println!("Downloaded {} documents", summary.downloaded);
    Ok(())
}

fn time(extractor_name: String, data_dir: Option<PathBuf>) -> anyhow::Result<()> {
    let config = config_file::load_config();
    let data_dir = resolve_data_dir(data_dir, &config);
    let scored = load_scored_documents(&data_dir)?;

    let registry = ExtractorRegistry::with_defaults(resolve_tools(&config));
    let backend = registry.build(&extractor_name)?;
    let pdf_paths: Vec<PathBuf> = scored.values().map(|d| d.pdf_path.clone()).collect();

    println!("Timing extractor {} on {} documents", extractor_name, pdf_paths.len());
    let start = Instant::now();
    backend.get_sections(&pdf_paths)?;
    println!("{:.2}s", start.elapsed().as_secs_f64());
    Ok(())
}
