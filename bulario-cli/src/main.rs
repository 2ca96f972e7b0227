use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::info;

use bulario_cli::{
    calculate_config_hash, init_logging, save_records, ConfigManager, CorpusBuilder,
    CorpusReport, DocumentFamily, DocumentProcessor, FamilySelection, OutputFormat,
};

#[derive(Parser)]
#[command(name = "bulario")]
#[command(about = "Segment drug package inserts into labeled text records")]
struct Args {
    /// Leaflet text files or directories of them
    #[arg(short, long, num_args = 1.., required_unless_present = "show_config")]
    input: Vec<PathBuf>,

    /// Path to custom config file (YAML format); replaces the built-in
    /// config of the family it declares
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Leaflet family: auto, patient, professional or generic
    #[arg(long, default_value = "auto")]
    family: FamilySelection,

    /// Output file path (default: <first input>_bulario.<format>)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format: csv, json or jsonl (default: from --output extension, else csv)
    #[arg(short, long)]
    format: Option<OutputFormat>,

    /// Override the minimum record length, in characters, for every family
    #[arg(long)]
    min_chars: Option<usize>,

    /// Skip documents whose extracted text repeats an earlier input
    #[arg(long)]
    dedupe: bool,

    /// Worker threads for the corpus build (default: one per core)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Print the effective config as YAML and exit
    #[arg(long)]
    show_config: bool,

    /// Debug logging for the segmenter
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let configs = load_configs(&args)?;

    if args.show_config {
        let family = match args.family {
            FamilySelection::Fixed(family) => family,
            FamilySelection::Auto => DocumentFamily::default(),
        };
        print!("{}", configs.get_config(family).to_yaml()?);
        return Ok(());
    }

    if let Some(jobs) = args.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .context("Failed to configure worker threads")?;
    }

    let processor = DocumentProcessor::new(&configs, args.family)
        .context("Invalid segmentation config")?;
    for config in configs.configs() {
        info!(
            family = %config.document_family,
            config_hash = %calculate_config_hash(config)?,
            "segmentation config"
        );
    }

    println!("📄 Processing {} input path(s)", args.input.len());
    let mut builder = CorpusBuilder::new(&processor);
    if args.dedupe {
        builder = builder.dedupe();
    }
    let report = builder.build(&args.input);

    print_summary(&report);

    if report.all_failed() {
        eprintln!("❌ Every document failed; nothing written");
        std::process::exit(1);
    }

    let format = args
        .format
        .or_else(|| args.output.as_deref().and_then(OutputFormat::from_path))
        .unwrap_or_default();
    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.input, format));

    let records = report.records();
    save_records(&records, &output_path, format)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;
    println!(
        "💾 Wrote {} records to {} ({format})",
        records.len(),
        output_path.display()
    );

    Ok(())
}

fn load_configs(args: &Args) -> Result<ConfigManager> {
    let mut configs = ConfigManager::new();
    if let Some(path) = &args.config {
        let family = configs.load_config_from_file(path)?;
        println!("📋 Loaded {family} config from: {}", path.display());
    }
    if let Some(min_chars) = args.min_chars {
        configs.set_min_record_chars(min_chars);
    }
    Ok(configs)
}

fn default_output_path(inputs: &[PathBuf], format: OutputFormat) -> PathBuf {
    let stem = inputs
        .first()
        .and_then(|p| p.file_stem())
        .and_then(|s| s.to_str())
        .unwrap_or("corpus");
    PathBuf::from(format!("{stem}_bulario.{format}"))
}

fn print_summary(report: &CorpusReport) {
    println!(
        "✅ {} of {} document(s) segmented, {} record(s)",
        report.documents.len(),
        report.attempted(),
        report.record_count()
    );
    if !report.duplicates.is_empty() {
        println!("   - Skipped duplicates: {}", report.duplicates.len());
    }
    if report.fallback_count() > 0 {
        println!("   - Whole-text fallbacks: {}", report.fallback_count());
    }

    println!("📊 Records per label:");
    for (label, count) in report.label_counts() {
        println!("   {:.<20} {count}", label.as_str());
    }

    if !report.failures.is_empty() {
        println!("⚠️  Failed documents:");
        for failure in &report.failures {
            println!("   - {}: {}", display_source(&failure.source), failure.reason);
        }
    }
}

fn display_source(source: &str) -> &str {
    Path::new(source)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn parses_family_and_format() {
        let args = Args::try_parse_from([
            "bulario",
            "--input",
            "a.txt",
            "b",
            "--family",
            "professional",
            "--format",
            "jsonl",
            "--dedupe",
        ])
        .unwrap();
        assert_eq!(args.input, vec![PathBuf::from("a.txt"), PathBuf::from("b")]);
        assert_eq!(
            args.family,
            FamilySelection::Fixed(DocumentFamily::ProfessionalInsert)
        );
        assert_eq!(args.format, Some(OutputFormat::Jsonl));
        assert!(args.dedupe);

        assert!(Args::try_parse_from(["bulario", "--input", "a.txt", "--family", "bula"]).is_err());
        assert!(Args::try_parse_from(["bulario", "--show-config"]).is_ok());
        assert!(Args::try_parse_from(["bulario"]).is_err());
    }

    #[test]
    fn default_output_is_named_after_the_first_input() {
        let inputs = [PathBuf::from("bulas/dipirona.txt"), PathBuf::from("outra.txt")];
        assert_eq!(
            default_output_path(&inputs, OutputFormat::Jsonl),
            PathBuf::from("dipirona_bulario.jsonl")
        );
        assert_eq!(
            default_output_path(&[], OutputFormat::Csv),
            PathBuf::from("corpus_bulario.csv")
        );
    }
}
