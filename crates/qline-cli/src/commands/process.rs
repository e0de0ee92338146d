//! Process command - extract line items from a single quote file.

use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use qline_core::quote::rules::format_money;
use qline_core::quote::{ChainOutcome, ExtractionReport, SourceChain, TextFile};
use qline_core::LineItemParser;

use super::{load_config, primary_source, InputKind};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (PDF or text)
    #[arg(required = true)]
    input: PathBuf,

    /// Externally produced text of the same document (e.g. OCR output),
    /// tried after the input itself
    #[arg(long)]
    alt_text: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,

    /// Show per-item strategy and confidence on stderr
    #[arg(long)]
    show_confidence: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output, one row per line item
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let Some(kind) = InputKind::of(&args.input) else {
        anyhow::bail!("Unsupported file format: {}", args.input.display());
    };

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message("Extracting line items...");

    let parser = LineItemParser::from_config(&config);
    let mut chain = SourceChain::new(&parser)
        .with_accept_score(config.chain.accept_score)
        .with_source(primary_source(&args.input, kind, &config));
    if let Some(alt) = &args.alt_text {
        chain = chain.with_source(TextFile::new(alt));
    }

    let outcome = chain.run()?;
    pb.finish_and_clear();

    let output = format_result(&outcome.report, args.format, args.pretty)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        eprintln!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    print_warnings(&outcome.report);
    if args.show_confidence {
        print_confidence(&outcome);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

fn print_warnings(report: &ExtractionReport) {
    if report.warnings.is_empty() {
        return;
    }
    eprintln!("{}", style("Warnings:").yellow());
    for warning in &report.warnings {
        eprintln!("  - {}", warning);
    }
}

fn print_confidence(outcome: &ChainOutcome) {
    let report = &outcome.report;
    eprintln!();
    eprintln!(
        "{} Source: {} (score {:.1})",
        style("ℹ").blue(),
        outcome.source,
        outcome.score
    );
    eprintln!(
        "{} Currency: {}, candidates scanned: {}",
        style("ℹ").blue(),
        report.currency,
        report.candidates_scanned
    );
    for item in &report.items {
        eprintln!(
            "  line {:>4}  {:<22} {:.2}  {}",
            item.line_number, item.strategy, item.confidence, item.description
        );
    }
    eprintln!(
        "{} Processing time: {}ms",
        style("ℹ").blue(),
        report.processing_time_ms
    );
}

/// Render a parse result in the requested format.
pub fn format_result(
    report: &ExtractionReport,
    format: OutputFormat,
    pretty: bool,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json if pretty => Ok(serde_json::to_string_pretty(&report.result)?),
        OutputFormat::Json => Ok(serde_json::to_string(&report.result)?),
        OutputFormat::Csv => format_csv(report),
        OutputFormat::Text => format_text(report),
    }
}

fn format_csv(report: &ExtractionReport) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "group_quantity",
        "description",
        "quantity",
        "unit_price",
        "cost",
    ])?;

    for group in &report.result.groups {
        let group_quantity = group.quantity.to_string();
        for item in &group.line_items {
            wtr.write_record([
                group_quantity.as_str(),
                item.description.as_str(),
                &item.quantity.to_string(),
                &item.unit_price.to_string(),
                &item.cost.to_string(),
            ])?;
        }
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(report: &ExtractionReport) -> anyhow::Result<String> {
    let result = &report.result;
    let summary = &result.summary;
    let currency = report.currency;
    let mut output = String::new();

    if result.is_empty() {
        output.push_str("No line items found.\n");
        return Ok(output);
    }

    writeln!(output, "Quote summary ({})", currency)?;
    writeln!(output, "  Groups:         {}", summary.number_of_groups)?;
    writeln!(output, "  Total quantity: {}", summary.total_quantity)?;
    writeln!(output, "  Total cost:     {}", format_money(summary.total_cost, currency))?;
    writeln!(output, "  Final total:    {}", format_money(summary.final_total, currency))?;

    if !summary.calculation_steps.is_empty() {
        output.push_str("\nCalculation:\n");
        for step in &summary.calculation_steps {
            writeln!(output, "  {}", step)?;
        }
    }

    for group in &result.groups {
        writeln!(
            output,
            "\nQuantity {} @ {} = {}",
            group.quantity,
            format_money(group.unit_price, currency),
            format_money(group.total_price, currency)
        )?;
        for item in &group.line_items {
            writeln!(
                output,
                "  - {}: {} x {} = {}",
                item.description,
                item.quantity,
                format_money(item.unit_price, currency),
                format_money(item.cost, currency)
            )?;
        }
    }

    Ok(output)
}
