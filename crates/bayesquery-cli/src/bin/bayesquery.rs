//! bayesquery CLI - answers a single query over a compact Bayesian network file
//!
//! Usage:
//!   bayesquery <file>                     # Write "<query>|<evidence>.json" to the current directory
//!   bayesquery <file> --out-dir results   # Write the result file elsewhere
//!   bayesquery <file> -o json --dry-run   # Print the result as JSON without writing a file
//!   bayesquery <file> --all-marginals     # Also print every variable's posterior

use std::path::{Path, PathBuf};
use std::process;

use bayesquery_core::{
    answer_query_with, build_network, infer_all, Evidence, ExecError, InferenceConfig, Posterior,
    QueryResult,
};
use bayesquery_frontend::{parse_spec_json_with_options, EdgeDiscovery, ParseOptions};
use clap::{Parser, ValueEnum};
use tracing::{debug, Level};
use tracing_subscriber::fmt;

#[derive(Parser)]
#[command(name = "bayesquery")]
#[command(version)]
#[command(about = "bayesquery - exact posterior queries over compact Bayesian networks")]
#[command(
    long_about = "Reads a JSON array of prior, conditional, BELIEF and QUERY records, \
                  runs variable elimination, and writes the queried probability to \
                  '<query>|<evidence>.json'"
)]
struct Cli {
    /// Input JSON record file
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Directory the result file is written to
    #[arg(long, default_value = ".", value_name = "DIR")]
    out_dir: PathBuf,

    /// Console output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Summary)]
    output: OutputFormat,

    /// Print the posterior of every variable as well
    #[arg(long)]
    all_marginals: bool,

    /// Record edges for conditional keys with negated parents too
    #[arg(long)]
    close_edge_gap: bool,

    /// Keep variables that cannot influence the query during elimination
    #[arg(long)]
    no_prune: bool,

    /// Compute and print the result without writing a file
    #[arg(long)]
    dry_run: bool,

    /// Enable trace-level logging
    #[arg(long)]
    debug: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Summary,
    Json,
    Debug,
}

fn setup_tracing(lvl: Level) {
    let format = fmt::format()
        .with_level(true)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .without_time()
        .compact();

    tracing_subscriber::fmt()
        .with_max_level(lvl)
        .with_writer(std::io::stderr)
        .event_format(format)
        .init();
}

fn main() {
    let cli = Cli::parse();
    setup_tracing(if cli.debug { Level::TRACE } else { Level::WARN });

    let source = match std::fs::read_to_string(&cli.file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", cli.file.display(), e);
            process::exit(1);
        }
    };
    debug!(file = %cli.file.display(), bytes = source.len(), "loaded input");

    let options = ParseOptions::default().with_edge_discovery(if cli.close_edge_gap {
        EdgeDiscovery::EveryRow
    } else {
        EdgeDiscovery::AffirmedRowsOnly
    });
    let config = InferenceConfig {
        prune_barren: !cli.no_prune,
        ..InferenceConfig::default()
    };

    let (result, marginals) = match run(&source, options, config, cli.all_marginals) {
        Ok(answer) => answer,
        Err(e) => {
            eprintln!("Error answering query in '{}': {}", cli.file.display(), e);
            process::exit(1);
        }
    };

    match cli.output {
        OutputFormat::Json => match serde_json::to_string_pretty(&result) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing to JSON: {}", e);
                process::exit(1);
            }
        },
        OutputFormat::Debug => println!("{:#?}", result),
        OutputFormat::Summary => print_summary(&result),
    }

    if let Some(marginals) = marginals {
        println!("\nMarginals ({}):", marginals.len());
        for (name, posterior) in &marginals {
            println!(
                "  {:<3} P(true) = {:.6}  P(false) = {:.6}",
                name, posterior.outcome_true, posterior.outcome_false
            );
        }
    }

    if cli.dry_run {
        return;
    }

    if let Err(e) = write_result(&cli.out_dir, &result) {
        eprintln!("Error writing '{}': {}", result_path(&cli.out_dir, &result).display(), e);
        process::exit(1);
    }
    println!(
        "A new JSON file has been created containing the probability assigned to the query \"{}\".",
        result.label
    );
}

type Marginals = Vec<(String, Posterior)>;

fn run(
    source: &str,
    options: ParseOptions,
    config: InferenceConfig,
    all_marginals: bool,
) -> Result<(QueryResult, Option<Marginals>), ExecError> {
    let result = answer_query_with(source, options, config)?;
    let marginals = if all_marginals {
        Some(marginals(source, options, config)?)
    } else {
        None
    };
    Ok((result, marginals))
}

/// Posterior of every variable under the input's evidence.
fn marginals(
    source: &str,
    options: ParseOptions,
    config: InferenceConfig,
) -> Result<Marginals, ExecError> {
    let spec = parse_spec_json_with_options(source, options)?;
    let network = build_network(&spec)?;
    let evidence = Evidence::resolve(&network, &spec.beliefs)?;
    Ok(infer_all(&network, &evidence, config)?.into_iter().collect())
}

/// `<label>.json` inside `out_dir`.
fn result_path(out_dir: &Path, result: &QueryResult) -> PathBuf {
    out_dir.join(format!("{}.json", result.label))
}

/// Writes the queried probability as a bare JSON number.
fn write_result(out_dir: &Path, result: &QueryResult) -> Result<PathBuf, String> {
    let path = result_path(out_dir, result);
    let json = serde_json::to_string(&result.probability).map_err(|e| e.to_string())?;
    std::fs::write(&path, json).map_err(|e| e.to_string())?;
    Ok(path)
}

fn print_summary(result: &QueryResult) {
    println!("✓ Query '{}' answered\n", result.label);
    println!("  P({}) = {:.6}", result.query, result.probability);
    println!(
        "  posterior: true = {:.6}, false = {:.6}",
        result.posterior.outcome_true, result.posterior.outcome_false
    );
}
