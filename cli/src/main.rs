//! docrule CLI - document formatting validation and correction tool

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use docrule::{
    document_to_json, load_document, process_batch, report, Document, Engine, EngineOptions,
    JsonFormat, LoadOptions, Report, Ruleset, Status,
};

#[derive(Parser)]
#[command(name = "docrule")]
#[command(version)]
#[command(about = "Validate and correct document formatting against a rule set", long_about = None)]
struct Cli {
    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Report violations without changing the documents
    #[command(alias = "check")]
    Validate {
        /// Input document models (JSON)
        #[arg(value_name = "FILE", required = true)]
        inputs: Vec<PathBuf>,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Correct violations and write corrected documents
    Fix {
        /// Input document models (JSON)
        #[arg(value_name = "FILE", required = true)]
        inputs: Vec<PathBuf>,

        /// Output file for the corrected document (single input only;
        /// defaults to <stem>_corrected.json next to each input)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Show ruleset information
    Rules {
        /// Ruleset file (JSON or YAML)
        #[arg(value_name = "RULES")]
        rules: PathBuf,
    },

    /// Show version information
    Version,
}

#[derive(Args)]
struct RunArgs {
    /// Ruleset file (JSON or YAML)
    #[arg(short, long, value_name = "RULES", env = "DOCRULE_RULES")]
    rules: PathBuf,

    /// Only run rules of this scope (repeatable)
    #[arg(short, long, value_name = "SCOPE")]
    scope: Vec<String>,

    /// Skip warning-severity checks
    #[arg(long)]
    skip_warnings: bool,

    /// Reject rules that check properties their elements do not have
    #[arg(long)]
    strict: bool,

    /// Write the report (JSON) to this file, or into this directory as
    /// <stem>_report.json per input, instead of printing it
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,

    /// Report format for stdout
    #[arg(short, long, value_enum, default_value = "text")]
    format: ReportFormat,

    /// Output compact JSON
    #[arg(long)]
    compact: bool,
}

impl RunArgs {
    fn load_ruleset(&self) -> Result<Ruleset, Box<dyn std::error::Error>> {
        let mut options = LoadOptions::new();
        if self.strict {
            options = options.strict();
        }
        Ok(Ruleset::from_path_with_options(&self.rules, &options)?)
    }

    fn engine_options(&self) -> EngineOptions {
        let mut options = EngineOptions::new().with_scopes(self.scope.iter().cloned());
        if self.skip_warnings {
            options = options.skip_warnings();
        }
        options
    }

    /// A single report file would be overwritten by each input in turn.
    fn check_report_target(&self, inputs: &[PathBuf]) -> Result<(), Box<dyn std::error::Error>> {
        match self.report {
            Some(ref path) if inputs.len() > 1 && !path.is_dir() => Err(format!(
                "--report must be an existing directory when several inputs are given: {}",
                path.display()
            )
            .into()),
            _ => Ok(()),
        }
    }

    fn json_format(&self) -> JsonFormat {
        if self.compact {
            JsonFormat::Compact
        } else {
            JsonFormat::Pretty
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    /// Human-readable summary
    Text,
    /// JSON report
    Json,
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let result = match cli.command {
        Some(Commands::Validate { inputs, run }) => cmd_validate(&inputs, &run),
        Some(Commands::Fix {
            inputs,
            output,
            run,
        }) => cmd_fix(&inputs, output.as_deref(), &run),
        Some(Commands::Rules { rules }) => cmd_rules(&rules).map(|_| 0),
        Some(Commands::Version) => {
            cmd_version();
            Ok(0)
        }
        None => {
            println!(
                "{}",
                "Usage: docrule <validate|fix> <FILE>... --rules <RULES>".yellow()
            );
            println!("       docrule --help for more information");
            Ok(0)
        }
    };

    match result {
        Ok(0) => {}
        Ok(_) => std::process::exit(2),
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            std::process::exit(1);
        }
    }
}

/// Returns the number of unresolved error-severity violations.
fn cmd_validate(inputs: &[PathBuf], run: &RunArgs) -> Result<usize, Box<dyn std::error::Error>> {
    run.check_report_target(inputs)?;
    let ruleset = run.load_ruleset()?;
    let engine = Engine::new(&ruleset).with_options(run.engine_options());

    let mut blocking = 0;
    for input in inputs {
        let doc = load_document(input)?;
        let report = engine.validate(&doc);
        blocking += report.blocking_errors();
        emit_report(input, &report, run)?;
    }

    Ok(blocking)
}

/// Returns the number of unresolved error-severity violations.
fn cmd_fix(
    inputs: &[PathBuf],
    output: Option<&Path>,
    run: &RunArgs,
) -> Result<usize, Box<dyn std::error::Error>> {
    if output.is_some() && inputs.len() > 1 {
        return Err("--output can only be used with a single input".into());
    }
    run.check_report_target(inputs)?;

    let ruleset = run.load_ruleset()?;

    let pb = progress_bar(inputs.len());
    let mut documents: Vec<Document> = Vec::with_capacity(inputs.len());
    for input in inputs {
        pb.set_message(format!("Loading {}", input.display()));
        documents.push(load_document(input)?);
        pb.inc(1);
    }
    pb.finish_and_clear();

    let outputs = process_batch(documents, &ruleset, &run.engine_options());

    let mut blocking = 0;
    for (input, out) in inputs.iter().zip(outputs) {
        let path = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| corrected_path(input));
        fs::write(&path, document_to_json(&out.document, run.json_format())?)?;
        println!("{} {}", "Saved to".green(), path.display());

        blocking += out.report.blocking_errors();
        emit_report(input, &out.report, run)?;
    }

    Ok(blocking)
}

fn cmd_rules(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let ruleset = Ruleset::from_path(path)?;
    let stats = ruleset.stats();

    println!("{}", "Ruleset Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), path.display());
    println!("{}: {}", "Version".bold(), ruleset.version());
    if let Some(ref name) = ruleset.metadata().name {
        println!("{}: {}", "Name".bold(), name);
    }
    if let Some(ref description) = ruleset.metadata().description {
        println!("{}: {}", "Description".bold(), description);
    }
    println!(
        "{}: {} ({} enabled, {} disabled)",
        "Rules".bold(),
        stats.total,
        stats.enabled,
        stats.disabled
    );
    println!(
        "{}: {} ({} warnings)",
        "Checks".bold(),
        stats.checks,
        stats.warning_checks
    );
    println!("{}: {}", "Fix actions".bold(), stats.fix_actions);
    if !stats.scopes.is_empty() {
        println!("{}: {}", "Scopes".bold(), stats.scopes.join(", "));
    }

    println!();
    println!("{}", "Rules".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    for rule in ruleset.rules() {
        let priority = if rule.priority == docrule::rules::LOWEST_PRIORITY {
            "-".to_string()
        } else {
            rule.priority.to_string()
        };
        let id = if rule.enabled {
            rule.id.bold()
        } else {
            rule.id.dimmed()
        };
        println!(
            "  {} [{}] priority {} | {} {} | {} checks, {} fixes",
            id,
            if rule.scope.is_empty() { "-" } else { rule.scope.as_str() },
            priority,
            rule.selector.element,
            if rule.enabled { "" } else { "(disabled)" },
            rule.checks.len(),
            rule.fix_actions.len()
        );
    }

    Ok(())
}

fn emit_report(
    input: &Path,
    report: &Report,
    run: &RunArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(ref path) = run.report {
        let path = if path.is_dir() {
            let stem = input.file_stem().unwrap_or_default().to_string_lossy();
            path.join(format!("{}_report.json", stem))
        } else {
            path.clone()
        };
        fs::write(&path, report::to_json(report, run.json_format())?)?;
        println!("{} {}", "Report saved to".green(), path.display());
        return Ok(());
    }

    match run.format {
        ReportFormat::Json => println!("{}", report::to_json(report, run.json_format())?),
        ReportFormat::Text => {
            println!("{} {}", "==>".cyan().bold(), input.display());
            let status = match report.status {
                Status::Clean | Status::Corrected => report.status.to_string().green(),
                Status::Validated => report.status.to_string().yellow(),
                Status::NeedsReview => report.status.to_string().red(),
            };
            println!("{}: {}", "Status".bold(), status);
            println!("{}", report::to_text(report));
            println!();
        }
    }
    Ok(())
}

fn corrected_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    input.with_file_name(format!("{}_corrected.json", stem))
}

fn progress_bar(len: usize) -> ProgressBar {
    if len < 2 {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len as u64);
    let template = "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}";
    if let Ok(style) = ProgressStyle::default_bar().template(template) {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}

fn cmd_version() {
    println!("{} {}", "docrule".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Document formatting validation and correction tool");
    println!();
    println!("License: MIT");
}
