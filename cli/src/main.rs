//! resume-ats CLI - résumé extraction and ATS scoring tool

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use colored::{ColoredString, Colorize};
use indicatif::{ProgressBar, ProgressStyle};

use resume_ats::{
    render, Analysis, DocumentFormat, JsonFormat, RawDocument, ResumeAts, RuleSet, ScoreBand,
    ScoreCategory, TextOptions,
};

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "resume-ats")]
#[command(version)]
#[command(about = "Extract résumés, score them for ATS compliance and match them to jobs", long_about = None)]
struct Cli {
    /// Declared document format (pdf, docx, pptx); detected when omitted
    #[arg(long, global = true, value_name = "FORMAT")]
    format: Option<String>,

    /// Rule table overriding the built-in lexicons and rubric
    #[arg(long, global = true, value_name = "FILE", env = "RESUME_ATS_RULES")]
    rules: Option<PathBuf>,

    /// Adapter time limit in milliseconds
    #[arg(long, global = true, value_name = "MS")]
    timeout_ms: Option<u64>,

    /// Verbose logging (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Full analysis: record, ATS score and optional job match
    Analyze {
        /// Input documents
        #[arg(value_name = "FILE", required = true)]
        inputs: Vec<PathBuf>,

        #[command(flatten)]
        job: JobArgs,

        /// Print JSON instead of a text report
        #[arg(long)]
        json: bool,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Print the extracted résumé record as JSON
    Extract {
        /// Input document
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Include warnings and provenance
        #[arg(long)]
        full: bool,
    },

    /// Print the normalized text blocks
    Blocks {
        /// Input document
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Print JSON instead of plain lines
        #[arg(long)]
        json: bool,
    },

    /// Print the ATS report
    Score {
        /// Input document
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Print JSON instead of a text report
        #[arg(long)]
        json: bool,
    },

    /// Match a résumé against a job description
    Match {
        /// Input document
        #[arg(value_name = "FILE")]
        input: PathBuf,

        #[command(flatten)]
        job: JobArgs,

        /// Print JSON instead of a text report
        #[arg(long)]
        json: bool,
    },

    /// Print the rule table in effect as TOML
    Rules,

    /// Show version information
    Version,
}

#[derive(Args)]
#[group(required = false, multiple = false)]
struct JobArgs {
    /// Job description file
    #[arg(long, value_name = "FILE")]
    job: Option<PathBuf>,

    /// Job description text
    #[arg(long, value_name = "TEXT")]
    job_text: Option<String>,
}

impl JobArgs {
    fn load(&self) -> Result<Option<String>, std::io::Error> {
        match (&self.job, &self.job_text) {
            (Some(path), _) => fs::read_to_string(path).map(Some),
            (None, Some(text)) => Ok(Some(text.clone())),
            (None, None) => Ok(None),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(e) = run(cli) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> CliResult {
    let ats = build_pipeline(&cli)?;
    let format = cli
        .format
        .as_deref()
        .map(DocumentFormat::from_tag)
        .transpose()?;

    match cli.command {
        Commands::Analyze {
            inputs,
            job,
            json,
            compact,
            output,
        } => {
            let job = job.load()?;
            let json = (json || compact).then_some(if compact {
                JsonFormat::Compact
            } else {
                JsonFormat::Pretty
            });
            cmd_analyze(&ats, &inputs, format, job.as_deref(), json, output.as_deref())
        }
        Commands::Extract { input, full } => cmd_extract(&ats, &input, format, full),
        Commands::Blocks { input, json } => cmd_blocks(&ats, &input, format, json),
        Commands::Score { input, json } => cmd_score(&ats, &input, format, json),
        Commands::Match { input, job, json } => {
            let job = job
                .load()?
                .ok_or("a job description is required (--job FILE or --job-text TEXT)")?;
            cmd_match(&ats, &input, format, &job, json)
        }
        Commands::Rules => {
            println!("{}", ats.rules().to_toml_string()?);
            Ok(())
        }
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    }
}

fn build_pipeline(cli: &Cli) -> Result<ResumeAts, resume_ats::Error> {
    let mut ats = ResumeAts::new();
    if let Some(path) = &cli.rules {
        log::debug!("using rule table {}", path.display());
        ats = ats.with_rules(RuleSet::from_path(path)?);
    }
    if let Some(ms) = cli.timeout_ms {
        ats = ats.with_timeout(Duration::from_millis(ms));
    }
    Ok(ats)
}

/// Read a document, taking the format from the flag, the extension or the
/// content, in that order.
fn load_document(
    input: &Path,
    format: Option<DocumentFormat>,
) -> Result<RawDocument, resume_ats::Error> {
    let bytes = fs::read(input)?;
    let format = match format {
        Some(format) => format,
        None => DocumentFormat::from_path(input)
            .or_else(|e| resume_ats::sniff_format(&bytes).ok_or(e))?,
    };
    Ok(RawDocument::new(bytes, format))
}

fn write_output(output: Option<&Path>, content: &str) -> CliResult {
    if let Some(path) = output {
        fs::write(path, content)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", content);
    }
    Ok(())
}

fn cmd_analyze(
    ats: &ResumeAts,
    inputs: &[PathBuf],
    format: Option<DocumentFormat>,
    job: Option<&str>,
    json: Option<JsonFormat>,
    output: Option<&Path>,
) -> CliResult {
    if let [input] = inputs {
        let doc = load_document(input, format)?;
        let analysis = ats.analyze_document(&doc, job)?;
        let content = match json {
            Some(format) => render::to_json(&analysis, format)?,
            None => colorize_report(&analysis),
        };
        return write_output(output, &content);
    }

    let pb = ProgressBar::new(inputs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );
    pb.set_message("Reading documents...");
    let mut docs = Vec::with_capacity(inputs.len());
    for input in inputs {
        docs.push(load_document(input, format)?);
        pb.inc(1);
    }
    pb.set_message("Analyzing...");
    let results = ats.analyze_batch(&docs, job);
    pb.finish_with_message("Done!");

    let mut reports = Vec::new();
    println!();
    for (input, result) in inputs.iter().zip(results) {
        match result {
            Ok(analysis) => {
                println!(
                    "  {} {} {}",
                    "├─".dimmed(),
                    band_colored(analysis.report.band, analysis.report.overall_score),
                    input.display()
                );
                reports.push(serde_json::json!({
                    "file": input.display().to_string(),
                    "analysis": analysis,
                }));
            }
            Err(e) => {
                println!("  {} {} {}: {}", "├─".dimmed(), "failed".red(), input.display(), e);
                reports.push(serde_json::json!({
                    "file": input.display().to_string(),
                    "error": { "kind": e.kind().as_str(), "message": e.to_string() },
                }));
            }
        }
    }

    if let Some(format) = json {
        let content = render::to_json(&reports, format)?;
        write_output(output, &content)?;
    }
    Ok(())
}

fn cmd_extract(
    ats: &ResumeAts,
    input: &Path,
    format: Option<DocumentFormat>,
    full: bool,
) -> CliResult {
    let doc = load_document(input, format)?;
    let blocks = ats.extract_blocks(&doc)?;
    let extraction = resume_ats::extract::extract(&blocks, ats.rules());

    for warning in &extraction.warnings {
        eprintln!("{}: {}", "Warning".yellow().bold(), warning);
    }
    let json = if full {
        render::to_json(&extraction, JsonFormat::Pretty)?
    } else {
        render::to_json(&extraction.record, JsonFormat::Pretty)?
    };
    println!("{}", json);
    Ok(())
}

fn cmd_blocks(
    ats: &ResumeAts,
    input: &Path,
    format: Option<DocumentFormat>,
    json: bool,
) -> CliResult {
    let doc = load_document(input, format)?;
    let blocks = ats.extract_blocks(&doc)?;

    if json {
        println!("{}", render::to_json(&blocks, JsonFormat::Pretty)?);
        return Ok(());
    }
    for block in &blocks {
        let hints: Vec<String> = block
            .style_hints
            .iter()
            .map(|h| format!("{:?}", h).to_lowercase())
            .collect();
        println!(
            "{} {} {}",
            format!("#{:<3} p{}", block.order_index, block.page).dimmed(),
            format!("[{}]", hints.join(",")).cyan(),
            block.text.replace('\n', " ⏎ ")
        );
    }
    Ok(())
}

fn cmd_score(
    ats: &ResumeAts,
    input: &Path,
    format: Option<DocumentFormat>,
    json: bool,
) -> CliResult {
    let doc = load_document(input, format)?;
    let analysis = ats.analyze_document(&doc, None)?;

    if json {
        println!("{}", render::to_json(&analysis.report, JsonFormat::Pretty)?);
    } else {
        println!("{}", colorize_report(&analysis));
    }
    Ok(())
}

fn cmd_match(
    ats: &ResumeAts,
    input: &Path,
    format: Option<DocumentFormat>,
    job: &str,
    json: bool,
) -> CliResult {
    let doc = load_document(input, format)?;
    let analysis = ats.analyze_document(&doc, Some(job))?;
    let Some(report) = analysis.job_match else {
        return Err("job description contains no text".into());
    };

    if json {
        println!("{}", render::to_json(&report, JsonFormat::Pretty)?);
        return Ok(());
    }
    println!("{}: {}%", "Job match".cyan().bold(), report.match_percent);
    println!("{}", "─".repeat(40).dimmed());
    let matched: Vec<&str> = report.matched_terms.iter().map(String::as_str).collect();
    let gaps: Vec<&str> = report.gap_terms.iter().map(String::as_str).collect();
    println!("{}: {}", "Matched".green().bold(), matched.join(", "));
    println!("{}: {}", "Missing".red().bold(), gaps.join(", "));
    Ok(())
}

fn band_colored(band: ScoreBand, score: u32) -> ColoredString {
    let label = format!("{:>3}/100 {}", score, band);
    match band {
        ScoreBand::Excellent => label.green().bold(),
        ScoreBand::Good => label.green(),
        ScoreBand::Fair => label.yellow(),
        ScoreBand::Poor => label.red(),
    }
}

/// Text report with the headline score colored by band.
fn colorize_report(analysis: &Analysis) -> String {
    let report = &analysis.report;
    let text = render::to_text(analysis, &TextOptions::default());
    let mut lines = text.lines();
    let mut out = String::new();

    // The first line is the overall score.
    if lines.next().is_some() {
        out.push_str(&format!(
            "{} {}\n",
            "ATS score:".cyan().bold(),
            band_colored(report.band, report.overall_score)
        ));
    }
    for line in lines {
        let highlighted = ScoreCategory::ALL
            .iter()
            .find(|c| line.trim_start().starts_with(c.label()))
            .filter(|c| report.sub_score(**c) < report.max_scores.get(*c).copied().unwrap_or(0));
        match highlighted {
            Some(_) => out.push_str(&format!("{}\n", line.yellow())),
            None => out.push_str(&format!("{}\n", line)),
        }
    }
    out.trim_end().to_string()
}

fn cmd_version() {
    println!("{} {}", "resume-ats".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Résumé extraction, ATS scoring and job matching");
    println!();
    println!("Formats: pdf, docx, pptx");
    println!("License: MIT");
}
