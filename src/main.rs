use anyhow::Context;
use clap::Parser;
use colored::*;
use log::debug;
use repo_assessor::{
    analyzer::{AnalysisOutcome, AnalyzeOptions, Analyzer},
    logging,
    report::{print_collection, print_summary},
    AssessorError, Config, RepoLocation,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// GitHub repository URL (prompted for when omitted)
    url: Option<String>,

    /// Output directory for reports
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Collect and list files without calling the LLM
    #[arg(long)]
    collect_only: bool,

    /// Print JSON instead of the coloured summary
    #[arg(long)]
    json: bool,

    /// Log level: error, warn, info, debug or trace
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    /// Maximum number of files to collect
    #[arg(long)]
    max_files: Option<usize>,

    /// Branch to collect from instead of the default branch
    #[arg(short, long)]
    branch: Option<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(&cli.log_level);

    if let Err(e) = run(cli).await {
        let message = match e.downcast_ref::<AssessorError>() {
            Some(err) => err.user_message(),
            None => format!("{:#}", e),
        };
        eprintln!("{} {}", "[ERROR]".bright_red(), message.bright_red());
        process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let url = match cli.url {
        Some(url) => url,
        None => prompt_for_url()?,
    };
    // rejected here before any config is read or directory created
    RepoLocation::parse_or_err(&url)?;

    let mut config = Config::load()?;
    if let Some(output) = cli.output {
        config.output_dir = output;
    }
    if let Some(max_files) = cli.max_files {
        config.collection.max_files = max_files;
    }
    config.validate().await.context("invalid configuration")?;
    debug!("Using configuration: {:?}", config);

    let options = AnalyzeOptions {
        branch: cli.branch,
        collect_only: cli.collect_only,
        show_progress: !cli.json,
    };
    if !cli.json {
        println!("{} {}", "Assessing:".bright_green(), url.bright_white());
    }

    let analyzer = Analyzer::new(config)?;
    match analyzer.run(&url, &options).await? {
        AnalysisOutcome::Collected(summary) => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_collection(&summary);
            }
        }
        AnalysisOutcome::Assessed { report, saved } => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_summary(&report, Some(&saved));
            }
        }
    }
    Ok(())
}

fn prompt_for_url() -> anyhow::Result<String> {
    print!("{} ", "GitHub repository URL:".bright_cyan());
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let url = input.trim().to_string();
    if url.is_empty() {
        anyhow::bail!("no repository URL given");
    }
    Ok(url)
}
