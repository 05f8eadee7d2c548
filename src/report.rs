//! Rendering and persistence of assessment results
//!
//! Produces the markdown report, the JSON document saved next to it, the
//! coloured terminal summary and the collection listing shown in
//! collect-only mode.

use crate::assessment::Assessment;
use crate::collector::{Collection, CollectionStats, Priority};
use crate::error::Result;
use crate::github::RepoLocation;
use crate::metadata::RepositoryMetadata;
use chrono::{DateTime, Utc};
use colored::*;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::path::{Path, PathBuf};

const REPORT_SUFFIX: &str = "assessment";

/// Everything written for one assessed repository
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentReport {
    /// `owner/repo`
    pub repository: String,
    pub branch: String,
    pub generated_at: DateTime<Utc>,
    /// Model that produced the assessment
    pub model: String,
    pub metadata: RepositoryMetadata,
    pub collection: CollectionStats,
    pub assessment: Assessment,
}

/// Paths of the files written by [`save_report`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedReport {
    pub markdown: PathBuf,
    pub json: PathBuf,
}

/// One line of the collect-only listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSummary {
    pub path: String,
    pub size: u64,
    pub priority: Priority,
    pub language: Option<String>,
    pub is_test: bool,
    pub is_config: bool,
    pub is_documentation: bool,
}

/// Result of a collect-only run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionSummary {
    pub repository: String,
    pub branch: String,
    pub stats: CollectionStats,
    pub languages: Vec<(String, usize)>,
    pub files: Vec<FileSummary>,
}

impl CollectionSummary {
    /// Summarizes a collection without the file bodies
    pub fn new(repo: &RepoLocation, branch: &str, collection: &Collection) -> Self {
        let files = collection
            .files
            .iter()
            .map(|f| FileSummary {
                path: f.path.clone(),
                size: f.size,
                priority: f.priority,
                language: f.language.clone(),
                is_test: f.is_test,
                is_config: f.is_config,
                is_documentation: f.is_documentation,
            })
            .collect();
        Self {
            repository: repo.full_name(),
            branch: branch.to_string(),
            stats: collection.stats.clone(),
            languages: collection.language_counts(),
            files,
        }
    }
}

/// Verbal grade for a 0-100 score
pub fn score_label(score: u8) -> &'static str {
    match score {
        90..=u8::MAX => "Excellent",
        75..=89 => "Good",
        60..=74 => "Fair",
        40..=59 => "Needs work",
        _ => "Poor",
    }
}

/// Replaces everything but alphanumerics, `-` and `_` with `_`
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// File name stem `<timestamp>_<owner>_<repo>_assessment`
pub fn report_stem(repo: &RepoLocation, at: DateTime<Utc>) -> String {
    format!(
        "{}_{}_{}_{}",
        at.format("%Y%m%d_%H%M%S"),
        sanitize_filename(&repo.owner),
        sanitize_filename(&repo.repo),
        REPORT_SUFFIX
    )
}

fn title_case(name: &str) -> String {
    name.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn write_list(out: &mut String, heading: &str, items: &[String]) {
    let _ = writeln!(out, "\n## {}\n", heading);
    if items.is_empty() {
        out.push_str("_None reported._\n");
        return;
    }
    for item in items {
        let _ = writeln!(out, "- {}", item);
    }
}

/// Renders the full markdown report
pub fn render_markdown(report: &AssessmentReport) -> String {
    let a = &report.assessment;
    let info = &report.metadata.info;
    let mut out = String::new();

    let _ = writeln!(out, "# Repository Assessment: {}\n", report.repository);
    let _ = writeln!(
        out,
        "_Generated {} with {} from branch `{}`_\n",
        report.generated_at.format("%Y-%m-%d %H:%M UTC"),
        report.model,
        report.branch
    );
    let _ = writeln!(
        out,
        "**Overall score: {}/100 ({})**\n\n{}",
        a.overall_score,
        score_label(a.overall_score),
        a.overall_explanation
    );

    out.push_str("\n## Summary\n\n");
    let _ = writeln!(out, "{}\n", a.summary);
    let _ = writeln!(out, "- **Purpose:** {}", a.purpose);
    let _ = writeln!(out, "- **Target audience:** {}", a.target_audience);
    if !a.tech_stack.is_empty() {
        let _ = writeln!(out, "- **Tech stack:** {}", a.tech_stack.join(", "));
    }
    let _ = writeln!(out, "- **Working status:** {} ({})", a.working_status, a.working_status_explanation);

    out.push_str("\n## Scores\n\n| Dimension | Score | Grade | Notes |\n|---|---:|---|---|\n");
    for d in a.dimensions() {
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} |",
            title_case(d.name),
            d.score,
            score_label(d.score),
            d.explanation.replace('|', "\\|").replace('\n', " ")
        );
    }

    write_list(&mut out, "Strengths", &a.strengths);
    write_list(&mut out, "Weaknesses", &a.weaknesses);
    write_list(&mut out, "Security Concerns", &a.security_concerns);
    write_list(&mut out, "Improvement Suggestions", &a.improvement_suggestions);
    write_list(&mut out, "Best Practices", &a.best_practices);

    out.push_str("\n## Roadmap\n\n");
    if a.roadmap.is_empty() {
        out.push_str("_No roadmap items._\n");
    }
    let mut roadmap: Vec<_> = a.roadmap.iter().collect();
    roadmap.sort_by_key(|item| item.priority);
    for item in roadmap {
        let category = serde_json::to_value(item.category)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "- **[{:?}] {}** ({}): {}",
            item.priority, item.title, category, item.description
        );
    }

    out.push_str("\n## Repository\n\n");
    if !info.html_url.is_empty() {
        let _ = writeln!(out, "- URL: {}", info.html_url);
    }
    if let Some(description) = &info.description {
        let _ = writeln!(out, "- Description: {}", description);
    }
    let _ = writeln!(
        out,
        "- Stars: {} | Forks: {} | Open issues: {} | Branches: {}",
        info.stargazers_count, info.forks_count, info.open_issues_count, report.metadata.branch_count
    );
    let shares = report.metadata.language_shares();
    if !shares.is_empty() {
        let languages: Vec<String> = shares.iter().map(|(name, pct)| format!("{} {:.1}%", name, pct)).collect();
        let _ = writeln!(out, "- Languages: {}", languages.join(", "));
    }

    let stats = &report.collection;
    out.push_str("\n## Collection\n\n");
    let _ = writeln!(out, "- Files analyzed: {}", stats.files_analyzed);
    let _ = writeln!(out, "- Files skipped: {}", stats.files_skipped);
    let _ = writeln!(out, "- Files filtered: {}", stats.files_filtered);
    let _ = writeln!(out, "- Total code size: {} bytes", stats.total_code_size);
    if stats.ceiling_reached {
        out.push_str("- Collection stopped at a size or file-count ceiling\n");
    }

    out
}

/// Writes the markdown and JSON report into `output_dir`
pub async fn save_report(report: &AssessmentReport, repo: &RepoLocation, output_dir: &Path) -> Result<SavedReport> {
    tokio::fs::create_dir_all(output_dir).await?;
    let stem = report_stem(repo, report.generated_at);
    let markdown = output_dir.join(format!("{}.md", stem));
    let json = output_dir.join(format!("{}.json", stem));

    tokio::fs::write(&markdown, render_markdown(report)).await?;
    tokio::fs::write(&json, serde_json::to_string_pretty(report)?).await?;
    log::info!("Saved report to {}", markdown.display());

    Ok(SavedReport { markdown, json })
}

fn colored_score(score: u8) -> ColoredString {
    let text = format!("{:>3}", score);
    match score {
        75..=u8::MAX => text.bright_green().bold(),
        50..=74 => text.bright_yellow().bold(),
        _ => text.bright_red().bold(),
    }
}

/// Prints the assessment highlights to stdout
pub fn print_summary(report: &AssessmentReport, saved: Option<&SavedReport>) {
    let a = &report.assessment;
    println!("\n{} {}", "Assessment:".bright_green().bold(), report.repository.bright_white().bold());
    println!(
        "{} {}/100 ({})",
        "Overall:".bright_cyan(),
        colored_score(a.overall_score),
        score_label(a.overall_score)
    );
    println!("{} {}\n", "Status:".bright_cyan(), a.working_status.to_string().bright_white());

    for d in a.dimensions() {
        println!("  {:<22} {}", title_case(d.name), colored_score(d.score));
    }

    if let Some(top) = a.strengths.first() {
        println!("\n{} {}", "Top strength:".bright_green(), top);
    }
    if let Some(top) = a.weaknesses.first() {
        println!("{} {}", "Top weakness:".bright_red(), top);
    }

    if let Some(saved) = saved {
        println!("\n{} {}", "[SAVED]".bright_blue(), saved.markdown.display().to_string().bright_white());
        println!("{} {}", "[SAVED]".bright_blue(), saved.json.display().to_string().bright_white());
    }
}

/// Prints the collect-only listing to stdout
pub fn print_collection(summary: &CollectionSummary) {
    let stats = &summary.stats;
    println!(
        "\n{} {} ({})",
        "Collected:".bright_green().bold(),
        summary.repository.bright_white().bold(),
        summary.branch
    );
    println!(
        "{} analyzed, {} skipped, {} filtered, {} bytes",
        stats.files_analyzed.to_string().bright_cyan(),
        stats.files_skipped,
        stats.files_filtered,
        stats.total_code_size
    );
    if stats.ceiling_reached {
        println!("{}", "Collection stopped at a ceiling".bright_yellow());
    }
    for (language, count) in summary.languages.iter().take(5) {
        println!("  {:<14} {}", language, count);
    }
    println!();

    for file in &summary.files {
        let tier = match file.priority {
            Priority::High => "high".bright_green(),
            Priority::Medium => "medium".bright_yellow(),
            Priority::Low => "low".normal(),
        };
        let mut roles = Vec::new();
        if file.is_test {
            roles.push("test");
        }
        if file.is_config {
            roles.push("config");
        }
        if file.is_documentation {
            roles.push("docs");
        }
        println!("  {:<6} {:>8}  {} {}", tier, file.size, file.path, roles.join(",").dimmed());
    }
}
