//! Prompt assembly
//!
//! Serializes repository metadata and a capped subset of the collected files
//! into the text sent to the model. Test and configuration files get reserved
//! slots so that priority order alone cannot crowd them out.

use crate::collector::{CollectedFile, Collection};
use crate::config::PromptLimits;
use crate::metadata::RepositoryMetadata;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;

/// Instructions given to the model as the system message
pub const SYSTEM_PROMPT: &str = r#"You are a senior software engineer reviewing an open-source repository.
Judge the project only from the metadata and files provided. Scores are integers from 0 to 100
where 50 is an average open-source project. Keep explanations to two or three sentences and
make every point specific to this repository. If the provided files are not enough to judge a
dimension, say so in its explanation and score it conservatively."#;

const TRUNCATION_MARKER: &str = "\n... [truncated]\n";

/// Picks the files whose bodies go into the prompt.
///
/// `files` must already be in priority order. Up to `reserved_test_files`
/// tests and `reserved_config_files` config files are always taken, the
/// remaining slots are filled in priority order, and the result keeps the
/// order of `files`.
pub fn select_files<'a>(files: &'a [CollectedFile], limits: &PromptLimits) -> Vec<&'a CollectedFile> {
    let (_, chosen) = plan_selection(files, limits);
    chosen.into_iter().map(|i| &files[i]).collect()
}

/// Returns the reserved indices and the full selection, both in file order
fn plan_selection(files: &[CollectedFile], limits: &PromptLimits) -> (BTreeSet<usize>, BTreeSet<usize>) {
    let cap = limits.max_files.min(files.len());
    let mut reserved: BTreeSet<usize> = BTreeSet::new();

    let tests = files.iter().enumerate().filter(|(_, f)| f.is_test).map(|(i, _)| i);
    reserved.extend(tests.take(limits.reserved_test_files.min(cap)));

    let configs = files
        .iter()
        .enumerate()
        .filter(|(i, f)| f.is_config && !reserved.contains(i))
        .map(|(i, _)| i)
        .take(limits.reserved_config_files.min(cap.saturating_sub(reserved.len())))
        .collect::<Vec<_>>();
    reserved.extend(configs);

    let mut chosen = reserved.clone();
    for i in 0..files.len() {
        if chosen.len() >= cap {
            break;
        }
        chosen.insert(i);
    }

    (reserved, chosen)
}

/// Cuts `text` to at most `max_chars` characters on a char boundary
pub fn truncate_chars(text: &str, max_chars: usize) -> (&str, bool) {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => (&text[..byte_index], true),
        None => (text, false),
    }
}

/// Renders the collected paths as an indented tree
pub fn file_tree(files: &[CollectedFile]) -> String {
    let mut paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
    paths.sort_unstable();

    let mut out = String::new();
    let mut printed_dirs: BTreeSet<String> = BTreeSet::new();
    for path in paths {
        let segments: Vec<&str> = path.split('/').collect();
        for depth in 0..segments.len().saturating_sub(1) {
            let dir = segments[..=depth].join("/");
            if printed_dirs.insert(dir) {
                let _ = writeln!(out, "{}{}/", "  ".repeat(depth), segments[depth]);
            }
        }
        let depth = segments.len() - 1;
        let _ = writeln!(out, "{}{}", "  ".repeat(depth), segments[depth]);
    }
    out
}

/// Builds the user message for the assessment request
pub fn build_prompt(metadata: &RepositoryMetadata, collection: &Collection, limits: &PromptLimits) -> String {
    let mut prompt = String::new();
    write_metadata(&mut prompt, metadata, limits);
    write_collection_overview(&mut prompt, collection);
    write_files(&mut prompt, collection, limits);
    prompt.push_str(
        "\nAssess this repository and answer with JSON that matches the provided schema exactly.\n",
    );
    prompt
}

fn write_metadata(out: &mut String, metadata: &RepositoryMetadata, limits: &PromptLimits) {
    let info = &metadata.info;
    let _ = writeln!(out, "# Repository: {}\n", info.full_name);
    if let Some(description) = &info.description {
        let _ = writeln!(out, "- Description: {}", description);
    }
    if let Some(language) = &info.language {
        let _ = writeln!(out, "- Primary language: {}", language);
    }
    let _ = writeln!(out, "- Stars: {}", info.stargazers_count);
    let _ = writeln!(out, "- Forks: {}", info.forks_count);
    let _ = writeln!(out, "- Open issues: {}", info.open_issues_count);
    let _ = writeln!(out, "- Default branch: {}", info.default_branch);
    let _ = writeln!(out, "- Branches: {}", metadata.branch_count);
    if let Some(license) = info.license.as_ref().and_then(|l| l.spdx_id.as_deref().or(l.name.as_deref())) {
        let _ = writeln!(out, "- License: {}", license);
    }
    if !info.topics.is_empty() {
        let _ = writeln!(out, "- Topics: {}", info.topics.join(", "));
    }
    if info.archived {
        let _ = writeln!(out, "- Archived: yes");
    }
    if let Some(created) = info.created_at {
        let _ = writeln!(out, "- Created: {}", created.format("%Y-%m-%d"));
    }
    if let Some(pushed) = info.pushed_at {
        let _ = writeln!(out, "- Last push: {}", pushed.format("%Y-%m-%d"));
    }

    let prs = &metadata.pull_requests;
    let _ = writeln!(
        out,
        "- Recent pull requests: {} sampled, {} open, {} merged, {} closed unmerged",
        prs.sampled, prs.open, prs.merged, prs.closed
    );

    let shares = metadata.language_shares();
    if !shares.is_empty() {
        out.push_str("\n## Languages\n\n");
        for (name, share) in shares {
            let _ = writeln!(out, "- {}: {:.1}%", name, share);
        }
    }

    if !metadata.recent_commits.is_empty() {
        out.push_str("\n## Recent commits\n\n");
        for commit in metadata.recent_commits.iter().take(limits.recent_commits) {
            let date = commit.date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default();
            let author = commit.author.as_deref().unwrap_or("unknown");
            let _ = writeln!(out, "- {} {} ({}, {})", commit.sha, commit.message, author, date);
        }
    }

    if let Some(readme) = &metadata.readme {
        let (excerpt, truncated) = truncate_chars(readme, limits.readme_chars);
        out.push_str("\n## README\n\n");
        out.push_str(excerpt);
        if truncated {
            out.push_str(TRUNCATION_MARKER);
        }
        out.push('\n');
    }
}

fn write_collection_overview(out: &mut String, collection: &Collection) {
    let stats = &collection.stats;
    out.push_str("\n## Collected files\n\n");
    let _ = writeln!(out, "- Files analyzed: {}", stats.files_analyzed);
    let _ = writeln!(out, "- Files skipped: {}", stats.files_skipped);
    let _ = writeln!(out, "- Total code size: {} bytes", stats.total_code_size);
    let _ = writeln!(out, "- Test files: {}", collection.test_files().count());
    let _ = writeln!(out, "- Config files: {}", collection.config_files().count());

    let mut by_priority: BTreeMap<String, usize> = BTreeMap::new();
    for file in &collection.files {
        *by_priority.entry(file.priority.to_string()).or_default() += 1;
    }
    let tiers: Vec<String> = by_priority.iter().map(|(tier, n)| format!("{} {}", n, tier)).collect();
    if !tiers.is_empty() {
        let _ = writeln!(out, "- By priority: {}", tiers.join(", "));
    }

    out.push_str("\n## File tree\n\n```\n");
    out.push_str(&file_tree(&collection.files));
    out.push_str("```\n");
}

fn write_files(out: &mut String, collection: &Collection, limits: &PromptLimits) {
    let files = &collection.files;
    let (reserved, chosen) = plan_selection(files, limits);
    out.push_str("\n## File contents\n");

    // Reserved files claim the character budget first; a body that does not
    // fit is skipped so smaller files later in the selection still get in.
    let mut budget = limits.max_total_chars;
    let mut admitted: BTreeMap<usize, (&str, bool)> = BTreeMap::new();
    for &i in reserved.iter().chain(chosen.difference(&reserved)) {
        let (body, truncated) = truncate_chars(&files[i].content, limits.max_file_chars);
        let body_chars = body.chars().count();
        if body_chars > budget {
            continue;
        }
        budget -= body_chars;
        admitted.insert(i, (body, truncated));
    }

    for (&i, &(body, truncated)) in &admitted {
        let file = &files[i];
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
        let language = file.language.as_deref().unwrap_or("text");
        let _ = write!(out, "\n### {} ({}, {} priority", file.path, language, file.priority);
        if !roles.is_empty() {
            let _ = write!(out, ", {}", roles.join("/"));
        }
        out.push_str(")\n\n```\n");
        out.push_str(body);
        if truncated {
            out.push_str(TRUNCATION_MARKER);
        } else if !body.ends_with('\n') {
            out.push('\n');
        }
        out.push_str("```\n");
    }

    if admitted.len() < chosen.len() {
        let _ = writeln!(
            out,
            "\n({} more selected files omitted to stay within the prompt budget)",
            chosen.len() - admitted.len()
        );
    }
}
