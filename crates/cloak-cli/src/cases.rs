//! Batch regression harness: run a file of documents through the full cycle
//! and compare restored summaries with expected output.

use std::path::Path;

use anyhow::Context;
use cloak_runtime::{CycleOutcome, Pipeline};
use serde::{Deserialize, Serialize};
use tracing::info;

/// One document in a cases file.
#[derive(Debug, Clone, Deserialize)]
pub struct Case {
    #[serde(default)]
    pub name: Option<String>,
    pub text: String,
    /// Exact restored summary to compare against, if any.
    #[serde(default)]
    pub expected: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Passed,
    Mismatch,
    Unchecked,
    Failed,
}

#[derive(Debug, Serialize)]
pub struct CaseResult {
    pub name: String,
    pub verdict: Verdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<CycleOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Read a JSON array of cases.
pub fn load_cases(path: &Path) -> anyhow::Result<Vec<Case>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let cases: Vec<Case> = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    if cases.is_empty() {
        anyhow::bail!("{} contains no cases", path.display());
    }
    Ok(cases)
}

/// Compare a restored summary with the expected one, ignoring surrounding
/// whitespace.
pub fn judge(expected: Option<&str>, summary: &str) -> Verdict {
    match expected {
        Some(expected) if expected.trim() == summary.trim() => Verdict::Passed,
        Some(_) => Verdict::Mismatch,
        None => Verdict::Unchecked,
    }
}

/// Run every case through `pipeline`; results follow input order.
pub async fn run_cases(pipeline: &Pipeline, cases: &[Case]) -> Vec<CaseResult> {
    let texts: Vec<String> = cases.iter().map(|c| c.text.clone()).collect();
    let outcomes = pipeline.process_batch(&texts).await;

    let results: Vec<CaseResult> = cases
        .iter()
        .zip(outcomes)
        .enumerate()
        .map(|(i, (case, outcome))| {
            let name = case.name.clone().unwrap_or_else(|| format!("case-{}", i + 1));
            match outcome {
                Ok(outcome) => CaseResult {
                    name,
                    verdict: judge(case.expected.as_deref(), &outcome.summary),
                    outcome: Some(outcome),
                    error: None,
                },
                Err(e) => CaseResult {
                    name,
                    verdict: Verdict::Failed,
                    outcome: None,
                    error: Some(format!("{} ({} stage)", e, e.stage())),
                },
            }
        })
        .collect();

    let passed = results.iter().filter(|r| r.verdict == Verdict::Passed).count();
    info!("Cases: {}/{} passed", passed, results.len());
    results
}

/// Whether every case ran and none mismatched.
pub fn all_ok(results: &[CaseResult]) -> bool {
    results
        .iter()
        .all(|r| matches!(r.verdict, Verdict::Passed | Verdict::Unchecked))
}

/// Print a human-readable report.
pub fn print_report(results: &[CaseResult]) {
    for result in results {
        println!("[{:?}] {}", result.verdict, result.name);
        if let Some(outcome) = &result.outcome {
            println!("{}", outcome.summary);
            if !outcome.missing_placeholders.is_empty() {
                println!("  dropped: {}", outcome.missing_placeholders.join(", "));
            }
        }
        if let Some(error) = &result.error {
            println!("  error: {}", error);
        }
        println!();
    }
    let passed = results.iter().filter(|r| r.verdict == Verdict::Passed).count();
    println!("{}/{} passed", passed, results.len());
}
