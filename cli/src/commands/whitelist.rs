use crate::utils::{env_paths::EnvPaths, project_root};
use crate::OutputFormat;
use anyhow::{Context, Result};
use authz::{AppWhitelistEntry, LegacyWhitelistGate, WhitelistConfiguration};
use colored::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

/// Explicit path wins; otherwise the project's configured whitelist file.
pub fn resolve_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path),
        None => {
            let root = project_root::find_project_root()?;
            Ok(EnvPaths::load_with_base(&root).whitelist_path())
        }
    }
}

fn load(path: &Path) -> Result<WhitelistConfiguration> {
    WhitelistConfiguration::from_file(path)
        .with_context(|| format!("Failed to load whitelist from {}", path.display()))
}

#[derive(Serialize)]
struct ApplicationSummary<'a> {
    app_id: &'a str,
    endpoints: Vec<String>,
    allowed_subjects: Vec<&'a str>,
}

impl<'a> ApplicationSummary<'a> {
    fn new(whitelist: &WhitelistConfiguration, entry: &'a AppWhitelistEntry) -> Self {
        let mut allowed_subjects: Vec<&str> =
            entry.allowed_subjects.iter().map(String::as_str).collect();
        allowed_subjects.sort_unstable();

        Self {
            app_id: &entry.app_id,
            endpoints: whitelist
                .operations_for(&entry.app_id)
                .into_iter()
                .map(|(controller, operation)| format!("{}.{}", controller, operation))
                .collect(),
            allowed_subjects,
        }
    }
}

/// List all registered applications
pub fn list(path: &Path, format: OutputFormat) -> Result<ExitCode> {
    let whitelist = load(path)?;

    match format {
        OutputFormat::Json => {
            let summaries: Vec<_> = whitelist
                .entries()
                .into_iter()
                .map(|entry| ApplicationSummary::new(&whitelist, entry))
                .collect();
            println!("{}", serde_json::to_string_pretty(&summaries)?);
        }
        OutputFormat::Yaml => {
            print!("{}", whitelist.to_yaml()?);
        }
        OutputFormat::Text => print_whitelist_text(path, &whitelist),
    }

    Ok(ExitCode::SUCCESS)
}

/// Check one endpoint for one application
pub fn check(path: &Path, app_id: &str, controller: &str, operation: &str) -> Result<ExitCode> {
    if report_check(path, app_id, controller, operation)? {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(1))
    }
}

fn report_check(path: &Path, app_id: &str, controller: &str, operation: &str) -> Result<bool> {
    let gate = LegacyWhitelistGate::new(Arc::new(load(path)?));

    match gate.verify(app_id, controller, operation) {
        Ok(()) => {
            println!(
                "{} {} may call {}.{}",
                "ALLOWED".green().bold(),
                app_id,
                controller,
                operation
            );
            Ok(true)
        }
        Err(denial) => {
            println!(
                "{} {} may not call {}.{} ({})",
                "DENIED".red().bold(),
                app_id,
                controller,
                operation,
                denial.reason()
            );
            Ok(false)
        }
    }
}

fn print_whitelist_text(path: &Path, whitelist: &WhitelistConfiguration) {
    println!("{}", "=== Bookshelf Application Whitelist ===".bold());
    println!("File: {}", path.display());
    println!("Total applications: {}", whitelist.len());
    println!();

    for entry in whitelist.entries() {
        let summary = ApplicationSummary::new(whitelist, entry);
        println!("{}", summary.app_id.cyan().bold());
        println!("{}", "─".repeat(50));

        if summary.endpoints.is_empty() {
            println!("  {}", "(no endpoints)".dimmed());
        }
        for endpoint in &summary.endpoints {
            println!("  {}", endpoint);
        }
        if !summary.allowed_subjects.is_empty() {
            println!("  Subjects: {}", summary.allowed_subjects.join(", "));
        }
        println!();
    }
}
