//! Command execution

use std::collections::BTreeMap;
use std::fmt::Write as _;

use anyhow::{Context as _, Result};
use colored::Colorize;
use log::{debug, info};
use serde::Serialize;

use crate::access::ResolveAccess;
use crate::cli;
use crate::host_api::{BatchResult, Manager, ManagerDetail, ManagerFactory};
use crate::manager_api::Capability;
use crate::trait_data::TraitsData;

/// Run whichever command the arguments select
pub fn run_command(args: &cli::Args, factory: &ManagerFactory) -> Result<()> {
    if args.list_managers {
        let managers = factory.available_managers()?;
        return emit(args.json, &managers, || format_manager_list(&managers));
    }

    if let Some(identifier) = &args.manager_info {
        let manager = factory.create_initialized_manager(identifier, args.manager_settings()?)?;
        let report = ManagerReport::from_manager(&manager)?;
        return emit(args.json, &report, || format_manager_report(&report));
    }

    if !args.resolve.is_empty() {
        let manager = select_manager(args, factory)?;
        let results = resolve_references(&manager, &args.resolve, &args.trait_set())?;
        return emit(args.json, &results, || format_resolve_results(&results));
    }

    // Nothing requested: describe the default manager, if any
    match factory.default_manager()? {
        Some(manager) => {
            let report = ManagerReport::from_manager(&manager)?;
            emit(args.json, &report, || format_manager_report(&report))
        }
        None => {
            println!("No default manager configured. Use --list-managers to see what is available.");
            Ok(())
        }
    }
}

fn emit<T: Serialize, F: FnOnce() -> String>(json: bool, value: &T, text: F) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        print!("{}", text());
    }
    Ok(())
}

/// The manager named by `--manager`, otherwise the configured default
fn select_manager(args: &cli::Args, factory: &ManagerFactory) -> Result<Manager> {
    match &args.manager {
        Some(identifier) => {
            debug!("Using manager from command line: {}", identifier);
            Ok(factory.create_initialized_manager(identifier, args.manager_settings()?)?)
        }
        None => factory
            .default_manager()?
            .context("No manager given and no default manager configured; use --manager"),
    }
}

/// Identity, info and capabilities of an initialized manager
#[derive(Debug, Serialize)]
pub struct ManagerReport {
    #[serde(flatten)]
    pub detail: ManagerDetail,
    pub capabilities: Vec<String>,
}

impl ManagerReport {
    pub fn from_manager(manager: &Manager) -> Result<Self> {
        let capabilities = Capability::ALL
            .iter()
            .filter(|c| manager.has_capability(**c))
            .map(|c| c.label().to_string())
            .collect();
        Ok(Self {
            detail: ManagerDetail {
                identifier: manager.identifier(),
                display_name: manager.display_name(),
                info: manager.info(),
            },
            capabilities,
        })
    }
}

/// Outcome of resolving one reference
#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolveOutcome {
    Resolved(TraitsData),
    Error(String),
}

/// Resolve each reference for reading. References the manager does not
/// recognise are reported without a call.
pub fn resolve_references(
    manager: &Manager,
    references: &[String],
    trait_set: &crate::trait_data::TraitSet,
) -> Result<Vec<(String, ResolveOutcome)>> {
    let mut outcomes: Vec<Option<ResolveOutcome>> = Vec::with_capacity(references.len());
    let mut valid = Vec::new();
    let mut positions = Vec::new();

    for (idx, candidate) in references.iter().enumerate() {
        match manager.create_entity_reference(candidate) {
            Ok(reference) => {
                valid.push(reference);
                positions.push(idx);
                outcomes.push(None);
            }
            Err(e) => outcomes.push(Some(ResolveOutcome::Error(e.to_string()))),
        }
    }

    let context = manager.create_context()?;
    let results: Vec<BatchResult<TraitsData>> =
        manager.resolve_batch(&valid, trait_set, ResolveAccess::Read, &context)?;
    info!("Resolved {} of {} references", results.iter().filter(|r| r.is_ok()).count(), references.len());

    for (position, result) in positions.into_iter().zip(results) {
        outcomes[position] = Some(match result {
            Ok(data) => ResolveOutcome::Resolved(data),
            Err(e) => ResolveOutcome::Error(e.to_string()),
        });
    }

    Ok(references
        .iter()
        .cloned()
        .zip(outcomes.into_iter().map(|o| o.unwrap_or(ResolveOutcome::Error("no result".to_string()))))
        .collect())
}

pub fn format_manager_list(managers: &BTreeMap<String, ManagerDetail>) -> String {
    let mut out = String::new();
    if managers.is_empty() {
        out.push_str("No managers available.\n");
        return out;
    }
    let _ = writeln!(out, "{}", "Available Managers:".bold());
    for detail in managers.values() {
        let _ = writeln!(out, "  {}  {}", detail.identifier.cyan(), detail.display_name);
    }
    out
}

pub fn format_manager_report(report: &ManagerReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", report.detail.display_name.bold(), report.detail.identifier.cyan());
    if !report.detail.info.is_empty() {
        let _ = writeln!(out, "{}", "Info:".bold());
        for (key, value) in &report.detail.info {
            let _ = writeln!(out, "  {}: {}", key, value);
        }
    }
    let _ = writeln!(out, "{}", "Capabilities:".bold());
    for capability in &report.capabilities {
        let _ = writeln!(out, "  {}", capability.green());
    }
    out
}

pub fn format_resolve_results(results: &[(String, ResolveOutcome)]) -> String {
    let mut out = String::new();
    for (reference, outcome) in results {
        match outcome {
            ResolveOutcome::Resolved(data) => {
                let _ = writeln!(out, "{}: {}", reference.cyan(), data);
            }
            ResolveOutcome::Error(message) => {
                let _ = writeln!(out, "{}: {}", reference.cyan(), message.red());
            }
        }
    }
    out
}
