//! CLI subcommand modules.
//!
//! This module contains the implementations for all treasury CLI subcommands.

pub(crate) mod analyze;
pub(crate) mod list;
pub(crate) mod upload;

use std::path::Path;

use anyhow::{Result, bail};
use treasury_core::{CompanyConfig, load_companies, presets};

/// Companies from `config`, or the built-in presets.
pub(crate) fn companies(config: Option<&Path>) -> Result<Vec<CompanyConfig>> {
    match config {
        Some(path) => Ok(load_companies(path)?),
        None => Ok(presets()),
    }
}

/// Look up a company by identifier, ignoring case.
pub(crate) fn find_company<'a>(
    companies: &'a [CompanyConfig],
    id: &str,
) -> Result<&'a CompanyConfig> {
    match companies.iter().find(|c| c.id.eq_ignore_ascii_case(id)) {
        Some(company) => Ok(company),
        None => {
            let known: Vec<&str> = companies.iter().map(|c| c.id.as_str()).collect();
            bail!("unknown company '{id}' (known: {})", known.join(", "))
        }
    }
}

/// Print a boxed section header.
pub(crate) fn print_header(title: &str) {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║{title:^62}║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");
}
