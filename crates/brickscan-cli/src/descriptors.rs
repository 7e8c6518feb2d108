//! Loading the identifier domain from part descriptor exports.
//!
//! Each part is exported as `<id>.json`, a JSON array of objects with a
//! `Type` and a `Properties` map. The file stem is the primary id; the
//! entry of the requested type may list `Aliases`.

use anyhow::{bail, Context, Result};
use brickscan_core::{DomainBuilder, IdentifierDomain};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

#[derive(Debug, Deserialize)]
struct ExportEntry {
    #[serde(rename = "Type")]
    kind: String,
    #[serde(rename = "Properties", default)]
    properties: Option<PartProperties>,
}

#[derive(Debug, Default, Deserialize)]
struct PartProperties {
    #[serde(rename = "Aliases", default)]
    aliases: Option<Vec<u32>>,
}

/// Build the identifier domain from every numeric `*.json` in `dir`
pub(crate) fn load_domain(dir: &Path, descriptor_type: &str) -> Result<IdentifierDomain> {
    if !dir.is_dir() {
        bail!("Parts directory does not exist: {}", dir.display());
    }

    let mut builder = IdentifierDomain::builder();
    let mut files = 0;

    for entry in WalkDir::new(dir)
        .max_depth(1)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }

        let Some(id) = path
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|s| s.parse::<u32>().ok())
        else {
            continue;
        };

        builder.add_primary(id);
        files += 1;

        if let Err(e) = add_aliases(&mut builder, path, id, descriptor_type) {
            warn!("Could not read aliases of part {}: {:#}", id, e);
        }
    }

    let domain = builder.build();
    info!(
        "Loaded {} part descriptors: {} ids, {} aliases",
        files,
        domain.primary_count(),
        domain.alias_count()
    );

    if domain.is_empty() {
        bail!("No part descriptors found in {}", dir.display());
    }

    Ok(domain)
}

fn add_aliases(
    builder: &mut DomainBuilder,
    path: &Path,
    id: u32,
    descriptor_type: &str,
) -> Result<()> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let entries: Vec<ExportEntry> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    let Some(entry) = entries.into_iter().find(|e| e.kind == descriptor_type) else {
        bail!("no {} entry in {}", descriptor_type, path.display());
    };

    for alias in entry
        .properties
        .and_then(|p| p.aliases)
        .unwrap_or_default()
    {
        debug!("Alias {} -> {}", alias, id);
        builder.add_alias(alias, id);
    }

    Ok(())
}
