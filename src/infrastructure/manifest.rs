//! Backup manifest parsing
//!
//! A GPO backup repository carries a manifest.xml indexing every exported
//! backup: a document element with one BackupInst child per backup, each
//! child element holding one character-data field (usually CDATA).

use crate::domain::BackupRecord;
use crate::error::{AppError, AppResult};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const MANIFEST_FILE: &str = "manifest.xml";

/// Resolve the manifest location from a repository directory or a direct
/// file path. Returns the manifest path and the repository root.
pub fn resolve_manifest(path: &Path) -> AppResult<(PathBuf, PathBuf)> {
    let (manifest, root) = if path.is_dir() {
        (path.join(MANIFEST_FILE), path.to_path_buf())
    } else {
        let root = path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));
        (path.to_path_buf(), root)
    };

    if !manifest.is_file() {
        return Err(AppError::ManifestNotFound(manifest.display().to_string()));
    }
    Ok((manifest, root))
}

/// Parse manifest XML into one record per backup-instance element.
///
/// `root` is the repository root used to derive each record's backup path
/// from its ID field.
pub fn parse_manifest(xml: &str, root: &Path) -> AppResult<Vec<BackupRecord>> {
    let doc = roxmltree::Document::parse(xml)
        .map_err(|e| AppError::ManifestParse(e.to_string()))?;

    let mut records = Vec::new();

    for inst in doc
        .root_element()
        .children()
        .filter(|n| n.is_element() && n.tag_name().name() == "BackupInst")
    {
        let mut fields = BTreeMap::new();
        for field in inst.children().filter(|n| n.is_element()) {
            let name = field.tag_name().name().to_string();
            // Field value is the concatenated character data, CDATA included
            // and kept verbatim; whitespace-only nodes are document layout,
            // not data
            let value: String = field
                .children()
                .filter_map(|n| n.text())
                .filter(|t| !t.trim().is_empty())
                .collect();
            fields.insert(name, value);
        }

        let backup_path = match fields.get("ID") {
            Some(id) => root.join(id),
            None => root.to_path_buf(),
        };

        records.push(BackupRecord { fields, backup_path });
    }

    tracing::debug!(count = records.len(), "Parsed backup manifest");
    Ok(records)
}

/// Load and parse the manifest at (or under) `path`
pub fn import_manifest(path: &Path) -> AppResult<Vec<BackupRecord>> {
    let (manifest, root) = resolve_manifest(path)?;
    let xml = std::fs::read_to_string(&manifest)
        .map_err(|e| AppError::FileAccess(format!("{}: {}", manifest.display(), e)))?;
    parse_manifest(&xml, &root)
}
