//! GPO backup manifest records

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// One backup instance from a repository manifest.
///
/// Fields are carried verbatim from the manifest; nothing beyond the
/// manifest's existence is validated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupRecord {
    /// Element name -> character data, one entry per child of the
    /// backup-instance element
    pub fields: BTreeMap<String, String>,
    /// Repository root joined with the instance's ID field
    pub backup_path: PathBuf,
}

impl BackupRecord {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// Backup instance identifier, if the manifest carried one
    pub fn id(&self) -> Option<&str> {
        self.get("ID")
    }
}
