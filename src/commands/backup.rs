//! Backup manifest import

use crate::domain::BackupRecord;
use crate::error::AppResult;
use crate::infrastructure::manifest;
use std::path::Path;

/// Import the backup manifest at (or under) `path`.
///
/// `path` may be the repository directory or the manifest file itself. A
/// missing manifest is a reportable error; field contents are not validated.
pub fn import_gpo_backups(path: &Path) -> AppResult<Vec<BackupRecord>> {
    let records = manifest::import_manifest(path)?;
    tracing::info!(path = %path.display(), count = records.len(), "Imported backup manifest");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_produces_one_record_per_entry() {
        let dir = tempfile::tempdir().unwrap();
        let xml = r#"<Backups>
            <BackupInst>
                <GPODisplayName><![CDATA[Policy A]]></GPODisplayName>
                <ID><![CDATA[{11111111-1111-1111-1111-111111111111}]]></ID>
            </BackupInst>
            <BackupInst>
                <GPODisplayName><![CDATA[Policy B]]></GPODisplayName>
                <ID><![CDATA[{22222222-2222-2222-2222-222222222222}]]></ID>
            </BackupInst>
            <BackupInst>
                <GPODisplayName><![CDATA[Policy C]]></GPODisplayName>
                <ID><![CDATA[{33333333-3333-3333-3333-333333333333}]]></ID>
            </BackupInst>
        </Backups>"#;
        std::fs::write(dir.path().join("manifest.xml"), xml).unwrap();

        let records = import_gpo_backups(dir.path()).unwrap();

        assert_eq!(records.len(), 3);
        for record in &records {
            let id = record.id().unwrap();
            assert_eq!(record.backup_path, dir.path().join(id));
        }
    }

    #[test]
    fn test_import_missing_manifest_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = import_gpo_backups(dir.path()).unwrap_err();
        assert_eq!(err.error_code(), "MANIFEST_NOT_FOUND");
    }
}
