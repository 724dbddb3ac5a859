//! GPO version bumping
//!
//! Raises a GPO's version counter in the directory and in its GPT.INI
//! together. The file moves first behind a backup copy; a directory failure
//! rolls the file back, so the two stores never end up split.

use crate::domain::{GpoRef, GpoVersion, VersionTarget};
use crate::infrastructure::{gpt_ini_path, DirectoryService, FileStore, FileTransaction, GptIni};
use serde::Serialize;
use uuid::Uuid;

/// One version-bump request, covering one or more GPOs
#[derive(Debug, Clone)]
pub struct BumpVersionRequest {
    pub gpos: Vec<GpoRef>,
    pub target: VersionTarget,
    pub domain: Option<String>,
    pub server: Option<String>,
    /// Report the intended change without applying it
    pub what_if: bool,
}

/// Outcome for one GPO
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionBumpOutcome {
    pub gpo_name: String,
    pub gpo_id: Uuid,
    pub old_version: GpoVersion,
    pub new_version: GpoVersion,
    /// False in what-if mode
    pub applied: bool,
}

/// Batch report; one item's failure never stops the rest
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionBumpReport {
    pub success: bool,
    pub outcomes: Vec<VersionBumpOutcome>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl VersionBumpReport {
    pub fn new() -> Self {
        Self {
            success: true,
            outcomes: Vec::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_error(&mut self, error: String) {
        self.success = false;
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }
}

impl Default for VersionBumpReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Bump the version counter of each requested GPO.
///
/// Per GPO: resolve it, take the higher of the directory and GPT.INI values
/// as the baseline, increment the selected half (or halves), then apply the
/// new value to the file and the directory in that order. The GPT.INI is
/// guarded by a backup copy for the duration; rollback restores it
/// byte-for-byte and the backup never survives the operation.
pub fn bump_gpo_version(
    directory: &dyn DirectoryService,
    store: &dyn FileStore,
    request: &BumpVersionRequest,
) -> VersionBumpReport {
    let mut report = VersionBumpReport::new();

    // One server for the whole batch: explicit, or a discovered DC
    let server = match &request.server {
        Some(s) => s.clone(),
        None => match directory.discover_domain_controller(request.domain.as_deref(), false) {
            Ok(dc) => dc.dns_name,
            Err(e) => {
                report.add_error(format!("Cannot locate a domain controller: {}", e));
                return report;
            }
        },
    };

    for gpo_ref in &request.gpos {
        let gpo = match directory.resolve_gpo(gpo_ref, request.domain.as_deref(), Some(&server)) {
            Ok(g) => g,
            Err(e) => {
                tracing::warn!(gpo = %gpo_ref, error = %e, "Skipping unresolvable GPO");
                report.add_error(format!("{}: {}", gpo_ref, e));
                continue;
            }
        };

        let ini_path = gpt_ini_path(&server, &gpo.domain, &gpo.folder_name());

        // Both reads happen before any mutation; either failing aborts the
        // item with both stores untouched.
        let ini_bytes = match store.read(&ini_path) {
            Ok(b) => b,
            Err(e) => {
                report.add_error(format!("{}: {}", gpo.display_name, e));
                continue;
            }
        };
        let mut ini = GptIni::parse(&String::from_utf8_lossy(&ini_bytes));

        let ad_raw = match directory.read_version(&gpo, Some(&server)) {
            Ok(v) => v,
            Err(e) => {
                report.add_error(format!("{}: {}", gpo.display_name, e));
                continue;
            }
        };

        let file_raw = match ini.version() {
            Some(v) => {
                if v != ad_raw {
                    report.add_warning(format!(
                        "{}: directory version {} and GPT.INI version {} disagree, using the higher",
                        gpo.display_name, ad_raw, v
                    ));
                }
                v
            }
            None => {
                report.add_warning(format!(
                    "{}: GPT.INI has no readable Version entry, treating it as 0",
                    gpo.display_name
                ));
                0
            }
        };

        let old = GpoVersion::from_raw(ad_raw.max(file_raw));
        let new = old.incremented(request.target);

        tracing::info!(
            gpo = gpo.display_name.as_str(),
            target = %request.target,
            old = old.as_raw(),
            new = new.as_raw(),
            what_if = request.what_if,
            "Bumping GPO version"
        );

        if request.what_if {
            report.outcomes.push(VersionBumpOutcome {
                gpo_name: gpo.display_name,
                gpo_id: gpo.id,
                old_version: old,
                new_version: new,
                applied: false,
            });
            continue;
        }

        let tx = match FileTransaction::begin(store, &ini_path) {
            Ok(tx) => tx,
            Err(e) => {
                report.add_error(format!("{}: {}", gpo.display_name, e));
                continue;
            }
        };

        ini.set_version(new.as_raw());
        if let Err(e) = tx.write(ini.render().as_bytes()) {
            // tx.write already restored the file and dropped the backup
            report.add_error(format!("{}: {}", gpo.display_name, e));
            continue;
        }

        match directory.write_version(&gpo, new.as_raw(), Some(&server)) {
            Ok(()) => {
                if let Err(e) = tx.commit() {
                    report.add_warning(format!(
                        "{}: version applied but backup cleanup failed: {}",
                        gpo.display_name, e
                    ));
                }
                report.outcomes.push(VersionBumpOutcome {
                    gpo_name: gpo.display_name,
                    gpo_id: gpo.id,
                    old_version: old,
                    new_version: new,
                    applied: true,
                });
            }
            Err(e) => {
                tracing::error!(gpo = gpo.display_name.as_str(), error = %e, "Directory write failed, rolling back GPT.INI");
                if let Err(re) = tx.rollback() {
                    report.add_warning(format!(
                        "{}: rollback of GPT.INI failed: {}",
                        gpo.display_name, re
                    ));
                }
                report.add_error(format!("{}: {}", gpo.display_name, e));
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::mock::MockDirectory;
    use crate::domain::GpoIdentity;
    use crate::infrastructure::sysvol::mem::MemStore;
    use std::path::Path;

    fn sample_gpo() -> GpoIdentity {
        GpoIdentity {
            id: Uuid::parse_str("31b2f340-016d-11d2-945f-00c04fb984f9").unwrap(),
            display_name: "Default Domain Policy".to_string(),
            distinguished_name:
                "CN={31B2F340-016D-11D2-945F-00C04FB984F9},CN=Policies,CN=System,DC=contoso,DC=com"
                    .to_string(),
            domain: "contoso.com".to_string(),
        }
    }

    fn request(what_if: bool) -> BumpVersionRequest {
        BumpVersionRequest {
            gpos: vec![GpoRef::Name("Default Domain Policy".to_string())],
            target: VersionTarget::Both,
            domain: None,
            server: Some("dc01.contoso.com".to_string()),
            what_if,
        }
    }

    fn seed_ini(store: &MemStore, gpo: &GpoIdentity, version: u32) -> std::path::PathBuf {
        let path = gpt_ini_path("dc01.contoso.com", &gpo.domain, &gpo.folder_name());
        store.insert(&path, format!("[General]\r\nVersion={}", version).as_bytes());
        path
    }

    #[test]
    fn test_successful_bump_updates_both_stores() {
        let gpo = sample_gpo();
        let dir = MockDirectory::with_gpo(gpo.clone(), 0x0002_0003);
        let store = MemStore::new();
        let path = seed_ini(&store, &gpo, 0x0002_0003);

        let report = bump_gpo_version(&dir, &store, &request(false));

        assert!(report.success, "errors: {:?}", report.errors);
        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(report.outcomes[0].old_version.user, 2);
        assert_eq!(report.outcomes[0].old_version.computer, 3);
        assert_eq!(report.outcomes[0].new_version.user, 3);
        assert_eq!(report.outcomes[0].new_version.computer, 4);

        let expected = report.outcomes[0].new_version.as_raw();
        assert_eq!(dir.version_of(&gpo.distinguished_name), Some(expected));
        let ini = GptIni::parse(&String::from_utf8_lossy(&store.contents(&path).unwrap()));
        assert_eq!(ini.version(), Some(expected));

        let mut bak = path.as_os_str().to_owned();
        bak.push(".bak");
        assert!(!store.exists(Path::new(&bak)));
    }

    #[test]
    fn test_what_if_changes_nothing() {
        let gpo = sample_gpo();
        let dir = MockDirectory::with_gpo(gpo.clone(), 5);
        let store = MemStore::new();
        let path = seed_ini(&store, &gpo, 5);

        let report = bump_gpo_version(&dir, &store, &request(true));

        assert!(report.success);
        assert_eq!(report.outcomes.len(), 1);
        assert!(!report.outcomes[0].applied);
        assert_eq!(dir.version_of(&gpo.distinguished_name), Some(5));
        let ini = GptIni::parse(&String::from_utf8_lossy(&store.contents(&path).unwrap()));
        assert_eq!(ini.version(), Some(5));
    }

    #[test]
    fn test_missing_file_leaves_directory_untouched() {
        let gpo = sample_gpo();
        let dir = MockDirectory::with_gpo(gpo.clone(), 7);
        let store = MemStore::new(); // no GPT.INI seeded

        let report = bump_gpo_version(&dir, &store, &request(false));

        assert!(!report.success);
        assert!(report.outcomes.is_empty());
        assert_eq!(dir.version_of(&gpo.distinguished_name), Some(7));
    }

    #[test]
    fn test_directory_failure_rolls_back_file() {
        let gpo = sample_gpo();
        let mut dir = MockDirectory::with_gpo(gpo.clone(), 9);
        dir.fail_directory_writes = true;
        let store = MemStore::new();
        let path = seed_ini(&store, &gpo, 9);
        let before = store.contents(&path).unwrap();

        let report = bump_gpo_version(&dir, &store, &request(false));

        assert!(!report.success);
        assert_eq!(store.contents(&path).unwrap(), before);
        assert_eq!(dir.version_of(&gpo.distinguished_name), Some(9));

        let mut bak = path.as_os_str().to_owned();
        bak.push(".bak");
        assert!(!store.exists(Path::new(&bak)));
    }

    #[test]
    fn test_unresolvable_gpo_does_not_halt_batch() {
        let gpo = sample_gpo();
        let dir = MockDirectory::with_gpo(gpo.clone(), 1);
        let store = MemStore::new();
        seed_ini(&store, &gpo, 1);

        let mut req = request(false);
        req.gpos.insert(0, GpoRef::Name("No Such Policy".to_string()));

        let report = bump_gpo_version(&dir, &store, &req);

        assert!(!report.success);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(report.outcomes[0].gpo_name, "Default Domain Policy");
    }

    #[test]
    fn test_baseline_is_max_of_directory_and_file() {
        let gpo = sample_gpo();
        let dir = MockDirectory::with_gpo(gpo.clone(), 5);
        let store = MemStore::new();
        seed_ini(&store, &gpo, 9); // file drifted ahead

        let mut req = request(false);
        req.target = VersionTarget::Computer;
        let report = bump_gpo_version(&dir, &store, &req);

        assert_eq!(report.outcomes[0].old_version.computer, 9);
        assert_eq!(report.outcomes[0].new_version.computer, 10);
        assert!(!report.warnings.is_empty());
    }

    #[test]
    fn test_unreadable_ini_version_warns_and_uses_directory_value() {
        let gpo = sample_gpo();
        let dir = MockDirectory::with_gpo(gpo.clone(), 5);
        let store = MemStore::new();
        let path = gpt_ini_path("dc01.contoso.com", &gpo.domain, &gpo.folder_name());
        store.insert(&path, b"[General]\r\nVersion=garbage");

        let report = bump_gpo_version(&dir, &store, &request(false));

        assert!(report
            .warnings
            .iter()
            .any(|w| w.contains("no readable Version entry")));
        assert_eq!(report.outcomes[0].old_version.as_raw(), 5);
        assert!(report.outcomes[0].applied);
    }

    #[test]
    fn test_no_domain_controller_fails_up_front() {
        let gpo = sample_gpo();
        let dir = MockDirectory::with_gpo(gpo, 1);
        let store = MemStore::new();

        let mut req = request(false);
        req.server = None; // forces discovery against a mock with no DC
        let report = bump_gpo_version(&dir, &store, &req);

        assert!(!report.success);
        assert!(report.outcomes.is_empty());
    }
}
