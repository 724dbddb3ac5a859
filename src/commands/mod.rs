pub mod backup;
pub mod links;
pub mod version;

pub use backup::*;
pub use links::*;
pub use version::*;

/// Canned directory service for command-level tests
#[cfg(test)]
pub(crate) mod mock {
    use crate::domain::{GpoIdentity, GpoRef};
    use crate::error::{AppError, AppResult};
    use crate::infrastructure::{DirectoryService, DomainController, LinkHit, RootDse};
    use std::cell::RefCell;
    use std::collections::HashMap;
    use uuid::Uuid;

    #[derive(Debug, Default)]
    pub struct MockDirectory {
        pub gpos: Vec<GpoIdentity>,
        pub versions: RefCell<HashMap<String, u32>>,
        pub dc: Option<DomainController>,
        pub gc: Option<DomainController>,
        pub root: Option<RootDse>,
        pub links: Vec<LinkHit>,
        pub fail_directory_writes: bool,
        pub searched_bases: RefCell<Vec<String>>,
    }

    impl MockDirectory {
        pub fn with_gpo(gpo: GpoIdentity, version: u32) -> Self {
            let mut versions = HashMap::new();
            versions.insert(gpo.distinguished_name.clone(), version);
            Self {
                gpos: vec![gpo],
                versions: RefCell::new(versions),
                ..Default::default()
            }
        }

        pub fn version_of(&self, dn: &str) -> Option<u32> {
            self.versions.borrow().get(dn).copied()
        }
    }

    impl DirectoryService for MockDirectory {
        fn resolve_gpo(
            &self,
            gpo: &GpoRef,
            _domain: Option<&str>,
            _server: Option<&str>,
        ) -> AppResult<GpoIdentity> {
            self.gpos
                .iter()
                .find(|g| match gpo {
                    GpoRef::Id(id) => g.id == *id,
                    GpoRef::Name(name) => g.display_name == *name,
                })
                .cloned()
                .ok_or_else(|| AppError::GpoNotFound(gpo.to_string()))
        }

        fn read_version(&self, gpo: &GpoIdentity, _server: Option<&str>) -> AppResult<u32> {
            self.versions
                .borrow()
                .get(&gpo.distinguished_name)
                .copied()
                .ok_or_else(|| AppError::ObjectNotFound(gpo.distinguished_name.clone()))
        }

        fn write_version(
            &self,
            gpo: &GpoIdentity,
            version: u32,
            _server: Option<&str>,
        ) -> AppResult<()> {
            if self.fail_directory_writes {
                return Err(AppError::DirectoryWriteFailed("injected failure".to_string()));
            }
            self.versions
                .borrow_mut()
                .insert(gpo.distinguished_name.clone(), version);
            Ok(())
        }

        fn search_links(
            &self,
            _server: &str,
            base_dn: &str,
            _gpo_id: &Uuid,
        ) -> AppResult<Vec<LinkHit>> {
            self.searched_bases.borrow_mut().push(base_dn.to_string());
            Ok(self.links.clone())
        }

        fn discover_domain_controller(
            &self,
            domain: Option<&str>,
            require_global_catalog: bool,
        ) -> AppResult<DomainController> {
            let found = if require_global_catalog {
                self.gc.clone()
            } else {
                self.dc.clone().or_else(|| self.gc.clone())
            };
            found.ok_or_else(|| {
                AppError::NoDomainController(domain.unwrap_or("current domain").to_string())
            })
        }

        fn root_dse(&self, server: &str) -> AppResult<RootDse> {
            self.root
                .clone()
                .ok_or_else(|| AppError::DirectoryError(format!("{}: no root DSE", server)))
        }
    }
}
