//! Directory service boundary
//!
//! Everything that touches a live domain goes through [`DirectoryService`],
//! so the version transaction and the link-scope logic can be exercised
//! against a mock. The shipped implementation is
//! [`super::powershell::PsDirectory`].

use crate::domain::{braced_guid, GpoIdentity, GpoRef};
use crate::error::AppResult;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A discovered domain controller
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainController {
    pub dns_name: String,
    pub domain: String,
    pub is_global_catalog: bool,
}

/// Naming contexts read from a server's root DSE
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootDse {
    pub default_naming_context: String,
    pub configuration_naming_context: String,
    pub root_domain_naming_context: String,
}

/// One row from a gPLink search
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkHit {
    pub distinguished_name: String,
}

/// Narrow interface over the directory service.
///
/// `domain` is a DNS domain name; `server` an optional explicit directory
/// server. Implementations resolve their own server when none is given.
pub trait DirectoryService {
    /// Resolve a GPO by id or display name within a domain
    fn resolve_gpo(
        &self,
        gpo: &GpoRef,
        domain: Option<&str>,
        server: Option<&str>,
    ) -> AppResult<GpoIdentity>;

    /// Read the raw versionNumber attribute from a GPO's directory record
    fn read_version(&self, gpo: &GpoIdentity, server: Option<&str>) -> AppResult<u32>;

    /// Replace the versionNumber attribute on a GPO's directory record
    fn write_version(&self, gpo: &GpoIdentity, version: u32, server: Option<&str>)
        -> AppResult<()>;

    /// Find containers under `base_dn` whose gPLink references `gpo_id`
    fn search_links(&self, server: &str, base_dn: &str, gpo_id: &Uuid)
        -> AppResult<Vec<LinkHit>>;

    /// Discover a domain controller for a domain, optionally requiring
    /// global-catalog capability
    fn discover_domain_controller(
        &self,
        domain: Option<&str>,
        require_global_catalog: bool,
    ) -> AppResult<DomainController>;

    /// Read the naming contexts published by a server
    fn root_dse(&self, server: &str) -> AppResult<RootDse>;
}

/// Build the LDAP filter matching containers that link a GPO.
///
/// gPLink is a single string of `[LDAP://cn={GUID},...;flags]` fragments, so
/// a substring match on the braced GUID finds every linking container. Only
/// OUs, domain heads, and sites can carry the attribute.
pub fn link_filter(gpo_id: &Uuid) -> String {
    format!(
        "(&(|(objectClass=organizationalUnit)(objectClass=domainDNS)(objectClass=site))(gPLink=*{}*))",
        braced_guid(gpo_id)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_filter_uses_braced_guid() {
        let id = Uuid::parse_str("31b2f340-016d-11d2-945f-00c04fb984f9").unwrap();
        let filter = link_filter(&id);
        assert!(filter.contains("gPLink=*{31B2F340-016D-11D2-945F-00C04FB984F9}*"));
        assert!(filter.contains("objectClass=organizationalUnit"));
        assert!(filter.contains("objectClass=site"));
    }
}
