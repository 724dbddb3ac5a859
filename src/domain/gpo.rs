//! GPO identity and link types

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A GPO selector: by unique id or by display name, never both
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GpoRef {
    Id(Uuid),
    Name(String),
}

impl GpoRef {
    /// Parse an id selector, accepting the braced Microsoft form
    pub fn from_id_str(s: &str) -> Option<Self> {
        let trimmed = s.trim().trim_start_matches('{').trim_end_matches('}');
        Uuid::parse_str(trimmed).ok().map(GpoRef::Id)
    }
}

impl fmt::Display for GpoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpoRef::Id(id) => write!(f, "{}", braced_guid(id)),
            GpoRef::Name(name) => write!(f, "{}", name),
        }
    }
}

/// Format a GUID the way the directory stores it: braced, uppercase
pub fn braced_guid(id: &Uuid) -> String {
    format!("{{{}}}", id.hyphenated().to_string().to_uppercase())
}

/// A resolved GPO
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GpoIdentity {
    pub id: Uuid,
    pub display_name: String,
    /// DN of the groupPolicyContainer object
    pub distinguished_name: String,
    /// DNS name of the domain the GPO was resolved in
    pub domain: String,
}

impl GpoIdentity {
    /// SYSVOL folder name for this GPO
    pub fn folder_name(&self) -> String {
        braced_guid(&self.id)
    }
}

/// Where to look for containers linking a GPO
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LinkScope {
    /// A single container, given by DN
    Target(String),
    /// The whole target domain
    Domain,
    /// Every site in the forest's configuration partition
    AllSites,
    /// Every domain in the forest
    EntireForest,
}

impl LinkScope {
    /// True when the scope can cross domain naming contexts and therefore
    /// needs a global-catalog-capable server
    pub fn spans_forest(&self) -> bool {
        matches!(self, LinkScope::AllSites | LinkScope::EntireForest)
    }
}

impl fmt::Display for LinkScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkScope::Target(dn) => write!(f, "Target({})", dn),
            LinkScope::Domain => write!(f, "Domain"),
            LinkScope::AllSites => write!(f, "AllSites"),
            LinkScope::EntireForest => write!(f, "EntireForest"),
        }
    }
}

/// One container found linking a GPO
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GpoLink {
    pub gpo_id: Uuid,
    pub gpo_name: String,
    /// DN of the OU, domain, or site carrying the link
    pub container_dn: String,
}
