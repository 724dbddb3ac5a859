//! GPO link enumeration
//!
//! Finds every container whose gPLink attribute references a GPO, within a
//! single container, a domain, all sites, or the whole forest. Resolution
//! failures (unknown GPO, no reachable domain controller) yield an empty
//! result with a warning rather than an error.

use crate::domain::{GpoLink, GpoRef, LinkScope};
use crate::error::AppResult;
use crate::infrastructure::DirectoryService;
use serde::Serialize;

/// One link query
#[derive(Debug, Clone)]
pub struct LinkQuery {
    pub gpo: GpoRef,
    pub scope: LinkScope,
    pub domain: Option<String>,
    pub server: Option<String>,
}

/// Query result with any resolution warnings
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkReport {
    pub links: Vec<GpoLink>,
    pub warnings: Vec<String>,
}

impl LinkReport {
    fn empty_with(warning: String) -> Self {
        Self {
            links: Vec::new(),
            warnings: vec![warning],
        }
    }
}

/// Enumerate the containers linking a GPO.
///
/// Server selection: the explicit server when given; otherwise a discovered
/// domain controller, upgraded to a global-catalog server (with a warning)
/// when the scope spans more than one naming context.
pub fn find_gpo_links(directory: &dyn DirectoryService, query: &LinkQuery) -> AppResult<LinkReport> {
    let mut warnings = Vec::new();

    let gpo = match directory.resolve_gpo(&query.gpo, query.domain.as_deref(), query.server.as_deref())
    {
        Ok(g) => g,
        Err(e) => {
            tracing::warn!(gpo = %query.gpo, error = %e, "GPO did not resolve, returning no links");
            return Ok(LinkReport::empty_with(format!("{}: {}", query.gpo, e)));
        }
    };

    let server = match &query.server {
        Some(s) => s.clone(),
        None => {
            let dc = match directory.discover_domain_controller(query.domain.as_deref(), false) {
                Ok(dc) => dc,
                Err(e) => {
                    tracing::warn!(error = %e, "No domain controller discovered, returning no links");
                    return Ok(LinkReport::empty_with(e.to_string()));
                }
            };

            if query.scope.spans_forest() && !dc.is_global_catalog {
                match directory.discover_domain_controller(query.domain.as_deref(), true) {
                    Ok(gc) => {
                        warnings.push(format!(
                            "{} is not a global catalog; using {} for {} scope",
                            dc.dns_name, gc.dns_name, query.scope
                        ));
                        gc.dns_name
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "No global catalog available for forest-wide scope");
                        return Ok(LinkReport::empty_with(format!(
                            "Scope {} needs a global catalog: {}",
                            query.scope, e
                        )));
                    }
                }
            } else {
                dc.dns_name
            }
        }
    };

    let base_dn = match &query.scope {
        LinkScope::Target(dn) => dn.clone(),
        LinkScope::Domain => directory.root_dse(&server)?.default_naming_context,
        LinkScope::AllSites => {
            format!("CN=Sites,{}", directory.root_dse(&server)?.configuration_naming_context)
        }
        LinkScope::EntireForest => directory.root_dse(&server)?.root_domain_naming_context,
    };

    tracing::info!(
        gpo = gpo.display_name.as_str(),
        scope = %query.scope,
        base_dn = base_dn.as_str(),
        server = server.as_str(),
        "Enumerating GPO links"
    );

    let hits = directory.search_links(&server, &base_dn, &gpo.id)?;
    let links = hits
        .into_iter()
        .map(|hit| GpoLink {
            gpo_id: gpo.id,
            gpo_name: gpo.display_name.clone(),
            container_dn: hit.distinguished_name,
        })
        .collect();

    Ok(LinkReport { links, warnings })
}

/// Result of running several link queries; one query's failure never stops
/// the rest
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkBatchReport {
    pub success: bool,
    pub reports: Vec<LinkReport>,
    pub errors: Vec<String>,
}

/// Run each query in turn, recording directory errors per item
pub fn find_gpo_links_batch(
    directory: &dyn DirectoryService,
    queries: &[LinkQuery],
) -> LinkBatchReport {
    let mut batch = LinkBatchReport {
        success: true,
        reports: Vec::new(),
        errors: Vec::new(),
    };

    for query in queries {
        match find_gpo_links(directory, query) {
            Ok(report) => batch.reports.push(report),
            Err(e) => {
                tracing::warn!(gpo = %query.gpo, error = %e, "Link query failed, continuing with the rest");
                batch.success = false;
                batch.errors.push(format!("{}: {}", query.gpo, e));
            }
        }
    }

    batch
}
