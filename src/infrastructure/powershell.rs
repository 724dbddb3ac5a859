//! PowerShell-backed directory service
//!
//! Drives the GroupPolicy and ActiveDirectory PowerShell modules and decodes
//! their `ConvertTo-Json -Compress` output. Off a domain-joined Windows host
//! the invocations fail at runtime and surface as per-item directory errors.

use crate::domain::{GpoIdentity, GpoRef};
use crate::error::{AppError, AppResult};
use crate::infrastructure::directory::{
    link_filter, DirectoryService, DomainController, LinkHit, RootDse,
};
use std::process::Command;
use uuid::Uuid;

/// Directory service backed by the GroupPolicy/ActiveDirectory cmdlets
#[derive(Debug, Default)]
pub struct PsDirectory;

impl PsDirectory {
    pub fn new() -> Self {
        Self
    }
}

/// Escape a value for a single-quoted PowerShell string
fn ps_quote(s: &str) -> String {
    s.replace('\'', "''")
}

/// Run a script and return stdout
fn run_powershell(script: &str) -> AppResult<String> {
    let output = Command::new("powershell")
        .args(["-NoProfile", "-ExecutionPolicy", "Bypass", "-Command", script])
        .output()
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to execute PowerShell");
            AppError::DirectoryError(format!("Failed to execute PowerShell: {}", e))
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr);

    if !stderr.is_empty() {
        tracing::warn!(stderr = %stderr, "PowerShell stderr");
    }
    if !output.status.success() {
        let detail = if stderr.trim().is_empty() {
            stdout.trim().to_string()
        } else {
            stderr.trim().to_string()
        };
        return Err(AppError::DirectoryError(format!("PowerShell failed: {}", detail)));
    }

    Ok(stdout)
}

/// Optional `-Name 'value'` style argument fragment
fn opt_arg(flag: &str, value: Option<&str>) -> String {
    match value {
        Some(v) => format!(" {} '{}'", flag, ps_quote(v)),
        None => String::new(),
    }
}

impl DirectoryService for PsDirectory {
    fn resolve_gpo(
        &self,
        gpo: &GpoRef,
        domain: Option<&str>,
        server: Option<&str>,
    ) -> AppResult<GpoIdentity> {
        let selector = match gpo {
            GpoRef::Id(id) => format!("-Guid '{}'", id.hyphenated()),
            GpoRef::Name(name) => format!("-Name '{}'", ps_quote(name)),
        };

        let script = format!(
            r#"
            Import-Module GroupPolicy -ErrorAction Stop
            $gpo = Get-GPO {selector}{domain}{server} -ErrorAction Stop
            @{{
                id = $gpo.Id.ToString()
                displayName = $gpo.DisplayName
                domain = $gpo.DomainName
                path = $gpo.Path
            }} | ConvertTo-Json -Compress
            "#,
            selector = selector,
            domain = opt_arg("-Domain", domain),
            server = opt_arg("-Server", server),
        );

        tracing::debug!(gpo = %gpo, "Resolving GPO");
        let stdout = run_powershell(&script)
            .map_err(|e| AppError::GpoNotFound(format!("{}: {}", gpo, e)))?;

        let json: serde_json::Value = serde_json::from_str(stdout.trim())
            .map_err(|e| AppError::GpoNotFound(format!("{}: unreadable reply ({})", gpo, e)))?;

        let id_str = json["id"].as_str().unwrap_or_default();
        let id = Uuid::parse_str(id_str)
            .map_err(|_| AppError::GpoNotFound(format!("{}: bad id in reply", gpo)))?;

        Ok(GpoIdentity {
            id,
            display_name: json["displayName"].as_str().unwrap_or_default().to_string(),
            distinguished_name: json["path"].as_str().unwrap_or_default().to_string(),
            domain: json["domain"].as_str().unwrap_or_default().to_string(),
        })
    }

    fn read_version(&self, gpo: &GpoIdentity, server: Option<&str>) -> AppResult<u32> {
        let script = format!(
            r#"
            Import-Module ActiveDirectory -ErrorAction Stop
            $obj = Get-ADObject -Identity '{dn}' -Properties versionNumber{server} -ErrorAction Stop
            [int]$obj.versionNumber
            "#,
            dn = ps_quote(&gpo.distinguished_name),
            server = opt_arg("-Server", server),
        );

        let stdout = run_powershell(&script)?;
        stdout
            .trim()
            .parse::<u32>()
            .map_err(|_| AppError::DirectoryError(format!(
                "versionNumber on {} is not an integer: {}",
                gpo.distinguished_name,
                stdout.trim()
            )))
    }

    fn write_version(
        &self,
        gpo: &GpoIdentity,
        version: u32,
        server: Option<&str>,
    ) -> AppResult<()> {
        let script = format!(
            r#"
            Import-Module ActiveDirectory -ErrorAction Stop
            Set-ADObject -Identity '{dn}' -Replace @{{versionNumber={version}}}{server} -ErrorAction Stop
            "#,
            dn = ps_quote(&gpo.distinguished_name),
            version = version,
            server = opt_arg("-Server", server),
        );

        tracing::info!(
            dn = gpo.distinguished_name.as_str(),
            version = version,
            "Writing versionNumber"
        );
        run_powershell(&script)
            .map(|_| ())
            .map_err(|e| AppError::DirectoryWriteFailed(e.to_string()))
    }

    fn search_links(
        &self,
        server: &str,
        base_dn: &str,
        gpo_id: &Uuid,
    ) -> AppResult<Vec<LinkHit>> {
        let script = format!(
            r#"
            Import-Module ActiveDirectory -ErrorAction Stop
            $hits = @(Get-ADObject -LDAPFilter '{filter}' -SearchBase '{base}' -SearchScope Subtree -Server '{server}' -ErrorAction Stop |
                ForEach-Object {{ $_.DistinguishedName }})
            ConvertTo-Json -InputObject $hits -Compress
            "#,
            filter = ps_quote(&link_filter(gpo_id)),
            base = ps_quote(base_dn),
            server = ps_quote(server),
        );

        tracing::debug!(base_dn = base_dn, server = server, "Searching gPLink references");
        let stdout = run_powershell(&script)?;
        let dns: Vec<String> = serde_json::from_str(stdout.trim())?;

        Ok(dns
            .into_iter()
            .map(|dn| LinkHit { distinguished_name: dn })
            .collect())
    }

    fn discover_domain_controller(
        &self,
        domain: Option<&str>,
        require_global_catalog: bool,
    ) -> AppResult<DomainController> {
        let script = format!(
            r#"
            Import-Module ActiveDirectory -ErrorAction Stop
            $dc = Get-ADDomainController -Discover{domain}{gc} -ErrorAction Stop
            $name = $dc.HostName | Select-Object -First 1
            $full = Get-ADDomainController -Identity $name -Server $name -ErrorAction Stop
            @{{
                dnsName = $full.HostName
                domain = $full.Domain
                isGlobalCatalog = [bool]$full.IsGlobalCatalog
            }} | ConvertTo-Json -Compress
            "#,
            domain = opt_arg("-DomainName", domain),
            gc = if require_global_catalog { " -Service GlobalCatalog" } else { "" },
        );

        let target = domain.unwrap_or("current domain").to_string();
        tracing::debug!(domain = target.as_str(), gc = require_global_catalog, "Discovering DC");

        let stdout = run_powershell(&script)
            .map_err(|_| AppError::NoDomainController(target.clone()))?;
        let json: serde_json::Value = serde_json::from_str(stdout.trim())
            .map_err(|_| AppError::NoDomainController(target))?;

        Ok(DomainController {
            dns_name: json["dnsName"].as_str().unwrap_or_default().to_string(),
            domain: json["domain"].as_str().unwrap_or_default().to_string(),
            is_global_catalog: json["isGlobalCatalog"].as_bool().unwrap_or(false),
        })
    }

    fn root_dse(&self, server: &str) -> AppResult<RootDse> {
        let script = format!(
            r#"
            Import-Module ActiveDirectory -ErrorAction Stop
            $dse = Get-ADRootDSE -Server '{server}' -ErrorAction Stop
            @{{
                defaultNamingContext = $dse.defaultNamingContext
                configurationNamingContext = $dse.configurationNamingContext
                rootDomainNamingContext = $dse.rootDomainNamingContext
            }} | ConvertTo-Json -Compress
            "#,
            server = ps_quote(server),
        );

        let stdout = run_powershell(&script)?;
        let json: serde_json::Value = serde_json::from_str(stdout.trim())?;

        Ok(RootDse {
            default_naming_context: json["defaultNamingContext"]
                .as_str()
                .unwrap_or_default()
                .to_string(),
            configuration_naming_context: json["configurationNamingContext"]
                .as_str()
                .unwrap_or_default()
                .to_string(),
            root_domain_naming_context: json["rootDomainNamingContext"]
                .as_str()
                .unwrap_or_default()
                .to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ps_quote_doubles_single_quotes() {
        assert_eq!(ps_quote("O'Brien's GPO"), "O''Brien''s GPO");
        assert_eq!(ps_quote("plain"), "plain");
    }

    #[test]
    fn test_opt_arg() {
        assert_eq!(opt_arg("-Server", Some("dc01.contoso.com")), " -Server 'dc01.contoso.com'");
        assert_eq!(opt_arg("-Server", None), "");
    }
}
