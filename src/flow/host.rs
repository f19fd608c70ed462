//! Tenant subdomain resolution from the console hostname.

use anyhow::{anyhow, Result};
use url::Url;

/// Extract the hostname from either a bare host or a full URL.
pub fn host_of(value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("empty console host"));
    }
    if trimmed.contains("://") {
        let url = Url::parse(trimmed)?;
        return url
            .host_str()
            .map(str::to_lowercase)
            .ok_or_else(|| anyhow!("console URL has no host"));
    }
    // Bare host, possibly with a port.
    let host = trimmed.split(':').next().unwrap_or(trimmed);
    if host.is_empty() {
        return Err(anyhow!("empty console host"));
    }
    Ok(host.to_lowercase())
}

/// Tenant slug encoded in `host` as a single label in front of the platform
/// base domain. `acme.backoffice.example.com` against
/// `backoffice.example.com` yields `acme`; the bare base domain and deeper
/// prefixes yield nothing.
#[must_use]
pub fn tenant_subdomain(host: &str, base_domain: &str) -> Option<String> {
    let host = host.trim().trim_end_matches('.').to_lowercase();
    let base = base_domain.trim().trim_end_matches('.').to_lowercase();
    if base.is_empty() || host == base {
        return None;
    }
    let label = host.strip_suffix(&format!(".{base}"))?;
    if label.is_empty() || label.contains('.') {
        return None;
    }
    Some(label.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn subdomain_is_extracted_from_console_host() {
        assert_eq!(
            tenant_subdomain("acme.backoffice.example.com", "backoffice.example.com"),
            Some("acme".to_string())
        );
    }

    #[test]
    fn bare_base_domain_has_no_subdomain() {
        assert_eq!(
            tenant_subdomain("backoffice.example.com", "backoffice.example.com"),
            None
        );
    }

    #[test]
    fn deeper_prefixes_are_not_tenant_slugs() {
        assert_eq!(
            tenant_subdomain("a.b.backoffice.example.com", "backoffice.example.com"),
            None
        );
    }

    #[test]
    fn unrelated_host_has_no_subdomain() {
        assert_eq!(
            tenant_subdomain("acme.othersite.com", "backoffice.example.com"),
            None
        );
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(
            tenant_subdomain("ACME.Backoffice.Example.COM", "backoffice.example.com"),
            Some("acme".to_string())
        );
    }

    #[test]
    fn host_of_accepts_urls_and_bare_hosts() {
        assert_eq!(
            host_of("https://acme.backoffice.example.com/login").unwrap(),
            "acme.backoffice.example.com"
        );
        assert_eq!(
            host_of("acme.backoffice.example.com:8443").unwrap(),
            "acme.backoffice.example.com"
        );
    }

    #[test]
    fn host_of_rejects_empty_input() {
        assert!(host_of("").is_err());
        assert!(host_of("   ").is_err());
    }
}
