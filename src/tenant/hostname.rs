//! Hostname to tenant-slug resolution.
//!
//! The number of dot-separated labels that make up "just the base domain"
//! differs per environment: a bare loopback host, a multi-label preview
//! domain, and a two-label production domain. Each tier therefore has its
//! own threshold before the first label is taken as a tenant candidate.
//! Getting a threshold wrong either detects a phantom tenant on the bare
//! domain or misses a real one, so the tiers are checked in order and the
//! preview marker counts as a single logical segment.
//!
//! Resolution is pure and total: a hostname either yields a slug or it is
//! a main-domain request. It is never an error.

use url::Url;

const DEFAULT_LOOPBACK_MARKER: &str = "localhost";
const DEFAULT_PREVIEW_MARKER: &str = "workers.dev";

/// Domain configuration for tenant resolution and redirect targets.
///
/// Derived fields (`scheme`, `main_domain`) are computed once from the
/// public base URL so per-request resolution never re-parses it.
#[derive(Clone, Debug)]
pub struct TenantConfig {
    public_base_url: String,
    scheme: String,
    main_domain: String,
    loopback_marker: String,
    preview_marker: String,
}

impl TenantConfig {
    #[must_use]
    pub fn new(public_base_url: String) -> Self {
        let parsed = Url::parse(&public_base_url).ok();
        let scheme = parsed
            .as_ref()
            .map_or_else(|| "https".to_string(), |u| u.scheme().to_string());
        let main_domain = parsed
            .as_ref()
            .and_then(|u| u.host_str().map(ToString::to_string))
            .unwrap_or_else(|| "localhost".to_string());

        // Ensure the origin does not carry a trailing slash
        let public_base_url = public_base_url.trim_end_matches('/').to_string();

        Self {
            public_base_url,
            scheme,
            main_domain,
            loopback_marker: DEFAULT_LOOPBACK_MARKER.to_string(),
            preview_marker: DEFAULT_PREVIEW_MARKER.to_string(),
        }
    }

    #[must_use]
    pub fn with_loopback_marker(mut self, marker: String) -> Self {
        self.loopback_marker = marker;
        self
    }

    #[must_use]
    pub fn with_preview_marker(mut self, marker: String) -> Self {
        self.preview_marker = marker;
        self
    }

    /// Origin of the main domain (`scheme://host[:port]`, no trailing slash).
    #[must_use]
    pub fn main_origin(&self) -> &str {
        &self.public_base_url
    }

    /// Host component of the public base URL.
    #[must_use]
    pub fn main_domain(&self) -> &str {
        &self.main_domain
    }

    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Resolves the tenant slug addressed by `hostname`, if any.
    ///
    /// Evaluated in order: loopback hosts need the marker as their second
    /// label; preview hosts need at least four logical segments with the
    /// marker counted as one; production hosts need at least three labels.
    /// A candidate that is not a valid slug means "no tenant", not an
    /// error — the request targets the main domain.
    #[must_use]
    pub fn tenant_slug(&self, hostname: &str) -> Option<String> {
        // The Host header may carry a port (`acme.localhost:5173`).
        let host = hostname.split(':').next().unwrap_or(hostname);
        let labels: Vec<&str> = host.split('.').collect();

        if host.contains(&self.loopback_marker) {
            if labels.len() >= 2 && labels[1] == self.loopback_marker {
                return candidate(labels[0]);
            }
            return None;
        }

        if let Some(prefix) = host.strip_suffix(&format!(".{}", self.preview_marker)) {
            // The marker ("workers.dev") counts as one logical segment, so
            // `acme.myapp.workers.dev` has three and stays below threshold
            // while `acme.preview.myapp.workers.dev` resolves.
            let prefix_labels: Vec<&str> = prefix.split('.').collect();
            if prefix_labels.len() + 1 >= 4 {
                return candidate(prefix_labels[0]);
            }
            return None;
        }

        if labels.len() >= 3 {
            return candidate(labels[0]);
        }

        None
    }

    /// Builds the dashboard URL for `slug` as seen from `request_host`.
    ///
    /// Mirrors the resolution tiers: loopback keeps the request's port,
    /// preview nests under the preview base domain, production nests under
    /// the configured main domain.
    #[must_use]
    pub fn tenant_dashboard_url(&self, request_host: &str, slug: &str) -> String {
        let scheme = &self.scheme;
        let mut parts = request_host.splitn(2, ':');
        let host = parts.next().unwrap_or(request_host);
        let port = parts.next();

        if host.contains(&self.loopback_marker) {
            let port = port.map_or_else(String::new, |p| format!(":{p}"));
            return format!(
                "{scheme}://{slug}.{}{port}/dashboard",
                self.loopback_marker
            );
        }

        if host.ends_with(&self.preview_marker) {
            // Tenants prepend their slug to the preview base domain. When
            // the request already came from a tenant host, strip that label
            // first so slugs never stack.
            let base = if self.tenant_slug(host).is_some() {
                host.splitn(2, '.').nth(1).unwrap_or(host)
            } else {
                host
            };
            return format!("{scheme}://{slug}.{base}/dashboard");
        }

        format!("{scheme}://{slug}.{}/dashboard", self.main_domain)
    }
}

/// Returns `true` when `slug` is a well-formed tenant slug (`[a-z0-9-]+`).
/// Shared by hostname resolution and organization creation so a created
/// organization is always addressable as a subdomain.
#[must_use]
pub fn valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

fn candidate(label: &str) -> Option<String> {
    if valid_slug(label) {
        Some(label.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TenantConfig {
        TenantConfig::new("https://example.com".to_string())
    }

    #[test]
    fn loopback_with_tenant() {
        assert_eq!(
            config().tenant_slug("acme.localhost:5173"),
            Some("acme".to_string())
        );
    }

    #[test]
    fn loopback_without_tenant() {
        assert_eq!(config().tenant_slug("localhost:5173"), None);
        assert_eq!(config().tenant_slug("localhost"), None);
    }

    #[test]
    fn loopback_nested_label_is_not_a_tenant() {
        assert_eq!(config().tenant_slug("acme.dev.localhost"), None);
    }

    #[test]
    fn preview_below_threshold() {
        assert_eq!(config().tenant_slug("acme.myapp.workers.dev"), None);
        assert_eq!(config().tenant_slug("myapp.workers.dev"), None);
        assert_eq!(config().tenant_slug("workers.dev"), None);
    }

    #[test]
    fn preview_with_tenant() {
        assert_eq!(
            config().tenant_slug("acme.preview.myapp.workers.dev"),
            Some("acme".to_string())
        );
    }

    #[test]
    fn production_with_tenant() {
        assert_eq!(
            config().tenant_slug("acme.example.com"),
            Some("acme".to_string())
        );
    }

    #[test]
    fn production_bare_domain() {
        assert_eq!(config().tenant_slug("example.com"), None);
    }

    #[test]
    fn invalid_slug_characters_are_rejected() {
        assert_eq!(config().tenant_slug("My_Org!.example.com"), None);
        assert_eq!(config().tenant_slug("UPPER.example.com"), None);
    }

    #[test]
    fn resolution_is_deterministic() {
        let config = config();
        for _ in 0..3 {
            assert_eq!(
                config.tenant_slug("acme.example.com"),
                Some("acme".to_string())
            );
            assert_eq!(config.tenant_slug("example.com"), None);
        }
    }

    #[test]
    fn custom_markers() {
        let config = TenantConfig::new("https://example.com".to_string())
            .with_loopback_marker("lvh.me".to_string())
            .with_preview_marker("pages.dev".to_string());
        assert_eq!(config.tenant_slug("acme.lvh.me"), Some("acme".to_string()));
        assert_eq!(config.tenant_slug("acme.stage.myapp.pages.dev"), Some("acme".to_string()));
        assert_eq!(config.tenant_slug("acme.myapp.pages.dev"), None);
    }

    #[test]
    fn valid_slug_bounds() {
        assert!(valid_slug("acme"));
        assert!(valid_slug("acme-2"));
        assert!(!valid_slug(""));
        assert!(!valid_slug("Acme"));
        assert!(!valid_slug("acme!"));
        assert!(!valid_slug("acme.co"));
    }

    #[test]
    fn dashboard_url_loopback_keeps_port() {
        assert_eq!(
            config().tenant_dashboard_url("localhost:5173", "acme"),
            "https://acme.localhost:5173/dashboard"
        );
    }

    #[test]
    fn dashboard_url_preview_prepends_to_preview_base() {
        assert_eq!(
            config().tenant_dashboard_url("preview.myapp.workers.dev", "acme"),
            "https://acme.preview.myapp.workers.dev/dashboard"
        );
    }

    #[test]
    fn dashboard_url_preview_from_tenant_host_does_not_stack_slugs() {
        assert_eq!(
            config().tenant_dashboard_url("other.preview.myapp.workers.dev", "acme"),
            "https://acme.preview.myapp.workers.dev/dashboard"
        );
    }

    #[test]
    fn dashboard_url_production_uses_main_domain() {
        assert_eq!(
            config().tenant_dashboard_url("example.com", "acme"),
            "https://acme.example.com/dashboard"
        );
    }

    #[test]
    fn main_origin_trims_trailing_slash() {
        let config = TenantConfig::new("https://example.com/".to_string());
        assert_eq!(config.main_origin(), "https://example.com");
        assert_eq!(config.main_domain(), "example.com");
        assert_eq!(config.scheme(), "https");
    }
}
