//! # Orgspace (Multi-tenant Organization Workspaces)
//!
//! `orgspace` serves organization workspaces addressed by per-organization
//! subdomains. Users authenticate against an external identity provider;
//! this service resolves which tenant a request targets, who the caller is,
//! and what (if anything) they may see there.
//!
//! ## Request Pipeline
//!
//! Every request flows through the same stages, in order:
//!
//! 1. **Service initialization** — shared handles (database pool, identity
//!    provider client) are built lazily on the first request, exactly once,
//!    and are immutable afterwards.
//! 2. **Session resolution** — the identity provider is asked for the
//!    caller's session. Provider failures degrade to an anonymous caller
//!    rather than failing the request.
//! 3. **Tenant resolution** — the hostname is mapped to an organization
//!    slug (or none, for main-domain requests).
//! 4. **Membership resolution** — the organization and the caller's role
//!    within it are looked up together.
//! 5. **Access decision** — a pure function over the assembled request
//!    context yields the disposition: serve, or redirect.
//!
//! ## Tenant Model
//!
//! Organizations are the tenant boundary. Slugs are lowercase
//! `[a-z0-9-]+`, unique, and immutable after creation; they double as the
//! subdomain label (`acme.orgspace.dev`). Membership associates a user
//! with an organization under a role (`admin` or `member`), at most one
//! row per pair.

pub mod api;
pub mod cli;
pub mod services;
pub mod session;
pub mod tenant;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
