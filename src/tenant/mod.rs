//! Per-request tenant resolution and access decisions.
//!
//! Organizations are addressed by subdomain, so the tenant a request
//! targets is a pure function of the hostname. From there the pipeline
//! resolves the caller's membership and reduces everything into an
//! immutable [`context::RequestContext`], which the [`decision`] module
//! maps onto one of a fixed set of dispositions (serve, or redirect).
//!
//! Flow Overview:
//! 1) `hostname::tenant_slug` — hostname to optional org slug, no I/O.
//! 2) `membership::resolve_membership` — org record plus the caller's
//!    role, via the [`store::TenantStore`] seam.
//! 3) `context::RequestContext::assemble` — pure reducer over the
//!    resolver outputs; enforces the context invariants.
//! 4) `decision::decide` — the access table, exhaustively matched.
//! 5) `middleware::tenant_gate` — glues the stages onto axum and turns
//!    redirect dispositions into 302 responses.

pub mod context;
pub mod decision;
pub mod hostname;
pub mod membership;
pub mod middleware;
pub mod postgres;
pub mod store;

/// Bounds applied to organization slugs at creation time. Subdomain labels
/// cap at 63 octets, which also bounds what `hostname` can ever resolve.
pub const ORG_SLUG_MIN: usize = 1;
pub const ORG_SLUG_MAX: usize = 63;
