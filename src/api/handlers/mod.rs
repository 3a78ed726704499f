//! API handlers for orgspace.
//!
//! Handlers read the [`RequestContext`](crate::tenant::context::RequestContext)
//! the tenant gate attached; by the time one runs, the access decision has
//! already been made. Rendering is not this service's job — page surfaces
//! return the JSON their shells hydrate from.

pub mod auth_proxy;
pub mod health;
pub mod orgs;
pub mod pages;
pub mod protected;
