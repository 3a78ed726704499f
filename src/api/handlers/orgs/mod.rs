//! Organization endpoints.
//!
//! Creation is the one write in the system and follows the same shape as
//! the pipeline's reads: validate the slug the way the hostname resolver
//! will later parse it, pre-check availability for a friendly 409, and let
//! the storage-level unique constraint be the backstop for races. The
//! creator is enrolled as the organization's admin in the same operation.

pub mod organizations;
pub mod types;
