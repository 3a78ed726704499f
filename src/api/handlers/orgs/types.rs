//! Request/response types for the orgs API.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::tenant::store::OrgRecord;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrgRequest {
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrgResponse {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub created_at: String,
}

impl From<&OrgRecord> for OrgResponse {
    fn from(record: &OrgRecord) -> Self {
        Self {
            id: record.id.to_string(),
            slug: record.slug.clone(),
            name: record.name.clone(),
            created_at: record.created_at.clone(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateOrgResponse {
    pub organization: OrgResponse,
    /// Subdomain dashboard to land on, shaped for the requesting host's
    /// environment (loopback, preview, or production).
    pub redirect_url: String,
}
