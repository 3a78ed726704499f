//! Storage seam for organizations and memberships.
//!
//! The pipeline only ever reads; the single write path is organization
//! creation. Keeping the surface behind a trait lets the handler tests run
//! against the in-memory table while production wires up Postgres.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Role a member holds within one organization.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Admin,
    Member,
}

impl MemberRole {
    /// Canonical string stored in the `memberships.role` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Member => "member",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "admin" => Some(Self::Admin),
            "member" => Some(Self::Member),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct OrgRecord {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub created_at: String,
}

/// Organization joined with the caller's membership row, when one exists.
#[derive(Clone, Debug)]
pub struct OrgMembershipRow {
    pub organization: OrgRecord,
    pub role: Option<MemberRole>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("storage unavailable: {0}")]
    Unavailable(&'static str),
}

#[derive(Debug, Error)]
pub enum CreateOrgError {
    #[error("organization slug is already taken")]
    SlugTaken,
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[async_trait]
pub trait TenantStore: Send + Sync {
    /// Fetches the organization by slug together with the membership row
    /// for `user_id` in one lookup. `Ok(None)` means the slug has no
    /// organization; an absent role for an existing caller means no
    /// membership, which is an access question, not a storage one.
    async fn org_by_slug(
        &self,
        slug: &str,
        user_id: Option<Uuid>,
    ) -> Result<Option<OrgMembershipRow>, StoreError>;

    async fn slug_taken(&self, slug: &str) -> Result<bool, StoreError>;

    /// Creates an organization and enrolls `creator` as its admin, as one
    /// atomic operation. Slug uniqueness maps to [`CreateOrgError::SlugTaken`].
    async fn create_org(
        &self,
        name: &str,
        slug: &str,
        creator: Uuid,
    ) -> Result<OrgRecord, CreateOrgError>;

    /// Organizations the user is a member of, newest first.
    async fn orgs_for_user(&self, user_id: Uuid) -> Result<Vec<OrgRecord>, StoreError>;
}

// Timestamps come from the database in production; the in-memory store is
// a fixture and pins them instead.
const FIXTURE_TIMESTAMP: &str = "1970-01-01T00:00:00Z";

/// In-memory [`TenantStore`] used by tests and provider-less development.
#[derive(Debug, Default)]
pub struct MemoryTenantStore {
    orgs: RwLock<Vec<OrgRecord>>,
    memberships: RwLock<Vec<(Uuid, Uuid, MemberRole)>>,
    failing: AtomicBool,
}

impl MemoryTenantStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an organization and returns its record.
    pub async fn seed_org(&self, slug: &str, name: &str) -> OrgRecord {
        let record = OrgRecord {
            id: Uuid::new_v4(),
            slug: slug.to_string(),
            name: name.to_string(),
            created_at: FIXTURE_TIMESTAMP.to_string(),
        };
        self.orgs.write().await.push(record.clone());
        record
    }

    /// Seeds a membership for an already-seeded organization.
    pub async fn seed_membership(&self, org_id: Uuid, user_id: Uuid, role: MemberRole) {
        self.memberships.write().await.push((org_id, user_id, role));
    }

    /// Makes every operation fail, to exercise the fault path.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("tenant store offline"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl TenantStore for MemoryTenantStore {
    async fn org_by_slug(
        &self,
        slug: &str,
        user_id: Option<Uuid>,
    ) -> Result<Option<OrgMembershipRow>, StoreError> {
        self.check_available()?;
        let Some(organization) = self
            .orgs
            .read()
            .await
            .iter()
            .find(|org| org.slug == slug)
            .cloned()
        else {
            return Ok(None);
        };
        let role = match user_id {
            Some(user_id) => self
                .memberships
                .read()
                .await
                .iter()
                .find(|(org_id, member, _)| *org_id == organization.id && *member == user_id)
                .map(|(_, _, role)| *role),
            None => None,
        };
        Ok(Some(OrgMembershipRow { organization, role }))
    }

    async fn slug_taken(&self, slug: &str) -> Result<bool, StoreError> {
        self.check_available()?;
        Ok(self.orgs.read().await.iter().any(|org| org.slug == slug))
    }

    async fn create_org(
        &self,
        name: &str,
        slug: &str,
        creator: Uuid,
    ) -> Result<OrgRecord, CreateOrgError> {
        self.check_available().map_err(CreateOrgError::Store)?;
        let mut orgs = self.orgs.write().await;
        if orgs.iter().any(|org| org.slug == slug) {
            return Err(CreateOrgError::SlugTaken);
        }
        let record = OrgRecord {
            id: Uuid::new_v4(),
            slug: slug.to_string(),
            name: name.to_string(),
            created_at: FIXTURE_TIMESTAMP.to_string(),
        };
        orgs.push(record.clone());
        self.memberships
            .write()
            .await
            .push((record.id, creator, MemberRole::Admin));
        Ok(record)
    }

    async fn orgs_for_user(&self, user_id: Uuid) -> Result<Vec<OrgRecord>, StoreError> {
        self.check_available()?;
        let memberships = self.memberships.read().await;
        let org_ids: Vec<Uuid> = memberships
            .iter()
            .filter(|(_, member, _)| *member == user_id)
            .map(|(org_id, _, _)| *org_id)
            .collect();
        drop(memberships);
        Ok(self
            .orgs
            .read()
            .await
            .iter()
            .filter(|org| org_ids.contains(&org.id))
            .cloned()
            .collect())
    }
}
