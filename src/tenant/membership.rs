//! Organization and membership resolution for one request.

use tracing::error;
use uuid::Uuid;

use super::context::OrgError;
use super::store::{MemberRole, OrgRecord, TenantStore};

/// Outcome of a successful organization lookup. `role` is `None` for
/// anonymous visitors and for signed-in callers without a membership; the
/// context reducer decides which of those is an access failure.
#[derive(Clone, Debug)]
pub struct ResolvedOrg {
    pub organization: OrgRecord,
    pub role: Option<MemberRole>,
}

/// Resolves the organization behind `slug` and the caller's role in it.
///
/// A missing organization is [`OrgError::NotFound`]; a storage failure is
/// always [`OrgError::Fault`], kept distinct so "tenant does not exist"
/// never gets conflated with "could not determine". Resolution never
/// produces `NoAccess` — that judgment belongs to the caller, which knows
/// whether anyone is signed in.
pub async fn resolve_membership(
    store: &dyn TenantStore,
    slug: &str,
    user_id: Option<Uuid>,
) -> Result<ResolvedOrg, OrgError> {
    match store.org_by_slug(slug, user_id).await {
        Ok(Some(row)) => Ok(ResolvedOrg {
            organization: row.organization,
            role: row.role,
        }),
        Ok(None) => Err(OrgError::NotFound),
        Err(err) => {
            error!("Failed to resolve organization {slug}: {err}");
            Err(OrgError::Fault)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tenant::store::MemoryTenantStore;

    #[tokio::test]
    async fn member_resolves_with_role() {
        let store = MemoryTenantStore::new();
        let org = store.seed_org("acme", "Acme").await;
        let user_id = Uuid::new_v4();
        store
            .seed_membership(org.id, user_id, MemberRole::Member)
            .await;

        let resolved = resolve_membership(&store, "acme", Some(user_id))
            .await
            .unwrap();
        assert_eq!(resolved.organization.slug, "acme");
        assert_eq!(resolved.role, Some(MemberRole::Member));
    }

    #[tokio::test]
    async fn unknown_slug_is_not_found() {
        let store = MemoryTenantStore::new();
        let err = resolve_membership(&store, "ghost", None).await.unwrap_err();
        assert_eq!(err, OrgError::NotFound);
    }

    #[tokio::test]
    async fn storage_failure_is_a_fault_not_not_found() {
        let store = MemoryTenantStore::new();
        store.seed_org("acme", "Acme").await;
        store.set_failing(true);
        let err = resolve_membership(&store, "acme", None).await.unwrap_err();
        assert_eq!(err, OrgError::Fault);
    }

    #[tokio::test]
    async fn non_member_resolves_without_role() {
        let store = MemoryTenantStore::new();
        store.seed_org("acme", "Acme").await;
        let resolved = resolve_membership(&store, "acme", Some(Uuid::new_v4()))
            .await
            .unwrap();
        assert_eq!(resolved.role, None);
    }
}
