//! Postgres-backed [`TenantStore`].
//!
//! SQL stays inline and scoped the way the handlers need it: the pipeline
//! lookup joins the caller's membership in the same round trip, and
//! organization creation runs as a transaction so the creator's admin
//! membership cannot be lost between statements.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::warn;
use uuid::Uuid;

use super::store::{
    CreateOrgError, MemberRole, OrgMembershipRow, OrgRecord, StoreError, TenantStore,
};

#[derive(Clone, Debug)]
pub struct PgTenantStore {
    pool: PgPool,
}

impl PgTenantStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl TenantStore for PgTenantStore {
    async fn org_by_slug(
        &self,
        slug: &str,
        user_id: Option<Uuid>,
    ) -> Result<Option<OrgMembershipRow>, StoreError> {
        let query = r#"
            SELECT
                o.id,
                o.slug,
                o.name,
                to_char(o.created_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS created_at,
                m.role
            FROM organizations o
            LEFT JOIN memberships m ON m.org_id = o.id AND m.user_id = $2
            WHERE o.slug = $1
            LIMIT 1
        "#;
        let row = sqlx::query(query)
            .bind(slug)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::Database)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let role = row
            .get::<Option<String>, _>("role")
            .and_then(|value| match MemberRole::parse(&value) {
                Some(role) => Some(role),
                None => {
                    warn!(slug, role = %value, "ignoring membership with unknown role");
                    None
                }
            });

        Ok(Some(OrgMembershipRow {
            organization: OrgRecord {
                id: row.get("id"),
                slug: row.get("slug"),
                name: row.get("name"),
                created_at: row.get("created_at"),
            },
            role,
        }))
    }

    async fn slug_taken(&self, slug: &str) -> Result<bool, StoreError> {
        let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM organizations WHERE slug = $1) AS taken")
            .bind(slug)
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::Database)?;
        Ok(row.get("taken"))
    }

    async fn create_org(
        &self,
        name: &str,
        slug: &str,
        creator: Uuid,
    ) -> Result<OrgRecord, CreateOrgError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|err| CreateOrgError::Store(err.into()))?;

        let insert = sqlx::query(
            r#"
            INSERT INTO organizations (slug, name)
            VALUES ($1, $2)
            RETURNING id, slug, name,
                to_char(created_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS created_at
            "#,
        )
        .bind(slug)
        .bind(name)
        .fetch_one(&mut *tx)
        .await;

        let row = match insert {
            Ok(row) => row,
            Err(err) => {
                if is_unique_violation(&err) {
                    let _ = tx.rollback().await;
                    return Err(CreateOrgError::SlugTaken);
                }
                return Err(CreateOrgError::Store(err.into()));
            }
        };

        let org_id: Uuid = row.get("id");
        sqlx::query(
            r"
            INSERT INTO memberships (org_id, user_id, role)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(org_id)
        .bind(creator)
        .bind(MemberRole::Admin.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|err| CreateOrgError::Store(err.into()))?;

        tx.commit()
            .await
            .map_err(|err| CreateOrgError::Store(err.into()))?;

        Ok(OrgRecord {
            id: org_id,
            slug: row.get("slug"),
            name: row.get("name"),
            created_at: row.get("created_at"),
        })
    }

    async fn orgs_for_user(&self, user_id: Uuid) -> Result<Vec<OrgRecord>, StoreError> {
        let query = r#"
            SELECT
                o.id,
                o.slug,
                o.name,
                to_char(o.created_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS created_at
            FROM organizations o
            JOIN memberships m ON m.org_id = o.id
            WHERE m.user_id = $1
            ORDER BY o.created_at DESC
        "#;
        let rows = sqlx::query(query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::Database)?;
        Ok(rows
            .into_iter()
            .map(|row| OrgRecord {
                id: row.get("id"),
                slug: row.get("slug"),
                name: row.get("name"),
                created_at: row.get("created_at"),
            })
            .collect())
    }
}

/// Returns `true` when `err` is a database unique-violation (SQLSTATE `23505`).
fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("23505"),
        _ => false,
    }
}
