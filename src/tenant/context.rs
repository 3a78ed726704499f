//! Per-request context, assembled once and never mutated.
//!
//! The context is a value built by a pure reducer over the resolver
//! outputs. Two invariants hold for every assembled context:
//!
//! - `org_error` is `Some` iff the request targeted a tenant subdomain and
//!   resolution did not produce a usable `(organization, role)` pair;
//! - `role` is `Some` iff both `user` and `organization` are `Some` and a
//!   membership row matched.

use crate::session::{AuthUser, Session, SessionContext};
use crate::tenant::store::{MemberRole, OrgRecord};

use super::membership::ResolvedOrg;

/// Why a tenant request cannot be served as-is.
///
/// `NotFound` is user-correctable (the slug is free to claim), `NoAccess`
/// is an authorization failure, and `Fault` is a storage or provider
/// problem that implies nothing about the tenant itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrgError {
    NotFound,
    NoAccess,
    Fault,
}

impl OrgError {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "ORG_NOT_FOUND",
            Self::NoAccess => "NO_ACCESS",
            Self::Fault => "ERROR",
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct RequestContext {
    pub session: Option<Session>,
    pub user: Option<AuthUser>,
    pub tenant_slug: Option<String>,
    pub organization: Option<OrgRecord>,
    pub role: Option<MemberRole>,
    pub org_error: Option<OrgError>,
}

impl RequestContext {
    /// Reduces the pipeline stages into one context value.
    ///
    /// `org` is `None` exactly when no tenant was targeted. A banned user
    /// is reduced to an anonymous caller before anything else: the
    /// provider refuses such sessions at sign-in, and a stale one must not
    /// reach tenant content here either.
    #[must_use]
    pub fn assemble(
        tenant_slug: Option<String>,
        auth: Option<SessionContext>,
        org: Option<Result<ResolvedOrg, OrgError>>,
    ) -> Self {
        let (session, user) = match auth {
            Some(context) if !context.user.banned => (Some(context.session), Some(context.user)),
            _ => (None, None),
        };

        let (organization, role, org_error) = match org {
            None => (None, None, None),
            Some(Ok(resolved)) => {
                // A membership row can only belong to the authenticated
                // caller; without one, a reported role is meaningless.
                let role = if user.is_some() { resolved.role } else { None };
                let org_error = if user.is_some() && role.is_none() {
                    Some(OrgError::NoAccess)
                } else {
                    None
                };
                (Some(resolved.organization), role, org_error)
            }
            Some(Err(err)) => (None, None, Some(err)),
        };

        Self {
            session,
            user,
            tenant_slug,
            organization,
            role,
            org_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::UserRole;
    use uuid::Uuid;

    fn auth(banned: bool) -> SessionContext {
        let user_id = Uuid::new_v4();
        SessionContext {
            session: Session {
                token: "tok".to_string(),
                user_id,
                expires_at: "2026-01-01T00:00:00Z".to_string(),
            },
            user: AuthUser {
                id: user_id,
                name: Some("Alice".to_string()),
                email: "alice@example.com".to_string(),
                role: UserRole::User,
                banned,
            },
        }
    }

    fn org() -> OrgRecord {
        OrgRecord {
            id: Uuid::new_v4(),
            slug: "acme".to_string(),
            name: "Acme".to_string(),
            created_at: "1970-01-01T00:00:00Z".to_string(),
        }
    }

    fn resolved(role: Option<MemberRole>) -> ResolvedOrg {
        ResolvedOrg {
            organization: org(),
            role,
        }
    }

    #[test]
    fn main_domain_request_has_no_org_state() {
        let context = RequestContext::assemble(None, Some(auth(false)), None);
        assert!(context.user.is_some());
        assert!(context.organization.is_none());
        assert!(context.role.is_none());
        assert!(context.org_error.is_none());
    }

    #[test]
    fn member_gets_role_and_no_error() {
        let context = RequestContext::assemble(
            Some("acme".to_string()),
            Some(auth(false)),
            Some(Ok(resolved(Some(MemberRole::Admin)))),
        );
        assert_eq!(context.role, Some(MemberRole::Admin));
        assert!(context.org_error.is_none());
        assert!(context.organization.is_some());
    }

    #[test]
    fn signed_in_non_member_is_no_access_with_org_retained() {
        let context = RequestContext::assemble(
            Some("acme".to_string()),
            Some(auth(false)),
            Some(Ok(resolved(None))),
        );
        assert_eq!(context.org_error, Some(OrgError::NoAccess));
        assert!(context.organization.is_some());
        assert!(context.role.is_none());
    }

    #[test]
    fn anonymous_visitor_to_live_tenant_is_not_an_error() {
        let context =
            RequestContext::assemble(Some("acme".to_string()), None, Some(Ok(resolved(None))));
        assert!(context.org_error.is_none());
        assert!(context.organization.is_some());
        assert!(context.user.is_none());
    }

    #[test]
    fn banned_user_is_reduced_to_anonymous() {
        let context = RequestContext::assemble(
            Some("acme".to_string()),
            Some(auth(true)),
            Some(Ok(resolved(None))),
        );
        assert!(context.user.is_none());
        assert!(context.session.is_none());
        assert!(context.org_error.is_none());
    }

    #[test]
    fn role_without_user_is_dropped() {
        let context = RequestContext::assemble(
            Some("acme".to_string()),
            None,
            Some(Ok(resolved(Some(MemberRole::Member)))),
        );
        assert!(context.role.is_none());
        assert!(context.org_error.is_none());
    }

    #[test]
    fn resolution_failures_propagate() {
        for err in [OrgError::NotFound, OrgError::Fault] {
            let context =
                RequestContext::assemble(Some("ghost".to_string()), None, Some(Err(err)));
            assert_eq!(context.org_error, Some(err));
            assert!(context.organization.is_none());
            assert!(context.role.is_none());
        }
    }

    #[test]
    fn invariants_hold_across_states() {
        let contexts = [
            RequestContext::assemble(None, None, None),
            RequestContext::assemble(
                Some("acme".to_string()),
                Some(auth(false)),
                Some(Ok(resolved(Some(MemberRole::Member)))),
            ),
            RequestContext::assemble(
                Some("acme".to_string()),
                Some(auth(false)),
                Some(Ok(resolved(None))),
            ),
            RequestContext::assemble(Some("acme".to_string()), None, Some(Ok(resolved(None)))),
            RequestContext::assemble(Some("ghost".to_string()), None, Some(Err(OrgError::NotFound))),
            RequestContext::assemble(Some("acme".to_string()), None, Some(Err(OrgError::Fault))),
        ];
        for context in contexts {
            let usable = context.organization.is_some()
                && (context.user.is_none() || context.role.is_some());
            assert_eq!(
                context.org_error.is_some(),
                context.tenant_slug.is_some() && !usable,
                "org_error must mark exactly the unusable tenant resolutions"
            );
            if context.role.is_some() {
                assert!(context.user.is_some() && context.organization.is_some());
            }
        }
    }
}
