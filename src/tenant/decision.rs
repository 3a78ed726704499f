//! The access decision: a pure function from request context to
//! disposition.
//!
//! This is the terminal structure of the pipeline. "No tenant" and "serve
//! the tenant dashboard" are the only dispositions that render content;
//! every other combination ends in a redirect. Keeping the function free
//! of I/O keeps the whole table independently testable.

use super::context::{OrgError, RequestContext};
use super::store::MemberRole;

/// What the routing layer should do with the request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Disposition {
    /// Main-domain request; serve the landing surface.
    ServeMain,
    /// Tenant request by a member; serve the dashboard with their role.
    ServeTenant { role: MemberRole },
    /// The slug has no organization; send the visitor to claim it.
    RedirectToOrgCreation { suggested: String },
    /// The tenant exists but the caller may not see it (or is anonymous).
    RedirectToLogin,
    /// Resolution faulted; fall back to the main domain.
    RedirectToMain,
}

/// Decides the disposition for an assembled [`RequestContext`].
///
/// | tenant | user | role | org_error  | disposition            |
/// |--------|------|------|------------|------------------------|
/// | no     | —    | —    | —          | `ServeMain`            |
/// | yes    | no   | —    | `NotFound` | `RedirectToOrgCreation`|
/// | yes    | no   | —    | none       | `RedirectToLogin`      |
/// | yes    | yes  | no   | `NoAccess` | `RedirectToLogin`      |
/// | yes    | yes  | yes  | none       | `ServeTenant`          |
/// | any    | any  | any  | `Fault`    | `RedirectToMain`       |
#[must_use]
pub fn decide(context: &RequestContext) -> Disposition {
    if context.org_error == Some(OrgError::Fault) {
        return Disposition::RedirectToMain;
    }

    let Some(slug) = context.tenant_slug.as_deref() else {
        return Disposition::ServeMain;
    };

    if context.org_error == Some(OrgError::NotFound) {
        return Disposition::RedirectToOrgCreation {
            suggested: slug.to_string(),
        };
    }

    match (&context.user, context.role) {
        (Some(_), Some(role)) if context.org_error.is_none() => Disposition::ServeTenant { role },
        // NoAccess, an anonymous visitor to a live tenant, and the
        // role-less success the reducer never emits all gate on login.
        _ => Disposition::RedirectToLogin,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{AuthUser, UserRole};
    use crate::tenant::store::OrgRecord;
    use uuid::Uuid;

    fn context(
        tenant: bool,
        user: bool,
        role: Option<MemberRole>,
        org_error: Option<OrgError>,
    ) -> RequestContext {
        RequestContext {
            session: None,
            user: user.then(|| AuthUser {
                id: Uuid::new_v4(),
                name: None,
                email: "user@example.com".to_string(),
                role: UserRole::User,
                banned: false,
            }),
            tenant_slug: tenant.then(|| "acme".to_string()),
            organization: (tenant
                && matches!(org_error, None | Some(OrgError::NoAccess)))
            .then(|| OrgRecord {
                id: Uuid::new_v4(),
                slug: "acme".to_string(),
                name: "Acme".to_string(),
                created_at: "1970-01-01T00:00:00Z".to_string(),
            }),
            role,
            org_error,
        }
    }

    #[test]
    fn no_tenant_serves_main() {
        assert_eq!(decide(&context(false, false, None, None)), Disposition::ServeMain);
        assert_eq!(decide(&context(false, true, None, None)), Disposition::ServeMain);
    }

    #[test]
    fn missing_org_redirects_to_creation_with_suggested_slug() {
        assert_eq!(
            decide(&context(true, false, None, Some(OrgError::NotFound))),
            Disposition::RedirectToOrgCreation {
                suggested: "acme".to_string()
            }
        );
    }

    #[test]
    fn anonymous_visitor_to_live_tenant_redirects_to_login() {
        assert_eq!(
            decide(&context(true, false, None, None)),
            Disposition::RedirectToLogin
        );
    }

    #[test]
    fn non_member_redirects_to_login() {
        assert_eq!(
            decide(&context(true, true, None, Some(OrgError::NoAccess))),
            Disposition::RedirectToLogin
        );
    }

    #[test]
    fn member_is_served_with_role() {
        assert_eq!(
            decide(&context(true, true, Some(MemberRole::Admin), None)),
            Disposition::ServeTenant {
                role: MemberRole::Admin
            }
        );
    }

    #[test]
    fn fault_always_redirects_to_main() {
        for user in [false, true] {
            assert_eq!(
                decide(&context(true, user, None, Some(OrgError::Fault))),
                Disposition::RedirectToMain
            );
        }
    }

    /// Pins the full decision table over every input combination reachable
    /// under the context invariant (`role` implies tenant and user).
    #[test]
    fn decision_table_is_total_over_reachable_states() {
        let errors = [
            None,
            Some(OrgError::NotFound),
            Some(OrgError::NoAccess),
            Some(OrgError::Fault),
        ];
        for tenant in [false, true] {
            for user in [false, true] {
                for role in [None, Some(MemberRole::Member)] {
                    for org_error in errors {
                        if role.is_some() && !(tenant && user) {
                            continue;
                        }
                        let disposition = decide(&context(tenant, user, role, org_error));
                        let expected = if org_error == Some(OrgError::Fault) {
                            Disposition::RedirectToMain
                        } else if !tenant {
                            Disposition::ServeMain
                        } else if org_error == Some(OrgError::NotFound) {
                            Disposition::RedirectToOrgCreation {
                                suggested: "acme".to_string(),
                            }
                        } else if user && role.is_some() && org_error.is_none() {
                            Disposition::ServeTenant {
                                role: MemberRole::Member,
                            }
                        } else {
                            Disposition::RedirectToLogin
                        };
                        assert_eq!(
                            disposition, expected,
                            "tenant={tenant} user={user} role={role:?} org_error={org_error:?}"
                        );
                    }
                }
            }
        }
    }
}
