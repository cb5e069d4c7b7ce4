use crate::error::{ClientError, ClientResult};
use crate::models::Role;
use crate::session::Session;

/// Which dashboard an invocation shows. Fixed for the whole invocation; a
/// role switch needs a fresh login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardView {
    Candidate,
    Recruiter,
    Unauthenticated,
}

impl DashboardView {
    pub fn role(self) -> Option<Role> {
        match self {
            DashboardView::Candidate => Some(Role::Candidate),
            DashboardView::Recruiter => Some(Role::Recruiter),
            DashboardView::Unauthenticated => None,
        }
    }
}

/// An explicit role wins over the stored one.
pub fn resolve_role(explicit: Option<&str>, session: &Session) -> Option<Role> {
    let raw = explicit
        .filter(|r| !r.trim().is_empty())
        .or(session.role.as_deref())?;
    Role::parse(raw)
}

pub fn route(explicit: Option<&str>, session: &Session) -> DashboardView {
    if session.credential.is_none() {
        return DashboardView::Unauthenticated;
    }
    match resolve_role(explicit, session) {
        Some(Role::Candidate) => DashboardView::Candidate,
        Some(Role::Recruiter) => DashboardView::Recruiter,
        None => DashboardView::Unauthenticated,
    }
}

/// Guard for commands that only make sense in one of the two dashboards.
pub fn require(session: &Session, expected: Role) -> ClientResult<()> {
    match route(None, session).role() {
        None => Err(ClientError::Unauthenticated),
        Some(role) if role == expected => Ok(()),
        Some(role) => Err(ClientError::validation(format!(
            "This action is for {}s; you are logged in as a {}",
            expected, role
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(credential: Option<&str>, role: Option<&str>) -> Session {
        Session {
            credential: credential.map(String::from),
            role: role.map(String::from),
            email: Some("a@b.com".into()),
            last_resume_id: None,
        }
    }

    #[test]
    fn test_explicit_role_takes_precedence() {
        let s = session(Some("T"), Some("candidate"));
        assert_eq!(resolve_role(Some("Recruiter"), &s), Some(Role::Recruiter));
        assert_eq!(route(Some("recruiter"), &s), DashboardView::Recruiter);
    }

    #[test]
    fn test_falls_back_to_stored_role() {
        let s = session(Some("T"), Some("candidate"));
        assert_eq!(route(None, &s), DashboardView::Candidate);
        assert_eq!(route(Some(""), &s), DashboardView::Candidate);
    }

    #[test]
    fn test_no_credential_is_unauthenticated() {
        let s = session(None, None);
        assert_eq!(route(Some("candidate"), &s), DashboardView::Unauthenticated);
    }

    #[test]
    fn test_unknown_role_is_unauthenticated() {
        let s = session(Some("T"), Some("candidate"));
        assert_eq!(route(Some("admin"), &s), DashboardView::Unauthenticated);
        let s = session(Some("T"), Some("admin"));
        assert_eq!(route(None, &s), DashboardView::Unauthenticated);
    }

    #[test]
    fn test_require_checks_role() {
        let s = session(Some("T"), Some("candidate"));
        assert!(require(&s, Role::Candidate).is_ok());
        let err = require(&s, Role::Recruiter).unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));

        let err = require(&session(None, None), Role::Candidate).unwrap_err();
        assert!(matches!(err, ClientError::Unauthenticated));
    }
}
