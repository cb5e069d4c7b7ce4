use tracing::info;

use crate::api::{ApiClient, HttpBackend};
use crate::error::{ClientError, ClientResult};
use crate::models::ApplicationStatus;
use crate::session::SessionContext;
use crate::view::Notice;

/// The three decisions a recruiter can take on an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusAction {
    Shortlist,
    Interview,
    Reject,
}

impl StatusAction {
    pub const ALL: [StatusAction; 3] =
        [StatusAction::Shortlist, StatusAction::Interview, StatusAction::Reject];

    pub fn target(self) -> ApplicationStatus {
        match self {
            StatusAction::Shortlist => ApplicationStatus::Shortlisted,
            StatusAction::Interview => ApplicationStatus::Interview,
            StatusAction::Reject => ApplicationStatus::Rejected,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StatusAction::Shortlist => "Shortlist",
            StatusAction::Interview => "Interview",
            StatusAction::Reject => "Reject",
        }
    }

    /// Accepts the verb or the resulting status, case-insensitive.
    pub fn parse(value: &str) -> ClientResult<Self> {
        match value.trim().to_lowercase().as_str() {
            "shortlist" | "shortlisted" => Ok(StatusAction::Shortlist),
            "interview" => Ok(StatusAction::Interview),
            "reject" | "rejected" => Ok(StatusAction::Reject),
            other => Err(ClientError::validation(format!(
                "Invalid status '{}'. Must be one of: shortlisted, interview, rejected",
                other
            ))),
        }
    }
}

/// Transition rules, enforced before anything is sent:
///
/// - only recruiter decisions are targets; `applied` is set once, by the
///   server, when the application is created
/// - re-sending the current status is refused
/// - otherwise any decision may follow any other, rejected included, so a
///   recruiter can undo a mistaken rejection
pub fn check_transition(
    current: Option<&ApplicationStatus>,
    next: &ApplicationStatus,
) -> ClientResult<()> {
    let is_decision = matches!(
        next,
        ApplicationStatus::Shortlisted | ApplicationStatus::Interview | ApplicationStatus::Rejected
    );
    if !is_decision {
        return Err(ClientError::validation(format!(
            "Cannot move an application to '{}'. Must be one of: shortlisted, interview, rejected",
            next
        )));
    }
    if current == Some(next) {
        return Err(ClientError::validation(format!("Application is already {}", next)));
    }
    Ok(())
}

/// Sets the status directly. Callers close their applicant detail view on
/// success; the applicant list is not reloaded and stays stale until it is
/// opened again.
pub async fn update_status<B: HttpBackend>(
    client: &ApiClient<B>,
    session: &SessionContext,
    application_id: i64,
    current: Option<&ApplicationStatus>,
    action: StatusAction,
) -> ClientResult<Notice> {
    let next = action.target();
    check_transition(current, &next)?;

    client.update_application(session, application_id, &next).await?;
    info!(application_id, status = %next, "application status updated");
    Ok(Notice::success(format!("Status updated to {}", next)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{BASE_URL, ScriptedBackend, logged_in};
    use reqwest::Method;
    use serde_json::json;

    #[test]
    fn test_parse_accepts_verbs_and_states() {
        assert_eq!(StatusAction::parse("Shortlist").unwrap(), StatusAction::Shortlist);
        assert_eq!(StatusAction::parse("shortlisted").unwrap(), StatusAction::Shortlist);
        assert_eq!(StatusAction::parse("REJECTED").unwrap(), StatusAction::Reject);
        assert!(StatusAction::parse("applied").is_err());
        assert!(StatusAction::parse("hired").is_err());
    }

    #[test]
    fn test_applied_is_never_a_target() {
        let err = check_transition(Some(&ApplicationStatus::Interview), &ApplicationStatus::Applied)
            .unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
    }

    #[test]
    fn test_same_status_is_refused() {
        let err = check_transition(Some(&ApplicationStatus::Rejected), &ApplicationStatus::Rejected)
            .unwrap_err();
        assert_eq!(err.to_string(), "Application is already rejected");
    }

    #[test]
    fn test_any_decision_can_follow_any_other() {
        let states = [
            ApplicationStatus::Applied,
            ApplicationStatus::Shortlisted,
            ApplicationStatus::Interview,
            ApplicationStatus::Rejected,
        ];
        for current in &states {
            for action in StatusAction::ALL {
                let next = action.target();
                if *current != next {
                    assert!(check_transition(Some(current), &next).is_ok(), "{current} -> {next}");
                }
            }
        }
        assert!(check_transition(None, &ApplicationStatus::Shortlisted).is_ok());
    }

    #[tokio::test]
    async fn test_update_status_patches_once() {
        let dir = tempfile::tempdir().unwrap();
        let session = logged_in(&dir, "T", "recruiter");
        let backend = ScriptedBackend::new().on(
            Method::PATCH,
            "/applications/7",
            200,
            json!({"id": 7, "status": "interview"}),
        );
        let client = ApiClient::new(backend, BASE_URL);

        let current = ApplicationStatus::Applied;
        let notice = update_status(&client, &session, 7, Some(&current), StatusAction::Interview)
            .await
            .unwrap();

        assert_eq!(notice, Notice::success("Status updated to interview"));
        let requests = client.backend().requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].body, Some(json!({"status": "interview"})));
    }

    #[tokio::test]
    async fn test_refused_transition_sends_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let session = logged_in(&dir, "T", "recruiter");
        let client = ApiClient::new(ScriptedBackend::new(), BASE_URL);

        let current = ApplicationStatus::Shortlisted;
        let result =
            update_status(&client, &session, 7, Some(&current), StatusAction::Shortlist).await;
        assert!(result.is_err());
        assert!(client.backend().requests().is_empty());
    }
}
