use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Candidate,
    Recruiter,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Candidate => "candidate",
            Role::Recruiter => "recruiter",
        }
    }

    /// Case-insensitive; anything but the two known roles is `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "candidate" => Some(Role::Candidate),
            "recruiter" => Some(Role::Recruiter),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application lifecycle. The server creates applications as "pending",
/// which is the same state as `Applied`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplicationStatus {
    Applied,
    Shortlisted,
    Interview,
    Rejected,
    Other(String),
}

impl ApplicationStatus {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "applied" | "pending" => Self::Applied,
            "shortlisted" => Self::Shortlisted,
            "interview" => Self::Interview,
            "rejected" => Self::Rejected,
            _ => Self::Other(value.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Applied => "applied",
            Self::Shortlisted => "shortlisted",
            Self::Interview => "interview",
            Self::Rejected => "rejected",
            Self::Other(raw) => raw,
        }
    }

    /// "shortlisted" -> "Shortlisted"
    pub fn label(&self) -> String {
        let raw = self.as_str();
        let mut chars = raw.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ApplicationStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ApplicationStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.map_or(Self::Other(String::new()), |s| Self::parse(&s)))
    }
}

/// Missing skills, normalized on receipt. The server sends either a
/// comma-delimited string or a JSON array depending on the endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkillList(Vec<String>);

impl SkillList {
    pub fn from_delimited(raw: &str) -> Self {
        Self::from_items(raw.split(','))
    }

    pub fn from_items<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            items
                .into_iter()
                .map(|s| s.as_ref().trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<'de> Deserialize<'de> for SkillList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Text(String),
            List(Vec<String>),
            Null(()),
        }

        Ok(match Wire::deserialize(deserializer)? {
            Wire::Text(raw) => SkillList::from_delimited(&raw),
            Wire::List(items) => SkillList::from_items(items),
            Wire::Null(()) => SkillList::default(),
        })
    }
}

// --- Resources returned by the API ---

#[derive(Debug, Clone, Deserialize)]
pub struct Resume {
    pub id: i64,
    pub content: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Job {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Application {
    pub id: i64,
    pub job_id: i64,
    #[serde(default)]
    pub candidate_id: Option<i64>,
    #[serde(default)]
    pub candidate_email: Option<String>,
    pub status: ApplicationStatus,
    #[serde(default)]
    pub match_score: Option<f64>,
    #[serde(default)]
    pub missing_skills: SkillList,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchResult {
    pub score: f64,
    #[serde(default)]
    pub missing_keywords: SkillList,
}

/// One applicant's score for a job, as returned by `/match/job/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct JobInsight {
    #[serde(default)]
    pub candidate_email: String,
    pub score: f64,
    #[serde(default)]
    pub missing_keywords: SkillList,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub role: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResumeCreated {
    pub id: i64,
}

// --- Request bodies ---

#[derive(Debug, Serialize)]
pub struct Credentials<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct SignupRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub role: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ResumeRequest<'a> {
    pub content: &'a str,
}

#[derive(Debug, Serialize)]
pub struct JobRequest<'a> {
    pub title: &'a str,
    pub description: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ApplyRequest {
    pub job_id: i64,
}

#[derive(Debug, Serialize)]
pub struct MatchRequest {
    pub resume_id: i64,
    pub job_id: i64,
}

#[derive(Debug, Serialize)]
pub struct StatusRequest<'a> {
    pub status: &'a ApplicationStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skill_list_string_and_array_are_equivalent() {
        let from_text: JobInsight = serde_json::from_value(serde_json::json!({
            "candidate_email": "a@b.com",
            "score": 50,
            "missing_keywords": "docker, sql ,, aws"
        }))
        .unwrap();
        let from_list: JobInsight = serde_json::from_value(serde_json::json!({
            "candidate_email": "a@b.com",
            "score": 50,
            "missing_keywords": [" docker", "sql", "", "aws "]
        }))
        .unwrap();
        assert_eq!(from_text.missing_keywords, from_list.missing_keywords);
        assert_eq!(
            from_text.missing_keywords.iter().collect::<Vec<_>>(),
            vec!["docker", "sql", "aws"]
        );
    }

    #[test]
    fn test_skill_list_null_and_absent() {
        let app: Application =
            serde_json::from_str(r#"{"id":1,"job_id":2,"status":"pending","missing_skills":null}"#)
                .unwrap();
        assert!(app.missing_skills.is_empty());
        assert_eq!(app.status, ApplicationStatus::Applied);
        assert_eq!(app.match_score, None);

        let app: Application =
            serde_json::from_str(r#"{"id":1,"job_id":2,"status":"interview"}"#).unwrap();
        assert!(app.missing_skills.is_empty());
        assert_eq!(app.status, ApplicationStatus::Interview);
    }

    #[test]
    fn test_status_parse_and_label() {
        assert_eq!(ApplicationStatus::parse("Shortlisted"), ApplicationStatus::Shortlisted);
        assert_eq!(ApplicationStatus::parse("rejected").label(), "Rejected");
        assert_eq!(ApplicationStatus::parse("pending").label(), "Applied");

        let odd = ApplicationStatus::parse("on-hold");
        assert_eq!(odd, ApplicationStatus::Other("on-hold".to_string()));
        assert_eq!(odd.label(), "On-hold");
    }

    #[test]
    fn test_status_serializes_as_plain_string() {
        let body =
            serde_json::to_value(StatusRequest { status: &ApplicationStatus::Interview }).unwrap();
        assert_eq!(body, serde_json::json!({"status": "interview"}));
    }

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("Recruiter"), Some(Role::Recruiter));
        assert_eq!(Role::parse(" candidate "), Some(Role::Candidate));
        assert_eq!(Role::parse("admin"), None);
    }
}
