use std::collections::HashMap;
use tracing::{debug, info};

use crate::api::{ApiClient, HttpBackend};
use crate::error::{ClientError, ClientResult};
use crate::models::{Application, ApplicationStatus, Job, JobInsight};
use crate::session::SessionContext;
use crate::view::{Color, Notice, Outcome, Section, excerpt, score_color, status_color};

const POSTING_SUMMARY_CHARS: usize = 150;
const TOP_MISSING: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct PostingCard {
    pub id: i64,
    pub title: String,
    pub summary: String,
    pub posted_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecruiterDashboard {
    pub jobs: Section<Vec<PostingCard>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApplicantRow {
    pub application_id: i64,
    pub candidate: String,
    pub status: ApplicationStatus,
    pub status_color: Color,
    pub match_score: Option<f64>,
    pub missing_skills: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApplicantsView {
    pub job_id: i64,
    pub applicants: Vec<ApplicantRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsightSummary {
    pub count: usize,
    /// Mean score rounded to one decimal; 0 when nobody has applied.
    pub average: f64,
    pub max: f64,
    /// Most frequent missing skills with their counts.
    pub top_missing: Vec<(String, usize)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsightRow {
    pub candidate_email: String,
    pub score: f64,
    pub color: Color,
    pub missing_skills: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsightsView {
    pub job_id: i64,
    pub summary: InsightSummary,
    pub rows: Vec<InsightRow>,
}

pub async fn load<B: HttpBackend>(
    client: &ApiClient<B>,
    session: &SessionContext,
) -> ClientResult<RecruiterDashboard> {
    debug!("loading recruiter data");
    let jobs = Section::from_result(client.my_jobs(session).await, "jobs")?;
    Ok(RecruiterDashboard {
        jobs: jobs.map(|jobs| jobs.into_iter().map(posting_card).collect()),
    })
}

fn posting_card(job: Job) -> PostingCard {
    PostingCard {
        id: job.id,
        summary: if job.description.chars().count() > POSTING_SUMMARY_CHARS {
            excerpt(&job.description, POSTING_SUMMARY_CHARS)
        } else {
            job.description.clone()
        },
        title: job.title,
        posted_at: job.created_at,
    }
}

/// Skills, when given, are folded into the description the server stores.
pub fn full_description(description: &str, skills: &str) -> String {
    if skills.trim().is_empty() {
        description.to_string()
    } else {
        format!("{}\n\nRequired Skills: {}", description, skills)
    }
}

pub async fn post_job<B: HttpBackend>(
    client: &ApiClient<B>,
    session: &SessionContext,
    title: &str,
    skills: &str,
    description: &str,
) -> ClientResult<Outcome<RecruiterDashboard>> {
    if title.trim().is_empty() || description.trim().is_empty() {
        return Err(ClientError::validation("Please fill in both fields"));
    }

    client
        .post_job(session, title, &full_description(description, skills))
        .await?;
    info!(title, "job posted");

    let dashboard = load(client, session).await?;
    Ok(Outcome::refreshed(Notice::success("Job posted successfully!"), dashboard))
}

pub async fn view_applicants<B: HttpBackend>(
    client: &ApiClient<B>,
    session: &SessionContext,
    job_id: i64,
) -> ClientResult<ApplicantsView> {
    let applications = client.job_applications(session, job_id).await?;
    Ok(ApplicantsView {
        job_id,
        applicants: applicant_rows(applications),
    })
}

/// Best match first; applications without a score count as 0.
pub fn applicant_rows(mut applications: Vec<Application>) -> Vec<ApplicantRow> {
    applications.sort_by(|a, b| {
        b.match_score
            .unwrap_or(0.0)
            .total_cmp(&a.match_score.unwrap_or(0.0))
    });

    applications
        .into_iter()
        .map(|app| {
            let candidate = match app.candidate_email.as_deref() {
                Some(email) if !email.is_empty() => email.to_string(),
                _ => format!(
                    "Candidate ID: {}",
                    app.candidate_id.map_or_else(|| "?".to_string(), |id| id.to_string())
                ),
            };
            ApplicantRow {
                application_id: app.id,
                candidate,
                status_color: status_color(&app.status),
                status: app.status,
                match_score: app.match_score,
                missing_skills: app.missing_skills.iter().map(String::from).collect(),
            }
        })
        .collect()
}

pub async fn view_insights<B: HttpBackend>(
    client: &ApiClient<B>,
    session: &SessionContext,
    job_id: i64,
) -> ClientResult<InsightsView> {
    let insights = client.job_insights(session, job_id).await?;
    Ok(build_insights(job_id, insights))
}

pub fn build_insights(job_id: i64, mut insights: Vec<JobInsight>) -> InsightsView {
    insights.sort_by(|a, b| b.score.total_cmp(&a.score));
    let summary = summarize(&insights);
    let rows = insights
        .into_iter()
        .map(|i| InsightRow {
            color: score_color(i.score),
            score: i.score,
            missing_skills: i.missing_keywords.iter().map(String::from).collect(),
            candidate_email: i.candidate_email,
        })
        .collect();
    InsightsView { job_id, summary, rows }
}

/// Count, mean, max and the most common missing skills. Skills tied on
/// count keep the order they were first seen in.
pub fn summarize(insights: &[JobInsight]) -> InsightSummary {
    let count = insights.len();
    let (average, max) = if count == 0 {
        (0.0, 0.0)
    } else {
        let total: f64 = insights.iter().map(|i| i.score).sum();
        let max = insights.iter().map(|i| i.score).fold(f64::MIN, f64::max);
        ((total / count as f64 * 10.0).round() / 10.0, max)
    };

    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for skill in insights.iter().flat_map(|i| i.missing_keywords.iter()) {
        match index.get(skill) {
            Some(&pos) => counts[pos].1 += 1,
            None => {
                index.insert(skill.to_string(), counts.len());
                counts.push((skill.to_string(), 1));
            }
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(TOP_MISSING);

    InsightSummary {
        count,
        average,
        max,
        top_missing: counts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SkillList;
    use crate::testing::{BASE_URL, ScriptedBackend, logged_in};
    use reqwest::Method;
    use serde_json::json;

    fn insight(email: &str, score: f64, missing: &str) -> JobInsight {
        JobInsight {
            candidate_email: email.to_string(),
            score,
            missing_keywords: SkillList::from_delimited(missing),
        }
    }

    #[test]
    fn test_summary_of_three_scores() {
        let view = build_insights(
            1,
            vec![insight("b", 70.0, ""), insight("a", 90.0, ""), insight("c", 50.0, "")],
        );
        assert_eq!(view.summary.count, 3);
        assert_eq!(view.summary.average, 70.0);
        assert_eq!(view.summary.max, 90.0);
        let order: Vec<&str> = view.rows.iter().map(|r| r.candidate_email.as_str()).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_empty_summary_is_zero() {
        let summary = summarize(&[]);
        assert_eq!(summary.count, 0);
        assert_eq!(summary.average, 0.0);
        assert_eq!(summary.max, 0.0);
        assert!(summary.top_missing.is_empty());
    }

    #[test]
    fn test_average_rounded_to_one_decimal() {
        let summary = summarize(&[
            insight("a", 66.0, ""),
            insight("b", 67.0, ""),
            insight("c", 67.0, ""),
        ]);
        assert_eq!(summary.average, 66.7);
    }

    #[test]
    fn test_top_missing_ties_keep_first_seen_order() {
        let view = build_insights(
            1,
            vec![
                insight("a", 90.0, "docker, aws"),
                insight("b", 80.0, "k8s, docker"),
                insight("c", 70.0, "aws, go, rust"),
            ],
        );
        assert_eq!(
            view.summary.top_missing,
            vec![("docker".to_string(), 2), ("aws".to_string(), 2), ("k8s".to_string(), 1)]
        );
    }

    #[test]
    fn test_string_and_list_skills_count_the_same() {
        let from_text: Vec<JobInsight> = serde_json::from_value(json!([
            {"candidate_email": "a", "score": 60, "missing_keywords": "sql, docker"},
            {"candidate_email": "b", "score": 40, "missing_keywords": "docker"}
        ]))
        .unwrap();
        let from_list: Vec<JobInsight> = serde_json::from_value(json!([
            {"candidate_email": "a", "score": 60, "missing_keywords": ["sql", " docker "]},
            {"candidate_email": "b", "score": 40, "missing_keywords": ["docker"]}
        ]))
        .unwrap();
        assert_eq!(summarize(&from_text), summarize(&from_list));
    }

    #[test]
    fn test_applicants_sorted_by_score_missing_as_zero() {
        let apps: Vec<Application> = serde_json::from_value(json!([
            {"id": 1, "job_id": 4, "candidate_id": 11, "status": "pending"},
            {
                "id": 2, "job_id": 4, "candidate_id": 12, "candidate_email": "hi@x.io",
                "status": "shortlisted", "match_score": 88.0, "missing_skills": "go, k8s"
            },
            {
                "id": 3, "job_id": 4, "candidate_id": 13, "candidate_email": "",
                "status": "rejected", "match_score": 12.5
            }
        ]))
        .unwrap();

        let rows = applicant_rows(apps);

        let ids: Vec<i64> = rows.iter().map(|r| r.application_id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
        assert_eq!(rows[0].candidate, "hi@x.io");
        assert_eq!(rows[0].status_color, Color::Green);
        assert_eq!(rows[0].missing_skills, vec!["go", "k8s"]);
        assert_eq!(rows[1].candidate, "Candidate ID: 13");
        assert_eq!(rows[2].status_color, Color::Grey);
    }

    #[test]
    fn test_full_description_appends_skills() {
        assert_eq!(full_description("Build things", ""), "Build things");
        assert_eq!(
            full_description("Build things", "Rust, SQL"),
            "Build things\n\nRequired Skills: Rust, SQL"
        );
    }

    #[test]
    fn test_posting_summary_only_truncates_long_descriptions() {
        let posting = |description: String| Job {
            id: 1,
            title: "t".into(),
            description,
            created_at: None,
        };
        let short = posting_card(posting("short".into()));
        assert_eq!(short.summary, "short");
        let long = posting_card(posting("y".repeat(200)));
        assert_eq!(long.summary, format!("{}...", "y".repeat(150)));
    }

    #[tokio::test]
    async fn test_post_job_validates_before_sending() {
        let dir = tempfile::tempdir().unwrap();
        let session = logged_in(&dir, "T", "recruiter");
        let client = ApiClient::new(ScriptedBackend::new(), BASE_URL);

        let err = post_job(&client, &session, "", "", "desc").await.unwrap_err();
        assert_eq!(err.to_string(), "Please fill in both fields");
        let err = post_job(&client, &session, "Title", "", "  ").await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
        assert!(client.backend().requests().is_empty());
    }

    #[tokio::test]
    async fn test_post_job_sends_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let session = logged_in(&dir, "T", "recruiter");
        let backend = ScriptedBackend::new()
            .on(Method::POST, "/jobs/", 200, json!({"id": 3}))
            .on(
                Method::GET,
                "/jobs/me",
                200,
                json!([{"id": 3, "title": "Rust Dev", "description": "d"}]),
            );
        let client = ApiClient::new(backend, BASE_URL);

        let outcome = post_job(&client, &session, "Rust Dev", "Rust", "d").await.unwrap();

        assert_eq!(outcome.notice, Notice::success("Job posted successfully!"));
        let jobs = outcome.refreshed.unwrap().jobs;
        assert_eq!(jobs.ready().unwrap()[0].title, "Rust Dev");
        assert_eq!(
            client.backend().requests()[0].body,
            Some(json!({"title": "Rust Dev", "description": "d\n\nRequired Skills: Rust"}))
        );
    }

    #[tokio::test]
    async fn test_load_failure_is_a_section() {
        let dir = tempfile::tempdir().unwrap();
        let session = logged_in(&dir, "T", "recruiter");
        let client = ApiClient::new(
            ScriptedBackend::new().on(Method::GET, "/jobs/me", 500, json!({"detail": "oops"})),
            BASE_URL,
        );

        let dashboard = load(&client, &session).await.unwrap();
        assert_eq!(dashboard.jobs, Section::Failed("Failed to load jobs: oops".into()));
    }

    #[tokio::test]
    async fn test_view_insights_fetches_job_scores() {
        let dir = tempfile::tempdir().unwrap();
        let session = logged_in(&dir, "T", "recruiter");
        let backend = ScriptedBackend::new().on(
            Method::GET,
            "/match/job/4",
            200,
            json!([
                {"candidate_email": "x@y.z", "score": 50.0, "missing_keywords": "docker"},
                {"candidate_email": "a@b.c", "score": 90.0, "missing_keywords": ""}
            ]),
        );
        let client = ApiClient::new(backend, BASE_URL);

        let view = view_insights(&client, &session, 4).await.unwrap();
        assert_eq!(view.summary.count, 2);
        assert_eq!(view.summary.average, 70.0);
        assert_eq!(view.rows[0].candidate_email, "a@b.c");
        assert!(view.rows[0].missing_skills.is_empty());
    }
}
