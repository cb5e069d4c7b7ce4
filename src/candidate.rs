use tracing::{debug, info, warn};

use crate::api::{ApiClient, HttpBackend};
use crate::error::{ClientError, ClientResult};
use crate::models::{Application, ApplicationStatus, Job, Resume};
use crate::session::SessionContext;
use crate::view::{Color, Notice, Outcome, Section, match_color, status_color};

const JOB_EXCERPT_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct ResumeView {
    pub id: i64,
    pub content: String,
    pub uploaded_at: Option<String>,
}

/// The Apply button on a job card.
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyControl {
    Open,
    /// Already applied: disabled and showing the application status.
    Locked { label: String, color: Color },
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobCard {
    pub id: i64,
    pub title: String,
    pub excerpt: String,
    pub description: String,
    pub apply: ApplyControl,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRow {
    pub application_id: i64,
    pub job_id: i64,
    pub title: String,
    pub status: ApplicationStatus,
    pub match_score: Option<f64>,
    pub missing_skills: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CandidateDashboard {
    pub resume: Section<Option<ResumeView>>,
    pub jobs: Section<Vec<JobCard>>,
    pub applications: Section<Vec<HistoryRow>>,
}

impl CandidateDashboard {
    pub fn job(&self, job_id: i64) -> Option<&JobCard> {
        self.jobs.ready()?.iter().find(|card| card.id == job_id)
    }

    pub fn resume_content(&self) -> Option<&str> {
        match &self.resume {
            Section::Ready(Some(resume)) => Some(&resume.content),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchView {
    pub job_id: i64,
    pub score: f64,
    pub color: Color,
    pub missing_keywords: Vec<String>,
}

pub fn current_resume(resumes: &[Resume]) -> Option<&Resume> {
    resumes.iter().max_by_key(|r| r.id)
}

/// Fetches resumes, jobs and applications and renders once all three have
/// settled. The requests go out in that order on the one event loop and may
/// finish in any order. A failed section does not stop the others, but an
/// expired session abandons the whole dashboard.
pub async fn load<B: HttpBackend>(
    client: &ApiClient<B>,
    session: &SessionContext,
) -> ClientResult<CandidateDashboard> {
    debug!("loading candidate data");
    let (resumes, jobs, applications) = tokio::join!(
        client.my_resumes(session),
        client.jobs(session),
        client.my_applications(session),
    );

    let resumes = Section::from_result(resumes, "resume")?;
    let jobs = Section::from_result(jobs, "jobs")?;
    let applications = Section::from_result(applications, "applications")?;

    let current = resumes.map(|list| current_resume(&list).cloned());
    if let Section::Ready(Some(resume)) = &current {
        if let Err(e) = session.set_last_resume_id(resume.id) {
            warn!(error = %e, "could not remember current resume id");
        }
    }

    Ok(compose(current, jobs, applications))
}

/// Builds the dashboard view from whatever each fetch produced. Applications
/// lock the Apply control of their job's card.
pub fn compose(
    resume: Section<Option<Resume>>,
    jobs: Section<Vec<Job>>,
    applications: Section<Vec<Application>>,
) -> CandidateDashboard {
    let resume = resume.map(|current| {
        current.map(|r| ResumeView {
            id: r.id,
            content: r.content,
            uploaded_at: r.created_at,
        })
    });

    let known_jobs: Vec<Job> = jobs.ready().cloned().unwrap_or_default();

    let mut job_cards = jobs.map(|jobs| {
        jobs.into_iter()
            .map(|job| JobCard {
                id: job.id,
                title: job.title,
                excerpt: crate::view::excerpt(&job.description, JOB_EXCERPT_CHARS),
                description: job.description,
                apply: ApplyControl::Open,
            })
            .collect::<Vec<_>>()
    });

    if let (Section::Ready(cards), Section::Ready(apps)) = (&mut job_cards, &applications) {
        for app in apps {
            if let Some(card) = cards.iter_mut().find(|c| c.id == app.job_id) {
                card.apply = ApplyControl::Locked {
                    label: app.status.label(),
                    color: status_color(&app.status),
                };
            }
        }
    }

    let applications = applications.map(|apps| {
        apps.into_iter()
            .map(|app| {
                let title = known_jobs
                    .iter()
                    .find(|j| j.id == app.job_id)
                    .map(|j| j.title.clone())
                    .unwrap_or_else(|| format!("Job ID: {}", app.job_id));
                HistoryRow {
                    application_id: app.id,
                    job_id: app.job_id,
                    title,
                    status: app.status,
                    match_score: app.match_score,
                    missing_skills: app.missing_skills.iter().map(String::from).collect(),
                }
            })
            .collect()
    });

    CandidateDashboard {
        resume,
        jobs: job_cards,
        applications,
    }
}

/// Refreshes `last_resume_id` from the server without loading the rest.
pub async fn remember_current_resume<B: HttpBackend>(
    client: &ApiClient<B>,
    session: &SessionContext,
) -> ClientResult<Option<Resume>> {
    let resumes = client.my_resumes(session).await?;
    let current = current_resume(&resumes).cloned();
    if let Some(resume) = &current {
        session.set_last_resume_id(resume.id)?;
    }
    Ok(current)
}

/// Checks run before a resume is sent; `Ok(false)` means there is nothing
/// new to send. `original` is the content last shown to the user.
pub fn resume_changed(content: &str, original: Option<&str>) -> ClientResult<bool> {
    if content.trim().is_empty() {
        return Err(ClientError::validation("Resume cannot be empty"));
    }
    Ok(original != Some(content))
}

pub async fn submit_resume<B: HttpBackend>(
    client: &ApiClient<B>,
    session: &SessionContext,
    content: &str,
    original: Option<&str>,
) -> ClientResult<Outcome<CandidateDashboard>> {
    if !resume_changed(content, original)? {
        return Ok(Outcome::notice_only(Notice::info("No changes detected")));
    }

    let created = client.submit_resume(session, content).await?;
    session.set_last_resume_id(created.id)?;
    info!(resume_id = created.id, "resume updated");

    let notice = Notice::success(format!("Resume updated successfully! (ID: {})", created.id));
    let dashboard = load(client, session).await?;
    Ok(Outcome::refreshed(notice, dashboard))
}

pub async fn show_match<B: HttpBackend>(
    client: &ApiClient<B>,
    session: &SessionContext,
    job_id: i64,
) -> ClientResult<MatchView> {
    let resume_id = session
        .last_resume_id()
        .ok_or_else(|| ClientError::validation("Please upload your resume first"))?;

    let result = client.match_resume(session, resume_id, job_id).await?;
    Ok(MatchView {
        job_id,
        score: result.score,
        color: match_color(result.score),
        missing_keywords: result.missing_keywords.iter().map(String::from).collect(),
    })
}

/// Applies and reloads the dashboard so the job card shows its new status.
pub async fn apply<B: HttpBackend>(
    client: &ApiClient<B>,
    session: &SessionContext,
    job_id: i64,
) -> ClientResult<Outcome<CandidateDashboard>> {
    client.apply(session, job_id).await?;
    info!(job_id, "applied successfully");

    let dashboard = load(client, session).await?;
    Ok(Outcome::refreshed(
        Notice::success(format!("Applied to job #{}", job_id)),
        dashboard,
    ))
}
