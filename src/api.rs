use reqwest::Method;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::error::{ClientError, ClientResult};
use crate::models::{
    Application, ApplicationStatus, ApplyRequest, Credentials, Job, JobInsight, JobRequest,
    LoginResponse, MatchRequest, MatchResult, Resume, ResumeCreated, ResumeRequest, SignupRequest,
    StatusRequest,
};
use crate::session::SessionContext;

pub const LOGIN_ENDPOINT: &str = "/auth/login";

#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub bearer: Option<String>,
    pub body: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    fn is_auth_failure(&self) -> bool {
        self.status == 401 || self.status == 403
    }
}

/// The wire underneath [`ApiClient`]. Production uses reqwest; tests script
/// responses per endpoint.
#[allow(async_fn_in_trait)]
pub trait HttpBackend {
    async fn execute(&self, request: HttpRequest) -> ClientResult<HttpResponse>;
}

#[derive(Debug, Clone)]
pub struct ReqwestBackend {
    client: reqwest::Client,
}

impl ReqwestBackend {
    pub fn new() -> ClientResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = reqwest::Client::builder().default_headers(headers).build()?;
        Ok(Self { client })
    }
}

impl HttpBackend for ReqwestBackend {
    async fn execute(&self, request: HttpRequest) -> ClientResult<HttpResponse> {
        let mut builder = self.client.request(request.method, &request.url);
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpResponse { status, body })
    }
}

/// Every request to the tracker API goes through here.
pub struct ApiClient<B = ReqwestBackend> {
    backend: B,
    base_url: String,
}

impl<B: HttpBackend> ApiClient<B> {
    pub fn new(backend: B, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { backend, base_url }
    }

    #[cfg(test)]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Sends one request and returns the decoded JSON body.
    ///
    /// A 401/403 anywhere but the login endpoint wipes the session and
    /// yields [`ClientError::SessionExpired`]; nothing is returned to the
    /// caller on that path. On login the rejection is an ordinary
    /// [`ClientError::Api`] so a failed login leaves the session alone.
    pub async fn call(
        &self,
        session: &SessionContext,
        endpoint: &str,
        method: Method,
        body: Option<Value>,
    ) -> ClientResult<Value> {
        let request = HttpRequest {
            method: method.clone(),
            url: format!("{}{}", self.base_url, endpoint),
            bearer: session.credential(),
            body,
        };
        debug!(%method, endpoint, authenticated = request.bearer.is_some(), "api call");

        let response = self.backend.execute(request).await?;

        if response.is_auth_failure() && !endpoint.starts_with(LOGIN_ENDPOINT) {
            warn!(status = response.status, endpoint, "auth error, clearing session");
            if let Err(e) = session.clear() {
                error!(error = %e, "failed to remove stored session");
            }
            return Err(ClientError::SessionExpired);
        }

        if !response.is_success() {
            let message = error_message(&response.body);
            debug!(status = response.status, endpoint, %message, "api error");
            return Err(ClientError::Api(message));
        }

        if response.body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&response.body).map_err(|source| ClientError::Decode {
            endpoint: endpoint.to_string(),
            source,
        })
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        session: &SessionContext,
        endpoint: &str,
        method: Method,
        body: Option<Value>,
    ) -> ClientResult<T> {
        let value = self.call(session, endpoint, method, body).await?;
        serde_json::from_value(value).map_err(|source| ClientError::Decode {
            endpoint: endpoint.to_string(),
            source,
        })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        session: &SessionContext,
        endpoint: &str,
    ) -> ClientResult<T> {
        self.fetch(session, endpoint, Method::GET, None).await
    }

    async fn send<S: Serialize, T: DeserializeOwned>(
        &self,
        session: &SessionContext,
        endpoint: &str,
        method: Method,
        body: &S,
    ) -> ClientResult<T> {
        let body = encode(endpoint, body)?;
        self.fetch(session, endpoint, method, Some(body)).await
    }

    // --- Auth ---

    pub async fn login(
        &self,
        session: &SessionContext,
        email: &str,
        password: &str,
    ) -> ClientResult<LoginResponse> {
        self.send(session, LOGIN_ENDPOINT, Method::POST, &Credentials { email, password })
            .await
    }

    pub async fn signup(
        &self,
        session: &SessionContext,
        email: &str,
        password: &str,
        role: &str,
    ) -> ClientResult<()> {
        let _: Value = self
            .send(session, "/auth/signup", Method::POST, &SignupRequest { email, password, role })
            .await?;
        Ok(())
    }

    // --- Resumes ---

    pub async fn my_resumes(&self, session: &SessionContext) -> ClientResult<Vec<Resume>> {
        self.get(session, "/resumes/me").await
    }

    pub async fn submit_resume(
        &self,
        session: &SessionContext,
        content: &str,
    ) -> ClientResult<ResumeCreated> {
        self.send(session, "/resumes/", Method::POST, &ResumeRequest { content })
            .await
    }

    // --- Jobs ---

    pub async fn jobs(&self, session: &SessionContext) -> ClientResult<Vec<Job>> {
        self.get(session, "/jobs/").await
    }

    pub async fn my_jobs(&self, session: &SessionContext) -> ClientResult<Vec<Job>> {
        self.get(session, "/jobs/me").await
    }

    pub async fn post_job(
        &self,
        session: &SessionContext,
        title: &str,
        description: &str,
    ) -> ClientResult<()> {
        let _: Value = self
            .send(session, "/jobs/", Method::POST, &JobRequest { title, description })
            .await?;
        Ok(())
    }

    // --- Applications ---

    pub async fn my_applications(
        &self,
        session: &SessionContext,
    ) -> ClientResult<Vec<Application>> {
        self.get(session, "/applications/me").await
    }

    pub async fn apply(&self, session: &SessionContext, job_id: i64) -> ClientResult<()> {
        let _: Value = self
            .send(session, "/applications/", Method::POST, &ApplyRequest { job_id })
            .await?;
        Ok(())
    }

    pub async fn job_applications(
        &self,
        session: &SessionContext,
        job_id: i64,
    ) -> ClientResult<Vec<Application>> {
        self.get(session, &format!("/applications/job/{}", job_id)).await
    }

    pub async fn update_application(
        &self,
        session: &SessionContext,
        application_id: i64,
        status: &ApplicationStatus,
    ) -> ClientResult<()> {
        let _: Value = self
            .send(
                session,
                &format!("/applications/{}", application_id),
                Method::PATCH,
                &StatusRequest { status },
            )
            .await?;
        Ok(())
    }

    // --- Matching ---

    pub async fn match_resume(
        &self,
        session: &SessionContext,
        resume_id: i64,
        job_id: i64,
    ) -> ClientResult<MatchResult> {
        self.send(session, "/match/", Method::POST, &MatchRequest { resume_id, job_id })
            .await
    }

    pub async fn job_insights(
        &self,
        session: &SessionContext,
        job_id: i64,
    ) -> ClientResult<Vec<JobInsight>> {
        self.get(session, &format!("/match/job/{}", job_id)).await
    }
}

fn encode<S: Serialize>(endpoint: &str, body: &S) -> ClientResult<Value> {
    serde_json::to_value(body).map_err(|source| ClientError::Encode {
        endpoint: endpoint.to_string(),
        source,
    })
}

/// Human-readable text out of an error body's `detail` field. A null or
/// empty `detail` reads as "API Error".
fn error_message(body: &str) -> String {
    let detail = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("detail").cloned());
    match detail {
        Some(Value::String(s)) if !s.is_empty() => s,
        Some(Value::String(_)) | Some(Value::Null) | None => "API Error".to_string(),
        Some(other) => other.to_string(),
    }
}
