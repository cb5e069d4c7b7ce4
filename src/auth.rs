use tracing::info;

use crate::api::{ApiClient, HttpBackend};
use crate::error::{ClientError, ClientResult};
use crate::session::SessionContext;

/// Where the user ends up after an auth flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    EntryPoint,
    Dashboard { role: String },
}

impl Navigation {
    pub fn url(&self) -> String {
        match self {
            Navigation::EntryPoint => "/".to_string(),
            Navigation::Dashboard { role } => format!("/static/dashboard.html?role={}", role),
        }
    }
}

pub async fn login<B: HttpBackend>(
    client: &ApiClient<B>,
    session: &SessionContext,
    email: &str,
    password: &str,
) -> ClientResult<Navigation> {
    let response = client.login(session, email, password).await?;
    if response.access_token.is_empty() {
        return Err(ClientError::Api("Login response did not include a token".to_string()));
    }

    session.save(&response.access_token, &response.role, email)?;
    let role = response.role.trim().to_lowercase();
    info!(email, %role, "logged in");
    Ok(Navigation::Dashboard { role })
}

/// Creates the account, then logs straight in with the same credentials.
pub async fn signup<B: HttpBackend>(
    client: &ApiClient<B>,
    session: &SessionContext,
    email: &str,
    password: &str,
    role: &str,
) -> ClientResult<Navigation> {
    client
        .signup(session, email, password, &role.trim().to_lowercase())
        .await?;
    info!(email, "account created");
    login(client, session, email, password).await
}

pub fn logout(session: &SessionContext) -> ClientResult<Navigation> {
    session.clear()?;
    info!("logged out");
    Ok(Navigation::EntryPoint)
}
