use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::ClientResult;

/// What the client remembers between invocations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub credential: Option<String>,
    pub role: Option<String>,
    pub email: Option<String>,
    pub last_resume_id: Option<i64>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.credential.is_some() && self.role.is_some()
    }

    /// Role and credential travel together; anything else is treated as no session.
    fn is_consistent(&self) -> bool {
        self.credential.is_some() == self.role.is_some()
    }
}

/// Flat JSON file holding the persisted [`Session`].
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn open_default() -> Self {
        Self { path: Self::default_path() }
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn default_path() -> PathBuf {
        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "tracker") {
            proj_dirs.data_dir().join("session.json")
        } else {
            PathBuf::from("tracker-session.json")
        }
    }

    pub fn read(&self) -> ClientResult<Session> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Session::default()),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str::<Session>(&raw) {
            Ok(session) if session.is_consistent() => Ok(session),
            Ok(_) => {
                warn!(
                    path = %self.path.display(),
                    "stored session has a role without a credential, ignoring it"
                );
                Ok(Session::default())
            }
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "unreadable session file, ignoring it"
                );
                Ok(Session::default())
            }
        }
    }

    pub fn write(&self, session: &Session) -> ClientResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let raw = serde_json::to_string_pretty(session).map_err(std::io::Error::other)?;

        // The file holds a bearer token: owner read/write only.
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&self.path)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
        }
        file.write_all(raw.as_bytes())?;
        Ok(())
    }

    pub fn remove(&self) -> ClientResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// The session for one invocation. Built once at startup and handed to
/// every orchestrator and transport call; all writes go straight to disk.
///
/// The client runs on a single thread, so a `RefCell` is enough. No borrow
/// is held across an await point.
#[derive(Debug)]
pub struct SessionContext {
    store: SessionStore,
    state: RefCell<Session>,
}

impl SessionContext {
    pub fn load(store: SessionStore) -> ClientResult<Self> {
        let session = store.read()?;
        debug!(
            path = %store.path().display(),
            authenticated = session.is_authenticated(),
            "session loaded"
        );
        Ok(Self {
            store,
            state: RefCell::new(session),
        })
    }

    pub fn path(&self) -> &Path {
        self.store.path()
    }

    pub fn snapshot(&self) -> Session {
        self.state.borrow().clone()
    }

    pub fn credential(&self) -> Option<String> {
        self.state.borrow().credential.clone()
    }

    pub fn last_resume_id(&self) -> Option<i64> {
        self.state.borrow().last_resume_id
    }

    /// Overwrites the whole session after a successful login.
    pub fn save(&self, credential: &str, role: &str, email: &str) -> ClientResult<()> {
        let session = Session {
            credential: Some(credential.to_string()),
            role: Some(role.trim().to_lowercase()),
            email: Some(email.to_string()),
            last_resume_id: None,
        };
        self.store.write(&session)?;
        *self.state.borrow_mut() = session;
        Ok(())
    }

    pub fn set_last_resume_id(&self, id: i64) -> ClientResult<()> {
        let session = {
            let mut state = self.state.borrow_mut();
            state.last_resume_id = Some(id);
            state.clone()
        };
        self.store.write(&session)
    }

    pub fn clear(&self) -> ClientResult<()> {
        *self.state.borrow_mut() = Session::default();
        self.store.remove()
    }
}
