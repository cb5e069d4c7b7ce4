//! Scripted HTTP backend and session helpers shared by the unit tests.

use reqwest::Method;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

use crate::api::{HttpBackend, HttpRequest, HttpResponse};
use crate::error::ClientResult;
use crate::session::{SessionContext, SessionStore};

pub const BASE_URL: &str = "http://api.test";

type Route = (Method, String);

/// Answers requests from a per-route queue. The last queued response for a
/// route repeats, so reloads see the same data. Unscripted routes get a 404.
/// A route can be held back for a number of scheduler turns to make
/// concurrent requests finish out of order.
#[derive(Default)]
pub struct ScriptedBackend {
    routes: RefCell<HashMap<Route, VecDeque<HttpResponse>>>,
    delays: RefCell<HashMap<Route, usize>>,
    requests: RefCell<Vec<HttpRequest>>,
    completed: RefCell<Vec<String>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(self, method: Method, path: &str, status: u16, body: Value) -> Self {
        self.on_raw(method, path, status, &body.to_string())
    }

    pub fn on_raw(self, method: Method, path: &str, status: u16, body: &str) -> Self {
        self.routes
            .borrow_mut()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(HttpResponse {
                status,
                body: body.to_string(),
            });
        self
    }

    pub fn delay(self, method: Method, path: &str, turns: usize) -> Self {
        self.delays.borrow_mut().insert((method, path.to_string()), turns);
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.borrow().clone()
    }

    /// Paths in the order their responses were handed back.
    pub fn completed(&self) -> Vec<String> {
        self.completed.borrow().clone()
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        let url = format!("{}{}", BASE_URL, path);
        self.requests
            .borrow()
            .iter()
            .filter(|r| r.method == method && r.url == url)
            .count()
    }
}

impl HttpBackend for ScriptedBackend {
    async fn execute(&self, request: HttpRequest) -> ClientResult<HttpResponse> {
        let path = request
            .url
            .strip_prefix(BASE_URL)
            .unwrap_or(&request.url)
            .to_string();
        let key = (request.method.clone(), path);
        self.requests.borrow_mut().push(request);

        let turns = self.delays.borrow().get(&key).copied().unwrap_or(0);
        for _ in 0..turns {
            tokio::task::yield_now().await;
        }
        self.completed.borrow_mut().push(key.1.clone());

        let mut routes = self.routes.borrow_mut();
        let response = match routes.get_mut(&key) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };
        Ok(response.unwrap_or(HttpResponse {
            status: 404,
            body: r#"{"detail":"Not Found"}"#.to_string(),
        }))
    }
}

pub fn session_in(dir: &tempfile::TempDir) -> SessionContext {
    SessionContext::load(SessionStore::at(dir.path().join("session.json"))).unwrap()
}

pub fn logged_in(dir: &tempfile::TempDir, credential: &str, role: &str) -> SessionContext {
    let session = session_in(dir);
    session.save(credential, role, "user@example.com").unwrap();
    session
}
