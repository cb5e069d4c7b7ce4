//! Plain-data building blocks shared by both dashboards.

use chrono::{DateTime, NaiveDateTime};

use crate::error::{ClientError, ClientResult};
use crate::models::ApplicationStatus;

/// One independently fetched part of a dashboard.
#[derive(Debug, Clone, PartialEq)]
pub enum Section<T> {
    Ready(T),
    Failed(String),
}

impl<T> Section<T> {
    /// Session expiry is not a section failure; it is handed back so the
    /// whole view can be abandoned.
    pub fn from_result(result: ClientResult<T>, what: &str) -> ClientResult<Self> {
        match result {
            Ok(value) => Ok(Section::Ready(value)),
            Err(e) if e.is_entry_point() => Err(e),
            Err(e) => {
                tracing::error!(error = %e, "error loading {}", what);
                Ok(Section::Failed(format!("Failed to load {}: {}", what, e)))
            }
        }
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Section::Ready(value) => Some(value),
            Section::Failed(_) => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Section<U> {
        match self {
            Section::Ready(value) => Section::Ready(f(value)),
            Section::Failed(message) => Section::Failed(message),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Green,
    Amber,
    Red,
    Grey,
}

impl Color {
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            Color::Green => (0x16, 0xa3, 0x4a),
            Color::Amber => (0xca, 0x8a, 0x04),
            Color::Red => (0xdc, 0x26, 0x26),
            Color::Grey => (0x6b, 0x72, 0x80),
        }
    }
}

pub fn status_color(status: &ApplicationStatus) -> Color {
    match status {
        ApplicationStatus::Shortlisted => Color::Green,
        ApplicationStatus::Interview => Color::Amber,
        ApplicationStatus::Rejected => Color::Red,
        ApplicationStatus::Applied | ApplicationStatus::Other(_) => Color::Grey,
    }
}

/// Scores in lists and summaries: good from 70 up.
pub fn score_color(score: f64) -> Color {
    if score >= 70.0 { Color::Green } else { Color::Amber }
}

/// The single-job match view also flags poor fits.
pub fn match_color(score: f64) -> Color {
    if score >= 70.0 {
        Color::Green
    } else if score >= 40.0 {
        Color::Amber
    } else {
        Color::Red
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// Short message for the user after an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Info, message: message.into() }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Success, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, message: message.into() }
    }

    pub fn from_error(err: &ClientError) -> Self {
        Self::error(err.to_string())
    }
}

/// Result of a user action: what to tell them, plus the reloaded view when
/// the action refreshes one.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<V> {
    pub notice: Notice,
    pub refreshed: Option<V>,
}

impl<V> Outcome<V> {
    pub fn notice_only(notice: Notice) -> Self {
        Self { notice, refreshed: None }
    }

    pub fn refreshed(notice: Notice, view: V) -> Self {
        Self { notice, refreshed: Some(view) }
    }
}

/// Character-based so multi-byte text never splits.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

/// First `max` characters followed by "...", whatever the length.
pub fn excerpt(s: &str, max: usize) -> String {
    let head: String = s.chars().take(max).collect();
    format!("{}...", head)
}

/// 90.0 -> "90", 66.666 -> "66.7"
pub fn fmt_score(score: f64) -> String {
    if score.fract() == 0.0 {
        format!("{:.0}", score)
    } else {
        format!("{:.1}", score)
    }
}

pub fn fmt_timestamp(raw: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.format("%Y-%m-%d %H:%M").to_string();
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return dt.format("%Y-%m-%d %H:%M").to_string();
    }
    raw.to_string()
}
