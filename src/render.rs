//! Text renderings of the dashboard view models, printed by the CLI.

use crossterm::style::{self, Stylize};
use std::io::IsTerminal;

use crate::candidate::{ApplyControl, CandidateDashboard, MatchView};
use crate::recruiter::{ApplicantsView, InsightsView, RecruiterDashboard};
use crate::view::{
    Color, Notice, NoticeLevel, Section, fmt_score, fmt_timestamp, score_color, status_color,
    truncate,
};
use crate::workflow::StatusAction;

const WRAP_WIDTH: usize = 80;

/// Colors status and score text the way the interactive board does.
/// Plain output when stdout is not a terminal or `NO_COLOR` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Painter {
    ansi: bool,
}

impl Painter {
    pub fn plain() -> Self {
        Self { ansi: false }
    }

    pub fn ansi() -> Self {
        Self { ansi: true }
    }

    pub fn for_stdout() -> Self {
        Self {
            ansi: std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
        }
    }

    pub fn paint(self, text: &str, tone: Color) -> String {
        if !self.ansi {
            return text.to_string();
        }
        let (r, g, b) = tone.rgb();
        style::style(text).with(style::Color::Rgb { r, g, b }).to_string()
    }
}

pub fn chips(skills: &[String]) -> String {
    skills
        .iter()
        .map(|s| format!("[{}]", s))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn notice(notice: &Notice, painter: Painter) -> String {
    let (tag, tone) = match notice.level {
        NoticeLevel::Info => ("info", Color::Grey),
        NoticeLevel::Success => ("ok", Color::Green),
        NoticeLevel::Error => ("error", Color::Red),
    };
    format!("{} {}", painter.paint(&format!("[{}]", tag), tone), notice.message)
}

fn heading(out: &mut String, title: &str) {
    out.push_str(&format!("\n== {} ==\n", title));
}

fn indent_wrapped(out: &mut String, text: &str, indent: &str) {
    for line in textwrap::wrap(text, WRAP_WIDTH - indent.len()) {
        out.push_str(&format!("{}{}\n", indent, line));
    }
}

fn failed(out: &mut String, message: &str, painter: Painter) {
    out.push_str(&format!("{}\n", painter.paint(message, Color::Red)));
}

pub fn candidate(dashboard: &CandidateDashboard, painter: Painter) -> String {
    let mut out = String::new();

    heading(&mut out, "Resume");
    match &dashboard.resume {
        Section::Ready(Some(resume)) => {
            out.push_str(&format!("Resume uploaded (ID: {})", resume.id));
            if let Some(at) = &resume.uploaded_at {
                out.push_str(&format!(", {}", fmt_timestamp(at)));
            }
            out.push('\n');
            indent_wrapped(&mut out, &resume.content, "  ");
        }
        Section::Ready(None) => out.push_str("No resume uploaded yet.\n"),
        Section::Failed(message) => failed(&mut out, message, painter),
    }

    heading(&mut out, "Jobs");
    match &dashboard.jobs {
        Section::Ready(cards) if cards.is_empty() => out.push_str("No jobs found.\n"),
        Section::Ready(cards) => {
            out.push_str(&format!("{:<6} {:<40} {:<12}\n", "ID", "TITLE", "APPLY"));
            out.push_str(&format!("{}\n", "-".repeat(60)));
            for card in cards {
                // Last column, so escape codes do not upset the alignment.
                let apply = match &card.apply {
                    ApplyControl::Open => "[Apply]".to_string(),
                    ApplyControl::Locked { label, color } => painter.paint(label, *color),
                };
                out.push_str(&format!(
                    "{:<6} {:<40} {}\n",
                    card.id,
                    truncate(&card.title, 38),
                    apply
                ));
                out.push_str(&format!("       {}\n", card.excerpt));
            }
        }
        Section::Failed(message) => failed(&mut out, message, painter),
    }

    heading(&mut out, "My Applications");
    match &dashboard.applications {
        Section::Ready(rows) if rows.is_empty() => out.push_str("No applications yet.\n"),
        Section::Ready(rows) => {
            for row in rows {
                out.push_str(&row.title);
                if let Some(score) = row.match_score.filter(|s| *s != 0.0) {
                    let text = format!("{}% Match", fmt_score(score));
                    out.push_str(&format!("  {}", painter.paint(&text, score_color(score))));
                }
                out.push('\n');
                let status = row.status.as_str().to_uppercase();
                out.push_str(&format!(
                    "  Status: {}\n",
                    painter.paint(&status, status_color(&row.status))
                ));
                if !row.missing_skills.is_empty() {
                    out.push_str(&format!("  Missing: {}\n", chips(&row.missing_skills)));
                }
            }
        }
        Section::Failed(message) => failed(&mut out, message, painter),
    }

    out
}

pub fn match_result(view: &MatchView, painter: Painter) -> String {
    let mut out = String::new();
    heading(&mut out, &format!("Match Results for job #{}", view.job_id));
    let score = format!("{}%", fmt_score(view.score));
    out.push_str(&format!("Match Score: {}\n", painter.paint(&score, view.color)));
    out.push_str("Missing Skills: ");
    if view.missing_keywords.is_empty() {
        out.push_str("None! Great match.\n");
    } else {
        out.push_str(&format!("{}\n", chips(&view.missing_keywords)));
    }
    out
}

pub fn recruiter(dashboard: &RecruiterDashboard, painter: Painter) -> String {
    let mut out = String::new();
    heading(&mut out, "My Job Postings");
    match &dashboard.jobs {
        Section::Ready(cards) if cards.is_empty() => out.push_str("No jobs posted yet.\n"),
        Section::Ready(cards) => {
            for card in cards {
                out.push_str(&format!("#{:<5} {}", card.id, card.title));
                if let Some(at) = &card.posted_at {
                    out.push_str(&format!("  (posted {})", fmt_timestamp(at)));
                }
                out.push('\n');
                indent_wrapped(&mut out, &card.summary, "       ");
                out.push_str(&format!(
                    "       actions: tracker applicants {id} | tracker insights {id}\n",
                    id = card.id
                ));
            }
        }
        Section::Failed(message) => failed(&mut out, message, painter),
    }
    out
}

pub fn applicants(view: &ApplicantsView, painter: Painter) -> String {
    let mut out = String::new();
    heading(&mut out, &format!("Applicants for Job ID: {}", view.job_id));
    if view.applicants.is_empty() {
        out.push_str("No applicants yet.\n");
        return out;
    }

    let actions = StatusAction::ALL
        .iter()
        .map(|a| a.label().to_lowercase())
        .collect::<Vec<_>>()
        .join("|");
    for row in &view.applicants {
        out.push_str(&format!("#{:<5} {}\n", row.application_id, row.candidate));
        let status = row.status.as_str().to_uppercase();
        out.push_str(&format!(
            "       Status: {}\n",
            painter.paint(&status, row.status_color)
        ));
        if let Some(score) = row.match_score.filter(|s| *s != 0.0) {
            let text = format!("{}%", fmt_score(score));
            out.push_str(&format!(
                "       Match Score: {}\n",
                painter.paint(&text, score_color(score))
            ));
        }
        if !row.missing_skills.is_empty() {
            out.push_str(&format!("       Missing: {}\n", chips(&row.missing_skills)));
        }
        out.push_str(&format!(
            "       actions: tracker status {} <{}>\n",
            row.application_id, actions
        ));
    }
    out
}

pub fn insights(view: &InsightsView, painter: Painter) -> String {
    let mut out = String::new();
    let summary = &view.summary;
    heading(&mut out, &format!("AI Insights for job #{}", view.job_id));

    let top = if summary.top_missing.is_empty() {
        "None".to_string()
    } else {
        summary
            .top_missing
            .iter()
            .map(|(skill, n)| format!("{} ({})", skill, n))
            .collect::<Vec<_>>()
            .join(", ")
    };
    out.push_str(&format!(
        "{:<12} {:<12} {:<12} {}\n",
        "APPLICANTS", "AVG MATCH", "TOP MATCH", "MISSING"
    ));
    // Pad before painting so escape codes do not count towards the width.
    let average = format!("{:<12}", format!("{:.1}%", summary.average));
    let max = format!("{:<12}", format!("{}%", fmt_score(summary.max)));
    out.push_str(&format!(
        "{:<12} {} {} {}\n",
        summary.count,
        painter.paint(&average, score_color(summary.average)),
        painter.paint(&max, score_color(summary.max)),
        top
    ));
    out.push('\n');

    if view.rows.is_empty() {
        out.push_str("No match data available yet.\n");
        return out;
    }
    for row in &view.rows {
        let score = format!("{:>6}%", fmt_score(row.score));
        out.push_str(&format!(
            "{:<40} {}\n",
            row.candidate_email,
            painter.paint(&score, row.color)
        ));
        let missing = if row.missing_skills.is_empty() {
            "None".to_string()
        } else {
            chips(&row.missing_skills)
        };
        out.push_str(&format!("  Missing Skills: {}\n", missing));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::{HistoryRow, JobCard, ResumeView};
    use crate::models::ApplicationStatus;
    use crate::recruiter::{ApplicantRow, InsightSummary, build_insights};

    fn sample_dashboard() -> CandidateDashboard {
        CandidateDashboard {
            resume: Section::Ready(Some(ResumeView {
                id: 9,
                content: "Rust and Go".into(),
                uploaded_at: None,
            })),
            jobs: Section::Ready(vec![
                JobCard {
                    id: 5,
                    title: "Rust Engineer".into(),
                    excerpt: "Tokio...".into(),
                    description: "Tokio".into(),
                    apply: ApplyControl::Open,
                },
                JobCard {
                    id: 6,
                    title: "SRE".into(),
                    excerpt: "K8s...".into(),
                    description: "K8s".into(),
                    apply: ApplyControl::Locked { label: "Interview".into(), color: Color::Amber },
                },
            ]),
            applications: Section::Failed("Failed to load applications: boom".into()),
        }
    }

    #[test]
    fn test_candidate_render_shows_every_section() {
        let text = candidate(&sample_dashboard(), Painter::plain());
        assert!(text.contains("Resume uploaded (ID: 9)"));
        assert!(text.contains("[Apply]"));
        assert!(text.contains("Interview"));
        assert!(text.contains("Failed to load applications: boom"));
        assert!(!text.contains('\x1b'));
    }

    #[test]
    fn test_candidate_history_row() {
        let mut dashboard = sample_dashboard();
        dashboard.applications = Section::Ready(vec![HistoryRow {
            application_id: 1,
            job_id: 6,
            title: "SRE".into(),
            status: ApplicationStatus::Interview,
            match_score: Some(82.0),
            missing_skills: vec!["helm".into(), "terraform".into()],
        }]);
        let text = candidate(&dashboard, Painter::plain());
        assert!(text.contains("SRE  82% Match"));
        assert!(text.contains("Status: INTERVIEW"));
        assert!(text.contains("Missing: [helm] [terraform]"));
    }

    #[test]
    fn test_status_colors_reach_the_terminal() {
        let (r, g, b) = Color::Amber.rgb();
        let amber = format!("38;2;{};{};{}", r, g, b);

        let text = candidate(&sample_dashboard(), Painter::ansi());
        assert!(text.contains(&amber));
        assert!(text.contains("Interview"));

        let view = ApplicantsView {
            job_id: 4,
            applicants: vec![ApplicantRow {
                application_id: 7,
                candidate: "a@b.c".into(),
                status: ApplicationStatus::Rejected,
                status_color: Color::Red,
                match_score: Some(30.0),
                missing_skills: vec![],
            }],
        };
        let (r, g, b) = Color::Red.rgb();
        let text = applicants(&view, Painter::ansi());
        assert!(text.contains(&format!("38;2;{};{};{}", r, g, b)));
        assert!(!applicants(&view, Painter::plain()).contains('\x1b'));
    }

    #[test]
    fn test_empty_sections_have_messages() {
        let text = candidate(
            &CandidateDashboard {
                resume: Section::Ready(None),
                jobs: Section::Ready(vec![]),
                applications: Section::Ready(vec![]),
            },
            Painter::plain(),
        );
        assert!(text.contains("No jobs found."));
        assert!(text.contains("No applications yet."));

        let text = insights(&build_insights(3, vec![]), Painter::plain());
        assert!(text.contains("No match data available yet."));
        assert!(text.contains("0.0%"));
    }

    #[test]
    fn test_insights_summary_line() {
        let view = InsightsView {
            job_id: 1,
            summary: InsightSummary {
                count: 3,
                average: 70.0,
                max: 90.0,
                top_missing: vec![("docker".into(), 2), ("aws".into(), 1)],
            },
            rows: vec![],
        };
        let text = insights(&view, Painter::plain());
        assert!(text.contains("70.0%"));
        assert!(text.contains("90%"));
        assert!(text.contains("docker (2), aws (1)"));
    }

    #[test]
    fn test_notice_tags() {
        let painter = Painter::plain();
        assert_eq!(
            notice(&Notice::info("No changes detected"), painter),
            "[info] No changes detected"
        );
        assert_eq!(notice(&Notice::error("nope"), painter), "[error] nope");
    }
}
