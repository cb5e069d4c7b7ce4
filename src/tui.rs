use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};
use std::io::stdout;
use tokio::runtime::Runtime;

use crate::api::{ApiClient, HttpBackend};
use crate::candidate::{self, ApplyControl, CandidateDashboard, MatchView};
use crate::error::{ClientError, ClientResult};
use crate::recruiter::{self, ApplicantsView, InsightsView, RecruiterDashboard};
use crate::render::chips;
use crate::router::DashboardView;
use crate::session::SessionContext;
use crate::view::{self, Notice, NoticeLevel, Section, fmt_score, fmt_timestamp, truncate};
use crate::workflow::{self, StatusAction};

enum Board {
    Candidate {
        dashboard: CandidateDashboard,
        matched: Option<MatchView>,
    },
    Recruiter {
        dashboard: RecruiterDashboard,
        detail: Option<Detail>,
    },
}

/// What the recruiter's right panel shows for the selected posting.
enum Detail {
    Applicants { view: ApplicantsView, selected: usize },
    Insights(InsightsView),
}

struct AppState {
    board: Board,
    selected: usize,
    scroll_offset: u16,
    notice: Option<Notice>,
}

impl AppState {
    fn new(board: Board) -> Self {
        Self {
            board,
            selected: 0,
            scroll_offset: 0,
            notice: None,
        }
    }

    fn len(&self) -> usize {
        match &self.board {
            Board::Candidate { dashboard, .. } => dashboard.jobs.ready().map_or(0, Vec::len),
            Board::Recruiter { dashboard, .. } => dashboard.jobs.ready().map_or(0, Vec::len),
        }
    }

    /// Returns false when there was nothing to close.
    fn close_detail(&mut self) -> bool {
        if let Board::Recruiter { detail, .. } = &mut self.board {
            if detail.take().is_some() {
                self.scroll_offset = 0;
                return true;
            }
        }
        false
    }

    fn next(&mut self) {
        if let Board::Recruiter {
            detail: Some(Detail::Applicants { view, selected }),
            ..
        } = &mut self.board
        {
            if *selected + 1 < view.applicants.len() {
                *selected += 1;
            }
            return;
        }
        if self.selected + 1 < self.len() {
            self.close_detail();
            self.selected += 1;
            self.scroll_offset = 0;
        }
    }

    fn prev(&mut self) {
        if let Board::Recruiter {
            detail: Some(Detail::Applicants { selected, .. }),
            ..
        } = &mut self.board
        {
            *selected = selected.saturating_sub(1);
            return;
        }
        if self.selected > 0 {
            self.close_detail();
            self.selected -= 1;
            self.scroll_offset = 0;
        }
    }

    fn scroll_down(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_add(3);
    }

    fn scroll_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(3);
    }

    fn reload<B: HttpBackend>(
        &mut self,
        runtime: &Runtime,
        client: &ApiClient<B>,
        session: &SessionContext,
    ) -> ClientResult<()> {
        match &mut self.board {
            Board::Candidate { dashboard, matched } => {
                let loaded = runtime.block_on(candidate::load(client, session));
                if let Some(fresh) = settle(&mut self.notice, loaded)? {
                    *dashboard = fresh;
                    *matched = None;
                }
            }
            Board::Recruiter { dashboard, detail } => {
                let loaded = runtime.block_on(recruiter::load(client, session));
                if let Some(fresh) = settle(&mut self.notice, loaded)? {
                    *dashboard = fresh;
                    *detail = None;
                }
            }
        }
        self.selected = self.selected.min(self.len().saturating_sub(1));
        self.scroll_offset = 0;
        Ok(())
    }
}

/// Ordinary failures become the status-line notice and the board keeps
/// running; an expired session ends it.
fn settle<T>(notice: &mut Option<Notice>, result: ClientResult<T>) -> ClientResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_entry_point() => Err(e),
        Err(e) => {
            *notice = Some(Notice::from_error(&e));
            Ok(None)
        }
    }
}

pub fn run_browse<B: HttpBackend>(
    runtime: &Runtime,
    client: &ApiClient<B>,
    session: &SessionContext,
    view: DashboardView,
) -> Result<()> {
    let board = match view {
        DashboardView::Candidate => Board::Candidate {
            dashboard: runtime.block_on(candidate::load(client, session))?,
            matched: None,
        },
        DashboardView::Recruiter => Board::Recruiter {
            dashboard: runtime.block_on(recruiter::load(client, session))?,
            detail: None,
        },
        DashboardView::Unauthenticated => return Err(ClientError::Unauthenticated.into()),
    };
    let mut state = AppState::new(board);

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = run_loop(&mut terminal, &mut state, runtime, client, session);

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

fn run_loop<B: HttpBackend>(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    state: &mut AppState,
    runtime: &Runtime,
    client: &ApiClient<B>,
    session: &SessionContext,
) -> Result<()> {
    let mut list_state = ListState::default();
    list_state.select(Some(0));

    loop {
        terminal.draw(|frame| draw(frame, state, &mut list_state))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            state.notice = None;
            if handle_key(key.code, state, runtime, client, session)? {
                break;
            }
            list_state.select(Some(state.selected));
        }
    }
    Ok(())
}

/// Returns true when the board should close.
fn handle_key<B: HttpBackend>(
    code: KeyCode,
    state: &mut AppState,
    runtime: &Runtime,
    client: &ApiClient<B>,
    session: &SessionContext,
) -> ClientResult<bool> {
    match code {
        KeyCode::Char('q') => return Ok(true),
        KeyCode::Esc => {
            if !state.close_detail() {
                return Ok(true);
            }
        }
        KeyCode::Down | KeyCode::Char('j') => state.next(),
        KeyCode::Up | KeyCode::Char('k') => state.prev(),
        KeyCode::Char('J') | KeyCode::PageDown => state.scroll_down(),
        KeyCode::Char('K') | KeyCode::PageUp => state.scroll_up(),
        KeyCode::Char('r') => state.reload(runtime, client, session)?,
        code if matches!(state.board, Board::Candidate { .. }) => {
            candidate_key(code, state, runtime, client, session)?
        }
        code => recruiter_key(code, state, runtime, client, session)?,
    }
    Ok(false)
}

fn candidate_key<B: HttpBackend>(
    code: KeyCode,
    state: &mut AppState,
    runtime: &Runtime,
    client: &ApiClient<B>,
    session: &SessionContext,
) -> ClientResult<()> {
    let Board::Candidate { dashboard, matched } = &mut state.board else {
        return Ok(());
    };
    let Some(card) = dashboard.jobs.ready().and_then(|cards| cards.get(state.selected)) else {
        return Ok(());
    };
    let job_id = card.id;
    let locked = match &card.apply {
        ApplyControl::Locked { label, .. } => Some(label.clone()),
        ApplyControl::Open => None,
    };

    match code {
        KeyCode::Char('a') => {
            if let Some(label) = locked {
                state.notice = Some(Notice::info(format!("Already applied ({})", label)));
                return Ok(());
            }
            let result = runtime.block_on(candidate::apply(client, session, job_id));
            if let Some(outcome) = settle(&mut state.notice, result)? {
                state.notice = Some(outcome.notice);
                if let Some(fresh) = outcome.refreshed {
                    *dashboard = fresh;
                }
            }
        }
        KeyCode::Char('m') => {
            let result = runtime.block_on(candidate::show_match(client, session, job_id));
            if let Some(view) = settle(&mut state.notice, result)? {
                *matched = Some(view);
            }
        }
        _ => {}
    }
    Ok(())
}

fn recruiter_key<B: HttpBackend>(
    code: KeyCode,
    state: &mut AppState,
    runtime: &Runtime,
    client: &ApiClient<B>,
    session: &SessionContext,
) -> ClientResult<()> {
    let Board::Recruiter { dashboard, detail } = &mut state.board else {
        return Ok(());
    };
    let Some(job_id) = dashboard
        .jobs
        .ready()
        .and_then(|cards| cards.get(state.selected))
        .map(|card| card.id)
    else {
        return Ok(());
    };

    match code {
        KeyCode::Enter => {
            let result = runtime.block_on(recruiter::view_applicants(client, session, job_id));
            if let Some(view) = settle(&mut state.notice, result)? {
                *detail = Some(Detail::Applicants { view, selected: 0 });
                state.scroll_offset = 0;
            }
        }
        KeyCode::Char('i') => {
            if matches!(detail, Some(Detail::Insights(_))) {
                *detail = None;
                return Ok(());
            }
            let result = runtime.block_on(recruiter::view_insights(client, session, job_id));
            if let Some(view) = settle(&mut state.notice, result)? {
                *detail = Some(Detail::Insights(view));
                state.scroll_offset = 0;
            }
        }
        KeyCode::Char(c @ ('s' | 'v' | 'x')) => {
            let Some(Detail::Applicants { view, selected }) = detail else {
                state.notice = Some(Notice::info("Open the applicants list first (Enter)"));
                return Ok(());
            };
            let Some(row) = view.applicants.get(*selected) else {
                return Ok(());
            };
            let action = match c {
                's' => StatusAction::Shortlist,
                'v' => StatusAction::Interview,
                _ => StatusAction::Reject,
            };
            let (application_id, current) = (row.application_id, row.status.clone());

            let result = runtime.block_on(workflow::update_status(
                client,
                session,
                application_id,
                Some(&current),
                action,
            ));
            if let Some(notice) = settle(&mut state.notice, result)? {
                // The list is not refreshed; reopening it shows the new status.
                state.notice = Some(notice);
                *detail = None;
                state.scroll_offset = 0;
            }
        }
        _ => {}
    }
    Ok(())
}

fn paint(tone: view::Color) -> Color {
    let (r, g, b) = tone.rgb();
    Color::Rgb(r, g, b)
}

fn bold(text: impl Into<String>) -> Line<'static> {
    Line::from(Span::styled(text.into(), Style::default().add_modifier(Modifier::BOLD)))
}

fn dim(text: impl Into<String>) -> Line<'static> {
    Line::from(Span::styled(text.into(), Style::default().fg(Color::DarkGray)))
}

fn failure(text: &str) -> Line<'static> {
    Line::from(Span::styled(text.to_string(), Style::default().fg(Color::Red)))
}

fn wrapped(lines: &mut Vec<Line<'static>>, text: &str, indent: &str) {
    for line in textwrap::fill(text, 70).lines() {
        lines.push(Line::from(format!("{}{}", indent, line)));
    }
}

fn draw(frame: &mut Frame, state: &AppState, list_state: &mut ListState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1), Constraint::Length(1)])
        .split(frame.area());

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(35),
            Constraint::Percentage(65),
        ])
        .split(rows[0]);

    // Left panel: jobs or postings
    let (title, items) = list_items(state);
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, chunks[0], list_state);

    // Right panel: detail
    let detail_widget = Paragraph::new(build_detail(state))
        .block(Block::default().borders(Borders::ALL).title(" Detail "))
        .wrap(Wrap { trim: false })
        .scroll((state.scroll_offset, 0));

    frame.render_widget(detail_widget, chunks[1]);

    if let Some(notice) = &state.notice {
        let color = match notice.level {
            NoticeLevel::Info => Color::Cyan,
            NoticeLevel::Success => Color::Green,
            NoticeLevel::Error => Color::Red,
        };
        let line = Paragraph::new(format!(" {}", notice.message)).style(Style::default().fg(color));
        frame.render_widget(line, rows[1]);
    }

    let help = Paragraph::new(help_text(state)).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, rows[2]);
}

fn help_text(state: &AppState) -> &'static str {
    match &state.board {
        Board::Candidate { .. } => " j/k:navigate  J/K:scroll  a:apply m:match r:reload  q:quit",
        Board::Recruiter { detail: Some(Detail::Applicants { .. }), .. } => {
            " j/k:applicant  s:shortlist v:interview x:reject  i:insights  esc:back  q:quit"
        }
        Board::Recruiter { .. } => {
            " j/k:navigate  J/K:scroll  enter:applicants i:insights r:reload  q:quit"
        }
    }
}

fn list_items(state: &AppState) -> (String, Vec<ListItem<'static>>) {
    match &state.board {
        Board::Candidate { dashboard, .. } => {
            let cards = dashboard.jobs.ready().map(Vec::as_slice).unwrap_or_default();
            let items = cards
                .iter()
                .map(|card| {
                    let text = format!("#{:<4} {}", card.id, truncate(&card.title, 35));
                    match &card.apply {
                        ApplyControl::Open => ListItem::new(text),
                        ApplyControl::Locked { color, .. } => {
                            ListItem::new(text).style(Style::default().fg(paint(*color)))
                        }
                    }
                })
                .collect();
            (format!(" Jobs ({}) ", cards.len()), items)
        }
        Board::Recruiter { dashboard, .. } => {
            let cards = dashboard.jobs.ready().map(Vec::as_slice).unwrap_or_default();
            let items = cards
                .iter()
                .map(|card| ListItem::new(format!("#{:<4} {}", card.id, truncate(&card.title, 35))))
                .collect();
            (format!(" My Job Postings ({}) ", cards.len()), items)
        }
    }
}

fn build_detail(state: &AppState) -> Text<'static> {
    match &state.board {
        Board::Candidate { dashboard, matched } => {
            candidate_detail(dashboard, matched.as_ref(), state.selected)
        }
        Board::Recruiter { dashboard, detail } => match detail {
            Some(Detail::Applicants { view, selected }) => applicants_detail(view, *selected),
            Some(Detail::Insights(view)) => insights_detail(view),
            None => posting_detail(dashboard, state.selected),
        },
    }
}

fn candidate_detail(
    dashboard: &CandidateDashboard,
    matched: Option<&MatchView>,
    selected: usize,
) -> Text<'static> {
    let mut lines: Vec<Line> = Vec::new();

    match &dashboard.jobs {
        Section::Failed(message) => lines.push(failure(message)),
        Section::Ready(cards) if cards.is_empty() => lines.push(dim("No jobs found.")),
        Section::Ready(cards) => {
            if let Some(card) = cards.get(selected) {
                lines.push(bold(card.title.clone()));
                match &card.apply {
                    ApplyControl::Open => lines.push(Line::from("[a] Apply")),
                    ApplyControl::Locked { label, color } => lines.push(Line::from(Span::styled(
                        format!("Applied: {}", label),
                        Style::default().fg(paint(*color)),
                    ))),
                }
                lines.push(Line::from(""));
                wrapped(&mut lines, &card.description, "");
                lines.push(Line::from(""));

                if let Some(view) = matched.filter(|m| m.job_id == card.id) {
                    lines.push(Line::from(Span::styled(
                        format!("Match Score: {}%", fmt_score(view.score)),
                        Style::default().fg(paint(view.color)).add_modifier(Modifier::BOLD),
                    )));
                    if view.missing_keywords.is_empty() {
                        lines.push(Line::from("Missing Skills: None! Great match."));
                    } else {
                        let missing = chips(&view.missing_keywords);
                        lines.push(Line::from(format!("Missing Skills: {}", missing)));
                    }
                    lines.push(Line::from(""));
                }
            }
        }
    }

    lines.push(bold("RESUME"));
    match &dashboard.resume {
        Section::Ready(Some(resume)) => {
            let mut header = format!("  Resume uploaded (ID: {})", resume.id);
            if let Some(at) = &resume.uploaded_at {
                header.push_str(&format!(", {}", fmt_timestamp(at)));
            }
            lines.push(Line::from(header));
            if let Some(content) = dashboard.resume_content() {
                wrapped(&mut lines, &truncate(content, 280), "  ");
            }
        }
        Section::Ready(None) => {
            lines.push(dim("  No resume yet. Run: tracker resume submit <file>"))
        }
        Section::Failed(message) => lines.push(failure(message)),
    }
    lines.push(Line::from(""));

    lines.push(bold("MY APPLICATIONS"));
    match &dashboard.applications {
        Section::Ready(rows) if rows.is_empty() => lines.push(dim("  No applications yet.")),
        Section::Ready(rows) => {
            for row in rows {
                let mut spans = vec![
                    Span::raw(format!("  {} ", row.title)),
                    Span::styled(
                        row.status.as_str().to_uppercase(),
                        Style::default().fg(paint(view::status_color(&row.status))),
                    ),
                ];
                if let Some(score) = row.match_score.filter(|s| *s != 0.0) {
                    spans.push(Span::raw(format!("  {}% Match", fmt_score(score))));
                }
                lines.push(Line::from(spans));
                if !row.missing_skills.is_empty() {
                    lines.push(dim(format!("    Missing: {}", chips(&row.missing_skills))));
                }
            }
        }
        Section::Failed(message) => lines.push(failure(message)),
    }

    Text::from(lines)
}

fn posting_detail(dashboard: &RecruiterDashboard, selected: usize) -> Text<'static> {
    let mut lines: Vec<Line> = Vec::new();
    match &dashboard.jobs {
        Section::Failed(message) => lines.push(failure(message)),
        Section::Ready(cards) if cards.is_empty() => {
            lines.push(dim("No jobs posted yet. Run: tracker post --title ... --description ..."))
        }
        Section::Ready(cards) => {
            if let Some(card) = cards.get(selected) {
                lines.push(bold(card.title.clone()));
                if let Some(at) = &card.posted_at {
                    lines.push(Line::from(format!("Posted {}", fmt_timestamp(at))));
                }
                lines.push(Line::from(""));
                wrapped(&mut lines, &card.summary, "");
                lines.push(Line::from(""));
                lines.push(dim("(enter: applicants  i: insights)"));
            }
        }
    }
    Text::from(lines)
}

fn applicants_detail(view: &ApplicantsView, selected: usize) -> Text<'static> {
    let mut lines: Vec<Line> = vec![
        bold(format!("Applicants for Job ID: {}", view.job_id)),
        Line::from(""),
    ];
    if view.applicants.is_empty() {
        lines.push(dim("No applicants yet."));
        return Text::from(lines);
    }

    for (i, row) in view.applicants.iter().enumerate() {
        let marker = if i == selected { "> " } else { "  " };
        let mut spans = vec![
            Span::raw(format!("{}{} ", marker, row.candidate)),
            Span::styled(
                row.status.as_str().to_uppercase(),
                Style::default().fg(paint(row.status_color)),
            ),
        ];
        if let Some(score) = row.match_score.filter(|s| *s != 0.0) {
            spans.push(Span::raw(format!("  {}%", fmt_score(score))));
        }
        let line = Line::from(spans);
        lines.push(if i == selected { line.bold() } else { line });
        if !row.missing_skills.is_empty() {
            lines.push(dim(format!("    Missing: {}", chips(&row.missing_skills))));
        }
    }
    Text::from(lines)
}

fn insights_detail(view: &InsightsView) -> Text<'static> {
    let summary = &view.summary;
    let mut lines: Vec<Line> = vec![
        bold(format!("AI Insights for job #{}", view.job_id)),
        Line::from(""),
    ];

    lines.push(Line::from(format!("Applicants: {}", summary.count)));
    lines.push(Line::from(format!("Avg Match:  {:.1}%", summary.average)));
    lines.push(Line::from(format!("Top Match:  {}%", fmt_score(summary.max))));
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
    lines.push(Line::from(format!("Top Missing Skills: {}", top)));
    lines.push(Line::from(""));

    if view.rows.is_empty() {
        lines.push(dim("No match data available yet."));
        return Text::from(lines);
    }
    for row in &view.rows {
        lines.push(Line::from(vec![
            Span::raw(format!("{} ", row.candidate_email)),
            Span::styled(
                format!("{}%", fmt_score(row.score)),
                Style::default().fg(paint(row.color)),
            ),
        ]));
        let missing = if row.missing_skills.is_empty() {
            "None".to_string()
        } else {
            chips(&row.missing_skills)
        };
        lines.push(dim(format!("    Missing Skills: {}", missing)));
    }
    Text::from(lines)
}
