mod api;
mod auth;
mod candidate;
mod error;
mod models;
mod recruiter;
mod render;
mod router;
mod session;
#[cfg(test)]
mod testing;
mod tui;
mod view;
mod workflow;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use tokio::runtime::Runtime;
use tracing_subscriber::{fmt, EnvFilter};

use api::{ApiClient, ReqwestBackend};
use error::ClientError;
use models::Role;
use render::Painter;
use router::DashboardView;
use session::{SessionContext, SessionStore};
use workflow::StatusAction;

#[derive(Parser)]
#[command(name = "tracker")]
#[command(about = "Applicant tracking client - resumes, job postings, matches and applications")]
struct Cli {
    /// Base URL of the tracker API
    #[arg(
        long,
        global = true,
        env = "TRACKER_API_URL",
        default_value = "http://localhost:8000"
    )]
    api_url: String,

    /// Where the login session is kept
    #[arg(long, global = true, env = "TRACKER_SESSION_FILE")]
    session_file: Option<PathBuf>,

    /// Log requests and orchestration steps to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,
    },

    /// Create an account and log straight in
    Signup {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,

        /// candidate or recruiter
        #[arg(short, long, default_value = "candidate")]
        role: String,
    },

    /// Forget the stored session
    Logout,

    /// Show who is logged in
    Whoami,

    /// Show the dashboard for your role
    Dashboard {
        /// Override the stored role
        #[arg(short, long)]
        role: Option<String>,
    },

    /// Interactive dashboard
    Browse {
        /// Override the stored role
        #[arg(short, long)]
        role: Option<String>,
    },

    /// Manage your resume (candidates)
    Resume {
        #[command(subcommand)]
        command: ResumeCommands,
    },

    /// Score your resume against a job (candidates)
    Match {
        job_id: i64,
    },

    /// Apply to a job (candidates)
    Apply {
        job_id: i64,
    },

    /// Post a job (recruiters)
    Post {
        #[arg(short, long)]
        title: String,

        #[arg(short, long)]
        description: String,

        /// Comma separated, appended to the description
        #[arg(short, long)]
        skills: Option<String>,
    },

    /// List applicants for one of your jobs (recruiters)
    Applicants {
        job_id: i64,
    },

    /// Match statistics for one of your jobs (recruiters)
    Insights {
        job_id: i64,
    },

    /// Set an application's status: shortlisted, interview or rejected (recruiters)
    Status {
        application_id: i64,
        status: String,
    },
}

#[derive(Subcommand)]
enum ResumeCommands {
    /// Show your current resume
    Show,

    /// Submit a new resume from a text file
    Submit {
        file: PathBuf,
    },
}

/// Logs go to stderr so rendered dashboards on stdout stay clean.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .with_writer(io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    let store = match &cli.session_file {
        Some(path) => SessionStore::at(path),
        None => SessionStore::open_default(),
    };
    let session = SessionContext::load(store)?;
    let client = ApiClient::new(ReqwestBackend::new()?, cli.api_url.as_str());

    match run(cli.command, &runtime, &client, &session) {
        // Session expiry and missing login send the user back to the entry point.
        Err(e)
            if e.downcast_ref::<ClientError>()
                .is_some_and(ClientError::is_entry_point) =>
        {
            eprintln!("{}", e);
            std::process::exit(1);
        }
        other => other,
    }
}

fn run(
    command: Commands,
    runtime: &Runtime,
    client: &ApiClient,
    session: &SessionContext,
) -> Result<()> {
    let painter = Painter::for_stdout();
    match command {
        Commands::Login { email, password } => {
            let nav = runtime.block_on(auth::login(client, session, &email, &password))?;
            println!("Logged in as {}", email);
            println!("Dashboard: {}", nav.url());
        }

        Commands::Signup { email, password, role } => {
            let role = Role::parse(&role)
                .ok_or_else(|| anyhow!("Invalid role '{}'. Must be candidate or recruiter", role))?;
            let nav = runtime.block_on(auth::signup(
                client,
                session,
                &email,
                &password,
                role.as_str(),
            ))?;
            println!("Account created for {}", email);
            println!("Dashboard: {}", nav.url());
        }

        Commands::Logout => {
            let nav = auth::logout(session)?;
            println!("Logged out. Back to {}", nav.url());
        }

        Commands::Whoami => {
            let current = session.snapshot();
            if !current.is_authenticated() {
                println!("Not logged in.");
            } else {
                println!("Email: {}", current.email.as_deref().unwrap_or("?"));
                println!("Role: {}", current.role.as_deref().unwrap_or("?"));
                if let Some(id) = current.last_resume_id {
                    println!("Current resume: {}", id);
                }
            }
            println!("Session file: {}", session.path().display());
        }

        Commands::Dashboard { role } => match router::route(role.as_deref(), &session.snapshot()) {
            DashboardView::Candidate => {
                let dashboard = runtime.block_on(candidate::load(client, session))?;
                print!("{}", render::candidate(&dashboard, painter));
            }
            DashboardView::Recruiter => {
                let dashboard = runtime.block_on(recruiter::load(client, session))?;
                print!("{}", render::recruiter(&dashboard, painter));
            }
            DashboardView::Unauthenticated => return Err(ClientError::Unauthenticated.into()),
        },

        Commands::Browse { role } => {
            let view = router::route(role.as_deref(), &session.snapshot());
            tui::run_browse(runtime, client, session, view)?;
        }

        Commands::Resume { command } => {
            router::require(&session.snapshot(), Role::Candidate)?;
            match command {
                ResumeCommands::Show => {
                    let current =
                        runtime.block_on(candidate::remember_current_resume(client, session))?;
                    match current {
                        Some(resume) => {
                            println!("Resume uploaded (ID: {})", resume.id);
                            if let Some(at) = &resume.created_at {
                                println!("Uploaded: {}", view::fmt_timestamp(at));
                            }
                            println!("\n--- Content ---\n{}", resume.content);
                        }
                        None => println!("No resume uploaded yet."),
                    }
                }

                ResumeCommands::Submit { file } => {
                    let content = std::fs::read_to_string(&file).with_context(|| {
                        format!("Failed to read resume file: {}", file.display())
                    })?;
                    // Compared against what the server currently holds.
                    let original = runtime
                        .block_on(candidate::remember_current_resume(client, session))?
                        .map(|r| r.content);
                    let outcome = runtime.block_on(candidate::submit_resume(
                        client,
                        session,
                        &content,
                        original.as_deref(),
                    ))?;
                    println!("{}", render::notice(&outcome.notice, painter));
                    if let Some(dashboard) = outcome.refreshed {
                        print!("{}", render::candidate(&dashboard, painter));
                    }
                }
            }
        }

        Commands::Match { job_id } => {
            router::require(&session.snapshot(), Role::Candidate)?;
            if session.last_resume_id().is_none() {
                runtime.block_on(candidate::remember_current_resume(client, session))?;
            }
            let view = runtime.block_on(candidate::show_match(client, session, job_id))?;
            print!("{}", render::match_result(&view, painter));
        }

        Commands::Apply { job_id } => {
            router::require(&session.snapshot(), Role::Candidate)?;
            let outcome = runtime.block_on(candidate::apply(client, session, job_id))?;
            println!("{}", render::notice(&outcome.notice, painter));
            if let Some(dashboard) = outcome.refreshed {
                print!("{}", render::candidate(&dashboard, painter));
            }
        }

        Commands::Post { title, description, skills } => {
            router::require(&session.snapshot(), Role::Recruiter)?;
            let outcome = runtime.block_on(recruiter::post_job(
                client,
                session,
                &title,
                skills.as_deref().unwrap_or_default(),
                &description,
            ))?;
            println!("{}", render::notice(&outcome.notice, painter));
            if let Some(dashboard) = outcome.refreshed {
                print!("{}", render::recruiter(&dashboard, painter));
            }
        }

        Commands::Applicants { job_id } => {
            router::require(&session.snapshot(), Role::Recruiter)?;
            let view = runtime.block_on(recruiter::view_applicants(client, session, job_id))?;
            print!("{}", render::applicants(&view, painter));
        }

        Commands::Insights { job_id } => {
            router::require(&session.snapshot(), Role::Recruiter)?;
            let view = runtime.block_on(recruiter::view_insights(client, session, job_id))?;
            print!("{}", render::insights(&view, painter));
        }

        Commands::Status { application_id, status } => {
            router::require(&session.snapshot(), Role::Recruiter)?;
            let action = StatusAction::parse(&status)?;
            // The current status is not known from here; the server holds it.
            let notice = runtime.block_on(workflow::update_status(
                client,
                session,
                application_id,
                None,
                action,
            ))?;
            println!("{}", render::notice(&notice, painter));
        }
    }

    Ok(())
}
