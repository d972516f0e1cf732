//! enviro-console: admin console for the environmental complaint API.
//!
//! With no subcommand it opens the interactive TUI. Every screen is also
//! available as a one-shot command that prints a table (or JSON with
//! `--json`), and `serve` exposes the same screens over local HTTP.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use enviro_console::dashboard::Dashboard;
use enviro_console::operator_console::run_operator_console;
use enviro_console::report::{self, Tabular, MAX_CELL_WIDTH};
use enviro_console::views::{
    self, AdminView, AuditLogView, ComplaintListView, DatabaseView, FeedbackView, StatsView, UserListView,
};
use enviro_console::{ApiClient, ConsoleConfig};
use enviro_protocol::{ComplaintStatus, EntityId};
use enviro_state::{ComplaintForm, FeedbackForm, FormOutcome, UserForm};

#[derive(Parser, Debug)]
#[command(name = "enviro-console", version, about = "Admin console for the environmental complaint API")]
struct Cli {
    /// Config file (default: ~/.config/enviro-console/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// API base URL; overrides the config file and ENVIRO_API_URL.
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Print JSON instead of tables.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive TUI (the default).
    Console,
    /// Serve the screens as JSON over local HTTP.
    Serve {
        #[arg(long)]
        bind: Option<String>,
        #[arg(long)]
        web_root: Option<PathBuf>,
    },
    /// Complaints with the citizen who filed them.
    Complaints {
        #[arg(short, long, default_value = "")]
        query: String,
    },
    /// Complaint manager listing.
    Admin {
        #[arg(short, long, default_value = "")]
        query: String,
    },
    /// Complaint counts by status.
    Stats,
    /// Audit log, or one entry's changes with --id.
    Audit {
        #[arg(short, long, default_value = "")]
        query: String,
        #[arg(long)]
        id: Option<EntityId>,
    },
    /// Raw database tables (the audit table is hidden).
    Database {
        #[arg(long)]
        table: Option<String>,
    },
    /// Citizen feedback, or the form pickers with --choices.
    Feedback {
        #[arg(short, long, default_value = "")]
        query: String,
        #[arg(long)]
        choices: bool,
    },
    /// Registered users.
    Users {
        #[arg(short, long, default_value = "")]
        query: String,
    },
    /// File a complaint.
    RegisterComplaint {
        #[arg(long, default_value = "")]
        user_id: String,
        #[arg(long, default_value = "")]
        category: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        location: String,
    },
    /// Register a user.
    RegisterUser {
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long, default_value = "")]
        email: String,
        #[arg(long, default_value = "")]
        phone: String,
        #[arg(long, default_value = "citizen")]
        role: String,
        #[arg(long, default_value = "")]
        password: String,
    },
    /// Rate how a complaint was handled.
    SubmitFeedback {
        #[arg(long, default_value = "")]
        user_id: String,
        #[arg(long, default_value = "")]
        complaint_id: String,
        #[arg(long, default_value = "5")]
        rating: String,
        #[arg(long, default_value = "")]
        comments: String,
    },
    /// Change a complaint's status.
    SetStatus { id: EntityId, status: String },
    /// Delete a complaint.
    Delete {
        id: EntityId,
        /// Confirm the deletion.
        #[arg(long)]
        yes: bool,
    },
}

/// Log to stderr for one-shot commands; to a file while the TUI owns the terminal.
fn init_tracing(default_level: &str, to_file: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    if to_file {
        let path = ConsoleConfig::log_file_path();
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("opening log file {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}

fn emit<T: Serialize>(json: bool, value: &T, table: &Tabular) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        print!("{}", table.render_text(MAX_CELL_WIDTH));
    }
    Ok(())
}

fn fail_on(error: Option<String>) -> anyhow::Result<()> {
    match error {
        Some(e) => Err(anyhow!(e)),
        None => Ok(()),
    }
}

fn finish(json: bool, outcome: FormOutcome) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!("{}", outcome.message());
    }
    if !outcome.is_success() {
        bail!("{}", outcome.message());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = ConsoleConfig::load(cli.config.as_deref())?;
    config.apply_env();
    if let Some(url) = &cli.api_url {
        config.api_base_url = url.trim().to_string();
    }

    let command = cli.command.unwrap_or(Command::Console);
    init_tracing(&config.log_level, matches!(command, Command::Console))?;
    tracing::debug!(api = %config.api_base_url, "configuration loaded");

    let api = ApiClient::from_config(&config)?;
    let json = cli.json;

    match command {
        Command::Console => run_operator_console(api, config.stats_refresh()).await?,

        Command::Serve { bind, web_root } => {
            if let Some(bind) = bind {
                config.dashboard_bind = bind;
            }
            if web_root.is_some() {
                config.web_root = web_root;
            }
            Dashboard::new(&config, api).run().await?;
        }

        Command::Complaints { query } => {
            let view = ComplaintListView::mount(api);
            view.load().await;
            fail_on(view.complaints.snapshot().await.error)?;
            if let Some(e) = view.users.snapshot().await.error {
                tracing::warn!(error = %e, "citizen names unavailable");
            }
            let rows = view.rows(&query).await;
            emit(json, &rows, &report::complaints_table(&rows))?;
        }

        Command::Admin { query } => {
            let view = AdminView::mount(api);
            view.load().await;
            fail_on(view.complaints.snapshot().await.error)?;
            let rows = view.rows(&query).await;
            emit(json, &rows, &report::admin_table(&rows))?;
        }

        Command::Stats => {
            let view = StatsView::mount(api, config.stats_refresh());
            view.refresh().await;
            let snap = view.summary.snapshot().await;
            fail_on(snap.error)?;
            let summary = snap.data.unwrap_or_default();
            emit(json, &summary.cards(), &report::stats_table(&summary))?;
        }

        Command::Audit { query, id } => {
            let view = AuditLogView::mount(api);
            view.load().await;
            fail_on(view.records.snapshot().await.error)?;
            match id {
                Some(id) => {
                    let detail = view.detail(id).await.ok_or_else(|| anyhow!("no audit entry #{id}"))?;
                    if json {
                        println!("{}", serde_json::to_string_pretty(&detail)?);
                    } else {
                        print!("{}", report::audit_detail_text(&detail, MAX_CELL_WIDTH));
                    }
                }
                None => {
                    let rows = view.rows(&query).await;
                    emit(json, &rows, &report::audit_table(&rows))?;
                }
            }
        }

        Command::Database { table } => {
            let view = DatabaseView::mount(api);
            view.load().await;
            fail_on(view.tables.snapshot().await.error)?;
            let tables = view.tables.data_or_default().await;
            let selected: Vec<_> = match &table {
                Some(name) => tables.iter().filter(|t| t.name.eq_ignore_ascii_case(name)).collect(),
                None => tables.iter().collect(),
            };
            if selected.is_empty() {
                if let Some(name) = table {
                    bail!("no table '{name}'");
                }
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&selected)?);
            } else {
                for t in selected {
                    println!("{}", report::database_table(t).render_text(MAX_CELL_WIDTH));
                }
            }
        }

        Command::Feedback { query, choices } => {
            let view = FeedbackView::mount(api);
            view.load().await;
            if choices {
                let citizens = view.citizen_choices().await;
                let complaints = view.complaint_choices().await;
                emit(json, &citizens, &report::choices_table("Citizens", &citizens))?;
                emit(json, &complaints, &report::choices_table("Complaints", &complaints))?;
            } else {
                fail_on(view.feedback.snapshot().await.error)?;
                let entries = view.entries(&query).await;
                emit(json, &entries, &report::feedback_table(&entries))?;
            }
        }

        Command::Users { query } => {
            let view = UserListView::mount(api);
            view.load().await;
            fail_on(view.users.snapshot().await.error)?;
            let rows = view.rows(&query).await;
            emit(json, &rows, &report::users_table(&rows))?;
        }

        Command::RegisterComplaint {
            user_id,
            category,
            description,
            location,
        } => {
            let mut form = ComplaintForm {
                user_id,
                category,
                description,
                location,
            };
            finish(json, views::submit_complaint(&api, &mut form).await)?;
        }

        Command::RegisterUser {
            name,
            email,
            phone,
            role,
            password,
        } => {
            let mut form = UserForm {
                name,
                email,
                phone,
                role,
                password,
            };
            finish(json, views::submit_user(&api, &mut form).await)?;
        }

        Command::SubmitFeedback {
            user_id,
            complaint_id,
            rating,
            comments,
        } => {
            let mut form = FeedbackForm {
                user_id,
                complaint_id,
                comments,
                ..FeedbackForm::default()
            };
            if let Err(e) = form.set_rating(&rating) {
                return finish(json, FormOutcome::Rejected(e.to_string()));
            }
            finish(json, views::submit_feedback(&api, &mut form).await)?;
        }

        Command::SetStatus { id, status } => {
            let status = ComplaintStatus::parse(&status).ok_or_else(|| {
                anyhow!("unknown status '{status}' (expected Pending, In Progress, Resolved, Closed or Rejected)")
            })?;
            AdminView::mount(api).set_status(id, status).await?;
            println!("Complaint #{id} is now {status}.");
        }

        Command::Delete { id, yes } => {
            if !yes {
                bail!("refusing to delete complaint #{id} without --yes");
            }
            AdminView::mount(api).delete(id).await?;
            println!("Complaint #{id} deleted.");
        }
    }

    Ok(())
}
