//! Interactive admin console.
//!
//! A TUI with one screen per portal page. Tab cycles screens, plain text
//! typed into the input filters the current list as you type, and slash
//! commands change complaints, submit forms, or open audit details.
//!
//! Launch with `enviro-console console`.

use std::io::{self, Stdout};
use std::time::Duration;

use chrono::{DateTime, Utc};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Tabs, Wrap},
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use enviro_protocol::{ComplaintStatus, EntityId};
use enviro_state::{ComplaintForm, FeedbackForm, Form, FormError, FormOutcome, UserForm};

use crate::api::ApiClient;
use crate::report::{self, Tabular};
use crate::view_slot::SlotSnapshot;
use crate::views::{
    self, AdminView, AuditDetail, AuditLogView, ComplaintListView, DatabaseView, FeedbackView, Screen,
    StatsView, UserListView,
};

const MAX_MESSAGES: usize = 500;

/// Loading and error state merged across the slots of a screen.
#[derive(Debug, Clone, Default)]
struct SlotStatus {
    loading: bool,
    error: Option<String>,
    last_updated: Option<DateTime<Utc>>,
}

impl SlotStatus {
    fn of<T>(snap: &SlotSnapshot<T>) -> Self {
        Self {
            loading: snap.loading,
            error: snap.error.clone(),
            last_updated: snap.last_updated,
        }
    }

    fn merge(self, other: Self) -> Self {
        Self {
            loading: self.loading || other.loading,
            error: self.error.or(other.error),
            last_updated: self.last_updated.max(other.last_updated),
        }
    }
}

/// Snapshot of the current screen for rendering.
struct ConsoleSnapshot {
    table: Tabular,
    status: SlotStatus,
}

/// Result of a background request, delivered back to the event loop.
enum ConsoleEvent {
    Message(String, Color),
    Form(FormOutcome, SubmittedForm),
}

/// A form handed back after submission: cleared when accepted, as typed
/// otherwise.
enum SubmittedForm {
    Complaint(ComplaintForm),
    User(UserForm),
    Feedback(FeedbackForm),
}

/// Controller of the screen currently shown.
enum ActiveView {
    Dashboard,
    Complaints(ComplaintListView),
    Admin(AdminView),
    Stats(StatsView, JoinHandle<()>),
    Audit(AuditLogView),
    Database(DatabaseView),
    Feedback(FeedbackView),
    Users(UserListView),
}

impl ActiveView {
    /// Mount the controller for `screen` and start its initial fetch.
    fn mount(screen: Screen, api: &ApiClient, stats_refresh: Duration) -> Self {
        let api = api.clone();
        let view = match screen {
            Screen::Dashboard => Self::Dashboard,
            Screen::Complaints => Self::Complaints(ComplaintListView::mount(api)),
            Screen::Admin => Self::Admin(AdminView::mount(api)),
            Screen::Stats => {
                let stats = StatsView::mount(api, stats_refresh);
                let handle = stats.spawn_refresh();
                return Self::Stats(stats, handle);
            }
            Screen::Audit => Self::Audit(AuditLogView::mount(api)),
            Screen::Database => Self::Database(DatabaseView::mount(api)),
            Screen::Feedback => Self::Feedback(FeedbackView::mount(api)),
            Screen::Users => Self::Users(UserListView::mount(api)),
        };
        view.reload();
        view
    }

    fn screen(&self) -> Screen {
        match self {
            Self::Dashboard => Screen::Dashboard,
            Self::Complaints(_) => Screen::Complaints,
            Self::Admin(_) => Screen::Admin,
            Self::Stats(..) => Screen::Stats,
            Self::Audit(_) => Screen::Audit,
            Self::Database(_) => Screen::Database,
            Self::Feedback(_) => Screen::Feedback,
            Self::Users(_) => Screen::Users,
        }
    }

    /// Fetch again in the background. The UI keeps drawing meanwhile.
    fn reload(&self) {
        match self {
            Self::Dashboard => {}
            Self::Complaints(v) => {
                let v = v.clone();
                tokio::spawn(async move { v.load().await });
            }
            Self::Admin(v) => {
                let v = v.clone();
                tokio::spawn(async move { v.load().await });
            }
            Self::Stats(v, _) => {
                let v = v.clone();
                tokio::spawn(async move { v.refresh().await });
            }
            Self::Audit(v) => {
                let v = v.clone();
                tokio::spawn(async move { v.load().await });
            }
            Self::Database(v) => {
                let v = v.clone();
                tokio::spawn(async move { v.load().await });
            }
            Self::Feedback(v) => {
                let v = v.clone();
                tokio::spawn(async move { v.load().await });
            }
            Self::Users(v) => {
                let v = v.clone();
                tokio::spawn(async move { v.load().await });
            }
        }
    }

    fn unmount(&self) {
        match self {
            Self::Dashboard => {}
            Self::Complaints(v) => v.unmount(),
            Self::Admin(v) => v.unmount(),
            Self::Stats(v, handle) => {
                v.unmount();
                handle.abort();
            }
            Self::Audit(v) => v.unmount(),
            Self::Database(v) => v.unmount(),
            Self::Feedback(v) => v.unmount(),
            Self::Users(v) => v.unmount(),
        }
    }
}

/// The operator console TUI state.
struct OperatorConsole {
    api: ApiClient,
    stats_refresh: Duration,
    active: ActiveView,
    /// Live search filter for the current list.
    query: String,
    /// Complaint awaiting `/confirm`.
    pending_delete: Option<EntityId>,
    /// Audit entry opened with `/audit <id>`.
    audit_detail: Option<AuditDetail>,
    /// Table shown on the database screen.
    table_index: usize,
    complaint_form: ComplaintForm,
    user_form: UserForm,
    feedback_form: FeedbackForm,
    /// Current text in the input field.
    input: String,
    /// Cursor position within the input field, in characters.
    cursor_pos: usize,
    /// Command history for up/down arrow navigation.
    history: Vec<String>,
    history_pos: Option<usize>,
    /// First table row shown.
    table_scroll: usize,
    /// Messages displayed in the console output area.
    console_messages: Vec<(DateTime<Utc>, String, Color)>,
    events_tx: mpsc::UnboundedSender<ConsoleEvent>,
    events_rx: mpsc::UnboundedReceiver<ConsoleEvent>,
}

impl OperatorConsole {
    fn new(api: ApiClient, stats_refresh: Duration) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let mut console = Self {
            active: ActiveView::mount(Screen::Dashboard, &api, stats_refresh),
            api,
            stats_refresh,
            query: String::new(),
            pending_delete: None,
            audit_detail: None,
            table_index: 0,
            complaint_form: ComplaintForm::default(),
            user_form: UserForm::default(),
            feedback_form: FeedbackForm::default(),
            input: String::new(),
            cursor_pos: 0,
            history: Vec::new(),
            history_pos: None,
            table_scroll: 0,
            console_messages: Vec::new(),
            events_tx,
            events_rx,
        };
        console.add_message(
            "Enviro Admin Console ready. Tab switches screens; type to filter the current list.",
            Color::Cyan,
        );
        console.add_message("Commands: /help, /go <screen>, /refresh, /quit", Color::DarkGray);
        console
    }

    fn screen(&self) -> Screen {
        self.active.screen()
    }

    fn switch_to(&mut self, screen: Screen) {
        if screen == self.screen() {
            return;
        }
        self.active.unmount();
        self.active = ActiveView::mount(screen, &self.api, self.stats_refresh);
        self.query.clear();
        self.pending_delete = None;
        self.audit_detail = None;
        self.table_index = 0;
        self.table_scroll = 0;
        tracing::debug!(screen = screen.name(), "switched screen");
    }

    /// Take a snapshot of the current screen for rendering.
    async fn snapshot(&self) -> ConsoleSnapshot {
        let q = self.query.as_str();
        let (table, status) = match &self.active {
            ActiveView::Dashboard => (report::screens_table(), SlotStatus::default()),
            ActiveView::Complaints(v) => {
                let status = SlotStatus::of(&v.complaints.snapshot().await)
                    .merge(SlotStatus::of(&v.users.snapshot().await));
                (report::complaints_table(&v.rows(q).await), status)
            }
            ActiveView::Admin(v) => {
                let status = SlotStatus::of(&v.complaints.snapshot().await);
                (report::admin_table(&v.rows(q).await), status)
            }
            ActiveView::Stats(v, _) => {
                let snap = v.summary.snapshot().await;
                let summary = snap.data.clone().unwrap_or_default();
                (report::stats_table(&summary), SlotStatus::of(&snap))
            }
            ActiveView::Audit(v) => {
                let status = SlotStatus::of(&v.records.snapshot().await);
                (report::audit_table(&v.rows(q).await), status)
            }
            ActiveView::Database(v) => {
                let snap = v.tables.snapshot().await;
                let tables = snap.data.clone().unwrap_or_default();
                let table = match tables.get(self.table_index) {
                    Some(t) => {
                        let mut tab = report::database_table(t);
                        tab.title = format!("Table {}/{}: {}", self.table_index + 1, tables.len(), tab.title);
                        tab
                    }
                    None => Tabular::new("Database Viewer", &[]).with_empty_message("No tables."),
                };
                (table, SlotStatus::of(&snap))
            }
            ActiveView::Feedback(v) => {
                let status = SlotStatus::of(&v.feedback.snapshot().await)
                    .merge(SlotStatus::of(&v.users.snapshot().await))
                    .merge(SlotStatus::of(&v.complaints.snapshot().await));
                (report::feedback_table(&v.entries(q).await), status)
            }
            ActiveView::Users(v) => {
                let status = SlotStatus::of(&v.users.snapshot().await);
                (report::users_table(&v.rows(q).await), status)
            }
        };
        ConsoleSnapshot { table, status }
    }

    /// Process the current input (called on Enter).
    async fn process_input(&mut self) {
        let input = self.input.trim().to_string();
        if input.is_empty() {
            return;
        }

        self.history.push(input.clone());
        self.history_pos = None;

        if input.starts_with('/') {
            self.process_command(&input).await;
        } else {
            self.query = input;
        }

        self.input.clear();
        self.cursor_pos = 0;
    }

    /// Process a slash command.
    async fn process_command(&mut self, cmd: &str) {
        let (command, args) = match cmd.split_once(' ') {
            Some((c, a)) => (c, a.trim()),
            None => (cmd, ""),
        };

        match command {
            "/help" => self.show_help(),
            "/go" => match Screen::parse(args) {
                Some(screen) => self.switch_to(screen),
                None => self.add_message(
                    &format!(
                        "Unknown screen '{args}'. Screens: {}",
                        Screen::ALL.iter().map(|s| s.name()).collect::<Vec<_>>().join(", ")
                    ),
                    Color::Yellow,
                ),
            },
            "/refresh" => {
                self.active.reload();
                self.add_message("Refreshing...", Color::DarkGray);
            }
            "/search" => {
                self.query = args.to_string();
                self.table_scroll = 0;
            }
            "/status" => self.cmd_status(args),
            "/delete" => self.cmd_delete(args),
            "/confirm" => self.cmd_confirm(),
            "/cancel" => {
                if self.pending_delete.take().is_some() {
                    self.add_message("Delete cancelled.", Color::DarkGray);
                }
            }
            "/audit" => self.cmd_audit(args).await,
            "/close" => self.audit_detail = None,
            "/table" => self.cmd_table(args).await,
            "/complaint" => self.cmd_complaint(args),
            "/user" => self.cmd_user(args),
            "/feedback" => self.cmd_feedback(args),
            "/citizens" => self.cmd_choices(true),
            "/choices" => self.cmd_choices(false),
            _ => {
                self.add_message(
                    &format!("Unknown command: {command}. Type /help for available commands."),
                    Color::Red,
                );
            }
        }
    }

    fn show_help(&mut self) {
        self.add_message("Available commands:", Color::Cyan);
        for line in [
            "  <text>                 - Filter the current list",
            "  /go <screen>           - Open a screen (Tab / Shift+Tab also cycle)",
            "  /refresh               - Fetch the current screen again",
            "  /search [text]         - Set or clear the filter",
            "  /status <id> <status>  - Change a complaint's status (admin)",
            "  /delete <id>           - Delete a complaint (admin), then /confirm or /cancel",
            "  /audit <id>            - Show an audit entry's changes (audit); /close hides it",
            "  /table <n|name>        - Pick the table shown (database)",
            "  /complaint user_id | category | description | location",
            "  /user name | email | phone | role | password",
            "  /feedback user_id | complaint_id | rating | comments",
            "  /citizens, /choices    - List citizens / complaints to pick from",
            "  /quit                  - Exit the console",
        ] {
            self.add_message(line, Color::White);
        }
    }

    fn cmd_status(&mut self, args: &str) {
        let ActiveView::Admin(admin) = &self.active else {
            self.add_message("Status changes happen on the admin screen (/go admin).", Color::Yellow);
            return;
        };
        let admin = admin.clone();
        let Some((id, label)) = args.split_once(' ') else {
            self.add_message("Usage: /status <id> <Pending|In Progress|Resolved|Closed|Rejected>", Color::Yellow);
            return;
        };
        let Ok(id) = id.trim().parse::<EntityId>() else {
            self.add_message(&format!("Not a complaint id: {id}"), Color::Yellow);
            return;
        };
        let Some(status) = ComplaintStatus::parse(label) else {
            self.add_message(&format!("Unknown status: {}", label.trim()), Color::Yellow);
            return;
        };
        self.add_message(&format!("Updating complaint #{id}..."), Color::DarkGray);
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let event = match admin.set_status(id, status).await {
                Ok(()) => ConsoleEvent::Message(format!("Complaint #{id} is now {status}."), Color::Green),
                Err(e) => ConsoleEvent::Message(e.to_string(), Color::Red),
            };
            let _ = events.send(event);
        });
    }

    fn cmd_delete(&mut self, args: &str) {
        if !matches!(self.active, ActiveView::Admin(_)) {
            self.add_message("Deletion happens on the admin screen (/go admin).", Color::Yellow);
            return;
        }
        match args.parse::<EntityId>() {
            Ok(id) => {
                self.pending_delete = Some(id);
                self.add_message(
                    &format!("Are you sure you want to delete complaint #{id}? /confirm or /cancel"),
                    Color::Yellow,
                );
            }
            Err(_) => self.add_message("Usage: /delete <id>", Color::Yellow),
        }
    }

    fn cmd_confirm(&mut self) {
        let Some(id) = self.pending_delete.take() else {
            self.add_message("Nothing to confirm.", Color::DarkGray);
            return;
        };
        let ActiveView::Admin(admin) = &self.active else {
            return;
        };
        let admin = admin.clone();
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let event = match admin.delete(id).await {
                Ok(()) => ConsoleEvent::Message(format!("Complaint #{id} deleted."), Color::Green),
                Err(e) => ConsoleEvent::Message(e.to_string(), Color::Red),
            };
            let _ = events.send(event);
        });
    }

    async fn cmd_audit(&mut self, args: &str) {
        let ActiveView::Audit(audit) = &self.active else {
            self.add_message("Audit details live on the audit screen (/go audit).", Color::Yellow);
            return;
        };
        let audit = audit.clone();
        let Ok(id) = args.parse::<EntityId>() else {
            self.add_message("Usage: /audit <id>", Color::Yellow);
            return;
        };
        match audit.detail(id).await {
            Some(detail) => self.audit_detail = Some(detail),
            None => self.add_message(&format!("No audit entry #{id}."), Color::Yellow),
        }
    }

    async fn cmd_table(&mut self, args: &str) {
        let ActiveView::Database(db) = &self.active else {
            self.add_message("Tables live on the database screen (/go database).", Color::Yellow);
            return;
        };
        let tables = db.tables.data_or_default().await;
        let index = match args.parse::<usize>() {
            Ok(n) if n >= 1 && n <= tables.len() => Some(n - 1),
            _ => tables.iter().position(|t| t.name.eq_ignore_ascii_case(args)),
        };
        match index {
            Some(i) => {
                self.table_index = i;
                self.table_scroll = 0;
            }
            None => {
                let names: Vec<&str> = tables.iter().map(|t| t.name.as_str()).collect();
                self.add_message(&format!("No table '{args}'. Tables: {}", names.join(", ")), Color::Yellow);
            }
        }
    }

    fn cmd_complaint(&mut self, args: &str) {
        let f = split_fields(args);
        self.complaint_form = ComplaintForm {
            user_id: field(&f, 0),
            category: field(&f, 1),
            description: field(&f, 2),
            location: field(&f, 3),
        };
        if self.reject_invalid(self.complaint_form.validate()) {
            return;
        }
        let mut form = std::mem::take(&mut self.complaint_form);
        let api = self.api.clone();
        self.submit_in_background(async move {
            let outcome = views::submit_complaint(&api, &mut form).await;
            ConsoleEvent::Form(outcome, SubmittedForm::Complaint(form))
        });
    }

    fn cmd_user(&mut self, args: &str) {
        let f = split_fields(args);
        let role = field(&f, 3);
        self.user_form = UserForm {
            name: field(&f, 0),
            email: field(&f, 1),
            phone: field(&f, 2),
            role: if role.is_empty() { UserForm::default().role } else { role },
            password: field(&f, 4),
        };
        if self.reject_invalid(self.user_form.validate()) {
            return;
        }
        let mut form = std::mem::take(&mut self.user_form);
        let api = self.api.clone();
        self.submit_in_background(async move {
            let outcome = views::submit_user(&api, &mut form).await;
            ConsoleEvent::Form(outcome, SubmittedForm::User(form))
        });
    }

    fn cmd_feedback(&mut self, args: &str) {
        let f = split_fields(args);
        self.feedback_form = FeedbackForm {
            user_id: field(&f, 0),
            complaint_id: field(&f, 1),
            comments: field(&f, 3),
            ..FeedbackForm::default()
        };
        if let Err(e) = self.feedback_form.set_rating(&field(&f, 2)) {
            self.report_outcome(&FormOutcome::Rejected(e.to_string()));
            return;
        }
        if self.reject_invalid(self.feedback_form.validate()) {
            return;
        }
        let mut form = std::mem::take(&mut self.feedback_form);
        let api = self.api.clone();
        self.submit_in_background(async move {
            let outcome = views::submit_feedback(&api, &mut form).await;
            ConsoleEvent::Form(outcome, SubmittedForm::Feedback(form))
        });
    }

    /// Report a client-side rejection without touching the network.
    fn reject_invalid<T>(&mut self, validated: Result<T, FormError>) -> bool {
        match validated {
            Ok(_) => false,
            Err(e) => {
                self.report_outcome(&FormOutcome::Rejected(e.to_string()));
                true
            }
        }
    }

    fn submit_in_background<Fut>(&mut self, submit: Fut)
    where
        Fut: std::future::Future<Output = ConsoleEvent> + Send + 'static,
    {
        self.add_message("Submitting...", Color::DarkGray);
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let _ = events.send(submit.await);
        });
    }

    /// Apply results of background requests that finished since the last tick.
    fn drain_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply_event(event);
        }
    }

    fn apply_event(&mut self, event: ConsoleEvent) {
        match event {
            ConsoleEvent::Message(text, color) => {
                for line in text.lines() {
                    self.add_message(line, color);
                }
            }
            ConsoleEvent::Form(outcome, form) => {
                match form {
                    SubmittedForm::Complaint(f) => self.complaint_form = f,
                    SubmittedForm::User(f) => self.user_form = f,
                    SubmittedForm::Feedback(f) => self.feedback_form = f,
                }
                self.report_outcome(&outcome);
            }
        }
    }

    fn report_outcome(&mut self, outcome: &FormOutcome) {
        let color = match outcome {
            FormOutcome::Submitted(_) => Color::Green,
            FormOutcome::Rejected(_) => Color::Yellow,
            FormOutcome::Failed(_) => Color::Red,
        };
        self.add_message(outcome.message(), color);
        if outcome.is_success() {
            self.active.reload();
        }
    }

    /// List picker options, borrowing the feedback screen's data when open.
    fn cmd_choices(&mut self, citizens: bool) {
        let (view, temporary) = match &self.active {
            ActiveView::Feedback(v) => (v.clone(), false),
            _ => (FeedbackView::mount(self.api.clone()), true),
        };
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            if temporary {
                view.load().await;
            }
            let table = if citizens {
                report::choices_table("Citizens", &view.citizen_choices().await)
            } else {
                report::choices_table("Complaints", &view.complaint_choices().await)
            };
            if temporary {
                view.unmount();
            }
            let text = table.render_text(report::MAX_CELL_WIDTH);
            let _ = events.send(ConsoleEvent::Message(text, Color::White));
        });
    }

    fn add_message(&mut self, msg: &str, color: Color) {
        self.console_messages.push((Utc::now(), msg.to_string(), color));
        if self.console_messages.len() > MAX_MESSAGES {
            self.console_messages.remove(0);
        }
    }

    /// Render the full operator console layout.
    fn render(&self, frame: &mut Frame, snapshot: &ConsoleSnapshot) {
        let outer = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Status bar
                Constraint::Length(3), // Screen tabs
                Constraint::Min(8),    // Screen body
                Constraint::Length(8), // Console output
                Constraint::Length(5), // Input area
            ])
            .split(frame.area());

        self.render_status_bar(frame, outer[0], snapshot);
        self.render_tabs(frame, outer[1]);
        match &self.audit_detail {
            Some(detail) => self.render_audit_detail(frame, outer[2], detail),
            None => self.render_table(frame, outer[2], snapshot),
        }
        self.render_console_output(frame, outer[3]);
        self.render_input(frame, outer[4]);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect, snap: &ConsoleSnapshot) {
        let block = Block::default()
            .title(" Enviro Admin Console ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));

        let updated = snap
            .status
            .last_updated
            .map(|t| t.format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());
        let (state, state_color) = match (&snap.status.error, snap.status.loading) {
            (Some(e), _) => (e.clone(), Color::Red),
            (None, true) if self.screen() != Screen::Dashboard => ("Loading...".to_string(), Color::Yellow),
            _ => ("OK".to_string(), Color::Green),
        };

        let mut spans = vec![
            Span::styled("  API: ", Style::default().fg(Color::Gray)),
            Span::styled(self.api.base_url(), Style::default().fg(Color::White)),
            Span::styled("  |  Updated: ", Style::default().fg(Color::Gray)),
            Span::styled(updated, Style::default().fg(Color::Magenta)),
            Span::styled("  |  ", Style::default().fg(Color::Gray)),
            Span::styled(state, Style::default().fg(state_color)),
        ];
        if !self.query.is_empty() {
            spans.push(Span::styled("  |  Filter: ", Style::default().fg(Color::Gray)));
            spans.push(Span::styled(&self.query, Style::default().fg(Color::LightCyan)));
        }

        frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
    }

    fn render_tabs(&self, frame: &mut Frame, area: Rect) {
        let titles: Vec<Line> = Screen::ALL.iter().map(|s| Line::from(s.name())).collect();
        let selected = Screen::ALL.iter().position(|s| *s == self.screen()).unwrap_or(0);
        let tabs = Tabs::new(titles)
            .block(
                Block::default()
                    .title(format!(" {} ", self.screen().title()))
                    .borders(Borders::ALL),
            )
            .select(selected)
            .style(Style::default().fg(Color::Gray))
            .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
        frame.render_widget(tabs, area);
    }

    fn render_table(&self, frame: &mut Frame, area: Rect, snap: &ConsoleSnapshot) {
        let t = &snap.table;
        let block = Block::default()
            .title(format!(" {} ", t.title))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White));

        if t.is_empty() {
            let message = if snap.status.loading && self.screen() != Screen::Dashboard {
                "Loading..."
            } else {
                t.empty_message.as_str()
            };
            let text = Paragraph::new(Line::from(Span::styled(
                format!("  {message}"),
                Style::default().fg(Color::DarkGray),
            )))
            .block(block);
            frame.render_widget(text, area);
            return;
        }

        let status_col = t.header.iter().position(|h| h == "Status");
        let visible = area.height.saturating_sub(3) as usize;
        let start = self.table_scroll.min(t.rows.len().saturating_sub(visible.max(1)));

        let rows: Vec<Row> = t
            .rows
            .iter()
            .skip(start)
            .take(visible.max(1))
            .map(|row| {
                Row::new(row.iter().enumerate().map(|(i, cell)| {
                    let color = if Some(i) == status_col {
                        status_color(cell)
                    } else {
                        Color::White
                    };
                    Cell::from(Span::styled(cell.clone(), Style::default().fg(color)))
                }))
            })
            .collect();

        let widths: Vec<Constraint> = t
            .column_widths(32)
            .into_iter()
            .map(|w| Constraint::Length(w as u16))
            .collect();

        let table = Table::new(rows, widths).block(block).header(
            Row::new(t.header.clone()).style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD)),
        );
        frame.render_widget(table, area);
    }

    fn render_audit_detail(&self, frame: &mut Frame, area: Rect, detail: &AuditDetail) {
        let block = Block::default()
            .title(format!(" Audit Log Details #{} (/close) ", detail.row.audit_id))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::LightBlue));
        let lines: Vec<Line> = report::audit_detail_text(detail, 48)
            .lines()
            .map(|l| Line::from(l.to_string()))
            .collect();
        let paragraph = Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((self.table_scroll as u16, 0));
        frame.render_widget(paragraph, area);
    }

    fn render_console_output(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" Console Output ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White));

        let inner_height = area.height.saturating_sub(2) as usize;
        let start = self.console_messages.len().saturating_sub(inner_height);

        let lines: Vec<Line> = self.console_messages[start..]
            .iter()
            .map(|(ts, msg, color)| {
                Line::from(vec![
                    Span::styled(
                        format!("  [{}] ", ts.format("%H:%M:%S")),
                        Style::default().fg(Color::DarkGray),
                    ),
                    Span::styled(msg.as_str(), Style::default().fg(*color)),
                ])
            })
            .collect();

        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn render_input(&self, frame: &mut Frame, area: Rect) {
        let title = match self.pending_delete {
            Some(id) => format!(" Delete complaint #{id}? /confirm or /cancel "),
            None => " Command Input (text = filter, /help = commands, /quit = exit) ".to_string(),
        };
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green));

        let input_display = if self.input.is_empty() {
            Line::from(vec![
                Span::styled("  > ", Style::default().fg(Color::Green)),
                Span::styled("Type to filter or /command...", Style::default().fg(Color::DarkGray)),
            ])
        } else {
            Line::from(vec![
                Span::styled("  > ", Style::default().fg(Color::Green)),
                Span::styled(&self.input, Style::default().fg(Color::White)),
            ])
        };

        let hint_line = Line::from(Span::styled(
            "  Tab/Shift+Tab screens  |  PgUp/PgDn scroll  |  Esc clear  |  Ctrl+C exit",
            Style::default().fg(Color::DarkGray),
        ));

        frame.render_widget(
            Paragraph::new(vec![Line::from(""), input_display, hint_line]).block(block),
            area,
        );

        let cursor_x = area.x + 4 + self.cursor_pos as u16;
        frame.set_cursor_position((cursor_x, area.y + 2));
    }

    fn byte_index(&self) -> usize {
        self.input
            .char_indices()
            .nth(self.cursor_pos)
            .map(|(i, _)| i)
            .unwrap_or(self.input.len())
    }

    /// Plain text in the input is the live filter.
    fn sync_query(&mut self) {
        if !self.input.starts_with('/') {
            self.query = self.input.clone();
            self.table_scroll = 0;
        }
    }

    /// Handle keyboard input. Returns `true` if the console should exit.
    fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
        let input_len = self.input.chars().count();
        match (code, modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => return true,
            (KeyCode::Char(c), _) => {
                let at = self.byte_index();
                self.input.insert(at, c);
                self.cursor_pos += 1;
                self.sync_query();
            }
            (KeyCode::Backspace, _) => {
                if self.cursor_pos > 0 {
                    self.cursor_pos -= 1;
                    let at = self.byte_index();
                    self.input.remove(at);
                    self.sync_query();
                }
            }
            (KeyCode::Delete, _) => {
                if self.cursor_pos < input_len {
                    let at = self.byte_index();
                    self.input.remove(at);
                    self.sync_query();
                }
            }
            (KeyCode::Left, _) => self.cursor_pos = self.cursor_pos.saturating_sub(1),
            (KeyCode::Right, _) => self.cursor_pos = (self.cursor_pos + 1).min(input_len),
            (KeyCode::Home, _) => self.cursor_pos = 0,
            (KeyCode::End, _) => self.cursor_pos = input_len,
            (KeyCode::Tab, _) => self.switch_to(self.screen().next()),
            (KeyCode::BackTab, _) => self.switch_to(self.screen().previous()),
            (KeyCode::Esc, _) => {
                if self.audit_detail.take().is_none() && self.pending_delete.take().is_none() {
                    self.input.clear();
                    self.cursor_pos = 0;
                    self.query.clear();
                }
            }
            (KeyCode::Up, _) => {
                if !self.history.is_empty() {
                    let pos = match self.history_pos {
                        Some(p) if p > 0 => p - 1,
                        Some(p) => p,
                        None => self.history.len() - 1,
                    };
                    self.history_pos = Some(pos);
                    self.input = self.history[pos].clone();
                    self.cursor_pos = self.input.chars().count();
                }
            }
            (KeyCode::Down, _) => {
                if let Some(pos) = self.history_pos {
                    if pos + 1 < self.history.len() {
                        self.history_pos = Some(pos + 1);
                        self.input = self.history[pos + 1].clone();
                        self.cursor_pos = self.input.chars().count();
                    } else {
                        self.history_pos = None;
                        self.input.clear();
                        self.cursor_pos = 0;
                    }
                }
            }
            (KeyCode::PageUp, _) => self.table_scroll = self.table_scroll.saturating_sub(10),
            (KeyCode::PageDown, _) => self.table_scroll += 10,
            _ => {}
        }
        false
    }
}

/// Split `a | b | c` form arguments into trimmed fields.
fn split_fields(args: &str) -> Vec<String> {
    if args.trim().is_empty() {
        return Vec::new();
    }
    args.split('|').map(|f| f.trim().to_string()).collect()
}

fn field(fields: &[String], i: usize) -> String {
    fields.get(i).cloned().unwrap_or_default()
}

fn status_color(label: &str) -> Color {
    match ComplaintStatus::parse(label) {
        Some(ComplaintStatus::Pending) => Color::Yellow,
        Some(ComplaintStatus::InProgress) => Color::Blue,
        Some(ComplaintStatus::Resolved) => Color::Green,
        Some(ComplaintStatus::Closed) => Color::Gray,
        Some(ComplaintStatus::Rejected) => Color::Red,
        None => Color::White,
    }
}

fn setup_terminal() -> io::Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Terminal::new(CrosstermBackend::new(stdout))
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Run the console event loop until `/quit` or Ctrl+C.
pub async fn run_operator_console(api: ApiClient, stats_refresh: Duration) -> Result<(), anyhow::Error> {
    use std::io::IsTerminal;
    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        return Err(anyhow::anyhow!("Operator console requires a terminal (TTY)."));
    }

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let mut terminal = setup_terminal()?;
    let mut console = OperatorConsole::new(api, stats_refresh);
    let tick_rate = Duration::from_millis(100);

    loop {
        console.drain_events();
        let snapshot = console.snapshot().await;
        terminal.draw(|frame| console.render(frame, &snapshot))?;

        if event::poll(tick_rate)? {
            if let Event::Key(key_event) = event::read()? {
                if key_event.kind == KeyEventKind::Press {
                    if key_event.code == KeyCode::Enter {
                        let trimmed = console.input.trim();
                        if trimmed == "/quit" || trimmed == "/exit" || trimmed == "/q" {
                            break;
                        }
                        console.process_input().await;
                    } else if console.handle_key(key_event.code, key_event.modifiers) {
                        break;
                    }
                }
            }
        }
    }

    console.active.unmount();
    restore_terminal(&mut terminal)?;
    Ok(())
}
