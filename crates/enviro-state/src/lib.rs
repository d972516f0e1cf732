//! View logic for the enviro console.
//!
//! Everything here is pure: it takes collections already fetched from the
//! API and turns them into what a screen shows. No I/O, no shared state.

pub mod audit_diff;
pub mod display;
pub mod forms;
pub mod search;
pub mod status_summary;
pub mod tables;
pub mod xref;

pub use audit_diff::{diff_snapshots, render_payload, AuditView, DiffRow};
pub use forms::{ComplaintForm, FeedbackForm, Form, FormError, FormOutcome, UserForm};
pub use search::{filter, Searchable};
pub use status_summary::{percent_of, StatusCard, StatusSummary};
pub use tables::{visible_tables, TableView};
pub use xref::{resolve_label, Labeled};
