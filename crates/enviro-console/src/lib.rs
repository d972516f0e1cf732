//! Admin console for the environmental complaint API.
//!
//! Three surfaces share the same screen controllers: the interactive TUI
//! ([`operator_console`]), one-shot CLI commands rendered with [`report`],
//! and a local JSON dashboard ([`dashboard`]).

pub mod api;
pub mod config;
pub mod dashboard;
pub mod operator_console;
pub mod report;
pub mod view_slot;
pub mod views;

pub use api::{ApiClient, ApiError};
pub use config::{ConfigError, ConsoleConfig};
pub use view_slot::{MountToken, SlotSnapshot, ViewSlot};
pub use views::Screen;
