//! Client core of the Vanguard scan console.
//!
//! The [`core::registry`] describes which scanning tools exist and how they can be
//! configured; [`core::options`] turns a tool selection into a validated payload. The
//! [`orchestrator`] module owns the client-side scan and user collections and keeps them
//! in sync with the backend through the traits in [`api`]. [`session`] and
//! [`preferences`] hold the persisted login and UI settings.

pub mod api;
pub mod config;
pub mod core;
pub mod logging;
pub mod orchestrator;
pub mod preferences;
pub mod session;
pub mod storage;

pub use crate::api::client::ApiClient;
pub use crate::config::Config;
pub use crate::orchestrator::admin::{AdminOrchestrator, AdminState};
pub use crate::orchestrator::scans::{ScanOrchestrator, ScanState};
pub use crate::session::{AuthSession, SessionStore};
