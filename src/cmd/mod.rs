//! CLI command implementations.
//!
//! Each submodule owns one or more related `Commands` variants:
//!
//! | Module    | Commands handled                         |
//! |-----------|------------------------------------------|
//! | `run`     | `Start`, `Resume`                        |
//! | `session` | `Sessions`, `Status`, `Summary`, `Delete`|
//! | `project` | `Init`, `Forms`                          |

pub mod project;
pub mod run;
pub mod session;

pub use project::{cmd_forms, cmd_init};
pub use run::{cmd_resume, cmd_start};
pub use session::{cmd_delete, cmd_sessions, cmd_status, cmd_summary};
