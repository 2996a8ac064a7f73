// src/lib.rs
// ────────────────────────────────────────────────────────────────────────────
// Public library entry point.  Re-export everything for both `main.rs` and
// integration tests.

#[macro_use]
pub mod macros;

pub mod cli;
pub mod comms;
pub mod config;
pub mod constants;
pub mod error;
pub mod protocol;
pub mod render;
pub mod scanner;
pub mod session;

pub use error::EcError;
pub use protocol::{EcProtocol, RegisterRead, RegisterSource, RegisterValue};
pub use session::Session;
