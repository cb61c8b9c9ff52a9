//! Shared utilities for valuer
//!
//! Currently this is the tracing setup used by the command-line front end and
//! by anything else embedding the valuation crate.

pub mod logging;

pub use logging::{default_filter, init_tracing};
