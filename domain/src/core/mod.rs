//! Core domain concepts shared across all subdomains.
//!
//! - [`error::ExecutionError`] — failures raised by workers, tools and steps
//! - [`string`] — UTF-8 safe truncation helpers

pub mod error;
pub mod string;
