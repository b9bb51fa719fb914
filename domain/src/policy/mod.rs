//! Error policy domain: strategies and retry backoff schedules.

pub mod strategy;

pub use strategy::{Backoff, ErrorStrategy};
