//! Progress display driven by lifecycle events

pub mod reporter;
