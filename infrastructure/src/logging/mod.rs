//! Logging infrastructure — structured event logging.
//!
//! Provides [`JsonlEventSink`], a JSONL file writer that implements the
//! [`EventSink`](council_application::EventSink) port.

mod jsonl_event_sink;

pub use jsonl_event_sink::JsonlEventSink;
