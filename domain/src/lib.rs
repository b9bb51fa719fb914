//! Domain layer for council
//!
//! This crate contains the core rules of the council engine: values,
//! state and pure decision logic. It has no dependencies on async runtimes,
//! infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Execution context
//!
//! One [`ExecutionContext`] exists per council run. Steps read it, and the
//! step engine appends one [`StepResult`] per completed step.
//!
//! ## Error strategies
//!
//! Every step carries an [`ErrorStrategy`] (`Halt`, `Retry`, `Continue`,
//! `Fallback`) deciding what happens when its work fails.
//!
//! ## Debate and fan-out
//!
//! - **Debate**: workers propose, revise and vote; the [`VoteTally`] picks
//!   a winner deterministically.
//! - **Fan-out**: a [`TaskSplitter`] hands one subtask to each worker and
//!   the outputs are combined.

pub mod context;
pub mod core;
pub mod debate;
pub mod dispatch;
pub mod fan_out;
pub mod policy;
pub mod prompt;

// Re-export commonly used types
pub use context::{DEFAULT_PROMPT_CONTEXT_LIMIT, ExecutionContext, StepResult};
pub use core::error::ExecutionError;
pub use debate::{
    ParsedVote, Proposal, ProposalRound, Vote, VoteTally, VotingStrategy, parse_vote,
};
pub use dispatch::{WorkUnit, canonical_key, group_work_units};
pub use fan_out::{Subtask, TaskSplitter, concatenate_outputs};
pub use policy::{Backoff, ErrorStrategy};
pub use prompt::PromptTemplate;
