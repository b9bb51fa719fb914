//! Prompt domain
//!
//! Templates for the prompts workers receive during debate and fan-out.

mod template;

pub use template::{PromptTemplate, REVISION_EXCERPT_LIMIT, VOTE_EXCERPT_LIMIT};
