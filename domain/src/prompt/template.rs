//! Prompt templates for debate and fan-out steps
//!
//! All templates are deterministic: the same inputs always render the same
//! text, so runs can be replayed against recorded workers.

use crate::core::string::truncate;
use crate::debate::{ProposalRound, VOTE_MARKER};

/// Character limit for a proposal quoted inside a revision prompt
pub const REVISION_EXCERPT_LIMIT: usize = 300;

/// Character limit for a proposal quoted inside a vote prompt
pub const VOTE_EXCERPT_LIMIT: usize = 200;

/// Templates for generating prompts at each stage
pub struct PromptTemplate;

impl PromptTemplate {
    /// Prompt sent to the moderator before the first debate round
    pub fn moderator_guidance(task: &str) -> String {
        format!(
            "Task: {}\n\nProvide guidance for agents working on this task.",
            task
        )
    }

    /// First-round proposal prompt
    pub fn proposal(task: &str, context: &str, guidance: Option<&str>) -> String {
        let mut prompt = format!("Task: {}", task);

        if let Some(guidance) = guidance.filter(|g| !g.trim().is_empty()) {
            prompt.push_str(&format!("\n\nModerator guidance: {}", guidance.trim()));
        }
        if !context.is_empty() {
            prompt.push_str("\n\n");
            prompt.push_str(context);
        }

        prompt.push_str("\n\nProvide your proposal.");
        prompt
    }

    /// Prompt for rounds after the first: the task plus the previous round
    pub fn revision(task: &str, round: usize, previous: &ProposalRound) -> String {
        let mut prompt = format!(
            "Debate Round {}\nOriginal Task: {}\n\nCurrent Proposals:\n",
            round, task
        );

        for proposal in &previous.proposals {
            prompt.push_str(&format!(
                "\n{}: {}\n",
                proposal.worker_id,
                truncate(&proposal.text, REVISION_EXCERPT_LIMIT)
            ));
        }

        prompt.push_str("\nProvide your updated proposal or critique others' proposals.");
        prompt
    }

    /// Vote prompt listing the final-round proposals
    pub fn vote(task: &str, final_round: &ProposalRound) -> String {
        let mut prompt = format!(
            "Task: {}\n\nVote for the best proposal. Reply with '{} [agent name]' or 'I abstain from voting'.\n\n",
            task,
            capitalize_marker()
        );

        for proposal in &final_round.proposals {
            prompt.push_str(&format!(
                "{}: {}\n\n",
                proposal.worker_id,
                truncate(&proposal.text, VOTE_EXCERPT_LIMIT)
            ));
        }

        prompt.trim_end().to_string()
    }

    /// Fan-out subtask followed by the rendered context, when there is one
    pub fn subtask(subtask: &str, context: &str) -> String {
        if context.is_empty() {
            subtask.to_string()
        } else {
            format!("{}\n\n{}", subtask, context)
        }
    }

    /// Prompt for the worker that combines fan-out outputs
    pub fn combiner(task: &str, outputs: &[(String, String)]) -> String {
        let mut prompt = format!(
            "Task: {}\n\nCombine the following results into a single coherent answer.\n",
            task
        );

        for (label, output) in outputs {
            prompt.push_str(&format!("\n--- {} ---\n{}\n", label, output));
        }

        prompt
    }
}

/// `"I vote for:"` as it is shown to workers
fn capitalize_marker() -> String {
    let mut chars = VOTE_MARKER.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
