//! Proposal types for debate rounds

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A worker's candidate answer in one debate round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    /// Name of the worker that authored this proposal
    pub worker_id: String,
    /// The proposal text
    pub text: String,
    /// Round in which the proposal was produced (1-indexed)
    pub round_index: usize,
}

impl Proposal {
    pub fn new(worker_id: impl Into<String>, text: impl Into<String>, round_index: usize) -> Self {
        Self {
            worker_id: worker_id.into(),
            text: text.into(),
            round_index,
        }
    }

    /// Identifier votes refer to.
    ///
    /// A worker produces at most one proposal per round, so the author's
    /// name identifies a proposal within a round.
    pub fn id(&self) -> &str {
        &self.worker_id
    }
}

/// All proposals produced in one round, in worker-list order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProposalRound {
    pub round: usize,
    pub proposals: Vec<Proposal>,
}

impl ProposalRound {
    pub fn new(round: usize, proposals: Vec<Proposal>) -> Self {
        Self { round, proposals }
    }

    pub fn is_empty(&self) -> bool {
        self.proposals.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Proposal> {
        self.proposals.iter().find(|p| p.id() == id)
    }

    /// Proposal ids in order
    pub fn ids(&self) -> Vec<&str> {
        self.proposals.iter().map(Proposal::id).collect()
    }

    /// `{ "round": n, "proposals": { worker: text, ... } }`
    pub fn to_json(&self) -> Value {
        let proposals: Map<String, Value> = self
            .proposals
            .iter()
            .map(|p| (p.worker_id.clone(), Value::String(p.text.clone())))
            .collect();
        serde_json::json!({
            "round": self.round,
            "proposals": proposals,
        })
    }
}
