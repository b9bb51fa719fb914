//! Vote types for debate resolution
//!
//! This module defines the voting primitives and the deterministic tally
//! used to pick a debate winner.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// A single vote cast by a worker for one final-round proposal
///
/// # Example
///
/// ```
/// use council_domain::debate::Vote;
///
/// let vote = Vote::new("perf", "sec");
/// assert_eq!(vote.voter_id, "perf");
/// assert!(!vote.is_self_vote());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    /// Worker that cast the vote
    pub voter_id: String,
    /// Proposal the vote is for
    pub proposal_id: String,
}

impl Vote {
    pub fn new(voter_id: impl Into<String>, proposal_id: impl Into<String>) -> Self {
        Self {
            voter_id: voter_id.into(),
            proposal_id: proposal_id.into(),
        }
    }

    /// Whether the voter voted for its own proposal
    pub fn is_self_vote(&self) -> bool {
        self.voter_id == self.proposal_id
    }
}

/// How much each vote weighs
#[derive(Debug, Clone, PartialEq, Default)]
pub enum VotingStrategy {
    /// Every voter weighs 1.0
    #[default]
    Majority,
    /// Explicit weight per worker name; unlisted workers weigh 1.0
    Weighted(HashMap<String, f64>),
}

impl VotingStrategy {
    /// Weight of a vote cast by `voter`
    pub fn weight_for(&self, voter: &str) -> f64 {
        match self {
            VotingStrategy::Majority => 1.0,
            VotingStrategy::Weighted(weights) => weights.get(voter).copied().unwrap_or(1.0),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VotingStrategy::Majority => "majority",
            VotingStrategy::Weighted(_) => "weighted",
        }
    }

    /// Configuration problems (negative or non-finite weights)
    pub fn validate(&self) -> Vec<String> {
        let VotingStrategy::Weighted(weights) = self else {
            return Vec::new();
        };
        let mut errors: Vec<String> = weights
            .iter()
            .filter(|(_, w)| !w.is_finite() || **w < 0.0)
            .map(|(name, w)| format!("Invalid voting weight {} for worker {}", w, name))
            .collect();
        errors.sort();
        errors
    }
}

impl std::str::FromStr for VotingStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "majority" => Ok(VotingStrategy::Majority),
            "weighted" => Ok(VotingStrategy::Weighted(HashMap::new())),
            other => Err(format!(
                "Unknown voting strategy: {}. Valid: majority, weighted",
                other
            )),
        }
    }
}

/// Aggregated weight per proposal
///
/// Candidates are kept in the order they were registered, which is the
/// order of their authors in the configured worker list. That order is
/// the tie-breaker: among proposals with equal weight, the earliest wins.
#[derive(Debug, Clone, PartialEq)]
pub struct VoteTally {
    scores: Vec<(String, f64)>,
    counted: Vec<Vote>,
}

impl VoteTally {
    /// Tally `votes` over `candidates` using the weights of `strategy`.
    ///
    /// Votes for ids that are not candidates are ignored, so the total
    /// weight always equals the sum of the weights of counted voters.
    pub fn tally<S: AsRef<str>>(candidates: &[S], votes: &[Vote], strategy: &VotingStrategy) -> Self {
        let mut scores: Vec<(String, f64)> = candidates
            .iter()
            .map(|c| (c.as_ref().to_string(), 0.0))
            .collect();
        let mut counted = Vec::new();

        for vote in votes {
            if let Some((_, score)) = scores.iter_mut().find(|(id, _)| *id == vote.proposal_id) {
                *score += strategy.weight_for(&vote.voter_id);
                counted.push(vote.clone());
            }
        }

        Self { scores, counted }
    }

    /// Weight accumulated by a proposal
    pub fn score(&self, proposal_id: &str) -> f64 {
        self.scores
            .iter()
            .find(|(id, _)| id == proposal_id)
            .map(|(_, s)| *s)
            .unwrap_or(0.0)
    }

    /// Highest-weighted proposal; ties go to the earliest candidate
    pub fn winner(&self) -> Option<&str> {
        let mut best: Option<(&str, f64)> = None;
        for (id, score) in &self.scores {
            match best {
                Some((_, top)) if *score <= top => {}
                _ => best = Some((id.as_str(), *score)),
            }
        }
        best.map(|(id, _)| id)
    }

    /// Whether more than one proposal shares the top weight
    pub fn is_tie(&self) -> bool {
        let Some(top) = self.scores.iter().map(|(_, s)| *s).reduce(f64::max) else {
            return false;
        };
        self.scores.iter().filter(|(_, s)| *s == top).count() > 1
    }

    /// Sum of all accumulated weight
    pub fn total_weight(&self) -> f64 {
        self.scores.iter().map(|(_, s)| s).sum()
    }

    /// Votes that were counted
    pub fn votes(&self) -> &[Vote] {
        &self.counted
    }

    /// `{ proposal_id: weight }` in candidate order
    pub fn scores_json(&self) -> Map<String, Value> {
        self.scores
            .iter()
            .map(|(id, s)| (id.clone(), Value::from(*s)))
            .collect()
    }

    /// `{ voter_id: proposal_id }` for every counted vote
    pub fn votes_json(&self) -> Map<String, Value> {
        self.counted
            .iter()
            .map(|v| (v.voter_id.clone(), Value::String(v.proposal_id.clone())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weights(entries: &[(&str, f64)]) -> VotingStrategy {
        VotingStrategy::Weighted(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
        )
    }

    #[test]
    fn test_majority_tally() {
        let votes = vec![Vote::new("a", "b"), Vote::new("b", "b"), Vote::new("c", "a")];
        let tally = VoteTally::tally(&["a", "b", "c"], &votes, &VotingStrategy::Majority);

        assert_eq!(tally.score("a"), 1.0);
        assert_eq!(tally.score("b"), 2.0);
        assert_eq!(tally.score("c"), 0.0);
        assert_eq!(tally.winner(), Some("b"));
        assert!(!tally.is_tie());
    }

    #[test]
    fn test_weighted_tie_goes_to_earliest_worker() {
        // Proposals P1 (by A) and P2 (by B); A weighs 2, B and C weigh 1
        let strategy = weights(&[("A", 2.0), ("B", 1.0), ("C", 1.0)]);
        let votes = vec![Vote::new("A", "A"), Vote::new("B", "B"), Vote::new("C", "B")];
        let tally = VoteTally::tally(&["A", "B", "C"], &votes, &strategy);

        assert_eq!(tally.score("A"), 2.0);
        assert_eq!(tally.score("B"), 2.0);
        assert!(tally.is_tie());
        assert_eq!(tally.winner(), Some("A"));
    }

    #[test]
    fn test_tie_break_follows_candidate_order_not_vote_order() {
        let votes = vec![Vote::new("x", "late"), Vote::new("y", "early")];
        let tally = VoteTally::tally(&["early", "late"], &votes, &VotingStrategy::Majority);
        assert_eq!(tally.winner(), Some("early"));
    }

    #[test]
    fn test_no_votes_picks_first_candidate() {
        let tally = VoteTally::tally(&["first", "second"], &[], &VotingStrategy::Majority);
        assert_eq!(tally.winner(), Some("first"));
        assert_eq!(tally.total_weight(), 0.0);
    }

    #[test]
    fn test_empty_candidates_has_no_winner() {
        let empty: [&str; 0] = [];
        let tally = VoteTally::tally(&empty, &[], &VotingStrategy::Majority);
        assert_eq!(tally.winner(), None);
        assert!(!tally.is_tie());
    }

    #[test]
    fn test_total_weight_matches_counted_voters() {
        let strategy = weights(&[("a", 0.5), ("b", 3.0)]);
        let votes = vec![
            Vote::new("a", "b"),
            Vote::new("b", "a"),
            Vote::new("c", "a"),
            Vote::new("d", "unknown"),
        ];
        let tally = VoteTally::tally(&["a", "b"], &votes, &strategy);

        assert_eq!(tally.votes().len(), 3);
        assert_eq!(tally.total_weight(), 0.5 + 3.0 + 1.0);
    }

    #[test]
    fn test_json_views() {
        let votes = vec![Vote::new("b", "a")];
        let tally = VoteTally::tally(&["a", "b"], &votes, &VotingStrategy::Majority);
        assert_eq!(tally.scores_json()["a"], 1.0);
        assert_eq!(tally.scores_json()["b"], 0.0);
        assert_eq!(tally.votes_json()["b"], "a");
    }

    #[test]
    fn test_strategy_validation() {
        assert!(VotingStrategy::Majority.validate().is_empty());
        let bad = weights(&[("a", -1.0), ("b", f64::NAN), ("c", 2.0)]);
        assert_eq!(bad.validate().len(), 2);
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("majority".parse::<VotingStrategy>().unwrap().as_str(), "majority");
        assert_eq!("Weighted".parse::<VotingStrategy>().unwrap().as_str(), "weighted");
        assert!("ranked".parse::<VotingStrategy>().is_err());
    }

    #[test]
    fn test_self_vote() {
        assert!(Vote::new("a", "a").is_self_vote());
        assert!(!Vote::new("a", "b").is_self_vote());
    }
}
