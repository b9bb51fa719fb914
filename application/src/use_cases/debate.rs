//! Debate step
//!
//! Multi-round proposal and voting among a fixed set of workers.
//!
//! ```text
//! [moderator guidance]
//!        │
//!        ▼
//! Proposing(1) ─▶ Proposing(2) ─▶ … ─▶ Proposing(R) ─▶ Voting ─▶ Resolved
//! ```
//!
//! Every round dispatches to all workers concurrently. Only the proposals
//! of the last round are voted on. The winner is chosen by
//! [`VoteTally`]: highest weight, ties to the earliest worker.

use crate::config::ExecutionParams;
use crate::ports::step::Step;
use crate::ports::worker::Worker;
use crate::use_cases::shared::{call_worker, dispatch_all};
use async_trait::async_trait;
use council_domain::{
    ErrorStrategy, ExecutionContext, ExecutionError, ParsedVote, PromptTemplate, Proposal,
    ProposalRound, StepResult, Vote, VoteTally, VotingStrategy, parse_vote,
};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Default number of proposal rounds
pub const DEFAULT_ROUNDS: usize = 2;

/// Debate among workers, resolved by vote
pub struct DebateStep {
    name: String,
    workers: Vec<Arc<dyn Worker>>,
    rounds: usize,
    voting: VotingStrategy,
    allow_self_voting: bool,
    moderator: Option<Arc<dyn Worker>>,
    strategy: ErrorStrategy,
    params: ExecutionParams,
}

impl DebateStep {
    pub fn new(workers: Vec<Arc<dyn Worker>>) -> Self {
        Self {
            name: "debate".to_string(),
            workers,
            rounds: DEFAULT_ROUNDS,
            voting: VotingStrategy::Majority,
            allow_self_voting: true,
            moderator: None,
            strategy: ErrorStrategy::Halt,
            params: ExecutionParams::default(),
        }
    }

    // ==================== Builder Methods ====================

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_rounds(mut self, rounds: usize) -> Self {
        self.rounds = rounds;
        self
    }

    pub fn with_voting(mut self, voting: VotingStrategy) -> Self {
        self.voting = voting;
        self
    }

    pub fn with_self_voting(mut self, allow: bool) -> Self {
        self.allow_self_voting = allow;
        self
    }

    /// Ask `moderator` for guidance before the first round
    pub fn with_moderator(mut self, moderator: Arc<dyn Worker>) -> Self {
        self.moderator = Some(moderator);
        self
    }

    pub fn with_error_strategy(mut self, strategy: ErrorStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_params(mut self, params: ExecutionParams) -> Self {
        self.params = params;
        self
    }

    fn worker_names(&self) -> Vec<String> {
        self.workers.iter().map(|w| w.name().to_string()).collect()
    }

    /// Failure handling shared by proposals, votes and guidance: under
    /// `Halt` the error fails the debate, otherwise it is logged and dropped.
    fn absorb(&self, what: &str, err: ExecutionError) -> Result<(), ExecutionError> {
        if self.strategy.is_halt() || err.is_cancelled() {
            return Err(err);
        }
        warn!("Debate {}: {} failed, treating as abstention: {}", self.name, what, err);
        Ok(())
    }

    async fn moderator_guidance(&self, task: &str) -> Result<Option<String>, ExecutionError> {
        let Some(moderator) = &self.moderator else {
            return Ok(None);
        };

        let prompt = PromptTemplate::moderator_guidance(task);
        match call_worker(moderator.as_ref(), &prompt, self.params.worker_timeout).await {
            Ok(guidance) => {
                debug!("Moderator {} provided guidance", moderator.name());
                Ok(Some(guidance))
            }
            Err(e) => {
                self.absorb(&format!("moderator {}", moderator.name()), e)?;
                Ok(None)
            }
        }
    }

    async fn propose(
        &self,
        round: usize,
        prompts: Vec<String>,
    ) -> Result<ProposalRound, ExecutionError> {
        info!("Debate {}: round {} of {}", self.name, round, self.rounds);

        let results = dispatch_all(
            &self.workers,
            prompts,
            self.params.max_workers,
            self.params.worker_timeout,
        )
        .await;

        let mut proposals = Vec::new();
        for (worker, result) in self.workers.iter().zip(results) {
            match result {
                Ok(text) => proposals.push(Proposal::new(worker.name(), text, round)),
                Err(e) => self.absorb(&format!("proposal from {}", worker.name()), e)?,
            }
        }

        if proposals.is_empty() {
            return Err(ExecutionError::NoProposals(round));
        }
        Ok(ProposalRound::new(round, proposals))
    }

    async fn collect_votes(
        &self,
        task: &str,
        final_round: &ProposalRound,
    ) -> Result<(Vec<Vote>, Vec<String>), ExecutionError> {
        let prompt = PromptTemplate::vote(task, final_round);
        let candidates = final_round.ids();

        let replies = dispatch_all(
            &self.workers,
            vec![prompt; self.workers.len()],
            self.params.max_workers,
            self.params.worker_timeout,
        )
        .await;

        let mut votes = Vec::new();
        let mut abstentions = Vec::new();

        for (worker, reply) in self.workers.iter().zip(replies) {
            let voter = worker.name();
            let parsed = match reply {
                Ok(text) => parse_vote(&text, &candidates),
                Err(e) => {
                    self.absorb(&format!("vote from {}", voter), e)?;
                    ParsedVote::Abstain
                }
            };

            match parsed {
                ParsedVote::For(proposal) if proposal == voter && !self.allow_self_voting => {
                    debug!("Ignoring self-vote from {}", voter);
                    abstentions.push(voter.to_string());
                }
                ParsedVote::For(proposal) => votes.push(Vote::new(voter, proposal)),
                ParsedVote::Abstain | ParsedVote::Unrecognized => {
                    abstentions.push(voter.to_string());
                }
            }
        }

        Ok((votes, abstentions))
    }
}

#[async_trait]
impl Step for DebateStep {
    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.workers.len() < 2 {
            errors.push(format!(
                "Debate requires at least 2 workers, got {}",
                self.workers.len()
            ));
        }

        let mut seen = HashSet::new();
        for name in self.worker_names() {
            if !seen.insert(name.clone()) {
                errors.push(format!("Duplicate worker name: {}", name));
            }
        }

        if self.rounds < 1 {
            errors.push("Debate requires at least 1 round".to_string());
        }

        errors.extend(self.voting.validate());
        errors
    }

    fn error_strategy(&self) -> ErrorStrategy {
        self.strategy.clone()
    }

    async fn execute(
        &self,
        task: &str,
        context: &ExecutionContext,
    ) -> Result<StepResult, ExecutionError> {
        let guidance = self.moderator_guidance(task).await?;
        let rendered_context = context.to_prompt_context();

        let opening = PromptTemplate::proposal(task, &rendered_context, guidance.as_deref());
        let mut history = vec![self.propose(1, vec![opening; self.workers.len()]).await?];

        for round in 2..=self.rounds {
            let previous = history.last().ok_or(ExecutionError::NoProposals(round - 1))?;
            let prompt = PromptTemplate::revision(task, round, previous);
            let next = self.propose(round, vec![prompt; self.workers.len()]).await?;
            history.push(next);
        }

        let final_round = history
            .last()
            .ok_or(ExecutionError::NoProposals(self.rounds))?;
        let (votes, abstentions) = self.collect_votes(task, final_round).await?;

        let tally = VoteTally::tally(&final_round.ids(), &votes, &self.voting);
        let winner = tally
            .winner()
            .and_then(|id| final_round.get(id))
            .ok_or(ExecutionError::NoProposals(final_round.round))?;

        info!(
            "Debate {} resolved: {} wins with {} of {} weight",
            self.name,
            winner.worker_id,
            tally.score(winner.id()),
            tally.total_weight()
        );

        let mut metadata = Map::new();
        metadata.insert("votes".into(), Value::Object(tally.votes_json()));
        metadata.insert("weighted_scores".into(), Value::Object(tally.scores_json()));
        metadata.insert("winner".into(), Value::String(winner.worker_id.clone()));
        metadata.insert("strategy".into(), Value::String(self.voting.as_str().into()));
        metadata.insert(
            "proposals".into(),
            Value::Array(history.iter().map(ProposalRound::to_json).collect()),
        );
        metadata.insert(
            "abstentions".into(),
            Value::Array(abstentions.into_iter().map(Value::String).collect()),
        );
        metadata.insert("tie".into(), Value::Bool(tally.is_tie()));
        metadata.insert("rounds".into(), Value::from(self.rounds));
        metadata.insert(
            "workers".into(),
            Value::Array(self.worker_names().into_iter().map(Value::String).collect()),
        );

        Ok(StepResult::new(winner.text.clone(), metadata, true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::worker::testing::ScriptedWorker;
    use std::collections::HashMap;

    const VOTE_PROMPT_MARKER: &str = "Vote for the best proposal";

    /// Worker proposing `proposal` and replying `vote` to vote prompts
    fn debater(name: &str, proposal: &str, vote: &str) -> Arc<ScriptedWorker> {
        let proposal = proposal.to_string();
        let vote = vote.to_string();
        Arc::new(ScriptedWorker::new(name, move |prompt| {
            if prompt.contains(VOTE_PROMPT_MARKER) {
                Ok(vote.clone())
            } else {
                Ok(proposal.clone())
            }
        }))
    }

    fn as_workers(workers: &[Arc<ScriptedWorker>]) -> Vec<Arc<dyn Worker>> {
        workers
            .iter()
            .map(|w| Arc::clone(w) as Arc<dyn Worker>)
            .collect()
    }

    #[tokio::test]
    async fn test_majority_winner() {
        let workers = [
            debater("a", "plan A", "I vote for: b"),
            debater("b", "plan B", "I vote for: b"),
            debater("c", "plan C", "I vote for: a"),
        ];
        let step = DebateStep::new(as_workers(&workers)).with_rounds(1);

        let result = step.execute("task", &ExecutionContext::new()).await.unwrap();

        assert!(result.success());
        assert_eq!(result.output(), "plan B");
        assert_eq!(result.metadata()["winner"], "b");
        assert_eq!(result.metadata()["weighted_scores"]["b"], 2.0);
        assert_eq!(result.metadata()["votes"]["c"], "a");
        assert_eq!(result.metadata()["strategy"], "majority");
        assert_eq!(result.metadata()["tie"], false);
    }

    #[tokio::test]
    async fn test_weighted_tie_goes_to_earliest_worker() {
        let workers = [
            debater("A", "P1", "I vote for: A"),
            debater("B", "P2", "I vote for: B"),
            debater("C", "P3", "I vote for: B"),
        ];
        let weights = HashMap::from([("A".to_string(), 2.0), ("B".to_string(), 1.0)]);
        let step = DebateStep::new(as_workers(&workers))
            .with_rounds(1)
            .with_voting(VotingStrategy::Weighted(weights));

        let result = step.execute("task", &ExecutionContext::new()).await.unwrap();

        assert_eq!(result.output(), "P1");
        assert_eq!(result.metadata()["weighted_scores"]["A"], 2.0);
        assert_eq!(result.metadata()["weighted_scores"]["B"], 2.0);
        assert_eq!(result.metadata()["tie"], true);
        assert_eq!(result.metadata()["strategy"], "weighted");
    }

    #[tokio::test]
    async fn test_no_votes_picks_first_proposal() {
        let workers = [
            debater("a", "first", "I abstain from voting"),
            debater("b", "second", "no opinion"),
        ];
        let step = DebateStep::new(as_workers(&workers)).with_rounds(1);

        let result = step.execute("task", &ExecutionContext::new()).await.unwrap();

        assert_eq!(result.output(), "first");
        assert_eq!(result.metadata()["abstentions"], serde_json::json!(["a", "b"]));
    }

    #[tokio::test]
    async fn test_self_votes_can_be_disallowed() {
        let workers = [
            debater("a", "plan A", "I vote for: a"),
            debater("b", "plan B", "I vote for: a"),
            debater("c", "plan C", "I vote for: c"),
        ];
        let step = DebateStep::new(as_workers(&workers))
            .with_rounds(1)
            .with_self_voting(false);

        let result = step.execute("task", &ExecutionContext::new()).await.unwrap();

        assert_eq!(result.metadata()["weighted_scores"]["a"], 1.0);
        assert_eq!(result.metadata()["weighted_scores"]["c"], 0.0);
        assert_eq!(result.metadata()["abstentions"], serde_json::json!(["a", "c"]));
    }

    #[tokio::test]
    async fn test_later_rounds_see_previous_proposals() {
        let workers = [
            Arc::new(ScriptedWorker::new("a", |prompt: &str| {
                Ok(if prompt.contains(VOTE_PROMPT_MARKER) {
                    "I vote for: b".to_string()
                } else if prompt.starts_with("Debate Round 2") {
                    "A revised".to_string()
                } else {
                    "A draft".to_string()
                })
            })),
            Arc::new(ScriptedWorker::new("b", |prompt: &str| {
                Ok(if prompt.contains(VOTE_PROMPT_MARKER) {
                    "I vote for: b".to_string()
                } else if prompt.starts_with("Debate Round 2") {
                    "B revised".to_string()
                } else {
                    "B draft".to_string()
                })
            })),
        ];
        let step = DebateStep::new(as_workers(&workers)).with_rounds(2);

        let result = step.execute("task", &ExecutionContext::new()).await.unwrap();

        assert_eq!(result.output(), "B revised");
        let prompts = workers[0].prompts();
        assert!(prompts[1].contains("a: A draft"));
        assert!(prompts[1].contains("b: B draft"));
        assert_eq!(result.metadata()["rounds"], 2);
        assert_eq!(result.metadata()["proposals"][0]["proposals"]["a"], "A draft");
        assert_eq!(result.metadata()["proposals"][1]["proposals"]["a"], "A revised");
    }

    #[tokio::test]
    async fn test_first_round_includes_context_and_guidance() {
        let workers = [
            debater("a", "plan A", "I vote for: a"),
            debater("b", "plan B", "I vote for: a"),
        ];
        let moderator = Arc::new(ScriptedWorker::fixed("lead", "Focus on latency"));
        let step = DebateStep::new(as_workers(&workers))
            .with_rounds(1)
            .with_moderator(moderator.clone());

        let mut context = ExecutionContext::new();
        context.add("service", "checkout");
        step.execute("task", &context).await.unwrap();

        let first_prompt = &workers[0].prompts()[0];
        assert!(first_prompt.contains("Moderator guidance: Focus on latency"));
        assert!(first_prompt.contains("- service: checkout"));
        assert_eq!(moderator.prompts().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_proposal_is_abstention_when_not_halting() {
        let workers: Vec<Arc<dyn Worker>> = vec![
            Arc::new(ScriptedWorker::failing("a", "offline")),
            debater("b", "plan B", "I vote for: b"),
            debater("c", "plan C", "I vote for: c"),
        ];
        let step = DebateStep::new(workers)
            .with_rounds(1)
            .with_error_strategy(ErrorStrategy::Continue);

        let result = step.execute("task", &ExecutionContext::new()).await.unwrap();

        assert_eq!(result.output(), "plan B");
        assert!(result.metadata()["weighted_scores"].get("a").is_none());
        assert_eq!(result.metadata()["abstentions"], serde_json::json!(["a"]));
    }

    #[tokio::test]
    async fn test_worker_failure_fails_debate_under_halt() {
        let workers: Vec<Arc<dyn Worker>> = vec![
            debater("a", "plan A", "I vote for: a"),
            Arc::new(ScriptedWorker::failing("b", "offline")),
        ];
        let step = DebateStep::new(workers).with_rounds(1);

        let err = step
            .execute("task", &ExecutionContext::new())
            .await
            .unwrap_err();
        assert_eq!(err, ExecutionError::worker("b", "offline"));
    }

    #[tokio::test]
    async fn test_no_proposals_fails() {
        let workers: Vec<Arc<dyn Worker>> = vec![
            Arc::new(ScriptedWorker::failing("a", "offline")),
            Arc::new(ScriptedWorker::failing("b", "offline")),
        ];
        let step = DebateStep::new(workers).with_error_strategy(ErrorStrategy::Continue);

        let err = step
            .execute("task", &ExecutionContext::new())
            .await
            .unwrap_err();
        assert_eq!(err, ExecutionError::NoProposals(1));
    }

    #[test]
    fn test_validation() {
        let single = DebateStep::new(vec![Arc::new(ScriptedWorker::fixed("a", "x"))]);
        assert_eq!(
            single.validate(),
            vec!["Debate requires at least 2 workers, got 1"]
        );

        let duplicate = DebateStep::new(vec![
            Arc::new(ScriptedWorker::fixed("a", "x")),
            Arc::new(ScriptedWorker::fixed("a", "y")),
        ])
        .with_rounds(0);
        let errors = duplicate.validate();
        assert!(errors.contains(&"Duplicate worker name: a".to_string()));
        assert!(errors.contains(&"Debate requires at least 1 round".to_string()));

        let bad_weights = DebateStep::new(vec![
            Arc::new(ScriptedWorker::fixed("a", "x")),
            Arc::new(ScriptedWorker::fixed("b", "y")),
        ])
        .with_voting(VotingStrategy::Weighted(HashMap::from([("a".into(), -1.0)])));
        assert_eq!(bad_weights.validate().len(), 1);
    }
}
