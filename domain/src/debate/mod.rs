//! Debate domain
//!
//! Proposals, votes and the deterministic tally used by the debate step.

pub mod parsing;
pub mod proposal;
pub mod vote;

pub use parsing::{ParsedVote, VOTE_MARKER, parse_vote};
pub use proposal::{Proposal, ProposalRound};
pub use vote::{Vote, VoteTally, VotingStrategy};
