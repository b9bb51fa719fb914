//! Vote reply parsing for debates.
//!
//! Workers answer the vote prompt in free text. These functions extract a
//! structured decision from that text. Pure text matching, no I/O.
//!
//! | Reply | Parsed as |
//! |-------|-----------|
//! | `I vote for: sec` | [`ParsedVote::For`] |
//! | `abstain` | [`ParsedVote::Abstain`] |
//! | anything else | [`ParsedVote::Unrecognized`] |

/// Marker the vote prompt asks workers to use
pub const VOTE_MARKER: &str = "i vote for:";

/// Outcome of parsing one vote reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedVote {
    /// Vote for the proposal of the named worker
    For(String),
    /// Explicit abstention
    Abstain,
    /// No recognizable decision; counted as an abstention
    Unrecognized,
}

impl ParsedVote {
    pub fn proposal_id(&self) -> Option<&str> {
        match self {
            ParsedVote::For(id) => Some(id),
            _ => None,
        }
    }
}

/// Parse a vote reply against the ids of the final-round proposals.
///
/// The text after the last `I vote for:` marker (case-insensitive) is
/// matched first exactly, then by the longest candidate it contains. A
/// reply without marker is accepted only when it mentions exactly one
/// candidate.
///
/// # Examples
///
/// ```
/// use council_domain::debate::{ParsedVote, parse_vote};
///
/// let ids = ["sec", "perf"];
/// assert_eq!(parse_vote("I vote for: perf", &ids), ParsedVote::For("perf".into()));
/// assert_eq!(parse_vote("I abstain.", &ids), ParsedVote::Abstain);
/// assert_eq!(parse_vote("no idea", &ids), ParsedVote::Unrecognized);
/// ```
pub fn parse_vote<S: AsRef<str>>(reply: &str, candidates: &[S]) -> ParsedVote {
    let lower = reply.to_lowercase();

    if let Some(pos) = lower.rfind(VOTE_MARKER) {
        let choice = clean_choice(&lower[pos + VOTE_MARKER.len()..]);

        if let Some(exact) = candidates
            .iter()
            .find(|c| c.as_ref().to_lowercase() == choice)
        {
            return ParsedVote::For(exact.as_ref().to_string());
        }
        if choice.starts_with("abstain") || choice.is_empty() {
            return ParsedVote::Abstain;
        }
        if let Some(id) = longest_mention(&choice, candidates) {
            return ParsedVote::For(id);
        }
        return ParsedVote::Unrecognized;
    }

    if lower.contains("abstain") {
        return ParsedVote::Abstain;
    }

    let mentioned: Vec<&S> = candidates
        .iter()
        .filter(|c| contains_word(&lower, &c.as_ref().to_lowercase()))
        .collect();
    match mentioned.as_slice() {
        [only] => ParsedVote::For(only.as_ref().to_string()),
        _ => ParsedVote::Unrecognized,
    }
}

/// First line after the marker, stripped of quotes and punctuation
fn clean_choice(rest: &str) -> String {
    rest.lines()
        .next()
        .unwrap_or("")
        .trim()
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '`' || c == '*' || c == '.')
        .trim()
        .to_string()
}

fn longest_mention<S: AsRef<str>>(choice: &str, candidates: &[S]) -> Option<String> {
    candidates
        .iter()
        .filter(|c| !c.as_ref().is_empty() && choice.contains(&c.as_ref().to_lowercase()))
        .max_by_key(|c| c.as_ref().len())
        .map(|c| c.as_ref().to_string())
}

/// Whole-word containment, so "sec" does not match "second"
fn contains_word(haystack: &str, word: &str) -> bool {
    if word.is_empty() {
        return false;
    }
    haystack.match_indices(word).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + word.len()..].chars().next();
        !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
    })
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

#[cfg(test)]
mod tests {
    use super::*;

    const IDS: [&str; 3] = ["sec", "perf", "perf-lead"];

    #[test]
    fn test_parse_marker_exact() {
        assert_eq!(
            parse_vote("After reflection.\nI vote for: sec", &IDS),
            ParsedVote::For("sec".to_string())
        );
    }

    #[test]
    fn test_parse_marker_is_case_insensitive() {
        assert_eq!(
            parse_vote("i VOTE FOR: PERF", &IDS),
            ParsedVote::For("perf".to_string())
        );
    }

    #[test]
    fn test_parse_marker_strips_decoration() {
        assert_eq!(
            parse_vote("I vote for: **perf-lead**.", &IDS),
            ParsedVote::For("perf-lead".to_string())
        );
    }

    #[test]
    fn test_parse_marker_prefers_longest_contained_id() {
        assert_eq!(
            parse_vote("I vote for: the perf-lead proposal", &IDS),
            ParsedVote::For("perf-lead".to_string())
        );
    }

    #[test]
    fn test_parse_last_marker_wins() {
        let reply = "I vote for: sec\nActually, on reflection\nI vote for: perf";
        assert_eq!(parse_vote(reply, &IDS), ParsedVote::For("perf".to_string()));
    }

    #[test]
    fn test_parse_abstain() {
        assert_eq!(parse_vote("I vote for: abstain", &IDS), ParsedVote::Abstain);
        assert_eq!(parse_vote("I will abstain", &IDS), ParsedVote::Abstain);
        assert_eq!(parse_vote("I vote for:", &IDS), ParsedVote::Abstain);
    }

    #[test]
    fn test_parse_unknown_candidate_is_unrecognized() {
        assert_eq!(parse_vote("I vote for: nobody", &IDS), ParsedVote::Unrecognized);
    }

    #[test]
    fn test_parse_without_marker_single_mention() {
        assert_eq!(
            parse_vote("The sec proposal is strongest.", &IDS),
            ParsedVote::For("sec".to_string())
        );
    }

    #[test]
    fn test_parse_without_marker_ambiguous() {
        assert_eq!(
            parse_vote("Both sec and perf have merit.", &IDS),
            ParsedVote::Unrecognized
        );
    }

    #[test]
    fn test_contains_word_boundaries() {
        assert!(contains_word("vote sec now", "sec"));
        assert!(!contains_word("second place", "sec"));
        assert!(!contains_word("perf-lead wins", "perf"));
    }

    #[test]
    fn test_proposal_id() {
        assert_eq!(ParsedVote::For("a".into()).proposal_id(), Some("a"));
        assert_eq!(ParsedVote::Abstain.proposal_id(), None);
    }
}
