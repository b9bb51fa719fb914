//! Task splitting for fan-out steps
//!
//! A splitter turns one task into exactly one [`Subtask`] per worker. The
//! subtask key is what `individual_results` is indexed by.

use crate::core::error::ExecutionError;
use std::fmt;
use std::sync::Arc;

/// Domains used by [`TaskSplitter::Domains`] when none are configured
pub const DEFAULT_DOMAINS: [&str; 4] = ["technical", "business", "user", "security"];

/// Signature of a user-supplied split function: `(task, worker_count) -> subtasks`
pub type SplitFn = dyn Fn(&str, usize) -> Vec<String> + Send + Sync;

/// One unit of fan-out work, assigned to the worker at the same position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subtask {
    /// Key under which the worker's output is reported
    pub key: String,
    /// Text sent to the worker
    pub text: String,
}

impl Subtask {
    pub fn new(key: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            text: text.into(),
        }
    }
}

/// How a fan-out step distributes its task
#[derive(Clone, Default)]
pub enum TaskSplitter {
    /// Every worker receives the full task
    #[default]
    Replicate,
    /// Lines of the task are distributed evenly; the last worker takes the remainder
    ByLines,
    /// Each worker analyzes the task from one domain, assigned round-robin
    Domains(Vec<String>),
    /// Arbitrary split function
    Custom(Arc<SplitFn>),
}

impl TaskSplitter {
    /// Domain splitter over [`DEFAULT_DOMAINS`]
    pub fn default_domains() -> Self {
        TaskSplitter::Domains(DEFAULT_DOMAINS.iter().map(|d| d.to_string()).collect())
    }

    /// Wrap a closure as a custom splitter
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&str, usize) -> Vec<String> + Send + Sync + 'static,
    {
        TaskSplitter::Custom(Arc::new(f))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskSplitter::Replicate => "replicate",
            TaskSplitter::ByLines => "by_lines",
            TaskSplitter::Domains(_) => "domains",
            TaskSplitter::Custom(_) => "custom",
        }
    }

    /// Split `task` for the given workers.
    ///
    /// Fails with [`ExecutionError::SplitMismatch`] when the split does not
    /// yield exactly one subtask per worker.
    pub fn split<S: AsRef<str>>(
        &self,
        task: &str,
        workers: &[S],
    ) -> Result<Vec<Subtask>, ExecutionError> {
        let n = workers.len();
        let subtasks: Vec<Subtask> = match self {
            TaskSplitter::Replicate => workers
                .iter()
                .map(|w| Subtask::new(w.as_ref(), task))
                .collect(),
            TaskSplitter::ByLines => split_lines(task, n)
                .into_iter()
                .enumerate()
                .map(|(i, text)| Subtask::new(format!("Subtask {}", i + 1), text))
                .collect(),
            TaskSplitter::Domains(domains) => {
                let domains: Vec<&str> = if domains.is_empty() {
                    DEFAULT_DOMAINS.to_vec()
                } else {
                    domains.iter().map(String::as_str).collect()
                };
                workers
                    .iter()
                    .enumerate()
                    .map(|(i, w)| {
                        let domain = domains[i % domains.len()];
                        Subtask::new(
                            format!("{} ({})", w.as_ref(), domain),
                            format!("Analyze this from a {} perspective: {}", domain, task),
                        )
                    })
                    .collect()
            }
            TaskSplitter::Custom(f) => f(task, n)
                .into_iter()
                .enumerate()
                .map(|(i, text)| Subtask::new(format!("Subtask {}", i + 1), text))
                .collect(),
        };

        if subtasks.len() != n {
            return Err(ExecutionError::SplitMismatch {
                expected: n,
                got: subtasks.len(),
            });
        }
        Ok(subtasks)
    }
}

impl fmt::Debug for TaskSplitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskSplitter::Domains(domains) => f.debug_tuple("Domains").field(domains).finish(),
            other => f.write_str(other.as_str()),
        }
    }
}

impl std::str::FromStr for TaskSplitter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "replicate" => Ok(TaskSplitter::Replicate),
            "by_lines" | "lines" => Ok(TaskSplitter::ByLines),
            "domains" => Ok(TaskSplitter::default_domains()),
            other => Err(format!(
                "Unknown splitter: {}. Valid: replicate, by_lines, domains",
                other
            )),
        }
    }
}

/// Distribute lines over `n` chunks; fewer lines than chunks replicates the task
fn split_lines(task: &str, n: usize) -> Vec<String> {
    let lines: Vec<&str> = task.trim().lines().collect();
    if n == 0 || lines.len() < n {
        return vec![task.to_string(); n];
    }

    let per_chunk = lines.len() / n;
    (0..n)
        .map(|i| {
            let start = i * per_chunk;
            let end = if i == n - 1 { lines.len() } else { start + per_chunk };
            lines[start..end].join("\n")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORKERS: [&str; 3] = ["sec", "perf", "ux"];

    #[test]
    fn test_replicate_keys_are_worker_names() {
        let subtasks = TaskSplitter::Replicate.split("review", &WORKERS).unwrap();
        assert_eq!(subtasks.len(), 3);
        assert_eq!(subtasks[1], Subtask::new("perf", "review"));
    }

    #[test]
    fn test_by_lines_distributes_remainder_to_last() {
        let task = "a\nb\nc\nd\ne";
        let subtasks = TaskSplitter::ByLines.split(task, &WORKERS).unwrap();
        assert_eq!(subtasks[0], Subtask::new("Subtask 1", "a"));
        assert_eq!(subtasks[1], Subtask::new("Subtask 2", "b"));
        assert_eq!(subtasks[2], Subtask::new("Subtask 3", "c\nd\ne"));
    }

    #[test]
    fn test_by_lines_falls_back_to_replication() {
        let subtasks = TaskSplitter::ByLines.split("only one line", &WORKERS).unwrap();
        assert!(subtasks.iter().all(|s| s.text == "only one line"));
        assert_eq!(subtasks[2].key, "Subtask 3");
    }

    #[test]
    fn test_domains_round_robin() {
        let splitter = TaskSplitter::Domains(vec!["security".into(), "cost".into()]);
        let subtasks = splitter.split("the plan", &WORKERS).unwrap();
        assert_eq!(subtasks[0].key, "sec (security)");
        assert_eq!(subtasks[1].key, "perf (cost)");
        assert_eq!(subtasks[2].key, "ux (security)");
        assert_eq!(
            subtasks[1].text,
            "Analyze this from a cost perspective: the plan"
        );
    }

    #[test]
    fn test_empty_domains_use_defaults() {
        let subtasks = TaskSplitter::Domains(Vec::new()).split("t", &WORKERS).unwrap();
        assert_eq!(subtasks[0].key, "sec (technical)");
    }

    #[test]
    fn test_custom_split_mismatch() {
        let splitter = TaskSplitter::custom(|task, _| vec![task.to_string()]);
        let err = splitter.split("t", &WORKERS).unwrap_err();
        assert_eq!(err, ExecutionError::SplitMismatch { expected: 3, got: 1 });
    }

    #[test]
    fn test_custom_split() {
        let splitter = TaskSplitter::custom(|task, n| {
            (0..n).map(|i| format!("{} part {}", task, i)).collect()
        });
        let subtasks = splitter.split("t", &WORKERS).unwrap();
        assert_eq!(subtasks[2], Subtask::new("Subtask 3", "t part 2"));
    }

    #[test]
    fn test_from_str() {
        assert_eq!("by_lines".parse::<TaskSplitter>().unwrap().as_str(), "by_lines");
        assert_eq!("Domains".parse::<TaskSplitter>().unwrap().as_str(), "domains");
        assert!("random".parse::<TaskSplitter>().is_err());
    }
}
