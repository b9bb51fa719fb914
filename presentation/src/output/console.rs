//! Console output formatter for council results

use crate::output::formatter::OutputFormatter;
use colored::Colorize;
use council_application::CouncilOutput;
use council_domain::StepResult;
use serde_json::Value;

/// Formats council results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format the complete council result
    pub fn format(output: &CouncilOutput) -> String {
        let mut text = String::new();

        text.push_str(&Self::header(&format!("Council Results: {}", output.council)));
        text.push('\n');

        for (i, result) in output.results.iter().enumerate() {
            text.push_str(&Self::format_step(i, result));
        }

        if !output.all_succeeded() {
            text.push_str(&format!(
                "\n{}\n",
                "Some steps failed; see the errors above.".yellow()
            ));
        }

        text.push_str(&Self::footer());
        text
    }

    /// Format as JSON
    pub fn format_json(output: &CouncilOutput) -> String {
        serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
    }

    /// Format the final output only (concise)
    pub fn format_final_only(output: &CouncilOutput) -> String {
        let mut text = output.final_output().unwrap_or_default().to_string();
        text.push('\n');
        text
    }

    fn format_step(index: usize, result: &StepResult) -> String {
        let mut text = String::new();
        let status = if result.success() {
            "ok".green().bold()
        } else {
            "failed".red().bold()
        };
        text.push_str(&Self::section_header(&format!("step_{} [{}]", index, status)));

        let metadata = result.metadata();

        // Debate summary
        if let Some(winner) = metadata.get("winner").and_then(Value::as_str) {
            let tie = metadata.get("tie").and_then(Value::as_bool).unwrap_or(false);
            text.push_str(&format!(
                "{} {}{}\n",
                "Winner:".cyan().bold(),
                winner,
                if tie { " (tie broken by worker order)" } else { "" }
            ));
            if let Some(Value::Object(scores)) = metadata.get("weighted_scores") {
                for (proposal, score) in scores {
                    text.push_str(&format!("  * {}: {}\n", proposal, score));
                }
            }
        }

        // Fan-out summary
        if let Some(Value::Object(individual)) = metadata.get("individual_results") {
            text.push_str(&format!(
                "{} {}\n",
                "Subtasks:".cyan().bold(),
                individual.keys().cloned().collect::<Vec<_>>().join(", ")
            ));
            if let Some(by) = metadata.get("combined_by").and_then(Value::as_str) {
                text.push_str(&format!("{} {}\n", "Combined by:".cyan().bold(), by));
            }
        }

        if let Some(error) = result.error() {
            text.push_str(&format!("{} {}\n", "Error:".red().bold(), error));
        }

        if !result.output().is_empty() {
            text.push('\n');
            text.push_str(&Self::indent(result.output(), "  "));
            text.push('\n');
        }
        text
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format(&self, output: &CouncilOutput) -> String {
        Self::format(output)
    }

    fn format_json(&self, output: &CouncilOutput) -> String {
        Self::format_json(output)
    }

    fn format_final_only(&self, output: &CouncilOutput) -> String {
        Self::format_final_only(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, json};

    fn sample() -> CouncilOutput {
        CouncilOutput {
            council: "review".to_string(),
            results: vec![
                StepResult::ok("sec")
                    .with_metadata("winner", "sec")
                    .with_metadata("tie", true)
                    .with_metadata("weighted_scores", json!({ "sec": 1.0, "perf": 1.0 })),
                StepResult::failure("", "worker perf failed"),
            ],
            data: Map::new(),
        }
    }

    #[test]
    fn test_format_lists_every_step() {
        colored::control::set_override(false);
        let text = ConsoleFormatter::format(&sample());

        assert!(text.contains("Council Results: review"));
        assert!(text.contains("step_0 [ok]"));
        assert!(text.contains("Winner: sec (tie broken by worker order)"));
        assert!(text.contains("step_1 [failed]"));
        assert!(text.contains("Error: worker perf failed"));
    }

    #[test]
    fn test_format_final_only() {
        let output = CouncilOutput {
            council: "c".to_string(),
            results: vec![StepResult::ok("first"), StepResult::ok("last")],
            data: Map::new(),
        };
        assert_eq!(ConsoleFormatter::format_final_only(&output), "last\n");
    }

    #[test]
    fn test_format_json_keys_results_by_step() {
        let value: Value = serde_json::from_str(&ConsoleFormatter::format_json(&sample())).unwrap();
        assert_eq!(value["council"], "review");
        assert_eq!(value["results"]["step_0"]["output"], "sec");
        assert_eq!(value["results"]["step_1"]["success"], false);
    }

    #[test]
    fn test_indent() {
        assert_eq!(ConsoleFormatter::indent("a\nb", "  "), "  a\n  b");
    }
}
