//! Output formatter trait

use council_application::CouncilOutput;

/// Trait for formatting council results
pub trait OutputFormatter {
    /// Format every step result
    fn format(&self, output: &CouncilOutput) -> String;

    /// Format as JSON
    fn format_json(&self, output: &CouncilOutput) -> String;

    /// Format the last step's output only
    fn format_final_only(&self, output: &CouncilOutput) -> String;
}
