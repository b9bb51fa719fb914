//! Default combination of fan-out outputs

/// Concatenate `(worker, output)` pairs as `"<worker>: <output>"` blocks
/// separated by a blank line, in the order given.
///
/// ```
/// use council_domain::fan_out::concatenate_outputs;
///
/// let combined = concatenate_outputs(&[("a".into(), "x".into()), ("b".into(), "y".into())]);
/// assert_eq!(combined, "a: x\n\nb: y");
/// ```
pub fn concatenate_outputs(outputs: &[(String, String)]) -> String {
    outputs
        .iter()
        .map(|(worker, output)| format!("{}: {}", worker, output))
        .collect::<Vec<_>>()
        .join("\n\n")
}
