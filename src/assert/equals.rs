use super::{indent, Report, SEPARATOR};
use similar::TextDiff;

pub fn equals(expected: &str, actual: &str) -> Report {
    if expected == actual {
        return Report::pass("PASS: values are equal\n");
    }

    let mut message = String::new();
    message.push_str("FAIL: values differ\n");
    message.push_str(SEPARATOR);
    message.push('\n');
    message.push_str("Expected:\n");
    message.push_str(&indent(expected));
    message.push_str("\n\nActual:\n");
    message.push_str(&indent(actual));
    message.push('\n');

    let diff = TextDiff::from_lines(expected, actual)
        .unified_diff()
        .context_radius(3)
        .to_string();
    if !diff.is_empty() {
        message.push_str("\nDiff:\n");
        message.push_str(&indent(&diff));
        message.push('\n');
    }

    Report::fail(message)
}
