use super::{indent, Report, SEPARATOR};

pub fn contains(needle: &str, haystack: &str) -> Report {
    if haystack.contains(needle) {
        return Report::pass("PASS: needle found in haystack\n");
    }
    Report::fail(format!(
        "FAIL: needle not found in haystack\n{SEPARATOR}\nLooking for:\n{}\n\nIn:\n{}\n",
        indent(needle),
        indent(haystack)
    ))
}
