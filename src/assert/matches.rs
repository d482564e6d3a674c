use super::{indent, Report, SEPARATOR};
use regex::Regex;

pub fn matches(pattern: &str, target: &str) -> Report {
    let regex = match Regex::new(pattern) {
        Ok(regex) => regex,
        Err(error) => {
            return Report::fail(format!(
                "FAIL: invalid regex pattern\n{SEPARATOR}\nError:\n  {error}\n{}",
                sides(pattern, target)
            ));
        }
    };
    if regex.is_match(target) {
        return Report::pass("PASS: pattern matches target\n");
    }
    Report::fail(format!(
        "FAIL: pattern does not match target\n{SEPARATOR}\n{}",
        sides(pattern, target)
    ))
}

fn sides(pattern: &str, target: &str) -> String {
    format!(
        "\nPattern:\n  {pattern}\n\nTarget:\n{}\n",
        indent(target)
    )
}
