use super::{Report, SEPARATOR};

pub fn greater_than(left: &str, right: &str) -> Report {
    compare(left, right, ">", |l, r| l > r)
}

pub fn greater_than_or_equal(left: &str, right: &str) -> Report {
    compare(left, right, ">=", |l, r| l >= r)
}

pub fn less_than(left: &str, right: &str) -> Report {
    compare(left, right, "<", |l, r| l < r)
}

pub fn less_than_or_equal(left: &str, right: &str) -> Report {
    compare(left, right, "<=", |l, r| l <= r)
}

fn compare(left: &str, right: &str, op: &str, check: fn(f64, f64) -> bool) -> Report {
    let parsed = parse_numeric(left).and_then(|l| parse_numeric(right).map(|r| (l, r)));
    match parsed {
        Err(error) => Report::fail(format!(
            "FAIL: invalid numeric comparison\n{SEPARATOR}\nError:\n  {error}\n{}",
            sides(left, right)
        )),
        Ok((l, r)) if check(l, r) => Report::pass(format!("PASS: {left} {op} {right}\n")),
        Ok(_) => Report::fail(format!(
            "FAIL: {left} {op} {right} is false\n{SEPARATOR}\n{}",
            sides(left, right)
        )),
    }
}

fn parse_numeric(value: &str) -> Result<f64, String> {
    value
        .trim()
        .parse()
        .map_err(|_| format!("invalid number: {value}"))
}

fn sides(left: &str, right: &str) -> String {
    format!("\nLeft:  {left}\nRight: {right}\n")
}
