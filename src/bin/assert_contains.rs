use basanos::assert::{contains, resolve_both_values, run_cli};
use std::io::BufReader;

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut stdin = BufReader::new(std::io::stdin());
    let code = run_cli(
        &args,
        &mut stdin,
        &mut std::io::stdout(),
        resolve_both_values,
        contains,
    );
    std::process::exit(code);
}
