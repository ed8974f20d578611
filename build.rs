use std::env;
use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=.git/HEAD");

    let git_hash = command_output("git", &["rev-parse", "--short", "HEAD"]);
    println!("cargo:rustc-env=DEBTOR_CORE_BUILD_HASH={git_hash}");

    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
    println!("cargo:rustc-env=DEBTOR_CORE_BUILD_TIMESTAMP={timestamp}");

    for (var, key) in [("TARGET", "TARGET"), ("PROFILE", "PROFILE")] {
        let value = env::var(var).unwrap_or_else(|_| "unknown".to_string());
        println!("cargo:rustc-env=DEBTOR_CORE_BUILD_{key}={value}");
    }

    let rustc = command_output("rustc", &["--version"]);
    println!("cargo:rustc-env=DEBTOR_CORE_BUILD_RUSTC={rustc}");
}

/// Runs a tool and returns its trimmed stdout, or `unknown` when it is unavailable.
fn command_output(program: &str, args: &[&str]) -> String {
    Command::new(program)
        .args(args)
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}
