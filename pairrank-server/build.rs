//! Embeds GIT_HASH, BUILD_TIMESTAMP and BUILD_PROFILE for the startup banner
//! and the health endpoint.

use std::process::Command;

/// Short commit hash, "unknown" outside a git checkout
fn git_hash() -> String {
    let output = match Command::new("git").args(["rev-parse", "--short=8", "HEAD"]).output() {
        Ok(output) if output.status.success() => output,
        _ => return "unknown".to_string(),
    };
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn build_profile() -> String {
    std::env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string())
}

fn main() {
    let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);

    for (key, value) in [
        ("GIT_HASH", git_hash()),
        ("BUILD_TIMESTAMP", timestamp),
        ("BUILD_PROFILE", build_profile()),
    ] {
        println!("cargo:rustc-env={}={}", key, value);
    }
}
