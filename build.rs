// SPDX-License-Identifier: GPL-3.0-only

use std::process::Command;

fn main() {
    println!("cargo::rerun-if-changed=.git/HEAD");
    println!("cargo::rerun-if-env-changed=UVCAM_BUILD_VERSION");

    // Image builds pin the version explicitly
    let version = std::env::var("UVCAM_BUILD_VERSION").unwrap_or_else(|_| describe());

    println!("cargo::rustc-env=UVCAM_VERSION={}", version);
}

/// `<crate version>+<short hash>`, or the plain crate version outside git
fn describe() -> String {
    let base = std::env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "0.0.0".to_string());

    let hash = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| String::from_utf8_lossy(&output.stdout).trim().to_string())
        .filter(|hash| !hash.is_empty());

    match hash {
        Some(hash) => format!("{}+{}", base, hash),
        None => base,
    }
}
