//! Shared test utilities for integration tests
//!
//! Provides history fixture creation used across the binary tests.

#![allow(dead_code)]

use assert_fs::prelude::*;

/// Bash history used by most CLI tests. With the default exclusions:
/// `git status` scores 10 then 27, `make` scores 18.
pub const BASH_HISTORY: &str = "pwd\ngit status\ngit status\nls\nmake\n";

/// Write `contents` to `name` inside a fresh temp dir.
/// The temp dir doubles as the working directory so no stray
/// hrank.toml from the developer's checkout is picked up.
pub fn history_fixture(
    name: &str,
    contents: &str,
) -> assert_fs::TempDir
{
    // Initialize the temporary root
    let tmp = assert_fs::TempDir::new().expect("tempdir");

    tmp.child(name)
        .write_str(contents)
        .expect("write history");

    tmp
}

/// Command for the compiled binary with a clean, deterministic env.
pub fn hrank(tmp: &assert_fs::TempDir) -> std::process::Command
{
    use assert_cmd::prelude::*;

    let mut cmd = std::process::Command::cargo_bin("hrank").expect("hrank binary");
    cmd.current_dir(tmp.path())
        .env_remove("HISTFILE")
        .env_remove("HRANK_LOG")
        .env_remove("RUST_LOG")
        .env("HOME", tmp.path());
    cmd
}
