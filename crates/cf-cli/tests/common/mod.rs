//! Shared E2E test helpers for `cf3` binary tests.

use assert_cmd::cargo::cargo_bin_cmd;
use std::time::Duration;

/// Default timeout for CLI tests.
pub const TIMEOUT_BASIC: Duration = Duration::from_secs(10);

/// Variables read by the config loader and the logger.
const CF_VARS: &[&str] = &[
    "CF_PLUGINS",
    "CF_LOG_LEVEL",
    "CF_REGIST_SIGNAL_HANDLERS",
    "CF_LOG",
];

/// Build a Command for the `cf3` binary isolated from the user's config.
///
/// `HOME` and the project root point at a fresh temp directory.
/// Returns (command, _guard). Keep the guard alive for the whole test.
pub fn cf3_cmd() -> (assert_cmd::Command, tempfile::TempDir) {
    let tmp = tempfile::tempdir().expect("create temp dir for HOME");
    let mut cmd: assert_cmd::Command = cargo_bin_cmd!("cf3");
    cmd.timeout(TIMEOUT_BASIC);
    for var in CF_VARS {
        cmd.env_remove(var);
    }
    cmd.env("HOME", tmp.path());
    cmd.args(["-C", tmp.path().to_str().expect("valid utf8")]);
    (cmd, tmp)
}

/// Same as [`cf3_cmd`] with the sample world loaded.
pub fn cf3_world() -> (assert_cmd::Command, tempfile::TempDir) {
    let (mut cmd, tmp) = cf3_cmd();
    cmd.args(["--plugins", "cf3.world"]);
    (cmd, tmp)
}
