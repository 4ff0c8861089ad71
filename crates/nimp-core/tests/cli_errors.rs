//! CLI dispatch and usage tests for nimptool.
//!
//! These tests verify that missing or unknown commands print usage on
//! stdout with exit code 2, and that per-command argument errors do not.

use assert_cmd::Command;
use predicates::prelude::*;

/// Get a Command for the nimptool binary.
fn nimptool() -> Command {
    Command::cargo_bin("nimptool").expect("nimptool binary should exist")
}

mod usage {
    use super::*;

    #[test]
    fn no_command_prints_usage_and_exits_2() {
        nimptool()
            .assert()
            .code(2)
            .stdout(predicate::str::contains("Usage"))
            .stdout(predicate::str::contains("checkprocess"))
            .stdout(predicate::str::contains("getdirs"));
    }

    #[test]
    fn unknown_command_prints_usage_and_exits_2() {
        nimptool()
            .arg("frobnicate")
            .assert()
            .code(2)
            .stdout(predicate::str::contains("Usage"));
    }

    #[test]
    fn unknown_top_level_flag_prints_usage_and_exits_2() {
        nimptool()
            .arg("--frob")
            .assert()
            .code(2)
            .stdout(predicate::str::contains("Usage"))
            .stdout(predicate::str::contains("getacct"));
    }

    #[test]
    fn help_exits_0() {
        nimptool()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("checkpidfile"))
            .stdout(predicate::str::contains("getacct"));
    }

    #[test]
    fn version_exits_0() {
        nimptool()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("nimptool"));
    }
}

mod invalid_options {
    use super::*;

    #[test]
    fn unknown_command_flag_fails_without_usage_on_stdout() {
        nimptool()
            .args(["checkprocess", "--bogus"])
            .assert()
            .code(2)
            .stdout("")
            .stderr(predicate::str::contains("error"));
    }

    #[test]
    fn getdirs_takes_no_arguments() {
        nimptool()
            .args(["getdirs", "extra"])
            .assert()
            .code(2)
            .stdout("");
    }

    #[test]
    fn checkpidfile_takes_one_path() {
        nimptool()
            .args(["checkpidfile", "a", "b"])
            .assert()
            .code(2)
            .stdout("");
    }

    #[test]
    fn invalid_log_format_fails() {
        nimptool()
            .args(["--log-format", "xml", "checkprocess"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("error"));
    }
}

mod logging {
    use super::*;

    #[test]
    fn default_run_keeps_stderr_clean() {
        nimptool()
            .args(["checkprocess", "1"])
            .assert()
            .success()
            .stderr("");
    }

    #[test]
    fn verbose_logs_go_to_stderr_not_stdout() {
        nimptool()
            .args(["-vv", "checkprocess", "1"])
            .assert()
            .success()
            .stdout("pid,alive\n1,1\n")
            .stderr(predicate::str::contains("process root"));
    }

    #[test]
    fn jsonl_logs_are_json_lines() {
        let output = nimptool()
            .args(["-vv", "--log-format", "jsonl", "checkprocess", "1"])
            .output()
            .unwrap();
        assert!(output.status.success());
        let stderr = String::from_utf8(output.stderr).unwrap();
        assert!(!stderr.is_empty());
        for line in stderr.lines() {
            assert!(line.starts_with('{') && line.ends_with('}'), "not json: {line}");
        }
    }

    #[test]
    fn quiet_still_reports_errors() {
        nimptool()
            .args(["-q", "checkprocess", "x"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("invalid pid"));
    }
}
