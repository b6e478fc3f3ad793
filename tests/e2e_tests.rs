//! End-to-End Tests for the Break Reminder CLI.
//!
//! These run the built binary against a temporary config directory:
//! - TC-E-001: First run shows and stores the defaults
//! - TC-E-002: `settings set` persists across invocations
//! - TC-E-003: `settings reset` restores the defaults
//! - TC-E-004: `settings set` without options fails
//! - TC-E-005: `run` accepts commands on stdin and stops on `quit`
//! - TC-E-006: Interval changed while running is persisted
//! - TC-E-007: Help and shell completions
//! - TC-E-008: `settings show` follows the OS autostart registration
//! - TC-E-009: Settings changed on stdin while running

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

// ============================================================================
// Test Helpers
// ============================================================================

/// Creates a command bound to `config_dir` with logging kept quiet.
///
/// XDG autostart entries are looked up under `config_dir/xdg`.
fn reminder(config_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("break-reminder").unwrap();
    cmd.arg("--config-dir")
        .arg(config_dir)
        .env("XDG_CONFIG_HOME", config_dir.join("xdg"))
        .env_remove("RUST_LOG");
    cmd
}

fn settings_show(config_dir: &Path) -> String {
    let output = reminder(config_dir)
        .args(["settings", "show"])
        .output()
        .unwrap();
    assert!(output.status.success());
    String::from_utf8(output.stdout).unwrap()
}

// ============================================================================
// Settings
// ============================================================================

mod settings_e2e {
    use super::*;

    #[test]
    fn tc_e_001_first_run_shows_defaults() {
        let dir = TempDir::new().unwrap();

        reminder(dir.path())
            .args(["settings", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("間隔: 60 分"))
            .stdout(predicate::str::contains("モード: confirm"));

        assert!(dir.path().join("settings.json").exists());
    }

    #[test]
    fn tc_e_002_set_persists_across_invocations() {
        let dir = TempDir::new().unwrap();

        reminder(dir.path())
            .args(["settings", "set", "--interval", "90", "--mode", "auto"])
            .assert()
            .success()
            .stdout(predicate::str::contains("設定を更新しました"));

        let shown = settings_show(dir.path());
        assert!(shown.contains("間隔: 90 分"));
        assert!(shown.contains("モード: auto"));
    }

    #[test]
    fn tc_e_002_invalid_interval_becomes_default() {
        let dir = TempDir::new().unwrap();

        reminder(dir.path())
            .args(["settings", "set", "--interval", "abc"])
            .assert()
            .success();

        assert!(settings_show(dir.path()).contains("間隔: 60 分"));
    }

    #[test]
    fn tc_e_003_reset_restores_defaults() {
        let dir = TempDir::new().unwrap();

        reminder(dir.path())
            .args(["settings", "set", "--interval", "15", "--dnd", "true"])
            .assert()
            .success();

        reminder(dir.path())
            .args(["settings", "reset"])
            .assert()
            .success()
            .stdout(predicate::str::contains("既定値"));

        let shown = settings_show(dir.path());
        assert!(shown.contains("間隔: 60 分"));
        assert!(shown.contains("おやすみモード: オフ"));
    }

    #[test]
    fn tc_e_004_set_without_options_fails() {
        let dir = TempDir::new().unwrap();

        reminder(dir.path())
            .args(["settings", "set"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("エラー"));
    }
}

// ============================================================================
// Run
// ============================================================================

mod run_e2e {
    use super::*;

    #[test]
    fn tc_e_005_commands_on_stdin() {
        let dir = TempDir::new().unwrap();

        reminder(dir.path())
            .args(["run", "--paused"])
            .write_stdin("status\nstart\npause\nquit\n")
            .timeout(std::time::Duration::from_secs(10))
            .assert()
            .success()
            .stdout(predicate::str::contains("待機中"))
            .stdout(predicate::str::contains("タイマーを開始しました"))
            .stdout(predicate::str::contains("一時停止しました"));
    }

    #[test]
    fn tc_e_005_unknown_command_keeps_running() {
        let dir = TempDir::new().unwrap();

        reminder(dir.path())
            .args(["run", "--paused"])
            .write_stdin("dance\nquit\n")
            .timeout(std::time::Duration::from_secs(10))
            .assert()
            .success()
            .stderr(predicate::str::contains("不明なコマンド"))
            .stdout(predicate::str::contains("終了します"));
    }

    #[test]
    fn tc_e_009_setting_commands_are_persisted() {
        let dir = TempDir::new().unwrap();

        reminder(dir.path())
            .args(["run", "--paused"])
            .write_stdin("dnd on\nmode auto\nsound off\nquit\n")
            .timeout(std::time::Duration::from_secs(10))
            .assert()
            .success()
            .stdout(predicate::str::contains("おやすみモードをオンにしました"))
            .stdout(predicate::str::contains("モードを auto に設定しました"));

        let shown = settings_show(dir.path());
        assert!(shown.contains("おやすみモード: オン"));
        assert!(shown.contains("モード: auto"));
        assert!(shown.contains("通知音: オフ"));
    }

    #[test]
    fn tc_e_009_external_dnd_survives_running_update() {
        let dir = TempDir::new().unwrap();

        reminder(dir.path())
            .args(["settings", "set", "--dnd", "true"])
            .assert()
            .success();

        reminder(dir.path())
            .args(["run", "--paused"])
            .write_stdin("interval 45\nquit\n")
            .timeout(std::time::Duration::from_secs(10))
            .assert()
            .success();

        let shown = settings_show(dir.path());
        assert!(shown.contains("間隔: 45 分"));
        assert!(shown.contains("おやすみモード: オン"));
    }

    #[test]
    fn tc_e_006_interval_change_is_persisted() {
        let dir = TempDir::new().unwrap();

        reminder(dir.path())
            .arg("run")
            .write_stdin("interval 25\nquit\n")
            .timeout(std::time::Duration::from_secs(10))
            .assert()
            .success()
            .stdout(predicate::str::contains("間隔を 25 分に設定しました"));

        assert!(settings_show(dir.path()).contains("間隔: 25 分"));
    }
}

// ============================================================================
// Autostart
// ============================================================================

#[cfg(all(unix, not(target_os = "macos")))]
mod autostart_e2e {
    use super::*;

    #[test]
    fn tc_e_008_show_follows_registration() {
        let dir = TempDir::new().unwrap();
        let entries = dir.path().join("xdg").join("autostart");
        std::fs::create_dir_all(&entries).unwrap();
        std::fs::write(
            entries.join("break-reminder.desktop"),
            "[Desktop Entry]\nType=Application\nExec=break-reminder run\n",
        )
        .unwrap();

        assert!(settings_show(dir.path()).contains("ログイン時に起動: オン"));
        let stored: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join("settings.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(stored["settings"]["autostart"], true);

        std::fs::remove_file(entries.join("break-reminder.desktop")).unwrap();
        assert!(settings_show(dir.path()).contains("ログイン時に起動: オフ"));
    }
}

// ============================================================================
// Help and completions
// ============================================================================

mod help_e2e {
    use super::*;

    #[test]
    fn tc_e_007_help_lists_commands() {
        Command::cargo_bin("break-reminder")
            .unwrap()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("run"))
            .stdout(predicate::str::contains("settings"))
            .stdout(predicate::str::contains("autostart"));
    }

    #[test]
    fn tc_e_007_bash_completions() {
        Command::cargo_bin("break-reminder")
            .unwrap()
            .args(["completions", "bash"])
            .assert()
            .success()
            .stdout(predicate::str::contains("break-reminder"));
    }
}
