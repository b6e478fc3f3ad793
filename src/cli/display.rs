//! Display utilities for the break reminder CLI.
//!
//! This module provides formatted output for:
//! - Success messages
//! - Error messages
//! - Status display
//! - Settings display

use std::time::Duration;

use crate::daemon::StatusReport;
use crate::types::{Settings, TimerStatus, INTERVAL_PRESETS};

// ============================================================================
// Display
// ============================================================================

/// Display utilities for CLI output.
pub struct Display;

impl Display {
    /// Shows the banner printed when `run` starts.
    pub fn show_run_banner(settings: &Settings, running: bool) {
        println!("休憩リマインダー（{} 分ごと）", settings.interval_minutes);
        if running {
            println!("* タイマーを開始しました");
        } else {
            println!("  start と入力するとタイマーを開始します");
        }
        Self::show_command_help();
    }

    /// Shows the commands accepted while running.
    pub fn show_command_help() {
        println!("コマンド: start, pause, reset, interval <分>, status, ok, restart, close, quit");
        println!("設定: dnd on|off, mode confirm|auto, sound on|off");
    }

    /// Formats the `status` output.
    #[must_use]
    pub fn format_status(report: &StatusReport) -> String {
        let mut out = String::new();
        out.push_str("休憩リマインダー ステータス\n");
        out.push_str("─────────────────────────────\n");
        out.push_str(&format!("状態: {}\n", Self::status_label(report.status)));
        out.push_str(&format!(
            "残り時間: {}\n",
            Self::format_remaining(report.remaining)
        ));
        out.push_str(&format!("間隔: {} 分\n", report.interval_minutes));
        out.push_str(&format!("モード: {}\n", Self::mode_label(report)));
        if report.dnd {
            out.push_str("おやすみモード: オン\n");
        }
        if report.popup_open {
            out.push_str("ポップアップ: 表示中\n");
        }
        out
    }

    /// Shows the stored settings.
    pub fn show_settings(settings: &Settings) {
        println!("休憩リマインダー 設定");
        println!("─────────────────────────────");
        println!("間隔: {} 分", settings.interval_minutes);
        println!(
            "  プリセット: {}",
            INTERVAL_PRESETS
                .iter()
                .map(|m| m.to_string())
                .collect::<Vec<_>>()
                .join(" / ")
        );
        println!("モード: {}", settings.mode.as_str());
        println!("おやすみモード: {}", Self::on_off(settings.dnd));
        println!("通知音: {}", Self::on_off(settings.sound_enabled));
        println!("常に手前に表示: {}", Self::on_off(settings.always_on_top));
        println!("テーマ: {}", settings.theme.as_str());
        println!("ログイン時に起動: {}", Self::on_off(settings.autostart));
    }

    /// Shows a success message for `settings set`.
    pub fn show_settings_updated(settings: &Settings) {
        println!("* 設定を更新しました");
        Self::show_settings(settings);
    }

    /// Shows a success message for `settings reset`.
    pub fn show_settings_reset() {
        println!("* 設定を既定値に戻しました");
    }

    /// Shows the autostart registration.
    pub fn show_autostart_status(enabled: bool) {
        println!("ログイン時に起動: {}", Self::on_off(enabled));
    }

    /// Shows a success message for `autostart enable|disable`.
    pub fn show_autostart_changed(enabled: bool) {
        if enabled {
            println!("* ログイン時に自動起動するよう登録しました");
        } else {
            println!("* ログイン時の自動起動を解除しました");
        }
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("エラー: {}", message);
    }

    /// Returns the label shown for a timer status.
    #[must_use]
    pub fn status_label(status: TimerStatus) -> &'static str {
        match status {
            TimerStatus::Idle => "待機中",
            TimerStatus::Running => "作業中",
            TimerStatus::Paused => "一時停止中",
            TimerStatus::Expired => "休憩の時間です",
        }
    }

    /// Formats a remaining duration as `MM:SS`, truncating fractions.
    #[must_use]
    pub fn format_remaining(remaining: Duration) -> String {
        let (minutes, seconds) = Self::format_time(remaining.as_secs());
        format!("{:02}:{:02}", minutes, seconds)
    }

    /// Formats remaining seconds as (minutes, seconds).
    fn format_time(total_seconds: u64) -> (u64, u64) {
        let minutes = total_seconds / 60;
        let seconds = total_seconds % 60;
        (minutes, seconds)
    }

    fn mode_label(report: &StatusReport) -> &'static str {
        match report.mode {
            crate::types::NotificationMode::Confirm => "確認",
            crate::types::NotificationMode::Auto => "自動再開",
        }
    }

    fn on_off(value: bool) -> &'static str {
        if value {
            "オン"
        } else {
            "オフ"
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NotificationMode;

    // ------------------------------------------------------------------------
    // Format Time Tests
    // ------------------------------------------------------------------------

    mod format_time_tests {
        use super::*;

        #[test]
        fn test_format_time_zero() {
            assert_eq!(Display::format_time(0), (0, 0));
        }

        #[test]
        fn test_format_time_mixed() {
            assert_eq!(Display::format_time(90), (1, 30));
        }

        #[test]
        fn test_format_remaining_pads() {
            assert_eq!(Display::format_remaining(Duration::from_secs(65)), "01:05");
            assert_eq!(Display::format_remaining(Duration::ZERO), "00:00");
        }

        #[test]
        fn test_format_remaining_truncates() {
            assert_eq!(
                Display::format_remaining(Duration::from_millis(59_999)),
                "00:59"
            );
        }

        #[test]
        fn test_format_remaining_long_interval() {
            assert_eq!(
                Display::format_remaining(Duration::from_secs(999 * 60)),
                "999:00"
            );
        }
    }

    // ------------------------------------------------------------------------
    // Display Output Tests
    // ------------------------------------------------------------------------

    mod display_tests {
        use super::*;

        fn report(status: TimerStatus) -> StatusReport {
            StatusReport {
                status,
                remaining: Duration::from_secs(1500),
                interval_minutes: 60,
                mode: NotificationMode::Confirm,
                dnd: false,
                popup_open: false,
            }
        }

        #[test]
        fn test_status_labels_distinct() {
            let labels = [
                Display::status_label(TimerStatus::Idle),
                Display::status_label(TimerStatus::Running),
                Display::status_label(TimerStatus::Paused),
                Display::status_label(TimerStatus::Expired),
            ];
            for (i, a) in labels.iter().enumerate() {
                for b in &labels[i + 1..] {
                    assert_ne!(a, b);
                }
            }
        }

        #[test]
        fn test_format_status_running() {
            let text = Display::format_status(&report(TimerStatus::Running));
            assert!(text.contains("作業中"));
            assert!(text.contains("25:00"));
            assert!(text.contains("60 分"));
            assert!(!text.contains("おやすみモード"));
        }

        #[test]
        fn test_format_status_flags() {
            let text = Display::format_status(&StatusReport {
                dnd: true,
                popup_open: true,
                ..report(TimerStatus::Expired)
            });
            assert!(text.contains("休憩の時間です"));
            assert!(text.contains("おやすみモード: オン"));
            assert!(text.contains("ポップアップ"));
        }

        #[test]
        fn test_show_functions_no_panic() {
            Display::show_settings(&Settings::default());
            Display::show_settings_updated(&Settings::default());
            Display::show_settings_reset();
            Display::show_autostart_status(true);
            Display::show_autostart_changed(false);
            Display::show_run_banner(&Settings::default(), true);
            Display::show_error("Test error message");
        }
    }
}
