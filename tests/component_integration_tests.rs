//! Component integration tests.
//!
//! The runner is wired to a manual clock and mock collaborators, so each
//! test drives a full expiry cycle without sleeping:
//! - TC-I-001: confirm mode expiry delivers sound, attention, popup once
//! - TC-I-002: ok pauses, restart starts a new cycle
//! - TC-I-003: auto mode restarts after ten countdown ticks
//! - TC-I-004: manual close cancels the auto countdown
//! - TC-I-005: do-not-disturb suppresses every signal
//! - TC-I-006: settings survive a persist/load round trip on disk
//! - TC-I-007: autostart registration follows the settings

use std::sync::Arc;
use std::time::Duration;

use break_reminder::autostart::{self, AutostartManager, MockAutostart, XdgAutostart};
use break_reminder::daemon::{CommandReply, DaemonCommand, ManualClock, Runner};
use break_reminder::notification::{MockAttentionRequester, NotificationDispatcher};
use break_reminder::popup::{MockPopupSurface, PopupCall, PopupResolution, PopupSurface};
use break_reminder::settings::{
    LayeredPersistence, MemoryPersistence, SettingsPersistence, SettingsStore,
};
use break_reminder::sound::{MockSoundPlayer, SoundSource};
use break_reminder::types::{NotificationMode, Settings, SettingsPatch, Theme, TimerStatus};

// ============================================================================
// Test Helpers
// ============================================================================

struct Fixture {
    runner: Runner,
    clock: ManualClock,
    sound: Arc<MockSoundPlayer>,
    attention: Arc<MockAttentionRequester>,
    surface: Arc<MockPopupSurface>,
}

fn create_fixture(settings: Settings) -> Fixture {
    let persistence = Arc::new(MemoryPersistence::with_settings(&settings));
    let (store, _writer) = SettingsStore::new(settings, persistence);

    let clock = ManualClock::new();
    let sound = Arc::new(MockSoundPlayer::new());
    let attention = Arc::new(MockAttentionRequester::new());
    let surface = Arc::new(MockPopupSurface::new());
    let surface_dyn: Arc<dyn PopupSurface> = surface.clone();

    let dispatcher = NotificationDispatcher::new(
        store.subscribe(),
        attention.clone(),
        Arc::clone(&surface_dyn),
    )
    .with_sound(sound.clone(), SoundSource::Chime);

    let runner = Runner::new(store, Arc::new(clock.clone()), dispatcher, surface_dyn);
    Fixture {
        runner,
        clock,
        sound,
        attention,
        surface,
    }
}

fn one_minute(mode: NotificationMode) -> Settings {
    Settings {
        interval_minutes: 1,
        mode,
        ..Settings::default()
    }
}

/// Starts the timer and lets one full minute pass.
fn expire(fx: &mut Fixture) {
    fx.runner.handle_command(DaemonCommand::Start);
    fx.clock.advance(Duration::from_secs(60));
    fx.runner.on_engine_tick();
}

// ============================================================================
// Confirm mode
// ============================================================================

mod confirm_integration {
    use super::*;

    #[test]
    fn tc_i_001_expiry_delivers_every_signal_once() {
        let mut fx = create_fixture(one_minute(NotificationMode::Confirm));
        expire(&mut fx);

        assert_eq!(fx.runner.engine().status(), TimerStatus::Expired);
        assert_eq!(fx.sound.get_play_calls(), vec![SoundSource::Chime]);
        assert_eq!(fx.attention.request_count(), 1);
        assert_eq!(
            fx.surface.get_calls(),
            vec![PopupCall::Show(NotificationMode::Confirm)]
        );
        assert_eq!(fx.runner.popup().mode(), Some(NotificationMode::Confirm));

        // Staying expired does not signal again.
        fx.clock.advance(Duration::from_secs(60));
        fx.runner.on_engine_tick();
        assert_eq!(fx.sound.play_count(), 1);
        assert_eq!(fx.surface.show_count(), 1);
    }

    #[test]
    fn tc_i_002_ok_pauses_then_start_begins_new_cycle() {
        let mut fx = create_fixture(one_minute(NotificationMode::Confirm));
        expire(&mut fx);

        let reply = fx.runner.handle_command(DaemonCommand::Ok);
        assert_eq!(reply, CommandReply::Resolved(PopupResolution::Pause));
        assert!(!fx.runner.popup().is_open());
        assert_eq!(fx.surface.close_count(), 1);
        assert_ne!(fx.runner.engine().status(), TimerStatus::Running);

        let reply = fx.runner.handle_command(DaemonCommand::Start);
        assert_eq!(reply, CommandReply::Restarted);
        assert_eq!(fx.runner.engine().status(), TimerStatus::Running);
        assert_eq!(fx.runner.engine().remaining(), Duration::from_secs(60));
    }

    #[test]
    fn tc_i_002_restart_starts_full_cycle_and_closes_once() {
        let mut fx = create_fixture(one_minute(NotificationMode::Confirm));
        expire(&mut fx);

        let reply = fx.runner.handle_command(DaemonCommand::Restart);
        assert_eq!(reply, CommandReply::Resolved(PopupResolution::RestartCycle));
        assert_eq!(fx.runner.engine().status(), TimerStatus::Running);
        assert_eq!(fx.runner.engine().remaining(), Duration::from_secs(60));
        assert_eq!(fx.surface.close_count(), 1);

        // The next expiry signals again.
        fx.clock.advance(Duration::from_secs(60));
        fx.runner.on_engine_tick();
        assert_eq!(fx.surface.show_count(), 2);
        assert_eq!(fx.attention.request_count(), 2);
    }

    #[test]
    fn reset_while_expired_closes_popup() {
        let mut fx = create_fixture(one_minute(NotificationMode::Confirm));
        expire(&mut fx);

        fx.runner.handle_command(DaemonCommand::Reset);
        assert_eq!(fx.runner.engine().status(), TimerStatus::Idle);
        assert!(!fx.runner.popup().is_open());
        assert_eq!(fx.surface.close_count(), 1);
    }
}

// ============================================================================
// Auto mode
// ============================================================================

mod auto_integration {
    use super::*;

    #[test]
    fn tc_i_003_restarts_after_ten_ticks() {
        let mut fx = create_fixture(one_minute(NotificationMode::Auto));
        expire(&mut fx);
        assert!(fx.runner.popup().is_counting_down());
        fx.surface.clear_recorded();

        for _ in 0..9 {
            fx.runner.on_countdown_tick();
        }
        assert_eq!(fx.runner.engine().status(), TimerStatus::Expired);
        let expected: Vec<PopupCall> = (1..=9).rev().map(PopupCall::Countdown).collect();
        assert_eq!(fx.surface.get_calls(), expected);

        fx.runner.on_countdown_tick();
        assert_eq!(fx.runner.engine().status(), TimerStatus::Running);
        assert!(!fx.runner.popup().is_open());
        assert_eq!(fx.surface.close_count(), 1);

        // Further ticks do nothing once the interaction is over.
        fx.runner.on_countdown_tick();
        assert_eq!(fx.runner.engine().status(), TimerStatus::Running);
        assert_eq!(fx.surface.close_count(), 1);
    }

    #[test]
    fn tc_i_004_close_cancels_countdown() {
        let mut fx = create_fixture(one_minute(NotificationMode::Auto));
        expire(&mut fx);

        for _ in 0..5 {
            fx.runner.on_countdown_tick();
        }
        let reply = fx.runner.handle_command(DaemonCommand::Close);
        assert_eq!(reply, CommandReply::Resolved(PopupResolution::Pause));
        assert!(!fx.runner.popup().is_counting_down());

        for _ in 0..10 {
            fx.runner.on_countdown_tick();
        }
        assert_ne!(fx.runner.engine().status(), TimerStatus::Running);
    }

    #[test]
    fn restart_is_not_offered_in_auto_mode() {
        let mut fx = create_fixture(one_minute(NotificationMode::Auto));
        expire(&mut fx);

        let reply = fx.runner.handle_command(DaemonCommand::Restart);
        assert_eq!(reply, CommandReply::Rejected(DaemonCommand::Restart));
        assert!(fx.runner.popup().is_counting_down());
    }

    #[test]
    fn mode_change_while_open_applies_next_time() {
        let mut fx = create_fixture(one_minute(NotificationMode::Auto));
        expire(&mut fx);

        fx.runner.store().update(&SettingsPatch {
            mode: Some(NotificationMode::Confirm),
            ..SettingsPatch::default()
        });
        assert_eq!(fx.runner.popup().mode(), Some(NotificationMode::Auto));

        for _ in 0..10 {
            fx.runner.on_countdown_tick();
        }
        assert_eq!(fx.runner.engine().status(), TimerStatus::Running);

        fx.clock.advance(Duration::from_secs(60));
        fx.runner.on_engine_tick();
        assert_eq!(fx.runner.popup().mode(), Some(NotificationMode::Confirm));
    }
}

// ============================================================================
// Do not disturb
// ============================================================================

mod dnd_integration {
    use super::*;

    #[test]
    fn tc_i_005_dnd_suppresses_every_signal() {
        let mut fx = create_fixture(Settings {
            dnd: true,
            ..one_minute(NotificationMode::Auto)
        });
        expire(&mut fx);

        assert_eq!(fx.runner.engine().status(), TimerStatus::Expired);
        assert_eq!(fx.sound.play_count(), 0);
        assert_eq!(fx.attention.request_count(), 0);
        assert!(fx.surface.get_calls().is_empty());
        assert!(!fx.runner.popup().is_open());
    }

    #[test]
    fn sound_disabled_still_shows_popup() {
        let mut fx = create_fixture(Settings {
            sound_enabled: false,
            ..one_minute(NotificationMode::Confirm)
        });
        expire(&mut fx);

        assert_eq!(fx.sound.play_count(), 0);
        assert_eq!(fx.attention.request_count(), 1);
        assert_eq!(fx.surface.show_count(), 1);
    }

    #[test]
    fn failing_collaborators_do_not_stop_expiry() {
        let mut fx = create_fixture(one_minute(NotificationMode::Confirm));
        fx.sound.set_should_fail(true);
        fx.attention.set_should_fail(true);
        fx.surface.set_should_fail(true);
        expire(&mut fx);

        assert_eq!(fx.runner.engine().status(), TimerStatus::Expired);
        assert!(fx.runner.popup().is_open());
    }
}

// ============================================================================
// Settings
// ============================================================================

mod settings_integration {
    use super::*;

    #[test]
    fn interval_command_updates_store_and_engine() {
        let mut fx = create_fixture(Settings::default());
        fx.runner.handle_command(DaemonCommand::Start);

        let reply = fx.runner.handle_command(DaemonCommand::Interval(45));
        assert_eq!(reply, CommandReply::IntervalSet(45));
        assert_eq!(fx.runner.store().snapshot().interval_minutes, 45);
        assert_eq!(fx.runner.engine().remaining(), Duration::from_secs(45 * 60));
    }

    #[test]
    fn interval_zero_falls_back_to_default() {
        let mut fx = create_fixture(Settings::default());
        let reply = fx.runner.handle_command(DaemonCommand::Interval(0));
        assert_eq!(reply, CommandReply::IntervalSet(60));
    }

    #[test]
    fn update_dnd_leaves_other_fields() {
        let settings = Settings {
            interval_minutes: 25,
            mode: NotificationMode::Auto,
            theme: Theme::Light,
            ..Settings::default()
        };
        let persistence = Arc::new(MemoryPersistence::new());
        let (store, _writer) = SettingsStore::new(settings.clone(), persistence);

        let updated = store.update(&SettingsPatch::dnd(true));
        assert_eq!(
            updated,
            Settings {
                dnd: true,
                ..settings
            }
        );
    }

    #[tokio::test]
    async fn tc_i_006_round_trip_through_disk() {
        let dir = tempfile::TempDir::new().unwrap();

        let (store, writer) =
            SettingsStore::load(Arc::new(LayeredPersistence::for_app(Some(dir.path()))));
        let writer = tokio::spawn(writer.run());
        let saved = store.update(&SettingsPatch {
            interval_minutes: Some(90),
            mode: Some(NotificationMode::Auto),
            ..SettingsPatch::default()
        });
        drop(store);
        writer.await.unwrap();

        let loaded = LayeredPersistence::for_app(Some(dir.path()))
            .load()
            .unwrap();
        assert_eq!(loaded, Some(saved));
    }

    #[test]
    fn corrupt_primary_uses_fallback() {
        let dir = tempfile::TempDir::new().unwrap();
        let settings = Settings {
            interval_minutes: 15,
            ..Settings::default()
        };
        LayeredPersistence::for_app(Some(dir.path()))
            .persist(&settings)
            .unwrap();

        std::fs::write(dir.path().join("settings.json"), "{ not json").unwrap();

        let (store, _writer) =
            SettingsStore::load(Arc::new(LayeredPersistence::for_app(Some(dir.path()))));
        assert_eq!(store.snapshot(), settings);
    }
}

// ============================================================================
// Autostart
// ============================================================================

mod autostart_integration {
    use super::*;

    #[test]
    fn tc_i_007_enable_writes_entry_and_setting() {
        let dir = tempfile::TempDir::new().unwrap();
        let manager = XdgAutostart::new(dir.path().join("autostart"), "/usr/bin/break-reminder");
        let (store, _writer) =
            SettingsStore::new(Settings::default(), Arc::new(MemoryPersistence::new()));

        autostart::set_autostart(&store, &manager, true).unwrap();
        assert!(store.snapshot().autostart);
        assert!(manager.is_enabled().unwrap());
        assert!(manager.desktop_path().exists());

        autostart::set_autostart(&store, &manager, false).unwrap();
        assert!(!store.snapshot().autostart);
        assert!(!manager.is_enabled().unwrap());
    }

    #[test]
    fn reconcile_trusts_registration() {
        let manager = MockAutostart::new(true);
        let (store, _writer) =
            SettingsStore::new(Settings::default(), Arc::new(MemoryPersistence::new()));

        assert!(autostart::reconcile(&store, &manager).unwrap());
        assert!(store.snapshot().autostart);
        assert_eq!(manager.set_call_count(), 0);
    }
}
