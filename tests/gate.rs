//! Action gate integration tests
//!
//! Drives the gate against a recording fake robot with a paused clock

use std::time::Duration;

use reachy_bridge::ActionCommand;
use reachy_bridge::PoseTarget;
use serde_json::json;
use tokio::time::advance;

mod common;

use common::{Event, FakeRobot, FakeSynth, announcing_gate, gate};

const ACTION_INTERVAL: Duration = Duration::from_secs(2);

fn cmd(action: &str, emotion: &str) -> ActionCommand {
    ActionCommand::new(action).with_emotion(emotion)
}

#[tokio::test(start_paused = true)]
async fn test_throttled_calls_succeed_without_directives() {
    let robot = FakeRobot::new();
    let mut gate = gate(&robot);
    assert!(gate.connect().await);

    assert!(gate.execute(&cmd("idle", "neutral")).await);
    assert_eq!(robot.directives().len(), 1);

    assert!(gate.execute(&cmd("acknowledge", "happy")).await);
    advance(ACTION_INTERVAL - Duration::from_millis(1)).await;
    assert!(gate.execute(&cmd("retreat", "angry")).await);
    assert_eq!(robot.directives().len(), 1);

    advance(Duration::from_millis(1)).await;
    assert!(gate.execute(&cmd("retreat", "angry")).await);
    assert_eq!(robot.directives().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_unsupported_action_is_rejected_for_any_catalog() {
    for catalog in [&[][..], &["joy"][..], &["dance", "neutral"][..]] {
        let robot = FakeRobot::with_moves(catalog);
        let synth = FakeSynth::new();
        let mut gate = announcing_gate(&robot, &synth);
        assert!(gate.connect().await);

        for _ in 0..3 {
            assert!(!gate.execute(&cmd("dance", "happy")).await);
            advance(ACTION_INTERVAL).await;
        }
        gate.flush_announcements().await;

        assert!(robot.directives().is_empty(), "catalog {catalog:?}");
        assert!(robot.sounds().is_empty());
        assert_eq!(synth.calls(), 0);
    }
}

#[tokio::test(start_paused = true)]
async fn test_extra_actions_reach_the_dispatcher() {
    let robot = FakeRobot::with_moves(&["joy"]);
    let mut gate = gate(&robot).with_extra_actions(&["dance".to_string()]);
    assert!(gate.connect().await);

    assert!(gate.execute(&cmd("dance", "happy")).await);
    assert_eq!(robot.directives(), vec![Event::Move("joy".to_string())]);
}

#[tokio::test(start_paused = true)]
async fn test_malformed_parameters_are_rejected() {
    let robot = FakeRobot::new();
    let mut gate = gate(&robot);
    assert!(gate.connect().await);

    let command =
        ActionCommand::from_json(r#"{"action_type": "gesture", "parameters": {"emotion": 3}}"#)
            .unwrap();
    assert!(!gate.execute(&command).await);

    advance(ACTION_INTERVAL).await;
    assert!(!gate.execute(&ActionCommand::new("")).await);
    assert!(robot.directives().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_wait_is_a_successful_no_op() {
    let robot = FakeRobot::with_moves(&["joy", "sad"]);
    let mut gate = gate(&robot);
    assert!(gate.connect().await);

    assert!(gate.execute(&cmd("wait", "sad")).await);
    assert!(robot.directives().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_alias_move_is_played() {
    let robot = FakeRobot::with_moves(&["joy", "neutral"]);
    let mut gate = gate(&robot);
    assert!(gate.connect().await);

    assert!(gate.execute(&cmd("acknowledge", "happy")).await);
    assert_eq!(robot.directives(), vec![Event::Move("joy".to_string())]);
}

#[tokio::test(start_paused = true)]
async fn test_empty_catalog_falls_back_to_pose() {
    let robot = FakeRobot::new();
    let mut gate = gate(&robot);
    assert!(gate.connect().await);

    assert!(gate.execute(&cmd("comfort", "sad")).await);
    let directives = robot.directives();
    assert_eq!(directives.len(), 1);
    assert!(matches!(
        &directives[0],
        Event::Pose(PoseTarget {
            antennas: Some(_),
            body_yaw: None,
            ..
        })
    ));
}

#[tokio::test(start_paused = true)]
async fn test_directive_failure_returns_false_without_announcement() {
    let robot = FakeRobot::failing_directives();
    let synth = FakeSynth::new();
    let mut gate = announcing_gate(&robot, &synth);
    assert!(gate.connect().await);

    assert!(!gate.execute(&cmd("idle", "happy")).await);
    gate.flush_announcements().await;
    assert_eq!(synth.calls(), 0);

    // Connection survives a failed directive
    assert!(gate.is_connected());
    advance(ACTION_INTERVAL).await;
    assert!(gate.execute(&cmd("wait", "happy")).await);
}

#[tokio::test(start_paused = true)]
async fn test_changed_emotion_announces_again() {
    let robot = FakeRobot::new();
    let synth = FakeSynth::new();
    let mut gate = announcing_gate(&robot, &synth).with_action_interval(Duration::from_millis(10));
    assert!(gate.connect().await);

    assert!(gate.execute(&cmd("idle", "happy")).await);
    advance(Duration::from_millis(10)).await;
    assert!(gate.execute(&cmd("idle", "sad")).await);
    gate.flush_announcements().await;

    assert_eq!(synth.calls(), 2);
    assert_eq!(
        synth.texts(),
        vec!["I detect you seem happy", "I detect you seem sad"]
    );
}

#[tokio::test(start_paused = true)]
async fn test_repeated_emotion_announces_once_per_cooldown() {
    let robot = FakeRobot::new();
    let synth = FakeSynth::new();
    let mut gate = announcing_gate(&robot, &synth).with_action_interval(Duration::from_millis(10));
    assert!(gate.connect().await);

    assert!(gate.execute(&cmd("idle", "happy")).await);
    advance(Duration::from_millis(10)).await;
    assert!(gate.execute(&cmd("approach", "happy")).await);
    gate.flush_announcements().await;
    assert_eq!(synth.calls(), 1);

    advance(Duration::from_secs(5)).await;
    assert!(gate.execute(&cmd("idle", "happy")).await);
    gate.flush_announcements().await;
    assert_eq!(synth.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_announcement_plays_mono_16k_and_cleans_up() {
    let robot = FakeRobot::new();
    let synth = FakeSynth::new();
    let mut gate = announcing_gate(&robot, &synth);
    assert!(gate.connect().await);

    assert!(gate.execute(&cmd("speak", "surprised")).await);
    gate.flush_announcements().await;

    assert!(robot.directives().is_empty());
    let sounds = robot.sounds();
    assert_eq!(sounds.len(), 1);
    let Event::Sound {
        path,
        channels,
        sample_rate,
    } = &sounds[0]
    else {
        unreachable!()
    };
    assert_eq!(*channels, 1);
    assert_eq!(*sample_rate, 16000);
    assert!(!path.exists());
}

#[tokio::test(start_paused = true)]
async fn test_failed_synthesis_keeps_motion_result() {
    let robot = FakeRobot::with_moves(&["joy"]);
    let synth = FakeSynth::failing();
    let mut gate = announcing_gate(&robot, &synth);
    assert!(gate.connect().await);

    assert!(gate.execute(&cmd("acknowledge", "happy")).await);
    gate.flush_announcements().await;

    assert_eq!(synth.calls(), 1);
    assert!(robot.sounds().is_empty());
    assert_eq!(robot.directives(), vec![Event::Move("joy".to_string())]);
}

#[tokio::test(start_paused = true)]
async fn test_failed_playback_keeps_motion_result() {
    let robot = FakeRobot::failing_sound();
    let synth = FakeSynth::new();
    let mut gate = announcing_gate(&robot, &synth);
    assert!(gate.connect().await);

    assert!(gate.execute(&cmd("idle", "calm")).await);
    gate.flush_announcements().await;
    assert_eq!(synth.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_announcements_disabled() {
    let robot = FakeRobot::new();
    let mut gate = gate(&robot);
    assert!(gate.connect().await);

    assert!(!gate.announcements_enabled());
    assert!(gate.execute(&cmd("speak", "happy")).await);
    assert_eq!(gate.pending_announcements(), 0);
    assert!(robot.sounds().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_disconnected_gate_short_circuits() {
    let robot = FakeRobot::with_moves(&["joy"]);
    let synth = FakeSynth::new();
    let mut gate = announcing_gate(&robot, &synth);

    assert!(!gate.execute(&cmd("acknowledge", "happy")).await);
    assert_eq!(robot.connects(), 0);
    assert!(robot.events().is_empty());

    assert!(gate.connect().await);
    gate.disconnect().await;
    assert_eq!(robot.events(), vec![Event::Disconnect]);

    advance(ACTION_INTERVAL).await;
    assert!(!gate.execute(&cmd("acknowledge", "happy")).await);
    gate.flush_announcements().await;
    assert_eq!(robot.events(), vec![Event::Disconnect]);
    assert_eq!(synth.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_stops_pending_announcements() {
    let robot = FakeRobot::new();
    let synth = FakeSynth::new();
    let mut gate = announcing_gate(&robot, &synth);
    assert!(gate.connect().await);

    assert!(gate.execute(&cmd("speak", "happy")).await);
    gate.disconnect().await;
    gate.flush_announcements().await;

    let events = robot.events();
    let released = events
        .iter()
        .position(|e| *e == Event::Disconnect)
        .unwrap();
    assert!(
        events[released..]
            .iter()
            .all(|e| !matches!(e, Event::Sound { .. })),
        "speaker used after disconnect: {events:?}"
    );
    assert_eq!(gate.pending_announcements(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_lets_announcements_finish() {
    let robot = FakeRobot::new();
    let synth = FakeSynth::new();
    let mut gate = announcing_gate(&robot, &synth);
    assert!(gate.connect().await);

    assert!(gate.execute(&cmd("speak", "happy")).await);
    gate.shutdown(Duration::from_secs(5)).await;

    let events = robot.events();
    assert_eq!(events.len(), 2, "{events:?}");
    assert!(matches!(events[0], Event::Sound { .. }));
    assert_eq!(events[1], Event::Disconnect);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_abandons_stuck_announcements() {
    let robot = FakeRobot::new();
    let synth = FakeSynth::hanging();
    let mut gate = announcing_gate(&robot, &synth);
    assert!(gate.connect().await);

    assert!(gate.execute(&cmd("speak", "happy")).await);
    let started = tokio::time::Instant::now();
    gate.shutdown(Duration::from_secs(1)).await;

    assert!(started.elapsed() >= Duration::from_secs(1));
    assert!(!gate.is_connected());
    assert_eq!(gate.pending_announcements(), 0);
    assert_eq!(synth.calls(), 1);
    assert_eq!(robot.events(), vec![Event::Disconnect]);
}

#[tokio::test(start_paused = true)]
async fn test_unreachable_robot() {
    let robot = FakeRobot::unreachable();
    let mut gate = gate(&robot);

    assert!(!gate.connect().await);
    assert!(!gate.is_connected());
    assert!(!gate.execute(&cmd("idle", "neutral")).await);
    assert!(robot.events().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_reconnect_resets_throttle() {
    let robot = FakeRobot::new();
    let mut gate = gate(&robot);
    assert!(gate.connect().await);
    assert!(gate.execute(&cmd("idle", "neutral")).await);

    gate.disconnect().await;
    assert!(gate.connect().await);
    assert!(gate.execute(&cmd("approach", "neutral")).await);
    assert_eq!(robot.directives().len(), 2);
}

#[test]
fn test_command_wire_format() {
    let command: ActionCommand = serde_json::from_value(json!({
        "action_type": "de_escalate",
        "parameters": null
    }))
    .unwrap();
    assert_eq!(command.emotion(), "neutral");
    assert_eq!(
        serde_json::to_value(&command).unwrap()["action_type"],
        "de_escalate"
    );
}
