//! Shared test utilities
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reachy_bridge::announce::audio::{Clip, encode_wav};
use reachy_bridge::{
    ActionGate, Announcer, Error, PoseTarget, Result, Robot, RobotConnection, SpeechSynthesizer,
};

/// Something the fake robot was asked to do
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Pose(PoseTarget),
    Move(String),
    Sound {
        path: PathBuf,
        channels: u16,
        sample_rate: u32,
    },
    Disconnect,
}

#[derive(Default)]
struct FakeState {
    moves: Vec<String>,
    unreachable: bool,
    fail_directives: bool,
    fail_sound: bool,
    connects: AtomicUsize,
    events: Mutex<Vec<Event>>,
}

/// Robot that records every directive instead of moving
#[derive(Clone, Default)]
pub struct FakeRobot {
    state: Arc<FakeState>,
}

impl FakeRobot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_moves(moves: &[&str]) -> Self {
        Self::build(|state| state.moves = moves.iter().map(ToString::to_string).collect())
    }

    #[must_use]
    pub fn unreachable() -> Self {
        Self::build(|state| state.unreachable = true)
    }

    #[must_use]
    pub fn failing_directives() -> Self {
        Self::build(|state| state.fail_directives = true)
    }

    #[must_use]
    pub fn failing_sound() -> Self {
        Self::build(|state| state.fail_sound = true)
    }

    fn build(configure: impl FnOnce(&mut FakeState)) -> Self {
        let mut state = FakeState::default();
        configure(&mut state);
        Self {
            state: Arc::new(state),
        }
    }

    /// All recorded events
    pub fn events(&self) -> Vec<Event> {
        self.state.events.lock().unwrap().clone()
    }

    /// Recorded pose and move directives
    pub fn directives(&self) -> Vec<Event> {
        self.events()
            .into_iter()
            .filter(|e| matches!(e, Event::Pose(_) | Event::Move(_)))
            .collect()
    }

    /// Recorded speaker playbacks
    pub fn sounds(&self) -> Vec<Event> {
        self.events()
            .into_iter()
            .filter(|e| matches!(e, Event::Sound { .. }))
            .collect()
    }

    pub fn connects(&self) -> usize {
        self.state.connects.load(Ordering::SeqCst)
    }

    fn record(&self, event: Event) {
        self.state.events.lock().unwrap().push(event);
    }
}

#[async_trait]
impl Robot for FakeRobot {
    async fn connect(&self) -> Result<Arc<dyn RobotConnection>> {
        self.state.connects.fetch_add(1, Ordering::SeqCst);
        if self.state.unreachable {
            return Err(Error::Connection("connection refused".to_string()));
        }
        Ok(Arc::new(self.clone()))
    }
}

#[async_trait]
impl RobotConnection for FakeRobot {
    async fn goto_target(&self, target: &PoseTarget) -> Result<()> {
        if self.state.fail_directives {
            return Err(Error::Directive("joint limit exceeded".to_string()));
        }
        self.record(Event::Pose(*target));
        Ok(())
    }

    async fn list_moves(&self) -> Result<Vec<String>> {
        Ok(self.state.moves.clone())
    }

    async fn play_move(&self, name: &str, _initial_goto: Duration) -> Result<()> {
        if self.state.fail_directives {
            return Err(Error::Directive("move not found".to_string()));
        }
        self.record(Event::Move(name.to_string()));
        Ok(())
    }

    async fn play_sound(&self, wav_path: &Path) -> Result<()> {
        if self.state.fail_sound {
            return Err(Error::Directive("speaker busy".to_string()));
        }
        let reader = hound::WavReader::open(wav_path).map_err(|e| Error::Audio(e.to_string()))?;
        let spec = reader.spec();
        self.record(Event::Sound {
            path: wav_path.to_path_buf(),
            channels: spec.channels,
            sample_rate: spec.sample_rate,
        });
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.record(Event::Disconnect);
        Ok(())
    }
}

/// Synthesizer that returns a short WAV tone and counts requests
#[derive(Default)]
pub struct FakeSynth {
    fail: bool,
    hang: bool,
    calls: AtomicUsize,
    texts: Mutex<Vec<String>>,
}

impl FakeSynth {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    #[must_use]
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Self::default()
        })
    }

    /// Synthesizer whose requests never complete
    #[must_use]
    pub fn hanging() -> Arc<Self> {
        Arc::new(Self {
            hang: true,
            ..Self::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechSynthesizer for FakeSynth {
    async fn synthesize(&self, text: &str, _language: &str) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.texts.lock().unwrap().push(text.to_string());
        if self.hang {
            std::future::pending::<()>().await;
        }
        if self.fail {
            return Err(Error::Tts("service unavailable".to_string()));
        }
        encode_wav(&Clip {
            samples: vec![0.25; 2205],
            sample_rate: 22050,
        })
    }
}

/// Gate over `robot` with announcements disabled
pub fn gate(robot: &FakeRobot) -> ActionGate {
    ActionGate::new(Arc::new(robot.clone()))
}

/// Gate over `robot` announcing through `synth`
pub fn announcing_gate(robot: &FakeRobot, synth: &Arc<FakeSynth>) -> ActionGate {
    let synthesizer: Arc<dyn SpeechSynthesizer> = synth.clone();
    gate(robot).with_announcer(Announcer::new(synthesizer), Duration::from_secs(5))
}
