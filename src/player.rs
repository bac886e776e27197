//! Playback façade over an external media engine
//!
//! Decoding and rendering live outside this crate. A [`MediaEngine`] is the
//! binding to whatever does that work (libVLC, mpv, a spawned player
//! process); [`Player`] adds state tracking, argument clamping and an event
//! channel the UI drains on its own schedule.

use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{channel, Receiver, Sender};

use tracing::{debug, info, warn};

use crate::error::{Error, Result};

/// Operations a video engine binding must provide
pub trait MediaEngine {
    fn load(&mut self, url: &str) -> Result<()>;
    fn play(&mut self) -> Result<()>;
    /// Toggle pause/resume
    fn pause(&mut self);
    fn stop(&mut self);
    fn is_playing(&self) -> bool;
    /// Current time in ms
    fn time(&self) -> i64;
    /// Media length in ms, 0 when unknown (live streams)
    fn length(&self) -> i64;
    fn set_time(&mut self, ms: i64);
    /// Position as 0.0..=1.0
    fn position(&self) -> f32;
    fn set_position(&mut self, position: f32);
    /// Volume 0..=100
    fn volume(&self) -> u8;
    fn set_volume(&mut self, volume: u8);
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlayerState {
    Stopped,
    Playing,
    Paused,
    Error(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    TimeChanged(i64),
    PositionChanged(f32),
    StateChanged(PlayerState),
    Error(String),
}

pub struct Player<E: MediaEngine> {
    engine: E,
    state: PlayerState,
    current_url: Option<String>,
    event_sender: Sender<PlayerEvent>,
    event_receiver: Receiver<PlayerEvent>,
}

impl<E: MediaEngine> Player<E> {
    pub fn new(engine: E) -> Self {
        let (event_sender, event_receiver) = channel();
        Self {
            engine,
            state: PlayerState::Stopped,
            current_url: None,
            event_sender,
            event_receiver,
        }
    }

    pub fn state(&self) -> &PlayerState {
        &self.state
    }

    pub fn current_url(&self) -> Option<&str> {
        self.current_url.as_deref()
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    fn emit(&self, event: PlayerEvent) {
        // Receiver lives in self, so send only fails during drop
        let _ = self.event_sender.send(event);
    }

    fn set_state(&mut self, state: PlayerState) {
        if self.state != state {
            self.state = state.clone();
            self.emit(PlayerEvent::StateChanged(state));
        }
    }

    fn fail(&mut self, message: String) {
        warn!(error = %message, "playback error");
        self.emit(PlayerEvent::Error(message.clone()));
        self.set_state(PlayerState::Error(message));
    }

    /// Load `url` and start playing it.
    pub fn play(&mut self, url: &str) -> Result<()> {
        info!(url, "starting playback");
        let started = self.engine.load(url).and_then(|_| self.engine.play());
        match started {
            Ok(()) => {
                self.current_url = Some(url.to_string());
                self.set_state(PlayerState::Playing);
                Ok(())
            }
            Err(e) => {
                self.fail(e.to_string());
                Err(e)
            }
        }
    }

    /// Pause when playing, resume when paused. No-op otherwise.
    pub fn toggle_pause(&mut self) {
        let next = match self.state {
            PlayerState::Playing => PlayerState::Paused,
            PlayerState::Paused => PlayerState::Playing,
            _ => return,
        };
        self.engine.pause();
        self.set_state(next);
    }

    pub fn stop(&mut self) {
        self.engine.stop();
        self.set_state(PlayerState::Stopped);
    }

    /// Seek to a normalized position; out-of-range values are clamped.
    pub fn seek_position(&mut self, position: f32) {
        let position = if position.is_nan() { 0.0 } else { position.clamp(0.0, 1.0) };
        self.engine.set_position(position);
    }

    /// Seek to an absolute time in ms, clamped to the media length when known.
    pub fn seek_time(&mut self, ms: i64) {
        let length = self.engine.length();
        let ms = if length > 0 { ms.clamp(0, length) } else { ms.max(0) };
        self.engine.set_time(ms);
    }

    pub fn volume(&self) -> u8 {
        self.engine.volume()
    }

    pub fn set_volume(&mut self, volume: u8) {
        self.engine.set_volume(volume.min(100));
    }

    /// Periodic update, meant to be called from a UI timer.
    ///
    /// Emits time and position while playing and notices when the engine
    /// stopped on its own (stream ended, player window closed).
    pub fn tick(&mut self) {
        if self.state != PlayerState::Playing {
            return;
        }
        if !self.engine.is_playing() {
            debug!("engine stopped on its own");
            self.set_state(PlayerState::Stopped);
            return;
        }
        self.emit(PlayerEvent::TimeChanged(self.engine.time()));
        self.emit(PlayerEvent::PositionChanged(self.engine.position()));
    }

    /// Drain pending events
    pub fn poll_events(&self) -> Vec<PlayerEvent> {
        self.event_receiver.try_iter().collect()
    }
}

/// Engine that hands the stream to an external player process.
///
/// Supports load/play/stop only; seeking and volume are not reachable once
/// the process owns the stream.
pub struct ExternalPlayer {
    program: String,
    user_agent: Option<String>,
    volume: u8,
    url: Option<String>,
    child: Option<Child>,
}

impl ExternalPlayer {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            user_agent: None,
            volume: 100,
            url: None,
            child: None,
        }
    }

    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = Some(user_agent.to_string());
        self
    }

    /// Arguments for the configured program, following each player's
    /// command-line conventions.
    pub fn args_for(&self, url: &str) -> Vec<String> {
        let program = self.program.to_lowercase();
        let mut args = vec![url.to_string()];

        if program.contains("ffplay") {
            args.extend(["-autoexit".to_string(), "-volume".to_string(), self.volume.to_string()]);
            if let Some(ua) = &self.user_agent {
                args.extend(["-user_agent".to_string(), ua.clone()]);
            }
        } else if program.contains("mpv") {
            args.push(format!("--volume={}", self.volume));
            if let Some(ua) = &self.user_agent {
                args.push(format!("--user-agent={}", ua));
            }
        } else if program.contains("vlc") {
            if let Some(ua) = &self.user_agent {
                args.push(format!("--http-user-agent={}", ua));
            }
        }
        args
    }

    /// Block until the launched process exits.
    pub fn wait(&mut self) -> Result<Option<i32>> {
        match self.child.take() {
            Some(mut child) => {
                let status = child
                    .wait()
                    .map_err(|e| Error::Player(format!("{}: {}", self.program, e)))?;
                Ok(status.code())
            }
            None => Ok(None),
        }
    }

    fn reap(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

impl MediaEngine for ExternalPlayer {
    fn load(&mut self, url: &str) -> Result<()> {
        self.reap();
        self.url = Some(url.to_string());
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        if self.child.is_some() {
            return Ok(());
        }
        let url = self
            .url
            .clone()
            .ok_or_else(|| Error::Player("no media loaded".to_string()))?;

        let child = Command::new(&self.program)
            .args(self.args_for(&url))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| Error::Player(format!("failed to launch {}: {}", self.program, e)))?;
        info!(program = %self.program, pid = child.id(), "player launched");
        self.child = Some(child);
        Ok(())
    }

    fn pause(&mut self) {}

    fn stop(&mut self) {
        self.reap();
    }

    fn is_playing(&self) -> bool {
        self.child.is_some()
    }

    fn time(&self) -> i64 {
        0
    }

    fn length(&self) -> i64 {
        0
    }

    fn set_time(&mut self, _ms: i64) {}

    fn position(&self) -> f32 {
        0.0
    }

    fn set_position(&mut self, _position: f32) {}

    fn volume(&self) -> u8 {
        self.volume
    }

    /// Applies to the next launch
    fn set_volume(&mut self, volume: u8) {
        self.volume = volume;
    }
}

impl Drop for ExternalPlayer {
    fn drop(&mut self) {
        self.reap();
    }
}
