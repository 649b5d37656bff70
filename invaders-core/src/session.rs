//! Frame-loop driver binding a [`LiveGame`] to its platform hooks.
//!
//! The host owns scheduling: it calls [`Session::frame`] once per animation
//! frame and stops when the session reports [`FrameOutcome::Halt`]. Input
//! callbacks may fire between frames and mutate the game directly.

use tracing::{debug, error, info, trace, warn};

use crate::constants::HAPTIC_TOUCH_FIRE;
use crate::error::InitError;
use crate::render::{build_frame, DrawCommand};
use crate::sim::{Arena, GameEvent, GameMode, LiveGame, WorldSnapshot};

/// 2D render target.
pub trait Canvas {
    fn size(&self) -> (f64, f64);
    fn draw(&mut self, commands: &[DrawCommand]);
}

/// Vibration sink. Returns `false` when the platform has no vibration support.
pub trait Haptics {
    fn vibrate(&mut self, pattern: &[u32]) -> bool;
}

/// Local best-score persistence.
pub trait HighScoreStore {
    fn load(&mut self) -> u32;
    fn save(&mut self, score: u32) -> Result<(), String>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoHaptics;

impl Haptics for NoHaptics {
    fn vibrate(&mut self, _pattern: &[u32]) -> bool {
        false
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct MemoryHighScore {
    pub best: u32,
}

impl HighScoreStore for MemoryHighScore {
    fn load(&mut self) -> u32 {
        self.best
    }

    fn save(&mut self, score: u32) -> Result<(), String> {
        self.best = score;
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    Reschedule,
    Halt,
}

pub struct Session<C, H, S> {
    game: LiveGame,
    canvas: C,
    haptics: H,
    store: S,
    high_score: u32,
}

impl<C, H, S> Session<C, H, S>
where
    C: Canvas,
    H: Haptics,
    S: HighScoreStore,
{
    pub fn start(canvas: Option<C>, haptics: H, mut store: S, seed: u32) -> Result<Self, InitError> {
        let Some(canvas) = canvas else {
            error!("render context unavailable; game not started");
            return Err(InitError::MissingContext);
        };

        let (width, height) = canvas.size();
        let arena = Arena::new(width, height).map_err(|err| {
            error!(width, height, "{err}");
            err
        })?;

        let high_score = store.load();
        let mut game = LiveGame::with_arena(seed, arena);
        game.set_high_score(high_score);
        info!(seed, high_score, width, height, "session started");

        let mut session = Self {
            game,
            canvas,
            haptics,
            store,
            high_score,
        };
        session.redraw();
        Ok(session)
    }

    /// Handles a DOM-style key name. Unknown keys are ignored.
    pub fn key_down(&mut self, key: &str) {
        match key {
            "ArrowLeft" => self.game.move_left(),
            "ArrowRight" => self.game.move_right(),
            " " | "Space" => {
                self.game.fire();
            }
            "p" | "P" => {
                self.game.toggle_pause();
                self.dispatch_events();
                self.redraw();
                return;
            }
            _ => return,
        }
        self.dispatch_events();
    }

    pub fn touch_start(&mut self, x: f64) {
        self.game.touch_start(x);
    }

    pub fn touch_move(&mut self, x: f64) {
        self.game.touch_move(x);
    }

    pub fn touch_end(&mut self) {
        self.game.touch_end();
        self.pulse(HAPTIC_TOUCH_FIRE);
        self.dispatch_events();
    }

    pub fn resume(&mut self) {
        self.game.resume();
        self.dispatch_events();
    }

    pub fn restart(&mut self) {
        self.game.restart();
        self.dispatch_events();
        self.redraw();
    }

    /// Runs one simulation tick and paints the result.
    pub fn frame(&mut self, now_ms: f64) -> FrameOutcome {
        self.game.tick(now_ms);
        self.dispatch_events();
        self.redraw();

        match self.game.mode() {
            GameMode::Playing => FrameOutcome::Reschedule,
            GameMode::Paused | GameMode::Over => FrameOutcome::Halt,
        }
    }

    #[inline]
    pub fn mode(&self) -> GameMode {
        self.game.mode()
    }

    #[inline]
    pub fn high_score(&self) -> u32 {
        self.high_score
    }

    #[inline]
    pub fn snapshot(&self) -> WorldSnapshot {
        self.game.snapshot()
    }

    pub fn into_parts(self) -> (C, H, S) {
        (self.canvas, self.haptics, self.store)
    }

    fn redraw(&mut self) {
        let commands = build_frame(&self.game.snapshot());
        self.canvas.draw(&commands);
    }

    fn pulse(&mut self, pattern: &[u32]) {
        if !self.haptics.vibrate(pattern) {
            trace!("haptics unavailable");
        }
    }

    fn dispatch_events(&mut self) {
        for event in self.game.drain_events() {
            if let Some(pattern) = event.haptic_pattern() {
                self.pulse(pattern);
            }

            match event {
                GameEvent::LevelUp { level, boss } => info!(level, boss, "level up"),
                GameEvent::BossDefeated => info!("boss defeated"),
                GameEvent::GameOver { score } => info!(score, "game over"),
                GameEvent::NewHighScore { score } => {
                    self.high_score = score;
                    if let Err(err) = self.store.save(score) {
                        warn!(score, "failed to persist high score: {err}");
                    }
                }
                GameEvent::Paused => debug!("paused"),
                GameEvent::Resumed => debug!("resumed"),
                GameEvent::Restarted => debug!("restarted"),
                GameEvent::ShotFired
                | GameEvent::EnemyDestroyed { .. }
                | GameEvent::BossHit { .. }
                | GameEvent::PlayerHit => {}
            }
        }
    }
}
