use std::f64::consts::{PI, TAU};

use crate::constants::{
    BOSS_BASE_HEALTH, BOSS_DAMAGE_PER_HIT, BOSS_DEFEAT_BURSTS, BOSS_HEALTH_PER_TIER, BOSS_HEIGHT,
    BOSS_LEVEL_PERIOD, BOSS_PATTERN_COUNT, BOSS_PHASE_STEP, BOSS_PROJECTILE_RADIUS,
    BOSS_PROJECTILE_SPEED, BOSS_RING_SHOTS, BOSS_SHOT_INTERVAL_MS, BOSS_SPREAD_RAD, BOSS_TOP,
    BOSS_WIDTH, CANVAS_HEIGHT, CANVAS_WIDTH, CIRCLE_PHASE_STEP, CIRCLE_RADIUS, COLOR_BOSS,
    COLOR_ENEMY, COLOR_PLAYER, DIVE_CHANCE, DIVE_STEP, ENEMY_HEIGHT, ENEMY_WIDTH,
    FIRE_COOLDOWN_MS, FRAME_MS, GRID_MARGIN, GRID_MAX_COLS, GRID_MAX_ROWS, GRID_ROW_PITCH,
    HAPTIC_BOSS_DEFEAT, HAPTIC_ENEMY_HIT, HAPTIC_PLAYER_HIT, LEVEL_UP_BANNER_MS,
    MIN_CANVAS_HEIGHT, MIN_CANVAS_WIDTH, PARTICLES_PER_BURST, PARTICLE_ALPHA_DECAY,
    PARTICLE_MAX_RADIUS, PARTICLE_MAX_SPEED, PLAYER_BOTTOM_OFFSET, PLAYER_HEIGHT, PLAYER_SPEED,
    PLAYER_WIDTH, PROJECTILE_RADIUS, PROJECTILE_SPEED, SCORE_BOSS_DEFEAT, SCORE_ENEMY,
    SINE_AMPLITUDE, SINE_PHASE_STEP, TOUCH_DRAG_THRESHOLD,
};
use crate::error::{InitError, RuleCode};
use crate::rng::SeededRng;
use crate::input::FrameInput;

mod game;

use game::Game;

/// Playfield dimensions in canvas units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Arena {
    pub width: f64,
    pub height: f64,
}

impl Default for Arena {
    fn default() -> Self {
        Self {
            width: CANVAS_WIDTH,
            height: CANVAS_HEIGHT,
        }
    }
}

impl Arena {
    pub fn new(width: f64, height: f64) -> Result<Self, InitError> {
        let playable = width.is_finite()
            && height.is_finite()
            && width >= MIN_CANVAS_WIDTH
            && height >= MIN_CANVAS_HEIGHT;
        if !playable {
            return Err(InitError::InvalidCanvasSize { width, height });
        }
        Ok(Self { width, height })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameMode {
    Playing,
    Paused,
    Over,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MovePattern {
    Sine,
    Circular,
    Dive,
}

impl MovePattern {
    fn from_index(index: u32) -> Self {
        match index {
            0 => Self::Sine,
            1 => Self::Circular,
            _ => Self::Dive,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Player {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub speed: f64,
    pub last_shot_ms: Option<f64>,
}

impl Player {
    #[inline]
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Enemy {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub pattern: MovePattern,
    pub phase: f64,
    alive: bool,
}

impl Enemy {
    #[inline]
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Boss {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub health: i32,
    pub max_health: i32,
    /// Index of the volley fired next.
    pub pattern: u8,
    pub last_shot_ms: f64,
    pub phase: f64,
}

impl Boss {
    #[inline]
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projectile {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    alive: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BossProjectile {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub radius: f64,
    alive: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub radius: f64,
    pub color: &'static str,
    pub alpha: f64,
    alive: bool,
}

/// Side effects produced by the simulation, drained by whoever drives it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GameEvent {
    ShotFired,
    EnemyDestroyed { x: f64, y: f64 },
    BossHit { health: i32 },
    BossDefeated,
    PlayerHit,
    LevelUp { level: u32, boss: bool },
    Paused,
    Resumed,
    GameOver { score: u32 },
    NewHighScore { score: u32 },
    Restarted,
}

impl GameEvent {
    pub fn haptic_pattern(&self) -> Option<&'static [u32]> {
        match self {
            Self::EnemyDestroyed { .. } => Some(HAPTIC_ENEMY_HIT),
            Self::BossDefeated => Some(HAPTIC_BOSS_DEFEAT),
            Self::PlayerHit => Some(HAPTIC_PLAYER_HIT),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct WorldSnapshot {
    pub frame_count: u32,
    pub clock_ms: f64,
    pub mode: GameMode,
    pub score: u32,
    pub high_score: u32,
    pub level: u32,
    pub progress: f64,
    pub level_up_active: bool,
    pub arena: Arena,
    pub rng_state: u32,
    pub initial_enemy_count: usize,
    pub player: Player,
    pub enemies: Vec<Enemy>,
    pub boss: Option<Boss>,
    pub projectiles: Vec<Projectile>,
    pub boss_projectiles: Vec<BossProjectile>,
    pub particles: Vec<Particle>,
}

impl WorldSnapshot {
    #[inline]
    pub fn is_boss_level(&self) -> bool {
        is_boss_level(self.level)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReplayResult {
    pub final_score: u32,
    pub final_level: u32,
    pub final_rng_state: u32,
    pub frame_count: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReplayViolation {
    pub frame_count: u32,
    pub rule: RuleCode,
}

impl std::fmt::Display for ReplayViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at frame {}", self.rule, self.frame_count)
    }
}

impl std::error::Error for ReplayViolation {}

pub struct LiveGame {
    game: Game,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct TransitionState {
    frame_count: u32,
    mode: GameMode,
    score: u32,
    level: u32,
    enemies: usize,
    boss_health: Option<i32>,
}

#[inline]
pub fn is_boss_level(level: u32) -> bool {
    level % BOSS_LEVEL_PERIOD == 0
}

/// Rows and columns of the enemy grid for a regular level.
#[inline]
pub fn enemy_grid_dims(level: u32) -> (u32, u32) {
    (
        (2 + level / 2).min(GRID_MAX_ROWS),
        (4 + level / 3).min(GRID_MAX_COLS),
    )
}

#[inline]
pub fn boss_tier(level: u32) -> u32 {
    level / BOSS_LEVEL_PERIOD
}

#[inline]
pub fn boss_health_for_level(level: u32) -> i32 {
    let extra_tiers = boss_tier(level).max(1) - 1;
    BOSS_BASE_HEALTH + BOSS_HEALTH_PER_TIER * extra_tiers as i32
}

pub fn replay(seed: u32, inputs: &[u8]) -> ReplayResult {
    let mut game = Game::new(seed, Arena::default());

    for input in inputs {
        game.step(*input);
    }

    game.result()
}

pub fn replay_strict(seed: u32, inputs: &[u8]) -> Result<ReplayResult, ReplayViolation> {
    let mut game = Game::new(seed, Arena::default());
    game.validate_invariants().map_err(|rule| ReplayViolation {
        frame_count: game.frame_count(),
        rule,
    })?;

    for input in inputs {
        let before_step = game.transition_state();
        game.step_decoded(FrameInput::from_bits(*input));
        let after_step = game.transition_state();

        validate_transition(&before_step, &after_step).map_err(|rule| ReplayViolation {
            frame_count: game.frame_count(),
            rule,
        })?;

        game.validate_invariants().map_err(|rule| ReplayViolation {
            frame_count: game.frame_count(),
            rule,
        })?;
    }

    Ok(game.result())
}

fn validate_transition(prev: &TransitionState, next: &TransitionState) -> Result<(), RuleCode> {
    if next.score < prev.score || (next.score - prev.score) % SCORE_ENEMY != 0 {
        return Err(RuleCode::ProgressionScoreDelta);
    }

    if next.level < prev.level || next.level > prev.level + 1 {
        return Err(RuleCode::ProgressionLevelAdvance);
    }

    let level_advanced_this_frame = next.level == prev.level + 1;
    if level_advanced_this_frame {
        let wave_ok = if is_boss_level(next.level) {
            next.enemies == 0 && next.boss_health == Some(boss_health_for_level(next.level))
        } else {
            let (rows, cols) = enemy_grid_dims(next.level);
            next.enemies == (rows * cols) as usize && next.boss_health.is_none()
        };
        if !wave_ok {
            return Err(RuleCode::ProgressionLevelAdvance);
        }
    } else {
        if next.enemies > prev.enemies {
            return Err(RuleCode::ProgressionEnemyCount);
        }

        match (prev.boss_health, next.boss_health) {
            (Some(before), Some(after)) if after > before => {
                return Err(RuleCode::BossHealthIncrease);
            }
            (None, Some(_)) => return Err(RuleCode::BossHealthIncrease),
            _ => {}
        }
    }

    if matches!(prev.mode, GameMode::Over) && !matches!(next.mode, GameMode::Over) {
        return Err(RuleCode::SessionOverTerminal);
    }

    Ok(())
}

/// Strict point-in-rectangle test; points on an edge do not count.
#[inline]
fn point_inside(px: f64, py: f64, x: f64, y: f64, width: f64, height: f64) -> bool {
    px > x && px < x + width && py > y && py < y + height
}

/// Closed rectangle test; shared edges count as contact.
#[inline]
fn rects_touch(a: (f64, f64, f64, f64), b: (f64, f64, f64, f64)) -> bool {
    a.0 <= b.0 + b.2 && a.0 + a.2 >= b.0 && a.1 <= b.1 + b.3 && a.1 + a.3 >= b.1
}

impl LiveGame {
    pub fn new(seed: u32) -> Self {
        Self::with_arena(seed, Arena::default())
    }

    pub fn with_arena(seed: u32, arena: Arena) -> Self {
        Self {
            game: Game::new(seed, arena),
        }
    }

    #[inline]
    pub fn move_left(&mut self) {
        self.game.move_player(-1.0);
    }

    #[inline]
    pub fn move_right(&mut self) {
        self.game.move_player(1.0);
    }

    /// Returns `true` when a projectile was actually launched.
    #[inline]
    pub fn fire(&mut self) -> bool {
        self.game.fire()
    }

    #[inline]
    pub fn toggle_pause(&mut self) {
        self.game.toggle_pause();
    }

    #[inline]
    pub fn resume(&mut self) {
        self.game.resume();
    }

    #[inline]
    pub fn restart(&mut self) {
        self.game.restart();
    }

    #[inline]
    pub fn touch_start(&mut self, x: f64) {
        self.game.touch_start(x);
    }

    #[inline]
    pub fn touch_move(&mut self, x: f64) {
        self.game.touch_move(x);
    }

    #[inline]
    pub fn touch_end(&mut self) -> bool {
        self.game.touch_end()
    }

    /// Advances one frame on the caller's wall clock.
    #[inline]
    pub fn tick(&mut self, now_ms: f64) {
        self.game.tick(now_ms);
    }

    /// Advances one frame on the fixed 60 Hz clock.
    #[inline]
    pub fn step(&mut self, input_byte: u8) {
        self.game.step(input_byte);
    }

    #[inline]
    pub fn step_input(&mut self, input: FrameInput) {
        self.step(input.to_bits());
    }

    #[inline]
    pub fn set_high_score(&mut self, high_score: u32) {
        self.game.set_high_score(high_score);
    }

    #[inline]
    pub fn mode(&self) -> GameMode {
        self.game.mode()
    }

    #[inline]
    pub fn snapshot(&self) -> WorldSnapshot {
        self.game.world_snapshot()
    }

    #[inline]
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.game.drain_events()
    }

    #[inline]
    pub fn result(&self) -> ReplayResult {
        self.game.result()
    }

    #[inline]
    pub fn validate(&self) -> Result<(), RuleCode> {
        self.game.validate_invariants()
    }

    #[cfg(test)]
    pub(crate) fn force_game_over(&mut self, score: u32) {
        self.game.force_game_over(score);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boss_levels_are_multiples_of_five() {
        for level in 1..=40 {
            assert_eq!(is_boss_level(level), level % 5 == 0, "level {level}");
        }
    }

    #[test]
    fn grid_dims_follow_level_formula() {
        assert_eq!(enemy_grid_dims(1), (2, 4));
        assert_eq!(enemy_grid_dims(2), (3, 4));
        assert_eq!(enemy_grid_dims(3), (3, 5));
        assert_eq!(enemy_grid_dims(9), (5, 7));
        assert_eq!(enemy_grid_dims(40), (5, 8));
    }

    #[test]
    fn boss_health_scales_with_tier() {
        assert_eq!(boss_health_for_level(5), 100);
        assert_eq!(boss_health_for_level(10), 150);
        assert_eq!(boss_health_for_level(25), 300);
    }

    #[test]
    fn arena_rejects_tiny_canvas() {
        assert!(Arena::new(350.0, 600.0).is_ok());
        assert!(matches!(
            Arena::new(100.0, 600.0),
            Err(InitError::InvalidCanvasSize { .. })
        ));
        assert!(Arena::new(f64::NAN, 600.0).is_err());
    }

    #[test]
    fn transition_rejects_score_decrease_and_odd_delta() {
        let prev = TransitionState {
            frame_count: 1,
            mode: GameMode::Playing,
            score: 500,
            level: 1,
            enemies: 8,
            boss_health: None,
        };
        let mut next = prev;
        next.score = 400;
        assert_eq!(
            validate_transition(&prev, &next),
            Err(RuleCode::ProgressionScoreDelta)
        );
        next.score = 550;
        assert_eq!(
            validate_transition(&prev, &next),
            Err(RuleCode::ProgressionScoreDelta)
        );
        next.score = 600;
        next.enemies = 7;
        assert_eq!(validate_transition(&prev, &next), Ok(()));
    }

    #[test]
    fn transition_rejects_revived_boss_and_resumed_game_over() {
        let prev = TransitionState {
            frame_count: 10,
            mode: GameMode::Over,
            score: 1_000,
            level: 5,
            enemies: 0,
            boss_health: Some(40),
        };
        let mut next = prev;
        next.boss_health = Some(50);
        assert_eq!(
            validate_transition(&prev, &next),
            Err(RuleCode::BossHealthIncrease)
        );

        next.boss_health = Some(40);
        next.mode = GameMode::Playing;
        assert_eq!(
            validate_transition(&prev, &next),
            Err(RuleCode::SessionOverTerminal)
        );
    }

    #[test]
    fn level_advance_requires_fresh_wave() {
        let prev = TransitionState {
            frame_count: 10,
            mode: GameMode::Playing,
            score: 800,
            level: 1,
            enemies: 0,
            boss_health: None,
        };
        let mut next = prev;
        next.level = 2;
        next.enemies = 12;
        assert_eq!(validate_transition(&prev, &next), Ok(()));

        next.enemies = 11;
        assert_eq!(
            validate_transition(&prev, &next),
            Err(RuleCode::ProgressionLevelAdvance)
        );

        next.level = 3;
        assert_eq!(
            validate_transition(&prev, &next),
            Err(RuleCode::ProgressionLevelAdvance)
        );
    }
}
