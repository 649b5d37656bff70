//! Game constants.
//!
//! Positions and sizes are in canvas units, timers in milliseconds.

// Canvas
pub const CANVAS_WIDTH: f64 = 350.0;
pub const CANVAS_HEIGHT: f64 = 600.0;
pub const MIN_CANVAS_WIDTH: f64 = 200.0;
/// Keeps one row pitch of clearance between the deepest spawned row and the
/// cannon, so no wave can open on top of the player.
pub const MIN_CANVAS_HEIGHT: f64 = GRID_DEEPEST_BOTTOM + GRID_ROW_PITCH + PLAYER_BOTTOM_OFFSET;

// Player
pub const PLAYER_WIDTH: f64 = 50.0;
pub const PLAYER_HEIGHT: f64 = 50.0;
pub const PLAYER_SPEED: f64 = 5.0;
pub const PLAYER_BOTTOM_OFFSET: f64 = 60.0;
pub const FIRE_COOLDOWN_MS: f64 = 250.0;

// Player projectiles
pub const PROJECTILE_RADIUS: f64 = 4.0;
pub const PROJECTILE_SPEED: f64 = 7.0;

// Enemies
pub const ENEMY_WIDTH: f64 = 40.0;
pub const ENEMY_HEIGHT: f64 = 40.0;
pub const GRID_MARGIN: f64 = 50.0;
pub const GRID_ROW_PITCH: f64 = 60.0;
pub const GRID_MAX_ROWS: u32 = 5;
pub const GRID_MAX_COLS: u32 = 8;
/// Bottom edge of the lowest row of a full grid at spawn time.
pub const GRID_DEEPEST_BOTTOM: f64 =
    GRID_MARGIN + (GRID_MAX_ROWS - 1) as f64 * GRID_ROW_PITCH + ENEMY_HEIGHT;
pub const SINE_AMPLITUDE: f64 = 2.0;
pub const SINE_PHASE_STEP: f64 = 0.05;
pub const CIRCLE_RADIUS: f64 = 2.0;
pub const CIRCLE_PHASE_STEP: f64 = 0.03;
pub const DIVE_CHANCE: f64 = 0.01;
pub const DIVE_STEP: f64 = 5.0;

// Boss
pub const BOSS_WIDTH: f64 = 80.0;
pub const BOSS_HEIGHT: f64 = 80.0;
pub const BOSS_TOP: f64 = 50.0;
pub const BOSS_LEVEL_PERIOD: u32 = 5;
pub const BOSS_BASE_HEALTH: i32 = 100;
pub const BOSS_HEALTH_PER_TIER: i32 = 50;
pub const BOSS_DAMAGE_PER_HIT: i32 = 10;
pub const BOSS_PHASE_STEP: f64 = 0.02;
pub const BOSS_SHOT_INTERVAL_MS: f64 = 1_000.0;
pub const BOSS_PATTERN_COUNT: u8 = 2;

// Boss projectiles
pub const BOSS_PROJECTILE_SPEED: f64 = 5.0;
pub const BOSS_PROJECTILE_RADIUS: f64 = 6.0;
pub const BOSS_SPREAD_RAD: f64 = 0.2;
pub const BOSS_RING_SHOTS: u32 = 8;

// Particles
pub const PARTICLES_PER_BURST: usize = 8;
pub const PARTICLE_MAX_RADIUS: f64 = 3.0;
pub const PARTICLE_MAX_SPEED: f64 = 4.0;
pub const PARTICLE_ALPHA_DECAY: f64 = 0.01;
pub const BOSS_DEFEAT_BURSTS: usize = 3;

// Scoring
pub const SCORE_ENEMY: u32 = 100;
pub const SCORE_BOSS_DEFEAT: u32 = 1_000;

// Level progression
pub const LEVEL_UP_BANNER_MS: f64 = 2_000.0;

// Touch
pub const TOUCH_DRAG_THRESHOLD: f64 = 10.0;

// Haptic patterns (vibration/pause durations in ms)
pub const HAPTIC_TOUCH_FIRE: &[u32] = &[50];
pub const HAPTIC_ENEMY_HIT: &[u32] = &[100];
pub const HAPTIC_PLAYER_HIT: &[u32] = &[200];
pub const HAPTIC_BOSS_DEFEAT: &[u32] = &[100, 50, 100, 50, 100];

// Colors
pub const COLOR_BACKGROUND: &str = "#000033";
pub const COLOR_PLAYER: &str = "#00ff00";
pub const COLOR_PROJECTILE: &str = "#ffff00";
pub const COLOR_ENEMY: &str = "#ff0000";
pub const COLOR_BOSS: &str = "#ff0000";
pub const COLOR_BOSS_PROJECTILE: &str = "#ff4444";
pub const COLOR_HEALTH_TRACK: &str = "#330000";
pub const COLOR_HEALTH_FILL: &str = "#ff0000";
pub const COLOR_HUD: &str = "#ffffff";

// Fixed replay clock
pub const FRAMES_PER_SECOND: u32 = 60;
pub const FRAME_MS: f64 = 1_000.0 / FRAMES_PER_SECOND as f64;
