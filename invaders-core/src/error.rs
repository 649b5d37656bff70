use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RuleCode {
    GlobalLevelNonZero,
    GlobalProgressRange,
    PlayerBounds,
    EnemyCountAboveInitial,
    EnemyBounds,
    BossOutsideBossLevel,
    BossHealthRange,
    ProjectileState,
    BossProjectileState,
    ParticleState,
    ProgressionScoreDelta,
    ProgressionLevelAdvance,
    ProgressionEnemyCount,
    BossHealthIncrease,
    SessionOverTerminal,
}

impl fmt::Display for RuleCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GlobalLevelNonZero => write!(f, "GLOBAL_LEVEL_NONZERO"),
            Self::GlobalProgressRange => write!(f, "GLOBAL_PROGRESS_RANGE"),
            Self::PlayerBounds => write!(f, "PLAYER_BOUNDS"),
            Self::EnemyCountAboveInitial => write!(f, "ENEMY_COUNT_ABOVE_INITIAL"),
            Self::EnemyBounds => write!(f, "ENEMY_BOUNDS"),
            Self::BossOutsideBossLevel => write!(f, "BOSS_OUTSIDE_BOSS_LEVEL"),
            Self::BossHealthRange => write!(f, "BOSS_HEALTH_RANGE"),
            Self::ProjectileState => write!(f, "PROJECTILE_STATE"),
            Self::BossProjectileState => write!(f, "BOSS_PROJECTILE_STATE"),
            Self::ParticleState => write!(f, "PARTICLE_STATE"),
            Self::ProgressionScoreDelta => write!(f, "PROGRESSION_SCORE_DELTA"),
            Self::ProgressionLevelAdvance => write!(f, "PROGRESSION_LEVEL_ADVANCE"),
            Self::ProgressionEnemyCount => write!(f, "PROGRESSION_ENEMY_COUNT"),
            Self::BossHealthIncrease => write!(f, "BOSS_HEALTH_INCREASE"),
            Self::SessionOverTerminal => write!(f, "SESSION_OVER_TERMINAL"),
        }
    }
}

impl std::error::Error for RuleCode {}

/// Raised when a session cannot start because the render target is unusable.
#[derive(Clone, Debug, PartialEq)]
pub enum InitError {
    MissingContext,
    InvalidCanvasSize { width: f64, height: f64 },
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingContext => write!(f, "2D context is not available on this canvas"),
            Self::InvalidCanvasSize { width, height } => {
                write!(f, "canvas too small for play: {width}x{height}")
            }
        }
    }
}

impl std::error::Error for InitError {}
