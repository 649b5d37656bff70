pub mod constants;
pub mod error;
pub mod input;
pub mod render;
pub mod rng;
pub mod session;
pub mod sim;

pub use error::{InitError, RuleCode};
pub use input::FrameInput;
pub use session::{FrameOutcome, Session};
pub use sim::{replay, replay_strict, LiveGame, ReplayResult, ReplayViolation, WorldSnapshot};
