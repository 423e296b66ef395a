pub mod play;
pub mod scores;

pub use play::PlayMode;
pub use scores::ScoresMode;
