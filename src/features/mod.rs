pub mod calculator;
pub mod timeline;

pub use calculator::{BattingFeatures, StatcastFeatureCalculator, FEATURE_NAMES};
pub use timeline::{filter_game_types, find_nth_pa};
