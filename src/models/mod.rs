// 幾何プリミティブと定数
pub mod common;

// 敵の運動モデル（trait）定義
pub mod traits;

// 各モデルの実装
pub mod creature;
pub mod drone;
pub mod radar;
pub mod context;
pub mod collision;
pub mod escape;
pub mod intercept;

// 便利な re-export
pub use common::*;
pub use traits::{DriftMotion, HostileMotion, PursuitMotion, motion_for};
pub use creature::{Category, Creature, DepthBand, Level};
pub use drone::{Command, Drone, Lights};
pub use radar::{
    Bearing, BoundingRegion, Quadrant, RadarLog, Sighting, SymmetryHint, confirmed_position, locate,
};
pub use context::TurnContext;
pub use collision::{CollisionPredictor, touches_during_turn};
pub use escape::{EscapeOutcome, EscapePlanner, Navigation, Safety};
pub use intercept::InterceptPlanner;
