use crate::models::common::{Point, Vector2D};
use crate::models::creature::Creature;
use crate::scenario::{EngineConfig, MotionModel};

/// 敵対クリーチャーの運動モデル
///
/// 回避探索は1ターン先の敵の状態をこのモデルで予測する。
pub trait HostileMotion {
    /// 現在の速度で1ターン進める
    fn advance(&self, hostile: &Creature) -> Creature {
        hostile.advanced()
    }

    /// 追跡対象候補 `targets` を踏まえて進行方向を更新する
    fn steer(&self, hostile: &Creature, targets: &[Point]) -> Creature;

    /// 1ターン先の状態（移動してから進行方向を更新）
    fn predict(&self, hostile: &Creature, targets: &[Point]) -> Creature {
        self.steer(&self.advance(hostile), targets)
    }
}

/// 進行方向を変えない受動的なモデル
#[derive(Debug, Clone, Copy, Default)]
pub struct DriftMotion;

impl HostileMotion for DriftMotion {
    fn steer(&self, hostile: &Creature, _targets: &[Point]) -> Creature {
        hostile.clone()
    }
}

/// 最も近いドローンへ一定速度で向かい直す追跡モデル
#[derive(Debug, Clone, Copy)]
pub struct PursuitMotion {
    pub speed: f64,
}

impl PursuitMotion {
    pub fn new(speed: f64) -> Self {
        Self { speed }
    }
}

impl HostileMotion for PursuitMotion {
    fn steer(&self, hostile: &Creature, targets: &[Point]) -> Creature {
        let position = hostile.position;
        let Some(nearest) = targets
            .iter()
            .min_by(|a, b| position.distance_to(a).total_cmp(&position.distance_to(b)))
        else {
            return hostile.clone();
        };

        let velocity: Vector2D = Vector2D::between(position, *nearest).with_length(self.speed);
        hostile.clone().with_state(position, velocity)
    }
}

/// 設定で選ばれた運動モデル
pub fn motion_for(config: &EngineConfig) -> Box<dyn HostileMotion> {
    match config.hostile_motion {
        MotionModel::Pursuit => Box::new(PursuitMotion::new(config.monster_speed as f64)),
        MotionModel::Drift => Box::new(DriftMotion),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::creature::Category;

    fn monster() -> Creature {
        Creature::new(1, -1, Category::Monster)
            .with_state(Point::new(5000, 5000), Vector2D::new(100.0, 0.0))
    }

    #[test]
    fn test_drift_keeps_heading() {
        let predicted = DriftMotion.predict(&monster(), &[Point::new(0, 0)]);
        assert_eq!(predicted.position, Point::new(5100, 5000));
        assert_eq!(predicted.velocity, Vector2D::new(100.0, 0.0));
    }

    #[test]
    fn test_pursuit_reaims_at_nearest_target() {
        let motion = PursuitMotion::new(540.0);
        let predicted = motion.predict(&monster(), &[Point::new(5100, 8000), Point::new(5100, 4000)]);
        assert_eq!(predicted.position, Point::new(5100, 5000));
        assert_eq!(predicted.velocity, Vector2D::new(0.0, -540.0));
    }

    #[test]
    fn test_pursuit_without_targets_is_unchanged() {
        let motion = PursuitMotion::new(540.0);
        assert_eq!(motion.steer(&monster(), &[]), monster());
    }

    #[test]
    fn test_motion_for_follows_config() {
        let drift = EngineConfig { hostile_motion: MotionModel::Drift, ..EngineConfig::default() };
        let predicted = motion_for(&drift).predict(&monster(), &[Point::new(5100, 9000)]);
        assert_eq!(predicted.velocity, Vector2D::new(100.0, 0.0));

        let predicted = motion_for(&EngineConfig::default()).predict(&monster(), &[Point::new(5100, 9000)]);
        assert_eq!(predicted.velocity, Vector2D::new(0.0, 540.0));
    }
}
