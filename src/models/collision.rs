//! # Collision モジュール
//!
//! ドローンの直線移動と移動中のクリーチャーとの衝突を閉形式で予測します。
//!
//! ドローンは1ターン（`t ∈ [0, 1]`）で出発点から目標点の方向へ最大速度で移動し、
//! クリーチャーは現在の速度を維持すると仮定します。相対位置 `p` と相対速度 `v` について
//! `|p + t·v|² = r²` を解き、早い方の根が `0 < t <= 1` にあれば衝突とみなします。

use crate::models::common::{Point, Vector2D};
use crate::models::creature::Creature;
use crate::scenario::EngineConfig;

/// 相対運動が今ターンの移動区間内で半径 `radius` の円に入るか
///
/// 既に円内にいる場合の判定は呼び出し側で行う。
pub fn enters_radius_within_turn(
    relative_position: Vector2D,
    relative_velocity: Vector2D,
    radius: f64,
) -> bool {
    let a = relative_velocity.dot(&relative_velocity);
    if a <= 0.0 {
        return false;
    }

    let b = 2.0 * relative_position.dot(&relative_velocity);
    let c = relative_position.dot(&relative_position) - radius * radius;
    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return false;
    }

    let t = (-b - discriminant.sqrt()) / (2.0 * a);
    t > 0.0 && t <= 1.0
}

/// 実際の移動 `from → to` の間に、速度 `velocity` で動く `position` の半径 `radius` 内へ入るか
///
/// 開始時点で半径内なら接触とみなす。
pub fn touches_during_turn(
    from: Point,
    to: Point,
    position: Point,
    velocity: Vector2D,
    radius: f64,
) -> bool {
    if from.distance_to(&position) <= radius {
        return true;
    }
    let relative_velocity = velocity - Vector2D::between(from, to);
    enters_radius_within_turn(Vector2D::between(from, position), relative_velocity, radius)
}

/// 衝突予測器
///
/// 半径と余裕幅は方針パラメータとして外から与える。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionPredictor {
    /// ドローンの1ターンあたりの移動量
    pub mover_speed: f64,
    /// モンスターとの衝突半径
    pub hostile_radius: f64,
    /// 非敵対クリーチャーの回避半径
    pub scan_radius: f64,
}

impl CollisionPredictor {
    pub fn new(mover_speed: f64, hostile_radius: f64, scan_radius: f64) -> Self {
        Self { mover_speed, hostile_radius, scan_radius }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            config.drone_speed as f64,
            config.monster_collision_radius as f64,
            config.scan_avoid_radius as f64,
        )
    }

    /// 種別に応じた判定半径（余裕幅はモンスターにのみ加算）
    pub fn radius_for(&self, creature: &Creature, padding: f64) -> f64 {
        if creature.is_hostile() {
            self.hostile_radius + padding
        } else {
            self.scan_radius
        }
    }

    /// `from` から `to` への移動中に `creature` と衝突するか
    pub fn collides(&self, from: Point, creature: &Creature, to: Point, padding: f64) -> bool {
        let radius = self.radius_for(creature, padding);
        self.collides_within(from, creature.position, creature.velocity, to, radius)
    }

    /// 半径を直接指定する版
    pub fn collides_within(
        &self,
        from: Point,
        position: Point,
        velocity: Vector2D,
        to: Point,
        radius: f64,
    ) -> bool {
        // 目標が近くても最大速度で同じ方向へ進むものとして扱う
        let stride = from + Vector2D::between(from, to).with_length(self.mover_speed);
        touches_during_turn(from, stride, position, velocity, radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::creature::Category;

    fn predictor() -> CollisionPredictor {
        CollisionPredictor::from_config(&EngineConfig::default())
    }

    fn monster(position: Point, velocity: Vector2D) -> Creature {
        Creature::new(1, -1, Category::Monster).with_state(position, velocity)
    }

    #[test]
    fn test_closing_case_short_circuits() {
        let m = monster(Point::new(5300, 5000), Vector2D::new(0.0, 540.0));
        assert!(predictor().collides(Point::new(5000, 5000), &m, Point::new(4400, 5000), 0.0));
    }

    #[test]
    fn test_head_on_collision_within_turn() {
        let m = monster(Point::new(5000, 6200), Vector2D::new(0.0, -540.0));
        assert!(predictor().collides(Point::new(5000, 5000), &m, Point::new(5000, 7000), 0.0));
        assert!(!predictor().collides(Point::new(5000, 5000), &m, Point::new(5000, 3000), 0.0));
    }

    #[test]
    fn test_collision_after_turn_is_ignored() {
        // 相対速度 (0, -600)、距離 1200 → 半径500に入るのは t ≈ 1.17
        let m = monster(Point::new(5000, 6200), Vector2D::zero());
        assert!(!predictor().collides(Point::new(5000, 5000), &m, Point::new(5000, 9000), 0.0));
        // 余裕幅を足すと t ≈ 0.83 で入る
        assert!(predictor().collides(Point::new(5000, 5000), &m, Point::new(5000, 9000), 200.0));
    }

    #[test]
    fn test_no_relative_motion_is_safe() {
        let m = monster(Point::new(7000, 7000), Vector2D::zero());
        let here = Point::new(5000, 5000);
        assert!(!predictor().collides(here, &m, here, 0.0));
    }

    #[test]
    fn test_non_hostile_uses_scan_radius() {
        let fish = Creature::new(2, 0, Category::Target(0))
            .with_state(Point::new(6500, 5000), Vector2D::zero());
        let p = predictor();
        assert_eq!(p.radius_for(&fish, 300.0), 2000.0);
        assert!(p.collides(Point::new(5000, 5000), &fish, Point::new(6000, 5000), 0.0));
    }

    #[test]
    fn test_quadratic_roots_outside_window() {
        // 遠ざかる運動: 早い根は負
        assert!(!enters_radius_within_turn(Vector2D::new(1000.0, 0.0), Vector2D::new(100.0, 0.0), 500.0));
        // 交差しない
        assert!(!enters_radius_within_turn(Vector2D::new(1000.0, 1000.0), Vector2D::new(-100.0, 0.0), 500.0));
        // ちょうど t = 1
        assert!(enters_radius_within_turn(Vector2D::new(1000.0, 0.0), Vector2D::new(-500.0, 0.0), 500.0));
    }

    #[test]
    fn test_pass_through_between_turn_ends_is_contact() {
        let from = Point::new(5000, 5000);
        let start = Point::new(4730, 4550);
        let velocity = Vector2D::new(540.0, 0.0);

        assert!(from.distance_to(&start) > 500.0);
        assert!(from.distance_to(&(start + velocity)) > 500.0);
        assert!(touches_during_turn(from, from, start, velocity, 500.0));
        assert!(!touches_during_turn(from, from, start, velocity, 440.0));
    }
}
