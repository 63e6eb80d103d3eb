use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::error::NavError;
use crate::models::common::{Point, Vector2D};
use crate::models::creature::Creature;
use crate::models::radar::{self, BoundingRegion, RadarLog, SymmetryHint};
use crate::scenario::EngineConfig;

/// 1ターン分の問い合わせコンテキスト
///
/// 現在ターン、クリーチャー名簿、観測履歴を束ね、推定結果のキャッシュを所有する。
/// キャッシュはコンテキストと共に破棄されるため、ターンをまたいで古い推定が残ることはない。
pub struct TurnContext<'a> {
    turn: u32,
    config: &'a EngineConfig,
    roster: &'a HashMap<u32, Creature>,
    radar: &'a RadarLog,
    symmetry: Option<&'a SymmetryHint>,
    cache: RefCell<HashMap<u32, BoundingRegion>>,
}

impl<'a> TurnContext<'a> {
    pub fn new(
        turn: u32,
        config: &'a EngineConfig,
        roster: &'a HashMap<u32, Creature>,
        radar: &'a RadarLog,
    ) -> Self {
        Self {
            turn,
            config,
            roster,
            radar,
            symmetry: None,
            cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn with_symmetry(mut self, hint: &'a SymmetryHint) -> Self {
        self.symmetry = Some(hint);
        self
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn config(&self) -> &EngineConfig {
        self.config
    }

    pub fn creature(&self, id: u32) -> Result<&'a Creature, NavError> {
        self.roster.get(&id).ok_or(NavError::UnknownCreature(id))
    }

    /// クリーチャーの存在可能領域
    ///
    /// 対称ヒントが有効で、対の相手の反転領域が厳密に小さい場合はそちらを返す。
    pub fn locate(&self, id: u32) -> Result<BoundingRegion, NavError> {
        if let Some(region) = self.cache.borrow().get(&id) {
            return Ok(*region);
        }

        let creature = self.creature(id)?;
        let mut region = radar::locate(creature, self.radar, self.turn, self.config);

        if let Some(twin_id) = self.symmetry.and_then(|hint| hint.twin_of(id, self.turn)) {
            let twin = self.creature(twin_id)?;
            let mirrored = radar::locate(twin, self.radar, self.turn, self.config)
                .mirrored_x(self.config.map_size)
                .clamped(creature.level().depth_band(), self.config.map_size);
            if mirrored.area() < region.area() {
                debug!(
                    creature_id = id,
                    twin_id,
                    own_area = region.area(),
                    twin_area = mirrored.area(),
                    "RADAR_SYMMETRY: 対のクリーチャーの反転領域を採用しました"
                );
                region = mirrored;
            }
        }

        self.cache.borrow_mut().insert(id, region);
        Ok(region)
    }

    /// このターンにキャッシュされた推定の数
    pub fn cached_regions(&self) -> usize {
        self.cache.borrow().len()
    }

    /// 領域が十分小さく、位置が特定できたとみなせるか
    pub fn is_localized(&self, region: &BoundingRegion) -> bool {
        region.area() < self.config.found_area
    }

    /// 領域へ向かう探索目標
    ///
    /// 特定済みなら中心、未特定ならマップ端から `exploration_margin` 離した中心。
    pub fn exploration_target(&self, region: &BoundingRegion) -> Point {
        let center = region.center();
        if self.is_localized(region) {
            return center;
        }
        let margin = self.config.exploration_margin;
        let upper = (self.config.map_size - margin).max(margin);
        Point::new(center.x.clamp(margin, upper), center.y.clamp(margin, upper))
    }

    /// 今ターンまたは前ターンの確定視認から求まる正確な位置
    pub fn confirmed_position(&self, id: u32) -> Result<Option<Point>, NavError> {
        let creature = self.creature(id)?;
        Ok(radar::confirmed_position(creature, self.radar, self.turn, self.config))
    }

    /// 今ターン見えていない敵対クリーチャーの状態を補完する
    ///
    /// 前ターンの確定視認から位置が分かるものだけを対象に、その位置と、最も近いドローンへ
    /// 向かう速度を与える。方位観測の矛盾で一点に潰れた領域は使わない。
    /// 見えているものは名簿の値をそのまま使う。
    pub fn resolve_hostiles(
        &self,
        visible: &HashSet<u32>,
        drones: &[Point],
    ) -> Result<Vec<Creature>, NavError> {
        let mut ids: Vec<u32> = self
            .roster
            .values()
            .filter(|c| c.is_hostile())
            .map(|c| c.id)
            .collect();
        ids.sort_unstable();

        let mut hostiles = Vec::new();
        for id in ids {
            let creature = self.creature(id)?;
            if visible.contains(&id) {
                hostiles.push(creature.clone());
                continue;
            }

            let Some(position) = self.confirmed_position(id)? else {
                continue;
            };

            let velocity = drones
                .iter()
                .min_by(|a, b| position.distance_to(a).total_cmp(&position.distance_to(b)))
                .map(|nearest| {
                    Vector2D::between(position, *nearest).with_length(self.config.monster_speed as f64)
                })
                .unwrap_or_default();

            debug!(
                creature_id = id,
                x = position.x,
                y = position.y,
                vx = velocity.x,
                vy = velocity.y,
                "RADAR_RESOLVED: 見えていないモンスターの位置を特定しました"
            );
            hostiles.push(creature.clone().with_state(position, velocity));
        }

        Ok(hostiles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::creature::Category;
    use crate::models::radar::{Bearing, Quadrant, Sighting};

    fn roster() -> HashMap<u32, Creature> {
        let mut roster = HashMap::new();
        roster.insert(1, Creature::new(1, -1, Category::Monster));
        roster.insert(4, Creature::new(4, 0, Category::Target(0)));
        roster.insert(5, Creature::new(5, 0, Category::Target(0)));
        roster
    }

    #[test]
    fn test_unknown_creature_is_an_error() {
        let config = EngineConfig::default();
        let roster = roster();
        let log = RadarLog::new(4);
        let context = TurnContext::new(1, &config, &roster, &log);
        assert_eq!(context.locate(42), Err(NavError::UnknownCreature(42)));
    }

    #[test]
    fn test_locate_is_idempotent_and_cached() {
        let config = EngineConfig::default();
        let roster = roster();
        let mut log = RadarLog::new(4);
        log.register_bearing(4, Bearing {
            drone_id: 0,
            observer: Point::new(3000, 2000),
            quadrant: Quadrant::BottomRight,
            turn: 1,
        });
        let context = TurnContext::new(1, &config, &roster, &log);

        let first = context.locate(4).unwrap();
        let second = context.locate(4).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, BoundingRegion::new(3420, 9999, 2500, 4999));
        assert_eq!(context.cached_regions(), 1);
    }

    #[test]
    fn test_new_turn_starts_with_empty_cache() {
        let config = EngineConfig::default();
        let roster = roster();
        let mut log = RadarLog::new(4);
        log.register_sighting(4, Sighting {
            position: Point::new(3000, 3000),
            velocity: Vector2D::zero(),
            turn: 1,
        });
        {
            let turn_one = TurnContext::new(1, &config, &roster, &log);
            assert!(turn_one.locate(4).unwrap().is_point());
        }
        let turn_five = TurnContext::new(5, &config, &roster, &log);
        assert_eq!(turn_five.cached_regions(), 0);
        assert!(!turn_five.locate(4).unwrap().is_point());
    }

    #[test]
    fn test_symmetry_substitutes_smaller_twin() {
        let config = EngineConfig::default();
        let roster = roster();
        let mut log = RadarLog::new(4);
        log.register_sighting(5, Sighting {
            position: Point::new(2000, 3000),
            velocity: Vector2D::zero(),
            turn: 1,
        });
        let hint = SymmetryHint::new(5).with_pair(4, 5);
        let context = TurnContext::new(1, &config, &roster, &log).with_symmetry(&hint);

        let region = context.locate(4).unwrap();
        assert_eq!(region, BoundingRegion::point(Point::new(7999, 3000)));
    }

    #[test]
    fn test_exploration_target_clamps_unlocalized() {
        let config = EngineConfig::default();
        let roster = roster();
        let log = RadarLog::new(4);
        let context = TurnContext::new(1, &config, &roster, &log);

        let wide = BoundingRegion::new(0, 1000, 2500, 9999);
        assert!(!context.is_localized(&wide));
        assert_eq!(context.exploration_target(&wide), Point::new(800, 6249));

        let small = BoundingRegion::new(100, 500, 3000, 3400);
        assert!(context.is_localized(&small));
        assert_eq!(context.exploration_target(&small), Point::new(300, 3200));
    }

    #[test]
    fn test_resolve_hidden_monster_aims_at_nearest_drone() {
        let config = EngineConfig::default();
        let roster = roster();
        let mut log = RadarLog::new(4);
        log.register_sighting(1, Sighting {
            position: Point::new(5000, 5000),
            velocity: Vector2D::zero(),
            turn: 1,
        });
        let context = TurnContext::new(2, &config, &roster, &log);

        let hostiles = context
            .resolve_hostiles(&HashSet::new(), &[Point::new(5000, 3000), Point::new(9000, 9000)])
            .unwrap();
        assert_eq!(hostiles.len(), 1);
        assert_eq!(hostiles[0].position, Point::new(5000, 5000));
        assert_eq!(hostiles[0].velocity, Vector2D::new(0.0, -540.0));

        let later = TurnContext::new(4, &config, &roster, &log);
        assert!(later.resolve_hostiles(&HashSet::new(), &[Point::new(0, 0)]).unwrap().is_empty());
    }

    #[test]
    fn test_contradicting_bearings_do_not_invent_a_monster() {
        let config = EngineConfig::default();
        let roster = roster();
        let mut log = RadarLog::new(4);
        for (observer, quadrant) in [
            (Point::new(1000, 3000), Quadrant::TopLeft),
            (Point::new(9000, 9000), Quadrant::BottomRight),
        ] {
            log.register_bearing(1, Bearing { drone_id: 0, observer, quadrant, turn: 1 });
        }
        let context = TurnContext::new(1, &config, &roster, &log);

        assert_eq!(context.locate(1).unwrap(), BoundingRegion::point(Point::new(5000, 6000)));
        assert_eq!(context.confirmed_position(1), Ok(None));
        assert!(context.resolve_hostiles(&HashSet::new(), &[Point::new(5000, 3000)]).unwrap().is_empty());
    }
}
