use crate::models::common::{MAP_SIZE, Point, Vector2D};
use crate::scenario::{CreatureConfig, EngineConfig};

/// クリーチャーが生息できる深度帯
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Safe,
    First,
    Second,
    Third,
    Monster,
}

/// 深度帯の y 範囲（両端を含む）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthBand {
    pub min: i32,
    pub max: i32,
}

impl DepthBand {
    pub fn clamp(&self, y: i32) -> i32 {
        y.clamp(self.min, self.max)
    }

    pub fn contains(&self, y: i32) -> bool {
        (self.min..=self.max).contains(&y)
    }
}

impl Level {
    pub fn depth_band(&self) -> DepthBand {
        let (min, max) = match self {
            Level::Safe => (0, 2499),
            Level::First => (2500, 4999),
            Level::Second => (5000, 7499),
            Level::Third => (7500, MAP_SIZE),
            Level::Monster => (2500, MAP_SIZE),
        };
        DepthBand { min, max }
    }
}

/// クリーチャーの種別
///
/// スキャン対象（階層 0..=2）とモンスターは排他的。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Target(u8),
    Monster,
}

impl Category {
    /// 入力上の種別値から変換する（-1 がモンスター）
    pub fn from_kind(kind: i32) -> Option<Self> {
        match kind {
            -1 => Some(Category::Monster),
            0..=2 => Some(Category::Target(kind as u8)),
            _ => None,
        }
    }

    pub fn level(&self) -> Level {
        match self {
            Category::Monster => Level::Monster,
            Category::Target(0) => Level::First,
            Category::Target(1) => Level::Second,
            Category::Target(2) => Level::Third,
            Category::Target(_) => Level::Safe,
        }
    }
}

/// クリーチャー
///
/// `position` と `velocity` は最後に信じている値であり、古い推定値の場合もある。
#[derive(Debug, Clone, PartialEq)]
pub struct Creature {
    pub id: u32,
    pub color: i32,
    pub category: Category,
    pub position: Point,
    pub velocity: Vector2D,
}

impl Creature {
    pub fn new(id: u32, color: i32, category: Category) -> Self {
        Self {
            id,
            color,
            category,
            position: Point::default(),
            velocity: Vector2D::zero(),
        }
    }

    pub fn with_state(mut self, position: Point, velocity: Vector2D) -> Self {
        self.position = position;
        self.velocity = velocity;
        self
    }

    pub fn from_config(config: &CreatureConfig) -> Option<Self> {
        let category = Category::from_kind(config.kind)?;
        Some(
            Self::new(config.id, config.color, category).with_state(
                Point::new(config.pos.x, config.pos.y),
                Vector2D::new(config.vel.x, config.vel.y),
            ),
        )
    }

    pub fn is_hostile(&self) -> bool {
        self.category == Category::Monster
    }

    pub fn level(&self) -> Level {
        self.category.level()
    }

    /// 種別に応じた1ターンあたりの最大移動量
    pub fn max_speed(&self, config: &EngineConfig) -> i32 {
        if self.is_hostile() {
            config.monster_speed
        } else {
            config.fish_max_speed
        }
    }

    /// 現在の速度で1ターン進めた状態
    pub fn advanced(&self) -> Creature {
        Creature {
            position: self.position + self.velocity,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_kind() {
        assert_eq!(Category::from_kind(-1), Some(Category::Monster));
        assert_eq!(Category::from_kind(2), Some(Category::Target(2)));
        assert_eq!(Category::from_kind(3), None);
    }

    #[test]
    fn test_depth_bands() {
        assert_eq!(Category::Monster.level().depth_band(), DepthBand { min: 2500, max: 9999 });
        assert_eq!(Category::Target(1).level().depth_band(), DepthBand { min: 5000, max: 7499 });
        assert_eq!(Level::First.depth_band().clamp(100), 2500);
    }

    #[test]
    fn test_max_speed_depends_on_hostility() {
        let config = EngineConfig::default();
        let monster = Creature::new(1, -1, Category::Monster);
        let fish = Creature::new(2, 0, Category::Target(0));
        assert_eq!(monster.max_speed(&config), 540);
        assert_eq!(fish.max_speed(&config), 400);
    }

    #[test]
    fn test_advanced_moves_by_velocity() {
        let fish = Creature::new(2, 0, Category::Target(0))
            .with_state(Point::new(100, 3000), Vector2D::new(200.0, -50.0));
        assert_eq!(fish.advanced().position, Point::new(300, 2950));
        assert_eq!(fish.advanced().velocity, fish.velocity);
    }
}
