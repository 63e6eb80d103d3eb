use crate::models::common::{Point, Vector2D};
use crate::models::creature::Creature;
use crate::scenario::EngineConfig;

/// 迎撃地点の計算
///
/// マップ左右端の近くにいるターゲットに対し、逃げ道側に回り込む地点を求める。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterceptPlanner {
    map_size: i32,
    standoff: f64,
    edge_band: i32,
}

impl InterceptPlanner {
    pub fn new(map_size: i32, standoff: f64, edge_band: i32) -> Self {
        Self { map_size, standoff, edge_band }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.map_size, config.standoff_distance, config.edge_band)
    }

    /// ターゲットがマップ左右端の帯にいるか
    pub fn is_near_edge(&self, target: &Creature) -> bool {
        let x = target.position.x;
        x <= self.edge_band || x >= self.map_size - self.edge_band
    }

    /// 1ターン後の予想位置がマップ外に出るか
    ///
    /// その場合は別の目標を選ぶかどうかを呼び出し側が判断する。
    pub fn leaves_map(&self, target: &Creature) -> bool {
        !target.advanced().position.is_on_map(self.map_size)
    }

    /// 迎撃地点
    ///
    /// ターゲットの1ターン後の位置から、近い方の左右端へ向けて `standoff` だけずらした点。
    /// 追跡者→ターゲットのベクトルを端方向へ射影し、その符号を端側に揃える。
    pub fn lead_point(&self, target: &Creature, pursuer: Point) -> Point {
        let future = target.advanced().position;
        let border_x = if future.x < self.map_size / 2 { -1 } else { self.map_size + 1 };
        let border = Point::new(border_x, future.y);

        let to_border = Vector2D::between(future, border);
        let mut offset = Vector2D::between(future, pursuer).project(&to_border);

        if future.distance_to(&border) < (future + offset).distance_to(&border) {
            offset = -offset;
        }

        future + offset.normalized().scaled(self.standoff)
    }
}
