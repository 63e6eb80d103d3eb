//! # Radar モジュール
//!
//! 直接視認できないクリーチャーの存在可能領域を推定します。
//!
//! 推定は各ターンの問い合わせごとに、保存された方位観測と最後の確定視認、
//! 現在ターンだけから純粋に計算されます。可変な推定状態は保持しません。
//!
//! ## 推定手順
//!
//! 1. 今ターンまたは前ターンの確定視認があれば、その位置（＋速度）を一点として返す
//! 2. それ以外は最後の確定位置から最大移動量だけ広げた矩形を作る
//!    （確定視認が一度もなければ深度帯全体）
//! 3. 直近 `bearing_max_age` ターン以内の方位観測で矩形の各辺を単調に狭める。
//!    観測後に移動できた距離だけ不感帯マージンを削るので、真の位置は除外されない

use std::collections::{HashMap, VecDeque};
use std::str::FromStr;

use tracing::trace;

use crate::models::common::{Point, Vector2D};
use crate::models::creature::{Creature, DepthBand};
use crate::scenario::EngineConfig;

/// 観測者から見たクリーチャーの方位（y軸は下向きが正）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quadrant {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Unknown,
}

impl Quadrant {
    pub fn is_left(&self) -> bool {
        matches!(self, Quadrant::TopLeft | Quadrant::BottomLeft)
    }

    pub fn is_right(&self) -> bool {
        matches!(self, Quadrant::TopRight | Quadrant::BottomRight)
    }

    pub fn is_top(&self) -> bool {
        matches!(self, Quadrant::TopLeft | Quadrant::TopRight)
    }

    pub fn is_bottom(&self) -> bool {
        matches!(self, Quadrant::BottomLeft | Quadrant::BottomRight)
    }

    /// 雑音のないセンサーモデル
    ///
    /// 両軸とも不感帯 `margin` より離れている場合だけ象限を報告し、
    /// それ以外は `Unknown` を返す。これにより方位による絞り込みが真の位置を除外しない。
    pub fn observe(observer: Point, target: Point, margin: i32) -> Quadrant {
        let dx = target.x - observer.x;
        let dy = target.y - observer.y;
        if dx.abs() <= margin || dy.abs() <= margin {
            return Quadrant::Unknown;
        }
        match (dx < 0, dy < 0) {
            (true, true) => Quadrant::TopLeft,
            (false, true) => Quadrant::TopRight,
            (true, false) => Quadrant::BottomLeft,
            (false, false) => Quadrant::BottomRight,
        }
    }
}

impl FromStr for Quadrant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TL" => Ok(Quadrant::TopLeft),
            "TR" => Ok(Quadrant::TopRight),
            "BL" => Ok(Quadrant::BottomLeft),
            "BR" => Ok(Quadrant::BottomRight),
            "NA" => Ok(Quadrant::Unknown),
            _ => Err(format!("無効な方位: {}", s)),
        }
    }
}

/// 方位観測
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bearing {
    pub drone_id: u32,
    pub observer: Point,
    pub quadrant: Quadrant,
    /// 観測したターン
    pub turn: u32,
}

/// 確定視認
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sighting {
    pub position: Point,
    pub velocity: Vector2D,
    pub turn: u32,
}

/// 軸平行な存在可能領域
///
/// 常に `min <= max` が成り立つ。完全に特定された場合は一点に退化する。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingRegion {
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
}

impl BoundingRegion {
    /// 境界が逆転していれば中点に潰して生成する
    pub fn new(min_x: i32, max_x: i32, min_y: i32, max_y: i32) -> Self {
        let (min_x, max_x) = collapse(min_x, max_x);
        let (min_y, max_y) = collapse(min_y, max_y);
        Self { min_x, max_x, min_y, max_y }
    }

    pub fn point(p: Point) -> Self {
        Self { min_x: p.x, max_x: p.x, min_y: p.y, max_y: p.y }
    }

    /// 深度帯の横一列全体
    pub fn strip(band: DepthBand, map_size: i32) -> Self {
        Self::new(0, map_size, band.min, band.max.min(map_size))
    }

    pub fn is_point(&self) -> bool {
        self.min_x == self.max_x && self.min_y == self.max_y
    }

    pub fn width(&self) -> i64 {
        (self.max_x - self.min_x) as i64
    }

    pub fn height(&self) -> i64 {
        (self.max_y - self.min_y) as i64
    }

    pub fn area(&self) -> i64 {
        self.width() * self.height()
    }

    pub fn contains(&self, p: Point) -> bool {
        (self.min_x..=self.max_x).contains(&p.x) && (self.min_y..=self.max_y).contains(&p.y)
    }

    pub fn center(&self) -> Point {
        Point::new((self.min_x + self.max_x) / 2, (self.min_y + self.max_y) / 2)
    }

    /// 四隅（呼び出し側はこの凸包を存在可能領域として扱う）
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.min_x, self.min_y),
            Point::new(self.max_x, self.min_y),
            Point::new(self.min_x, self.max_y),
            Point::new(self.max_x, self.max_y),
        ]
    }

    /// 左右反転した領域
    pub fn mirrored_x(&self, map_size: i32) -> Self {
        Self::new(map_size - self.max_x, map_size - self.min_x, self.min_y, self.max_y)
    }

    /// マップと深度帯で挟み込む
    pub fn clamped(&self, band: DepthBand, map_size: i32) -> Self {
        let band_max = band.max.min(map_size);
        Self::new(
            self.min_x.clamp(0, map_size),
            self.max_x.clamp(0, map_size),
            self.min_y.clamp(band.min, band_max),
            self.max_y.clamp(band.min, band_max),
        )
    }

    /// 方位観測を一つ取り込む
    ///
    /// 観測者位置から `margin` だけ離した線で、象限が示す側の辺を狭める。
    /// `margin` は負でもよい（観測後に移動した分だけ線が観測者の反対側へ出る）。
    /// 辺を外側へ動かす更新は行わない。
    pub fn narrowed(&self, bearing: &Bearing, margin: i32) -> Self {
        let from = bearing.observer;
        let quadrant = bearing.quadrant;
        let mut region = *self;

        if quadrant.is_left() {
            region.max_x = region.max_x.min(from.x - margin);
        }
        if quadrant.is_right() {
            region.min_x = region.min_x.max(from.x + margin);
        }
        if quadrant.is_top() {
            region.max_y = region.max_y.min(from.y - margin);
        }
        if quadrant.is_bottom() {
            region.min_y = region.min_y.max(from.y + margin);
        }

        Self::new(region.min_x, region.max_x, region.min_y, region.max_y)
    }
}

fn collapse(min: i32, max: i32) -> (i32, i32) {
    if min > max {
        let mid = min + (max - min) / 2;
        (mid, mid)
    } else {
        (min, max)
    }
}

/// 方位観測と確定視認の履歴
///
/// 方位はクリーチャーごとに最新 `capacity` 件だけ保持する（古いものから破棄）。
#[derive(Debug, Clone)]
pub struct RadarLog {
    capacity: usize,
    bearings: HashMap<u32, VecDeque<Bearing>>,
    sightings: HashMap<u32, Sighting>,
}

impl RadarLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            bearings: HashMap::new(),
            sightings: HashMap::new(),
        }
    }

    pub fn register_bearing(&mut self, creature_id: u32, bearing: Bearing) {
        let history = self.bearings.entry(creature_id).or_default();
        history.push_back(bearing);
        while history.len() > self.capacity {
            history.pop_front();
        }
    }

    /// 確定視認を記録する。古い視認は置き換えられる。
    pub fn register_sighting(&mut self, creature_id: u32, sighting: Sighting) {
        match self.sightings.get(&creature_id) {
            Some(existing) if existing.turn > sighting.turn => {}
            _ => {
                self.sightings.insert(creature_id, sighting);
            }
        }
    }

    pub fn bearings(&self, creature_id: u32) -> impl Iterator<Item = &Bearing> {
        self.bearings.get(&creature_id).into_iter().flatten()
    }

    /// `turn` から見て `max_age` ターン未満の方位観測
    pub fn recent_bearings(
        &self,
        creature_id: u32,
        turn: u32,
        max_age: u32,
    ) -> impl Iterator<Item = &Bearing> {
        self.bearings(creature_id)
            .filter(move |b| turn.saturating_sub(b.turn) < max_age)
    }

    pub fn last_sighting(&self, creature_id: u32) -> Option<&Sighting> {
        self.sightings.get(&creature_id)
    }
}

/// 今ターンまたは前ターンの確定視認から求まる正確な位置
///
/// 前ターンの視認は、その速度で1ターン進め、マップと深度帯で止めた位置になる。
/// 方位観測だけから一点に潰れた領域はここには含まれない。
pub fn confirmed_position(
    creature: &Creature,
    log: &RadarLog,
    turn: u32,
    config: &EngineConfig,
) -> Option<Point> {
    let sighting = log.last_sighting(creature.id)?;
    match turn.saturating_sub(sighting.turn) {
        0 => Some(sighting.position),
        1 => Some(advance_within(creature, sighting, config.map_size)),
        _ => None,
    }
}

fn advance_within(creature: &Creature, sighting: &Sighting, map_size: i32) -> Point {
    let band = creature.level().depth_band();
    let next = sighting.position + sighting.velocity;
    Point::new(next.x.clamp(0, map_size), band.clamp(next.y))
}

/// 最後の確定視認と経過ターンから求める最大到達範囲
pub fn maximum_range(
    creature: &Creature,
    log: &RadarLog,
    turn: u32,
    config: &EngineConfig,
) -> BoundingRegion {
    let band = creature.level().depth_band();
    let map_size = config.map_size;

    if let Some(position) = confirmed_position(creature, log, turn, config) {
        return BoundingRegion::point(position);
    }
    let Some(sighting) = log.last_sighting(creature.id) else {
        return BoundingRegion::strip(band, map_size);
    };

    let elapsed = turn.saturating_sub(sighting.turn);
    let known = advance_within(creature, sighting, map_size);
    let reach = creature.max_speed(config) * elapsed as i32;
    BoundingRegion::new(known.x - reach, known.x + reach, known.y - reach, known.y + reach)
        .clamped(band, map_size)
}

/// クリーチャーの存在可能領域を推定する
pub fn locate(creature: &Creature, log: &RadarLog, turn: u32, config: &EngineConfig) -> BoundingRegion {
    let range = maximum_range(creature, log, turn, config);
    if range.is_point() {
        return range;
    }

    let band = creature.level().depth_band();
    let speed = creature.max_speed(config);
    let region = log
        .recent_bearings(creature.id, turn, config.bearing_max_age)
        .fold(range, |region, bearing| {
            let drift = speed * turn.saturating_sub(bearing.turn) as i32;
            region.narrowed(bearing, config.sensor_margin - drift)
        })
        .clamped(band, config.map_size);

    trace!(
        creature_id = creature.id,
        turn,
        min_x = region.min_x,
        max_x = region.max_x,
        min_y = region.min_y,
        max_y = region.max_y,
        "RADAR_LOCATE: 存在可能領域を推定しました"
    );

    region
}

/// 序盤の左右対称配置ヒント
///
/// 序盤ターンの間、対になるクリーチャーの領域を左右反転したものが
/// 自身の領域より厳密に小さければ、そちらを採用できる。
#[derive(Debug, Clone, Default)]
pub struct SymmetryHint {
    pub opening_turns: u32,
    twins: HashMap<u32, u32>,
}

impl SymmetryHint {
    pub fn new(opening_turns: u32) -> Self {
        Self { opening_turns, twins: HashMap::new() }
    }

    pub fn with_pair(mut self, a: u32, b: u32) -> Self {
        self.twins.insert(a, b);
        self.twins.insert(b, a);
        self
    }

    /// 現在ターンで有効な対の相手
    pub fn twin_of(&self, creature_id: u32, turn: u32) -> Option<u32> {
        if turn > self.opening_turns {
            return None;
        }
        self.twins.get(&creature_id).copied()
    }
}
