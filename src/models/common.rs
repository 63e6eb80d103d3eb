use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};
use std::sync::LazyLock;

/// マップの一辺（座標は 0..=MAP_SIZE）
pub const MAP_SIZE: i32 = 9999;
/// レーダー方位の不感帯マージン
pub const SENSOR_MARGIN: i32 = 420;
/// 通常クリーチャーの最大速度（1ターンあたり）
pub const FISH_MAX_SPEED: i32 = 400;
/// モンスターの最大速度（1ターンあたり）
pub const MONSTER_SPEED: i32 = 540;
/// モンスターとの衝突判定半径
pub const MONSTER_COLLISION_RADIUS: i32 = 500;
/// 非敵対クリーチャーを避ける際の半径
pub const SCAN_AVOID_RADIUS: i32 = 2000;
/// ドローンの最大移動距離（1ターンあたり）
pub const DRONE_SPEED: i32 = 600;

/// 整数マップ座標
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// ユークリッド距離
    pub fn distance_to(&self, other: &Point) -> f64 {
        Vector2D::between(*self, *other).norm()
    }

    /// マップ範囲 `[0, map_size]²` に収まっているか
    pub fn is_on_map(&self, map_size: i32) -> bool {
        (0..=map_size).contains(&self.x) && (0..=map_size).contains(&self.y)
    }

    pub fn clamp_to_map(&self, map_size: i32) -> Point {
        Point::new(self.x.clamp(0, map_size), self.y.clamp(0, map_size))
    }

    /// x軸方向に鏡映した点（左右対称配置用）
    pub fn mirrored_x(&self, map_size: i32) -> Point {
        Point::new(map_size - self.x, self.y)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// 点にベクトルを加算する。各成分は最も近い整数へ丸められる。
impl Add<Vector2D> for Point {
    type Output = Point;

    fn add(self, v: Vector2D) -> Self::Output {
        Point::new(self.x + v.x.round() as i32, self.y + v.y.round() as i32)
    }
}

/// `a - b` は b から a へのベクトル
impl Sub for Point {
    type Output = Vector2D;

    fn sub(self, other: Point) -> Self::Output {
        Vector2D::between(other, self)
    }
}

/// 浮動小数点の2次元ベクトル
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector2D {
    pub x: f64,
    pub y: f64,
}

impl Vector2D {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub const fn zero() -> Self {
        Self::new(0.0, 0.0)
    }

    /// `from` から `to` へのベクトル
    pub fn between(from: Point, to: Point) -> Self {
        Self::new((to.x - from.x) as f64, (to.y - from.y) as f64)
    }

    pub fn norm(&self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

    pub fn dot(&self, other: &Vector2D) -> f64 {
        self.x * other.x + self.y * other.y
    }

    pub fn scaled(&self, by: f64) -> Self {
        Self::new(self.x * by, self.y * by)
    }

    /// 単位ベクトル化。ゼロベクトルはゼロベクトルのまま返す。
    pub fn normalized(&self) -> Self {
        let norm = self.norm();
        if norm == 0.0 {
            return Self::zero();
        }
        self.scaled(1.0 / norm)
    }

    /// `self` を `onto` 上へ射影する: `onto * (dot(self, onto) / |onto|²)`
    ///
    /// `onto` がゼロベクトルの場合はゼロベクトルを返す。
    pub fn project(&self, onto: &Vector2D) -> Self {
        let length_squared = onto.dot(onto);
        if length_squared == 0.0 {
            return Self::zero();
        }
        onto.scaled(self.dot(onto) / length_squared)
    }

    /// 反時計回りに `degrees` 度回転する
    pub fn rotate(&self, degrees: f64) -> Self {
        if self.is_zero() {
            return Self::zero();
        }
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }

    /// 成分ごとに最も近い整数へ丸める
    pub fn rounded(&self) -> Self {
        Self::new(self.x.round(), self.y.round())
    }

    /// 指定した長さに揃えて丸めたベクトル（速度ベクトルの生成用）
    pub fn with_length(&self, length: f64) -> Self {
        self.normalized().scaled(length).rounded()
    }
}

impl Add for Vector2D {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Vector2D {
    type Output = Self;

    fn sub(self, other: Self) -> Self::Output {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

impl Mul<f64> for Vector2D {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self::Output {
        self.scaled(scalar)
    }
}

impl Neg for Vector2D {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self::new(-self.x, -self.y)
    }
}

/// 整数度 0..359 の三角関数テーブル
///
/// 角度探索の度に `sin`/`cos` を呼ばないよう、起動時に一度だけ計算する。
pub struct AngleTable {
    cos: [f64; 360],
    sin: [f64; 360],
}

impl AngleTable {
    fn build() -> Self {
        let mut cos = [0.0; 360];
        let mut sin = [0.0; 360];
        for degree in 0..360 {
            let (s, c) = (degree as f64).to_radians().sin_cos();
            cos[degree] = c;
            sin[degree] = s;
        }
        Self { cos, sin }
    }

    /// `degree` 方向の単位ベクトル（360以上は剰余を取る）
    pub fn unit(&self, degree: usize) -> Vector2D {
        let degree = degree % 360;
        Vector2D::new(self.cos[degree], self.sin[degree])
    }

    /// `origin` から `degree` 方向へ `distance` だけ離れた点
    pub fn offset(&self, origin: Point, degree: usize, distance: f64) -> Point {
        origin + self.unit(degree).scaled(distance)
    }
}

pub static ANGLES: LazyLock<AngleTable> = LazyLock::new(AngleTable::build);
