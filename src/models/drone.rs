use std::fmt;

use crate::models::common::{Point, Vector2D};
use crate::scenario::EngineConfig;

/// ライトの点灯状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lights {
    On,
    #[default]
    Off,
}

impl Lights {
    pub fn flag(&self) -> u8 {
        match self {
            Lights::On => 1,
            Lights::Off => 0,
        }
    }
}

/// 自軍ドローン
///
/// 速度は直前の位置との差分から推定する。
#[derive(Debug, Clone, PartialEq)]
pub struct Drone {
    pub id: u32,
    pub position: Point,
    /// 前ターンからの移動量
    pub velocity: Vector2D,
    pub lights: Lights,
    /// 故障中（緊急浮上中）フラグ
    pub emergency: bool,
    pub battery: u32,
}

impl Drone {
    pub fn new(id: u32, position: Point) -> Self {
        Self {
            id,
            position,
            velocity: Vector2D::zero(),
            lights: Lights::Off,
            emergency: false,
            battery: 30,
        }
    }

    /// 新しい観測値で状態を更新し、移動量を速度として記録する
    pub fn update(&mut self, position: Point, emergency: bool, battery: u32) {
        self.velocity = Vector2D::between(self.position, position);
        self.position = position;
        self.emergency = emergency;
        self.battery = battery;
    }

    /// ライト状態に応じた探知半径
    pub fn light_radius(&self, config: &EngineConfig) -> i32 {
        match self.lights {
            Lights::On => config.light_radius_on,
            Lights::Off => config.light_radius_off,
        }
    }

    /// 次ターンの予想位置（直前の移動量を維持すると仮定）
    pub fn predicted_position(&self) -> Point {
        self.position + self.velocity
    }

    /// `target` へ向かう1ターン分の移動先
    ///
    /// 移動量は `max_step` 以下に丸められ、結果はマップ内に収められる。
    pub fn step_towards(&self, target: Point, max_step: i32, map_size: i32) -> Point {
        let mut movement = Vector2D::between(self.position, target);
        if movement.norm() > max_step as f64 {
            movement = movement.with_length(max_step as f64);
        }
        (self.position + movement).clamp_to_map(map_size)
    }
}

/// 1ターン分のドローン指令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// その場で待機
    Hold { lights: Lights },
    /// 指定地点へ移動
    Move { to: Point, lights: Lights },
}

impl Command {
    pub fn lights(&self) -> Lights {
        match self {
            Command::Hold { lights } | Command::Move { lights, .. } => *lights,
        }
    }

    /// 指令を適用した後のドローン位置
    pub fn destination(&self, from: Point) -> Point {
        match self {
            Command::Hold { .. } => from,
            Command::Move { to, .. } => *to,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Hold { lights } => write!(f, "WAIT {}", lights.flag()),
            Command::Move { to, lights } => write!(f, "MOVE {} {} {}", to.x, to.y, lights.flag()),
        }
    }
}
