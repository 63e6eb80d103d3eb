use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::common::{
    DRONE_SPEED, FISH_MAX_SPEED, MAP_SIZE, MONSTER_COLLISION_RADIUS, MONSTER_SPEED,
    SCAN_AVOID_RADIUS, SENSOR_MARGIN,
};

/// シナリオメタデータ
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScenarioMeta {
    pub version: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// シミュレーション設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulationConfig {
    /// 実行ターン数（最大200）
    pub turns: u32,
    pub seed: u64,
}

/// 自己位置推定・回避エンジンのパラメータ
///
/// すべての項目にデフォルト値があり、YAMLでは上書きしたい項目のみ記述すればよい。
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    pub map_size: i32,
    /// レーダー方位の不感帯マージン
    pub sensor_margin: i32,
    pub fish_max_speed: i32,
    pub monster_speed: i32,
    pub monster_collision_radius: i32,
    /// 非敵対クリーチャー用の回避半径
    pub scan_avoid_radius: i32,
    pub drone_speed: i32,
    /// 一次回避探索の角度刻み（度）
    pub escape_step_deg: usize,
    /// 二手先の安全確認に使う角度刻み（度）
    pub lookahead_step_deg: usize,
    /// この面積未満の推定領域は「位置特定済み」とみなす
    pub found_area: i64,
    /// 迎撃地点をターゲットからずらす距離
    pub standoff_distance: f64,
    /// 迎撃対象とみなすマップ左右端からの距離
    pub edge_band: i32,
    /// 未特定領域へ向かう探索目標をマップ端から離す距離
    pub exploration_margin: i32,
    pub light_radius_on: i32,
    pub light_radius_off: i32,
    /// クリーチャーごとに保持する方位観測の数
    pub bearing_capacity: usize,
    /// この経過ターン数に達した方位観測は推定に使わない
    pub bearing_max_age: u32,
    /// 回避探索で使う敵の運動モデル
    pub hostile_motion: MotionModel,
}

/// 敵の運動モデルの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MotionModel {
    /// 最も近いドローンへ向かい直す
    #[default]
    Pursuit,
    /// 現在の速度のまま進む
    Drift,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            map_size: MAP_SIZE,
            sensor_margin: SENSOR_MARGIN,
            fish_max_speed: FISH_MAX_SPEED,
            monster_speed: MONSTER_SPEED,
            monster_collision_radius: MONSTER_COLLISION_RADIUS,
            scan_avoid_radius: SCAN_AVOID_RADIUS,
            drone_speed: DRONE_SPEED,
            escape_step_deg: 1,
            lookahead_step_deg: 10,
            found_area: 1_250_000,
            standoff_distance: 400.0,
            edge_band: 1500,
            exploration_margin: 800,
            light_radius_on: 2000,
            light_radius_off: 800,
            bearing_capacity: 4,
            bearing_max_age: 4,
            hostile_motion: MotionModel::Pursuit,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.map_size <= 0 {
            return Err(ScenarioError::Validation("map_size must be positive".to_string()));
        }
        if self.escape_step_deg == 0 || 360 % self.escape_step_deg != 0 {
            return Err(ScenarioError::Validation(format!(
                "escape_step_deg {} must divide 360",
                self.escape_step_deg
            )));
        }
        if self.lookahead_step_deg == 0 || 360 % self.lookahead_step_deg != 0 {
            return Err(ScenarioError::Validation(format!(
                "lookahead_step_deg {} must divide 360",
                self.lookahead_step_deg
            )));
        }
        if self.bearing_capacity == 0 || self.bearing_max_age == 0 {
            return Err(ScenarioError::Validation(
                "bearing_capacity and bearing_max_age must be positive".to_string(),
            ));
        }
        if self.drone_speed <= 0 || self.monster_speed <= 0 || self.fish_max_speed <= 0 {
            return Err(ScenarioError::Validation("speeds must be positive".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct Position2D {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
pub struct Velocity2D {
    pub x: f64,
    pub y: f64,
}

/// ドローン設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DroneConfig {
    pub id: u32,
    pub pos: Position2D,
}

/// クリーチャー設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreatureConfig {
    pub id: u32,
    #[serde(default)]
    pub color: i32,
    /// 種別: -1 はモンスター、0..=2 はスキャン対象の階層
    pub kind: i32,
    pub pos: Position2D,
    #[serde(default)]
    pub vel: Velocity2D,
}

/// 序盤の左右対称配置ヒント
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SymmetryConfig {
    pub opening_turns: u32,
    pub pairs: Vec<[u32; 2]>,
}

/// 完全なシナリオ設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScenarioConfig {
    pub meta: ScenarioMeta,
    pub sim: SimulationConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    pub drones: Vec<DroneConfig>,
    pub creatures: Vec<CreatureConfig>,
    #[serde(default)]
    pub symmetry: Option<SymmetryConfig>,
}

impl ScenarioConfig {
    /// YAMLファイルからシナリオ設定を読み込み
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.to_path_buf()));
        }

        let contents =
            fs::read_to_string(path).map_err(|e| ScenarioError::Io(path.to_path_buf(), e))?;

        Self::from_yaml_str(&contents).map_err(|e| match e {
            ScenarioError::Parse(_, err) => ScenarioError::Parse(path.to_path_buf(), err),
            other => other,
        })
    }

    /// YAML文字列からシナリオ設定を読み込み
    pub fn from_yaml_str(contents: &str) -> Result<Self, ScenarioError> {
        let config: ScenarioConfig = serde_yaml::from_str(contents)
            .map_err(|e| ScenarioError::Parse(PathBuf::from("<inline>"), e))?;
        config.validate()?;
        Ok(config)
    }

    /// 設定の基本的な検証
    pub fn validate(&self) -> Result<(), ScenarioError> {
        self.engine.validate()?;

        if self.sim.turns == 0 || self.sim.turns > 200 {
            return Err(ScenarioError::Validation(format!(
                "turns must be within 1..=200, got {}",
                self.sim.turns
            )));
        }
        if self.drones.is_empty() {
            return Err(ScenarioError::Validation("at least one drone is required".to_string()));
        }

        let map_size = self.engine.map_size;
        let in_map = |p: &Position2D| (0..=map_size).contains(&p.x) && (0..=map_size).contains(&p.y);

        let mut drone_ids = HashSet::new();
        for drone in &self.drones {
            if !drone_ids.insert(drone.id) {
                return Err(ScenarioError::Validation(format!("duplicate drone id {}", drone.id)));
            }
            if !in_map(&drone.pos) {
                return Err(ScenarioError::Validation(format!(
                    "drone {} outside map bounds",
                    drone.id
                )));
            }
        }

        let mut creature_ids = HashSet::new();
        for creature in &self.creatures {
            if !creature_ids.insert(creature.id) {
                return Err(ScenarioError::Validation(format!(
                    "duplicate creature id {}",
                    creature.id
                )));
            }
            if !(-1..=2).contains(&creature.kind) {
                return Err(ScenarioError::Validation(format!(
                    "creature {} has unknown kind {}",
                    creature.id, creature.kind
                )));
            }
            if !in_map(&creature.pos) {
                return Err(ScenarioError::Validation(format!(
                    "creature {} outside map bounds",
                    creature.id
                )));
            }
            let limit = if creature.kind == -1 {
                self.engine.monster_speed
            } else {
                self.engine.fish_max_speed
            };
            if creature.vel.x.hypot(creature.vel.y) > limit as f64 {
                return Err(ScenarioError::Validation(format!(
                    "creature {} is faster than {}",
                    creature.id, limit
                )));
            }
        }

        if let Some(symmetry) = &self.symmetry {
            for [a, b] in &symmetry.pairs {
                if !creature_ids.contains(a) || !creature_ids.contains(b) {
                    return Err(ScenarioError::Validation(format!(
                        "symmetry pair ({}, {}) references unknown creature",
                        a, b
                    )));
                }
            }
        }

        Ok(())
    }

    /// シナリオの概要を表示
    pub fn print_summary(&self) {
        println!("=== シナリオ情報 ===");
        println!("名前: {}", self.meta.name);
        println!("説明: {}", self.meta.description);
        println!("バージョン: {}", self.meta.version);
        println!();

        println!("=== シミュレーション設定 ===");
        println!("ターン数: {}", self.sim.turns);
        println!("シード値: {}", self.sim.seed);
        println!();

        let monsters = self.creatures.iter().filter(|c| c.kind == -1).count();
        println!("=== 配置 ===");
        println!("ドローン: {}機", self.drones.len());
        println!("クリーチャー: {}体 (うちモンスター {}体)", self.creatures.len(), monsters);
        if let Some(symmetry) = &self.symmetry {
            println!(
                "対称ヒント: {}組 (序盤 {}ターン)",
                symmetry.pairs.len(),
                symmetry.opening_turns
            );
        }
    }
}

/// シナリオ読み込みエラー
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("シナリオファイルが見つかりません: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("ファイル読み込みエラー {}: {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),
    #[error("YAML解析エラー {}: {}", .0.display(), .1)]
    Parse(PathBuf, #[source] serde_yaml::Error),
    #[error("設定検証エラー: {0}")]
    Validation(String),
}
