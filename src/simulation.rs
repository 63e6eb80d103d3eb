//! # Simulation モジュール
//!
//! 自己位置推定・回避エンジンを、雑音のない真値シミュレーションの上で
//! ターン単位に駆動します。
//!
//! 実運用ではターン入力の解析と指令の出力は外部のオーケストレーターが担いますが、
//! このモジュールはその代役として真値のクリーチャーを動かし、観測を生成し、
//! エンジンの出力（回避後の移動先）をドローンに適用します。
//!
//! ## ターン処理順序
//!
//! 1. **観測**: 探知半径内のクリーチャーは確定視認、それ以外は方位観測として記録
//! 2. **判断**: 探索目標を決め、回避探索で安全な移動先に置き換える
//! 3. **移動**: ドローンを移動させる
//! 4. **クリーチャー更新**: 真値のクリーチャーを進め、モンスターの進行方向を更新
//! 5. **衝突判定**: 移動中にモンスターと接触したドローンは故障状態になる。
//!    故障中のドローンは毎ターン浮上し、水面近くまで戻ると復旧する
//!
//! ## 使用例
//!
//! ```no_run
//! use sonarnav::scenario::ScenarioConfig;
//! use sonarnav::simulation::SimulationEngine;
//!
//! let config = ScenarioConfig::from_file("scenarios/demo.yaml").unwrap();
//! let mut engine = SimulationEngine::new(config, 1);
//! let stats = engine.run().unwrap();
//! println!("{:?}", stats);
//! ```

use std::collections::{HashMap, HashSet};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, trace, warn};

use crate::error::NavError;
use crate::models::{
    Bearing, Command, Creature, Drone, EscapePlanner, InterceptPlanner, Lights, Point, Quadrant,
    RadarLog, Safety, Sighting, SymmetryHint, TurnContext, Vector2D, motion_for,
    touches_during_turn,
};
use crate::scenario::{EngineConfig, ScenarioConfig};

/// 浮上完了とみなす深さ
const SURFACE_Y: i32 = 500;
/// ライト点灯に必要なバッテリー
const LIGHT_COST: u32 = 5;
const BATTERY_MAX: u32 = 30;
/// 故障中のドローンが1ターンに浮上する距離
const EMERGENCY_ASCENT: i32 = 300;

/// 実行結果の集計
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulationStats {
    pub turns: u32,
    pub scans: u32,
    pub escapes: u32,
    pub stranded: u32,
    pub collisions: u32,
}

pub struct SimulationEngine {
    pub turn: u32,
    pub max_turns: u32,
    pub config: EngineConfig,

    pub drones: Vec<Drone>,
    /// 真値のクリーチャー（id順）
    pub truth: Vec<Creature>,
    /// エンジンが信じているクリーチャーの状態
    pub roster: HashMap<u32, Creature>,
    pub radar: RadarLog,
    pub symmetry: Option<SymmetryHint>,
    pub scanned: HashSet<u32>,

    pub stats: SimulationStats,
    pub verbose_level: u8,
    rng: StdRng,
}

impl SimulationEngine {
    pub fn new(scenario: ScenarioConfig, verbose_level: u8) -> Self {
        let config = scenario.engine.clone();

        let drones = scenario
            .drones
            .iter()
            .map(|d| Drone::new(d.id, Point::new(d.pos.x, d.pos.y)))
            .collect();

        let mut truth: Vec<Creature> = scenario
            .creatures
            .iter()
            .filter_map(Creature::from_config)
            .collect();
        truth.sort_by_key(|c| c.id);

        // 名簿には種別だけを載せ、位置は観測で埋める
        let roster = truth
            .iter()
            .map(|c| (c.id, Creature::new(c.id, c.color, c.category)))
            .collect();

        let symmetry = scenario.symmetry.as_ref().map(|s| {
            s.pairs
                .iter()
                .fold(SymmetryHint::new(s.opening_turns), |hint, [a, b]| hint.with_pair(*a, *b))
        });

        Self {
            turn: 0,
            max_turns: scenario.sim.turns,
            radar: RadarLog::new(config.bearing_capacity),
            config,
            drones,
            truth,
            roster,
            symmetry,
            scanned: HashSet::new(),
            stats: SimulationStats::default(),
            verbose_level,
            rng: StdRng::seed_from_u64(scenario.sim.seed),
        }
    }

    pub fn run(&mut self) -> Result<SimulationStats, NavError> {
        info!(
            turns = self.max_turns,
            drones = self.drones.len(),
            creatures = self.truth.len(),
            "SIMULATION_START: シミュレーションを開始します"
        );

        while self.turn < self.max_turns {
            let commands = self.step()?;

            if self.verbose_level > 2 {
                for (drone, command) in self.drones.iter().zip(&commands) {
                    trace!(turn = self.turn, drone_id = drone.id, command = %command, "DRONE_COMMAND");
                }
            }

            if self.turn % 25 == 0 && self.verbose_level > 0 {
                info!(
                    turn = self.turn,
                    scans = self.stats.scans,
                    escapes = self.stats.escapes,
                    "進行状況: {}/{}ターン",
                    self.turn,
                    self.max_turns
                );
            }
        }

        info!(
            turns = self.stats.turns,
            scans = self.stats.scans,
            escapes = self.stats.escapes,
            stranded = self.stats.stranded,
            collisions = self.stats.collisions,
            "SIMULATION_END: シミュレーションが完了しました"
        );

        Ok(self.stats.clone())
    }

    /// 1ターン進める
    pub fn step(&mut self) -> Result<Vec<Command>, NavError> {
        self.turn += 1;

        let visible = self.observe();
        let commands = self.decide(&visible)?;

        let starts: Vec<Point> = self.drones.iter().map(|d| d.position).collect();
        let monsters: Vec<Creature> =
            self.truth.iter().filter(|c| c.is_hostile()).cloned().collect();

        self.apply(&commands);
        self.advance_creatures();
        self.check_collisions(&starts, &monsters);

        self.stats.turns = self.turn;
        Ok(commands)
    }

    fn observe(&mut self) -> HashSet<u32> {
        let mut visible = HashSet::new();

        for creature in &self.truth {
            for drone in &self.drones {
                let distance = drone.position.distance_to(&creature.position);
                if distance <= drone.light_radius(&self.config) as f64 {
                    visible.insert(creature.id);
                    if !creature.is_hostile() && self.scanned.insert(creature.id) {
                        self.stats.scans += 1;
                        info!(
                            turn = self.turn,
                            drone_id = drone.id,
                            creature_id = creature.id,
                            "CREATURE_SCANNED: クリーチャーをスキャンしました"
                        );
                    }
                    continue;
                }

                let quadrant =
                    Quadrant::observe(drone.position, creature.position, self.config.sensor_margin);
                if quadrant != Quadrant::Unknown {
                    self.radar.register_bearing(creature.id, Bearing {
                        drone_id: drone.id,
                        observer: drone.position,
                        quadrant,
                        turn: self.turn,
                    });
                }
            }

            if visible.contains(&creature.id) {
                self.radar.register_sighting(creature.id, Sighting {
                    position: creature.position,
                    velocity: creature.velocity,
                    turn: self.turn,
                });
                self.roster.insert(creature.id, creature.clone());
            }
        }

        visible
    }

    fn decide(&mut self, visible: &HashSet<u32>) -> Result<Vec<Command>, NavError> {
        let navigations = {
            let mut context = TurnContext::new(self.turn, &self.config, &self.roster, &self.radar);
            if let Some(hint) = &self.symmetry {
                context = context.with_symmetry(hint);
            }

            let positions: Vec<Point> = self.drones.iter().map(|d| d.position).collect();
            let hostiles = context.resolve_hostiles(visible, &positions)?;

            let mut navigations = Vec::with_capacity(self.drones.len());
            for drone in &self.drones {
                if drone.emergency {
                    navigations.push(None);
                    continue;
                }

                let goal = self.goal_for(&context, drone)?;
                let desired = drone.step_towards(goal, self.config.drone_speed, self.config.map_size);

                let companions = self
                    .drones
                    .iter()
                    .filter(|other| other.id != drone.id)
                    .map(|other| other.predicted_position())
                    .collect();
                let planner = EscapePlanner::new(&self.config, motion_for(&self.config))
                    .with_companions(companions);

                let navigation = planner.navigate(drone.position, &hostiles, desired);
                if navigation.avoided {
                    debug!(
                        turn = self.turn,
                        drone_id = drone.id,
                        desired_x = desired.x,
                        desired_y = desired.y,
                        escape_x = navigation.destination.x,
                        escape_y = navigation.destination.y,
                        safety = ?navigation.safety,
                        "DRONE_ESCAPE: 衝突を回避するため移動先を変更しました"
                    );
                }
                navigations.push(Some(navigation));
            }
            navigations
        };

        let turn = self.turn;
        let mut commands = Vec::with_capacity(self.drones.len());
        for (drone, navigation) in self.drones.iter_mut().zip(navigations) {
            let Some(navigation) = navigation else {
                drone.lights = Lights::Off;
                commands.push(Command::Hold { lights: Lights::Off });
                continue;
            };

            if navigation.avoided {
                self.stats.escapes += 1;
            }
            if navigation.safety == Safety::Stranded {
                self.stats.stranded += 1;
            }

            drone.lights = if turn % 3 == 0 && drone.battery >= LIGHT_COST {
                Lights::On
            } else {
                Lights::Off
            };
            commands.push(Command::Move { to: navigation.destination, lights: drone.lights });
        }

        Ok(commands)
    }

    /// 未スキャンのクリーチャーのうち、探索目標が最も近いもの（なければ浮上）
    ///
    /// 確定視認で位置が分かるターゲットがマップ左右端にいる場合は、端側へ回り込む迎撃地点を使う。
    fn goal_for(&self, context: &TurnContext<'_>, drone: &Drone) -> Result<Point, NavError> {
        let mut best: Option<(u32, Point, f64)> = None;

        for creature in &self.truth {
            if creature.is_hostile() || self.scanned.contains(&creature.id) {
                continue;
            }
            let region = context.locate(creature.id)?;
            let target = context.exploration_target(&region);
            let distance = drone.position.distance_to(&target);
            if best.is_none_or(|(_, _, d)| distance < d) {
                best = Some((creature.id, target, distance));
            }
        }

        let Some((id, target, _)) = best else {
            return Ok(Point::new(drone.position.x, SURFACE_Y));
        };

        let Some(position) = context.confirmed_position(id)? else {
            return Ok(target);
        };

        let believed = context.creature(id)?;
        let fish = believed.clone().with_state(position, believed.velocity);
        let interceptor = InterceptPlanner::from_config(&self.config);
        if !interceptor.is_near_edge(&fish) || interceptor.leaves_map(&fish) {
            return Ok(target);
        }

        let lead = interceptor.lead_point(&fish, drone.position).clamp_to_map(self.config.map_size);
        debug!(
            turn = self.turn,
            drone_id = drone.id,
            creature_id = id,
            lead_x = lead.x,
            lead_y = lead.y,
            "DRONE_INTERCEPT: 端のターゲットへ回り込みます"
        );
        Ok(lead)
    }

    /// ドローンを id で参照する
    pub fn drone(&self, id: u32) -> Result<&Drone, NavError> {
        self.drones
            .iter()
            .find(|d| d.id == id)
            .ok_or(NavError::UnknownDrone(id))
    }

    fn apply(&mut self, commands: &[Command]) {
        for (drone, command) in self.drones.iter_mut().zip(commands) {
            let battery = match command.lights() {
                Lights::On => drone.battery.saturating_sub(LIGHT_COST),
                Lights::Off => (drone.battery + 1).min(BATTERY_MAX),
            };

            if !drone.emergency {
                let destination = command.destination(drone.position);
                drone.update(destination, false, battery);
                continue;
            }

            let ascent = Point::new(drone.position.x, (drone.position.y - EMERGENCY_ASCENT).max(0));
            let recovered = ascent.y <= SURFACE_Y;
            drone.update(ascent, !recovered, battery);
            if recovered {
                info!(
                    turn = self.turn,
                    drone_id = drone.id,
                    "DRONE_RECOVERED: ドローンが浮上して復旧しました"
                );
            }
        }
    }

    fn advance_creatures(&mut self) {
        let map_size = self.config.map_size;
        // 対称ヒントが有効な間は配置の対称性を崩さない
        let wander = self.symmetry.as_ref().is_none_or(|h| self.turn > h.opening_turns);

        for creature in &mut self.truth {
            let band = creature.level().depth_band();
            let mut next = creature.position + creature.velocity;

            if !(0..=map_size).contains(&next.x) {
                creature.velocity.x = -creature.velocity.x;
                next.x = next.x.clamp(0, map_size);
            }
            if !band.contains(next.y) {
                creature.velocity.y = -creature.velocity.y;
                next.y = band.clamp(next.y);
            }
            creature.position = next;

            if creature.is_hostile() {
                let nearest = self
                    .drones
                    .iter()
                    .filter(|d| {
                        next.distance_to(&d.position) <= d.light_radius(&self.config) as f64
                    })
                    .min_by(|a, b| {
                        next.distance_to(&a.position).total_cmp(&next.distance_to(&b.position))
                    });
                if let Some(drone) = nearest {
                    creature.velocity = Vector2D::between(next, drone.position)
                        .with_length(self.config.monster_speed as f64);
                }
            } else if wander && self.rng.gen_bool(0.2) {
                let turn_by = self.rng.gen_range(-30.0..=30.0);
                let speed = creature.velocity.norm().min(self.config.fish_max_speed as f64);
                creature.velocity = creature.velocity.rotate(turn_by).with_length(speed);
            }
        }
    }

    /// 各ドローンの今ターンの移動中に、モンスターの移動と接触したかを判定する
    fn check_collisions(&mut self, starts: &[Point], monsters: &[Creature]) {
        let radius = self.config.monster_collision_radius as f64;

        for (drone, from) in self.drones.iter_mut().zip(starts) {
            if drone.emergency {
                continue;
            }
            let hit = monsters.iter().find(|m| {
                touches_during_turn(*from, drone.position, m.position, m.velocity, radius)
            });

            if let Some(monster) = hit {
                drone.emergency = true;
                self.stats.collisions += 1;
                warn!(
                    turn = self.turn,
                    drone_id = drone.id,
                    monster_id = monster.id,
                    x = drone.position.x,
                    y = drone.position.y,
                    "DRONE_COLLISION: ドローンがモンスターと接触しました"
                );
            }
        }
    }
}
