//! # Escape モジュール
//!
//! 衝突が予測されたときに、安全かつ目標に最も近い代替移動先を探索します。
//!
//! 現在位置の周囲、最大移動距離の円周上を整数度ごとに標本化し、
//!
//! - **一手安全**: どの敵とも今ターンの移動で衝突しない
//! - **二手安全**: 一手安全であり、さらに移動先から次ターンに安全な移動が一つ以上残る
//!
//! の二段階で候補を評価します。二手安全な最良候補、一手安全な最良候補、現在位置の順に採用します。

use tracing::{debug, trace};

use crate::models::collision::CollisionPredictor;
use crate::models::common::{ANGLES, Point};
use crate::models::creature::Creature;
use crate::models::traits::HostileMotion;
use crate::scenario::EngineConfig;

/// 採用した移動先の安全度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Safety {
    /// 次ターンにも安全な継続手がある
    TwoStep,
    /// 今ターンの移動のみ安全
    SingleStep,
    /// 安全な候補がなく現在位置に留まる
    Stranded,
}

/// 回避探索の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EscapeOutcome {
    pub destination: Point,
    pub safety: Safety,
}

/// 移動検証の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Navigation {
    pub destination: Point,
    /// 元の目標から回避したか
    pub avoided: bool,
    pub safety: Safety,
}

/// 回避経路探索器
pub struct EscapePlanner {
    predictor: CollisionPredictor,
    motion: Box<dyn HostileMotion>,
    /// 探索対象のドローン以外の味方の予想位置
    companions: Vec<Point>,
    map_size: i32,
    step_distance: f64,
    escape_step_deg: usize,
    lookahead_step_deg: usize,
}

impl EscapePlanner {
    pub fn new(config: &EngineConfig, motion: Box<dyn HostileMotion>) -> Self {
        Self {
            predictor: CollisionPredictor::from_config(config),
            motion,
            companions: Vec::new(),
            map_size: config.map_size,
            step_distance: config.drone_speed as f64,
            escape_step_deg: config.escape_step_deg.max(1),
            lookahead_step_deg: config.lookahead_step_deg.max(1),
        }
    }

    /// 敵が追跡先として考慮する他の味方ドローンの予想位置
    pub fn with_companions(mut self, companions: Vec<Point>) -> Self {
        self.companions = companions;
        self
    }

    pub fn predictor(&self) -> &CollisionPredictor {
        &self.predictor
    }

    /// `origin` の周囲、マップ内に収まる候補点
    pub fn candidates(&self, origin: Point, step_deg: usize) -> impl Iterator<Item = Point> {
        let distance = self.step_distance;
        let map_size = self.map_size;
        (0..360usize)
            .step_by(step_deg.max(1))
            .map(move |degree| ANGLES.offset(origin, degree, distance))
            .filter(move |p| p.is_on_map(map_size))
    }

    /// `from` から `to` への直線移動がどの敵とも衝突しないか
    pub fn is_single_step_safe(&self, from: Point, hostiles: &[Creature], to: Point) -> bool {
        hostiles.iter().all(|h| !self.predictor.collides(from, h, to, 0.0))
    }

    /// `candidate` へ移動した後、次ターンにも安全な移動が残るか
    ///
    /// 敵は1ターン進めたうえで、`candidate` を含む味方位置のうち最も近いものへ向かい直す。
    pub fn has_safe_continuation(&self, hostiles: &[Creature], candidate: Point) -> bool {
        let mut targets = Vec::with_capacity(self.companions.len() + 1);
        targets.push(candidate);
        targets.extend(self.companions.iter().copied());

        let predicted: Vec<Creature> = hostiles
            .iter()
            .map(|h| self.motion.predict(h, &targets))
            .collect();

        self.candidates(candidate, self.lookahead_step_deg)
            .any(|next| self.is_single_step_safe(candidate, &predicted, next))
    }

    /// 安全な代替移動先を探索する
    pub fn plan(&self, from: Point, hostiles: &[Creature], goal: Point) -> EscapeOutcome {
        let mut single: Option<(Point, f64)> = None;
        let mut advanced: Option<(Point, f64)> = None;

        for candidate in self.candidates(from, self.escape_step_deg) {
            if !self.is_single_step_safe(from, hostiles, candidate) {
                continue;
            }

            let distance = candidate.distance_to(&goal);
            if single.is_none_or(|(_, best)| distance < best) {
                single = Some((candidate, distance));
            }

            let improves = advanced.is_none_or(|(_, best)| distance < best);
            if improves && self.has_safe_continuation(hostiles, candidate) {
                advanced = Some((candidate, distance));
            }
        }

        let outcome = match (advanced, single) {
            (Some((destination, _)), _) => EscapeOutcome { destination, safety: Safety::TwoStep },
            (None, Some((destination, _))) => {
                EscapeOutcome { destination, safety: Safety::SingleStep }
            }
            (None, None) => EscapeOutcome { destination: from, safety: Safety::Stranded },
        };

        debug!(
            from_x = from.x,
            from_y = from.y,
            goal_x = goal.x,
            goal_y = goal.y,
            escape_x = outcome.destination.x,
            escape_y = outcome.destination.y,
            safety = ?outcome.safety,
            hostiles = hostiles.len(),
            "ESCAPE_SELECTED: 回避先を決定しました"
        );

        outcome
    }

    /// 安全な代替移動先（見つからなければ現在位置）
    pub fn find_safe_path(&self, from: Point, hostiles: &[Creature], goal: Point) -> Point {
        self.plan(from, hostiles, goal).destination
    }

    /// `target` への移動に回避が必要か
    pub fn needs_escape(&self, from: Point, hostiles: &[Creature], target: Point) -> bool {
        !self.is_single_step_safe(from, hostiles, target)
            || !self.has_safe_continuation(hostiles, target)
    }

    /// 目標への移動を検証し、危険なら回避先に置き換える
    pub fn navigate(&self, from: Point, hostiles: &[Creature], target: Point) -> Navigation {
        if hostiles.is_empty() || !self.needs_escape(from, hostiles, target) {
            trace!(x = target.x, y = target.y, "ESCAPE_NOT_NEEDED: 目標への移動は安全です");
            return Navigation { destination: target, avoided: false, safety: Safety::TwoStep };
        }

        let outcome = self.plan(from, hostiles, target);
        Navigation { destination: outcome.destination, avoided: true, safety: outcome.safety }
    }
}
