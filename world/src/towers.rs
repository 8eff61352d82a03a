//! Authoritative tower state management utilities.

use std::{collections::BTreeMap, f32::consts::PI, time::Duration};

use glam::Vec2;
use tank_defence_core::{
    EffectsSink, EnemyId, ProjectileId, TowerId, TowerKind, TowerSnapshot, TowerSpec,
    MAX_UPGRADE_LEVEL,
};

use crate::{enemy::Enemy, frames, projectile::Projectile};

/// Radius of a tower's footprint.
pub(crate) const TOWER_SIZE: f32 = 15.0;

const DAMAGE_CURVE: [f32; 4] = [1.0, 1.3, 1.7, 2.2];
const RANGE_CURVE: [f32; 4] = [1.0, 1.15, 1.3, 1.5];
const FIRE_RATE_CURVE: [f64; 4] = [1.0, 0.9, 0.8, 0.7];
const UPGRADE_COST_MULTIPLIER: [u32; 3] = [1, 2, 3];
const BASIC_FIRST_UPGRADE_RANGE: f32 = 115.0;
const ROTATION_EASING: f32 = 0.1;

/// A placed tower together with its upgrade and cooldown state.
#[derive(Clone, Debug)]
pub(crate) struct Tower {
    pub(crate) id: TowerId,
    pub(crate) kind: TowerKind,
    pub(crate) position: Vec2,
    pub(crate) kill_count: u32,
    base: TowerSpec,
    level: u8,
    damage: f32,
    range: f32,
    fire_rate: Duration,
    since_last_fire: Duration,
    target: Option<EnemyId>,
    rotation: f32,
    upgrade_spent: u32,
}

impl Tower {
    pub(crate) fn new(id: TowerId, kind: TowerKind, position: Vec2, base: TowerSpec) -> Self {
        let mut tower = Self {
            id,
            kind,
            position,
            kill_count: 0,
            base,
            level: 0,
            damage: 0.0,
            range: 0.0,
            fire_rate: Duration::ZERO,
            since_last_fire: Duration::ZERO,
            target: None,
            rotation: 0.0,
            upgrade_spent: 0,
        };
        tower.recompute_stats();
        tower
    }

    /// Advances the cooldown, reacquires a target and turns the turret.
    pub(crate) fn update(&mut self, dt: Duration, enemies: &[Enemy]) {
        self.since_last_fire = self.since_last_fire.saturating_add(dt);
        let target = self.find_target(enemies);
        self.target = target.map(|enemy| enemy.id);

        if let Some(enemy) = target {
            let offset = enemy.position - self.position;
            let desired = offset.y.atan2(offset.x);
            let easing = (ROTATION_EASING * frames(dt)).min(1.0);
            self.rotation += normalize_angle(desired - self.rotation) * easing;
        }
    }

    pub(crate) fn can_fire(&self) -> bool {
        self.since_last_fire >= self.fire_rate
    }

    /// Nearest living enemy within range.
    ///
    /// Only a strictly shorter distance replaces the current best, so equal
    /// distances resolve to the enemy that appears first in `enemies`.
    pub(crate) fn find_target<'a>(&self, enemies: &'a [Enemy]) -> Option<&'a Enemy> {
        let mut best: Option<(&Enemy, f32)> = None;
        for enemy in enemies.iter().filter(|enemy| enemy.is_alive()) {
            let distance = self.position.distance(enemy.position);
            if distance > self.range {
                continue;
            }
            if best.map_or(true, |(_, nearest)| distance < nearest) {
                best = Some((enemy, distance));
            }
        }
        best.map(|(enemy, _)| enemy)
    }

    pub(crate) fn target(&self) -> Option<EnemyId> {
        self.target
    }

    /// Resets the cooldown and launches a projectile at `target`.
    ///
    /// Returns `None` when the target sits exactly on the tower, in which
    /// case no direction exists. The cooldown is still consumed.
    pub(crate) fn fire(
        &mut self,
        id: ProjectileId,
        target: Vec2,
        effects: &mut dyn EffectsSink,
    ) -> Option<Projectile> {
        self.since_last_fire = Duration::ZERO;
        let direction = (target - self.position).try_normalize()?;

        match self.kind {
            TowerKind::Heavy => effects.add_screen_shake(5.0, Duration::from_millis(100)),
            TowerKind::Bomber => effects.add_screen_shake(3.0, Duration::from_millis(80)),
            _ => {}
        }

        let muzzle = self.position + direction * barrel_length(self.kind);
        Some(Projectile::launch(
            id,
            self.id,
            self.kind,
            muzzle,
            direction,
            self.damage,
        ))
    }

    /// Raises the level by one; false when already at the top level.
    pub(crate) fn upgrade(&mut self) -> bool {
        if self.level >= MAX_UPGRADE_LEVEL {
            return false;
        }
        self.level += 1;
        self.recompute_stats();
        true
    }

    pub(crate) fn upgrade_cost(&self) -> Option<u32> {
        UPGRADE_COST_MULTIPLIER
            .get(usize::from(self.level))
            .map(|multiplier| self.base.upgrade_base.saturating_mul(*multiplier))
    }

    pub(crate) fn record_upgrade_payment(&mut self, cost: u32) {
        self.upgrade_spent = self.upgrade_spent.saturating_add(cost);
    }

    /// Three quarters of the purchase price plus half of every upgrade paid.
    pub(crate) fn sell_value(&self) -> u32 {
        let cost = self.base.cost;
        (cost / 4 * 3 + cost % 4 * 3 / 4).saturating_add(self.upgrade_spent / 2)
    }

    pub(crate) fn level(&self) -> u8 {
        self.level
    }

    pub(crate) fn snapshot(&self) -> TowerSnapshot {
        TowerSnapshot {
            id: self.id,
            kind: self.kind,
            position: self.position,
            rotation: self.rotation,
            target: self.target,
            level: self.level,
            damage: self.damage,
            range: self.range,
            fire_rate: self.fire_rate,
            kill_count: self.kill_count,
            upgrade_cost: self.upgrade_cost(),
            sell_value: self.sell_value(),
        }
    }

    fn recompute_stats(&mut self) {
        let index = usize::from(self.level);
        self.damage = self.base.damage * DAMAGE_CURVE[index];
        self.range = if self.kind == TowerKind::Basic && self.level == 1 {
            BASIC_FIRST_UPGRADE_RANGE
        } else {
            self.base.range * RANGE_CURVE[index]
        };
        let micros = self.base.fire_rate().as_micros() as f64 * FIRE_RATE_CURVE[index];
        self.fire_rate = Duration::from_micros(micros.round() as u64);
    }
}

/// Registry that stores towers and manages identifier allocation.
///
/// Identifiers grow monotonically, so key order equals placement order.
#[derive(Debug)]
pub(crate) struct TowerRegistry {
    entries: BTreeMap<TowerId, Tower>,
    next_tower_id: TowerId,
}

impl TowerRegistry {
    /// Creates an empty tower registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_tower_id: TowerId::new(0),
        }
    }

    pub(crate) fn insert(&mut self, kind: TowerKind, position: Vec2, spec: TowerSpec) -> TowerId {
        let id = self.next_tower_id;
        self.next_tower_id = TowerId::new(id.get().saturating_add(1));
        let _ = self.entries.insert(id, Tower::new(id, kind, position, spec));
        id
    }

    pub(crate) fn remove(&mut self, id: TowerId) -> Option<Tower> {
        self.entries.remove(&id)
    }

    pub(crate) fn get(&self, id: TowerId) -> Option<&Tower> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: TowerId) -> Option<&mut Tower> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Tower> {
        self.entries.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Tower> {
        self.entries.values_mut()
    }
}

/// Distance from the tower centre to the muzzle.
fn barrel_length(kind: TowerKind) -> f32 {
    match kind {
        TowerKind::Heavy => 25.0,
        TowerKind::Ice => 22.0,
        TowerKind::Flamer => 18.0,
        TowerKind::Basic | TowerKind::Rapid | TowerKind::Bomber => 20.0,
    }
}

fn normalize_angle(mut angle: f32) -> f32 {
    while angle > PI {
        angle -= PI * 2.0;
    }
    while angle < -PI {
        angle += PI * 2.0;
    }
    angle
}
