//! Projectiles travelling from towers toward enemies.

use std::time::Duration;

use glam::Vec2;
use tank_defence_core::{
    DamageKind, EffectKind, EffectsSink, EnemyId, ProjectileId, ProjectileKind,
    ProjectileSnapshot, TowerId, TowerKind,
};

use crate::{
    enemy::{DamageOutcome, Enemy},
    frames,
};

/// How long a detonated bomb lingers before it is removed.
pub(crate) const EXPLOSION_DURATION: Duration = Duration::from_millis(500);

const SPLASH_RADIUS: f32 = 60.0;
const SPLASH_KNOCKBACK: f32 = 15.0;
const EXPLOSION_IMPACT_SIZE: f32 = 30.0;
const EXPLOSION_SHAKE: f32 = 15.0;
const EXPLOSION_SHAKE_DURATION: Duration = Duration::from_millis(300);

/// Damage dealt to one enemy while resolving a hit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Impact {
    pub(crate) enemy: EnemyId,
    pub(crate) outcome: DamageOutcome,
}

#[derive(Clone, Debug)]
pub(crate) struct Projectile {
    pub(crate) id: ProjectileId,
    pub(crate) source: TowerId,
    pub(crate) kind: ProjectileKind,
    pub(crate) position: Vec2,
    heavy: bool,
    direction: Vec2,
    speed: f32,
    damage: f32,
    radius: f32,
    hit_factor: f32,
    explosion: Option<Duration>,
}

impl Projectile {
    pub(crate) fn launch(
        id: ProjectileId,
        source: TowerId,
        tower: TowerKind,
        position: Vec2,
        direction: Vec2,
        damage: f32,
    ) -> Self {
        let kind = tower.projectile_kind();
        let heavy = tower.fires_heavy_shells();
        let (speed, radius, hit_factor) = match kind {
            ProjectileKind::Normal if heavy => (4.0, 10.0, 1.2),
            ProjectileKind::Normal => (5.0, 5.0, 1.0),
            ProjectileKind::Ice => (4.5, 6.0, 1.1),
            ProjectileKind::Flame => (5.5, 4.0, 0.9),
            ProjectileKind::Bomb => (3.5, 8.0, 1.1),
        };
        Self {
            id,
            source,
            kind,
            position,
            heavy,
            direction,
            speed,
            damage,
            radius,
            hit_factor,
            explosion: None,
        }
    }

    /// Moves the projectile, or counts down a finished explosion.
    ///
    /// Returns false once an explosion has run its course.
    pub(crate) fn advance(&mut self, dt: Duration) -> bool {
        match self.explosion {
            Some(remaining) => {
                let left = remaining.saturating_sub(dt);
                self.explosion = Some(left);
                !left.is_zero()
            }
            None => {
                self.position += self.direction * self.speed * frames(dt);
                true
            }
        }
    }

    pub(crate) fn is_exploded(&self) -> bool {
        self.explosion.is_some()
    }

    pub(crate) fn hit_radius(&self) -> f32 {
        self.radius * self.hit_factor
    }

    pub(crate) fn check_hit(&self, enemy: &Enemy) -> bool {
        enemy.is_alive() && self.position.distance(enemy.position) < self.hit_radius() + enemy.size
    }

    pub(crate) fn out_of_bounds(&self, width: f32, height: f32) -> bool {
        self.position.x < 0.0
            || self.position.x > width
            || self.position.y < 0.0
            || self.position.y > height
    }

    /// Resolves a hit on `enemies[index]`.
    ///
    /// Ice and flame shots attach their effect directly. Bombs deal their
    /// direct damage first and then detonate.
    pub(crate) fn strike(
        &mut self,
        enemies: &mut [Enemy],
        index: usize,
        effects: &mut dyn EffectsSink,
    ) -> Vec<Impact> {
        let mut impacts = Vec::new();
        let Some(enemy) = enemies.get_mut(index) else {
            return impacts;
        };

        match self.kind {
            ProjectileKind::Ice => enemy.apply_effect(EffectKind::Frozen),
            ProjectileKind::Flame => enemy.apply_effect(EffectKind::Burning),
            ProjectileKind::Normal | ProjectileKind::Bomb => {}
        }
        let outcome = enemy.take_damage(self.damage, DamageKind::Normal, effects);
        impacts.push(Impact {
            enemy: enemy.id,
            outcome,
        });

        if self.kind == ProjectileKind::Bomb {
            impacts.extend(self.explode(enemies, effects));
        }
        impacts
    }

    /// Splashes every living enemy near the bomb. Fires at most once.
    fn explode(&mut self, enemies: &mut [Enemy], effects: &mut dyn EffectsSink) -> Vec<Impact> {
        if self.is_exploded() {
            return Vec::new();
        }
        self.explosion = Some(EXPLOSION_DURATION);
        effects.add_screen_shake(EXPLOSION_SHAKE, EXPLOSION_SHAKE_DURATION);
        effects.add_impact_effect(self.position, EXPLOSION_IMPACT_SIZE);

        let mut impacts = Vec::new();
        for enemy in enemies.iter_mut().filter(|enemy| enemy.is_alive()) {
            let offset = enemy.position - self.position;
            let distance = offset.length();
            if distance >= SPLASH_RADIUS + enemy.size {
                continue;
            }

            let falloff = 1.0 - (distance / SPLASH_RADIUS).min(1.0);
            let outcome = enemy.take_damage(1.0 + falloff, DamageKind::Splash, effects);
            if let Some(away) = offset.try_normalize() {
                enemy.displace(away * falloff * SPLASH_KNOCKBACK);
            }
            impacts.push(Impact {
                enemy: enemy.id,
                outcome,
            });
        }
        impacts
    }

    pub(crate) fn snapshot(&self) -> ProjectileSnapshot {
        ProjectileSnapshot {
            id: self.id,
            position: self.position,
            kind: self.kind,
            heavy: self.heavy,
            exploded: self.is_exploded(),
        }
    }
}
