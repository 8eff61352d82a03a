//! Enemy tanks that drive from the top edge toward the base.

use std::time::Duration;

use glam::Vec2;
use rand::Rng;
use tank_defence_core::{DamageKind, EffectKind, EffectsSink, EnemyId, EnemySnapshot};

use crate::{
    frames,
    status::{StatusEffects, BURN_DAMAGE},
};

const WANDER_FACTOR: f32 = 0.3;
const WANDER_INTERVAL_MS: std::ops::Range<u64> = 1_000..3_000;
const HEAVY_HIT_THRESHOLD: f32 = 3.0;
const HEAVY_HIT_MULTIPLIER: f32 = 2.0;
const HEAVY_HIT_IMPACT_SIZE: f32 = 20.0;
const HEAVY_HIT_KNOCKBACK: f32 = 10.0;

/// Result of a single damage application.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct DamageOutcome {
    /// Health actually removed, after clamping.
    pub(crate) applied: f32,
    /// Whether this application took the enemy from alive to dead.
    pub(crate) lethal: bool,
}

#[derive(Clone, Debug)]
pub(crate) struct Enemy {
    pub(crate) id: EnemyId,
    pub(crate) position: Vec2,
    pub(crate) size: f32,
    base_speed: f32,
    health: f32,
    max_health: f32,
    status: StatusEffects,
    direction: f32,
    wander_elapsed: Duration,
    wander_interval: Duration,
}

impl Enemy {
    pub(crate) fn spawn(
        id: EnemyId,
        position: Vec2,
        speed: f32,
        health: f32,
        size: f32,
        rng: &mut impl Rng,
    ) -> Self {
        let max_health = if health.is_nan() { 0.0 } else { health.max(0.0) };
        let direction = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
        Self {
            id,
            position,
            size,
            base_speed: speed,
            health: max_health,
            max_health,
            status: StatusEffects::default(),
            direction,
            wander_elapsed: Duration::ZERO,
            wander_interval: roll_wander_interval(rng, false),
        }
    }

    /// Advances effects, burn damage and movement by `dt`.
    pub(crate) fn update(&mut self, dt: Duration, field_width: f32, rng: &mut impl Rng) {
        let burn_ticks = self.status.advance(dt);
        for _ in 0..burn_ticks {
            let _ = self.deduct(BURN_DAMAGE);
        }

        let speed = self.effective_speed();
        let steps = frames(dt);
        self.position.y += speed * steps;
        self.position.x += self.direction * speed * WANDER_FACTOR * steps;

        self.wander_elapsed += dt;
        if self.wander_elapsed > self.wander_interval {
            self.direction = -self.direction;
            self.wander_elapsed = Duration::ZERO;
            self.wander_interval = roll_wander_interval(rng, self.status.is_frozen());
        }

        if self.position.x < self.size {
            self.position.x = self.size;
            self.direction = 1.0;
        } else if self.position.x > field_width - self.size {
            self.position.x = field_width - self.size;
            self.direction = -1.0;
        }
    }

    /// Applies incoming damage, clamping health to `0..=max_health`.
    /// Non-finite amounts deal nothing.
    ///
    /// Normal damage of 3 or more is a heavy hit: the amount is doubled, an
    /// impact is requested, and the enemy is knocked back against its heading.
    pub(crate) fn take_damage(
        &mut self,
        amount: f32,
        kind: DamageKind,
        effects: &mut dyn EffectsSink,
    ) -> DamageOutcome {
        let amount = if amount.is_finite() { amount } else { 0.0 };
        let heavy = kind == DamageKind::Normal && amount >= HEAVY_HIT_THRESHOLD;
        if !heavy {
            return self.deduct(amount);
        }

        effects.add_impact_effect(self.position, HEAVY_HIT_IMPACT_SIZE);
        self.position -= self.heading() * HEAVY_HIT_KNOCKBACK;
        self.deduct(amount * HEAVY_HIT_MULTIPLIER)
    }

    pub(crate) fn apply_effect(&mut self, kind: EffectKind) {
        self.status.apply(kind);
    }

    /// Pushes the enemy by `offset` without touching its health.
    pub(crate) fn displace(&mut self, offset: Vec2) {
        self.position += offset;
    }

    pub(crate) fn effective_speed(&self) -> f32 {
        self.base_speed * self.status.speed_factor()
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    pub(crate) fn has_breached(&self, field_height: f32) -> bool {
        self.is_alive() && self.position.y > field_height
    }

    pub(crate) fn snapshot(&self) -> EnemySnapshot {
        let health_ratio = if self.max_health > 0.0 {
            self.health / self.max_health
        } else {
            0.0
        };
        EnemySnapshot {
            id: self.id,
            position: self.position,
            health_ratio,
            size: self.size,
            frozen: self.status.is_frozen(),
            burning: self.status.is_burning(),
        }
    }

    fn heading(&self) -> Vec2 {
        Vec2::new(self.direction * WANDER_FACTOR, 1.0).normalize()
    }

    fn deduct(&mut self, amount: f32) -> DamageOutcome {
        let was_alive = self.is_alive();
        let next = (self.health - amount).clamp(0.0, self.max_health);
        let applied = self.health - next;
        self.health = next;
        DamageOutcome {
            applied,
            lethal: was_alive && !self.is_alive(),
        }
    }

    #[cfg(test)]
    pub(crate) fn health(&self) -> f32 {
        self.health
    }
}

fn roll_wander_interval(rng: &mut impl Rng, frozen: bool) -> Duration {
    let millis = rng.gen_range(WANDER_INTERVAL_MS);
    if frozen {
        Duration::from_millis(millis * 3 / 2)
    } else {
        Duration::from_millis(millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use tank_defence_core::{NullEffects, VisualEffect};

    fn enemy(health: f32) -> (Enemy, ChaCha8Rng) {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let enemy = Enemy::spawn(
            EnemyId::new(1),
            Vec2::new(400.0, 100.0),
            1.0,
            health,
            20.0,
            &mut rng,
        );
        (enemy, rng)
    }

    #[test]
    fn health_stays_within_bounds_for_any_input() {
        for amount in [
            -50.0,
            0.0,
            0.5,
            2.0,
            1e9,
            f32::INFINITY,
            f32::NEG_INFINITY,
            f32::NAN,
            f32::MAX,
        ] {
            let (mut enemy, _) = enemy(5.0);
            for kind in [DamageKind::Normal, DamageKind::Burn, DamageKind::Splash] {
                let _ = enemy.take_damage(amount, kind, &mut NullEffects);
                assert!(
                    (0.0..=5.0).contains(&enemy.health()),
                    "health {} out of bounds after {amount}",
                    enemy.health()
                );
            }
        }
    }

    #[test]
    fn heavy_normal_hits_are_doubled_and_knock_back() {
        let (mut enemy, _) = enemy(10.0);
        let before = enemy.position;
        let mut effects: Vec<VisualEffect> = Vec::new();

        let outcome = enemy.take_damage(3.0, DamageKind::Normal, &mut effects);

        assert!((outcome.applied - 6.0).abs() < 1e-5);
        assert!(!outcome.lethal);
        assert_eq!(effects.len(), 1);
        assert!(enemy.position.y < before.y, "knockback pushes upward");
        assert!((enemy.position.distance(before) - HEAVY_HIT_KNOCKBACK).abs() < 1e-4);
    }

    #[test]
    fn splash_and_light_hits_are_not_doubled() {
        let (mut enemy, _) = enemy(10.0);
        let mut effects: Vec<VisualEffect> = Vec::new();
        let splash = enemy.take_damage(3.0, DamageKind::Splash, &mut effects);
        let light = enemy.take_damage(2.9, DamageKind::Normal, &mut effects);
        assert!((splash.applied - 3.0).abs() < 1e-5);
        assert!((light.applied - 2.9).abs() < 1e-5);
        assert!(effects.is_empty());
    }

    #[test]
    fn non_finite_damage_is_ignored() {
        let (mut enemy, _) = enemy(5.0);
        for amount in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            let outcome = enemy.take_damage(amount, DamageKind::Normal, &mut NullEffects);
            assert_eq!(outcome.applied, 0.0);
        }
        assert!((enemy.health() - 5.0).abs() < f32::EPSILON);
    }

    #[test]
    fn lethal_is_reported_once() {
        let (mut enemy, _) = enemy(1.0);
        let first = enemy.take_damage(2.0, DamageKind::Normal, &mut NullEffects);
        let second = enemy.take_damage(2.0, DamageKind::Normal, &mut NullEffects);
        assert!(first.lethal);
        assert!((first.applied - 1.0).abs() < 1e-6);
        assert!(!second.lethal);
        assert_eq!(second.applied, 0.0);
    }

    #[test]
    fn frozen_halves_speed_for_refreshed_duration() {
        let (mut enemy, mut rng) = enemy(10.0);
        enemy.apply_effect(EffectKind::Frozen);
        assert!((enemy.effective_speed() - 0.5).abs() < f32::EPSILON);

        enemy.update(Duration::from_millis(2_000), 800.0, &mut rng);
        enemy.apply_effect(EffectKind::Frozen);
        enemy.update(Duration::from_millis(2_999), 800.0, &mut rng);
        assert!((enemy.effective_speed() - 0.5).abs() < f32::EPSILON);

        enemy.update(Duration::from_millis(1), 800.0, &mut rng);
        assert!((enemy.effective_speed() - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn movement_is_normalised_to_sixtieths_of_a_second() {
        let (mut enemy, mut rng) = enemy(10.0);
        let start = enemy.position.y;
        enemy.update(Duration::from_millis(500), 800.0, &mut rng);
        assert!((enemy.position.y - start - 30.0).abs() < 1e-3);
    }

    #[test]
    fn lateral_clamp_reflects_direction() {
        let (mut enemy, mut rng) = enemy(10.0);
        enemy.position.x = 5.0;
        enemy.direction = -1.0;
        enemy.update(Duration::from_millis(16), 800.0, &mut rng);
        assert!((enemy.position.x - enemy.size).abs() < f32::EPSILON);
        assert!((enemy.direction - 1.0).abs() < f32::EPSILON);

        enemy.position.x = 799.0;
        enemy.update(Duration::from_millis(16), 800.0, &mut rng);
        assert!((enemy.position.x - (800.0 - enemy.size)).abs() < f32::EPSILON);
        assert!((enemy.direction + 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn burning_deals_periodic_damage() {
        let (mut enemy, mut rng) = enemy(10.0);
        enemy.apply_effect(EffectKind::Burning);
        for _ in 0..20 {
            enemy.update(Duration::from_millis(100), 800.0, &mut rng);
        }
        assert!((enemy.health() - (10.0 - 4.0 * BURN_DAMAGE)).abs() < 1e-4);
    }

    #[test]
    fn breach_requires_living_enemy() {
        let (mut enemy, _) = enemy(1.0);
        enemy.position.y = 601.0;
        assert!(enemy.has_breached(600.0));
        let _ = enemy.take_damage(1.0, DamageKind::Splash, &mut NullEffects);
        assert!(!enemy.has_breached(600.0));
    }
}
