#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Tank Defence.
//!
//! The world owns every enemy, tower and projectile together with the cash,
//! lives and unlock state. It only changes through [`apply`], and each tick
//! runs the same fixed pass: enemies move and are pruned, towers acquire
//! targets and fire, projectiles move and resolve hits, and enemies destroyed
//! during the pass are removed at its end.

mod economy;
mod enemy;
mod projectile;
mod status;
mod towers;

use std::time::Duration;

use glam::Vec2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tank_defence_core::{
    Command, EffectsSink, EnemyId, Event, ProjectileId, Rejection, SessionConfig, TowerId,
    TowerKind,
};

use crate::{
    economy::Economy,
    enemy::Enemy,
    projectile::Projectile,
    towers::{TowerRegistry, TOWER_SIZE},
};

const SIXTIETHS_PER_SECOND: f32 = 60.0;
const TOWER_CLEARANCE: f32 = 40.0;
const SPAWN_MARGIN: f32 = 50.0;
const BASE_MARGIN: f32 = 50.0;
const SELECTION_SLACK: f32 = 10.0;
const UPGRADE_SHAKE: f32 = 3.0;
const UPGRADE_SHAKE_DURATION: Duration = Duration::from_millis(300);
const UNLOCK_SHAKE: f32 = 10.0;
const UNLOCK_SHAKE_DURATION: Duration = Duration::from_millis(500);

/// Converts elapsed time into sixtieths of a second, the unit all speeds use.
pub(crate) fn frames(dt: Duration) -> f32 {
    dt.as_secs_f32() * SIXTIETHS_PER_SECOND
}

/// Represents the authoritative Tank Defence world state.
#[derive(Debug)]
pub struct World {
    config: SessionConfig,
    wander_seed: u64,
    rng: ChaCha8Rng,
    economy: Economy,
    enemies: Vec<Enemy>,
    towers: TowerRegistry,
    projectiles: Vec<Projectile>,
    next_enemy_id: u32,
    next_projectile_id: u32,
    tick_index: u64,
}

impl World {
    /// Creates a world for the provided session settings.
    ///
    /// `wander_seed` drives the lateral wandering of every enemy.
    #[must_use]
    pub fn new(config: SessionConfig, wander_seed: u64) -> Self {
        Self {
            economy: Economy::new(&config),
            rng: ChaCha8Rng::seed_from_u64(wander_seed),
            config,
            wander_seed,
            enemies: Vec::new(),
            towers: TowerRegistry::new(),
            projectiles: Vec::new(),
            next_enemy_id: 0,
            next_projectile_id: 0,
            tick_index: 0,
        }
    }

    fn reset(&mut self) {
        *self = Self::new(self.config.clone(), self.wander_seed);
    }

    fn validate_position(&self, position: Vec2) -> Result<(), Rejection> {
        let inside = position.is_finite()
            && (0.0..=self.config.width).contains(&position.x)
            && position.y >= SPAWN_MARGIN
            && position.y <= self.config.height - BASE_MARGIN;
        let crowded = self
            .towers
            .iter()
            .any(|tower| tower.position.distance(position) < TOWER_CLEARANCE);
        if !inside || crowded {
            return Err(Rejection::InvalidPosition);
        }
        Ok(())
    }

    fn place_tower(&mut self, kind: TowerKind, position: Vec2) -> Result<Event, Rejection> {
        if !self.economy.is_unlocked(kind) {
            return Err(Rejection::LockedType { kind });
        }
        let spec = *self.config.catalog.spec(kind);
        self.economy.ensure_affordable(spec.cost)?;
        self.validate_position(position)?;
        self.economy.debit(spec.cost)?;

        let tower = self.towers.insert(kind, position, spec);
        Ok(Event::TowerPlaced {
            tower,
            kind,
            position,
            cost: spec.cost,
        })
    }

    fn sell_tower(&mut self, tower: TowerId) -> Result<Event, Rejection> {
        let removed = self
            .towers
            .remove(tower)
            .ok_or(Rejection::UnknownTower { tower })?;
        let refund = removed.sell_value();
        self.economy.credit(refund);
        Ok(Event::TowerSold { tower, refund })
    }

    fn upgrade_tower(
        &mut self,
        id: TowerId,
        effects: &mut dyn EffectsSink,
    ) -> Result<Event, Rejection> {
        let tower = self
            .towers
            .get_mut(id)
            .ok_or(Rejection::UnknownTower { tower: id })?;
        let cost = tower.upgrade_cost().ok_or(Rejection::MaxLevel)?;
        self.economy.debit(cost)?;
        tower.record_upgrade_payment(cost);
        let upgraded = tower.upgrade();
        debug_assert!(upgraded, "an upgrade cost implies a free level");

        effects.add_screen_shake(UPGRADE_SHAKE, UPGRADE_SHAKE_DURATION);
        Ok(Event::TowerUpgraded {
            tower: id,
            level: tower.level(),
            cost,
        })
    }

    fn spawn_enemy(&mut self, position: Vec2, speed: f32, health: f32, size: f32) -> Event {
        let id = EnemyId::new(self.next_enemy_id);
        self.next_enemy_id = self.next_enemy_id.wrapping_add(1);
        self.enemies
            .push(Enemy::spawn(id, position, speed, health, size, &mut self.rng));
        Event::EnemySpawned {
            enemy: id,
            position,
        }
    }

    /// Moves every enemy, then removes the ones that breached or died.
    ///
    /// A breach is only possible while alive, so an enemy never both costs a
    /// life and pays a bounty.
    fn update_enemies(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let width = self.config.width;
        let height = self.config.height;
        let reward = self.config.kill_reward;
        let rng = &mut self.rng;
        let economy = &mut self.economy;

        self.enemies.retain_mut(|enemy| {
            if enemy.is_alive() {
                enemy.update(dt, width, rng);
            }

            if enemy.has_breached(height) {
                let had_lives = economy.lives() > 0;
                let lives_remaining = economy.lose_life();
                out_events.push(Event::EnemyBreached {
                    enemy: enemy.id,
                    lives_remaining,
                });
                if had_lives && lives_remaining == 0 {
                    out_events.push(Event::GameOver);
                }
                return false;
            }

            if !enemy.is_alive() {
                economy.credit(reward);
                out_events.push(Event::EnemyKilled {
                    enemy: enemy.id,
                    reward,
                });
                return false;
            }
            true
        });
    }

    fn update_towers(
        &mut self,
        dt: Duration,
        out_events: &mut Vec<Event>,
        effects: &mut dyn EffectsSink,
    ) {
        for tower in self.towers.iter_mut() {
            tower.update(dt, &self.enemies);
            if !tower.can_fire() {
                continue;
            }

            let Some(target) = tower
                .target()
                .and_then(|id| self.enemies.iter().find(|enemy| enemy.id == id))
            else {
                continue;
            };

            let id = ProjectileId::new(self.next_projectile_id);
            if let Some(projectile) = tower.fire(id, target.position, effects) {
                self.next_projectile_id = self.next_projectile_id.wrapping_add(1);
                out_events.push(Event::ProjectileFired {
                    projectile: id,
                    tower: tower.id,
                    kind: projectile.kind,
                });
                self.projectiles.push(projectile);
            }
        }
    }

    /// Moves projectiles and resolves at most one direct hit per projectile.
    ///
    /// Enemies are tested in spawn order and the first overlap wins.
    fn update_projectiles(
        &mut self,
        dt: Duration,
        out_events: &mut Vec<Event>,
        effects: &mut dyn EffectsSink,
    ) {
        let width = self.config.width;
        let height = self.config.height;
        let enemies = &mut self.enemies;
        let towers = &mut self.towers;

        self.projectiles.retain_mut(|projectile| {
            if projectile.is_exploded() {
                return projectile.advance(dt);
            }

            let _ = projectile.advance(dt);
            let Some(index) = enemies
                .iter()
                .position(|enemy| projectile.check_hit(enemy))
            else {
                return !projectile.out_of_bounds(width, height);
            };

            let impacts = projectile.strike(enemies.as_mut_slice(), index, effects);
            for impact in &impacts {
                out_events.push(Event::ProjectileHit {
                    projectile: projectile.id,
                    enemy: impact.enemy,
                    applied: impact.outcome.applied,
                    lethal: impact.outcome.lethal,
                });
                if impact.outcome.lethal {
                    if let Some(tower) = towers.get_mut(projectile.source) {
                        tower.kill_count = tower.kill_count.saturating_add(1);
                    }
                }
            }

            if projectile.is_exploded() {
                out_events.push(Event::BombExploded {
                    projectile: projectile.id,
                    position: projectile.position,
                    affected: impacts.len().saturating_sub(1) as u32,
                });
            }
            projectile.is_exploded()
        });
    }

    fn prune_dead(&mut self, out_events: &mut Vec<Event>) {
        let reward = self.config.kill_reward;
        let economy = &mut self.economy;
        self.enemies.retain(|enemy| {
            if enemy.is_alive() {
                return true;
            }
            economy.credit(reward);
            out_events.push(Event::EnemyKilled {
                enemy: enemy.id,
                reward,
            });
            false
        });
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Commands that cannot be honoured leave the world untouched and are
/// reported as [`Event::CommandRejected`]. Presentation effects are requested
/// through `effects`.
pub fn apply(
    world: &mut World,
    command: Command,
    out_events: &mut Vec<Event>,
    effects: &mut dyn EffectsSink,
) {
    let outcome = match command {
        Command::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            out_events.push(Event::TimeAdvanced { dt });
            world.update_enemies(dt, out_events);
            world.update_towers(dt, out_events, effects);
            world.update_projectiles(dt, out_events, effects);
            world.prune_dead(out_events);
            return;
        }
        Command::SpawnEnemy {
            position,
            speed,
            health,
            size,
        } => Ok(world.spawn_enemy(position, speed, health, size)),
        Command::PlaceTower { kind, position } => world.place_tower(kind, position),
        Command::SellTower { tower } => world.sell_tower(tower),
        Command::UpgradeTower { tower } => world.upgrade_tower(tower, effects),
        Command::CompleteWave {
            wave,
            reward,
            final_wave,
        } => {
            world.economy.credit(reward);
            for kind in world.economy.unlock_for_wave(wave, &world.config.catalog) {
                effects.add_screen_shake(UNLOCK_SHAKE, UNLOCK_SHAKE_DURATION);
                out_events.push(Event::TowerUnlocked { kind });
            }
            out_events.push(Event::WaveCompleted { wave, reward });
            if final_wave {
                out_events.push(Event::Victory);
            }
            return;
        }
        Command::ResetWorld => {
            world.reset();
            Ok(Event::WorldReset)
        }
    };

    out_events.push(match outcome {
        Ok(event) => event,
        Err(reason) => Event::CommandRejected { reason },
    });
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use glam::Vec2;
    use tank_defence_core::{
        EnemySnapshot, ProjectileSnapshot, SessionConfig, TowerId, TowerKind, TowerSnapshot,
    };

    use super::{World, SELECTION_SLACK, TOWER_SIZE};

    /// Settings the world was created with.
    #[must_use]
    pub fn config(world: &World) -> &SessionConfig {
        &world.config
    }

    /// Cash currently available.
    #[must_use]
    pub fn cash(world: &World) -> u32 {
        world.economy.cash()
    }

    /// Lives currently remaining.
    #[must_use]
    pub fn lives(world: &World) -> u32 {
        world.economy.lives()
    }

    /// Number of ticks processed since construction or the last reset.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Whether a tower kind may currently be placed.
    #[must_use]
    pub fn is_unlocked(world: &World, kind: TowerKind) -> bool {
        world.economy.is_unlocked(kind)
    }

    /// Tower kinds that may currently be placed, in catalog order.
    #[must_use]
    pub fn unlocked_kinds(world: &World) -> Vec<TowerKind> {
        world.economy.unlocked().collect()
    }

    /// Number of enemies still on the field.
    #[must_use]
    pub fn enemy_count(world: &World) -> usize {
        world.enemies.len()
    }

    /// Snapshots of every enemy in spawn order.
    #[must_use]
    pub fn enemy_view(world: &World) -> Vec<EnemySnapshot> {
        world.enemies.iter().map(|enemy| enemy.snapshot()).collect()
    }

    /// Snapshots of every tower in placement order.
    #[must_use]
    pub fn tower_view(world: &World) -> Vec<TowerSnapshot> {
        world.towers.iter().map(|tower| tower.snapshot()).collect()
    }

    /// Snapshots of every projectile in launch order.
    #[must_use]
    pub fn projectile_view(world: &World) -> Vec<ProjectileSnapshot> {
        world
            .projectiles
            .iter()
            .map(|projectile| projectile.snapshot())
            .collect()
    }

    /// Snapshot of a single tower.
    #[must_use]
    pub fn tower(world: &World, tower: TowerId) -> Option<TowerSnapshot> {
        world.towers.get(tower).map(|tower| tower.snapshot())
    }

    /// First tower, in placement order, whose selection radius covers `position`.
    #[must_use]
    pub fn tower_at(world: &World, position: Vec2) -> Option<TowerId> {
        world
            .towers
            .iter()
            .find(|tower| tower.position.distance(position) <= TOWER_SIZE + SELECTION_SLACK)
            .map(|tower| tower.id)
    }

    /// Whether a tower could be placed at `position`, ignoring cash and unlocks.
    #[must_use]
    pub fn is_valid_position(world: &World, position: Vec2) -> bool {
        world.validate_position(position).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tank_defence_core::NullEffects;

    #[test]
    fn frames_count_sixtieths_of_a_second() {
        assert!((frames(Duration::from_millis(500)) - 30.0).abs() < 1e-5);
        assert_eq!(frames(Duration::ZERO), 0.0);
    }

    #[test]
    fn reset_restores_initial_state() {
        let mut world = World::new(SessionConfig::default(), 3);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::PlaceTower {
                kind: TowerKind::Basic,
                position: Vec2::new(400.0, 300.0),
            },
            &mut events,
            &mut NullEffects,
        );
        assert_eq!(query::cash(&world), 90);

        apply(&mut world, Command::ResetWorld, &mut events, &mut NullEffects);
        assert_eq!(query::cash(&world), 100);
        assert!(query::tower_view(&world).is_empty());
        assert_eq!(events.last(), Some(&Event::WorldReset));
    }
}
