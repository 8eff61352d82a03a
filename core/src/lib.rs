#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Tank Defence engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. The session submits [`Command`]
//! values describing desired mutations, the world executes those commands via
//! its `apply` entry point, and then broadcasts [`Event`] values for systems
//! to react to deterministically. Systems consume event streams, query
//! immutable snapshots, and respond exclusively with new command batches.
//!
//! Presentation concerns never reach into the simulation. Anything a renderer
//! wants to animate beyond the snapshots is requested through an injected
//! [`EffectsSink`].

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Tank Defence.";

/// Default playfield width measured in world units.
pub const DEFAULT_PLAYFIELD_WIDTH: f32 = 800.0;

/// Default playfield height measured in world units.
pub const DEFAULT_PLAYFIELD_HEIGHT: f32 = 600.0;

/// Highest upgrade level a tower can reach.
pub const MAX_UPGRADE_LEVEL: u8 = 3;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests that a new enemy enters the playfield.
    SpawnEnemy {
        /// Position the enemy appears at.
        position: Vec2,
        /// Base movement speed in world units per sixtieth of a second.
        speed: f32,
        /// Starting and maximum health.
        health: f32,
        /// Collision radius of the enemy.
        size: f32,
    },
    /// Requests placement of a tower centred on the provided position.
    PlaceTower {
        /// Type of tower to construct.
        kind: TowerKind,
        /// Centre of the tower footprint.
        position: Vec2,
    },
    /// Requests that an existing tower is sold for a refund.
    SellTower {
        /// Identifier of the tower to sell.
        tower: TowerId,
    },
    /// Requests that an existing tower is upgraded by one level.
    UpgradeTower {
        /// Identifier of the tower to upgrade.
        tower: TowerId,
    },
    /// Settles a finished wave: pays the reward and opens unlock gates.
    CompleteWave {
        /// Number of the wave that finished.
        wave: u32,
        /// Cash awarded for finishing the wave.
        reward: u32,
        /// Whether the finished wave was the last one of the campaign.
        final_wave: bool,
    },
    /// Restores the world to its freshly constructed state.
    ResetWorld,
}

/// Events broadcast by the world and systems after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that an enemy entered the playfield.
    EnemySpawned {
        /// Identifier assigned to the enemy.
        enemy: EnemyId,
        /// Position the enemy appeared at.
        position: Vec2,
    },
    /// Reports that an enemy crossed the bottom edge and damaged the base.
    EnemyBreached {
        /// Identifier of the enemy that escaped.
        enemy: EnemyId,
        /// Lives left after the breach.
        lives_remaining: u32,
    },
    /// Reports that an enemy was destroyed and removed.
    EnemyKilled {
        /// Identifier of the destroyed enemy.
        enemy: EnemyId,
        /// Cash granted for the kill.
        reward: u32,
    },
    /// Confirms that a tower was placed into the world.
    TowerPlaced {
        /// Identifier assigned to the tower by the world.
        tower: TowerId,
        /// Type of tower that was placed.
        kind: TowerKind,
        /// Centre of the tower.
        position: Vec2,
        /// Cash debited for the tower.
        cost: u32,
    },
    /// Confirms that a tower was sold and removed.
    TowerSold {
        /// Identifier of the tower that was sold.
        tower: TowerId,
        /// Cash refunded for the tower.
        refund: u32,
    },
    /// Confirms that a tower gained an upgrade level.
    TowerUpgraded {
        /// Identifier of the upgraded tower.
        tower: TowerId,
        /// Level reached after the upgrade.
        level: u8,
        /// Cash debited for the upgrade.
        cost: u32,
    },
    /// Reports that a tower launched a projectile.
    ProjectileFired {
        /// Identifier of the new projectile.
        projectile: ProjectileId,
        /// Tower that fired.
        tower: TowerId,
        /// Behaviour of the projectile.
        kind: ProjectileKind,
    },
    /// Reports that a projectile struck an enemy.
    ProjectileHit {
        /// Projectile that landed the hit.
        projectile: ProjectileId,
        /// Enemy that was struck.
        enemy: EnemyId,
        /// Health actually removed by the hit.
        applied: f32,
        /// Whether the hit destroyed the enemy.
        lethal: bool,
    },
    /// Reports that a bomb projectile detonated.
    BombExploded {
        /// Projectile that detonated.
        projectile: ProjectileId,
        /// Centre of the explosion.
        position: Vec2,
        /// Number of enemies caught in the blast.
        affected: u32,
    },
    /// Announces the start of a wave.
    WaveStarted {
        /// Number of the wave that started.
        wave: u32,
        /// Number of enemies the wave will spawn.
        enemies: u32,
        /// Whether the wave is a boss wave.
        boss: bool,
    },
    /// Announces that a wave finished and its reward was paid.
    WaveCompleted {
        /// Number of the wave that finished.
        wave: u32,
        /// Cash awarded for the wave.
        reward: u32,
    },
    /// Announces that a previously locked tower type became available.
    TowerUnlocked {
        /// Tower type that was unlocked.
        kind: TowerKind,
    },
    /// Announces that the base ran out of lives.
    GameOver,
    /// Announces that the final wave was cleared.
    Victory,
    /// Announces that the world returned to its initial state.
    WorldReset,
    /// Reports that a command was refused without changing any state.
    CommandRejected {
        /// Specific reason the command failed.
        reason: Rejection,
    },
}

/// Unique identifier assigned to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TowerId(u32);

impl TowerId {
    /// Creates a new tower identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the tower identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a projectile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectileId(u32);

impl ProjectileId {
    /// Creates a new projectile identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the projectile identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Types of towers that can be constructed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TowerKind {
    /// Cheap all-rounder.
    Basic,
    /// Fast firing, light damage.
    Rapid,
    /// Slow, hard hitting shells.
    Heavy,
    /// Freezes the enemies it hits.
    Ice,
    /// Sets the enemies it hits on fire.
    Flamer,
    /// Lobs bombs that splash nearby enemies.
    Bomber,
}

impl TowerKind {
    /// Every tower kind in catalog order.
    pub const ALL: [TowerKind; 6] = [
        TowerKind::Basic,
        TowerKind::Rapid,
        TowerKind::Heavy,
        TowerKind::Ice,
        TowerKind::Flamer,
        TowerKind::Bomber,
    ];

    /// Name shown to players for the tower kind.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Basic => "Basic Tank",
            Self::Rapid => "Semi Auto",
            Self::Heavy => "Super Shooter",
            Self::Ice => "Ice Tank",
            Self::Flamer => "Flamer",
            Self::Bomber => "Bomber",
        }
    }

    /// Behaviour of the projectiles fired by this kind.
    #[must_use]
    pub const fn projectile_kind(self) -> ProjectileKind {
        match self {
            Self::Basic | Self::Rapid | Self::Heavy => ProjectileKind::Normal,
            Self::Ice => ProjectileKind::Ice,
            Self::Flamer => ProjectileKind::Flame,
            Self::Bomber => ProjectileKind::Bomb,
        }
    }

    /// Whether this kind fires the large, slow heavy shells.
    #[must_use]
    pub const fn fires_heavy_shells(self) -> bool {
        matches!(self, Self::Heavy)
    }
}

/// Behaviour tag carried by projectiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectileKind {
    /// Plain single-target shot.
    Normal,
    /// Single-target shot that freezes.
    Ice,
    /// Single-target shot that ignites.
    Flame,
    /// Explosive shot with splash damage.
    Bomb,
}

/// Classification of incoming damage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageKind {
    /// Direct projectile damage. Amounts of 3 or more count as heavy hits.
    Normal,
    /// Damage-over-time from the burning effect.
    Burn,
    /// Area damage from an explosion.
    Splash,
}

/// Status effects that can be attached to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    /// Halves movement speed.
    Frozen,
    /// Deals periodic burn damage.
    Burning,
}

/// Base statistics and economy data for a single tower kind.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TowerSpec {
    /// Purchase price.
    pub cost: u32,
    /// Damage dealt per projectile at level 0.
    pub damage: f32,
    /// Targeting radius at level 0.
    pub range: f32,
    /// Cooldown between shots at level 0, in milliseconds.
    pub fire_rate_ms: u64,
    /// Base price of an upgrade, scaled by the level being bought.
    pub upgrade_base: u32,
    /// Wave whose completion unlocks the kind. `None` means available from the start.
    #[serde(default)]
    pub unlock_wave: Option<u32>,
}

impl TowerSpec {
    /// Cooldown between shots at level 0.
    #[must_use]
    pub const fn fire_rate(&self) -> Duration {
        Duration::from_millis(self.fire_rate_ms)
    }

    /// Whether the kind starts unlocked.
    #[must_use]
    pub const fn unlocked_by_default(&self) -> bool {
        self.unlock_wave.is_none()
    }
}

/// Tower catalog keyed by kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TowerCatalog {
    /// Statistics for [`TowerKind::Basic`].
    pub basic: TowerSpec,
    /// Statistics for [`TowerKind::Rapid`].
    pub rapid: TowerSpec,
    /// Statistics for [`TowerKind::Heavy`].
    pub heavy: TowerSpec,
    /// Statistics for [`TowerKind::Ice`].
    pub ice: TowerSpec,
    /// Statistics for [`TowerKind::Flamer`].
    pub flamer: TowerSpec,
    /// Statistics for [`TowerKind::Bomber`].
    pub bomber: TowerSpec,
}

impl TowerCatalog {
    /// Looks up the statistics of a tower kind.
    #[must_use]
    pub const fn spec(&self, kind: TowerKind) -> &TowerSpec {
        match kind {
            TowerKind::Basic => &self.basic,
            TowerKind::Rapid => &self.rapid,
            TowerKind::Heavy => &self.heavy,
            TowerKind::Ice => &self.ice,
            TowerKind::Flamer => &self.flamer,
            TowerKind::Bomber => &self.bomber,
        }
    }

    /// Kinds whose unlock gate is tied to the provided wave.
    pub fn gated_by(&self, wave: u32) -> impl Iterator<Item = TowerKind> + '_ {
        TowerKind::ALL
            .into_iter()
            .filter(move |kind| self.spec(*kind).unlock_wave == Some(wave))
    }
}

impl Default for TowerCatalog {
    fn default() -> Self {
        Self {
            basic: TowerSpec {
                cost: 10,
                damage: 1.0,
                range: 100.0,
                fire_rate_ms: 1_000,
                upgrade_base: 15,
                unlock_wave: None,
            },
            rapid: TowerSpec {
                cost: 25,
                damage: 0.5,
                range: 80.0,
                fire_rate_ms: 400,
                upgrade_base: 30,
                unlock_wave: None,
            },
            heavy: TowerSpec {
                cost: 50,
                damage: 3.0,
                range: 120.0,
                fire_rate_ms: 1_500,
                upgrade_base: 60,
                unlock_wave: None,
            },
            ice: TowerSpec {
                cost: 75,
                damage: 0.8,
                range: 110.0,
                fire_rate_ms: 800,
                upgrade_base: 90,
                unlock_wave: Some(5),
            },
            flamer: TowerSpec {
                cost: 100,
                damage: 1.2,
                range: 90.0,
                fire_rate_ms: 300,
                upgrade_base: 120,
                unlock_wave: Some(10),
            },
            bomber: TowerSpec {
                cost: 150,
                damage: 2.0,
                range: 150.0,
                fire_rate_ms: 2_000,
                upgrade_base: 180,
                unlock_wave: Some(15),
            },
        }
    }
}

/// Tunable parameters for a single play session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Width of the playfield in world units.
    pub width: f32,
    /// Height of the playfield in world units.
    pub height: f32,
    /// Cash available when the session starts.
    pub starting_cash: u32,
    /// Lives available when the session starts.
    pub starting_lives: u32,
    /// Number of waves that must be cleared for victory.
    pub total_waves: u32,
    /// Cash granted for every destroyed enemy.
    pub kill_reward: u32,
    /// Root seed from which every random stream is derived.
    pub seed: u64,
    /// Tower statistics.
    pub catalog: TowerCatalog,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_PLAYFIELD_WIDTH,
            height: DEFAULT_PLAYFIELD_HEIGHT,
            starting_cash: 100,
            starting_lives: 10,
            total_waves: 20,
            kill_reward: 5,
            seed: 0x7a6b_d3f1_0c45_e921,
            catalog: TowerCatalog::default(),
        }
    }
}

/// Reasons a command may be refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum Rejection {
    /// The purchase costs more than the available cash.
    #[error("insufficient cash: {required} required, {available} available")]
    InsufficientCash {
        /// Price of the rejected purchase.
        required: u32,
        /// Cash available when the purchase was attempted.
        available: u32,
    },
    /// The position is too close to another tower or inside a reserved margin.
    #[error("position violates tower placement rules")]
    InvalidPosition,
    /// The tower type has not been unlocked yet.
    #[error("tower type {kind:?} is still locked")]
    LockedType {
        /// Kind that was requested.
        kind: TowerKind,
    },
    /// The tower already reached its final upgrade level.
    #[error("tower is already at its maximum level")]
    MaxLevel,
    /// A wave is already running.
    #[error("a wave is already in progress")]
    WaveInProgress,
    /// The command needs a selected tower but none is selected.
    #[error("no tower is selected")]
    NoSelection,
    /// No tower with the provided identifier exists.
    #[error("tower {tower:?} does not exist")]
    UnknownTower {
        /// Identifier that was requested.
        tower: TowerId,
    },
    /// The session is not in a state that accepts gameplay commands.
    #[error("session is not accepting gameplay commands")]
    NotPlaying,
}

impl Rejection {
    /// Stable reason code a caller can use to render feedback.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InsufficientCash { .. } => "insufficient_cash",
            Self::InvalidPosition => "invalid_position",
            Self::LockedType { .. } => "locked_type",
            Self::MaxLevel => "max_level",
            Self::WaveInProgress => "wave_in_progress",
            Self::NoSelection => "no_selection",
            Self::UnknownTower { .. } => "unknown_tower",
            Self::NotPlaying => "not_playing",
        }
    }
}

/// Capability through which the simulation requests presentation effects.
pub trait EffectsSink {
    /// Requests a flash of the given size at a world position.
    fn add_impact_effect(&mut self, position: Vec2, size: f32);

    /// Requests a screen shake of the given strength and length.
    fn add_screen_shake(&mut self, intensity: f32, duration: Duration);
}

/// Presentation effect recorded by a buffering [`EffectsSink`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum VisualEffect {
    /// Flash and debris at a world position.
    Impact {
        /// Centre of the impact.
        position: Vec2,
        /// Size of the flash.
        size: f32,
    },
    /// Camera shake.
    ScreenShake {
        /// Peak offset in pixels.
        intensity: f32,
        /// Length of the shake.
        duration: Duration,
    },
}

impl EffectsSink for Vec<VisualEffect> {
    fn add_impact_effect(&mut self, position: Vec2, size: f32) {
        self.push(VisualEffect::Impact { position, size });
    }

    fn add_screen_shake(&mut self, intensity: f32, duration: Duration) {
        self.push(VisualEffect::ScreenShake {
            intensity,
            duration,
        });
    }
}

/// Sink that discards every effect request.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullEffects;

impl EffectsSink for NullEffects {
    fn add_impact_effect(&mut self, _position: Vec2, _size: f32) {}

    fn add_screen_shake(&mut self, _intensity: f32, _duration: Duration) {}
}

/// Lifecycle stage of a play session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionStatus {
    /// Waiting for the player to start.
    Title,
    /// Simulation running.
    Playing,
    /// Every life was lost.
    GameOver,
    /// Every wave was cleared.
    Victory,
}

/// Stage of the wave state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WavePhase {
    /// No wave running; the next one may be started.
    Idle,
    /// Enemies are still being emitted on the spawn cadence.
    Spawning,
    /// Every enemy was emitted; waiting for the field to clear.
    Active,
    /// The final wave was cleared.
    Victory,
}

/// Immutable representation of a single enemy's state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemySnapshot {
    /// Unique identifier assigned to the enemy.
    pub id: EnemyId,
    /// Current position.
    pub position: Vec2,
    /// Current health divided by maximum health.
    pub health_ratio: f32,
    /// Collision radius.
    pub size: f32,
    /// Whether the frozen effect is active.
    pub frozen: bool,
    /// Whether the burning effect is active.
    pub burning: bool,
}

/// Immutable representation of a single tower's state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TowerSnapshot {
    /// Unique identifier assigned to the tower.
    pub id: TowerId,
    /// Type of the tower.
    pub kind: TowerKind,
    /// Centre of the tower.
    pub position: Vec2,
    /// Turret heading in radians.
    pub rotation: f32,
    /// Enemy currently tracked, if any.
    pub target: Option<EnemyId>,
    /// Upgrade level in `0..=3`.
    pub level: u8,
    /// Current damage per shot.
    pub damage: f32,
    /// Current targeting radius.
    pub range: f32,
    /// Current cooldown between shots.
    pub fire_rate: Duration,
    /// Enemies destroyed by this tower's projectiles.
    pub kill_count: u32,
    /// Price of the next upgrade, `None` at maximum level.
    pub upgrade_cost: Option<u32>,
    /// Cash the tower would refund if sold now.
    pub sell_value: u32,
}

/// Immutable representation of a single projectile's state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectileSnapshot {
    /// Unique identifier assigned to the projectile.
    pub id: ProjectileId,
    /// Current position.
    pub position: Vec2,
    /// Behaviour tag.
    pub kind: ProjectileKind,
    /// Whether the projectile is a heavy shell.
    pub heavy: bool,
    /// Whether a bomb already detonated and is only showing its blast.
    pub exploded: bool,
}

/// Wave progress exposed to renderers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveSnapshot {
    /// Current (or next) wave number.
    pub number: u32,
    /// Number of waves in the campaign.
    pub total: u32,
    /// Stage of the wave state machine.
    pub phase: WavePhase,
    /// Enemies emitted so far in the running wave.
    pub spawned: u32,
    /// Enemies the running wave emits in total.
    pub per_wave: u32,
    /// Whether the current wave number is a boss wave.
    pub boss: bool,
}

impl WaveSnapshot {
    /// Whether a wave is currently running.
    #[must_use]
    pub const fn in_progress(&self) -> bool {
        matches!(self.phase, WavePhase::Spawning | WavePhase::Active)
    }
}

/// Everything a renderer needs to draw one frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Lifecycle stage of the session.
    pub status: SessionStatus,
    /// Available cash.
    pub cash: u32,
    /// Remaining lives.
    pub lives: u32,
    /// Wave progress.
    pub wave: WaveSnapshot,
    /// Tower kinds that may currently be placed.
    pub unlocked: Vec<TowerKind>,
    /// Tower currently selected by the player.
    pub selected: Option<TowerId>,
    /// Live enemies in spawn order.
    pub enemies: Vec<EnemySnapshot>,
    /// Towers in placement order.
    pub towers: Vec<TowerSnapshot>,
    /// Projectiles in launch order.
    pub projectiles: Vec<ProjectileSnapshot>,
}
