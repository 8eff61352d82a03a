#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Play session orchestration for Tank Defence.
//!
//! [`GameSession`] is the surface an adapter talks to. It owns the world, the
//! wave controller, the tower selection and a buffer of requested visual
//! effects, and runs the per-frame pass: the world tick first, then the wave
//! controller, then any commands the controller emitted.

use std::time::Duration;

use glam::Vec2;
use sha2::{Digest, Sha256};
use tank_defence_core::{
    Command, Event, Rejection, SessionConfig, SessionSnapshot, SessionStatus, TowerId,
    TowerKind, VisualEffect,
};
use tank_defence_system_waves::{Config as WaveConfig, WaveController};
use tank_defence_world::{self as world, query, World};
use tracing::{debug, info};

const ENEMY_WANDER_STREAM: &str = "enemy-wander";
const WAVE_SPAWN_STREAM: &str = "wave-spawns";
const START_SHAKE: f32 = 5.0;
const START_SHAKE_DURATION: Duration = Duration::from_millis(500);
const GAME_OVER_SHAKE: f32 = 15.0;
const GAME_OVER_SHAKE_DURATION: Duration = Duration::from_millis(1_500);
const VICTORY_SHAKE: f32 = 5.0;
const VICTORY_SHAKE_DURATION: Duration = Duration::from_millis(1_000);

/// Derives an independent seed for a named random stream.
#[must_use]
pub fn derive_labeled_seed(base: u64, label: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(base.to_le_bytes());
    hasher.update(label.as_bytes());
    finalize_seed(hasher)
}

fn finalize_seed(hasher: Sha256) -> u64 {
    let digest = hasher.finalize();
    let mut bytes = [0_u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

/// A single play-through from the title screen to game over or victory.
#[derive(Debug)]
pub struct GameSession {
    world: World,
    waves: WaveController,
    status: SessionStatus,
    selected: Option<TowerId>,
    effects: Vec<VisualEffect>,
}

impl GameSession {
    /// Creates a session waiting on the title screen.
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        let waves = WaveController::new(WaveConfig::new(
            config.total_waves,
            config.width,
            derive_labeled_seed(config.seed, WAVE_SPAWN_STREAM),
        ));
        let wander_seed = derive_labeled_seed(config.seed, ENEMY_WANDER_STREAM);
        Self {
            world: World::new(config, wander_seed),
            waves,
            status: SessionStatus::Title,
            selected: None,
            effects: Vec::new(),
        }
    }

    /// Lifecycle stage of the session.
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Settings the session was created with.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        query::config(&self.world)
    }

    /// Tower currently selected, if any.
    #[must_use]
    pub fn selected(&self) -> Option<TowerId> {
        self.selected
    }

    /// Leaves the title screen. Returns `false` when the game already started.
    pub fn start_game(&mut self) -> bool {
        if self.status != SessionStatus::Title {
            return false;
        }
        self.status = SessionStatus::Playing;
        self.effects.push(VisualEffect::ScreenShake {
            intensity: START_SHAKE,
            duration: START_SHAKE_DURATION,
        });
        info!("game started");
        true
    }

    /// Buys a tower of `kind` centred on `position`.
    pub fn place_tower(&mut self, position: Vec2, kind: TowerKind) -> Result<TowerId, Rejection> {
        self.ensure_playing()?;
        let events = self.execute(Command::PlaceTower { kind, position });
        match events.as_slice() {
            [Event::TowerPlaced { tower, cost, .. }] => {
                debug!(tower = tower.get(), ?kind, cost, "tower placed");
                Ok(*tower)
            }
            _ => Err(rejection_in(&events)),
        }
    }

    /// Sells the selected tower and returns the refund.
    pub fn sell_selected_tower(&mut self) -> Result<u32, Rejection> {
        self.ensure_playing()?;
        let tower = self.selected.ok_or(Rejection::NoSelection)?;
        let events = self.execute(Command::SellTower { tower });
        match events.as_slice() {
            [Event::TowerSold { refund, .. }] => {
                self.selected = None;
                debug!(tower = tower.get(), refund, "tower sold");
                Ok(*refund)
            }
            _ => Err(rejection_in(&events)),
        }
    }

    /// Upgrades the selected tower and returns its new level.
    pub fn upgrade_selected_tower(&mut self) -> Result<u8, Rejection> {
        self.ensure_playing()?;
        let tower = self.selected.ok_or(Rejection::NoSelection)?;
        let events = self.execute(Command::UpgradeTower { tower });
        match events.as_slice() {
            [Event::TowerUpgraded { level, cost, .. }] => {
                debug!(tower = tower.get(), level, cost, "tower upgraded");
                Ok(*level)
            }
            _ => Err(rejection_in(&events)),
        }
    }

    /// Selects the first tower whose footprint covers `position`.
    ///
    /// Clicking empty ground clears the selection. Outside of play nothing
    /// changes and `None` is returned.
    pub fn select_tower_at(&mut self, position: Vec2) -> Option<TowerId> {
        if self.status != SessionStatus::Playing {
            return None;
        }
        self.selected = query::tower_at(&self.world, position);
        self.selected
    }

    /// Starts the next wave and returns its number.
    pub fn start_wave(&mut self) -> Result<u32, Rejection> {
        self.ensure_playing()?;
        let mut events = Vec::new();
        let result = self.waves.start_wave(&mut events);
        for event in &events {
            if let Event::WaveStarted {
                wave,
                enemies,
                boss,
            } = event
            {
                info!(wave, enemies, boss, "wave started");
            }
        }
        if let Err(reason) = result {
            debug!(reason = reason.code(), "wave start rejected");
        }
        result
    }

    /// Returns to a fresh game: cash, lives, waves, towers and unlocks.
    pub fn restart_game(&mut self) {
        let _ = self.execute(Command::ResetWorld);
        self.waves.reset();
        self.selected = None;
        self.effects.clear();
        self.status = SessionStatus::Playing;
        self.effects.push(VisualEffect::ScreenShake {
            intensity: START_SHAKE,
            duration: START_SHAKE_DURATION,
        });
        info!("game restarted");
    }

    /// Advances the simulation by `dt` and returns every event it produced.
    ///
    /// Outside of play the clock is frozen and no events are produced.
    pub fn tick(&mut self, dt: Duration) -> Vec<Event> {
        let mut events = Vec::new();
        if self.status != SessionStatus::Playing {
            return events;
        }

        world::apply(
            &mut self.world,
            Command::Tick { dt },
            &mut events,
            &mut self.effects,
        );

        if !events.iter().any(|event| matches!(event, Event::GameOver)) {
            let mut commands = Vec::new();
            self.waves
                .handle(&events, query::enemy_count(&self.world), &mut commands);
            for command in commands {
                world::apply(&mut self.world, command, &mut events, &mut self.effects);
            }
        }

        self.observe(&events);
        events
    }

    /// Captures everything a renderer needs for the current frame.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            status: self.status,
            cash: query::cash(&self.world),
            lives: query::lives(&self.world),
            wave: self.waves.snapshot(),
            unlocked: query::unlocked_kinds(&self.world),
            selected: self.selected,
            enemies: query::enemy_view(&self.world),
            towers: query::tower_view(&self.world),
            projectiles: query::projectile_view(&self.world),
        }
    }

    /// Hands over the effects requested since the previous call.
    pub fn drain_effects(&mut self) -> Vec<VisualEffect> {
        std::mem::take(&mut self.effects)
    }

    fn ensure_playing(&self) -> Result<(), Rejection> {
        if self.status != SessionStatus::Playing {
            return Err(Rejection::NotPlaying);
        }
        Ok(())
    }

    fn execute(&mut self, command: Command) -> Vec<Event> {
        let mut events = Vec::new();
        world::apply(&mut self.world, command, &mut events, &mut self.effects);
        events
    }

    fn observe(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::WaveCompleted { wave, reward } => {
                    info!(wave, reward, cash = query::cash(&self.world), "wave completed");
                }
                Event::TowerUnlocked { kind } => {
                    info!(?kind, name = kind.display_name(), "tower unlocked");
                }
                Event::GameOver => {
                    self.status = SessionStatus::GameOver;
                    self.effects.push(VisualEffect::ScreenShake {
                        intensity: GAME_OVER_SHAKE,
                        duration: GAME_OVER_SHAKE_DURATION,
                    });
                    info!(wave = self.waves.wave_number(), "game over");
                }
                Event::Victory => {
                    self.status = SessionStatus::Victory;
                    self.effects.push(VisualEffect::ScreenShake {
                        intensity: VICTORY_SHAKE,
                        duration: VICTORY_SHAKE_DURATION,
                    });
                    info!(lives = query::lives(&self.world), "victory");
                }
                _ => {}
            }
        }
    }
}

fn rejection_in(events: &[Event]) -> Rejection {
    let reason = events
        .iter()
        .find_map(|event| match event {
            Event::CommandRejected { reason } => Some(*reason),
            _ => None,
        })
        .unwrap_or(Rejection::NotPlaying);
    debug!(reason = reason.code(), "command rejected");
    reason
}
