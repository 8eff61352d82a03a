#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic wave controller responsible for pacing enemy spawns.
//!
//! The controller is a pure system. It never touches the world directly: it
//! reads `TimeAdvanced` events and the number of live enemies, and answers
//! with `SpawnEnemy` and `CompleteWave` commands.

use std::time::Duration;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tank_defence_core::{Command, Event, Rejection, WavePhase, WaveSnapshot};

const BOSS_INTERVAL: u32 = 5;
const BOSS_ENEMY_COUNT: u32 = 5;
const BOSS_HEALTH_MULTIPLIER: f32 = 2.0;
const BOSS_SPEED_MULTIPLIER: f32 = 0.8;
const BOSS_SIZE: f32 = 30.0;
const ENEMY_SIZE: f32 = 20.0;
const SPEED_PER_WAVE: f32 = 0.1;
const MAX_SPEED: f32 = 3.0;
const BASE_SPAWN_DELAY_MS: u64 = 1_000;
const SPAWN_DELAY_STEP_MS: u64 = 30;
const MIN_SPAWN_DELAY_MS: u64 = 300;
const SPAWN_EDGE_MARGIN: f32 = 20.0;
const SPAWN_HEIGHT: f32 = -20.0;
const BASE_REWARD: u32 = 20;
const REWARD_PER_WAVE: u32 = 5;

/// Reports whether the wave with the provided number is a boss wave.
#[must_use]
pub const fn is_boss_wave(number: u32) -> bool {
    number % BOSS_INTERVAL == 0
}

/// Configuration parameters required to construct the wave controller.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    total_waves: u32,
    field_width: f32,
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration for a campaign of `total_waves` waves.
    #[must_use]
    pub const fn new(total_waves: u32, field_width: f32, rng_seed: u64) -> Self {
        Self {
            total_waves,
            field_width,
            rng_seed,
        }
    }
}

/// Difficulty parameters of a single wave.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WavePlan {
    /// One-based wave number.
    pub number: u32,
    /// Whether the wave is a boss wave.
    pub boss: bool,
    /// Number of enemies the wave spawns.
    pub enemy_count: u32,
    /// Health of every enemy in the wave.
    pub health: f32,
    /// Base speed of every enemy in the wave.
    pub speed: f32,
    /// Collision radius of every enemy in the wave.
    pub size: f32,
    /// Time between two consecutive spawns.
    pub spawn_delay: Duration,
}

impl WavePlan {
    /// Derives the plan for the provided wave number.
    ///
    /// Regular waves grow by one enemy every second wave and gain speed until
    /// the cap. Boss waves field five large, slower enemies with double health.
    #[must_use]
    pub fn for_wave(number: u32) -> Self {
        let boss = is_boss_wave(number);
        let speed = (1.0 + number as f32 * SPEED_PER_WAVE).min(MAX_SPEED);
        let health = number as f32;
        let delay_ms = BASE_SPAWN_DELAY_MS
            .saturating_sub(u64::from(number) * SPAWN_DELAY_STEP_MS)
            .max(MIN_SPAWN_DELAY_MS);

        if boss {
            Self {
                number,
                boss,
                enemy_count: BOSS_ENEMY_COUNT,
                health: health * BOSS_HEALTH_MULTIPLIER,
                speed: speed * BOSS_SPEED_MULTIPLIER,
                size: BOSS_SIZE,
                spawn_delay: Duration::from_millis(delay_ms),
            }
        } else {
            Self {
                number,
                boss,
                enemy_count: 10 + number / 2,
                health,
                speed,
                size: ENEMY_SIZE,
                spawn_delay: Duration::from_millis(delay_ms),
            }
        }
    }

    /// Cash granted for clearing this wave, doubled on boss waves.
    #[must_use]
    pub const fn reward(&self) -> u32 {
        let reward = BASE_REWARD + self.number * REWARD_PER_WAVE;
        if self.boss {
            reward * 2
        } else {
            reward
        }
    }
}

/// Pure system that drives the wave state machine.
#[derive(Debug)]
pub struct WaveController {
    config: Config,
    wave_number: u32,
    phase: WavePhase,
    plan: WavePlan,
    spawned: u32,
    accumulator: Duration,
    rng: ChaCha8Rng,
}

impl WaveController {
    /// Creates a controller waiting to start wave 1.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            wave_number: 1,
            phase: WavePhase::Idle,
            plan: WavePlan::for_wave(1),
            spawned: 0,
            accumulator: Duration::ZERO,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
        }
    }

    /// Current stage of the state machine.
    #[must_use]
    pub const fn phase(&self) -> WavePhase {
        self.phase
    }

    /// Number of the running wave, or of the next one when idle.
    #[must_use]
    pub const fn wave_number(&self) -> u32 {
        self.wave_number
    }

    /// Starts the next wave.
    ///
    /// Only valid while idle; otherwise nothing changes and the reason is
    /// returned. Any leftover spawn time is discarded so no stale schedule
    /// carries into the new wave.
    pub fn start_wave(&mut self, out_events: &mut Vec<Event>) -> Result<u32, Rejection> {
        match self.phase {
            WavePhase::Idle => {}
            WavePhase::Spawning | WavePhase::Active => return Err(Rejection::WaveInProgress),
            WavePhase::Victory => return Err(Rejection::NotPlaying),
        }

        self.plan = WavePlan::for_wave(self.wave_number);
        self.spawned = 0;
        self.accumulator = Duration::ZERO;
        self.phase = WavePhase::Spawning;
        out_events.push(Event::WaveStarted {
            wave: self.plan.number,
            enemies: self.plan.enemy_count,
            boss: self.plan.boss,
        });
        Ok(self.plan.number)
    }

    /// Consumes events and the live enemy count to emit follow-up commands.
    ///
    /// Completion is only checked on calls that spawned nothing, because
    /// `live_enemies` cannot yet include enemies requested by this call.
    pub fn handle(&mut self, events: &[Event], live_enemies: usize, out: &mut Vec<Command>) {
        let mut spawned_now = 0;

        if self.phase == WavePhase::Spawning {
            let elapsed = events
                .iter()
                .filter_map(|event| match event {
                    Event::TimeAdvanced { dt } => Some(*dt),
                    _ => None,
                })
                .fold(Duration::ZERO, Duration::saturating_add);
            self.accumulator = self.accumulator.saturating_add(elapsed);

            while self.spawned < self.plan.enemy_count && self.accumulator >= self.plan.spawn_delay
            {
                self.accumulator -= self.plan.spawn_delay;
                self.spawned += 1;
                spawned_now += 1;
                out.push(Command::SpawnEnemy {
                    position: self.spawn_position(),
                    speed: self.plan.speed,
                    health: self.plan.health,
                    size: self.plan.size,
                });
            }

            if self.spawned >= self.plan.enemy_count {
                self.phase = WavePhase::Active;
                self.accumulator = Duration::ZERO;
            }
        }

        if spawned_now == 0 && self.phase == WavePhase::Active && live_enemies == 0 {
            self.complete(out);
        }
    }

    /// Returns to wave 1 and drops any pending spawn schedule.
    pub fn reset(&mut self) {
        *self = Self::new(self.config);
    }

    /// Captures wave progress for renderers.
    #[must_use]
    pub fn snapshot(&self) -> WaveSnapshot {
        let number = self.wave_number.min(self.config.total_waves.max(1));
        let per_wave = if self.plan.number == number {
            self.plan.enemy_count
        } else {
            WavePlan::for_wave(number).enemy_count
        };
        WaveSnapshot {
            number,
            total: self.config.total_waves,
            phase: self.phase,
            spawned: self.spawned,
            per_wave,
            boss: is_boss_wave(number),
        }
    }

    fn complete(&mut self, out: &mut Vec<Command>) {
        let wave = self.wave_number;
        let final_wave = wave >= self.config.total_waves;
        let reward = if final_wave { 0 } else { self.plan.reward() };
        out.push(Command::CompleteWave {
            wave,
            reward,
            final_wave,
        });

        self.wave_number = wave.saturating_add(1);
        self.spawned = 0;
        self.phase = if final_wave {
            WavePhase::Victory
        } else {
            WavePhase::Idle
        };
    }

    fn spawn_position(&mut self) -> Vec2 {
        let span = (self.config.field_width - SPAWN_EDGE_MARGIN * 2.0).max(0.0);
        let x = self.rng.gen::<f32>() * span + SPAWN_EDGE_MARGIN;
        Vec2::new(x, SPAWN_HEIGHT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regular_wave_plan_scales_with_number() {
        let plan = WavePlan::for_wave(1);
        assert!(!plan.boss);
        assert_eq!(plan.enemy_count, 10);
        assert!((plan.health - 1.0).abs() < f32::EPSILON);
        assert!((plan.speed - 1.1).abs() < 1e-6);
        assert!((plan.size - ENEMY_SIZE).abs() < f32::EPSILON);
        assert_eq!(plan.spawn_delay, Duration::from_millis(970));

        let late = WavePlan::for_wave(31);
        assert_eq!(late.enemy_count, 25);
        assert!((late.speed - MAX_SPEED).abs() < f32::EPSILON);
        assert_eq!(late.spawn_delay, Duration::from_millis(MIN_SPAWN_DELAY_MS));
    }

    #[test]
    fn boss_wave_plan_is_smaller_and_tougher() {
        let plan = WavePlan::for_wave(5);
        assert!(plan.boss);
        assert_eq!(plan.enemy_count, BOSS_ENEMY_COUNT);
        assert!((plan.health - 10.0).abs() < f32::EPSILON);
        assert!((plan.speed - 1.2).abs() < 1e-6);
        assert!((plan.size - BOSS_SIZE).abs() < f32::EPSILON);
        assert_eq!(plan.spawn_delay, Duration::from_millis(850));
    }

    #[test]
    fn rewards_double_on_boss_waves() {
        assert_eq!(WavePlan::for_wave(1).reward(), 25);
        assert_eq!(WavePlan::for_wave(4).reward(), 40);
        assert_eq!(WavePlan::for_wave(5).reward(), 90);
    }

    #[test]
    fn spawn_positions_stay_inside_edge_margins() {
        let mut controller = WaveController::new(Config::new(20, 800.0, 11));
        for _ in 0..200 {
            let position = controller.spawn_position();
            assert!((20.0..=780.0).contains(&position.x));
            assert!((position.y - SPAWN_HEIGHT).abs() < f32::EPSILON);
        }
    }
}
