//! Scripted player that drives a session without a human at the controls.

use std::time::Duration;

use glam::Vec2;
use tank_defence_core::{Event, SessionStatus, TowerKind};
use tank_defence_session::GameSession;
use tracing::debug;

const SPOT_SPACING: f32 = 80.0;
const EDGE_INSET: f32 = 60.0;
const TOP_INSET: f32 = 120.0;

/// Build order preference, most expensive first.
const PREFERENCE: [TowerKind; 6] = [
    TowerKind::Bomber,
    TowerKind::Flamer,
    TowerKind::Ice,
    TowerKind::Heavy,
    TowerKind::Rapid,
    TowerKind::Basic,
];

/// Outcome of an unattended run.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct RunSummary {
    pub(crate) status: SessionStatus,
    pub(crate) waves_cleared: u32,
    pub(crate) cash: u32,
    pub(crate) lives: u32,
    pub(crate) towers_placed: u32,
    pub(crate) upgrades: u32,
    pub(crate) kills: u32,
    pub(crate) breaches: u32,
    pub(crate) ticks: u64,
}

/// Places towers on a fixed grid and starts waves as soon as the field is clear.
#[derive(Debug)]
pub(crate) struct Autopilot {
    spots: Vec<Vec2>,
    next_spot: usize,
    towers_placed: u32,
    upgrades: u32,
}

impl Autopilot {
    pub(crate) fn new(width: f32, height: f32) -> Self {
        let mut spots = Vec::new();
        let mut y = TOP_INSET;
        while y <= height - TOP_INSET {
            let mut x = EDGE_INSET;
            while x <= width - EDGE_INSET {
                spots.push(Vec2::new(x, y));
                x += SPOT_SPACING;
            }
            y += SPOT_SPACING;
        }
        // Fill the middle of the field first.
        let centre = Vec2::new(width / 2.0, height / 2.0);
        spots.sort_by(|a, b| a.distance(centre).total_cmp(&b.distance(centre)));

        Self {
            spots,
            next_spot: 0,
            towers_placed: 0,
            upgrades: 0,
        }
    }

    /// Spends available cash on new towers, then on upgrades.
    pub(crate) fn spend(&mut self, session: &mut GameSession) {
        while self.place_one(session) {}
        while self.upgrade_one(session) {}
    }

    fn place_one(&mut self, session: &mut GameSession) -> bool {
        let snapshot = session.snapshot();
        let Some(kind) = PREFERENCE.into_iter().find(|kind| {
            snapshot.unlocked.contains(kind)
                && session.config().catalog.spec(*kind).cost <= snapshot.cash
        }) else {
            return false;
        };

        while let Some(spot) = self.spots.get(self.next_spot).copied() {
            self.next_spot += 1;
            match session.place_tower(spot, kind) {
                Ok(_) => {
                    self.towers_placed += 1;
                    return true;
                }
                Err(reason) => {
                    debug!(reason = reason.code(), x = spot.x, y = spot.y, "spot skipped");
                }
            }
        }
        false
    }

    fn upgrade_one(&mut self, session: &mut GameSession) -> bool {
        let snapshot = session.snapshot();
        let Some((_, position)) = snapshot
            .towers
            .iter()
            .filter_map(|tower| tower.upgrade_cost.map(|cost| (cost, tower.position)))
            .filter(|(cost, _)| *cost <= snapshot.cash)
            .min_by_key(|(cost, _)| *cost)
        else {
            return false;
        };

        if session.select_tower_at(position).is_none() {
            return false;
        }
        let upgraded = session.upgrade_selected_tower().is_ok();
        if upgraded {
            self.upgrades += 1;
        }
        upgraded
    }

    /// Plays until the session ends or `max_ticks` frames have elapsed.
    pub(crate) fn run(
        &mut self,
        session: &mut GameSession,
        dt: Duration,
        max_ticks: u64,
    ) -> RunSummary {
        let _ = session.start_game();
        let mut waves_cleared = 0;
        let mut kills = 0;
        let mut breaches = 0;
        let mut ticks = 0;
        let mut wave_pending = true;

        while ticks < max_ticks && session.status() == SessionStatus::Playing {
            if wave_pending {
                self.spend(session);
                wave_pending = session.start_wave().is_err();
            }

            for event in session.tick(dt) {
                match event {
                    Event::EnemyKilled { .. } => kills += 1,
                    Event::EnemyBreached { .. } => breaches += 1,
                    Event::WaveCompleted { .. } => {
                        waves_cleared += 1;
                        wave_pending = true;
                    }
                    _ => {}
                }
            }
            let _ = session.drain_effects();
            ticks += 1;
        }

        let snapshot = session.snapshot();
        RunSummary {
            status: snapshot.status,
            waves_cleared,
            cash: snapshot.cash,
            lives: snapshot.lives,
            towers_placed: self.towers_placed,
            upgrades: self.upgrades,
            kills,
            breaches,
            ticks,
        }
    }
}
