//! Status effects attached to enemies.

use std::time::Duration;

use tank_defence_core::EffectKind;

/// How long a freeze lasts after the most recent application.
pub(crate) const FROZEN_DURATION: Duration = Duration::from_millis(3_000);
/// How long a fire burns after the most recent application.
pub(crate) const BURNING_DURATION: Duration = Duration::from_millis(4_000);
/// Interval between two burn damage ticks.
pub(crate) const BURN_INTERVAL: Duration = Duration::from_millis(500);
/// Damage dealt by a single burn tick.
pub(crate) const BURN_DAMAGE: f32 = 0.3;
/// Speed multiplier applied while frozen.
pub(crate) const FROZEN_SPEED_FACTOR: f32 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Burning {
    remaining: Duration,
    accumulator: Duration,
}

/// Frozen and burning timers of a single enemy.
///
/// Each effect exists at most once. Re-applying an active effect refreshes
/// its remaining duration instead of stacking a second instance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct StatusEffects {
    frozen: Option<Duration>,
    burning: Option<Burning>,
}

impl StatusEffects {
    /// Activates the effect or refreshes it to its full duration.
    ///
    /// Refreshing a burn keeps the partial progress toward the next tick
    /// instead of resetting it, so a target hit again just before a tick
    /// still takes that tick on schedule.
    pub(crate) fn apply(&mut self, kind: EffectKind) {
        match kind {
            EffectKind::Frozen => self.frozen = Some(FROZEN_DURATION),
            EffectKind::Burning => {
                let accumulator = self.burning.map_or(Duration::ZERO, |burn| burn.accumulator);
                self.burning = Some(Burning {
                    remaining: BURNING_DURATION,
                    accumulator,
                });
            }
        }
    }

    /// Counts the effects down and returns how many burn ticks fell due.
    ///
    /// Only the part of `dt` that overlaps the remaining burn time feeds the
    /// tick accumulator, so splitting the same elapsed time into different
    /// chunks always yields the same number of ticks. A tick that falls due
    /// at the exact instant the burn expires does not land.
    pub(crate) fn advance(&mut self, dt: Duration) -> u32 {
        if let Some(remaining) = self.frozen {
            self.frozen = remaining.checked_sub(dt).filter(|left| !left.is_zero());
        }

        let Some(mut burn) = self.burning else {
            return 0;
        };

        let expiring = dt >= burn.remaining;
        burn.accumulator += dt.min(burn.remaining);
        let due = |accumulator: Duration| {
            accumulator > BURN_INTERVAL || (!expiring && accumulator == BURN_INTERVAL)
        };
        let mut ticks = 0;
        while due(burn.accumulator) {
            burn.accumulator -= BURN_INTERVAL;
            ticks += 1;
        }

        self.burning = burn
            .remaining
            .checked_sub(dt)
            .filter(|left| !left.is_zero())
            .map(|remaining| Burning {
                remaining,
                accumulator: burn.accumulator,
            });
        ticks
    }

    pub(crate) fn is_frozen(&self) -> bool {
        self.frozen.is_some()
    }

    pub(crate) fn is_burning(&self) -> bool {
        self.burning.is_some()
    }

    #[cfg(test)]
    pub(crate) fn frozen_remaining(&self) -> Duration {
        self.frozen.unwrap_or(Duration::ZERO)
    }

    #[cfg(test)]
    pub(crate) fn burning_remaining(&self) -> Duration {
        self.burning.map_or(Duration::ZERO, |burn| burn.remaining)
    }

    /// Multiplier applied to base speed.
    pub(crate) fn speed_factor(&self) -> f32 {
        if self.is_frozen() {
            FROZEN_SPEED_FACTOR
        } else {
            1.0
        }
    }
}
