//! Cash, lives and tower unlock gates.

use std::collections::BTreeSet;

use tank_defence_core::{Rejection, SessionConfig, TowerCatalog, TowerKind};

#[derive(Clone, Debug)]
pub(crate) struct Economy {
    cash: u32,
    lives: u32,
    unlocked: BTreeSet<TowerKind>,
}

impl Economy {
    pub(crate) fn new(config: &SessionConfig) -> Self {
        let unlocked = TowerKind::ALL
            .into_iter()
            .filter(|kind| config.catalog.spec(*kind).unlocked_by_default())
            .collect();
        Self {
            cash: config.starting_cash,
            lives: config.starting_lives,
            unlocked,
        }
    }

    pub(crate) fn cash(&self) -> u32 {
        self.cash
    }

    pub(crate) fn lives(&self) -> u32 {
        self.lives
    }

    /// Fails without debiting anything when `amount` exceeds the balance.
    pub(crate) fn ensure_affordable(&self, amount: u32) -> Result<(), Rejection> {
        if amount > self.cash {
            return Err(Rejection::InsufficientCash {
                required: amount,
                available: self.cash,
            });
        }
        Ok(())
    }

    pub(crate) fn debit(&mut self, amount: u32) -> Result<(), Rejection> {
        self.ensure_affordable(amount)?;
        self.cash -= amount;
        Ok(())
    }

    pub(crate) fn credit(&mut self, amount: u32) {
        self.cash = self.cash.saturating_add(amount);
    }

    /// Removes one life and reports how many remain.
    pub(crate) fn lose_life(&mut self) -> u32 {
        self.lives = self.lives.saturating_sub(1);
        self.lives
    }

    pub(crate) fn is_unlocked(&self, kind: TowerKind) -> bool {
        self.unlocked.contains(&kind)
    }

    pub(crate) fn unlocked(&self) -> impl Iterator<Item = TowerKind> + '_ {
        self.unlocked.iter().copied()
    }

    /// Opens every gate tied to `wave` and returns the kinds that were still locked.
    pub(crate) fn unlock_for_wave(&mut self, wave: u32, catalog: &TowerCatalog) -> Vec<TowerKind> {
        catalog
            .gated_by(wave)
            .filter(|kind| self.unlocked.insert(*kind))
            .collect()
    }
}
