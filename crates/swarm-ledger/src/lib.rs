//! Per-agent credit governor.
//!
//! Credits are a soft currency reflecting productive contribution. Every
//! token charged by the reasoning backend debits credits 1:1; successful
//! signal emissions and collective-memory contributions earn them back. The
//! derived [`CreditTier`] gates reasoning calls: `Critical` and `Dead` skip
//! the backend entirely, `LowCompute` downgrades to a cheaper model variant.
//!
//! The governor is a pure function of the local ledger; no cross-agent
//! communication is involved. All balances use [`Decimal`] and checked
//! arithmetic -- the ledger never panics and never overflows silently.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use swarm_types::CreditTier;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Thresholds and earning parameters for the credit governor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditConfig {
    /// Balance the ledger opens with.
    pub starting_balance: Decimal,
    /// Balances strictly above this are [`CreditTier::Normal`].
    pub normal_threshold: Decimal,
    /// Balances strictly above this (but not above `normal_threshold`) are
    /// [`CreditTier::LowCompute`].
    pub low_threshold: Decimal,
    /// Flat bonus for contributing to a collective memory.
    pub collective_bonus: Decimal,
}

impl Default for CreditConfig {
    fn default() -> Self {
        Self {
            starting_balance: Decimal::new(10_000, 0),
            normal_threshold: Decimal::new(5_000, 0),
            low_threshold: Decimal::new(1_000, 0),
            collective_bonus: Decimal::new(10, 0),
        }
    }
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// A single agent's credit ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditLedger {
    config: CreditConfig,
    balance: Decimal,
    earned: Decimal,
    spent: Decimal,
    distress_emitted: bool,
}

impl CreditLedger {
    /// Open a ledger at the configured starting balance.
    pub const fn new(config: CreditConfig) -> Self {
        Self {
            config,
            balance: config.starting_balance,
            earned: Decimal::ZERO,
            spent: Decimal::ZERO,
            distress_emitted: false,
        }
    }

    /// Current balance (may be negative).
    pub const fn balance(&self) -> Decimal {
        self.balance
    }

    /// Lifetime credits earned.
    pub const fn earned(&self) -> Decimal {
        self.earned
    }

    /// Lifetime credits spent.
    pub const fn spent(&self) -> Decimal {
        self.spent
    }

    /// Debit reasoning-backend tokens 1:1.
    pub fn debit_tokens(&mut self, tokens: u64) {
        let amount = Decimal::from(tokens);
        self.balance = self.balance.checked_sub(amount).unwrap_or(self.balance);
        self.spent = self.spent.checked_add(amount).unwrap_or(self.spent);
        debug!(tokens, balance = %self.balance, tier = ?self.tier(), "credits debited");
    }

    /// Earn credits for a successful signal emission: `2 + 8 * confidence`,
    /// rounded to two decimal places.
    pub fn earn_emission(&mut self, confidence: f64) -> Decimal {
        let conf = Decimal::try_from(confidence.clamp(0.0, 1.0)).unwrap_or(Decimal::ZERO);
        let amount = Decimal::new(8, 0)
            .checked_mul(conf)
            .and_then(|scaled| scaled.checked_add(Decimal::new(2, 0)))
            .unwrap_or(Decimal::new(2, 0))
            .round_dp(2);
        self.credit(amount);
        amount
    }

    /// Earn the flat bonus for contributing to a collective memory.
    pub fn earn_collective_bonus(&mut self) -> Decimal {
        let amount = self.config.collective_bonus;
        self.credit(amount);
        amount
    }

    /// Derive the tier from the current balance.
    pub fn tier(&self) -> CreditTier {
        if self.balance > self.config.normal_threshold {
            CreditTier::Normal
        } else if self.balance > self.config.low_threshold {
            CreditTier::LowCompute
        } else if self.balance > Decimal::ZERO {
            CreditTier::Critical
        } else {
            CreditTier::Dead
        }
    }

    /// One-shot distress gate: returns `true` the first time the tier is at
    /// or below `Critical`, then stays `false` until the flag is cleared.
    pub fn take_distress(&mut self) -> bool {
        if self.distress_emitted || self.tier().allows_reasoning() {
            return false;
        }
        self.distress_emitted = true;
        true
    }

    /// Whether the distress signal has already been emitted.
    pub const fn distress_emitted(&self) -> bool {
        self.distress_emitted
    }

    /// A serializable snapshot for the read API and the store.
    pub fn snapshot(&self) -> CreditSnapshot {
        CreditSnapshot {
            balance: self.balance,
            earned: self.earned,
            spent: self.spent,
            tier: self.tier(),
            distress_emitted: self.distress_emitted,
        }
    }

    /// Force the balance to an exact value (test and restore paths).
    pub const fn set_balance(&mut self, balance: Decimal) {
        self.balance = balance;
    }

    fn credit(&mut self, amount: Decimal) {
        self.balance = self.balance.checked_add(amount).unwrap_or(self.balance);
        self.earned = self.earned.checked_add(amount).unwrap_or(self.earned);
    }
}

impl Default for CreditLedger {
    fn default() -> Self {
        Self::new(CreditConfig::default())
    }
}

/// Point-in-time view of a ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditSnapshot {
    /// Current balance.
    pub balance: Decimal,
    /// Lifetime credits earned.
    pub earned: Decimal,
    /// Lifetime credits spent.
    pub spent: Decimal,
    /// Tier derived from the balance.
    pub tier: CreditTier,
    /// Whether the one-shot distress signal has been emitted.
    pub distress_emitted: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn opens_at_starting_balance_in_normal_tier() {
        let ledger = CreditLedger::default();
        assert_eq!(ledger.balance(), Decimal::new(10_000, 0));
        assert_eq!(ledger.tier(), CreditTier::Normal);
    }

    #[test]
    fn debit_is_one_to_one_with_tokens() {
        let mut ledger = CreditLedger::default();
        ledger.debit_tokens(2_500);
        assert_eq!(ledger.balance(), Decimal::new(7_500, 0));
        assert_eq!(ledger.spent(), Decimal::new(2_500, 0));
    }

    #[test]
    fn tier_walks_down_with_balance() {
        let mut ledger = CreditLedger::default();
        ledger.set_balance(Decimal::new(5_001, 0));
        assert_eq!(ledger.tier(), CreditTier::Normal);
        ledger.set_balance(Decimal::new(5_000, 0));
        assert_eq!(ledger.tier(), CreditTier::LowCompute);
        ledger.set_balance(Decimal::new(1_000, 0));
        assert_eq!(ledger.tier(), CreditTier::Critical);
        ledger.set_balance(Decimal::new(1, 0));
        assert_eq!(ledger.tier(), CreditTier::Critical);
        ledger.set_balance(Decimal::ZERO);
        assert_eq!(ledger.tier(), CreditTier::Dead);
        ledger.set_balance(Decimal::new(-1, 0));
        assert_eq!(ledger.tier(), CreditTier::Dead);
    }

    #[test]
    fn emission_earning_scales_with_confidence() {
        let mut ledger = CreditLedger::default();
        let low = ledger.earn_emission(0.0);
        let high = ledger.earn_emission(1.0);
        assert_eq!(low, Decimal::new(2, 0));
        assert_eq!(high, Decimal::new(10, 0));
        assert_eq!(ledger.earned(), Decimal::new(12, 0));
        assert_eq!(ledger.balance(), Decimal::new(10_012, 0));
    }

    #[test]
    fn out_of_range_confidence_is_clamped() {
        let mut ledger = CreditLedger::default();
        assert_eq!(ledger.earn_emission(7.0), Decimal::new(10, 0));
        assert_eq!(ledger.earn_emission(-3.0), Decimal::new(2, 0));
    }

    #[test]
    fn collective_bonus_is_flat() {
        let mut ledger = CreditLedger::default();
        assert_eq!(ledger.earn_collective_bonus(), Decimal::new(10, 0));
    }

    #[test]
    fn distress_fires_exactly_once() {
        let mut ledger = CreditLedger::default();
        assert!(!ledger.take_distress());

        ledger.set_balance(Decimal::new(500, 0));
        assert!(ledger.take_distress());
        assert!(!ledger.take_distress());
        assert!(ledger.distress_emitted());
    }

    #[test]
    fn snapshot_reflects_state() {
        let mut ledger = CreditLedger::default();
        ledger.debit_tokens(9_500);
        let snap = ledger.snapshot();
        assert_eq!(snap.balance, Decimal::new(500, 0));
        assert_eq!(snap.tier, CreditTier::Critical);
        assert!(!snap.distress_emitted);
    }
}
