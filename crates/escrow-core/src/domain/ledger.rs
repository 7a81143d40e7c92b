//! Escrow accounting.
//!
//! One ledger per project, opened at the moment the counterparty joins
//! with the milestone sum computed at that instant. The ledger holds three
//! numbers and one flag, and every mutation preserves:
//!
//! - `released_amount + remaining_amount == total_amount`
//! - `released_amount` never decreases
//! - `funded` never reverts to false
//! - no release while `funded == false`
//!
//! All arithmetic is on integer minor currency units.

use crate::error::{EscrowError, EscrowResult};
use escrow_types::{Amount, EscrowId, ProjectId, Timestamp};
use serde::{Deserialize, Serialize};

/// Per-project fund-custody record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowAccount {
    /// Ledger row id.
    pub id: EscrowId,
    /// Owning project (unique: one ledger per project).
    pub project_id: ProjectId,
    total_amount: Amount,
    funded: bool,
    funded_at: Option<Timestamp>,
    released_amount: Amount,
    remaining_amount: Amount,
}

impl EscrowAccount {
    /// Open a ledger holding `total_amount`, unfunded, nothing released.
    #[must_use]
    pub fn open(project_id: ProjectId, total_amount: Amount) -> Self {
        Self {
            id: EscrowId::new(),
            project_id,
            total_amount,
            funded: false,
            funded_at: None,
            released_amount: 0,
            remaining_amount: total_amount,
        }
    }

    /// Mark the ledger funded.
    ///
    /// Funding is not idempotent: a second call is a hard
    /// [`EscrowError::AlreadyFunded`] so a double charge upstream cannot
    /// pass unnoticed.
    pub fn fund(&mut self, now: Timestamp) -> EscrowResult<()> {
        if self.funded {
            return Err(EscrowError::AlreadyFunded);
        }
        self.funded = true;
        self.funded_at = Some(now);
        Ok(())
    }

    /// Move `amount` from remaining to released.
    ///
    /// Requires the ledger to be funded and `0 < amount ≤ remaining`.
    /// An over-release is rejected with the ledger untouched, never
    /// clamped. Callers respecting milestone amounts can never trip this
    /// guard, but it is checked unconditionally.
    pub fn release(&mut self, amount: Amount) -> EscrowResult<()> {
        if !self.funded {
            return Err(EscrowError::NotFunded);
        }
        if amount == 0 {
            return Err(EscrowError::validation("release amount must be positive"));
        }
        if amount > self.remaining_amount {
            return Err(EscrowError::InsufficientEscrow {
                requested: amount,
                remaining: self.remaining_amount,
            });
        }
        self.remaining_amount -= amount;
        self.released_amount += amount;
        debug_assert!(self.conservation_holds());
        Ok(())
    }

    /// Total locked in at open time (the milestone sum).
    #[must_use]
    pub fn total_amount(&self) -> Amount {
        self.total_amount
    }

    /// Whether the buyer has funded the ledger.
    #[must_use]
    pub fn funded(&self) -> bool {
        self.funded
    }

    /// When the ledger was funded, if it has been.
    #[must_use]
    pub fn funded_at(&self) -> Option<Timestamp> {
        self.funded_at
    }

    /// Running total released to the freelancer.
    #[must_use]
    pub fn released_amount(&self) -> Amount {
        self.released_amount
    }

    /// Funds still held in escrow.
    #[must_use]
    pub fn remaining_amount(&self) -> Amount {
        self.remaining_amount
    }

    /// The conservation invariant: every cent is either released or
    /// remaining.
    #[must_use]
    pub fn conservation_holds(&self) -> bool {
        self.released_amount
            .checked_add(self.remaining_amount)
            .is_some_and(|sum| sum == self.total_amount)
    }
}

/// Sum milestone amounts, rejecting overflow.
pub fn milestone_total(milestones: &[super::Milestone]) -> EscrowResult<Amount> {
    milestones
        .iter()
        .try_fold(0u64, |sum, m| sum.checked_add(m.amount()))
        .ok_or_else(|| EscrowError::validation("milestone amounts overflow the ledger"))
}
