//! The two sides of an escrow agreement.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of the agreement a user is on.
///
/// Exactly one buyer and one freelancer participate in a project; the
/// creator occupies one slot and the counterparty fills the other via the
/// join protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Pays into escrow and approves milestone work.
    Buyer,
    /// Delivers milestone work and receives released funds.
    Freelancer,
}

impl Role {
    /// The role on the other side of the agreement.
    #[must_use]
    pub fn counterpart(self) -> Self {
        match self {
            Self::Buyer => Self::Freelancer,
            Self::Freelancer => Self::Buyer,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buyer => write!(f, "buyer"),
            Self::Freelancer => write!(f, "freelancer"),
        }
    }
}
