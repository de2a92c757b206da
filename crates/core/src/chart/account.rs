//! Account definition.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use partida_shared::types::{AccountId, TenantId};

/// Natural balance side of an account.
///
/// Balances are always stored as `debit - credit`; the natural side only
/// decides how a balance is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BalanceSide {
    /// Debit-natured account (assets, expenses).
    Debit,
    /// Credit-natured account (liabilities, equity, revenue).
    Credit,
}

impl BalanceSide {
    /// Returns the stored representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debit => "DEBIT",
            Self::Credit => "CREDIT",
        }
    }

    /// Expresses a `debit - credit` net on this side, so that a balance
    /// in the natural direction is positive.
    #[must_use]
    pub fn natural_balance(self, net: Decimal) -> Decimal {
        match self {
            Self::Debit => net,
            Self::Credit => -net,
        }
    }
}

impl std::str::FromStr for BalanceSide {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DEBIT" => Ok(Self::Debit),
            "CREDIT" => Ok(Self::Credit),
            other => Err(format!("unknown balance side: {other}")),
        }
    }
}

/// A chart-of-accounts node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account ID.
    pub id: AccountId,
    /// Tenant owning the account.
    pub tenant_id: TenantId,
    /// Hierarchical code (e.g. "1", "11", "111").
    pub code: String,
    /// Display name.
    pub name: String,
    /// Depth in the hierarchy, 1 for top-level accounts.
    pub level: i32,
    /// Whether the account may receive journal lines.
    pub postable: bool,
    /// Whether the account holds a monetary item.
    pub monetary: bool,
    /// Whether the account is restated by the inflation adjustment.
    pub adjustable: bool,
    /// Natural balance side.
    pub balance_side: BalanceSide,
    /// Whether the account is active.
    pub is_active: bool,
}

impl Account {
    /// Returns true if this account takes part in the inflation adjustment.
    #[must_use]
    pub fn is_inflation_candidate(&self) -> bool {
        self.adjustable && self.postable && self.is_active
    }

    /// Returns true if this account may be the parent of `other`: its code
    /// is a strict prefix of `other`'s and it sits on a lower level.
    ///
    /// The actual parent is the nearest such account, see
    /// [`AccountTree`](super::AccountTree).
    #[must_use]
    pub fn can_parent(&self, other: &Self) -> bool {
        other.level > self.level
            && other.code.len() > self.code.len()
            && other.code.starts_with(self.code.as_str())
    }
}
