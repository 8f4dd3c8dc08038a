//! Fixed-point money and share quantities.
//!
//! Matching and accounting must be exact, so `Price` and `Cash` are i64
//! fixed-point values at four implied decimal places; only the stochastic
//! model layer converts through floats. `Quantity` counts shares. Keeping
//! the three as distinct newtypes stops them being mixed at call sites.

use derive_more::{Add, AddAssign, From, Into, Neg, Sub, SubAssign, Sum};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Mul;

/// Units per 1.0 of value: four decimal places, smallest increment 0.0001.
pub const PRICE_SCALE: i64 = 10_000;

/// Shared surface of the two fixed-point monetary newtypes.
macro_rules! fixed_point {
    ($name:ident) => {
        impl $name {
            pub const ZERO: $name = $name(0);

            /// From a float, rounded to the nearest representable unit.
            #[inline]
            pub fn from_float(v: f64) -> Self {
                Self((v * PRICE_SCALE as f64).round() as i64)
            }

            /// To a float, for model arithmetic and display.
            #[inline]
            pub fn to_float(self) -> f64 {
                self.0 as f64 / PRICE_SCALE as f64
            }

            /// Raw fixed-point units.
            #[inline]
            pub fn raw(self) -> i64 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "(${:.4})"), self.to_float())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "${:.4}", self.to_float())
            }
        }
    };
}

// =============================================================================
// Price
// =============================================================================

/// Fixed-point price: `Price(10_000)` is $1.00, `Price(1)` is $0.0001.
#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Default,
    Add,
    Sub,
    Neg,
    AddAssign,
    SubAssign,
    From,
    Into,
)]
pub struct Price(pub i64);

fixed_point!(Price);

impl Price {
    /// Whether the price is strictly positive. Valid quotes always are.
    #[inline]
    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Round to the nearest multiple of `tick_size`. Identity for
    /// non-positive tick sizes.
    #[inline]
    pub fn round_to_tick(self, tick_size: Price) -> Self {
        if tick_size.0 <= 0 {
            return self;
        }
        let half = tick_size.0 / 2;
        let offset = if self.0 >= 0 { half } else { -half };
        Price((self.0 + offset) / tick_size.0 * tick_size.0)
    }
}

// =============================================================================
// Cash
// =============================================================================

/// Fixed-point account balance. Same representation as [`Price`], kept
/// separate so a price is never credited to an account by accident.
#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Default,
    Add,
    Sub,
    Neg,
    AddAssign,
    SubAssign,
    Sum,
    From,
    Into,
)]
pub struct Cash(pub i64);

fixed_point!(Cash);

// =============================================================================
// Quantity
// =============================================================================

/// Number of shares.
#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Default,
    Add,
    Sub,
    AddAssign,
    SubAssign,
    Sum,
    From,
    Into,
)]
pub struct Quantity(pub u64);

impl Quantity {
    pub const ZERO: Quantity = Quantity(0);

    /// Raw share count.
    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Subtraction that floors at zero.
    #[inline]
    pub fn saturating_sub(self, rhs: Self) -> Self {
        Quantity(self.0.saturating_sub(rhs.0))
    }

    /// The smaller of two quantities, the executable size of a match.
    #[inline]
    pub fn min(self, other: Self) -> Self {
        Quantity(self.0.min(other.0))
    }
}

impl fmt::Debug for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Qty({})", self.0)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Allow `quantity == 50` comparisons in assertions
impl PartialEq<u64> for Quantity {
    fn eq(&self, other: &u64) -> bool {
        self.0 == *other
    }
}

// =============================================================================
// Notional Value
// =============================================================================

impl Mul<Quantity> for Price {
    type Output = Cash;

    fn mul(self, qty: Quantity) -> Cash {
        Cash(self.0 * qty.0 as i64)
    }
}

impl Mul<Price> for Quantity {
    type Output = Cash;

    fn mul(self, price: Price) -> Cash {
        Cash(price.0 * self.0 as i64)
    }
}
