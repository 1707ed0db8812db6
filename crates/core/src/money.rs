//! Decimal quantities: money, weight and rate.
//!
//! All arithmetic is fixed-point (`rust_decimal`). Binary floating point never
//! touches an amount: `weight.checked_mul(rate)` is exact, and summing line
//! amounts into a purchase total cannot drift. Arithmetic on values that come
//! from a request goes through the `checked_*` methods, which report overflow
//! as a validation error instead of panicking.

use core::iter::Sum;
use core::ops::{Add, AddAssign, Sub};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

macro_rules! decimal_newtype {
    ($(#[$meta:meta])* $t:ident) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $t(Decimal);

        impl $t {
            pub const ZERO: Self = Self(Decimal::ZERO);

            pub fn new(value: Decimal) -> Self {
                Self(value)
            }

            pub fn value(&self) -> Decimal {
                self.0
            }

            pub fn is_zero(&self) -> bool {
                self.0.is_zero()
            }

            pub fn is_positive(&self) -> bool {
                self.0 > Decimal::ZERO
            }

            /// Reject zero and negative values with a validation error naming `field`.
            pub fn ensure_positive(self, field: &str) -> DomainResult<Self> {
                if self.is_positive() {
                    Ok(self)
                } else {
                    Err(DomainError::validation(format!(
                        "{field} must be positive (got {})",
                        self.0
                    )))
                }
            }
        }

        impl From<Decimal> for $t {
            fn from(value: Decimal) -> Self {
                Self(value)
            }
        }

        impl From<$t> for Decimal {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl ValueObject for $t {}
    };
}

decimal_newtype!(
    /// Amount of money (rupees, arbitrary precision).
    Money
);
decimal_newtype!(
    /// Weighed quantity of scrap (kg).
    Weight
);
decimal_newtype!(
    /// Price per unit of weight.
    Rate
);

impl Money {
    /// `self + rhs`, or a validation error when the sum leaves the decimal range.
    pub fn checked_add(self, rhs: Money) -> DomainResult<Money> {
        self.0
            .checked_add(rhs.0)
            .map(Money)
            .ok_or_else(out_of_range)
    }
}

impl Weight {
    /// Amount due for this weight at `rate`.
    pub fn checked_mul(self, rate: Rate) -> DomainResult<Money> {
        self.0
            .checked_mul(rate.0)
            .map(Money)
            .ok_or_else(out_of_range)
    }
}

fn out_of_range() -> DomainError {
    DomainError::validation("amount out of range")
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.copied().sum()
    }
}

impl Add for Weight {
    type Output = Weight;

    fn add(self, rhs: Weight) -> Weight {
        Weight(self.0 + rhs.0)
    }
}

impl Sum for Weight {
    fn sum<I: Iterator<Item = Weight>>(iter: I) -> Weight {
        iter.fold(Weight::ZERO, Add::add)
    }
}
