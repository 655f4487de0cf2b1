use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

//--------------------------------------    TokenAmount    -----------------------------------------------------------
/// A quantity of security tokens. Amounts are indivisible units, so an `i64` covers the full range
/// the ledger can represent.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct TokenAmount(i64);

op!(binary TokenAmount, Add, add);
op!(binary TokenAmount, Sub, sub);
op!(inplace TokenAmount, SubAssign, sub_assign);
op!(unary TokenAmount, Neg, neg);

impl Sum for TokenAmount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented as a token amount: {0}")]
pub struct TokenAmountConversionError(String);

impl From<i64> for TokenAmount {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for TokenAmount {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for TokenAmount {}

impl TryFrom<u64> for TokenAmount {
    type Error = TokenAmountConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(TokenAmountConversionError(format!("Value {} is too large to convert to TokenAmount", value)))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl Display for TokenAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TokenAmount {
    pub fn value(&self) -> i64 {
        self.0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn conversions() {
        let amount = TokenAmount::from(500);
        assert_eq!(amount.value(), 500);
        assert!(TokenAmount::try_from(u64::MAX).is_err());
        assert_eq!(TokenAmount::try_from(42u64).unwrap(), TokenAmount::from(42));
    }

    #[test]
    fn arithmetic() {
        let a = TokenAmount::from(1000);
        let b = TokenAmount::from(400);
        assert_eq!(a - b, TokenAmount::from(600));
        assert_eq!(a + b, TokenAmount::from(1400));
        assert_eq!(-b, TokenAmount::from(-400));
        let total: TokenAmount = [a, b].into_iter().sum();
        assert_eq!(total, TokenAmount::from(1400));
    }
}
