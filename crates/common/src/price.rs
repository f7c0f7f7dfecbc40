//! Fixed-point prices

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Price in integer ticks.
///
/// `INF` and `NEG_INF` are sentinels for "no limit" and are never valid
/// limit prices on a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(i64);

impl Price {
    /// Zero price
    pub const ZERO: Price = Price(0);
    /// Above every finite price
    pub const INF: Price = Price(i64::MAX);
    /// Below every finite price
    pub const NEG_INF: Price = Price(i64::MIN);
    /// Highest accepted limit price
    pub const MAX_LIMIT: Price = Price(1 << 60);
    /// Lowest accepted limit price
    pub const MIN_LIMIT: Price = Price(-(1 << 60));

    /// Price at `ticks`
    pub const fn new(ticks: i64) -> Self {
        Price(ticks)
    }

    /// Raw tick value
    pub fn ticks(&self) -> i64 {
        self.0
    }

    /// Returns true unless this is `INF` or `NEG_INF`
    pub fn is_finite(&self) -> bool {
        *self != Self::INF && *self != Self::NEG_INF
    }

    /// Returns true if this price may be used as an order limit
    pub fn is_valid_limit(&self) -> bool {
        (Self::MIN_LIMIT..=Self::MAX_LIMIT).contains(self)
    }

    /// Round to the nearest multiple of `tick` (halves round up).
    /// Sentinels and a zero tick are returned unchanged; rounding onto or
    /// past a sentinel is an error.
    pub fn quantize(self, tick: u64) -> Result<Price> {
        if !self.is_finite() || tick <= 1 {
            return Ok(self);
        }
        let err = || Error::PriceArithmetic {
            lhs: self,
            op: "quantize",
            rhs: Price(i64::try_from(tick).unwrap_or(i64::MAX)),
        };
        let tick = i64::try_from(tick).map_err(|_| err())?;
        let rem = self.0.rem_euclid(tick);
        let down = self.0 - rem;
        let rounded = if i128::from(rem) * 2 >= i128::from(tick) {
            down.checked_add(tick).map(Price).ok_or_else(err)?
        } else {
            Price(down)
        };
        if !rounded.is_finite() {
            return Err(err());
        }
        Ok(rounded)
    }

    /// Checked addition of two finite prices
    pub fn checked_add(self, other: Price) -> Result<Price> {
        self.arith(other, "+", i64::checked_add)
    }

    /// Checked subtraction of two finite prices
    pub fn checked_sub(self, other: Price) -> Result<Price> {
        self.arith(other, "-", i64::checked_sub)
    }

    fn arith(self, other: Price, op: &'static str, f: fn(i64, i64) -> Option<i64>) -> Result<Price> {
        let err = || Error::PriceArithmetic {
            lhs: self,
            op,
            rhs: other,
        };
        if !self.is_finite() || !other.is_finite() {
            return Err(err());
        }
        f(self.0, other.0)
            .map(Price)
            .filter(Price::is_finite)
            .ok_or_else(err)
    }

    /// Midpoint of two finite prices, rounded toward negative infinity
    pub fn midpoint(self, other: Price) -> Result<Price> {
        if !self.is_finite() || !other.is_finite() {
            return Err(Error::PriceArithmetic {
                lhs: self,
                op: "mid",
                rhs: other,
            });
        }
        let carry = (self.0.rem_euclid(2) + other.0.rem_euclid(2)) / 2;
        Ok(Price(self.0.div_euclid(2) + other.0.div_euclid(2) + carry))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::INF => write!(f, "+inf"),
            Self::NEG_INF => write!(f, "-inf"),
            Price(p) => write!(f, "{}", p),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_quantize() {
        assert_eq!(Price::new(104).quantize(5), Ok(Price::new(105)));
        assert_eq!(Price::new(102).quantize(5), Ok(Price::new(100)));
        assert_eq!(Price::new(-102).quantize(5), Ok(Price::new(-100)));
        assert_eq!(Price::new(7).quantize(1), Ok(Price::new(7)));
        assert_eq!(Price::INF.quantize(10), Ok(Price::INF));
        assert_eq!(Price::NEG_INF.quantize(10), Ok(Price::NEG_INF));
    }

    #[test]
    fn test_quantize_at_the_bounds() {
        assert_matches!(
            Price::new(i64::MAX - 1).quantize(4),
            Err(Error::PriceArithmetic { op: "quantize", .. })
        );
        assert!(Price::new(1).quantize(u64::MAX).is_err());
        assert_eq!(Price::MAX_LIMIT.quantize(4), Ok(Price::MAX_LIMIT));
        assert!(Price::new(i64::MIN + 1).quantize(4).is_err());
    }

    #[test]
    fn test_valid_limits() {
        assert!(Price::MAX_LIMIT.is_valid_limit());
        assert!(Price::MIN_LIMIT.is_valid_limit());
        assert!(!Price::new(i64::MAX - 1).is_valid_limit());
        assert!(!Price::NEG_INF.is_valid_limit());
    }

    #[test]
    fn test_sentinels_order() {
        assert!(Price::NEG_INF < Price::new(-1_000_000));
        assert!(Price::new(1_000_000) < Price::INF);
        assert!(!Price::INF.is_finite());
        assert!(Price::ZERO.is_finite());
    }

    #[test]
    fn test_checked_arithmetic() {
        assert_eq!(Price::new(10).checked_add(Price::new(3)).unwrap(), Price::new(13));
        assert_eq!(Price::new(10).checked_sub(Price::new(3)).unwrap(), Price::new(7));
        assert!(Price::INF.checked_sub(Price::new(1)).is_err());
        assert!(Price::new(i64::MAX - 1).checked_add(Price::new(1)).is_err());
    }

    #[test]
    fn test_midpoint() {
        assert_eq!(Price::new(100).midpoint(Price::new(104)).unwrap(), Price::new(102));
        assert_eq!(Price::new(100).midpoint(Price::new(103)).unwrap(), Price::new(101));
        assert_eq!(Price::new(-3).midpoint(Price::new(0)).unwrap(), Price::new(-2));
        assert!(Price::INF.midpoint(Price::new(1)).is_err());
    }
}
