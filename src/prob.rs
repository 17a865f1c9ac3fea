//!
//! log-odds probability calculation
//!
//! A probability is stored as `log10(p)` with an explicit tag for `p = 0`,
//! so that chains of multiplications over hundreds of observations never
//! underflow and never produce IEEE infinities or NaNs.
//!
use approx::AbsDiffEq;
use serde_with::{DeserializeFromStr, SerializeDisplay};
use std::str::FromStr;

///
/// Log base 10 of a probability, or the zero-probability sentinel.
///
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, SerializeDisplay, DeserializeFromStr)]
pub enum LogOdds {
    /// `p = 0`. Sorts strictly below every finite value.
    Zero,
    /// `log10(p)` of a nonzero probability.
    Finite(f64),
}

///
/// short-hand of `LogOdds::from_prob`
///
pub fn lo(p: f64) -> LogOdds {
    LogOdds::from_prob(p)
}

impl LogOdds {
    ///
    /// From a linear probability. Tags the sentinel iff `p` is exactly 0.
    ///
    pub fn from_prob(p: f64) -> LogOdds {
        assert!(p >= 0.0, "negative probability {}", p);
        if p == 0.0 {
            LogOdds::Zero
        } else {
            LogOdds::Finite(p.log10())
        }
    }
    ///
    /// From a log10 probability value.
    ///
    pub fn from_log10(l: f64) -> LogOdds {
        LogOdds::Finite(l)
    }
    ///
    /// Get the log10 value, or `None` for the zero sentinel.
    ///
    pub fn to_log10(self) -> Option<f64> {
        match self {
            LogOdds::Zero => None,
            LogOdds::Finite(l) => Some(l),
        }
    }
    ///
    /// Get the probability (in `[0, 1]`)
    ///
    pub fn to_prob(self) -> f64 {
        match self {
            LogOdds::Zero => 0.0,
            LogOdds::Finite(l) => 10f64.powf(l),
        }
    }
    ///
    /// Is `p == 0` or not?
    ///
    pub fn is_zero(self) -> bool {
        matches!(self, LogOdds::Zero)
    }
    ///
    /// prob=0.0
    ///
    pub fn zero() -> LogOdds {
        LogOdds::Zero
    }
    ///
    /// prob=1.0 (log10 = 0)
    ///
    pub fn one() -> LogOdds {
        LogOdds::Finite(0.0)
    }
}

/// p=0 as a default value
impl Default for LogOdds {
    fn default() -> Self {
        LogOdds::Zero
    }
}

/// Multiplication of two probabilities `px * py` in log space
///
/// ```text
/// log(px * py) = log(px) + log(py)
/// ```
///
/// The zero sentinel absorbs: any zero operand gives a zero result.
impl std::ops::Mul for LogOdds {
    type Output = Self;
    fn mul(self, other: Self) -> Self {
        match (self, other) {
            (LogOdds::Finite(x), LogOdds::Finite(y)) => LogOdds::Finite(x + y),
            _ => LogOdds::Zero,
        }
    }
}

impl std::ops::MulAssign for LogOdds {
    fn mul_assign(&mut self, other: Self) {
        *self = *self * other;
    }
}

impl std::iter::Product for LogOdds {
    fn product<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(LogOdds::one(), |a, b| a * b)
    }
}
impl<'a> std::iter::Product<&'a Self> for LogOdds {
    fn product<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.fold(LogOdds::one(), |a, b| a * *b)
    }
}

// display
impl std::fmt::Display for LogOdds {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            LogOdds::Zero => write!(f, "{{0}}"),
            LogOdds::Finite(l) => write!(f, "{}", l),
        }
    }
}
impl FromStr for LogOdds {
    type Err = std::num::ParseFloatError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "{0}" {
            Ok(LogOdds::Zero)
        } else {
            s.parse::<f64>().map(LogOdds::Finite)
        }
    }
}

/// for approx `assert_abs_diff_eq`
impl AbsDiffEq for LogOdds {
    type Epsilon = f64;

    fn default_epsilon() -> Self::Epsilon {
        f64::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        match (self, other) {
            (LogOdds::Zero, LogOdds::Zero) => true,
            (LogOdds::Finite(x), LogOdds::Finite(y)) => f64::abs_diff_eq(x, y, epsilon),
            _ => false,
        }
    }
}

// The derived PartialOrd puts Zero below every Finite value and orders
// finite values by their logs, which is the probability ordering.
impl Eq for LogOdds {}
impl Ord for LogOdds {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.partial_cmp(other).unwrap()
    }
}
