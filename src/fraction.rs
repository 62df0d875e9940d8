// Rational multipliers (num/den) and the best-bound update used while trimming.

use crate::numeric::gcd;

use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticError {
    ZeroNumerator,
    ZeroDenominator,
    EmptyInterval,
    /// A denominator shares a factor with the modulus.
    NotInvertible,
}

impl fmt::Display for ArithmeticError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroNumerator => write!(f, "fraction has a zero numerator"),
            Self::ZeroDenominator => write!(f, "fraction has a zero denominator"),
            Self::EmptyInterval => write!(f, "bounds cross, leaving an empty interval"),
            Self::NotInvertible => write!(f, "denominator is not invertible modulo n"),
        }
    }
}

impl std::error::Error for ArithmeticError {}

/// A positive fraction kept in lowest terms, so equal ratios compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fraction {
    num: u64,
    den: u64,
}

impl Fraction {
    /// `1/1`, the "no bound discovered yet" sentinel.
    pub const ONE: Fraction = Fraction { num: 1, den: 1 };

    pub fn new(num: u64, den: u64) -> Result<Self, ArithmeticError> {
        if den == 0 {
            return Err(ArithmeticError::ZeroDenominator);
        }
        if num == 0 {
            return Err(ArithmeticError::ZeroNumerator);
        }
        let g = gcd(num, den);
        Ok(Self {
            num: num / g,
            den: den / g,
        })
    }

    pub fn num(&self) -> u64 {
        self.num
    }

    pub fn den(&self) -> u64 {
        self.den
    }

    pub fn is_one(&self) -> bool {
        self.num == self.den
    }

    pub fn reciprocal(&self) -> Self {
        Self {
            num: self.den,
            den: self.num,
        }
    }

    /// Keeps the tighter of `self` and `candidate`.
    ///
    /// A candidate above 1 is an upper-bound trimmer: a larger ratio means a
    /// smaller bound on the plaintext, so the larger of two ratios above 1
    /// wins. A candidate below 1 is a lower-bound trimmer and the smaller of
    /// two ratios below 1 wins. A sentinel `1/1` is replaced unconditionally
    /// and a candidate on the other side of 1 never replaces a real bound.
    pub fn update_bound(self, candidate: Fraction) -> Fraction {
        if self.is_one() {
            return candidate;
        }
        match (candidate.cmp(&Self::ONE), self.cmp(&Self::ONE)) {
            (Ordering::Greater, Ordering::Greater) if candidate > self => candidate,
            (Ordering::Less, Ordering::Less) if candidate < self => candidate,
            _ => self,
        }
    }
}

impl Ord for Fraction {
    fn cmp(&self, other: &Self) -> Ordering {
        // a/b vs c/d  <=>  a*d vs c*b, exact in u128.
        let lhs = self.num as u128 * other.den as u128;
        let rhs = other.num as u128 * self.den as u128;
        lhs.cmp(&rhs)
    }
}

impl PartialOrd for Fraction {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}
