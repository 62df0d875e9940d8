// Candidate plaintext intervals and the operations that narrow them.

use crate::fraction::{ArithmeticError, Fraction};
use crate::numeric::ceil_div;
use crate::rsa::PublicKeyContext;

use num_bigint::BigUint;
use num_traits::Zero;

/// An inclusive range `[lower, upper]` of candidate plaintexts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interval {
    pub lower: BigUint,
    pub upper: BigUint,
}

impl Interval {
    pub fn new(lower: BigUint, upper: BigUint) -> Self {
        debug_assert!(lower <= upper, "interval bounds are reversed");
        Self { lower, upper }
    }

    pub fn width(&self) -> BigUint {
        &self.upper - &self.lower
    }

    pub fn is_point(&self) -> bool {
        self.lower == self.upper
    }

    pub fn contains(&self, value: &BigUint) -> bool {
        &self.lower <= value && value <= &self.upper
    }

    /// Shrinks the interval using trimming fractions.
    ///
    /// If `plaintext * upper_frac` conforms, the plaintext is at most
    /// `upper / upper_frac`; if `plaintext * lower_frac` conforms, it is at
    /// least `lower / lower_frac`. With an `alignment` (a known divisor of the
    /// plaintext) the bounds are rounded inwards to multiples of it. Each
    /// bound is only replaced when the new one is strictly tighter.
    pub fn apply_fractions(
        &self,
        lower_frac: Fraction,
        upper_frac: Fraction,
        alignment: Option<&BigUint>,
    ) -> Result<Interval, ArithmeticError> {
        if alignment.is_some_and(|a| a.is_zero()) {
            return Err(ArithmeticError::ZeroDenominator);
        }

        let mut new_upper = ceil_div(
            &(&self.upper * upper_frac.den()),
            &BigUint::from(upper_frac.num()),
        );
        let mut new_lower = &self.lower * lower_frac.den() / lower_frac.num();
        if let Some(alignment) = alignment {
            new_upper = &new_upper / alignment * alignment;
            new_lower = ceil_div(&new_lower, alignment) * alignment;
        }

        let upper = if new_upper < self.upper {
            new_upper
        } else {
            self.upper.clone()
        };
        let lower = if new_lower > self.lower {
            new_lower
        } else {
            self.lower.clone()
        };
        if lower > upper {
            return Err(ArithmeticError::EmptyInterval);
        }
        Ok(Interval { lower, upper })
    }
}

/// The disjoint intervals that may still contain the plaintext, kept sorted
/// by lower bound.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntervalSet {
    intervals: Vec<Interval>,
}

impl IntervalSet {
    pub fn new(initial: Interval) -> Self {
        Self {
            intervals: vec![initial],
        }
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Interval> {
        self.intervals.iter()
    }

    /// The only interval, if exactly one is left.
    pub fn single(&self) -> Option<&Interval> {
        match self.intervals.as_slice() {
            [interval] => Some(interval),
            _ => None,
        }
    }

    /// The plaintext, once a single one-element interval is left.
    pub fn solution(&self) -> Option<&BigUint> {
        self.single()
            .filter(|interval| interval.is_point())
            .map(|interval| &interval.lower)
    }

    pub fn total_width(&self) -> BigUint {
        self.intervals.iter().map(Interval::width).sum()
    }

    /// Inserts `interval`, merging it with every interval it overlaps or
    /// touches.
    pub fn insert(&mut self, interval: Interval) {
        let Interval {
            mut lower,
            mut upper,
        } = interval;
        self.intervals.retain(|existing| {
            let disjoint =
                upper.clone() + 1u32 < existing.lower || existing.upper.clone() + 1u32 < lower;
            if disjoint {
                return true;
            }
            if existing.lower < lower {
                lower = existing.lower.clone();
            }
            if existing.upper > upper {
                upper = existing.upper.clone();
            }
            false
        });
        let index = self
            .intervals
            .partition_point(|existing| existing.lower < lower);
        self.intervals.insert(index, Interval { lower, upper });
    }

    /// Bleichenbacher's step 3: every plaintext `m` left must satisfy
    /// `2B <= m*s - r*n <= 3B-1` for some wrap count `r`, which cuts each
    /// interval into the pieces compatible with the conforming multiplier `s`.
    pub fn narrow_with_multiplier(&self, s: &BigUint, key: &PublicKeyContext) -> IntervalSet {
        let n = &key.n;
        let mut narrowed = IntervalSet::default();
        for interval in &self.intervals {
            let (a, b) = (&interval.lower, &interval.upper);

            // ceil((a*s - 3B + 1) / n), clamped at zero.
            let a_s_plus_one = a * s + 1u32;
            let r_min = if a_s_plus_one > key.three_b {
                ceil_div(&(a_s_plus_one - &key.three_b), n)
            } else {
                BigUint::zero()
            };
            // floor((b*s - 2B) / n)
            let b_s = b * s;
            if b_s < key.two_b {
                continue;
            }
            let r_max = (b_s - &key.two_b) / n;

            let mut r = r_min;
            while r <= r_max {
                let r_n = &r * n;
                let lower = ceil_div(&(&key.two_b + &r_n), s).max(a.clone());
                let upper = ((&key.three_b - 1u32 + &r_n) / s).min(b.clone());
                if lower <= upper {
                    narrowed.insert(Interval::new(lower, upper));
                }
                r += 1u32;
            }
        }
        narrowed
    }
}
