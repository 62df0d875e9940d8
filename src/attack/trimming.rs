// Crypto'12 trimming: shrinking the initial interval with fractions u/t
// before the first multiplier search.
//
// If `m * u/t` conforms for a plaintext `m`, then (with overwhelming
// probability) `t` divides `m` and `E0 <= m * u/t <= F0-1`, which bounds `m`
// from below for `u/t < 1` and from above for `u/t > 1`.

use super::{Attack, AttackConfig, AttackError};
use crate::fraction::Fraction;
use crate::numeric::{bounded_lcm, gcd, largest_divisor_under_bound};
use crate::oracle::PaddingOracle;

use num_bigint::BigUint;
use num_traits::ToPrimitive;
use tracing::{debug, info};

use std::collections::HashSet;

/// Cap on the lcm of discovered denominators before it is reduced to a
/// searchable divisor.
const LCM_GUARD: u64 = i32::MAX as u64;

/// The fractions and denominators trimming discovered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrimmingOutcome {
    pub lower: Fraction,
    pub upper: Fraction,
    pub denominators: Vec<u64>,
    /// lcm of `denominators`, a divisor of the plaintext.
    pub lcm: u64,
    /// Largest divisor of `lcm` small enough to search numerators over.
    pub lcm_capped: u64,
}

/// Generates the lower-bound trimmers `i/j < 1` worth asking about.
///
/// All fractions with small `i + j` come first, as small denominators divide
/// plaintexts most often. Fractions close to 1 with larger denominators then
/// fill up the quota of `config.num_trimmers / 2`. Every fraction is in
/// lowest terms, has `j < n_over_9b` and satisfies `i * (F0-1) > j * E0`, so
/// that some plaintext in `[E0, F0-1]` can still conform once multiplied.
pub fn generate_lower_trimmers(
    e0: &BigUint,
    f0_minus_one: &BigUint,
    n_over_9b: u64,
    config: &AttackConfig,
) -> Vec<Fraction> {
    let can_conform = |i: u64, j: u64| f0_minus_one * i > e0 * j;
    let quota = config.num_trimmers / 2;
    let width_limit = config.max_all_fraction_search.max(5);

    let mut trimmers = Vec::new();
    for k in 5..=width_limit {
        for i in 2..k - 1 {
            let j = k - i;
            if i < j && j < n_over_9b && can_conform(i, j) && gcd(i, j) == 1 {
                trimmers.extend(Fraction::new(i, j).ok());
            }
        }
    }

    let mut seen: HashSet<Fraction> = trimmers.iter().copied().collect();
    let first_den = width_limit / 2 + 1;
    let last_den = config.max_few_fraction_search.min(n_over_9b.saturating_sub(1));
    // Each pass over the denominators moves the numerators one step further
    // from 1; past `last_den` passes no fraction can conform any more.
    'depth: for k in 1..=last_den {
        if trimmers.len() >= quota {
            break;
        }
        for j in first_den..=last_den {
            let mut i = j.saturating_sub(k);
            while i > 1 && can_conform(i, j) {
                if gcd(i, j) == 1 {
                    if let Ok(trimmer) = Fraction::new(i, j) {
                        if seen.insert(trimmer) {
                            trimmers.push(trimmer);
                            break;
                        }
                    }
                }
                i -= 1;
                if trimmers.len() >= quota {
                    break 'depth;
                }
            }
            if trimmers.len() >= quota {
                break 'depth;
            }
        }
    }
    debug!(count = trimmers.len(), "generated trimmers");
    trimmers
}

fn ratio_floor(value: u64, num: &BigUint, den: &BigUint) -> u64 {
    (BigUint::from(value) * num / den)
        .to_u64()
        .unwrap_or(u64::MAX)
}

impl<O: PaddingOracle> Attack<'_, O> {
    /// Asks the oracle about every trimmer and its reciprocal, then searches
    /// numerators over the capped lcm of the denominators that conformed.
    pub(super) fn trim(&mut self, c0: &BigUint) -> Result<TrimmingOutcome, AttackError> {
        info!("Step 1b: trimming");
        let n_over_9b = (&self.key.n / (&self.key.b * 9u32))
            .to_u64()
            .unwrap_or(u64::MAX);
        let (e0, f0_minus_one) = (self.e0.clone(), self.f0_minus_one.clone());

        let trimmers_lower = generate_lower_trimmers(&e0, &f0_minus_one, n_over_9b, &self.config);
        let trimmers_upper: Vec<Fraction> =
            trimmers_lower.iter().map(Fraction::reciprocal).collect();

        let mut denominators: Vec<u64> = Vec::new();
        let mut used: HashSet<Fraction> = HashSet::new();
        let mut lower = Fraction::ONE;
        let mut upper = Fraction::ONE;

        for trimmer in trimmers_lower {
            if denominators.contains(&trimmer.den()) {
                continue;
            }
            if self.ask_fraction(c0, trimmer)? {
                debug!(%trimmer, "conforming lower trimmer");
                denominators.push(trimmer.den());
                lower = lower.update_bound(trimmer);
            }
            used.insert(trimmer);
        }
        debug!(%lower, "fraction for lower bound");

        for trimmer in trimmers_upper {
            if denominators.contains(&trimmer.den()) {
                continue;
            }
            if self.ask_fraction(c0, trimmer)? {
                debug!(%trimmer, "conforming upper trimmer");
                denominators.push(trimmer.den());
                upper = upper.update_bound(trimmer);
            }
            used.insert(trimmer);
        }
        debug!(%upper, "fraction for upper bound");

        let lcm = bounded_lcm(&denominators, LCM_GUARD);
        let lcm_capped = if denominators.is_empty() {
            1
        } else {
            largest_divisor_under_bound(lcm, self.config.max_denominators)
        };
        debug!(lcm, lcm_capped, "lcm of denominators");

        if lcm_capped > 1 {
            let den = lcm_capped;

            // Smallest numerator first: the first hit is the best bound.
            let i_min = ratio_floor(den, &e0, &f0_minus_one);
            for i in i_min.max(1)..den {
                let Ok(candidate) = Fraction::new(i, den) else {
                    continue;
                };
                if candidate >= lower || used.contains(&candidate) {
                    continue;
                }
                if self.ask_fraction(c0, candidate)? {
                    debug!(%candidate, "conforming lower numerator");
                    lower = lower.update_bound(candidate);
                    break;
                }
            }

            // Largest numerator first, for the same reason.
            let i_max = ratio_floor(den, &f0_minus_one, &e0);
            for i in (den + 1..=i_max).rev() {
                let Ok(candidate) = Fraction::new(i, den) else {
                    continue;
                };
                if candidate <= upper || used.contains(&candidate) {
                    continue;
                }
                if self.ask_fraction(c0, candidate)? {
                    debug!(%candidate, "conforming upper numerator");
                    upper = upper.update_bound(candidate);
                    break;
                }
            }
        }

        info!(%lower, %upper, lcm, "trimming done");
        Ok(TrimmingOutcome {
            lower,
            upper,
            denominators,
            lcm,
            lcm_capped,
        })
    }
}
