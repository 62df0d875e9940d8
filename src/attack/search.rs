// Step 2: looking for the next multiplier s that makes m*s conform.

use super::{Attack, AttackError};
use crate::interval::Interval;
use crate::numeric::ceil_div;
use crate::oracle::PaddingOracle;

use num_bigint::BigUint;
use num_traits::One;
use tracing::{debug, info};

impl<O: PaddingOracle> Attack<'_, O> {
    /// Step 2a with skipping holes: for `m` in `[a, b]`, `m*s` can only land
    /// in `[2B, 3B)` after wrapping `j` times if
    /// `(2B + jn)/b <= s <= (3B + jn)/a`, so only those windows are searched.
    pub(super) fn search_skipping_holes(
        &mut self,
        c0: &BigUint,
        interval: &Interval,
    ) -> Result<BigUint, AttackError> {
        info!("Step 2a: starting the search");
        let n = self.key.n.clone();
        let mut j = BigUint::one();
        loop {
            let jn = &j * &n;
            let min_s = ceil_div(&(&self.key.two_b + &jn), &interval.upper);
            let max_s = (&self.key.three_b + &jn) / &interval.lower;

            let mut s = min_s;
            while s <= max_s {
                if self.ask_multiplier(c0, &s)? {
                    debug!(%s, %j, "found s1");
                    return Ok(s);
                }
                s += 1u32;
            }
            j += 1u32;
        }
    }

    /// Step 2b: with several intervals left, search upwards from the last
    /// multiplier.
    pub(super) fn search_linear(
        &mut self,
        c0: &BigUint,
        previous_s: &BigUint,
    ) -> Result<BigUint, AttackError> {
        info!("Step 2b: searching with more than one interval left");
        let mut s = previous_s + 1u32;
        while !self.ask_multiplier(c0, &s)? {
            s += 1u32;
        }
        Ok(s)
    }

    /// Step 2c: with one interval `[a, b]` left, pick wrap counts
    /// `r >= 2(b*s - 2B)/n` and search `(2B + rn)/b <= s <= (3B + rn)/a` for
    /// each, which roughly halves the interval per conforming answer.
    pub(super) fn search_single_interval(
        &mut self,
        c0: &BigUint,
        interval: &Interval,
        previous_s: &BigUint,
    ) -> Result<BigUint, AttackError> {
        debug!("Step 2c: searching with one interval left");
        let n = self.key.n.clone();
        let (a, b) = (&interval.lower, &interval.upper);

        let b_s = b * previous_s;
        let mut r = if b_s > self.key.two_b {
            ceil_div(&((b_s - &self.key.two_b) * 2u32), &n)
        } else {
            BigUint::default()
        };
        loop {
            let rn = &r * &n;
            let mut s = ceil_div(&(&self.key.two_b + &rn), b);
            let max_s = (&self.key.three_b + &rn) / a;
            while s <= max_s {
                if self.ask_multiplier(c0, &s)? {
                    return Ok(s);
                }
                s += 1u32;
            }
            r += 1u32;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::attack::AttackConfig;
    use crate::oracle::{OracleType, PlaintextOracle};
    use crate::rsa::{pkcs1_pad, PublicKeyContext};

    use rand::{rngs::StdRng, SeedableRng};

    fn key() -> PublicKeyContext {
        let n = (BigUint::from(0xe7u32) << 248) + 0x8765_4321u32;
        PublicKeyContext::new(n, BigUint::from(65537u64))
    }

    fn conforms(key: &PublicKeyContext, m: &BigUint, s: &BigUint) -> bool {
        let product = m * s % &key.n;
        key.two_b <= product && product < key.three_b
    }

    fn plaintext(key: &PublicKeyContext, seed: u8) -> BigUint {
        let mut rng = StdRng::from_seed([seed; 32]);
        BigUint::from_bytes_be(&pkcs1_pad(&[0x11; 16], key.block_size, &mut rng).unwrap())
    }

    #[test]
    fn skipping_holes_finds_first_conforming_multiplier() {
        let key = key();
        let m = plaintext(&key, 1);
        let mut oracle = PlaintextOracle::new(key.clone(), OracleType::Ttt);
        let mut attack = Attack::new(&mut oracle, AttackConfig::default());
        let interval = Interval::new(key.two_b.clone(), &key.three_b - 1u32);

        let s = attack.search_skipping_holes(&m, &interval).unwrap();

        assert!(conforms(&key, &m, &s));
        let first_candidate = ceil_div(&(&key.two_b + &key.n), &interval.upper);
        let mut candidate = first_candidate;
        while candidate < s {
            assert!(!conforms(&key, &m, &candidate));
            candidate += 1u32;
        }
    }

    #[test]
    fn single_interval_search_finds_conforming_multiplier() {
        let key = key();
        let m = plaintext(&key, 2);
        let mut oracle = PlaintextOracle::new(key.clone(), OracleType::Ttt);
        let mut attack = Attack::new(&mut oracle, AttackConfig::default());
        let interval = Interval::new(&m - 1000u32, &m + 1000u32);

        let s = attack
            .search_single_interval(&m, &interval, &BigUint::from(100_000u32))
            .unwrap();

        assert!(conforms(&key, &m, &s));
        assert!(s > BigUint::from(100_000u32));
    }

    #[test]
    fn linear_search_starts_after_previous_multiplier() {
        let key = key();
        let m = plaintext(&key, 3);
        let mut oracle = PlaintextOracle::new(key.clone(), OracleType::Ttt);
        let mut attack = Attack::new(&mut oracle, AttackConfig::default());
        let previous = BigUint::from(5000u32);

        let s = attack.search_linear(&m, &previous).unwrap();

        assert!(conforms(&key, &m, &s));
        assert!(s > previous);
        let queries = oracle.query_count();
        assert_eq!(BigUint::from(queries), &s - 5000u32);
    }
}
