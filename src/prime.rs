// Functions related to identification and generation of prime numbers.

use num_bigint::{BigUint, RandBigInt};
use num_integer::Integer;
use num_traits::{One, Zero};

const MILLER_RABIN_ROUNDS: u32 = 5;

const SMALL_ODD_PRIMES: [u32; 24] = [
    3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89, 97,
];

pub fn is_likely_prime<R: RandBigInt>(candidate_prime: &BigUint, miller_rabin_rng: &mut R) -> bool {
    if candidate_prime <= &BigUint::one() {
        return false;
    }
    let two = BigUint::from(2u64);
    if candidate_prime == &two {
        return true;
    }
    if candidate_prime.is_even() {
        return false;
    }

    for small_prime in SMALL_ODD_PRIMES {
        let x = BigUint::from(small_prime);
        if candidate_prime == &x {
            return true;
        }
        if (candidate_prime % &x).is_zero() {
            return false;
        }
    }

    miller_rabin(candidate_prime, MILLER_RABIN_ROUNDS, miller_rabin_rng)
}

/// Generates a random prime of exactly `n_bits` bits. The two top bits are
/// set, so the product of two such primes has exactly twice as many bits.
pub fn generate_prime<R: RandBigInt>(n_bits: u64, rng: &mut R) -> BigUint {
    loop {
        let mut candidate = rng.gen_biguint(n_bits);
        candidate.set_bit(n_bits - 1, true);
        candidate.set_bit(n_bits - 2, true);
        candidate.set_bit(0, true);
        if is_likely_prime(&candidate, rng) {
            return candidate;
        }
    }
}

fn miller_rabin<R: RandBigInt>(candidate_prime: &BigUint, n_rounds: u32, rng: &mut R) -> bool {
    let one = BigUint::one();
    let two = BigUint::from(2u64);
    let n_minus_one = candidate_prime - &one;

    let mut d = n_minus_one.clone();
    let mut r = 0;
    while d.is_even() {
        d >>= 1;
        r += 1;
    }
    'witness: for _ in 0..n_rounds {
        let a = rng.gen_biguint_range(&two, &(candidate_prime - &two));
        let mut x = a.modpow(&d, candidate_prime);
        if x == one || x == n_minus_one {
            continue;
        }
        for _ in 0..(r - 1) {
            x = x.modpow(&two, candidate_prime);
            if x == n_minus_one {
                continue 'witness;
            }
        }
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    use num_traits::Num;
    use rand::{rngs::StdRng, SeedableRng};
    use rstest::rstest;

    #[rstest]
    #[case(BigUint::from(2u64))]
    #[case(BigUint::from(37u64))]
    #[case(BigUint::from(7919u64))]
    #[case(BigUint::from_str_radix("E9C91EF2352925B46A49892CBE932BE1", 16).unwrap())]
    #[case(BigUint::from_str_radix(
            "ffffffffffffffffc90fdaa22168c234c4c6628b80dc1cd129024\
            e088a67cc74020bbea63b139b22514a08798e3404ddef9519b3cd\
            3a431b302b0a6df25f14374fe1356d6d51c245e485b576625e7ec\
            6f44c42e9a637ed6b0bff5cb6f406b7edee386bfb5a899fa5ae9f\
            24117c4b1fe649286651ece45b3dc2007cb8a163bf0598da48361\
            c55d39a69163fa8fd24cf5f83655d23dca3ad961c62f356208552\
            bb9ed529077096966d670c354e4abc9804f1746c08ca237327fff\
            fffffffffffff", 16).unwrap())]
    fn is_likely_prime_identifies_primes(#[case] prime: BigUint) {
        let mut rng = StdRng::from_seed([101; 32]);

        assert!(is_likely_prime(&prime, &mut rng));
    }

    #[rstest]
    #[case(BigUint::from(0u64))]
    #[case(BigUint::from(1u64))]
    #[case(BigUint::from(4u64))]
    #[case(BigUint::from(1024u64))]
    #[case(BigUint::from(1025u64))]
    #[case(BigUint::from(7919u64 * 7907u64))]
    fn is_likely_prime_identifies_non_primes(#[case] non_prime: BigUint) {
        let mut rng = StdRng::from_seed([101; 32]);

        assert!(!is_likely_prime(&non_prime, &mut rng));
    }

    #[test]
    fn generate_prime_has_requested_bit_length() {
        let mut rng = StdRng::from_seed([7; 32]);

        let prime = generate_prime(128, &mut rng);

        assert_eq!(prime.bits(), 128);
        assert!(is_likely_prime(&prime, &mut rng));
    }
}
