// Exact integer helpers: ceiling division, gcd and a capped lcm.

use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::Zero;

/// Returns ⌈a / b⌉ for a non-zero `b`.
pub fn ceil_div(a: &BigUint, b: &BigUint) -> BigUint {
    let (quotient, remainder) = a.div_rem(b);
    if remainder.is_zero() {
        quotient
    } else {
        quotient + 1u32
    }
}

pub fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a
}

/// Folds the lcm across `values`, returning the last accumulated value as soon
/// as the next step would overflow or exceed `cap`. Denominators that would
/// blow up the lcm are dropped rather than failing.
pub fn bounded_lcm(values: &[u64], cap: u64) -> u64 {
    let mut lcm = 1u64;
    for &value in values {
        if value == 0 {
            return lcm;
        }
        let next = match (lcm / gcd(lcm, value)).checked_mul(value) {
            Some(next) if next <= cap && next >= lcm => next,
            _ => return lcm,
        };
        lcm = next;
    }
    lcm
}

/// Returns `lcm` itself if it is at most `cap`, otherwise the largest divisor
/// of `lcm` that does not exceed `cap` (1 if there is none).
pub fn largest_divisor_under_bound(lcm: u64, cap: u64) -> u64 {
    if lcm <= cap {
        return lcm;
    }
    (2..=(lcm / 2).min(cap))
        .rev()
        .find(|d| lcm % d == 0)
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[rstest]
    #[case(6, 3, 2)]
    #[case(7, 3, 3)]
    #[case(1, 5, 1)]
    #[case(0, 5, 0)]
    #[case(100, 1, 100)]
    fn ceil_div_rounds_up(#[case] a: u64, #[case] b: u64, #[case] expected: u64) {
        let result = ceil_div(&BigUint::from(a), &BigUint::from(b));

        assert_eq!(result, BigUint::from(expected));
    }

    #[test]
    fn ceil_div_brackets_the_quotient() {
        for a in 1..200u64 {
            for b in 1..40u64 {
                let (a_big, b_big) = (BigUint::from(a), BigUint::from(b));
                let q = ceil_div(&a_big, &b_big);

                assert!(&q * &b_big >= a_big);
                assert!((&q - 1u32) * &b_big < a_big);
            }
        }
    }

    #[rstest]
    #[case(12, 18, 6)]
    #[case(17, 5, 1)]
    #[case(9, 0, 9)]
    #[case(0, 9, 9)]
    fn gcd_matches_euclid(#[case] a: u64, #[case] b: u64, #[case] expected: u64) {
        assert_eq!(gcd(a, b), expected);
    }

    #[rstest]
    #[case(&[], 100, 1)]
    #[case(&[4, 6], 100, 12)]
    #[case(&[3, 5, 7], 100, 15)]
    #[case(&[3, 5, 7], 105, 105)]
    #[case(&[2, 3, 4, 5], 1000, 60)]
    #[case(&[1000], 100, 1)]
    fn bounded_lcm_stops_at_cap(#[case] values: &[u64], #[case] cap: u64, #[case] expected: u64) {
        assert_eq!(bounded_lcm(values, cap), expected);
    }

    #[test]
    fn bounded_lcm_survives_overflow() {
        let values = [u64::MAX - 1, u64::MAX - 2];

        assert_eq!(bounded_lcm(&values, u64::MAX), u64::MAX - 1);
    }

    #[test]
    fn bounded_lcm_never_exceeds_cap() {
        let values: Vec<u64> = (2..60).collect();
        for cap in [1, 10, 100, 5000, 1_000_000, u64::MAX] {
            assert!(bounded_lcm(&values, cap) <= cap);
        }
    }

    #[rstest]
    #[case(60, 100, 60)]
    #[case(60, 25, 20)]
    #[case(97, 50, 1)]
    #[case(7 * 11 * 13, 100, 91)]
    fn largest_divisor_under_bound_finds_divisor(
        #[case] lcm: u64,
        #[case] cap: u64,
        #[case] expected: u64,
    ) {
        assert_eq!(largest_divisor_under_bound(lcm, cap), expected);
    }
}
