// Building the blocks sent to the oracle for a multiplier s or num/den.

use crate::fraction::ArithmeticError;
use crate::rsa::PublicKeyContext;

use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{One, Zero};

/// The block for multiplying the unknown plaintext by `s`: `base * s^e mod n`
/// for a ciphertext `base`, or `base * s mod n` when the oracle takes
/// plaintexts.
pub(crate) fn prepare_multiplied(
    key: &PublicKeyContext,
    base: &BigUint,
    s: &BigUint,
    plaintext_mode: bool,
) -> Vec<u8> {
    let value = if plaintext_mode {
        base * s % &key.n
    } else {
        base * s.modpow(&key.e, &key.n) % &key.n
    };
    key.to_block(&value)
}

/// The block for multiplying the unknown plaintext by `num/den`.
///
/// For a ciphertext this is `base * num^e * den^-e mod n`. For a plaintext
/// `base * num / den` is only meaningful when the division is exact;
/// otherwise `2B * 2B` is sent instead, whose low-order block bytes are all
/// zero so no oracle type accepts it.
pub(crate) fn prepare_msg(
    key: &PublicKeyContext,
    base: &BigUint,
    num: &BigUint,
    den: &BigUint,
    plaintext_mode: bool,
) -> Result<Vec<u8>, ArithmeticError> {
    if den.is_zero() {
        return Err(ArithmeticError::ZeroDenominator);
    }
    if den.is_one() {
        return Ok(prepare_multiplied(key, base, num, plaintext_mode));
    }

    let value = if plaintext_mode {
        let (quotient, remainder) = (base * num).div_rem(den);
        if remainder.is_zero() {
            quotient % &key.n
        } else {
            &key.two_b * &key.two_b
        }
    } else {
        let den_inverse = den.modinv(&key.n).ok_or(ArithmeticError::NotInvertible)?;
        let multiplier = num.modpow(&key.e, &key.n) * den_inverse.modpow(&key.e, &key.n);
        base * multiplier % &key.n
    };
    Ok(key.to_block(&value))
}
