// RSA keys, raw RSA and PKCS#1 v1.5 encryption padding.

use crate::prime::generate_prime;

use num_bigint::{BigUint, RandBigInt};
use num_integer::Integer;
use num_traits::One;
use rand::Rng;

/// Minimum number of non-zero padding bytes in an encryption block.
pub const MIN_PADDING_LEN: usize = 8;

/// The public half of an RSA key together with the constants the attack
/// derives from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKeyContext {
    pub n: BigUint,
    pub e: BigUint,
    /// Length of `n` in bytes, `k`.
    pub block_size: usize,
    /// `B = 2^(8(k-2))`
    pub b: BigUint,
    pub two_b: BigUint,
    pub three_b: BigUint,
}

impl PublicKeyContext {
    pub fn new(n: BigUint, e: BigUint) -> Self {
        let block_size = n.bits().div_ceil(8) as usize;
        let b = BigUint::one() << (8 * block_size.saturating_sub(2));
        let two_b = &b << 1;
        let three_b = &two_b + &b;
        Self {
            n,
            e,
            block_size,
            b,
            two_b,
            three_b,
        }
    }

    pub fn encrypt(&self, m: &BigUint) -> BigUint {
        m.modpow(&self.e, &self.n)
    }

    /// Serializes `value` as a `block_size` byte big-endian block.
    pub fn to_block(&self, value: &BigUint) -> Vec<u8> {
        to_fixed_width(value, self.block_size)
    }
}

#[derive(Debug, Clone)]
pub struct RsaKeyPair {
    pub public: BigUint,
    pub private: BigUint,
    pub n: BigUint,
}

impl RsaKeyPair {
    pub fn public_key(&self) -> PublicKeyContext {
        PublicKeyContext::new(self.n.clone(), self.public.clone())
    }

    pub fn decrypt(&self, c: &BigUint) -> BigUint {
        c.modpow(&self.private, &self.n)
    }
}

pub fn generate_rsa_key_pair(n_bits: u64, e: &BigUint, rng: &mut impl RandBigInt) -> RsaKeyPair {
    let one = BigUint::one();

    // Loop until we find primes such that gcd(e, totient) = 1.
    loop {
        // Key size refers to the size of n (which is p*q), so get primes each
        // with half as many bits as we need.
        let p = generate_prime(n_bits / 2, rng);
        let q = generate_prime(n_bits / 2, rng);
        if p == q {
            continue;
        }

        let n = &p * &q;
        let totient = (&p - &one) * (&q - &one);
        if !e.gcd(&totient).is_one() {
            continue;
        }

        if let Some(d) = e.modinv(&totient) {
            return RsaKeyPair {
                public: e.clone(),
                private: d,
                n,
            };
        }
    }
}

/// Big-endian bytes of `value`, left-padded with zeros to `width`. If the
/// value needs more bytes, only the low-order `width` bytes are kept.
pub fn to_fixed_width(value: &BigUint, width: usize) -> Vec<u8> {
    let bytes = value.to_bytes_be();
    if bytes.len() >= width {
        return bytes[bytes.len() - width..].to_vec();
    }
    let mut block = vec![0u8; width - bytes.len()];
    block.extend_from_slice(&bytes);
    block
}

/// Builds the encryption block `00 02 PS 00 data`, where `PS` is random and
/// non-zero and fills the block to `block_size` bytes.
pub fn pkcs1_pad(data: &[u8], block_size: usize, rng: &mut impl Rng) -> Result<Vec<u8>, String> {
    let max_data_len = block_size.saturating_sub(MIN_PADDING_LEN + 3);
    if data.len() > max_data_len {
        return Err(format!(
            "{} bytes of data do not fit a {} byte block (at most {})",
            data.len(),
            block_size,
            max_data_len
        ));
    }
    let padding_len = block_size - 3 - data.len();
    let mut block = Vec::with_capacity(block_size);
    block.extend([0x00, 0x02]);
    block.extend((0..padding_len).map(|_| rng.gen_range(1..=u8::MAX)));
    block.push(0x00);
    block.extend_from_slice(data);
    Ok(block)
}

/// Recovers the data from an encryption block, accepting the block with or
/// without its leading zero byte.
pub fn pkcs1_unpad(block: &[u8]) -> Result<Vec<u8>, String> {
    let block = block.strip_prefix(&[0x00]).unwrap_or(block);
    if block.first() != Some(&0x02) {
        return Err("block does not start with 0x02".to_string());
    }
    let separator = block[1..]
        .iter()
        .position(|&byte| byte == 0)
        .ok_or_else(|| "no zero byte separates padding from data".to_string())?;
    if separator < MIN_PADDING_LEN {
        return Err(format!("padding string too short: {separator} bytes"));
    }
    Ok(block[separator + 2..].to_vec())
}
