// Working out which Crypto'12 type an unknown oracle is.

use super::{OracleError, OracleType, PaddingOracle};

use num_bigint::BigUint;
use tracing::{debug, info};

const PADDING_BYTE: u8 = 0xa5;
const DATA_BYTE: u8 = 0x3c;
const AES_128_KEY_LEN: usize = 16;
const PREMASTER_SECRET_LEN: usize = 48;

/// Smallest block that fits eight padding bytes and a premaster secret.
const MIN_PROBE_BLOCK_SIZE: usize = 3 + 8 + PREMASTER_SECRET_LEN;

/// `00 02 PS 00 data` with fixed non-zero padding and data bytes.
fn probe_block(block_size: usize, data_len: usize) -> Vec<u8> {
    let separator = block_size - data_len - 1;
    let mut block = vec![PADDING_BYTE; block_size];
    block[0] = 0x00;
    block[1] = 0x02;
    block[separator] = 0x00;
    block[separator + 1..].fill(DATA_BYTE);
    block
}

/// Sends `block` to the oracle, encrypting it first unless the oracle takes
/// plaintexts.
fn ask(oracle: &mut impl PaddingOracle, block: &[u8]) -> Result<bool, OracleError> {
    let query = if oracle.is_plaintext_oracle() {
        block.to_vec()
    } else {
        let key = oracle.public_key();
        key.to_block(&key.encrypt(&BigUint::from_bytes_be(block)))
    };
    oracle.check_conformity(&query)
}

/// Classifies `oracle` as TTT, TFT, FTT, FFT or FFF from its answers to four
/// probes: a valid block carrying an AES-128 key, the same block with its
/// zero terminator removed, the same block with a zero in the padding and a
/// valid block carrying a premaster secret.
pub fn classify_oracle(oracle: &mut impl PaddingOracle) -> Result<OracleType, OracleError> {
    let block_size = oracle.block_size();
    if block_size < MIN_PROBE_BLOCK_SIZE {
        return Err(OracleError::InvalidLength {
            expected: MIN_PROBE_BLOCK_SIZE,
            actual: block_size,
        });
    }

    let valid = probe_block(block_size, AES_128_KEY_LEN);
    if !ask(oracle, &valid)? {
        return Err(OracleError::Protocol(
            "oracle rejects a correctly padded block".to_string(),
        ));
    }

    let mut unterminated = valid.clone();
    unterminated[block_size - AES_128_KEY_LEN - 1] = PADDING_BYTE;
    let noterm = ask(oracle, &unterminated)?;

    let mut short_padding = valid;
    short_padding[4] = 0x00;
    let shortpad = ask(oracle, &short_padding)?;

    let any_length = ask(oracle, &probe_block(block_size, PREMASTER_SECRET_LEN))?;
    debug!(noterm, shortpad, any_length, "oracle probe answers");

    let oracle_type = OracleType::from_flags(noterm, shortpad, any_length).ok_or_else(|| {
        OracleError::Protocol(format!(
            "inconsistent probe answers: noterm={noterm}, shortpad={shortpad}, any_length={any_length}"
        ))
    })?;
    info!(%oracle_type, "classified oracle");
    Ok(oracle_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::oracle::{DecryptingOracle, PlaintextOracle};
    use crate::rsa::{generate_rsa_key_pair, PublicKeyContext};

    use num_traits::One;
    use rand::{rngs::StdRng, SeedableRng};
    use rstest::rstest;

    fn key(block_size: usize) -> PublicKeyContext {
        let n = (BigUint::one() << (8 * block_size - 1)) + 1u32;
        PublicKeyContext::new(n, BigUint::from(65537u64))
    }

    #[rstest]
    #[case(OracleType::Ttt)]
    #[case(OracleType::Tft)]
    #[case(OracleType::Ftt)]
    #[case(OracleType::Fft)]
    #[case(OracleType::Fff)]
    fn classifies_plaintext_oracle(#[case] oracle_type: OracleType) {
        let mut oracle = PlaintextOracle::new(key(128), oracle_type);

        assert_eq!(classify_oracle(&mut oracle), Ok(oracle_type));
        assert_eq!(oracle.query_count(), 4);
    }

    #[test]
    fn classifies_decrypting_oracle() {
        let mut rng = StdRng::from_seed([9; 32]);
        let keys = generate_rsa_key_pair(512, &BigUint::from(65537u64), &mut rng);
        let mut oracle = DecryptingOracle::new(keys, OracleType::Tft);

        assert_eq!(classify_oracle(&mut oracle), Ok(OracleType::Tft));
    }

    #[test]
    fn rejects_oracle_accepting_nothing() {
        // A GnuTLS oracle only takes premaster secrets, so the AES key probe
        // fails.
        let mut oracle = PlaintextOracle::new(key(128), OracleType::GnuTls);

        assert!(matches!(
            classify_oracle(&mut oracle),
            Err(OracleError::Protocol(_))
        ));
    }

    #[test]
    fn rejects_small_blocks() {
        let mut oracle = PlaintextOracle::new(key(32), OracleType::Ttt);

        assert!(matches!(
            classify_oracle(&mut oracle),
            Err(OracleError::InvalidLength { .. })
        ));
        assert_eq!(oracle.query_count(), 0);
    }
}
