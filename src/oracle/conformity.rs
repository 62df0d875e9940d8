// The reference conformity predicate each oracle type implements.

use super::OracleType;
use crate::rsa::MIN_PADDING_LEN;

/// Data lengths an XML Encryption oracle accepts (AES-128/192/256 keys).
const XMLENC_KEY_LENGTHS: [usize; 3] = [16, 24, 32];
const AES_128_KEY_LEN: usize = 16;
const PREMASTER_SECRET_LEN: usize = 48;
/// JSSE pads the premaster secret with a further 80 bytes before checking.
const JSSE_TRAILING_LEN: usize = PREMASTER_SECRET_LEN + 80;

/// Decides whether the decrypted `block` is accepted by an oracle of type
/// `oracle_type` for a `block_size` byte modulus.
///
/// One leading zero byte is stripped; what is left must be `block_size - 1`
/// bytes long and start with `0x02`.
pub fn is_pkcs_conforming(oracle_type: OracleType, block_size: usize, block: &[u8]) -> bool {
    let msg = block.strip_prefix(&[0x00]).unwrap_or(block);
    if msg.len() != block_size.saturating_sub(1) || msg.first() != Some(&0x02) {
        return false;
    }

    match oracle_type {
        OracleType::Ttt => true,
        OracleType::Ftt => has_terminator(msg),
        OracleType::Tft => has_full_padding(msg),
        OracleType::Fft => has_terminator(msg) && has_full_padding(msg),
        OracleType::Fff => {
            has_terminator(msg)
                && has_full_padding(msg)
                && data_len(msg) == Some(AES_128_KEY_LEN)
        }
        OracleType::Jsse => is_jsse_conforming(msg),
        OracleType::XmlEnc => data_len(msg).is_some_and(|len| XMLENC_KEY_LENGTHS.contains(&len)),
        OracleType::GnuTls => data_len(msg) == Some(PREMASTER_SECRET_LEN),
    }
}

fn contains_zero(msg: &[u8], from: usize, to: usize) -> bool {
    msg.get(from..to).is_some_and(|bytes| bytes.contains(&0))
}

/// A zero byte follows the eight mandatory padding bytes.
fn has_terminator(msg: &[u8]) -> bool {
    contains_zero(msg, MIN_PADDING_LEN + 1, msg.len())
}

/// None of the eight mandatory padding bytes is zero.
fn has_full_padding(msg: &[u8]) -> bool {
    msg.len() > MIN_PADDING_LEN && !contains_zero(msg, 1, MIN_PADDING_LEN + 1)
}

/// Length of the data after the first zero byte following `0x02`.
fn data_len(msg: &[u8]) -> Option<usize> {
    let separator = msg.iter().skip(1).position(|&b| b == 0)? + 1;
    Some(msg.len() - separator - 1)
}

fn is_jsse_conforming(msg: &[u8]) -> bool {
    if !has_full_padding(msg) {
        return false;
    }
    let len = msg.len();
    if len >= 2 && msg[len - 2] == 0x00 && !contains_zero(msg, MIN_PADDING_LEN + 2, len - 2) {
        return true;
    }
    // A zero before the premaster secret makes JSSE fail with an alert of its
    // own.
    len > JSSE_TRAILING_LEN
        && contains_zero(msg, MIN_PADDING_LEN + 1, len - 1 - JSSE_TRAILING_LEN)
}
