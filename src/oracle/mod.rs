// PKCS#1 v1.5 padding oracles.
pub mod conformity;
pub mod decrypting;
pub mod plaintext;
pub mod probe;
pub mod remote;

pub use conformity::is_pkcs_conforming;
pub use decrypting::DecryptingOracle;
pub use plaintext::PlaintextOracle;
pub use probe::classify_oracle;
pub use remote::RemoteOracle;

use crate::rsa::PublicKeyContext;

use num_bigint::BigUint;
use num_traits::One;

use std::fmt;
use std::str::FromStr;

/// Strictness of a padding oracle.
///
/// The Crypto'12 names read as three flags: whether a block with no zero
/// terminator is accepted, whether a zero inside the first eight padding
/// bytes is accepted and whether data of any length is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OracleType {
    Ttt,
    Tft,
    Ftt,
    Fft,
    Fff,
    /// Java's JSSE TLS implementation.
    Jsse,
    /// XML Encryption, where the data block is an AES key.
    XmlEnc,
    /// GnuTLS, where the data block is a TLS premaster secret.
    GnuTls,
}

impl OracleType {
    pub const ALL: [OracleType; 8] = [
        OracleType::Ttt,
        OracleType::Tft,
        OracleType::Ftt,
        OracleType::Fft,
        OracleType::Fff,
        OracleType::Jsse,
        OracleType::XmlEnc,
        OracleType::GnuTls,
    ];

    /// The oracle may accept blocks with no zero byte after the padding.
    pub fn noterm(&self) -> bool {
        matches!(self, Self::Ttt | Self::Tft)
    }

    /// The oracle may accept blocks with a zero byte in the first eight
    /// padding bytes.
    pub fn shortpad(&self) -> bool {
        matches!(self, Self::Ttt | Self::Ftt | Self::XmlEnc | Self::GnuTls)
    }

    /// The tightest bounds `[E0, F0-1]` every block accepted by this oracle
    /// type lies in.
    pub fn initial_bounds(&self, key: &PublicKeyContext) -> (BigUint, BigUint) {
        let k = key.block_size;
        let byte_weight = |j: usize| BigUint::one() << (8 * j);

        let mut e0 = key.two_b.clone();
        if !self.shortpad() {
            for j in k.saturating_sub(10)..=k.saturating_sub(3) {
                e0 += byte_weight(j);
            }
        }

        let f0_minus_one = if self.noterm() {
            &key.three_b - 1u32
        } else {
            let mut f = key.two_b.clone();
            for j in 1..=k.saturating_sub(3) {
                f += byte_weight(j) * 255u32;
            }
            f
        };
        (e0, f0_minus_one)
    }

    /// Maps probe answers to one of the Crypto'12 types.
    pub fn from_flags(noterm: bool, shortpad: bool, any_length: bool) -> Option<Self> {
        match (noterm, shortpad, any_length) {
            (true, true, true) => Some(Self::Ttt),
            (true, false, true) => Some(Self::Tft),
            (false, true, true) => Some(Self::Ftt),
            (false, false, true) => Some(Self::Fft),
            (false, false, false) => Some(Self::Fff),
            _ => None,
        }
    }
}

impl fmt::Display for OracleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ttt => "TTT",
            Self::Tft => "TFT",
            Self::Ftt => "FTT",
            Self::Fft => "FFT",
            Self::Fff => "FFF",
            Self::Jsse => "JSSE",
            Self::XmlEnc => "XMLENC",
            Self::GnuTls => "GNU_TLS",
        };
        write!(f, "{name}")
    }
}

impl FromStr for OracleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown oracle type '{s}'"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    /// The oracle could not be reached.
    Communication(String),
    /// The oracle answered with something other than a yes or no.
    Protocol(String),
    InvalidLength { expected: usize, actual: usize },
}

impl fmt::Display for OracleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Communication(msg) => write!(f, "oracle communication failed: {msg}"),
            Self::Protocol(msg) => write!(f, "unexpected oracle answer: {msg}"),
            Self::InvalidLength { expected, actual } => write!(
                f,
                "oracle query has {actual} bytes, expected {expected}"
            ),
        }
    }
}

impl std::error::Error for OracleError {}

/// Anything that answers whether a ciphertext decrypts to a PKCS#1 v1.5
/// conforming block.
pub trait PaddingOracle {
    /// Asks the oracle about one `block_size` byte query. Every call counts
    /// as exactly one query, whatever the outcome.
    fn check_conformity(&mut self, msg: &[u8]) -> Result<bool, OracleError>;

    fn query_count(&self) -> u64;

    fn oracle_type(&self) -> OracleType;

    fn public_key(&self) -> &PublicKeyContext;

    fn block_size(&self) -> usize {
        self.public_key().block_size
    }

    /// A plaintext oracle is queried with plaintexts directly rather than with
    /// ciphertexts.
    fn is_plaintext_oracle(&self) -> bool {
        false
    }
}

impl<O: PaddingOracle + ?Sized> PaddingOracle for &mut O {
    fn check_conformity(&mut self, msg: &[u8]) -> Result<bool, OracleError> {
        (**self).check_conformity(msg)
    }

    fn query_count(&self) -> u64 {
        (**self).query_count()
    }

    fn oracle_type(&self) -> OracleType {
        (**self).oracle_type()
    }

    fn public_key(&self) -> &PublicKeyContext {
        (**self).public_key()
    }

    fn block_size(&self) -> usize {
        (**self).block_size()
    }

    fn is_plaintext_oracle(&self) -> bool {
        (**self).is_plaintext_oracle()
    }
}

pub(crate) fn check_length(key: &PublicKeyContext, msg: &[u8]) -> Result<(), OracleError> {
    if msg.len() != key.block_size {
        return Err(OracleError::InvalidLength {
            expected: key.block_size,
            actual: msg.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    fn key_with_block_size(block_size: usize) -> PublicKeyContext {
        let n = (BigUint::one() << (8 * block_size - 1)) + 1u32;
        PublicKeyContext::new(n, BigUint::from(3u64))
    }

    #[rstest]
    #[case(OracleType::Ttt, true, true)]
    #[case(OracleType::Tft, true, false)]
    #[case(OracleType::Ftt, false, true)]
    #[case(OracleType::Fft, false, false)]
    #[case(OracleType::Fff, false, false)]
    #[case(OracleType::Jsse, false, false)]
    #[case(OracleType::XmlEnc, false, true)]
    #[case(OracleType::GnuTls, false, true)]
    fn oracle_type_flags(#[case] t: OracleType, #[case] noterm: bool, #[case] shortpad: bool) {
        assert_eq!(t.noterm(), noterm);
        assert_eq!(t.shortpad(), shortpad);
    }

    #[test]
    fn initial_bounds_of_lenient_oracle_span_conforming_range() {
        let key = key_with_block_size(64);

        let (e0, f0_minus_one) = OracleType::Ttt.initial_bounds(&key);

        assert_eq!(e0, key.two_b);
        assert_eq!(f0_minus_one, &key.three_b - 1u32);
    }

    #[test]
    fn initial_bounds_of_strict_oracle_match_extreme_blocks() {
        let key = key_with_block_size(64);
        // Smallest block with eight non-zero padding bytes.
        let mut smallest = vec![0u8; 64];
        smallest[1] = 0x02;
        smallest[2..10].fill(0x01);
        // Largest block with a zero byte somewhere after the padding.
        let mut largest = vec![0xffu8; 64];
        largest[0] = 0x00;
        largest[1] = 0x02;
        largest[63] = 0x00;

        let (e0, f0_minus_one) = OracleType::Fft.initial_bounds(&key);

        assert_eq!(e0, BigUint::from_bytes_be(&smallest));
        assert_eq!(f0_minus_one, BigUint::from_bytes_be(&largest));
        assert!(e0 > key.two_b);
        assert!(f0_minus_one < key.three_b);
    }

    #[test]
    fn oracle_type_parses_its_display_name() {
        for t in OracleType::ALL {
            assert_eq!(t.to_string().parse::<OracleType>(), Ok(t));
        }
        assert_eq!("gnu_tls".parse::<OracleType>(), Ok(OracleType::GnuTls));
        assert!("TTF".parse::<OracleType>().is_err());
    }

    #[rstest]
    #[case((true, true, true), Some(OracleType::Ttt))]
    #[case((false, false, false), Some(OracleType::Fff))]
    #[case((true, true, false), None)]
    fn from_flags_maps_probe_answers(
        #[case] flags: (bool, bool, bool),
        #[case] expected: Option<OracleType>,
    ) {
        assert_eq!(OracleType::from_flags(flags.0, flags.1, flags.2), expected);
    }
}
