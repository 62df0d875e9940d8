// An oracle queried with plaintexts directly, for exercising the attack
// without paying for RSA decryptions.

use super::{check_length, conformity::is_pkcs_conforming, OracleError, OracleType, PaddingOracle};
use crate::rsa::PublicKeyContext;

pub struct PlaintextOracle {
    key: PublicKeyContext,
    oracle_type: OracleType,
    queries: u64,
}

impl PlaintextOracle {
    pub fn new(key: PublicKeyContext, oracle_type: OracleType) -> Self {
        Self {
            key,
            oracle_type,
            queries: 0,
        }
    }
}

impl PaddingOracle for PlaintextOracle {
    fn check_conformity(&mut self, msg: &[u8]) -> Result<bool, OracleError> {
        self.queries += 1;
        check_length(&self.key, msg)?;
        Ok(is_pkcs_conforming(self.oracle_type, self.key.block_size, msg))
    }

    fn query_count(&self) -> u64 {
        self.queries
    }

    fn oracle_type(&self) -> OracleType {
        self.oracle_type
    }

    fn public_key(&self) -> &PublicKeyContext {
        &self.key
    }

    fn is_plaintext_oracle(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use num_bigint::BigUint;
    use num_traits::One;

    fn oracle() -> PlaintextOracle {
        let n = (BigUint::one() << 1023) + 1u32;
        PlaintextOracle::new(PublicKeyContext::new(n, BigUint::from(3u64)), OracleType::Jsse)
    }

    #[test]
    fn counts_every_query() {
        let mut oracle = oracle();
        let mut block = vec![0x01u8; 128];
        block[0] = 0x00;
        block[1] = 0x02;

        assert!(!oracle.check_conformity(&block).unwrap());
        block[126] = 0x00;
        assert!(oracle.check_conformity(&block).unwrap());
        assert!(oracle.check_conformity(&block[1..]).is_err());

        assert_eq!(oracle.query_count(), 3);
    }
}
