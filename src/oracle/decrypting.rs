// An oracle holding the private key, standing in for a real server.

use super::{check_length, conformity::is_pkcs_conforming, OracleError, OracleType, PaddingOracle};
use crate::rsa::{PublicKeyContext, RsaKeyPair};

use num_bigint::BigUint;

#[derive(Debug, Clone)]
pub struct DecryptingOracle {
    keys: RsaKeyPair,
    public_key: PublicKeyContext,
    oracle_type: OracleType,
    queries: u64,
}

impl DecryptingOracle {
    pub fn new(keys: RsaKeyPair, oracle_type: OracleType) -> Self {
        let public_key = keys.public_key();
        Self {
            keys,
            public_key,
            oracle_type,
            queries: 0,
        }
    }

    /// Decrypts `ciphertext` and applies the conformity predicate, without
    /// counting a query.
    pub fn decrypts_to_conforming(&self, ciphertext: &[u8]) -> bool {
        let m = self.keys.decrypt(&BigUint::from_bytes_be(ciphertext));
        let block = self.public_key.to_block(&m);
        is_pkcs_conforming(self.oracle_type, self.public_key.block_size, &block)
    }
}

impl PaddingOracle for DecryptingOracle {
    fn check_conformity(&mut self, msg: &[u8]) -> Result<bool, OracleError> {
        self.queries += 1;
        check_length(&self.public_key, msg)?;
        Ok(self.decrypts_to_conforming(msg))
    }

    fn query_count(&self) -> u64 {
        self.queries
    }

    fn oracle_type(&self) -> OracleType {
        self.oracle_type
    }

    fn public_key(&self) -> &PublicKeyContext {
        &self.public_key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::rsa::{generate_rsa_key_pair, pkcs1_pad};

    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn accepts_encrypted_padded_block_only() {
        let mut rng = StdRng::from_seed([5; 32]);
        let keys = generate_rsa_key_pair(512, &BigUint::from(65537u64), &mut rng);
        let mut oracle = DecryptingOracle::new(keys, OracleType::Fft);
        let key = oracle.public_key().clone();
        let block = pkcs1_pad(b"attack at dawn", key.block_size, &mut rng).unwrap();
        let ciphertext = key.to_block(&key.encrypt(&BigUint::from_bytes_be(&block)));
        let garbage = key.to_block(&key.encrypt(&BigUint::from(12345u64)));

        assert!(oracle.check_conformity(&ciphertext).unwrap());
        assert!(!oracle.check_conformity(&garbage).unwrap());
        assert_eq!(oracle.query_count(), 2);
    }
}
