use super::{CIPHERTEXT_PARAM, ORACLE_PATH};
use crate::hex::bytes_to_hex;
use crate::oracle::{check_length, OracleError, OracleType, PaddingOracle};
use crate::rsa::PublicKeyContext;

use reqwest::{blocking::Client, StatusCode};

/// Queries an oracle server over HTTP, one blocking request per query.
pub struct RemoteOracle {
    client: Client,
    oracle_url: String,
    key: PublicKeyContext,
    oracle_type: OracleType,
    queries: u64,
}

impl RemoteOracle {
    pub fn new(base_url: &str, key: PublicKeyContext, oracle_type: OracleType) -> Self {
        Self {
            client: Client::new(),
            oracle_url: format!("{}{}", base_url.trim_end_matches('/'), ORACLE_PATH),
            key,
            oracle_type,
            queries: 0,
        }
    }
}

impl PaddingOracle for RemoteOracle {
    fn check_conformity(&mut self, msg: &[u8]) -> Result<bool, OracleError> {
        self.queries += 1;
        check_length(&self.key, msg)?;

        let response = self
            .client
            .get(&self.oracle_url)
            .query(&[(CIPHERTEXT_PARAM, bytes_to_hex(msg))])
            .send()
            .map_err(|e| OracleError::Communication(e.to_string()))?;
        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::INTERNAL_SERVER_ERROR => Ok(false),
            status => Err(OracleError::Protocol(format!(
                "{status}: {}",
                response.text().unwrap_or_default()
            ))),
        }
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
}
