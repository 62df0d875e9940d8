use super::{CIPHERTEXT_PARAM, ORACLE_PATH};
use crate::hex::hex_to_bytes;
use crate::oracle::{DecryptingOracle, PaddingOracle};

use axum::{extract::Query, http::StatusCode, response::IntoResponse, routing::get, Router};
use tokio::net::{TcpListener, ToSocketAddrs};
use tracing::{debug, error};

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

/// Binds `address` and serves the oracle in a background task, returning the
/// base URL it is reachable on.
pub async fn spawn_server(
    address: impl ToSocketAddrs,
    request_handler: &OracleRequestHandler,
) -> std::io::Result<String> {
    let app = router(request_handler);
    let listener = TcpListener::bind(address).await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("oracle server stopped: {e}");
        }
    });
    Ok(format!("http://{}", addr))
}

pub fn router(request_handler: &OracleRequestHandler) -> Router {
    Router::new().route(
        ORACLE_PATH,
        get({
            let handler = Arc::new(request_handler.clone());
            move |query| {
                let handler = Arc::clone(&handler);
                async move { handler.handle_request(query).await }
            }
        }),
    )
}

/// Answers oracle queries for one key. Clones share the query counter.
#[derive(Debug, Clone)]
pub struct OracleRequestHandler {
    oracle: Arc<DecryptingOracle>,
    queries: Arc<AtomicU64>,
}

impl OracleRequestHandler {
    pub fn new(oracle: DecryptingOracle) -> Self {
        Self {
            oracle: Arc::new(oracle),
            queries: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Number of well-formed queries answered so far.
    pub fn query_count(&self) -> u64 {
        self.queries.load(Ordering::SeqCst)
    }

    pub async fn handle_request(
        &self,
        Query(params): Query<HashMap<String, String>>,
    ) -> impl IntoResponse {
        let ciphertext = match params.get(CIPHERTEXT_PARAM) {
            Some(c) => match hex_to_bytes(c) {
                Ok(c) => c,
                Err(e) => {
                    return (StatusCode::BAD_REQUEST, format!("Illegal ciphertext: {}", e))
                        .into_response()
                }
            },
            None => {
                return (StatusCode::BAD_REQUEST, "Missing 'ciphertext' parameter").into_response()
            }
        };
        let block_size = self.oracle.block_size();
        if ciphertext.len() != block_size {
            return (
                StatusCode::BAD_REQUEST,
                format!(
                    "Ciphertext has {} bytes, expected {}",
                    ciphertext.len(),
                    block_size
                ),
            )
                .into_response();
        }

        let query = self.queries.fetch_add(1, Ordering::SeqCst) + 1;
        let conforming = self.oracle.decrypts_to_conforming(&ciphertext);
        debug!(query, conforming, "answered oracle query");
        if conforming {
            (StatusCode::OK, "Conforming").into_response()
        } else {
            (StatusCode::INTERNAL_SERVER_ERROR, "Not conforming").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::hex::bytes_to_hex;
    use crate::oracle::OracleType;
    use crate::rsa::{generate_rsa_key_pair, pkcs1_pad};

    use num_bigint::BigUint;
    use rand::{rngs::StdRng, SeedableRng};

    fn handler() -> OracleRequestHandler {
        let mut rng = StdRng::from_seed([17; 32]);
        let keys = generate_rsa_key_pair(512, &BigUint::from(65537u64), &mut rng);
        OracleRequestHandler::new(DecryptingOracle::new(keys, OracleType::Fft))
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn server_answers_with_status_codes() {
        let handler = handler();
        let key = handler.oracle.public_key().clone();
        let addr = spawn_server("127.0.0.1:0", &handler).await.unwrap();
        let mut rng = StdRng::from_seed([18; 32]);
        let block = pkcs1_pad(&[7u8; 48], key.block_size, &mut rng).unwrap();
        let conforming = key.to_block(&key.encrypt(&BigUint::from_bytes_be(&block)));
        let non_conforming = key.to_block(&key.encrypt(&BigUint::from(2u64)));
        let url = |ciphertext: &str| format!("{addr}{ORACLE_PATH}?{CIPHERTEXT_PARAM}={ciphertext}");

        let ok = reqwest::get(url(&bytes_to_hex(&conforming))).await.unwrap();
        let not_ok = reqwest::get(url(&bytes_to_hex(&non_conforming))).await.unwrap();
        let short = reqwest::get(url(&bytes_to_hex(&conforming[1..]))).await.unwrap();
        let not_hex = reqwest::get(url("xyz")).await.unwrap();
        let conforming_hex = bytes_to_hex(&conforming);
        let signed = reqwest::get(url(&format!("%2B{}", &conforming_hex[1..])))
            .await
            .unwrap();
        let missing = reqwest::get(format!("{addr}{ORACLE_PATH}")).await.unwrap();

        assert_eq!(ok.status(), StatusCode::OK);
        assert_eq!(not_ok.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(short.status(), StatusCode::BAD_REQUEST);
        assert_eq!(not_hex.status(), StatusCode::BAD_REQUEST);
        assert_eq!(signed.status(), StatusCode::BAD_REQUEST);
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
        assert_eq!(handler.query_count(), 2);
    }
}
