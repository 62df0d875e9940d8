// Serves a decrypting padding oracle over HTTP for a freshly generated key.
//
// Usage: oracle_server [ORACLE_TYPE] [PORT] [MODULUS_BITS]
use bleichenbacher::hex::bytes_to_hex;
use bleichenbacher::oracle::remote::{spawn_server, OracleRequestHandler, ORACLE_PATH};
use bleichenbacher::{generate_rsa_key_pair, pkcs1_pad, DecryptingOracle, OracleType};

use num_bigint::BigUint;
use rand::thread_rng;
use tracing::info;

use std::error::Error;
use std::net::SocketAddr;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let oracle_type: OracleType = args.next().as_deref().unwrap_or("TTT").parse()?;
    let port: u16 = args.next().as_deref().unwrap_or("9000").parse()?;
    let n_bits: u64 = args.next().as_deref().unwrap_or("1024").parse()?;

    let mut rng = thread_rng();
    let keys = generate_rsa_key_pair(n_bits, &BigUint::from(65537u64), &mut rng);
    let key = keys.public_key();
    info!(n = %key.n.to_str_radix(16), e = %key.e, "generated key");

    let block = pkcs1_pad(&[0x03; 48], key.block_size, &mut rng)?;
    let ciphertext = key.to_block(&key.encrypt(&BigUint::from_bytes_be(&block)));
    info!(ciphertext = %bytes_to_hex(&ciphertext), "sample ciphertext");

    let handler = OracleRequestHandler::new(DecryptingOracle::new(keys, oracle_type));
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let url = spawn_server(addr, &handler).await?;
    info!(%oracle_type, "serving {url}{ORACLE_PATH}");

    tokio::signal::ctrl_c().await?;
    info!(queries = handler.query_count(), "shutting down");
    Ok(())
}
