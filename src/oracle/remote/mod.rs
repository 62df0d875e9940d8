// A decrypting oracle served over HTTP, and the client that queries it.
//
// `GET /oracle?ciphertext=<hex>` answers 200 OK for a conforming ciphertext,
// 500 Internal Server Error for a non-conforming one and 400 Bad Request for
// a malformed query.
pub mod client;
pub mod server;

pub use client::RemoteOracle;
pub use server::{spawn_server, OracleRequestHandler};

pub const ORACLE_PATH: &str = "/oracle";
pub const CIPHERTEXT_PARAM: &str = "ciphertext";
