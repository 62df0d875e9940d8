pub mod attack;
pub mod fraction;
pub mod hex;
pub mod interval;
pub mod numeric;
pub mod oracle;
pub mod prime;
pub mod rsa;

pub use attack::{run_attack, Attack, AttackConfig, AttackError, AttackOutcome};
pub use fraction::{ArithmeticError, Fraction};
pub use interval::{Interval, IntervalSet};
pub use oracle::{
    classify_oracle, is_pkcs_conforming, DecryptingOracle, OracleError, OracleType,
    PaddingOracle, PlaintextOracle, RemoteOracle,
};
pub use rsa::{generate_rsa_key_pair, pkcs1_pad, pkcs1_unpad, PublicKeyContext, RsaKeyPair};
