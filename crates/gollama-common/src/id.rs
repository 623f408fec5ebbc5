use std::fmt::Write;

use rand::rngs::OsRng;
use rand::RngCore;

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Mint a session identifier: 128 bits from the OS CSPRNG, hex encoded.
pub fn new_session_id() -> String {
    let mut bytes = [0u8; 16];
    OsRng.fill_bytes(&mut bytes);
    bytes.iter().fold(String::with_capacity(32), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}
