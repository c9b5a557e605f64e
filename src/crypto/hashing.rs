// Transaction identifiers for ledger writes.

use rand::RngCore;
use sha2::{Digest, Sha256};

// Domain separation so a tx id can never collide with another digest we compute.
const TX_DOMAIN: &[u8] = b"LEDGERTX";

/// Length of the random nonce mixed into every transaction id.
pub const NONCE_LEN: usize = 24;

/// Returns a fresh random nonce.
pub fn new_nonce() -> [u8; NONCE_LEN] {
    let mut nonce = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce);
    nonce
}

/// Derives a transaction id from a nonce and the identity of the submitter.
///
/// The id is the hex-encoded SHA-256 of the domain tag, the nonce and the
/// creator, so the same nonce and creator always yield the same id.
pub fn tx_id(nonce: &[u8], creator: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(TX_DOMAIN);
    hasher.update(nonce);
    hasher.update(creator.as_bytes());
    hex::encode(hasher.finalize())
}

/// Derives a transaction id with a fresh nonce.
pub fn new_tx_id(creator: &str) -> String {
    tx_id(&new_nonce(), creator)
}
