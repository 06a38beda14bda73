//! Deterministic dataset seeds.
//!
//! Every mission index maps to a stable 64-bit seed so repeated plays of the
//! same mission see the same data within (and across) sessions. The seed is a
//! domain-separated FNV-1a hash of the base seed and the mission index.

fn fnv1a64(bytes: &[u8]) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0100_0000_01b3;
    let mut hash = FNV_OFFSET;
    for b in bytes {
        hash = (hash ^ u64::from(*b)).wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Derive the dataset seed for a mission index.
#[must_use]
pub fn mission_seed(base_seed: u64, mission_index: usize) -> u64 {
    let index = u64::try_from(mission_index).unwrap_or(u64::MAX);
    let mut buf = [0u8; 22];
    buf[..6].copy_from_slice(b"SCDET-");
    buf[6..14].copy_from_slice(&base_seed.to_le_bytes());
    buf[14..].copy_from_slice(&index.to_le_bytes());
    fnv1a64(&buf)
}
