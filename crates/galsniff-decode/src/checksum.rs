/// Seed added to every checksum before the payload bytes.
pub const CHECKSUM_SEED: u64 = 0xAA;

/// Carry-folded additive checksum used by every message on the bus.
///
/// The bytes are summed on top of [`CHECKSUM_SEED`], then everything above
/// the low byte is repeatedly added back in until the value fits in a `u8`.
pub fn compute_checksum(bytes: &[u8]) -> u8 {
    let mut acc = CHECKSUM_SEED + bytes.iter().map(|&b| u64::from(b)).sum::<u64>();

    while acc > 0xFF {
        acc = (acc >> 8) + (acc & 0xFF);
    }

    acc as u8
}

/// True when the last byte of `frame` is the checksum of everything before it.
pub fn has_valid_checksum(frame: &[u8]) -> bool {
    match frame.split_last() {
        Some((&checksum, body)) => compute_checksum(body) == checksum,
        None => false,
    }
}
