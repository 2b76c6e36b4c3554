use rand::Rng;

/// Excludes visually confusable characters (0/O, 1/I).
pub const BOOKING_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

pub const BOOKING_CODE_LENGTH: usize = 10;

/// Samples one candidate booking code. Uniqueness is the caller's problem:
/// the generated code must be checked against the bookings table inside the
/// creation transaction.
pub fn generate_booking_code() -> String {
    let mut rng = rand::rng();
    (0..BOOKING_CODE_LENGTH)
        .map(|_| BOOKING_CODE_ALPHABET[rng.random_range(0..BOOKING_CODE_ALPHABET.len())] as char)
        .collect()
}
