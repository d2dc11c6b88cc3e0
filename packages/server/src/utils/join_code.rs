use rand::Rng;

/// Alphabet for generated join codes. Excludes 0/O and 1/I, which read
/// ambiguously when codes are shared on screen or paper.
const JOIN_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

pub const JOIN_CODE_LENGTH: usize = 8;

/// Generate a join code for a private contest.
pub fn generate_join_code() -> String {
    let mut rng = rand::rng();
    (0..JOIN_CODE_LENGTH)
        .map(|_| {
            let idx = rng.random_range(0..JOIN_CODE_ALPHABET.len());
            JOIN_CODE_ALPHABET[idx] as char
        })
        .collect()
}
