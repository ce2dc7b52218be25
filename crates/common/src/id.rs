//! ID generation utilities.

use rand::Rng;
use ulid::Ulid;

/// Alphabet used for public search ids.
const SEARCH_ID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of a public search id.
pub const SEARCH_ID_LENGTH: usize = 5;

/// ID generator for entities.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    _private: (),
}

impl IdGenerator {
    /// Create a new ID generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a new ULID-based ID.
    ///
    /// ULIDs are lexicographically sortable by creation time, which makes
    /// them usable as the tie-break column of keyset pagination.
    #[must_use]
    pub fn generate(&self) -> String {
        Ulid::new().to_string().to_lowercase()
    }

    /// Generate a short public search id.
    ///
    /// Uniqueness is not guaranteed here; callers retry on collision.
    #[must_use]
    pub fn generate_search_id(&self) -> String {
        let mut rng = rand::thread_rng();
        (0..SEARCH_ID_LENGTH)
            .map(|_| {
                let idx = rng.gen_range(0..SEARCH_ID_ALPHABET.len());
                char::from(SEARCH_ID_ALPHABET[idx])
            })
            .collect()
    }
}
