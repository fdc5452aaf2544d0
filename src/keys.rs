use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};

/// Produces random paste keys drawn from `[A-Za-z0-9]`.
///
/// Uniqueness is not checked here; the caller retries on collision.
#[derive(Debug, Clone, Copy)]
pub struct KeyGenerator {
    length: usize,
}

impl KeyGenerator {
    pub fn new(length: usize) -> Self {
        KeyGenerator { length }
    }

    pub fn generate(&self) -> String {
        thread_rng()
            .sample_iter(&Alphanumeric)
            .take(self.length)
            .map(char::from)
            .collect()
    }
}

impl Default for KeyGenerator {
    fn default() -> Self {
        KeyGenerator::new(6)
    }
}
