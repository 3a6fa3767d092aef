use crate::core::types::CodeVerifier;

pub trait FromRandom {
    fn from_random() -> Self;
}

/// Length used for verifiers created by the client.
pub const VERIFIER_LENGTH: usize = 128;

impl FromRandom for CodeVerifier {
    fn from_random() -> Self {
        CodeVerifier(random_string(VERIFIER_LENGTH))
    }
}

/// `size` characters from the 62-symbol alphanumeric alphabet, drawn from the
/// thread-local CSPRNG.
pub fn random_string(size: usize) -> String {
    use rand::Rng;

    rand::thread_rng()
        .sample_iter(rand::distributions::Alphanumeric)
        .take(size)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_length_and_alphabet() {
        for size in [0, 1, 43, 128] {
            let s = random_string(size);
            assert_eq!(s.len(), size);
            assert!(s.chars().all(|c| c.is_ascii_alphanumeric()));
        }
    }

    #[test]
    fn no_fixed_seed() {
        assert_ne!(random_string(64), random_string(64));
        assert_ne!(CodeVerifier::from_random(), CodeVerifier::from_random());
    }
}
