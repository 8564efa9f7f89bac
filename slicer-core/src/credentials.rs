//! One-shot credential generation for workload bootstraps.
//!
//! Passwords and access keys are generated when a workload is deployed and
//! printed exactly once; there is no persistent secret store.

use rand::prelude::*;

/// Generate a random alphanumeric password.
///
/// Alphanumeric only: the value ends up inside shell scripts and INI files,
/// so shell metacharacters are off the table.
pub fn generate_password(length: usize) -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ\
                            abcdefghijklmnopqrstuvwxyz\
                            0123456789";
    let mut rng = rand::rng();
    (0..length)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_has_requested_length() {
        assert_eq!(generate_password(24).len(), 24);
        assert_eq!(generate_password(0).len(), 0);
    }

    #[test]
    fn password_is_alphanumeric() {
        let password = generate_password(128);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn passwords_are_not_repeated() {
        // Collision over 32 chars would point at a broken RNG seed.
        assert_ne!(generate_password(32), generate_password(32));
    }
}
