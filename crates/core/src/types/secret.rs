//! Session secret policy shared by both servers.
//!
//! The configured secret is used as the cookie signing key, so it must be
//! long enough for `Key::from` and should look randomly generated.

use thiserror::Error;

/// Minimum secret length in bytes.
pub const MIN_SESSION_SECRET_LENGTH: usize = 64;

/// Minimum Shannon entropy, in bits per character.
pub const MIN_SECRET_ENTROPY: f64 = 3.3;

/// Fragments that show up in copied sample values, matched case-insensitively.
const PLACEHOLDER_FRAGMENTS: &[&str] = &[
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "your-",
    "put-your",
    "add-your",
    "enter-",
    "insert",
    "xxx",
    "todo",
    "fixme",
];

/// Why a session secret was refused.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum WeakSecret {
    #[error("must be at least {min} characters (got {0})", min = MIN_SESSION_SECRET_LENGTH)]
    TooShort(usize),

    #[error("looks like a placeholder (contains '{0}')")]
    Placeholder(&'static str),

    #[error(
        "entropy too low ({0:.2} bits/char, need >= {min:.1}); generate it randomly",
        min = MIN_SECRET_ENTROPY
    )]
    LowEntropy(f64),
}

/// Check a session secret against the length, placeholder and entropy rules.
///
/// # Errors
///
/// Returns the first rule the secret breaks.
pub fn check_session_secret(secret: &str) -> Result<(), WeakSecret> {
    if secret.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(WeakSecret::TooShort(secret.len()));
    }

    let lower = secret.to_lowercase();
    if let Some(fragment) = PLACEHOLDER_FRAGMENTS.iter().copied().find(|f| lower.contains(f)) {
        return Err(WeakSecret::Placeholder(fragment));
    }

    let entropy = entropy_per_char(secret);
    if entropy < MIN_SECRET_ENTROPY {
        return Err(WeakSecret::LowEntropy(entropy));
    }
    Ok(())
}

/// Shannon entropy of the character distribution.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn entropy_per_char(s: &str) -> f64 {
    let mut chars: Vec<char> = s.chars().collect();
    if chars.is_empty() {
        return 0.0;
    }
    chars.sort_unstable();

    let total = chars.len() as f64;
    chars
        .chunk_by(|a, b| a == b)
        .map(|run| {
            let p = run.len() as f64 / total;
            -p * p.log2()
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    const STRONG: &str =
        "Qw7!pL2#vB9$kD4%tR6^nM1&zX8*cF3(hJ5)gS0_aE7+uY2=iO4{bN6}mV9|wT1;";

    #[test]
    fn test_entropy() {
        assert!(entropy_per_char("").abs() < f64::EPSILON);
        assert!(entropy_per_char("kkkkkk").abs() < f64::EPSILON);
        assert!((entropy_per_char("abab") - 1.0).abs() < 1e-9);
        assert!(entropy_per_char(STRONG) > MIN_SECRET_ENTROPY);
    }

    #[test]
    fn test_check_session_secret() {
        assert_eq!(STRONG.len(), MIN_SESSION_SECRET_LENGTH);
        assert_eq!(check_session_secret(STRONG), Ok(()));

        assert_eq!(
            check_session_secret(&STRONG[..63]),
            Err(WeakSecret::TooShort(63))
        );
        assert!(matches!(
            check_session_secret(&format!("{STRONG}-changeme")),
            Err(WeakSecret::Placeholder("changeme"))
        ));
        assert!(matches!(
            check_session_secret(&"ab".repeat(40)),
            Err(WeakSecret::LowEntropy(_))
        ));
    }

    #[test]
    fn test_message_mentions_minimum() {
        let message = WeakSecret::TooShort(10).to_string();
        assert!(message.contains("at least 64"));
    }
}
