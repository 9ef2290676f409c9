use std::fmt;
use std::ops::Deref;

use subtle::ConstantTimeEq;
use zeroize::Zeroize;

/// A sensitive string that must never be logged, cloned, or serialized.
///
/// Used for note passphrases and sync account passwords:
/// - not `Clone`
/// - not `Serialize` / `Deserialize`
/// - `Debug` / `Display` never print the content
/// - zeroed on drop
pub struct SecretString {
    inner: String,
}

impl SecretString {
    pub fn new(value: String) -> Self {
        Self { inner: value }
    }

    /// Borrow the inner secret as &str.
    pub fn expose(&self) -> &str {
        &self.inner
    }

    /// Consume and return the inner String.
    pub fn into_inner(mut self) -> String {
        let mut tmp = String::new();
        std::mem::swap(&mut self.inner, &mut tmp);
        tmp
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Constant-time comparison of two secrets.
    pub fn matches(&self, other: &SecretString) -> bool {
        self.inner.as_bytes().ct_eq(other.inner.as_bytes()).into()
    }

    /// Explicit copy for the few places that must hand a secret to two owners.
    pub fn duplicate(&self) -> Self {
        Self::new(self.inner.clone())
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        Self::new(value.to_string())
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/* ===========================
 * Trait implementations
 * ===========================
 */

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl Deref for SecretString {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.expose()
    }
}

impl Drop for SecretString {
    fn drop(&mut self) {
        self.inner.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::SecretString;

    #[test]
    fn debug_and_display_are_redacted() {
        let secret = SecretString::from("pw123");
        assert_eq!(format!("{secret:?}"), "[REDACTED]");
        assert_eq!(format!("{secret}"), "[REDACTED]");
    }

    #[test]
    fn matches_compares_content() {
        let a = SecretString::from("pw123");
        assert!(a.matches(&SecretString::from("pw123")));
        assert!(!a.matches(&SecretString::from("pw1234")));
        assert!(!a.matches(&SecretString::from("")));
    }
}
