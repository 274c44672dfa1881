use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Wrapper for values that must not appear in log output (pickup OTPs,
/// contact details). Debug and Display render a placeholder so macros like
/// `tracing::debug!(?ride)` cannot leak the inner value.
///
/// Serialization passes the real value through: the persisted ride document
/// needs it, and response types simply never include redacted fields.
#[derive(Clone, Deserialize)]
pub struct Redacted<T>(pub T);

impl<T> Redacted<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Read access to the protected value, for comparisons at trust
    /// boundaries (OTP verification, persistence).
    pub fn expose(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Debug for Redacted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[redacted]")
    }
}

impl<T> fmt::Display for Redacted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[redacted]")
    }
}

impl<T: Serialize> Serialize for Redacted<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<T> From<T> for Redacted<T> {
    fn from(value: T) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_output_is_masked() {
        let otp = Redacted::new("4821".to_string());
        assert_eq!(format!("{:?}", otp), "[redacted]");
        assert_eq!(format!("{}", otp), "[redacted]");
        assert_eq!(otp.expose(), "4821");
    }

    #[test]
    fn test_serialization_passes_through() {
        let otp = Redacted::new("0042".to_string());
        let json = serde_json::to_string(&otp).unwrap();
        assert_eq!(json, "\"0042\"");

        let back: Redacted<String> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.into_inner(), "0042");
    }
}
