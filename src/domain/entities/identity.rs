//! Owner identity derived from a phone number

use once_cell::sync::Lazy;
use regex_lite::Regex;

static NON_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9]").unwrap());

/// Strip everything but digits from a phone-number-ish string.
pub fn sanitize_phone(raw: &str) -> String {
    NON_DIGITS.replace_all(raw.trim(), "").into_owned()
}

/// The operator's address, resolved once per process and used for the
/// connect notification and the presence keepalive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerIdentity {
    digits: String,
}

impl OwnerIdentity {
    /// Build from any phone-number string. Returns `None` when no digits
    /// survive sanitization.
    pub fn new(raw: &str) -> Option<Self> {
        let digits = sanitize_phone(raw);
        if digits.is_empty() {
            None
        } else {
            Some(Self { digits })
        }
    }

    pub fn digits(&self) -> &str {
        &self.digits
    }

    pub fn jid(&self) -> String {
        format!("{}@s.whatsapp.net", self.digits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_keeps_digits_only() {
        assert_eq!(sanitize_phone("+237 679-261-475"), "237679261475");
        assert_eq!(sanitize_phone("  "), "");
    }

    #[test]
    fn owner_identity_jid() {
        let owner = OwnerIdentity::new("+49 151 2345").unwrap();
        assert_eq!(owner.digits(), "491512345");
        assert_eq!(owner.jid(), "491512345@s.whatsapp.net");
    }

    #[test]
    fn owner_identity_rejects_empty() {
        assert!(OwnerIdentity::new("abc").is_none());
    }
}
