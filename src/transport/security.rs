use std::borrow::Cow;

use russh::Preferred;
use serde::{Deserialize, Serialize};

use crate::config;

/// SSH algorithm profile used when negotiating with a device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityLevel {
    /// Strict modern algorithms.
    Secure,
    /// Good security with broader compatibility.
    Balanced,
    /// Maximum compatibility with legacy devices (default: fleet runs
    /// routinely include end-of-life gear).
    #[default]
    LegacyCompatible,
}

impl SecurityLevel {
    /// Algorithm preference table for this profile.
    pub(super) fn preferred(self) -> Preferred {
        match self {
            SecurityLevel::Secure => Preferred {
                kex: Cow::Borrowed(config::SECURE_KEX_ORDER),
                key: Cow::Borrowed(config::SECURE_KEY_TYPES),
                cipher: Cow::Borrowed(config::SECURE_CIPHERS),
                mac: Cow::Borrowed(config::SECURE_MAC_ALGORITHMS),
                compression: Cow::Borrowed(config::DEFAULT_COMPRESSION_ALGORITHMS),
            },
            SecurityLevel::Balanced => Preferred {
                kex: Cow::Borrowed(config::BALANCED_KEX_ORDER),
                key: Cow::Borrowed(config::BALANCED_KEY_TYPES),
                cipher: Cow::Borrowed(config::BALANCED_CIPHERS),
                mac: Cow::Borrowed(config::BALANCED_MAC_ALGORITHMS),
                compression: Cow::Borrowed(config::DEFAULT_COMPRESSION_ALGORITHMS),
            },
            SecurityLevel::LegacyCompatible => Preferred {
                kex: Cow::Borrowed(config::LEGACY_KEX_ORDER),
                key: Cow::Borrowed(config::LEGACY_KEY_TYPES),
                cipher: Cow::Borrowed(config::LEGACY_CIPHERS),
                mac: Cow::Borrowed(config::LEGACY_MAC_ALGORITHMS),
                compression: Cow::Borrowed(config::DEFAULT_COMPRESSION_ALGORITHMS),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SecurityLevel;
    use russh::{cipher, kex, mac};

    #[test]
    fn default_level_is_legacy_compatible() {
        assert_eq!(SecurityLevel::default(), SecurityLevel::LegacyCompatible);
    }

    #[test]
    fn secure_profile_excludes_weak_algorithms() {
        let preferred = SecurityLevel::Secure.preferred();

        assert!(preferred.kex.iter().all(|alg| *alg != kex::DH_G1_SHA1));
        assert!(preferred.cipher.iter().all(|alg| *alg != cipher::NONE));
        assert!(preferred.cipher.iter().all(|alg| *alg != cipher::CLEAR));
        assert!(preferred.mac.iter().all(|alg| *alg != mac::NONE));
    }

    #[test]
    fn legacy_profile_keeps_broad_compatibility_algorithms() {
        let preferred = SecurityLevel::LegacyCompatible.preferred();

        assert!(preferred.kex.contains(&kex::DH_G1_SHA1));
        assert!(preferred.cipher.contains(&cipher::AES_128_CBC));
        assert!(preferred.mac.contains(&mac::HMAC_SHA1));
    }

    #[test]
    fn balanced_profile_sits_between_secure_and_legacy() {
        let secure = SecurityLevel::Secure.preferred();
        let balanced = SecurityLevel::Balanced.preferred();
        let legacy = SecurityLevel::LegacyCompatible.preferred();

        assert!(secure.kex.len() <= balanced.kex.len());
        assert!(balanced.kex.len() <= legacy.kex.len());
        assert!(balanced.kex.contains(&kex::DH_G14_SHA1));
        assert!(!secure.kex.contains(&kex::DH_G14_SHA1));
    }
}
