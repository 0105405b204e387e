use std::ops::{BitOr, BitOrAssign};

/// Security applied to a request, as a set of independent flags.
///
/// Any combination is valid. Without [`SecurityOptions::JSON_WEB_TOKEN`] no `X-AP-Authorization`
/// header is sent, whatever the other flags are.
///
/// ```
/// # use appspanel::SecurityOptions;
/// let options = SecurityOptions::JSON_WEB_TOKEN | SecurityOptions::ENCRYPT_RESPONSE;
/// assert!(options.contains(SecurityOptions::JSON_WEB_TOKEN));
/// assert!(!options.contains(SecurityOptions::ENCRYPT_REQUEST));
/// assert!(SecurityOptions::ALL.contains(options));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SecurityOptions(u8);

impl SecurityOptions {
    /// No security: no JWT, no secret header, no encryption.
    pub const NONE: SecurityOptions = SecurityOptions(0);
    /// Attach a signed, encrypted JWT in `X-AP-Authorization`.
    pub const JSON_WEB_TOKEN: SecurityOptions = SecurityOptions(1 << 0);
    /// Encrypt the request body.
    pub const ENCRYPT_REQUEST: SecurityOptions = SecurityOptions(1 << 1);
    /// Expect an encrypted response body and decrypt it.
    pub const ENCRYPT_RESPONSE: SecurityOptions = SecurityOptions(1 << 2);

    /// Encrypt both request and response bodies.
    pub const ENCRYPT_ALL: SecurityOptions =
        SecurityOptions(Self::ENCRYPT_REQUEST.0 | Self::ENCRYPT_RESPONSE.0);
    /// Every flag.
    pub const ALL: SecurityOptions = SecurityOptions(Self::JSON_WEB_TOKEN.0 | Self::ENCRYPT_ALL.0);

    /// Build options from raw bits. Unknown bits are dropped.
    pub const fn from_bits(bits: u8) -> SecurityOptions {
        SecurityOptions(bits & Self::ALL.0)
    }

    /// Raw bits.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Whether every flag of `other` is set.
    pub const fn contains(self, other: SecurityOptions) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether no flag is set.
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for SecurityOptions {
    type Output = SecurityOptions;

    fn bitor(self, rhs: SecurityOptions) -> SecurityOptions {
        SecurityOptions(self.0 | rhs.0)
    }
}

impl BitOrAssign for SecurityOptions {
    fn bitor_assign(&mut self, rhs: SecurityOptions) {
        self.0 |= rhs.0;
    }
}

/// Security configuration of a single request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Security {
    /// Flags.
    pub options: SecurityOptions,
    /// Embed the user's authentication token in the JWT. The request fails with
    /// [`Cause::MissingAuthenticationToken`](crate::Cause::MissingAuthenticationToken) when no
    /// token is stored.
    pub uses_user_token: bool,
    /// Opaque payload embedded in the JWT `data` claim.
    pub secure_data: Option<Vec<u8>>,
}

impl Security {
    /// `options`, without user token or secure data.
    pub fn new(options: SecurityOptions) -> Security {
        Security {
            options,
            ..Security::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SecurityOptions;

    #[test]
    fn named_combinations() {
        assert!(SecurityOptions::NONE.is_none());
        assert_eq!(
            SecurityOptions::ENCRYPT_ALL,
            SecurityOptions::ENCRYPT_REQUEST | SecurityOptions::ENCRYPT_RESPONSE
        );
        assert_eq!(SecurityOptions::ALL.bits(), 0b111);
        assert!(!SecurityOptions::ENCRYPT_ALL.contains(SecurityOptions::JSON_WEB_TOKEN));
    }

    #[test]
    fn every_option_contains_none() {
        for bits in 0..8 {
            assert!(SecurityOptions::from_bits(bits).contains(SecurityOptions::NONE));
        }
    }

    #[test]
    fn from_bits_drops_unknown_bits() {
        assert_eq!(
            SecurityOptions::from_bits(0b1000_0001),
            SecurityOptions::JSON_WEB_TOKEN
        );
    }

    #[test]
    fn bitor_assign_accumulates() {
        let mut options = SecurityOptions::NONE;
        options |= SecurityOptions::ENCRYPT_RESPONSE;
        options |= SecurityOptions::JSON_WEB_TOKEN;
        assert_eq!(options.bits(), 0b101);
    }
}
