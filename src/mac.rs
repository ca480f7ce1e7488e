use base64::{prelude::BASE64_STANDARD, Engine};
use hmac::{digest::KeyInit, Hmac, Mac};
use sha1::Sha1;
use sha2::{Sha224, Sha256, Sha384, Sha512};
use std::{fmt, str::FromStr};

/// A keyed hash algorithm supported by the codec.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Algorithm {
    #[default]
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Algorithm::Sha1 => "sha1",
            Algorithm::Sha224 => "sha224",
            Algorithm::Sha256 => "sha256",
            Algorithm::Sha384 => "sha384",
            Algorithm::Sha512 => "sha512",
        };
        write!(f, "{name}")
    }
}

impl FromStr for Algorithm {
    type Err = UnsupportedAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sha1" => Ok(Algorithm::Sha1),
            "sha224" => Ok(Algorithm::Sha224),
            "sha256" => Ok(Algorithm::Sha256),
            "sha384" => Ok(Algorithm::Sha384),
            "sha512" => Ok(Algorithm::Sha512),
            other => Err(UnsupportedAlgorithm(other.to_string())),
        }
    }
}

/// An error when an algorithm name falls outside the supported keyed-hash set.
#[derive(Debug, thiserror::Error)]
#[error("unsupported hash algorithm '{0}'")]
pub struct UnsupportedAlgorithm(pub String);

/// Computes the keyed digest that seals new tokens and re-verifies presented ones.
///
/// A pure function of `(message, key, algorithm)`: equal inputs always yield
/// byte-identical base64 digest text.
#[derive(Clone)]
pub(crate) struct Authenticator {
    key: Vec<u8>,
    algorithm: Algorithm,
}

// Keeps the key out of debug output.
impl fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authenticator").field("algorithm", &self.algorithm).finish_non_exhaustive()
    }
}

impl Authenticator {
    pub(crate) fn new(key: Vec<u8>, algorithm: Algorithm) -> Self {
        Self { key, algorithm }
    }

    /// Compute the authenticator for a message, as base64 text.
    pub(crate) fn authenticate(&self, message: &str) -> String {
        match self.algorithm {
            Algorithm::Sha1 => keyed_digest::<Hmac<Sha1>>(&self.key, message),
            Algorithm::Sha224 => keyed_digest::<Hmac<Sha224>>(&self.key, message),
            Algorithm::Sha256 => keyed_digest::<Hmac<Sha256>>(&self.key, message),
            Algorithm::Sha384 => keyed_digest::<Hmac<Sha384>>(&self.key, message),
            Algorithm::Sha512 => keyed_digest::<Hmac<Sha512>>(&self.key, message),
        }
    }

    /// Check a presented authenticator against the one recomputed for `message`.
    ///
    /// The comparison takes the same time wherever the first difference sits,
    /// so an attacker cannot grow a forgery one byte at a time.
    pub(crate) fn verify(&self, message: &str, presented: &str) -> bool {
        fixed_time_eq(self.authenticate(message).as_bytes(), presented.as_bytes())
    }
}

fn keyed_digest<M: Mac + KeyInit>(key: &[u8], message: &str) -> String {
    // HMAC accepts keys of any length, so this cannot fail.
    let mut mac = <M as KeyInit>::new_from_slice(key).expect("HMAC key of any length is valid");
    mac.update(message.as_bytes());
    BASE64_STANDARD.encode(mac.finalize().into_bytes())
}

/// Fixed-time equality over the full length of both inputs.
fn fixed_time_eq(left: &[u8], right: &[u8]) -> bool {
    if left.len() != right.len() {
        return false;
    }
    let mut diff = 0u8;
    for (l, r) in left.iter().zip(right) {
        diff |= l ^ r;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::sha1("sha1", Algorithm::Sha1)]
    #[case::sha224("sha224", Algorithm::Sha224)]
    #[case::sha256("sha256", Algorithm::Sha256)]
    #[case::sha384("sha384", Algorithm::Sha384)]
    #[case::sha512("sha512", Algorithm::Sha512)]
    fn parse_supported_algorithms(#[case] input: &str, #[case] expected: Algorithm) {
        let parsed: Algorithm = input.parse().expect("parsing failed");
        assert_eq!(parsed, expected);
        assert_eq!(parsed.to_string(), input);
    }

    #[rstest]
    #[case::md5("md5")]
    #[case::uppercase("SHA1")]
    #[case::empty("")]
    #[case::nonsense("bar")]
    fn parse_unsupported_algorithms(#[case] input: &str) {
        input.parse::<Algorithm>().expect_err("parsing succeeded");
    }

    #[rstest]
    #[case::sha1(Algorithm::Sha1, "3nybhbi3iqa8ino29wqQcBydtNk=")]
    #[case::sha256(Algorithm::Sha256, "97yD9DBThCSxMpjmqm+xQ+9NWaFJRhdZl0edvC0aPNg=")]
    fn known_digests(#[case] algorithm: Algorithm, #[case] expected: &str) {
        let authenticator = Authenticator::new(b"key".to_vec(), algorithm);
        let digest = authenticator.authenticate("The quick brown fox jumps over the lazy dog");
        assert_eq!(digest, expected);
    }

    #[test]
    fn debug_does_not_leak_key() {
        let authenticator = Authenticator::new(b"super secret".to_vec(), Algorithm::Sha1);
        let rendered = format!("{authenticator:?}");
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("Sha1"));
    }

    #[test]
    fn short_key_digest() {
        let authenticator = Authenticator::new(b"foo".to_vec(), Algorithm::Sha1);
        assert_eq!(authenticator.authenticate("foo bar"), "MsqIJIzmAfroGjnjnW0M3xf5Cxs=");
    }

    #[test]
    fn deterministic() {
        let authenticator = Authenticator::new(b"foo".to_vec(), Algorithm::Sha1);
        assert_eq!(authenticator.authenticate("message"), authenticator.authenticate("message"));
    }

    #[test]
    fn key_changes_digest() {
        let one = Authenticator::new(b"foo".to_vec(), Algorithm::Sha1);
        let other = Authenticator::new(b"bar".to_vec(), Algorithm::Sha1);
        assert_ne!(one.authenticate("message"), other.authenticate("message"));
    }

    #[test]
    fn verify_matches_own_digest() {
        let authenticator = Authenticator::new(b"foo".to_vec(), Algorithm::Sha256);
        let digest = authenticator.authenticate("message");
        assert!(authenticator.verify("message", &digest));
        assert!(!authenticator.verify("message", "not the digest"));
    }

    #[rstest]
    #[case::equal(b"abc".as_slice(), b"abc".as_slice(), true)]
    #[case::different(b"abc".as_slice(), b"abd".as_slice(), false)]
    #[case::length(b"abc".as_slice(), b"abcd".as_slice(), false)]
    #[case::empty(b"".as_slice(), b"".as_slice(), true)]
    fn fixed_time_comparison(#[case] left: &[u8], #[case] right: &[u8], #[case] expected: bool) {
        assert_eq!(fixed_time_eq(left, right), expected);
    }
}
