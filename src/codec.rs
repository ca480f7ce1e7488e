use crate::{
    mac::{Algorithm, Authenticator},
    token::{DecodedToken, Seed, TokenBundle},
};
use base64::{prelude::BASE64_STANDARD, Engine};
use chrono::{DateTime, Utc};
use rand::{rngs::OsRng, RngCore};

const DEFAULT_LIFETIME_SECS: u64 = 3600;
const SALT_LEN: usize = 6;

/// Configuration for a [`TokenCodec`].
///
/// The private key is mandatory; lifetime and algorithm have defaults. A
/// lifetime of zero falls back to the default of one hour.
#[derive(Clone)]
pub struct CodecConfig {
    private_key: Vec<u8>,
    lifetime: u64,
    algorithm: Algorithm,
}

impl CodecConfig {
    /// Construct a configuration around a private key, with the default
    /// lifetime (3600 seconds) and algorithm (sha1).
    pub fn new<K: Into<Vec<u8>>>(private_key: K) -> Self {
        Self { private_key: private_key.into(), lifetime: DEFAULT_LIFETIME_SECS, algorithm: Algorithm::default() }
    }

    /// Set the token lifetime in seconds. Zero keeps the default.
    pub fn lifetime(mut self, seconds: u64) -> Self {
        if seconds > 0 {
            self.lifetime = seconds;
        }
        self
    }

    /// Set the keyed-hash algorithm.
    pub fn algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Build the codec, validating the configuration.
    pub fn build(self) -> Result<TokenCodec, ConfigError> {
        let Self { private_key, lifetime, algorithm } = self;
        if private_key.is_empty() {
            return Err(ConfigError::MissingKey);
        }
        Ok(TokenCodec { authenticator: Authenticator::new(private_key, algorithm), lifetime })
    }
}

/// An error when constructing a codec.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no private key specified")]
    MissingKey,
}

/// A bearer token codec bound to one key, lifetime, and algorithm.
///
/// Encoding seals seed data into a salted, expiring credential; decoding
/// recovers the data and re-verifies the seal. The codec holds no state
/// beyond its immutable configuration, so every call is independent.
#[derive(Debug)]
pub struct TokenCodec {
    authenticator: Authenticator,
    lifetime: u64,
}

impl TokenCodec {
    /// Construct a codec from a private key with default lifetime and
    /// algorithm. Use [`CodecConfig`] to override either.
    pub fn new<K: Into<Vec<u8>>>(private_key: K) -> Result<Self, ConfigError> {
        CodecConfig::new(private_key).build()
    }

    /// Seal seed data into a token bundle.
    ///
    /// The signed message is `data:expiration:salt`, where the salt is 6
    /// fresh random bytes rendered as base64. The salt keeps two tokens for
    /// the same data and expiration second from ever being identical.
    #[doc(alias = "create")]
    pub fn encode<S: Into<Seed>>(&self, seed: S) -> Result<TokenBundle, EncodeError> {
        let data = seed.into().canonicalize();

        let mut salt = [0u8; SALT_LEN];
        OsRng.try_fill_bytes(&mut salt)?;

        let lifetime = i64::try_from(self.lifetime).unwrap_or(i64::MAX);
        let expiration = Utc::now().timestamp().saturating_add(lifetime);
        let message = format!("{data}:{expiration}:{}", to_base64(salt));
        let password = self.authenticator.authenticate(&message);

        Ok(TokenBundle {
            expiration,
            access_token: to_base64(format!("{message}:{password}")),
            basic_login: to_base64(&message),
            basic_password: password,
        })
    }

    /// Decode and verify a bearer token.
    ///
    /// The rightmost `:`-delimited field of the decoded token is the
    /// authenticator; the rest is the signed message, which is handed to
    /// [`decode_pair`] as a login/password pair.
    ///
    /// [`decode_pair`]: TokenCodec::decode_pair
    #[doc(alias = "extract")]
    pub fn decode(&self, access_token: &str) -> Result<DecodedToken, DecodeError> {
        let decoded = from_base64(access_token).map_err(|e| DecodeError::Base64("bearer token", e))?;
        let decoded = String::from_utf8(decoded).map_err(|_| DecodeError::NotUtf8("bearer token"))?;
        let (message, password) =
            decoded.rsplit_once(':').ok_or(DecodeError::MissingComponent("authenticator"))?;
        self.decode_pair(&to_base64(message), password)
    }

    /// Decode and verify a basic login/password credential pair.
    ///
    /// The login is the base64 signed message; the password is the
    /// authenticator presented for it. A failed match or an expired token is
    /// a normal `is_valid() == false` result, not an error; only structurally
    /// malformed input errors out.
    pub fn decode_pair(&self, login: &str, password: &str) -> Result<DecodedToken, DecodeError> {
        let message = from_base64(login).map_err(|e| DecodeError::Base64("login", e))?;
        let message = String::from_utf8(message).map_err(|_| DecodeError::NotUtf8("login"))?;

        // The salt is only there to make the message unique; it plays no
        // part in reconstruction beyond being stripped.
        let mut fields = message.rsplitn(3, ':');
        let _salt = fields.next().ok_or(DecodeError::MissingComponent("salt"))?;
        let expiration = fields.next().ok_or(DecodeError::MissingComponent("expiration"))?;
        let data = fields.next().ok_or(DecodeError::MissingComponent("data"))?;

        let expiration: i64 = expiration.parse().map_err(|_| DecodeError::Expiration)?;
        let expiration = DateTime::from_timestamp(expiration, 0).ok_or(DecodeError::Expiration)?;

        let data = Seed::from_fields(data.split(':').map(ToString::to_string).collect());

        // The match verdict is fixed here; freshness stays lazy.
        let matched = self.authenticator.verify(&message, password);
        Ok(DecodedToken::new(data, expiration, matched))
    }
}

/// An error when sealing a token.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("could not obtain salt randomness: {0}")]
    Entropy(#[from] rand::Error),
}

/// An error when decoding a structurally malformed credential.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid base64 found on {0}: {1}")]
    Base64(&'static str, base64::DecodeError),

    #[error("{0} is not valid UTF-8")]
    NotUtf8(&'static str),

    #[error("no {0} component in credential")]
    MissingComponent(&'static str),

    #[error("expiration is not a valid timestamp")]
    Expiration,
}

pub(crate) fn to_base64<T: AsRef<[u8]>>(input: T) -> String {
    BASE64_STANDARD.encode(input)
}

pub(crate) fn from_base64(input: &str) -> Result<Vec<u8>, base64::DecodeError> {
    BASE64_STANDARD.decode(input)
}
