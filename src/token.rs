use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Seed data for a token: a single string or an ordered sequence of strings.
///
/// A sequence is canonicalized by joining its elements with `:` before
/// signing. Because the separator also delimits the wire format, a sequence of
/// exactly one element decodes as a bare string and a string containing `:`
/// decodes as a sequence; both are accepted losses of the format.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Seed {
    One(String),
    Many(Vec<String>),
}

impl Seed {
    /// The canonical string form that gets signed.
    pub fn canonicalize(&self) -> String {
        match self {
            Seed::One(data) => data.clone(),
            Seed::Many(elements) => elements.join(":"),
        }
    }

    /// Rebuild seed data from the fields left over after stripping the salt
    /// and expiration from a decoded message.
    pub(crate) fn from_fields(mut fields: Vec<String>) -> Self {
        if fields.len() == 1 {
            Seed::One(fields.remove(0))
        } else {
            Seed::Many(fields)
        }
    }
}

impl From<String> for Seed {
    fn from(data: String) -> Self {
        Seed::One(data)
    }
}

impl From<&str> for Seed {
    fn from(data: &str) -> Self {
        Seed::One(data.to_string())
    }
}

impl From<Vec<String>> for Seed {
    fn from(elements: Vec<String>) -> Self {
        Seed::Many(elements)
    }
}

impl From<&[&str]> for Seed {
    fn from(elements: &[&str]) -> Self {
        Seed::Many(elements.iter().map(ToString::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Seed {
    fn from(elements: [&str; N]) -> Self {
        Self::from(elements.as_slice())
    }
}

/// A freshly issued token in both of its credential forms.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBundle {
    /// When the token expires, in Unix epoch seconds.
    pub expiration: i64,

    /// The single-string bearer form: base64 of `message:authenticator`.
    pub access_token: String,

    /// The login half of the basic-pair form: base64 of the signed message.
    pub basic_login: String,

    /// The password half of the basic-pair form: the authenticator text.
    pub basic_password: String,
}

/// The outcome of decoding a presented credential.
///
/// The authenticator match is decided once, when the credential is decoded.
/// Freshness is re-checked against the clock on every [`is_valid`] call, so a
/// held result turns invalid by itself once its expiration passes.
///
/// [`is_valid`]: DecodedToken::is_valid
#[derive(Clone, Debug)]
pub struct DecodedToken {
    data: Option<Seed>,
    expiration: Option<DateTime<Utc>>,
    matched: bool,
}

impl DecodedToken {
    pub(crate) fn new(data: Seed, expiration: DateTime<Utc>, matched: bool) -> Self {
        Self { data: Some(data), expiration: Some(expiration), matched }
    }

    /// The verdict for a request that presented no credential at all: no
    /// data, no expiration, never valid.
    pub fn rejected() -> Self {
        Self { data: None, expiration: None, matched: false }
    }

    /// The seed data recovered from the credential.
    pub fn data(&self) -> Option<&Seed> {
        self.data.as_ref()
    }

    /// When the credential expires.
    pub fn expiration(&self) -> Option<DateTime<Utc>> {
        self.expiration
    }

    /// Whether the credential is authentic and still fresh.
    pub fn is_valid(&self) -> bool {
        self.matched && self.expiration.map(|at| Utc::now() <= at).unwrap_or(false)
    }
}
