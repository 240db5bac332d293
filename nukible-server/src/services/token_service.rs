use sha2::{Digest, Sha256};

use crate::errors::AuthError;

/// Validates the access token carried in request query strings.
///
/// Two forms are accepted: a plain `token` parameter compared byte-for-byte,
/// and the keyed form where `hash` must equal the SHA-256 hex digest of
/// `"{ts},{rnr},{token}"`. When `hash` is present it decides alone; a plain
/// token in the same query is ignored.
pub struct TokenService {
    token: String,
}

impl TokenService {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn authorize_query(&self, query: &str) -> Result<(), AuthError> {
        let mut token = None;
        let mut hash = None;
        let mut rnr = None;
        let mut ts = None;
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "token" => token = Some(value.into_owned()),
                "hash" => hash = Some(value.into_owned()),
                "rnr" => rnr = Some(value.into_owned()),
                "ts" => ts = Some(value.into_owned()),
                _ => {}
            }
        }

        let valid = if let Some(hash) = hash {
            match (ts, rnr) {
                (Some(ts), Some(rnr)) => self.verify_hash(&ts, &rnr, &hash),
                _ => false,
            }
        } else if let Some(token) = token {
            self.verify_plain(&token)
        } else {
            false
        };

        if valid { Ok(()) } else { Err(AuthError::InvalidToken) }
    }

    pub fn verify_plain(&self, presented: &str) -> bool {
        presented == self.token
    }

    /// The keyed form ties the digest to a timestamp and request number so
    /// the secret itself never travels on the wire.
    pub fn verify_hash(&self, ts: &str, rnr: &str, presented: &str) -> bool {
        let digest = Sha256::digest(format!("{ts},{rnr},{}", self.token).as_bytes());
        hex::encode(digest) == presented
    }
}
