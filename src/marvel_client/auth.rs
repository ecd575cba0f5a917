//! Request signing for the upstream API.
//!
//! Every request carries `ts`, `apikey` and `hash = md5(ts + private + public)`.
//! MD5 is what the upstream gateway verifies, so it stays.

use std::sync::atomic::{AtomicI64, Ordering};

use super::error::ApiError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthParams {
    pub ts: i64,
    pub apikey: String,
    pub hash: String,
}

impl AuthParams {
    pub fn as_query(&self) -> [(&'static str, String); 3] {
        [
            ("ts", self.ts.to_string()),
            ("apikey", self.apikey.clone()),
            ("hash", self.hash.clone()),
        ]
    }
}

pub struct AuthSigner {
    public_key: String,
    private_key: String,
    last_ts: AtomicI64,
}

impl std::fmt::Debug for AuthSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSigner")
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

impl AuthSigner {
    pub fn new(public_key: impl Into<String>, private_key: impl Into<String>) -> Self {
        AuthSigner {
            public_key: public_key.into(),
            private_key: private_key.into(),
            last_ts: AtomicI64::new(0),
        }
    }

    pub fn has_credentials(&self) -> bool {
        !self.public_key.is_empty() && !self.private_key.is_empty()
    }

    /// Sign with the current time. Timestamps never go backwards within a process.
    pub fn sign(&self) -> Result<AuthParams, ApiError> {
        let now = chrono::Utc::now().timestamp_millis();
        let prev = self.last_ts.fetch_max(now, Ordering::SeqCst);
        self.sign_at(now.max(prev))
    }

    pub fn sign_at(&self, ts: i64) -> Result<AuthParams, ApiError> {
        if self.public_key.is_empty() {
            return Err(ApiError::Configuration("public API key is missing".into()));
        }
        if self.private_key.is_empty() {
            return Err(ApiError::Configuration("private API key is missing".into()));
        }
        let digest = md5::compute(format!("{}{}{}", ts, self.private_key, self.public_key));
        Ok(AuthParams {
            ts,
            apikey: self.public_key.clone(),
            hash: format!("{:x}", digest),
        })
    }
}
