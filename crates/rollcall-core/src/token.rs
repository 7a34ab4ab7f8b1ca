//! Rotating scan tokens

use chrono::{DateTime, SubsecRound, Utc};
use rand::RngCore;
use rand::rngs::OsRng;
use rollcall_api::TokenView;
use rollcall_store::TokenRecord;
use rollcall_util::{SessionId, chrono_duration};
use std::fmt;
use std::time::Duration;

/// Random bytes per token; hex encoding doubles the length
pub const TOKEN_BYTES: usize = 32;

/// The live token of a session, as shown in its QR code
#[derive(Clone, PartialEq, Eq)]
pub struct ScanToken {
    value: String,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl ScanToken {
    /// Generate a fresh token valid for `ttl` from `now`.
    ///
    /// Instants are truncated to milliseconds, the precision the ledger
    /// stores, so a freshly issued token and a re-read one report the same
    /// expiry.
    pub fn issue(now: DateTime<Utc>, ttl: Duration) -> Self {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);

        let issued_at = now.trunc_subsecs(3);
        let expires_at = issued_at
            .checked_add_signed(chrono_duration(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
            .trunc_subsecs(3);

        Self {
            value: hex::encode(bytes),
            issued_at,
            expires_at,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// A token is accepted strictly before its expiry instant
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    pub fn to_record(&self) -> TokenRecord {
        TokenRecord {
            value: self.value.clone(),
            issued_at: self.issued_at,
            expires_at: self.expires_at,
        }
    }

    pub fn to_view(&self, session_id: SessionId) -> TokenView {
        TokenView {
            session_id,
            token: self.value.clone(),
            issued_at: self.issued_at,
            expires_at: self.expires_at,
        }
    }
}

impl From<TokenRecord> for ScanToken {
    fn from(record: TokenRecord) -> Self {
        Self {
            value: record.value,
            issued_at: record.issued_at,
            expires_at: record.expires_at,
        }
    }
}

// Keep token values out of logs
impl fmt::Debug for ScanToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanToken")
            .field("value", &"<redacted>")
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
