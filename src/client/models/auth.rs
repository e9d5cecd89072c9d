//! Authentication models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Bearer token issued by one of the Jamf Pro token endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BearerToken {
    /// The opaque token string
    pub token: String,

    /// Absolute instant after which the token must not be used
    pub expires_at: DateTime<Utc>,
}

impl BearerToken {
    /// Whether the token can still be used at `now`
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.token.is_empty() && now < self.expires_at
    }
}
