//! Dashboard sessions: tokens issued by the credentials endpoint.

use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};

/// How close to expiry a session is refreshed ahead of use.
pub const REFRESH_MARGIN: SignedDuration = SignedDuration::from_secs(60);

/// Token triple as returned by login and refresh.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Tokens {
    pub access_token: String,
    pub refresh_token: String,

    /// Seconds until the access token expires.
    pub expires_in: i64,
}

/// A signed-in dashboard user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub username: String,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: Timestamp,
}

impl Session {
    pub fn from_tokens(username: &str, tokens: Tokens, now: Timestamp) -> Self {
        let expires_at = now
            .checked_add(SignedDuration::from_secs(tokens.expires_in.max(0)))
            .unwrap_or(now);
        Self {
            username: username.to_string(),
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_at,
        }
    }

    /// Whether the access token is expired or about to be.
    pub fn needs_refresh(&self, now: Timestamp) -> bool {
        now.checked_add(REFRESH_MARGIN)
            .map_or(true, |soon| soon >= self.expires_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(expires_in: i64) -> Tokens {
        Tokens {
            access_token: "a".into(),
            refresh_token: "r".into(),
            expires_in,
        }
    }

    #[test]
    fn expiry_counts_from_issue_time() {
        let now = Timestamp::new(1_700_000_000, 0).unwrap();
        let session = Session::from_tokens("admin", tokens(3600), now);
        assert_eq!(session.expires_at, Timestamp::new(1_700_003_600, 0).unwrap());
    }

    #[test]
    fn refresh_due_inside_margin() {
        let now = Timestamp::new(1_700_000_000, 0).unwrap();
        let session = Session::from_tokens("admin", tokens(3600), now);

        assert!(!session.needs_refresh(now));
        let later = Timestamp::new(1_700_003_550, 0).unwrap();
        assert!(session.needs_refresh(later));
    }

    #[test]
    fn negative_lifetime_is_already_expired() {
        let now = Timestamp::new(1_700_000_000, 0).unwrap();
        let session = Session::from_tokens("admin", tokens(-5), now);
        assert!(session.needs_refresh(now));
    }
}
