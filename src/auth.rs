//! Dashboard sessions: login, logout, and the gate every dashboard call passes.

use jiff::Timestamp;
use tracing::{info, warn};

use crate::api::{ApiClient, ApiError};
use crate::model::Session;
use crate::storage::{Storage, StorageError};

/// Where the user is sent when a session is required.
pub const LOGIN_ROUTE: &str = "/login";

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("not logged in: run `lapor auth login` ({})", LOGIN_ROUTE)]
    NotLoggedIn,

    #[error("session expired: log in again ({})", LOGIN_ROUTE)]
    Expired,

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("session storage: {0}")]
    Storage(#[from] StorageError),
}

/// Exchange credentials for tokens and keep them.
pub fn login(
    storage: &Storage,
    api: &ApiClient,
    username: &str,
    password: &str,
    now: Timestamp,
) -> Result<Session, AuthError> {
    let tokens = api.login(username, password)?;
    let session = Session::from_tokens(username, tokens, now);
    storage.save_session(&session)?;
    info!(%username, expires_at = %session.expires_at, "logged in");
    Ok(session)
}

pub fn logout(storage: &Storage) -> Result<(), AuthError> {
    storage.clear_session()?;
    Ok(())
}

/// The current session, refreshed first when it is about to expire.
///
/// A failed refresh clears the session; the user has to log in again.
pub fn authorize(storage: &Storage, api: &ApiClient, now: Timestamp) -> Result<Session, AuthError> {
    let session = storage.load_session()?.ok_or(AuthError::NotLoggedIn)?;
    if !session.needs_refresh(now) {
        return Ok(session);
    }

    match api.refresh(&session.refresh_token) {
        Ok(tokens) => {
            let refreshed = Session::from_tokens(&session.username, tokens, now);
            storage.save_session(&refreshed)?;
            info!(username = %refreshed.username, "session refreshed");
            Ok(refreshed)
        }
        Err(e) => {
            warn!(error = %e, "session refresh failed");
            storage.clear_session()?;
            Err(AuthError::Expired)
        }
    }
}

/// Forget a session the backend no longer accepts.
pub fn expire(storage: &Storage) -> AuthError {
    if let Err(e) = storage.clear_session() {
        warn!(error = %e, "failed to clear rejected session");
    }
    AuthError::Expired
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use jiff::SignedDuration;
    use tempfile::TempDir;

    use crate::api::mock::serve;

    fn test_storage() -> (TempDir, Storage) {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path().join("lapor")).unwrap();
        (dir, storage)
    }

    fn client(origin: &str) -> ApiClient {
        ApiClient::new(origin, Duration::from_secs(5)).unwrap()
    }

    fn now() -> Timestamp {
        Timestamp::new(1_750_000_000, 0).unwrap()
    }

    #[test]
    fn login_stores_session() {
        let (_dir, storage) = test_storage();
        let server = serve(vec![(
            200,
            r#"{"access_token": "a1", "refresh_token": "r1", "expires_in": 900}"#,
        )]);

        let session = login(&storage, &client(&server.origin), "admin", "pw", now()).unwrap();
        assert_eq!(session.expires_at, now() + SignedDuration::from_secs(900));
        assert_eq!(storage.load_session().unwrap(), Some(session));
        server.finish();
    }

    #[test]
    fn fresh_session_needs_no_request() {
        let (_dir, storage) = test_storage();
        let server = serve(vec![(
            200,
            r#"{"access_token": "a1", "refresh_token": "r1", "expires_in": 900}"#,
        )]);
        let api = client(&server.origin);
        login(&storage, &api, "admin", "pw", now()).unwrap();
        assert_eq!(server.finish().len(), 1);

        // The server is gone; a refresh attempt would fail.
        let session = authorize(&storage, &api, now()).unwrap();
        assert_eq!(session.access_token, "a1");
    }

    #[test]
    fn expiring_session_is_refreshed() {
        let (_dir, storage) = test_storage();
        let server = serve(vec![
            (200, r#"{"access_token": "a1", "refresh_token": "r1", "expires_in": 60}"#),
            (200, r#"{"data": {"access_token": "a2", "refresh_token": "r2", "expires_in": 900}}"#),
        ]);
        let api = client(&server.origin);
        login(&storage, &api, "admin", "pw", now()).unwrap();

        let session = authorize(&storage, &api, now()).unwrap();
        assert_eq!(session.access_token, "a2");
        assert_eq!(storage.load_session().unwrap().unwrap().refresh_token, "r2");

        let requests = server.finish();
        assert_eq!(requests[1].path, "/api/refresh-token");
    }

    #[test]
    fn failed_refresh_clears_session() {
        let (_dir, storage) = test_storage();
        let server = serve(vec![
            (200, r#"{"access_token": "a1", "refresh_token": "r1", "expires_in": 10}"#),
            (401, r#"{"message": "Refresh token tidak valid"}"#),
        ]);
        let api = client(&server.origin);
        login(&storage, &api, "admin", "pw", now()).unwrap();

        let err = authorize(&storage, &api, now()).unwrap_err();
        assert!(matches!(err, AuthError::Expired));
        assert!(storage.load_session().unwrap().is_none());
        server.finish();
    }

    #[test]
    fn no_session_is_not_logged_in() {
        let (_dir, storage) = test_storage();
        let err = authorize(&storage, &client("http://127.0.0.1:9"), now()).unwrap_err();
        assert!(matches!(err, AuthError::NotLoggedIn));
        assert!(err.to_string().contains("/login"));
    }
}
