//! The shared state handed to the router: the Smart Money database and session settings.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use rusqlite::Connection;
use sha2::{Digest, Sha512};
use time::Duration;

use crate::{Error, auth::DEFAULT_COOKIE_DURATION, db::initialize};

/// Everything a Smart Money request handler may need.
///
/// Handlers do not take this directly. Each one extracts a narrower state
/// (e.g. `DashboardState`) through [FromRef].
#[derive(Debug, Clone)]
pub struct AppState {
    /// Encrypts and signs the session and flash cookies.
    pub cookie_key: Key,

    /// How long a session lasts without activity, unless "remember me" was ticked.
    pub cookie_duration: Duration,

    /// Canonical timezone name used for new transaction timestamps and cookie expiry.
    pub local_timezone: String,

    /// The single SQLite connection holding users and transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Open the app on `db_connection`, creating the user and transaction tables if needed.
    ///
    /// `cookie_secret` is hashed into the cookie key, so the same secret keeps existing
    /// sessions valid across restarts. `local_timezone` should be a canonical name such as
    /// "Pacific/Auckland".
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn new(
        db_connection: Connection,
        cookie_secret: &str,
        local_timezone: &str,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            cookie_key: create_cookie_key(cookie_secret),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            local_timezone: local_timezone.to_owned(),
            db_connection: Arc::new(Mutex::new(db_connection)),
        })
    }
}

// lets `PrivateCookieJar` find the key in the router state
impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

/// Derive the 64 byte cookie key from the `SECRET` string.
pub fn create_cookie_key(secret: &str) -> Key {
    let hash = Sha512::digest(secret);

    Key::from(&hash)
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::{auth::count_users, transaction::count_transactions};

    use super::{AppState, create_cookie_key};

    #[test]
    fn new_state_has_empty_tables() {
        let state = AppState::new(Connection::open_in_memory().unwrap(), "foobar", "Etc/UTC")
            .unwrap();

        let connection = state.db_connection.lock().unwrap();
        assert_eq!(count_users(&connection), Ok(0));
        assert_eq!(count_transactions(&connection), Ok(0));
        assert_eq!(state.local_timezone, "Etc/UTC");
    }

    #[test]
    fn cookie_key_depends_only_on_secret() {
        assert_eq!(
            create_cookie_key("foobar").master(),
            create_cookie_key("foobar").master()
        );
        assert_ne!(
            create_cookie_key("foobar").master(),
            create_cookie_key("barfoo").master()
        );
    }
}
