//! This file defines the routes for displaying the log-in page and handling log-in requests.
//! The auth module handles the lower level authentication and cookie auth logic.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{Form, PrivateCookieJar, cookie::Key};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Error,
    auth::{
        get_user_by_username, invalidate_auth_cookie, normalize_redirect_url, set_auth_cookie,
    },
    endpoints,
    flash::{flash_redirect, take_flash},
    html::{BUTTON_PRIMARY_STYLE, base, link, log_in_register, password_input, text_input},
    timezone::get_local_offset,
};

fn log_in_form(redirect_url: Option<&str>) -> Markup {
    html! {
        form
            method="post"
            action=(endpoints::LOG_IN)
            class="space-y-4 md:space-y-6"
        {
            @if let Some(redirect_url) = redirect_url {
                input type="hidden" name="redirect_url" value=(redirect_url);
            }

            (text_input("username", "Username", "text", true))
            (password_input("password", "Password"))

            div class="flex items-center gap-x-3"
            {
                input
                    type="checkbox"
                    name="remember_me"
                    id="remember_me"
                    tabindex="0"
                    class="rounded-xs";

                label
                    for="remember_me"
                    class="block text-sm font-medium text-gray-900 dark:text-white"
                {
                    "Keep me logged in for one week"
                }
            }

            button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                "Log in"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Don't have an account? "
                (link(endpoints::REGISTER, "Register here"))
            }
        }
    }
}

fn parse_redirect_url(raw_url: Option<&str>, source: &str) -> Option<String> {
    match raw_url.and_then(normalize_redirect_url) {
        Some(redirect_url) => Some(redirect_url),
        None => {
            if let Some(redirect_url) = raw_url {
                tracing::warn!("Invalid redirect URL from {source}: {redirect_url}");
            }
            None
        }
    }
}

/// The log-in page URL, keeping `redirect_url` for the next attempt.
fn log_in_url(redirect_url: Option<&str>) -> String {
    redirect_url
        .and_then(|redirect_url| {
            serde_urlencoded::to_string([("redirect_url", redirect_url)]).ok()
        })
        .map(|query| format!("{}?{query}", endpoints::LOG_IN))
        .unwrap_or_else(|| endpoints::LOG_IN.to_owned())
}

/// Display the log-in page along with any pending flash message.
pub async fn get_log_in_page(
    jar: PrivateCookieJar,
    Query(query): Query<RedirectQuery>,
) -> Response {
    let redirect_url = parse_redirect_url(query.redirect_url.as_deref(), "log-in query");
    let (jar, flash) = take_flash(jar);
    let log_in_form = log_in_form(redirect_url.as_deref());
    let content = log_in_register("Log in to your account", flash, &log_in_form);

    (jar, base("Log In", &[], &content)).into_response()
}

/// How long the auth cookie should last if the user selects "remember me" at log-in.
pub const REMEMBER_ME_COOKIE_DURATION: Duration = Duration::days(7);

/// The state needed to perform a login.
#[derive(Debug, Clone)]
pub struct LoginState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The database connection for looking up users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LoginState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<LoginState> for Key {
    fn from_ref(state: &LoginState) -> Self {
        state.cookie_key.clone()
    }
}

/// Handler for log-in requests via the POST method.
///
/// On a successful log-in request, the auth cookie set and the client is
/// redirected to the requested page, or the dashboard if there is none.
/// Otherwise, the client is sent back to the log-in page with a flash message
/// explaining the problem.
pub async fn post_log_in(
    State(state): State<LoginState>,
    jar: PrivateCookieJar,
    Form(user_data): Form<LogInData>,
) -> Response {
    let redirect_url = parse_redirect_url(user_data.redirect_url.as_deref(), "log-in form");
    let redirect_url = redirect_url.as_deref();

    let user = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(error) => {
                tracing::error!("Could not acquire database lock: {error}");
                return Error::DatabaseLockError.into_response();
            }
        };

        get_user_by_username(&user_data.username, &connection)
    };

    let user = match user {
        Ok(user) => user,
        Err(Error::NotFound) => {
            return flash_redirect(
                jar,
                Error::InvalidCredentials.into_alert(),
                &log_in_url(redirect_url),
            );
        }
        Err(error) => {
            tracing::error!("Unhandled error while verifying credentials: {error}");
            return flash_redirect(jar, error.into_alert(), &log_in_url(redirect_url));
        }
    };

    match user.password_hash.verify(&user_data.password) {
        Ok(true) => {}
        Ok(false) => {
            return flash_redirect(
                jar,
                Error::InvalidCredentials.into_alert(),
                &log_in_url(redirect_url),
            );
        }
        Err(error) => {
            tracing::error!("Unhandled error while verifying credentials: {error}");
            return flash_redirect(
                jar,
                Error::HashingError(error.to_string()).into_alert(),
                &log_in_url(redirect_url),
            );
        }
    }

    let cookie_duration = if user_data.remember_me.is_some() {
        REMEMBER_ME_COOKIE_DURATION
    } else {
        state.cookie_duration
    };

    let Some(local_offset) = get_local_offset(&state.local_timezone) else {
        return Error::InvalidTimezoneError(state.local_timezone).into_response();
    };

    let redirect_url = redirect_url.unwrap_or(endpoints::DASHBOARD_VIEW);

    match set_auth_cookie(jar.clone(), user.id, cookie_duration, local_offset) {
        Ok(updated_jar) => {
            tracing::info!("User {} logged in", user.id);
            (updated_jar, Redirect::to(redirect_url)).into_response()
        }
        Err(error) => {
            tracing::error!("Error setting auth cookie: {error}");
            (
                invalidate_auth_cookie(jar),
                Redirect::to(endpoints::INTERNAL_ERROR_VIEW),
            )
                .into_response()
        }
    }
}

/// The query parameters accepted by the log-in page.
#[derive(Deserialize)]
pub struct RedirectQuery {
    /// The page to go to after logging in.
    pub redirect_url: Option<String>,
}

/// The raw data entered by the user in the log-in form.
///
/// The password is stored as a plain string. There is no need for validation here since
/// it will be compared against the password in the database, which has been verified.
#[derive(Clone, Serialize, Deserialize)]
pub struct LogInData {
    /// Username entered during log-in.
    #[serde(default)]
    pub username: String,

    /// Password entered during log-in.
    #[serde(default)]
    pub password: String,

    /// Whether to extend the initial auth cookie duration.
    ///
    /// This value comes from a checkbox, so it either has a string value or is not set
    /// (see the [MDN docs](https://developer.mozilla.org/en-US/docs/Web/HTML/Element/input/checkbox#value_2)).
    /// The `Some` variant should be interpreted as `true` irregardless of the
    /// string value, and the `None` variant should be interpreted as `false`.
    pub remember_me: Option<String>,

    /// Optional URL to redirect to after logging in.
    /// Only accepted from the log-in form submission.
    pub redirect_url: Option<String>,
}


#[cfg(test)]
mod log_in_tests {
    use std::sync::{Arc, Mutex};

    use axum::{extract::State, http::header::SET_COOKIE};
    use axum_extra::extract::{Form, PrivateCookieJar, cookie::Cookie};
    use rusqlite::Connection;
    use time::{Duration, OffsetDateTime};

    use crate::{
        app_state::create_cookie_key,
        auth::{
            COOKIE_TOKEN, DEFAULT_COOKIE_DURATION, PasswordHash, Username, create_user,
            create_user_table,
        },
        endpoints,
        test_utils::{assert_redirect, must_get_flash_message},
    };

    use super::{LogInData, LoginState, REMEMBER_ME_COOKIE_DURATION, post_log_in};

    fn get_test_state() -> LoginState {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        create_user_table(&connection).expect("Could not create user table");
        create_user(
            Username::new_unchecked("alice"),
            PasswordHash::from_raw_password("hunter2", 4).unwrap(),
            &connection,
        )
        .expect("Could not create test user");

        LoginState {
            cookie_key: create_cookie_key("foobar"),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            local_timezone: "Etc/UTC".to_owned(),
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    fn log_in_data(username: &str, password: &str) -> LogInData {
        LogInData {
            username: username.to_owned(),
            password: password.to_owned(),
            remember_me: None,
            redirect_url: None,
        }
    }

    async fn log_in(state: LoginState, data: LogInData) -> axum::response::Response {
        let jar = PrivateCookieJar::new(state.cookie_key.clone());
        post_log_in(State(state), jar, Form(data)).await
    }

    fn get_token_cookie(response: &axum::response::Response) -> Option<Cookie<'static>> {
        response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|header| Cookie::parse(header.to_str().ok()?.to_owned()).ok())
            .find(|cookie| cookie.name() == COOKIE_TOKEN)
    }

    #[track_caller]
    fn assert_expires_in(cookie: &Cookie<'static>, duration: Duration) {
        let expires = cookie.expires_datetime().expect("cookie has no expiry");
        let want = OffsetDateTime::now_utc() + duration;
        assert!(
            (expires - want).abs() < Duration::seconds(2),
            "got expiry {expires:?}, want {want:?}"
        );
    }

    #[tokio::test]
    async fn log_in_succeeds_with_valid_credentials() {
        let response = log_in(get_test_state(), log_in_data("alice", "hunter2")).await;

        assert_redirect(&response, endpoints::DASHBOARD_VIEW);
        let cookie = get_token_cookie(&response).expect("auth cookie not set");
        assert_expires_in(&cookie, DEFAULT_COOKIE_DURATION);
    }

    #[tokio::test]
    async fn log_in_trims_username() {
        let response = log_in(get_test_state(), log_in_data("  alice ", "hunter2")).await;

        assert_redirect(&response, endpoints::DASHBOARD_VIEW);
    }

    #[tokio::test]
    async fn remember_me_extends_auth_cookie() {
        let mut data = log_in_data("alice", "hunter2");
        data.remember_me = Some("on".to_owned());

        let response = log_in(get_test_state(), data).await;

        let cookie = get_token_cookie(&response).expect("auth cookie not set");
        assert_expires_in(&cookie, REMEMBER_ME_COOKIE_DURATION);
    }

    #[tokio::test]
    async fn log_in_redirects_to_requested_url() {
        let mut data = log_in_data("alice", "hunter2");
        data.redirect_url = Some("/transaction/edit/1".to_owned());

        let response = log_in(get_test_state(), data).await;

        assert_redirect(&response, "/transaction/edit/1");
    }

    #[tokio::test]
    async fn log_in_falls_back_on_external_redirect_url() {
        let mut data = log_in_data("alice", "hunter2");
        data.redirect_url = Some("https://example.com".to_owned());

        let response = log_in(get_test_state(), data).await;

        assert_redirect(&response, endpoints::DASHBOARD_VIEW);
    }

    #[tokio::test]
    async fn log_in_fails_with_incorrect_password() {
        let state = get_test_state();
        let key = state.cookie_key.clone();

        let response = log_in(state, log_in_data("alice", "wrong")).await;

        assert_redirect(&response, endpoints::LOG_IN);
        assert!(get_token_cookie(&response).is_none());
        assert_eq!(
            must_get_flash_message(&response, &key),
            "Invalid username or password."
        );
    }

    #[tokio::test]
    async fn log_in_fails_with_unknown_username() {
        let state = get_test_state();
        let key = state.cookie_key.clone();

        let response = log_in(state, log_in_data("bob", "hunter2")).await;

        assert_redirect(&response, endpoints::LOG_IN);
        assert_eq!(
            must_get_flash_message(&response, &key),
            "Invalid username or password."
        );
    }

    #[tokio::test]
    async fn failed_log_in_keeps_redirect_url() {
        let mut data = log_in_data("alice", "wrong");
        data.redirect_url = Some("/dashboard".to_owned());

        let response = log_in(get_test_state(), data).await;

        assert_redirect(&response, "/login?redirect_url=%2Fdashboard");
    }

    #[test]
    fn form_deserialises_without_remember_me() {
        let data: LogInData =
            serde_html_form::from_str("username=alice&password=hunter2").unwrap();

        assert_eq!(data.username, "alice");
        assert!(data.remember_me.is_none());
        assert!(data.redirect_url.is_none());
    }
}
