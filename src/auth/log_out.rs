//! Ending a Smart Money session.

use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::PrivateCookieJar;

use crate::{
    auth::{get_token_from_cookies, invalidate_auth_cookie},
    endpoints,
};

/// Expire the session cookie and send the user back to the log-in page.
///
/// Visiting this route without a session is harmless and lands on the same page.
pub async fn get_log_out(jar: PrivateCookieJar) -> Response {
    if let Ok(token) = get_token_from_cookies(&jar) {
        tracing::info!("User {} logged out", token.user_id);
    }

    let jar = invalidate_auth_cookie(jar);

    (jar, Redirect::to(endpoints::LOG_IN)).into_response()
}
