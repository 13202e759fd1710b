//! One-shot flash messages carried across a redirect in a private cookie.
//!
//! A handler that redirects after a form submission stores an [Alert] with
//! [flash_redirect]. The page that the client lands on reads and clears it with
//! [take_flash].

use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, SameSite},
};

use crate::alert::Alert;

/// The name of the cookie holding the flash message.
pub(crate) const COOKIE_FLASH: &str = "flash";

/// Store `alert` in the cookie jar to be shown on the next page load.
///
/// If the alert cannot be serialized the jar is returned unchanged.
pub(crate) fn set_flash(jar: PrivateCookieJar, alert: &Alert) -> PrivateCookieJar {
    match serde_json::to_string(alert) {
        Ok(value) => jar.add(
            Cookie::build((COOKIE_FLASH, value))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .secure(true),
        ),
        Err(error) => {
            tracing::error!("Could not serialize flash message {alert:?}: {error}");
            jar
        }
    }
}

/// Remove the flash message from the cookie jar and return it, if there is one.
///
/// A cookie that cannot be decrypted or deserialized is discarded.
pub(crate) fn take_flash(jar: PrivateCookieJar) -> (PrivateCookieJar, Option<Alert>) {
    let Some(cookie) = jar.get(COOKIE_FLASH) else {
        return (jar, None);
    };

    let alert = serde_json::from_str(cookie.value())
        .inspect_err(|error| tracing::warn!("Discarding invalid flash message: {error}"))
        .ok();
    let jar = jar.remove(Cookie::build(COOKIE_FLASH).path("/"));

    (jar, alert)
}

/// Redirect the client to `location` and show `alert` on the page it lands on.
pub(crate) fn flash_redirect(jar: PrivateCookieJar, alert: Alert, location: &str) -> Response {
    (set_flash(jar, &alert), Redirect::to(location)).into_response()
}
