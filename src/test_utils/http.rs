use axum::{
    body::Body,
    http::{StatusCode, header::SET_COOKIE},
    response::Response,
};
use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, Key},
};

use crate::{alert::Alert, flash::COOKIE_FLASH};

#[track_caller]
pub(crate) fn assert_status_ok(response: &Response<Body>) {
    assert_eq!(response.status(), StatusCode::OK);
}

#[track_caller]
pub(crate) fn assert_content_type(response: &Response<Body>, content_type: &str) {
    let content_type_header = response
        .headers()
        .get("content-type")
        .expect("content-type header missing");
    assert_eq!(content_type_header, content_type);
}

#[track_caller]
pub(crate) fn get_header(response: &Response<Body>, header_name: &str) -> String {
    let header_error_message = format!("Headers missing {header_name}");

    response
        .headers()
        .get(header_name)
        .expect(&header_error_message)
        .to_str()
        .expect("Could not convert to str")
        .to_string()
}

#[track_caller]
pub(crate) fn assert_redirect(response: &Response<Body>, location: &str) {
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(get_header(response, "location"), location);
}

/// Decrypt the flash message set by `response`, if any.
#[track_caller]
pub(crate) fn get_flash(response: &Response<Body>, key: &Key) -> Option<Alert> {
    let jar = PrivateCookieJar::new(key.clone());

    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|header| Cookie::parse_encoded(header.to_str().ok()?.to_owned()).ok())
        .filter(|cookie| cookie.name() == COOKIE_FLASH)
        .filter_map(|cookie| jar.decrypt(cookie))
        .find_map(|cookie| serde_json::from_str(cookie.value()).ok())
}

/// The message of the flash set by `response`, panicking if there is none.
#[track_caller]
pub(crate) fn must_get_flash_message(response: &Response<Body>, key: &Key) -> String {
    get_flash(response, key)
        .expect("No flash message in response")
        .message()
        .to_owned()
}
