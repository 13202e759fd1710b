//! The 500 page shown when Smart Money cannot finish a request.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use maud::Markup;

use crate::html::error_view;

/// A server error page with a short explanation and a suggested next step.
///
/// Infrastructure failures such as a poisoned database lock use the default text.
/// Configuration problems, like an unknown timezone, fill in their own `fix`.
pub struct InternalServerError<'a> {
    /// What went wrong, in words a user can follow.
    pub description: &'a str,
    /// What the user or operator can do about it.
    pub fix: &'a str,
}

impl Default for InternalServerError<'_> {
    fn default() -> Self {
        Self {
            description: "Sorry, we could not load your finances.",
            fix: "Your saved transactions are unchanged. Try again in a moment \
                  or ask the operator to check the server logs.",
        }
    }
}

impl InternalServerError<'_> {
    fn into_html(self) -> Markup {
        error_view("Internal Server Error", "500", self.description, self.fix)
    }
}

impl IntoResponse for InternalServerError<'_> {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, self.into_html()).into_response()
    }
}

/// Handler for [crate::endpoints::INTERNAL_ERROR_VIEW], which renders the default error page.
pub async fn get_internal_server_error_page() -> Response {
    InternalServerError::default().into_response()
}
