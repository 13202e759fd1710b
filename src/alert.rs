//! Alert system for displaying success and error messages to users.
//!
//! Alerts are rendered inline at the top of a page. They are also the payload
//! of flash messages, so they can be serialized into a cookie.

use maud::{Markup, html};
use serde::{Deserialize, Serialize};

/// A success or error message, optionally with further details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Alert {
    /// An operation succeeded.
    Success {
        /// The headline.
        message: String,
        /// Extra information.
        details: String,
    },
    /// An operation succeeded and the headline says it all.
    SuccessSimple {
        /// The headline.
        message: String,
    },
    /// An operation failed.
    Error {
        /// The headline.
        message: String,
        /// What went wrong and how to fix it.
        details: String,
    },
    /// An operation failed and the headline says it all.
    ErrorSimple {
        /// The headline.
        message: String,
    },
}

const SUCCESS_STYLE: &str = "p-4 mb-4 text-sm text-green-800 rounded-lg bg-green-50 \
    dark:bg-gray-800 dark:text-green-400";
const ERROR_STYLE: &str = "p-4 mb-4 text-sm text-red-800 rounded-lg bg-red-50 \
    dark:bg-gray-800 dark:text-red-400";

impl Alert {
    /// The headline of the alert.
    pub fn message(&self) -> &str {
        match self {
            Alert::Success { message, .. }
            | Alert::SuccessSimple { message }
            | Alert::Error { message, .. }
            | Alert::ErrorSimple { message } => message,
        }
    }

    /// Render the alert.
    pub fn into_html(self) -> Markup {
        let (style, message, details) = match self {
            Alert::Success { message, details } => (SUCCESS_STYLE, message, Some(details)),
            Alert::SuccessSimple { message } => (SUCCESS_STYLE, message, None),
            Alert::Error { message, details } => (ERROR_STYLE, message, Some(details)),
            Alert::ErrorSimple { message } => (ERROR_STYLE, message, None),
        };

        // Template adapted from https://flowbite.com/docs/components/alerts/
        html! {
            div class=(style) role="alert" data-testid="alert"
            {
                p class="font-medium" { (message) }

                @if let Some(details) = details {
                    p { (details) }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use scraper::{Html, Selector};

    use super::Alert;

    #[test]
    fn renders_message_and_details() {
        let alert = Alert::Error {
            message: "Invalid amount format".to_owned(),
            details: "\"abc\" is not a number".to_owned(),
        };

        let html = Html::parse_fragment(&alert.into_html().into_string());

        let paragraphs: Vec<String> = html
            .select(&Selector::parse("div[role=alert] p").unwrap())
            .map(|p| p.text().collect())
            .collect();
        assert_eq!(
            paragraphs,
            vec!["Invalid amount format", "\"abc\" is not a number"]
        );
    }

    #[test]
    fn round_trips_through_json() {
        let alert = Alert::SuccessSimple {
            message: "Transaction added.".to_owned(),
        };

        let json = serde_json::to_string(&alert).unwrap();

        assert_eq!(json, r#"{"kind":"success_simple","message":"Transaction added."}"#);
        assert_eq!(serde_json::from_str::<Alert>(&json).unwrap(), alert);
    }
}
