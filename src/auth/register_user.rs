//! The registration page for creating a new account.
use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::{Form, PrivateCookieJar, cookie::Key};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    alert::Alert,
    auth::{PasswordHash, Username, ValidatedPassword, create_user},
    endpoints,
    flash::{flash_redirect, take_flash},
    html::{BUTTON_PRIMARY_STYLE, base, link, log_in_register, password_input, text_input},
};

const FILL_IN_ALL_FIELDS_MSG: &str = "Please fill in all fields.";
const REGISTRATION_SUCCESS_MSG: &str = "Registration successful! Now log in to your account.";

fn registration_form() -> Markup {
    html! {
        form
            method="post"
            action=(endpoints::REGISTER)
            class="space-y-4 md:space-y-6"
        {
            (text_input("username", "Username", "text", true))
            (password_input("password", "Password"))
            (password_input("confirm_password", "Confirm Password"))

            button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                "Create Account"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Already have an account? "
                (link(endpoints::LOG_IN, "Log in here"))
            }
        }
    }
}

/// Display the registration page along with any pending flash message.
pub async fn get_register_page(jar: PrivateCookieJar) -> Response {
    let (jar, flash) = take_flash(jar);
    let content = log_in_register("Create an account", flash, &registration_form());

    (jar, base("Register", &[], &content)).into_response()
}

/// The state needed for creating a new user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The cost used when hashing new passwords.
    pub password_hash_cost: u32,
    /// The database connection for storing the new user.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            password_hash_cost: PasswordHash::DEFAULT_COST,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<RegistrationState> for Key {
    fn from_ref(state: &RegistrationState) -> Self {
        state.cookie_key.clone()
    }
}

/// The raw data entered by the user in the registration form.
#[derive(Serialize, Deserialize)]
pub struct RegisterForm {
    /// The name the user will log in with.
    #[serde(default)]
    pub username: String,
    /// The new password.
    #[serde(default)]
    pub password: String,
    /// The new password, typed a second time.
    pub confirm_password: Option<String>,
}

/// Create a new user from the registration form.
///
/// The user is not logged in. On success the client is redirected to the
/// log-in page, otherwise back to the registration page with a flash message.
pub async fn register_user(
    State(state): State<RegistrationState>,
    jar: PrivateCookieJar,
    Form(user_data): Form<RegisterForm>,
) -> Response {
    let (username, password) = match (
        Username::new(&user_data.username),
        ValidatedPassword::new(&user_data.password),
    ) {
        (Ok(username), Ok(password)) => (username, password),
        _ => {
            return flash_redirect(
                jar,
                Alert::ErrorSimple {
                    message: FILL_IN_ALL_FIELDS_MSG.to_owned(),
                },
                endpoints::REGISTER,
            );
        }
    };

    let passwords_differ = user_data
        .confirm_password
        .as_deref()
        .is_some_and(|confirm_password| confirm_password.trim() != user_data.password.trim());
    if passwords_differ {
        return flash_redirect(
            jar,
            Error::PasswordMismatch.into_alert(),
            endpoints::REGISTER,
        );
    }

    let password_hash = match PasswordHash::new(password, state.password_hash_cost) {
        Ok(hash) => hash,
        Err(error) => {
            tracing::error!("an error occurred while hashing a password: {error}");
            return error.into_response();
        }
    };

    let result = match state.db_connection.lock() {
        Ok(connection) => create_user(username, password_hash, &connection),
        Err(error) => {
            tracing::error!("Could not acquire database lock: {error}");
            Err(Error::DatabaseLockError)
        }
    };

    match result {
        Ok(user) => {
            tracing::info!("Registered user {} with ID {}", user.username, user.id);
            flash_redirect(
                jar,
                Alert::SuccessSimple {
                    message: REGISTRATION_SUCCESS_MSG.to_owned(),
                },
                endpoints::LOG_IN,
            )
        }
        Err(error @ Error::DuplicateUsername(_)) => {
            flash_redirect(jar, error.into_alert(), endpoints::REGISTER)
        }
        Err(error) => {
            tracing::error!("An unhandled error occurred while inserting a new user: {error}");
            error.into_response()
        }
    }
}
