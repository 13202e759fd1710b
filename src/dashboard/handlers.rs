//! Dashboard HTTP handler and view rendering.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    alert::Alert,
    auth::UserID,
    dashboard::{
        charts::{
            DashboardChart, ECHARTS_SCRIPT_URL, category_pie_chart, charts_script, trend_chart,
        },
        forecast::predict_next_month_balance,
        suggestions::generate_suggestions,
    },
    endpoints,
    flash::take_flash,
    html::{BUTTON_PRIMARY_STYLE, HeadElement, PAGE_CONTAINER_STYLE, base, format_currency},
    navigation::NavBar,
    transaction::{
        Transaction, TransactionFormDefaults, get_user_transactions, transaction_form_fields,
        transactions_table,
    },
};

const TREND_CHART_ID: &str = "trend-chart";
const SECTION_HEADER_STYLE: &str = "text-xl font-semibold mb-4";
const CARD_STYLE: &str = "w-full p-4 mb-6 rounded-lg shadow bg-white dark:bg-gray-800";

/// The state needed for displaying the dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The database connection for loading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

impl FromRef<DashboardState> for Key {
    fn from_ref(state: &DashboardState) -> Self {
        state.cookie_key.clone()
    }
}

/// Everything the analytics produce for one user.
struct DashboardData {
    suggestions: Vec<&'static str>,
    forecast: Option<f64>,
    trend_chart: Option<DashboardChart>,
    category_chart: Option<String>,
}

impl DashboardData {
    fn analyze(transactions: &[Transaction]) -> Self {
        Self {
            suggestions: generate_suggestions(transactions),
            forecast: predict_next_month_balance(transactions),
            trend_chart: trend_chart(transactions).map(|chart| DashboardChart {
                id: TREND_CHART_ID,
                options: chart.to_string(),
            }),
            category_chart: category_pie_chart(transactions),
        }
    }
}

/// Display the user's transactions with the add transaction form and analytics.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
    Extension(user_id): Extension<UserID>,
    jar: PrivateCookieJar,
) -> Response {
    let transactions = match state.db_connection.lock() {
        Ok(connection) => get_user_transactions(user_id, &connection),
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            Err(Error::DatabaseLockError)
        }
    };

    let transactions = match transactions {
        Ok(transactions) => transactions,
        Err(error) => {
            tracing::error!("could not get transactions for user {user_id}: {error}");
            return error.into_response();
        }
    };

    let data = DashboardData::analyze(&transactions);
    let (jar, flash) = take_flash(jar);

    (jar, dashboard_view(&transactions, &data, flash)).into_response()
}

fn new_transaction_form() -> Markup {
    let form_fields = transaction_form_fields(&TransactionFormDefaults::default());

    html! {
        section class=(CARD_STYLE)
        {
            h2 class=(SECTION_HEADER_STYLE) { "Add Transaction" }

            form
                method="post"
                action=(endpoints::TRANSACTION)
                class="w-full space-y-4"
            {
                (form_fields)

                button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
                {
                    "Add Transaction"
                }
            }
        }
    }
}

fn analytics_view(data: &DashboardData) -> Markup {
    html! {
        section id="suggestions" class=(CARD_STYLE)
        {
            h2 class=(SECTION_HEADER_STYLE) { "Suggestions" }

            ul class="list-disc list-inside space-y-1"
            {
                @for suggestion in &data.suggestions {
                    li { (suggestion) }
                }
            }
        }

        section id="forecast" class=(CARD_STYLE)
        {
            h2 class=(SECTION_HEADER_STYLE) { "Next Month Forecast" }

            @match data.forecast {
                Some(balance) => {
                    p { "Predicted balance: " strong { (format_currency(balance)) } }
                }
                None => {
                    p { "Add transactions from at least two months to see a forecast." }
                }
            }
        }

        @if let Some(chart) = &data.trend_chart {
            section class=(CARD_STYLE)
            {
                div id=(chart.id) class="min-h-[380px] rounded dark:bg-gray-100" {}
            }
        }

        @if let Some(image) = &data.category_chart {
            section id="category-chart" class=(CARD_STYLE)
            {
                img
                    src=(image)
                    alt="Expense breakdown by category"
                    class="mx-auto max-w-full h-auto";
            }
        }
    }
}

fn dashboard_view(
    transactions: &[Transaction],
    data: &DashboardData,
    flash: Option<Alert>,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div
            id="dashboard-content"
            class={(PAGE_CONTAINER_STYLE) " max-w-screen-xl"}
        {
            @if let Some(alert) = flash {
                div class="w-full mb-4" { (alert.into_html()) }
            }

            div class="grid grid-cols-1 xl:grid-cols-2 gap-4 w-full"
            {
                div { (new_transaction_form()) }
                div { (analytics_view(data)) }
            }

            section class="w-full"
            {
                h2 class=(SECTION_HEADER_STYLE) { "Transactions" }
                (transactions_table(transactions))
            }
        }
    };

    let scripts = match &data.trend_chart {
        Some(chart) => vec![
            HeadElement::ScriptLink(ECHARTS_SCRIPT_URL.to_owned()),
            charts_script(std::slice::from_ref(chart)),
        ],
        None => Vec::new(),
    };

    base("Dashboard", &scripts, &content)
}
