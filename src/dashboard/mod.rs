//! Dashboard module
//!
//! Shows the user's transactions alongside budget suggestions, a monthly trend chart,
//! a next month forecast and an expense breakdown by category.

mod aggregation;
mod charts;
mod forecast;
mod handlers;
mod suggestions;

pub use handlers::{DashboardState, get_dashboard_page};
