//! Next month balance forecast with ordinary least squares.

use crate::{dashboard::aggregation::monthly_totals, transaction::Transaction};

/// Predict the next month's balance from the monthly signed totals.
///
/// Months are indexed `1..=n` in chronological order and a straight line is fit through
/// `(index, total)`. Returns `None` when there are fewer than two months.
pub(super) fn predict_next_month_balance(transactions: &[Transaction]) -> Option<f64> {
    let totals: Vec<f64> = monthly_totals(transactions).into_values().collect();

    if totals.len() < 2 {
        return None;
    }

    let n = totals.len() as f64;
    let mean_x = (n + 1.0) / 2.0;
    let mean_y = totals.iter().sum::<f64>() / n;

    let (covariance, variance) = totals
        .iter()
        .enumerate()
        .map(|(i, y)| ((i + 1) as f64 - mean_x, y - mean_y))
        .fold((0.0, 0.0), |(covariance, variance), (dx, dy)| {
            (covariance + dx * dy, variance + dx * dx)
        });

    let slope = covariance / variance;
    let intercept = mean_y - slope * mean_x;

    Some(intercept + slope * (n + 1.0))
}
