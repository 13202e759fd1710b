//! Transaction aggregation for the dashboard analytics.
//!
//! Groups transactions by calendar month and by expense category.

use std::{collections::BTreeMap, fmt::Display};

use crate::transaction::{Transaction, TransactionType};

/// The label used for expenses without a category.
pub(super) const OTHER_CATEGORY: &str = "Other";

/// A calendar month. Orders chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(super) struct MonthKey {
    pub year: i32,
    pub month: u8,
}

impl MonthKey {
    pub fn of(transaction: &Transaction) -> Self {
        Self {
            year: transaction.created_at.year(),
            month: transaction.created_at.month() as u8,
        }
    }
}

impl Display for MonthKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Sums signed transaction amounts (income positive, expenses negative) per month.
///
/// Only months that have at least one transaction are present.
pub(super) fn monthly_totals(transactions: &[Transaction]) -> BTreeMap<MonthKey, f64> {
    let mut totals = BTreeMap::new();

    for transaction in transactions {
        *totals.entry(MonthKey::of(transaction)).or_insert(0.0) += transaction.signed_amount();
    }

    totals
}

/// Converts monthly totals into chronological labels and values for charting.
pub(super) fn month_labels_and_values(
    monthly_totals: &BTreeMap<MonthKey, f64>,
) -> (Vec<String>, Vec<f64>) {
    monthly_totals
        .iter()
        .map(|(month, total)| (month.to_string(), *total))
        .unzip()
}

/// The plain sums of income and expense amounts.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub(super) struct Totals {
    pub income: f64,
    pub expense: f64,
}

pub(super) fn income_and_expense_totals(transactions: &[Transaction]) -> Totals {
    transactions
        .iter()
        .fold(Totals::default(), |mut totals, transaction| {
            match transaction.type_ {
                TransactionType::Income => totals.income += transaction.amount,
                TransactionType::Expense => totals.expense += transaction.amount,
            }
            totals
        })
}

/// Sums expense amounts per category in lexical order, ignoring income.
///
/// Expenses without a category are grouped under [OTHER_CATEGORY].
pub(super) fn expenses_by_category(transactions: &[Transaction]) -> BTreeMap<String, f64> {
    let mut totals = BTreeMap::new();

    for transaction in transactions
        .iter()
        .filter(|transaction| transaction.type_ == TransactionType::Expense)
    {
        let category = if transaction.category.is_empty() {
            OTHER_CATEGORY
        } else {
            &transaction.category
        };

        *totals.entry(category.to_owned()).or_insert(0.0) += transaction.amount;
    }

    totals
}
