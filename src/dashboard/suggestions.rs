//! Budget suggestions from a small logistic regression classifier and the expense ratio.
//!
//! The classifier is fit once per process on a fixed training set. It is a rough heuristic
//! and does not learn from the user's own history.

use std::sync::OnceLock;

use crate::{dashboard::aggregation::income_and_expense_totals, transaction::Transaction};

pub(super) const BALANCED_MSG: &str = "Your budget is balanced. Keep it up!";
pub(super) const NOT_BALANCED_MSG: &str = "Your expenses are too high relative to your income. \
    Consider cutting costs or increasing income.";
pub(super) const HIGH_RATIO_MSG: &str =
    "You are spending more than 80% of your income. Review your expenses.";
pub(super) const LOW_RATIO_MSG: &str =
    "You are spending less than half of your income. Good job saving!";
pub(super) const NO_INCOME_MSG: &str =
    "No income data. Add some transactions to get suggestions.";

const HIGH_RATIO_THRESHOLD: f64 = 0.8;
const LOW_RATIO_THRESHOLD: f64 = 0.5;

/// Rows of `[income, expense]`.
const TRAINING_FEATURES: [[f64; 2]; 6] = [
    [5000.0, 3000.0],
    [6000.0, 4000.0],
    [7000.0, 3500.0],
    [3000.0, 3500.0],
    [4000.0, 4500.0],
    [8000.0, 6000.0],
];
/// 1 is balanced, 0 is not balanced.
const TRAINING_LABELS: [f64; 6] = [1.0, 1.0, 1.0, 0.0, 0.0, 1.0];

const LEARNING_RATE: f64 = 0.1;
const ITERATIONS: usize = 2000;
const L2_PENALTY: f64 = 0.01;

/// A binary logistic regression model over standardized features.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct BalanceClassifier {
    means: [f64; 2],
    std_devs: [f64; 2],
    weights: [f64; 2],
    bias: f64,
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

impl BalanceClassifier {
    /// Fit the model with batch gradient descent and L2 regularization.
    pub fn fit(features: &[[f64; 2]], labels: &[f64]) -> Self {
        let n = features.len() as f64;
        let mut means = [0.0; 2];
        let mut std_devs = [0.0; 2];

        for column in 0..2 {
            means[column] = features.iter().map(|row| row[column]).sum::<f64>() / n;
            let variance = features
                .iter()
                .map(|row| (row[column] - means[column]).powi(2))
                .sum::<f64>()
                / n;
            // A constant column would otherwise divide by zero.
            std_devs[column] = if variance > 0.0 { variance.sqrt() } else { 1.0 };
        }

        let mut model = Self {
            means,
            std_devs,
            weights: [0.0; 2],
            bias: 0.0,
        };
        let scaled: Vec<[f64; 2]> = features.iter().map(|row| model.scale(*row)).collect();

        for _ in 0..ITERATIONS {
            let mut weight_gradient = [0.0; 2];
            let mut bias_gradient = 0.0;

            for (row, label) in scaled.iter().zip(labels) {
                let error = model.probability_scaled(*row) - label;
                weight_gradient[0] += error * row[0];
                weight_gradient[1] += error * row[1];
                bias_gradient += error;
            }

            for (weight, gradient) in model.weights.iter_mut().zip(weight_gradient) {
                *weight -= LEARNING_RATE * (gradient / n + L2_PENALTY * *weight);
            }
            model.bias -= LEARNING_RATE * bias_gradient / n;
        }

        model
    }

    fn scale(&self, row: [f64; 2]) -> [f64; 2] {
        [
            (row[0] - self.means[0]) / self.std_devs[0],
            (row[1] - self.means[1]) / self.std_devs[1],
        ]
    }

    fn probability_scaled(&self, row: [f64; 2]) -> f64 {
        sigmoid(self.weights[0] * row[0] + self.weights[1] * row[1] + self.bias)
    }

    /// The probability that `[income, expense]` is a balanced budget.
    pub fn probability(&self, income: f64, expense: f64) -> f64 {
        self.probability_scaled(self.scale([income, expense]))
    }

    pub fn is_balanced(&self, income: f64, expense: f64) -> bool {
        self.probability(income, expense) >= 0.5
    }
}

fn classifier() -> &'static BalanceClassifier {
    static CLASSIFIER: OnceLock<BalanceClassifier> = OnceLock::new();

    CLASSIFIER.get_or_init(|| BalanceClassifier::fit(&TRAINING_FEATURES, &TRAINING_LABELS))
}

/// Produce the budget suggestions for `transactions`.
///
/// The first suggestion is always the classifier verdict. A second one follows if the
/// expense ratio is above 80% or below 50%, or if there is no income.
pub(super) fn generate_suggestions(transactions: &[Transaction]) -> Vec<&'static str> {
    let totals = income_and_expense_totals(transactions);
    let mut suggestions = Vec::with_capacity(2);

    if classifier().is_balanced(totals.income, totals.expense) {
        suggestions.push(BALANCED_MSG);
    } else {
        suggestions.push(NOT_BALANCED_MSG);
    }

    if totals.income > 0.0 {
        let expense_ratio = totals.expense / totals.income;

        if expense_ratio > HIGH_RATIO_THRESHOLD {
            suggestions.push(HIGH_RATIO_MSG);
        } else if expense_ratio < LOW_RATIO_THRESHOLD {
            suggestions.push(LOW_RATIO_MSG);
        }
    } else {
        suggestions.push(NO_INCOME_MSG);
    }

    suggestions
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use crate::{dashboard::aggregation::test_data::transaction, transaction::TransactionType};

    use super::{
        BALANCED_MSG, BalanceClassifier, HIGH_RATIO_MSG, LOW_RATIO_MSG, NO_INCOME_MSG,
        NOT_BALANCED_MSG, TRAINING_FEATURES, TRAINING_LABELS, classifier, generate_suggestions,
    };

    fn income_and_expense(income: f64, expense: f64) -> Vec<crate::transaction::Transaction> {
        vec![
            transaction(TransactionType::Income, income, "", datetime!(2025-01-01 00:00)),
            transaction(TransactionType::Expense, expense, "", datetime!(2025-01-02 00:00)),
        ]
    }

    #[test]
    fn classifier_learns_training_set_direction() {
        let model = BalanceClassifier::fit(&TRAINING_FEATURES, &TRAINING_LABELS);

        assert!(model.weights[0] > 0.0, "income weight {}", model.weights[0]);
        assert!(model.weights[1] < 0.0, "expense weight {}", model.weights[1]);
        assert!(model.is_balanced(10_000.0, 1_000.0));
        assert!(!model.is_balanced(1_000.0, 10_000.0));
    }

    #[test]
    fn classifier_is_fit_once() {
        assert!(std::ptr::eq(classifier(), classifier()));
    }

    #[test]
    fn low_spending_is_balanced_and_saving() {
        let suggestions = generate_suggestions(&income_and_expense(10_000.0, 1_000.0));

        assert_eq!(suggestions, [BALANCED_MSG, LOW_RATIO_MSG]);
    }

    #[test]
    fn high_spending_is_not_balanced() {
        let suggestions = generate_suggestions(&income_and_expense(1_000.0, 10_000.0));

        assert_eq!(suggestions, [NOT_BALANCED_MSG, HIGH_RATIO_MSG]);
    }

    #[test]
    fn moderate_ratio_adds_no_ratio_message() {
        let suggestions = generate_suggestions(&income_and_expense(10_000.0, 6_000.0));

        assert_eq!(suggestions.len(), 1);
    }

    #[test]
    fn ratio_thresholds_are_exclusive() {
        let at_high = generate_suggestions(&income_and_expense(1_000.0, 800.0));
        let at_low = generate_suggestions(&income_and_expense(1_000.0, 500.0));

        assert!(!at_high.contains(&HIGH_RATIO_MSG));
        assert!(!at_low.contains(&LOW_RATIO_MSG));
    }

    #[test]
    fn no_income_adds_no_income_message() {
        let transactions = [transaction(
            TransactionType::Expense,
            50.0,
            "",
            datetime!(2025-01-02 00:00),
        )];

        let suggestions = generate_suggestions(&transactions);

        assert_eq!(suggestions.len(), 2);
        assert_eq!(suggestions[1], NO_INCOME_MSG);
    }

    #[test]
    fn no_transactions_still_gets_suggestions() {
        let suggestions = generate_suggestions(&[]);

        assert_eq!(suggestions.len(), 2);
        assert_eq!(suggestions[1], NO_INCOME_MSG);
    }
}
