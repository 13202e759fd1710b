//! The form fields shared by the create and edit transaction forms.

use maud::{Markup, html};
use time::PrimitiveDateTime;

use crate::{
    html::{
        FORM_LABEL_STYLE, FORM_RADIO_GROUP_STYLE, FORM_RADIO_INPUT_STYLE, FORM_RADIO_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE,
    },
    transaction::core::{CREATED_AT_INPUT_FORMAT, TransactionType},
};

/// The initial values of the transaction form fields.
pub struct TransactionFormDefaults<'a> {
    pub transaction_type: TransactionType,
    pub amount: Option<f64>,
    pub description: Option<&'a str>,
    pub category: &'a str,
    /// Leave empty to let the server use the current time.
    pub created_at: Option<PrimitiveDateTime>,
}

impl Default for TransactionFormDefaults<'_> {
    fn default() -> Self {
        Self {
            transaction_type: TransactionType::Expense,
            amount: None,
            description: None,
            category: "",
            created_at: None,
        }
    }
}

fn type_radio(value: TransactionType, checked: bool) -> Markup {
    let id = format!("transaction-type-{}", value.as_str());

    html! {
        div class="flex items-center gap-3"
        {
            input
                name="type"
                id=(id)
                type="radio"
                value=(value.as_str())
                checked[checked]
                required
                tabindex="0"
                class=(FORM_RADIO_INPUT_STYLE);

            label for=(id) class=(FORM_RADIO_LABEL_STYLE) { (value) }
        }
    }
}

pub fn transaction_form_fields(defaults: &TransactionFormDefaults<'_>) -> Markup {
    let amount_str = defaults.amount.map(|amount| format!("{amount:.2}"));
    let created_at_str = defaults
        .created_at
        .and_then(|created_at| created_at.format(CREATED_AT_INPUT_FORMAT).ok());

    html! {
        fieldset class="space-y-2"
        {
            legend class=(FORM_LABEL_STYLE) { "Transaction type" }

            div class=(FORM_RADIO_GROUP_STYLE)
            {
                (type_radio(TransactionType::Expense, defaults.transaction_type == TransactionType::Expense))
                (type_radio(TransactionType::Income, defaults.transaction_type == TransactionType::Income))
            }
        }

        div
        {
            label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

            input
                name="amount"
                id="amount"
                type="number"
                step="0.01"
                min="0"
                placeholder="0.00"
                required
                value=[amount_str.as_deref()]
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div
        {
            label for="description" class=(FORM_LABEL_STYLE) { "Description" }

            input
                name="description"
                id="description"
                type="text"
                placeholder="Description"
                value=[defaults.description]
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div
        {
            label for="category" class=(FORM_LABEL_STYLE) { "Category" }

            input
                name="category"
                id="category"
                type="text"
                placeholder="e.g. food"
                value=(defaults.category)
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div
        {
            label for="created_at" class=(FORM_LABEL_STYLE) { "Date and time" }

            input
                name="created_at"
                id="created_at"
                type="datetime-local"
                value=[created_at_str.as_deref()]
                class=(FORM_TEXT_INPUT_STYLE);
        }
    }
}
