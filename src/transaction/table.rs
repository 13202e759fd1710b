//! The table of a user's transactions shown on the dashboard.

use maud::{Markup, html};

use crate::{
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_DELETE_STYLE, CATEGORY_BADGE_STYLE, LINK_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, format_currency,
    },
    transaction::{Transaction, TransactionType},
};

const INCOME_AMOUNT_STYLE: &str = "text-green-600 dark:text-green-400";
const EXPENSE_AMOUNT_STYLE: &str = "text-red-600 dark:text-red-400";

fn transaction_row(transaction: &Transaction) -> Markup {
    let edit_url = format_endpoint(endpoints::EDIT_TRANSACTION, transaction.id);
    let delete_url = format_endpoint(endpoints::DELETE_TRANSACTION, transaction.id);
    let amount_style = match transaction.type_ {
        TransactionType::Income => INCOME_AMOUNT_STYLE,
        TransactionType::Expense => EXPENSE_AMOUNT_STYLE,
    };

    html! {
        tr class=(TABLE_ROW_STYLE) data-transaction-id=(transaction.id)
        {
            td class=(TABLE_CELL_STYLE) { (transaction.created_at_string()) }
            td class=(TABLE_CELL_STYLE) { (transaction.type_) }
            td class={(TABLE_CELL_STYLE) " text-right " (amount_style)}
            {
                (format_currency(transaction.signed_amount()))
            }
            td class=(TABLE_CELL_STYLE) { (transaction.description.as_deref().unwrap_or_default()) }
            td class=(TABLE_CELL_STYLE)
            {
                @if !transaction.category.is_empty() {
                    span class=(CATEGORY_BADGE_STYLE) { (transaction.category) }
                }
            }
            td class={(TABLE_CELL_STYLE) " flex gap-4"}
            {
                a href=(edit_url) class=(LINK_STYLE) { "Edit" }

                form method="post" action=(delete_url)
                {
                    button type="submit" class=(BUTTON_DELETE_STYLE) { "Delete" }
                }
            }
        }
    }
}

/// Render `transactions` in the order given, newest first as loaded from the database.
pub fn transactions_table(transactions: &[Transaction]) -> Markup {
    html! {
        div class="overflow-x-auto rounded-lg shadow w-full"
        {
            table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Type" }
                        th scope="col" class={(TABLE_CELL_STYLE) " text-right"} { "Amount" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                    }
                }

                tbody
                {
                    @for transaction in transactions {
                        (transaction_row(transaction))
                    }

                    @if transactions.is_empty() {
                        tr class=(TABLE_ROW_STYLE)
                        {
                            td colspan="6" class={(TABLE_CELL_STYLE) " text-center"}
                            {
                                "No transactions yet. Add one with the form above."
                            }
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use scraper::{Html, Selector};
    use time::macros::datetime;

    use crate::{
        auth::UserID,
        transaction::{Transaction, TransactionType},
    };

    use super::transactions_table;

    fn transaction(id: i64, type_: TransactionType, amount: f64, category: &str) -> Transaction {
        Transaction {
            id,
            user_id: UserID::new(1),
            type_,
            amount,
            description: Some(format!("transaction {id}")),
            category: category.to_owned(),
            created_at: datetime!(2025-01-02 03:04),
        }
    }

    fn render(transactions: &[Transaction]) -> Html {
        Html::parse_fragment(&transactions_table(transactions).into_string())
    }

    #[test]
    fn renders_row_per_transaction_with_actions() {
        let transactions = [
            transaction(2, TransactionType::Expense, 12.5, "food"),
            transaction(1, TransactionType::Income, 100.0, ""),
        ];

        let html = render(&transactions);

        let row_selector = Selector::parse("tbody tr[data-transaction-id]").unwrap();
        let rows = html.select(&row_selector).collect::<Vec<_>>();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].value().attr("data-transaction-id"), Some("2"));

        let text = rows[0].text().collect::<String>();
        assert!(text.contains("2025-01-02 03:04"), "got {text}");
        assert!(text.contains("-$12.50"), "got {text}");
        assert!(text.contains("food"), "got {text}");

        let edit_selector = Selector::parse("a[href='/transaction/edit/2']").unwrap();
        assert!(html.select(&edit_selector).next().is_some());
        let delete_selector =
            Selector::parse("form[method=post][action='/transaction/delete/1']").unwrap();
        assert!(html.select(&delete_selector).next().is_some());
    }

    #[test]
    fn empty_category_has_no_badge() {
        let html = render(&[transaction(1, TransactionType::Income, 5.0, "")]);

        let badge_selector = Selector::parse("span.rounded-full").unwrap();
        assert_eq!(html.select(&badge_selector).count(), 0);
    }

    #[test]
    fn renders_empty_state() {
        let html = render(&[]);

        let text = html.root_element().text().collect::<String>();
        assert!(text.contains("No transactions yet"), "got {text}");
    }
}
