use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Date, Month, PrimitiveDateTime, Time};

use smart_money::{
    PasswordHash, Transaction, TransactionType, Username, ValidatedPassword, create_transaction,
    create_user, initialize_db,
};

/// A utility for creating a test database for the Smart Money server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// The username of the test user.
    #[arg(long, short, default_value = "test")]
    username: String,

    /// The password of the test user.
    #[arg(long, short, default_value = "test")]
    password: String,
}

/// Recurring monthly entries: type, amount, description, category, day of month.
const MONTHLY_TRANSACTIONS: [(TransactionType, f64, &str, &str, u8); 6] = [
    (TransactionType::Income, 4200.0, "Salary", "salary", 1),
    (TransactionType::Expense, 1650.0, "Rent", "housing", 2),
    (TransactionType::Expense, 420.0, "Groceries", "food", 9),
    (TransactionType::Expense, 180.0, "Power and internet", "utilities", 14),
    (TransactionType::Expense, 95.0, "Bus pass", "transport", 16),
    (TransactionType::Expense, 140.0, "Dinner out", "entertainment", 22),
];

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        Some(extension) if !extension.is_empty() => {}
        _ => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test user '{}'...", args.username);

    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked(&args.password),
        PasswordHash::DEFAULT_COST,
    )?;
    let user = create_user(Username::new(&args.username)?, password_hash, &conn)?;

    println!("Creating transactions...");

    let months = [
        Month::January,
        Month::February,
        Month::March,
        Month::April,
        Month::May,
        Month::June,
    ];
    let mut count = 0;

    for (index, month) in months.into_iter().enumerate() {
        // Spending creeps up a little each month so the trend and forecast have a slope.
        let drift = 1.0 + index as f64 * 0.04;

        for (type_, amount, description, category, day) in MONTHLY_TRANSACTIONS {
            let amount = match type_ {
                TransactionType::Income => amount,
                TransactionType::Expense => (amount * drift * 100.0).round() / 100.0,
            };
            let created_at = PrimitiveDateTime::new(
                Date::from_calendar_date(2025, month, day)?,
                Time::from_hms(12, 0, 0)?,
            );

            create_transaction(
                Transaction::build(user.id, type_, amount, created_at)
                    .description(Some(description.to_owned()))
                    .category(category),
                &conn,
            )?;
            count += 1;
        }
    }

    println!("Created {count} transactions.");
    println!("Success!");

    Ok(())
}
