use serde_json::{json, Value};

use crate::cli::OutputFormat;
use crate::models::Expense;

/// Output a success message in the appropriate format
pub fn output_success(
    output_format: &OutputFormat,
    message: &str,
    data: Option<Value>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let Some(data_value) = data {
                response["data"] = data_value;
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output an error message in the appropriate format
pub fn output_error(
    output_format: &OutputFormat,
    message: &str,
    error_code: Option<&str>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": false,
                "error": message
            });

            if let Some(code) = error_code {
                response["error_code"] = json!(code);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            eprintln!("Error: {}", message);
        }
    }
    Ok(())
}

/// Output a list of expenses as JSON or an aligned text table
pub fn output_expenses(output_format: &OutputFormat, expenses: &[Expense]) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({ "expenses": expenses }))?);
        }
        OutputFormat::Text => {
            if expenses.is_empty() {
                println!("No items yet.");
                return Ok(());
            }
            println!("Your List ({})", expenses.len());
            for expense in expenses {
                println!("{}", format_expense_line(expense));
            }
            let total: f64 = expenses.iter().map(|e| e.value).sum();
            println!("Total: {:.2}", total);
        }
    }
    Ok(())
}

/// Output a single expense
pub fn output_expense(output_format: &OutputFormat, expense: &Expense) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(expense)?),
        OutputFormat::Text => {
            println!("ID:       {}", expense.id);
            println!("Title:    {}", expense.title);
            println!("Category: {}", expense.category);
            println!("Value:    {:.2}", expense.value);
            println!("Created:  {}", expense.created_at.to_rfc3339());
            println!("Updated:  {}", expense.updated_at.to_rfc3339());
        }
    }
    Ok(())
}

pub fn format_expense_line(expense: &Expense) -> String {
    format!(
        "{}  {:<8} {:>10.2}  {}",
        expense.id, expense.category, expense.value, expense.title
    )
}
