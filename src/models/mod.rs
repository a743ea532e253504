pub mod expense;

pub use expense::{timestamp_now, Category, Expense, ExpensePayload, NewExpense};
