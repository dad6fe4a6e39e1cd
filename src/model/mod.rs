//! Types that represent the core data model, such as `Expense` and `Category`.
mod amount;
mod category;
mod expense;
mod payer;

pub use amount::{Amount, AmountError};
pub use category::Category;
pub use expense::{Expense, ExpenseId, ExpenseUpdate, NewExpense};
pub use payer::Payer;
