pub mod ledger;
pub mod settings;
pub mod transaction;

pub use ledger::Ledger;
pub use settings::Settings;
pub use transaction::{Transaction, TransactionStatus, TransactionType};
