pub mod hash;
pub mod transaction;

pub use transaction::{
    SourceType, Transaction, TransactionField, TransactionType, UNRECOGNIZED_CATEGORY,
};
