//! Data access, one module per table. Functions take any `ConnectionTrait`
//! so they run the same on the pool or inside a transaction.

pub mod comment;
pub mod post;
pub mod session;
pub mod user;
pub mod vote;

use sea_orm::{DbErr, TransactionError};

pub(crate) fn flatten_tx(err: TransactionError<DbErr>) -> DbErr {
    match err {
        TransactionError::Connection(e) | TransactionError::Transaction(e) => e,
    }
}
