//! Repository implementations
//!
//! Study repositories implement the core traits on [`PgStore`](super::PgStore);
//! accounts work directly on the pool.

mod accounts;
mod audios;
mod problems;
mod quotas;
mod study_records;
mod workbooks;

pub use accounts::{generate_token, hash_token, AccountError, AccountRepo};
