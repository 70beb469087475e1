//! `appsearch`: compile compact query strings such as
//! `status=APPROVED,user.name:~smith` into predicates over accounts,
//! users, and applications, and evaluate them against a record store.

pub mod cli;
pub mod models;
pub mod search;
pub mod server;
pub mod store;
