//! Batch attribution of sales transactions to representatives and territories.
//!
//! A run loads the representatives' running balances, folds a transaction file into
//! them following a fixed attribution table, rewrites each balance line in place and
//! writes the territory totals from scratch.

mod compute;
pub mod data;
pub mod read;
pub mod registry;
pub mod rules;
pub mod run;
pub mod write;

pub use data::Error;
pub use registry::Registry;
pub use run::{run, Config, Summary};
