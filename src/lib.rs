#![allow(clippy::doc_markdown)]
#![doc = include_str!("../README.md")]

pub mod accumulator;
pub mod api;
pub mod cli;
pub mod host;
pub mod ledger;
pub mod prelude;
pub mod price;
pub mod quantity;
pub mod reading;
pub mod sensor;
pub mod statistics;
mod tables;
