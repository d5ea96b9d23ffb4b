//! # Quiznews
//!
//! Quiz and head-to-head challenge logic for a news quiz application.
//! Users answer fixed samples of multiple choice questions either alone,
//! earning profile points, or against another user through a challenge
//! whose answers are kept in a shared response ledger. All persistence goes
//! through the [`store::RecordStore`] trait.

#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::module_name_repetitions)]

pub mod challenge;
pub mod config;
pub mod constants;
pub mod cursor;
pub mod error;
pub mod ids;
pub mod model;
pub mod quiz;
pub mod records;
pub mod scoring;
pub mod session;
pub mod store;

#[cfg(test)]
mod testing;

pub use config::Options;
pub use error::{Error, Result};
pub use session::UserSession;
