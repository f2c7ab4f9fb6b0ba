//! commit-starter library: keeps a local husky config in sync with the
//! canonical copy published by the Conventional Commits starter.
//!
//! The pipeline is fetch (`fetch`) -> merge (`merge`) -> persist, driven by
//! `sync::Synchronizer`.

pub mod config;
pub mod fetch;
pub mod lock;
pub mod merge;
pub mod models;
pub mod output;
pub mod sync;
pub mod utils;
