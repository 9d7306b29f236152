#![doc = "shortcut-sync-core: reconciliation engine for shortcut-sync."]

//! This crate decides which Unity Catalog external tables are missing as OneLake
//! shortcuts and creates them, with bounded concurrency, retry and rate-limit handling.
//! It talks to the outside world only through the traits in [`contract`]; the HTTP
//! clients live in the `shortcut-sync` crate.
//!
//! # Usage
//! Build a [`config::SyncConfig`], provide the three collaborators and call
//! [`synchronise::synchronise`].

pub mod classify;
pub mod config;
pub mod contract;
pub mod creator;
pub mod diff;
pub mod error;
pub mod normalize;
pub mod report;
pub mod synchronise;
