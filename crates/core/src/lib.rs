//! QKart Core - Shared types library.
//!
//! This crate provides common types used across all QKart client components:
//! - `storefront` - API client, session store, cart and search state
//! - `cli` - Command-line front end
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no persistence. This keeps it lightweight and allows it to be
//! used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Product and cart records, type-safe IDs, form validation
//! - [`cart`] - Reconciliation of sparse cart entries against the catalog

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod types;

pub use cart::{reconcile, total_count, total_quantity, total_value};
pub use types::*;
