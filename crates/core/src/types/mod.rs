//! Core types for QKart.
//!
//! This module provides the catalog and cart records exchanged with the
//! backend, plus validated form input.

pub mod credential;
pub mod id;
pub mod product;

pub use credential::{LoginForm, RegistrationForm, ValidationError};
pub use id::*;
pub use product::{CartEntry, CartLineItem, Product};
