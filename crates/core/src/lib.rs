//! Homestead Core - Shared types library.
//!
//! This crate provides the domain types shared by the Homestead listing backend
//! and its tooling.
//!
//! # Architecture
//!
//! The core crate contains only types and pure policies - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs and emails, plus the view
//!   deduplication window

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
