//! Core types for Homestead.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod view_window;

pub use email::{Email, EmailError};
pub use id::*;
pub use view_window::ViewWindow;
