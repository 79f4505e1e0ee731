//! Business logic services for the listing API.
//!
//! # Services
//!
//! - `auth` - Registration, login, bearer tokens and profiles
//! - `catalog` - Property CRUD and search, keeping the index current
//! - `views` - View counting, deduplicated per user per window
//! - `media` - Image upload to Cloudinary

pub mod auth;
pub mod catalog;
pub mod media;
pub mod views;
