//! Core business logic for Anggara.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, hierarchy rules, and calculations live here.
//!
//! # Modules
//!
//! - `category` - Category kinds and 3-level hierarchy rules
//! - `rollup` - Derived level-2/level-1 rollup planning
//! - `summary` - Year summary computation and financing classification
//! - `auth` - Password hashing

pub mod auth;
pub mod category;
pub mod rollup;
pub mod summary;
