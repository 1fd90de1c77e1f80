//! Core types and trait definitions for the Aula academic records service.
//!
//! This crate is free of HTTP and database dependencies. Every other crate
//! depends on it.

pub mod access;
pub mod catalog;
pub mod certificate;
pub mod enrollment;
pub mod error;
pub mod grade;
pub mod people;
pub mod store;

pub use error::{Error, Result};
