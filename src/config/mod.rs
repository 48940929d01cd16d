// src/config/mod.rs

//! Configuration loading and validation for interact.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk and merge CLI overrides (`loader.rs`).
//! - Validate value ranges and build a [`HarnessConfig`] (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, resolve};
pub use model::{DisplaySection, HarnessConfig, RawConfigFile, SessionSection};
