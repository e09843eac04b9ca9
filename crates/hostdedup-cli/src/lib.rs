//! # hostdedup-cli
//!
//! Pipeline driver around `hostdedup-core`.
//!
//! ## Features
//!
//! - **Deduplication**: read raw Qualys / Crowdstrike exports, emit upsert documents
//! - **Scoring**: inspect the pairwise similarity breakdown of host records
//! - **Normalization**: try the hostname / IP / MAC normalizers by hand
//! - **Educational mode**: `--explain` describes each pipeline stage
//! - **Multiple output formats**: Pretty tables, JSON, CSV, YAML

pub mod cli;
pub mod config;
pub mod education;
pub mod output;

pub use cli::run;
