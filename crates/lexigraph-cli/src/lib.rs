//! Lexigraph CLI
//!
//! Thin command layer over the ingestion pipeline and the SQLite store.

pub mod cli;
pub mod commands;
