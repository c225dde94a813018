//! OCaml Documentation MCP Service
//!
//! This crate provides a Model Context Protocol (MCP) service for browsing and
//! searching OCaml package documentation. Published packages are read from
//! sage.ci.dev, signatures are searched with Sherlodoc, and locally generated
//! odoc output can be browsed from a directory.
//!
//! # Features
//!
//! - Search names and type signatures across all packages
//! - Find packages by name and summarize their libraries and modules
//! - Extract a module's preamble and declarations from odoc pages
//! - Resolve version prefixes and `latest` against published versions
//! - Browse local odoc output
//!
//! # Modules
//!
//! - [`version`]: Lenient version ordering and matching
//! - [`docs_parser`]: Text extraction from odoc HTML
//! - [`client`]: HTTP access to sage.ci.dev and Sherlodoc
//! - [`local`]: Local odoc output directories
//! - [`mcp`]: MCP tool implementations
//! - [`server`]: SSE and stdio transports

pub mod client;
pub mod config;
pub mod docs_parser;
pub mod error;
pub mod local;
pub mod mcp;
pub mod server;
pub mod version;
