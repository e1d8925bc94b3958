// src/core/mod.rs

// Pure, I/O-free building blocks shared by the orchestrators and the CLI.

/// Data structures exchanged with the backend: scans, users, option values.
pub mod models;

/// The static catalogue of scanning tools and their configurable options.
pub mod registry;

/// Default merging, override validation and summaries of a tool selection.
pub mod options;

/// One decode function per entity for list responses, whatever their envelope.
pub mod envelope;

/// API error type and the routine that turns any failure into a display message.
pub mod error;
