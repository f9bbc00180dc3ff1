//! chat-db - ask natural-language questions about a relational database.
//!
//! This library exposes the core modules for the binary and for integration tests.

pub mod chat;
pub mod cli;
pub mod commands;
pub mod config;
pub mod connection;
pub mod db;
pub mod error;
pub mod llm;
pub mod logging;
pub mod persistence;
pub mod pipeline;
pub mod repl;
pub mod safety;
pub mod session;
