// SPDX-FileCopyrightText: 2026 Toolvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite record store for toolvault.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a single-writer
//! concurrency model via `tokio-rusqlite`, and typed operations for tools,
//! access grants, credentials, share tokens and share access logs.
//!
//! All writes are serialized through tokio-rusqlite's single background
//! thread. Multi-statement operations (share consumption, tool deletion) run
//! inside one closure and one transaction, so no other write interleaves.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod queries;

pub use adapter::SqliteStorage;
pub use database::Database;
