// SPDX-FileCopyrightText: 2026 Toolvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for operations on stored entities.

pub mod credentials;
pub mod shares;
pub mod tools;

use chrono::{DateTime, Utc};
use toolvault_core::types::parse_timestamp;

/// Read a persisted RFC 3339 timestamp column.
pub(crate) fn get_timestamp(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_timestamp(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            format!("invalid timestamp `{raw}`").into(),
        )
    })
}
