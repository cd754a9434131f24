// SPDX-FileCopyrightText: 2026 Toolvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool and access grant operations.

use rusqlite::{params, OptionalExtension};
use toolvault_core::types::{format_timestamp, Tool, ToolAccess, ToolPatch};
use toolvault_core::ToolvaultError;

use crate::database::{map_tr_err, Database};
use crate::queries::get_timestamp;

const TOOL_COLUMNS: &str =
    "id, owner_id, name, url, spend_amount, spend_cycle, renewal_date, created_at";

fn tool_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Tool> {
    Ok(Tool {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        url: row.get(3)?,
        spend_amount: row.get(4)?,
        spend_cycle: row.get(5)?,
        renewal_date: row.get(6)?,
        created_at: get_timestamp(row, 7)?,
    })
}

/// Insert a new tool.
pub async fn create_tool(db: &Database, tool: &Tool) -> Result<(), ToolvaultError> {
    let tool = tool.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO tools (id, owner_id, name, url, spend_amount, spend_cycle, renewal_date, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    tool.id,
                    tool.owner_id,
                    tool.name,
                    tool.url,
                    tool.spend_amount,
                    tool.spend_cycle,
                    tool.renewal_date,
                    format_timestamp(tool.created_at),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Get a tool by ID.
pub async fn get_tool(db: &Database, id: &str) -> Result<Option<Tool>, ToolvaultError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let sql = format!("SELECT {TOOL_COLUMNS} FROM tools WHERE id = ?1");
            conn.query_row(&sql, params![id], tool_from_row)
                .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Read a tool together with the grant state of `user_id`, in one statement.
pub async fn tool_access(
    db: &Database,
    tool_id: &str,
    user_id: &str,
) -> Result<Option<ToolAccess>, ToolvaultError> {
    let tool_id = tool_id.to_string();
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let sql = format!(
                "SELECT {TOOL_COLUMNS},
                        EXISTS (SELECT 1 FROM user_access ua WHERE ua.tool_id = tools.id AND ua.user_id = ?2)
                 FROM tools WHERE id = ?1"
            );
            conn.query_row(&sql, params![tool_id, user_id], |row| {
                Ok(ToolAccess {
                    tool: tool_from_row(row)?,
                    has_grant: row.get(8)?,
                })
            })
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Apply a partial update. Returns `false` when no tool matched.
pub async fn update_tool(db: &Database, id: &str, patch: &ToolPatch) -> Result<bool, ToolvaultError> {
    let id = id.to_string();
    let patch = patch.clone();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE tools SET
                    name = COALESCE(?2, name),
                    url = CASE WHEN ?3 THEN ?4 ELSE url END,
                    spend_amount = COALESCE(?5, spend_amount),
                    spend_cycle = COALESCE(?6, spend_cycle),
                    renewal_date = COALESCE(?7, renewal_date)
                 WHERE id = ?1",
                params![
                    id,
                    patch.name,
                    patch.url.is_some(),
                    patch.url.flatten(),
                    patch.spend_amount,
                    patch.spend_cycle,
                    patch.renewal_date,
                ],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Delete a tool. Grants and credentials go with it via `ON DELETE CASCADE`.
pub async fn delete_tool(db: &Database, id: &str) -> Result<bool, ToolvaultError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute("DELETE FROM tools WHERE id = ?1", params![id])?;
            Ok(changed > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Grant `user_id` access to a tool. Granting twice is a no-op.
pub async fn grant_access(db: &Database, tool_id: &str, user_id: &str) -> Result<(), ToolvaultError> {
    let tool_id = tool_id.to_string();
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT OR IGNORE INTO user_access (tool_id, user_id) VALUES (?1, ?2)",
                params![tool_id, user_id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Remove a grant. Returns `false` when none existed.
pub async fn revoke_access(db: &Database, tool_id: &str, user_id: &str) -> Result<bool, ToolvaultError> {
    let tool_id = tool_id.to_string();
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "DELETE FROM user_access WHERE tool_id = ?1 AND user_id = ?2",
                params![tool_id, user_id],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(map_tr_err)
}
