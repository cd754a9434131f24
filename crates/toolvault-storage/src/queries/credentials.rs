// SPDX-FileCopyrightText: 2026 Toolvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential row operations. Username and password columns hold ciphertext.

use rusqlite::{params, OptionalExtension};
use toolvault_core::types::{format_timestamp, CredentialPatch, CredentialRecord};
use toolvault_core::ToolvaultError;

use crate::database::{map_tr_err, Database};
use crate::queries::get_timestamp;

const CREDENTIAL_COLUMNS: &str =
    "id, tool_id, label, encrypted_username, encrypted_password, created_by, created_at";

fn credential_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<CredentialRecord> {
    Ok(CredentialRecord {
        id: row.get(0)?,
        tool_id: row.get(1)?,
        label: row.get(2)?,
        encrypted_username: row.get(3)?,
        encrypted_password: row.get(4)?,
        created_by: row.get(5)?,
        created_at: get_timestamp(row, 6)?,
    })
}

/// Insert a credential row.
pub async fn insert_credential(db: &Database, credential: &CredentialRecord) -> Result<(), ToolvaultError> {
    let c = credential.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO credentials (id, tool_id, label, encrypted_username, encrypted_password, created_by, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    c.id,
                    c.tool_id,
                    c.label,
                    c.encrypted_username,
                    c.encrypted_password,
                    c.created_by,
                    format_timestamp(c.created_at),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Get a credential by ID.
pub async fn get_credential(db: &Database, id: &str) -> Result<Option<CredentialRecord>, ToolvaultError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let sql = format!("SELECT {CREDENTIAL_COLUMNS} FROM credentials WHERE id = ?1");
            conn.query_row(&sql, params![id], credential_from_row)
                .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// List a tool's credentials, newest first.
pub async fn list_credentials(db: &Database, tool_id: &str) -> Result<Vec<CredentialRecord>, ToolvaultError> {
    let tool_id = tool_id.to_string();
    db.connection()
        .call(move |conn| {
            let sql = format!(
                "SELECT {CREDENTIAL_COLUMNS} FROM credentials
                 WHERE tool_id = ?1 ORDER BY created_at DESC, id DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![tool_id], credential_from_row)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
        })
        .await
        .map_err(map_tr_err)
}

/// Apply a partial update. Returns `false` when no credential matched.
pub async fn update_credential(
    db: &Database,
    id: &str,
    patch: &CredentialPatch,
) -> Result<bool, ToolvaultError> {
    let id = id.to_string();
    let patch = patch.clone();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE credentials SET
                    label = CASE WHEN ?2 THEN ?3 ELSE label END,
                    encrypted_username = COALESCE(?4, encrypted_username),
                    encrypted_password = COALESCE(?5, encrypted_password)
                 WHERE id = ?1",
                params![
                    id,
                    patch.label.is_some(),
                    patch.label.flatten(),
                    patch.encrypted_username,
                    patch.encrypted_password,
                ],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Delete a credential. Share tokens pointing at it are left in place.
pub async fn delete_credential(db: &Database, id: &str) -> Result<bool, ToolvaultError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute("DELETE FROM credentials WHERE id = ?1", params![id])?;
            Ok(changed > 0)
        })
        .await
        .map_err(map_tr_err)
}
