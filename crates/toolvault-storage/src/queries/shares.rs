// SPDX-FileCopyrightText: 2026 Toolvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Share token and share access log operations.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use toolvault_core::types::{format_timestamp, ShareAccessLog, ShareTokenRecord};
use toolvault_core::ToolvaultError;

use crate::database::{map_tr_err, Database};
use crate::queries::get_timestamp;

const SHARE_COLUMNS: &str = "id, token, credential_id, created_by, expires_at, max_views, views, \
     one_time, revoked, require_secret, secret_key_salt, secret_key_hash, created_at";

fn share_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ShareTokenRecord> {
    Ok(ShareTokenRecord {
        id: row.get(0)?,
        token: row.get(1)?,
        credential_id: row.get(2)?,
        created_by: row.get(3)?,
        expires_at: get_timestamp(row, 4)?,
        max_views: row.get(5)?,
        views: row.get(6)?,
        one_time: row.get(7)?,
        revoked: row.get(8)?,
        require_secret: row.get(9)?,
        secret_key_salt: row.get(10)?,
        secret_key_hash: row.get(11)?,
        created_at: get_timestamp(row, 12)?,
    })
}

/// Insert a share token row.
pub async fn insert_share_token(db: &Database, token: &ShareTokenRecord) -> Result<(), ToolvaultError> {
    let t = token.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO share_tokens (id, token, credential_id, created_by, expires_at, max_views, views,
                                           one_time, revoked, require_secret, secret_key_salt, secret_key_hash, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    t.id,
                    t.token,
                    t.credential_id,
                    t.created_by,
                    format_timestamp(t.expires_at),
                    t.max_views,
                    t.views,
                    t.one_time,
                    t.revoked,
                    t.require_secret,
                    t.secret_key_salt,
                    t.secret_key_hash,
                    format_timestamp(t.created_at),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Look a share up by its public token.
pub async fn find_share_token(db: &Database, token: &str) -> Result<Option<ShareTokenRecord>, ToolvaultError> {
    let token = token.to_string();
    db.connection()
        .call(move |conn| {
            let sql = format!("SELECT {SHARE_COLUMNS} FROM share_tokens WHERE token = ?1");
            conn.query_row(&sql, params![token], share_from_row)
                .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Consume one view of a share token if it is still live at `now`.
///
/// The conditional update and the success log row commit together. Two
/// concurrent consumers of a one-time token cannot both see a changed row:
/// the first flips `revoked`, so the second matches nothing.
pub async fn consume_share_token(
    db: &Database,
    id: &str,
    now: DateTime<Utc>,
    ip_address: Option<&str>,
) -> Result<bool, ToolvaultError> {
    let id = id.to_string();
    let now = format_timestamp(now);
    let ip_address = ip_address.map(str::to_string);
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let changed = tx.execute(
                "UPDATE share_tokens
                 SET views = views + 1,
                     revoked = CASE WHEN one_time = 1 THEN 1 ELSE revoked END
                 WHERE id = ?1 AND revoked = 0 AND expires_at > ?2",
                params![id, now],
            )?;
            if changed == 0 {
                tx.rollback()?;
                return Ok(false);
            }
            tx.execute(
                "INSERT INTO share_access_logs (share_token_id, ip_address, success, accessed_at)
                 VALUES (?1, ?2, 1, ?3)",
                params![id, ip_address, now],
            )?;
            tx.commit()?;
            Ok(true)
        })
        .await
        .map_err(map_tr_err)
}

/// Mark a share token revoked. Returns `false` when no token matched.
pub async fn revoke_share_token(db: &Database, id: &str) -> Result<bool, ToolvaultError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE share_tokens SET revoked = 1 WHERE id = ?1",
                params![id],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Append a share access log entry.
pub async fn record_share_access(db: &Database, entry: &ShareAccessLog) -> Result<(), ToolvaultError> {
    let entry = entry.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO share_access_logs (share_token_id, ip_address, success) VALUES (?1, ?2, ?3)",
                params![entry.share_token_id, entry.ip_address, entry.success],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Count access log rows for a share, split into (successes, failures).
pub async fn access_log_counts(db: &Database, share_token_id: &str) -> Result<(u32, u32), ToolvaultError> {
    let id = share_token_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT COALESCE(SUM(success = 1), 0), COALESCE(SUM(success = 0), 0)
                 FROM share_access_logs WHERE share_token_id = ?1",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
        })
        .await
        .map_err(map_tr_err)
}
