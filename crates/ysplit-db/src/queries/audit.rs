//! Audit log.
//!
//! Append-only. Rows are written in the order components emitted them, so
//! the autoincrement id is the emission order.

use rusqlite::Connection;
use ysplit_types::events::AuditEvent;

use crate::{parse_address, Result};

/// A stored audit entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRow {
    pub id: i64,
    /// Component that emitted the event (`registry`, `allowances`, `executor`).
    pub component: String,
    pub event: AuditEvent,
    pub created_at: u64,
}

/// Append events in order.
pub fn append(conn: &Connection, component: &str, events: &[AuditEvent], now: u64) -> Result<()> {
    if events.is_empty() {
        return Ok(());
    }
    let mut stmt = conn.prepare(
        "INSERT INTO audit_log (component, actor, event_type, payload, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for event in events {
        stmt.execute(rusqlite::params![
            component,
            event.actor.to_string(),
            event.kind.name(),
            serde_json::to_string(&event.kind)?,
            now as i64,
        ])?;
    }
    tracing::debug!(component, count = events.len(), "audit events appended");
    Ok(())
}

/// Most recent entries, newest first. `event_type` filters on the event name.
pub fn recent(conn: &Connection, limit: u32, event_type: Option<&str>) -> Result<Vec<AuditRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, component, actor, payload, created_at FROM audit_log
         WHERE ?1 IS NULL OR event_type = ?1
         ORDER BY id DESC LIMIT ?2",
    )?;
    let raw = stmt
        .query_map(rusqlite::params![event_type, limit], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, i64>(4)? as u64,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    raw.into_iter()
        .map(|(id, component, actor, payload, created_at)| {
            Ok(AuditRow {
                id,
                component,
                event: AuditEvent::new(parse_address(&actor)?, serde_json::from_str(&payload)?),
                created_at,
            })
        })
        .collect()
}

/// Total number of entries.
pub fn count(conn: &Connection) -> Result<u64> {
    let n: i64 = conn.query_row("SELECT COUNT(*) FROM audit_log", [], |row| row.get(0))?;
    Ok(n as u64)
}
