//! Split rule queries.

use rusqlite::Connection;
use ysplit_types::{IncomeStream, RuleScope, Split};

use crate::{parse_amount, DbError, Result};

/// A stored rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleRow {
    pub stream: IncomeStream,
    pub scope: RuleScope,
    pub rule: Split,
    pub updated_at: u64,
}

/// Insert or replace one rule.
pub fn upsert(
    conn: &Connection,
    stream: IncomeStream,
    scope: RuleScope,
    rule: &Split,
    now: u64,
) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO split_rules (stream, scope, ybs, treasury, remainder, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            stream.as_str(),
            scope.as_str(),
            rule.ybs.to_string(),
            rule.treasury.to_string(),
            rule.remainder.to_string(),
            now as i64,
        ],
    )?;
    Ok(())
}

/// Every stored rule, ordered by stream then scope name.
pub fn list(conn: &Connection) -> Result<Vec<RuleRow>> {
    let mut stmt = conn.prepare(
        "SELECT stream, scope, ybs, treasury, remainder, updated_at
         FROM split_rules ORDER BY stream, scope",
    )?;
    let raw = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, i64>(5)? as u64,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    raw.into_iter()
        .map(|(stream, scope, ybs, treasury, remainder, updated_at)| {
            Ok(RuleRow {
                stream: IncomeStream::parse(&stream)
                    .ok_or_else(|| DbError::Serialization(format!("stored stream '{stream}'")))?,
                scope: RuleScope::parse(&scope)
                    .ok_or_else(|| DbError::Serialization(format!("stored scope '{scope}'")))?,
                rule: Split::new(
                    parse_amount(&ybs)?,
                    parse_amount(&treasury)?,
                    parse_amount(&remainder)?,
                ),
                updated_at,
            })
        })
        .collect()
}

/// Number of stored rules. A complete rule set has eight.
pub fn count(conn: &Connection) -> Result<u32> {
    let n: i64 = conn.query_row("SELECT COUNT(*) FROM split_rules", [], |row| row.get(0))?;
    Ok(n as u32)
}
