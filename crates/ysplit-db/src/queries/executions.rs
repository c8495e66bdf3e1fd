//! Split execution history.

use rusqlite::Connection;
use ysplit_types::{Address, Allocation, Split};

use crate::{parse_address, parse_amount, DbError, Result};

/// One committed split cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRow {
    pub id: i64,
    /// `split` or `deposit_and_split`.
    pub kind: String,
    pub caller: Address,
    pub admin_fee_split: Split,
    pub admin_fee: Allocation,
    pub vote_incentive_split: Split,
    pub vote_incentive: Allocation,
    pub sink_recorded: u128,
    pub executed_at: u64,
}

/// Fields of a new execution; the id is assigned on insert.
#[derive(Debug, Clone, Copy)]
pub struct NewExecution<'a> {
    pub kind: &'a str,
    pub caller: Address,
    pub admin_fee_split: &'a Split,
    pub admin_fee: &'a Allocation,
    pub vote_incentive_split: &'a Split,
    pub vote_incentive: &'a Allocation,
    pub sink_recorded: u128,
}

/// Lifetime sums over every recorded execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    pub executions: u64,
    pub ybs: u128,
    pub treasury: u128,
    pub remainder: u128,
}

/// Record an execution and return its id.
pub fn record(conn: &Connection, execution: &NewExecution<'_>, now: u64) -> Result<i64> {
    conn.execute(
        "INSERT INTO split_executions (kind, caller, admin_fee_split, admin_fee_allocation,
             vote_incentive_split, vote_incentive_allocation, sink_recorded, executed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        rusqlite::params![
            execution.kind,
            execution.caller.to_string(),
            serde_json::to_string(execution.admin_fee_split)?,
            serde_json::to_string(execution.admin_fee)?,
            serde_json::to_string(execution.vote_incentive_split)?,
            serde_json::to_string(execution.vote_incentive)?,
            execution.sink_recorded.to_string(),
            now as i64,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Most recent executions, newest first.
pub fn recent(conn: &Connection, limit: u32) -> Result<Vec<ExecutionRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, kind, caller, admin_fee_split, admin_fee_allocation,
                vote_incentive_split, vote_incentive_allocation, sink_recorded, executed_at
         FROM split_executions ORDER BY id DESC LIMIT ?1",
    )?;
    let raw = stmt
        .query_map([limit], |row| {
            Ok(RawRow {
                id: row.get(0)?,
                kind: row.get(1)?,
                caller: row.get(2)?,
                admin_fee_split: row.get(3)?,
                admin_fee: row.get(4)?,
                vote_incentive_split: row.get(5)?,
                vote_incentive: row.get(6)?,
                sink_recorded: row.get(7)?,
                executed_at: row.get::<_, i64>(8)? as u64,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    raw.into_iter().map(RawRow::decode).collect()
}

/// Sum every recorded execution.
pub fn totals(conn: &Connection) -> Result<Totals> {
    let mut stmt = conn.prepare(
        "SELECT admin_fee_allocation, vote_incentive_allocation FROM split_executions",
    )?;
    let raw = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut totals = Totals::default();
    for (admin, vote) in raw {
        totals.executions += 1;
        for text in [admin, vote] {
            let allocation: Allocation = serde_json::from_str(&text)?;
            totals.ybs = add(totals.ybs, allocation.ybs)?;
            totals.treasury = add(totals.treasury, allocation.treasury)?;
            totals.remainder = add(totals.remainder, allocation.remainder)?;
        }
    }
    Ok(totals)
}

fn add(a: u128, b: u128) -> Result<u128> {
    a.checked_add(b)
        .ok_or_else(|| DbError::Serialization("execution totals overflow u128".into()))
}

struct RawRow {
    id: i64,
    kind: String,
    caller: String,
    admin_fee_split: String,
    admin_fee: String,
    vote_incentive_split: String,
    vote_incentive: String,
    sink_recorded: String,
    executed_at: u64,
}

impl RawRow {
    fn decode(self) -> Result<ExecutionRow> {
        Ok(ExecutionRow {
            id: self.id,
            kind: self.kind,
            caller: parse_address(&self.caller)?,
            admin_fee_split: serde_json::from_str(&self.admin_fee_split)?,
            admin_fee: serde_json::from_str(&self.admin_fee)?,
            vote_incentive_split: serde_json::from_str(&self.vote_incentive_split)?,
            vote_incentive: serde_json::from_str(&self.vote_incentive)?,
            sink_recorded: parse_amount(&self.sink_recorded)?,
            executed_at: self.executed_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Connection {
        crate::open_memory().expect("open test db")
    }

    fn allocation(ybs: u128, treasury: u128, remainder: u128) -> Allocation {
        Allocation {
            ybs,
            treasury,
            remainder,
        }
    }

    fn insert(conn: &Connection, kind: &str, admin: Allocation, vote: Allocation, at: u64) -> i64 {
        let split = Split::from_percent(50, 30, 20);
        record(
            conn,
            &NewExecution {
                kind,
                caller: Address::repeat_byte(0xa0),
                admin_fee_split: &split,
                admin_fee: &admin,
                vote_incentive_split: &split,
                vote_incentive: &vote,
                sink_recorded: admin.ybs + vote.ybs,
            },
            at,
        )
        .expect("record")
    }

    #[test]
    fn test_record_and_recent() {
        let conn = test_db();
        let first = insert(&conn, "split", allocation(5, 3, 2), allocation(0, 0, 0), 100);
        let second = insert(&conn, "deposit_and_split", allocation(50, 30, 20), allocation(6, 4, 0), 200);
        assert!(second > first);

        let rows = recent(&conn, 10).expect("recent");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, second);
        assert_eq!(rows[0].kind, "deposit_and_split");
        assert_eq!(rows[0].vote_incentive, allocation(6, 4, 0));
        assert_eq!(rows[0].sink_recorded, 56);
        assert_eq!(rows[1].admin_fee_split, Split::from_percent(50, 30, 20));
        assert_eq!(rows[1].executed_at, 100);
    }

    #[test]
    fn test_totals() {
        let conn = test_db();
        assert_eq!(totals(&conn).expect("empty"), Totals::default());
        insert(&conn, "split", allocation(5, 3, 2), allocation(1, 1, 1), 1);
        insert(&conn, "split", allocation(10, 0, 0), allocation(0, 0, 0), 2);
        let totals = totals(&conn).expect("totals");
        assert_eq!(totals.executions, 2);
        assert_eq!(totals.ybs, 16);
        assert_eq!(totals.treasury, 4);
        assert_eq!(totals.remainder, 3);
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let conn = test_db();
        let split = Split::from_percent(100, 0, 0);
        let zero = Allocation::default();
        let result = record(
            &conn,
            &NewExecution {
                kind: "manual",
                caller: Address::repeat_byte(1),
                admin_fee_split: &split,
                admin_fee: &zero,
                vote_incentive_split: &split,
                vote_incentive: &zero,
                sink_recorded: 0,
            },
            0,
        );
        assert!(matches!(result, Err(DbError::Sqlite(_))));
    }
}
