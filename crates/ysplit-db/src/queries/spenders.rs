//! Approved spenders and their token grants.

use rusqlite::{Connection, OptionalExtension};
use ysplit_types::{Address, TokenAddress};

use crate::{parse_address, Result};

/// Record a spender as approved. Idempotent; keeps the first approval time.
pub fn approve(conn: &Connection, spender: &Address, now: u64) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO spenders (spender, approved_at) VALUES (?1, ?2)",
        rusqlite::params![spender.to_string(), now as i64],
    )?;
    Ok(())
}

/// Remove a spender and, by cascade, every grant it held.
pub fn remove(conn: &Connection, spender: &Address) -> Result<()> {
    conn.execute(
        "DELETE FROM spenders WHERE spender = ?1",
        [spender.to_string()],
    )?;
    Ok(())
}

/// Replace a spender's grants with `tokens`.
pub fn set_grants(conn: &Connection, spender: &Address, tokens: &[TokenAddress], now: u64) -> Result<()> {
    let key = spender.to_string();
    conn.execute("DELETE FROM spender_grants WHERE spender = ?1", [&key])?;
    let mut stmt = conn.prepare(
        "INSERT INTO spender_grants (spender, token, granted_at) VALUES (?1, ?2, ?3)",
    )?;
    for token in tokens {
        stmt.execute(rusqlite::params![key, token.to_string(), now as i64])?;
    }
    Ok(())
}

/// When the spender was approved, `None` if it is not.
pub fn approved_at(conn: &Connection, spender: &Address) -> Result<Option<u64>> {
    let at = conn
        .query_row(
            "SELECT approved_at FROM spenders WHERE spender = ?1",
            [spender.to_string()],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    Ok(at.map(|t| t as u64))
}

/// Tokens granted to one spender, sorted.
pub fn grants(conn: &Connection, spender: &Address) -> Result<Vec<TokenAddress>> {
    let mut stmt = conn.prepare(
        "SELECT token FROM spender_grants WHERE spender = ?1 ORDER BY token",
    )?;
    let rows = stmt
        .query_map([spender.to_string()], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    rows.iter().map(|text| parse_address(text)).collect()
}

/// Every approved spender with its grants, sorted by spender.
pub fn list(conn: &Connection) -> Result<Vec<(Address, Vec<TokenAddress>)>> {
    let mut stmt = conn.prepare("SELECT spender FROM spenders ORDER BY spender")?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    rows.iter()
        .map(|text| {
            let spender = parse_address(text)?;
            Ok((spender, grants(conn, &spender)?))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DbError;

    fn test_db() -> Connection {
        crate::open_memory().expect("open test db")
    }

    fn spender() -> Address {
        Address::repeat_byte(0x5a)
    }

    fn token(n: u8) -> TokenAddress {
        Address::repeat_byte(n)
    }

    #[test]
    fn test_approve_idempotent() {
        let conn = test_db();
        approve(&conn, &spender(), 100).expect("first");
        approve(&conn, &spender(), 200).expect("second");
        assert_eq!(approved_at(&conn, &spender()).expect("at"), Some(100));
        assert_eq!(list(&conn).expect("list").len(), 1);
    }

    #[test]
    fn test_grants_roundtrip() {
        let conn = test_db();
        approve(&conn, &spender(), 100).expect("approve");
        set_grants(&conn, &spender(), &[token(0xc2), token(0xc1)], 110).expect("grants");
        assert_eq!(
            grants(&conn, &spender()).expect("grants"),
            vec![token(0xc1), token(0xc2)]
        );
        set_grants(&conn, &spender(), &[token(0xc2)], 120).expect("replace");
        assert_eq!(grants(&conn, &spender()).expect("grants"), vec![token(0xc2)]);
    }

    #[test]
    fn test_remove_cascades() {
        let conn = test_db();
        approve(&conn, &spender(), 100).expect("approve");
        set_grants(&conn, &spender(), &[token(0xc1)], 110).expect("grants");
        remove(&conn, &spender()).expect("remove");
        assert_eq!(approved_at(&conn, &spender()).expect("at"), None);
        assert!(grants(&conn, &spender()).expect("grants").is_empty());
        assert!(list(&conn).expect("list").is_empty());
    }

    #[test]
    fn test_grant_for_unknown_spender_fails() {
        let conn = test_db();
        let result = set_grants(&conn, &spender(), &[token(0xc1)], 100);
        assert!(matches!(result, Err(DbError::Sqlite(_))));
    }
}
