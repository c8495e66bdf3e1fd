//! Category target sets.

use rusqlite::Connection;
use ysplit_types::{Address, Category};

use crate::{parse_address, Result};

/// Replace one category's targets, keeping their order.
///
/// A target already stored under another category fails on the `UNIQUE`
/// constraint. Callers wrap this in a transaction so a failure leaves the
/// previous set in place.
pub fn replace(conn: &Connection, category: Category, targets: &[Address], now: u64) -> Result<()> {
    conn.execute(
        "DELETE FROM category_targets WHERE category = ?1",
        [category.as_str()],
    )?;
    let mut stmt = conn.prepare(
        "INSERT INTO category_targets (category, position, target, updated_at)
         VALUES (?1, ?2, ?3, ?4)",
    )?;
    for (position, target) in targets.iter().enumerate() {
        stmt.execute(rusqlite::params![
            category.as_str(),
            position as i64,
            target.to_string(),
            now as i64,
        ])?;
    }
    Ok(())
}

/// Remove every category's targets.
pub fn clear(conn: &Connection) -> Result<()> {
    conn.execute("DELETE FROM category_targets", [])?;
    Ok(())
}

/// Targets of one category in stored order.
pub fn list(conn: &Connection, category: Category) -> Result<Vec<Address>> {
    let mut stmt = conn.prepare(
        "SELECT target FROM category_targets WHERE category = ?1 ORDER BY position",
    )?;
    let rows = stmt
        .query_map([category.as_str()], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    rows.iter().map(|text| parse_address(text)).collect()
}

/// Every category with its targets, in [`Category::ALL`] order.
pub fn list_all(conn: &Connection) -> Result<Vec<(Category, Vec<Address>)>> {
    Category::ALL
        .into_iter()
        .map(|category| Ok((category, list(conn, category)?)))
        .collect()
}
