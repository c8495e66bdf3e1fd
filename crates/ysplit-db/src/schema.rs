//! SQL schema definitions.

/// Complete schema for the v1 database.
pub const SCHEMA_V1: &str = r#"
-- ============================================================
-- Governance
-- ============================================================

CREATE TABLE IF NOT EXISTS settings (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

-- Ordered, mutually exclusive target sets.
CREATE TABLE IF NOT EXISTS category_targets (
    category TEXT NOT NULL CHECK (category IN ('ycrv', 'partner', 'discretionary')),
    position INTEGER NOT NULL,
    target TEXT NOT NULL UNIQUE,
    updated_at INTEGER NOT NULL,
    PRIMARY KEY (category, position)
);

-- Percentages in 1e18 fixed point, as decimal text.
CREATE TABLE IF NOT EXISTS split_rules (
    stream TEXT NOT NULL CHECK (stream IN ('admin_fee', 'vote_incentive')),
    scope TEXT NOT NULL CHECK (scope IN ('ycrv', 'partner', 'discretionary', 'uncategorized')),
    ybs TEXT NOT NULL,
    treasury TEXT NOT NULL,
    remainder TEXT NOT NULL,
    updated_at INTEGER NOT NULL,
    PRIMARY KEY (stream, scope)
);

-- ============================================================
-- Allowance registry
-- ============================================================

CREATE TABLE IF NOT EXISTS spenders (
    spender TEXT PRIMARY KEY,
    approved_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS spender_grants (
    spender TEXT NOT NULL REFERENCES spenders(spender) ON DELETE CASCADE,
    token TEXT NOT NULL,
    granted_at INTEGER NOT NULL,
    PRIMARY KEY (spender, token)
);

-- ============================================================
-- History
-- ============================================================

CREATE TABLE IF NOT EXISTS audit_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    component TEXT NOT NULL,
    actor TEXT NOT NULL,
    event_type TEXT NOT NULL,
    payload TEXT NOT NULL,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_audit_type ON audit_log(event_type);

CREATE TABLE IF NOT EXISTS split_executions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    kind TEXT NOT NULL CHECK (kind IN ('split', 'deposit_and_split')),
    caller TEXT NOT NULL,
    admin_fee_split TEXT NOT NULL,
    admin_fee_allocation TEXT NOT NULL,
    vote_incentive_split TEXT NOT NULL,
    vote_incentive_allocation TEXT NOT NULL,
    sink_recorded TEXT NOT NULL,
    executed_at INTEGER NOT NULL
);
"#;
