/// DuckDB initialization SQL.
///
/// Executed once at database open time via `Connection::execute_batch`.
/// Every statement uses `IF NOT EXISTS`, so re-running it on each startup is a
/// no-op for an existing database.
///
/// `memory_limit` comes from `Config.duckdb_memory_limit`
/// (env `GLIMPSE_DUCKDB_MEMORY`, default `"1GB"`) and has already been checked
/// to be a plain size string such as `"512MB"`.
///
/// Per-owner app name uniqueness is not a table constraint: DuckDB rewrites
/// updates of indexed columns as delete + insert, which breaks renames. The
/// backend enforces it while holding the connection lock instead.
pub fn init_sql(memory_limit: &str) -> String {
    format!(
        r#"SET memory_limit = '{memory_limit}';
SET threads = 2;

-- Keys stored in this table:
--   'version'       schema version
--   'token_secret'  HS256 signing secret, generated on first start
CREATE TABLE IF NOT EXISTS settings (
    key             VARCHAR PRIMARY KEY,
    value           VARCHAR NOT NULL
);

CREATE TABLE IF NOT EXISTS users (
    id              VARCHAR PRIMARY KEY,
    email           VARCHAR NOT NULL UNIQUE,
    created_at      TIMESTAMP NOT NULL
);

CREATE TABLE IF NOT EXISTS apps (
    id              VARCHAR PRIMARY KEY,
    tracking_id     VARCHAR NOT NULL UNIQUE,
    user_id         VARCHAR NOT NULL,
    name            VARCHAR NOT NULL,
    created_at      TIMESTAMP NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_apps_user ON apps(user_id);

-- url and referrer are NULL when the beacon carried none.
-- details holds the client key/value map serialized as JSON.
CREATE TABLE IF NOT EXISTS events (
    id                  VARCHAR PRIMARY KEY,
    tracking_id         VARCHAR NOT NULL,
    visitor_id          VARCHAR NOT NULL,
    event_type          VARCHAR NOT NULL,
    url                 VARCHAR,
    referrer            VARCHAR,
    country             VARCHAR NOT NULL,
    browser             VARCHAR NOT NULL,
    device              VARCHAR NOT NULL,
    operating_system    VARCHAR NOT NULL,
    details             VARCHAR NOT NULL,
    created_at          TIMESTAMP NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_events_tracking_time
    ON events(tracking_id, created_at);
"#
    )
}
