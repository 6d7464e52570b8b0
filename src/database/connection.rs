/*
 *  Copyright 2025 Colliery Software
 *
 *  Licensed under the Apache License, Version 2.0 (the "License");
 *  you may not use this file except in compliance with the License.
 *  You may obtain a copy of the License at
 *
 *      http://www.apache.org/licenses/LICENSE-2.0
 *
 *  Unless required by applicable law or agreed to in writing, software
 *  distributed under the License is distributed on an "AS IS" BASIS,
 *  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *  See the License for the specific language governing permissions and
 *  limitations under the License.
 */

//! SQLite connection pool management.
//!
//! [`Database`] wraps an `r2d2` pool of diesel `SqliteConnection`s and
//! initializes the schema idempotently on construction. The database is
//! opened in WAL mode with a generous `busy_timeout`; every pooled
//! connection additionally enables foreign-key enforcement, which SQLite
//! scopes per connection.
//!
//! State-changing operations elsewhere in the crate run inside
//! `immediate_transaction`, so concurrent writers from other processes
//! serialize at BEGIN rather than failing mid-transaction.

use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool, PooledConnection};
use diesel::sqlite::SqliteConnection;
use tracing::{debug, info};

use crate::error::DalError;

/// Connection pool type for the SQLite backend.
pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

/// A connection checked out of the pool.
pub type DbConn = PooledConnection<ConnectionManager<SqliteConnection>>;

/// Per-connection SQLite pragmas.
///
/// `foreign_keys` and `busy_timeout` are connection-scoped in SQLite, so
/// they are applied every time the pool hands out a connection.
#[derive(Debug)]
struct ConnectionPragmas;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionPragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        diesel::sql_query("PRAGMA foreign_keys = ON;")
            .execute(conn)
            .map_err(diesel::r2d2::Error::QueryError)?;
        diesel::sql_query("PRAGMA busy_timeout = 30000;")
            .execute(conn)
            .map_err(diesel::r2d2::Error::QueryError)?;
        Ok(())
    }
}

/// A pooled SQLite database with the weldflow schema.
///
/// `Database` is `Clone` and can be shared freely; each clone references the
/// same underlying pool.
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Database(pool size {})", self.pool.max_size())
    }
}

impl Database {
    /// Creates a connection pool for the given database path (or `:memory:`)
    /// and initializes the schema.
    pub fn new(database_path: &str, pool_size: u32) -> Result<Self, DalError> {
        let manager = ConnectionManager::<SqliteConnection>::new(database_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .connection_customizer(Box::new(ConnectionPragmas))
            .build(manager)
            .map_err(|e| DalError::Pool(e.to_string()))?;

        let database = Self { pool };
        database.initialize_schema()?;
        info!(path = %database_path, pool_size, "SQLite connection pool initialized");
        Ok(database)
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Checks a connection out of the pool.
    pub fn conn(&self) -> Result<DbConn, DalError> {
        self.pool.get().map_err(|e| DalError::Pool(e.to_string()))
    }

    fn initialize_schema(&self) -> Result<(), DalError> {
        debug!("Initializing weldflow schema");
        let mut conn = self.conn()?;

        // WAL allows concurrent readers during writes.
        diesel::sql_query("PRAGMA journal_mode = WAL;").execute(&mut conn)?;

        for statement in SCHEMA_SQL {
            diesel::sql_query(*statement).execute(&mut conn)?;
        }
        Ok(())
    }
}

const SCHEMA_SQL: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS processing_log (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        file_name TEXT NOT NULL,
        job_type TEXT,
        status TEXT NOT NULL,
        handler_module TEXT,
        result_summary TEXT,
        error_message TEXT,
        source_payload TEXT,
        content_hash TEXT,
        created_at TIMESTAMP NOT NULL,
        completed_at TIMESTAMP
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_processing_log_content_hash
        ON processing_log (content_hash)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS weld_requests (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        wcr_number TEXT NOT NULL UNIQUE,
        welder_id INTEGER,
        employee_number TEXT,
        welder_name TEXT NOT NULL,
        welder_stamp TEXT,
        project TEXT,
        request_date DATE,
        submitted_by TEXT,
        source_file TEXT,
        status TEXT NOT NULL,
        is_new_welder BOOLEAN NOT NULL DEFAULT FALSE,
        notes TEXT,
        approved_by TEXT,
        approved_at TIMESTAMP,
        created_at TIMESTAMP NOT NULL,
        updated_at TIMESTAMP NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS qualifications (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        wpq_number TEXT NOT NULL UNIQUE,
        welder_id INTEGER,
        welder_stamp TEXT NOT NULL,
        procedure_ref TEXT,
        process TEXT NOT NULL,
        positions TEXT,
        test_date DATE NOT NULL,
        initial_expiration DATE NOT NULL,
        current_expiration DATE NOT NULL,
        status TEXT NOT NULL,
        notes TEXT,
        created_at TIMESTAMP NOT NULL,
        updated_at TIMESTAMP NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS coupons (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        request_id INTEGER NOT NULL REFERENCES weld_requests (id),
        coupon_number INTEGER NOT NULL,
        process TEXT NOT NULL,
        position TEXT,
        procedure_ref TEXT,
        base_material TEXT,
        filler_metal TEXT,
        thickness TEXT,
        diameter TEXT,
        result TEXT,
        status TEXT NOT NULL,
        tested_at DATE,
        tested_by TEXT,
        visual_result TEXT,
        bend_result TEXT,
        radiograph_result TEXT,
        failure_reason TEXT,
        wpq_id INTEGER REFERENCES qualifications (id),
        retest_wcr_id INTEGER REFERENCES weld_requests (id),
        created_at TIMESTAMP NOT NULL,
        updated_at TIMESTAMP NOT NULL,
        UNIQUE (request_id, coupon_number)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS welders (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        employee_number TEXT NOT NULL UNIQUE,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        stamp TEXT UNIQUE,
        active BOOLEAN NOT NULL DEFAULT TRUE,
        created_at TIMESTAMP NOT NULL
    )
    "#,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_initialization_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let path = path.to_str().unwrap();

        let first = Database::new(path, 2).unwrap();
        drop(first);
        // Re-opening must tolerate the already-created tables.
        Database::new(path, 2).unwrap();
    }

    #[test]
    fn foreign_keys_are_enforced() {
        use crate::database::schema::coupons;
        use chrono::Utc;

        let database = Database::new(":memory:", 1).unwrap();
        let mut conn = database.conn().unwrap();
        let now = Utc::now().naive_utc();

        let inserted = diesel::insert_into(coupons::table)
            .values((
                coupons::request_id.eq(9999),
                coupons::coupon_number.eq(1),
                coupons::process.eq("SMAW"),
                coupons::status.eq("pending"),
                coupons::created_at.eq(now),
                coupons::updated_at.eq(now),
            ))
            .execute(&mut conn);
        assert!(inserted.is_err());
    }
}
