//! `DuckDB` connection pool with separate read-only and read-write lanes.

use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use ::duckdb::Connection;

/// Access mode for database connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    ReadOnly,
    ReadWrite,
}

const fn lane(mode: AccessMode) -> usize {
    match mode {
        AccessMode::ReadOnly => 0,
        AccessMode::ReadWrite => 1,
    }
}

struct Shared {
    db_path: PathBuf,
    capacity: usize,
    idle: Mutex<[Vec<Connection>; 2]>,
}

/// Pool of `DuckDB` connections to a single database file. Cloning shares
/// the underlying pool.
#[derive(Clone)]
pub struct ConnectionPool {
    shared: Arc<Shared>,
}

impl ConnectionPool {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, capacity: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                db_path: path.into(),
                capacity: capacity.max(1),
                idle: Mutex::new([Vec::new(), Vec::new()]),
            }),
        }
    }

    /// Acquire a connection, reusing an idle one for the requested mode when
    /// available.
    ///
    /// # Panics
    /// Panics if the pool mutex is poisoned.
    pub fn acquire(&self, mode: AccessMode) -> Result<PooledConnection, ::duckdb::Error> {
        let reused = {
            let mut idle = self
                .shared
                .idle
                .lock()
                .expect("connection pool mutex poisoned");
            idle[lane(mode)].pop()
        };

        let connection = match reused {
            Some(connection) => connection,
            None => self.open(mode)?,
        };

        Ok(PooledConnection {
            mode,
            shared: Arc::clone(&self.shared),
            connection: Some(connection),
        })
    }

    #[must_use]
    pub fn db_path(&self) -> &Path {
        self.shared.db_path.as_path()
    }

    fn open(&self, mode: AccessMode) -> Result<Connection, ::duckdb::Error> {
        let connection = Connection::open(self.shared.db_path.as_path())?;
        connection.execute_batch("PRAGMA disable_progress_bar;")?;
        if mode == AccessMode::ReadOnly {
            // Older engine builds reject this; read-only callers only issue
            // SELECTs regardless.
            let _ = connection.execute_batch("SET access_mode = 'READ_ONLY';");
        }
        Ok(connection)
    }
}

/// A connection that returns to its pool lane on drop, up to the pool
/// capacity.
pub struct PooledConnection {
    mode: AccessMode,
    shared: Arc<Shared>,
    connection: Option<Connection>,
}

impl Deref for PooledConnection {
    type Target = Connection;

    fn deref(&self) -> &Self::Target {
        self.connection
            .as_ref()
            .expect("pooled connection unexpectedly missing")
    }
}

impl DerefMut for PooledConnection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.connection
            .as_mut()
            .expect("pooled connection unexpectedly missing")
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        let Some(connection) = self.connection.take() else {
            return;
        };

        let mut idle = self
            .shared
            .idle
            .lock()
            .expect("connection pool mutex poisoned");
        let lane = &mut idle[lane(self.mode)];
        if lane.len() < self.shared.capacity {
            lane.push(connection);
        }
    }
}
