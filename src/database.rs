use mobc::{Manager, Pool};
use rusqlite::{Connection, Result as SqliteResult};
use std::path::Path;
use tracing::{debug, error, info};

fn log_rusqlite_error(context: &str, err: &rusqlite::Error) {
    error!("SQLite error in {}: {:?}", context, err);
}

pub struct SqliteManager {
    db_path: String,
}

impl SqliteManager {
    pub fn new(db_path: String) -> Self {
        debug!("Creating SqliteManager for path: {}", db_path);
        Self { db_path }
    }
}

#[async_trait::async_trait]
impl Manager for SqliteManager {
    type Connection = Connection;
    type Error = rusqlite::Error;

    async fn connect(&self) -> Result<Self::Connection, Self::Error> {
        debug!("Opening database: {}", self.db_path);
        let conn = match Connection::open(&self.db_path) {
            Ok(c) => c,
            Err(e) => {
                log_rusqlite_error("Connection::open", &e);
                return Err(e);
            }
        };

        // Some PRAGMA statements return a result row, so execute() alone
        // is not enough.
        let exec_pragma =
            |conn: &Connection, pragma: &str, name: &str| -> Result<(), rusqlite::Error> {
                match conn.execute(pragma, []) {
                    Ok(_) => Ok(()),
                    Err(rusqlite::Error::ExecuteReturnedResults) => {
                        conn.query_row(pragma, [], |_| Ok(())).map_err(|e| {
                            debug!("{} failed with query_row: {}", name, e);
                            e
                        })
                    }
                    Err(e) => {
                        debug!("{} failed with execute: {}", name, e);
                        Err(e)
                    }
                }
            };

        exec_pragma(&conn, "PRAGMA journal_mode=WAL", "PRAGMA journal_mode")?;
        exec_pragma(&conn, "PRAGMA synchronous=NORMAL", "PRAGMA synchronous")?;
        exec_pragma(&conn, "PRAGMA busy_timeout=5000", "PRAGMA busy_timeout")?;
        exec_pragma(&conn, "PRAGMA temp_store=memory", "PRAGMA temp_store")?;

        if let Err(e) = init_database(&conn) {
            log_rusqlite_error("init_database", &e);
            return Err(e);
        }

        Ok(conn)
    }

    async fn check(&self, conn: Self::Connection) -> Result<Self::Connection, Self::Error> {
        match conn.query_row("SELECT 1", [], |_| Ok(())) {
            Ok(_) => Ok(conn),
            Err(e) => {
                log_rusqlite_error("connection check", &e);
                Err(e)
            }
        }
    }
}

pub type DbPool = Pool<SqliteManager>;

pub async fn create_db_pool(
    db_path: &str,
) -> Result<DbPool, Box<dyn std::error::Error + Send + Sync>> {
    if let Some(parent) = Path::new(db_path).parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let manager = SqliteManager::new(db_path.to_string());
    let pool = Pool::builder().max_open(10).max_idle(5).build(manager);

    info!("✓ SQLite connection pool created: {}", db_path);
    Ok(pool)
}

fn init_database(conn: &Connection) -> SqliteResult<()> {
    create_outreach_log_table(conn)?;
    create_outreach_log_indexes(conn)?;
    Ok(())
}

// The permanent audit trail: one row per contact attempt, mutated only by
// delivery events and conversion flags, never deleted.
fn create_outreach_log_table(conn: &Connection) -> SqliteResult<()> {
    debug!("Creating outreach_log table...");
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS outreach_log (
            id TEXT PRIMARY KEY,
            business_name TEXT NOT NULL,
            business_email TEXT NOT NULL,
            location TEXT NOT NULL,
            outreach_type TEXT NOT NULL,
            search_query TEXT NOT NULL,
            date_contacted TEXT NOT NULL,
            email_status TEXT NOT NULL,
            tracking_id TEXT UNIQUE NOT NULL,
            provider_message_id TEXT,
            delivered_at TEXT,
            opened_at TEXT,
            clicked_at TEXT,
            responded_at TEXT,
            converted_at TEXT,
            bounce_reason TEXT,
            cooldown_until TEXT NOT NULL,
            click_count INTEGER NOT NULL DEFAULT 0,
            visited_site INTEGER NOT NULL DEFAULT 0
        )
        "#,
        [],
    )?;
    Ok(())
}

fn create_outreach_log_indexes(conn: &Connection) -> SqliteResult<()> {
    let indexes = [
        "CREATE INDEX IF NOT EXISTS idx_outreach_email ON outreach_log(business_email)",
        "CREATE INDEX IF NOT EXISTS idx_outreach_email_contacted ON outreach_log(business_email, date_contacted DESC)",
        "CREATE INDEX IF NOT EXISTS idx_outreach_status ON outreach_log(email_status)",
        "CREATE INDEX IF NOT EXISTS idx_outreach_tracking ON outreach_log(tracking_id)",
        "CREATE INDEX IF NOT EXISTS idx_outreach_message_id ON outreach_log(provider_message_id)",
        "CREATE INDEX IF NOT EXISTS idx_outreach_contacted ON outreach_log(date_contacted DESC)",
    ];

    for (i, index_sql) in indexes.iter().enumerate() {
        if let Err(e) = conn.execute(index_sql, []) {
            log_rusqlite_error(&format!("create index {}", i + 1), &e);
            return Err(e);
        }
    }
    Ok(())
}
