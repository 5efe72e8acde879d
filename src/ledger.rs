//! SQLite storage for scraped odds.
//!
//! One row per (link, bookmaker). Rows are created on the first scrape of a
//! pair and every column is overwritten on later scrapes; nothing is deleted.

use std::str::FromStr;

use anyhow::Context;
use log::{debug, info, warn};
use sqlx::{
    FromRow, Sqlite, Transaction,
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
};

/// Bookmaker recorded for a link when no odds could be extracted.
pub const NO_DATA_BOOKMAKER: &str = "N/A";

/// Odds columns in the table, extra values are dropped.
pub const MAX_ODDS: usize = 3;

const SCHEMA_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS odds
    (
        linkbook TEXT NOT NULL,
        link TEXT NOT NULL,
        date TEXT NOT NULL,
        market TEXT,
        bookmaker TEXT NOT NULL,
        odds_1 NUMERIC,
        odds_2 NUMERIC,
        odds_3 NUMERIC,
        PRIMARY KEY (link, bookmaker)
    )
"#;

// Tables written before the compound key existed used `linkbook` as their
// primary key and allowed a null bookmaker.
const LINKBOOK_PK_SQL: &str =
    "SELECT pk FROM pragma_table_info('odds') WHERE name = 'linkbook'";

const MIGRATE_LINKBOOK_SQL: [&str; 4] = [
    "ALTER TABLE odds RENAME TO odds_linkbook_keyed",
    SCHEMA_SQL,
    r#"
    INSERT INTO odds (linkbook, link, date, market, bookmaker, odds_1, odds_2, odds_3)
    SELECT linkbook, link, date, market, COALESCE(bookmaker, 'N/A'), odds_1, odds_2, odds_3
    FROM odds_linkbook_keyed WHERE true
    ON CONFLICT(link, bookmaker) DO NOTHING
    "#,
    "DROP TABLE odds_linkbook_keyed",
];

const UPSERT_SQL: &str = r#"
    INSERT INTO odds (linkbook, link, date, market, bookmaker, odds_1, odds_2, odds_3)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?)
    ON CONFLICT(link, bookmaker) DO UPDATE SET
        linkbook = excluded.linkbook,
        date = excluded.date,
        market = excluded.market,
        odds_1 = excluded.odds_1,
        odds_2 = excluded.odds_2,
        odds_3 = excluded.odds_3
"#;

// NUMERIC affinity turns 2.0 into the integer 2, cast so every row decodes as f64.
const SELECT_SQL: &str = r#"
    SELECT linkbook, link, date, market, bookmaker,
        CAST(odds_1 AS REAL) AS odds_1,
        CAST(odds_2 AS REAL) AS odds_2,
        CAST(odds_3 AS REAL) AS odds_3
    FROM odds
"#;

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct OddsRecord {
    pub linkbook: String,
    pub link: String,
    pub date: String,
    pub market: Option<String>,
    pub bookmaker: String,
    pub odds_1: Option<f64>,
    pub odds_2: Option<f64>,
    pub odds_3: Option<f64>,
}

impl OddsRecord {
    pub fn odds(&self) -> [Option<f64>; MAX_ODDS] {
        [self.odds_1, self.odds_2, self.odds_3]
    }
}

/// Odds table handle.
///
/// With `commit_everything` each write is committed on its own. Otherwise
/// writes go into one open transaction that `flush` commits; dropping the
/// ledger without flushing or closing rolls them back.
pub struct Ledger {
    pool: SqlitePool,
    commit_everything: bool,
    pending: Option<Transaction<'static, Sqlite>>,
}

impl Ledger {
    pub async fn connect(database_url: &str, commit_everything: bool) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("bad database url {}", database_url))?
            .create_if_missing(true);

        debug!("Connecting to SQLite database at {}", database_url);

        // One writer, one connection. An open transaction owns it until flush.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .with_context(|| format!("failed to open {}", database_url))?;

        Ok(Self {
            pool,
            commit_everything,
            pending: None,
        })
    }

    pub fn commit_everything(&self) -> bool {
        self.commit_everything
    }

    /// Creates the odds table if it isn't there yet, and rekeys a table whose
    /// primary key is still `linkbook` to (link, bookmaker), keeping its rows.
    pub async fn ensure_schema(&mut self) -> anyhow::Result<()> {
        let tx = self.transaction().await?;
        let linkbook_pk: Option<i64> = sqlx::query_scalar(LINKBOOK_PK_SQL)
            .fetch_optional(&mut **tx)
            .await?;

        if linkbook_pk.is_some_and(|pk| pk > 0) {
            info!("Rekeying odds table from linkbook to (link, bookmaker)");
            for sql in MIGRATE_LINKBOOK_SQL {
                sqlx::query(sql)
                    .execute(&mut **tx)
                    .await
                    .context("failed to rekey odds table")?;
            }
        } else {
            sqlx::query(SCHEMA_SQL).execute(&mut **tx).await?;
        }
        self.autocommit().await
    }

    /// Inserts or fully overwrites the row for (`link`, `bookmaker`).
    pub async fn upsert(
        &mut self,
        link: &str,
        date: &str,
        market: &str,
        bookmaker: &str,
        odds: &[f64],
    ) -> anyhow::Result<()> {
        let mut columns = [None; MAX_ODDS];
        if bookmaker != NO_DATA_BOOKMAKER {
            if odds.len() > MAX_ODDS {
                debug!(
                    "Dropping {} odds past the first {} for {} on {}",
                    odds.len() - MAX_ODDS,
                    MAX_ODDS,
                    bookmaker,
                    link
                );
            }
            for (column, value) in columns.iter_mut().zip(odds) {
                *column = Some(*value);
            }
        }

        let linkbook = format!("{}{}", link, bookmaker);
        let tx = self.transaction().await?;
        sqlx::query(UPSERT_SQL)
            .bind(linkbook)
            .bind(link)
            .bind(date)
            .bind(market)
            .bind(bookmaker)
            .bind(columns[0])
            .bind(columns[1])
            .bind(columns[2])
            .execute(&mut **tx)
            .await?;
        self.autocommit().await
    }

    /// Records that `link` gave no odds for `market`.
    pub async fn upsert_no_data(&mut self, link: &str, date: &str, market: &str) -> anyhow::Result<()> {
        self.upsert(link, date, market, NO_DATA_BOOKMAKER, &[]).await
    }

    /// Commits every write since the last flush.
    pub async fn flush(&mut self) -> anyhow::Result<()> {
        if let Some(tx) = self.pending.take() {
            tx.commit().await.context("failed to commit odds")?;
        }
        Ok(())
    }

    /// Flushes pending writes and releases the connection.
    pub async fn close(mut self) -> anyhow::Result<()> {
        self.flush().await?;
        self.pool.close().await;
        info!("Odds database closed");
        Ok(())
    }

    pub async fn records(&mut self) -> anyhow::Result<Vec<OddsRecord>> {
        let sql = format!("{} ORDER BY link, bookmaker", SELECT_SQL);
        let query = sqlx::query_as::<_, OddsRecord>(&sql);
        let records = match self.pending.as_mut() {
            Some(tx) => query.fetch_all(&mut **tx).await?,
            None => query.fetch_all(&self.pool).await?,
        };
        Ok(records)
    }

    pub async fn records_for_link(&mut self, link: &str) -> anyhow::Result<Vec<OddsRecord>> {
        let sql = format!("{} WHERE link = ? ORDER BY bookmaker", SELECT_SQL);
        let query = sqlx::query_as::<_, OddsRecord>(&sql).bind(link);
        let records = match self.pending.as_mut() {
            Some(tx) => query.fetch_all(&mut **tx).await?,
            None => query.fetch_all(&self.pool).await?,
        };
        Ok(records)
    }

    pub async fn count(&mut self) -> anyhow::Result<i64> {
        let query = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM odds");
        let count = match self.pending.as_mut() {
            Some(tx) => query.fetch_one(&mut **tx).await?,
            None => query.fetch_one(&self.pool).await?,
        };
        Ok(count)
    }

    async fn transaction(&mut self) -> anyhow::Result<&mut Transaction<'static, Sqlite>> {
        if self.pending.is_none() {
            self.pending = Some(self.pool.begin().await?);
        }
        self.pending
            .as_mut()
            .context("odds transaction went missing")
    }

    async fn autocommit(&mut self) -> anyhow::Result<()> {
        if self.commit_everything {
            self.flush().await?;
        }
        Ok(())
    }
}

impl Drop for Ledger {
    fn drop(&mut self) {
        if self.pending.is_some() {
            warn!("Odds ledger dropped with unflushed writes, they will be rolled back");
        }
    }
}
