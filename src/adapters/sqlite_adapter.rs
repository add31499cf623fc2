//! SQLite adapter: price history, placed orders and saved simulations.
//!
//! Money is stored as TEXT so decimal values survive the round trip
//! exactly. Dates are `%Y-%m-%d` TEXT, which sorts chronologically.
//! Orders carry the run they belong to (`run_start`, `run_months`,
//! `run_capital`); capital is normalized so `10000` and `10000.00` match.

use crate::domain::config::SimulationConfig;
use crate::domain::error::PaperTraderError;
use crate::domain::history::{HistoryPoint, SimulationSummary};
use crate::domain::order::{Order, Side};
use crate::domain::price::PricePoint;
use crate::ports::config_port::ConfigPort;
use crate::ports::price_port::PricePort;
use crate::ports::trade_store_port::TradeStorePort;
use chrono::NaiveDate;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::Type;
use rusqlite::{Row, params};
use rust_decimal::Decimal;
use std::str::FromStr;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

fn pool_err(e: r2d2::Error) -> PaperTraderError {
    PaperTraderError::Database {
        reason: e.to_string(),
    }
}

fn query_err(e: rusqlite::Error) -> PaperTraderError {
    PaperTraderError::DatabaseQuery {
        reason: e.to_string(),
    }
}

fn date_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let text: String = row.get(idx)?;
    NaiveDate::parse_from_str(&text, DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn decimal_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let text: String = row.get(idx)?;
    Decimal::from_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn run_key(run: &SimulationConfig) -> (String, u32, String) {
    (
        run.start_date.format(DATE_FORMAT).to_string(),
        run.duration_months,
        run.starting_capital.normalize().to_string(),
    )
}

fn collect_rows<T>(
    rows: impl Iterator<Item = rusqlite::Result<T>>,
) -> Result<Vec<T>, PaperTraderError> {
    rows.map(|row| row.map_err(query_err)).collect()
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, PaperTraderError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| PaperTraderError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("sqlite", "pool_size", 4).max(1) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(pool_err)?;

        let adapter = Self { pool };
        adapter.initialize_schema()?;
        Ok(adapter)
    }

    pub fn in_memory() -> Result<Self, PaperTraderError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(pool_err)?;

        let adapter = Self { pool };
        adapter.initialize_schema()?;
        Ok(adapter)
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, PaperTraderError> {
        self.pool.get().map_err(pool_err)
    }

    pub fn initialize_schema(&self) -> Result<(), PaperTraderError> {
        let conn = self.conn()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS prices (
                ticker TEXT NOT NULL,
                date TEXT NOT NULL,
                open TEXT NOT NULL,
                high TEXT NOT NULL,
                low TEXT NOT NULL,
                close TEXT NOT NULL,
                adj_close TEXT NOT NULL,
                volume INTEGER NOT NULL,
                PRIMARY KEY (ticker, date)
            );
            CREATE TABLE IF NOT EXISTS orders (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                run_start TEXT NOT NULL,
                run_months INTEGER NOT NULL,
                run_capital TEXT NOT NULL,
                date TEXT NOT NULL,
                ticker TEXT NOT NULL,
                side TEXT NOT NULL,
                quantity INTEGER NOT NULL,
                price TEXT NOT NULL,
                trade_value TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_orders_run
                ON orders(user_id, run_start, run_months, run_capital);
            CREATE TABLE IF NOT EXISTS simulations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                initial_investment TEXT NOT NULL,
                final_value TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS simulation_points (
                simulation_id INTEGER NOT NULL REFERENCES simulations(id),
                date TEXT NOT NULL,
                value TEXT NOT NULL,
                PRIMARY KEY (simulation_id, date)
            );",
        )
        .map_err(query_err)?;

        Ok(())
    }

    /// Upsert a ticker's price points in one transaction. Returns the
    /// number of rows written.
    pub fn insert_prices(
        &self,
        ticker: &str,
        points: &[PricePoint],
    ) -> Result<usize, PaperTraderError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_err)?;

        for point in points {
            let volume = i64::try_from(point.volume).map_err(|_| {
                PaperTraderError::DatabaseQuery {
                    reason: format!("volume {} out of range on {}", point.volume, point.date),
                }
            })?;
            tx.execute(
                "INSERT OR REPLACE INTO prices
                     (ticker, date, open, high, low, close, adj_close, volume)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    ticker,
                    point.date.format(DATE_FORMAT).to_string(),
                    point.open.to_string(),
                    point.high.to_string(),
                    point.low.to_string(),
                    point.close.to_string(),
                    point.adj_close.to_string(),
                    volume
                ],
            )
            .map_err(query_err)?;
        }

        tx.commit().map_err(query_err)?;
        Ok(points.len())
    }
}

impl PricePort for SqliteAdapter {
    fn fetch_series(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PricePoint>, PaperTraderError> {
        let conn = self.conn()?;

        let start_str = start_date.format(DATE_FORMAT).to_string();
        let end_str = end_date.format(DATE_FORMAT).to_string();

        let query = "SELECT date, open, high, low, close, adj_close, volume
                     FROM prices
                     WHERE ticker = ?1 AND date >= ?2 AND date <= ?3
                     ORDER BY date ASC";

        let mut stmt = conn.prepare(query).map_err(query_err)?;
        let rows = stmt
            .query_map(params![ticker, start_str, end_str], |row| {
                let volume: i64 = row.get(6)?;
                let volume = u64::try_from(volume).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(6, Type::Integer, Box::new(e))
                })?;
                Ok(PricePoint {
                    date: date_col(row, 0)?,
                    open: decimal_col(row, 1)?,
                    high: decimal_col(row, 2)?,
                    low: decimal_col(row, 3)?,
                    close: decimal_col(row, 4)?,
                    adj_close: decimal_col(row, 5)?,
                    volume,
                })
            })
            .map_err(query_err)?;

        collect_rows(rows)
    }
}

impl TradeStorePort for SqliteAdapter {
    fn save_order(
        &self,
        user_id: &str,
        run: &SimulationConfig,
        order: &Order,
    ) -> Result<(), PaperTraderError> {
        let (run_start, run_months, run_capital) = run_key(run);
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO orders (user_id, run_start, run_months, run_capital,
                                 date, ticker, side, quantity, price, trade_value)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                user_id,
                run_start,
                run_months,
                run_capital,
                order.date.format(DATE_FORMAT).to_string(),
                order.ticker,
                order.side.as_str(),
                order.quantity,
                order.price.to_string(),
                order.value().to_string()
            ],
        )
        .map_err(query_err)?;
        Ok(())
    }

    fn load_orders(
        &self,
        user_id: &str,
        run: &SimulationConfig,
    ) -> Result<Vec<Order>, PaperTraderError> {
        let (run_start, run_months, run_capital) = run_key(run);
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT date, ticker, side, quantity, price
                 FROM orders
                 WHERE user_id = ?1 AND run_start = ?2 AND run_months = ?3 AND run_capital = ?4
                 ORDER BY id DESC",
            )
            .map_err(query_err)?;

        let rows = stmt
            .query_map(params![user_id, run_start, run_months, run_capital], |row| {
                let side: String = row.get(2)?;
                let side = Side::from_str(&side).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(2, Type::Text, e.into())
                })?;
                Ok(Order {
                    date: date_col(row, 0)?,
                    ticker: row.get(1)?,
                    side,
                    quantity: row.get(3)?,
                    price: decimal_col(row, 4)?,
                })
            })
            .map_err(query_err)?;

        collect_rows(rows)
    }

    fn save_simulation(
        &self,
        user_id: &str,
        summary: &SimulationSummary,
    ) -> Result<(), PaperTraderError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_err)?;

        tx.execute(
            "INSERT INTO simulations (user_id, initial_investment, final_value)
             VALUES (?1, ?2, ?3)",
            params![
                user_id,
                summary.initial_investment.to_string(),
                summary.final_value.to_string()
            ],
        )
        .map_err(query_err)?;
        let simulation_id = tx.last_insert_rowid();

        for point in &summary.value_over_time {
            tx.execute(
                "INSERT OR REPLACE INTO simulation_points (simulation_id, date, value)
                 VALUES (?1, ?2, ?3)",
                params![
                    simulation_id,
                    point.date.format(DATE_FORMAT).to_string(),
                    point.value.to_string()
                ],
            )
            .map_err(query_err)?;
        }

        tx.commit().map_err(query_err)?;
        Ok(())
    }

    fn list_simulations(&self) -> Result<Vec<(String, SimulationSummary)>, PaperTraderError> {
        let conn = self.conn()?;

        let mut stmt = conn
            .prepare(
                "SELECT id, user_id, initial_investment, final_value
                 FROM simulations ORDER BY id ASC",
            )
            .map_err(query_err)?;
        let rows = stmt
            .query_map([], |row| {
                let id: i64 = row.get(0)?;
                let user_id: String = row.get(1)?;
                Ok((id, user_id, decimal_col(row, 2)?, decimal_col(row, 3)?))
            })
            .map_err(query_err)?;
        let headers = collect_rows(rows)?;

        let mut points_stmt = conn
            .prepare(
                "SELECT date, value FROM simulation_points
                 WHERE simulation_id = ?1 ORDER BY date ASC",
            )
            .map_err(query_err)?;

        let mut simulations = Vec::with_capacity(headers.len());
        for (id, user_id, initial_investment, final_value) in headers {
            let rows = points_stmt
                .query_map(params![id], |row| {
                    Ok(HistoryPoint {
                        date: date_col(row, 0)?,
                        value: decimal_col(row, 1)?,
                    })
                })
                .map_err(query_err)?;
            let value_over_time = collect_rows(rows)?;
            simulations.push((
                user_id,
                SimulationSummary {
                    initial_investment,
                    final_value,
                    value_over_time,
                },
            ));
        }

        Ok(simulations)
    }
}
