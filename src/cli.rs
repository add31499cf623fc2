//! CLI definition and dispatch.
//!
//! Every command is stateless: the session is rebuilt from the INI file
//! and the persisted orders, driven to the requested date, and dropped.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvPriceAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::journal_analysis_adapter::PromptJournalAdapter;
use crate::domain::config_validation::{
    build_policies, build_risk_free_rate, build_simulation_config, resolve_ticker,
    resolve_user_id, validate_simulation_config,
};
use crate::domain::error::PaperTraderError;
use crate::domain::history::HistoryPoint;
use crate::domain::metrics::{LeaderboardEntry, Metrics, leaderboard};
use crate::domain::order::{Order, Side};
use crate::domain::position::PositionSnapshot;
use crate::domain::session::Simulation;
use crate::ports::analysis_port::AnalysisPort;
use crate::ports::config_port::ConfigPort;
use crate::ports::price_port::PricePort;
use crate::ports::trade_store_port::TradeStorePort;

#[derive(Parser, Debug)]
#[command(name = "papertrader", about = "Historical paper-trading replay")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate a simulation configuration
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Print the portfolio value history as CSV
    History {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        ticker: Option<String>,
        /// Simulated date to stop at (defaults to the simulation end; may not
        /// precede the latest trade)
        #[arg(long)]
        as_of: Option<NaiveDate>,
        /// Store the run for the leaderboard
        #[arg(long)]
        save: bool,
    },
    /// Place an order on a simulated date
    Trade {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        ticker: Option<String>,
        #[arg(long)]
        side: Side,
        #[arg(long)]
        quantity: i64,
        #[arg(long)]
        date: NaiveDate,
    },
    /// Load a CSV price file into the SQLite store
    ImportPrices {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        ticker: String,
        #[arg(long)]
        csv: PathBuf,
    },
    /// Rank saved simulations by percent gain
    Leaderboard {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Validate { config } => run_validate(&config),
        Command::History {
            config,
            ticker,
            as_of,
            save,
        } => run_history(&config, ticker.as_deref(), as_of, save),
        Command::Trade {
            config,
            ticker,
            side,
            quantity,
            date,
        } => run_trade(&config, ticker.as_deref(), side, quantity, date),
        Command::ImportPrices {
            config,
            ticker,
            csv,
        } => run_import_prices(&config, &ticker, &csv),
        Command::Leaderboard { config } => run_leaderboard(&config),
    }
}

fn fail(err: PaperTraderError) -> ExitCode {
    eprintln!("error: {err}");
    (&err).into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(fail)
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn run_validate(config_path: &Path) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_simulation_config(&adapter) {
        return fail(e);
    }

    match describe_config(&adapter) {
        Ok(line) => {
            println!("{line}");
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

/// One-line summary of a valid configuration.
pub fn describe_config(config: &dyn ConfigPort) -> Result<String, PaperTraderError> {
    let sim = build_simulation_config(config)?;
    let ticker = resolve_ticker(None, config)?;
    Ok(format!(
        "OK: {} for {}, {} to {} ({} month(s)), starting capital {}",
        resolve_user_id(config),
        ticker,
        sim.start_date,
        sim.end_date(),
        sim.duration_months,
        sim.starting_capital,
    ))
}

/// Price provider named by `[prices] source`.
pub fn build_price_port(config: &dyn ConfigPort) -> Result<Box<dyn PricePort>, PaperTraderError> {
    match config.get_choice("prices", "source", "csv").as_str() {
        "csv" => {
            let dir = config
                .get_string("prices", "csv_dir")
                .filter(|d| !d.trim().is_empty())
                .ok_or_else(|| PaperTraderError::ConfigMissing {
                    section: "prices".into(),
                    key: "csv_dir".into(),
                })?;
            Ok(Box::new(CsvPriceAdapter::new(PathBuf::from(dir.trim()))))
        }
        #[cfg(feature = "sqlite")]
        "sqlite" => {
            use crate::adapters::sqlite_adapter::SqliteAdapter;
            Ok(Box::new(SqliteAdapter::from_config(config)?))
        }
        #[cfg(not(feature = "sqlite"))]
        "sqlite" => Err(PaperTraderError::ConfigInvalid {
            section: "prices".into(),
            key: "source".into(),
            reason: "sqlite feature is required".into(),
        }),
        other => Err(PaperTraderError::ConfigInvalid {
            section: "prices".into(),
            key: "source".into(),
            reason: format!("unknown source '{other}'"),
        }),
    }
}

/// Build a session from configuration and restore the orders the user
/// placed under this exact run configuration. The clock resumes at the
/// newest restored order.
pub fn start_session(
    config: &dyn ConfigPort,
    ticker_override: Option<&str>,
    today: NaiveDate,
    prices: &dyn PricePort,
    store: &dyn TradeStorePort,
) -> Result<Simulation, PaperTraderError> {
    validate_simulation_config(config)?;
    let sim_config = build_simulation_config(config)?;
    let policies = build_policies(config)?;
    let ticker = resolve_ticker(ticker_override, config)?;
    let user_id = resolve_user_id(config);

    let mut session = Simulation::start(&user_id, &ticker, sim_config, policies, today, prices)?;
    let orders = store.load_orders(&user_id, session.config())?;
    session.restore(orders, prices)?;
    Ok(session)
}

/// Drive the session to `as_of` (or its end date), write the history CSV
/// and optionally persist a summary. Returns the run's metrics.
///
/// `as_of` cannot precede the session's current date, which after a
/// restore is the newest recorded trade.
pub fn run_history_pipeline<W: Write>(
    session: &mut Simulation,
    as_of: Option<NaiveDate>,
    save: bool,
    risk_free_rate: f64,
    prices: &dyn PricePort,
    store: &dyn TradeStorePort,
    out: W,
) -> Result<Metrics, PaperTraderError> {
    let target = match as_of {
        Some(date) => date,
        None => session.clock().end_date()?,
    };
    if target != session.current_date()? {
        session.advance_to(target, prices)?;
    }

    let history = session.history()?;
    write_history_csv(out, &history)?;

    if save {
        let summary = session.summary()?;
        store.save_simulation(session.user_id(), &summary)?;
        tracing::info!(
            user = %session.user_id(),
            final_value = %summary.final_value,
            "simulation saved"
        );
    }

    Ok(session.metrics(risk_free_rate)?)
}

/// Advance to `date` and place one order there.
pub fn run_trade_pipeline(
    session: &mut Simulation,
    side: Side,
    quantity: i64,
    date: NaiveDate,
    prices: &dyn PricePort,
    store: &dyn TradeStorePort,
    analyst: &dyn AnalysisPort,
) -> Result<Order, PaperTraderError> {
    if date != session.current_date()? {
        session.advance_to(date, prices)?;
    }
    session.place_order(side, quantity, store, analyst)
}

pub fn write_history_csv<W: Write>(out: W, history: &[HistoryPoint]) -> Result<(), PaperTraderError> {
    let mut writer = csv::Writer::from_writer(out);
    for point in history {
        writer.serialize(point).map_err(io::Error::from)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_leaderboard<W: Write>(
    mut out: W,
    entries: &[LeaderboardEntry],
) -> Result<(), PaperTraderError> {
    writeln!(out, "rank,user_id,percent_gain")?;
    for entry in entries {
        writeln!(out, "{},{},{}", entry.rank, entry.user_id, entry.percent_gain)?;
    }
    Ok(())
}

fn print_metrics(metrics: &Metrics) {
    eprintln!("\n=== Simulation Results ===");
    eprintln!("Total Return:     {:.2}%", metrics.total_return * 100.0);
    eprintln!(
        "Annualized:       {:.2}%",
        metrics.annualized_return * 100.0
    );
    eprintln!("Volatility:       {:.2}%", metrics.volatility * 100.0);
    eprintln!("Sharpe Ratio:     {:.2}", metrics.sharpe_ratio);
    eprintln!("Sortino Ratio:    {:.2}", metrics.sortino_ratio);
    eprintln!("Max Drawdown:     -{:.1}%", metrics.max_drawdown * 100.0);
    eprintln!("Drawdown Days:    {}", metrics.max_drawdown_duration);
    eprintln!("Buys / Sells:     {} / {}", metrics.buys, metrics.sells);
    eprintln!("Traded Value:     {:.2}", metrics.traded_value);
}

fn run_history(
    config_path: &Path,
    ticker: Option<&str>,
    as_of: Option<NaiveDate>,
    save: bool,
) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    #[cfg(feature = "sqlite")]
    {
        match history_command(&adapter, ticker, as_of, save) {
            Ok(metrics) => {
                print_metrics(&metrics);
                ExitCode::SUCCESS
            }
            Err(e) => fail(e),
        }
    }

    #[cfg(not(feature = "sqlite"))]
    {
        let _ = (&adapter, ticker, as_of, save);
        eprintln!("error: sqlite feature is required for history");
        ExitCode::from(1)
    }
}

#[cfg(feature = "sqlite")]
fn history_command(
    adapter: &FileConfigAdapter,
    ticker: Option<&str>,
    as_of: Option<NaiveDate>,
    save: bool,
) -> Result<Metrics, PaperTraderError> {
    use crate::adapters::sqlite_adapter::SqliteAdapter;

    let prices = build_price_port(adapter)?;
    let store = SqliteAdapter::from_config(adapter)?;
    let risk_free_rate = build_risk_free_rate(adapter)?;
    let mut session = start_session(adapter, ticker, today(), prices.as_ref(), &store)?;
    run_history_pipeline(
        &mut session,
        as_of,
        save,
        risk_free_rate,
        prices.as_ref(),
        &store,
        io::stdout().lock(),
    )
}

fn run_trade(
    config_path: &Path,
    ticker: Option<&str>,
    side: Side,
    quantity: i64,
    date: NaiveDate,
) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    #[cfg(feature = "sqlite")]
    {
        match trade_command(&adapter, ticker, side, quantity, date) {
            Ok((order, position)) => {
                println!(
                    "{} {} {} @ {} on {} (value {})",
                    order.side,
                    order.quantity,
                    order.ticker,
                    order.price,
                    order.date,
                    order.value()
                );
                eprintln!(
                    "Position: {} shares, {} cash",
                    position.shares, position.leftover_cash
                );
                ExitCode::SUCCESS
            }
            Err(e) => fail(e),
        }
    }

    #[cfg(not(feature = "sqlite"))]
    {
        let _ = (&adapter, ticker, side, quantity, date);
        eprintln!("error: sqlite feature is required for trade");
        ExitCode::from(1)
    }
}

#[cfg(feature = "sqlite")]
fn trade_command(
    adapter: &FileConfigAdapter,
    ticker: Option<&str>,
    side: Side,
    quantity: i64,
    date: NaiveDate,
) -> Result<(Order, PositionSnapshot), PaperTraderError> {
    use crate::adapters::sqlite_adapter::SqliteAdapter;

    let prices = build_price_port(adapter)?;
    let store = SqliteAdapter::from_config(adapter)?;
    let analyst = PromptJournalAdapter::from_config(adapter);
    let mut session = start_session(adapter, ticker, today(), prices.as_ref(), &store)?;
    let order = run_trade_pipeline(
        &mut session,
        side,
        quantity,
        date,
        prices.as_ref(),
        &store,
        &analyst,
    )?;
    Ok((order, session.position()?))
}

fn run_import_prices(config_path: &Path, ticker: &str, csv_path: &Path) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let ticker = ticker.trim().to_uppercase();

    #[cfg(feature = "sqlite")]
    {
        use crate::adapters::csv_adapter::read_price_file;
        use crate::adapters::sqlite_adapter::SqliteAdapter;

        let points = match read_price_file(csv_path) {
            Ok(p) => p,
            Err(e) => return fail(e),
        };
        let store = match SqliteAdapter::from_config(&adapter) {
            Ok(s) => s,
            Err(e) => return fail(e),
        };
        match store.insert_prices(&ticker, &points) {
            Ok(count) => {
                eprintln!("Imported {count} rows for {ticker}");
                ExitCode::SUCCESS
            }
            Err(e) => fail(e),
        }
    }

    #[cfg(not(feature = "sqlite"))]
    {
        let _ = (&adapter, ticker, csv_path);
        eprintln!("error: sqlite feature is required for import-prices");
        ExitCode::from(1)
    }
}

fn run_leaderboard(config_path: &Path) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    #[cfg(feature = "sqlite")]
    {
        use crate::adapters::sqlite_adapter::SqliteAdapter;

        let store = match SqliteAdapter::from_config(&adapter) {
            Ok(s) => s,
            Err(e) => return fail(e),
        };
        let simulations = match store.list_simulations() {
            Ok(s) => s,
            Err(e) => return fail(e),
        };
        match write_leaderboard(io::stdout().lock(), &leaderboard(&simulations)) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => fail(e),
        }
    }

    #[cfg(not(feature = "sqlite"))]
    {
        let _ = &adapter;
        eprintln!("error: sqlite feature is required for leaderboard");
        ExitCode::from(1)
    }
}
