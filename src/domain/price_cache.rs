//! Price series cache for the selected instrument.
//!
//! The cache holds exactly one (ticker, window) series at a time. Every load
//! replaces the previous series wholesale; a failed load leaves an empty
//! series for the requested window rather than stale data from an earlier
//! one. Requests are ticketed so a response that arrives after a newer
//! request was issued is discarded.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::error::PaperTraderError;
use super::price::PricePoint;
use crate::ports::price_port::PricePort;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesWindow {
    pub ticker: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl SeriesWindow {
    pub fn is_valid(&self) -> bool {
        !self.ticker.trim().is_empty() && self.start <= self.end
    }
}

/// Handle for one outstanding fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    request: u64,
    pub window: SeriesWindow,
}

#[derive(Debug, Clone, Default)]
pub struct PriceSeriesCache {
    window: Option<SeriesWindow>,
    points: Vec<PricePoint>,
    latest_request: u64,
}

impl PriceSeriesCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new request. Any ticket issued earlier becomes stale.
    pub fn begin_fetch(&mut self, ticker: &str, start: NaiveDate, end: NaiveDate) -> FetchTicket {
        self.latest_request += 1;
        FetchTicket {
            request: self.latest_request,
            window: SeriesWindow {
                ticker: ticker.to_string(),
                start,
                end,
            },
        }
    }

    /// Install the response for `ticket`. Returns `false` when the ticket
    /// has been superseded and the response was dropped.
    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<PricePoint>, PaperTraderError>,
    ) -> bool {
        if ticket.request != self.latest_request {
            tracing::debug!(
                ticker = %ticket.window.ticker,
                start = %ticket.window.start,
                end = %ticket.window.end,
                "discarding superseded price response"
            );
            return false;
        }

        let points = match result {
            Ok(points) => normalize(points, &ticket.window),
            Err(e) => {
                tracing::warn!(
                    ticker = %ticket.window.ticker,
                    error = %e,
                    "price fetch failed; using empty series"
                );
                Vec::new()
            }
        };

        tracing::debug!(
            ticker = %ticket.window.ticker,
            points = points.len(),
            "price series installed"
        );
        self.points = points;
        self.window = Some(ticket.window);
        true
    }

    /// Fetch and install `[start, end]` for `ticker` in one step.
    pub fn refresh(
        &mut self,
        port: &dyn PricePort,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> bool {
        let ticket = self.begin_fetch(ticker, start, end);
        let result = if ticket.window.is_valid() {
            port.fetch_series(ticker, start, end)
        } else {
            Ok(Vec::new())
        };
        self.complete_fetch(ticket, result)
    }

    pub fn ticker(&self) -> Option<&str> {
        self.window.as_ref().map(|w| w.ticker.as_str())
    }

    pub fn window(&self) -> Option<&SeriesWindow> {
        self.window.as_ref()
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Close of the latest point dated on or before `date`. Weekends and
    /// holidays resolve to the previous trading day. `None` means no price
    /// is known yet and must never be read as a zero price.
    pub fn price_as_of(&self, date: NaiveDate) -> Option<Decimal> {
        let idx = self.points.partition_point(|p| p.date <= date);
        if idx == 0 {
            None
        } else {
            Some(self.points[idx - 1].close)
        }
    }

    /// Like [`price_as_of`](Self::price_as_of), but only when the cached
    /// series belongs to `ticker`.
    pub fn price_as_of_for(&self, ticker: &str, date: NaiveDate) -> Option<Decimal> {
        if self.ticker() != Some(ticker) {
            return None;
        }
        self.price_as_of(date)
    }

    pub fn points_between(&self, start: NaiveDate, end: NaiveDate) -> &[PricePoint] {
        let lo = self.points.partition_point(|p| p.date < start);
        let hi = self.points.partition_point(|p| p.date <= end);
        if lo >= hi { &[] } else { &self.points[lo..hi] }
    }
}

fn normalize(mut points: Vec<PricePoint>, window: &SeriesWindow) -> Vec<PricePoint> {
    if let Some((i, reason)) = points
        .iter()
        .enumerate()
        .find_map(|(i, p)| p.validate().err().map(|r| (i, r)))
    {
        tracing::warn!(
            ticker = %window.ticker,
            row = i,
            %reason,
            "malformed price point; discarding series"
        );
        return Vec::new();
    }

    points.retain(|p| p.date >= window.start && p.date <= window.end);
    points.sort_by_key(|p| p.date);

    let before = points.len();
    points.dedup_by_key(|p| p.date);
    if points.len() != before {
        tracing::warn!(
            ticker = %window.ticker,
            dropped = before - points.len(),
            "duplicate price dates dropped"
        );
    }
    points
}
