//! Netease page catalog.

use chrono::{NaiveDate, Utc};
use seeker_core::{
    PageKind, PageSource, SourceCatalog, Stock, StockCode,
    period::{canonical_periods, last_season_end, season_start, season_window},
};

/// Netease quotes service base URL
const SERVICE_BASE_URL: &str = "http://quotes.money.163.com/service";

/// Price history fields requested from `chddata.html`.
const PRICE_FIELDS: &str = "TCLOSE;HIGH;LOW;TOPEN;LCLOSE;CHG;PCHG;TURNOVER;VOTURNOVER;VATURNOVER;TCAP;MCAP";

/// Default number of quarters of price history.
const DEFAULT_SEASONS: u32 = 48;

/// Quarterly ("report") pages published by Netease.
///
/// Statement pages carry every reported quarter; the price history covers
/// the calendar windows of the `seasons` quarters completed before
/// `reference_date`.
#[derive(Debug, Clone)]
pub struct NeteaseSeasonal {
    reference_date: NaiveDate,
    seasons: u32,
}

impl Default for NeteaseSeasonal {
    fn default() -> Self {
        Self::new(Utc::now().date_naive(), DEFAULT_SEASONS)
    }
}

impl NeteaseSeasonal {
    /// Creates a catalog whose price history ends at `reference_date`.
    #[must_use]
    pub const fn new(reference_date: NaiveDate, seasons: u32) -> Self {
        Self {
            reference_date,
            seasons,
        }
    }

    /// URL of a statement or metric page.
    #[must_use]
    pub fn statement_url(page: PageKind, code: &StockCode) -> Option<String> {
        let url = match page {
            PageKind::Balance => format!("{SERVICE_BASE_URL}/zcfzb_{code}.html"),
            PageKind::Income => format!("{SERVICE_BASE_URL}/lrb_{code}.html"),
            PageKind::Cash => format!("{SERVICE_BASE_URL}/xjllb_{code}.html"),
            PageKind::MainMetrics => format!("{SERVICE_BASE_URL}/zycwzb_{code}.html?type=report"),
            PageKind::ProfitMetrics => Self::metrics_part(code, "ylnl"),
            PageKind::LiabilityMetrics => Self::metrics_part(code, "chnl"),
            PageKind::GrowthMetrics => Self::metrics_part(code, "cznl"),
            PageKind::OperatingMetrics => Self::metrics_part(code, "yynl"),
            PageKind::PriceHistory => return None,
        };
        Some(url)
    }

    fn metrics_part(code: &StockCode, part: &str) -> String {
        format!("{SERVICE_BASE_URL}/zycwzb_{code}.html?type=report&part={part}")
    }

    /// First and last trading day the price history must cover: from the
    /// start of the oldest canonical quarter to the last completed quarter end.
    #[must_use]
    pub fn price_range(&self) -> (NaiveDate, NaiveDate) {
        let end = last_season_end(self.reference_date);
        let start = canonical_periods(self.reference_date, self.seasons as usize)
            .ok()
            .and_then(|periods| periods.last().copied())
            .map_or_else(|| season_start(self.reference_date), |oldest| season_window(oldest).0);
        (start, end)
    }

    /// URL of the daily price history over [`price_range`](Self::price_range).
    ///
    /// The service prefixes Shanghai codes with `0` and all others with `1`.
    #[must_use]
    pub fn price_history_url(&self, code: &StockCode) -> String {
        let market = if code.is_shanghai() { '0' } else { '1' };
        let (start, end) = self.price_range();
        format!(
            "{SERVICE_BASE_URL}/chddata.html?code={market}{code}&start={}&end={}&fields={PRICE_FIELDS}",
            start.format("%Y%m%d"),
            end.format("%Y%m%d"),
        )
    }
}

impl SourceCatalog for NeteaseSeasonal {
    fn name(&self) -> &str {
        "Netease"
    }

    fn list_sources(&self, stock: &Stock) -> Vec<PageSource> {
        let code = stock.code();
        PageKind::STATEMENTS
            .into_iter()
            .filter_map(|page| Self::statement_url(page, code).map(|url| PageSource::new(page, url)))
            .chain(std::iter::once(PageSource::new(
                PageKind::PriceHistory,
                self.price_history_url(code),
            )))
            .collect()
    }
}
