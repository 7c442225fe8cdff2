//! Qualified names of the provider metrics the pipeline tracks.
//!
//! Statement figures are in units of ten thousand yuan (`万元`); the price
//! history reports prices in yuan and market value in yuan.

/// Revenue from the main business.
pub const REVENUE: &str = "主营业务收入(万元)@main_metrics";
/// Basic earnings per share, yuan, cumulative year to date.
pub const EPS: &str = "基本每股收益(元)@main_metrics";
/// Net profit, cumulative year to date.
pub const NET_PROFIT: &str = "净利润(万元)@main_metrics";
/// Net operating cashflow, cumulative year to date.
pub const OPERATING_CASHFLOW: &str = "经营活动产生的现金流量净额(万元)@main_metrics";
/// Shareholders' equity excluding minority interest.
pub const NET_ASSETS: &str = "股东权益不含少数股东权益(万元)@main_metrics";

/// Daily closing price.
pub const CLOSE_PRICE: &str = "收盘价@price_history";
/// Daily total market value.
pub const MARKET_VALUE: &str = "总市值@price_history";

/// Primary metrics that receive a year-over-year growth row.
pub const GROWTH_TRACKED: [&str; 5] = [REVENUE, EPS, NET_PROFIT, OPERATING_CASHFLOW, NET_ASSETS];

/// Yuan per statement unit.
pub const STATEMENT_UNIT: f64 = 1e4;
