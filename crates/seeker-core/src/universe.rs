//! Stock universe loading.
//!
//! Stock lists are UTF-8 CSV files with one row per listed equity. Portfolio
//! files hold one code per line, `#` starting a comment.

use std::collections::{HashMap, HashSet};
use std::io::Read;

use crate::error::{Result, SeekerError};
use crate::page::parse_date;
use crate::types::{Stock, StockCode};

/// Code column of a stock list.
pub const CODE_COLUMN: &str = "A股代码";
/// Display name column of a stock list.
pub const NAME_COLUMN: &str = "A股简称";
/// IPO date column of a stock list.
pub const IPO_COLUMN: &str = "上市日期";
/// Industry column of a stock list.
pub const INDUSTRY_COLUMN: &str = "2012年行业名称";

/// Loads stocks from a stock-list CSV.
///
/// Rows lacking a code or a name are skipped. When a code appears twice the
/// later row wins, keeping the position of the first.
pub fn load_stock_list<R: Read>(reader: R) -> Result<Vec<Stock>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| SeekerError::Parse(e.to_string()))?
        .clone();
    let position = |name: &str| headers.iter().position(|h| h == name);
    let code_idx = position(CODE_COLUMN)
        .ok_or_else(|| SeekerError::Parse(format!("Stock list lacks column {CODE_COLUMN}")))?;
    let name_idx = position(NAME_COLUMN)
        .ok_or_else(|| SeekerError::Parse(format!("Stock list lacks column {NAME_COLUMN}")))?;
    let ipo_idx = position(IPO_COLUMN);
    let industry_idx = position(INDUSTRY_COLUMN);

    let mut stocks: Vec<Stock> = Vec::new();
    let mut index: HashMap<StockCode, usize> = HashMap::new();
    for record in reader.records() {
        let record = record.map_err(|e| SeekerError::Parse(e.to_string()))?;
        let code = record.get(code_idx).unwrap_or_default();
        let name = record.get(name_idx).unwrap_or_default();
        if code.is_empty() || name.is_empty() {
            continue;
        }

        let mut stock = Stock::new(code, name);
        if let Some(industry) = industry_idx.and_then(|i| record.get(i)) {
            stock = stock.with_industry(industry);
        }
        if let Some(ipo) = ipo_idx.and_then(|i| record.get(i)).and_then(parse_date) {
            stock = stock.with_ipo_date(ipo);
        }

        match index.get(stock.code()) {
            Some(&i) => stocks[i] = stock,
            None => {
                index.insert(stock.code().clone(), stocks.len());
                stocks.push(stock);
            }
        }
    }
    Ok(stocks)
}

/// Parses a portfolio file: the first comma-separated field of each line,
/// with anything after `#` ignored.
#[must_use]
pub fn parse_portfolio(text: &str) -> Vec<StockCode> {
    text.lines()
        .filter_map(|line| {
            let field = line.split(',').next().unwrap_or_default();
            let code = field.split('#').next().unwrap_or_default().trim();
            (!code.is_empty()).then(|| StockCode::new(code))
        })
        .collect()
}

/// Keeps the stocks whose code is in `codes`, preserving stock-list order.
#[must_use]
pub fn filter_portfolio(stocks: &[Stock], codes: &[StockCode]) -> Vec<Stock> {
    let wanted: HashSet<&StockCode> = codes.iter().collect();
    stocks
        .iter()
        .filter(|s| wanted.contains(s.code()))
        .cloned()
        .collect()
}
