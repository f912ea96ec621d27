//! Turns raw API entries into [`NormalizedRow`]s.
//!
//! A bad entry never aborts the batch: it is dropped, logged and reported as
//! a [`TransformWarning`]. Drugs that are sold out are dropped the same way,
//! since the price list only advertises what is on the shelf.

use crate::model::{NormalizedRow, RawDrugEntry, RawValue, SECTION_DISCOUNT_PRICE, SECTION_STOCK};
use std::fmt;

pub const DEFAULT_STOCK_UNIT: &str = "Pcs";
const SOLD_OUT: &str = "stok habis";

/// Why an entry did not make it into the price list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Malformed(String),
    MissingName,
    MissingPrice,
    InvalidPrice(String),
    MissingStock,
    InvalidStock(String),
    OutOfStock,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed(err) => write!(f, "not a drug object ({})", err),
            Self::MissingName => write!(f, "no name"),
            Self::MissingPrice => write!(f, "no discounted price"),
            Self::InvalidPrice(raw) => write!(f, "unreadable price {:?}", raw),
            Self::MissingStock => write!(f, "no stock information"),
            Self::InvalidStock(raw) => write!(f, "unreadable stock {:?}", raw),
            Self::OutOfStock => write!(f, "out of stock"),
        }
    }
}

/// A skipped entry: its position in the API response, its name if it had
/// one, and the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformWarning {
    pub index: usize,
    pub name: Option<String>,
    pub reason: SkipReason,
}

impl fmt::Display for TransformWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "entry #{} ({}) skipped: {}", self.index, name, self.reason),
            None => write!(f, "entry #{} skipped: {}", self.index, self.reason),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Normalized {
    pub rows: Vec<NormalizedRow>,
    pub warnings: Vec<TransformWarning>,
}

/// Normalise every entry, keeping API order.
pub fn normalize(raw: &[RawDrugEntry]) -> Normalized {
    let mut out = Normalized::default();

    for (index, entry) in raw.iter().enumerate() {
        match normalize_entry(entry) {
            Ok(row) => out.rows.push(row),
            Err(reason) => {
                let name = entry
                    .name
                    .as_deref()
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .map(str::to_string);
                let shown = name.as_deref().unwrap_or("-");
                if reason == SkipReason::OutOfStock {
                    tracing::debug!(index, name = shown, "skipping sold-out drug");
                } else {
                    tracing::warn!(index, name = shown, %reason, "skipping drug entry");
                }
                out.warnings.push(TransformWarning { index, name, reason });
            }
        }
    }

    tracing::debug!(kept = out.rows.len(), skipped = out.warnings.len(), "normalized drug list");
    out
}

fn normalize_entry(entry: &RawDrugEntry) -> Result<NormalizedRow, SkipReason> {
    if let Some(err) = &entry.malformed {
        return Err(SkipReason::Malformed(err.clone()));
    }

    let name = entry
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or(SkipReason::MissingName)?;

    // Stock first: a sold-out drug is dropped whatever its price looks like.
    let (remaining_stock, stock_unit, more_stock) = match entry.section(SECTION_STOCK) {
        Some(rows) => {
            let (count, unit) = parse_stock_text(&rows[0])?;
            let more = more_lines(&rows[1..], |line| {
                parse_stock_text(line).ok().map(|(c, u)| stock_text(c, &u))
            });
            (count, unit, more)
        }
        None => match &entry.stock {
            Some(RawValue::Number(n)) => {
                let count = whole_amount(*n).ok_or_else(|| SkipReason::InvalidStock(n.to_string()))?;
                (count, DEFAULT_STOCK_UNIT.to_string(), Vec::new())
            }
            Some(RawValue::Text(text)) => {
                let (count, unit) = parse_stock_text(text)?;
                (count, unit, Vec::new())
            }
            None => return Err(SkipReason::MissingStock),
        },
    };
    if remaining_stock == 0 {
        return Err(SkipReason::OutOfStock);
    }

    let (discounted_price, price_unit, more_prices) = match entry.section(SECTION_DISCOUNT_PRICE) {
        Some(rows) => {
            let (amount, unit) = parse_price_text(&rows[0])?;
            let more = more_lines(&rows[1..], |line| {
                parse_price_text(line).ok().map(|(a, u)| price_text(a, u.as_deref()))
            });
            (amount, unit, more)
        }
        None => match &entry.price {
            Some(RawValue::Number(n)) => {
                let amount = whole_amount(*n).ok_or_else(|| SkipReason::InvalidPrice(n.to_string()))?;
                (amount, None, Vec::new())
            }
            Some(RawValue::Text(text)) => {
                let (amount, unit) = parse_price_text(text)?;
                (amount, unit, Vec::new())
            }
            None => return Err(SkipReason::MissingPrice),
        },
    };

    Ok(NormalizedRow {
        name: name.to_string(),
        discounted_price,
        price_unit,
        remaining_stock,
        stock_unit,
        more_prices,
        more_stock,
    })
}

/// Display text for the lines after the first: normalised when they parse,
/// verbatim otherwise.
fn more_lines(rows: &[String], normalise: impl Fn(&str) -> Option<String>) -> Vec<String> {
    rows.iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .map(|line| normalise(line).unwrap_or_else(|| line.to_string()))
        .collect()
}

/// Finite, non-negative and below `u64::MAX`. Fractions are dropped, the
/// same as the part after a decimal comma in price text.
fn whole_amount(n: f64) -> Option<u64> {
    (n.is_finite() && n >= 0.0 && n < u64::MAX as f64).then(|| n.trunc() as u64)
}

/// Parse `"Rp 5.000 / Pcs"` into `(5000, Some("Pcs"))`.
///
/// Dots are thousands separators; anything after a comma is dropped.
pub fn parse_price_text(text: &str) -> Result<(u64, Option<String>), SkipReason> {
    let invalid = || SkipReason::InvalidPrice(text.to_string());
    let (amount, unit) = match text.split_once('/') {
        Some((amount, unit)) => (amount, Some(unit.trim()).filter(|u| !u.is_empty())),
        None => (text, None),
    };

    let amount = amount.trim();
    let amount = amount
        .strip_prefix("Rp")
        .or_else(|| amount.strip_prefix("rp"))
        .unwrap_or(amount)
        .trim();
    let amount = amount.split(',').next().unwrap_or_default().replace('.', "");
    if amount.is_empty() {
        return Err(invalid());
    }
    let value = amount.parse::<u64>().map_err(|_| invalid())?;

    Ok((value, unit.map(str::to_string)))
}

/// Parse `"12 Pcs"` into `(12, "Pcs")`. A bare number defaults to `Pcs`.
pub fn parse_stock_text(text: &str) -> Result<(u64, String), SkipReason> {
    let trimmed = text.trim();
    if trimmed.eq_ignore_ascii_case(SOLD_OUT) {
        return Err(SkipReason::OutOfStock);
    }

    let mut parts = trimmed.split_whitespace();
    let count = parts
        .next()
        .map(|c| c.replace('.', ""))
        .and_then(|c| c.parse::<u64>().ok())
        .ok_or_else(|| SkipReason::InvalidStock(text.to_string()))?;
    let unit = parts.collect::<Vec<_>>().join(" ");
    let unit = if unit.is_empty() { DEFAULT_STOCK_UNIT.to_string() } else { unit };

    Ok((count, unit))
}

fn price_text(amount: u64, unit: Option<&str>) -> String {
    match unit {
        Some(unit) => format!("Rp {} / {}", amount, unit),
        None => format!("Rp {}", amount),
    }
}

fn stock_text(count: u64, unit: &str) -> String {
    format!("{} {}", count, unit)
}

/// `Rp 5000`, or `Rp 5000 / Strip` when the API named the unit. Further
/// price lines follow on their own lines.
pub fn format_price(row: &NormalizedRow) -> String {
    let mut lines = vec![price_text(row.discounted_price, row.price_unit.as_deref())];
    lines.extend(row.more_prices.iter().cloned());
    lines.join("\n")
}

/// `12 Pcs`, plus any further stock lines.
pub fn format_stock(row: &NormalizedRow) -> String {
    let mut lines = vec![stock_text(row.remaining_stock, &row.stock_unit)];
    lines.extend(row.more_stock.iter().cloned());
    lines.join("\n")
}
