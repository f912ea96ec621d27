//! Upstream payload shapes and the rows derived from them.

use crate::config::ContactRecord;
use chrono::{DateTime, Local};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// One drug as the API returns it. Every field is optional and a field of
/// the wrong type reads as absent, so one odd entry never sinks the batch;
/// the transformer decides whether it is usable.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawDrugEntry {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub sections: Vec<RawSection>,
    /// Flat price, used when there is no `Harga Diskon` section.
    #[serde(default, deserialize_with = "lenient")]
    pub price: Option<RawValue>,
    /// Flat stock, used when there is no `Sisa Stok` section.
    #[serde(default, deserialize_with = "lenient")]
    pub stock: Option<RawValue>,
    /// Set when the list element was not a drug object at all.
    #[serde(skip)]
    pub malformed: Option<String>,
}

/// A titled block of display lines, e.g. `Harga Diskon: ["Rp 5.000 / Pcs"]`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawSection {
    #[serde(default, deserialize_with = "lenient")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub rows: Vec<String>,
}

/// Scalars the API uses for prices and stock counts.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
}

pub const SECTION_DISCOUNT_PRICE: &str = "Harga Diskon";
pub const SECTION_STOCK: &str = "Sisa Stok";

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Keeps the elements that have the expected shape; anything but an array
/// reads as empty.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => Ok(items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect()),
        _ => Ok(Vec::new()),
    }
}

impl RawDrugEntry {
    /// Rows of the first section with this title, if it has any.
    pub fn section(&self, title: &str) -> Option<&[String]> {
        self.sections
            .iter()
            .find(|s| s.title.as_deref() == Some(title) && !s.rows.is_empty())
            .map(|s| s.rows.as_slice())
    }

    fn from_value(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_else(|e| RawDrugEntry {
            malformed: Some(e.to_string()),
            ..Default::default()
        })
    }
}

/// The body of `GET /drugs`. Elements are kept as JSON until
/// [`DrugListPayload::into_entries`] so a bad one only affects itself.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum DrugListPayload {
    Bare(Vec<Value>),
    Wrapped { drugs: Option<Vec<Value>> },
}

impl DrugListPayload {
    pub(crate) fn into_entries(self) -> Vec<RawDrugEntry> {
        let drugs = match self {
            DrugListPayload::Bare(drugs) | DrugListPayload::Wrapped { drugs: Some(drugs) } => drugs,
            DrugListPayload::Wrapped { drugs: None } => {
                tracing::warn!("response has no \"drugs\" key; treating it as an empty list");
                Vec::new()
            }
        };
        drugs.into_iter().map(RawDrugEntry::from_value).collect()
    }
}

/// A drug ready for preview and export. Amounts are whole rupiah.
///
/// The numeric fields come from the first line of each section; further
/// lines (a box price next to the strip price, say) are kept for display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedRow {
    pub name: String,
    pub discounted_price: u64,
    /// Unit the price applies to (`Pcs`, `Strip`), when the API gave one.
    pub price_unit: Option<String>,
    pub remaining_stock: u64,
    pub stock_unit: String,
    pub more_prices: Vec<String>,
    pub more_stock: Vec<String>,
}

/// Everything the spreadsheet writer needs.
#[derive(Debug, Clone)]
pub struct PriceListDocument {
    pub rows: Vec<NormalizedRow>,
    pub contact: ContactRecord,
    pub generated_at: DateTime<Local>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_tolerates_missing_and_extra_fields() {
        let entry: RawDrugEntry =
            serde_json::from_str(r#"{"name": "Amoxicillin", "category": "antibiotic"}"#).unwrap();
        assert_eq!(entry.name.as_deref(), Some("Amoxicillin"));
        assert!(entry.sections.is_empty());
        assert!(entry.price.is_none());
    }

    #[test]
    fn test_payload_wrapped_and_bare() {
        let wrapped: DrugListPayload =
            serde_json::from_str(r#"{"drugs": [{"name": "A"}], "total": 1}"#).unwrap();
        assert_eq!(wrapped.into_entries().len(), 1);

        let bare: DrugListPayload = serde_json::from_str(r#"[{"name": "A"}, {"name": "B"}]"#).unwrap();
        assert_eq!(bare.into_entries().len(), 2);

        let empty: DrugListPayload = serde_json::from_str(r#"{"status": "ok"}"#).unwrap();
        assert!(empty.into_entries().is_empty());
    }

    #[test]
    fn test_odd_field_types_read_as_absent() {
        let entry: RawDrugEntry = serde_json::from_str(
            r#"{"name": "Odd", "vmedisCode": 12345, "price": true, "stock": 4,
                "sections": [{"title": null, "rows": ["x"]}, 7, {"title": "Sisa Stok", "rows": ["2 Pcs", 3]}]}"#,
        )
        .unwrap();
        assert_eq!(entry.name.as_deref(), Some("Odd"));
        assert_eq!(entry.price, None);
        assert_eq!(entry.stock, Some(RawValue::Number(4.0)));
        assert_eq!(entry.sections.len(), 2);
        assert_eq!(entry.sections[0].title, None);
        assert_eq!(entry.section(SECTION_STOCK), Some(&["2 Pcs".to_string()][..]));
        assert!(entry.malformed.is_none());
    }

    #[test]
    fn test_non_object_element_is_marked_malformed() {
        let payload: DrugListPayload =
            serde_json::from_str(r#"{"drugs": [{"name": "A"}, 42, null]}"#).unwrap();
        let entries = payload.into_entries();
        assert_eq!(entries.len(), 3);
        assert!(entries[0].malformed.is_none());
        assert!(entries[1].malformed.is_some());
        assert!(entries[2].malformed.is_some());
    }

    #[test]
    fn test_section_lookup_skips_empty_rows() {
        let entry: RawDrugEntry = serde_json::from_str(
            r#"{"sections": [{"title": "Sisa Stok", "rows": []}, {"title": "Sisa Stok", "rows": ["3 Pcs"]}]}"#,
        )
        .unwrap();
        assert_eq!(entry.section(SECTION_STOCK), Some(&["3 Pcs".to_string()][..]));
    }
}
