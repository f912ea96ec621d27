//! Text table shown before the spreadsheet is written.

use crate::model::NormalizedRow;
use crate::transform::{format_price, format_stock};
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};

pub const DEFAULT_PREVIEW_LIMIT: usize = 10;
pub const NO_DATA: &str = "No data to preview.";

/// Render at most `limit` rows. Empty input yields [`NO_DATA`].
pub fn render_preview(rows: &[NormalizedRow], limit: usize) -> String {
    if rows.is_empty() {
        return NO_DATA.to_string();
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Name"),
        Cell::new("Discount Price"),
        Cell::new("Stock"),
    ]);

    let shown = rows.len().min(limit);
    for row in rows.iter().take(limit) {
        table.add_row(vec![
            Cell::new(&row.name),
            Cell::new(format_price(row)),
            Cell::new(format_stock(row)),
        ]);
    }

    format!("Drug List (showing {} of {})\n{}", shown, rows.len(), table)
}
