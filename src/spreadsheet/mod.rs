//! Lays a [`PriceListDocument`] out as the pharmacy's price list workbook.
//!
//! ```text
//! 1  Daftar Harga Apotek Aulia Farma per 16 Oktober 2026   (A1:C1 merged)
//! 2
//! 3  Kontak WhatsApp: | +62...
//! 4  Email:           | kontak@...
//! 5
//! 6  Nama Obat | Harga Diskon | Sisa Stok
//! 7  ...one row per drug...
//! ```

pub mod xlsx;

use crate::error::{ApotekError, Result};
use crate::model::PriceListDocument;
use crate::transform::{format_price, format_stock};
use chrono::{DateTime, Locale, TimeZone};
use std::fmt::Display;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use xlsx::{CellStyle, Worksheet};

pub const SHEET_NAME: &str = "Daftar Harga";
pub const TITLE_PREFIX: &str = "Daftar Harga Apotek Aulia Farma per";
pub const HEADERS: [&str; 3] = ["Nama Obat", "Harga Diskon", "Sisa Stok"];

pub const TITLE_ROW: u32 = 1;
pub const CONTACT_ROW: u32 = 3;
pub const HEADER_ROW: u32 = 6;
pub const FIRST_DATA_ROW: u32 = 7;

const COLUMN_WIDTHS: [f64; 3] = [40.0, 30.0, 20.0];
/// Points per text line in a wrapped data row.
const LINE_HEIGHT: f64 = 15.0;

/// `16 Oktober 2026`.
pub fn indonesian_date<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    at.format_localized("%-d %B %Y", Locale::id_ID).to_string()
}

/// `Daftar_Harga_Apotek_Aulia_Farma_16_Oktober_2026.xlsx`.
pub fn default_file_name<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    format!(
        "Daftar_Harga_Apotek_Aulia_Farma_{}.xlsx",
        indonesian_date(at).replace(' ', "_")
    )
}

/// Build the worksheet for `document`.
pub fn build_sheet(document: &PriceListDocument) -> Worksheet {
    let mut sheet = Worksheet::new(SHEET_NAME);

    let title = format!("{} {}", TITLE_PREFIX, indonesian_date(&document.generated_at));
    sheet.set_text(TITLE_ROW, 1, title, CellStyle::Title);
    sheet.merge((TITLE_ROW, 1), (TITLE_ROW, 3));

    sheet.set_text(CONTACT_ROW, 1, "Kontak WhatsApp:", CellStyle::Label);
    sheet.set_text(CONTACT_ROW, 2, &document.contact.whatsapp, CellStyle::Normal);
    sheet.set_text(CONTACT_ROW + 1, 1, "Email:", CellStyle::Label);
    sheet.set_text(CONTACT_ROW + 1, 2, &document.contact.email, CellStyle::Normal);

    for (col, width) in (1..).zip(COLUMN_WIDTHS) {
        sheet.set_column_width(col, width);
    }
    for (col, header) in (1..).zip(HEADERS) {
        sheet.set_text(HEADER_ROW, col, header, CellStyle::Header);
    }

    for (row, drug) in (FIRST_DATA_ROW..).zip(&document.rows) {
        let price = format_price(drug);
        let stock = format_stock(drug);
        let lines = price.lines().count().max(stock.lines().count());
        if lines > 1 {
            sheet.set_row_height(row, LINE_HEIGHT * lines as f64);
        }
        sheet.set_text(row, 1, &drug.name, CellStyle::Data);
        sheet.set_text(row, 2, price, CellStyle::Data);
        sheet.set_text(row, 3, stock, CellStyle::Data);
    }

    sheet
}

/// Renders price list documents to `.xlsx` files.
#[derive(Debug, Default, Clone, Copy)]
pub struct SpreadsheetWriter;

impl SpreadsheetWriter {
    pub fn new() -> Self {
        Self
    }

    /// Write `document` to `destination`, replacing any existing file.
    ///
    /// The workbook is assembled in a temporary file beside the destination
    /// and renamed over it, so a failure leaves the old file (or nothing).
    pub fn write(&self, document: &PriceListDocument, destination: &Path) -> Result<PathBuf> {
        let sheet = build_sheet(document);

        let dir = match destination.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let tmp = tempfile::Builder::new()
            .prefix(".apotek-")
            .suffix(".xlsx.tmp")
            .tempfile_in(dir)
            .map_err(|e| ApotekError::write(destination, e))?;

        {
            let mut out = BufWriter::new(tmp.as_file());
            xlsx::write_workbook(&sheet, &mut out).map_err(|e| ApotekError::write(destination, e))?;
            out.into_inner()
                .map_err(|e| ApotekError::write(destination, e.into_error()))?;
        }
        tmp.as_file()
            .sync_all()
            .map_err(|e| ApotekError::write(destination, e))?;
        tmp.persist(destination)
            .map_err(|e| ApotekError::write(destination, e.error))?;

        tracing::info!(path = %destination.display(), rows = document.rows.len(), "wrote price list");
        Ok(destination.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ContactRecord;
    use crate::model::NormalizedRow;
    use chrono::{Local, TimeZone};

    fn document() -> PriceListDocument {
        PriceListDocument {
            rows: vec![NormalizedRow {
                name: "Paracetamol".into(),
                discounted_price: 5000,
                price_unit: None,
                remaining_stock: 12,
                stock_unit: "Pcs".into(),
                ..Default::default()
            }],
            contact: ContactRecord::default(),
            generated_at: Local.with_ymd_and_hms(2026, 10, 16, 9, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_indonesian_date_and_file_name() {
        let at = Local.with_ymd_and_hms(2023, 3, 30, 12, 0, 0).unwrap();
        assert_eq!(indonesian_date(&at), "30 Maret 2023");
        assert_eq!(default_file_name(&at), "Daftar_Harga_Apotek_Aulia_Farma_30_Maret_2023.xlsx");
    }

    #[test]
    fn test_multi_line_rows_get_taller() {
        let mut doc = document();
        doc.rows[0].more_prices = vec!["Rp 45000 / Box".into()];
        doc.rows[0].more_stock = vec!["2 Box".into(), "1 Karton".into()];
        doc.rows.push(NormalizedRow { name: "Single".into(), ..doc.rows[0].clone() });
        doc.rows[1].more_prices.clear();
        doc.rows[1].more_stock.clear();

        let sheet = build_sheet(&doc);
        assert_eq!(sheet.row_height(FIRST_DATA_ROW), Some(45.0));
        assert_eq!(sheet.row_height(FIRST_DATA_ROW + 1), None);
    }

    #[test]
    fn test_write_into_missing_directory_is_write_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let dest = dir.path().join("missing").join("out.xlsx");
        let err = SpreadsheetWriter::new().write(&document(), &dest).unwrap_err();
        assert!(matches!(err, ApotekError::Write { .. }));
        assert!(!dest.exists());
    }

    #[test]
    fn test_write_leaves_no_temp_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let dest = dir.path().join("out.xlsx");
        SpreadsheetWriter::new().write(&document(), &dest).unwrap();

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["out.xlsx".to_string()]);
    }
}
