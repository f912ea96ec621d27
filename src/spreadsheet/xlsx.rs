//! Minimal SpreadsheetML writer: one worksheet of styled text cells,
//! merged ranges and column widths, packaged as an `.xlsx` zip.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as FmtWrite;
use std::io::{self, Seek, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const NS_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_PKG_REL: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// Escape XML special characters. Control characters XML 1.0 cannot carry
/// are written as OOXML `_xHHHH_` escapes.
fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\t' | '\n' | '\r' => out.push(c),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "_x{:04X}_", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

/// Convert a 1-based column number to letters (1 -> A, 27 -> AA).
pub fn column_to_letters(col: u32) -> String {
    let mut letters = String::new();
    let mut col = col;

    while col > 0 {
        col -= 1;
        let letter = ((col % 26) as u8 + b'A') as char;
        letters.insert(0, letter);
        col /= 26;
    }

    letters
}

/// `(1, 1)` -> `A1`.
pub fn cell_ref(row: u32, col: u32) -> String {
    format!("{}{}", column_to_letters(col), row)
}

/// The fixed set of cell formats the price list uses. The discriminant is
/// the index into `cellXfs` in styles.xml.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellStyle {
    Normal = 0,
    /// Bold 14pt, centred.
    Title = 1,
    /// Bold.
    Label = 2,
    /// Bold, centred, wrapped, medium border.
    Header = 3,
    /// Wrapped, thin border.
    Data = 4,
}

#[derive(Debug, Clone)]
struct Cell {
    text: String,
    style: CellStyle,
}

/// A single worksheet under construction. Rows and columns are 1-based.
#[derive(Debug, Clone)]
pub struct Worksheet {
    name: String,
    cells: BTreeMap<(u32, u32), Cell>,
    merged: Vec<((u32, u32), (u32, u32))>,
    column_widths: BTreeMap<u32, f64>,
    row_heights: BTreeMap<u32, f64>,
}

impl Worksheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: BTreeMap::new(),
            merged: Vec::new(),
            column_widths: BTreeMap::new(),
            row_heights: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_text(&mut self, row: u32, col: u32, text: impl Into<String>, style: CellStyle) {
        self.cells.insert((row, col), Cell { text: text.into(), style });
    }

    pub fn merge(&mut self, start: (u32, u32), end: (u32, u32)) {
        self.merged.push((start, end));
    }

    pub fn set_column_width(&mut self, col: u32, width: f64) {
        self.column_widths.insert(col, width);
    }

    /// Height in points.
    pub fn set_row_height(&mut self, row: u32, height: f64) {
        self.row_heights.insert(row, height);
    }

    #[cfg(test)]
    pub(crate) fn row_height(&self, row: u32) -> Option<f64> {
        self.row_heights.get(&row).copied()
    }

    /// Generate the worksheet part, registering strings in `shared`.
    fn to_xml(&self, shared: &mut SharedStrings) -> String {
        let mut xml = String::with_capacity(256 + self.cells.len() * 48);
        xml.push_str(XML_DECL);
        let _ = write!(xml, r#"<worksheet xmlns="{}" xmlns:r="{}">"#, NS_MAIN, NS_REL);

        if !self.column_widths.is_empty() {
            xml.push_str("<cols>");
            for (col, width) in &self.column_widths {
                let _ = write!(
                    xml,
                    r#"<col min="{0}" max="{0}" width="{1}" customWidth="1"/>"#,
                    col, width
                );
            }
            xml.push_str("</cols>");
        }

        xml.push_str("<sheetData>");
        let mut current_row = None;
        for (&(row, col), cell) in &self.cells {
            if current_row != Some(row) {
                if current_row.is_some() {
                    xml.push_str("</row>");
                }
                match self.row_heights.get(&row) {
                    Some(ht) => {
                        let _ = write!(xml, r#"<row r="{}" ht="{}" customHeight="1">"#, row, ht);
                    }
                    None => {
                        let _ = write!(xml, r#"<row r="{}">"#, row);
                    }
                }
                current_row = Some(row);
            }
            let index = shared.add(&cell.text);
            let _ = write!(
                xml,
                r#"<c r="{}" s="{}" t="s"><v>{}</v></c>"#,
                cell_ref(row, col),
                cell.style as u32,
                index
            );
        }
        if current_row.is_some() {
            xml.push_str("</row>");
        }
        xml.push_str("</sheetData>");

        if !self.merged.is_empty() {
            let _ = write!(xml, r#"<mergeCells count="{}">"#, self.merged.len());
            for (start, end) in &self.merged {
                let _ = write!(
                    xml,
                    r#"<mergeCell ref="{}:{}"/>"#,
                    cell_ref(start.0, start.1),
                    cell_ref(end.0, end.1)
                );
            }
            xml.push_str("</mergeCells>");
        }

        xml.push_str(
            r#"<pageMargins left="0.7" right="0.7" top="0.75" bottom="0.75" header="0.3" footer="0.3"/>"#,
        );
        xml.push_str("</worksheet>");
        xml
    }
}

/// Shared strings table; repeated strings are stored once.
#[derive(Debug, Default)]
struct SharedStrings {
    strings: Vec<String>,
    index: HashMap<String, usize>,
    references: usize,
}

impl SharedStrings {
    fn add(&mut self, s: &str) -> usize {
        self.references += 1;
        if let Some(&i) = self.index.get(s) {
            return i;
        }
        let i = self.strings.len();
        self.strings.push(s.to_string());
        self.index.insert(s.to_string(), i);
        i
    }

    fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(128 + self.strings.len() * 32);
        xml.push_str(XML_DECL);
        let _ = write!(
            xml,
            r#"<sst xmlns="{}" count="{}" uniqueCount="{}">"#,
            NS_MAIN,
            self.references,
            self.strings.len()
        );
        for s in &self.strings {
            // Keep leading/trailing spaces in names intact.
            let _ = write!(xml, r#"<si><t xml:space="preserve">{}</t></si>"#, escape_xml(s));
        }
        xml.push_str("</sst>");
        xml
    }
}

fn styles_xml() -> String {
    let side = |kind: &str| {
        format!(
            r#"<left style="{0}"><color auto="1"/></left><right style="{0}"><color auto="1"/></right><top style="{0}"><color auto="1"/></top><bottom style="{0}"><color auto="1"/></bottom><diagonal/>"#,
            kind
        )
    };

    let mut xml = String::with_capacity(2048);
    xml.push_str(XML_DECL);
    let _ = write!(xml, r#"<styleSheet xmlns="{}">"#, NS_MAIN);
    xml.push_str(r#"<fonts count="3">"#);
    xml.push_str(r#"<font><sz val="11"/><name val="Calibri"/><family val="2"/></font>"#);
    xml.push_str(r#"<font><b/><sz val="11"/><name val="Calibri"/><family val="2"/></font>"#);
    xml.push_str(r#"<font><b/><sz val="14"/><name val="Calibri"/><family val="2"/></font>"#);
    xml.push_str("</fonts>");
    // Excel requires these two fills first.
    xml.push_str(r#"<fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills>"#);
    xml.push_str(r#"<borders count="3">"#);
    xml.push_str("<border><left/><right/><top/><bottom/><diagonal/></border>");
    let _ = write!(xml, "<border>{}</border>", side("thin"));
    let _ = write!(xml, "<border>{}</border>", side("medium"));
    xml.push_str("</borders>");
    xml.push_str(r#"<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#);

    // Order must match `CellStyle`.
    xml.push_str(r#"<cellXfs count="5">"#);
    xml.push_str(r#"<xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>"#);
    xml.push_str(r#"<xf numFmtId="0" fontId="2" fillId="0" borderId="0" xfId="0" applyFont="1" applyAlignment="1"><alignment horizontal="center"/></xf>"#);
    xml.push_str(r#"<xf numFmtId="0" fontId="1" fillId="0" borderId="0" xfId="0" applyFont="1"/>"#);
    xml.push_str(r#"<xf numFmtId="0" fontId="1" fillId="0" borderId="2" xfId="0" applyFont="1" applyBorder="1" applyAlignment="1"><alignment horizontal="center" wrapText="1"/></xf>"#);
    xml.push_str(r#"<xf numFmtId="0" fontId="0" fillId="0" borderId="1" xfId="0" applyBorder="1" applyAlignment="1"><alignment wrapText="1"/></xf>"#);
    xml.push_str("</cellXfs>");

    xml.push_str(r#"<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>"#);
    xml.push_str("</styleSheet>");
    xml
}

fn workbook_xml(sheet_name: &str) -> String {
    format!(
        r#"{}<workbook xmlns="{}" xmlns:r="{}"><sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
        XML_DECL,
        NS_MAIN,
        NS_REL,
        escape_xml(sheet_name)
    )
}

fn workbook_rels_xml() -> String {
    format!(
        concat!(
            "{}<Relationships xmlns=\"{}\">",
            r#"<Relationship Id="rId1" Type="{}/worksheet" Target="worksheets/sheet1.xml"/>"#,
            r#"<Relationship Id="rId2" Type="{}/styles" Target="styles.xml"/>"#,
            r#"<Relationship Id="rId3" Type="{}/sharedStrings" Target="sharedStrings.xml"/>"#,
            "</Relationships>"
        ),
        XML_DECL, NS_PKG_REL, NS_REL, NS_REL, NS_REL
    )
}

fn package_rels_xml() -> String {
    format!(
        r#"{}<Relationships xmlns="{}"><Relationship Id="rId1" Type="{}/officeDocument" Target="xl/workbook.xml"/></Relationships>"#,
        XML_DECL, NS_PKG_REL, NS_REL
    )
}

fn content_types_xml() -> String {
    const CT: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml";
    format!(
        concat!(
            "{}",
            r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
            r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
            r#"<Default Extension="xml" ContentType="application/xml"/>"#,
            r#"<Override PartName="/xl/workbook.xml" ContentType="{ct}.sheet.main+xml"/>"#,
            r#"<Override PartName="/xl/worksheets/sheet1.xml" ContentType="{ct}.worksheet+xml"/>"#,
            r#"<Override PartName="/xl/styles.xml" ContentType="{ct}.styles+xml"/>"#,
            r#"<Override PartName="/xl/sharedStrings.xml" ContentType="{ct}.sharedStrings+xml"/>"#,
            "</Types>"
        ),
        XML_DECL,
        ct = CT
    )
}

/// Write `sheet` as a complete workbook into `writer`.
pub fn write_workbook<W: Write + Seek>(sheet: &Worksheet, writer: W) -> io::Result<()> {
    let mut shared = SharedStrings::default();
    let sheet_xml = sheet.to_xml(&mut shared);

    let parts: [(&str, String); 7] = [
        ("[Content_Types].xml", content_types_xml()),
        ("_rels/.rels", package_rels_xml()),
        ("xl/workbook.xml", workbook_xml(sheet.name())),
        ("xl/_rels/workbook.xml.rels", workbook_rels_xml()),
        ("xl/styles.xml", styles_xml()),
        ("xl/sharedStrings.xml", shared.to_xml()),
        ("xl/worksheets/sheet1.xml", sheet_xml),
    ];

    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(writer);
    for (name, body) in parts {
        zip.start_file(name, options).map_err(io::Error::other)?;
        zip.write_all(body.as_bytes())?;
    }
    zip.finish().map_err(io::Error::other)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_letters() {
        assert_eq!(column_to_letters(1), "A");
        assert_eq!(column_to_letters(3), "C");
        assert_eq!(column_to_letters(26), "Z");
        assert_eq!(column_to_letters(27), "AA");
        assert_eq!(cell_ref(6, 2), "B6");
    }

    #[test]
    fn test_sheet_xml_orders_rows_and_shares_strings() {
        let mut sheet = Worksheet::new("Daftar Harga");
        sheet.set_text(2, 1, "x", CellStyle::Data);
        sheet.set_text(1, 2, "y & z", CellStyle::Label);
        sheet.set_text(1, 1, "x", CellStyle::Title);
        sheet.merge((1, 1), (1, 3));
        sheet.set_column_width(1, 40.0);

        let mut shared = SharedStrings::default();
        let xml = sheet.to_xml(&mut shared);

        let a1 = xml.find(r#"r="A1""#).unwrap();
        let b1 = xml.find(r#"r="B1""#).unwrap();
        let a2 = xml.find(r#"r="A2""#).unwrap();
        assert!(a1 < b1 && b1 < a2);
        assert!(xml.contains(r#"<c r="A1" s="1" t="s"><v>0</v></c>"#));
        assert!(xml.contains(r#"<c r="A2" s="4" t="s"><v>0</v></c>"#));
        assert!(xml.contains(r#"<mergeCell ref="A1:C1"/>"#));
        assert!(xml.contains(r#"<col min="1" max="1" width="40" customWidth="1"/>"#));

        assert_eq!(shared.strings, vec!["x".to_string(), "y & z".to_string()]);
        assert!(shared.to_xml().contains("y &amp; z"));
        assert!(shared.to_xml().contains(r#"count="3" uniqueCount="2""#));
    }

    #[test]
    fn test_escape_xml_encodes_control_characters() {
        assert_eq!(escape_xml("a<b>&'\""), "a&lt;b&gt;&amp;&apos;&quot;");
        assert_eq!(escape_xml("Obat\u{0B}X\u{1F}"), "Obat_x000B_X_x001F_");
        assert_eq!(escape_xml("line\nnext\ttab"), "line\nnext\ttab");
    }

    #[test]
    fn test_row_height_is_written() {
        let mut sheet = Worksheet::new("S");
        sheet.set_text(1, 1, "a", CellStyle::Normal);
        sheet.set_text(2, 1, "b\nc", CellStyle::Data);
        sheet.set_row_height(2, 30.0);

        let xml = sheet.to_xml(&mut SharedStrings::default());
        assert!(xml.contains(r#"<row r="1">"#));
        assert!(xml.contains(r#"<row r="2" ht="30" customHeight="1">"#));
    }

    #[test]
    fn test_write_workbook_produces_zip() {
        let mut sheet = Worksheet::new("S");
        sheet.set_text(1, 1, "hello", CellStyle::Normal);
        let mut buf = std::io::Cursor::new(Vec::new());
        write_workbook(&sheet, &mut buf).unwrap();
        assert!(buf.get_ref().starts_with(b"PK"));
    }
}
