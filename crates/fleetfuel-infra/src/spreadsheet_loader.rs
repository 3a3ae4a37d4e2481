//! Spreadsheet and delimited-text loaders
//!
//! Workbooks (xlsx, xlsm, xls, ods) are read with calamine, first worksheet
//! only. CSV/TXT files get delimiter sniffing and a Windows-1252 fallback
//! for files exported by older Excel versions.

use std::fs;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};
use fleetfuel_domain::model::{Cell, Table};
use fleetfuel_types::{Error, Result};
use tracing::{debug, warn};

const WORKBOOK_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];
const DELIMITED_EXTENSIONS: [&str; 2] = ["csv", "txt"];

/// Load the first sheet (or the whole CSV) of a file into a Table.
///
/// The first row is the header row. Trailing blank rows are dropped.
pub fn load_table(path: &Path) -> Result<Table> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.display().to_string()));
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let mut table = if WORKBOOK_EXTENSIONS.contains(&extension.as_str()) {
        load_workbook(path)?
    } else if DELIMITED_EXTENSIONS.contains(&extension.as_str()) {
        load_delimited(path)?
    } else {
        return Err(Error::UnsupportedFormat(path.display().to_string()));
    };

    while table.rows.last().is_some_and(|row| row.iter().all(Cell::is_blank)) {
        table.rows.pop();
    }

    debug!(
        path = %path.display(),
        rows = table.len(),
        columns = table.headers.len(),
        "loaded table"
    );
    Ok(table)
}

fn load_workbook(path: &Path) -> Result<Table> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| Error::Spreadsheet(format!("Failed to open {}: {}", path.display(), e)))?;

    let sheet_names = workbook.sheet_names().to_vec();
    let first = sheet_names
        .first()
        .ok_or_else(|| Error::Spreadsheet(format!("{} contains no sheets", path.display())))?;

    let range = workbook
        .worksheet_range(first)
        .map_err(|e| Error::Spreadsheet(format!("Failed to read sheet '{}': {}", first, e)))?;

    let mut rows = range.rows();
    let headers = rows
        .next()
        .map(|row| row.iter().map(|d| data_to_cell(d).as_text().trim().to_string()).collect())
        .unwrap_or_default();
    let rows = rows.map(|row| row.iter().map(data_to_cell).collect()).collect();

    Ok(Table::new(headers, rows))
}

fn data_to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) if s.trim().is_empty() => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(n) => Cell::Number(*n),
        Data::Int(n) => Cell::Number(*n as f64),
        Data::Bool(b) => Cell::Bool(*b),
        Data::Error(e) => Cell::Text(format!("#{:?}", e)),
        Data::DateTime(dt) => serial_to_datetime(dt.as_f64())
            .map(Cell::Date)
            .unwrap_or(Cell::Number(dt.as_f64())),
        Data::DateTimeIso(s) => NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
            .map(Cell::Date)
            .unwrap_or_else(|_| Cell::Text(s.clone())),
        Data::DurationIso(s) => Cell::Text(s.clone()),
    }
}

/// Spreadsheet serial (1900 date system) to a timestamp
fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let days = serial.trunc() as u64;
    let seconds = ((serial.fract() * 86_400.0).round() as u32).min(86_399);
    let date = NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_days(Days::new(days))?;
    let time = NaiveTime::from_num_seconds_from_midnight_opt(seconds, 0)?;
    Some(date.and_time(time))
}

fn load_delimited(path: &Path) -> Result<Table> {
    let content = read_file_as_utf8(path)?;
    let delimiter = sniff_delimiter(&content);
    debug!(path = %path.display(), delimiter = %(delimiter as char), "parsing delimited text");
    parse_delimited(&content, delimiter)
}

/// Read a text file as UTF-8, falling back to Windows-1252
pub fn read_file_as_utf8(path: &Path) -> Result<String> {
    let bytes = fs::read(path)?;
    match String::from_utf8(bytes) {
        Ok(s) => Ok(s.trim_start_matches('\u{feff}').to_string()),
        Err(e) => {
            warn!(path = %path.display(), "input is not UTF-8, decoding as Windows-1252");
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

/// Pick the delimiter giving the most consistent field count over the
/// first lines. Regional Excel exports use `;`, so it is tried first.
pub fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b';', b',', b'\t'];
    let sample_lines: Vec<&str> = content.lines().take(10).collect();

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        let target = counts.first().copied().unwrap_or(0);
        if target <= 1 {
            continue;
        }

        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;
        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

fn parse_delimited(content: &str, delimiter: u8) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(text_to_cell).collect());
    }

    Ok(Table::new(headers, rows))
}

fn text_to_cell(field: &str) -> Cell {
    if field.trim().is_empty() {
        Cell::Empty
    } else {
        Cell::Text(field.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;
    use tempfile::tempdir;

    #[test]
    fn test_sniff_delimiters() {
        assert_eq!(sniff_delimiter("PATENTE;LITROS\nABC123;10,5\n"), b';');
        assert_eq!(sniff_delimiter("PATENTE,LITROS\nABC123,10\n"), b',');
        assert_eq!(sniff_delimiter("PATENTE\tLITROS\nABC123\t10\n"), b'\t');
    }

    #[test]
    fn test_semicolon_with_decimal_commas() {
        // decimal commas must not win over the real delimiter
        let content = "PATENTE;LITROS;KM\nABC123;10,5;100,2\nAB123CD;3,1;7\n";
        assert_eq!(sniff_delimiter(content), b';');
    }

    #[test]
    fn test_load_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("consumo.csv");
        fs::write(&path, "Patente;Litros\nabc123;10,5\n;\n").unwrap();

        let table = load_table(&path).unwrap();
        assert_eq!(table.headers, vec!["Patente", "Litros"]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.cell(0, 1), &Cell::Text("10,5".to_string()));
    }

    #[test]
    fn test_windows_1252_fallback() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nomina.csv");
        // "Kilómetros" with ó as 0xF3
        let mut bytes = b"PATENTE;Kil".to_vec();
        bytes.push(0xF3);
        bytes.extend_from_slice(b"metros\nABC123;100\n");
        fs::write(&path, bytes).unwrap();

        let table = load_table(&path).unwrap();
        assert_eq!(table.headers[1], "Kilómetros");
    }

    #[test]
    fn test_load_xlsx() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("distancias.xlsx");

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Placa/Patente").unwrap();
        sheet.write_string(0, 1, "Distancia [km]").unwrap();
        sheet.write_string(1, 0, "ABC123").unwrap();
        sheet.write_number(1, 1, 200.5).unwrap();
        workbook.save(&path).unwrap();

        let table = load_table(&path).unwrap();
        assert_eq!(table.headers, vec!["Placa/Patente", "Distancia [km]"]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.cell(0, 0), &Cell::Text("ABC123".to_string()));
        assert_eq!(table.cell(0, 1), &Cell::Number(200.5));
    }

    #[test]
    fn test_missing_and_unsupported_files() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            load_table(&dir.path().join("nope.xlsx")),
            Err(Error::FileNotFound(_))
        ));

        let path = dir.path().join("data.json");
        fs::write(&path, "{}").unwrap();
        assert!(matches!(load_table(&path), Err(Error::UnsupportedFormat(_))));
    }

    #[test]
    fn test_serial_to_datetime() {
        let dt = serial_to_datetime(45721.5).unwrap();
        assert_eq!(dt.to_string(), "2025-03-05 12:00:00");
        assert!(serial_to_datetime(-1.0).is_none());
    }
}
