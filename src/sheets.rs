use std::path::Path;

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{error, info, info_span, instrument};

use crate::error::{Result, TrackerError};
use crate::google_auth::{ServiceAccountAuth, ServiceAccountKey};
use crate::model::record::{GameRecord, SHEET_HEADERS};
use crate::sink::{RecordSink, SaveOutcome, SkipReason};

pub const SHEETS_BASE_URL: &str = "https://sheets.googleapis.com/v4";

/// Existing date keys: column A below the header.
pub const DATE_RANGE: &str = "A2:A";
pub const HEADER_RANGE: &str = "A1:N1";
pub const APPEND_RANGE: &str = "A1";

pub const GOLD_THRESHOLD: i64 = 22500;
pub const SILVER_THRESHOLD: i64 = 20000;

/// Column B in the canonical layout.
const TOTAL_SCORE_COLUMN: usize = 1;
const SCORE_COLUMNS: [usize; 6] = [1, 3, 5, 7, 9, 11];
const ROUND_DISTANCE_COLUMNS: [usize; 5] = [4, 6, 8, 10, 12];

/// Properties of the first sheet that styling depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetMeta {
    pub sheet_id: i64,
    pub conditional_format_count: usize,
}

/// The handful of Sheets v4 calls the sink makes.
pub trait SheetsApi {
    /// Cells of an A1 range as display strings, trailing empty rows omitted.
    fn read_range(&self, range: &str) -> Result<Vec<Vec<String>>>;
    fn write_range(&self, range: &str, rows: Vec<Vec<Value>>) -> Result<()>;
    fn append_rows(&self, range: &str, rows: Vec<Vec<Value>>) -> Result<()>;
    fn first_sheet(&self) -> Result<SheetMeta>;
    fn batch_update(&self, requests: Vec<Value>) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetEntry {
    properties: SheetProperties,
    #[serde(default)]
    conditional_formats: Vec<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    #[serde(default)]
    sheet_id: i64,
}

fn cell_text(cell: Value) -> String {
    match cell {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Google Sheets REST client authenticated as a service account.
pub struct GoogleSheets {
    spreadsheet_id: String,
    auth: ServiceAccountAuth,
    base_url: String,
}

impl GoogleSheets {
    pub fn new(spreadsheet_id: &str, credentials_path: &Path) -> Result<Self> {
        let key = ServiceAccountKey::from_file(credentials_path)?;
        let auth = ServiceAccountAuth::new(key)?;
        Ok(Self { spreadsheet_id: spreadsheet_id.to_string(), auth, base_url: SHEETS_BASE_URL.to_string() })
    }

    fn bearer(&self) -> Result<String> {
        Ok(format!("Bearer {}", self.auth.access_token()?))
    }

    fn values_url(&self, range: &str) -> String {
        format!("{}/spreadsheets/{}/values/{}", self.base_url, self.spreadsheet_id, range)
    }

    fn read_body(response: ureq::http::Response<ureq::Body>, what: &str) -> Result<String> {
        response
            .into_body()
            .read_to_string()
            .map_err(|e| TrackerError::sink(format!("Failed to read {} response: {}", what, e)))
    }

    fn request_failed(what: &str, e: ureq::Error) -> TrackerError {
        error!(error = %e, request = what, "Google Sheets request failed");
        TrackerError::sink(format!("Google Sheets {} failed: {}", what, e))
    }
}

impl SheetsApi for GoogleSheets {
    fn read_range(&self, range: &str) -> Result<Vec<Vec<String>>> {
        let url = self.values_url(range);
        let response = {
            let _span = info_span!("sheets_read", range = %range).entered();
            ureq::get(&url).header("Authorization", self.bearer()?).call()
        }
        .map_err(|e| Self::request_failed("read", e))?;
        let body = Self::read_body(response, "read")?;
        let parsed: ValueRange = serde_json::from_str(&body)
            .map_err(|e| TrackerError::sink(format!("Unexpected values response: {}", e)))?;
        Ok(parsed
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect())
    }

    fn write_range(&self, range: &str, rows: Vec<Vec<Value>>) -> Result<()> {
        let url = self.values_url(range);
        ureq::put(&url)
            .header("Authorization", self.bearer()?)
            .query("valueInputOption", "RAW")
            .send_json(json!({ "range": range, "values": rows }))
            .map_err(|e| Self::request_failed("write", e))?;
        Ok(())
    }

    fn append_rows(&self, range: &str, rows: Vec<Vec<Value>>) -> Result<()> {
        let url = format!("{}:append", self.values_url(range));
        ureq::post(&url)
            .header("Authorization", self.bearer()?)
            .query("valueInputOption", "RAW")
            .query("insertDataOption", "INSERT_ROWS")
            .send_json(json!({ "values": rows }))
            .map_err(|e| Self::request_failed("append", e))?;
        Ok(())
    }

    fn first_sheet(&self) -> Result<SheetMeta> {
        let url = format!("{}/spreadsheets/{}", self.base_url, self.spreadsheet_id);
        let response = ureq::get(&url)
            .header("Authorization", self.bearer()?)
            .query("fields", "sheets(properties(sheetId),conditionalFormats)")
            .call()
            .map_err(|e| Self::request_failed("metadata", e))?;
        let body = Self::read_body(response, "metadata")?;
        let meta: SpreadsheetMeta = serde_json::from_str(&body)
            .map_err(|e| TrackerError::sink(format!("Unexpected spreadsheet metadata: {}", e)))?;
        let first = meta
            .sheets
            .into_iter()
            .next()
            .ok_or_else(|| TrackerError::sink("Spreadsheet has no sheets"))?;
        Ok(SheetMeta {
            sheet_id: first.properties.sheet_id,
            conditional_format_count: first.conditional_formats.len(),
        })
    }

    fn batch_update(&self, requests: Vec<Value>) -> Result<()> {
        let url = format!("{}/spreadsheets/{}:batchUpdate", self.base_url, self.spreadsheet_id);
        ureq::post(&url)
            .header("Authorization", self.bearer()?)
            .send_json(json!({ "requests": requests }))
            .map_err(|e| Self::request_failed("batchUpdate", e))?;
        Ok(())
    }
}

/// Spreadsheet sink: one row per date on the first sheet, restyled after every append.
pub struct SheetsSink<A: SheetsApi> {
    api: A,
}

impl<A: SheetsApi> SheetsSink<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    fn existing_dates(&self) -> Result<Vec<String>> {
        let rows = self.api.read_range(DATE_RANGE)?;
        Ok(rows.into_iter().filter_map(|row| row.into_iter().next()).collect())
    }

    /// Write the header row when row 1 is missing or differs from the canonical one.
    fn ensure_header(&self) -> Result<()> {
        let first_row = self.api.read_range(HEADER_RANGE)?.into_iter().next().unwrap_or_default();
        if first_row.iter().map(String::as_str).eq(SHEET_HEADERS) {
            return Ok(());
        }
        info!("Writing spreadsheet header row");
        let header: Vec<Value> = SHEET_HEADERS.iter().map(|h| json!(h)).collect();
        self.api.write_range(HEADER_RANGE, vec![header])
    }

    /// Drop every conditional rule, then reapply the full style set.
    fn apply_styling(&self) -> Result<()> {
        let meta = self.api.first_sheet()?;
        self.api.batch_update(style_requests(meta))
    }
}

impl<A: SheetsApi> RecordSink for SheetsSink<A> {
    fn name(&self) -> &str {
        "Google Sheets"
    }

    #[instrument(level = "info", skip(self, record), fields(date = %record.date))]
    fn save(&self, record: &GameRecord) -> Result<SaveOutcome> {
        let key = record.date_key();
        if self.existing_dates()?.iter().any(|d| d.trim() == key) {
            info!(date = %key, "Entry already exists in the spreadsheet");
            return Ok(SaveOutcome::Skipped(SkipReason::DuplicateDate));
        }

        self.ensure_header()?;
        self.api.append_rows(APPEND_RANGE, vec![record.to_sheet_values()])?;
        self.apply_styling()?;

        info!(date = %key, "Added new entry to the spreadsheet");
        Ok(SaveOutcome::Inserted)
    }
}

fn rgb(red: f64, green: f64, blue: f64) -> Value {
    json!({ "red": red, "green": green, "blue": blue })
}

fn column_range(sheet_id: i64, start_row: Option<usize>, end_row: Option<usize>, start_col: usize, end_col: usize) -> Value {
    let mut range = json!({
        "sheetId": sheet_id,
        "startColumnIndex": start_col,
        "endColumnIndex": end_col,
    });
    if let Some(start) = start_row {
        range["startRowIndex"] = json!(start);
    }
    if let Some(end) = end_row {
        range["endRowIndex"] = json!(end);
    }
    range
}

/// The reset-then-reapply batch for a sheet currently holding `meta.conditional_format_count` rules.
/// Applying it any number of times leaves the same formatting and exactly two rules.
pub fn style_requests(meta: SheetMeta) -> Vec<Value> {
    let id = meta.sheet_id;
    let width = SHEET_HEADERS.len();
    let mut requests = Vec::new();

    // Deleting index 0 repeatedly walks the whole rule list.
    for _ in 0..meta.conditional_format_count {
        requests.push(json!({ "deleteConditionalFormatRule": { "sheetId": id, "index": 0 } }));
    }

    requests.push(json!({
        "updateCells": {
            "range": column_range(id, Some(0), None, 0, width),
            "fields": "userEnteredFormat"
        }
    }));

    requests.push(json!({
        "repeatCell": {
            "range": column_range(id, Some(0), Some(1), 0, width),
            "cell": {
                "userEnteredFormat": {
                    "backgroundColor": rgb(0.1, 0.27, 0.13),
                    "textFormat": { "bold": true, "foregroundColor": rgb(1.0, 1.0, 1.0) }
                }
            },
            "fields": "userEnteredFormat"
        }
    }));

    for start in (0..width).step_by(2) {
        let shade = if start % 4 == 0 { rgb(0.95, 0.98, 0.95) } else { rgb(0.9, 0.95, 0.9) };
        requests.push(json!({
            "repeatCell": {
                "range": column_range(id, Some(1), None, start, (start + 2).min(width)),
                "cell": { "userEnteredFormat": { "backgroundColor": shade } },
                "fields": "userEnteredFormat.backgroundColor"
            }
        }));
    }

    requests.push(json!({
        "updateDimensionProperties": {
            "range": { "sheetId": id, "dimension": "COLUMNS", "startIndex": 0, "endIndex": width },
            "properties": { "pixelSize": 100 },
            "fields": "pixelSize"
        }
    }));

    for col in ROUND_DISTANCE_COLUMNS {
        requests.push(json!({
            "updateDimensionProperties": {
                "range": { "sheetId": id, "dimension": "COLUMNS", "startIndex": col, "endIndex": col + 1 },
                "properties": { "pixelSize": 0, "hiddenByUser": true },
                "fields": "pixelSize,hiddenByUser"
            }
        }));
    }

    for col in SCORE_COLUMNS {
        requests.push(json!({
            "repeatCell": {
                "range": column_range(id, Some(1), None, col, col + 1),
                "cell": { "userEnteredFormat": { "numberFormat": { "type": "NUMBER", "pattern": "#,##0" } } },
                "fields": "userEnteredFormat.numberFormat"
            }
        }));
    }

    let score_column = column_range(id, None, None, TOTAL_SCORE_COLUMN, TOTAL_SCORE_COLUMN + 1);
    requests.push(json!({
        "addConditionalFormatRule": {
            "index": 0,
            "rule": {
                "ranges": [score_column.clone()],
                "booleanRule": {
                    "condition": {
                        "type": "NUMBER_GREATER_THAN_EQ",
                        "values": [{ "userEnteredValue": GOLD_THRESHOLD.to_string() }]
                    },
                    "format": { "backgroundColor": { "red": 1.0, "green": 0.85, "blue": 0.0, "alpha": 1.0 } }
                }
            }
        }
    }));
    requests.push(json!({
        "addConditionalFormatRule": {
            "index": 1,
            "rule": {
                "ranges": [score_column],
                "booleanRule": {
                    "condition": {
                        "type": "NUMBER_BETWEEN",
                        "values": [
                            { "userEnteredValue": SILVER_THRESHOLD.to_string() },
                            { "userEnteredValue": (GOLD_THRESHOLD - 1).to_string() }
                        ]
                    },
                    "format": { "backgroundColor": { "red": 0.8, "green": 0.8, "blue": 0.8, "alpha": 1.0 } }
                }
            }
        }
    }));

    requests
}
