//! Google Sheets v4 REST client.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use rollcall_engine::engine::{FetchedRange, Orientation};

use super::{CellFormat, SheetsApi};
use crate::error::{Result, RollcallError};
use crate::http::{endpoint, ensure_success};

const SERVICE: &str = "Google Sheets";
const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com";
const BACKGROUND_FIELDS: &str = "userEnteredFormat(backgroundColor)";

/// OAuth bearer token for the Sheets API.
#[derive(Clone, Deserialize)]
pub struct AccessToken {
    access_token: String,
}

impl AccessToken {
    pub fn new(access_token: impl Into<String>) -> Self {
        AccessToken {
            access_token: access_token.into(),
        }
    }

    /// Read a token file: a JSON object with an `access_token` field. Other
    /// fields (refresh token, expiry) are ignored.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let token: AccessToken = serde_json::from_str(&content)?;
        if token.access_token.trim().is_empty() {
            return Err(RollcallError::InvalidConfig(format!(
                "{} has an empty access_token",
                path.display()
            )));
        }
        Ok(token)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(..)")
    }
}

#[derive(Clone, Debug)]
pub struct GoogleSheets {
    http: reqwest::Client,
    base_url: String,
    token: AccessToken,
}

impl GoogleSheets {
    pub fn new(token: AccessToken) -> Result<Self> {
        let http = reqwest::Client::builder().build()?;
        Ok(GoogleSheets {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
            token,
        })
    }

    /// Point the client at another host, e.g. a local emulator.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn url(&self, segments: &[&str]) -> Result<reqwest::Url> {
        endpoint(SERVICE, &self.base_url, segments)
    }

    /// Map sheet titles to numeric sheet ids.
    async fn sheet_ids(&self, sheet_id: &str) -> Result<HashMap<String, i64>> {
        let url = self.url(&["v4", "spreadsheets", sheet_id])?;
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token.access_token)
            .query(&[("fields", "sheets.properties(sheetId,title)")])
            .send()
            .await?;
        let meta: SpreadsheetMeta = ensure_success(SERVICE, "spreadsheet metadata", response)
            .await?
            .json()
            .await?;
        Ok(meta
            .sheets
            .into_iter()
            .map(|s| (s.properties.title, s.properties.sheet_id))
            .collect())
    }
}

impl SheetsApi for GoogleSheets {
    async fn batch_get_values(&self, sheet_id: &str, ranges: &[String]) -> Result<Vec<FetchedRange>> {
        let url = self.url(&["v4", "spreadsheets", sheet_id, "values:batchGet"])?;
        let mut query: Vec<(&str, &str)> = ranges.iter().map(|r| ("ranges", r.as_str())).collect();
        query.push(("majorDimension", "ROWS"));

        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token.access_token)
            .query(&query)
            .send()
            .await?;
        let body: BatchGetResponse = ensure_success(SERVICE, "values:batchGet", response)
            .await?
            .json()
            .await?;
        Ok(body.into_fetched())
    }

    async fn batch_update_formatting(&self, sheet_id: &str, formats: &[CellFormat]) -> Result<()> {
        if formats.is_empty() {
            return Ok(());
        }
        let sheet_ids = if formats.iter().any(|f| f.sheet.is_some()) {
            self.sheet_ids(sheet_id).await?
        } else {
            HashMap::new()
        };
        let request = build_batch_update(formats, &sheet_ids);
        if request.requests.is_empty() {
            return Ok(());
        }

        let url = self.url(&["v4", "spreadsheets", &format!("{sheet_id}:batchUpdate")])?;
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.token.access_token)
            .json(&request)
            .send()
            .await?;
        ensure_success(SERVICE, "batchUpdate", response).await?;
        Ok(())
    }
}

/// Build the `batchUpdate` body, one `repeatCell` request per format in order.
/// Formats on sheets missing from `sheet_ids` are skipped with a warning;
/// unqualified formats target sheet id 0.
pub(crate) fn build_batch_update(
    formats: &[CellFormat],
    sheet_ids: &HashMap<String, i64>,
) -> BatchUpdateRequest {
    let mut requests = Vec::with_capacity(formats.len());
    for format in formats {
        let sheet_id = match &format.sheet {
            None => 0,
            Some(title) => match sheet_ids.get(title) {
                Some(id) => *id,
                None => {
                    tracing::warn!(sheet = %title, cell = %format.cell, "unknown sheet, skipping cell");
                    continue;
                }
            },
        };
        let (red, green, blue) = format.colour.to_unit();
        requests.push(Request {
            repeat_cell: RepeatCellRequest {
                range: GridRange {
                    sheet_id,
                    start_row_index: format.cell.row,
                    end_row_index: format.cell.row + 1,
                    start_column_index: format.cell.col,
                    end_column_index: format.cell.col + 1,
                },
                cell: CellData {
                    user_entered_format: UserEnteredFormat {
                        background_color: Color { red, green, blue },
                    },
                },
                fields: BACKGROUND_FIELDS,
            },
        });
    }
    BatchUpdateRequest {
        requests,
        include_spreadsheet_in_response: false,
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatchGetResponse {
    #[serde(default)]
    value_ranges: Vec<ValueRange>,
}

impl BatchGetResponse {
    fn into_fetched(self) -> Vec<FetchedRange> {
        self.value_ranges
            .into_iter()
            .map(|vr| {
                FetchedRange::new(
                    vr.range,
                    Orientation::from_major_dimension(vr.major_dimension.as_deref()),
                    vr.values,
                )
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValueRange {
    range: String,
    major_dimension: Option<String>,
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    sheet_id: i64,
    title: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BatchUpdateRequest {
    requests: Vec<Request>,
    include_spreadsheet_in_response: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Request {
    repeat_cell: RepeatCellRequest,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RepeatCellRequest {
    range: GridRange,
    cell: CellData,
    fields: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GridRange {
    sheet_id: i64,
    start_row_index: usize,
    end_row_index: usize,
    start_column_index: usize,
    end_column_index: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CellData {
    user_entered_format: UserEnteredFormat,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UserEnteredFormat {
    background_color: Color,
}

#[derive(Debug, Serialize)]
struct Color {
    red: f32,
    green: f32,
    blue: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::stub::StubServer;
    use rollcall_engine::engine::{CellRef, Rgb};
    use serde_json::json;

    #[test]
    fn test_batch_update_body() {
        let formats = [CellFormat {
            sheet: None,
            cell: CellRef::new(2, 5),
            colour: Rgb::from_hex("00FF00").unwrap(),
        }];
        let body = serde_json::to_value(build_batch_update(&formats, &HashMap::new())).unwrap();
        assert_eq!(
            body,
            json!({
                "requests": [{
                    "repeatCell": {
                        "range": {
                            "sheetId": 0,
                            "startRowIndex": 5,
                            "endRowIndex": 6,
                            "startColumnIndex": 2,
                            "endColumnIndex": 3
                        },
                        "cell": {
                            "userEnteredFormat": {
                                "backgroundColor": { "red": 0.0, "green": 1.0, "blue": 0.0 }
                            }
                        },
                        "fields": "userEnteredFormat(backgroundColor)"
                    }
                }],
                "includeSpreadsheetInResponse": false
            })
        );
    }

    #[test]
    fn test_named_sheets_resolve_to_ids() {
        let formats = [
            CellFormat {
                sheet: Some("Roster".to_string()),
                cell: CellRef::new(0, 0),
                colour: Rgb::WHITE,
            },
            CellFormat {
                sheet: Some("Missing".to_string()),
                cell: CellRef::new(1, 1),
                colour: Rgb::WHITE,
            },
        ];
        let ids = HashMap::from([("Roster".to_string(), 917_i64)]);
        let body = serde_json::to_value(build_batch_update(&formats, &ids)).unwrap();
        let requests = body["requests"].as_array().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0]["repeatCell"]["range"]["sheetId"], 917);
    }

    #[test]
    fn test_batch_get_response_parsing() {
        let body: BatchGetResponse = serde_json::from_value(json!({
            "spreadsheetId": "abc",
            "valueRanges": [
                { "range": "Sheet1!C2:D17", "majorDimension": "ROWS", "values": [["alice"]] },
                { "range": "Sheet1!E2:E3", "majorDimension": "COLUMNS" }
            ]
        }))
        .unwrap();
        let fetched = body.into_fetched();
        assert_eq!(fetched.len(), 2);
        assert_eq!(fetched[0].range, "Sheet1!C2:D17");
        assert_eq!(fetched[0].values, vec![vec![json!("alice")]]);
        assert_eq!(fetched[1].orientation, Orientation::Columns);
        assert!(fetched[1].values.is_empty());
    }

    #[test]
    fn test_access_token_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        std::fs::write(
            &path,
            r#"{"access_token":"ya29.x","token_type":"Bearer","refresh_token":"r"}"#,
        )
        .unwrap();
        let token = AccessToken::from_file(&path).unwrap();
        assert_eq!(token.access_token, "ya29.x");
        assert_eq!(format!("{token:?}"), "AccessToken(..)");

        std::fs::write(&path, r#"{"access_token":""}"#).unwrap();
        assert!(AccessToken::from_file(&path).is_err());
    }

    fn client(server: &StubServer) -> GoogleSheets {
        GoogleSheets::new(AccessToken::new("ya29.test"))
            .unwrap()
            .with_base_url(&server.base_url)
    }

    #[tokio::test]
    async fn test_batch_get_repeats_ranges_param() {
        let body = json!({
            "valueRanges": [
                { "range": "Sheet1!C2:D17", "majorDimension": "ROWS", "values": [["alice"]] },
                { "range": "'Raid Roster'!C5:C9", "majorDimension": "ROWS" }
            ]
        });
        let server = StubServer::start(vec![(200, body.to_string())]).await;
        let ranges = vec!["C2:D17".to_string(), "'Raid Roster'!C5:C9".to_string()];

        let fetched = client(&server).batch_get_values("sheet", &ranges).await.unwrap();
        assert_eq!(fetched.len(), 2);
        assert_eq!(fetched[0].values, vec![vec![json!("alice")]]);

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        let line = &requests[0].request_line;
        assert!(line.starts_with("GET /v4/spreadsheets/sheet/values:batchGet?"), "{line}");
        assert_eq!(line.matches("ranges=").count(), 2, "{line}");
        assert!(line.contains("majorDimension=ROWS"), "{line}");
        assert!(requests[0].headers.contains("authorization: bearer ya29.test"));
    }

    #[tokio::test]
    async fn test_named_sheet_is_resolved_before_update() {
        let meta = json!({
            "sheets": [
                { "properties": { "sheetId": 0, "title": "Sheet1" } },
                { "properties": { "sheetId": 917, "title": "Raid Roster" } }
            ]
        });
        let server = StubServer::start(vec![(200, meta.to_string()), (200, "{}".to_string())]).await;
        let formats = [CellFormat {
            sheet: Some("Raid Roster".to_string()),
            cell: CellRef::new(2, 7),
            colour: Rgb::from_hex("ff0000").unwrap(),
        }];

        client(&server).batch_update_formatting("sheet", &formats).await.unwrap();

        let requests = server.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[0].request_line.starts_with("GET /v4/spreadsheets/sheet?fields="));
        assert!(requests[1].request_line.starts_with("POST /v4/spreadsheets/sheet:batchUpdate "));
        let body: Value = serde_json::from_str(&requests[1].body).unwrap();
        let range = &body["requests"][0]["repeatCell"]["range"];
        assert_eq!(range["sheetId"], 917);
        assert_eq!(range["startRowIndex"], 7);
        assert_eq!(range["startColumnIndex"], 2);
    }

    #[tokio::test]
    async fn test_unqualified_update_skips_metadata() {
        let server = StubServer::start(vec![(200, "{}".to_string())]).await;
        let formats = [CellFormat {
            sheet: None,
            cell: CellRef::new(0, 0),
            colour: Rgb::WHITE,
        }];

        client(&server).batch_update_formatting("sheet", &formats).await.unwrap();

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].request_line.starts_with("POST "));
    }

    #[tokio::test]
    async fn test_error_status_is_external_service() {
        let server = StubServer::start(vec![(
            500,
            r#"{"error":{"code":500,"message":"backend error"}}"#.to_string(),
        )])
        .await;
        let ranges = vec!["A1:B2".to_string()];

        let err = client(&server).batch_get_values("sheet", &ranges).await.unwrap_err();
        match err {
            RollcallError::ExternalService { service, message } => {
                assert_eq!(service, "Google Sheets");
                assert!(message.contains("values:batchGet returned 500"), "{message}");
                assert!(message.contains("backend error"), "{message}");
            }
            other => panic!("expected ExternalService, got {other:?}"),
        }
    }
}
