//! Sheets v4 `spreadsheets.values` client.
//!
//! | primitive | request |
//! |---|---|
//! | read  | `GET  …/values/{range}` |
//! | write | `PUT  …/values/{range}?valueInputOption=USER_ENTERED` |
//! | clear | `POST …/values/{range}:clear` |

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use staffsync_core::config::SheetConfig;

use crate::auth::TokenSource;
use crate::error::GridError;
use crate::grid::GridSurface;
use crate::range::RangeSpec;
use crate::row::Row;

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValueRangeBody<'a> {
    range: String,
    major_dimension: &'static str,
    values: &'a [Row],
}

pub struct GoogleSheetsClient {
    agent: ureq::Agent,
    api_base: String,
    spreadsheet_id: String,
    tokens: Box<dyn TokenSource>,
}

impl GoogleSheetsClient {
    pub fn new(config: &SheetConfig, tokens: Box<dyn TokenSource>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(30))
            .build();
        Self {
            agent,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            spreadsheet_id: config.spreadsheet_id.clone(),
            tokens,
        }
    }

    fn values_url(&self, range: &RangeSpec, suffix: &str) -> String {
        format!(
            "{}/v4/spreadsheets/{}/values/{}{suffix}",
            self.api_base,
            urlencoding::encode(&self.spreadsheet_id),
            urlencoding::encode(&range.to_string()),
        )
    }

    fn bearer(&self) -> Result<String, GridError> {
        Ok(format!("Bearer {}", self.tokens.access_token()?))
    }
}

impl GridSurface for GoogleSheetsClient {
    fn read(&self, range: &RangeSpec) -> Result<Vec<Row>, GridError> {
        let response = self
            .agent
            .get(&self.values_url(range, ""))
            .set("Authorization", &self.bearer()?)
            .call()?;
        let body: ValueRange = response
            .into_json()
            .map_err(|err| GridError::Decode(format!("values.get {range}: {err}")))?;
        tracing::debug!("read {} row(s) from {range}", body.values.len());
        Ok(body
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect())
    }

    fn write(&self, range: &RangeSpec, rows: &[Row]) -> Result<(), GridError> {
        let body = ValueRangeBody {
            range: range.to_string(),
            major_dimension: "ROWS",
            values: rows,
        };
        self.agent
            .put(&self.values_url(range, ""))
            .query("valueInputOption", "USER_ENTERED")
            .set("Authorization", &self.bearer()?)
            .send_json(&body)?;
        tracing::debug!("wrote {} row(s) to {range}", rows.len());
        Ok(())
    }

    fn clear(&self, range: &RangeSpec) -> Result<(), GridError> {
        self.agent
            .post(&self.values_url(range, ":clear"))
            .set("Authorization", &self.bearer()?)
            .send_json(serde_json::json!({}))?;
        tracing::debug!("cleared {range}");
        Ok(())
    }
}

/// Formatted values arrive as strings; anything else is rendered as JSON text.
fn cell_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
