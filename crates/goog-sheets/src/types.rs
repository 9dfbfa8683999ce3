//! Sheets API types.

use serde::Deserialize;

/// Spreadsheet metadata from `spreadsheets.get`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spreadsheet {
    pub spreadsheet_id: String,
    pub properties: SpreadsheetProperties,
    #[serde(default)]
    pub sheets: Vec<Worksheet>,
}

impl Spreadsheet {
    pub fn title(&self) -> &str {
        &self.properties.title
    }

    /// Worksheet by title.
    pub fn worksheet(&self, title: &str) -> Option<&Worksheet> {
        self.sheets.iter().find(|s| s.properties.title == title)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpreadsheetProperties {
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Worksheet {
    pub properties: WorksheetProperties,
}

impl Worksheet {
    pub fn title(&self) -> &str {
        &self.properties.title
    }

    pub fn row_count(&self) -> u32 {
        self.properties.grid_properties.row_count
    }

    pub fn column_count(&self) -> u32 {
        self.properties.grid_properties.column_count
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorksheetProperties {
    #[serde(default)]
    pub sheet_id: i64,
    pub title: String,
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub grid_properties: GridProperties,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridProperties {
    #[serde(default)]
    pub row_count: u32,
    #[serde(default)]
    pub column_count: u32,
}

/// Response of `spreadsheets.values.get`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    #[serde(default)]
    pub range: String,
    #[serde(default)]
    pub values: Vec<Vec<serde_json::Value>>,
}

impl ValueRange {
    /// Rows as strings. Formatted values arrive as strings already; anything
    /// else is rendered as JSON.
    pub fn rows(&self) -> Vec<Vec<String>> {
        self.values
            .iter()
            .map(|row| {
                row.iter()
                    .map(|v| match v {
                        serde_json::Value::String(s) => s.clone(),
                        serde_json::Value::Null => String::new(),
                        other => other.to_string(),
                    })
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    #[test]
    fn test_spreadsheet_parsing() {
        let json = r#"{
            "spreadsheetId": "abc",
            "properties": {"title": "Budget"},
            "sheets": [
                {"properties": {"sheetId": 0, "title": "Summary", "index": 0,
                                "gridProperties": {"rowCount": 100, "columnCount": 26}}},
                {"properties": {"sheetId": 7, "title": "Detail", "index": 1}}
            ]
        }"#;
        let sheet: Spreadsheet = serde_json::from_str(json).unwrap();

        assert_eq!(sheet.title(), "Budget");
        assert_eq!(sheet.sheets[0].row_count(), 100);
        assert_eq!(sheet.worksheet("Detail").map(|w| w.row_count()), Some(0));
        assert!(sheet.worksheet("Missing").is_none());
    }

    #[test]
    fn test_value_range_rows() {
        let range: ValueRange = serde_json::from_str(
            r#"{"range": "Summary!A1:C2", "values": [["a", "b"], ["1", 2, null]]}"#,
        )
        .unwrap();
        assert_eq!(
            range.rows(),
            vec![vec!["a", "b"], vec!["1", "2", ""]]
        );
    }

    #[test]
    fn test_empty_value_range() {
        let range: ValueRange = serde_json::from_str(r#"{"range": "Summary!A5:ZZ4"}"#).unwrap();
        assert!(range.rows().is_empty());
    }
}
