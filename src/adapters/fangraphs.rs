use crate::adapters::http::HttpFetcher;
use crate::domain::model::BattingSeason;
use crate::domain::ports::LeaderboardSource;
use crate::utils::error::{PipelineError, Result};
use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// FanGraphs major-league batting leaderboard (JSON API), split by season.
pub struct FangraphsClient {
    fetcher: HttpFetcher,
    endpoint: String,
}

impl FangraphsClient {
    pub fn new(fetcher: HttpFetcher, endpoint: impl Into<String>) -> Self {
        Self {
            fetcher,
            endpoint: endpoint.into(),
        }
    }

    fn query(start_year: i32, end_year: i32) -> Vec<(String, String)> {
        [
            ("pos", "all".to_string()),
            ("stats", "bat".to_string()),
            ("lg", "all".to_string()),
            // 至少 1 個打席
            ("qual", "1".to_string()),
            ("season1", start_year.to_string()),
            ("season", end_year.to_string()),
            ("month", "0".to_string()),
            ("ind", "1".to_string()),
            ("type", "8".to_string()),
            ("pageitems", "2000000000".to_string()),
            ("pagenum", "1".to_string()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }
}

fn as_u32(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

static HTML_TAG: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"<[^>]*>").ok());

/// `Name` 欄位帶有 HTML 連結，去除標籤
fn strip_html_tags(text: &str) -> String {
    match HTML_TAG.as_ref() {
        Some(re) => re.replace_all(text, "").trim().to_string(),
        None => text.trim().to_string(),
    }
}

impl BattingSeason {
    /// Reads one leaderboard row; rows missing id, season or PA yield `None`.
    pub fn from_json(row: &Value) -> Option<Self> {
        let fangraphs_id = row.get("playerid").or_else(|| row.get("IDfg")).and_then(as_u32)?;
        let season = row.get("Season").and_then(as_u32)? as i32;
        let plate_appearances = row.get("PA").and_then(as_u32)?;
        let war = row.get("WAR").and_then(as_f64).unwrap_or(0.0);
        let name = row
            .get("PlayerName")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| row.get("Name").and_then(Value::as_str).map(strip_html_tags))
            .unwrap_or_else(|| "Unknown".to_string());

        Some(Self {
            fangraphs_id,
            name,
            season,
            plate_appearances,
            war,
        })
    }
}

pub fn parse_leaderboard(body: &[u8]) -> Result<Vec<BattingSeason>> {
    let json: Value = serde_json::from_slice(body)?;
    let rows = match &json {
        Value::Array(rows) => rows,
        Value::Object(obj) => match obj.get("data") {
            Some(Value::Array(rows)) => rows,
            _ => {
                return Err(PipelineError::ProcessingError {
                    message: "Leaderboard response has no 'data' array".to_string(),
                })
            }
        },
        _ => {
            return Err(PipelineError::ProcessingError {
                message: "Unexpected leaderboard response shape".to_string(),
            })
        }
    };

    let seasons: Vec<BattingSeason> = rows.iter().filter_map(BattingSeason::from_json).collect();
    if seasons.len() < rows.len() {
        tracing::debug!(
            "Skipped {} leaderboard rows without id/season/PA",
            rows.len() - seasons.len()
        );
    }
    Ok(seasons)
}

#[async_trait]
impl LeaderboardSource for FangraphsClient {
    async fn batting_seasons(&self, start_year: i32, end_year: i32) -> Result<Vec<BattingSeason>> {
        tracing::info!("📡 Fetching batting leaderboard {}-{}", start_year, end_year);
        let body = self
            .fetcher
            .get_bytes(&self.endpoint, &Self::query(start_year, end_year))
            .await?;
        let seasons = parse_leaderboard(&body)?;
        tracing::info!("📊 Leaderboard returned {} player-seasons", seasons.len());
        Ok(seasons)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::toml_config::SourcesConfig;
    use httpmock::prelude::*;

    #[test]
    fn test_parse_leaderboard_rows() {
        let body = serde_json::json!({
            "data": [
                {"Name": "<a href=\"statss.aspx?playerid=19755\">Shohei Ohtani</a>",
                 "playerid": 19755, "Season": 2018, "PA": 367, "WAR": 2.7},
                {"PlayerName": "Juan Soto", "playerid": "20123", "Season": "2019", "PA": 659.0, "WAR": 4.8},
                {"PlayerName": "No Id", "Season": 2019, "PA": 10}
            ],
            "totalCount": 3
        });

        let seasons = parse_leaderboard(body.to_string().as_bytes()).unwrap();

        assert_eq!(seasons.len(), 2);
        assert_eq!(seasons[0].name, "Shohei Ohtani");
        assert_eq!(seasons[0].fangraphs_id, 19755);
        assert_eq!(seasons[1].fangraphs_id, 20123);
        assert_eq!(seasons[1].season, 2019);
        assert_eq!(seasons[1].plate_appearances, 659);
        assert!((seasons[1].war - 4.8).abs() < 1e-9);
    }

    #[test]
    fn test_strip_html_tags_across_rows() {
        let names = [
            "<a href=\"statss.aspx?playerid=1\">Juan Soto</a>",
            " <a href=\"x\"><b>Mookie Betts</b></a> ",
            "Plain Name",
        ];
        let stripped: Vec<String> = names.iter().map(|n| strip_html_tags(n)).collect();

        assert_eq!(stripped, vec!["Juan Soto", "Mookie Betts", "Plain Name"]);
        assert!(HTML_TAG.is_some());
    }

    #[test]
    fn test_parse_leaderboard_rejects_unknown_shape() {
        assert!(parse_leaderboard(br#"{"rows": []}"#).is_err());
        assert!(parse_leaderboard(b"[]").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_batting_seasons_request() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/leaders")
                .query_param("season1", "2012")
                .query_param("season", "2024")
                .query_param("ind", "1");
            then.status(200).json_body(serde_json::json!({
                "data": [{"PlayerName": "A", "playerid": 1, "Season": 2015, "PA": 500, "WAR": 1.0}]
            }));
        });

        let client = FangraphsClient::new(
            HttpFetcher::new(&SourcesConfig::default()).unwrap(),
            server.url("/leaders"),
        );
        let seasons = client.batting_seasons(2012, 2024).await.unwrap();

        mock.assert();
        assert_eq!(seasons.len(), 1);
    }
}
