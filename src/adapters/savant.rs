use crate::adapters::http::HttpFetcher;
use crate::domain::model::Pitch;
use crate::domain::ports::StatcastSource;
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};

/// Baseball Savant's CSV search endpoint.
#[derive(Clone)]
pub struct SavantClient {
    fetcher: HttpFetcher,
    endpoint: String,
}

impl SavantClient {
    pub fn new(fetcher: HttpFetcher, endpoint: impl Into<String>) -> Self {
        Self {
            fetcher,
            endpoint: endpoint.into(),
        }
    }

    fn query(player_id: u32, start: NaiveDate, end: NaiveDate) -> Vec<(String, String)> {
        [
            ("all", "true".to_string()),
            ("type", "details".to_string()),
            ("player_type", "batter".to_string()),
            ("game_date_gt", start.format("%Y-%m-%d").to_string()),
            ("game_date_lt", end.format("%Y-%m-%d").to_string()),
            ("batters_lookup[]", player_id.to_string()),
            ("min_pitches", "0".to_string()),
            ("min_results", "0".to_string()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }

    async fn fetch_window(&self, player_id: u32, start: NaiveDate, end: NaiveDate) -> Result<Vec<Pitch>> {
        let body = self
            .fetcher
            .get_bytes(&self.endpoint, &Self::query(player_id, start, end))
            .await?;
        let pitches = parse_statcast_csv(&body)?;

        // 服務有時回傳窗口外的列
        Ok(pitches
            .into_iter()
            .filter(|p| p.game_date >= start && p.game_date <= end)
            .collect())
    }
}

/// Splits `[start, end]` into per-season windows.
pub fn season_windows(start: NaiveDate, end: NaiveDate) -> Vec<(NaiveDate, NaiveDate)> {
    let mut windows = Vec::new();
    let mut year = start.year();
    while year <= end.year() {
        let window_start = NaiveDate::from_ymd_opt(year, 1, 1)
            .map(|d| d.max(start))
            .unwrap_or(start);
        let window_end = NaiveDate::from_ymd_opt(year, 12, 31)
            .map(|d| d.min(end))
            .unwrap_or(end);
        if window_start <= window_end {
            windows.push((window_start, window_end));
        }
        year += 1;
    }
    windows
}

/// Parses a Savant CSV export, tolerating a UTF-8 BOM and an empty body.
pub fn parse_statcast_csv(body: &[u8]) -> Result<Vec<Pitch>> {
    let body = body.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(body);
    if body.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(Vec::new());
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(body);
    let mut pitches = Vec::new();
    for row in reader.deserialize::<Pitch>() {
        pitches.push(row?);
    }
    Ok(pitches)
}

#[async_trait]
impl StatcastSource for SavantClient {
    async fn batter_pitches(
        &self,
        player_id: u32,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Pitch>> {
        let mut pitches = Vec::new();
        for (window_start, window_end) in season_windows(start, end) {
            let window = self.fetch_window(player_id, window_start, window_end).await?;
            tracing::debug!(
                "Player {}: {} pitches between {} and {}",
                player_id,
                window.len(),
                window_start,
                window_end
            );
            pitches.extend(window);
        }
        Ok(pitches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::toml_config::SourcesConfig;
    use httpmock::prelude::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_season_windows() {
        let windows = season_windows(date("2018-06-15"), date("2020-03-01"));
        assert_eq!(
            windows,
            vec![
                (date("2018-06-15"), date("2018-12-31")),
                (date("2019-01-01"), date("2019-12-31")),
                (date("2020-01-01"), date("2020-03-01")),
            ]
        );

        assert!(season_windows(date("2020-01-02"), date("2020-01-01")).is_empty());
    }

    #[test]
    fn test_parse_statcast_csv_with_bom() {
        let body = "\u{feff}pitch_type,game_date,batter,events,description,game_type\n\
FF,2019-04-01,660271,single,hit_into_play,R\n";
        let pitches = parse_statcast_csv(body.as_bytes()).unwrap();

        assert_eq!(pitches.len(), 1);
        assert_eq!(pitches[0].batter, Some(660271));
        assert_eq!(pitches[0].events.as_deref(), Some("single"));
    }

    #[test]
    fn test_parse_empty_body() {
        assert!(parse_statcast_csv(b"").unwrap().is_empty());
        assert!(parse_statcast_csv(b"  \n").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_batter_pitches_queries_each_season() {
        let server = MockServer::start();
        let body = "game_date,batter,game_type,at_bat_number\n\
2018-05-01,42,R,1\n\
2019-05-01,42,R,1\n";
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/statcast_search/csv")
                .query_param("player_type", "batter")
                .query_param("batters_lookup[]", "42");
            then.status(200).body(body);
        });

        let sources = SourcesConfig {
            retry_delay_seconds: 0,
            ..SourcesConfig::default()
        };
        let client = SavantClient::new(
            HttpFetcher::new(&sources).unwrap(),
            server.url("/statcast_search/csv"),
        );

        let pitches = client
            .batter_pitches(42, date("2018-01-01"), date("2019-12-31"))
            .await
            .unwrap();

        // 每季一個請求，各自只保留窗口內的列
        mock.assert_hits(2);
        assert_eq!(pitches.len(), 2);
        assert_eq!(pitches[0].game_date, date("2018-05-01"));
        assert_eq!(pitches[1].game_date, date("2019-05-01"));
    }
}
