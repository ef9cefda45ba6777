use crate::config::toml_config::{layout, CollectionConfig};
use crate::core::records::write_records;
use crate::domain::model::{
    BattingSeason, CareerSummary, NthPaResult, PlayerIdMapping, QualifyingPlayer, TimelineEntry,
};
use crate::domain::ports::{
    Counted, LeaderboardSource, Pipeline, PlayerRegister, StatcastSource, Storage,
};
use crate::features::timeline::{filter_game_types, find_nth_pa};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::time::Duration;

/// 依 FanGraphs ID 彙總各球季
pub fn aggregate_careers(seasons: &[BattingSeason]) -> Vec<CareerSummary> {
    let mut careers: HashMap<u32, CareerSummary> = HashMap::new();
    for season in seasons {
        careers
            .entry(season.fangraphs_id)
            .and_modify(|career| {
                career.debut_year = career.debut_year.min(season.season);
                career.last_year = career.last_year.max(season.season);
                career.total_pa += season.plate_appearances;
                career.career_war += season.war;
            })
            .or_insert_with(|| CareerSummary {
                fangraphs_id: season.fangraphs_id,
                name: season.name.clone(),
                debut_year: season.season,
                last_year: season.season,
                total_pa: season.plate_appearances,
                career_war: season.war,
            });
    }
    let mut careers: Vec<CareerSummary> = careers.into_values().collect();
    careers.sort_by_key(|c| c.fangraphs_id);
    careers
}

/// Careers inside the debut window with enough PAs, joined to their MLBAM ids.
pub fn select_qualifying(
    careers: &[CareerSummary],
    mappings: &[PlayerIdMapping],
    collection: &CollectionConfig,
) -> Vec<QualifyingPlayer> {
    let candidates: Vec<&CareerSummary> = careers
        .iter()
        .filter(|c| {
            c.debut_year >= collection.debut_year_start
                && c.debut_year <= collection.debut_year_end
                && c.total_pa >= collection.min_career_pa
        })
        .collect();

    let by_fangraphs: HashMap<u32, u32> = mappings
        .iter()
        .map(|m| (m.fangraphs_id, m.mlbam_id))
        .collect();

    let mut players: Vec<QualifyingPlayer> = candidates
        .iter()
        .filter_map(|c| {
            let mlbam_id = *by_fangraphs.get(&c.fangraphs_id)?;
            Some(QualifyingPlayer {
                mlbam_id,
                fangraphs_id: c.fangraphs_id,
                player_name: c.name.clone(),
                debut_year: c.debut_year,
                last_year: c.last_year,
                total_pa: c.total_pa,
                career_war: c.career_war,
            })
        })
        .collect();

    tracing::info!(
        "🔗 Matched {}/{} players to MLBAM IDs",
        players.len(),
        candidates.len()
    );

    players.sort_by(|a, b| {
        a.debut_year
            .cmp(&b.debut_year)
            .then_with(|| a.player_name.cmp(&b.player_name))
    });
    if let Some(max_players) = collection.max_players {
        players.truncate(max_players);
    }
    players
}

pub async fn find_qualifying_players<L, R>(
    leaderboard: &L,
    register: &R,
    collection: &CollectionConfig,
) -> Result<Vec<QualifyingPlayer>>
where
    L: LeaderboardSource,
    R: PlayerRegister,
{
    let start_year = collection.leaderboard_start_year();
    let end_year = collection.leaderboard_end_year();

    let seasons = match leaderboard.batting_seasons(start_year, end_year).await {
        Ok(seasons) => seasons,
        Err(e) => {
            tracing::warn!(
                "⚠️ Leaderboard {}-{} failed ({}), retrying from {}",
                start_year,
                end_year,
                e,
                collection.debut_year_start
            );
            leaderboard
                .batting_seasons(collection.debut_year_start, end_year)
                .await?
        }
    };

    let careers = aggregate_careers(&seasons);
    tracing::info!("📊 Aggregated {} careers from {} seasons", careers.len(), seasons.len());

    let mappings = register.id_mappings().await?;
    let players = select_qualifying(&careers, &mappings, collection);
    tracing::info!(
        "✅ {} players debuted {}-{} with ≥{} career PA",
        players.len(),
        collection.debut_year_start,
        collection.debut_year_end,
        collection.min_career_pa
    );
    Ok(players)
}

/// Finds the Nth-PA date for one player; download failures become a failed result.
pub async fn find_nth_pa_date<S: StatcastSource>(
    statcast: &S,
    player_id: u32,
    n_pa: usize,
    start: NaiveDate,
    end: NaiveDate,
    game_types: &[String],
) -> NthPaResult {
    let pitches = match statcast.batter_pitches(player_id, start, end).await {
        Ok(pitches) => pitches,
        Err(e) => return NthPaResult::failed(player_id, n_pa, e.to_string()),
    };
    if pitches.is_empty() {
        return NthPaResult::failed(player_id, n_pa, "No data found");
    }

    let regular = filter_game_types(pitches, game_types);
    find_nth_pa(player_id, &regular, n_pa)
}

pub struct TimelineOutput {
    pub qualifying: Vec<QualifyingPlayer>,
    pub timeline: Vec<TimelineEntry>,
}

impl Counted for TimelineOutput {
    fn count(&self) -> usize {
        self.timeline.len()
    }
}

/// Qualifying players and the date each one reached N plate appearances.
pub struct TimelinePipeline<L, R, S, St> {
    leaderboard: L,
    register: R,
    statcast: S,
    storage: St,
    collection: CollectionConfig,
}

impl<L, R, S, St> TimelinePipeline<L, R, S, St>
where
    L: LeaderboardSource,
    R: PlayerRegister,
    S: StatcastSource,
    St: Storage,
{
    pub fn new(
        leaderboard: L,
        register: R,
        statcast: S,
        storage: St,
        collection: CollectionConfig,
    ) -> Self {
        Self {
            leaderboard,
            register,
            statcast,
            storage,
            collection,
        }
    }

    pub async fn build_player_timeline(&self, players: &[QualifyingPlayer]) -> Vec<TimelineEntry> {
        let n_pa = self.collection.n_pa;
        let end = self.collection.data_end_date;
        let mut timeline = Vec::with_capacity(players.len());

        for (i, player) in players.iter().enumerate() {
            tracing::info!(
                "[{}/{}] {} (debut {})",
                i + 1,
                players.len(),
                player.player_name,
                player.debut_year
            );

            let start = NaiveDate::from_ymd_opt(player.debut_year, 1, 1).unwrap_or(end);
            let result = find_nth_pa_date(
                &self.statcast,
                player.mlbam_id,
                n_pa,
                start,
                end,
                &self.collection.game_types,
            )
            .await;

            match (&result.date_reached, &result.error) {
                (Some(reached), _) => tracing::info!("  ✓ PA #{} on {}", n_pa, reached),
                (None, Some(error)) => tracing::warn!("  ✗ {}", error),
                (None, None) => {}
            }
            timeline.push(result.into_timeline(player));

            if i + 1 < players.len() && self.collection.timeline_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.collection.timeline_delay_ms)).await;
            }
        }

        let found = timeline.iter().filter(|t| t.success).count();
        tracing::info!("📅 PA #{} date found for {}/{} players", n_pa, found, timeline.len());
        timeline
    }
}

#[async_trait]
impl<L, R, S, St> Pipeline for TimelinePipeline<L, R, S, St>
where
    L: LeaderboardSource,
    R: PlayerRegister,
    S: StatcastSource,
    St: Storage,
{
    type Extracted = Vec<QualifyingPlayer>;
    type Transformed = TimelineOutput;

    fn name(&self) -> &str {
        "player-timeline"
    }

    async fn extract(&self) -> Result<Vec<QualifyingPlayer>> {
        find_qualifying_players(&self.leaderboard, &self.register, &self.collection).await
    }

    async fn transform(&self, players: Vec<QualifyingPlayer>) -> Result<TimelineOutput> {
        let timeline = self.build_player_timeline(&players).await;
        Ok(TimelineOutput {
            qualifying: players,
            timeline,
        })
    }

    async fn load(&self, output: TimelineOutput) -> Result<String> {
        write_records(&self.storage, layout::QUALIFYING_PLAYERS, &output.qualifying).await?;
        write_records(&self.storage, layout::PLAYER_TIMELINE, &output.timeline).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::memory::MockStorage;
    use crate::app::pipelines::fakes::{daily_pitches, FakeLeaderboard, FakeRegister, FakeStatcast};
    use crate::core::records::from_csv;
    use crate::core::EtlEngine;

    fn season(id: u32, name: &str, year: i32, pa: u32, war: f64) -> BattingSeason {
        BattingSeason {
            fangraphs_id: id,
            name: name.to_string(),
            season: year,
            plate_appearances: pa,
            war,
        }
    }

    fn mapping(fangraphs_id: u32, mlbam_id: u32) -> PlayerIdMapping {
        PlayerIdMapping {
            fangraphs_id,
            mlbam_id,
            name_first: String::new(),
            name_last: String::new(),
        }
    }

    fn collection() -> CollectionConfig {
        CollectionConfig {
            n_pa: 3,
            min_career_pa: 1000,
            debut_year_start: 2015,
            debut_year_end: 2018,
            timeline_delay_ms: 0,
            fetch_delay_ms: 0,
            ..Default::default()
        }
    }

    #[test]
    fn test_aggregate_careers() {
        let careers = aggregate_careers(&[
            season(1, "Alpha", 2016, 400, 1.5),
            season(1, "Alpha", 2015, 300, 0.5),
            season(2, "Beta", 2019, 600, 3.0),
        ]);

        assert_eq!(careers.len(), 2);
        assert_eq!(careers[0].debut_year, 2015);
        assert_eq!(careers[0].last_year, 2016);
        assert_eq!(careers[0].total_pa, 700);
        assert!((careers[0].career_war - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_select_qualifying_window_threshold_and_mapping() {
        let careers = aggregate_careers(&[
            season(1, "Zed", 2015, 1200, 5.0),
            season(2, "Amy", 2015, 1500, 2.0),
            season(3, "Early", 2012, 3000, 9.0),
            season(4, "Short", 2016, 400, 0.1),
            season(5, "Unmapped", 2017, 2000, 4.0),
            season(6, "Late", 2017, 1100, 1.0),
        ]);
        let mappings = vec![mapping(1, 101), mapping(2, 102), mapping(3, 103), mapping(6, 106)];

        let players = select_qualifying(&careers, &mappings, &collection());
        let names: Vec<&str> = players.iter().map(|p| p.player_name.as_str()).collect();

        assert_eq!(names, vec!["Amy", "Zed", "Late"]);
        assert_eq!(players[0].mlbam_id, 102);

        let limited = select_qualifying(
            &careers,
            &mappings,
            &CollectionConfig {
                max_players: Some(1),
                ..collection()
            },
        );
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn test_leaderboard_falls_back_to_debut_start() {
        let leaderboard = FakeLeaderboard::failing_before(2015, vec![season(1, "Alpha", 2015, 1200, 2.0)]);
        let register = FakeRegister(vec![mapping(1, 101)]);

        let players = find_qualifying_players(&leaderboard, &register, &collection())
            .await
            .unwrap();

        assert_eq!(players.len(), 1);
        assert_eq!(leaderboard.calls(), 2);
    }

    #[tokio::test]
    async fn test_find_nth_pa_date_failures() {
        let statcast = FakeStatcast::default().failing(7);
        let start = NaiveDate::from_ymd_opt(2018, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2018, 12, 31).unwrap();
        let game_types = vec!["R".to_string()];

        let empty = find_nth_pa_date(&statcast, 5, 3, start, end, &game_types).await;
        assert_eq!(empty.error.as_deref(), Some("No data found"));

        let failed = find_nth_pa_date(&statcast, 7, 3, start, end, &game_types).await;
        assert!(!failed.success());
        assert!(failed.error.is_some());
    }

    #[tokio::test]
    async fn test_postseason_pa_completes_the_count() {
        let mut pitches = daily_pitches(101, "2018-09-29", 3);
        pitches[2].game_type = Some("D".to_string());
        let statcast = FakeStatcast::default().with_pitches(101, pitches);
        let start = NaiveDate::from_ymd_opt(2018, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2018, 12, 31).unwrap();

        let result = find_nth_pa_date(
            &statcast,
            101,
            3,
            start,
            end,
            &CollectionConfig::default().game_types,
        )
        .await;

        assert!(result.success());
        assert_eq!(result.date_reached, NaiveDate::from_ymd_opt(2018, 10, 1));
        assert_eq!(result.total_pas_found, 3);
    }

    #[tokio::test]
    async fn test_timeline_pipeline_writes_both_files() {
        let leaderboard = FakeLeaderboard::new(vec![
            season(1, "Alpha", 2018, 1200, 2.0),
            season(2, "Beta", 2018, 1300, 1.0),
        ]);
        let register = FakeRegister(vec![mapping(1, 101), mapping(2, 102)]);
        let statcast = FakeStatcast::default().with_player(101, "2018-04-01", 4);
        let storage = MockStorage::new();

        let pipeline =
            TimelinePipeline::new(leaderboard, register, statcast, storage.clone(), collection());
        EtlEngine::new(pipeline).run().await.unwrap();

        let qualifying: Vec<QualifyingPlayer> =
            from_csv(&storage.get_file(layout::QUALIFYING_PLAYERS).await.unwrap()).unwrap();
        assert_eq!(qualifying.len(), 2);

        let timeline: Vec<TimelineEntry> =
            from_csv(&storage.get_file(layout::PLAYER_TIMELINE).await.unwrap()).unwrap();
        assert_eq!(timeline.len(), 2);

        let alpha = &timeline[0];
        assert!(alpha.success);
        assert_eq!(alpha.player_id, 101);
        assert_eq!(alpha.date_reached, NaiveDate::from_ymd_opt(2018, 4, 3));

        let beta = &timeline[1];
        assert!(!beta.success);
        assert_eq!(beta.error.as_deref(), Some("No data found"));
    }
}
