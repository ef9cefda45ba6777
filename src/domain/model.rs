use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;

/// Statcast 缺值寫法不一：空字串、null、NA、NaN
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| {
        let trimmed = s.trim();
        match trimmed {
            "" | "null" | "NULL" | "NA" | "NaN" | "nan" => None,
            value => value
                .parse::<T>()
                .ok()
                // 整數欄位有時被寫成 5.0
                .or_else(|| value.strip_suffix(".0").and_then(|v| v.parse::<T>().ok())),
        }
    }))
}

/// One Statcast pitch row. Only the columns the pipeline reads are kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pitch {
    pub game_date: NaiveDate,
    #[serde(default, deserialize_with = "lenient")]
    pub game_pk: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub game_type: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub inning: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub at_bat_number: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub pitch_number: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub batter: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub player_name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub events: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub zone: Option<u8>,
    #[serde(default, deserialize_with = "lenient")]
    pub stand: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub bb_type: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub launch_speed: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub launch_angle: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub launch_speed_angle: Option<u8>,
    #[serde(default, deserialize_with = "lenient")]
    pub estimated_woba_using_speedangle: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub woba_value: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub woba_denom: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub hc_x: Option<f64>,
}

impl Pitch {
    pub fn new(game_date: NaiveDate) -> Self {
        Self {
            game_date,
            ..Default::default()
        }
    }

    fn chronological_key(&self) -> (NaiveDate, u64, u32, u32, u32) {
        (
            self.game_date,
            self.game_pk.unwrap_or(0),
            self.inning.unwrap_or(0),
            self.at_bat_number.unwrap_or(0),
            self.pitch_number.unwrap_or(0),
        )
    }
}

/// A plate appearance: the pitches sharing (game_date, game_pk, at_bat_number),
/// each field holding the last non-missing value seen in pitch order.
#[derive(Debug, Clone, PartialEq)]
pub struct PlateAppearance {
    pub game_date: NaiveDate,
    pub game_pk: Option<u64>,
    pub at_bat_number: Option<u32>,
    pub events: Option<String>,
    pub stand: Option<String>,
    pub bb_type: Option<String>,
    pub launch_speed: Option<f64>,
    pub launch_angle: Option<f64>,
    pub launch_speed_angle: Option<u8>,
    pub estimated_woba_using_speedangle: Option<f64>,
    pub woba_value: Option<f64>,
    pub woba_denom: Option<f64>,
    pub hc_x: Option<f64>,
    pub pitch_count: usize,
}

impl PlateAppearance {
    fn start(pitch: &Pitch) -> Self {
        let mut pa = Self {
            game_date: pitch.game_date,
            game_pk: pitch.game_pk,
            at_bat_number: pitch.at_bat_number,
            events: None,
            stand: None,
            bb_type: None,
            launch_speed: None,
            launch_angle: None,
            launch_speed_angle: None,
            estimated_woba_using_speedangle: None,
            woba_value: None,
            woba_denom: None,
            hc_x: None,
            pitch_count: 0,
        };
        pa.absorb(pitch);
        pa
    }

    fn absorb(&mut self, pitch: &Pitch) {
        fn keep_last<T: Clone>(slot: &mut Option<T>, value: &Option<T>) {
            if value.is_some() {
                slot.clone_from(value);
            }
        }

        keep_last(&mut self.events, &pitch.events);
        keep_last(&mut self.stand, &pitch.stand);
        keep_last(&mut self.bb_type, &pitch.bb_type);
        keep_last(&mut self.launch_speed, &pitch.launch_speed);
        keep_last(&mut self.launch_angle, &pitch.launch_angle);
        keep_last(&mut self.launch_speed_angle, &pitch.launch_speed_angle);
        keep_last(
            &mut self.estimated_woba_using_speedangle,
            &pitch.estimated_woba_using_speedangle,
        );
        keep_last(&mut self.woba_value, &pitch.woba_value);
        keep_last(&mut self.woba_denom, &pitch.woba_denom);
        keep_last(&mut self.hc_x, &pitch.hc_x);
        self.pitch_count += 1;
    }

    fn same_group(&self, pitch: &Pitch) -> bool {
        self.game_date == pitch.game_date
            && self.game_pk == pitch.game_pk
            && self.at_bat_number == pitch.at_bat_number
    }
}

/// 依時間排序後合併成打席；回傳的打席按時間先後排列
pub fn plate_appearances(pitches: &[Pitch]) -> Vec<PlateAppearance> {
    let mut ordered: Vec<&Pitch> = pitches.iter().collect();
    ordered.sort_by_key(|p| p.chronological_key());

    let mut pas: Vec<PlateAppearance> = Vec::new();
    for pitch in ordered {
        match pas.last_mut() {
            Some(current) if current.same_group(pitch) => current.absorb(pitch),
            _ => pas.push(PlateAppearance::start(pitch)),
        }
    }
    pas
}

/// One player-season row from the batting leaderboard.
#[derive(Debug, Clone, PartialEq)]
pub struct BattingSeason {
    pub fangraphs_id: u32,
    pub name: String,
    pub season: i32,
    pub plate_appearances: u32,
    pub war: f64,
}

/// Leaderboard seasons aggregated per player.
#[derive(Debug, Clone, PartialEq)]
pub struct CareerSummary {
    pub fangraphs_id: u32,
    pub name: String,
    pub debut_year: i32,
    pub last_year: i32,
    pub total_pa: u32,
    pub career_war: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerIdMapping {
    pub fangraphs_id: u32,
    pub mlbam_id: u32,
    pub name_first: String,
    pub name_last: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualifyingPlayer {
    pub mlbam_id: u32,
    pub fangraphs_id: u32,
    pub player_name: String,
    pub debut_year: i32,
    pub last_year: i32,
    pub total_pa: u32,
    pub career_war: f64,
}

/// When (and whether) a player reached their Nth plate appearance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub player_id: u32,
    pub player_name: String,
    pub fg_id: u32,
    pub debut_year: i32,
    pub last_year: i32,
    pub total_career_pa: u32,
    pub career_war: f64,
    pub n_pa: usize,
    pub debut_date: Option<NaiveDate>,
    pub date_reached: Option<NaiveDate>,
    pub total_pas_found: usize,
    pub success: bool,
    pub error: Option<String>,
}

/// Outcome of the Nth-PA search before player metadata is attached.
#[derive(Debug, Clone, PartialEq)]
pub struct NthPaResult {
    pub player_id: u32,
    pub n_pa: usize,
    pub debut_date: Option<NaiveDate>,
    pub date_reached: Option<NaiveDate>,
    pub total_pas_found: usize,
    pub error: Option<String>,
}

impl NthPaResult {
    pub fn failed(player_id: u32, n_pa: usize, error: impl Into<String>) -> Self {
        Self {
            player_id,
            n_pa,
            debut_date: None,
            date_reached: None,
            total_pas_found: 0,
            error: Some(error.into()),
        }
    }

    pub fn success(&self) -> bool {
        self.error.is_none() && self.date_reached.is_some()
    }

    pub fn into_timeline(self, player: &QualifyingPlayer) -> TimelineEntry {
        let success = self.success();
        TimelineEntry {
            player_id: self.player_id,
            player_name: player.player_name.clone(),
            fg_id: player.fangraphs_id,
            debut_year: player.debut_year,
            last_year: player.last_year,
            total_career_pa: player.total_pa,
            career_war: player.career_war,
            n_pa: self.n_pa,
            debut_date: self.debut_date,
            date_reached: self.date_reached,
            total_pas_found: self.total_pas_found,
            success,
            error: self.error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchLogEntry {
    pub player_id: u32,
    pub player_name: String,
    pub debut_date: Option<NaiveDate>,
    pub date_reached: Option<NaiveDate>,
    pub success: bool,
    pub already_exists: bool,
    pub num_pitches: Option<usize>,
    pub file_size_mb: Option<f64>,
    pub file_path: Option<String>,
    pub error: Option<String>,
}
