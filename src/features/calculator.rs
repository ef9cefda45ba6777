//! Early-career batting features from pitch-level Statcast data.
//!
//! Mixes actual outcomes (AVG, OBP, ...) with contact-quality measures
//! (xwOBA, exit velocity, barrels) and plate discipline (swing and contact
//! rates by zone). Every ratio with an empty denominator is 0.

use crate::domain::model::{plate_appearances, Pitch, PlateAppearance};
use serde::Serialize;

pub const FEATURE_NAMES: [&str; 28] = [
    "AVG",
    "OBP",
    "SLG",
    "OPS",
    "ISO",
    "BB%",
    "K%",
    "BABIP",
    "HR/FB",
    "LD%",
    "GB%",
    "FB%",
    "xwOBA",
    "xwRC+",
    "Hard%",
    "EV",
    "maxEV",
    "Barrel%",
    "LA",
    "Sweet Spot%",
    "O-Swing%",
    "Z-Swing%",
    "SwStr%",
    "O-Contact%",
    "Z-Contact%",
    "Pull%",
    "Cent%",
    "Oppo%",
];

const HITS: [&str; 4] = ["single", "double", "triple", "home_run"];
const NON_AT_BAT: [&str; 5] = ["walk", "hit_by_pitch", "sac_fly", "sac_bunt", "catcher_interf"];
const STRIKEOUTS: [&str; 2] = ["strikeout", "strikeout_double_play"];
const SWINGS: [&str; 5] = [
    "foul",
    "hit_into_play",
    "swinging_strike",
    "swinging_strike_blocked",
    "foul_tip",
];
const CONTACT: [&str; 3] = ["foul", "hit_into_play", "foul_tip"];
const WHIFFS: [&str; 2] = ["swinging_strike", "swinging_strike_blocked"];
const FLY_BALLS: [&str; 2] = ["fly_ball", "popup"];

const LEAGUE_WOBA: f64 = 0.320;
const WOBA_SCALE: f64 = 1.25;
const HARD_HIT_MPH: f64 = 95.0;
/// Statcast launch_speed_angle category for a barrel
const BARREL_CATEGORY: u8 = 6;
/// hc_x of straightaway center
const CENTER_HC_X: f64 = 125.0;

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| sum / count as f64)
}

fn is_in_zone(zone: Option<u8>) -> bool {
    matches!(zone, Some(1..=9))
}

fn is_out_of_zone(zone: Option<u8>) -> bool {
    matches!(zone, Some(11..=14))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BattingFeatures {
    pub avg: f64,
    pub obp: f64,
    pub slg: f64,
    pub ops: f64,
    pub iso: f64,
    pub bb_rate: f64,
    pub k_rate: f64,
    pub babip: f64,
    pub hr_fb: f64,
    pub ld_rate: f64,
    pub gb_rate: f64,
    pub fb_rate: f64,
    pub xwoba: f64,
    pub xwrc_plus: f64,
    pub hard_hit_rate: f64,
    pub avg_exit_velo: f64,
    pub max_exit_velo: f64,
    pub barrel_rate: f64,
    pub avg_launch_angle: f64,
    pub sweet_spot_rate: f64,
    pub o_swing_rate: f64,
    pub z_swing_rate: f64,
    pub swinging_strike_rate: f64,
    pub o_contact_rate: f64,
    pub z_contact_rate: f64,
    pub pull_rate: f64,
    pub center_rate: f64,
    pub oppo_rate: f64,
}

impl BattingFeatures {
    /// Values in [`FEATURE_NAMES`] order.
    pub fn values(&self) -> [f64; 28] {
        [
            self.avg,
            self.obp,
            self.slg,
            self.ops,
            self.iso,
            self.bb_rate,
            self.k_rate,
            self.babip,
            self.hr_fb,
            self.ld_rate,
            self.gb_rate,
            self.fb_rate,
            self.xwoba,
            self.xwrc_plus,
            self.hard_hit_rate,
            self.avg_exit_velo,
            self.max_exit_velo,
            self.barrel_rate,
            self.avg_launch_angle,
            self.sweet_spot_rate,
            self.o_swing_rate,
            self.z_swing_rate,
            self.swinging_strike_rate,
            self.o_contact_rate,
            self.z_contact_rate,
            self.pull_rate,
            self.center_rate,
            self.oppo_rate,
        ]
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_NAMES
            .iter()
            .position(|f| *f == name)
            .map(|i| self.values()[i])
    }
}

pub struct StatcastFeatureCalculator<'a> {
    pitches: &'a [Pitch],
    pas: Vec<PlateAppearance>,
    barrel_categories: bool,
}

impl<'a> StatcastFeatureCalculator<'a> {
    pub fn new(pitches: &'a [Pitch]) -> Self {
        Self {
            pitches,
            pas: plate_appearances(pitches),
            barrel_categories: true,
        }
    }

    /// For pitch data exported without the `launch_speed_angle` column;
    /// barrels then fall back to exit velocity and launch angle.
    pub fn without_barrel_categories(mut self) -> Self {
        self.barrel_categories = false;
        self
    }

    pub fn total_pitches(&self) -> usize {
        self.pitches.len()
    }

    pub fn total_pas(&self) -> usize {
        self.pas.len()
    }

    pub fn calculate_all_features(&self) -> BattingFeatures {
        let obp = self.obp();
        let slg = self.slg();
        let avg = self.avg();
        let xwoba = self.xwoba();

        BattingFeatures {
            avg,
            obp,
            slg,
            ops: obp + slg,
            iso: slg - avg,
            bb_rate: self.bb_rate(),
            k_rate: self.k_rate(),
            babip: self.babip(),
            hr_fb: self.hr_fb(),
            ld_rate: self.batted_ball_share(|bb| bb == "line_drive"),
            gb_rate: self.batted_ball_share(|bb| bb == "ground_ball"),
            fb_rate: self.batted_ball_share(|bb| FLY_BALLS.contains(&bb)),
            xwoba,
            xwrc_plus: Self::xwrc_plus(xwoba),
            hard_hit_rate: self.hard_hit_rate(),
            avg_exit_velo: mean(self.batted_balls().filter_map(|pa| pa.launch_speed))
                .unwrap_or(0.0),
            max_exit_velo: self.max_exit_velo(),
            barrel_rate: self.barrel_rate(),
            avg_launch_angle: mean(self.batted_balls().filter_map(|pa| pa.launch_angle))
                .unwrap_or(0.0),
            sweet_spot_rate: self.sweet_spot_rate(),
            o_swing_rate: self.swing_rate(is_out_of_zone),
            z_swing_rate: self.swing_rate(is_in_zone),
            swinging_strike_rate: self.swinging_strike_rate(),
            o_contact_rate: self.contact_rate(is_out_of_zone),
            z_contact_rate: self.contact_rate(is_in_zone),
            pull_rate: self.pull_rate(),
            center_rate: self.center_rate(),
            oppo_rate: self.oppo_rate(),
        }
    }

    // ==================== plate appearance outcomes ====================

    fn events(&self) -> impl Iterator<Item = &str> + '_ {
        self.pas.iter().filter_map(|pa| pa.events.as_deref())
    }

    fn count_events(&self, set: &[&str]) -> usize {
        self.events().filter(|e| set.contains(e)).count()
    }

    fn event_total(&self) -> usize {
        self.events().count()
    }

    fn at_bats(&self) -> usize {
        self.events().filter(|e| !NON_AT_BAT.contains(e)).count()
    }

    fn avg(&self) -> f64 {
        ratio(self.count_events(&HITS), self.at_bats())
    }

    fn obp(&self) -> f64 {
        let on_base = self.count_events(&HITS)
            + self.count_events(&["walk"])
            + self.count_events(&["hit_by_pitch"]);
        ratio(on_base, self.event_total())
    }

    fn slg(&self) -> f64 {
        let total_bases: usize = self
            .events()
            .map(|e| match e {
                "single" => 1,
                "double" => 2,
                "triple" => 3,
                "home_run" => 4,
                _ => 0,
            })
            .sum();
        ratio(total_bases, self.at_bats())
    }

    fn bb_rate(&self) -> f64 {
        ratio(self.count_events(&["walk"]), self.event_total())
    }

    fn k_rate(&self) -> f64 {
        ratio(self.count_events(&STRIKEOUTS), self.event_total())
    }

    fn babip(&self) -> f64 {
        let hits = self.count_events(&["single", "double", "triple"]);
        let balls_in_play = self
            .events()
            .filter(|e| !NON_AT_BAT.contains(e) && !STRIKEOUTS.contains(e) && *e != "home_run")
            .count();
        ratio(hits, balls_in_play)
    }

    // ==================== batted balls ====================

    fn batted_balls(&self) -> impl Iterator<Item = &PlateAppearance> + '_ {
        self.pas.iter().filter(|pa| pa.launch_speed.is_some())
    }

    fn batted_ball_count(&self) -> usize {
        self.batted_balls().count()
    }

    fn batted_ball_share(&self, predicate: impl Fn(&str) -> bool) -> f64 {
        let matching = self
            .batted_balls()
            .filter(|pa| pa.bb_type.as_deref().map(&predicate).unwrap_or(false))
            .count();
        ratio(matching, self.batted_ball_count())
    }

    fn hr_fb(&self) -> f64 {
        let fly_balls = self
            .batted_balls()
            .filter(|pa| {
                pa.bb_type
                    .as_deref()
                    .map(|bb| FLY_BALLS.contains(&bb))
                    .unwrap_or(false)
            })
            .count();
        ratio(self.count_events(&["home_run"]), fly_balls)
    }

    /// wRC+ 公式，以 xwOBA 代入；100 為聯盟平均
    fn xwrc_plus(xwoba: f64) -> f64 {
        if xwoba == 0.0 {
            return 100.0;
        }
        let xwrc_plus = ((xwoba - LEAGUE_WOBA) / WOBA_SCALE) / LEAGUE_WOBA * 100.0 + 100.0;
        xwrc_plus.max(0.0)
    }

    fn xwoba(&self) -> f64 {
        if let Some(expected) =
            mean(self.pas.iter().filter_map(|pa| pa.estimated_woba_using_speedangle))
        {
            return expected;
        }

        let value: f64 = self.pas.iter().filter_map(|pa| pa.woba_value).sum();
        let denom: f64 = self.pas.iter().filter_map(|pa| pa.woba_denom).sum();
        if denom > 0.0 {
            value / denom
        } else {
            0.0
        }
    }

    fn hard_hit_rate(&self) -> f64 {
        let hard = self
            .batted_balls()
            .filter(|pa| pa.launch_speed.map(|s| s >= HARD_HIT_MPH).unwrap_or(false))
            .count();
        ratio(hard, self.batted_ball_count())
    }

    fn max_exit_velo(&self) -> f64 {
        self.batted_balls()
            .filter_map(|pa| pa.launch_speed)
            .fold(None, |max: Option<f64>, s| Some(max.map_or(s, |m| m.max(s))))
            .unwrap_or(0.0)
    }

    /// Barrels per plate appearance.
    fn barrel_rate(&self) -> f64 {
        let barrels = if self.barrel_categories {
            self.batted_balls()
                .filter(|pa| pa.launch_speed_angle == Some(BARREL_CATEGORY))
                .count()
        } else {
            // 簡化定義：98+ mph 且 26–30 度
            self.batted_balls()
                .filter(|pa| match (pa.launch_speed, pa.launch_angle) {
                    (Some(speed), Some(angle)) => {
                        speed >= 98.0 && (26.0..=30.0).contains(&angle)
                    }
                    _ => false,
                })
                .count()
        };

        ratio(barrels, self.pas.len())
    }

    fn sweet_spot_rate(&self) -> f64 {
        let sweet = self
            .batted_balls()
            .filter(|pa| {
                pa.launch_angle
                    .map(|a| (8.0..=32.0).contains(&a))
                    .unwrap_or(false)
            })
            .count();
        ratio(sweet, self.batted_ball_count())
    }

    // ==================== plate discipline (per pitch) ====================

    fn description_in(pitch: &Pitch, set: &[&str]) -> bool {
        pitch
            .description
            .as_deref()
            .map(|d| set.contains(&d))
            .unwrap_or(false)
    }

    fn swing_rate(&self, zone_filter: fn(Option<u8>) -> bool) -> f64 {
        let in_region: Vec<&Pitch> = self
            .pitches
            .iter()
            .filter(|p| zone_filter(p.zone))
            .collect();
        let swings = in_region
            .iter()
            .filter(|p| Self::description_in(p, &SWINGS))
            .count();
        ratio(swings, in_region.len())
    }

    fn contact_rate(&self, zone_filter: fn(Option<u8>) -> bool) -> f64 {
        let swings: Vec<&Pitch> = self
            .pitches
            .iter()
            .filter(|p| zone_filter(p.zone) && Self::description_in(p, &SWINGS))
            .collect();
        let contact = swings
            .iter()
            .filter(|p| Self::description_in(p, &CONTACT))
            .count();
        ratio(contact, swings.len())
    }

    fn swinging_strike_rate(&self) -> f64 {
        let whiffs = self
            .pitches
            .iter()
            .filter(|p| Self::description_in(p, &WHIFFS))
            .count();
        ratio(whiffs, self.pitches.len())
    }

    // ==================== spray direction ====================

    fn spray_share(&self, pulled: bool) -> f64 {
        let matching = self
            .batted_balls()
            .filter(|pa| match (pa.stand.as_deref(), pa.hc_x) {
                (Some("R"), Some(x)) => (x < CENTER_HC_X) == pulled && x != CENTER_HC_X,
                (Some("L"), Some(x)) => (x > CENTER_HC_X) == pulled && x != CENTER_HC_X,
                _ => false,
            })
            .count();
        ratio(matching, self.batted_ball_count())
    }

    fn pull_rate(&self) -> f64 {
        self.spray_share(true)
    }

    fn oppo_rate(&self) -> f64 {
        self.spray_share(false)
    }

    fn center_rate(&self) -> f64 {
        let center = self
            .batted_balls()
            .filter(|pa| {
                pa.hc_x
                    .map(|x| (100.0..=150.0).contains(&x))
                    .unwrap_or(false)
            })
            .count();
        ratio(center, self.batted_ball_count())
    }
}
