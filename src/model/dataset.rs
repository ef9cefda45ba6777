use crate::config::toml_config::CareerTarget;
use crate::domain::model::TimelineEntry;
use crate::utils::error::{PipelineError, Result};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingExample {
    pub player_id: u32,
    pub player_name: String,
    pub features: Vec<f64>,
    pub target: f64,
}

pub fn target_value(entry: &TimelineEntry, target: CareerTarget) -> f64 {
    match target {
        CareerTarget::CareerWar => entry.career_war,
        CareerTarget::CareerPa => entry.total_career_pa as f64,
        CareerTarget::CareerSeasons => (entry.last_year - entry.debut_year + 1) as f64,
    }
}

/// Joins the feature table with the timeline by player id.
pub fn build_training_set(
    feature_table: &[u8],
    timeline: &[TimelineEntry],
    feature_names: &[String],
    target: CareerTarget,
) -> Result<Vec<TrainingExample>> {
    let mut reader = csv::Reader::from_reader(feature_table);
    let headers = reader.headers()?.clone();
    let column = |name: &str| headers.iter().position(|h| h == name);

    let id_column = column("player_id").ok_or_else(|| PipelineError::ProcessingError {
        message: "Feature table has no player_id column".to_string(),
    })?;
    let feature_columns = feature_names
        .iter()
        .map(|name| {
            column(name).ok_or_else(|| PipelineError::DataNotFoundError {
                message: format!("Feature column '{}' missing from feature table", name),
            })
        })
        .collect::<Result<Vec<usize>>>()?;

    let by_player: HashMap<u32, &TimelineEntry> =
        timeline.iter().map(|t| (t.player_id, t)).collect();

    let mut examples = Vec::new();
    let mut skipped = 0;
    for record in reader.records() {
        let record = record?;
        let Some(player_id) = record.get(id_column).and_then(|v| v.parse::<u32>().ok()) else {
            skipped += 1;
            continue;
        };
        let Some(entry) = by_player.get(&player_id) else {
            skipped += 1;
            continue;
        };

        let features: Option<Vec<f64>> = feature_columns
            .iter()
            .map(|&i| {
                record
                    .get(i)
                    .and_then(|v| v.parse::<f64>().ok())
                    .filter(|v| v.is_finite())
            })
            .collect();
        let target_value = target_value(entry, target);

        match features {
            Some(features) if target_value.is_finite() => examples.push(TrainingExample {
                player_id,
                player_name: entry.player_name.clone(),
                features,
                target: target_value,
            }),
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        tracing::warn!("Skipped {} feature rows without a usable target or features", skipped);
    }
    if examples.len() < 2 {
        return Err(PipelineError::InsufficientDataError {
            message: format!("{} usable training rows, need at least 2", examples.len()),
        });
    }
    Ok(examples)
}

fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Position of a player in [0, 1) for a given seed.
pub fn split_position(player_id: u32, seed: u64) -> f64 {
    let mixed = splitmix64(seed ^ splitmix64(player_id as u64));
    (mixed >> 11) as f64 / (1u64 << 53) as f64
}

/// 依球員 ID 決定性地切分；訓練集至少保留兩筆
pub fn split(
    examples: Vec<TrainingExample>,
    test_fraction: f64,
    seed: u64,
) -> (Vec<TrainingExample>, Vec<TrainingExample>) {
    let (mut train, mut test): (Vec<_>, Vec<_>) = examples
        .into_iter()
        .partition(|e| split_position(e.player_id, seed) >= test_fraction);

    while train.len() < 2 {
        match test.pop() {
            Some(example) => train.push(example),
            None => break,
        }
    }
    (train, test)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn entry(player_id: u32, war: f64) -> TimelineEntry {
        TimelineEntry {
            player_id,
            player_name: format!("P{}", player_id),
            fg_id: player_id,
            debut_year: 2016,
            last_year: 2020,
            total_career_pa: 2400,
            career_war: war,
            n_pa: 500,
            debut_date: NaiveDate::from_ymd_opt(2016, 4, 4),
            date_reached: NaiveDate::from_ymd_opt(2017, 5, 1),
            total_pas_found: 2400,
            success: true,
            error: None,
        }
    }

    fn example(player_id: u32) -> TrainingExample {
        TrainingExample {
            player_id,
            player_name: String::new(),
            features: vec![player_id as f64],
            target: 0.0,
        }
    }

    const TABLE: &str = "\
player_id,player_name,AVG,OPS
1,P1,0.250,0.700
2,P2,0.300,0.900
3,P3,NaN,0.800
4,P4,0.270,0.750
";

    #[test]
    fn test_build_training_set_joins_and_skips() {
        let timeline = vec![entry(1, 1.0), entry(2, 8.5), entry(3, 2.0)];
        let names = vec!["OPS".to_string(), "AVG".to_string()];

        let examples =
            build_training_set(TABLE.as_bytes(), &timeline, &names, CareerTarget::CareerWar).unwrap();

        assert_eq!(examples.len(), 2);
        assert_eq!(examples[1].player_id, 2);
        assert_eq!(examples[1].features, vec![0.9, 0.3]);
        assert_eq!(examples[1].target, 8.5);
    }

    #[test]
    fn test_targets() {
        let e = entry(1, 3.5);
        assert_eq!(target_value(&e, CareerTarget::CareerWar), 3.5);
        assert_eq!(target_value(&e, CareerTarget::CareerPa), 2400.0);
        assert_eq!(target_value(&e, CareerTarget::CareerSeasons), 5.0);
    }

    #[test]
    fn test_build_training_set_errors() {
        let timeline = vec![entry(1, 1.0)];
        let all = vec!["AVG".to_string()];
        assert!(matches!(
            build_training_set(TABLE.as_bytes(), &timeline, &all, CareerTarget::CareerWar),
            Err(PipelineError::InsufficientDataError { .. })
        ));

        let unknown = vec!["wRC+".to_string()];
        assert!(matches!(
            build_training_set(TABLE.as_bytes(), &timeline, &unknown, CareerTarget::CareerWar),
            Err(PipelineError::DataNotFoundError { .. })
        ));
    }

    #[test]
    fn test_split_is_deterministic() {
        let ids: Vec<u32> = (1..=200).collect();
        let run = |seed| {
            let (train, test) = split(ids.iter().map(|&i| example(i)).collect(), 0.25, seed);
            (
                train.iter().map(|e| e.player_id).collect::<Vec<_>>(),
                test.iter().map(|e| e.player_id).collect::<Vec<_>>(),
            )
        };

        let (train_a, test_a) = run(42);
        let (train_b, test_b) = run(42);
        assert_eq!(train_a, train_b);
        assert_eq!(test_a, test_b);
        assert_eq!(train_a.len() + test_a.len(), 200);
        assert!(test_a.len() > 20 && test_a.len() < 80);
        assert_ne!(run(7).1, test_a);
    }

    #[test]
    fn test_split_keeps_two_training_rows() {
        let (train, test) = split(vec![example(1), example(2), example(3)], 1.0, 42);
        assert_eq!(train.len(), 2);
        assert_eq!(test.len(), 1);
    }
}
