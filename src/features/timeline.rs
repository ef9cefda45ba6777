use crate::domain::model::{plate_appearances, NthPaResult, Pitch};
use chrono::Datelike;

/// Keeps pitches whose game type is listed. When no pitch carries a game
/// type at all, drops spring-training dates (before March 20) instead.
pub fn filter_game_types(pitches: Vec<Pitch>, game_types: &[String]) -> Vec<Pitch> {
    let has_game_type = pitches.iter().any(|p| p.game_type.is_some());

    if has_game_type {
        pitches
            .into_iter()
            .filter(|p| {
                p.game_type
                    .as_deref()
                    .map(|gt| game_types.iter().any(|allowed| allowed == gt))
                    .unwrap_or(false)
            })
            .collect()
    } else {
        tracing::warn!("'game_type' missing from Statcast rows, filtering by date");
        pitches
            .into_iter()
            .filter(|p| {
                let month = p.game_date.month();
                !(month < 3 || (month == 3 && p.game_date.day() < 20))
            })
            .collect()
    }
}

/// Date on which the player reached their `n_pa`-th plate appearance.
pub fn find_nth_pa(player_id: u32, pitches: &[Pitch], n_pa: usize) -> NthPaResult {
    let pas = plate_appearances(pitches);

    let Some(first) = pas.first() else {
        return NthPaResult::failed(player_id, n_pa, "No regular season data found");
    };
    let debut_date = first.game_date;
    let total_pas = pas.len();

    if n_pa == 0 || total_pas < n_pa {
        return NthPaResult {
            debut_date: Some(debut_date),
            total_pas_found: total_pas,
            ..NthPaResult::failed(
                player_id,
                n_pa,
                format!("Only reached {} PAs in regular season", total_pas),
            )
        };
    }

    NthPaResult {
        player_id,
        n_pa,
        debut_date: Some(debut_date),
        date_reached: Some(pas[n_pa - 1].game_date),
        total_pas_found: total_pas,
        error: None,
    }
}
