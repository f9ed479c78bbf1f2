//! Player Game Log Index
//!
//! Provides O(1) lookup of a player's season game log, most recent game first.

use chrono::NaiveDate;
use polars::prelude::*;
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

use crate::data::GameLogSource;
use crate::models::{GameRecord, Location};

/// Game logs indexed by lower-cased player name
#[derive(Debug, Default)]
pub struct GameLogIndex {
    /// player key -> (display name, games sorted by date descending)
    players: HashMap<String, (String, Vec<GameRecord>)>,
}

fn player_key(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Parse minutes given either as "MM:SS" or as a plain number
pub fn parse_minutes(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    match s.split_once(':') {
        Some((mins, secs)) => {
            let mins = mins.trim().parse::<f64>().ok()?;
            let secs = secs.trim().parse::<f64>().ok()?;
            Some(mins + secs / 60.0)
        }
        None => s.parse::<f64>().ok(),
    }
}

/// Parse "2025-11-02" or the box-score style "NOV 02, 2025"
pub fn parse_game_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%b %d, %Y"))
        .ok()
}

/// "LAL @ BOS" is an away game, "LAL vs. BOS" a home game
pub fn location_from_matchup(matchup: &str) -> Location {
    if matchup.contains('@') {
        Location::Away
    } else {
        Location::Home
    }
}

/// Box-score columns, in `GameRecord` field order
const STAT_COLUMNS: [&str; 12] = [
    "pts", "reb", "ast", "fga", "fgm", "fg3a", "fg3m", "fta", "ftm", "stl", "blk", "tov",
];

fn int_column(df: &DataFrame, name: &str) -> Result<Int64Chunked, PolarsError> {
    Ok(df.column(name)?.cast(&DataType::Int64)?.i64()?.clone())
}

fn str_column(df: &DataFrame, name: &str) -> Result<StringChunked, PolarsError> {
    Ok(df.column(name)?.cast(&DataType::String)?.str()?.clone())
}

impl GameLogIndex {
    /// Build from (player, game) pairs in any order
    pub fn from_records<I, S>(records: I) -> Self
    where
        I: IntoIterator<Item = (S, GameRecord)>,
        S: AsRef<str>,
    {
        let mut players: HashMap<String, (String, Vec<GameRecord>)> = HashMap::new();
        for (name, game) in records {
            let name = name.as_ref().trim();
            players
                .entry(player_key(name))
                .or_insert_with(|| (name.to_string(), Vec::new()))
                .1
                .push(game);
        }

        // Sort each player's games by date descending (most recent first)
        for (_, games) in players.values_mut() {
            games.sort_by(|a, b| b.game_date.cmp(&a.game_date));
        }

        Self { players }
    }

    /// Load and index all game logs from CSV
    ///
    /// Expected columns: player, game_date, matchup, min, pts, reb, ast,
    /// fga, fgm, fg3a, fg3m, fta, ftm, stl, blk, tov. Rows with an
    /// unparseable date or minutes value, or a blank stat cell, are skipped.
    pub fn load<P: AsRef<Path>>(csv_path: P) -> Result<Self, PolarsError> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(csv_path.as_ref().to_path_buf()))?
            .finish()?;

        let player_col = str_column(&df, "player")?;
        let date_col = str_column(&df, "game_date")?;
        let matchup_col = str_column(&df, "matchup")?;
        let min_col = str_column(&df, "min")?;
        let stat_cols = STAT_COLUMNS
            .iter()
            .map(|name| int_column(&df, name))
            .collect::<Result<Vec<_>, _>>()?;

        let mut records = Vec::with_capacity(df.height());
        let mut skipped = 0usize;

        for i in 0..df.height() {
            let (Some(player), Some(date_raw)) = (player_col.get(i), date_col.get(i)) else {
                skipped += 1;
                continue;
            };
            let Some(game_date) = parse_game_date(date_raw) else {
                skipped += 1;
                continue;
            };
            let Some(minutes) = min_col.get(i).and_then(parse_minutes) else {
                skipped += 1;
                continue;
            };
            // A blank stat cell is missing data, not a zero
            let Some(stats) = stat_cols
                .iter()
                .map(|col| col.get(i).map(|v| v.max(0) as u32))
                .collect::<Option<Vec<u32>>>()
            else {
                skipped += 1;
                continue;
            };
            let [points, rebounds, assists, fga, fgm, fg3a, fg3m, fta, ftm, steals, blocks, turnovers] =
                stats[..]
            else {
                skipped += 1;
                continue;
            };

            let matchup = matchup_col.get(i).unwrap_or("").to_string();
            let game = GameRecord {
                game_date,
                location: location_from_matchup(&matchup),
                matchup,
                minutes,
                points,
                rebounds,
                assists,
                fga,
                fgm,
                fg3a,
                fg3m,
                fta,
                ftm,
                steals,
                blocks,
                turnovers,
            };
            records.push((player.to_string(), game));
        }

        if skipped > 0 {
            warn!("Skipped {} game log rows with missing or invalid fields", skipped);
        }

        let index = Self::from_records(records);
        info!(
            "Indexed game logs for {} players from {:?}",
            index.len(),
            csv_path.as_ref()
        );
        Ok(index)
    }

    /// Display names of all indexed players, sorted
    pub fn players(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.players.values().map(|(n, _)| n.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Players whose name contains `fragment` (case-insensitive), at most `limit`
    pub fn search(&self, fragment: &str, limit: usize) -> Vec<&str> {
        let needle = fragment.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.players()
            .into_iter()
            .filter(|n| n.to_lowercase().contains(&needle))
            .take(limit)
            .collect()
    }

    /// Number of unique players in the index
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

impl GameLogSource for GameLogIndex {
    fn player_games(&self, player: &str) -> Option<Vec<GameRecord>> {
        self.players
            .get(&player_key(player))
            .map(|(_, games)| games.clone())
    }

    fn player_count(&self) -> usize {
        self.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::game;
    use std::fs;

    #[test]
    fn test_from_records_sorts_most_recent_first() {
        let index = GameLogIndex::from_records(vec![
            ("LeBron James", game(3, 25, 7, 8)),
            ("LeBron James", game(10, 31, 9, 6)),
            ("LeBron James", game(6, 18, 5, 11)),
            ("Jayson Tatum", game(4, 29, 8, 4)),
        ]);

        assert_eq!(index.len(), 2);
        let games = index.player_games("LeBron James").unwrap();
        let points: Vec<u32> = games.iter().map(|g| g.points).collect();
        assert_eq!(points, vec![31, 18, 25]);
    }

    #[test]
    fn test_lookup_is_case_and_space_insensitive() {
        let index = GameLogIndex::from_records(vec![("LeBron James", game(1, 25, 7, 8))]);
        assert!(index.player_games("lebron  JAMES ").is_some());
        assert!(index.player_games("LeBron").is_none());
        assert_eq!(index.players(), vec!["LeBron James"]);
    }

    #[test]
    fn test_search() {
        let index = GameLogIndex::from_records(vec![
            ("LeBron James", game(1, 25, 7, 8)),
            ("Bronny James", game(1, 4, 1, 1)),
            ("Jayson Tatum", game(1, 29, 8, 4)),
        ]);
        assert_eq!(index.search("james", 10), vec!["Bronny James", "LeBron James"]);
        assert_eq!(index.search("james", 1).len(), 1);
        assert!(index.search(" ", 10).is_empty());
    }

    #[test]
    fn test_parse_minutes() {
        assert_eq!(parse_minutes("34"), Some(34.0));
        assert_eq!(parse_minutes("34:30"), Some(34.5));
        assert_eq!(parse_minutes("36.5"), Some(36.5));
        assert_eq!(parse_minutes(""), None);
        assert_eq!(parse_minutes("DNP"), None);
    }

    #[test]
    fn test_parse_game_date() {
        let expected = NaiveDate::from_ymd_opt(2025, 11, 2);
        assert_eq!(parse_game_date("2025-11-02"), expected);
        assert_eq!(parse_game_date("Nov 02, 2025"), expected);
        assert_eq!(parse_game_date("yesterday"), None);
    }

    #[test]
    fn test_location_from_matchup() {
        assert_eq!(location_from_matchup("LAL @ BOS"), Location::Away);
        assert_eq!(location_from_matchup("LAL vs. BOS"), Location::Home);
    }

    #[test]
    fn test_load_csv() {
        let path = std::env::temp_dir().join(format!("propbet_games_{}.csv", std::process::id()));
        fs::write(
            &path,
            "player,game_date,matchup,min,pts,reb,ast,fga,fgm,fg3a,fg3m,fta,ftm,stl,blk,tov\n\
             LeBron James,2025-11-01,LAL vs. BOS,35:30,28,8,9,20,11,6,2,5,4,1,1,3\n\
             LeBron James,2025-11-03,LAL @ MIA,33:00,22,10,7,18,9,5,1,3,3,2,0,4\n\
             LeBron James,not-a-date,LAL @ MIA,33:00,22,10,7,18,9,5,1,3,3,2,0,4\n\
             Jayson Tatum,2025-11-02,BOS @ LAL,38:12,31,9,5,24,12,10,4,4,3,1,1,2\n",
        )
        .unwrap();

        let index = GameLogIndex::load(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(index.len(), 2);
        let games = index.player_games("LeBron James").unwrap();
        assert_eq!(games.len(), 2);
        assert_eq!(games[0].points, 22);
        assert_eq!(games[0].location, Location::Away);
        assert!((games[1].minutes - 35.5).abs() < 1e-9);
        assert_eq!(games[1].location, Location::Home);
    }

    #[test]
    fn test_load_csv_skips_blank_stat_cell() {
        let path =
            std::env::temp_dir().join(format!("propbet_games_blank_{}.csv", std::process::id()));
        fs::write(
            &path,
            "player,game_date,matchup,min,pts,reb,ast,fga,fgm,fg3a,fg3m,fta,ftm,stl,blk,tov\n\
             LeBron James,2025-11-01,LAL vs. BOS,35:30,30,8,9,20,11,6,2,5,4,1,1,3\n\
             LeBron James,2025-11-03,LAL @ MIA,33:00,,10,7,18,9,5,1,3,3,2,0,4\n",
        )
        .unwrap();

        let index = GameLogIndex::load(&path).unwrap();
        fs::remove_file(&path).ok();

        let games = index.player_games("LeBron James").unwrap();
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].points, 30);
    }
}
