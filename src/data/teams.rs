//! Team Directory
//!
//! Resolves free-form opponent strings ("BOS", "Boston Celtics", "celtics")
//! to a team and serves the team's defensive aggregates.

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

use crate::config::{ModelConfig, LEAGUE_DEF_RATING, LEAGUE_PACE, LEAGUE_PTS_ALLOWED};
use crate::data::DefenseSource;
use crate::models::OpponentDefenseProfile;

/// Resolved team identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamIdentity {
    pub team_id: u32,
    pub abbreviation: String,
    pub full_name: String,
}

/// One row of the team table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamRecord {
    pub team_id: u32,
    pub abbreviation: String,
    pub full_name: String,
    pub nickname: String,
    pub city: String,
    pub def_rating: Option<f64>,
    pub pace: Option<f64>,
    pub opp_pts: Option<f64>,
}

impl TeamRecord {
    pub fn new(team_id: u32, abbreviation: &str, full_name: &str, nickname: &str, city: &str) -> Self {
        Self {
            team_id,
            abbreviation: abbreviation.to_uppercase(),
            full_name: full_name.to_string(),
            nickname: nickname.to_string(),
            city: city.to_string(),
            def_rating: None,
            pace: None,
            opp_pts: None,
        }
    }

    pub fn with_defense(mut self, def_rating: f64, pace: f64, opp_pts: Option<f64>) -> Self {
        self.def_rating = Some(def_rating);
        self.pace = Some(pace);
        self.opp_pts = opp_pts;
        self
    }

    pub fn identity(&self) -> TeamIdentity {
        TeamIdentity {
            team_id: self.team_id,
            abbreviation: self.abbreviation.clone(),
            full_name: self.full_name.clone(),
        }
    }

    pub fn has_defense(&self) -> bool {
        self.def_rating.is_some() || self.pace.is_some() || self.opp_pts.is_some()
    }

    /// Match score against lower-cased input, higher is better, 0 is no match
    fn match_score(&self, raw_lower: &str) -> u32 {
        let full = self.full_name.to_lowercase();
        let nick = self.nickname.to_lowercase();
        let city = self.city.to_lowercase();

        if full == raw_lower {
            100
        } else if self.abbreviation.to_lowercase() == raw_lower {
            95
        } else if nick == raw_lower {
            90
        } else if full.contains(raw_lower) {
            80
        } else if nick.contains(raw_lower) {
            70
        } else if city.contains(raw_lower) {
            60
        } else {
            0
        }
    }
}

/// League-average constants used when opponent numbers are unavailable
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LeagueAverages {
    pub def_rating: f64,
    pub pace: f64,
    pub pts_allowed: f64,
}

impl Default for LeagueAverages {
    fn default() -> Self {
        Self {
            def_rating: LEAGUE_DEF_RATING,
            pace: LEAGUE_PACE,
            pts_allowed: LEAGUE_PTS_ALLOWED,
        }
    }
}

impl LeagueAverages {
    pub fn from_config(config: &ModelConfig) -> Self {
        Self {
            def_rating: config.league_def_rating,
            pace: config.league_pace,
            pts_allowed: config.league_pts_allowed,
        }
    }

    /// League-average profile, labelled with the resolved team when known
    /// and the upper-cased input otherwise
    pub fn fallback_profile(&self, input: &str, resolved: Option<TeamIdentity>) -> OpponentDefenseProfile {
        let (team_id, abbreviation, full_name) = match resolved {
            Some(t) => (Some(t.team_id), t.abbreviation, t.full_name),
            None => (None, input.trim().to_uppercase(), String::new()),
        };

        OpponentDefenseProfile {
            team_id,
            abbreviation,
            full_name,
            def_rating: self.def_rating,
            pace: self.pace,
            pts_allowed: self.pts_allowed,
            is_fallback: true,
        }
    }
}

/// Defensive profile for `team`, substituting league averages on any lookup failure
///
/// A fallback is never an error, but it is logged so callers can show that
/// default opponent strength was used.
pub fn opponent_profile<D: DefenseSource + ?Sized>(
    source: &D,
    team: &str,
    league: &LeagueAverages,
) -> OpponentDefenseProfile {
    if let Some(profile) = source.defense_profile(team) {
        return profile;
    }

    let resolved = source.resolve_team(team);
    match &resolved {
        Some(t) => warn!(
            "No defensive numbers for {} ({}), using league averages",
            t.abbreviation, t.full_name
        ),
        None => warn!("Could not resolve opponent {:?}, using league averages", team),
    }
    league.fallback_profile(team, resolved)
}

/// In-memory team table
#[derive(Debug, Clone)]
pub struct TeamDirectory {
    teams: Vec<TeamRecord>,
    league: LeagueAverages,
}

const NBA_TEAMS: [(u32, &str, &str, &str, &str); 30] = [
    (1610612737, "ATL", "Atlanta Hawks", "Hawks", "Atlanta"),
    (1610612738, "BOS", "Boston Celtics", "Celtics", "Boston"),
    (1610612739, "CLE", "Cleveland Cavaliers", "Cavaliers", "Cleveland"),
    (1610612740, "NOP", "New Orleans Pelicans", "Pelicans", "New Orleans"),
    (1610612741, "CHI", "Chicago Bulls", "Bulls", "Chicago"),
    (1610612742, "DAL", "Dallas Mavericks", "Mavericks", "Dallas"),
    (1610612743, "DEN", "Denver Nuggets", "Nuggets", "Denver"),
    (1610612744, "GSW", "Golden State Warriors", "Warriors", "Golden State"),
    (1610612745, "HOU", "Houston Rockets", "Rockets", "Houston"),
    (1610612746, "LAC", "Los Angeles Clippers", "Clippers", "Los Angeles"),
    (1610612747, "LAL", "Los Angeles Lakers", "Lakers", "Los Angeles"),
    (1610612748, "MIA", "Miami Heat", "Heat", "Miami"),
    (1610612749, "MIL", "Milwaukee Bucks", "Bucks", "Milwaukee"),
    (1610612750, "MIN", "Minnesota Timberwolves", "Timberwolves", "Minnesota"),
    (1610612751, "BKN", "Brooklyn Nets", "Nets", "Brooklyn"),
    (1610612752, "NYK", "New York Knicks", "Knicks", "New York"),
    (1610612753, "ORL", "Orlando Magic", "Magic", "Orlando"),
    (1610612754, "IND", "Indiana Pacers", "Pacers", "Indiana"),
    (1610612755, "PHI", "Philadelphia 76ers", "76ers", "Philadelphia"),
    (1610612756, "PHX", "Phoenix Suns", "Suns", "Phoenix"),
    (1610612757, "POR", "Portland Trail Blazers", "Trail Blazers", "Portland"),
    (1610612758, "SAC", "Sacramento Kings", "Kings", "Sacramento"),
    (1610612759, "SAS", "San Antonio Spurs", "Spurs", "San Antonio"),
    (1610612760, "OKC", "Oklahoma City Thunder", "Thunder", "Oklahoma City"),
    (1610612761, "TOR", "Toronto Raptors", "Raptors", "Toronto"),
    (1610612762, "UTA", "Utah Jazz", "Jazz", "Utah"),
    (1610612763, "MEM", "Memphis Grizzlies", "Grizzlies", "Memphis"),
    (1610612764, "WAS", "Washington Wizards", "Wizards", "Washington"),
    (1610612765, "DET", "Detroit Pistons", "Pistons", "Detroit"),
    (1610612766, "CHA", "Charlotte Hornets", "Hornets", "Charlotte"),
];

fn opt_f64_column(df: &DataFrame, name: &str) -> Result<Option<Float64Chunked>, PolarsError> {
    match df.column(name) {
        Ok(col) => Ok(Some(col.cast(&DataType::Float64)?.f64()?.clone())),
        Err(_) => Ok(None),
    }
}

fn str_column(df: &DataFrame, name: &str) -> Result<StringChunked, PolarsError> {
    Ok(df.column(name)?.cast(&DataType::String)?.str()?.clone())
}

impl TeamDirectory {
    pub fn from_records(teams: Vec<TeamRecord>) -> Self {
        Self {
            teams,
            league: LeagueAverages::default(),
        }
    }

    /// The 30 NBA franchises without defensive numbers
    pub fn nba_teams() -> Self {
        Self::from_records(
            NBA_TEAMS
                .iter()
                .map(|&(id, abbr, full, nick, city)| TeamRecord::new(id, abbr, full, nick, city))
                .collect(),
        )
    }

    /// League averages used to fill missing per-team fields
    pub fn with_league_averages(mut self, league: LeagueAverages) -> Self {
        self.league = league;
        self
    }

    /// Load team rows from CSV
    ///
    /// Expected columns: team_id, abbreviation, full_name, nickname, city,
    /// def_rating, pace, opp_pts. The three numeric columns may be empty
    /// and opp_pts may be missing entirely.
    pub fn load<P: AsRef<Path>>(csv_path: P) -> Result<Self, PolarsError> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(csv_path.as_ref().to_path_buf()))?
            .finish()?;

        let id_col = df.column("team_id")?.cast(&DataType::Int64)?.i64()?.clone();
        let abbr_col = str_column(&df, "abbreviation")?;
        let full_col = str_column(&df, "full_name")?;
        let nick_col = str_column(&df, "nickname")?;
        let city_col = str_column(&df, "city")?;
        let def_col = opt_f64_column(&df, "def_rating")?;
        let pace_col = opt_f64_column(&df, "pace")?;
        let pts_col = opt_f64_column(&df, "opp_pts")?;

        let get = |col: &Option<Float64Chunked>, i: usize| {
            col.as_ref().and_then(|c| c.get(i)).filter(|v| v.is_finite())
        };

        let mut teams = Vec::with_capacity(df.height());
        for i in 0..df.height() {
            let (Some(team_id), Some(abbr)) = (id_col.get(i), abbr_col.get(i)) else {
                warn!("Skipping team row {} with missing id or abbreviation", i);
                continue;
            };
            let mut record = TeamRecord::new(
                team_id.max(0) as u32,
                abbr.trim(),
                full_col.get(i).unwrap_or(""),
                nick_col.get(i).unwrap_or(""),
                city_col.get(i).unwrap_or(""),
            );
            record.def_rating = get(&def_col, i);
            record.pace = get(&pace_col, i);
            record.opp_pts = get(&pts_col, i);
            teams.push(record);
        }

        info!("Loaded {} teams from {:?}", teams.len(), csv_path.as_ref());
        Ok(Self::from_records(teams))
    }

    pub fn teams(&self) -> &[TeamRecord] {
        &self.teams
    }

    /// Resolve free-form input to a team row
    ///
    /// Exact 3-letter abbreviation first, then the best positive match score
    /// across all teams. Ties keep the earlier row.
    pub fn resolve(&self, input: &str) -> Option<&TeamRecord> {
        let raw = input.trim();
        if raw.is_empty() {
            return None;
        }

        if raw.chars().count() == 3 {
            let abbr = raw.to_uppercase();
            if let Some(team) = self.teams.iter().find(|t| t.abbreviation == abbr) {
                return Some(team);
            }
        }

        let raw_lower = raw.to_lowercase();
        let mut best: Option<(&TeamRecord, u32)> = None;
        for team in &self.teams {
            let score = team.match_score(&raw_lower);
            if score > best.map_or(0, |(_, s)| s) {
                best = Some((team, score));
            }
        }
        best.map(|(team, _)| team)
    }

    fn profile_for(&self, team: &TeamRecord) -> Option<OpponentDefenseProfile> {
        if !team.has_defense() {
            return None;
        }

        let mut filled = Vec::new();
        let def_rating = team.def_rating.unwrap_or_else(|| {
            filled.push("def_rating");
            self.league.def_rating
        });
        let pace = team.pace.unwrap_or_else(|| {
            filled.push("pace");
            self.league.pace
        });
        let pts_allowed = match (team.opp_pts, team.def_rating, team.pace) {
            (Some(pts), _, _) => pts,
            (None, Some(def), Some(pace)) => def * pace / 100.0,
            _ => {
                filled.push("pts_allowed");
                self.league.pts_allowed
            }
        };

        if !filled.is_empty() {
            warn!(
                "{} has no {}; using league averages for those fields",
                team.abbreviation,
                filled.join(", ")
            );
        }

        Some(OpponentDefenseProfile {
            team_id: Some(team.team_id),
            abbreviation: team.abbreviation.clone(),
            full_name: team.full_name.clone(),
            def_rating,
            pace,
            pts_allowed,
            is_fallback: !filled.is_empty(),
        })
    }
}

impl Default for TeamDirectory {
    fn default() -> Self {
        Self::nba_teams()
    }
}

impl DefenseSource for TeamDirectory {
    fn resolve_team(&self, team: &str) -> Option<TeamIdentity> {
        self.resolve(team).map(TeamRecord::identity)
    }

    fn defense_profile(&self, team: &str) -> Option<OpponentDefenseProfile> {
        self.resolve(team).and_then(|t| self.profile_for(t))
    }

    fn team_count(&self) -> usize {
        self.teams.len()
    }
}
