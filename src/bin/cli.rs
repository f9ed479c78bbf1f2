//! Propbet CLI - Command-line interface for player prop analysis

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use propbet::data::LeagueAverages;
use propbet::{
    BetSide, DefenseSource, GameLogIndex, GameLogSource, Location, ModelConfig, PropAnalysis,
    PropAnalyzer, PropRequest, StatType, TeamDirectory,
};

/// Default data directory (relative to working directory)
const DEFAULT_DATA_DIR: &str = "data";
const GAME_LOGS_FILE: &str = "game_logs.csv";
const TEAMS_FILE: &str = "teams.csv";
const HISTOGRAM_BINS: usize = 20;

type Analyzer = PropAnalyzer<GameLogIndex, TeamDirectory>;

#[derive(Parser)]
#[command(name = "propbet")]
#[command(author, version, about = "Player prop analysis CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Run in interactive mode
    #[arg(short, long)]
    interactive: bool,

    /// Directory holding game_logs.csv and teams.csv
    #[arg(long, env = "DATA_DIR", default_value = DEFAULT_DATA_DIR)]
    data_dir: PathBuf,

    /// Game log CSV (overrides <data-dir>/game_logs.csv)
    #[arg(long)]
    games_csv: Option<PathBuf>,

    /// Team CSV (overrides <data-dir>/teams.csv)
    #[arg(long)]
    teams_csv: Option<PathBuf>,

    /// Model parameter JSON file
    #[arg(long, env = "MODEL_CONFIG")]
    model_config: Option<PathBuf>,

    /// Seed for reproducible simulations
    #[arg(long)]
    seed: Option<u64>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a single prop
    Analyze {
        /// Player full name
        #[arg(short, long)]
        player: String,

        /// Opponent (abbreviation, full name or nickname)
        #[arg(short, long)]
        opponent: String,

        /// Stat type: points, rebounds, assists, threes, pts+rebs, pts+asts, rebs+asts
        #[arg(short, long, default_value = "points")]
        stat: String,

        /// Prop line
        #[arg(short, long, allow_hyphen_values = true)]
        line: f64,

        /// American odds for the over
        #[arg(long, default_value = "-110", allow_hyphen_values = true)]
        over_odds: i32,

        /// American odds for the under
        #[arg(long, default_value = "-110", allow_hyphen_values = true)]
        under_odds: i32,

        /// HOME or AWAY
        #[arg(long, default_value = "HOME")]
        location: Location,

        /// Bankroll for stake sizing
        #[arg(long)]
        bankroll: Option<f64>,

        /// Show a histogram of simulated outcomes
        #[arg(long)]
        histogram: bool,
    },

    /// Analyze a JSON file of prop requests
    Batch {
        /// JSON array of requests
        #[arg(short, long)]
        file: PathBuf,

        /// Write full results as JSON
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// List the team directory
    Teams,

    /// List players in the game logs
    Players {
        /// Case-insensitive name fragment
        #[arg(short, long)]
        search: Option<String>,

        /// Maximum number of players to show
        #[arg(long, default_value = "50")]
        limit: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // WARN keeps fallback warnings visible next to the report
    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    println!("{}", "Propbet CLI v0.1.0".cyan().bold());
    println!();

    if cli.interactive {
        let analyzer = build_analyzer(&cli)?;
        run_interactive(&analyzer, cli.seed)?;
    } else if let Some(command) = &cli.command {
        match command {
            Commands::Analyze {
                player,
                opponent,
                stat,
                line,
                over_odds,
                under_odds,
                location,
                bankroll,
                histogram,
            } => {
                let request = PropRequest {
                    player: player.clone(),
                    opponent: opponent.clone(),
                    stat_type: stat.clone(),
                    prop_line: *line,
                    odds_over: *over_odds,
                    odds_under: *under_odds,
                    location: *location,
                };
                let analyzer = build_analyzer(&cli)?;
                analyze_prop(&analyzer, &request, cli.seed, *bankroll, *histogram)?;
            }
            Commands::Batch { file, output } => {
                let analyzer = build_analyzer(&cli)?;
                run_batch(&analyzer, file, output.as_deref(), cli.seed)?;
            }
            Commands::Teams => {
                list_teams(&load_teams(&cli)?);
            }
            Commands::Players { search, limit } => {
                let games = load_games(&cli)?;
                list_players(&games, search.as_deref(), *limit);
            }
        }
    } else {
        println!("Use --help for usage information or --interactive for interactive mode.");
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<ModelConfig> {
    match &cli.model_config {
        Some(path) => ModelConfig::from_json_file(path)
            .with_context(|| format!("Failed to load model config from {:?}", path)),
        None => Ok(ModelConfig::default()),
    }
}

fn load_games(cli: &Cli) -> Result<GameLogIndex> {
    let path = cli
        .games_csv
        .clone()
        .unwrap_or_else(|| cli.data_dir.join(GAME_LOGS_FILE));
    GameLogIndex::load(&path).with_context(|| format!("Failed to load game logs from {:?}", path))
}

fn load_teams(cli: &Cli) -> Result<TeamDirectory> {
    let path = cli
        .teams_csv
        .clone()
        .unwrap_or_else(|| cli.data_dir.join(TEAMS_FILE));

    if cli.teams_csv.is_none() && !path.exists() {
        println!(
            "{}",
            format!(
                "(No team table at {:?}; every opponent will use league-average defense)",
                path
            )
            .dimmed()
        );
        return Ok(TeamDirectory::nba_teams());
    }

    TeamDirectory::load(&path).with_context(|| format!("Failed to load teams from {:?}", path))
}

fn build_analyzer(cli: &Cli) -> Result<Analyzer> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message("Loading game logs...");

    let config = load_config(cli)?;
    let games = load_games(cli)?;
    let teams = load_teams(cli)?.with_league_averages(LeagueAverages::from_config(&config));

    pb.finish_and_clear();
    println!(
        "Loaded {} players, {} teams",
        games.player_count(),
        teams.team_count()
    );
    println!();

    Ok(PropAnalyzer::new(config, games, teams))
}

fn rng_for(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn analyze_prop(
    analyzer: &Analyzer,
    request: &PropRequest,
    seed: Option<u64>,
    bankroll: Option<f64>,
    histogram: bool,
) -> Result<()> {
    let mut rng = rng_for(seed);
    let analysis = analyzer
        .analyze_detailed(request, &mut rng)
        .with_context(|| format!("Analysis failed for {}", request.player))?;

    print_report(&analysis, analyzer.config().sample_count, bankroll);
    if histogram {
        print_histogram(&analysis);
    }
    Ok(())
}

fn rule() -> String {
    "=".repeat(70)
}

fn section(title: &str) {
    println!("{}", rule());
    println!("{}", title.yellow().bold());
    println!("{}", rule());
    println!();
}

fn form_label(analysis: &PropAnalysis) -> colored::ColoredString {
    match analysis.features.form() {
        propbet::FormIndicator::Hot => "HOT".red().bold(),
        propbet::FormIndicator::Cold => "COLD".blue().bold(),
        propbet::FormIndicator::Neutral => "NEUTRAL".normal(),
    }
}

fn print_report(analysis: &PropAnalysis, sample_count: usize, bankroll: Option<f64>) {
    let req = &analysis.request;
    let f = &analysis.features;
    let sim = &analysis.simulation;
    let rec = &analysis.recommendation;
    let line = req.prop_line;

    println!("{}", rule());
    println!(
        "{}",
        format!("  PLAYER PROP ANALYSIS - {}", req.player.to_uppercase())
            .cyan()
            .bold()
    );
    println!("{}", rule());
    println!();

    println!("{}", "PROP DETAILS:".yellow().bold());
    println!("   Stat Type: {}", f.stat_type.as_str().to_uppercase());
    println!("   Prop Line: {}", line);
    println!("   Player:    {}", req.player);
    println!("   Location:  {}", f.location);
    println!();

    section("STATISTICAL ANALYSIS:");
    println!("Recent Performance (weighted last 5): {:.2}", f.recent_avg_5);
    println!("Recent Performance (last 10 avg):     {:.2}", f.recent_avg_10);
    println!(
        "Season Average ({} games):           {:.2}",
        f.games_played, f.season_avg
    );
    println!("Standard Deviation:                   {:.2}", f.std_dev);
    println!("Minutes (recent avg):                 {:.1}", f.recent_min_avg);
    println!("Form Indicator: {} ({:+.2})", form_label(analysis), f.hot_cold_factor);
    println!();
    println!("Opponent Defense Rating: {:.1}", f.opp_def_rating);
    println!("Opponent Pace:           {:.1}", f.opp_pace);
    println!("Opponent Pts Allowed:    {:.1}", f.opp_pts_allowed);
    println!("Opponent Resolved:       {} {}", f.opp_abbreviation, f.opp_full_name);
    if f.opp_is_fallback {
        println!(
            "{}",
            "   (using league-average opponent strength)".yellow()
        );
    }
    println!();

    section(&format!(
        "MONTE CARLO SIMULATION RESULTS ({} iterations):",
        sample_count
    ));
    println!("Model Prediction: {:.2}", rec.predicted_value);
    println!("Expected Value:   {:.2}", sim.expected_value);
    println!("Median Outcome:   {:.2}", sim.median_value);
    println!();
    println!(
        "95% Confidence Interval: [{:.2}, {:.2}]",
        sim.ci_95_lower, sim.ci_95_upper
    );
    println!();
    println!("Probability OVER {}:  {:.1}%", line, sim.over_probability * 100.0);
    println!("Probability UNDER {}: {:.1}%", line, sim.under_probability * 100.0);
    println!();

    section("BETTING EDGE ANALYSIS:");
    println!("Edge on OVER:  {:+.2}%", rec.edge_over * 100.0);
    println!("Edge on UNDER: {:+.2}%", rec.edge_under * 100.0);
    println!();
    println!("Kelly Bet Size (OVER):  {:.2}% of bankroll", rec.kelly_over * 100.0);
    println!("Kelly Bet Size (UNDER): {:.2}% of bankroll", rec.kelly_under * 100.0);
    println!();

    section("RECOMMENDATION:");
    match rec.bet {
        BetSide::Over | BetSide::Under => {
            let (probability, distance, direction) = if rec.bet == BetSide::Over {
                (sim.over_probability, rec.predicted_value - line, "above")
            } else {
                (sim.under_probability, line - rec.predicted_value, "below")
            };
            println!("{}", format!("BET: {} {}", rec.bet, line).green().bold());
            println!(
                "Confidence: {} ({:.1}/5.0)",
                "*".repeat(rec.confidence as usize).yellow(),
                rec.confidence
            );
            println!("Edge: {:.2}%", rec.edge * 100.0);
            println!("Suggested Bet Size: {:.2}% of bankroll", rec.kelly_size * 100.0);
            if let Some(bankroll) = bankroll {
                println!("Suggested Stake: {:.2} of {:.2}", rec.stake_for_bankroll(bankroll), bankroll);
            }
            println!();
            println!(
                "Model predicts {:.2}, {:.2} {} the line. Simulation gives {:.1}% to hit the {}.",
                rec.predicted_value,
                distance,
                direction,
                probability * 100.0,
                rec.bet
            );
        }
        BetSide::NoBet => {
            println!("{}", "NO BET RECOMMENDED".red().bold());
            println!();
            println!("No side clears the minimum edge.");
            println!("Best edge found: {:.2}%", rec.edge * 100.0);
            println!("Consider passing on this prop or waiting for a better line.");
        }
    }
    println!();

    section("LAST 5 GAMES:");
    for game in &analysis.recent_games {
        println!(
            "  {}: {:>4.0} vs {}",
            game.game_date,
            f.stat_type.value(game),
            game.matchup
        );
    }
    println!();

    println!("{}", rule());
    println!(
        "{}",
        "DISCLAIMER: This is for educational purposes. Gambling involves risk.".dimmed()
    );
    println!("{}", "    Always bet responsibly and within your means.".dimmed());
    println!("{}", rule());
}

fn print_histogram(analysis: &PropAnalysis) {
    let bins = analysis.simulation.histogram(HISTOGRAM_BINS);
    let Some(max_count) = bins.iter().map(|&(_, c)| c).max().filter(|&c| c > 0) else {
        return;
    };
    let line = analysis.request.prop_line;

    println!();
    println!("{}", "Simulated outcome distribution:".yellow().bold());
    for (lower, count) in bins {
        let bar = "#".repeat(count * 40 / max_count);
        let bar = if lower >= line { bar.green() } else { bar.red() };
        println!("{:>7.1} | {}", lower, bar);
    }
}

fn run_batch(analyzer: &Analyzer, file: &Path, output: Option<&Path>, seed: Option<u64>) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read batch file {:?}", file))?;
    let requests: Vec<PropRequest> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse batch file {:?}", file))?;

    if requests.is_empty() {
        println!("{}", "No requests in batch file.".red());
        return Ok(());
    }

    let seed = seed.unwrap_or_else(rand::random::<u64>);
    println!("Analyzing {} props (seed {})", requests.len(), seed);

    let pb = ProgressBar::new(requests.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );
    let results = analyzer.analyze_batch_with(&requests, seed, |_| pb.inc(1));
    pb.finish_and_clear();

    println!();
    println!(
        "{:<22} {:>10} {:>6} {:>7} {:>7} {:>8} {:>7} {:>7}",
        "Player", "Stat", "Line", "Pred", "P(Ovr)", "Bet", "Edge", "Kelly"
    );
    println!("{}", "-".repeat(82));

    let mut bets = 0usize;
    for (request, result) in requests.iter().zip(&results) {
        match result {
            Ok(analysis) => {
                let rec = &analysis.recommendation;
                let bet = match rec.bet {
                    BetSide::Over => "OVER".green(),
                    BetSide::Under => "UNDER".green(),
                    BetSide::NoBet => "-".normal(),
                };
                if rec.is_bet() {
                    bets += 1;
                }
                println!(
                    "{:<22} {:>10} {:>6.1} {:>7.2} {:>6.1}% {:>8} {:>+6.1}% {:>6.2}%{}",
                    truncate_name(&request.player, 22),
                    analysis.features.stat_type.as_str(),
                    rec.prop_line,
                    rec.predicted_value,
                    rec.over_probability * 100.0,
                    bet,
                    rec.edge * 100.0,
                    rec.kelly_size * 100.0,
                    if rec.opponent_fallback { " *" } else { "" }
                );
            }
            Err(e) => {
                println!(
                    "{:<22} {}",
                    truncate_name(&request.player, 22),
                    format!("error: {}", e).red()
                );
            }
        }
    }

    println!("{}", "-".repeat(82));
    let failed = results.iter().filter(|r| r.is_err()).count();
    println!(
        "{} props, {} bets, {} failed",
        requests.len(),
        bets.to_string().green(),
        failed.to_string().red()
    );
    if results
        .iter()
        .any(|r| matches!(r, Ok(a) if a.recommendation.opponent_fallback))
    {
        println!("{}", "* league-average opponent strength".dimmed());
    }

    if let Some(path) = output {
        let records: Vec<serde_json::Value> = requests
            .iter()
            .zip(&results)
            .map(|(request, result)| match result {
                Ok(analysis) => serde_json::json!({ "request": request, "analysis": analysis }),
                Err(e) => serde_json::json!({ "request": request, "error": e.to_string() }),
            })
            .collect();
        let json = serde_json::to_string_pretty(&records)?;
        std::fs::write(path, json).with_context(|| format!("Failed to write {:?}", path))?;
        println!("Results written to {:?}", path);
    }

    Ok(())
}

fn list_teams(teams: &TeamDirectory) {
    println!("{}", "Teams:".yellow().bold());
    println!(
        "{:<5} {:<26} {:>8} {:>7} {:>8}",
        "Abbr", "Name", "DefRtg", "Pace", "OppPts"
    );
    println!("{}", "-".repeat(58));

    let fmt = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| format!("{:.1}", v));
    for team in teams.teams() {
        println!(
            "{:<5} {:<26} {:>8} {:>7} {:>8}",
            team.abbreviation,
            team.full_name,
            fmt(team.def_rating),
            fmt(team.pace),
            fmt(team.opp_pts)
        );
    }
    println!();
    println!("{} teams", teams.team_count());
}

fn list_players(games: &GameLogIndex, search: Option<&str>, limit: usize) {
    let names = match search {
        Some(fragment) => games.search(fragment, limit),
        None => games.players().into_iter().take(limit).collect(),
    };

    if names.is_empty() {
        println!("{}", "No matching players.".red());
        return;
    }

    for name in &names {
        let count = games.player_games(name).map_or(0, |g| g.len());
        println!("  {:<30} {:>3} games", name, count);
    }
    println!();
    println!("Showing {} of {} players", names.len(), games.len());
}

fn run_interactive(analyzer: &Analyzer, seed: Option<u64>) -> Result<()> {
    println!("{}", "Interactive mode".green().bold());
    println!();

    let theme = ColorfulTheme::default();

    loop {
        let options = vec!["Analyze a prop", "List teams", "Search players", "Quit"];

        let selection = Select::with_theme(&theme)
            .with_prompt("What would you like to do?")
            .items(&options)
            .default(0)
            .interact()?;

        match selection {
            0 => {
                let request = prompt_request(&theme)?;
                println!();
                // Analysis errors are reported without leaving the loop
                if let Err(e) = analyze_prop(analyzer, &request, seed, None, false) {
                    println!("{} {:#}", "Error:".red().bold(), e);
                }
                println!();
            }
            1 => {
                println!();
                list_teams(analyzer.teams());
                println!();
            }
            2 => {
                let fragment: String = Input::with_theme(&theme)
                    .with_prompt("Name contains")
                    .interact_text()?;
                println!();
                list_players(analyzer.games(), Some(&fragment), 25);
                println!();
            }
            3 => {
                println!("Goodbye!");
                break;
            }
            _ => {}
        }
    }

    Ok(())
}

fn prompt_request(theme: &ColorfulTheme) -> Result<PropRequest> {
    let player: String = Input::with_theme(theme)
        .with_prompt("Player name")
        .interact_text()?;

    let opponent: String = Input::with_theme(theme)
        .with_prompt("Opponent (e.g. BOS or Boston Celtics)")
        .interact_text()?;

    let stat_names: Vec<&str> = StatType::ALL.iter().map(|s| s.as_str()).collect();
    let stat_idx = Select::with_theme(theme)
        .with_prompt("Stat type")
        .items(&stat_names)
        .default(0)
        .interact()?;

    // Re-prompts instead of leaving the session on NaN or inf
    let prop_line: f64 = Input::with_theme(theme)
        .with_prompt("Prop line")
        .validate_with(check_prop_line)
        .interact_text()?;

    let odds_over: i32 = Input::with_theme(theme)
        .with_prompt("Over odds (American)")
        .default(-110)
        .interact_text()?;

    let odds_under: i32 = Input::with_theme(theme)
        .with_prompt("Under odds (American)")
        .default(-110)
        .interact_text()?;

    let location = if Select::with_theme(theme)
        .with_prompt("Location")
        .items(&["HOME", "AWAY"])
        .default(0)
        .interact()?
        == 0
    {
        Location::Home
    } else {
        Location::Away
    };

    Ok(PropRequest {
        player,
        opponent,
        stat_type: stat_names[stat_idx].to_string(),
        prop_line,
        odds_over,
        odds_under,
        location,
    })
}

fn check_prop_line(line: &f64) -> std::result::Result<(), String> {
    if line.is_finite() {
        Ok(())
    } else {
        Err(format!("Prop line must be a finite number, got {}", line))
    }
}

/// Truncate name to fit display width
fn truncate_name(name: &str, max_len: usize) -> String {
    let chars: Vec<char> = name.chars().collect();
    if chars.len() <= max_len {
        name.to_string()
    } else {
        chars[..max_len - 1].iter().collect::<String>() + "…"
    }
}
