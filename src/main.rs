use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};
use tracing::{debug, error, info, warn, Level};

use marathon_log::config::AppConfig;
use marathon_log::error::{ErrorSeverity, MarathonLogError, ValidationError};
use marathon_log::logging::{init_logging, LogLevel};
use marathon_log::metrics::{
    difficulty_color, format_date, format_date_time, format_number, run_type_color,
};
use marathon_log::models::{DistanceUnit, Goal, Run, RunType, TargetType, TemperatureUnit, Theme};
use marathon_log::storage::{Persistence, SqliteStore};
use marathon_log::store::{Action, Store};
use marathon_log::validation::{
    completed, parse_date_field, with_progress, GoalDraft, ProfileUpdate, RunDraft,
};
use marathon_log::views::{self, Dashboard, GoalProgress, ProfileSummary, RunFilter};

/// marathon-log - Personal Running Log
///
/// Record runs, set training goals and follow your totals, all stored
/// locally.
#[derive(Parser)]
#[command(name = "marathon-log")]
#[command(version)]
#[command(about = "Personal running log", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Fields shared by add-run and edit-run
#[derive(clap::Args)]
struct RunFields {
    /// Run date (YYYY-MM-DD), defaults to now
    #[arg(long)]
    date: Option<String>,

    /// Distance in your preferred unit
    #[arg(short, long)]
    distance: Option<String>,

    /// Duration as MM:SS or HH:MM:SS
    #[arg(short = 't', long)]
    duration: Option<String>,

    /// Where you ran
    #[arg(short, long)]
    location: Option<String>,

    /// Run type (training, race, long-run, tempo, interval, recovery)
    #[arg(long = "type")]
    run_type: Option<RunType>,

    /// Temperature
    #[arg(long)]
    temperature: Option<String>,

    /// Relative humidity percentage
    #[arg(long)]
    humidity: Option<String>,

    /// Weather conditions
    #[arg(long)]
    conditions: Option<String>,

    /// Average heart rate
    #[arg(long)]
    hr_avg: Option<String>,

    /// Maximum heart rate
    #[arg(long)]
    hr_max: Option<String>,

    /// Elevation gain
    #[arg(long)]
    elevation: Option<String>,

    /// Free-form notes
    #[arg(short, long)]
    notes: Option<String>,

    /// Perceived difficulty, 1-5
    #[arg(long)]
    difficulty: Option<u8>,

    /// Enjoyment, 1-5
    #[arg(long)]
    enjoyment: Option<u8>,

    /// Tag (repeatable)
    #[arg(long = "tag")]
    tags: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Log a new run
    AddRun(RunFields),

    /// Edit a logged run
    EditRun {
        /// Run id
        id: String,

        #[command(flatten)]
        fields: RunFields,
    },

    /// Delete a run
    DeleteRun {
        /// Run id
        id: String,
    },

    /// Browse run history
    Runs {
        /// Search location and notes
        #[arg(short, long)]
        search: Option<String>,

        /// Only runs of this type
        #[arg(long = "type")]
        run_type: Option<RunType>,

        /// Page number, starting at 1
        #[arg(short, long, default_value = "1")]
        page: usize,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Create a goal
    AddGoal {
        #[arg(long)]
        title: String,

        #[arg(long)]
        description: Option<String>,

        /// distance, time, pace, race or custom
        #[arg(long = "target-type", default_value = "distance")]
        target_type: TargetType,

        #[arg(long)]
        target_distance: Option<String>,

        /// Target time as MM:SS or HH:MM:SS
        #[arg(long)]
        target_time: Option<String>,

        #[arg(long)]
        target_pace: Option<String>,

        /// Deadline (YYYY-MM-DD)
        #[arg(long)]
        deadline: String,
    },

    /// Record progress on a goal that is not measured by distance
    GoalProgress {
        /// Goal id
        id: String,

        /// Percentage complete, 0-100
        progress: f64,
    },

    /// Mark a goal as completed
    CompleteGoal {
        /// Goal id
        id: String,
    },

    /// Delete a goal
    DeleteGoal {
        /// Goal id
        id: String,
    },

    /// List active and completed goals
    Goals,

    /// Show totals, recent runs and active goals
    Dashboard,

    /// Show or edit your profile
    Profile {
        #[command(subcommand)]
        command: Option<ProfileCommands>,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Show profile and statistics
    Show,

    /// Update profile fields
    Update {
        #[arg(long)]
        name: Option<String>,

        /// Email address, empty to clear
        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        height: Option<String>,

        /// Body weight in pounds
        #[arg(long)]
        weight: Option<String>,

        /// miles or kilometers
        #[arg(long)]
        distance_unit: Option<DistanceUnit>,

        /// fahrenheit or celsius
        #[arg(long)]
        temperature_unit: Option<TemperatureUnit>,

        /// light, dark or system
        #[arg(long)]
        theme: Option<Theme>,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration
    Show,

    /// Print the configuration file path
    Path,
}

#[derive(Tabled)]
struct RunRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Distance")]
    distance: String,
    #[tabled(rename = "Duration")]
    duration: String,
    #[tabled(rename = "Pace")]
    pace: String,
    #[tabled(rename = "Location")]
    location: String,
    #[tabled(rename = "Type")]
    run_type: String,
    #[tabled(rename = "Effort")]
    difficulty: u8,
}

impl RunRow {
    fn new(run: &Run, unit: DistanceUnit) -> Self {
        RunRow {
            id: run.id.clone(),
            date: format_date(&run.date),
            distance: format!("{} {}", format_number(run.distance, 2), unit.abbreviation()),
            duration: run.duration.clone(),
            pace: run.pace.clone(),
            location: run.location.clone(),
            run_type: run.run_type.to_string(),
            difficulty: run.difficulty.value(),
        }
    }
}

#[derive(Tabled)]
struct GoalRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Goal")]
    title: String,
    #[tabled(rename = "Type")]
    target_type: String,
    #[tabled(rename = "Deadline")]
    deadline: String,
    #[tabled(rename = "Progress")]
    progress: String,
}

impl From<&GoalProgress<'_>> for GoalRow {
    fn from(entry: &GoalProgress<'_>) -> Self {
        GoalRow {
            id: entry.goal.id.clone(),
            title: entry.goal.title.clone(),
            target_type: entry.goal.target_type.to_string(),
            deadline: format_date(&entry.goal.deadline),
            progress: format!("{}%", entry.progress.round()),
        }
    }
}

type CliStore = Store<SqliteStore>;

fn main() {
    if let Err(err) = run() {
        report(&err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(cli.config.as_deref());
    config.logging.level = LogLevel::raised_by(config.logging.level, cli.verbose);
    init_logging(&config.logging)
        .map_err(|e| MarathonLogError::Configuration(format!("{:#}", e)))?;

    if !config.display.color {
        colored::control::set_override(false);
    }

    let mut session = Session::new(&config);
    run_command(&mut session, cli.command, cli.config.as_deref())?;
    session.close();
    Ok(())
}

/// Severity and user-facing text for a failed command
fn describe(err: &anyhow::Error) -> (ErrorSeverity, String) {
    if let Some(known) = err.downcast_ref::<MarathonLogError>() {
        (known.severity(), known.user_message())
    } else if let Some(invalid) = err.downcast_ref::<ValidationError>() {
        let known = MarathonLogError::from(invalid.clone());
        (known.severity(), known.user_message())
    } else {
        (ErrorSeverity::Error, format!("{:#}", err))
    }
}

fn report(err: &anyhow::Error) {
    let (severity, message) = describe(err);
    if severity.to_tracing_level() == Level::WARN {
        warn!(error = %format!("{:#}", err), "Command rejected");
    } else {
        error!(error = %format!("{:#}", err), "Command failed");
    }
    eprintln!("{} {}", "✗".red(), message);
}

/// Command context; the slot database is opened on first use
struct Session<'a> {
    config: &'a AppConfig,
    store: Option<CliStore>,
}

impl<'a> Session<'a> {
    fn new(config: &'a AppConfig) -> Self {
        Self {
            config,
            store: None,
        }
    }

    fn store(&mut self) -> Result<&mut CliStore> {
        let store = match self.store.take() {
            Some(store) => store,
            None => open_store(self.config)?,
        };
        Ok(self.store.insert(store))
    }

    fn close(self) {
        if let Some(store) = self.store {
            store.close();
        }
    }
}

fn open_store(config: &AppConfig) -> Result<CliStore> {
    let data_file = config
        .prepare_data_file()
        .map_err(|e| MarathonLogError::Configuration(format!("{:#}", e)))?;
    let slots = SqliteStore::open(&data_file)
        .map_err(MarathonLogError::from)
        .with_context(|| format!("Failed to open data file: {}", data_file.display()))?;
    info!(path = %data_file.display(), "Opened slot database");

    Ok(Store::open(Persistence::new(slots)))
}

fn run_command(
    session: &mut Session<'_>,
    command: Commands,
    config_path: Option<&Path>,
) -> Result<()> {
    let config = session.config;
    match command {
        Commands::AddRun(fields) => add_run(session.store()?, fields)?,
        Commands::EditRun { id, fields } => edit_run(session.store()?, &id, fields)?,
        Commands::DeleteRun { id } => {
            let store = session.store()?;
            find_run(store, &id)?;
            store.dispatch(Action::DeleteRun(id.clone()));
            println!("{} Deleted run {}", "✓".green(), id);
        }
        Commands::Runs {
            search,
            run_type,
            page,
            json,
        } => list_runs(
            session.store()?,
            RunFilter { search, run_type },
            page,
            json,
            config,
        )?,
        Commands::AddGoal {
            title,
            description,
            target_type,
            target_distance,
            target_time,
            target_pace,
            deadline,
        } => {
            let draft = GoalDraft {
                title,
                description: description.unwrap_or_default(),
                target_type,
                target_distance: target_distance.unwrap_or_default(),
                target_time: target_time.unwrap_or_default(),
                target_pace: target_pace.unwrap_or_default(),
                deadline: Some(parse_date_field(&deadline)?),
            };
            let goal = draft.into_goal(Utc::now())?;
            println!("{} Created goal {} ({})", "✓".green(), goal.title.bold(), goal.id);
            session.store()?.dispatch(Action::AddGoal(goal));
        }
        Commands::GoalProgress { id, progress } => {
            let store = session.store()?;
            let goal = with_progress(find_goal(store, &id)?, progress)?;
            store.dispatch(Action::UpdateGoal(goal));
            println!("{} Progress recorded", "✓".green());
        }
        Commands::CompleteGoal { id } => {
            let store = session.store()?;
            let goal = completed(find_goal(store, &id)?, Utc::now());
            println!(
                "{} Completed {} on {}",
                "✓".green(),
                goal.title.bold(),
                goal.completion_date
                    .as_ref()
                    .map(format_date_time)
                    .unwrap_or_default()
            );
            store.dispatch(Action::UpdateGoal(goal));
        }
        Commands::DeleteGoal { id } => {
            let store = session.store()?;
            find_goal(store, &id)?;
            store.dispatch(Action::DeleteGoal(id.clone()));
            println!("{} Deleted goal {}", "✓".green(), id);
        }
        Commands::Goals => show_goals(session.store()?),
        Commands::Dashboard => show_dashboard(session.store()?, config),
        Commands::Profile { command } => match command.unwrap_or(ProfileCommands::Show) {
            ProfileCommands::Show => show_profile(session.store()?)?,
            ProfileCommands::Update {
                name,
                email,
                height,
                weight,
                distance_unit,
                temperature_unit,
                theme,
            } => {
                let update = ProfileUpdate {
                    display_name: name,
                    email,
                    height,
                    weight,
                    distance_unit,
                    temperature_unit,
                    theme,
                };
                update_profile(session.store()?, update)?;
            }
        },
        Commands::Config { command } => run_config_command(&command, config_path, config)?,
    }
    Ok(())
}

fn run_config_command(
    command: &ConfigCommands,
    config_path: Option<&Path>,
    config: &AppConfig,
) -> Result<()> {
    match command {
        ConfigCommands::Show => {
            let rendered =
                toml::to_string_pretty(config).context("Failed to render configuration")?;
            println!("{}", rendered);
        }
        ConfigCommands::Path => {
            let path = config_path
                .map(Path::to_path_buf)
                .unwrap_or_else(AppConfig::default_config_path);
            println!("{}", path.display());
        }
    }
    Ok(())
}

fn distance_unit(store: &CliStore) -> DistanceUnit {
    store
        .state()
        .user_profile
        .as_ref()
        .map(|p| p.preferences.distance_unit)
        .unwrap_or_default()
}

fn find_run<'a>(store: &'a CliStore, id: &str) -> Result<&'a Run> {
    match store.state().runs.iter().find(|run| run.id == id) {
        Some(run) => Ok(run),
        None => bail!("No run with id '{}'", id),
    }
}

fn find_goal<'a>(store: &'a CliStore, id: &str) -> Result<&'a Goal> {
    match store.state().goals.iter().find(|goal| goal.id == id) {
        Some(goal) => Ok(goal),
        None => bail!("No goal with id '{}'", id),
    }
}

/// Overlay the fields given on the command line onto `draft`
fn merge_fields(mut draft: RunDraft, fields: RunFields) -> Result<RunDraft> {
    if let Some(date) = fields.date {
        draft.date = Some(parse_date_field(&date)?);
    }
    let text_fields = [
        (&mut draft.distance, fields.distance),
        (&mut draft.duration, fields.duration),
        (&mut draft.location, fields.location),
        (&mut draft.temperature, fields.temperature),
        (&mut draft.humidity, fields.humidity),
        (&mut draft.conditions, fields.conditions),
        (&mut draft.heart_rate_avg, fields.hr_avg),
        (&mut draft.heart_rate_max, fields.hr_max),
        (&mut draft.elevation, fields.elevation),
        (&mut draft.notes, fields.notes),
    ];
    for (slot, value) in text_fields {
        if let Some(value) = value {
            *slot = value;
        }
    }
    if let Some(run_type) = fields.run_type {
        draft.run_type = run_type;
    }
    if let Some(difficulty) = fields.difficulty {
        draft.difficulty = difficulty;
    }
    if let Some(enjoyment) = fields.enjoyment {
        draft.enjoyment = enjoyment;
    }
    if !fields.tags.is_empty() {
        draft.tags = fields.tags;
    }
    Ok(draft)
}

fn add_run(store: &mut CliStore, fields: RunFields) -> Result<()> {
    let draft = merge_fields(RunDraft::default(), fields)?;
    let run = draft.into_run(store.state().user_profile.as_ref(), Utc::now())?;

    println!(
        "{} Logged {} {} in {} ({}) on {}",
        "✓".green(),
        format_number(run.distance, 2),
        distance_unit(store).abbreviation(),
        run.duration,
        run.pace.cyan(),
        format_date_time(&run.date)
    );
    debug!(run = %run.id, "Dispatching new run");
    store.dispatch(Action::AddRun(run));
    Ok(())
}

fn edit_run(store: &mut CliStore, id: &str, fields: RunFields) -> Result<()> {
    let existing = find_run(store, id)?.clone();
    let draft = merge_fields(RunDraft::from_run(&existing), fields)?;
    let run = draft.into_updated_run(&existing, store.state().user_profile.as_ref())?;

    store.dispatch(Action::UpdateRun(run));
    println!("{} Updated run {}", "✓".green(), id);
    Ok(())
}

fn list_runs(
    store: &CliStore,
    filter: RunFilter,
    page: usize,
    json: bool,
    config: &AppConfig,
) -> Result<()> {
    let matched = filter.apply(&store.state().runs);

    if json {
        let rendered = serde_json::to_string_pretty(&matched).context("Failed to render runs")?;
        println!("{}", rendered);
        return Ok(());
    }

    if matched.is_empty() {
        println!("{}", "No runs found.".yellow());
        return Ok(());
    }

    let page_size = config.display.history_page_size.max(1);
    let rows = views::page(&matched, page.saturating_sub(1), page_size);
    let unit = distance_unit(store);

    let table = Table::new(rows.iter().map(|run| RunRow::new(run, unit)))
        .with(Style::rounded())
        .to_string();
    println!("{}", table);

    let pages = matched.len().div_ceil(page_size);
    println!(
        "{}",
        format!(
            "Showing {} run{} (page {} of {})",
            matched.len(),
            if matched.len() == 1 { "" } else { "s" },
            page.max(1),
            pages
        )
        .dimmed()
    );
    Ok(())
}

fn print_goal_table(title: &str, goals: &[GoalProgress<'_>]) {
    println!("{}", title.bold());
    if goals.is_empty() {
        println!("  {}", "None".dimmed());
        return;
    }
    let table = Table::new(goals.iter().map(GoalRow::from))
        .with(Style::rounded())
        .to_string();
    println!("{}", table);
}

fn show_goals(store: &CliStore) {
    let (active, done) = views::goal_board(store.state());
    if active.is_empty() {
        println!(
            "{}",
            "No active goals. Create your first goal to start tracking your progress!".yellow()
        );
    } else {
        print_goal_table("Active goals", &active);
    }
    println!();
    print_goal_table("Completed goals", &done);
}

fn show_dashboard(store: &CliStore, config: &AppConfig) {
    let state = store.state();
    let unit = distance_unit(store);
    let dashboard = Dashboard::build(state, Utc::now(), config.display.recent_runs_limit);

    let name = state
        .user_profile
        .as_ref()
        .map(|p| p.display_name.as_str())
        .unwrap_or("Runner");
    println!("{}", format!("Welcome back, {}!", name).green().bold());
    println!();
    println!("  Total runs:      {}", dashboard.total_runs.to_string().bold());
    println!(
        "  Total distance:  {} {}",
        format_number(dashboard.total_distance, 1).bold(),
        unit.abbreviation()
    );
    println!(
        "  This year:       {} {}",
        format_number(dashboard.this_year_distance, 1),
        unit.abbreviation()
    );
    println!(
        "  This month:      {} {}",
        format_number(dashboard.this_month_distance, 1),
        unit.abbreviation()
    );
    println!();

    println!("{}", "Recent runs".bold());
    if dashboard.recent_runs.is_empty() {
        println!("  {}", "No runs yet. Log your first run with add-run.".dimmed());
    } else {
        for run in &dashboard.recent_runs {
            println!(
                "  {}  {:>7} {}  {}  {}  {}  effort {}",
                format_date(&run.date),
                format_number(run.distance, 2),
                unit.abbreviation(),
                run.pace.cyan(),
                run_type_label(run.run_type),
                run.location,
                effort_label(run.difficulty.value())
            );
        }
    }
    println!();

    print_goal_table("Active goals", &dashboard.active_goals);
}

/// `label` in the `#RRGGBB` colour given, plain when the hex is malformed
fn hex_colored(label: String, hex: &str) -> ColoredString {
    let channel = |range: std::ops::Range<usize>| {
        hex.get(range)
            .and_then(|digits| u8::from_str_radix(digits, 16).ok())
    };
    match (hex.len(), hex.starts_with('#')) {
        (7, true) => match (channel(1..3), channel(3..5), channel(5..7)) {
            (Some(r), Some(g), Some(b)) => label.truecolor(r, g, b),
            _ => label.normal(),
        },
        _ => label.normal(),
    }
}

fn run_type_label(run_type: RunType) -> ColoredString {
    hex_colored(run_type.to_string(), run_type_color(run_type))
}

/// Difficulty rendered in the colour the rating maps to
fn effort_label(difficulty: u8) -> ColoredString {
    hex_colored(difficulty.to_string(), difficulty_color(difficulty))
}

fn show_profile(store: &CliStore) -> Result<()> {
    let Some(profile) = store.state().user_profile.as_ref() else {
        bail!("No profile loaded");
    };
    let unit = profile.preferences.distance_unit;
    let summary = ProfileSummary::build(&store.state().runs, unit, Utc::now());

    println!("{}", profile.display_name.bold());
    if let Some(email) = &profile.email {
        println!("  Email:            {}", email);
    }
    if let Some(height) = profile.height {
        println!("  Height:           {}", format_number(height, 1));
    }
    if let Some(weight) = profile.weight {
        println!("  Weight:           {} lbs", format_number(weight, 1));
    }
    println!("  Distance unit:    {}", unit);
    println!();
    println!("  Total runs:       {}", summary.total_runs);
    println!(
        "  Total distance:   {} {}",
        format_number(summary.total_distance, 1),
        unit.abbreviation()
    );
    println!(
        "  Average distance: {} {}",
        format_number(summary.average_distance, 1),
        unit.abbreviation()
    );
    println!(
        "  This year:        {} {}",
        format_number(summary.this_year_distance, 1),
        unit.abbreviation()
    );
    println!("  Average pace:     {}", summary.average_pace);
    println!(
        "  Lifetime:         {} {}",
        format_number(profile.total_lifetime_miles, 1),
        unit.abbreviation()
    );
    Ok(())
}

fn update_profile(store: &mut CliStore, update: ProfileUpdate) -> Result<()> {
    if update.is_empty() {
        println!("{}", "Nothing to update.".yellow());
        return Ok(());
    }
    let current = store.state().user_profile.clone().unwrap_or_default();
    let profile = update.apply(&current)?;

    store.dispatch(Action::UpdateProfile(profile));
    println!("{} Profile updated", "✓".green());
    Ok(())
}
