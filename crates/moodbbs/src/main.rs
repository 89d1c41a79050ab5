//! moodbbs - quest and mood tracker
//!
//! Command-line front end wiring together:
//! - Configuration loading
//! - Store initialization
//! - The quest and mood engine

mod render;

use anyhow::{Context, Result, bail};
use clap::{Args as ClapArgs, Parser, Subcommand};
use moodbbs_api::{
    CompletionDetails, Difficulty, MoodBuff, NewQuest, QuestCategory, RenewalPolicy, RenewalType,
    SnoozeReason, SnoozeRequest,
};
use moodbbs_config::{Settings, load_config_or_default};
use moodbbs_core::{CoreEvent, Engine};
use moodbbs_store::{SqliteStore, Store};
use moodbbs_util::{
    EventId, MAX_SPAN_DAYS, MAX_SPAN_HOURS, QuestId, default_config_path, is_mock_time_active,
};
use render::Output;
use serde_json::json;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// moodbbs - Real-world quests that feed a mood tracker
#[derive(Parser, Debug)]
#[command(name = "moodbbs", version)]
#[command(about = "Real-world quests that feed a mood tracker", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/moodbbs/config.toml)
    #[arg(short, long, global = true, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Data directory override (or set MOODBBS_DATA_DIR env var)
    #[arg(short, long, global = true, env = "MOODBBS_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level
    #[arg(short, long, global = true, default_value = "warn")]
    log_level: String,

    /// Also write JSON logs to the configured log directory
    #[arg(long, global = true)]
    log_file: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// XP, completions and current mood
    Status,

    /// List quests available today
    Quests {
        /// Show every quest in any status
        #[arg(long)]
        all: bool,
    },

    /// Create a quest
    Add(AddArgs),

    /// Create a quest from a configured template
    Template {
        /// Template id
        id: String,
    },

    /// Complete a quest
    Complete(CompleteArgs),

    /// Put a quest off for a few days
    Snooze(SnoozeArgs),

    /// Hide a quest permanently
    Hide { id: i64 },

    /// Recent completions
    History {
        /// Window in days (default from config)
        #[arg(long, value_parser = days_parser())]
        days: Option<u32>,
    },

    /// Completion totals by category
    Stats,

    /// Current mood with its contributors
    Mood,

    /// Log a mood event
    Log(LogArgs),

    /// Deactivate a mood event
    Clear {
        /// Mood event id
        id: i64,
    },

    /// List known mood modifiers
    Modifiers,

    /// Manage personality traits
    #[command(subcommand)]
    Trait(TraitCommand),

    /// Save the current mood to history
    Snapshot,

    /// Show saved mood history
    Snapshots {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Process renewals and snooze returns
    Tick,
}

#[derive(ClapArgs, Debug)]
struct AddArgs {
    title: String,

    #[arg(long, default_value = "social")]
    category: QuestCategory,

    #[arg(long, default_value = "easy")]
    difficulty: Difficulty,

    #[arg(long, default_value_t = 10)]
    xp: u32,

    #[arg(long)]
    description: Option<String>,

    #[arg(long)]
    location: Option<String>,

    /// Renewal cadence; without it the quest completes for good
    #[arg(long)]
    renews: Option<RenewalType>,

    /// Cooldown in days (default depends on --renews)
    #[arg(long, requires = "renews", value_parser = days_parser())]
    cooldown: Option<u32>,

    /// Restrict seasonal renewal to these months, e.g. 6,7,8
    #[arg(long, value_delimiter = ',', requires = "renews")]
    months: Vec<u32>,

    /// Constraint kind, e.g. day_of_week or day_of_month
    #[arg(long, requires = "constraint_note")]
    constraint_kind: Option<String>,

    /// Constraint note, e.g. "mon,wed" or "first_friday"
    #[arg(long, requires = "constraint_kind")]
    constraint_note: Option<String>,
}

#[derive(ClapArgs, Debug)]
struct CompleteArgs {
    id: i64,

    #[arg(long)]
    location: Option<String>,

    /// Time spent in minutes
    #[arg(long)]
    minutes: Option<u32>,

    #[arg(long)]
    notes: Option<String>,

    /// Extra mood buff as EVENT=MODIFIER, repeatable
    #[arg(long = "buff", value_parser = parse_buff, allow_hyphen_values = true)]
    buffs: Vec<MoodBuff>,
}

#[derive(ClapArgs, Debug)]
struct SnoozeArgs {
    id: i64,

    #[arg(long, default_value = "unspecified")]
    reason: SnoozeReason,

    /// Days to snooze (default from config)
    #[arg(long, value_parser = days_parser())]
    days: Option<u32>,

    /// Free-text explanation
    #[arg(long)]
    note: Option<String>,

    #[arg(long)]
    weather: Option<String>,
}

#[derive(ClapArgs, Debug)]
struct LogArgs {
    event_type: String,

    /// Modifier value; omit to use the library default
    #[arg(long, allow_negative_numbers = true)]
    modifier: Option<i32>,

    /// Lifetime in hours; omit for a permanent event
    #[arg(long, requires = "modifier", value_parser = hours_parser())]
    hours: Option<u32>,

    #[arg(long, requires = "modifier")]
    description: Option<String>,
}

#[derive(Subcommand, Debug)]
enum TraitCommand {
    /// Add a custom trait, or a stock trait when --modifier is omitted
    Add {
        name: String,

        #[arg(long, allow_negative_numbers = true)]
        modifier: Option<i32>,

        #[arg(long, default_value = "")]
        description: String,
    },

    /// Deactivate a trait
    Remove { name: String },

    /// List all traits
    List,
}

fn days_parser() -> clap::builder::RangedI64ValueParser<u32> {
    clap::value_parser!(u32).range(0..=i64::from(MAX_SPAN_DAYS))
}

fn hours_parser() -> clap::builder::RangedI64ValueParser<u32> {
    clap::value_parser!(u32).range(1..=i64::from(MAX_SPAN_HOURS))
}

fn parse_buff(s: &str) -> Result<MoodBuff, String> {
    let (event_type, modifier) = s
        .split_once('=')
        .ok_or_else(|| format!("expected EVENT=MODIFIER, got '{}'", s))?;
    let event_type = event_type.trim();
    if event_type.is_empty() {
        return Err("buff event type is empty".into());
    }
    let modifier = modifier
        .trim()
        .parse::<i32>()
        .map_err(|e| format!("invalid buff modifier '{}': {}", modifier, e))?;
    Ok(MoodBuff::new(event_type, modifier))
}

impl AddArgs {
    fn into_new_quest(self) -> NewQuest {
        let mut new = NewQuest::new(self.title, self.category, self.difficulty, self.xp);
        if let Some(description) = self.description {
            new = new.with_description(description);
        }
        if let Some(location) = self.location {
            new = new.with_location(location);
        }
        if let Some(renewal_type) = self.renews {
            let cooldown = self
                .cooldown
                .unwrap_or_else(|| renewal_type.default_cooldown_days());
            let mut policy = RenewalPolicy::new(renewal_type, cooldown);
            if !self.months.is_empty() {
                policy = policy.with_active_months(self.months);
            }
            new = new.with_renewal(policy);
        }
        if let (Some(kind), Some(note)) = (self.constraint_kind, self.constraint_note) {
            new = new.with_constraint(kind, note);
        }
        new
    }
}

fn init_logging(args: &Args, settings: &Settings) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    if args.log_file {
        let log_dir = &settings.storage.log_dir;
        fs::create_dir_all(log_dir)
            .with_context(|| format!("Failed to create log directory {:?}", log_dir))?;
        let log_path = log_dir.join("moodbbs.log");
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .with_context(|| format!("Failed to open log file {:?}", log_path))?;

        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(Mutex::new(file))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}

fn open_engine(args: &Args, mut settings: Settings) -> Result<Engine> {
    if let Some(data_dir) = &args.data_dir {
        settings.storage.data_dir = data_dir.clone();
    }

    let data_dir = &settings.storage.data_dir;
    fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data directory {:?}", data_dir))?;

    let db_path = settings.storage.database_path();
    let store: Arc<dyn Store> = Arc::new(
        SqliteStore::open(&db_path)
            .with_context(|| format!("Failed to open database {:?}", db_path))?,
    );
    info!(db_path = %db_path.display(), "Store initialized");

    Engine::load(settings, store, moodbbs_util::now()).context("Failed to load engine state")
}

fn run(command: Command, engine: &mut Engine, out: Output) -> Result<()> {
    let now = moodbbs_util::now();

    match command {
        Command::Status => {
            let stats = engine.user_stats(now);
            let healthy = engine.is_store_healthy();
            let value = json!({
                "total_xp": stats.total_xp,
                "quests_completed": stats.quests_completed,
                "active_quests": stats.active_quests,
                "mood": stats.mood,
                "store_healthy": healthy,
            });
            out.show(&value, || render::print_status(&stats, healthy))?;
        }

        Command::Quests { all } => {
            if all {
                let quests = engine.all_quests();
                out.show(&quests, || {
                    render::print_quests(quests.iter().map(|q| (*q, engine.latest_snooze(q.id))))
                })?;
            } else {
                let quests = engine.active_quests(true, now)?;
                out.show(&quests, || render::print_quests(quests.iter().map(|q| (q, None))))?;
            }
        }

        Command::Add(add) => {
            let quest = engine.create_quest(add.into_new_quest(), now)?;
            out.show(&quest, || render::print_quest(&quest))?;
        }

        Command::Template { id } => {
            let quest = engine.create_from_template(&id, now)?;
            out.show(&quest, || render::print_quest(&quest))?;
        }

        Command::Complete(complete) => {
            let details = CompletionDetails {
                location_visited: complete.location,
                duration_minutes: complete.minutes,
                notes: complete.notes,
                extra_modifiers: complete.buffs,
            };
            let result = engine.complete_quest(QuestId::new(complete.id), details, now)?;
            out.show(&result.completion, || render::print_completion(&result))?;
        }

        Command::Snooze(snooze) => {
            let days = snooze
                .days
                .unwrap_or(engine.settings().engine.default_snooze_days);
            let mut request = SnoozeRequest::new(snooze.reason, days);
            if let Some(note) = snooze.note {
                request = request.with_reason(note);
            }
            request.context.weather = snooze.weather;

            let id = QuestId::new(snooze.id);
            let record = engine.snooze_quest(id, request, now)?;
            let quest = engine.get_quest(id)?;
            out.show(&record, || render::print_snooze(quest, &record))?;
        }

        Command::Hide { id } => {
            let quest = engine.hide_quest(QuestId::new(id))?;
            out.show(&quest, || println!("Hid \"{}\"", quest.title))?;
        }

        Command::History { days } => {
            let history = engine.quest_history(days, now);
            out.show(&history, || {
                render::print_history(&history, |c| {
                    engine
                        .get_quest(c.quest_id)
                        .map(|q| q.title.clone())
                        .unwrap_or_else(|_| format!("quest #{}", c.quest_id))
                })
            })?;
        }

        Command::Stats => {
            let stats = engine.quest_stats();
            out.show(&stats, || render::print_stats(&stats))?;
        }

        Command::Mood => {
            let mood = engine.current_mood(now);
            out.show(&mood, || render::print_mood(&mood))?;
        }

        Command::Log(log) => {
            let event = match log.modifier {
                Some(modifier) => engine.log_mood_event(
                    &log.event_type,
                    modifier,
                    log.description,
                    log.hours,
                    now,
                )?,
                None => engine.log_from_library(&log.event_type, now)?,
            };
            out.show(&event, || {
                println!("Logged #{} {} ({:+})", event.id, event.event_type, event.modifier)
            })?;
        }

        Command::Clear { id } => {
            let event = engine.deactivate_mood_event(EventId::new(id))?;
            out.show(&event, || println!("Cleared #{} {}", event.id, event.event_type))?;
        }

        Command::Modifiers => {
            let modifiers = engine.modifiers();
            out.show(&modifiers, || render::print_modifiers(modifiers.iter().copied()))?;
        }

        Command::Trait(TraitCommand::Add {
            name,
            modifier,
            description,
        }) => {
            let added = match modifier {
                Some(modifier) => engine.add_trait(&name, &description, modifier)?,
                None => engine.add_stock_trait(&name)?,
            };
            out.show(&added, || println!("Trait {} ({:+}) active", added.name, added.modifier))?;
        }

        Command::Trait(TraitCommand::Remove { name }) => {
            if !engine.remove_trait(&name)? {
                bail!("No trait named '{}'", name);
            }
            out.show(&json!({ "removed": name }), || println!("Trait {} removed", name))?;
        }

        Command::Trait(TraitCommand::List) => {
            let traits = engine.all_traits();
            out.show(traits, || render::print_traits(traits))?;
        }

        Command::Snapshot => {
            let snapshot = engine.save_mood_snapshot(now)?;
            out.show(&snapshot, || render::print_snapshots(std::slice::from_ref(&snapshot)))?;
        }

        Command::Snapshots { limit } => {
            let snapshots = engine.recent_snapshots(limit)?;
            out.show(&snapshots, || render::print_snapshots(&snapshots))?;
        }

        Command::Tick => {
            let mut events = engine.take_load_events();
            events.extend(engine.tick(now)?);
            let value: Vec<_> = events
                .iter()
                .map(|event| match event {
                    CoreEvent::QuestRenewed { quest_id, renewal_count } => json!({
                        "event": "quest_renewed",
                        "quest_id": quest_id,
                        "renewal_count": renewal_count,
                    }),
                    CoreEvent::QuestReturned { quest_id } => json!({
                        "event": "quest_returned",
                        "quest_id": quest_id,
                    }),
                })
                .collect();
            out.show(&value, || render::print_events(&events))?;
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let settings = load_config_or_default(&args.config)
        .with_context(|| format!("Failed to load config from {:?}", args.config))?;

    init_logging(&args, &settings)?;

    debug!(
        version = env!("CARGO_PKG_VERSION"),
        config_path = %args.config.display(),
        templates = settings.templates.len(),
        "moodbbs starting"
    );
    if is_mock_time_active() {
        warn!("Mock time is active");
    }

    let out = Output { json: args.json };
    let mut engine = open_engine(&args, settings)?;
    run(args.command, &mut engine, out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_span_arguments_are_bounded() {
        let args = Args::try_parse_from(["moodbbs", "snooze", "1", "--days", "14"]).unwrap();
        assert!(matches!(args.command, Command::Snooze(SnoozeArgs { days: Some(14), .. })));

        let too_long = MAX_SPAN_DAYS + 1;
        assert!(Args::try_parse_from(["moodbbs", "snooze", "1", "--days", &too_long.to_string()]).is_err());
        assert!(Args::try_parse_from(["moodbbs", "history", "--days", "4294967295"]).is_err());
        assert!(Args::try_parse_from([
            "moodbbs", "add", "Swim", "--category", "constitutional", "--renews", "weekly",
            "--cooldown", "99999999",
        ])
        .is_err());
        assert!(Args::try_parse_from(["moodbbs", "log", "rain", "--modifier", "-2", "--hours", "0"]).is_err());
    }
}
