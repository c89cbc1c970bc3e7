use chrono::{Datelike, Local, NaiveDate, NaiveTime};
use clap::{Args, Parser, Subcommand};
use studio_core::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "studio")]
#[command(about = "Studio class calendar and movement sequence planner", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Movement library
    #[command(subcommand)]
    Movements(MovementCommand),

    /// Class definitions
    #[command(subcommand)]
    Classes(ClassCommand),

    /// Reusable class templates
    #[command(subcommand)]
    Templates(TemplateCommand),

    /// Resolved occurrences
    #[command(subcommand)]
    Calendar(CalendarCommand),

    /// Report sequence entries pointing at deleted movements
    Check,
}

#[derive(Subcommand)]
enum MovementCommand {
    /// List movements
    List {
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        level: Option<String>,
        /// low, moderate or high
        #[arg(long)]
        precaution: Option<String>,
        #[arg(long)]
        tag: Option<String>,
        /// Match name, category or tags
        #[arg(long)]
        search: Option<String>,
    },
    /// Show one movement
    Show { id: String },
    /// Add a movement to the library
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        category: String,
        #[arg(long, default_value = "All Levels")]
        level: String,
        /// low, moderate or high
        #[arg(long, default_value = "low")]
        precaution: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Change fields of a movement; omitted fields are kept
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        level: Option<String>,
        #[arg(long)]
        precaution: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Free text, e.g. "2-3 minutes"
        #[arg(long)]
        duration: Option<String>,
        /// Replaces all tags
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Remove a movement; sequences keep their reference
    Remove { id: String },
}

#[derive(Args)]
struct RepeatArgs {
    /// Repeat weekly on these days, e.g. "mon,wed" or "1,3"
    #[arg(long, conflicts_with = "monthly")]
    weekly: Option<String>,
    /// Repeat under the monthly pattern on these days (resolved like weekly)
    #[arg(long)]
    monthly: Option<String>,
    /// Last day of the recurrence, YYYY-MM-DD
    #[arg(long)]
    until: Option<String>,
}

impl RepeatArgs {
    fn pattern(&self) -> Result<Option<(RecurrencePattern, DaySet)>> {
        match (&self.weekly, &self.monthly) {
            (Some(days), _) => Ok(Some((RecurrencePattern::Weekly, days.parse()?))),
            (None, Some(days)) => Ok(Some((RecurrencePattern::Monthly, days.parse()?))),
            (None, None) => Ok(None),
        }
    }

    fn until(&self) -> Result<Option<NaiveDate>> {
        self.until.as_deref().map(parse_date).transpose()
    }

    /// Rule for a new class
    fn rule(&self) -> Result<RecurrenceRule> {
        self.edit(RecurrenceRule::None, false)
    }

    /// `current` with the requested changes; unset options keep their value
    fn edit(&self, current: RecurrenceRule, no_end: bool) -> Result<RecurrenceRule> {
        let until = self.until()?;
        let (pattern, days_of_week, end_date) = match (self.pattern()?, current) {
            (Some((pattern, days)), RecurrenceRule::Recurring { end_date, .. }) => {
                (pattern, days, end_date)
            }
            (Some((pattern, days)), RecurrenceRule::None) => (pattern, days, None),
            (
                None,
                RecurrenceRule::Recurring {
                    pattern,
                    days_of_week,
                    end_date,
                },
            ) => (pattern, days_of_week, end_date),
            (None, RecurrenceRule::None) => {
                if until.is_some() {
                    return Err(Error::Validation(
                        "--until needs --weekly or --monthly on a single class".into(),
                    ));
                }
                return Ok(RecurrenceRule::None);
            }
        };

        Ok(RecurrenceRule::Recurring {
            pattern,
            days_of_week,
            end_date: if no_end { None } else { until.or(end_date) },
        })
    }
}

#[derive(Subcommand)]
enum ClassCommand {
    /// List class definitions
    List,
    /// Create a class
    Add {
        #[arg(long)]
        title: String,
        /// First (or only) day, YYYY-MM-DD
        #[arg(long)]
        date: String,
        /// Start time, HH:MM (defaults to the configured start time)
        #[arg(long)]
        start: Option<String>,
        /// Minutes (defaults to the configured duration)
        #[arg(long)]
        duration: Option<u32>,
        #[arg(long, default_value = "All Levels")]
        level: String,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        room: Option<String>,
        #[command(flatten)]
        repeat: RepeatArgs,
        /// Movement ids for the sequence, in order
        #[arg(long = "movement")]
        movements: Vec<String>,
    },
    /// Change details or schedule of a class; omitted fields are kept
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        level: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        room: Option<String>,
        /// Move the first (or only) day, keeping the time
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        duration: Option<u32>,
        #[command(flatten)]
        repeat: RepeatArgs,
        /// Make the class a single occurrence
        #[arg(long, conflicts_with_all = ["weekly", "monthly", "until", "no_end"])]
        no_repeat: bool,
        /// Repeat without an end date
        #[arg(long, conflicts_with = "until")]
        no_end: bool,
    },
    /// Copy a class to today as a single class
    Copy { id: String },
    /// Delete a class
    Remove { id: String },
    /// Show a class's resolved sequence and statistics
    Stats { id: String },
    /// Append a movement to a class's sequence
    Append { id: String, movement: String },
    /// Remove the sequence entry at a position (0-based)
    Drop { id: String, index: usize },
    /// Move a sequence entry
    Move { id: String, from: usize, to: usize },
    /// Empty a class's sequence
    Clear { id: String },
}

#[derive(Subcommand)]
enum TemplateCommand {
    /// List templates
    List,
    /// Save a class as a template
    Save {
        class_id: String,
        #[arg(long)]
        name: Option<String>,
    },
    /// Create a class for today from a template
    Use { template_id: String },
    /// Delete a template
    Remove { id: String },
}

#[derive(Subcommand)]
enum CalendarCommand {
    /// Six-week grid for a month
    Month {
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        month: Option<u32>,
    },
    /// Week containing a date (default today)
    Week {
        #[arg(long)]
        date: Option<String>,
    },
    /// One day
    Day {
        #[arg(long)]
        date: Option<String>,
    },
    /// Arbitrary inclusive range
    Range {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    studio_core::logging::init();

    let cli = Cli::parse();

    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let studio_path = data_dir.join("studio.json");
    tracing::debug!("Using studio file {:?}", studio_path);
    let out = Output { json: cli.json };

    match cli.command {
        Commands::Movements(cmd) => cmd_movements(&studio_path, &config, cmd, &out),
        Commands::Classes(cmd) => cmd_classes(&studio_path, &config, cmd, &out),
        Commands::Templates(cmd) => cmd_templates(&studio_path, &config, cmd, &out),
        Commands::Calendar(cmd) => cmd_calendar(&studio_path, &config, cmd, &out),
        Commands::Check => cmd_check(&studio_path, &config, &out),
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn parse_precaution(text: Option<&str>) -> Result<Option<PrecautionLevel>> {
    text.map(str::parse).transpose()
}

fn cmd_movements(path: &Path, config: &Config, cmd: MovementCommand, out: &Output) -> Result<()> {
    match cmd {
        MovementCommand::List {
            category,
            level,
            precaution,
            tag,
            search,
        } => {
            let filter = MovementFilter {
                search,
                category,
                level,
                precaution_level: parse_precaution(precaution.as_deref())?,
                tag,
            };
            let studio = Studio::open(path, config)?;
            let movements = filter.apply(studio.movements().list());
            out.emit(&movements, || {
                for m in &movements {
                    println!(
                        "{:<24} {:<28} {:<12} {:<13} {}",
                        m.id, m.name, m.category, m.level, m.precaution_level
                    );
                }
            })
        }
        MovementCommand::Show { id } => {
            let studio = Studio::open(path, config)?;
            let movement = studio
                .movements()
                .get(&id)
                .ok_or_else(|| Error::NotFound { kind: "Movement", id })?;
            out.emit(&movement, || display_movement(&movement))
        }
        MovementCommand::Add {
            name,
            category,
            level,
            precaution,
            description,
            tags,
        } => {
            let draft = MovementDraft {
                name,
                category,
                level,
                description: description.unwrap_or_default(),
                precaution_level: precaution.parse()?,
                tags: tags.into_iter().collect(),
                ..Default::default()
            };
            let movement = Studio::update(path, config, |studio| studio.movements_mut().create(draft))?;
            out.emit(&movement, || println!("✓ Added movement {} ({})", movement.name, movement.id))
        }
        MovementCommand::Edit {
            id,
            name,
            category,
            level,
            precaution,
            description,
            duration,
            tags,
        } => {
            let patch = MovementPatch {
                name,
                category,
                level,
                description,
                precaution_level: parse_precaution(precaution.as_deref())?,
                duration,
                tags: (!tags.is_empty()).then(|| tags.into_iter().collect()),
                ..Default::default()
            };
            let movement = Studio::update(path, config, |studio| {
                studio
                    .movements_mut()
                    .update(&id, patch)?
                    .ok_or_else(|| Error::NotFound { kind: "Movement", id: id.clone() })
            })?;
            out.emit(&movement, || println!("✓ Updated movement {} ({})", movement.name, movement.id))
        }
        MovementCommand::Remove { id } => {
            let movement = Studio::update(path, config, |studio| {
                let movement = studio
                    .movements()
                    .get(&id)
                    .ok_or_else(|| Error::NotFound { kind: "Movement", id: id.clone() })?;
                studio.movements_mut().delete(&id);
                Ok(movement)
            })?;
            out.emit(&movement, || println!("✓ Removed movement {} ({})", movement.name, movement.id))
        }
    }
}

/// Anchor changes requested by `classes edit`
struct AnchorEdit {
    date: Option<NaiveDate>,
    start: Option<NaiveTime>,
    duration: Option<u32>,
}

impl AnchorEdit {
    fn apply(&self, mut anchor: Anchor) -> Anchor {
        if let Some(date) = self.date {
            anchor.start = date.and_time(anchor.time());
        }
        if let Some(time) = self.start {
            anchor.start = anchor.date().and_time(time);
        }
        if let Some(minutes) = self.duration {
            anchor.duration_minutes = minutes;
        }
        anchor
    }
}

fn cmd_classes(path: &Path, config: &Config, cmd: ClassCommand, out: &Output) -> Result<()> {
    match cmd {
        ClassCommand::List => {
            let studio = Studio::open(path, config)?;
            let classes = studio.classes().list();
            out.emit(&classes, || {
                for class in &classes {
                    println!("{}  {}", class.id, describe_schedule(class));
                }
            })
        }
        ClassCommand::Add {
            title,
            date,
            start,
            duration,
            level,
            category,
            room,
            repeat,
            movements,
        } => {
            let start_time = match start {
                Some(text) => parse_time(&text)?,
                None => config.schedule.start_time()?,
            };
            let anchor = Anchor::new(
                parse_date(&date)?.and_time(start_time),
                duration.unwrap_or(config.schedule.default_duration_minutes),
            );
            let recurrence = repeat.rule()?;

            let mut draft = ClassDraft::new(title, level, Schedule { anchor, recurrence });
            draft.category = category.unwrap_or_else(|| config.schedule.default_category.clone());
            draft.room_location = room;
            draft.sequence = movements.into_iter().collect();

            let class = Studio::update(path, config, |studio| studio.classes_mut().create(draft))?;
            out.emit(&class, || println!("✓ Created class {}", class.id))
        }
        ClassCommand::Edit {
            id,
            title,
            level,
            category,
            room,
            date,
            start,
            duration,
            repeat,
            no_repeat,
            no_end,
        } => {
            let anchor_edit = AnchorEdit {
                date: date.as_deref().map(parse_date).transpose()?,
                start: start.as_deref().map(parse_time).transpose()?,
                duration,
            };

            let class = Studio::update(path, config, |studio| {
                let current = studio.class(&id)?.schedule;
                let recurrence = if no_repeat {
                    RecurrenceRule::None
                } else {
                    repeat.edit(current.recurrence, no_end)?
                };
                let patch = ClassPatch {
                    title,
                    level,
                    category,
                    room_location: room,
                    schedule: Some(Schedule {
                        anchor: anchor_edit.apply(current.anchor),
                        recurrence,
                    }),
                    ..Default::default()
                };
                studio
                    .classes_mut()
                    .update(&id, patch)?
                    .ok_or_else(|| Error::NotFound { kind: "Class", id: id.clone() })
            })?;
            out.emit(&class, || println!("✓ Updated {}", describe_schedule(&class)))
        }
        ClassCommand::Copy { id } => {
            let class = Studio::update(path, config, |studio| studio.copy_class(&id, today()))?;
            out.emit(&class, || println!("✓ Copied to {} ({})", class.id, class.title))
        }
        ClassCommand::Remove { id } => {
            let class = Studio::update(path, config, |studio| {
                let class = studio.class(&id)?;
                studio.classes_mut().delete(&id);
                Ok(class)
            })?;
            out.emit(&class, || println!("✓ Removed class {} ({})", class.id, class.title))
        }
        ClassCommand::Stats { id } => {
            let studio = Studio::open(path, config)?;
            let stats = studio.sequence_stats(&id)?;
            let entries = studio.resolve_sequence(&id)?;
            out.emit(&stats, || display_sequence(&entries, &stats))
        }
        ClassCommand::Append { id, movement } => {
            let class = Studio::update(path, config, |studio| {
                studio.edit_sequence(&id, |sequence| {
                    if !sequence.append(movement.as_str()) {
                        eprintln!("{} is already in the sequence", movement);
                    }
                    Ok(())
                })
            })?;
            out.emit(&class.sequence, || println!("Sequence: {}", class.sequence.ids().join(", ")))
        }
        ClassCommand::Drop { id, index } => {
            let class = Studio::update(path, config, |studio| {
                studio.edit_sequence(&id, |sequence| sequence.remove_at(index).map(|_| ()))
            })?;
            out.emit(&class.sequence, || println!("Sequence: {}", class.sequence.ids().join(", ")))
        }
        ClassCommand::Move { id, from, to } => {
            let class = Studio::update(path, config, |studio| {
                studio.edit_sequence(&id, |sequence| sequence.reorder(from, to))
            })?;
            out.emit(&class.sequence, || println!("Sequence: {}", class.sequence.ids().join(", ")))
        }
        ClassCommand::Clear { id } => {
            let class = Studio::update(path, config, |studio| {
                studio.edit_sequence(&id, |sequence| {
                    sequence.clear();
                    Ok(())
                })
            })?;
            out.emit(&class.sequence, || println!("✓ Cleared sequence of {}", class.id))
        }
    }
}

fn cmd_templates(path: &Path, config: &Config, cmd: TemplateCommand, out: &Output) -> Result<()> {
    match cmd {
        TemplateCommand::List => {
            let studio = Studio::open(path, config)?;
            let templates = studio.templates().list();
            out.emit(&templates, || {
                for t in &templates {
                    println!(
                        "{}  {} [{}] {} min, {} movements",
                        t.id,
                        t.name,
                        t.level,
                        t.duration_minutes,
                        t.sequence.len()
                    );
                }
            })
        }
        TemplateCommand::Save { class_id, name } => {
            let template = Studio::update(path, config, |studio| studio.save_as_template(&class_id, name))?;
            out.emit(&template, || println!("✓ Saved template {} ({})", template.name, template.id))
        }
        TemplateCommand::Use { template_id } => {
            let class = Studio::update(path, config, |studio| {
                studio.instantiate_template(&template_id, today())
            })?;
            out.emit(&class, || println!("✓ Created class {} ({})", class.id, class.title))
        }
        TemplateCommand::Remove { id } => {
            let template = Studio::update(path, config, |studio| {
                let template = studio.template(&id)?;
                studio.templates_mut().delete(&id);
                Ok(template)
            })?;
            out.emit(&template, || println!("✓ Removed template {} ({})", template.name, template.id))
        }
    }
}

fn cmd_calendar(path: &Path, config: &Config, cmd: CalendarCommand, out: &Output) -> Result<()> {
    let studio = Studio::open(path, config)?;

    let view = match cmd {
        CalendarCommand::Month { year, month } => {
            let now = today();
            studio.month_view(year.unwrap_or(now.year()), month.unwrap_or(now.month()))?
        }
        CalendarCommand::Week { date } => {
            let date = date.as_deref().map(parse_date).transpose()?.unwrap_or_else(today);
            studio.week_view(date)?
        }
        CalendarCommand::Day { date } => {
            let date = date.as_deref().map(parse_date).transpose()?.unwrap_or_else(today);
            CalendarView {
                window: DateWindow::day(date),
                occurrences: studio.classes_on(date),
            }
        }
        CalendarCommand::Range { from, to } => {
            let window = DateWindow::new(parse_date(&from)?, parse_date(&to)?)?;
            CalendarView {
                window,
                occurrences: studio.resolve_occurrences(window.start(), window.end())?,
            }
        }
    };

    out.emit(&view, || display_calendar(&studio, &view))
}

fn cmd_check(path: &Path, config: &Config, out: &Output) -> Result<()> {
    let studio = Studio::open(path, config)?;
    let dangling = studio.dangling_references();
    out.emit(&dangling, || {
        if dangling.is_empty() {
            println!("✓ All sequence entries resolve");
        }
        for d in &dangling {
            println!("{:?} {} references missing movement {}", d.owner, d.owner_id, d.movement_id);
        }
    })
}

struct Output {
    json: bool,
}

impl Output {
    fn emit<T: serde::Serialize>(&self, value: &T, text: impl FnOnce()) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            text();
        }
        Ok(())
    }
}

fn describe_schedule(class: &ClassDefinition) -> String {
    let anchor = &class.schedule.anchor;
    let when = match &class.schedule.recurrence {
        RecurrenceRule::None => format!("{} {}", anchor.date(), anchor.time().format("%H:%M")),
        RecurrenceRule::Recurring {
            pattern,
            days_of_week,
            end_date,
        } => {
            let days: Vec<String> = days_of_week.iter().map(|d| d.to_string()).collect();
            let until = end_date.map(|d| format!(" until {}", d)).unwrap_or_default();
            let label = match pattern {
                RecurrencePattern::Weekly => "every",
                RecurrencePattern::Monthly => "monthly on",
            };
            format!(
                "{} {} at {} from {}{}",
                label,
                days.join("/"),
                anchor.time().format("%H:%M"),
                anchor.date(),
                until
            )
        }
    };
    format!("{} [{}] {} ({} min)", class.title, class.level, when, anchor.duration_minutes)
}

fn display_movement(movement: &Movement) {
    println!("\n  {} ({})", movement.name, movement.id);
    println!("  {} · {} · precaution {}", movement.category, movement.level, movement.precaution_level);
    if let Some(ref duration) = movement.duration {
        println!("  Duration: {}", duration);
    }
    if !movement.description.is_empty() {
        println!("\n  {}", movement.description);
    }
    if !movement.instructions.is_empty() {
        println!();
        for (i, step) in movement.instructions.iter().enumerate() {
            println!("  {}. {}", i + 1, step);
        }
    }
    for note in &movement.precautions {
        println!("  ⚠ {}", note);
    }
    println!();
}

fn display_sequence(entries: &[ResolvedEntry], stats: &SequenceStats) {
    for (i, entry) in entries.iter().enumerate() {
        match entry {
            ResolvedEntry::Movement(m) => {
                println!("  {:>2}. {:<28} {}", i + 1, m.name, m.precaution_level)
            }
            ResolvedEntry::Unresolved(id) => println!("  {:>2}. <missing movement {}>", i + 1, id),
        }
    }
    println!();
    println!("  Movements: {}", stats.movement_count);
    println!("  Estimated: ~{} min", stats.estimated_minutes);
    println!("  High precaution: {}", stats.high_risk_count);
}

fn display_calendar(studio: &Studio, view: &CalendarView) {
    let titles: BTreeMap<String, String> = studio
        .classes()
        .list()
        .into_iter()
        .map(|c| (c.id, c.title))
        .collect();

    println!("{} .. {}", view.window.start(), view.window.end());
    for day in view.window.days() {
        let todays: Vec<_> = view.on(day).collect();
        if todays.is_empty() {
            continue;
        }
        println!("\n{} {}", day.format("%a"), day);
        for o in todays {
            let title = titles
                .get(&o.class_definition_id)
                .map(String::as_str)
                .unwrap_or("?");
            println!(
                "  {}-{}  {}",
                o.start.format("%H:%M"),
                o.end.format("%H:%M"),
                title
            );
        }
    }
}
