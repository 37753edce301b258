use std::fmt::Write as _;
use std::io::{self, Read};

use anyhow::{bail, Context, Result};
use clap::Args;
use time::{Date, OffsetDateTime};

use crate::config::AppConfig;
use crate::form::{FormController, SubmitOutcome};
use crate::journal::{format_date, parse_date, Category, Entry, Severity, TimeOfDay, CATEGORIES};
use crate::server;
use crate::storage::{self, DocumentStore, EntryStore};
use crate::trends::{CategoryFilter, SortKey, TrendPoint, TrendsQuery, TrendsView};

#[derive(Args, Debug, Clone)]
pub struct AddArgs {
    /// Short description of the symptom
    #[arg()]
    pub symptom: Option<String>,
    /// Category id (pain, digestive, respiratory, mental, sleep, energy, skin, other)
    #[arg(long)]
    pub category: Option<Category>,
    /// Severity from 1 (barely noticeable) to 10 (worst imaginable)
    #[arg(long, default_value = "5", value_parser = parse_severity)]
    pub severity: Severity,
    /// Date of the symptom as YYYY-MM-DD (defaults to today)
    #[arg(long, value_parser = parse_date_arg)]
    pub date: Option<Date>,
    /// When the symptom occurred
    #[arg(long, default_value = "morning")]
    pub time_of_day: TimeOfDay,
    /// Duration in minutes; anything that is not a positive integer is ignored
    #[arg(long)]
    pub duration: Option<String>,
    /// Free-form notes. If omitted, reads from piped stdin.
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Category filter: `all` or a category id (defaults to the configured filter)
    #[arg(long)]
    pub category: Option<CategoryFilter>,
    /// Sort order: `date` or `severity` (defaults to the configured order)
    #[arg(long)]
    pub sort: Option<SortKey>,
}

#[derive(Args, Debug, Clone)]
pub struct DeleteArgs {
    /// Entry identifier as shown by `list`
    pub id: String,
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Address to listen on (defaults to the configured bind address)
    #[arg(long)]
    pub bind: Option<String>,
}

pub fn add_entry(store: &dyn EntryStore, mut args: AddArgs) -> Result<()> {
    if args.notes.is_none() {
        args.notes = read_stdin()?;
    }
    let output = run_add(store, args)?;
    print!("{output}");
    Ok(())
}

fn run_add(store: &dyn EntryStore, args: AddArgs) -> Result<String> {
    let mut form = FormController::new(store, || tracing::debug!("entry collection changed"));
    form.set_symptom(args.symptom.unwrap_or_default());
    form.set_category(args.category);
    form.set_severity(args.severity);
    if let Some(date) = args.date {
        form.set_date(Some(date));
    }
    form.set_time_of_day(args.time_of_day);
    form.set_duration(args.duration.unwrap_or_default());
    form.set_notes(args.notes.unwrap_or_default());

    let outcome = form
        .submit()
        .context("could not save the entry, please try again")?;
    match outcome {
        SubmitOutcome::Saved(entry) => Ok(format!(
            "Saved entry #{}  {}  {} ({})\n",
            entry.id,
            format_date(entry.date),
            entry.symptom,
            entry.severity
        )),
        SubmitOutcome::Invalid(errors) => {
            let lines = errors
                .iter()
                .map(|(field, message)| format!("{field}: {message}"))
                .collect::<Vec<_>>();
            bail!("entry not saved\n{}", lines.join("\n"));
        }
    }
}

pub fn list_entries(config: &AppConfig, store: &dyn EntryStore, args: ListArgs) -> Result<()> {
    let query = TrendsQuery {
        category: args.category.unwrap_or(config.trends.default_category),
        sort: args.sort.unwrap_or(config.trends.default_sort),
    };
    let entries = store.list();
    let view = TrendsView::compute(&entries, query, today());
    print!("{}", format_trends(&view, query));
    Ok(())
}

pub fn print_trend(store: &dyn EntryStore) -> Result<()> {
    let entries = store.list();
    let view = TrendsView::compute(&entries, TrendsQuery::default(), today());
    print!("{}", format_series(&view.series));
    Ok(())
}

pub fn delete_entry(store: &dyn EntryStore, args: DeleteArgs) -> Result<()> {
    let id = args.id.trim();
    if id.is_empty() {
        bail!("entry id cannot be empty");
    }
    store
        .delete(id)
        .with_context(|| format!("deleting entry {id}"))?;
    println!("Deleted entry #{id}");
    Ok(())
}

pub fn print_categories() -> Result<()> {
    print!("{}", format_categories());
    Ok(())
}

pub fn serve(config: &AppConfig, args: ServeArgs) -> Result<()> {
    let bind = args.bind.unwrap_or_else(|| config.server.bind.clone());
    let handle = storage::init(&config.server.database_path, &config.storage)
        .context("opening backend document store")?;
    server::run(&bind, DocumentStore::new(handle))
}

fn today() -> Date {
    OffsetDateTime::now_utc().date()
}

fn parse_severity(raw: &str) -> Result<Severity, String> {
    let value: u8 = raw
        .trim()
        .parse()
        .map_err(|_| format!("'{raw}' is not a number between 1 and 10"))?;
    Severity::try_from(value)
}

fn parse_date_arg(raw: &str) -> Result<Date, String> {
    parse_date(raw).map_err(|err| format!("expected YYYY-MM-DD: {err}"))
}

fn read_stdin() -> Result<Option<String>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(Some(buf))
}

fn format_trends(view: &TrendsView, query: TrendsQuery) -> String {
    if view.total == 0 {
        return "No entries yet. Start logging your symptoms to see trends and patterns over time.\n"
            .to_string();
    }
    let mut out = String::new();
    if let Some(summary) = &view.summary {
        let _ = writeln!(&mut out, "Total entries  {}", summary.total);
        let _ = writeln!(&mut out, "Avg severity   {:.1}", summary.avg_severity);
        let _ = writeln!(&mut out, "Most common    {}", view.top_category_label());
        let _ = writeln!(&mut out, "This week      {}", summary.recent_count);
        out.push('\n');
    }
    let _ = writeln!(
        &mut out,
        "Showing {} of {} entries (category: {}, sort: {})",
        view.shown(),
        view.total,
        query.category,
        query.sort
    );
    out.push('\n');
    if view.entries.is_empty() {
        out.push_str("No entries match this filter.\n");
        return out;
    }
    for entry in &view.entries {
        write_entry(&mut out, entry);
        out.push('\n');
    }
    out
}

fn write_entry(out: &mut String, entry: &Entry) {
    let _ = writeln!(
        out,
        "#{}  {}  {}",
        entry.id,
        format_date(entry.date),
        entry.symptom
    );
    let band = entry.severity.band();
    let mut details = format!(
        "    {}  {} ({})  {}",
        entry.category.display_name(),
        band.label(),
        entry.severity,
        entry.time_of_day
    );
    if let Some(minutes) = entry.duration {
        let _ = write!(&mut details, "  {minutes} min");
    }
    let _ = writeln!(out, "{details}");
    if let Some(notes) = entry.notes.as_deref() {
        let _ = writeln!(out, "    notes  {}", notes.replace('\n', " "));
    }
}

fn format_series(series: &[TrendPoint]) -> String {
    if series.is_empty() {
        return "No entries yet.\n".to_string();
    }
    let mut out = String::new();
    for point in series {
        let bar = "#".repeat(usize::from(point.severity));
        let _ = writeln!(
            &mut out,
            "{}  {:>2}  {:<10}  {}",
            format_date(point.date),
            point.severity,
            bar,
            point.category
        );
    }
    out
}

fn format_categories() -> String {
    let mut out = String::new();
    for category in CATEGORIES.iter() {
        let _ = writeln!(
            &mut out,
            "{:<12} {:<18} {}",
            category.id.as_ref(),
            category.name,
            category.icon
        );
    }
    out
}
