use std::num::NonZeroU32;

use indexmap::IndexMap;
use strum::Display;
use time::{Date, OffsetDateTime};

use crate::journal::{generate_id, Category, Entry, Severity, TimeOfDay};
use crate::storage::{EntryStore, PersistenceError};

pub const SYMPTOM_REQUIRED: &str = "Symptom description is required";
pub const CATEGORY_REQUIRED: &str = "Please select a category";
pub const DATE_REQUIRED: &str = "Date is required";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Field {
    Symptom,
    Category,
    Date,
}

/// Per-field messages in the order the rules run.
pub type FieldErrors = IndexMap<Field, &'static str>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub field_errors: FieldErrors,
}

impl ValidationReport {
    pub fn valid(&self) -> bool {
        self.field_errors.is_empty()
    }
}

/// Transient, unvalidated form state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub date: Option<Date>,
    pub symptom: String,
    pub category: Option<Category>,
    pub severity: Severity,
    pub notes: String,
    pub time_of_day: TimeOfDay,
    /// Raw minutes as typed; anything that is not a positive integer means "no duration".
    pub duration: String,
}

impl Draft {
    pub fn new(today: Date) -> Self {
        Self {
            date: Some(today),
            symptom: String::new(),
            category: None,
            severity: Severity::MIDPOINT,
            notes: String::new(),
            time_of_day: TimeOfDay::Morning,
            duration: String::new(),
        }
    }

    pub fn parsed_duration(&self) -> Option<NonZeroU32> {
        let raw = self.duration.trim();
        if raw.is_empty() {
            return None;
        }
        let parsed = raw
            .parse::<i64>()
            .ok()
            .and_then(|minutes| u32::try_from(minutes).ok())
            .and_then(NonZeroU32::new);
        if parsed.is_none() {
            tracing::debug!(input = raw, "ignoring duration that is not a positive integer");
        }
        parsed
    }

    fn build_entry(
        &self,
        date: Date,
        category: Category,
        id: String,
        created_at: OffsetDateTime,
    ) -> Entry {
        let notes = self.notes.trim();
        Entry {
            id,
            date,
            symptom: self.symptom.trim().to_string(),
            category,
            severity: self.severity,
            notes: (!notes.is_empty()).then(|| notes.to_string()),
            time_of_day: self.time_of_day,
            duration: self.parsed_duration(),
            created_at,
        }
    }
}

/// Runs every rule and collects all failures.
pub fn validate(draft: &Draft) -> ValidationReport {
    ValidationReport {
        field_errors: check(draft).err().unwrap_or_default(),
    }
}

/// Hands back the required fields once every rule passes.
fn check(draft: &Draft) -> Result<(Date, Category), FieldErrors> {
    let mut field_errors = FieldErrors::new();
    if draft.symptom.trim().is_empty() {
        field_errors.insert(Field::Symptom, SYMPTOM_REQUIRED);
    }
    if draft.category.is_none() {
        field_errors.insert(Field::Category, CATEGORY_REQUIRED);
    }
    if draft.date.is_none() {
        field_errors.insert(Field::Date, DATE_REQUIRED);
    }
    match (draft.date, draft.category) {
        (Some(date), Some(category)) if field_errors.is_empty() => Ok((date, category)),
        _ => Err(field_errors),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Saved(Entry),
    Invalid(FieldErrors),
}

/// Owns the draft and drives it through validation into the store.
///
/// Field edits never clear errors; they stay until the next submit re-validates.
/// A failed write keeps the draft so nothing typed is lost, and `on_change`
/// fires exactly once per successful submit. The `submitting` flag only spans
/// the store call inside `submit`; callers holding the controller see it set
/// only if they observe it re-entrantly, never with a synchronous store.
pub struct FormController<'a> {
    store: &'a dyn EntryStore,
    on_change: Box<dyn FnMut() + 'a>,
    clock: fn() -> OffsetDateTime,
    draft: Draft,
    errors: FieldErrors,
    submitting: bool,
}

impl<'a> FormController<'a> {
    pub fn new(store: &'a dyn EntryStore, on_change: impl FnMut() + 'a) -> Self {
        Self::with_clock(store, on_change, OffsetDateTime::now_utc)
    }

    pub fn with_clock(
        store: &'a dyn EntryStore,
        on_change: impl FnMut() + 'a,
        clock: fn() -> OffsetDateTime,
    ) -> Self {
        Self {
            store,
            on_change: Box::new(on_change),
            clock,
            draft: Draft::new(clock().date()),
            errors: FieldErrors::new(),
            submitting: false,
        }
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn error(&self, field: Field) -> Option<&'static str> {
        self.errors.get(&field).copied()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn set_date(&mut self, date: Option<Date>) {
        self.draft.date = date;
    }

    pub fn set_symptom(&mut self, symptom: impl Into<String>) {
        self.draft.symptom = symptom.into();
    }

    pub fn set_category(&mut self, category: Option<Category>) {
        self.draft.category = category;
    }

    pub fn set_severity(&mut self, severity: Severity) {
        self.draft.severity = severity;
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.draft.notes = notes.into();
    }

    pub fn set_time_of_day(&mut self, time_of_day: TimeOfDay) {
        self.draft.time_of_day = time_of_day;
    }

    pub fn set_duration(&mut self, duration: impl Into<String>) {
        self.draft.duration = duration.into();
    }

    pub fn submit(&mut self) -> Result<SubmitOutcome, PersistenceError> {
        let (date, category) = match check(&self.draft) {
            Ok(fields) => fields,
            Err(field_errors) => {
                self.errors = field_errors.clone();
                return Ok(SubmitOutcome::Invalid(field_errors));
            }
        };
        self.errors.clear();

        let now = (self.clock)();
        let entry = self.draft.build_entry(date, category, generate_id(), now);

        self.submitting = true;
        let result = self.store.create(&entry);
        self.submitting = false;

        match result {
            Ok(()) => {
                tracing::debug!(id = %entry.id, category = %entry.category, "entry submitted");
                self.draft = Draft::new(now.date());
                (self.on_change)();
                Ok(SubmitOutcome::Saved(entry))
            }
            Err(err) => {
                tracing::error!(error = %err, "saving entry failed, keeping draft");
                Err(err)
            }
        }
    }
}
