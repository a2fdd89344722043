//! # Domain Models
//!
//! These structs represent the core entities of Pinfluence.
//! Identifiers are storage-assigned integers, unique per influencer kind.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Discriminator between the two influencer variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum InfluencerKind {
    Person,
    Event,
}

impl InfluencerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InfluencerKind::Person => "Person",
            InfluencerKind::Event => "Event",
        }
    }
}

impl fmt::Display for InfluencerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InfluencerKind {
    type Err = AppError;

    /// Accepts both the form field spelling (`person`) and the stored
    /// discriminator (`Person`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "person" => Ok(InfluencerKind::Person),
            "event" => Ok(InfluencerKind::Event),
            other => Err(AppError::ValidationError(format!(
                "unknown influencer type '{other}'"
            ))),
        }
    }
}

/// Addresses a single influencer across both variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InfluencerKey {
    pub kind: InfluencerKind,
    pub id: i64,
}

impl InfluencerKey {
    pub fn new(kind: InfluencerKind, id: i64) -> Self {
        Self { kind, id }
    }

    /// Builds a filter from the optional `(id, type)` pair used by the read APIs.
    /// Both halves must be present together.
    pub fn from_filter(id: Option<i64>, kind: Option<&str>) -> Result<Option<Self>, AppError> {
        match (id, kind) {
            (Some(id), Some(kind)) => Ok(Some(Self::new(kind.parse()?, id))),
            (None, None) => Ok(None),
            _ => Err(AppError::ValidationError(
                "influencer_id and influencer_type must be given together".into(),
            )),
        }
    }
}

impl fmt::Display for InfluencerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.kind.as_str().to_ascii_lowercase(), self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: i64,
    pub name: String,
    pub gender: Option<String>,
    /// Cached minimum `date_begin` over this person's moments
    pub earliest_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub name: String,
    pub earliest_date: Option<NaiveDate>,
}

/// A person or an event that moments are attached to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Influencer {
    Person(Person),
    Event(Event),
}

impl Influencer {
    pub fn id(&self) -> i64 {
        match self {
            Influencer::Person(p) => p.id,
            Influencer::Event(e) => e.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Influencer::Person(p) => &p.name,
            Influencer::Event(e) => &e.name,
        }
    }

    pub fn gender(&self) -> Option<&str> {
        match self {
            Influencer::Person(p) => p.gender.as_deref(),
            Influencer::Event(_) => None,
        }
    }

    pub fn earliest_date(&self) -> Option<NaiveDate> {
        match self {
            Influencer::Person(p) => p.earliest_date,
            Influencer::Event(e) => e.earliest_date,
        }
    }

    pub fn kind(&self) -> InfluencerKind {
        match self {
            Influencer::Person(_) => InfluencerKind::Person,
            Influencer::Event(_) => InfluencerKind::Event,
        }
    }

    pub fn key(&self) -> InfluencerKey {
        InfluencerKey::new(self.kind(), self.id())
    }
}

/// Returns the value `earliest_date` must take once a moment starting at
/// `date_begin` is attached, or `None` when the cached value already holds.
pub fn lowered_earliest_date(current: Option<NaiveDate>, date_begin: NaiveDate) -> Option<NaiveDate> {
    match current {
        Some(existing) if existing <= date_begin => None,
        _ => Some(date_begin),
    }
}

/// Attributes for an influencer that does not exist yet.
#[derive(Debug, Clone, PartialEq)]
pub enum NewInfluencer {
    Person { name: String, gender: Option<String> },
    Event { name: String },
}

impl NewInfluencer {
    pub fn kind(&self) -> InfluencerKind {
        match self {
            NewInfluencer::Person { .. } => InfluencerKind::Person,
            NewInfluencer::Event { .. } => InfluencerKind::Event,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            NewInfluencer::Person { name, .. } | NewInfluencer::Event { name } => name,
        }
    }
}

/// Which influencer a moment being recorded belongs to.
#[derive(Debug, Clone, PartialEq)]
pub enum InfluencerSelector {
    Existing(InfluencerKey),
    New(NewInfluencer),
}

/// A dated historical occurrence owned by exactly one influencer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Moment {
    pub id: i64,
    pub date_begin: NaiveDate,
    pub date_end: Option<NaiveDate>,
    pub influencer: InfluencerKey,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Moment {
    pub fn year_begin(&self) -> i32 {
        self.date_begin.year()
    }

    pub fn year_end(&self) -> Option<i32> {
        self.date_end.map(|d| d.year())
    }

    /// Last year this moment spans. An end before the beginning is ignored.
    pub fn effective_end_year(&self) -> i32 {
        self.year_end()
            .map_or(self.year_begin(), |end| end.max(self.year_begin()))
    }
}

/// A geographic coordinate pair as returned by the location service.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: i64,
    /// Free text; may be empty, in which case `latlng` is absent
    pub address: String,
    pub latlng: Option<LatLng>,
    pub moment_id: i64,
}

/// A location awaiting insertion alongside its moment.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLocation {
    pub address: String,
    pub latlng: Option<LatLng>,
}

/// Everything the moment repository writes in one transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct MomentDraft {
    pub influencer: InfluencerSelector,
    pub date_begin: NaiveDate,
    pub date_end: Option<NaiveDate>,
    pub locations: Vec<NewLocation>,
}

/// Result of a committed [`MomentDraft`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordedMoment {
    /// The owning influencer after its `earliest_date` was updated
    pub influencer: Influencer,
    pub moment: Moment,
    pub locations: Vec<Location>,
    /// True when the influencer row was inserted by this transaction
    #[serde(skip)]
    pub influencer_created: bool,
}

/// One entry of the timeline year list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableYear {
    pub year: i32,
    pub formatted: String,
}

impl AvailableYear {
    pub fn new(year: i32) -> Self {
        let formatted = if year < 0 {
            format!("{} BC", -i64::from(year))
        } else {
            format!("{year} AD")
        };
        Self { year, formatted }
    }
}

/// Every year from the earliest beginning to the latest end across `moments`,
/// ascending and gap-free.
pub fn available_years(moments: &[Moment]) -> Vec<AvailableYear> {
    let first = moments.iter().map(Moment::year_begin).min();
    let last = moments.iter().map(Moment::effective_end_year).max();

    match (first, last) {
        (Some(first), Some(last)) => (first..=last).map(AvailableYear::new).collect(),
        _ => Vec::new(),
    }
}
