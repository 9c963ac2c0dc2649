//! Reference data shown on the booking form: services and bookable slots.

use std::fmt::{self, Write as _};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::domain::{Pet, ServiceId, SlotId};

/// A service the clinic offers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Service {
    /// Row id in `services`.
    pub id: ServiceId,
    /// Text shown in the service picker.
    pub description: String,
}

/// A bookable (date, start time) unit.
///
/// ## Invariants
/// - `is_available` only ever moves from `true` to `false` inside the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    /// Row id in `available_slots`.
    pub id: SlotId,
    /// Calendar day of the slot.
    pub date: NaiveDate,
    /// Local start time on `date`.
    pub start_time: NaiveTime,
    /// `false` once the slot has been booked.
    pub is_available: bool,
}

impl Slot {
    /// Date and start time combined into one local instant.
    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.start_time)
    }
}

/// An available slot together with its rendered label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailableSlot {
    /// The underlying slot row.
    pub slot: Slot,
    /// Rendered `"<date> <time>"` label.
    pub label: String,
}

/// Errors returned when a label pattern cannot render a date or time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelFormatError {
    pattern: String,
}

impl fmt::Display for LabelFormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unsupported slot label pattern: {}", self.pattern)
    }
}

impl std::error::Error for LabelFormatError {}

/// Default date pattern, day first.
pub const DEFAULT_DATE_PATTERN: &str = "%d/%m/%Y";
/// Default time pattern, hour and minute only.
pub const DEFAULT_TIME_PATTERN: &str = "%H:%M";

/// strftime patterns used to render slot labels.
///
/// # Examples
/// ```
/// use booking_core::domain::SlotLabelFormat;
/// use chrono::{NaiveDate, NaiveTime};
///
/// let format = SlotLabelFormat::default();
/// let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
/// let time = NaiveTime::from_hms_opt(9, 30, 0).unwrap();
/// assert_eq!(format.render(date.and_time(time)), "09/03/2024 09:30");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotLabelFormat {
    date_pattern: String,
    time_pattern: String,
}

impl SlotLabelFormat {
    /// Validate both patterns by rendering a sample instant.
    pub fn new(
        date_pattern: impl Into<String>,
        time_pattern: impl Into<String>,
    ) -> Result<Self, LabelFormatError> {
        let date_pattern = date_pattern.into();
        let time_pattern = time_pattern.into();
        for pattern in [&date_pattern, &time_pattern] {
            let mut probe = String::new();
            if write!(probe, "{}", sample_instant().format(pattern)).is_err() {
                return Err(LabelFormatError {
                    pattern: pattern.clone(),
                });
            }
        }
        Ok(Self {
            date_pattern,
            time_pattern,
        })
    }

    /// Render `instant` as `"<date> <time>"`.
    pub fn render(&self, instant: NaiveDateTime) -> String {
        format!(
            "{} {}",
            instant.format(&self.date_pattern),
            instant.format(&self.time_pattern)
        )
    }

    /// Decorate a slot with its label.
    pub fn decorate(&self, slot: Slot) -> AvailableSlot {
        let label = self.render(slot.starts_at());
        AvailableSlot { slot, label }
    }
}

impl Default for SlotLabelFormat {
    fn default() -> Self {
        Self {
            date_pattern: DEFAULT_DATE_PATTERN.to_owned(),
            time_pattern: DEFAULT_TIME_PATTERN.to_owned(),
        }
    }
}

fn sample_instant() -> NaiveDateTime {
    NaiveDateTime::default()
}

/// Keep bookable slots only, ordered by date then start time.
///
/// The sort is stable so rows sharing an instant keep their source order.
pub fn bookable_in_order(slots: Vec<Slot>) -> Vec<Slot> {
    let mut bookable: Vec<Slot> = slots.into_iter().filter(|slot| slot.is_available).collect();
    bookable.sort_by_key(|slot| (slot.date, slot.start_time));
    bookable
}

/// Which reference set a load concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogKind {
    /// The `services` table.
    Services,
    /// The `available_slots` table.
    Slots,
    /// The signed-in user's pets.
    Pets,
}

impl fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Services => "services",
            Self::Slots => "slots",
            Self::Pets => "pets",
        };
        f.write_str(name)
    }
}

/// A catalog failed to load.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("could not load {catalog}: {message}")]
pub struct CatalogLoadError {
    /// Which catalogue failed.
    pub catalog: CatalogKind,
    /// Underlying port error.
    pub message: String,
}

impl CatalogLoadError {
    /// Record a failure for `catalog`.
    pub fn new(catalog: CatalogKind, message: impl Into<String>) -> Self {
        Self {
            catalog,
            message: message.into(),
        }
    }
}

/// Whatever part of the form's reference data loaded.
///
/// A failed catalog leaves its collection empty and adds one entry to
/// `failures`; the other catalog is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogSnapshot {
    /// Services in description order.
    pub services: Vec<Service>,
    /// Open slots, earliest first.
    pub slots: Vec<AvailableSlot>,
    /// Pets owned by the signed-in user.
    pub pets: Vec<Pet>,
    /// One entry per catalogue that failed to load.
    pub failures: Vec<CatalogLoadError>,
}

impl CatalogSnapshot {
    /// Whether every requested catalog loaded.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// The failure recorded for `catalog`, if any.
    pub fn failure(&self, catalog: CatalogKind) -> Option<&CatalogLoadError> {
        self.failures
            .iter()
            .find(|failure| failure.catalog == catalog)
    }

    /// Look up an offered slot by id.
    pub fn slot(&self, slot_id: SlotId) -> Option<&AvailableSlot> {
        self.slots.iter().find(|entry| entry.slot.id == slot_id)
    }
}
