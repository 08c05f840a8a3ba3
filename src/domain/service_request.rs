use std::{fmt, ops::Deref, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use uuid::Uuid;

use crate::domain::validation::Violation;

/// The minimum length of a request description, in characters.
pub const MIN_DESCRIPTION_LEN: usize = 10;

/// The kind of civic issue a request is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    /// Potholes and road surface damage.
    PotholeRepair,
    /// Broken or flickering streetlights.
    StreetlightMaintenance,
    /// Graffiti on public property.
    GraffitiRemoval,
    /// Missed or overflowing trash pickups.
    TrashCollection,
    /// Noise disturbances.
    NoiseComplaint,
    /// Anything else.
    Other,
}

impl Category {
    /// Every category, in display order.
    pub const ALL: [Self; 6] = [
        Self::PotholeRepair,
        Self::StreetlightMaintenance,
        Self::GraffitiRemoval,
        Self::TrashCollection,
        Self::NoiseComplaint,
        Self::Other,
    ];

    /// The canonical name, as stored and displayed.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PotholeRepair => "Pothole Repair",
            Self::StreetlightMaintenance => "Streetlight Maintenance",
            Self::GraffitiRemoval => "Graffiti Removal",
            Self::TrashCollection => "Trash Collection",
            Self::NoiseComplaint => "Noise Complaint",
            Self::Other => "Other",
        }
    }
}

/// Where a request currently is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Status {
    /// Logged, not yet picked up. Every new request starts here.
    #[default]
    Open,
    /// Being worked on.
    InProgress,
    /// Resolved.
    Closed,
    /// Declined by the city.
    Rejected,
}

impl Status {
    /// Every status, in display order.
    pub const ALL: [Self; 4] = [Self::Open, Self::InProgress, Self::Closed, Self::Rejected];

    /// The canonical name, as stored and displayed.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::InProgress => "In Progress",
            Self::Closed => "Closed",
            Self::Rejected => "Rejected",
        }
    }
}

/// Normalises user input so that `In Progress`, `in-progress` and
/// `IN_PROGRESS` all compare equal to the canonical name.
fn normalise(s: &str) -> String {
    s.trim()
        .chars()
        .map(|c| if c == '-' || c == '_' { ' ' } else { c })
        .collect::<String>()
        .to_lowercase()
}

/// Error returned when a string is not a known [`Category`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown category '{0}'")]
pub struct UnknownCategory(pub String);

/// Error returned when a string is not a known [`Status`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalise(s);
        Self::ALL
            .into_iter()
            .find(|category| category.as_str().to_lowercase() == wanted)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

impl FromStr for Status {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalise(s);
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().to_lowercase() == wanted)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A request description that is known to satisfy the length invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Description(String);

impl Description {
    /// Creates a new `Description`.
    ///
    /// Length is counted in Unicode scalar values. Browser form validation
    /// counts UTF-16 code units instead, so text made mostly of characters
    /// outside the Basic Multilingual Plane (most emoji) can pass a browser's
    /// check and still be rejected here.
    ///
    /// # Errors
    ///
    /// Returns [`Violation::DescriptionTooShort`] if the text has fewer than
    /// [`MIN_DESCRIPTION_LEN`] characters.
    pub fn new(text: String) -> Result<Self, Violation> {
        let len = text.chars().count();
        if len < MIN_DESCRIPTION_LEN {
            return Err(Violation::DescriptionTooShort { len });
        }
        Ok(Self(text))
    }

    /// Returns the string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Description {
    type Error = Violation;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for Description {
    type Error = Violation;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value.to_string())
    }
}

impl Deref for Description {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for Description {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The user-supplied part of a request.
///
/// Constructing one is the validation step: the store only ever accepts
/// input that already satisfies the description and category invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewServiceRequest {
    /// What is wrong, and where.
    pub description: Description,
    /// What kind of issue it is.
    pub category: Category,
}

impl NewServiceRequest {
    /// Validates raw form input.
    ///
    /// # Errors
    ///
    /// Returns every violated field, so that each one can be reported next
    /// to the input it came from.
    pub fn parse(description: &str, category: Option<&str>) -> Result<Self, Vec<Violation>> {
        let mut violations = Vec::new();

        let description = Description::try_from(description)
            .map_err(|violation| violations.push(violation))
            .ok();

        let category = match category {
            None => {
                violations.push(Violation::MissingField("category"));
                None
            }
            Some(raw) => raw
                .parse::<Category>()
                .map_err(|e| violations.push(Violation::UnknownCategory(e.0)))
                .ok(),
        };

        match (description, category) {
            (Some(description), Some(category)) => Ok(Self {
                description,
                category,
            }),
            _ => Err(violations),
        }
    }
}

/// A logged civic service request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequest {
    /// Unique, immutable identifier.
    pub id: Uuid,
    /// What is wrong, and where.
    pub description: Description,
    /// What kind of issue it is.
    pub category: Category,
    /// When the request was logged.
    pub submission_date: DateTime<Utc>,
    /// Current status. The only field that changes after creation.
    pub status: Status,
}

impl ServiceRequest {
    /// Builds a freshly-logged request.
    ///
    /// A new UUID and the current time are assigned, and the status is always
    /// [`Status::Open`].
    #[must_use]
    pub fn new(request: NewServiceRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            description: request.description,
            category: request.category,
            submission_date: Utc::now(),
            status: Status::Open,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_parses_canonical_and_kebab_names() {
        assert_eq!(
            "Pothole Repair".parse::<Category>(),
            Ok(Category::PotholeRepair)
        );
        assert_eq!(
            "streetlight-maintenance".parse::<Category>(),
            Ok(Category::StreetlightMaintenance)
        );
        assert_eq!("OTHER".parse::<Category>(), Ok(Category::Other));
        assert!("Sinkhole".parse::<Category>().is_err());
    }

    #[test]
    fn status_parses_canonical_and_kebab_names() {
        assert_eq!("In Progress".parse::<Status>(), Ok(Status::InProgress));
        assert_eq!("in_progress".parse::<Status>(), Ok(Status::InProgress));
        assert_eq!("closed".parse::<Status>(), Ok(Status::Closed));
        assert_eq!(
            "Pending".parse::<Status>(),
            Err(UnknownStatus("Pending".to_string()))
        );
    }

    #[test]
    fn description_enforces_minimum_length() {
        assert_eq!(
            Description::try_from("too short"),
            Err(Violation::DescriptionTooShort { len: 9 })
        );
        assert!(Description::try_from("just right").is_ok());
    }

    #[test]
    fn description_counts_characters_not_bytes() {
        // 9 characters, but more than 10 bytes.
        assert!(Description::try_from("ééééééééé").is_err());
    }

    #[test]
    fn description_counts_scalar_values_not_utf16_units() {
        // 5 scalar values, 10 UTF-16 code units.
        let emoji = "🚧🚧🚧🚧🚧";
        assert_eq!(emoji.encode_utf16().count(), 10);
        assert_eq!(
            Description::try_from(emoji),
            Err(Violation::DescriptionTooShort { len: 5 })
        );
    }

    #[test]
    fn parse_reports_every_violated_field() {
        let violations = NewServiceRequest::parse("short", None).unwrap_err();
        assert_eq!(
            violations,
            vec![
                Violation::DescriptionTooShort { len: 5 },
                Violation::MissingField("category"),
            ]
        );
    }

    #[test]
    fn new_request_starts_open() {
        let before = Utc::now();
        let request = ServiceRequest::new(
            NewServiceRequest::parse("Pothole on Main St near 1st Ave", Some("Pothole Repair"))
                .unwrap(),
        );
        assert_eq!(request.status, Status::Open);
        assert_eq!(request.category, Category::PotholeRepair);
        assert!(request.submission_date >= before);
    }

    #[test]
    fn serializes_to_wire_shape() {
        let request = ServiceRequest {
            id: Uuid::nil(),
            description: Description::try_from("Streetlight out on Elm").unwrap(),
            category: Category::StreetlightMaintenance,
            submission_date: "2024-03-01T12:00:00Z".parse().unwrap(),
            status: Status::InProgress,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "id": "00000000-0000-0000-0000-000000000000",
                "description": "Streetlight out on Elm",
                "category": "Streetlight Maintenance",
                "submissionDate": "2024-03-01T12:00:00Z",
                "status": "In Progress",
            })
        );
    }
}
