//! REST wire types for the Q-Vault paper catalog.
//!
//! This crate contains the request and response shapes exchanged with the
//! catalog backend. Keeping them in their own crate keeps the serde derive
//! expansion out of the main crate's rebuilds.
//!
//! The backend is loose about types: ids and years arrive as strings or
//! numbers, and most fields may be missing or `null`. Everything here
//! normalizes to a single owned representation on the way in.

use serde::{Deserialize, Deserializer, Serialize};

/// A paper as listed by `GET /papers` and `GET /papers/favorites`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperSummary {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub course_code: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub course: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub year: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub semester: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub exam_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub downloads: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub views: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub favorites_count: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_favorite: bool,
}

impl PaperSummary {
    /// Course label shown on cards: the course code, falling back to the course name.
    pub fn course_label(&self) -> &str {
        if !self.course_code.is_empty() {
            &self.course_code
        } else {
            &self.course
        }
    }
}

/// Query parameters for `GET /papers`.
///
/// Empty fields are `None` and never serialized, so the backend sees an
/// absent parameter rather than an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PaperQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semester: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exam_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

/// Response of `GET /papers/download/{id}`: a short-lived direct link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessLink {
    pub url: String,
}

/// Response of `POST /papers/favorite/{id}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteToggle {
    #[serde(rename = "isFavorite")]
    pub is_favorite: bool,
}

/// Response of `GET /auth/check`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthCheck {
    #[serde(default)]
    pub user: Option<User>,
}

/// The signed-in user as reported by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role.as_deref() == Some("admin")
    }
}

/// Body of `POST /papers/requests`: a paper a student could not find.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PaperRequestForm {
    pub course_name: String,
    pub course_code: String,
    pub semester: String,
    pub exam_type: String,
    pub year: String,
}

/// Where a paper request stands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    #[default]
    Pending,
    Fulfilled,
    Rejected,
}

impl RequestStatus {
    pub const ALL: [RequestStatus; 3] = [
        RequestStatus::Pending,
        RequestStatus::Fulfilled,
        RequestStatus::Rejected,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Fulfilled => "fulfilled",
            RequestStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        RequestStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown request status '{s}' (pending, fulfilled, rejected)"))
    }
}

/// Unknown or missing statuses read as pending.
impl<'de> Deserialize<'de> for RequestStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value: Option<String> = Option::deserialize(deserializer)?;
        Ok(value
            .and_then(|s| s.parse().ok())
            .unwrap_or_default())
    }
}

/// A paper request as listed by `GET /papers/requests`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperRequest {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub course_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub course_code: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub semester: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub exam_type: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub year: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub requested_by: String,
    #[serde(default)]
    pub status: RequestStatus,
}

/// Body and response of `PATCH /papers/requests/{id}/status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: RequestStatus,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    Str(String),
    Int(i64),
    Float(f64),
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<StringOrNumber> = Option::deserialize(deserializer)?;
    Ok(match value {
        None => String::new(),
        Some(StringOrNumber::Str(s)) => s,
        Some(StringOrNumber::Int(n)) => n.to_string(),
        Some(StringOrNumber::Float(f)) => f.to_string(),
    })
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
