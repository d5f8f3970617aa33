use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::models::application::{Application, ApplicationStatus};

/// Dashboard query. Each predicate is optional; an empty string or a missing
/// status means "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardFilters {
    #[serde(
        serialize_with = "status_as_label",
        deserialize_with = "status_or_empty"
    )]
    pub status: Option<ApplicationStatus>,
    pub company: String,
    pub location: String,
}

impl DashboardFilters {
    /// True when the application satisfies every active predicate.
    pub fn matches(&self, app: &Application) -> bool {
        if let Some(status) = self.status {
            if app.status != status {
                return false;
            }
        }
        contains_ignore_case(&app.job.company, &self.company)
            && contains_ignore_case(&app.job.location, &self.location)
    }
}

// The needle is used as typed, surrounding whitespace included.
fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}

// Persisted filters use "" for "all statuses".
fn status_as_label<S: Serializer>(
    status: &Option<ApplicationStatus>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(status.map(|s| s.label()).unwrap_or(""))
}

fn status_or_empty<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<ApplicationStatus>, D::Error> {
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
    }
}
