use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Pipeline stage of an application. Serialized with the column labels the
/// board displays, which is also the persisted representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApplicationStatus {
    #[serde(rename = "Discovery Hub")]
    Discovery,
    #[serde(rename = "Applied")]
    Applied,
    #[serde(rename = "Interview Center")]
    Interview,
    #[serde(rename = "Offer")]
    Offer,
    #[serde(rename = "Rejected")]
    Rejected,
}

impl ApplicationStatus {
    /// Board columns, in pipeline order.
    pub const ALL: [ApplicationStatus; 5] = [
        ApplicationStatus::Discovery,
        ApplicationStatus::Applied,
        ApplicationStatus::Interview,
        ApplicationStatus::Offer,
        ApplicationStatus::Rejected,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ApplicationStatus::Discovery => "Discovery Hub",
            ApplicationStatus::Applied => "Applied",
            ApplicationStatus::Interview => "Interview Center",
            ApplicationStatus::Offer => "Offer",
            ApplicationStatus::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown application status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for ApplicationStatus {
    type Err = UnknownStatus;

    /// Accepts the column label or the short name, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        ApplicationStatus::ALL
            .into_iter()
            .find(|status| {
                status.label().eq_ignore_ascii_case(needle)
                    || format!("{status:?}").eq_ignore_ascii_case(needle)
            })
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// A job posting. Identity is fixed at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: String,
    pub url: String,
    pub logo: String,
}

/// Caller-supplied job fields for a new application. Contents are not
/// validated; whatever the caller sends is stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobDraft {
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: String,
    pub url: String,
    pub logo: Option<String>,
}

impl JobDraft {
    /// Placeholder logo seeded from the company name.
    pub fn logo_or_placeholder(&self) -> String {
        match self.logo.as_deref().map(str::trim) {
            Some(logo) if !logo.is_empty() => logo.to_string(),
            _ => {
                let seed: String = self
                    .company
                    .to_lowercase()
                    .chars()
                    .filter(|c| c.is_ascii_alphanumeric())
                    .collect();
                let seed = if seed.is_empty() { "job".to_string() } else { seed };
                format!("https://picsum.photos/seed/{seed}/100")
            }
        }
    }

    pub fn into_job(self, id: Uuid) -> Job {
        let logo = self.logo_or_placeholder();
        Job {
            id,
            title: self.title,
            company: self.company,
            location: self.location,
            description: self.description,
            url: self.url,
            logo,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FitAnalysis {
    /// Expected 0-100. Not clamped; whatever the model returned is kept.
    pub fit_score: i32,
    pub summary: String,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewQuestion {
    #[serde(rename = "type")]
    pub kind: String,
    pub question: String,
    pub tip: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewPrep {
    pub questions: Vec<InterviewQuestion>,
}

/// The free-text artifacts that can be generated and later improved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentKind {
    CoverLetter,
    ResumeBullets,
    OutreachPitch,
}

impl ContentKind {
    pub fn label(&self) -> &'static str {
        match self {
            ContentKind::CoverLetter => "cover letter",
            ContentKind::ResumeBullets => "resume bullet points",
            ContentKind::OutreachPitch => "outreach pitch",
        }
    }
}

/// Each field is generated independently; any subset may be present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_letter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_bullets: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outreach_pitch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interview_prep: Option<InterviewPrep>,
}

impl GeneratedContent {
    pub fn get(&self, kind: ContentKind) -> Option<&str> {
        match kind {
            ContentKind::CoverLetter => self.cover_letter.as_deref(),
            ContentKind::ResumeBullets => self.resume_bullets.as_deref(),
            ContentKind::OutreachPitch => self.outreach_pitch.as_deref(),
        }
    }

    pub fn set(&mut self, kind: ContentKind, text: String) {
        let slot = match kind {
            ContentKind::CoverLetter => &mut self.cover_letter,
            ContentKind::ResumeBullets => &mut self.resume_bullets,
            ContentKind::OutreachPitch => &mut self.outreach_pitch,
        };
        *slot = Some(text);
    }
}

/// A job tracked through the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    #[serde(flatten)]
    pub job: Job,
    pub status: ApplicationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fit_analysis: Option<FitAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_content: Option<GeneratedContent>,
}

impl Application {
    pub fn new(job: Job) -> Self {
        Self {
            job,
            status: ApplicationStatus::Discovery,
            fit_analysis: None,
            generated_content: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.job.id
    }

    pub fn content(&self, kind: ContentKind) -> Option<&str> {
        self.generated_content.as_ref().and_then(|c| c.get(kind))
    }
}
