pub mod application;
pub mod filters;
pub mod message;

pub use application::{
    Application, ApplicationStatus, ContentKind, FitAnalysis, InterviewPrep, JobDraft,
};
pub use filters::DashboardFilters;
pub use message::{Message, Role, Source};
