//! Assistant: typed AI flows on top of the `GenerativeModel` endpoint.
//!
//! Each flow builds one request, makes one call and maps the answer into a
//! fixed shape. Failures are logged with their cause and re-raised as a
//! single message naming the operation; structured flows additionally fail
//! with `Parse` when the answer does not decode. Nothing here retries.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};

use crate::assistant::files::FileUpload;
use crate::assistant::prompts::*;
use crate::llm_client::prompts::{fenced, JSON_ONLY_INSTRUCTION};
use crate::llm_client::{
    strip_json_fences, GenerateRequest, GenerativeModel, LlmError, ModelResponse, Part,
};
use crate::models::{ContentKind, FitAnalysis, InterviewPrep, JobDraft, Source};

pub mod files;
pub mod prompts;
pub mod schemas;
#[cfg(test)]
pub mod testing;

const GENERATION_TEMPERATURE: f32 = 0.7;

/// The flow a request belongs to. Used for logging and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    AnalyzeFit,
    Generate(ContentKind),
    Improve,
    InterviewQuestions,
    ResearchCompany,
    ExtractJobDetails,
    ExtractText,
    Chat,
}

impl Operation {
    pub fn failure_message(&self) -> String {
        match self {
            Operation::AnalyzeFit => "Failed to analyze job fit. Please try again.".to_string(),
            Operation::Generate(kind) => {
                format!("Failed to generate the {}. Please try again.", kind.label())
            }
            Operation::Improve => "Failed to improve the content. Please try again.".to_string(),
            Operation::InterviewQuestions => {
                "Failed to generate interview questions. Please try again.".to_string()
            }
            Operation::ResearchCompany => {
                "Failed to research the company. Please try again.".to_string()
            }
            Operation::ExtractJobDetails => {
                "Failed to extract job details from that link. Make sure it points to a job posting."
                    .to_string()
            }
            Operation::ExtractText => "Failed to extract text from the file.".to_string(),
            Operation::Chat => "Sorry, I ran into an error. Please try again.".to_string(),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::AnalyzeFit => f.write_str("analyze_fit"),
            Operation::Generate(kind) => write!(f, "generate_{kind:?}"),
            Operation::Improve => f.write_str("improve_content"),
            Operation::InterviewQuestions => f.write_str("interview_questions"),
            Operation::ResearchCompany => f.write_str("research_company"),
            Operation::ExtractJobDetails => f.write_str("extract_job_details"),
            Operation::ExtractText => f.write_str("extract_text"),
            Operation::Chat => f.write_str("chat"),
        }
    }
}

#[derive(Debug, Error)]
pub enum AssistantError {
    /// The endpoint was unreachable, refused the call, or returned nothing usable.
    #[error("{}", .operation.failure_message())]
    Request {
        operation: Operation,
        #[source]
        source: LlmError,
    },

    /// The endpoint answered but the payload did not match the expected shape.
    #[error("Failed to parse the AI response. Please try again.")]
    Parse {
        operation: Operation,
        #[source]
        source: serde_json::Error,
    },
}

impl AssistantError {
    pub fn operation(&self) -> Operation {
        match self {
            AssistantError::Request { operation, .. } | AssistantError::Parse { operation, .. } => {
                *operation
            }
        }
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, AssistantError::Parse { .. })
    }
}

/// Job fields read off a posting page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedJob {
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: String,
    pub url: String,
}

impl ExtractedJob {
    fn is_blank(&self) -> bool {
        self.title.trim().is_empty() && self.company.trim().is_empty()
    }

    /// Falls back to the link the user gave when the page offered no Apply URL.
    pub fn into_draft(self, requested_url: &str) -> JobDraft {
        let url = if self.url.trim().is_empty() {
            requested_url.to_string()
        } else {
            self.url
        };
        JobDraft {
            title: self.title,
            company: self.company,
            location: self.location,
            description: self.description,
            url,
            logo: None,
        }
    }
}

/// Chat answer with deduplicated citations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BotReply {
    pub text: String,
    pub sources: Vec<Source>,
}

/// Cheap to clone; all clones share the underlying model.
#[derive(Clone)]
pub struct Assistant {
    model: Arc<dyn GenerativeModel>,
}

impl Assistant {
    pub fn new(model: Arc<dyn GenerativeModel>) -> Self {
        Self { model }
    }

    pub async fn analyze_fit(
        &self,
        job_description: &str,
        resume: &str,
    ) -> Result<FitAnalysis, AssistantError> {
        let prompt = fill_job_prompt(FIT_ANALYSIS_PROMPT, job_description, resume);
        let request = GenerateRequest::text(prompt).with_schema(schemas::fit_analysis());
        self.run_json(Operation::AnalyzeFit, &request).await
    }

    pub async fn generate_content(
        &self,
        kind: ContentKind,
        job_description: &str,
        resume: &str,
    ) -> Result<String, AssistantError> {
        let template = match kind {
            ContentKind::CoverLetter => COVER_LETTER_PROMPT,
            ContentKind::ResumeBullets => RESUME_BULLETS_PROMPT,
            ContentKind::OutreachPitch => OUTREACH_PITCH_PROMPT,
        };
        let request = GenerateRequest::text(fill_job_prompt(template, job_description, resume))
            .with_temperature(GENERATION_TEMPERATURE);
        self.run_text(Operation::Generate(kind), &request).await
    }

    pub async fn improve_content(&self, content: &str) -> Result<String, AssistantError> {
        let prompt = IMPROVE_CONTENT_PROMPT.replace("{content}", &fenced("TEXT", content));
        let request = GenerateRequest::text(prompt).with_temperature(GENERATION_TEMPERATURE);
        self.run_text(Operation::Improve, &request).await
    }

    /// 5-7 questions are requested; the count is not enforced.
    pub async fn generate_interview_questions(
        &self,
        job_description: &str,
        resume: &str,
    ) -> Result<InterviewPrep, AssistantError> {
        let prompt = fill_job_prompt(INTERVIEW_QUESTIONS_PROMPT, job_description, resume);
        let request = GenerateRequest::text(prompt).with_schema(schemas::interview_questions());
        self.run_json(Operation::InterviewQuestions, &request).await
    }

    /// Web-grounded briefing. Citations are appended to the markdown as a
    /// source list rather than returned separately.
    pub async fn research_company(
        &self,
        company: &str,
        job_title: &str,
    ) -> Result<String, AssistantError> {
        let prompt = COMPANY_RESEARCH_PROMPT
            .replace("{company}", company.trim())
            .replace("{job_title}", job_title.trim());
        let request = GenerateRequest::text(prompt).with_web_search();
        let response = self.run(Operation::ResearchCompany, &request).await?;
        let text = non_empty(Operation::ResearchCompany, response.text)?;

        let sources = dedup_sources(response.sources);
        if sources.is_empty() {
            return Ok(text);
        }
        let list: Vec<String> = sources
            .iter()
            .map(|s| format!("- [{}]({})", s.title, s.uri))
            .collect();
        Ok(format!("{}\n\n**Sources**\n{}", text.trim_end(), list.join("\n")))
    }

    /// Reads a posting page. The endpoint cannot combine a declared schema with
    /// web access, so the shape is stated in the prompt and checked here.
    pub async fn extract_job_details(&self, url: &str) -> Result<ExtractedJob, AssistantError> {
        let prompt = EXTRACT_JOB_PROMPT
            .replace("{url}", url.trim())
            .replace("{json_only}", JSON_ONLY_INSTRUCTION);
        let request = GenerateRequest::text(prompt).with_web_search();
        let job: ExtractedJob = self.run_json(Operation::ExtractJobDetails, &request).await?;

        if job.is_blank() {
            error!("{}: page at {url} is not a job posting", Operation::ExtractJobDetails);
            return Err(AssistantError::Request {
                operation: Operation::ExtractJobDetails,
                source: LlmError::EmptyContent,
            });
        }
        Ok(job)
    }

    /// Model-side text extraction for binary documents. Plain-text files are
    /// usually decoded by the caller instead.
    pub async fn extract_text_from_file(
        &self,
        upload: &FileUpload,
    ) -> Result<String, AssistantError> {
        let request = GenerateRequest::text(EXTRACT_TEXT_PROMPT).with_part(Part::InlineData {
            mime_type: upload.mime_type(),
            data: upload.bytes.clone(),
        });
        self.run_text(Operation::ExtractText, &request).await
    }

    /// General Q&A and job search, grounded in web results.
    pub async fn send_message_to_bot(
        &self,
        message: &str,
        preferences: Option<&str>,
    ) -> Result<BotReply, AssistantError> {
        let mut prompt = CHAT_SYSTEM_PROMPT.to_string();
        if let Some(prefs) = preferences.map(str::trim).filter(|p| !p.is_empty()) {
            prompt.push_str(&format!("\n\n{CHAT_PREFERENCES_PROMPT}\n{prefs}"));
        }
        prompt.push_str(&format!("\n\n{}", fenced("USER MESSAGE", message)));

        let request = GenerateRequest::text(prompt)
            .with_web_search()
            .with_thinking_budget(0);
        let response = self.run(Operation::Chat, &request).await?;
        let text = non_empty(Operation::Chat, response.text)?;

        Ok(BotReply {
            text,
            sources: dedup_sources(response.sources),
        })
    }

    async fn run(
        &self,
        operation: Operation,
        request: &GenerateRequest,
    ) -> Result<ModelResponse, AssistantError> {
        debug!("Dispatching {operation}");
        self.model.generate(request).await.map_err(|source| {
            error!("{operation} failed: {source}");
            AssistantError::Request { operation, source }
        })
    }

    async fn run_text(
        &self,
        operation: Operation,
        request: &GenerateRequest,
    ) -> Result<String, AssistantError> {
        let response = self.run(operation, request).await?;
        non_empty(operation, response.text)
    }

    async fn run_json<T: DeserializeOwned>(
        &self,
        operation: Operation,
        request: &GenerateRequest,
    ) -> Result<T, AssistantError> {
        let response = self.run(operation, request).await?;
        serde_json::from_str(strip_json_fences(&response.text)).map_err(|source| {
            error!("{operation} returned malformed JSON: {source}");
            AssistantError::Parse { operation, source }
        })
    }
}

fn fill_job_prompt(template: &str, job_description: &str, resume: &str) -> String {
    template
        .replace("{job_description}", &fenced("JOB DESCRIPTION", job_description))
        .replace("{resume}", &fenced("RESUME", resume))
}

fn non_empty(operation: Operation, text: String) -> Result<String, AssistantError> {
    if text.trim().is_empty() {
        error!("{operation} returned empty text");
        return Err(AssistantError::Request {
            operation,
            source: LlmError::EmptyContent,
        });
    }
    Ok(text.trim().to_string())
}

/// First occurrence of each URI wins.
pub fn dedup_sources(sources: Vec<Source>) -> Vec<Source> {
    let mut seen = HashSet::new();
    sources
        .into_iter()
        .filter(|s| seen.insert(s.uri.clone()))
        .collect()
}

/// Chat rendering of a fit analysis.
pub fn summarize_fit(analysis: &FitAnalysis) -> String {
    let bullets = |items: &[String]| -> String {
        if items.is_empty() {
            "- (none)".to_string()
        } else {
            items
                .iter()
                .map(|i| format!("- {i}"))
                .collect::<Vec<_>>()
                .join("\n")
        }
    };
    format!(
        "Fit Score: {}/100\n\n{}\n\nStrengths:\n{}\n\nPotential Gaps:\n{}",
        analysis.fit_score,
        analysis.summary.trim(),
        bullets(&analysis.pros),
        bullets(&analysis.cons)
    )
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptedModel;
    use super::*;
    use crate::llm_client::ModelResponse;

    fn assistant(model: &Arc<ScriptedModel>) -> Assistant {
        Assistant::new(model.clone())
    }

    #[tokio::test]
    async fn test_analyze_fit_declares_schema_and_parses() {
        let model = ScriptedModel::new();
        model.push_text(
            r#"{"fitScore": 82, "summary": "Strong React match.", "pros": ["React", "TypeScript"], "cons": ["No Tailwind"]}"#,
        );

        let analysis = assistant(&model)
            .analyze_fit("Needs React", "React dev")
            .await
            .unwrap();
        assert_eq!(analysis.fit_score, 82);
        assert_eq!(analysis.pros.len(), 2);

        let request = model.last_request().unwrap();
        assert!(request.response_schema.is_some());
        assert!(!request.web_search);
        let prompt = request.prompt_text();
        assert!(prompt.contains("JOB DESCRIPTION:\n---\nNeeds React\n---"));
        assert!(prompt.contains("RESUME:\n---\nReact dev\n---"));
    }

    #[tokio::test]
    async fn test_fit_score_is_not_clamped() {
        let model = ScriptedModel::new();
        model.push_text(r#"{"fitScore": 140, "summary": "", "pros": [], "cons": []}"#);
        let analysis = assistant(&model).analyze_fit("jd", "cv").await.unwrap();
        assert_eq!(analysis.fit_score, 140);
    }

    #[tokio::test]
    async fn test_malformed_json_is_parse_error() {
        let model = ScriptedModel::new();
        model.push_text("Sure! Here is your analysis: great fit.");

        let err = assistant(&model).analyze_fit("jd", "cv").await.unwrap_err();
        assert!(err.is_parse());
        assert_eq!(err.operation(), Operation::AnalyzeFit);
        assert!(!err.to_string().contains("great fit"));
    }

    #[tokio::test]
    async fn test_transport_failure_is_operation_specific() {
        let model = ScriptedModel::new();
        model.push_error(LlmError::Api {
            status: 503,
            message: "overloaded".to_string(),
        });

        let err = assistant(&model).analyze_fit("jd", "cv").await.unwrap_err();
        assert!(!err.is_parse());
        assert_eq!(err.to_string(), "Failed to analyze job fit. Please try again.");
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn test_generate_content_uses_kind_template() {
        let model = ScriptedModel::new();
        model.push_text("- Led a React rebuild");

        let text = assistant(&model)
            .generate_content(ContentKind::ResumeBullets, "jd", "cv")
            .await
            .unwrap();
        assert_eq!(text, "- Led a React rebuild");
        let request = model.last_request().unwrap();
        assert!(request.prompt_text().contains("bullet points"));
        assert_eq!(request.temperature, Some(GENERATION_TEMPERATURE));

        model.push_text("I ship reliable platforms.");
        assistant(&model)
            .generate_content(ContentKind::OutreachPitch, "jd", "cv")
            .await
            .unwrap();
        assert!(model.last_request().unwrap().prompt_text().contains("elevator pitch"));
    }

    #[tokio::test]
    async fn test_blank_generation_is_request_error() {
        let model = ScriptedModel::new();
        model.push_text("   \n");

        let err = assistant(&model)
            .generate_content(ContentKind::CoverLetter, "jd", "cv")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AssistantError::Request {
                source: LlmError::EmptyContent,
                ..
            }
        ));
        assert_eq!(err.to_string(), "Failed to generate the cover letter. Please try again.");
    }

    #[tokio::test]
    async fn test_improve_content_wraps_text() {
        let model = ScriptedModel::new();
        model.push_text("Sharper pitch.");

        let improved = assistant(&model).improve_content("Okay pitch.").await.unwrap();
        assert_eq!(improved, "Sharper pitch.");
        assert!(model.last_request().unwrap().prompt_text().contains("Okay pitch."));
    }

    #[tokio::test]
    async fn test_interview_questions_parse() {
        let model = ScriptedModel::new();
        model.push_text(
            r#"```json
{"questions": [{"type": "Technical", "question": "Explain the virtual DOM.", "tip": "Mention reconciliation."}]}
```"#,
        );

        let prep = assistant(&model)
            .generate_interview_questions("jd", "cv")
            .await
            .unwrap();
        assert_eq!(prep.questions.len(), 1);
        assert_eq!(prep.questions[0].kind, "Technical");
    }

    #[tokio::test]
    async fn test_research_company_appends_sources() {
        let model = ScriptedModel::new();
        model.push(ModelResponse {
            text: "## Overview\nCloudWorks builds infra.".to_string(),
            sources: vec![
                Source {
                    uri: "https://news.example.com/a".to_string(),
                    title: "News A".to_string(),
                },
                Source {
                    uri: "https://news.example.com/a".to_string(),
                    title: "News A again".to_string(),
                },
            ],
        });

        let text = assistant(&model)
            .research_company("CloudWorks", "DevOps Specialist")
            .await
            .unwrap();
        assert!(text.starts_with("## Overview"));
        assert!(text.ends_with("**Sources**\n- [News A](https://news.example.com/a)"));
        let request = model.last_request().unwrap();
        assert!(request.web_search);
        assert!(request.prompt_text().contains("\"CloudWorks\""));
    }

    #[tokio::test]
    async fn test_extract_job_details_uses_web_and_parses() {
        let model = ScriptedModel::new();
        model.push_text(
            r#"{"title": "Backend Engineer", "company": "Acme", "location": "Remote", "description": "Go and Postgres.", "url": "https://acme.example.com/apply/42"}"#,
        );

        let job = assistant(&model)
            .extract_job_details("https://example.com/job/123")
            .await
            .unwrap();
        assert_eq!(job.company, "Acme");
        assert_eq!(job.url, "https://acme.example.com/apply/42");

        let request = model.last_request().unwrap();
        assert!(request.web_search);
        assert!(request.response_schema.is_none());
        assert!(request.prompt_text().contains("https://example.com/job/123"));
    }

    #[tokio::test]
    async fn test_extract_job_details_rejects_non_posting() {
        let model = ScriptedModel::new();
        model.push_text(r#"{"title": "", "company": "", "location": "", "description": "", "url": ""}"#);

        let err = assistant(&model)
            .extract_job_details("https://example.com/about")
            .await
            .unwrap_err();
        assert_eq!(err.operation(), Operation::ExtractJobDetails);
        assert!(!err.is_parse());
    }

    #[tokio::test]
    async fn test_extract_job_details_missing_field_is_parse_error() {
        let model = ScriptedModel::new();
        model.push_text(r#"{"title": "Backend Engineer"}"#);
        let err = assistant(&model)
            .extract_job_details("https://example.com/job/1")
            .await
            .unwrap_err();
        assert!(err.is_parse());
    }

    #[test]
    fn test_extracted_job_keeps_requested_url_when_blank() {
        let job = ExtractedJob {
            title: "Engineer".to_string(),
            company: "Acme".to_string(),
            location: String::new(),
            description: String::new(),
            url: " ".to_string(),
        };
        assert_eq!(job.into_draft("https://example.com/job/9").url, "https://example.com/job/9");
    }

    #[tokio::test]
    async fn test_extract_text_sends_inline_file() {
        let model = ScriptedModel::new();
        model.push_text("Jane Doe\nEngineer");

        let upload = FileUpload::new("cv.pdf", None, bytes::Bytes::from_static(b"%PDF-1.7"));
        let text = assistant(&model).extract_text_from_file(&upload).await.unwrap();
        assert_eq!(text, "Jane Doe\nEngineer");

        let request = model.last_request().unwrap();
        assert!(request.parts.iter().any(|p| matches!(
            p,
            Part::InlineData { mime_type, .. } if mime_type == "application/pdf"
        )));
    }

    #[tokio::test]
    async fn test_chat_includes_preferences_and_dedups_sources() {
        let model = ScriptedModel::new();
        let source = |uri: &str| Source {
            uri: uri.to_string(),
            title: uri.to_string(),
        };
        model.push(ModelResponse {
            text: "Here are two openings.".to_string(),
            sources: vec![source("https://a.example"), source("https://b.example"), source("https://a.example")],
        });

        let reply = assistant(&model)
            .send_message_to_bot("find rust jobs", Some("Remote only"))
            .await
            .unwrap();
        assert_eq!(reply.sources.len(), 2);
        assert_eq!(reply.sources[0].uri, "https://a.example");
        assert_eq!(reply.sources[1].uri, "https://b.example");

        let request = model.last_request().unwrap();
        assert!(request.web_search);
        assert_eq!(request.thinking_budget, Some(0));
        assert!(request.prompt_text().contains("Remote only"));
    }

    #[tokio::test]
    async fn test_chat_without_preferences_omits_section() {
        let model = ScriptedModel::new();
        model.push_text("Hi!");
        assistant(&model).send_message_to_bot("hello", Some("  ")).await.unwrap();
        assert!(!model
            .last_request()
            .unwrap()
            .prompt_text()
            .contains(CHAT_PREFERENCES_PROMPT));
    }

    #[test]
    fn test_summarize_fit_formats_sections() {
        let text = summarize_fit(&FitAnalysis {
            fit_score: 75,
            summary: "Good overlap.".to_string(),
            pros: vec!["React".to_string()],
            cons: vec![],
        });
        assert!(text.starts_with("Fit Score: 75/100"));
        assert!(text.contains("Strengths:\n- React"));
        assert!(text.contains("Potential Gaps:\n- (none)"));
    }
}
