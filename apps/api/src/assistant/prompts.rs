// Prompt templates for every assistant flow.
// Placeholders in braces are substituted with `str::replace` before sending.

pub const FIT_ANALYSIS_PROMPT: &str = r#"Analyze the following job description against the provided resume.
Provide a "fit score" from 0 to 100 representing how well the candidate's resume matches the job requirements.
Provide a concise one-sentence summary of the fit.
List 3-5 key qualifications from the resume that match the job description (pros).
List 3-5 potential gaps or areas where the resume is weaker for this specific role (cons).

{job_description}

{resume}"#;

pub const COVER_LETTER_PROMPT: &str = r#"Based on the following resume and job description, write a professional, concise, and compelling cover letter.
The tone should be confident but not arrogant. Highlight the skills and experiences from the resume that are most relevant to the job.
Keep it to 3-4 paragraphs.

{job_description}

{resume}"#;

pub const RESUME_BULLETS_PROMPT: &str = r#"Analyze the provided resume and job description. Generate 3-5 tailored resume bullet points that highlight the most relevant skills and experiences for this specific job.
Each bullet point should start with an action verb and be achievement-oriented.
Format the output as a markdown list.

{job_description}

{resume}"#;

pub const OUTREACH_PITCH_PROMPT: &str = r#"Based on the resume and job description, write a short and effective "elevator pitch" (2-3 sentences).
It will be used in an outreach email or a LinkedIn message to a recruiter, and should quickly summarize the candidate's value for this role.

{job_description}

{resume}"#;

pub const IMPROVE_CONTENT_PROMPT: &str = r#"Improve the following text. Make it more impactful, professional and concise while keeping its core meaning and facts unchanged.
Return only the improved text, with no preamble or commentary.

{content}"#;

pub const INTERVIEW_QUESTIONS_PROMPT: &str = r#"Act as an experienced hiring manager for this role.
Based on the job description and the candidate's resume, write 5-7 likely interview questions.
Mix behavioral, technical and role-specific questions. For each, give its type and a short, concrete tip on how this candidate should answer using their own experience.

{job_description}

{resume}"#;

pub const COMPANY_RESEARCH_PROMPT: &str = r#"Research the company "{company}" for a candidate applying to the "{job_title}" role.
Use up-to-date web information. Write a concise markdown briefing with these sections:
- Overview (what the company does, size, stage)
- Recent news
- Culture and values
- Talking points for an interview for this role
Cite your sources inline."#;

pub const EXTRACT_JOB_PROMPT: &str = r#"Visit the following job posting URL and extract the job details.

URL: {url}

Return a JSON object with this EXACT schema:
{
  "title": "job title",
  "company": "hiring company name",
  "location": "job location, or Remote",
  "description": "the full job description as plain text",
  "url": "the direct application link if the page offers an Apply link, otherwise the URL above"
}

If the page is not a job posting, return the same object with every field set to an empty string.

{json_only}"#;

pub const EXTRACT_TEXT_PROMPT: &str = "Extract all of the text content from the attached document. \
Preserve the reading order and section structure. Return only the extracted text, with no commentary.";

pub const CHAT_SYSTEM_PROMPT: &str = r#"You are Career Companion, a friendly and practical job-search assistant.
You help with finding job openings, career advice, resumes, cover letters and interview preparation.
When the user asks for job openings, search the web and list concrete, currently open postings with their company and location.
Keep answers concise and actionable."#;

pub const CHAT_PREFERENCES_PROMPT: &str = "Take the user's career preferences into account:";
