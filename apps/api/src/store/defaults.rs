//! Seed values used when a document has never been written.

use uuid::Uuid;

use crate::models::{Application, ApplicationStatus, JobDraft};

pub const SAMPLE_RESUME: &str = "\
Jordan Lee
Senior Frontend Engineer

Summary:
Frontend engineer with 8 years building responsive, accessible web applications.
Strong in React, TypeScript and design systems; cares about clean code and user experience.

Experience:
- Lead Frontend Developer, Tech Solutions (2018-Present)
  - Led the rebuild of an e-commerce storefront in React and Redux, cutting page load time by 35%.
  - Mentored four junior developers and ran the team's code review rotation.
- Frontend Developer, WebCrafters (2015-2018)
  - Built and maintained client sites with Angular and jQuery.

Skills:
- Languages: JavaScript, TypeScript, HTML, CSS
- Frameworks: React, Redux, Next.js, Tailwind CSS
- Tools: Git, Webpack, Docker
";

pub const SAMPLE_PREFERENCES: &str = "\
Looking for senior frontend or full-stack roles.
Remote or hybrid in the US. Product-focused teams, mid-size companies preferred.
Interested in developer tools, climate tech and education.";

struct Seed {
    title: &'static str,
    company: &'static str,
    location: &'static str,
    description: &'static str,
    status: ApplicationStatus,
}

const SEEDS: &[Seed] = &[
    Seed {
        title: "Senior Frontend Engineer",
        company: "Innovate Inc.",
        location: "Remote",
        description: "Build and maintain our user-facing web applications. \
            Required: React, TypeScript, Tailwind CSS, 5+ years of experience.",
        status: ApplicationStatus::Discovery,
    },
    Seed {
        title: "Product Designer",
        company: "Creative Solutions",
        location: "New York, NY",
        description: "Design product experiences end to end. \
            Key skills: Figma, UI/UX principles, user research. A strong portfolio is expected.",
        status: ApplicationStatus::Discovery,
    },
    Seed {
        title: "AI/ML Engineer",
        company: "DataDriven AI",
        location: "San Francisco, CA",
        description: "Join our applied ML team. Python, TensorFlow and PyTorch experience is a must.",
        status: ApplicationStatus::Applied,
    },
    Seed {
        title: "DevOps Specialist",
        company: "CloudWorks",
        location: "Austin, TX",
        description: "Own CI/CD pipelines, automation and monitoring. \
            AWS, Docker and Kubernetes required.",
        status: ApplicationStatus::Interview,
    },
];

/// Sample board shown on first launch. Ids are stable across calls.
pub fn sample_applications() -> Vec<Application> {
    SEEDS
        .iter()
        .enumerate()
        .map(|(i, seed)| {
            let job = JobDraft {
                title: seed.title.to_string(),
                company: seed.company.to_string(),
                location: seed.location.to_string(),
                description: seed.description.to_string(),
                url: String::new(),
                logo: None,
            }
            .into_job(Uuid::from_u128(i as u128 + 1));
            let mut app = Application::new(job);
            app.status = seed.status;
            app
        })
        .collect()
}
