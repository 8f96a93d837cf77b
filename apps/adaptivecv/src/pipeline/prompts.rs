// Prompt templates for the document pipeline.
// Placeholders are `{name}` and are filled with `render`.

/// Substitutes each `{name}` placeholder in `template` with its value.
pub fn render(template: &str, values: &[(&str, &str)]) -> String {
    values
        .iter()
        .fold(template.to_string(), |acc, (name, value)| {
            acc.replace(&format!("{{{name}}}"), value)
        })
}

// ── Structured extraction ───────────────────────────────────────────────────

pub const JOB_DETAILS_EXTRACTOR: &str = "\
<task>
Extract the information a candidate needs to tailor a resume to this job posting.
</task>

<job_description>
{job_description}
</job_description>

<focus>
- Keywords: concrete skills, tools and measurable competencies first.
- Core duties and responsibilities.
- Required and preferred qualifications, kept apart.
- Be concise; do not invent requirements the posting does not state.
</focus>

{format_instructions}
";

pub const JOB_DETAILS_SCHEMA: &str = r#"{
  "title": "string, job title",
  "goal": "string, what the role exists to achieve",
  "company_name": "string",
  "company_info": "string, short company summary",
  "keywords": ["string"],
  "duty_responsibility": ["string"],
  "required_qualification": ["string"],
  "preferred_qualification": ["string"]
}"#;

pub const RESUME_DETAILS_EXTRACTOR: &str = "\
<task>
Parse this plain-text resume into structured JSON.
</task>

<resume_text>
{resume_text}
</resume_text>

<steps>
1. Find every section: contact details, summary, work experience, education, projects, skills, certifications, achievements.
2. Map titles, employers, dates and bullet points to the right fields; normalise dates like \"Sep 2021\".
3. Cope with unusual layouts, missing headings and out-of-order sections.
4. Use null or empty arrays for anything the resume does not contain.
</steps>

{format_instructions}
";

pub const RESUME_SCHEMA: &str = r#"{
  "full_name": "string",
  "summary": "string or null",
  "contact_number": "string",
  "email_address": "string",
  "media_profiles": {"linkedin": "url or null", "github": "url or null", "medium": "url or null", "devpost": "url or null"},
  "work_experience": [{"position": "string", "employer": "string", "location": "string", "start": "string", "end": "string", "contributions": ["string"]}],
  "education": [{"degree": "string", "institution": "string", "start": "string", "end": "string", "coursework": ["string"]}],
  "skill_section": [{"title": "string", "items": ["string"]}],
  "projects": [{"title": "string", "category": "string or null", "repo_url": "string", "resources": [{"label": "string", "url": "string"}], "start": "string", "end": "string", "highlights": ["string"]}],
  "certifications": [{"title": "string", "issuer": "string", "url": "string"}],
  "achievements": ["string"]
}"#;

// ── Cover letter ────────────────────────────────────────────────────────────

pub const COVER_LETTER_GENERATOR: &str = "\
<task>
Write a short, persuasive cover letter that connects my background to this job and company.
</task>

<job_description>
{job_description}
</job_description>

<my_background>
{my_work_information}
</my_background>

<guidelines>
- Open with why this role and company, then a compact bullet list of matching qualifications.
- Mention one or two concrete achievements that map to the job's needs.
- Stay between 250 and 300 words; professional but with some personality.
- Do not paste resume lines verbatim; add context instead.

Format:
Dear Hiring Manager,

[Letter body]

Sincerely,
[My name from the background JSON]
</guidelines>
";

// ── Resume sections ─────────────────────────────────────────────────────────

const SECTION_GUIDELINES: &str = "\
<guidelines>
- Keep only what is relevant to the job description and order it by relevance.
- Rephrase with strong action verbs, active voice and quantified impact.
- Stay consistent with the candidate's real background.
</guidelines>";

pub const WORK_EXPERIENCE: &str = "\
<task>
Rewrite the 'work_experience' resume section so it targets the job description.
</task>

<work_experience>
{section_data}
</work_experience>

<job_description>
{job_description}
</job_description>

{section_guidelines}
- Give each role three contributions that echo the job's keywords.

{format_instructions}
";

pub const WORK_EXPERIENCE_SCHEMA: &str = r#"{"work_experience": [{"position": "string", "employer": "string", "location": "string", "start": "string", "end": "string", "contributions": ["string"]}]}"#;

pub const PROJECTS: &str = "\
<task>
Select and rewrite the 'projects' resume section for the job description.
</task>

<projects>
{section_data}
</projects>

<job_description>
{job_description}
</job_description>

{section_guidelines}
- At most three projects, each with three highlights.

{format_instructions}
";

pub const PROJECTS_SCHEMA: &str = r#"{"projects": [{"title": "string", "category": "string or null", "repo_url": "string", "resources": [{"label": "string", "url": "string"}], "start": "string", "end": "string", "highlights": ["string"]}]}"#;

pub const SKILLS: &str = "\
<task>
Build the 'skill_section' of the resume, grouped by category, aligned with the job description.
</task>

<skills>
{section_data}
</skills>

<job_description>
{job_description}
</job_description>

{section_guidelines}
- Put the job's required tools and technologies first in each group.

{format_instructions}
";

pub const SKILLS_SCHEMA: &str =
    r#"{"skill_section": [{"title": "string, e.g. Programming Languages", "items": ["string"]}]}"#;

pub const EDUCATION: &str = "\
<task>
Produce the 'education' resume section, highlighting coursework relevant to the job description.
</task>

<education>
{section_data}
</education>

<job_description>
{job_description}
</job_description>

{section_guidelines}

{format_instructions}
";

pub const EDUCATION_SCHEMA: &str = r#"{"education": [{"degree": "string", "institution": "string", "start": "string", "end": "string", "coursework": ["string"]}]}"#;

pub const CERTIFICATIONS: &str = "\
<task>
Produce the 'certifications' resume section, keeping the credentials closest to the job description.
</task>

<certifications>
{section_data}
</certifications>

<job_description>
{job_description}
</job_description>

{section_guidelines}

{format_instructions}
";

pub const CERTIFICATIONS_SCHEMA: &str =
    r#"{"certifications": [{"title": "string", "issuer": "string", "url": "string"}]}"#;

pub const ACHIEVEMENTS: &str = "\
<task>
Produce the 'achievements' resume section, emphasising results that matter for the job description.
</task>

<achievements>
{section_data}
</achievements>

<job_description>
{job_description}
</job_description>

{section_guidelines}

{format_instructions}
";

pub const ACHIEVEMENTS_SCHEMA: &str = r#"{"achievements": ["string"]}"#;

/// Fills a section template.
pub fn section_prompt(
    template: &str,
    schema: &str,
    section_data: &str,
    job_description: &str,
) -> String {
    let format_instructions = crate::llm_client::prompts::format_instructions(schema);
    render(
        template,
        &[
            ("section_guidelines", SECTION_GUIDELINES),
            ("section_data", section_data),
            ("job_description", job_description),
            ("format_instructions", &format_instructions),
        ],
    )
}
