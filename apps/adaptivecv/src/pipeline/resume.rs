//! Assembly rules for the tailored resume JSON.

use serde_json::{json, Value};

use super::{prompt_json, prompts, StageError};

const MAX_SKILL_ITEMS: usize = 5;

/// A resume section rewritten by one model call.
pub struct ResumeSection {
    pub key: &'static str,
    pub template: &'static str,
    pub schema: &'static str,
}

/// Sections in the order they are generated and written.
pub const SECTIONS: &[ResumeSection] = &[
    ResumeSection {
        key: "work_experience",
        template: prompts::WORK_EXPERIENCE,
        schema: prompts::WORK_EXPERIENCE_SCHEMA,
    },
    ResumeSection {
        key: "projects",
        template: prompts::PROJECTS,
        schema: prompts::PROJECTS_SCHEMA,
    },
    ResumeSection {
        key: "skill_section",
        template: prompts::SKILLS,
        schema: prompts::SKILLS_SCHEMA,
    },
    ResumeSection {
        key: "education",
        template: prompts::EDUCATION,
        schema: prompts::EDUCATION_SCHEMA,
    },
    ResumeSection {
        key: "certifications",
        template: prompts::CERTIFICATIONS,
        schema: prompts::CERTIFICATIONS_SCHEMA,
    },
    ResumeSection {
        key: "achievements",
        template: prompts::ACHIEVEMENTS,
        schema: prompts::ACHIEVEMENTS_SCHEMA,
    },
];

impl ResumeSection {
    /// Prompt for this section given the candidate's data and the job.
    pub fn prompt(&self, user: &Value, job_description: &str) -> Result<String, StageError> {
        let section_data = user.get(self.key).cloned().unwrap_or_else(|| json!({}));
        let section_data = prompt_json(&section_data, self.key)?;
        Ok(prompts::section_prompt(
            self.template,
            self.schema,
            &section_data,
            job_description,
        ))
    }

    /// The usable part of a model reply, or `None` when the reply has
    /// nothing under this section's key.
    pub fn accept(&self, reply: &Value) -> Option<Value> {
        let value = reply.get(self.key).filter(|v| !is_blank(v))?;
        if self.key == "skill_section" {
            let skills = limit_skills(value);
            (!skills.is_empty()).then(|| Value::Array(skills))
        } else {
            Some(value.clone())
        }
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Drops skill groups without items and keeps at most five items per group.
pub fn limit_skills(groups: &Value) -> Vec<Value> {
    groups
        .as_array()
        .map(|groups| {
            groups
                .iter()
                .filter_map(|group| {
                    let items = group.get("items")?.as_array()?;
                    if items.is_empty() {
                        return None;
                    }
                    Some(json!({
                        "title": group.get("title").cloned().unwrap_or(Value::Null),
                        "items": items.iter().take(MAX_SKILL_ITEMS).cloned().collect::<Vec<_>>(),
                    }))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// The `personal` block: name, contact details and the GitHub/LinkedIn
/// links copied from the candidate's data.
pub fn personal_section(user: &Value) -> Value {
    let field = |key: &str| user.get(key).cloned().unwrap_or(Value::Null);
    let profile = |key: &str| {
        user.get("media_profiles")
            .and_then(|p| p.get(key))
            .cloned()
            .unwrap_or(Value::Null)
    };

    json!({
        "full_name": field("full_name"),
        "contact_number": field("contact_number"),
        "email_address": field("email_address"),
        "github": profile("github"),
        "linkedin": profile("linkedin"),
    })
}

/// The job's keywords as one comma-separated string.
pub fn keywords_line(job: &Value) -> String {
    job.get("keywords")
        .and_then(Value::as_array)
        .map(|keywords| {
            keywords
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(key: &str) -> &'static ResumeSection {
        SECTIONS.iter().find(|s| s.key == key).unwrap()
    }

    #[test]
    fn test_section_order() {
        let keys: Vec<_> = SECTIONS.iter().map(|s| s.key).collect();
        assert_eq!(
            keys,
            vec![
                "work_experience",
                "projects",
                "skill_section",
                "education",
                "certifications",
                "achievements"
            ]
        );
    }

    #[test]
    fn test_limit_skills() {
        let groups = json!([
            {"title": "Languages", "items": ["a", "b", "c", "d", "e", "f", "g"]},
            {"title": "Empty", "items": []},
            {"title": "Missing"},
            {"title": "Cloud", "items": ["aws"]}
        ]);
        assert_eq!(
            limit_skills(&groups),
            vec![
                json!({"title": "Languages", "items": ["a", "b", "c", "d", "e"]}),
                json!({"title": "Cloud", "items": ["aws"]}),
            ]
        );
    }

    #[test]
    fn test_accept_requires_section_key() {
        let achievements = section("achievements");
        assert!(achievements.accept(&json!({"other": ["x"]})).is_none());
        assert!(achievements.accept(&json!({"achievements": []})).is_none());
        assert_eq!(
            achievements.accept(&json!({"achievements": ["Won"]})),
            Some(json!(["Won"]))
        );
    }

    #[test]
    fn test_accept_skills_with_only_empty_groups() {
        let skills = section("skill_section");
        let reply = json!({"skill_section": [{"title": "X", "items": []}]});
        assert!(skills.accept(&reply).is_none());
    }

    #[test]
    fn test_personal_section() {
        let user = json!({
            "full_name": "Jordan",
            "email_address": "j@example.com",
            "media_profiles": {"github": "gh", "linkedin": "li", "medium": "m"},
            "work_experience": []
        });
        let personal = personal_section(&user);
        let keys: Vec<_> = personal.as_object().unwrap().keys().cloned().collect();
        assert_eq!(
            keys,
            vec!["full_name", "contact_number", "email_address", "github", "linkedin"]
        );
        assert_eq!(personal["contact_number"], Value::Null);
        assert_eq!(personal["github"], "gh");
        assert_eq!(personal["linkedin"], "li");
        assert!(personal.get("medium").is_none());
    }

    #[test]
    fn test_keywords_line() {
        assert_eq!(
            keywords_line(&json!({"keywords": ["Rust", "gRPC", 3, "AWS"]})),
            "Rust, gRPC, AWS"
        );
        assert_eq!(keywords_line(&json!({})), "");
    }

    #[test]
    fn test_prompt_embeds_user_section() {
        let user = json!({"achievements": ["Shipped v1"]});
        let prompt = section("achievements").prompt(&user, "Job text").unwrap();
        assert!(prompt.contains("Shipped v1"));
        assert!(prompt.contains("Job text"));
    }
}
