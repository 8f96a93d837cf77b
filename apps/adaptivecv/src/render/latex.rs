//! LaTeX sources for the resume and cover letter.

use std::fmt::Write as _;

use serde_json::Value;

const PREAMBLE: &str = r"\documentclass[11pt,letterpaper]{article}
\usepackage[margin=0.7in]{geometry}
\usepackage[T1]{fontenc}
\usepackage{enumitem}
\usepackage[hidelinks]{hyperref}
\setlist[itemize]{leftmargin=*,itemsep=1pt,topsep=2pt}
\setlength{\parindent}{0pt}
\pagestyle{empty}
";

/// Escapes the characters LaTeX treats specially.
pub fn latex_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str(r"\&"),
            '%' => out.push_str(r"\%"),
            '$' => out.push_str(r"\$"),
            '#' => out.push_str(r"\#"),
            '_' => out.push_str(r"\_"),
            '{' => out.push_str(r"\{"),
            '}' => out.push_str(r"\}"),
            '~' => out.push_str(r"\textasciitilde{}"),
            '^' => out.push_str(r"\^{}"),
            '\\' => out.push_str(r"\textbackslash{}"),
            '\n' => out.push_str("\\newline%\n"),
            '-' => out.push_str("{-}"),
            '\u{a0}' => out.push('~'),
            '[' => out.push_str("{[}"),
            ']' => out.push_str("{]}"),
            other => out.push(other),
        }
    }
    out
}

/// Escapes every string inside a JSON value, recursively.
pub fn escape_value(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(latex_escape(s)),
        Value::Array(items) => Value::Array(items.iter().map(escape_value).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), escape_value(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn text<'a>(value: &'a Value, key: &str) -> &'a str {
    value.get(key).and_then(Value::as_str).unwrap_or_default()
}

fn strings<'a>(value: &'a Value, key: &str) -> Vec<&'a str> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

fn entries<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn itemize(out: &mut String, items: &[&str]) {
    if items.is_empty() {
        return;
    }
    out.push_str("\\begin{itemize}\n");
    for item in items {
        let _ = writeln!(out, "  \\item {item}");
    }
    out.push_str("\\end{itemize}\n");
}

fn heading(out: &mut String, title: &str) {
    let _ = writeln!(out, "\n\\section*{{{title}}}\\vspace{{-6pt}}\\hrule\\vspace{{4pt}}");
}

fn dates(entry: &Value) -> String {
    match (text(entry, "start"), text(entry, "end")) {
        ("", "") => String::new(),
        (start, "") => start.to_string(),
        ("", end) => end.to_string(),
        (start, end) => format!("{start} -- {end}"),
    }
}

/// LaTeX source for a resume JSON document.
pub fn resume_tex(resume: &Value) -> String {
    let resume = escape_value(resume);
    let mut out = String::from(PREAMBLE);
    out.push_str("\\begin{document}\n");
    let personal = resume.get("personal").unwrap_or(&Value::Null);

    let _ = writeln!(
        out,
        "\\begin{{center}}{{\\LARGE\\bfseries {}}}\\\\[2pt]",
        text(personal, "full_name")
    );
    let contact: Vec<&str> = [
        text(personal, "contact_number"),
        text(personal, "email_address"),
        text(personal, "github"),
        text(personal, "linkedin"),
    ]
    .into_iter()
    .filter(|s| !s.is_empty())
    .collect();
    let _ = writeln!(out, "{}\n\\end{{center}}", contact.join(" $|$ "));

    let work = entries(&resume, "work_experience");
    if !work.is_empty() {
        heading(&mut out, "Experience");
        for job in work {
            let _ = writeln!(
                out,
                "\\textbf{{{}}}, {} \\hfill {}\\\\\n\\textit{{{}}}",
                text(job, "position"),
                text(job, "employer"),
                dates(job),
                text(job, "location")
            );
            itemize(&mut out, &strings(job, "contributions"));
        }
    }

    let projects = entries(&resume, "projects");
    if !projects.is_empty() {
        heading(&mut out, "Projects");
        for project in projects {
            let _ = writeln!(
                out,
                "\\textbf{{{}}} \\hfill {}\\\\",
                text(project, "title"),
                dates(project)
            );
            itemize(&mut out, &strings(project, "highlights"));
        }
    }

    let skills = entries(&resume, "skill_section");
    if !skills.is_empty() {
        heading(&mut out, "Skills");
        for group in skills {
            let _ = writeln!(
                out,
                "\\textbf{{{}:}} {}\\\\",
                text(group, "title"),
                strings(group, "items").join(", ")
            );
        }
    }

    let education = entries(&resume, "education");
    if !education.is_empty() {
        heading(&mut out, "Education");
        for school in education {
            let _ = writeln!(
                out,
                "\\textbf{{{}}}, {} \\hfill {}\\\\",
                text(school, "degree"),
                text(school, "institution"),
                dates(school)
            );
            let coursework = strings(school, "coursework");
            if !coursework.is_empty() {
                let _ = writeln!(out, "Coursework: {}\\\\", coursework.join(", "));
            }
        }
    }

    let certifications = entries(&resume, "certifications");
    if !certifications.is_empty() {
        heading(&mut out, "Certifications");
        let items: Vec<String> = certifications
            .iter()
            .map(|c| format!("{}, {}", text(c, "title"), text(c, "issuer")))
            .collect();
        itemize(&mut out, &items.iter().map(String::as_str).collect::<Vec<_>>());
    }

    let achievements = strings(&resume, "achievements");
    if !achievements.is_empty() {
        heading(&mut out, "Achievements");
        itemize(&mut out, &achievements);
    }

    out.push_str("\\end{document}\n");
    out
}

/// LaTeX source for a plain-text cover letter; blank lines separate paragraphs.
pub fn letter_tex(letter: &str) -> String {
    let mut out = String::from(PREAMBLE);
    out.push_str("\\begin{document}\n");
    for paragraph in letter.split("\n\n").map(str::trim).filter(|p| !p.is_empty()) {
        out.push_str(&latex_escape(paragraph));
        out.push_str("\n\n");
    }
    out.push_str("\\end{document}\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_latex_escape_specials() {
        assert_eq!(latex_escape("R&D 100%"), r"R\&D 100\%");
        assert_eq!(latex_escape("a_b{c}"), r"a\_b\{c\}");
        assert_eq!(latex_escape("~^\\"), r"\textasciitilde{}\^{}\textbackslash{}");
        assert_eq!(latex_escape("[x]-y"), "{[}x{]}{-}y");
        assert_eq!(latex_escape("a\u{a0}b"), "a~b");
        assert_eq!(latex_escape("one\ntwo"), "one\\newline%\ntwo");
    }

    #[test]
    fn test_escape_value_recurses() {
        let value = json!({"a": ["$5", {"b": "#1"}], "n": 3});
        assert_eq!(
            escape_value(&value),
            json!({"a": [r"\$5", {"b": r"\#1"}], "n": 3})
        );
    }

    #[test]
    fn test_resume_tex_sections() {
        let resume = json!({
            "personal": {
                "full_name": "Jordan Avery",
                "email_address": "j@example.com",
                "github": "https://github.com/j",
                "linkedin": null
            },
            "work_experience": [{
                "position": "Engineer", "employer": "Acme & Co", "location": "Remote",
                "start": "2021", "end": "Present", "contributions": ["Cut latency 80%"]
            }],
            "skill_section": [{"title": "Languages", "items": ["Rust", "C#"]}],
        });
        let tex = resume_tex(&resume);

        assert!(tex.contains(r"{\LARGE\bfseries Jordan Avery}"));
        assert!(tex.contains(r"j@example.com $|$ https://github.com/j"));
        assert!(tex.contains(r"Acme \& Co"));
        assert!(tex.contains(r"\item Cut latency 80\%"));
        assert!(tex.contains(r"\textbf{Languages:} Rust, C\#"));
        assert!(tex.contains("2021 -- Present"));
        assert!(!tex.contains("Projects"));
        assert!(tex.trim_end().ends_with(r"\end{document}"));
    }

    #[test]
    fn test_letter_tex_paragraphs() {
        let tex = letter_tex("Dear Hiring Manager,\n\nI build things & ship them.\n\nSincerely,\nJ");
        assert!(tex.contains("Dear Hiring Manager,\n\n"));
        assert!(tex.contains(r"I build things \& ship them."));
        assert!(tex.contains("Sincerely,\\newline%\nJ"));
    }
}
