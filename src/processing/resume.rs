//! Canonical structured resume model
//!
//! Every field is optional; sequence entries are only kept when at least one
//! field survives sentinel-stripping.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub linkedin: Option<String>,
    pub github: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    pub company: Option<String>,
    pub role: Option<String>,
    pub location: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub is_current: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Education {
    pub institution: Option<String>,
    pub degree: Option<String>,
    pub field_of_study: Option<String>,
    pub location: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub gpa: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub is_current: bool,
}

/// A named group of free-text skill keywords.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillGroup {
    pub category: Option<String>,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub name: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Certification {
    pub name: Option<String>,
    pub issuer: Option<String>,
    pub date: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Involvement {
    pub organization: Option<String>,
    pub role: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub is_current: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Coursework {
    pub name: Option<String>,
    pub institution: Option<String>,
    pub date: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Publication {
    pub title: Option<String>,
    pub publisher: Option<String>,
    pub date: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Award {
    pub title: Option<String>,
    pub issuer: Option<String>,
    pub date: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LanguageSkill {
    pub language: Option<String>,
    pub proficiency: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredResume {
    pub contact: ContactInfo,
    pub summary: Option<String>,
    pub experience: Vec<Experience>,
    pub education: Vec<Education>,
    pub skills: Vec<SkillGroup>,
    pub projects: Vec<Project>,
    pub certifications: Vec<Certification>,
    pub involvement: Vec<Involvement>,
    pub coursework: Vec<Coursework>,
    pub publications: Vec<Publication>,
    pub awards: Vec<Award>,
    pub languages: Vec<LanguageSkill>,
}

/// Retention check for sequence entries: an entry is kept only when at least
/// one of its string fields is non-empty.
pub trait HasContent {
    fn has_content(&self) -> bool;
}

fn any(fields: &[&Option<String>]) -> bool {
    fields.iter().any(|f| f.as_deref().is_some_and(|s| !s.trim().is_empty()))
}

impl HasContent for Experience {
    fn has_content(&self) -> bool {
        any(&[
            &self.company,
            &self.role,
            &self.location,
            &self.start_date,
            &self.end_date,
            &self.description,
        ])
    }
}

impl HasContent for Education {
    fn has_content(&self) -> bool {
        any(&[
            &self.institution,
            &self.degree,
            &self.field_of_study,
            &self.location,
            &self.start_date,
            &self.end_date,
            &self.gpa,
            &self.description,
        ])
    }
}

impl HasContent for SkillGroup {
    fn has_content(&self) -> bool {
        any(&[&self.category]) || self.keywords.iter().any(|k| !k.trim().is_empty())
    }
}

impl HasContent for Project {
    fn has_content(&self) -> bool {
        any(&[&self.name, &self.description, &self.url, &self.start_date, &self.end_date])
    }
}

impl HasContent for Certification {
    fn has_content(&self) -> bool {
        any(&[&self.name, &self.issuer, &self.date, &self.url])
    }
}

impl HasContent for Involvement {
    fn has_content(&self) -> bool {
        any(&[
            &self.organization,
            &self.role,
            &self.start_date,
            &self.end_date,
            &self.description,
        ])
    }
}

impl HasContent for Coursework {
    fn has_content(&self) -> bool {
        any(&[&self.name, &self.institution, &self.date, &self.description])
    }
}

impl HasContent for Publication {
    fn has_content(&self) -> bool {
        any(&[&self.title, &self.publisher, &self.date, &self.url, &self.description])
    }
}

impl HasContent for Award {
    fn has_content(&self) -> bool {
        any(&[&self.title, &self.issuer, &self.date, &self.description])
    }
}

impl HasContent for LanguageSkill {
    fn has_content(&self) -> bool {
        any(&[&self.language, &self.proficiency])
    }
}

impl StructuredResume {
    /// Flattened, order-preserving list of every skill keyword.
    pub fn skill_keywords(&self) -> Vec<String> {
        self.skills
            .iter()
            .flat_map(|g| g.keywords.iter())
            .filter(|k| !k.trim().is_empty())
            .map(|k| k.trim().to_string())
            .collect()
    }

    /// True when no field anywhere holds content.
    pub fn is_empty(&self) -> bool {
        self == &StructuredResume::default()
    }

    /// Render the resume back to plain text for keyword matching after the
    /// original document bytes are gone.
    pub fn to_plain_text(&self) -> String {
        let mut out = String::new();
        fn push(out: &mut String, v: &Option<String>) {
            if let Some(s) = v.as_deref() {
                if !s.trim().is_empty() {
                    out.push_str(s.trim());
                    out.push('\n');
                }
            }
        }

        push(&mut out, &self.contact.name);
        push(&mut out, &self.contact.email);
        push(&mut out, &self.contact.phone);
        push(&mut out, &self.summary);

        for exp in &self.experience {
            push(&mut out, &exp.company);
            push(&mut out, &exp.role);
            push(&mut out, &exp.description);
        }
        for edu in &self.education {
            push(&mut out, &edu.institution);
            push(&mut out, &edu.degree);
            push(&mut out, &edu.field_of_study);
        }
        for group in &self.skills {
            push(&mut out, &group.category);
            for keyword in &group.keywords {
                out.push_str(keyword);
                out.push('\n');
            }
        }
        for project in &self.projects {
            push(&mut out, &project.name);
            push(&mut out, &project.description);
        }
        for cert in &self.certifications {
            push(&mut out, &cert.name);
            push(&mut out, &cert.issuer);
        }
        for item in &self.involvement {
            push(&mut out, &item.organization);
            push(&mut out, &item.role);
            push(&mut out, &item.description);
        }
        for course in &self.coursework {
            push(&mut out, &course.name);
        }
        for publication in &self.publications {
            push(&mut out, &publication.title);
        }
        for award in &self.awards {
            push(&mut out, &award.title);
        }
        for language in &self.languages {
            push(&mut out, &language.language);
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_entry_has_no_content() {
        assert!(!Experience::default().has_content());
        assert!(!Education::default().has_content());
        assert!(!SkillGroup::default().has_content());
    }

    #[test]
    fn test_is_current_alone_is_not_content() {
        let exp = Experience { is_current: true, ..Default::default() };
        assert!(!exp.has_content());
    }

    #[test]
    fn test_whitespace_only_is_not_content() {
        let exp = Experience { company: Some("   ".to_string()), ..Default::default() };
        assert!(!exp.has_content());
    }

    #[test]
    fn test_skill_keywords_flatten_in_order() {
        let resume = StructuredResume {
            skills: vec![
                SkillGroup {
                    category: Some("Languages".to_string()),
                    keywords: vec!["Rust".to_string(), "Python".to_string()],
                },
                SkillGroup {
                    category: None,
                    keywords: vec!["Docker".to_string()],
                },
            ],
            ..Default::default()
        };
        assert_eq!(resume.skill_keywords(), vec!["Rust", "Python", "Docker"]);
    }

    #[test]
    fn test_plain_text_includes_all_sections() {
        let resume = StructuredResume {
            contact: ContactInfo { name: Some("Jane Doe".to_string()), ..Default::default() },
            summary: Some("Systems engineer".to_string()),
            experience: vec![Experience {
                company: Some("Acme".to_string()),
                description: Some("Built pipelines".to_string()),
                ..Default::default()
            }],
            skills: vec![SkillGroup {
                category: None,
                keywords: vec!["kubernetes".to_string()],
            }],
            ..Default::default()
        };
        let text = resume.to_plain_text();
        assert!(text.contains("Jane Doe"));
        assert!(text.contains("Acme"));
        assert!(text.contains("kubernetes"));
    }
}
