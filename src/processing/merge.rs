//! Two-source extraction reconciliation
//!
//! Embedded metadata is authored deliberately, so it wins wherever it has
//! content; the generated extraction fills the gaps. Sequences switch source
//! wholesale (no per-entry interleaving); skills are the one union.

use crate::flat::key::clean_str;
use crate::processing::resume::{SkillGroup, StructuredResume};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub resume: StructuredResume,
    /// Confidence in the merged record, in [0, 1].
    pub confidence: f32,
}

/// Reconcile embedded metadata with a generated extraction.
pub fn merge(
    metadata: Option<&StructuredResume>,
    generated: &StructuredResume,
    warnings: &[String],
) -> MergeOutcome {
    let empty = StructuredResume::default();
    let meta = metadata.unwrap_or(&empty);

    let resume = StructuredResume {
        contact: crate::processing::resume::ContactInfo {
            name: pick(&meta.contact.name, &generated.contact.name),
            email: pick(&meta.contact.email, &generated.contact.email),
            phone: pick(&meta.contact.phone, &generated.contact.phone),
            city: pick(&meta.contact.city, &generated.contact.city),
            state: pick(&meta.contact.state, &generated.contact.state),
            country: pick(&meta.contact.country, &generated.contact.country),
            linkedin: pick(&meta.contact.linkedin, &generated.contact.linkedin),
            github: pick(&meta.contact.github, &generated.contact.github),
            website: pick(&meta.contact.website, &generated.contact.website),
        },
        summary: pick(&meta.summary, &generated.summary),
        experience: pick_seq(&meta.experience, &generated.experience),
        education: pick_seq(&meta.education, &generated.education),
        skills: merge_skills(&meta.skills, &generated.skills),
        projects: pick_seq(&meta.projects, &generated.projects),
        certifications: pick_seq(&meta.certifications, &generated.certifications),
        involvement: pick_seq(&meta.involvement, &generated.involvement),
        coursework: pick_seq(&meta.coursework, &generated.coursework),
        publications: pick_seq(&meta.publications, &generated.publications),
        awards: pick_seq(&meta.awards, &generated.awards),
        languages: pick_seq(&meta.languages, &generated.languages),
    };

    let confidence = confidence_for(&resume, metadata.is_some(), warnings);

    MergeOutcome { resume, confidence }
}

/// Scalar rule: metadata if non-empty, else generated, else absent.
fn pick(metadata: &Option<String>, generated: &Option<String>) -> Option<String> {
    metadata
        .as_deref()
        .and_then(clean_str)
        .or_else(|| generated.as_deref().and_then(clean_str))
}

/// Sequence rule: metadata's sequence wins in full when non-empty.
fn pick_seq<T: Clone>(metadata: &[T], generated: &[T]) -> Vec<T> {
    if !metadata.is_empty() {
        metadata.to_vec()
    } else {
        generated.to_vec()
    }
}

/// Skills union: metadata groups first, then generated keywords not already
/// present (case-insensitive).
fn merge_skills(metadata: &[SkillGroup], generated: &[SkillGroup]) -> Vec<SkillGroup> {
    let mut groups: Vec<SkillGroup> = metadata.to_vec();
    let mut seen: HashSet<String> = groups
        .iter()
        .flat_map(|g| g.keywords.iter())
        .map(|k| k.trim().to_lowercase())
        .collect();

    for group in generated {
        let fresh: Vec<String> = group
            .keywords
            .iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty() && seen.insert(k.to_lowercase()))
            .collect();
        if fresh.is_empty() {
            continue;
        }

        // Fold into an existing group with the same category when one exists.
        let slot = groups.iter_mut().find(|g| {
            match (&g.category, &group.category) {
                (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
                (None, None) => true,
                _ => false,
            }
        });
        match slot {
            Some(existing) => existing.keywords.extend(fresh),
            None => groups.push(SkillGroup {
                category: group.category.clone(),
                keywords: fresh,
            }),
        }
    }

    groups
}

fn confidence_for(resume: &StructuredResume, had_metadata: bool, warnings: &[String]) -> f32 {
    let mut confidence: f32 = 0.5;
    if had_metadata {
        confidence += 0.3;
    }
    if resume.contact.email.is_some() {
        confidence += 0.05;
    }
    if !resume.experience.is_empty() {
        confidence += 0.05;
    }
    if !resume.education.is_empty() {
        confidence += 0.05;
    }
    if warnings.is_empty() {
        confidence += 0.05;
    }
    confidence.min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::resume::{ContactInfo, Experience};

    fn meta_resume() -> StructuredResume {
        StructuredResume {
            contact: ContactInfo {
                name: Some("Jane Doe".to_string()),
                email: Some("jane@example.com".to_string()),
                ..Default::default()
            },
            summary: Some("Written by hand".to_string()),
            experience: vec![Experience {
                company: Some("Acme".to_string()),
                ..Default::default()
            }],
            skills: vec![SkillGroup {
                category: Some("Languages".to_string()),
                keywords: vec!["Rust".to_string(), "Python".to_string()],
            }],
            ..Default::default()
        }
    }

    fn generated_resume() -> StructuredResume {
        StructuredResume {
            contact: ContactInfo {
                name: Some("J. Doe".to_string()),
                phone: Some("555-123-4567".to_string()),
                ..Default::default()
            },
            summary: Some("Extracted from text".to_string()),
            experience: vec![
                Experience { company: Some("Globex".to_string()), ..Default::default() },
                Experience { company: Some("Initech".to_string()), ..Default::default() },
            ],
            skills: vec![SkillGroup {
                category: Some("Languages".to_string()),
                keywords: vec!["python".to_string(), "Go".to_string()],
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_metadata_scalars_win() {
        let meta = meta_resume();
        let outcome = merge(Some(&meta), &generated_resume(), &[]);
        assert_eq!(outcome.resume.contact.name.as_deref(), Some("Jane Doe"));
        assert_eq!(outcome.resume.summary.as_deref(), Some("Written by hand"));
        // Generated fills the gap metadata left.
        assert_eq!(outcome.resume.contact.phone.as_deref(), Some("555-123-4567"));
    }

    #[test]
    fn test_metadata_sequence_wins_in_full() {
        let meta = meta_resume();
        let outcome = merge(Some(&meta), &generated_resume(), &[]);
        assert_eq!(outcome.resume.experience.len(), 1);
        assert_eq!(outcome.resume.experience[0].company.as_deref(), Some("Acme"));
    }

    #[test]
    fn test_generated_sequence_used_when_metadata_empty() {
        let meta = StructuredResume::default();
        let outcome = merge(Some(&meta), &generated_resume(), &[]);
        assert_eq!(outcome.resume.experience.len(), 2);
    }

    #[test]
    fn test_skills_union_dedups_case_insensitively() {
        let meta = meta_resume();
        let outcome = merge(Some(&meta), &generated_resume(), &[]);
        let keywords = outcome.resume.skill_keywords();
        // Metadata first, then new generated items; "python" appears once.
        assert_eq!(keywords, vec!["Rust", "Python", "Go"]);
    }

    #[test]
    fn test_merge_with_empty_generated_is_identity() {
        let meta = meta_resume();
        let outcome = merge(Some(&meta), &StructuredResume::default(), &[]);
        assert_eq!(outcome.resume, meta);
    }

    #[test]
    fn test_merge_with_no_metadata_is_generated() {
        let generated = generated_resume();
        let outcome = merge(None, &generated, &[]);
        assert_eq!(outcome.resume, generated);
    }

    #[test]
    fn test_confidence_formula() {
        // No metadata, no email, no entries, warnings present: the base.
        let outcome = merge(None, &StructuredResume::default(), &["w".to_string()]);
        assert!((outcome.confidence - 0.5).abs() < f32::EPSILON);

        // Metadata + email + experience + education + clean extraction.
        let full = StructuredResume {
            contact: ContactInfo { email: Some("a@b.com".to_string()), ..Default::default() },
            experience: vec![Experience { company: Some("Acme".to_string()), ..Default::default() }],
            education: vec![crate::processing::resume::Education {
                institution: Some("State".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        };
        let outcome = merge(Some(&full), &StructuredResume::default(), &[]);
        assert!((outcome.confidence - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_confidence_clamped_to_one() {
        let full = meta_resume();
        let outcome = merge(Some(&full), &generated_resume(), &[]);
        assert!(outcome.confidence <= 1.0);
    }
}
