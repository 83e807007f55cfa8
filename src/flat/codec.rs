//! Bidirectional transform between the flat namespace and `StructuredResume`
//!
//! `decode` is total: malformed counts, missing keys, and mixed-case variants
//! all degrade to empty fields, never to an error.

use crate::flat::key::{canonical_key, clean_value, parse_count, truthy, FlatKey, FlatRecord, FlatValue};
use crate::processing::resume::{
    Award, Certification, ContactInfo, Coursework, Education, Experience, HasContent,
    Involvement, LanguageSkill, Project, Publication, SkillGroup, StructuredResume,
};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

/// Bound on decoded entries per section; counts beyond this are treated as
/// malformed rather than looped over.
const MAX_SEQUENCE_ENTRIES: usize = 100;

/// Sections that use the counted-block encoding.
const SEQUENCE_SECTIONS: &[&str] = &[
    "experience",
    "education",
    "skills",
    "projects",
    "certifications",
    "involvement",
    "coursework",
    "publications",
    "awards",
    "languages",
];

/// Whether a canonical key belongs to the resume namespace. Keys from other
/// writers sharing the flat store (tool bookkeeping, file attributes) are
/// dropped at the boundary rather than carried through decoding.
pub fn is_resume_key(canonical: &str) -> bool {
    match FlatKey::parse(canonical) {
        FlatKey::Scalar { name } => name == "summary" || name.starts_with("contact_"),
        FlatKey::Count { section } | FlatKey::Indexed { section, .. } => {
            SEQUENCE_SECTIONS.contains(&section.as_str())
        }
    }
}

/// A flat record with canonicalized keys. Where both writer case variants of
/// the same logical key are present, the one holding real content wins.
struct CleanRecord {
    values: BTreeMap<String, FlatValue>,
}

impl CleanRecord {
    fn new(flat: &FlatRecord) -> Self {
        let mut values: BTreeMap<String, FlatValue> = BTreeMap::new();
        for (raw_key, value) in flat {
            match values.entry(canonical_key(raw_key)) {
                Entry::Vacant(slot) => {
                    slot.insert(value.clone());
                }
                Entry::Occupied(mut slot) => {
                    if clean_value(slot.get()).is_none() && clean_value(value).is_some() {
                        slot.insert(value.clone());
                    }
                }
            }
        }
        Self { values }
    }

    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).and_then(clean_value)
    }

    fn flag(&self, key: &str) -> bool {
        self.values.get(key).map(truthy).unwrap_or(false)
    }

    fn count(&self, section: &str) -> usize {
        parse_count(self.values.get(&format!("{}_count", section))).min(MAX_SEQUENCE_ENTRIES)
    }
}

/// Field accessor for one indexed block of a sequence section.
struct EntryFields<'a> {
    rec: &'a CleanRecord,
    section: &'a str,
    index: usize,
}

impl EntryFields<'_> {
    fn get(&self, field: &str) -> Option<String> {
        self.rec.get(&format!("{}_{}_{}", self.section, self.index, field))
    }

    fn flag(&self, field: &str) -> bool {
        self.rec.flag(&format!("{}_{}_{}", self.section, self.index, field))
    }
}

fn decode_entries<T, F>(rec: &CleanRecord, section: &str, build: F) -> Vec<T>
where
    T: HasContent,
    F: Fn(&EntryFields) -> T,
{
    let count = rec.count(section);
    let mut entries = Vec::new();
    for index in 0..count {
        let fields = EntryFields { rec, section, index };
        let entry = build(&fields);
        // Blocks with no surviving content are dropped silently.
        if entry.has_content() {
            entries.push(entry);
        }
    }
    entries
}

/// Decode a flat record into the canonical nested form. Never fails.
pub fn decode(flat: &FlatRecord) -> StructuredResume {
    let rec = CleanRecord::new(flat);

    StructuredResume {
        contact: ContactInfo {
            name: rec.get("contact_name"),
            email: rec.get("contact_email"),
            phone: rec.get("contact_phone"),
            city: rec.get("contact_city"),
            state: rec.get("contact_state"),
            country: rec.get("contact_country"),
            linkedin: rec.get("contact_linkedin"),
            github: rec.get("contact_github"),
            website: rec.get("contact_website"),
        },
        summary: rec.get("summary"),
        experience: decode_entries(&rec, "experience", |f| Experience {
            company: f.get("company"),
            role: f.get("role"),
            location: f.get("location"),
            start_date: f.get("start_date"),
            end_date: f.get("end_date"),
            description: f.get("description"),
            is_current: f.flag("is_current"),
        }),
        education: decode_entries(&rec, "education", |f| Education {
            institution: f.get("institution"),
            degree: f.get("degree"),
            field_of_study: f.get("field_of_study"),
            location: f.get("location"),
            start_date: f.get("start_date"),
            end_date: f.get("end_date"),
            gpa: f.get("gpa"),
            description: f.get("description"),
            is_current: f.flag("is_current"),
        }),
        skills: decode_entries(&rec, "skills", |f| SkillGroup {
            category: f.get("category"),
            keywords: f
                .get("keywords")
                .map(|joined| {
                    joined
                        .split(',')
                        .map(str::trim)
                        .filter(|k| !k.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        }),
        projects: decode_entries(&rec, "projects", |f| Project {
            name: f.get("name"),
            description: f.get("description"),
            url: f.get("url"),
            start_date: f.get("start_date"),
            end_date: f.get("end_date"),
        }),
        certifications: decode_entries(&rec, "certifications", |f| Certification {
            name: f.get("name"),
            issuer: f.get("issuer"),
            date: f.get("date"),
            url: f.get("url"),
        }),
        involvement: decode_entries(&rec, "involvement", |f| Involvement {
            organization: f.get("organization"),
            role: f.get("role"),
            start_date: f.get("start_date"),
            end_date: f.get("end_date"),
            description: f.get("description"),
            is_current: f.flag("is_current"),
        }),
        coursework: decode_entries(&rec, "coursework", |f| Coursework {
            name: f.get("name"),
            institution: f.get("institution"),
            date: f.get("date"),
            description: f.get("description"),
        }),
        publications: decode_entries(&rec, "publications", |f| Publication {
            title: f.get("title"),
            publisher: f.get("publisher"),
            date: f.get("date"),
            url: f.get("url"),
            description: f.get("description"),
        }),
        awards: decode_entries(&rec, "awards", |f| Award {
            title: f.get("title"),
            issuer: f.get("issuer"),
            date: f.get("date"),
            description: f.get("description"),
        }),
        languages: decode_entries(&rec, "languages", |f| LanguageSkill {
            language: f.get("language"),
            proficiency: f.get("proficiency"),
        }),
    }
}

struct Writer {
    flat: FlatRecord,
}

impl Writer {
    fn new() -> Self {
        Self { flat: FlatRecord::new() }
    }

    /// Empty scalars are omitted rather than written as empty strings, so a
    /// write-back never blanks out a previously richer value.
    fn put(&mut self, key: String, value: &Option<String>) {
        if let Some(v) = value.as_deref() {
            let trimmed = v.trim();
            if !trimmed.is_empty() {
                self.flat.insert(key, FlatValue::Text(trimmed.to_string()));
            }
        }
    }

    fn put_flag(&mut self, key: String, value: bool) {
        if value {
            self.flat.insert(key, FlatValue::Bool(true));
        }
    }

    fn put_count(&mut self, section: &str, count: usize) {
        if count > 0 {
            self.flat.insert(format!("{}_count", section), FlatValue::Number(count as f64));
        }
    }
}

/// Encode the canonical nested form back into the flat namespace.
pub fn encode(resume: &StructuredResume) -> FlatRecord {
    let mut w = Writer::new();

    w.put("contact_name".to_string(), &resume.contact.name);
    w.put("contact_email".to_string(), &resume.contact.email);
    w.put("contact_phone".to_string(), &resume.contact.phone);
    w.put("contact_city".to_string(), &resume.contact.city);
    w.put("contact_state".to_string(), &resume.contact.state);
    w.put("contact_country".to_string(), &resume.contact.country);
    w.put("contact_linkedin".to_string(), &resume.contact.linkedin);
    w.put("contact_github".to_string(), &resume.contact.github);
    w.put("contact_website".to_string(), &resume.contact.website);
    w.put("summary".to_string(), &resume.summary);

    w.put_count("experience", resume.experience.len());
    for (i, exp) in resume.experience.iter().enumerate() {
        w.put(format!("experience_{}_company", i), &exp.company);
        w.put(format!("experience_{}_role", i), &exp.role);
        w.put(format!("experience_{}_location", i), &exp.location);
        w.put(format!("experience_{}_start_date", i), &exp.start_date);
        w.put(format!("experience_{}_end_date", i), &exp.end_date);
        w.put(format!("experience_{}_description", i), &exp.description);
        w.put_flag(format!("experience_{}_is_current", i), exp.is_current);
    }

    w.put_count("education", resume.education.len());
    for (i, edu) in resume.education.iter().enumerate() {
        w.put(format!("education_{}_institution", i), &edu.institution);
        w.put(format!("education_{}_degree", i), &edu.degree);
        w.put(format!("education_{}_field_of_study", i), &edu.field_of_study);
        w.put(format!("education_{}_location", i), &edu.location);
        w.put(format!("education_{}_start_date", i), &edu.start_date);
        w.put(format!("education_{}_end_date", i), &edu.end_date);
        w.put(format!("education_{}_gpa", i), &edu.gpa);
        w.put(format!("education_{}_description", i), &edu.description);
        w.put_flag(format!("education_{}_is_current", i), edu.is_current);
    }

    w.put_count("skills", resume.skills.len());
    for (i, group) in resume.skills.iter().enumerate() {
        w.put(format!("skills_{}_category", i), &group.category);
        let keywords: Vec<&str> = group
            .keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .collect();
        if !keywords.is_empty() {
            w.put(format!("skills_{}_keywords", i), &Some(keywords.join(", ")));
        }
    }

    w.put_count("projects", resume.projects.len());
    for (i, project) in resume.projects.iter().enumerate() {
        w.put(format!("projects_{}_name", i), &project.name);
        w.put(format!("projects_{}_description", i), &project.description);
        w.put(format!("projects_{}_url", i), &project.url);
        w.put(format!("projects_{}_start_date", i), &project.start_date);
        w.put(format!("projects_{}_end_date", i), &project.end_date);
    }

    w.put_count("certifications", resume.certifications.len());
    for (i, cert) in resume.certifications.iter().enumerate() {
        w.put(format!("certifications_{}_name", i), &cert.name);
        w.put(format!("certifications_{}_issuer", i), &cert.issuer);
        w.put(format!("certifications_{}_date", i), &cert.date);
        w.put(format!("certifications_{}_url", i), &cert.url);
    }

    w.put_count("involvement", resume.involvement.len());
    for (i, item) in resume.involvement.iter().enumerate() {
        w.put(format!("involvement_{}_organization", i), &item.organization);
        w.put(format!("involvement_{}_role", i), &item.role);
        w.put(format!("involvement_{}_start_date", i), &item.start_date);
        w.put(format!("involvement_{}_end_date", i), &item.end_date);
        w.put(format!("involvement_{}_description", i), &item.description);
        w.put_flag(format!("involvement_{}_is_current", i), item.is_current);
    }

    w.put_count("coursework", resume.coursework.len());
    for (i, course) in resume.coursework.iter().enumerate() {
        w.put(format!("coursework_{}_name", i), &course.name);
        w.put(format!("coursework_{}_institution", i), &course.institution);
        w.put(format!("coursework_{}_date", i), &course.date);
        w.put(format!("coursework_{}_description", i), &course.description);
    }

    w.put_count("publications", resume.publications.len());
    for (i, publication) in resume.publications.iter().enumerate() {
        w.put(format!("publications_{}_title", i), &publication.title);
        w.put(format!("publications_{}_publisher", i), &publication.publisher);
        w.put(format!("publications_{}_date", i), &publication.date);
        w.put(format!("publications_{}_url", i), &publication.url);
        w.put(format!("publications_{}_description", i), &publication.description);
    }

    w.put_count("awards", resume.awards.len());
    for (i, award) in resume.awards.iter().enumerate() {
        w.put(format!("awards_{}_title", i), &award.title);
        w.put(format!("awards_{}_issuer", i), &award.issuer);
        w.put(format!("awards_{}_date", i), &award.date);
        w.put(format!("awards_{}_description", i), &award.description);
    }

    w.put_count("languages", resume.languages.len());
    for (i, language) in resume.languages.iter().enumerate() {
        w.put(format!("languages_{}_language", i), &language.language);
        w.put(format!("languages_{}_proficiency", i), &language.proficiency);
    }

    w.flat
}
