//! Contact block parsing: name, email, phone, location, links and headline.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{contains_word, RecordBuilder, SourcedLine};
use crate::rules::RuleSet;

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}").unwrap());

static PHONE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\+?\(?\d[\d\s().\-]{5,}\d").unwrap());

static YEAR_RANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:19|20)\d{2}\s*[-–]\s*(?:19|20)\d{2}$").unwrap());

static LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:https?://|www\.)[^\s|,;]+|\b(?:linkedin\.com|github\.com|gitlab\.com)/[^\s|,;]+",
    )
    .unwrap()
});

static CITY_REGION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Z][A-Za-z.'\- ]{1,30},\s*[A-Z][A-Za-z.'\- ]{1,30}$").unwrap()
});

const LABELS: &[&str] = &[
    "email", "e-mail", "mail", "phone", "mobile", "mob", "tel", "cell", "contact", "linkedin",
    "github", "website", "portfolio", "web", "address", "location",
];

/// Find the first email address.
pub fn find_email(text: &str) -> Option<&str> {
    EMAIL.find(text).map(|m| m.as_str())
}

/// Find the first plausible phone number.
pub fn find_phone(text: &str) -> Option<String> {
    PHONE
        .find_iter(text)
        .map(|m| m.as_str().trim())
        .find(|candidate| {
            let digits = candidate.chars().filter(char::is_ascii_digit).count();
            (7..=15).contains(&digits)
                && !YEAR_RANGE.is_match(candidate)
                && !is_year_list(candidate)
        })
        .map(str::to_string)
}

/// Find a phone number in running text, where only numbers written the way
/// phones are written count: a `+` prefix, a separator, or ten digits or more.
pub fn find_phone_in_prose(text: &str) -> Option<String> {
    find_phone(text).filter(|candidate| {
        let digits = candidate.chars().filter(char::is_ascii_digit).count();
        candidate.starts_with('+') || candidate.contains(['-', '(', ')', '.']) || digits >= 10
    })
}

/// "2019 2020 2021": every number is a four-digit year.
fn is_year_list(candidate: &str) -> bool {
    candidate
        .split(|c: char| !c.is_ascii_digit())
        .filter(|t| !t.is_empty())
        .all(|t| t.len() == 4 && t.parse::<u32>().is_ok_and(|y| (1900..=2100).contains(&y)))
}

/// All links in the text, normalised to `https://`.
pub fn find_links(text: &str) -> Vec<String> {
    LINK.find_iter(text)
        .map(|m| normalize_link(m.as_str()))
        .collect()
}

/// Whether a line carries any contact channel.
pub fn has_contact_channel(text: &str) -> bool {
    EMAIL.is_match(text) || find_phone(text).is_some() || LINK.is_match(text)
}

fn normalize_link(link: &str) -> String {
    let link = link.trim_end_matches(['.', ')', ']', '/']);
    let lower = link.to_lowercase();
    if lower.starts_with("https://") {
        link.to_string()
    } else if lower.starts_with("http://") {
        format!("https://{}", &link[7..])
    } else {
        format!("https://{}", link)
    }
}

/// Whether a fragment reads like a location.
pub fn looks_like_location(text: &str, rules: &RuleSet) -> bool {
    if text.chars().any(|c| c.is_ascii_digit()) {
        return false;
    }
    CITY_REGION.is_match(text)
        || rules
            .extraction
            .location_hints
            .iter()
            .any(|hint| contains_word(text, hint))
}

/// Whether a fragment reads like a personal name.
fn looks_like_name(text: &str) -> bool {
    let words = text.split_whitespace().count();
    if !(2..=4).contains(&words) || text.chars().count() >= 50 {
        return false;
    }
    if text.contains('@') || text.chars().any(|c| c.is_ascii_digit()) || LINK.is_match(text) {
        return false;
    }
    let total = text.chars().count();
    let alpha = text
        .chars()
        .filter(|c| c.is_alphabetic() || c.is_whitespace())
        .count();
    alpha as f32 / total as f32 > 0.7
}

/// Whether a fragment contains a job title keyword.
pub fn has_title_keyword(text: &str, rules: &RuleSet) -> bool {
    rules
        .extraction
        .title_keywords
        .iter()
        .any(|k| contains_word(text, k))
}

fn strip_label(segment: &str) -> &str {
    let trimmed = segment.trim().trim_matches(|c: char| c == ':' || c == ',' || c == '-');
    if let Some((label, rest)) = trimmed.split_once(':') {
        if LABELS.contains(&label.trim().to_lowercase().as_str()) {
            return rest.trim();
        }
    }
    if LABELS.contains(&trimmed.to_lowercase().as_str()) {
        return "";
    }
    trimmed.trim()
}

/// Parse lines assigned to the contact section.
pub(crate) fn fill_contact(builder: &mut RecordBuilder, lines: &[SourcedLine], rules: &RuleSet) {
    for line in lines {
        for segment in line.text.split(['|', '•', '·']) {
            let mut rest = segment.to_string();

            if let Some(email) = find_email(&rest).map(str::to_string) {
                if builder.record.contact.email.is_none() {
                    builder.record.contact.email = Some(email.clone());
                    builder.provenance.record("contact.email", [line.order]);
                }
                rest = rest.replacen(&email, " ", 1);
            }
            for m in LINK.find_iter(&rest.clone()) {
                builder
                    .record
                    .contact
                    .links
                    .insert(normalize_link(m.as_str()));
                builder.provenance.record("contact.links", [line.order]);
                rest = rest.replacen(m.as_str(), " ", 1);
            }
            if let Some(phone) = find_phone(&rest) {
                if builder.record.contact.phone.is_none() {
                    builder.record.contact.phone = Some(phone.clone());
                    builder.provenance.record("contact.phone", [line.order]);
                }
                rest = rest.replacen(&phone, " ", 1);
            }

            let rest = strip_label(&rest);
            if rest.is_empty() {
                continue;
            }

            let contact = &mut builder.record.contact;
            if contact.location.is_none() && looks_like_location(rest, rules) {
                contact.location = Some(rest.to_string());
                builder.provenance.record("contact.location", [line.order]);
            } else if builder.record.headline.is_none() && has_title_keyword(rest, rules) {
                builder.record.headline = Some(rest.to_string());
                builder.provenance.record("headline", [line.order]);
            } else if contact.name.is_none() && looks_like_name(rest) {
                contact.name = Some(rest.to_string());
                builder.provenance.record("contact.name", [line.order]);
            } else {
                builder.push_free_text(rest, line.order);
            }
        }
    }
}

/// Pick up an email or phone number stated outside the contact block.
///
/// Phones here must be phone-shaped; see [`find_phone_in_prose`].
pub(crate) fn scan_for_channels(builder: &mut RecordBuilder, lines: &[SourcedLine]) {
    for line in lines {
        if builder.record.contact.email.is_none() {
            if let Some(email) = find_email(&line.text) {
                builder.record.contact.email = Some(email.to_string());
                builder.provenance.record("contact.email", [line.order]);
            }
        }
        if builder.record.contact.phone.is_none() {
            if let Some(phone) = find_phone_in_prose(&line.text) {
                builder.record.contact.phone = Some(phone);
                builder.provenance.record("contact.phone", [line.order]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_find_email() {
        assert_eq!(
            find_email("Email: jane.doe+cv@example.co.uk | x"),
            Some("jane.doe+cv@example.co.uk")
        );
        assert_eq!(find_email("no address"), None);
    }

    #[test]
    fn test_find_phone() {
        assert_eq!(
            find_phone("Phone: +1 (555) 123-4567").as_deref(),
            Some("+1 (555) 123-4567")
        );
        assert_eq!(find_phone("+91 9876543210").as_deref(), Some("+91 9876543210"));
        assert_eq!(find_phone("2016 - 2019"), None);
        assert_eq!(find_phone("Cut costs by 30%"), None);
        assert_eq!(find_phone("2019 2020 2021"), None);
    }

    #[test]
    fn test_phone_in_prose_needs_phone_shape() {
        assert_eq!(
            find_phone_in_prose("Ran hiring for the 2019 2020 2021 cohorts"),
            None
        );
        assert_eq!(find_phone_in_prose("Sold 1200 3400 units"), None);
        assert_eq!(
            find_phone_in_prose("Reach me at 555-123-4567").as_deref(),
            Some("555-123-4567")
        );
        assert_eq!(
            find_phone_in_prose("Call +44 20 7946 0958").as_deref(),
            Some("+44 20 7946 0958")
        );
    }

    #[test]
    fn test_body_scan_skips_year_lists() {
        let lines = [
            SourcedLine {
                text: "Ran hiring for the 2019 2020 2021 cohorts".into(),
                order: 7,
                bullet: true,
                gap_before: false,
            },
            SourcedLine {
                text: "Mobile 555-123-4567".into(),
                order: 9,
                bullet: false,
                gap_before: false,
            },
        ];
        let mut builder = RecordBuilder::default();
        scan_for_channels(&mut builder, &lines[..1]);
        assert_eq!(builder.record.contact.phone, None);

        scan_for_channels(&mut builder, &lines);
        assert_eq!(builder.record.contact.phone.as_deref(), Some("555-123-4567"));
        assert_eq!(
            builder.provenance.sources("contact.phone"),
            Some(&BTreeSet::from([9]))
        );
    }

    #[test]
    fn test_find_links() {
        assert_eq!(
            find_links("linkedin.com/in/janedoe | http://janedoe.dev."),
            vec!["https://linkedin.com/in/janedoe", "https://janedoe.dev"]
        );
        assert_eq!(find_links("www.example.com"), vec!["https://www.example.com"]);
    }

    #[test]
    fn test_location_and_name() {
        let rules = RuleSet::builtin();
        assert!(looks_like_location("San Francisco, CA", rules));
        assert!(looks_like_location("Remote", rules));
        assert!(!looks_like_location("Jane Doe", rules));
        assert!(looks_like_name("Jane Doe"));
        assert!(looks_like_name("María José García"));
        assert!(!looks_like_name("Jane"));
        assert!(!looks_like_name("jane@x.com Doe"));
    }

    #[test]
    fn test_strip_label() {
        assert_eq!(strip_label(" Location: Pune, India "), "Pune, India");
        assert_eq!(strip_label("Email:"), "");
        assert_eq!(strip_label("Jane Doe"), "Jane Doe");
    }
}
