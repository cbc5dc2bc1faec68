//! Basic client-side checks: email and URL shape, and how much of the form
//! has been filled in.

use std::sync::LazyLock;

use regex::Regex;

use crate::record::*;

static EMAIL: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok());

static URL: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^(?:[a-zA-Z][a-zA-Z0-9+.-]*://[^\s/?#]+|[^\s/?#@:]+\.[^\s/?#@:]+)(?:[/?#]\S*)?$").ok()
});

fn matches(re: &LazyLock<Option<Regex>>, value: &str) -> bool {
    re.as_ref().map_or(true, |re| re.is_match(value))
}

pub fn is_valid_email(value: &str) -> bool {
    matches(&EMAIL, value.trim())
}

/// Accepts absolute URLs and bare host names such as `www.example.com`.
pub fn is_valid_url(value: &str) -> bool {
    matches(&URL, value.trim())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    /// Dotted path, e.g. `email` or `references.1.email`.
    pub path: String,
    pub message: &'static str,
}

const BAD_EMAIL: &str = "Please enter a valid email address";
const BAD_URL: &str = "Please enter a valid URL";

/// Format problems in non-empty fields. Empty fields are never an issue.
pub fn validate(record: &FieldRecord) -> Vec<FieldIssue> {
    let mut issues = Vec::new();
    let mut check = |path: String, value: &str, ok: fn(&str) -> bool, message| {
        if !value.trim().is_empty() && !ok(value) {
            issues.push(FieldIssue { path, message });
        }
    };
    check("email".into(), &record.email, is_valid_email, BAD_EMAIL);
    check("website".into(), &record.website, is_valid_url, BAD_URL);
    for (i, reference) in record.references.iter().enumerate() {
        check(format!("references.{i}.email"), &reference.email, is_valid_email, BAD_EMAIL);
    }
    issues
}

/// Percentage (0-100) of fields holding a value, counting every scalar
/// field, the address, the skills and every field of every entry.
pub fn completion(record: &FieldRecord) -> u8 {
    let mut total = 0usize;
    let mut filled = 0usize;
    let mut count = |present: bool| {
        total += 1;
        if present {
            filled += 1;
        }
    };
    for field in ScalarField::ALL {
        count(!record.scalar(field).trim().is_empty());
    }
    count(!record.address.is_blank());
    count(!record.skills.is_blank());
    for list in ListName::ALL {
        for index in 0..record.list_len(list) {
            for (_, value) in record.entry_values(list, index).unwrap_or_default() {
                count(!value.trim().is_empty());
            }
        }
    }
    if total == 0 {
        return 0;
    }
    ((filled as f64 / total as f64) * 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.d"));
    }

    #[test]
    fn url_shapes() {
        assert!(is_valid_url("https://example.com/cv"));
        assert!(is_valid_url("www.johnbanda.com"));
        assert!(is_valid_url("linkedin.com/in/someone"));
        assert!(!is_valid_url("not a url"));
        assert!(!is_valid_url("localhost"));
    }

    #[test]
    fn validate_reports_paths() {
        let mut record = FieldRecord::default();
        record.email = "nope".into();
        record.set_entry_field(ListName::References, 0, "email", "x@y.z".into());
        let i = record.push_entry(ListName::References, None);
        record.set_entry_field(ListName::References, i, "email", "bad".into());
        let paths: Vec<_> = validate(&record).into_iter().map(|i| i.path).collect();
        assert_eq!(paths, vec!["email", "references.1.email"]);
    }

    #[test]
    fn completion_counts_fields() {
        assert_eq!(completion(&FieldRecord::default()), 0);
        let mut record = FieldRecord::default();
        record.name = "A".into();
        // 5 scalars + address + skills + 29 entry fields = 36 fields
        assert_eq!(completion(&record), 3);
    }
}
