//! Template name rules
//!
//! Shared by catalog parsing and by sanitizing user selections.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::error::ValidationError;

/// Longest accepted template name, in characters.
pub const MAX_TEMPLATE_NAME_LEN: usize = 100;

const SUSPICIOUS_PATTERNS: [&str; 6] = ["..", "//", "\\\\", "<", ">", "|"];

/// Checks a name against the syntactic rules.
pub fn validate_template_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::Empty);
    }
    let len = name.chars().count();
    if len > MAX_TEMPLATE_NAME_LEN {
        return Err(ValidationError::TooLong(len));
    }
    if !name.chars().any(char::is_alphanumeric) {
        return Err(ValidationError::NoAlphanumeric);
    }
    if let Some(pattern) = SUSPICIOUS_PATTERNS.iter().find(|p| name.contains(*p)) {
        return Err(ValidationError::SuspiciousPattern(*pattern));
    }
    Ok(())
}

pub fn is_valid_template_name(name: &str) -> bool {
    validate_template_name(name).is_ok()
}

/// Trims a name and strips everything except alphanumerics and `-_+.`.
pub fn sanitize_template_name(name: &str) -> String {
    name.trim()
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '+' | '.'))
        .collect()
}

/// Sanitizes and validates user selections, dropping invalid entries with a
/// warning. Input order is preserved.
pub fn clean_template_names<S: AsRef<str>>(names: &[S]) -> Vec<String> {
    names
        .iter()
        .filter_map(|raw| {
            let raw = raw.as_ref();
            let clean = sanitize_template_name(raw);
            match validate_template_name(&clean) {
                Ok(()) => Some(clean),
                Err(reason) => {
                    warn!("Skipping invalid template name {:?}: {}", raw, reason);
                    None
                }
            }
        })
        .collect()
}

/// Parses the catalog body: comma- and newline-delimited tokens, deduplicated,
/// filtered to valid names and sorted case-insensitively.
pub fn parse_template_list(body: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut templates: Vec<String> = body
        .lines()
        .flat_map(|line| line.split(','))
        .map(str::trim)
        .filter(|token| !token.is_empty() && is_valid_template_name(token))
        .filter(|token| seen.insert(*token))
        .map(str::to_string)
        .collect();

    templates.sort_by(|a, b| {
        a.to_lowercase()
            .cmp(&b.to_lowercase())
            .then_with(|| a.cmp(b))
    });
    debug!("Parsed {} unique templates", templates.len());
    templates
}
