//! Heuristic address field extraction from OCR or typed text

use crate::constants::FULL_TEXT_SEPARATOR;
use address_types::{ParsedAddressFields, Salutation};
use once_cell::sync::Lazy;
use regex::Regex;

/// Street name followed by a house number with an optional letter ("Main Street 12a")
static STREET_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(.+?)\s+([0-9]+[a-zA-Z]?)$").expect("Failed to compile street regex")
});

/// Leading 4 or 5 digit postal code followed by the place ("8000 Zurich")
static POSTAL_PLACE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9]{4,5})\s+(.+)$").expect("Failed to compile postal code regex")
});

/// How the full text of a result is built
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FullTextMode {
    /// Recognised lines joined with ", " (OCR output)
    #[default]
    JoinedLines,
    /// The input exactly as typed (manual entry)
    Verbatim,
}

/// Rule-based extractor: one pass over the lines, first match wins per field
#[derive(Debug, Clone, Default)]
pub struct HeuristicExtractor {
    mode: FullTextMode,
}

impl HeuristicExtractor {
    pub fn new(mode: FullTextMode) -> Self {
        Self { mode }
    }

    /// Extractor for manually typed addresses
    pub fn manual_entry() -> Self {
        Self::new(FullTextMode::Verbatim)
    }

    /// Extract address fields from free text. Never fails.
    pub fn extract(&self, text: &str) -> ParsedAddressFields {
        let lines = split_lines(text);
        if lines.is_empty() {
            return ParsedAddressFields::not_found();
        }

        let full_text = match self.mode {
            FullTextMode::JoinedLines => lines.join(FULL_TEXT_SEPARATOR),
            FullTextMode::Verbatim => text.to_string(),
        };
        let mut fields = ParsedAddressFields::new(full_text);

        for (i, line) in lines.iter().enumerate() {
            if apply_salutation_rule(&mut fields, line) {
                log::debug!("Line {}: salutation line", i);
                continue;
            }

            if i == 0 && apply_bare_name_rule(&mut fields, line) {
                log::debug!("Line {}: bare name line", i);
                continue;
            }

            if apply_street_rule(&mut fields, line) {
                log::debug!("Line {}: street line", i);
                continue;
            }

            if apply_postal_place_rule(&mut fields, line) {
                log::debug!("Line {}: postal code line", i);
                continue;
            }

            log::debug!("Line {}: no rule matched", i);
        }

        fields
    }
}

/// Extract fields from OCR-style multi-line text
pub fn extract_fields(text: &str) -> ParsedAddressFields {
    HeuristicExtractor::default().extract(text)
}

/// Non-empty trimmed lines of the input
fn split_lines(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

/// First token on a line that is exactly one of the salutation literals
fn find_salutation(tokens: &[&str]) -> Option<(usize, Salutation)> {
    tokens
        .iter()
        .enumerate()
        .find_map(|(idx, token)| Salutation::from_token(token).map(|s| (idx, s)))
}

fn assign_names<'a>(fields: &mut ParsedAddressFields, mut tokens: impl Iterator<Item = &'a str>) {
    if let Some(first) = tokens.next() {
        if fields.first_name.is_none() {
            fields.first_name = Some(first.to_string());
        }

        let rest: Vec<&str> = tokens.collect();
        if !rest.is_empty() && fields.last_name.is_none() {
            fields.last_name = Some(rest.join(" "));
        }
    }
}

fn apply_salutation_rule(fields: &mut ParsedAddressFields, line: &str) -> bool {
    if fields.salutation.is_some() {
        return false;
    }

    let tokens: Vec<&str> = line.split_whitespace().collect();
    let Some((idx, salutation)) = find_salutation(&tokens) else {
        return false;
    };

    fields.salutation = Some(salutation);
    let remainder = tokens
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != idx)
        .map(|(_, token)| *token);
    assign_names(fields, remainder);
    true
}

fn apply_bare_name_rule(fields: &mut ParsedAddressFields, line: &str) -> bool {
    if fields.first_name.is_some() || fields.last_name.is_some() {
        return false;
    }

    if line.chars().any(|c| c.is_ascii_digit()) {
        return false;
    }

    assign_names(fields, line.split_whitespace());
    true
}

fn apply_street_rule(fields: &mut ParsedAddressFields, line: &str) -> bool {
    if fields.street_name.is_some() {
        return false;
    }

    let Some(captures) = STREET_REGEX.captures(line) else {
        return false;
    };

    fields.street_name = Some(captures[1].to_string());
    fields.street_number = Some(captures[2].to_string());
    true
}

fn apply_postal_place_rule(fields: &mut ParsedAddressFields, line: &str) -> bool {
    if fields.postal_code.is_some() {
        return false;
    }

    let Some(captures) = POSTAL_PLACE_REGEX.captures(line) else {
        return false;
    };

    fields.postal_code = Some(captures[1].to_string());
    fields.place = Some(captures[2].to_string());
    true
}

/// Whether a value has the shape of a postal code this system accepts
pub fn is_valid_postal_code(value: &str) -> bool {
    (4..=5).contains(&value.len()) && value.chars().all(|c| c.is_ascii_digit())
}
