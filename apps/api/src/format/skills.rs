//! Skills line contract: `Category: item | item | item | item`.
//!
//! Exactly four pipe-separated items. Parsing is done structurally rather
//! than with a single regex so callers get a distinct failure for a wrong
//! separator, a wrong item count and a malformed category.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const REQUIRED_ITEMS: usize = 4;
const MAX_CATEGORY_CHARS: usize = 30;
const MAX_ITEM_CHARS: usize = 30;

/// Delimiters people reach for instead of `|`.
const FOREIGN_SEPARATORS: &[char] = &[',', ';', '\t', '•', '·'];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillsLine {
    pub category: String,
    pub items: [String; REQUIRED_ITEMS],
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkillsLineError {
    #[error("malformed category '{category}': {reason}")]
    MalformedCategory {
        category: String,
        reason: &'static str,
    },

    #[error("items must be separated by '|', found '{found}'")]
    WrongSeparator { found: char },

    #[error("expected exactly 4 items, found {found}")]
    WrongItemCount { found: usize },

    #[error("item {index} ('{item}') contains disallowed character '{found}'")]
    InvalidItem {
        index: usize,
        item: String,
        found: char,
    },

    #[error("item {index} is empty")]
    EmptyItem { index: usize },

    #[error("item {index} is {len} characters (max 30)")]
    ItemTooLong { index: usize, len: usize },
}

impl SkillsLineError {
    /// Stable machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedCategory { .. } => "malformed_category",
            Self::WrongSeparator { .. } => "wrong_separator",
            Self::WrongItemCount { .. } => "wrong_item_count",
            Self::InvalidItem { .. } => "invalid_item",
            Self::EmptyItem { .. } => "empty_item",
            Self::ItemTooLong { .. } => "item_too_long",
        }
    }
}

/// Validates and splits a skills line. Items are returned trimmed.
pub fn parse_skills_line(raw: &str) -> Result<SkillsLine, SkillsLineError> {
    let line = raw.trim();

    let Some((category, body)) = line.split_once(':') else {
        return Err(SkillsLineError::MalformedCategory {
            category: line.chars().take(MAX_CATEGORY_CHARS).collect(),
            reason: "missing ':' after the category",
        });
    };
    let category = category.trim();
    validate_category(category)?;

    let body = body.trim();
    if body.is_empty() {
        return Err(SkillsLineError::WrongItemCount { found: 0 });
    }
    if !body.contains('|') {
        if let Some(found) = body.chars().find(|c| FOREIGN_SEPARATORS.contains(c)) {
            return Err(SkillsLineError::WrongSeparator { found });
        }
    }

    let items: Vec<&str> = body.split('|').map(str::trim).collect();
    if items.len() != REQUIRED_ITEMS {
        return Err(SkillsLineError::WrongItemCount { found: items.len() });
    }

    for (index, item) in items.iter().enumerate() {
        validate_item(index, item)?;
    }

    Ok(SkillsLine {
        category: category.to_string(),
        items: [
            items[0].to_string(),
            items[1].to_string(),
            items[2].to_string(),
            items[3].to_string(),
        ],
    })
}

fn validate_category(category: &str) -> Result<(), SkillsLineError> {
    let malformed = |reason| SkillsLineError::MalformedCategory {
        category: category.to_string(),
        reason,
    };

    let mut chars = category.chars();
    match chars.next() {
        None => return Err(malformed("category is empty")),
        Some(c) if !c.is_ascii_uppercase() => {
            return Err(malformed("category must start with an uppercase letter"))
        }
        Some(_) => {}
    }
    if category.chars().count() > MAX_CATEGORY_CHARS {
        return Err(malformed("category is longer than 30 characters"));
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '+' | '&' | '-' | ' ')) {
        return Err(malformed("category contains a disallowed character"));
    }
    Ok(())
}

fn validate_item(index: usize, item: &str) -> Result<(), SkillsLineError> {
    if item.is_empty() {
        return Err(SkillsLineError::EmptyItem { index });
    }
    let len = item.chars().count();
    if len > MAX_ITEM_CHARS {
        return Err(SkillsLineError::ItemTooLong { index, len });
    }
    if let Some(found) = item
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '+' | '#' | '/' | '-' | ' ')))
    {
        return Err(SkillsLineError::InvalidItem {
            index,
            item: item.to_string(),
            found,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_line() {
        let line = parse_skills_line("Languages: Python | Go | Rust | TypeScript").unwrap();
        assert_eq!(line.category, "Languages");
        assert_eq!(line.items, ["Python", "Go", "Rust", "TypeScript"]);
    }

    #[test]
    fn test_whitespace_around_pipes_tolerated() {
        let line = parse_skills_line("  Cloud & Infra:AWS|  GCP   |Terraform| CI/CD  ").unwrap();
        assert_eq!(line.category, "Cloud & Infra");
        assert_eq!(line.items, ["AWS", "GCP", "Terraform", "CI/CD"]);
    }

    #[test]
    fn test_item_punctuation_allowed() {
        let line = parse_skills_line("Languages: C++ | C# | Node.js | Objective-C").unwrap();
        assert_eq!(line.items[1], "C#");
    }

    #[test]
    fn test_comma_delimited_is_wrong_separator() {
        assert_eq!(
            parse_skills_line("Languages: Python, Go, Rust, TS"),
            Err(SkillsLineError::WrongSeparator { found: ',' })
        );
    }

    #[test]
    fn test_three_items_is_wrong_count() {
        assert_eq!(
            parse_skills_line("Languages: Python | Go | Rust"),
            Err(SkillsLineError::WrongItemCount { found: 3 })
        );
    }

    #[test]
    fn test_five_items_is_wrong_count() {
        assert_eq!(
            parse_skills_line("Languages: Python | Go | Rust | TS | Java"),
            Err(SkillsLineError::WrongItemCount { found: 5 })
        );
    }

    #[test]
    fn test_lowercase_category_is_malformed() {
        let err = parse_skills_line("languages: Python | Go | Rust | TS").unwrap_err();
        assert_eq!(err.code(), "malformed_category");
    }

    #[test]
    fn test_missing_colon_is_malformed_category() {
        let err = parse_skills_line("Languages Python | Go | Rust | TS").unwrap_err();
        assert!(matches!(err, SkillsLineError::MalformedCategory { .. }));
    }

    #[test]
    fn test_long_category_rejected() {
        let raw = format!("{}: A | B | C | D", "C".repeat(31));
        assert!(matches!(
            parse_skills_line(&raw),
            Err(SkillsLineError::MalformedCategory { .. })
        ));
    }

    #[test]
    fn test_long_item_rejected() {
        let raw = format!("Tools: {} | B | C | D", "x".repeat(31));
        assert_eq!(
            parse_skills_line(&raw),
            Err(SkillsLineError::ItemTooLong { index: 0, len: 31 })
        );
    }

    #[test]
    fn test_disallowed_item_character() {
        let err = parse_skills_line("Tools: Docker | K8s! | Helm | Vault").unwrap_err();
        assert_eq!(
            err,
            SkillsLineError::InvalidItem {
                index: 1,
                item: "K8s!".to_string(),
                found: '!'
            }
        );
    }

    #[test]
    fn test_empty_item_rejected() {
        assert_eq!(
            parse_skills_line("Tools: Docker | | Helm | Vault"),
            Err(SkillsLineError::EmptyItem { index: 1 })
        );
    }

    #[test]
    fn test_error_codes_are_distinct() {
        let sep = parse_skills_line("Languages: Python, Go, Rust, TS").unwrap_err();
        let count = parse_skills_line("Languages: Python | Go | Rust").unwrap_err();
        let cat = parse_skills_line("1Languages: Python | Go | Rust | TS").unwrap_err();
        assert_ne!(sep.code(), count.code());
        assert_ne!(count.code(), cat.code());
        assert_ne!(sep.code(), cat.code());
    }
}
