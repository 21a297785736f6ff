//! Rules document parsing and skip matching.
//!
//! The rules document is plain text the user edits by hand. Two kinds of
//! sections matter here:
//! - `<Name> emails include:` headings define the category set, in document
//!   order. The first category is the designated default.
//! - One optional `Skip classification for:` section holds `- field:value`
//!   bullets naming mail that bypasses classification entirely.
//!
//! Everything in this module is a pure text-to-structure transform. Loading
//! the document (local cache, remote refresh) lives in [`loader`].

pub mod loader;

use regex::Regex;
use tracing::debug;

use crate::error::RulesError;

/// Which message field a skip rule matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipField {
    From,
    Subject,
}

impl SkipField {
    /// Short label for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::From => "from",
            Self::Subject => "subject",
        }
    }
}

/// A single skip rule: case-insensitive substring match on one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipRule {
    pub field: SkipField,
    pub pattern: String,
}

/// Parsed per-cycle snapshot of the rules document.
///
/// Immutable once built; recomputed fresh each cycle from the current
/// document text.
#[derive(Debug, Clone)]
pub struct RuleSet {
    /// Category names in document order. The first is the default.
    pub categories: Vec<String>,
    /// Skip rules in document order.
    pub skip_rules: Vec<SkipRule>,
}

impl RuleSet {
    /// Parse a rules document into categories and skip rules.
    ///
    /// A duplicate category heading is an invariant violation and fails the
    /// parse rather than being silently merged. An empty document parses to
    /// an empty category list — callers decide whether that is fatal.
    pub fn parse(document: &str) -> Result<Self, RulesError> {
        let heading = Regex::new(r"^(\w+) emails include:$").unwrap();

        let mut categories: Vec<String> = Vec::new();
        let mut skip_rules = Vec::new();
        let mut in_skip_section = false;

        for line in document.lines() {
            let stripped = line.trim();

            if let Some(caps) = heading.captures(stripped) {
                // A heading always ends the skip section.
                in_skip_section = false;
                let name = caps[1].to_string();
                if categories.contains(&name) {
                    return Err(RulesError::DuplicateCategory { name });
                }
                categories.push(name);
                continue;
            }

            if stripped.eq_ignore_ascii_case("skip classification for:") {
                in_skip_section = true;
                continue;
            }

            if in_skip_section {
                let Some(rest) = stripped.strip_prefix("- ") else {
                    continue;
                };
                // Only the first colon separates field from pattern, so
                // values like "Re: Your item sold" survive intact.
                let Some((field, value)) = rest.trim().split_once(':') else {
                    continue;
                };
                let value = value.trim();
                if value.is_empty() {
                    continue;
                }
                let field = match field.trim().to_lowercase().as_str() {
                    "from" => SkipField::From,
                    "subject" => SkipField::Subject,
                    // Unknown fields are dropped, not errors.
                    _ => continue,
                };
                skip_rules.push(SkipRule {
                    field,
                    pattern: value.to_string(),
                });
            }
        }

        Ok(Self {
            categories,
            skip_rules,
        })
    }

    /// Check a message against the skip rules.
    ///
    /// Returns the first matching rule (for logging), or `None` if the
    /// message should be classified. Matching is case-insensitive substring
    /// containment on the rule's field. No side effects.
    pub fn should_skip(&self, sender: &str, subject: &str) -> Option<&SkipRule> {
        if self.skip_rules.is_empty() {
            return None;
        }

        let sender = sender.to_lowercase();
        let subject = subject.to_lowercase();

        let matched = self.skip_rules.iter().find(|rule| {
            let haystack = match rule.field {
                SkipField::From => &sender,
                SkipField::Subject => &subject,
            };
            haystack.contains(&rule.pattern.to_lowercase())
        });

        if let Some(rule) = matched {
            debug!(
                field = rule.field.as_str(),
                pattern = %rule.pattern,
                "Message matched skip rule"
            );
        }
        matched
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(document: &str) -> RuleSet {
        RuleSet::parse(document).unwrap()
    }

    #[test]
    fn parses_categories_in_document_order() {
        let rules = parse(
            "Important emails include:\n\
             - receipts\n\n\
             Routine emails include:\n\
             - statements\n\n\
             Optional emails include:\n\
             - newsletters\n",
        );
        assert_eq!(rules.categories, vec!["Important", "Routine", "Optional"]);
        assert!(rules.skip_rules.is_empty());
    }

    #[test]
    fn duplicate_heading_is_an_error() {
        let err = RuleSet::parse(
            "Important emails include:\n\
             Important emails include:\n",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            RulesError::DuplicateCategory { name } if name == "Important"
        ));
    }

    #[test]
    fn empty_document_parses_to_empty_categories() {
        let rules = parse("");
        assert!(rules.categories.is_empty());
        assert!(rules.skip_rules.is_empty());
    }

    #[test]
    fn heading_must_fill_the_whole_line() {
        let rules = parse("Important emails include: mostly receipts\n");
        assert!(rules.categories.is_empty());
    }

    #[test]
    fn parses_skip_rules() {
        let rules = parse(
            "Important emails include:\n\
             - stuff\n\n\
             Skip classification for:\n\
             - from:ebay@ebay.com\n\
             - subject:Weekly digest\n",
        );
        assert_eq!(
            rules.skip_rules,
            vec![
                SkipRule {
                    field: SkipField::From,
                    pattern: "ebay@ebay.com".into(),
                },
                SkipRule {
                    field: SkipField::Subject,
                    pattern: "Weekly digest".into(),
                },
            ]
        );
    }

    #[test]
    fn skip_value_preserves_internal_colons() {
        let rules = parse(
            "Skip classification for:\n\
             - subject:Re: Your item sold\n",
        );
        assert_eq!(rules.skip_rules[0].pattern, "Re: Your item sold");
    }

    #[test]
    fn skip_field_is_lowercased_and_trimmed() {
        let rules = parse(
            "Skip classification for:\n\
             - FROM : alerts@bank.com\n",
        );
        assert_eq!(rules.skip_rules[0].field, SkipField::From);
        assert_eq!(rules.skip_rules[0].pattern, "alerts@bank.com");
    }

    #[test]
    fn unknown_skip_fields_are_dropped() {
        let rules = parse(
            "Skip classification for:\n\
             - to:me@example.com\n\
             - from:ok@example.com\n",
        );
        assert_eq!(rules.skip_rules.len(), 1);
        assert_eq!(rules.skip_rules[0].pattern, "ok@example.com");
    }

    #[test]
    fn skip_section_ends_at_next_heading() {
        let rules = parse(
            "Skip classification for:\n\
             - from:ebay@ebay.com\n\
             Optional emails include:\n\
             - from:not-a-skip-rule@example.com\n",
        );
        assert_eq!(rules.skip_rules.len(), 1);
        assert_eq!(rules.categories, vec!["Optional"]);
    }

    #[test]
    fn skip_section_heading_is_case_insensitive() {
        let rules = parse(
            "SKIP CLASSIFICATION FOR:\n\
             - from:ebay@ebay.com\n",
        );
        assert_eq!(rules.skip_rules.len(), 1);
    }

    #[test]
    fn empty_skip_section_is_not_an_error() {
        let rules = parse(
            "Important emails include:\n\
             - stuff\n\n\
             Skip classification for:\n",
        );
        assert!(rules.skip_rules.is_empty());
    }

    #[test]
    fn should_skip_matches_from_substring_case_insensitively() {
        let rules = parse(
            "Skip classification for:\n\
             - from:ebay@ebay.com\n",
        );
        let matched = rules.should_skip("eBay <EBAY@ebay.com>", "Your item sold");
        assert_eq!(matched.unwrap().field, SkipField::From);
    }

    #[test]
    fn should_skip_matches_subject_substring() {
        let rules = parse(
            "Skip classification for:\n\
             - subject:Re: Your item sold\n",
        );
        assert!(
            rules
                .should_skip("buyer@example.com", "re: your item sold - invoice")
                .is_some()
        );
    }

    #[test]
    fn should_skip_ignores_non_matching_messages() {
        let rules = parse(
            "Skip classification for:\n\
             - from:ebay@ebay.com\n",
        );
        assert!(
            rules
                .should_skip("alice@example.com", "Lunch tomorrow?")
                .is_none()
        );
    }

    #[test]
    fn empty_rules_never_skip() {
        let rules = parse("Important emails include:\n");
        assert!(rules.should_skip("anyone@example.com", "anything").is_none());
    }
}
