// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Issue classification for HTML scanner findings.
//!
//! Each finding is matched against [`RULES`] in order and takes the first
//! rule whose keywords appear in its lower-cased code or message. A finding
//! often matches several rules ("image link"), so the table order is part
//! of the contract. Unmatched findings fall back to [`Category::Other`].

use crate::scanner::RawFinding;
use serde::{Deserialize, Serialize};

/// Remediation category of a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Images,
    Links,
    Headings,
    Language,
    Contrast,
    Tables,
    Forms,
    Other,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Images,
        Category::Links,
        Category::Headings,
        Category::Language,
        Category::Contrast,
        Category::Tables,
        Category::Forms,
        Category::Other,
    ];
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Category::Images => "images",
            Category::Links => "links",
            Category::Headings => "headings",
            Category::Language => "language",
            Category::Contrast => "contrast",
            Category::Tables => "tables",
            Category::Forms => "forms",
            Category::Other => "other",
        };
        write!(f, "{}", name)
    }
}

/// Whether a category's findings can be repaired without judgment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fixability {
    Never,
    Always,
    /// Fixable only when the lower-cased message contains the keyword
    WhenMessageContains(&'static str),
}

impl Fixability {
    fn applies(&self, message: &str) -> bool {
        match self {
            Fixability::Never => false,
            Fixability::Always => true,
            Fixability::WhenMessageContains(kw) => message.contains(kw),
        }
    }
}

/// One row of the classification table
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub category: Category,
    pub code_keywords: &'static [&'static str],
    pub message_keywords: &'static [&'static str],
    pub fixability: Fixability,
    pub hint: &'static str,
}

impl Rule {
    /// Match against an already lower-cased code and message
    pub fn matches(&self, code: &str, message: &str) -> bool {
        self.code_keywords.iter().any(|kw| code.contains(kw))
            || self.message_keywords.iter().any(|kw| message.contains(kw))
    }
}

/// Classification table, highest priority first
pub const RULES: &[Rule] = &[
    Rule {
        category: Category::Images,
        code_keywords: &["alt"],
        message_keywords: &["image", "img", "alt attribute", "alt text"],
        fixability: Fixability::Never,
        hint: "Generate descriptive alt text based on image content and context",
    },
    Rule {
        category: Category::Links,
        code_keywords: &["link"],
        message_keywords: &["anchor"],
        fixability: Fixability::WhenMessageContains("empty"),
        hint: "Make link text descriptive of destination",
    },
    Rule {
        category: Category::Headings,
        code_keywords: &["heading"],
        message_keywords: &["h1", "h2"],
        fixability: Fixability::Never,
        hint: "Ensure proper heading hierarchy (h1 > h2 > h3)",
    },
    Rule {
        category: Category::Language,
        code_keywords: &["lang"],
        message_keywords: &["language"],
        fixability: Fixability::Always,
        hint: "Add lang attribute to html element",
    },
    Rule {
        category: Category::Contrast,
        code_keywords: &["contrast"],
        message_keywords: &["color"],
        fixability: Fixability::Never,
        hint: "Adjust colors to meet 4.5:1 contrast ratio",
    },
    Rule {
        category: Category::Tables,
        code_keywords: &["table"],
        message_keywords: &[],
        fixability: Fixability::Never,
        hint: "Add proper table headers and scope attributes",
    },
    Rule {
        category: Category::Forms,
        code_keywords: &["label"],
        message_keywords: &["form"],
        fixability: Fixability::Never,
        hint: "Associate labels with form controls",
    },
];

/// A scanner finding with its remediation category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedIssue {
    #[serde(flatten)]
    pub finding: RawFinding,
    pub category: Category,
    pub auto_fixable: bool,
    pub remediation_hint: String,
}

/// First rule matching `finding`, if any
pub fn matching_rule(finding: &RawFinding) -> Option<&'static Rule> {
    let code = finding.code.to_lowercase();
    let message = finding.message.to_lowercase();
    RULES.iter().find(|rule| rule.matches(&code, &message))
}

/// Classify one finding
pub fn classify(finding: &RawFinding) -> ClassifiedIssue {
    let message = finding.message.to_lowercase();

    let (category, auto_fixable, hint) = match matching_rule(finding) {
        Some(rule) => (rule.category, rule.fixability.applies(&message), rule.hint),
        None => (Category::Other, false, ""),
    };

    ClassifiedIssue {
        finding: finding.clone(),
        category,
        auto_fixable,
        remediation_hint: hint.to_string(),
    }
}
