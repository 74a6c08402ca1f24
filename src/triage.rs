//! Keyword-based triage classification of SOS messages.
//!
//! Classification is deterministic, stateless and deliberately simple: a
//! case-insensitive substring match against four ordered keyword tiers.
//! The first tier with any hit wins regardless of where the keyword sits in
//! the text, so "trapped with severe bleeding" classifies Critical, not
//! High. The tier table is a `pub const` so word lists can be tuned for a
//! deployment region without touching the matching logic.

use crate::model::Priority;

/// One priority tier of the classifier.
#[derive(Debug, Clone, Copy)]
pub struct Tier {
    pub priority: Priority,
    pub category: &'static str,
    pub keywords: &'static [&'static str],
}

/// Keyword tiers in precedence order (first match wins).
pub const TIERS: [Tier; 4] = [
    Tier {
        priority: Priority::Critical,
        category: "Major Injury",
        keywords: &["bleeding", "severe", "life", "unconscious", "stroke", "dying"],
    },
    Tier {
        priority: Priority::High,
        category: "Trapped/Rising Water",
        keywords: &["trapped", "water", "drowning", "stuck", "flood", "fire", "rising"],
    },
    Tier {
        priority: Priority::Moderate,
        category: "Medical Supplies Need",
        keywords: &["pain", "hurt", "medicine", "supplies", "medical", "injury"],
    },
    Tier {
        priority: Priority::Low,
        category: "Food/Water Depletion",
        keywords: &["food", "hungry", "thirsty", "starving"],
    },
];

/// Category assigned when no tier matches.
pub const FALLBACK_CATEGORY: &str = "General Assistance";

/// Result of classifying one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub priority: Priority,
    pub category: &'static str,
}

/// Classify a free-text emergency message into a priority and category.
pub fn classify(message: &str) -> Classification {
    let text = message.to_lowercase();

    for tier in &TIERS {
        if tier.keywords.iter().any(|k| text.contains(k)) {
            return Classification {
                priority: tier.priority,
                category: tier.category,
            };
        }
    }

    Classification {
        priority: Priority::Low,
        category: FALLBACK_CATEGORY,
    }
}
