//! Static historical knowledge
//!
//! Canonical question patterns with fixed answers. Checked before any search
//! provider is called.

use crate::extractor::{contains_phrase, normalize};

pub const WORLD_WAR_II_END: &str = "World War II ended in 1945: in Europe on 8 May 1945 (V-E Day), \
and in the Pacific on 2 September 1945, when Japan formally signed the instrument of surrender.";

struct KnowledgeEntry {
    /// Normalized question patterns
    patterns: &'static [&'static str],
    answer: &'static str,
}

const ENTRIES: &[KnowledgeEntry] = &[
    KnowledgeEntry {
        patterns: &[
            "when did world war ii end",
            "when did world war 2 end",
            "when did ww2 end",
            "when did wwii end",
            "when did the second world war end",
            "end of world war ii",
            "end of world war 2",
        ],
        answer: WORLD_WAR_II_END,
    },
    KnowledgeEntry {
        patterns: &[
            "when did world war i end",
            "when did world war 1 end",
            "when did ww1 end",
            "when did wwi end",
            "when did the first world war end",
        ],
        answer: "World War I ended with the Armistice of 11 November 1918; \
                 the Treaty of Versailles was signed on 28 June 1919.",
    },
    KnowledgeEntry {
        patterns: &[
            "when did the berlin wall fall",
            "fall of the berlin wall",
        ],
        answer: "The Berlin Wall fell on 9 November 1989.",
    },
    KnowledgeEntry {
        patterns: &[
            "when did humans land on the moon",
            "when was the moon landing",
            "when did apollo 11 land",
        ],
        answer: "Apollo 11 landed on the Moon on 20 July 1969.",
    },
    KnowledgeEntry {
        patterns: &[
            "when did the titanic sink",
            "when was the titanic sunk",
        ],
        answer: "The Titanic sank in the early hours of 15 April 1912.",
    },
];

/// Exact match first, then phrase containment
pub fn lookup(text: &str) -> Option<&'static str> {
    let normalized = normalize(text);
    if normalized.is_empty() {
        return None;
    }

    ENTRIES
        .iter()
        .find(|e| e.patterns.iter().any(|p| *p == normalized))
        .or_else(|| {
            ENTRIES
                .iter()
                .find(|e| e.patterns.iter().any(|p| contains_phrase(&normalized, p)))
        })
        .map(|e| e.answer)
}
