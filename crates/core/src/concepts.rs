//! Static concept expansion, a cheap stand-in for a learned embedding.

use std::collections::{BTreeMap, HashSet};

/// Expands a token sequence with related terms.
///
/// Implementations must return a superset of the input and must not recurse
/// into terms they added themselves.
pub trait ConceptExpander: Send + Sync {
    fn expand(&self, tokens: &[String]) -> Expansion;

    fn is_concept(&self, term: &str) -> bool;
}

/// Expanded multiset of terms. Order is not significant; duplicates are kept
/// so term frequencies reflect every occurrence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expansion {
    pub terms: Vec<String>,
}

impl Expansion {
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn contains(&self, term: &str) -> bool {
        self.terms.iter().any(|candidate| candidate == term)
    }

    /// Distinct terms in first-seen order, for logging and inspection.
    pub fn distinct(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.terms
            .iter()
            .filter(|term| seen.insert(term.as_str()))
            .cloned()
            .collect()
    }
}

const DEFAULT_CONCEPTS: [(&str, &[&str]); 6] = [
    (
        "fruit",
        &[
            "apple", "apples", "banana", "bananas", "orange", "oranges", "grape", "grapes",
            "berry", "berries", "fruits", "pear", "pears", "lemon", "lemons", "mango",
            "mangoes", "cherry", "cherries", "peach", "peaches", "plum", "plums", "melons",
            "citrus",
        ],
    ),
    (
        "food",
        &[
            "meal", "meals", "recipe", "recipes", "cooking", "dinner", "lunch", "breakfast",
            "snack", "cuisine",
        ],
    ),
    (
        "color",
        &[
            "red", "blue", "green", "yellow", "purple", "black", "white", "colour", "colors",
        ],
    ),
    (
        "animal",
        &[
            "dog", "dogs", "cat", "cats", "bird", "birds", "horse", "horses", "pet", "pets",
        ],
    ),
    (
        "technology",
        &[
            "computer", "computers", "software", "hardware", "internet", "digital",
            "programming", "network",
        ],
    ),
    (
        "business",
        &[
            "company", "companies", "revenue", "profit", "sales", "market", "marketing",
            "finance",
        ],
    ),
];

/// Hand-curated concept table with forward (`concept -> terms`) and reverse
/// (`term -> concepts`) lookups.
#[derive(Debug, Clone)]
pub struct StaticConceptTable {
    related: BTreeMap<String, Vec<String>>,
    reverse: BTreeMap<String, Vec<String>>,
}

impl StaticConceptTable {
    pub fn new<I, K, T>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Vec<T>)>,
        K: Into<String>,
        T: Into<String>,
    {
        let mut related = BTreeMap::new();
        let mut reverse: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for (concept, terms) in entries {
            let concept = concept.into();
            let terms: Vec<String> = terms.into_iter().map(Into::into).collect();
            for term in &terms {
                let owners = reverse.entry(term.clone()).or_default();
                if !owners.contains(&concept) {
                    owners.push(concept.clone());
                }
            }
            related.insert(concept, terms);
        }

        Self { related, reverse }
    }

    pub fn concepts(&self) -> impl Iterator<Item = &str> {
        self.related.keys().map(String::as_str)
    }
}

impl Default for StaticConceptTable {
    fn default() -> Self {
        Self::new(
            DEFAULT_CONCEPTS
                .iter()
                .map(|(concept, terms)| (*concept, terms.to_vec())),
        )
    }
}

impl ConceptExpander for StaticConceptTable {
    fn expand(&self, tokens: &[String]) -> Expansion {
        let mut terms = tokens.to_vec();

        for token in tokens {
            if let Some(related) = self.related.get(token) {
                terms.extend(related.iter().cloned());
            }
            if let Some(concepts) = self.reverse.get(token) {
                terms.extend(concepts.iter().cloned());
            }
        }

        Expansion { terms }
    }

    fn is_concept(&self, term: &str) -> bool {
        self.related.contains_key(term)
    }
}
