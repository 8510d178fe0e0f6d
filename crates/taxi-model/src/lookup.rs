//! Static code lookups for coded trip attributes.
//!
//! Labels follow the TLC yellow-taxi data dictionary. These tables are
//! reference data, not derived from the extract: a code that is missing here
//! simply has no label.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

const VENDOR_LABELS: &[(i64, &str)] = &[
    (1, "Creative Mobile Technologies, LLC"),
    (2, "VeriFone Inc."),
];

const RATE_CODE_LABELS: &[(i64, &str)] = &[
    (1, "Standard rate"),
    (2, "JFK"),
    (3, "Newark"),
    (4, "Nassau or Westchester"),
    (5, "Negotiated fare"),
    (6, "Group ride"),
];

const PAYMENT_TYPE_LABELS: &[(i64, &str)] = &[
    (1, "Credit card"),
    (2, "Cash"),
    (3, "No charge"),
    (4, "Dispute"),
    (5, "Unknown"),
    (6, "Voided trip"),
];

/// A fixed mapping from a small integer code to a human-readable label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeLookup {
    /// Lookup name, used in summaries (e.g. "vendor").
    pub name: String,
    labels: BTreeMap<i64, String>,
}

impl CodeLookup {
    /// Build a lookup from `(code, label)` pairs.
    pub fn new<I, S>(name: impl Into<String>, entries: I) -> Self
    where
        I: IntoIterator<Item = (i64, S)>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            labels: entries
                .into_iter()
                .map(|(code, label)| (code, label.into()))
                .collect(),
        }
    }

    /// Vendor names.
    pub fn vendor() -> Self {
        Self::new("vendor", VENDOR_LABELS.iter().copied())
    }

    /// Rate-code descriptions.
    pub fn rate_code() -> Self {
        Self::new("rate_code", RATE_CODE_LABELS.iter().copied())
    }

    /// Payment-type descriptions.
    pub fn payment_type() -> Self {
        Self::new("payment_type", PAYMENT_TYPE_LABELS.iter().copied())
    }

    /// All lookups shipped with the default schema.
    pub fn builtin() -> Vec<Self> {
        vec![Self::vendor(), Self::rate_code(), Self::payment_type()]
    }

    /// Label for a code, `None` when the code is not listed.
    pub fn label(&self, code: i64) -> Option<&str> {
        self.labels.get(&code).map(String::as_str)
    }

    /// Iterate `(code, label)` pairs in code order.
    pub fn entries(&self) -> impl Iterator<Item = (i64, &str)> {
        self.labels.iter().map(|(code, label)| (*code, label.as_str()))
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
