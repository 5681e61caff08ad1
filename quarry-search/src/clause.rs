//! Primitive search clauses.
//!
//! Clauses are plain values. Nothing here checks field names or value
//! types; the engine rejects bad ones when the query runs.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value, json};

/// A single search predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// Exact value equality.
    Term {
        /// Field name.
        field: String,
        /// Value to match.
        value: Value,
    },
    /// Membership in a list of values. The engine rejects an empty list.
    Terms {
        /// Field name.
        field: String,
        /// Accepted values, in order.
        values: Vec<Value>,
    },
    /// Analyzed full-text match.
    Match {
        /// Field name.
        field: String,
        /// Query text.
        value: Value,
    },
    /// Analyzed phrase match.
    MatchPhrase {
        /// Field name.
        field: String,
        /// Phrase text.
        value: Value,
    },
    /// Numeric or date range.
    Range(Range),
    /// The field has a value.
    Exists {
        /// Field name.
        field: String,
    },
}

impl Clause {
    /// Term equality clause.
    pub fn term(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Clause::Term {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Multi-value membership clause.
    pub fn terms<V, I>(field: impl Into<String>, values: I) -> Self
    where
        V: Into<Value>,
        I: IntoIterator<Item = V>,
    {
        Clause::Terms {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Full-text match clause.
    pub fn matches(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Clause::Match {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Phrase match clause.
    pub fn match_phrase(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Clause::MatchPhrase {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Range clause built from bounds applied in order.
    ///
    /// ```rust
    /// use quarry_search::{Clause, gte, lt};
    ///
    /// let clause = Clause::range("age", [gte(18), lt(65)]);
    /// assert_eq!(
    ///     clause.to_json(),
    ///     serde_json::json!({ "range": { "age": { "gte": 18, "lt": 65 } } })
    /// );
    /// ```
    pub fn range<I>(field: impl Into<String>, bounds: I) -> Self
    where
        I: IntoIterator<Item = Bound>,
    {
        let mut range = Range::new(field);
        for bound in bounds {
            range = range.apply(bound);
        }
        Clause::Range(range)
    }

    /// Field existence clause.
    pub fn exists(field: impl Into<String>) -> Self {
        Clause::Exists {
            field: field.into(),
        }
    }

    /// Field the clause applies to.
    pub fn field(&self) -> &str {
        match self {
            Clause::Term { field, .. }
            | Clause::Terms { field, .. }
            | Clause::Match { field, .. }
            | Clause::MatchPhrase { field, .. }
            | Clause::Exists { field } => field,
            Clause::Range(range) => &range.field,
        }
    }

    /// Query DSL form of the clause.
    pub fn to_json(&self) -> Value {
        match self {
            Clause::Term { field, value } => json!({ "term": { field: value } }),
            Clause::Terms { field, values } => json!({ "terms": { field: values } }),
            Clause::Match { field, value } => json!({ "match": { field: { "query": value } } }),
            Clause::MatchPhrase { field, value } => {
                json!({ "match_phrase": { field: { "query": value } } })
            }
            Clause::Range(range) => range.to_json(),
            Clause::Exists { field } => json!({ "exists": { "field": field } }),
        }
    }
}

impl Serialize for Clause {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// One side of a range.
#[derive(Debug, Clone, PartialEq)]
pub enum Bound {
    /// Strictly greater than.
    Gt(Value),
    /// Greater than or equal.
    Gte(Value),
    /// Strictly less than.
    Lt(Value),
    /// Less than or equal.
    Lte(Value),
}

/// `field > value`.
pub fn gt(value: impl Into<Value>) -> Bound {
    Bound::Gt(value.into())
}

/// `field >= value`.
pub fn gte(value: impl Into<Value>) -> Bound {
    Bound::Gte(value.into())
}

/// `field < value`.
pub fn lt(value: impl Into<Value>) -> Bound {
    Bound::Lt(value.into())
}

/// `field <= value`.
pub fn lte(value: impl Into<Value>) -> Bound {
    Bound::Lte(value.into())
}

/// Range with at most one lower and one upper bound.
///
/// `gt` and `gte` share the lower slot, `lt` and `lte` the upper one; a later
/// bound replaces an earlier one on the same side.
#[derive(Debug, Clone, PartialEq)]
pub struct Range {
    field: String,
    lower: Option<(Value, bool)>,
    upper: Option<(Value, bool)>,
}

impl Range {
    /// Unbounded range on `field`.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            lower: None,
            upper: None,
        }
    }

    /// Apply a bound, replacing the previous bound on the same side.
    pub fn apply(mut self, bound: Bound) -> Self {
        match bound {
            Bound::Gt(v) => self.lower = Some((v, false)),
            Bound::Gte(v) => self.lower = Some((v, true)),
            Bound::Lt(v) => self.upper = Some((v, false)),
            Bound::Lte(v) => self.upper = Some((v, true)),
        }
        self
    }

    /// Set greater than.
    pub fn gt(self, value: impl Into<Value>) -> Self {
        self.apply(Bound::Gt(value.into()))
    }

    /// Set greater than or equal.
    pub fn gte(self, value: impl Into<Value>) -> Self {
        self.apply(Bound::Gte(value.into()))
    }

    /// Set less than.
    pub fn lt(self, value: impl Into<Value>) -> Self {
        self.apply(Bound::Lt(value.into()))
    }

    /// Set less than or equal.
    pub fn lte(self, value: impl Into<Value>) -> Self {
        self.apply(Bound::Lte(value.into()))
    }

    fn to_json(&self) -> Value {
        let mut bounds = Map::new();

        if let Some((v, inclusive)) = &self.lower {
            let key = if *inclusive { "gte" } else { "gt" };
            bounds.insert(key.to_string(), v.clone());
        }
        if let Some((v, inclusive)) = &self.upper {
            let key = if *inclusive { "lte" } else { "lt" };
            bounds.insert(key.to_string(), v.clone());
        }

        json!({ "range": { &self.field: bounds } })
    }
}

impl From<Range> for Clause {
    fn from(range: Range) -> Self {
        Clause::Range(range)
    }
}
