use crate::value::Value;
use derive_more::Display;
use serde::Serialize;

///
/// Criteria model
///
/// Pure, backend-agnostic description of filters, sorts, joins, and
/// pagination against one entity type. This layer carries no schema
/// knowledge; the compilers interpret it against the registry.
///

///
/// Comparison
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Serialize)]
#[remain::sorted]
pub enum Comparison {
    Between,
    Equal,
    GreaterThan,
    GreaterThanEqualTo,
    In,
    LessThan,
    LessThanEqualTo,
    Like,
    NotBetween,
    NotEqual,
    NotIn,
    NotLike,
}

///
/// Evaluation
///
/// How a node combines with its preceding sibling in the same group. The tag
/// on the first element of a group is never consulted.
///

#[derive(Clone, Copy, Debug, Default, Display, Eq, PartialEq, Serialize)]
#[remain::sorted]
pub enum Evaluation {
    #[default]
    And,
    Or,
}

///
/// JoinKind
///

#[derive(Clone, Copy, Debug, Default, Display, Eq, PartialEq, Serialize)]
#[remain::sorted]
pub enum JoinKind {
    Cross,
    FullOuter,
    #[default]
    Inner,
    Left,
    LeftOuter,
    Outer,
    Right,
    RightOuter,
}

///
/// SortDirection
///

#[derive(Clone, Copy, Debug, Default, Display, Eq, PartialEq, Serialize)]
#[remain::sorted]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

///
/// WhereValue
///
/// One leaf predicate: column key, comparison, value.
///

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WhereValue {
    pub key: String,
    pub value: Value,
    pub comparison: Comparison,
    pub evaluation: Evaluation,
}

impl WhereValue {
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<Value>, comparison: Comparison) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            comparison,
            evaluation: Evaluation::And,
        }
    }

    #[must_use]
    pub fn eq(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(key, value, Comparison::Equal)
    }

    #[must_use]
    pub fn ne(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(key, value, Comparison::NotEqual)
    }

    #[must_use]
    pub fn gt(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(key, value, Comparison::GreaterThan)
    }

    #[must_use]
    pub fn gte(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(key, value, Comparison::GreaterThanEqualTo)
    }

    #[must_use]
    pub fn lt(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(key, value, Comparison::LessThan)
    }

    #[must_use]
    pub fn lte(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(key, value, Comparison::LessThanEqualTo)
    }

    #[must_use]
    pub fn like(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(key, value, Comparison::Like)
    }

    #[must_use]
    pub fn not_like(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(key, value, Comparison::NotLike)
    }

    #[must_use]
    pub fn between(key: impl Into<String>, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        Self::new(
            key,
            Value::List(vec![low.into(), high.into()]),
            Comparison::Between,
        )
    }

    #[must_use]
    pub fn not_between(
        key: impl Into<String>,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Self {
        Self::new(
            key,
            Value::List(vec![low.into(), high.into()]),
            Comparison::NotBetween,
        )
    }

    #[must_use]
    pub fn is_in(key: impl Into<String>, values: Vec<Value>) -> Self {
        Self::new(key, Value::List(values), Comparison::In)
    }

    #[must_use]
    pub fn not_in(key: impl Into<String>, values: Vec<Value>) -> Self {
        Self::new(key, Value::List(values), Comparison::NotIn)
    }

    /// Or-combine this node with its preceding sibling.
    #[must_use]
    pub const fn or(mut self) -> Self {
        self.evaluation = Evaluation::Or;
        self
    }
}

///
/// WhereGroup
///
/// A parenthesized nested group. `any` keeps the "find any of these
/// combinations" convenience: Or between groups, with the combinator inside
/// the group chosen at the call site.
///

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WhereGroup {
    pub evaluation: Evaluation,
    pub where_parameters: Vec<CriteriaWhere>,
}

impl WhereGroup {
    #[must_use]
    pub const fn new(evaluation: Evaluation) -> Self {
        Self {
            evaluation,
            where_parameters: Vec::new(),
        }
    }

    #[must_use]
    pub const fn any() -> Self {
        Self::new(Evaluation::Or)
    }

    /// Build a group from plain key/value entries, each compared with Equal
    /// and combined inside the group by `inner`.
    #[must_use]
    pub fn with_entries<K, V>(
        evaluation: Evaluation,
        inner: Evaluation,
        entries: impl IntoIterator<Item = (K, V)>,
    ) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let mut group = Self::new(evaluation);

        for (key, value) in entries {
            let mut parameter = WhereValue::eq(key, value);
            parameter.evaluation = inner;
            group = group.add(parameter);
        }

        group
    }

    #[must_use]
    pub fn add(mut self, parameter: impl Into<CriteriaWhere>) -> Self {
        self.where_parameters.push(parameter.into());
        self
    }
}

///
/// CriteriaWhere
///

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum CriteriaWhere {
    Value(WhereValue),
    Group(WhereGroup),
}

impl CriteriaWhere {
    #[must_use]
    pub const fn evaluation(&self) -> Evaluation {
        match self {
            Self::Value(value) => value.evaluation,
            Self::Group(group) => group.evaluation,
        }
    }
}

impl From<WhereValue> for CriteriaWhere {
    fn from(value: WhereValue) -> Self {
        Self::Value(value)
    }
}

impl From<WhereGroup> for CriteriaWhere {
    fn from(group: WhereGroup) -> Self {
        Self::Group(group)
    }
}

///
/// OrderParameter
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct OrderParameter {
    pub key: String,
    pub direction: SortDirection,
    pub precedence: i32,
}

///
/// JoinParameter
///

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct JoinParameter {
    pub criteria: Criteria,
    pub kind: JoinKind,
    pub column: Option<String>,
}

///
/// Criteria
///
/// Builder methods append and never mutate prior elements: the order of
/// calls is the order of the tree. Limits and offsets are stored untouched;
/// the compilers ignore non-positive values.
///

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Criteria {
    pub entity: String,
    pub columns: Vec<String>,
    pub where_parameters: Vec<CriteriaWhere>,
    pub join_parameters: Vec<JoinParameter>,
    pub order_parameters: Vec<OrderParameter>,
    pub max_result_count: Option<i64>,
    pub result_offset: Option<i64>,
}

impl Criteria {
    #[must_use]
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            columns: Vec::new(),
            where_parameters: Vec::new(),
            join_parameters: Vec::new(),
            order_parameters: Vec::new(),
            max_result_count: None,
            result_offset: None,
        }
    }

    /// Projection hint; execution collaborators may narrow their column set.
    #[must_use]
    pub fn select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.extend(columns.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn filter(mut self, parameter: impl Into<CriteriaWhere>) -> Self {
        self.where_parameters.push(parameter.into());
        self
    }

    #[must_use]
    pub fn join(self, criteria: Self) -> Self {
        self.join_with(criteria, JoinKind::Inner, None)
    }

    #[must_use]
    pub fn join_with(mut self, criteria: Self, kind: JoinKind, column: Option<String>) -> Self {
        self.join_parameters.push(JoinParameter {
            criteria,
            kind,
            column,
        });
        self
    }

    #[must_use]
    pub fn order_by(self, key: impl Into<String>, direction: SortDirection) -> Self {
        self.order_by_with(key, direction, 1)
    }

    #[must_use]
    pub fn order_by_with(
        mut self,
        key: impl Into<String>,
        direction: SortDirection,
        precedence: i32,
    ) -> Self {
        self.order_parameters.push(OrderParameter {
            key: key.into(),
            direction,
            precedence,
        });
        self
    }

    #[must_use]
    pub const fn limit(mut self, limit: i64) -> Self {
        self.max_result_count = Some(limit);
        self
    }

    #[must_use]
    pub const fn start_at(mut self, offset: i64) -> Self {
        self.result_offset = Some(offset);
        self
    }
}
