use chrono::{DateTime, Timelike, Utc};
use quarry_schema::types::ColumnDataType;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::{self, Display};
use uuid::Uuid;

///
/// Value
///
/// Backend-agnostic scalar carried by criteria predicates and records.
/// `Record` holds a nested entity value; compilers never receive one past the
/// record-mapping layer.
///

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
#[remain::sorted]
pub enum Value {
    Bool(bool),
    Date(DateTime<Utc>),
    Float(f64),
    Guid(Uuid),
    Int(i64),
    List(Vec<Value>),
    Null,
    Record(BTreeMap<String, Value>),
    Text(String),
}

impl Value {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Coerce towards the declared column data type. Coercion is total: a
    /// value that cannot be converted is passed through unchanged, matching
    /// the write-path behavior of storing what the caller supplied.
    #[must_use]
    pub fn coerce(self, ty: ColumnDataType) -> Self {
        if let Self::List(items) = self {
            return Self::List(items.into_iter().map(|item| item.coerce(ty)).collect());
        }

        match ty {
            ColumnDataType::Boolean | ColumnDataType::Entity | ColumnDataType::Undetermined => self,
            ColumnDataType::Date => self.coerce_date(),
            ColumnDataType::Float => self.coerce_float(),
            ColumnDataType::Guid => self.coerce_guid(),
            ColumnDataType::Number => self.coerce_number(),
            ColumnDataType::Text => self.coerce_text(),
        }
    }

    /// Dates are truncated to whole seconds everywhere they are stored.
    fn coerce_date(self) -> Self {
        match self {
            Self::Text(text) => DateTime::parse_from_rfc3339(&text).map_or_else(
                |_| Self::Text(text),
                |parsed| Self::Date(truncate_to_second(parsed.with_timezone(&Utc))),
            ),
            Self::Date(date) => Self::Date(truncate_to_second(date)),
            other => other,
        }
    }

    fn coerce_float(self) -> Self {
        match self {
            Self::Text(text) => text
                .trim()
                .parse::<f64>()
                .map_or_else(|_| Self::Text(text), Self::Float),
            #[expect(clippy::cast_precision_loss)]
            Self::Int(number) => Self::Float(number as f64),
            other => other,
        }
    }

    fn coerce_guid(self) -> Self {
        match self {
            Self::Text(text) => Uuid::parse_str(text.trim())
                .map_or_else(|_| Self::Text(text), Self::Guid),
            other => other,
        }
    }

    fn coerce_number(self) -> Self {
        match self {
            Self::Text(text) => text
                .trim()
                .parse::<i64>()
                .map_or_else(|_| Self::Text(text), Self::Int),
            #[expect(clippy::cast_possible_truncation)]
            Self::Float(number) => Self::Int(number as i64),
            other => other,
        }
    }

    fn coerce_text(self) -> Self {
        match self {
            Self::Bool(_) | Self::Date(_) | Self::Float(_) | Self::Guid(_) | Self::Int(_) => {
                Self::Text(self.to_string())
            }
            other => other,
        }
    }

    /// Low/high pair for range comparisons; missing bounds become `Null`.
    #[must_use]
    pub fn as_range(&self) -> (Self, Self) {
        match self {
            Self::List(items) => (
                items.first().cloned().unwrap_or(Self::Null),
                items.get(1).cloned().unwrap_or(Self::Null),
            ),
            other => (other.clone(), Self::Null),
        }
    }

    /// Element list for membership comparisons; a scalar is a one-element set.
    #[must_use]
    pub fn as_items(&self) -> Vec<Self> {
        match self {
            Self::List(items) => items.clone(),
            other => vec![other.clone()],
        }
    }

    /// Text form used when a comparison needs to split or embed the value.
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            other => other.to_string(),
        }
    }
}

fn truncate_to_second(date: DateTime<Utc>) -> DateTime<Utc> {
    date.with_nanosecond(0).unwrap_or(date)
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Date(value) => write!(f, "{}", value.to_rfc3339()),
            Self::Float(value) => write!(f, "{value}"),
            Self::Guid(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::List(items) => {
                let rendered: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "{}", rendered.join(","))
            }
            Self::Null => write!(f, "null"),
            Self::Record(_) => write!(f, "<record>"),
            Self::Text(value) => write!(f, "{value}"),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Uuid> for Value {
    fn from(value: Uuid) -> Self {
        Self::Guid(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Date(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Self::List(value)
    }
}
