use quarry_schema::types::CasingStyle;
use serde::{Deserialize, Serialize};

///
/// FlattenSettings
///
/// How nested-document backends spell a dotted relation path as one
/// physical column name.
///

#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct FlattenSettings {
    pub separator: String,

    #[serde(default)]
    pub key_style: Option<CasingStyle>,
}

///
/// DatabaseSettings
///
/// Per-connection compilation knobs. Every getter applies the documented
/// default so callers can deserialize a partial table.
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub flatten: Option<FlattenSettings>,
    pub relation_depth: Option<u32>,
    pub column_casing: Option<CasingStyle>,
    pub schema_casing: Option<CasingStyle>,
    pub table_casing: Option<CasingStyle>,
    pub use_schema: Option<bool>,
}

impl DatabaseSettings {
    #[must_use]
    pub const fn flatten_objects(&self) -> bool {
        self.flatten.is_some()
    }

    #[must_use]
    pub fn flatten_separator(&self) -> &str {
        self.flatten
            .as_ref()
            .map_or("", |flatten| flatten.separator.as_str())
    }

    #[must_use]
    pub fn flatten_key_style(&self) -> CasingStyle {
        self.flatten
            .as_ref()
            .and_then(|flatten| flatten.key_style)
            .unwrap_or_default()
    }

    #[must_use]
    pub const fn relation_depth(&self) -> u32 {
        match self.relation_depth {
            Some(depth) => depth,
            None => 0,
        }
    }

    #[must_use]
    pub fn column_casing(&self) -> CasingStyle {
        self.column_casing.unwrap_or(CasingStyle::Snake)
    }

    #[must_use]
    pub fn schema_casing(&self) -> CasingStyle {
        self.schema_casing.unwrap_or(CasingStyle::Snake)
    }

    #[must_use]
    pub fn table_casing(&self) -> CasingStyle {
        self.table_casing.unwrap_or(CasingStyle::Snake)
    }

    #[must_use]
    pub fn use_schema(&self) -> bool {
        self.use_schema.unwrap_or(false)
    }
}
