
use crate::{
    criteria::{Comparison, Criteria, CriteriaWhere, Evaluation, SortDirection, WhereGroup,
        WhereValue},
    error::CompileError,
    relation::resolve_relation,
    settings::DatabaseSettings,
    value::Value,
};
use quarry_schema::{
    build::Registry,
    node::EntityDescriptor,
    types::{BackendKind, CasingStyle},
};
use serde::Serialize;
use std::{collections::BTreeMap, sync::Arc};

///
/// KeyValueRequest
///
/// The compiled artifact handed to the key/value execution collaborator.
/// Routed to a "query" call when a key condition exists, otherwise to a
/// "scan" call. Field names serialize in the store's wire casing.
///

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct KeyValueRequest {
    pub table_name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_condition_expression: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_expression: Option<String>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub expression_attribute_names: BTreeMap<String, String>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub expression_attribute_values: BTreeMap<String, Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan_index_forward: Option<bool>,
}

impl KeyValueRequest {
    #[must_use]
    pub const fn is_query(&self) -> bool {
        self.key_condition_expression.is_some()
    }
}

///
/// ExpressionAttribute
///
/// Placeholder set for one leaf predicate. The counter suffix keeps the name
/// and value placeholders unique when the same column appears in several
/// predicates; `column_name` is the physical attribute and is never numbered.
///

struct ExpressionAttribute {
    key_name: String,
    key_placeholder: String,
    value_name: String,
    column_name: String,
}

struct ExpressionResult {
    filter: Option<String>,
    key: Option<String>,
}

///
/// KeyValueQuery
///
/// Walks the criteria tree and partitions predicates between the key
/// condition and the filter expression. A root-level predicate on the
/// primary key, or on the column that fixed the request's index, narrows
/// the query; everything else filters after retrieval. Joins become dotted
/// attribute prefixes instead of relational joins.
///

pub struct KeyValueQuery<'a> {
    registry: &'a Registry,
    settings: &'a DatabaseSettings,
    root: Arc<EntityDescriptor>,
    request: KeyValueRequest,
    attribute_counter: u32,
}

impl<'a> KeyValueQuery<'a> {
    pub fn generate(
        criteria: &Criteria,
        registry: &'a Registry,
        settings: &'a DatabaseSettings,
    ) -> Result<KeyValueRequest, CompileError> {
        let root = registry.expect(&criteria.entity)?;

        let mut query = KeyValueQuery {
            registry,
            settings,
            root: Arc::clone(&root),
            request: KeyValueRequest {
                table_name: table_name(settings, &root),
                ..KeyValueRequest::default()
            },
            attribute_counter: 0,
        };

        query.apply_parameters(&criteria.where_parameters, &root, None)?;
        query.apply_joins(&root, criteria, None)?;
        query.apply_result_set(criteria);

        Ok(query.request)
    }

    fn apply_parameters(
        &mut self,
        parameters: &[CriteriaWhere],
        descriptor: &EntityDescriptor,
        prefix: Option<&str>,
    ) -> Result<(), CompileError> {
        let result = self.build_where_parameters(parameters, descriptor, prefix)?;

        if let Some(fragment) = result.filter {
            self.request.filter_expression = Some(match self.request.filter_expression.take() {
                Some(existing) => format!("{existing} AND ({fragment})"),
                None => fragment,
            });
        }

        if let Some(fragment) = result.key {
            self.request.key_condition_expression =
                Some(match self.request.key_condition_expression.take() {
                    Some(existing) => format!("{existing} AND ({fragment})"),
                    None => fragment,
                });
        }

        Ok(())
    }

    fn build_where_parameters(
        &mut self,
        parameters: &[CriteriaWhere],
        descriptor: &EntityDescriptor,
        prefix: Option<&str>,
    ) -> Result<ExpressionResult, CompileError> {
        let mut filter = String::new();
        let mut key = String::new();

        for parameter in parameters {
            let result = match parameter {
                CriteriaWhere::Value(value) => self.apply_where_value(value, descriptor, prefix)?,
                CriteriaWhere::Group(group) => {
                    Some(self.apply_where_group(group, descriptor, prefix)?)
                }
            };

            let Some(result) = result else { continue };

            if let Some(fragment) = result.filter {
                if !filter.is_empty() {
                    filter.push(' ');
                    filter.push_str(evaluation_keyword(parameter.evaluation()));
                    filter.push(' ');
                }

                filter.push_str(&fragment);
            }

            if let Some(fragment) = result.key {
                // only one partition key path can be the query path
                if !key.is_empty() {
                    key.push_str(" OR ");
                }

                key.push_str(&fragment);
            }
        }

        Ok(ExpressionResult {
            filter: (!filter.is_empty()).then_some(filter),
            key: (!key.is_empty()).then_some(key),
        })
    }

    fn apply_where_value(
        &mut self,
        parameter: &WhereValue,
        descriptor: &EntityDescriptor,
        prefix: Option<&str>,
    ) -> Result<Option<ExpressionResult>, CompileError> {
        let column = descriptor.from_map(&parameter.key)?;

        if column.is_excluded(BackendKind::KeyValue) {
            return Ok(None);
        }

        let value = parameter.value.clone().coerce(column.ty);
        let index_name = column.index_name.clone();

        let eligible = if let Some(prefix) = prefix {
            // a prefix that does not resolve on the root entity is simply not
            // a key path; resolution failures never abort compilation
            let root = Arc::clone(&self.root);
            self.apply_index(prefix, &root);

            root.from_map(prefix)
                .is_ok_and(|prefix_column| prefix_column.index_name == self.request.index_name)
        } else {
            self.apply_index(&parameter.key, descriptor);

            let is_primary_key = self
                .root
                .primary_key()
                .is_ok_and(|primary_key| primary_key.name == parameter.key);

            is_primary_key
                || (index_name.is_some() && index_name == self.request.index_name)
        };

        let expression = self.build_expression(parameter, &value, prefix)?;

        Ok(Some(if eligible {
            ExpressionResult {
                filter: None,
                key: Some(expression),
            }
        } else {
            ExpressionResult {
                filter: Some(expression),
                key: None,
            }
        }))
    }

    fn apply_where_group(
        &mut self,
        group: &WhereGroup,
        descriptor: &EntityDescriptor,
        prefix: Option<&str>,
    ) -> Result<ExpressionResult, CompileError> {
        let result = self.build_where_parameters(&group.where_parameters, descriptor, prefix)?;

        Ok(ExpressionResult {
            filter: result.filter.map(|fragment| format!("({fragment})")),
            key: result.key,
        })
    }

    fn apply_joins(
        &mut self,
        descriptor: &EntityDescriptor,
        criteria: &Criteria,
        prefix: Option<&str>,
    ) -> Result<(), CompileError> {
        for join in &criteria.join_parameters {
            let joined = self.registry.expect(&join.criteria.entity)?;
            let edge = resolve_relation(descriptor, &joined)?;
            let prefix = self.qualify(prefix, &edge.column.name);

            self.apply_parameters(&join.criteria.where_parameters, &joined, Some(&prefix))?;
            self.apply_joins(&joined, &join.criteria, Some(&prefix))?;
        }

        Ok(())
    }

    /// First index wins: once a predicate has fixed the request's index,
    /// later index-bearing columns are not consulted.
    fn apply_index(&mut self, key: &str, descriptor: &EntityDescriptor) {
        if self.request.index_name.is_some() {
            return;
        }

        if let Ok(column) = descriptor.from_map(key) {
            self.request.index_name.clone_from(&column.index_name);
        }
    }

    fn apply_result_set(&mut self, criteria: &Criteria) {
        match criteria.max_result_count {
            Some(count) if count > 0 => {
                self.request.limit = Some(u64::try_from(count).unwrap_or(0));
            }
            _ => {}
        }

        // the store sorts along the key path only; a single flag stands in
        // for the relational compiler's multi-key ordering
        if let Some(parameter) = criteria.order_parameters.first() {
            self.request.scan_index_forward =
                Some(parameter.direction == SortDirection::Ascending);
        }
    }

    fn build_expression(
        &mut self,
        parameter: &WhereValue,
        value: &Value,
        prefix: Option<&str>,
    ) -> Result<String, CompileError> {
        let path = self.column_path(&parameter.key, prefix);
        let attribute = self.qualify_attribute(&path);

        match parameter.comparison {
            Comparison::Between | Comparison::NotBetween => {
                let (low, high) = value.as_range();

                self.request
                    .expression_attribute_names
                    .insert(attribute.key_name.clone(), attribute.column_name.clone());
                self.request
                    .expression_attribute_values
                    .insert(format!("{}BT1", attribute.value_name), low);
                self.request
                    .expression_attribute_values
                    .insert(format!("{}BT2", attribute.value_name), high);
            }
            Comparison::Like | Comparison::NotLike => {
                let mut count = 0;

                for segment in value.to_text().split('%') {
                    if segment.is_empty() {
                        continue;
                    }

                    count += 1;
                    self.request.expression_attribute_names.insert(
                        format!("{}CF{count}", attribute.key_name),
                        attribute.column_name.clone(),
                    );
                    self.request.expression_attribute_values.insert(
                        format!("{}CF{count}", attribute.value_name),
                        Value::Text(segment.to_owned()),
                    );
                }
            }
            Comparison::In | Comparison::NotIn => {
                self.request
                    .expression_attribute_names
                    .insert(attribute.key_name.clone(), attribute.column_name.clone());

                for (index, item) in value.as_items().into_iter().enumerate() {
                    self.request
                        .expression_attribute_values
                        .insert(format!("{}IN{}", attribute.value_name, index + 1), item);
                }
            }
            _ => {
                self.request
                    .expression_attribute_names
                    .insert(attribute.key_name.clone(), attribute.column_name.clone());
                self.request
                    .expression_attribute_values
                    .insert(attribute.value_name.clone(), value.clone());
            }
        }

        create_expression(parameter, value, &attribute)
    }

    /// Logical dotted path for a predicate: join-prefix segments plus the
    /// column key, each in the physical column casing.
    fn column_path(&self, name: &str, prefix: Option<&str>) -> String {
        let mut segments: Vec<String> = prefix
            .map(|prefix| prefix.split('.').map(ToOwned::to_owned).collect())
            .unwrap_or_default();

        segments.push(name.to_owned());

        for segment in &mut segments {
            *segment = self.settings.column_casing().apply(segment);

            if self.settings.flatten_objects() {
                *segment = self.settings.flatten_key_style().apply(segment);
            }
        }

        segments.join(".")
    }

    fn qualify_attribute(&mut self, path: &str) -> ExpressionAttribute {
        self.attribute_counter += 1;
        let counter = self.attribute_counter;

        let segments: Vec<&str> = path.split('.').collect();
        let value_name = CasingStyle::Camel.apply(&format!("{path}{counter}"));

        let root = CasingStyle::Camel.apply(segments[0]);
        let mut column_name = self.settings.column_casing().apply(&root);
        let key_name;
        let key_placeholder;

        if self.settings.flatten_objects() {
            // logical placeholder keeps the camel-cased dotted path; the
            // physical column spells the path with the flatten separator
            key_name = format!("{}{counter}", CasingStyle::Camel.apply(path));
            column_name = path.replace('.', self.settings.flatten_separator());
            key_placeholder = key_name.clone();
        } else if self.settings.relation_depth() > 0 {
            key_name = format!("{root}{counter}");

            let depth = usize::try_from(self.settings.relation_depth()).unwrap_or(usize::MAX);
            let mut suffix: Vec<String> = segments
                .iter()
                .take(depth)
                .skip(1)
                .map(|segment| (*segment).to_owned())
                .collect();

            // segments past the addressable depth collapse into one
            // synthetic pascal-concatenated trailing name
            if segments.len() - suffix.len() > 1 {
                let overflow: String = segments[suffix.len() + 1..]
                    .iter()
                    .map(|segment| CasingStyle::Pascal.apply(segment))
                    .collect();

                suffix.push(self.settings.column_casing().apply(&overflow));
            }

            key_placeholder = if suffix.is_empty() {
                key_name.clone()
            } else {
                format!("{key_name}.{}", suffix.join("."))
            };
        } else {
            let synthetic: String = segments
                .iter()
                .map(|segment| CasingStyle::Pascal.apply(segment))
                .collect();

            column_name = self.settings.column_casing().apply(&synthetic);
            key_name = format!("{column_name}{counter}");
            key_placeholder = key_name.clone();
        }

        ExpressionAttribute {
            key_name: format!("#{key_name}"),
            key_placeholder: format!("#{key_placeholder}"),
            value_name: format!(":{value_name}"),
            column_name,
        }
    }

    fn qualify(&self, prefix: Option<&str>, name: &str) -> String {
        let cased = self.settings.column_casing().apply(name);

        match prefix {
            Some(prefix) => format!("{prefix}.{cased}"),
            None => cased,
        }
    }
}

fn table_name(settings: &DatabaseSettings, descriptor: &EntityDescriptor) -> String {
    let table = settings.table_casing().apply(&descriptor.table_name);

    match (&descriptor.schema, settings.use_schema()) {
        (Some(schema), true) => format!("{}.{table}", settings.schema_casing().apply(schema)),
        _ => table,
    }
}

const fn evaluation_keyword(evaluation: Evaluation) -> &'static str {
    match evaluation {
        Evaluation::And => "AND",
        Evaluation::Or => "OR",
    }
}

fn create_expression(
    parameter: &WhereValue,
    value: &Value,
    attribute: &ExpressionAttribute,
) -> Result<String, CompileError> {
    let expression = match parameter.comparison {
        Comparison::Like | Comparison::NotLike => {
            let mut clauses = Vec::new();
            let mut count = 0;

            for segment in value.to_text().split('%') {
                if segment.is_empty() {
                    continue;
                }

                count += 1;

                let contains = format!(
                    "contains({key}CF{count}, {value}CF{count})",
                    key = attribute.key_placeholder,
                    value = attribute.value_name,
                );

                clauses.push(if parameter.comparison == Comparison::NotLike {
                    format!("NOT {contains}")
                } else {
                    contains
                });
            }

            format!("({})", clauses.join(" AND "))
        }
        Comparison::Between | Comparison::NotBetween => {
            let between = format!(
                "{key} BETWEEN {value}BT1 AND {value}BT2",
                key = attribute.key_placeholder,
                value = attribute.value_name,
            );

            if parameter.comparison == Comparison::NotBetween {
                format!("NOT ({between})")
            } else {
                between
            }
        }
        Comparison::In | Comparison::NotIn => {
            let placeholders: Vec<String> = (1..=value.as_items().len())
                .map(|index| format!("{}IN{index}", attribute.value_name))
                .collect();
            let membership =
                format!("{} IN ({})", attribute.key_placeholder, placeholders.join(","));

            if parameter.comparison == Comparison::NotIn {
                format!("NOT ({membership})")
            } else {
                membership
            }
        }
        comparison => format!(
            "{} {} {}",
            attribute.key_placeholder,
            comparison_keyword(comparison)?,
            attribute.value_name,
        ),
    };

    Ok(expression)
}

fn comparison_keyword(comparison: Comparison) -> Result<&'static str, CompileError> {
    match comparison {
        Comparison::Equal => Ok("="),
        Comparison::NotEqual => Ok("<>"),
        Comparison::GreaterThan => Ok(">"),
        Comparison::GreaterThanEqualTo => Ok(">="),
        Comparison::LessThan => Ok("<"),
        Comparison::LessThanEqualTo => Ok("<="),
        Comparison::Between
        | Comparison::In
        | Comparison::Like
        | Comparison::NotBetween
        | Comparison::NotIn
        | Comparison::NotLike => Err(CompileError::UnsupportedComparison { comparison }),
    }
}
