#[cfg(test)]
mod tests;

use crate::{
    criteria::{Comparison, Criteria, CriteriaWhere, Evaluation, JoinKind, OrderParameter,
        SortDirection, WhereValue},
    error::CompileError,
    relation::{RelationSide, foreign_key_name, resolve_relation},
    settings::DatabaseSettings,
    value::Value,
};
use quarry_schema::{build::Registry, node::EntityDescriptor};

///
/// SqlBuilder
///
/// Interface of the external relational query-builder collaborator. The
/// compiler appends clauses; the collaborator renders and executes them.
/// Each predicate method carries the evaluation tag that combines it with
/// the preceding clause in the same scope.
///

pub trait SqlBuilder {
    fn where_compare(
        &mut self,
        evaluation: Evaluation,
        column: &str,
        operator: &'static str,
        value: Value,
    );

    fn where_between(
        &mut self,
        evaluation: Evaluation,
        column: &str,
        low: Value,
        high: Value,
        negated: bool,
    );

    fn where_in(
        &mut self,
        evaluation: Evaluation,
        column: &str,
        values: Vec<Value>,
        negated: bool,
    );

    /// Open a parenthesized sub-clause and let `build` fill it.
    fn where_group(&mut self, evaluation: Evaluation, build: &mut dyn FnMut(&mut dyn SqlBuilder));

    fn join(&mut self, kind: JoinKind, table: &str, left: &str, right: &str);

    fn order_by(&mut self, column: &str, direction: SortDirection);

    fn limit(&mut self, count: u64);

    fn offset(&mut self, offset: u64);

    fn select(&mut self, projection: &str);
}

///
/// SqlQuery
///
/// Walks a criteria tree against the registry and emits where/join/order/
/// limit clauses onto the supplied builder, finishing with a wildcard
/// projection qualified to the root table.
///

pub struct SqlQuery<'a> {
    registry: &'a Registry,
    settings: &'a DatabaseSettings,
    order_parameters: Vec<OrderParameter>,
}

impl<'a> SqlQuery<'a> {
    pub fn generate(
        builder: &mut dyn SqlBuilder,
        criteria: &Criteria,
        registry: &'a Registry,
        settings: &'a DatabaseSettings,
    ) -> Result<(), CompileError> {
        let mut query = SqlQuery {
            registry,
            settings,
            order_parameters: Vec::new(),
        };

        query.compile(builder, criteria, true)
    }

    fn compile(
        &mut self,
        builder: &mut dyn SqlBuilder,
        criteria: &Criteria,
        root: bool,
    ) -> Result<(), CompileError> {
        let descriptor = self.registry.expect(&criteria.entity)?;
        let table = self.table_name(&descriptor);

        // qualify before joins recurse so precedence sorting can interleave
        // root and joined keys later
        for parameter in &criteria.order_parameters {
            self.order_parameters.push(OrderParameter {
                key: self.qualify(&table, &parameter.key),
                direction: parameter.direction,
                precedence: parameter.precedence,
            });
        }

        self.apply_parameters(builder, &criteria.where_parameters, &table)?;
        self.apply_joins(builder, criteria, &descriptor, &table)?;

        if root {
            self.apply_ordering(builder);
            self.apply_result_set(builder, criteria);
            builder.select(&self.qualify(&table, "*"));
        }

        Ok(())
    }

    fn apply_parameters(
        &self,
        builder: &mut dyn SqlBuilder,
        parameters: &[CriteriaWhere],
        table: &str,
    ) -> Result<(), CompileError> {
        for parameter in parameters {
            match parameter {
                CriteriaWhere::Value(value) => self.apply_where_value(builder, value, table)?,
                CriteriaWhere::Group(group) => {
                    let mut deferred = Ok(());

                    builder.where_group(group.evaluation, &mut |scope| {
                        if deferred.is_ok() {
                            deferred =
                                self.apply_parameters(scope, &group.where_parameters, table);
                        }
                    });

                    deferred?;
                }
            }
        }

        Ok(())
    }

    fn apply_where_value(
        &self,
        builder: &mut dyn SqlBuilder,
        parameter: &WhereValue,
        table: &str,
    ) -> Result<(), CompileError> {
        let column = self.qualify(table, &parameter.key);

        match parameter.comparison {
            Comparison::Between | Comparison::NotBetween => {
                let (low, high) = parameter.value.as_range();

                builder.where_between(
                    parameter.evaluation,
                    &column,
                    low,
                    high,
                    parameter.comparison == Comparison::NotBetween,
                );
            }
            Comparison::In | Comparison::NotIn => builder.where_in(
                parameter.evaluation,
                &column,
                parameter.value.as_items(),
                parameter.comparison == Comparison::NotIn,
            ),
            comparison => builder.where_compare(
                parameter.evaluation,
                &column,
                comparison_operator(comparison)?,
                parameter.value.clone(),
            ),
        }

        Ok(())
    }

    fn apply_joins(
        &mut self,
        builder: &mut dyn SqlBuilder,
        criteria: &Criteria,
        descriptor: &EntityDescriptor,
        table: &str,
    ) -> Result<(), CompileError> {
        for join in &criteria.join_parameters {
            let joined = self.registry.expect(&join.criteria.entity)?;
            let join_table = self.table_name(&joined);
            let edge = resolve_relation(descriptor, &joined)?;

            let (left, right) = match edge.side {
                RelationSide::Parent => {
                    let primary_key = joined.primary_key()?;
                    let foreign_key = foreign_key_name(&edge.column.name, &primary_key.name);

                    (
                        self.qualify(&join_table, &primary_key.name),
                        self.qualify(table, &foreign_key),
                    )
                }
                RelationSide::Joined => {
                    let primary_key = descriptor.primary_key()?;
                    let foreign_key = foreign_key_name(&edge.column.name, &primary_key.name);

                    (
                        self.qualify(table, &primary_key.name),
                        self.qualify(&join_table, &foreign_key),
                    )
                }
            };

            builder.join(join.kind, &join_table, &left, &right);

            // joined where/join clauses land in the same builder scope and
            // joined order parameters propagate upward
            self.compile(builder, &join.criteria, false)?;
        }

        Ok(())
    }

    fn apply_ordering(&mut self, builder: &mut dyn SqlBuilder) {
        self.order_parameters
            .sort_by_key(|parameter| parameter.precedence);

        for parameter in &self.order_parameters {
            builder.order_by(&parameter.key, parameter.direction);
        }
    }

    fn apply_result_set(&self, builder: &mut dyn SqlBuilder, criteria: &Criteria) {
        match criteria.max_result_count {
            Some(count) if count > 0 => builder.limit(u64::try_from(count).unwrap_or(0)),
            _ => {}
        }

        match criteria.result_offset {
            Some(offset) if offset >= 0 => builder.offset(u64::try_from(offset).unwrap_or(0)),
            _ => {}
        }
    }

    fn table_name(&self, descriptor: &EntityDescriptor) -> String {
        let table = self.settings.table_casing().apply(&descriptor.table_name);

        match (&descriptor.schema, self.settings.use_schema()) {
            (Some(schema), true) => {
                format!("{}.{table}", self.settings.schema_casing().apply(schema))
            }
            _ => table,
        }
    }

    fn qualify(&self, table: &str, name: &str) -> String {
        if name == "*" {
            format!("{table}.*")
        } else {
            format!("{table}.{}", self.settings.column_casing().apply(name))
        }
    }
}

fn comparison_operator(comparison: Comparison) -> Result<&'static str, CompileError> {
    match comparison {
        Comparison::Equal => Ok("="),
        Comparison::NotEqual => Ok("<>"),
        Comparison::GreaterThan => Ok(">"),
        Comparison::GreaterThanEqualTo => Ok(">="),
        Comparison::LessThan => Ok("<"),
        Comparison::LessThanEqualTo => Ok("<="),
        Comparison::Like => Ok("like"),
        Comparison::NotLike => Ok("not like"),
        Comparison::Between | Comparison::In | Comparison::NotBetween | Comparison::NotIn => {
            Err(CompileError::UnsupportedComparison { comparison })
        }
    }
}
