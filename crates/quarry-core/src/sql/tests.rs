use super::{SqlBuilder, SqlQuery};
use crate::{
    criteria::{Criteria, Evaluation, JoinKind, SortDirection, WhereGroup, WhereValue},
    error::CompileError,
    settings::DatabaseSettings,
    value::Value,
};
use quarry_schema::{
    build::{EntityBuilder, Registry},
    node::{ColumnDescriptor, NodeError},
    types::ColumnDataType,
};

///
/// Call
///
/// One observed builder invocation, in order.
///

#[derive(Clone, Debug, PartialEq)]
enum Call {
    Where {
        evaluation: Evaluation,
        column: String,
        operator: String,
        value: Value,
    },
    WhereBetween {
        evaluation: Evaluation,
        column: String,
        low: Value,
        high: Value,
        negated: bool,
    },
    WhereIn {
        evaluation: Evaluation,
        column: String,
        values: Vec<Value>,
        negated: bool,
    },
    GroupStart(Evaluation),
    GroupEnd,
    Join {
        kind: JoinKind,
        table: String,
        left: String,
        right: String,
    },
    OrderBy {
        column: String,
        direction: SortDirection,
    },
    Limit(u64),
    Offset(u64),
    Select(String),
}

#[derive(Default)]
struct RecordingBuilder {
    calls: Vec<Call>,
}

impl SqlBuilder for RecordingBuilder {
    fn where_compare(
        &mut self,
        evaluation: Evaluation,
        column: &str,
        operator: &'static str,
        value: Value,
    ) {
        self.calls.push(Call::Where {
            evaluation,
            column: column.to_owned(),
            operator: operator.to_owned(),
            value,
        });
    }

    fn where_between(
        &mut self,
        evaluation: Evaluation,
        column: &str,
        low: Value,
        high: Value,
        negated: bool,
    ) {
        self.calls.push(Call::WhereBetween {
            evaluation,
            column: column.to_owned(),
            low,
            high,
            negated,
        });
    }

    fn where_in(
        &mut self,
        evaluation: Evaluation,
        column: &str,
        values: Vec<Value>,
        negated: bool,
    ) {
        self.calls.push(Call::WhereIn {
            evaluation,
            column: column.to_owned(),
            values,
            negated,
        });
    }

    fn where_group(&mut self, evaluation: Evaluation, build: &mut dyn FnMut(&mut dyn SqlBuilder)) {
        self.calls.push(Call::GroupStart(evaluation));
        build(self);
        self.calls.push(Call::GroupEnd);
    }

    fn join(&mut self, kind: JoinKind, table: &str, left: &str, right: &str) {
        self.calls.push(Call::Join {
            kind,
            table: table.to_owned(),
            left: left.to_owned(),
            right: right.to_owned(),
        });
    }

    fn order_by(&mut self, column: &str, direction: SortDirection) {
        self.calls.push(Call::OrderBy {
            column: column.to_owned(),
            direction,
        });
    }

    fn limit(&mut self, count: u64) {
        self.calls.push(Call::Limit(count));
    }

    fn offset(&mut self, offset: u64) {
        self.calls.push(Call::Offset(offset));
    }

    fn select(&mut self, projection: &str) {
        self.calls.push(Call::Select(projection.to_owned()));
    }
}

fn fixture_registry() -> Registry {
    let registry = Registry::new();

    registry
        .register(
            EntityBuilder::new("Order", "order")
                .schema("sales")
                .primary_key(ColumnDescriptor::new("id", ColumnDataType::Guid))
                .column(ColumnDescriptor::new("customer", ColumnDataType::Undetermined))
                .column(ColumnDescriptor::new("total", ColumnDataType::Number))
                .column(ColumnDescriptor::new("createdOn", ColumnDataType::Date))
                .relation("customer", "Customer")
                .unwrap(),
        )
        .unwrap();

    registry
        .register(
            EntityBuilder::new("Customer", "customer")
                .primary_key(ColumnDescriptor::new("id", ColumnDataType::Guid))
                .column(ColumnDescriptor::new("name", ColumnDataType::Text)),
        )
        .unwrap();

    registry
        .register(
            EntityBuilder::new("Region", "region")
                .primary_key(ColumnDescriptor::new("id", ColumnDataType::Guid))
                .column(ColumnDescriptor::new("name", ColumnDataType::Text)),
        )
        .unwrap();

    registry
}

fn compile(criteria: &Criteria) -> Result<Vec<Call>, CompileError> {
    compile_with(criteria, &DatabaseSettings::default())
}

fn compile_with(
    criteria: &Criteria,
    settings: &DatabaseSettings,
) -> Result<Vec<Call>, CompileError> {
    let registry = fixture_registry();
    let mut builder = RecordingBuilder::default();

    SqlQuery::generate(&mut builder, criteria, &registry, settings)?;

    Ok(builder.calls)
}

#[test]
fn filtered_and_sorted_lookup_emits_where_order_select() {
    let criteria = Criteria::new("Order")
        .filter(WhereValue::eq("total", 100))
        .order_by("total", SortDirection::Descending);

    let calls = compile(&criteria).unwrap();

    assert_eq!(
        calls,
        vec![
            Call::Where {
                evaluation: Evaluation::And,
                column: "order.total".to_owned(),
                operator: "=".to_owned(),
                value: Value::Int(100),
            },
            Call::OrderBy {
                column: "order.total".to_owned(),
                direction: SortDirection::Descending,
            },
            Call::Select("order.*".to_owned()),
        ]
    );
}

#[test]
fn standard_comparisons_honor_the_evaluation_tag() {
    let criteria = Criteria::new("Order")
        .filter(WhereValue::lt("total", 10))
        .filter(WhereValue::gt("total", 100).or())
        .filter(WhereValue::like("createdOn", "2024%"));

    let calls = compile(&criteria).unwrap();

    assert_eq!(
        calls[0],
        Call::Where {
            evaluation: Evaluation::And,
            column: "order.total".to_owned(),
            operator: "<".to_owned(),
            value: Value::Int(10),
        }
    );
    assert_eq!(
        calls[1],
        Call::Where {
            evaluation: Evaluation::Or,
            column: "order.total".to_owned(),
            operator: ">".to_owned(),
            value: Value::Int(100),
        }
    );
    assert_eq!(
        calls[2],
        Call::Where {
            evaluation: Evaluation::And,
            column: "order.created_on".to_owned(),
            operator: "like".to_owned(),
            value: Value::Text("2024%".to_owned()),
        }
    );
}

#[test]
fn ranges_and_membership_use_native_clauses() {
    let criteria = Criteria::new("Order")
        .filter(WhereValue::between("total", 10, 20))
        .filter(WhereValue::not_between("total", 30, 40))
        .filter(WhereValue::is_in("total", vec![1.into(), 2.into()]))
        .filter(WhereValue::not_in("total", vec![3.into()]));

    let calls = compile(&criteria).unwrap();

    assert_eq!(
        calls[0],
        Call::WhereBetween {
            evaluation: Evaluation::And,
            column: "order.total".to_owned(),
            low: Value::Int(10),
            high: Value::Int(20),
            negated: false,
        }
    );
    assert_eq!(
        calls[1],
        Call::WhereBetween {
            evaluation: Evaluation::And,
            column: "order.total".to_owned(),
            low: Value::Int(30),
            high: Value::Int(40),
            negated: true,
        }
    );
    assert_eq!(
        calls[2],
        Call::WhereIn {
            evaluation: Evaluation::And,
            column: "order.total".to_owned(),
            values: vec![Value::Int(1), Value::Int(2)],
            negated: false,
        }
    );
    assert_eq!(
        calls[3],
        Call::WhereIn {
            evaluation: Evaluation::And,
            column: "order.total".to_owned(),
            values: vec![Value::Int(3)],
            negated: true,
        }
    );
}

#[test]
fn groups_open_a_nested_scope() {
    let criteria = Criteria::new("Order").filter(WhereValue::gt("total", 0)).filter(
        WhereGroup::any()
            .add(WhereValue::eq("total", 10))
            .add(WhereValue::eq("total", 20).or()),
    );

    let calls = compile(&criteria).unwrap();

    assert_eq!(
        calls,
        vec![
            Call::Where {
                evaluation: Evaluation::And,
                column: "order.total".to_owned(),
                operator: ">".to_owned(),
                value: Value::Int(0),
            },
            Call::GroupStart(Evaluation::Or),
            Call::Where {
                evaluation: Evaluation::And,
                column: "order.total".to_owned(),
                operator: "=".to_owned(),
                value: Value::Int(10),
            },
            Call::Where {
                evaluation: Evaluation::Or,
                column: "order.total".to_owned(),
                operator: "=".to_owned(),
                value: Value::Int(20),
            },
            Call::GroupEnd,
            Call::Select("order.*".to_owned()),
        ]
    );
}

#[test]
fn join_resolves_the_owning_side() {
    let criteria = Criteria::new("Order")
        .join(Criteria::new("Customer").filter(WhereValue::eq("name", "acme")));

    let calls = compile(&criteria).unwrap();

    assert_eq!(
        calls,
        vec![
            Call::Join {
                kind: JoinKind::Inner,
                table: "customer".to_owned(),
                left: "customer.id".to_owned(),
                right: "order.customer_id".to_owned(),
            },
            Call::Where {
                evaluation: Evaluation::And,
                column: "customer.name".to_owned(),
                operator: "=".to_owned(),
                value: Value::Text("acme".to_owned()),
            },
            Call::Select("order.*".to_owned()),
        ]
    );
}

#[test]
fn join_resolves_the_inverse_side() {
    let criteria = Criteria::new("Customer").join(Criteria::new("Order"));

    let calls = compile(&criteria).unwrap();

    assert_eq!(
        calls,
        vec![
            Call::Join {
                kind: JoinKind::Inner,
                table: "order".to_owned(),
                left: "customer.id".to_owned(),
                right: "order.customer_id".to_owned(),
            },
            Call::Select("customer.*".to_owned()),
        ]
    );
}

#[test]
fn unrelated_entities_cannot_be_joined() {
    let criteria = Criteria::new("Order").join(Criteria::new("Region"));

    let err = compile(&criteria).unwrap_err();

    assert_eq!(
        err,
        CompileError::MissingRelation {
            left: "Order".to_owned(),
            right: "Region".to_owned(),
        }
    );
}

#[test]
fn ordering_interleaves_across_joins_by_precedence() {
    let criteria = Criteria::new("Order")
        .order_by_with("createdOn", SortDirection::Ascending, 2)
        .join(Criteria::new("Customer").order_by_with(
            "name",
            SortDirection::Descending,
            1,
        ));

    let calls = compile(&criteria).unwrap();
    let ordering: Vec<&Call> = calls
        .iter()
        .filter(|call| matches!(call, Call::OrderBy { .. }))
        .collect();

    assert_eq!(
        ordering,
        vec![
            &Call::OrderBy {
                column: "customer.name".to_owned(),
                direction: SortDirection::Descending,
            },
            &Call::OrderBy {
                column: "order.created_on".to_owned(),
                direction: SortDirection::Ascending,
            },
        ]
    );
}

#[test]
fn non_positive_limits_and_offsets_are_skipped() {
    let criteria = Criteria::new("Order").limit(0).start_at(-1);
    let calls = compile(&criteria).unwrap();

    assert_eq!(calls, vec![Call::Select("order.*".to_owned())]);

    let criteria = Criteria::new("Order").limit(10).start_at(0);
    let calls = compile(&criteria).unwrap();

    assert_eq!(
        calls,
        vec![
            Call::Limit(10),
            Call::Offset(0),
            Call::Select("order.*".to_owned()),
        ]
    );
}

#[test]
fn schema_prefix_applies_when_enabled() {
    let settings = DatabaseSettings {
        use_schema: Some(true),
        ..DatabaseSettings::default()
    };

    let criteria = Criteria::new("Order").filter(WhereValue::eq("total", 1));
    let calls = compile_with(&criteria, &settings).unwrap();

    assert_eq!(
        calls,
        vec![
            Call::Where {
                evaluation: Evaluation::And,
                column: "sales.order.total".to_owned(),
                operator: "=".to_owned(),
                value: Value::Int(1),
            },
            Call::Select("sales.order.*".to_owned()),
        ]
    );

    // entities without a declared schema are never prefixed
    let criteria = Criteria::new("Customer");
    let calls = compile_with(&criteria, &settings).unwrap();

    assert_eq!(calls, vec![Call::Select("customer.*".to_owned())]);
}

#[test]
fn unknown_entities_are_reported() {
    let err = compile(&Criteria::new("Ghost")).unwrap_err();

    assert_eq!(
        err,
        CompileError::Node(NodeError::UnknownEntity {
            name: "Ghost".to_owned(),
        })
    );
}
