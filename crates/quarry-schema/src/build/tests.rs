use super::*;

fn order_builder(name: &str) -> EntityBuilder {
    EntityBuilder::new(name, "order")
        .schema("sales")
        .primary_key(ColumnDescriptor::new("id", ColumnDataType::Guid))
        .column(ColumnDescriptor::new("customer", ColumnDataType::Undetermined))
        .column(ColumnDescriptor::new("total", ColumnDataType::Number))
        .column(ColumnDescriptor::new("createdOn", ColumnDataType::Date))
}

#[test]
fn register_finalizes_and_stores() {
    let registry = Registry::new();
    let descriptor = registry.register(order_builder("Order")).unwrap();

    assert!(descriptor.is_entity);
    assert!(registry.is_entity("Order"));
    assert_eq!(registry.get("Order").unwrap().table_name, "order");
    assert!(registry.get("Missing").is_none());
}

#[test]
fn duplicate_registration_is_an_error() {
    let registry = Registry::new();
    registry.register(order_builder("Order")).unwrap();

    let err = registry.register(order_builder("Order")).unwrap_err();
    assert_eq!(
        err,
        BuildError::DuplicateDeclaration {
            name: "Order".to_owned()
        }
    );
}

#[test]
fn from_map_is_case_insensitive() {
    let registry = Registry::new();
    let descriptor = registry.register(order_builder("Order")).unwrap();

    assert_eq!(descriptor.from_map("CREATEDON").unwrap().name, "createdOn");
    assert_eq!(descriptor.from_map("id").unwrap().name, "id");

    let err = descriptor.from_map("nope").unwrap_err();
    assert_eq!(
        err,
        NodeError::UnknownColumn {
            name: "nope".to_owned()
        }
    );
}

#[test]
fn primary_key_is_required_before_use() {
    let registry = Registry::new();
    let descriptor = registry
        .register(EntityBuilder::new("Bare", "bare"))
        .unwrap();

    assert_eq!(
        descriptor.primary_key().unwrap_err(),
        NodeError::MissingPrimaryKey {
            entity: "Bare".to_owned()
        }
    );
}

#[test]
fn relation_marks_undetermined_columns_as_entity() {
    let registry = Registry::new();
    let descriptor = registry
        .register(
            order_builder("Order")
                .relation("customer", "Customer")
                .unwrap(),
        )
        .unwrap();

    let column = descriptor.from_map("customer").unwrap();
    assert_eq!(column.ty, ColumnDataType::Entity);
    assert_eq!(column.relates_to.as_deref(), Some("Customer"));
}

#[test]
fn exclusion_masks() {
    let registry = Registry::new();
    let descriptor = registry
        .register(
            order_builder("Order")
                .exclusions("total", &[BackendKind::KeyValue])
                .unwrap()
                .only("createdOn", &[BackendKind::Postgres])
                .unwrap(),
        )
        .unwrap();

    let total = descriptor.from_map("total").unwrap();
    assert!(total.is_excluded(BackendKind::KeyValue));
    assert!(!total.is_excluded(BackendKind::Postgres));
    assert!(!total.is_excluded(BackendKind::Unspecified));

    let created = descriptor.from_map("createdOn").unwrap();
    assert!(!created.is_excluded(BackendKind::Postgres));
    assert!(created.is_excluded(BackendKind::KeyValue));
    assert!(created.is_excluded(BackendKind::Search));
}

#[test]
fn column_names_follow_declaration_order() {
    let registry = Registry::new();
    let descriptor = registry.register(order_builder("Order")).unwrap();

    assert_eq!(
        descriptor.column_names(CasingStyle::Snake, &[]),
        vec!["customer", "total", "created_on"]
    );
    assert_eq!(
        descriptor.column_names(CasingStyle::Same, &[ColumnDataType::Date]),
        vec!["customer", "total"]
    );
}

#[test]
fn connection_name_falls_back_to_unspecified() {
    let registry = Registry::new();
    let descriptor = registry
        .register(
            order_builder("Order")
                .connection("primary", BackendKind::Unspecified)
                .connection("kv-cluster", BackendKind::KeyValue),
        )
        .unwrap();

    assert_eq!(
        descriptor.connection_name(BackendKind::KeyValue),
        Some("kv-cluster")
    );
    assert_eq!(
        descriptor.connection_name(BackendKind::Postgres),
        Some("primary")
    );
}

#[test]
fn inherit_requires_registered_parent() {
    let registry = Registry::new();
    let err = registry.inherit("Child", "Parent").unwrap_err();

    assert_eq!(
        err,
        BuildError::MissingParent {
            parent: "Parent".to_owned()
        }
    );
}

#[test]
fn inherit_copies_by_value() {
    let registry = Registry::new();
    registry
        .register(
            order_builder("Order")
                .timestamp("createdOn", TimestampEvent::OnCreate)
                .unwrap()
                .connection("primary", BackendKind::Unspecified)
                .source(BackendKind::Postgres),
        )
        .unwrap();

    let child = registry
        .register(
            registry
                .inherit("SpecialOrder", "Order")
                .unwrap()
                .column(ColumnDescriptor::new("discount", ColumnDataType::Float))
                .index("total", "idx_total")
                .unwrap(),
        )
        .unwrap();

    let parent = registry.get("Order").unwrap();

    // copied structure
    assert_eq!(child.table_name, parent.table_name);
    assert_eq!(child.source, BackendKind::Postgres);
    assert_eq!(child.primary_key().unwrap().name, "id");
    assert_eq!(child.timestamps(TimestampEvent::OnCreate).len(), 1);
    assert_eq!(child.connection_name(BackendKind::MySql), Some("primary"));
    assert_eq!(child.columns.len(), parent.columns.len() + 1);

    // mutations on the child never reach the parent
    assert_eq!(
        child.from_map("total").unwrap().index_name.as_deref(),
        Some("idx_total")
    );
    assert!(parent.from_map("total").unwrap().index_name.is_none());
    assert!(!parent.has_column("discount"));
}

#[test]
fn global_registry_is_shared() {
    // unique name to stay independent of other tests touching the global
    let name = "BuildTestsGlobalEntity";

    Registry::global()
        .register(EntityBuilder::new(name, "global_entity"))
        .unwrap();

    assert!(Registry::global().is_entity(name));
}
