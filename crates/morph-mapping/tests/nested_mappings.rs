//! Sub-mappings, collections and self-referential schemas.

use std::sync::Arc;

use morph_analysis::ConversionRegistry;
use morph_core::{ContainerKind, Field, Model, Primitive, Record, Value};
use morph_mapping::{BindingAction, ElementAction, MappingBuilder, MappingStore};
use pretty_assertions::assert_eq;
use serde_json::json;

fn value_model(name: &str) -> Model {
    Model::builder(name)
        .field(Field::new("Value", Primitive::Int32))
        .build()
        .unwrap()
}

#[tokio::test]
async fn sub_model_maps_to_sub_view() {
    let (sub_model, sub_view) = (value_model("SubModel"), value_model("SubView"));
    let model = Model::builder("Model")
        .field(Field::new("Item1", &sub_model))
        .field(Field::new("Item2", &sub_model))
        .build()
        .unwrap();
    let view = Model::builder("View")
        .field(Field::new("Item1", &sub_view))
        .field(Field::new("Item2", &sub_view))
        .build()
        .unwrap();

    let store = Arc::new(MappingStore::new());
    let mapping = MappingBuilder::new(&model, &view)
        .with_store(Arc::clone(&store))
        .build()
        .unwrap();
    assert_eq!(store.len(), 2);
    assert!(store.try_get(&sub_model, &sub_view).is_some());

    let source = Record::from_json(
        &model,
        &json!({ "Item1": { "Value": 5 }, "Item2": { "Value": 10 } }),
    )
    .unwrap();
    let mapped = mapping.map(&source).await.unwrap();
    assert_eq!(mapped.model(), &view);
    assert_eq!(
        mapped.to_json(),
        json!({ "Item1": { "Value": 5 }, "Item2": { "Value": 10 } })
    );
    let item1 = mapped.get("Item1").and_then(Value::as_record).unwrap();
    assert_eq!(item1.model(), &sub_view);
}

#[tokio::test]
async fn sub_mapping_keeps_unbound_destination_fields() {
    let inner = value_model("Inner");
    let inner_view = Model::builder("InnerView")
        .field(Field::new("Value", Primitive::Int32))
        .field(Field::new("Extra", Primitive::Text))
        .build()
        .unwrap();
    let model = Model::builder("Holder").field(Field::new("Item", &inner)).build().unwrap();
    let view = Model::builder("HolderView")
        .field(Field::new("Item", &inner_view))
        .build()
        .unwrap();
    let mapping = MappingBuilder::new(&model, &view).build().unwrap();

    let source = Record::from_json(&model, &json!({ "Item": { "Value": 5 } })).unwrap();
    let mut destination =
        Record::from_json(&view, &json!({ "Item": { "Value": 0, "Extra": "keep" } })).unwrap();
    mapping.map_into(&source, &mut destination).await.unwrap();
    assert_eq!(
        destination.to_json(),
        json!({ "Item": { "Value": 5, "Extra": "keep" } })
    );

    let mut empty = Record::new(&view);
    mapping.map_into(&source, &mut empty).await.unwrap();
    assert_eq!(empty.to_json(), json!({ "Item": { "Value": 5, "Extra": null } }));
}

#[test]
fn cached_nested_mapping_is_reused() {
    let (sub_model, sub_view) = (value_model("SubModel"), value_model("SubView"));
    let store = Arc::new(MappingStore::new());
    let nested = MappingBuilder::new(&sub_model, &sub_view)
        .with_store(Arc::clone(&store))
        .build()
        .unwrap();

    let model = Model::builder("Model").field(Field::new("Item", &sub_model)).build().unwrap();
    let view = Model::builder("View").field(Field::new("Item", &sub_view)).build().unwrap();
    let mapping = MappingBuilder::new(&model, &view)
        .with_store(Arc::clone(&store))
        .build()
        .unwrap();

    let BindingAction::SubMapping(handle) = mapping.bindings()[0].action() else {
        panic!("expected a sub-mapping binding");
    };
    assert_eq!(handle.get().unwrap().bindings().len(), nested.bindings().len());
    assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn collection_of_models_is_sub_mapped_into_fresh_container() {
    let (item, item_view) = (value_model("Item"), value_model("ItemView"));
    let order = Model::builder("Order")
        .field(Field::collection("Items", ContainerKind::List, &item))
        .build()
        .unwrap();
    let order_view = Model::builder("OrderView")
        .field(Field::collection("Items", ContainerKind::Array, &item_view))
        .build()
        .unwrap();

    let mapping = MappingBuilder::new(&order, &order_view).build().unwrap();
    assert!(matches!(
        mapping.bindings()[0].action(),
        BindingAction::Collection {
            element: ElementAction::SubMapping(_),
            kind: ContainerKind::Array,
        }
    ));

    let source = Record::from_json(
        &order,
        &json!({ "Items": [{ "Value": 1 }, { "Value": 2 }, null] }),
    )
    .unwrap();
    let mapped = mapping.map(&source).await.unwrap();
    let items = mapped.get("Items").unwrap();
    assert!(matches!(items, Value::Array(_)));
    let elements = items.elements().unwrap();
    assert_eq!(elements.len(), 3);
    assert_eq!(elements[0].as_record().map(Record::model), Some(&item_view));
    assert!(elements[2].is_null());
    assert_eq!(mapped.to_json(), json!({ "Items": [{ "Value": 1 }, { "Value": 2 }, null] }));
}

#[tokio::test]
async fn primitive_collections_change_container_and_element_type() {
    let from = Model::builder("From")
        .field(Field::collection("Numbers", ContainerKind::Array, Primitive::Int32))
        .field(Field::collection("Same", ContainerKind::List, Primitive::Int32))
        .field(Field::collection("Tags", ContainerKind::List, Primitive::Text))
        .build()
        .unwrap();
    let to = Model::builder("To")
        .field(Field::collection("Numbers", ContainerKind::List, Primitive::Int64))
        .field(Field::collection("Same", ContainerKind::Array, Primitive::Int32))
        .field(Field::collection("Tags", ContainerKind::List, Primitive::Text))
        .build()
        .unwrap();

    let mapping = MappingBuilder::new(&from, &to).build().unwrap();
    let actions: Vec<_> = mapping.bindings().iter().map(|b| b.action().name()).collect();
    assert_eq!(actions, ["collection", "collection", "copy"]);

    let source = Record::from_json(
        &from,
        &json!({ "Numbers": [1, 2], "Same": [3], "Tags": null }),
    )
    .unwrap();
    let mapped = mapping.map(&source).await.unwrap();
    assert_eq!(
        mapped.get("Numbers"),
        Some(&Value::List(vec![Value::Int64(1), Value::Int64(2)]))
    );
    assert_eq!(
        mapped.get("Same"),
        Some(&Value::Array(vec![Value::Int32(3)].into_boxed_slice()))
    );
    assert!(mapped.get("Tags").unwrap().is_null());
}

#[tokio::test]
async fn failed_element_leaves_destination_collection_untouched() {
    let from = Model::builder("Raw")
        .field(Field::collection("Values", ContainerKind::List, Primitive::Text))
        .build()
        .unwrap();
    let to = Model::builder("Parsed")
        .field(Field::collection("Values", ContainerKind::List, Primitive::Int32))
        .build()
        .unwrap();
    let mut registry = ConversionRegistry::new();
    registry.register_fallible(Primitive::Text, Primitive::Int32, |s: String| s.parse::<i32>().ok());
    let mapping = MappingBuilder::new(&from, &to)
        .with_conversions(registry)
        .build()
        .unwrap();

    let good = Record::from_json(&from, &json!({ "Values": ["1", "2"] })).unwrap();
    assert_eq!(
        mapping.map(&good).await.unwrap().to_json(),
        json!({ "Values": [1, 2] })
    );

    let bad = Record::from_json(&from, &json!({ "Values": ["1", "two"] })).unwrap();
    let mut destination = Record::from_json(&to, &json!({ "Values": [9] })).unwrap();
    mapping.map_into(&bad, &mut destination).await.unwrap();
    assert_eq!(destination.to_json(), json!({ "Values": [9] }));
}

#[tokio::test]
async fn self_referential_schema_compiles_once() {
    let node = Model::declare("Node");
    node.define([
        Field::new("Value", Primitive::Int32),
        Field::new("Next", &node),
    ])
    .unwrap();
    let node_view = Model::declare("NodeView");
    node_view
        .define([
            Field::new("Value", Primitive::Int32),
            Field::new("Next", &node_view),
        ])
        .unwrap();

    let store = Arc::new(MappingStore::new());
    let mapping = MappingBuilder::new(&node, &node_view)
        .with_store(Arc::clone(&store))
        .build()
        .unwrap();
    assert_eq!(store.len(), 1);

    let BindingAction::SubMapping(next) = mapping.bindings()[1].action() else {
        panic!("expected Next to be sub-mapped");
    };
    assert!(next.is_resolved());
    assert_eq!(next.to_model(), &node_view);

    let source = Record::from_json(
        &node,
        &json!({ "Value": 1, "Next": { "Value": 2, "Next": { "Value": 3, "Next": null } } }),
    )
    .unwrap();
    let mapped = mapping.map(&source).await.unwrap();
    assert_eq!(mapped.model(), &node_view);
    assert_eq!(mapped.to_json(), source.to_json());
}

#[tokio::test]
async fn mutually_recursive_schemas_compile() {
    let (a, b) = (Model::declare("A"), Model::declare("B"));
    a.define([Field::new("Id", Primitive::Int32), Field::new("Other", &b)]).unwrap();
    b.define([Field::new("Id", Primitive::Int32), Field::new("Other", &a)]).unwrap();
    let (a_view, b_view) = (Model::declare("AView"), Model::declare("BView"));
    a_view
        .define([Field::new("Id", Primitive::Int64), Field::new("Other", &b_view)])
        .unwrap();
    b_view
        .define([Field::new("Id", Primitive::Int64), Field::new("Other", &a_view)])
        .unwrap();

    let store = Arc::new(MappingStore::new());
    let mapping = MappingBuilder::new(&a, &a_view)
        .with_store(Arc::clone(&store))
        .build()
        .unwrap();
    assert_eq!(store.len(), 2);
    assert!(store.try_get(&b, &b_view).is_some());

    let source = Record::from_json(&a, &json!({ "Id": 1, "Other": { "Id": 2, "Other": null } })).unwrap();
    let mapped = mapping.map(&source).await.unwrap();
    let other = mapped.get("Other").and_then(Value::as_record).unwrap();
    assert_eq!(other.model(), &b_view);
    assert_eq!(other.get("Id"), Some(&Value::Int64(2)));
}
