use beanbench_core::{
    BasicField, ConstraintDescriptor, ConstraintKind, EntityGraph, EntityRole, Field, GroupId,
    ParamValue, SampleValue, ValueType,
};
use serde_json::json;

fn small_graph() -> EntityGraph {
    let mut graph = EntityGraph::new();
    let id = graph.add_entity("Bean0", "bench.beans.Bean0", EntityRole::Primary);
    let entity = graph.require_mut(id).expect("entity");

    let mut field = BasicField::new("field0", ValueType::Text);
    field.descriptors.attach(
        ConstraintDescriptor::new(ConstraintKind::NotNull)
            .with_param("message", ParamValue::text("cannot be null")),
    );
    field.valid_values = vec![SampleValue::text("good")];
    field.invalid_values = vec![SampleValue::Null];
    entity.add_field(Field::Basic(field)).expect("field");
    entity.add_group(GroupId(1));
    entity
        .descriptors
        .attach(ConstraintDescriptor::new(ConstraintKind::composed("AlwaysValid")));

    graph
}

#[test]
fn serializes_entity_graph_shape() {
    let graph = small_graph();
    let value = serde_json::to_value(&graph).expect("serialize graph");

    let expected = json!({
        "entities": [{
            "id": 0,
            "name": "Bean0",
            "qualified_name": "bench.beans.Bean0",
            "role": "primary",
            "fields": [{
                "field_kind": "basic",
                "name": "field0",
                "value_type": "text",
                "descriptors": [{
                    "kind": "not_null",
                    "params": {"message": {"kind": "text", "value": "cannot be null"}}
                }],
                "valid_values": [{"kind": "text", "value": "good"}],
                "invalid_values": [{"kind": "null"}]
            }],
            "descriptors": [{"kind": {"composed": "AlwaysValid"}}],
            "groups": [1]
        }],
        "primary": [0],
        "base": []
    });

    assert_eq!(value, expected);
}

#[test]
fn graph_survives_json_round_trip() {
    let graph = small_graph();
    let json = serde_json::to_string(&graph).expect("serialize graph");
    let parsed: EntityGraph = serde_json::from_str(&json).expect("parse graph");
    assert_eq!(parsed, graph);
}
