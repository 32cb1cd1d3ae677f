use beanbench_core::{EntityGraph, Holder};
use schemars::schema_for;

fn main() {
    let graph = schema_for!(EntityGraph);
    let holder = schema_for!(Holder);
    let json = serde_json::json!({ "entity_graph": graph, "holder": holder });
    let rendered = serde_json::to_string_pretty(&json).expect("serialize json schema");
    println!("{rendered}");
}
