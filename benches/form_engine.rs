use apiform::form::{build_body, walk_form, FieldPath};
use apiform::spec::ApiSpec;
use criterion::{criterion_group, criterion_main, Criterion};
use serde_json::{json, Value};
use std::hint::black_box;

fn order_document() -> Value {
    json!({
        "openapi": "3.0.0",
        "info": {"title": "Orders", "version": "1"},
        "components": {"schemas": {
            "Address": {
                "type": "object",
                "required": ["street", "city"],
                "properties": {
                    "street": {"type": "string", "example": "1 Main St"},
                    "city": {"type": "string", "default": "Lima"},
                    "zip": {"type": "string"}
                }
            },
            "Line": {
                "type": "object",
                "required": ["sku", "qty"],
                "properties": {
                    "sku": {"type": "string"},
                    "qty": {"type": "integer", "default": 1},
                    "price": {"type": "number", "example": 9.5},
                    "tags": {"type": "array", "items": {"type": "string"}, "example": ["a", "b"]}
                }
            },
            "Order": {
                "type": "object",
                "required": ["customer", "lines", "shipping"],
                "properties": {
                    "customer": {"type": "string"},
                    "status": {"type": "string", "enum": ["new", "paid", "sent"], "default": "new"},
                    "shipping": {"$ref": "#/components/schemas/Address"},
                    "billing": {"$ref": "#/components/schemas/Address"},
                    "lines": {"type": "array", "items": {"$ref": "#/components/schemas/Line"}}
                }
            }
        }},
        "paths": {}
    })
}

/// Values tree with `n` order lines, the way a user would have filled it in
fn filled_values(n: usize) -> Value {
    let lines: Vec<Value> = (0..n)
        .map(|i| json!({"sku": format!("SKU-{i}"), "qty": i + 1}))
        .collect();
    json!({"customer": "ana", "lines": lines})
}

fn bench_form_engine(c: &mut Criterion) {
    let document = order_document();
    let schema = json!({"$ref": "#/components/schemas/Order"});

    c.bench_function("walk_order_50_lines", |b| {
        b.iter(|| {
            let mut values = filled_values(50);
            let mut includes = json!({"lines": []});
            let view = walk_form(&document, black_box(&schema), &mut values, &mut includes, 10);
            black_box(view.fields.len())
        })
    });

    let mut values = filled_values(50);
    let mut includes = json!({"lines": []});
    walk_form(&document, &schema, &mut values, &mut includes, 10);
    c.bench_function("build_order_50_lines", |b| {
        b.iter(|| build_body(&document, black_box(&schema), Some((&values, &includes))))
    });

    c.bench_function("parse_field_path", |b| {
        b.iter(|| FieldPath::parse(black_box("lines[42].tags")))
    });

    let spec_doc = {
        let mut doc = order_document();
        let mut paths = serde_json::Map::new();
        for i in 0..200 {
            paths.insert(
                format!("/resource{i}/{{id}}"),
                json!({
                    "get": {"tags": [format!("tag{}", i % 10)]},
                    "put": {"tags": [format!("tag{}", i % 10)]}
                }),
            );
        }
        doc["paths"] = Value::Object(paths);
        doc
    };
    c.bench_function("group_400_endpoints", |b| {
        b.iter(|| ApiSpec::from_value(black_box(spec_doc.clone()), "bench"))
    });
}

criterion_group!(benches, bench_form_engine);
criterion_main!(benches);
