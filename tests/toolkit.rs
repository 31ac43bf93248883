//! End-to-end runs combining the tree and streaming surfaces.

use anyhow::Result;
use serde::Deserialize;
use serde_json::json;

use json_pathkit::{
    ArrayExtractor, FlatValue, JsonLocator, JsonShape, JsonViewer, NumberPolicy, ViewValue,
    flatten, locate, parse_str,
};

const ORDER_DOC: &str = r#"{
    "order": {
        "id": 7001,
        "shipday": "2026/03/14",
        "lines": [
            {"sku": "A-1", "qty": 2, "price": 10.5},
            {"sku": "B-2", "qty": 1, "price": 99.0}
        ]
    }
}"#;

#[derive(Debug, Deserialize, PartialEq)]
struct Line {
    sku: String,
    qty: i64,
    price: f64,
}

#[test]
fn navigate_and_flatten_agree_on_leaves() -> Result<()> {
    let tree = parse_str(ORDER_DOC)?;
    assert_eq!(locate(&tree, "order.lines[1].sku"), Some(&json!("B-2")));

    let flat = flatten(&tree, Some(NumberPolicy::Double));
    assert_eq!(flat.get("order.lines[1].price"), Some(&FlatValue::Double(99.0)));

    // same leaf through the reverse lookup
    let hit = flat.search(["order", "lines[1]", "price"])?;
    assert_eq!(hit, &FlatValue::Double(99.0));
    Ok(())
}

#[test]
fn out_of_bounds_is_a_miss_for_navigation_but_an_error_for_lookup() -> Result<()> {
    let tree = parse_str(ORDER_DOC)?;
    assert_eq!(JsonLocator::new().locate(&tree, "order.lines[9].sku"), None);

    let flat = flatten(&tree, None);
    assert!(flat.search(["order", "lines[9]", "sku"]).is_err());
    Ok(())
}

#[test]
fn viewer_decodes_dates_that_the_extractor_streams_past() -> Result<()> {
    let tree = parse_str(ORDER_DOC)?;
    let mut viewer = JsonViewer::new();
    viewer.date_rule(regex::Regex::new("shipday$")?, "%Y/%m/%d");
    let mut shipday = None;
    viewer.read(&tree, |path, value| {
        if path == "order.shipday" {
            shipday = Some(value);
        }
    });
    match shipday {
        Some(ViewValue::Date(day)) => assert_eq!(day.to_string(), "2026-03-14"),
        other => panic!("expected a decoded date, got {other:?}"),
    }

    let extractor = ArrayExtractor::<Line>::for_path(["order", "lines"])?;
    let lines: Vec<Line> = extractor
        .elements(ORDER_DOC.as_bytes())
        .collect::<json_pathkit::Result<_>>()?;
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].sku, "A-1");
    Ok(())
}

#[test]
fn learned_shape_accepts_its_own_document_and_flags_a_drifted_one() -> Result<()> {
    let mut shape = JsonShape::learn(ORDER_DOC)?;
    assert!(!shape.validate(ORDER_DOC));

    let drifted = r#"{
        "order": {
            "id": "no-longer-a-number",
            "lines": [{"sku": "A-1", "qty": 2, "price": 10.5}]
        }
    }"#;
    assert!(shape.validate(drifted));
    let unmatched: Vec<String> = shape.unmatched().into_iter().map(|(p, _)| p).collect();
    assert!(unmatched.contains(&"order:id".to_owned()));
    assert!(unmatched.contains(&"order:shipday".to_owned()));
    Ok(())
}
