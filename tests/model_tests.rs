use cdd_engine::model::{
    AssetKind, DecisionModel, EvaluatableElement, HttpMethod, IoValue, RestAsset, RunnableModel,
    ScriptAsset, function_key,
};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use uuid::Uuid;

#[test]
fn test_document_serialization_roundtrip() {
    let mut model = DecisionModel::new("Coffee purchasing");
    model.meta.summary = Some("Should we buy beans now or later?".to_string());

    let price_id = model.add_io_value("price", IoValue::from(12.5));
    let total_id = model.add_io_value("total", IoValue::Null);

    let script_id = model.add_asset(
        "Pricing functions",
        AssetKind::Script(ScriptAsset {
            language: "expr".to_string(),
            source: BASE64.encode("total(price) = price * 1.2"),
        }),
    );
    model.add_asset(
        "Inventory service",
        AssetKind::Rest(RestAsset {
            endpoint: "https://example.test/api".to_string(),
            method: HttpMethod::Get,
            default_payload: IoValue::Null,
            default_path_suffix: Some("/inventory".to_string()),
        }),
    );

    let mut runnable = RunnableModel::new("Main");
    let mut element = EvaluatableElement::new("Compute total", script_id);
    element.function_name = Some("total".to_string());
    element.inputs = vec![price_id];
    element.outputs = vec![total_id];
    runnable.elements.push(element);
    model.add_runnable_model(runnable);

    let json = model.save().expect("Failed to serialize model");
    let loaded = DecisionModel::load(&json).expect("Failed to deserialize model");

    assert_eq!(model, loaded, "Roundtrip failed: models are not equal");
    assert_eq!(loaded.io_values.len(), 2);
    assert_eq!(loaded.assets.len(), 2);
    assert_eq!(loaded.runnable_models.len(), 1);
    assert_eq!(loaded.runnable_models[0].elements[0].inputs, vec![price_id]);
}

#[test]
fn test_asset_kind_tagging() {
    let model_json = r#"{
        "meta": { "id": "6a31c9f1-58b4-4b7e-9f3f-2f8a5a1f0c01", "name": "m" },
        "assets": [
            {
                "id": "6a31c9f1-58b4-4b7e-9f3f-2f8a5a1f0c02",
                "name": "s",
                "asset_type": "script",
                "language": "expr",
                "source": ""
            },
            {
                "id": "6a31c9f1-58b4-4b7e-9f3f-2f8a5a1f0c03",
                "name": "r",
                "asset_type": "rest",
                "endpoint": "http://localhost:9000",
                "method": "POST"
            }
        ]
    }"#;

    let model = DecisionModel::load(model_json).expect("Failed to parse model");
    assert!(matches!(model.assets[0].kind, AssetKind::Script(_)));
    match &model.assets[1].kind {
        AssetKind::Rest(rest) => {
            assert_eq!(rest.method, HttpMethod::Post);
            assert!(rest.method.has_body());
            assert_eq!(rest.default_payload, IoValue::Null);
            assert_eq!(rest.default_path_suffix, None);
        }
        other => panic!("Expected rest asset, got {:?}", other),
    }
}

#[test]
fn test_snapshot_from_io_values() {
    let mut model = DecisionModel::new("m");
    let a = model.add_io_value("a", IoValue::Integer(3));
    let b = model.add_io_value("b", IoValue::Null);

    let snapshot = model.snapshot();
    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot[&a], IoValue::Integer(3));
    assert_eq!(snapshot[&b], IoValue::Null);
}

#[test]
fn test_function_key_format() {
    let asset_id = Uuid::parse_str("6a31c9f1-58b4-4b7e-9f3f-2f8a5a1f0c02").unwrap();
    assert_eq!(
        function_key(asset_id, "total"),
        "6a31c9f1-58b4-4b7e-9f3f-2f8a5a1f0c02_total"
    );
}

#[test]
fn test_get_method_sends_no_body() {
    assert!(!HttpMethod::Get.has_body());
    assert!(HttpMethod::Put.has_body());
    assert!(HttpMethod::Delete.has_body());
}
