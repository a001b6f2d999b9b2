use std::sync::Arc;

use cdd_engine::model::{AssetKind, DecisionModel, HttpMethod, IoValue, RestAsset, ScriptAsset};
use cdd_engine::resolver::{ResolverCache, resolve_asset_map, resolve_function_map};
use cdd_engine::{create_runtime_registry, model::function_key};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

fn script_asset(language: &str, source: &str) -> AssetKind {
    AssetKind::Script(ScriptAsset {
        language: language.to_string(),
        source: BASE64.encode(source),
    })
}

#[test]
fn test_function_map_uses_composite_keys() {
    let mut model = DecisionModel::new("m");
    // Two assets defining the same function name must not collide.
    let first = model.add_asset("a", script_asset("expr", "f(x) = x + 1"));
    let second = model.add_asset("b", script_asset("expr", "f(x) = x + 2"));

    let registry = create_runtime_registry();
    let functions = resolve_function_map(&model.assets, &registry);

    assert_eq!(functions.len(), 2);
    let one = functions[&function_key(first, "f")]
        .call(&[IoValue::Integer(0)])
        .unwrap();
    let two = functions[&function_key(second, "f")]
        .call(&[IoValue::Integer(0)])
        .unwrap();
    assert_eq!(one, vec![IoValue::Integer(1)]);
    assert_eq!(two, vec![IoValue::Integer(2)]);
}

#[test]
fn test_resolution_is_fault_isolated_per_asset() {
    let mut model = DecisionModel::new("m");
    // Not valid base64.
    model.add_asset(
        "broken blob",
        AssetKind::Script(ScriptAsset {
            language: "expr".to_string(),
            source: "%%% not base64 %%%".to_string(),
        }),
    );
    // Decodes, but the source does not parse.
    model.add_asset("broken source", script_asset("expr", "this is not a definition"));
    // Language nobody registered.
    model.add_asset("unsupported", script_asset("lua", "function f() end"));
    // The one good asset must still resolve.
    let good = model.add_asset("good", script_asset("expr", "ok(x) = x"));

    let registry = create_runtime_registry();
    let functions = resolve_function_map(&model.assets, &registry);

    assert_eq!(functions.len(), 1);
    assert!(functions.contains_key(&function_key(good, "ok")));
}

#[test]
fn test_asset_map_covers_all_kinds() {
    let mut model = DecisionModel::new("m");
    let script = model.add_asset("s", script_asset("expr", "f(x) = x"));
    let rest = model.add_asset(
        "r",
        AssetKind::Rest(RestAsset {
            endpoint: "http://localhost:9000".to_string(),
            method: HttpMethod::Get,
            default_payload: IoValue::Null,
            default_path_suffix: None,
        }),
    );

    let assets = resolve_asset_map(&model.assets);
    assert_eq!(assets.len(), 2);
    assert!(matches!(assets[&script].kind, AssetKind::Script(_)));
    assert!(matches!(assets[&rest].kind, AssetKind::Rest(_)));
}

#[test]
fn test_cache_reuses_until_assets_change() {
    let mut model = DecisionModel::new("m");
    model.add_asset("a", script_asset("expr", "f(x) = x * 2"));

    let registry = create_runtime_registry();
    let cache = ResolverCache::new();

    let first = cache.resolve(&model, &registry);
    let second = cache.resolve(&model, &registry);
    assert!(
        Arc::ptr_eq(&first, &second),
        "Unchanged document must hit the cache"
    );

    // Any asset edit must invalidate.
    model.add_asset("b", script_asset("expr", "g(x) = x + 1"));
    let third = cache.resolve(&model, &registry);
    assert!(!Arc::ptr_eq(&first, &third));
    assert_eq!(third.functions.len(), 2);
}
