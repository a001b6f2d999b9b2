//! Asset resolver: turns raw asset definitions into the lookup maps the
//! evaluation engine consumes.
//!
//! Resolution is fault-isolated per asset: a malformed blob or a failing
//! runtime drops that one asset's functions and logs a diagnostic, and the
//! remaining assets still resolve.

pub mod cache;

use std::collections::HashMap;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use log::{error, warn};
use uuid::Uuid;

use crate::model::document::{AssetKind, EvaluatableAsset, function_key};
use crate::script::{FunctionMap, RuntimeRegistry};

pub use cache::{ResolvedMaps, ResolverCache};

/// Direct id → descriptor map; the engine dispatches backends on asset kind.
pub type AssetMap = HashMap<Uuid, EvaluatableAsset>;

/// Resolve every supported script asset into one flat function map keyed by
/// `"<assetId>_<functionName>"`.
pub fn resolve_function_map(
    assets: &[EvaluatableAsset],
    runtimes: &RuntimeRegistry,
) -> FunctionMap {
    let mut functions = FunctionMap::new();

    for asset in assets {
        let AssetKind::Script(script) = &asset.kind else {
            continue;
        };

        let Some(runtime) = runtimes.get(&script.language) else {
            warn!(
                "Asset '{}' ({}): no runtime registered for language '{}', skipping",
                asset.name, asset.id, script.language
            );
            continue;
        };

        let source = match decode_source(&script.source) {
            Ok(source) => source,
            Err(e) => {
                error!(
                    "Asset '{}' ({}): undecodable source blob: {}",
                    asset.name, asset.id, e
                );
                continue;
            }
        };

        match runtime.load(&source) {
            Ok(loaded) => {
                for (name, function) in loaded {
                    functions.insert(function_key(asset.id, &name), function);
                }
            }
            Err(e) => {
                error!(
                    "Asset '{}' ({}): runtime '{}' failed to load source: {}",
                    asset.name, asset.id, script.language, e
                );
            }
        }
    }

    functions
}

/// Build the id → descriptor map for backend dispatch.
pub fn resolve_asset_map(assets: &[EvaluatableAsset]) -> AssetMap {
    assets.iter().map(|a| (a.id, a.clone())).collect()
}

fn decode_source(blob: &str) -> Result<String, String> {
    let bytes = BASE64.decode(blob).map_err(|e| e.to_string())?;
    String::from_utf8(bytes).map_err(|e| e.to_string())
}
