//! The decision model document: I/O values, evaluatable assets/elements and
//! runnable models.
//!
//! This is the in-memory form of a persisted CDD document. Structural schema
//! validation happens upstream (the editor side); the engine trusts these
//! shapes as loaded.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EngineError;
use crate::model::value::{IoValue, ValueMap};

/// Composite lookup key for a script function: asset id + function name.
///
/// Scoping by asset id keeps same-named functions from different assets from
/// colliding in one flat function map.
pub fn function_key(asset_id: Uuid, function_name: &str) -> String {
    format!("{}_{}", asset_id, function_name)
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct DecisionModel {
    pub meta: ModelMeta,
    #[serde(default)]
    pub io_values: Vec<IoValueDef>,
    #[serde(default)]
    pub assets: Vec<EvaluatableAsset>,
    #[serde(default)]
    pub runnable_models: Vec<RunnableModel>,
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct ModelMeta {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// A named datum read and written during evaluation.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct IoValueDef {
    pub id: Uuid,
    pub name: String,
    /// Current/default value held by the document.
    #[serde(default)]
    pub value: IoValue,
}

/// A unit of executable logic referenced by elements.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct EvaluatableAsset {
    pub id: Uuid,
    pub name: String,
    #[serde(flatten)]
    pub kind: AssetKind,
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(tag = "asset_type", rename_all = "snake_case")]
pub enum AssetKind {
    Script(ScriptAsset),
    Rest(RestAsset),
}

/// Script asset: a language tag plus a base64-encoded source blob that, once
/// loaded by the matching runtime, yields named callables.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct ScriptAsset {
    pub language: String,
    pub source: String,
}

/// Remote-call asset: a parameterized HTTP endpoint.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct RestAsset {
    pub endpoint: String,
    pub method: HttpMethod,
    /// Body sent when the element supplies no payload input.
    #[serde(default)]
    pub default_payload: IoValue,
    /// Appended to the endpoint when the element supplies no suffix input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_path_suffix: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    /// GET requests carry no body; everything else serializes one.
    pub fn has_body(&self) -> bool {
        !matches!(self, HttpMethod::Get)
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        };
        write!(f, "{}", name)
    }
}

/// Binding of one asset invocation to ordered input/output I/O value ids.
///
/// Order matters on both sides: script functions receive inputs positionally
/// and their returned values are zipped against `outputs` by index.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct EvaluatableElement {
    pub id: Uuid,
    pub name: String,
    pub asset_id: Uuid,
    /// Function within the asset; required for script assets, unused for
    /// remote-call assets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_name: Option<String>,
    #[serde(default)]
    pub inputs: Vec<Uuid>,
    #[serde(default)]
    pub outputs: Vec<Uuid>,
}

impl EvaluatableElement {
    pub fn new(name: &str, asset_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            asset_id,
            function_name: None,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }
}

/// A named group of elements; multiple runnable models may be pooled into one
/// evaluation run.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct RunnableModel {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub elements: Vec<EvaluatableElement>,
}

impl RunnableModel {
    pub fn new(name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            elements: Vec::new(),
        }
    }
}

impl DecisionModel {
    pub fn new(name: &str) -> Self {
        Self {
            meta: ModelMeta {
                id: Uuid::new_v4(),
                name: name.to_string(),
                summary: None,
            },
            io_values: Vec::new(),
            assets: Vec::new(),
            runnable_models: Vec::new(),
        }
    }

    pub fn load(json: &str) -> Result<Self, EngineError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn save(&self) -> Result<String, EngineError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Build the initial value snapshot from the document's I/O values.
    pub fn snapshot(&self) -> ValueMap {
        self.io_values
            .iter()
            .map(|def| (def.id, def.value.clone()))
            .collect()
    }

    pub fn get_asset(&self, id: Uuid) -> Option<&EvaluatableAsset> {
        self.assets.iter().find(|a| a.id == id)
    }

    pub fn get_io_value(&self, id: Uuid) -> Option<&IoValueDef> {
        self.io_values.iter().find(|v| v.id == id)
    }

    pub fn add_io_value(&mut self, name: &str, value: IoValue) -> Uuid {
        let def = IoValueDef {
            id: Uuid::new_v4(),
            name: name.to_string(),
            value,
        };
        let id = def.id;
        self.io_values.push(def);
        id
    }

    pub fn add_asset(&mut self, name: &str, kind: AssetKind) -> Uuid {
        let asset = EvaluatableAsset {
            id: Uuid::new_v4(),
            name: name.to_string(),
            kind,
        };
        let id = asset.id;
        self.assets.push(asset);
        id
    }

    pub fn add_runnable_model(&mut self, model: RunnableModel) -> Uuid {
        let id = model.id;
        self.runnable_models.push(model);
        id
    }
}
