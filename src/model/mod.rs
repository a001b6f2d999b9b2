pub mod document;
pub mod value;

pub use document::{
    AssetKind, DecisionModel, EvaluatableAsset, EvaluatableElement, HttpMethod, IoValueDef,
    ModelMeta, RestAsset, RunnableModel, ScriptAsset, function_key,
};
pub use value::{IoValue, ValueMap};
