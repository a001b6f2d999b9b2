//! Evaluation engine — drives one simulation step over the pooled elements
//! of the active runnable models.
//!
//! Elements from every active model are pooled into one working set and
//! swept in passes: any element whose declared inputs are all known is
//! dispatched to its backend, its outputs are merged into the working map,
//! and the next pass re-tests readiness against the enlarged known set. The
//! loop ends when everything evaluated or a pass makes no progress.

pub mod backend;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use log::{debug, warn};
use uuid::Uuid;

use crate::error::EngineError;
use crate::model::document::{AssetKind, DecisionModel, EvaluatableElement};
use crate::model::value::{IoValue, ValueMap};
use crate::resolver::AssetMap;
use crate::script::FunctionMap;

use self::backend::{HttpTransport, ReqwestTransport};

/// The evaluation engine. Stateless across calls apart from the HTTP
/// transport used by the remote-call backend.
pub struct Evaluator {
    transport: Arc<dyn HttpTransport>,
}

impl Evaluator {
    pub fn new() -> Self {
        Self {
            transport: Arc::new(ReqwestTransport::new()),
        }
    }

    /// Use a caller-supplied transport for remote calls.
    pub fn with_transport(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    /// Run one simulation step and return the enlarged value map.
    ///
    /// The input snapshot is never mutated; the result is a fresh map
    /// containing every output that could be computed from the known inputs.
    /// Element-level failures degrade to warnings and a partial result; the
    /// only caller-facing error is a malformed active-model selection.
    pub async fn evaluate(
        &self,
        model: &DecisionModel,
        functions: &FunctionMap,
        assets: &AssetMap,
        snapshot: &ValueMap,
        active_models: &[usize],
    ) -> Result<ValueMap, EngineError> {
        for &index in active_models {
            if index >= model.runnable_models.len() {
                return Err(EngineError::invalid_argument(format!(
                    "Active model index {} out of range ({} runnable models)",
                    index,
                    model.runnable_models.len()
                )));
            }
        }

        // Pool elements in active-model order, then declaration order.
        let pooled: Vec<&EvaluatableElement> = active_models
            .iter()
            .flat_map(|&index| model.runnable_models[index].elements.iter())
            .collect();

        if pooled.is_empty() {
            return Ok(snapshot.clone());
        }

        let output_ids = collect_output_ids(&pooled);
        let mut known: HashSet<Uuid> = snapshot
            .keys()
            .filter(|id| !output_ids.contains(id))
            .copied()
            .collect();

        let mut working = snapshot.clone();
        let mut unevaluated: Vec<usize> = (0..pooled.len()).collect();

        // A stall is declared only after a confirming pass: the first sweep
        // that removes nothing is followed by one more, so a never-ready set
        // terminates after exactly two zero-progress passes (and persistently
        // failing ready elements are retried until then). The ceiling guards
        // against readiness bookkeeping bugs ever looping forever.
        let max_passes = pooled.len() + 2;
        let mut previous_len = usize::MAX;
        for pass in 1..=max_passes {
            let mut remaining = Vec::new();

            for index in unevaluated {
                let element = pooled[index];
                let ready = element.inputs.iter().all(|id| known.contains(id));
                if !ready {
                    remaining.push(index);
                    continue;
                }

                match self.evaluate_element(element, functions, assets, &working).await {
                    Ok(outputs) => {
                        debug!(
                            "Pass {}: element '{}' produced {} output(s)",
                            pass,
                            element.name,
                            outputs.len()
                        );
                        for (id, value) in outputs {
                            known.insert(id);
                            working.insert(id, value);
                        }
                    }
                    Err(e) => {
                        // Failed elements stay unevaluated and are retried on
                        // the next pass.
                        warn!("{}", e);
                        remaining.push(index);
                    }
                }
            }

            unevaluated = remaining;
            if unevaluated.is_empty() {
                break;
            }
            if unevaluated.len() == previous_len {
                let names: Vec<&str> = unevaluated
                    .iter()
                    .map(|&index| pooled[index].name.as_str())
                    .collect();
                warn!(
                    "No progress between passes {} and {}; {} element(s) left unresolved: {}",
                    pass - 1,
                    pass,
                    names.len(),
                    names.join(", ")
                );
                break;
            }
            previous_len = unevaluated.len();
        }

        Ok(working)
    }

    async fn evaluate_element(
        &self,
        element: &EvaluatableElement,
        functions: &FunctionMap,
        assets: &AssetMap,
        working: &ValueMap,
    ) -> Result<Vec<(Uuid, IoValue)>, EngineError> {
        let Some(asset) = assets.get(&element.asset_id) else {
            return Err(EngineError::document(format!(
                "Element '{}' references unknown asset {}",
                element.name, element.asset_id
            )));
        };

        match &asset.kind {
            AssetKind::Script(_) => backend::script::evaluate(element, functions, working),
            AssetKind::Rest(rest) => {
                backend::rest::evaluate(element, rest, working, self.transport.as_ref()).await
            }
        }
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

/// Register every declared output id, warning when two pooled elements claim
/// the same one: the final value then depends on pooled order.
fn collect_output_ids(pooled: &[&EvaluatableElement]) -> HashSet<Uuid> {
    let mut claimed: HashMap<Uuid, &str> = HashMap::new();
    let mut output_ids = HashSet::new();

    for element in pooled {
        for output_id in &element.outputs {
            if let Some(first) = claimed.get(output_id) {
                warn!(
                    "Output {} declared by both '{}' and '{}'; its value is \
                     non-deterministic with respect to evaluation order",
                    output_id, first, element.name
                );
            } else {
                claimed.insert(*output_id, element.name.as_str());
            }
            output_ids.insert(*output_id);
        }
    }
    output_ids
}
