//! Builtin restricted expression runtime for the `"expr"` language tag.
//!
//! Scripts are lists of one-line function definitions; each definition's
//! comma-separated body is its positional output list. The interpreter is
//! deliberately capability-free: expressions can read their arguments and
//! call a fixed set of pure builtins, nothing else.

mod interp;
mod parser;
mod token;

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::EngineError;
use crate::model::value::IoValue;
use crate::script::{ScriptFunction, ScriptRuntime};

pub use parser::{Definition, Expr};

pub const EXPR_LANGUAGE: &str = "expr";

pub struct ExprRuntime;

impl ExprRuntime {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ExprRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptRuntime for ExprRuntime {
    fn language(&self) -> &str {
        EXPR_LANGUAGE
    }

    fn load(&self, source: &str) -> Result<HashMap<String, Arc<dyn ScriptFunction>>, EngineError> {
        let definitions = parser::parse_source(source)?;
        let mut functions: HashMap<String, Arc<dyn ScriptFunction>> = HashMap::new();
        for definition in definitions {
            let name = definition.name.clone();
            functions.insert(name, Arc::new(CompiledFunction { definition }));
        }
        Ok(functions)
    }
}

/// One parsed definition, callable with positional arguments.
struct CompiledFunction {
    definition: Definition,
}

impl ScriptFunction for CompiledFunction {
    fn call(&self, args: &[IoValue]) -> Result<Vec<IoValue>, EngineError> {
        // Missing trailing arguments bind to Null rather than erroring; the
        // engine's readiness test makes that unusual but not impossible.
        let env: HashMap<String, IoValue> = self
            .definition
            .params
            .iter()
            .enumerate()
            .map(|(index, param)| {
                (
                    param.clone(),
                    args.get(index).cloned().unwrap_or(IoValue::Null),
                )
            })
            .collect();

        self.definition
            .body
            .iter()
            .map(|expr| interp::evaluate(expr, &env))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_and_call() {
        let runtime = ExprRuntime::new();
        let functions = runtime
            .load("double(x) = x * 2\ninc(y) = y + 1\n")
            .unwrap();
        assert_eq!(functions.len(), 2);

        let result = functions["double"].call(&[IoValue::Integer(3)]).unwrap();
        assert_eq!(result, vec![IoValue::Integer(6)]);
    }

    #[test]
    fn test_multi_output_function() {
        let runtime = ExprRuntime::new();
        let functions = runtime.load("split(a, b) = a + b, a - b").unwrap();
        let result = functions["split"]
            .call(&[IoValue::Integer(5), IoValue::Integer(2)])
            .unwrap();
        assert_eq!(result, vec![IoValue::Integer(7), IoValue::Integer(3)]);
    }

    #[test]
    fn test_load_rejects_bad_source() {
        let runtime = ExprRuntime::new();
        assert!(runtime.load("not a definition").is_err());
    }

    #[test]
    fn test_missing_argument_binds_null() {
        let runtime = ExprRuntime::new();
        let functions = runtime.load("pick(a, b) = if(b == null, a, b)").unwrap();
        let result = functions["pick"].call(&[IoValue::Integer(1)]).unwrap();
        assert_eq!(result, vec![IoValue::Integer(1)]);
    }
}
