//! Script runtimes: the pluggable boundary that turns script-asset source
//! blobs into callable functions.
//!
//! A [`ScriptRuntime`] claims a language tag and compiles decoded source text
//! into named callables. The crate ships [`expr::ExprRuntime`], a restricted
//! expression interpreter; embedders can register their own runtimes (or
//! load them from dynamic libraries) to back other language tags with
//! pre-compiled native functions.

pub mod expr;

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

use libloading::{Library, Symbol};
use log::info;

use crate::error::EngineError;
use crate::model::value::IoValue;

/// A callable produced by a script runtime.
///
/// Inputs arrive positionally; the returned values are zipped positionally
/// against the calling element's declared outputs.
pub trait ScriptFunction: Send + Sync {
    fn call(&self, args: &[IoValue]) -> Result<Vec<IoValue>, EngineError>;
}

impl<F> ScriptFunction for F
where
    F: Fn(&[IoValue]) -> Result<Vec<IoValue>, EngineError> + Send + Sync,
{
    fn call(&self, args: &[IoValue]) -> Result<Vec<IoValue>, EngineError> {
        self(args)
    }
}

/// Flat function lookup map keyed by the composite `"<assetId>_<name>"` key.
pub type FunctionMap = HashMap<String, Arc<dyn ScriptFunction>>;

/// A runtime for one script language.
pub trait ScriptRuntime: Send + Sync {
    /// The language tag this runtime serves (matched against
    /// `ScriptAsset::language`).
    fn language(&self) -> &str;

    /// Compile decoded source text into a map of named callables.
    fn load(&self, source: &str) -> Result<HashMap<String, Arc<dyn ScriptFunction>>, EngineError>;
}

struct RegistryInner {
    runtimes: HashMap<String, Arc<dyn ScriptRuntime>>,
    // Keeps dynamically loaded libraries alive for as long as their runtimes.
    dynamic_libraries: Vec<Library>,
}

/// Registry of script runtimes keyed by language tag.
pub struct RuntimeRegistry {
    inner: RwLock<RegistryInner>,
}

impl RuntimeRegistry {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(RegistryInner {
                runtimes: HashMap::new(),
                dynamic_libraries: Vec::new(),
            }),
        }
    }

    pub fn register(&self, runtime: Arc<dyn ScriptRuntime>) {
        let mut inner = self.inner.write().unwrap();
        inner.runtimes.insert(runtime.language().to_string(), runtime);
    }

    pub fn get(&self, language: &str) -> Option<Arc<dyn ScriptRuntime>> {
        let inner = self.inner.read().unwrap();
        inner.runtimes.get(language).cloned()
    }

    pub fn supported_languages(&self) -> Vec<String> {
        let inner = self.inner.read().unwrap();
        inner.runtimes.keys().cloned().collect()
    }

    /// Load a script runtime from a dynamic library exporting a
    /// `create_script_runtime` constructor.
    pub fn load_runtime_from_file<P: AsRef<Path>>(&self, path: P) -> Result<(), EngineError> {
        unsafe {
            let library = Library::new(path.as_ref())?;
            let constructor: Symbol<unsafe extern "C" fn() -> *mut dyn ScriptRuntime> =
                library.get(b"create_script_runtime")?;
            let raw = constructor();
            if raw.is_null() {
                return Err(EngineError::Runtime(
                    "Runtime constructor create_script_runtime returned null".to_string(),
                ));
            }
            let runtime: Arc<dyn ScriptRuntime> = Arc::from(Box::from_raw(raw));

            let mut inner = self.inner.write().unwrap();
            info!(
                "Registered dynamic script runtime for language '{}'",
                runtime.language()
            );
            inner
                .runtimes
                .insert(runtime.language().to_string(), runtime);
            inner.dynamic_libraries.push(library);
            Ok(())
        }
    }

    /// Load every runtime library (`.so`/`.dll`) found in a directory.
    pub fn load_runtimes_from_directory<P: AsRef<Path>>(
        &self,
        dir_path: P,
    ) -> Result<(), EngineError> {
        let dir = dir_path.as_ref();
        if !dir.is_dir() {
            log::warn!("Runtime plugin directory not found: {}", dir.display());
            return Ok(());
        }

        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let extension = path.extension().and_then(|s| s.to_str());
            if matches!(extension, Some("dll") | Some("so")) {
                info!("Attempting to load script runtime from: {}", path.display());
                if let Err(e) = self.load_runtime_from_file(&path) {
                    log::warn!("Not a script runtime library ({}): {}", path.display(), e);
                }
            }
        }
        Ok(())
    }
}

impl Default for RuntimeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct DummyRuntime;

    impl ScriptRuntime for DummyRuntime {
        fn language(&self) -> &str {
            "dummy"
        }

        fn load(
            &self,
            _source: &str,
        ) -> Result<HashMap<String, Arc<dyn ScriptFunction>>, EngineError> {
            let mut map: HashMap<String, Arc<dyn ScriptFunction>> = HashMap::new();
            let one = |_args: &[IoValue]| -> Result<Vec<IoValue>, EngineError> {
                Ok(vec![IoValue::Integer(1)])
            };
            map.insert("one".to_string(), Arc::new(one));
            Ok(map)
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = RuntimeRegistry::new();
        assert!(registry.get("dummy").is_none());

        registry.register(Arc::new(DummyRuntime));
        let runtime = registry.get("dummy").expect("Runtime not registered");
        let functions = runtime.load("").unwrap();
        let result = functions["one"].call(&[]).unwrap();
        assert_eq!(result, vec![IoValue::Integer(1)]);
    }
}
