//! Extension Loader
//!
//! Stages that are not compiled into the binary are loaded from shared
//! libraries. A module exports one *stage declaration* per component,
//! under the symbol `New<Name>`, with the [`declare_stage!`] macro:
//!
//! ```ignore
//! use vigil_pipeline::{Constructor, declare_stage};
//!
//! fn new_dedup() -> Box<dyn vigil_pipeline::Processor> {
//!     Box::new(Dedup::default())
//! }
//!
//! declare_stage!(NewDedup, Constructor::Processor(new_dedup));
//! ```
//!
//! The declaration carries the extension API version and the vigil
//! version it was built against; both are checked before the constructor
//! is handed out. Modules are opened once per path and never unloaded.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use libloading::Library;
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::error::ExtensionError;
use crate::stage::Constructor;

/// Version of the declaration layout and stage traits
pub const EXTENSION_API_VERSION: u32 = 1;

/// Version of this crate; modules must be built against the same one
pub const VIGIL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Exported by extension modules, one per component
#[derive(Debug)]
pub struct StageDeclaration {
    pub api_version: u32,
    pub vigil_version: &'static str,
    pub constructor: Constructor,
}

/// Export a stage declaration from an extension module
#[macro_export]
macro_rules! declare_stage {
    ($symbol:ident, $constructor:expr) => {
        #[unsafe(no_mangle)]
        #[allow(non_upper_case_globals)]
        pub static $symbol: $crate::StageDeclaration = $crate::StageDeclaration {
            api_version: $crate::EXTENSION_API_VERSION,
            vigil_version: $crate::VIGIL_VERSION,
            constructor: $constructor,
        };
    };
}

/// Path-keyed cache of loaded modules
#[derive(Debug, Default)]
pub struct ExtensionLoader {
    modules: Mutex<HashMap<PathBuf, Arc<Library>>>,
}

impl ExtensionLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the module at `path`, or return the cached handle
    pub fn open(&self, path: &Path) -> Result<Arc<Library>, ExtensionError> {
        let mut modules = self.modules.lock();
        if let Some(library) = modules.get(path) {
            return Ok(library.clone());
        }

        // SAFETY: loading runs the module's initialisers. Modules are
        // trusted deployment artifacts named in the pipeline config.
        let library = unsafe { Library::new(path) }.map_err(|source| ExtensionError::Load {
            path: path.to_path_buf(),
            source,
        })?;

        info!(module = %path.display(), "loaded extension module");
        let library = Arc::new(library);
        modules.insert(path.to_path_buf(), library.clone());
        Ok(library)
    }

    /// Read the stage declaration exported as `symbol` from the module
    pub fn resolve(&self, path: &Path, symbol: &str) -> Result<Constructor, ExtensionError> {
        let library = self.open(path)?;

        // SAFETY: `declare_stage!` exports a `StageDeclaration` static under
        // this name. The library is never unloaded, so the reference stays
        // valid for the life of the process.
        let declaration: &StageDeclaration = unsafe {
            let symbol_ref = library
                .get::<*const StageDeclaration>(symbol.as_bytes())
                .map_err(|source| ExtensionError::Symbol {
                    path: path.to_path_buf(),
                    symbol: symbol.to_string(),
                    source,
                })?;
            &**symbol_ref
        };

        if declaration.api_version != EXTENSION_API_VERSION
            || declaration.vigil_version != VIGIL_VERSION
        {
            return Err(ExtensionError::Incompatible {
                path: path.to_path_buf(),
                symbol: symbol.to_string(),
                expected: EXTENSION_API_VERSION,
                found: declaration.api_version,
                expected_version: VIGIL_VERSION,
                found_version: declaration.vigil_version.to_string(),
            });
        }

        debug!(
            module = %path.display(),
            symbol,
            shape = declaration.constructor.shape(),
            "resolved extension symbol"
        );
        Ok(declaration.constructor)
    }

    /// Number of modules loaded
    pub fn len(&self) -> usize {
        self.modules.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.lock().is_empty()
    }
}

impl Drop for ExtensionLoader {
    fn drop(&mut self) {
        // stage code from a module may still be running on another task
        for (_, library) in self.modules.get_mut().drain() {
            std::mem::forget(library);
        }
    }
}

#[cfg(test)]
#[path = "extension_test.rs"]
mod extension_test;
