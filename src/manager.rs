//! Module query facade: the public list / insert / remove / describe
//! surface.
//!
//! [`ModuleManager`] validates and normalizes caller options, runs the
//! parameter encoder and table parser, and delegates to the collaborator
//! binding behind [`ModuleBackend`]. Locally invalid input never reaches
//! the native layer; native failures propagate once, immediately, with
//! their diagnostic detail intact — no retries, module load/unload is not
//! idempotent.

use crate::backend::{ModuleBackend, SyscallBackend};
use crate::error::{ModuleError, Result};
use crate::info::ModuleInfo;
use crate::params::{encode_set, ParameterSet};
use crate::table::{read_table, ModuleRecord, MODULE_TABLE_PATH};
use std::collections::HashMap;
use std::path::PathBuf;

/// Options for [`ModuleManager::remove`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoveOptions {
    /// Remove modules which are in use or not designed to be removed.
    /// Takes effect only on kernels built with CONFIG_MODULE_FORCE_UNLOAD
    /// and can crash the machine.
    pub force: bool,
    /// Route native layer diagnostics to the syslog channel for the
    /// duration of the call.
    pub syslog: bool,
    /// Block until the module is no longer in use instead of failing.
    pub wait: bool,
    /// Diagnostic verbosity; values below zero are treated as zero.
    pub verbose: i32,
}

/// Options for [`ModuleManager::describe`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescribeOptions {
    /// Root directory prepended to the module directory tree. Empty means
    /// the filesystem root.
    pub base_dir: String,
    /// Kernel version whose modules to query; `None` means the running
    /// kernel. Useful for inspecting an installed-but-not-running module
    /// tree, e.g. when building an initramfs for a new kernel.
    pub kernel_version: Option<String>,
}

/// Disables the syslog channel again when dropped, so the toggle is
/// restored on every exit path, including native failures.
struct SyslogGuard<'a, B: ModuleBackend> {
    backend: &'a B,
}

impl<'a, B: ModuleBackend> SyslogGuard<'a, B> {
    fn enable(backend: &'a B) -> Self {
        backend.set_logging(true);
        SyslogGuard { backend }
    }
}

impl<B: ModuleBackend> Drop for SyslogGuard<'_, B> {
    fn drop(&mut self) {
        self.backend.set_logging(false);
    }
}

/// The module control surface over one collaborator binding.
///
/// Every operation is synchronous and blocking, produces independent value
/// objects, and holds no state between calls. Results of [`list`] and
/// [`describe`] are point-in-time snapshots: the kernel may load or unload
/// modules the moment a call returns.
///
/// [`list`]: ModuleManager::list
/// [`describe`]: ModuleManager::describe
pub struct ModuleManager<B: ModuleBackend> {
    backend: B,
    table_path: PathBuf,
}

impl ModuleManager<SyscallBackend> {
    /// Manager over the production syscall binding and `/proc/modules`.
    pub fn new() -> Self {
        ModuleManager::with_backend(SyscallBackend::new())
    }
}

impl Default for ModuleManager<SyscallBackend> {
    fn default() -> Self {
        ModuleManager::new()
    }
}

impl<B: ModuleBackend> ModuleManager<B> {
    /// Manager over a custom collaborator binding.
    pub fn with_backend(backend: B) -> Self {
        ModuleManager {
            backend,
            table_path: PathBuf::from(MODULE_TABLE_PATH),
        }
    }

    /// Redirect the module table source (captured snapshots, tests).
    pub fn with_table_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.table_path = path.into();
        self
    }

    /// Snapshot the currently loaded modules, keyed by name.
    ///
    /// The mapping is rebuilt from scratch on every call.
    ///
    /// # Errors
    ///
    /// Returns `TableUnavailable` when the table resource cannot be read
    /// and `MalformedTableLine` when its contents do not parse.
    pub fn list(&self) -> Result<HashMap<String, ModuleRecord>> {
        read_table(&self.table_path)
    }

    /// Insert the module image at `path` with the given parameters.
    ///
    /// Only the most general failure reasons are reported: the linking work
    /// happens inside the kernel, and the kernel log usually explains the
    /// error in more detail.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameterType` when `parameters` does not encode
    /// (nothing reaches the native layer in that case), `InsertFailed` or
    /// `UnknownFailure` from the native layer otherwise.
    pub fn insert(&self, path: &str, parameters: &ParameterSet) -> Result<()> {
        let encoded = encode_set(parameters)?;
        log::debug!("insert {} with {:?}", path, encoded);
        self.backend.insert(path, &encoded)
    }

    /// Remove one or more modules.
    ///
    /// With `syslog` set, the native layer's syslog channel is enabled for
    /// the duration of the call and disabled again afterwards regardless of
    /// outcome; the flag itself is not forwarded as a removal parameter.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` when `names` is empty (the native layer is
    /// not invoked), `RemoveFailed` or `UnknownFailure` from the native
    /// layer otherwise.
    pub fn remove(&self, names: &[&str], options: &RemoveOptions) -> Result<()> {
        if names.is_empty() {
            return Err(ModuleError::InvalidArgument(
                "at least one module name is required".to_string(),
            ));
        }
        let names: Vec<String> = names.iter().map(|name| name.to_string()).collect();
        let verbosity = options.verbose.max(0) as u32;

        log::debug!(
            "remove {:?} force={} wait={} verbosity={}",
            names,
            options.force,
            options.wait,
            verbosity
        );
        let _syslog = if options.syslog {
            Some(SyslogGuard::enable(&self.backend))
        } else {
            None
        };
        self.backend
            .remove(&names, options.force, options.wait, verbosity)
    }

    /// Report static metadata for one or more module names or paths.
    ///
    /// Records are concatenated in argument order, preserving the order the
    /// native layer reports per identifier.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` when `identifiers` is empty (the native
    /// layer is not invoked), `ModuleNotFound` for an identifier the native
    /// layer cannot resolve, `UnknownFailure` otherwise.
    pub fn describe(
        &self,
        identifiers: &[&str],
        options: &DescribeOptions,
    ) -> Result<Vec<ModuleInfo>> {
        if identifiers.is_empty() {
            return Err(ModuleError::InvalidArgument(
                "at least one module name or path is required".to_string(),
            ));
        }

        let mut records = Vec::new();
        for identifier in identifiers {
            let infos = self.backend.query_info(
                identifier,
                &options.base_dir,
                options.kernel_version.as_deref(),
            )?;
            records.extend(infos);
        }
        Ok(records)
    }
}
