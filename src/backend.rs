//! Boundary to the native kernel module layer.
//!
//! [`ModuleBackend`] is the seam the facade calls through: the four
//! primitive operations the native layer exposes. [`SyscallBackend`] is the
//! production binding: module state transitions go through the kernel's
//! `finit_module`/`delete_module` syscalls, static metadata queries go
//! through the system `modinfo` tool. Image parsing, dependency resolution
//! and decompression stay on the native side of this boundary.

use crate::error::{ModuleError, Result};
use crate::info::ModuleInfo;
use nix::errno::Errno;
use nix::kmod::{delete_module, finit_module, DeleteModuleFlags, ModuleInitFlags};
use std::ffi::CString;
use std::fs::File;
use std::process::Command;
use std::sync::atomic::{AtomicBool, Ordering};

/// Primitive operations of the native module layer.
pub trait ModuleBackend {
    /// Load the module image at `path`, passing `encoded_params` to the
    /// module verbatim.
    fn insert(&self, path: &str, encoded_params: &str) -> Result<()>;

    /// Unload the named modules in order, stopping at the first failure.
    fn remove(&self, names: &[String], force: bool, wait: bool, verbosity: u32) -> Result<()>;

    /// Report static metadata for one module name or path. A bare name is
    /// resolved under `<base_dir>/lib/modules/<kernel_version>` (running
    /// kernel when `kernel_version` is `None`); a filesystem path is used
    /// directly. An alias can match more than one module, hence the
    /// sequence return.
    fn query_info(
        &self,
        identifier: &str,
        base_dir: &str,
        kernel_version: Option<&str>,
    ) -> Result<Vec<ModuleInfo>>;

    /// Toggle the native layer's syslog diagnostic channel.
    fn set_logging(&self, enabled: bool);
}

/// Map an insert syscall errno onto the error taxonomy.
fn classify_insert_errno(errno: Errno, module: &str) -> ModuleError {
    let reason = match errno {
        Errno::EEXIST => "module already loaded".to_string(),
        Errno::EPERM | Errno::EACCES => "permission denied".to_string(),
        Errno::ENOEXEC | Errno::EINVAL => "invalid module image or parameters".to_string(),
        Errno::ENOMEM => "out of memory".to_string(),
        other => {
            return ModuleError::UnknownFailure(format!(
                "insert of {} failed: {}",
                module,
                other.desc()
            ))
        }
    };
    ModuleError::InsertFailed {
        module: module.to_string(),
        reason,
    }
}

/// Map a remove syscall errno onto the error taxonomy.
fn classify_remove_errno(errno: Errno, module: &str) -> ModuleError {
    let reason = match errno {
        Errno::EBUSY | Errno::EAGAIN => "module is in use".to_string(),
        Errno::ENOENT => "module is not currently loaded".to_string(),
        Errno::EPERM | Errno::EACCES => "permission denied".to_string(),
        other => {
            return ModuleError::UnknownFailure(format!(
                "remove of {} failed: {}",
                module,
                other.desc()
            ))
        }
    };
    ModuleError::RemoveFailed {
        module: module.to_string(),
        reason,
    }
}

/// Build the argument vector for one `modinfo` invocation.
fn modinfo_args(identifier: &str, base_dir: &str, kernel_version: Option<&str>) -> Vec<String> {
    let mut args = Vec::new();
    if !base_dir.is_empty() {
        args.push("-b".to_string());
        args.push(base_dir.to_string());
    }
    if let Some(kernel) = kernel_version {
        args.push("-k".to_string());
        args.push(kernel.to_string());
    }
    args.push(identifier.to_string());
    args
}

/// Production binding to the kernel module layer.
///
/// Holds the one piece of process-wide state this system has: the syslog
/// diagnostic flag. While the flag is enabled, failures are mirrored to the
/// `log` facade under the `syslog` target before being returned; they still
/// propagate to the caller either way.
#[derive(Debug, Default)]
pub struct SyscallBackend {
    syslog: AtomicBool,
}

impl SyscallBackend {
    pub fn new() -> Self {
        SyscallBackend {
            syslog: AtomicBool::new(false),
        }
    }

    fn mirror_failure(&self, error: &ModuleError) {
        if self.syslog.load(Ordering::Relaxed) {
            log::warn!(target: "syslog", "{}", error);
        }
    }
}

impl ModuleBackend for SyscallBackend {
    fn insert(&self, path: &str, encoded_params: &str) -> Result<()> {
        let params = CString::new(encoded_params).map_err(|_| {
            ModuleError::InvalidArgument("parameter string contains a NUL byte".to_string())
        })?;
        // The image must be an uncompressed .ko reachable by path; index
        // lookup and decompression belong to the surrounding tooling.
        let image = File::open(path).map_err(|err| ModuleError::InsertFailed {
            module: path.to_string(),
            reason: format!("could not load module: {}", err),
        })?;

        log::debug!("finit_module {} params={:?}", path, encoded_params);
        finit_module(&image, &params, ModuleInitFlags::empty()).map_err(|errno| {
            let error = classify_insert_errno(errno, path);
            self.mirror_failure(&error);
            error
        })
    }

    fn remove(&self, names: &[String], force: bool, wait: bool, verbosity: u32) -> Result<()> {
        let mut flags = DeleteModuleFlags::empty();
        if !wait {
            flags |= DeleteModuleFlags::O_NONBLOCK;
        }
        if force {
            flags |= DeleteModuleFlags::O_TRUNC;
        }

        for name in names {
            let c_name = CString::new(name.as_str()).map_err(|_| {
                ModuleError::InvalidArgument(format!(
                    "module name {:?} contains a NUL byte",
                    name
                ))
            })?;
            if verbosity > 0 {
                log::info!("removing module {} (flags {:?})", name, flags);
            }
            if let Err(errno) = delete_module(&c_name, flags) {
                let error = classify_remove_errno(errno, name);
                self.mirror_failure(&error);
                return Err(error);
            }
        }
        Ok(())
    }

    fn query_info(
        &self,
        identifier: &str,
        base_dir: &str,
        kernel_version: Option<&str>,
    ) -> Result<Vec<ModuleInfo>> {
        let args = modinfo_args(identifier, base_dir, kernel_version);
        log::debug!("modinfo {:?}", args);

        let output = Command::new("modinfo")
            .args(&args)
            .output()
            .map_err(|err| ModuleError::UnknownFailure(format!("could not run modinfo: {}", err)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let error = if stderr.contains("not found") {
                ModuleError::ModuleNotFound(identifier.to_string())
            } else if stderr.is_empty() {
                ModuleError::UnknownFailure(format!("modinfo exited with {}", output.status))
            } else {
                ModuleError::UnknownFailure(stderr)
            };
            self.mirror_failure(&error);
            return Err(error);
        }

        // An alias query can report several modules back to back; each
        // block starts over at its filename attribute.
        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut records = Vec::new();
        let mut block: Vec<&str> = Vec::new();
        for line in stdout.lines() {
            if line.starts_with("filename:") && !block.is_empty() {
                records.push(ModuleInfo::from_lines(block.drain(..)));
            }
            block.push(line);
        }
        if !block.is_empty() {
            records.push(ModuleInfo::from_lines(block.drain(..)));
        }
        Ok(records)
    }

    fn set_logging(&self, enabled: bool) {
        self.syslog.store(enabled, Ordering::Relaxed);
        log::debug!(
            "module layer syslog channel {}",
            if enabled { "enabled" } else { "disabled" }
        );
    }
}
