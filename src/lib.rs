//! Typed control surface for Linux kernel module management.
//!
//! Lists loaded modules, inserts modules with typed parameters, removes
//! modules, and reports static module metadata. Module state transitions go
//! through the kernel's module syscalls; metadata queries go through the
//! system `modinfo` tool. This crate owns the format-sensitive edges above
//! that native layer: the kernel parameter string encoding, the
//! `/proc/modules` snapshot parser, and the option and error contracts of
//! the four public operations.
//!
//! The system is organized into functional modules:
//! - **error**: closed error taxonomy for all operations
//! - **params**: typed parameter values and the kernel parameter encoder
//! - **table**: live module table parsing and snapshots
//! - **info**: ordered attribute maps for describe results
//! - **backend**: the native module layer boundary and its syscall binding
//! - **manager**: the list / insert / remove / describe facade
//!
//! ```no_run
//! use kmodule::{ModuleManager, ParameterSet};
//!
//! let manager = ModuleManager::new();
//!
//! let mut params = ParameterSet::new();
//! params.insert("debug", 1);
//! params.insert("ifname", "eth%d");
//! manager.insert("/lib/modules/extra/hello_5.ko", &params)?;
//!
//! for module in manager.list()?.values() {
//!     println!("{}", module);
//! }
//! # Ok::<(), kmodule::ModuleError>(())
//! ```

// Core foundational modules
pub mod error;
pub mod info;
pub mod params;
pub mod table;

// Native module layer boundary
pub mod backend;

// Public operation surface
pub mod manager;

// Re-export error types for easy access
pub use error::{ModuleError, Result};

// Re-export the data model
pub use info::{InfoValue, ModuleInfo};
pub use params::{encode_param, encode_set, ParamItem, ParamValue, ParameterSet};
pub use table::{parse_line, parse_table, ModuleRecord, MODULE_TABLE_PATH};

// Re-export the backend seam and the facade
pub use backend::{ModuleBackend, SyscallBackend};
pub use manager::{DescribeOptions, ModuleManager, RemoveOptions};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
