//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

/// Success - operation completed without errors
#[allow(dead_code)]
pub const SUCCESS: i32 = 0;

/// General error - unspecified failure
pub const ERROR: i32 = 1;

/// Configuration error - unreadable or invalid config, bad `set` entries, datasources
pub const CONFIG_ERROR: i32 = 2;

/// Template error - self-rendering or app rendering failed
pub const TEMPLATE_ERROR: i32 = 3;

/// App error - a filter or app file could not be resolved
pub const APP_NOT_FOUND: i32 = 4;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: i32 = 5;

/// Chart dependency build failed
pub const BUILD_ERROR: i32 = 6;

/// The current kubectl context is not the configured target
pub const CONTEXT_MISMATCH: i32 = 7;

/// helm or kubectl failed
pub const EXTERNAL_ERROR: i32 = 8;
