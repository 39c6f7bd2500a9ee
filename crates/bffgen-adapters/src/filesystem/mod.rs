//! Filesystem adapters.

mod local;

pub use local::LocalFilesystem;
