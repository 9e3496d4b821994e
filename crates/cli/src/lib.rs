//! File system host for the Firstline engine: a directory-backed vault and
//! a `notify` watcher that feeds the rename service.

pub mod fs_host;
pub mod watch;

pub use fs_host::FsVault;
