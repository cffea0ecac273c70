//! Persistence for the weather simulation.
//!
//! The `simulation` crate exposes what to save through its
//! `SaveableRegistry`; this crate owns how the bytes reach disk: a bitcode
//! extension map, LZ4 compression, a checksummed file header, and atomic
//! write-rename I/O. See `codec` for the byte pipeline and `save_plugin`
//! for the load/flush systems.

pub mod atomic_write;
pub mod codec;
pub mod file_header;
pub mod save_error;
pub mod save_plugin;

pub use save_error::SaveError;
pub use save_plugin::{flush_storm_save, load_storm_save, SavePlugin, StormSavePath};
