use std::path::PathBuf;

use thiserror::Error;

/// Failure kinds surfaced by the initialization chain. Everything here is
/// fatal: the caller reports it and never enters the frame loop.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("no suitable physical device found")]
    NoSuitableDevice,

    #[error("missing required queue families")]
    MissingQueueFamilies,

    #[error("no compatible memory type for the requested allocation")]
    NoCompatibleMemoryType,

    #[error("shader bytecode at `{0}` is empty or unreadable")]
    EmptyShaderBytecode(PathBuf),
}
