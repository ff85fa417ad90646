use std::fs;
use std::path::Path;

use log::*;

/// Reads a file into memory, yielding an empty buffer on any I/O failure.
/// Callers treat empty bytecode as fatal; the loader itself only warns.
pub fn read_bytes<P: AsRef<Path>>(path: P) -> Vec<u8> {
    match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(error) => {
            warn!(
                "Failed opening file {}: {}",
                path.as_ref().display(),
                error
            );
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_empty_buffer() {
        assert!(read_bytes("shaders/does-not-exist.spv").is_empty());
    }
}
