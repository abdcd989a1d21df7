use std::path::Path;

use crate::result::Result;

/// Read a source file into memory, mapping I/O failures to a printable
/// message naming the path.
pub fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| format!("could not read {}: {}", path.display(), e))
}

/// Write an output artifact next to its siblings, mapping I/O failures to a
/// printable message naming the path.
pub fn write_artifact(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content)
        .map_err(|e| format!("could not write {}: {}", path.display(), e))
}
