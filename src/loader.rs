use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Errors that can occur while loading program text.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The named program file could not be opened.
    #[error("{}: {source}", .path.display())]
    Open { path: PathBuf, #[source] source: std::io::Error },

    /// Reading the program stream failed part way through.
    #[error("failed to read program: {source}")]
    Read { #[source] source: std::io::Error },
}

/// Program text as loaded, byte for byte. Nothing is filtered or validated;
/// bytes outside the instruction set are skipped by the interpreter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    bytes: Vec<u8>,
}

impl Program {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self { bytes: bytes.into() }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl From<&str> for Program {
    fn from(code: &str) -> Self {
        Self::new(code.as_bytes())
    }
}

impl From<String> for Program {
    fn from(code: String) -> Self {
        Self::new(code.into_bytes())
    }
}

impl From<Vec<u8>> for Program {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

/// Read `reader` until end-of-stream and keep every byte.
pub fn load<R: Read>(mut reader: R) -> Result<Program, LoadError> {
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|source| LoadError::Read { source })?;
    Ok(Program::new(bytes))
}

/// Open the file at `path` and load its contents.
pub fn load_path(path: impl AsRef<Path>) -> Result<Program, LoadError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    load(file)
}
