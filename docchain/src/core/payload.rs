//! Opaque binary payload threaded between steps.

use std::fmt;
use std::sync::Arc;

/// A document buffer passed from one step to the next.
///
/// Cloning a payload clones a reference, never the bytes. The pipeline
/// core does not look inside it.
#[derive(Clone, PartialEq, Eq)]
pub struct Payload {
    name: Arc<str>,
    bytes: Arc<[u8]>,
}

impl Payload {
    /// Creates a new payload.
    #[must_use]
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: Arc::from(name.into()),
            bytes: Arc::from(bytes.into()),
        }
    }

    /// Returns the file name attached to the payload.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the raw bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true if the payload holds no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns true if both payloads share the same underlying buffer.
    #[must_use]
    pub fn same_buffer(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.bytes, &other.bytes)
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Payload")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}
