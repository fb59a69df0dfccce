//! Chunk: the unit of upload work.

/// An identifier plus an opaque payload reference handed to the uploader.
///
/// The pool never looks inside `payload`; it only requires a non-empty `id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk<P = Vec<u8>> {
    pub id: String,
    pub payload: P,
}

impl<P> Chunk<P> {
    pub fn new(id: impl Into<String>, payload: P) -> Self {
        Self {
            id: id.into(),
            payload,
        }
    }

    /// A chunk is admissible only with a non-empty id.
    pub fn is_valid(&self) -> bool {
        !self.id.is_empty()
    }
}

impl Chunk<()> {
    /// Chunk with no payload (tests and id-only pipelines).
    pub fn id_only(id: impl Into<String>) -> Self {
        Self::new(id, ())
    }
}
