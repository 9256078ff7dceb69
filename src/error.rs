use thiserror::Error;

/// Centralized error type for the Face Table core.
#[derive(Error, Debug)]
pub enum Error {
    /// `initialize` was called with a role code that doesn't map to a known [`crate::NodeRole`].
    #[error("unknown node role code: {0}")]
    UnknownRole(u8),

    /// `initialize` was called on a Face Manager that is already running.
    #[error("face manager already initialized")]
    AlreadyInitialized,

    /// Neither address family could be bound for a listen face.
    #[error("no address available to bind")]
    NoAddressAvailable,

    /// `getaddrinfo`-equivalent resolution produced no usable candidate.
    #[error("could not resolve host: {0}")]
    ResolveFailed(String),

    /// Every resolved candidate for an outbound peer face was unreachable.
    #[error("peer unreachable: {0}")]
    PeerUnreachable(String),

    /// The Face-ID allocator has no free slot left outside the reserved range.
    #[error("face table is full")]
    FaceTableFull,

    /// Operation referenced a Face-ID with no live slot (already closed, or never allocated).
    #[error("face {0} is not open")]
    FaceClosed(u16),

    /// Operation referenced a Face-ID outside `[0, max_faces)`.
    #[error("face id {0} out of range")]
    FaceOutOfRange(u16),

    /// Send refused because the face's cached descriptor is a guarded low value (< 3).
    #[error("face {0} has a guarded descriptor and cannot be used for I/O")]
    GuardedDescriptor(u16),

    /// Underlying OS/networking error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Helper alias for `Result<T, face_table::Error>`.
pub type Result<T> = std::result::Result<T, Error>;
