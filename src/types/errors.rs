use std::fmt;

// === LibraryError ===

/// Errors raised by library mutations.
#[derive(Debug)]
pub enum LibraryError {
    /// Bookmark with the given ID was not found.
    BookmarkNotFound(String),
    /// Project with the given ID was not found.
    ProjectNotFound(String),
    /// The request carried an unusable value.
    InvalidInput(String),
}

impl fmt::Display for LibraryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LibraryError::BookmarkNotFound(id) => write!(f, "Bookmark not found: {}", id),
            LibraryError::ProjectNotFound(id) => write!(f, "Project not found: {}", id),
            LibraryError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
        }
    }
}

impl std::error::Error for LibraryError {}

// === StoreError ===

/// Errors from the local key-value store.
#[derive(Debug)]
pub enum StoreError {
    /// No persistent storage is available in this environment.
    Unavailable,
    /// Database operation failed.
    DatabaseError(String),
    /// A value could not be encoded.
    SerializationError(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Unavailable => write!(f, "Local storage unavailable"),
            StoreError::DatabaseError(msg) => write!(f, "Local store database error: {}", msg),
            StoreError::SerializationError(msg) => {
                write!(f, "Local store serialization error: {}", msg)
            }
        }
    }
}

impl std::error::Error for StoreError {}

// === MigrationError ===

/// Errors raised while decoding persisted bookmark data.
#[derive(Debug)]
pub enum MigrationError {
    /// The blob is not valid JSON.
    ParseError(String),
    /// The blob is valid JSON but not an array of records.
    NotAnArray,
    /// A record matches neither the current nor any legacy shape.
    InvalidRecord(String),
}

impl fmt::Display for MigrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationError::ParseError(msg) => write!(f, "Persisted data parse error: {}", msg),
            MigrationError::NotAnArray => write!(f, "Persisted data is not an array"),
            MigrationError::InvalidRecord(msg) => write!(f, "Invalid bookmark record: {}", msg),
        }
    }
}

impl std::error::Error for MigrationError {}

// === SyncError ===

/// Errors related to remote state synchronization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// No remote store is configured.
    NotConfigured,
    /// No identity is signed in.
    SignedOut,
    /// The request never reached the server or the connection dropped.
    Transport(String),
    /// The server rejected the credentials.
    Auth(String),
    /// The server answered with an error status.
    Remote(String),
    /// The server answered with a body that could not be decoded.
    Decode(String),
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::NotConfigured => write!(f, "Cloud sync is not configured"),
            SyncError::SignedOut => write!(f, "Not signed in"),
            SyncError::Transport(msg) => write!(f, "Sync transport error: {}", msg),
            SyncError::Auth(msg) => write!(f, "Sync authentication failed: {}", msg),
            SyncError::Remote(msg) => write!(f, "Sync server error: {}", msg),
            SyncError::Decode(msg) => write!(f, "Sync decode error: {}", msg),
        }
    }
}

impl std::error::Error for SyncError {}

// === AIError ===

/// Errors related to AI assistant calls.
#[derive(Debug)]
pub enum AIError {
    /// No API key was configured.
    MissingApiKey,
    /// The HTTP request failed or returned an error status.
    RequestFailed(String),
    /// The model returned no content.
    EmptyResponse,
    /// The model returned content that did not match the expected shape.
    InvalidResponse(String),
}

impl fmt::Display for AIError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AIError::MissingApiKey => write!(f, "AI API key is missing"),
            AIError::RequestFailed(msg) => write!(f, "AI request failed: {}", msg),
            AIError::EmptyResponse => write!(f, "AI returned an empty response"),
            AIError::InvalidResponse(msg) => write!(f, "AI returned an invalid response: {}", msg),
        }
    }
}

impl std::error::Error for AIError {}

// === SettingsError ===

/// Errors related to settings management.
#[derive(Debug)]
pub enum SettingsError {
    /// An I/O error occurred while reading or writing settings.
    IoError(String),
    /// Failed to serialize or deserialize settings.
    SerializationError(String),
    /// The provided settings key is invalid.
    InvalidKey(String),
    /// The provided settings value is invalid.
    InvalidValue(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::IoError(msg) => write!(f, "Settings I/O error: {}", msg),
            SettingsError::SerializationError(msg) => {
                write!(f, "Settings serialization error: {}", msg)
            }
            SettingsError::InvalidKey(key) => write!(f, "Invalid settings key: {}", key),
            SettingsError::InvalidValue(msg) => write!(f, "Invalid settings value: {}", msg),
        }
    }
}

impl std::error::Error for SettingsError {}
