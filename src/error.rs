//! Error types
//!
//! Catalog and level errors indicate corrupt static data and are fatal to a
//! mission; callers should fail fast rather than degrade.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from the weapon/ammunition/grenade catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{kind} not found in catalog: {name}")]
    NotFound { kind: &'static str, name: String },

    #[error("failed to read catalog from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed catalog data: {0}")]
    Parse(#[from] serde_json::Error),
}

impl CatalogError {
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        CatalogError::NotFound {
            kind,
            name: name.into(),
        }
    }
}

/// Errors from loading level data
#[derive(Debug, Error)]
pub enum LevelError {
    #[error("failed to read level data from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed level data: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid scroll direction: {0:?}")]
    InvalidDirection(String),

    #[error("level {0:?} has no segments")]
    NoSegments(String),
}

/// Errors from loading settings
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed settings: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors surfaced by the simulation engine
#[derive(Debug, Error)]
pub enum SimError {
    #[error("no such player: {0}")]
    NoSuchPlayer(usize),

    #[error("a mission needs at least one player profile")]
    NoPlayers,

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Level(#[from] LevelError),
}
