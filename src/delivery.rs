//! Handing the finished document over
//!
//! A [`Delivery`] plays the part of the new browsing context the printable
//! document is opened in. When it cannot be opened the caller keeps the
//! document and reports a distinct failure.

use crate::DeliveryError;
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

/// Where finished documents go
pub trait Delivery {
    fn deliver(&self, document: &str) -> Result<(), DeliveryError>;

    /// Human-readable target, for logs
    fn describe(&self) -> String;
}

/// Writes the document to a file
#[derive(Debug, Clone)]
pub struct FileDelivery {
    path: PathBuf,
}

impl FileDelivery {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Delivery for FileDelivery {
    fn deliver(&self, document: &str) -> Result<(), DeliveryError> {
        fs::write(&self.path, document).map_err(|e| DeliveryError::Blocked {
            target: self.describe(),
            reason: e.to_string(),
        })?;
        tracing::info!("Wrote {} bytes to {}", document.len(), self.path.display());
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Keeps delivered documents in memory
#[derive(Debug, Default)]
pub struct MemoryDelivery {
    documents: RefCell<Vec<String>>,
    blocked: bool,
}

impl MemoryDelivery {
    pub fn new() -> Self {
        Self::default()
    }

    /// A delivery that refuses every document
    pub fn blocked() -> Self {
        Self {
            documents: RefCell::default(),
            blocked: true,
        }
    }

    pub fn documents(&self) -> Vec<String> {
        self.documents.borrow().clone()
    }
}

impl Delivery for MemoryDelivery {
    fn deliver(&self, document: &str) -> Result<(), DeliveryError> {
        if self.blocked {
            return Err(DeliveryError::Blocked {
                target: self.describe(),
                reason: "blocked".to_string(),
            });
        }
        self.documents.borrow_mut().push(document.to_string());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
