//! The module contains the errors the engine can return.
//!
//! - [`KeyNotFound`] an account, category, recurring expense, goal or
//!   transaction does not exist or belongs to another user.
//! - [`InvalidAmount`], [`InvalidDate`], [`InvalidName`], [`InvalidId`] input
//!   rejected before any write.
//! - [`ReservedName`] and [`SystemCategory`] attempts to use the reserved
//!   balance adjustment name or to mutate a system category.
//! - [`Database`] any storage failure; the surrounding DB transaction is rolled
//!   back so callers never observe partial writes.
//!
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`InvalidAmount`]: EngineError::InvalidAmount
//!  [`InvalidDate`]: EngineError::InvalidDate
//!  [`InvalidName`]: EngineError::InvalidName
//!  [`InvalidId`]: EngineError::InvalidId
//!  [`ReservedName`]: EngineError::ReservedName
//!  [`SystemCategory`]: EngineError::SystemCategory
//!  [`Database`]: EngineError::Database
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Invalid name: {0}")]
    InvalidName(String),
    #[error("Invalid id: {0}")]
    InvalidId(String),
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("Reserved name: {0}")]
    ReservedName(String),
    #[error("System category: {0}")]
    SystemCategory(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidDate(a), Self::InvalidDate(b)) => a == b,
            (Self::InvalidName(a), Self::InvalidName(b)) => a == b,
            (Self::InvalidId(a), Self::InvalidId(b)) => a == b,
            (Self::InvalidState(a), Self::InvalidState(b)) => a == b,
            (Self::ReservedName(a), Self::ReservedName(b)) => a == b,
            (Self::SystemCategory(a), Self::SystemCategory(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
