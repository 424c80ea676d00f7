//! Client domain model.
//!
//! # Responsibility
//! - Define the canonical client record shared by every store implementation.
//! - Keep timestamp and identifier representations storage-neutral.
//!
//! # Invariants
//! - `id` is assigned once by the store and never changes afterwards.
//! - `cpf` is treated as an opaque natural key; its format is not validated.
//! - `income` is non-negative by convention only, but must be finite.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-generated integer identifier.
pub type ClientId = i64;

/// UTC instant as Unix epoch milliseconds.
pub type Timestamp = i64;

/// Write-time rejection reasons for a client record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientValidationError {
    /// `income` is NaN or infinite and cannot take part in range queries.
    NonFiniteIncome,
}

impl Display for ClientValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonFiniteIncome => write!(f, "income must be a finite number"),
        }
    }
}

impl Error for ClientValidationError {}

/// Canonical client record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    /// `None` until the record has been saved.
    pub id: Option<ClientId>,
    pub name: String,
    /// Natural-person taxpayer identifier, numeric text.
    pub cpf: String,
    pub income: f64,
    /// Unix epoch milliseconds.
    pub birth_date: Timestamp,
}

impl Client {
    /// Creates an unsaved client; the store assigns `id` on first save.
    pub fn new(
        name: impl Into<String>,
        cpf: impl Into<String>,
        income: f64,
        birth_date: Timestamp,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            cpf: cpf.into(),
            income,
            birth_date,
        }
    }

    /// Creates a client with a caller-provided identifier.
    ///
    /// Saving such a record updates the existing row with that identifier,
    /// or inserts a new row keeping it.
    pub fn with_id(
        id: ClientId,
        name: impl Into<String>,
        cpf: impl Into<String>,
        income: f64,
        birth_date: Timestamp,
    ) -> Self {
        Self {
            id: Some(id),
            ..Self::new(name, cpf, income, birth_date)
        }
    }

    /// Checks the record before it is written by any store.
    ///
    /// CPF format, negative income and future birth dates are accepted.
    pub fn validate(&self) -> Result<(), ClientValidationError> {
        if !self.income.is_finite() {
            return Err(ClientValidationError::NonFiniteIncome);
        }
        Ok(())
    }

    /// Returns whether the record has been assigned an identifier.
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}
