//! Engine errors.

#![allow(missing_docs)]

use smol_str::SmolStr;
use thiserror::Error;

use crate::record::TableKind;

/// Errors reported by expansion, classification, configuration and stores.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// Two records in one table resolved to the same identity.
    #[error("duplicate {table} identity '{identity}'")]
    IdentityCollision { table: TableKind, identity: SmolStr },

    /// A UDT instance references a template that is not in the store.
    #[error("unknown template '{0}'")]
    UnknownTemplate(SmolStr),

    /// A template definition violates its own invariants.
    #[error("invalid template '{name}': {reason}")]
    InvalidTemplate { name: SmolStr, reason: SmolStr },

    /// A field name outside the closed schema of a table.
    #[error("unknown {table} field '{field}'")]
    UnknownField { table: TableKind, field: SmolStr },

    /// Invalid project configuration.
    #[error("invalid config: {0}")]
    InvalidConfig(SmolStr),

    /// Record or tag store failure reported by a persistence collaborator.
    #[error("store error: {0}")]
    Store(SmolStr),
}

impl SyncError {
    pub(crate) fn collision(table: TableKind, identity: impl Into<SmolStr>) -> Self {
        Self::IdentityCollision {
            table,
            identity: identity.into(),
        }
    }
}
