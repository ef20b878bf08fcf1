//! Identifier newtype shared by every collection.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::error::DomainError;

/// Opaque, store-generated document identifier.
///
/// Values come back from store operations; operator-typed input must go
/// through [`EntityId::parse`], which rejects malformed identifiers before
/// any store round-trip is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(Uuid);

impl EntityId {
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(input: &str) -> Result<Self, DomainError> {
        Uuid::from_str(input.trim())
            .map(Self)
            .map_err(|_| DomainError::malformed_id(input))
    }
}

impl Display for EntityId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for EntityId {
    type Err = DomainError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        Self::parse(input)
    }
}
