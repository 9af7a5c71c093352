//! Database entity definitions.
//!
//! Entities are direct mappings to database rows. Conversions into domain
//! models are fallible: a row the domain cannot represent surfaces as a
//! decode error instead of being coerced.

pub mod business_profile;
pub mod offer;
pub mod redemption;

use thiserror::Error;

/// A row holds a value the domain model has no representation for.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RowDecodeError {
    #[error("unknown discount type {0:?}")]
    UnknownDiscountType(String),

    #[error("invalid redeemer kind {kind:?} (subject present: {has_subject})")]
    InvalidRedeemer { kind: String, has_subject: bool },
}

impl From<RowDecodeError> for sqlx::Error {
    fn from(err: RowDecodeError) -> Self {
        sqlx::Error::Decode(Box::new(err))
    }
}

/// Converts a fetched entity, reporting an unrepresentable row as
/// [`sqlx::Error::Decode`].
pub(crate) fn decode<E, T>(entity: E) -> Result<T, sqlx::Error>
where
    T: TryFrom<E, Error = RowDecodeError>,
{
    T::try_from(entity).map_err(Into::into)
}
