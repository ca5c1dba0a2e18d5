use thiserror::Error;

use crate::catalog::{CatalogError, LookupError};
use crate::model::IdError;
use crate::progress::ProgressError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Id(#[from] IdError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
}
