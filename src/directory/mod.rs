//! User and hospital records. Neither takes part in the booking race; they only need
//! unique natural keys (phone number, registration number).

pub mod hospitals;
pub mod users;

use thiserror::Error;

use crate::error::AppError;

pub use hospitals::HospitalDirectory;
pub use users::UserDirectory;

#[derive(Debug, Error, PartialEq)]
pub enum DirectoryError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0} already exists")]
    AlreadyExists(&'static str),
}

impl From<DirectoryError> for AppError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::NotFound(_) => AppError::NotFound(err.to_string()),
            DirectoryError::AlreadyExists(_) => AppError::BadRequest(err.to_string()),
        }
    }
}
