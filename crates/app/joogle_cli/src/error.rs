use joogle_core::api::ApiError;
use joogle_core::auth::AuthError;
use joogle_core::config::ConfigError;
use joogle_core::domain::{ClaimError, StoreError};
use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{}", .0)]
    Custom(String),

    #[error("IO::{:?}: {}", .0, .0)]
    Io(#[from] std::io::Error),

    #[error("FlexiLogger::{:?}: {}", .0, .0)]
    FlexiLogger(#[from] flexi_logger::FlexiLoggerError),

    #[error("config: {}", .0)]
    Config(#[from] ConfigError),

    #[error("auth: {}", .0)]
    Auth(#[from] AuthError),

    #[error("api: {}", .0)]
    Api(#[from] ApiError),

    #[error("claim: {}", .0)]
    Claim(#[from] ClaimError),

    #[error("domains: {}", .0)]
    Store(#[from] StoreError),
}
