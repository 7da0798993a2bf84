mod error;
mod session;

pub use error::{
    ApiError, ApiFailure, GENERIC_FAILURE_MESSAGE, GENERIC_SUCCESS_MESSAGE, SubmitResponse,
    TRANSPORT_FALLBACK_MESSAGE,
};
pub use session::{Role, SessionContext, SessionSnapshot};
