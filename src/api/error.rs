use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::prelude::*;

pub type Result<T, E = ApiError> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ApiError {
    /// the database request failed
    Database {
        source: DatabaseError,
        #[snafu(implicit)]
        location: Location,
    },

    /// the upload form could not be read
    UploadForm {
        source: MultipartError,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("no video with id `{id}`"))]
    VideoNotFound {
        id: String,
        #[snafu(implicit)]
        location: Location,
    },
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::VideoNotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::UploadForm { .. } => StatusCode::BAD_REQUEST,
            ApiError::Database { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        (status, self.to_string()).into_response()
    }
}
