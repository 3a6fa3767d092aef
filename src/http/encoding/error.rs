use crate::auth::ErrorResponse;
use crate::provider::Error;

use tracing::{event, Level};
use warp::http::StatusCode;
use warp::{Rejection, Reply};

#[derive(Debug)]
pub struct ApiRejection(pub Error);

impl warp::reject::Reject for ApiRejection {}

impl From<Error> for ApiRejection {
    fn from(error: Error) -> Self {
        Self(error)
    }
}

impl ApiRejection {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            Error::MissingParameter(_) => StatusCode::BAD_REQUEST,
            Error::Unauthorized | Error::TokenExpired => StatusCode::UNAUTHORIZED,
            Error::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Error::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            Error::MissingConfig | Error::Url(_) | Error::Http(_) | Error::Json(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn body(&self) -> ErrorResponse {
        match &self.0 {
            Error::RateLimited { retry_after } => ErrorResponse::rate_limited(*retry_after),
            Error::Upstream { context, .. } => ErrorResponse::new(*context),
            e if e.is_internal() => ErrorResponse::new("Internal server error"),
            e => ErrorResponse::new(e.to_string()),
        }
    }
}

pub async fn handle_reject(err: Rejection) -> Result<impl Reply, Rejection> {
    match err.find::<ApiRejection>() {
        Some(e) => {
            if e.0.is_internal() {
                event!(Level::ERROR, error = %e.0, "Request failed");
            }
            let resp = warp::reply::json(&e.body());
            Ok(warp::reply::with_status(resp, e.status()).into_response())
        }
        None => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_errors_to_statuses_and_bodies() {
        let r = ApiRejection(Error::MissingParameter("refresh_token"));
        assert_eq!(r.status(), StatusCode::BAD_REQUEST);
        assert_eq!(r.body().error, "Missing refresh_token");

        let r = ApiRejection(Error::MissingConfig);
        assert_eq!(r.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(r.body().error, "Missing Spotify configuration");

        let r = ApiRejection(Error::RateLimited { retry_after: 45 });
        assert_eq!(r.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(r.body(), ErrorResponse::rate_limited(45));

        let r = ApiRejection(Error::Upstream {
            status: 503,
            context: "Failed to refresh token",
        });
        assert_eq!(r.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(r.body().error, "Failed to refresh token");

        let json_err = serde_json::from_str::<u8>("x").unwrap_err();
        let r = ApiRejection(Error::Json(json_err));
        assert_eq!(r.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(r.body().error, "Internal server error");
    }
}
