use crate::auth::{AppRedirect, Redirect};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tracing::{event, Level};
use url::Url;
use warp::http::{header, HeaderValue, StatusCode};
use warp::reply::{Reply, Response};

fn append_params(mut url: Url, p: impl serde::Serialize) -> Result<Url, serde_urlencoded::ser::Error> {
    let new_qs = serde_urlencoded::to_string(p)?;
    let pairs = form_urlencoded::parse(new_qs.as_bytes());
    url.query_pairs_mut().extend_pairs(pairs);
    Ok(url)
}

fn found(location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => {
            let mut response = Response::new(warp::hyper::Body::empty());
            *response.status_mut() = StatusCode::FOUND;
            response.headers_mut().insert(header::LOCATION, value);
            response
        }
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

impl<T: serde::Serialize + Send> Reply for Redirect<T> {
    fn into_response(self) -> Response {
        match append_params(self.uri, self.params) {
            Ok(url) => found(url.as_str()),
            Err(e) => {
                event!(Level::ERROR, error = %e, "Failed to encode redirect parameters");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

impl AppRedirect {
    /// `{app}#tokens=<base64 json>` or `{app}?error=<code>`.
    pub fn location(&self) -> Result<String, serde_json::Error> {
        match self {
            Self::Tokens { app_path, tokens } => {
                let payload = serde_json::to_vec(tokens)?;
                Ok(format!("{}#tokens={}", app_path, STANDARD.encode(payload)))
            }
            Self::Error { app_path, error } => {
                let query: String = form_urlencoded::Serializer::new(String::new())
                    .append_pair("error", error.code())
                    .finish();
                Ok(format!("{}?{}", app_path, query))
            }
        }
    }
}

impl Reply for AppRedirect {
    fn into_response(self) -> Response {
        match self.location() {
            Ok(location) => found(&location),
            Err(e) => {
                event!(Level::ERROR, error = %e, "Failed to encode token payload");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}
