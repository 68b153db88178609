//! Conversions from external infrastructure errors into domain errors.

use reqwest::{Error as HttpError, StatusCode};
use storectl_domain::ApiError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub ApiError);

impl From<InfraError> for ApiError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<ApiError> for InfraError {
    fn from(value: ApiError) -> Self {
        InfraError(value)
    }
}

trait IntoApiError {
    fn into_api_error(self) -> ApiError;
}

/* -------------------------------------------------------------------------- */
/* HTTP status → ApiError */
/* -------------------------------------------------------------------------- */

/// Classify a non-success response
///
/// `body` becomes the error message; an empty body falls back to the
/// canonical reason phrase.
pub fn error_from_status(status: StatusCode, body: &str) -> ApiError {
    let message = if body.trim().is_empty() {
        let reason = status.canonical_reason().unwrap_or("unknown status");
        format!("HTTP {} {reason}", status.as_u16())
    } else {
        body.trim().to_string()
    };

    match status.as_u16() {
        400 => ApiError::BadRequest(message),
        401 => ApiError::AuthenticationRequired(message),
        402 => ApiError::LicenceCapacityExceeded(message),
        403 => ApiError::Unauthorised(message),
        404 => ApiError::NotFound(message),
        409 => ApiError::Conflict(message),
        412 => ApiError::StaleWrite(message),
        422 => ApiError::InvalidStateTransition(message),
        503 => ApiError::StoreError(message),
        500..=599 => ApiError::ServerError(message),
        _ => ApiError::Unknown(message),
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → ApiError */
/* -------------------------------------------------------------------------- */

impl IntoApiError for HttpError {
    fn into_api_error(self) -> ApiError {
        if self.is_decode() {
            return ApiError::Decode(self.to_string());
        }

        if self.is_builder() {
            return ApiError::Config(format!("invalid HTTP request: {self}"));
        }

        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            return ApiError::Network(format!("HTTP connection failure: {self}"));
        }

        if let Some(status) = self.status() {
            return error_from_status(status, "");
        }

        ApiError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_api_error())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use reqwest::Client;
    use storectl_domain::ErrorKind;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[test]
    fn test_status_table_maps_to_error_kinds() {
        let table = [
            (400, ErrorKind::BadRequest),
            (401, ErrorKind::AuthenticationRequired),
            (402, ErrorKind::LicenceCapacityExceeded),
            (403, ErrorKind::Unauthorised),
            (404, ErrorKind::NotFound),
            (409, ErrorKind::Conflict),
            (412, ErrorKind::StaleWrite),
            (422, ErrorKind::InvalidStateTransition),
            (500, ErrorKind::ServerError),
            (502, ErrorKind::ServerError),
            (503, ErrorKind::StoreError),
            (418, ErrorKind::Unknown),
            (302, ErrorKind::Unknown),
        ];

        for (code, kind) in table {
            let status = StatusCode::from_u16(code).unwrap();
            assert_eq!(error_from_status(status, "body").kind(), kind, "status {code}");
        }
    }

    #[test]
    fn test_body_text_becomes_the_message() {
        let err = error_from_status(StatusCode::CONFLICT, "  volume name in use\n");
        assert_eq!(err, ApiError::Conflict("volume name in use".into()));
    }

    #[test]
    fn test_empty_body_falls_back_to_reason_phrase() {
        let err = error_from_status(StatusCode::NOT_FOUND, "");
        assert_eq!(err, ApiError::NotFound("HTTP 404 Not Found".into()));
    }

    #[tokio::test]
    async fn test_error_for_status_401_maps_to_authentication_required() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(StatusCode::UNAUTHORIZED))
            .mount(&server)
            .await;

        let client = Client::builder().no_proxy().build().unwrap();
        let error = client.get(server.uri()).send().await.unwrap().error_for_status().unwrap_err();

        let mapped: ApiError = InfraError::from(error).into();
        assert!(mapped.is_authentication_required());
    }

    #[tokio::test]
    async fn test_connection_refused_maps_to_network() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = Client::builder().no_proxy().build().unwrap();
        let error = client.get(format!("http://{addr}")).send().await.unwrap_err();

        let mapped: ApiError = InfraError::from(error).into();
        assert!(matches!(mapped, ApiError::Network(_)), "got {mapped:?}");
        assert_eq!(mapped.kind(), ErrorKind::Unknown);
    }

    #[tokio::test]
    async fn test_malformed_json_maps_to_decode() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = Client::builder().no_proxy().build().unwrap();
        let error = client
            .get(server.uri())
            .send()
            .await
            .unwrap()
            .json::<serde_json::Value>()
            .await
            .unwrap_err();

        let mapped: ApiError = InfraError::from(error).into();
        assert!(matches!(mapped, ApiError::Decode(_)), "got {mapped:?}");
    }
}
