use axum::async_trait;
use axum::extract::{rejection::JsonRejection, FromRequest, Request};
use axum::Json;
use serde::de::DeserializeOwned;
use service_core::error::AppError;

/// JSON body extractor that reports every decoding failure as a 400.
///
/// Plain `Json` answers 415/422 for some of these; clients of this service get
/// one status for "your body is wrong".
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => {
                let message = match &rejection {
                    JsonRejection::JsonSyntaxError(err) => {
                        format!("Malformed JSON: {}", err.body_text())
                    }
                    JsonRejection::JsonDataError(err) => {
                        format!("Invalid JSON data: {}", err.body_text())
                    }
                    JsonRejection::MissingJsonContentType(_) => {
                        "Missing or invalid Content-Type header, expected 'application/json'"
                            .to_string()
                    }
                    JsonRejection::BytesRejection(_) => "Failed to read request body".to_string(),
                    _ => "Invalid JSON request".to_string(),
                };

                tracing::warn!(error = %rejection, "Rejected request body");
                Err(AppError::BadRequest(anyhow::anyhow!(message)))
            }
        }
    }
}
