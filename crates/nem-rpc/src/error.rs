use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum NodeApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Node(#[from] nem_node::NodeError),
    #[error(transparent)]
    Keystore(#[from] nem_keystore::KeystoreError),
}

#[derive(Serialize)]
struct ErrBody {
    error: String,
}

impl IntoResponse for NodeApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            NodeApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            NodeApiError::NotFound(_) => StatusCode::NOT_FOUND,
            NodeApiError::Node(nem_node::NodeError::State(state_err)) => match state_err {
                nem_state::StateError::Io(_) | nem_state::StateError::Json(_) | nem_state::StateError::Store(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
                _ => StatusCode::BAD_REQUEST,
            },
            NodeApiError::Node(nem_node::NodeError::Store(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            NodeApiError::Keystore(nem_keystore::KeystoreError::Io(_) | nem_keystore::KeystoreError::Json(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            NodeApiError::Keystore(_) => StatusCode::BAD_REQUEST,
        };

        tracing::warn!(error = %self, status = %status, "request rejected");
        (status, Json(ErrBody { error: self.to_string() })).into_response()
    }
}
