use serde::Deserialize;
use tradefeed_framework::{FetchError, Record};

/// Body of `/api/messages`. The backend answers `{ "error": ... }` with a
/// 200 when the query itself failed.
#[derive(Deserialize)]
struct MessagesEnvelope {
    #[serde(default)]
    messages: Option<Vec<Record>>,
    #[serde(default)]
    error: Option<String>,
}

/// Body of `/api/in-progress/{granularity}`.
#[derive(Deserialize)]
struct InProgressEnvelope {
    #[serde(default)]
    message: Option<Record>,
    #[serde(default)]
    error: Option<String>,
}

pub(crate) fn decode_messages(body: &str) -> Result<Vec<Record>, FetchError> {
    let envelope: MessagesEnvelope =
        serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))?;

    if let Some(error) = envelope.error {
        return Err(FetchError::Server(error));
    }
    envelope
        .messages
        .ok_or_else(|| FetchError::Decode("missing 'messages' field".to_string()))
}

pub(crate) fn decode_in_progress(body: &str) -> Result<Option<Record>, FetchError> {
    let envelope: InProgressEnvelope =
        serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))?;

    match envelope.error {
        Some(error) => Err(FetchError::Server(error)),
        None => Ok(envelope.message),
    }
}
