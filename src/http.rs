//! Small helpers shared by the blocking HTTP clients.

use std::time::Duration;

use serde_json::Value;

/// Build an agent that fails any request taking longer than `timeout` and
/// hands non-2xx responses back with their body instead of as an error
pub(crate) fn agent(timeout: Duration) -> ureq::Agent {
    ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .into()
}

#[derive(Debug)]
pub(crate) struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub(crate) fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub(crate) fn post_json(
    agent: &ureq::Agent,
    url: &str,
    headers: &[(&str, &str)],
    body: &str,
) -> Result<HttpResponse, ureq::Error> {
    let mut request = agent.post(url).header("Content-Type", "application/json");
    for (name, value) in headers {
        request = request.header(*name, *value);
    }

    let mut response = request.send(body)?;
    let status = response.status().as_u16();
    let body = response.body_mut().read_to_string()?;
    Ok(HttpResponse { status, body })
}

pub(crate) fn get(agent: &ureq::Agent, url: &str) -> Result<HttpResponse, ureq::Error> {
    let mut response = agent.get(url).call()?;
    let status = response.status().as_u16();
    let body = response.body_mut().read_to_string()?;
    Ok(HttpResponse { status, body })
}

/// Pull the human-readable message out of an error body.
///
/// Handles `{"error": {"message": ".."}}` (Google, OpenAI-compatible APIs) and
/// `{"error": ".."}` (Ollama); anything else is returned as-is.
pub(crate) fn service_message(body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return "empty response body".to_string();
    }

    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| match &json["error"] {
            Value::String(message) => Some(message.clone()),
            Value::Object(error) => error
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => None,
        })
        .unwrap_or_else(|| body.to_string())
}
