//! Wire shapes exchanged with a view endpoint.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Payload key carrying the session id.
pub const SESSION_ID_KEY: &str = "__ViewId";

/// Method polled to keep the session alive.
pub const HEARTBEAT_METHOD: &str = "BrowserHeartbeat";

/// Method returning the outcome of a deferred job.
pub const DEFERRED_RESPONSE_METHOD: &str = "GetDeferredResponse";

/// Payload key carrying the job id on a deferred-status request.
pub const JOB_ID_KEY: &str = "jobId";

/// Request payload: a flat key/value mapping.
pub type Payload = Map<String, Value>;

/// How a response should be handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// The result is not ready; poll the job.
    Deferred { job_id: String },
    /// The response is the result.
    Final,
}

/// Response body from a view endpoint.
///
/// Any JSON value is accepted. Responses that do not carry a well-formed
/// deferred-execution marker are final and passed through untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Response(pub Value);

impl Response {
    /// Wrap a JSON value.
    #[must_use]
    pub const fn new(value: Value) -> Self {
        Self(value)
    }

    /// Build a deferred-execution marker for `job_id`.
    #[must_use]
    pub fn deferred(job_id: impl Into<String>) -> Self {
        Self(serde_json::json!({
            "Response": {
                "DeferredExecution": true,
                "JobId": job_id.into(),
            }
        }))
    }

    /// Classify the response as deferred or final.
    ///
    /// Deferred requires `Response.DeferredExecution == true` and a
    /// non-empty string `Response.JobId`.
    #[must_use]
    pub fn classify(&self) -> Classification {
        let Some(marker) = self.0.get("Response") else {
            return Classification::Final;
        };

        let deferred = marker
            .get("DeferredExecution")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let job_id = marker
            .get("JobId")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty());

        match (deferred, job_id) {
            (true, Some(job_id)) => Classification::Deferred {
                job_id: job_id.to_string(),
            },
            _ => Classification::Final,
        }
    }

    /// Borrow the raw JSON.
    #[must_use]
    pub const fn as_value(&self) -> &Value {
        &self.0
    }

    /// Take the raw JSON.
    #[must_use]
    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for Response {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Payload for a deferred-status request.
#[must_use]
pub fn deferred_status_payload(job_id: &str) -> Payload {
    let mut payload = Payload::new();
    payload.insert(JOB_ID_KEY.to_string(), Value::String(job_id.to_string()));
    payload
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_classify_deferred_marker() {
        let response = Response::deferred("J1");
        assert_eq!(
            response.classify(),
            Classification::Deferred {
                job_id: "J1".to_string()
            }
        );
    }

    #[test]
    fn test_classify_plain_response_is_final() {
        let response = Response::new(json!({ "Response": { "Saved": true } }));
        assert_eq!(response.classify(), Classification::Final);

        let response = Response::new(json!([1, 2, 3]));
        assert_eq!(response.classify(), Classification::Final);

        assert_eq!(Response::default().classify(), Classification::Final);
    }

    #[test]
    fn test_classify_malformed_marker_is_final() {
        let missing_job = Response::new(json!({ "Response": { "DeferredExecution": true } }));
        assert_eq!(missing_job.classify(), Classification::Final);

        let empty_job = Response::new(json!({
            "Response": { "DeferredExecution": true, "JobId": "" }
        }));
        assert_eq!(empty_job.classify(), Classification::Final);

        let not_deferred = Response::new(json!({
            "Response": { "DeferredExecution": false, "JobId": "J1" }
        }));
        assert_eq!(not_deferred.classify(), Classification::Final);

        let wrong_types = Response::new(json!({
            "Response": { "DeferredExecution": "yes", "JobId": 7 }
        }));
        assert_eq!(wrong_types.classify(), Classification::Final);

        let scalar = Response::new(json!({ "Response": 12 }));
        assert_eq!(scalar.classify(), Classification::Final);
    }

    #[test]
    fn test_deferred_status_payload() {
        let payload = deferred_status_payload("J9");
        assert_eq!(payload.get(JOB_ID_KEY), Some(&json!("J9")));
        assert_eq!(payload.len(), 1);
    }
}
