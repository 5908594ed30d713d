//! Job payloads and the records built from them.

use crate::correlation::CorrelationKey;
use crate::error::{BridgeError, BridgeResult};
use messaging::OutboundRecord;
use serde::{Deserialize, Serialize};
use zeebe_client::ActivatedJob;

/// Variables a `put` job must carry. Only their shape is checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobVariables {
    pub key: String,
    pub value: serde_json::Value,
}

/// Custom headers a `put` job must carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobHeaders {
    #[serde(rename = "messageType")]
    pub message_type: String,
}

/// The record published for one job: keyed by message type, valued by the
/// job's correlation key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub key: String,
    pub value: CorrelationKey,
}

impl OutboundMessage {
    /// Validate a job's payload and build its message.
    pub fn for_job(job: &ActivatedJob) -> BridgeResult<(Self, JobVariables)> {
        let variables: JobVariables = job.variables_as().map_err(BridgeError::Variables)?;
        let headers: JobHeaders = job.custom_headers_as().map_err(BridgeError::Headers)?;
        let value = CorrelationKey::new(job.key)?;

        Ok((
            Self {
                key: headers.message_type,
                value,
            },
            variables,
        ))
    }
}

impl From<OutboundMessage> for OutboundRecord {
    fn from(message: OutboundMessage) -> Self {
        OutboundRecord::new(message.key, message.value.encode())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(key: i64, variables: &str, headers: &str) -> ActivatedJob {
        ActivatedJob {
            key,
            job_type: "put".into(),
            process_instance_key: 1,
            bpmn_process_id: "vacation8".into(),
            element_id: "put".into(),
            custom_headers: headers.into(),
            worker: "test".into(),
            retries: 3,
            deadline: 0,
            variables: variables.into(),
        }
    }

    #[test]
    fn test_message_for_valid_job() {
        let (message, variables) = OutboundMessage::for_job(&job(
            42,
            r#"{"key":"k1","value":"v1"}"#,
            r#"{"messageType":"alert"}"#,
        ))
        .unwrap();

        assert_eq!(message.key, "alert");
        assert_eq!(message.value.job_key(), 42);
        assert_eq!(variables.key, "k1");
        assert_eq!(variables.value, serde_json::json!("v1"));

        let record = OutboundRecord::from(message);
        assert_eq!(record, OutboundRecord::new("alert", "42"));
    }

    #[test]
    fn test_value_may_be_any_json() {
        let (_, variables) = OutboundMessage::for_job(&job(
            1,
            r#"{"key":"k","value":{"days":3},"extra":true}"#,
            r#"{"messageType":"leave"}"#,
        ))
        .unwrap();
        assert_eq!(variables.value["days"], 3);
    }

    #[test]
    fn test_missing_variable_rejected() {
        let err = OutboundMessage::for_job(&job(1, r#"{"key":"k"}"#, r#"{"messageType":"a"}"#))
            .unwrap_err();
        assert!(matches!(err, BridgeError::Variables(_)));
    }

    #[test]
    fn test_missing_message_type_rejected() {
        let err = OutboundMessage::for_job(&job(1, r#"{"key":"k","value":1}"#, "{}")).unwrap_err();
        assert!(matches!(err, BridgeError::Headers(_)));
    }

    #[test]
    fn test_message_type_kept_verbatim() {
        let (message, _) = OutboundMessage::for_job(&job(
            5,
            r#"{"key":"k","value":null}"#,
            r#"{"messageType":"  Mixed Case.type "}"#,
        ))
        .unwrap();
        assert_eq!(message.key, "  Mixed Case.type ");
    }
}
