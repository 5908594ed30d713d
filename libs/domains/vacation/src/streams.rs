//! Stream definitions for the vacation bridge.

use messaging::nats::StreamConfig;

/// Job type the publisher registers for.
pub const JOB_TYPE: &str = "put";

/// Records published for `put` jobs, consumed by the completer.
pub struct VacationStream;

impl StreamConfig for VacationStream {
    const STREAM_NAME: &'static str = "VACATION";

    const SUBJECT: &'static str = "vacation";

    const CONSUMER_NAME: &'static str = "vacation-completer";

    /// Redeliver an unacked record after 60s; completion may retry for a while.
    const ACK_WAIT_SECS: u64 = 60;
}

#[cfg(test)]
mod tests {
    use super::*;
    use messaging::nats::{SubscriptionConfig, TopicConfig};

    #[test]
    fn test_vacation_stream_def() {
        let topic = TopicConfig::from_stream::<VacationStream>();
        assert_eq!(topic.stream_name, "VACATION");
        assert_eq!(topic.subject, "vacation");
        assert_eq!(topic.stream_name, TopicConfig::new("vacation").stream_name);

        let subscription = SubscriptionConfig::from_stream::<VacationStream>();
        assert_eq!(subscription.durable_name, "vacation-completer");
        assert_eq!(subscription.ack_wait.as_secs(), 60);
        assert_eq!(subscription.max_deliver, -1);
    }
}
