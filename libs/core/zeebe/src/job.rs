//! Domain views of gateway responses.

use crate::generated::gateway_protocol as proto;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use std::fmt;

/// A job leased to this worker. Complete it, fail it, or let the lease expire.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActivatedJob {
    /// Unique identifier for the job
    pub key: i64,
    /// Job type (matches what was requested)
    pub job_type: String,
    pub process_instance_key: i64,
    pub bpmn_process_id: String,
    pub element_id: String,
    /// Custom headers defined during modelling, as a JSON document
    pub custom_headers: String,
    /// Name of the worker which activated this job
    pub worker: String,
    /// Retries left (positive while the job is activatable)
    pub retries: i32,
    /// When the lease runs out, in epoch milliseconds
    pub deadline: i64,
    /// Variables visible to the task scope, as a JSON document
    pub variables: String,
}

impl ActivatedJob {
    /// Deserialize the variables document.
    pub fn variables_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.variables)
    }

    /// Deserialize the custom headers document.
    pub fn custom_headers_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.custom_headers)
    }

    pub fn deadline_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.deadline)
    }
}

impl From<proto::ActivatedJob> for ActivatedJob {
    fn from(job: proto::ActivatedJob) -> Self {
        ActivatedJob {
            key: job.key,
            job_type: job.r#type,
            process_instance_key: job.process_instance_key,
            bpmn_process_id: job.bpmn_process_id,
            element_id: job.element_id,
            custom_headers: job.custom_headers,
            worker: job.worker,
            retries: job.retries,
            deadline: job.deadline,
            variables: job.variables,
        }
    }
}

/// Cluster layout as reported by the gateway.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Topology {
    pub cluster_size: i32,
    pub partitions_count: i32,
    pub replication_factor: i32,
    pub gateway_version: String,
    pub brokers: Vec<BrokerNode>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BrokerNode {
    pub node_id: i32,
    pub address: String,
    pub version: String,
    pub partitions: Vec<PartitionRole>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartitionRole {
    pub partition_id: i32,
    pub role: &'static str,
    pub health: &'static str,
}

impl From<proto::TopologyResponse> for Topology {
    fn from(response: proto::TopologyResponse) -> Self {
        let brokers = response
            .brokers
            .into_iter()
            .map(|broker| BrokerNode {
                node_id: broker.node_id,
                address: format!("{}:{}", broker.host, broker.port),
                version: broker.version,
                partitions: broker
                    .partitions
                    .iter()
                    .map(|partition| PartitionRole {
                        partition_id: partition.partition_id,
                        role: partition.role().as_str_name(),
                        health: partition.health().as_str_name(),
                    })
                    .collect(),
            })
            .collect();

        Topology {
            cluster_size: response.cluster_size,
            partitions_count: response.partitions_count,
            replication_factor: response.replication_factor,
            gateway_version: response.gateway_version,
            brokers,
        }
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "gateway {} | {} broker(s), {} partition(s), replication factor {}",
            self.gateway_version, self.cluster_size, self.partitions_count, self.replication_factor
        )?;
        for broker in &self.brokers {
            write!(f, "\n  broker {} at {} ({})", broker.node_id, broker.address, broker.version)?;
            for partition in &broker.partitions {
                write!(
                    f,
                    "\n    partition {}: {} {}",
                    partition.partition_id, partition.role, partition.health
                )?;
            }
        }
        Ok(())
    }
}

/// A process definition created by a deployment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeployedProcess {
    pub bpmn_process_id: String,
    pub version: i32,
    pub process_definition_key: i64,
    pub resource_name: String,
}

/// Result of a deployment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Deployment {
    pub key: i64,
    pub processes: Vec<DeployedProcess>,
}

impl From<proto::DeployResourceResponse> for Deployment {
    fn from(response: proto::DeployResourceResponse) -> Self {
        let processes = response
            .deployments
            .into_iter()
            .filter_map(|deployment| match deployment.metadata {
                Some(proto::deployment::Metadata::Process(process)) => Some(DeployedProcess {
                    bpmn_process_id: process.bpmn_process_id,
                    version: process.version,
                    process_definition_key: process.process_definition_key,
                    resource_name: process.resource_name,
                }),
                None => None,
            })
            .collect();

        Deployment {
            key: response.key,
            processes,
        }
    }
}

/// A started process instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessInstance {
    pub process_instance_key: i64,
    pub process_definition_key: i64,
    pub bpmn_process_id: String,
    pub version: i32,
}

impl From<proto::CreateProcessInstanceResponse> for ProcessInstance {
    fn from(response: proto::CreateProcessInstanceResponse) -> Self {
        ProcessInstance {
            process_instance_key: response.process_instance_key,
            process_definition_key: response.process_definition_key,
            bpmn_process_id: response.bpmn_process_id,
            version: response.version,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    fn proto_job() -> proto::ActivatedJob {
        proto::ActivatedJob {
            key: 42,
            r#type: "put".into(),
            custom_headers: r#"{"messageType":"alert"}"#.into(),
            variables: r#"{"key":"k1","value":"v1"}"#.into(),
            retries: 3,
            deadline: 1_700_000_000_000,
            ..Default::default()
        }
    }

    #[test]
    fn test_activated_job_from_proto() {
        let job = ActivatedJob::from(proto_job());
        assert_eq!(job.key, 42);
        assert_eq!(job.job_type, "put");
        assert_eq!(job.retries, 3);
        assert_eq!(
            job.deadline_at().map(|at| at.timestamp()),
            Some(1_700_000_000)
        );
    }

    #[test]
    fn test_newer_gateway_fields_are_skipped() {
        use prost::Message;

        let mut bytes = proto_job().encode_to_vec();
        // field 15 (varint) and field 16 (bytes), unknown to this subset
        bytes.extend_from_slice(&[0x78, 0x02]);
        bytes.extend_from_slice(&[0x82, 0x01, 0x02, b'o', b'k']);

        let decoded = proto::ActivatedJob::decode(bytes.as_slice()).unwrap();
        assert_eq!(decoded, proto_job());
    }

    #[test]
    fn test_documents_deserialize() {
        #[derive(Deserialize)]
        struct Headers {
            #[serde(rename = "messageType")]
            message_type: String,
        }

        let job = ActivatedJob::from(proto_job());
        let headers: Headers = job.custom_headers_as().unwrap();
        assert_eq!(headers.message_type, "alert");

        let variables: serde_json::Value = job.variables_as().unwrap();
        assert_eq!(variables["key"], "k1");
    }

    #[test]
    fn test_topology_conversion() {
        let response = proto::TopologyResponse {
            brokers: vec![proto::BrokerInfo {
                node_id: 0,
                host: "zeebe-0".into(),
                port: 26501,
                partitions: vec![proto::Partition {
                    partition_id: 1,
                    role: proto::partition::PartitionBrokerRole::Leader as i32,
                    health: proto::partition::PartitionBrokerHealth::Healthy as i32,
                }],
                version: "8.5.0".into(),
            }],
            cluster_size: 1,
            partitions_count: 1,
            replication_factor: 1,
            gateway_version: "8.5.0".into(),
        };

        let topology = Topology::from(response);
        assert_eq!(topology.brokers[0].address, "zeebe-0:26501");
        assert_eq!(topology.brokers[0].partitions[0].role, "LEADER");

        let rendered = topology.to_string();
        assert!(rendered.contains("partition 1: LEADER HEALTHY"));
    }

    #[test]
    fn test_deployment_keeps_processes_only() {
        let response = proto::DeployResourceResponse {
            key: 7,
            deployments: vec![
                proto::Deployment {
                    metadata: Some(proto::deployment::Metadata::Process(proto::ProcessMetadata {
                        bpmn_process_id: "vacation8".into(),
                        version: 2,
                        process_definition_key: 99,
                        resource_name: "vacation8.bpmn".into(),
                        tenant_id: String::new(),
                    })),
                },
                proto::Deployment { metadata: None },
            ],
            tenant_id: String::new(),
        };

        let deployment = Deployment::from(response);
        assert_eq!(deployment.key, 7);
        assert_eq!(deployment.processes.len(), 1);
        assert_eq!(deployment.processes[0].bpmn_process_id, "vacation8");
    }
}
