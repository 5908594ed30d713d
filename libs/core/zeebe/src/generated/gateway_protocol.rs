// Hand-maintained subset of the gateway's `gateway.proto`, kept in the shape
// prost-build emits. Only the messages and fields this client sends or reads
// are declared; prost skips unknown fields when decoding.
#[derive(Clone, Copy, PartialEq, Eq, Hash, ::prost::Message)]
pub struct TopologyRequest {}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TopologyResponse {
    #[prost(message, repeated, tag = "1")]
    pub brokers: ::prost::alloc::vec::Vec<BrokerInfo>,
    #[prost(int32, tag = "2")]
    pub cluster_size: i32,
    #[prost(int32, tag = "3")]
    pub partitions_count: i32,
    #[prost(int32, tag = "4")]
    pub replication_factor: i32,
    #[prost(string, tag = "5")]
    pub gateway_version: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BrokerInfo {
    #[prost(int32, tag = "1")]
    pub node_id: i32,
    #[prost(string, tag = "2")]
    pub host: ::prost::alloc::string::String,
    #[prost(int32, tag = "3")]
    pub port: i32,
    #[prost(message, repeated, tag = "4")]
    pub partitions: ::prost::alloc::vec::Vec<Partition>,
    #[prost(string, tag = "5")]
    pub version: ::prost::alloc::string::String,
}
#[derive(Clone, Copy, PartialEq, Eq, Hash, ::prost::Message)]
pub struct Partition {
    #[prost(int32, tag = "1")]
    pub partition_id: i32,
    #[prost(enumeration = "partition::PartitionBrokerRole", tag = "2")]
    pub role: i32,
    #[prost(enumeration = "partition::PartitionBrokerHealth", tag = "3")]
    pub health: i32,
}
/// Nested message and enum types in `Partition`.
pub mod partition {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum PartitionBrokerRole {
        Leader = 0,
        Follower = 1,
        Inactive = 2,
    }
    impl PartitionBrokerRole {
        /// String value of the enum field names used in the ProtoBuf definition.
        pub fn as_str_name(&self) -> &'static str {
            match self {
                Self::Leader => "LEADER",
                Self::Follower => "FOLLOWER",
                Self::Inactive => "INACTIVE",
            }
        }
        /// Creates an enum from field names used in the ProtoBuf definition.
        pub fn from_str_name(value: &str) -> ::core::option::Option<Self> {
            match value {
                "LEADER" => Some(Self::Leader),
                "FOLLOWER" => Some(Self::Follower),
                "INACTIVE" => Some(Self::Inactive),
                _ => None,
            }
        }
    }
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum PartitionBrokerHealth {
        Healthy = 0,
        Unhealthy = 1,
        Dead = 2,
    }
    impl PartitionBrokerHealth {
        /// String value of the enum field names used in the ProtoBuf definition.
        pub fn as_str_name(&self) -> &'static str {
            match self {
                Self::Healthy => "HEALTHY",
                Self::Unhealthy => "UNHEALTHY",
                Self::Dead => "DEAD",
            }
        }
        /// Creates an enum from field names used in the ProtoBuf definition.
        pub fn from_str_name(value: &str) -> ::core::option::Option<Self> {
            match value {
                "HEALTHY" => Some(Self::Healthy),
                "UNHEALTHY" => Some(Self::Unhealthy),
                "DEAD" => Some(Self::Dead),
                _ => None,
            }
        }
    }
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeployResourceRequest {
    #[prost(message, repeated, tag = "1")]
    pub resources: ::prost::alloc::vec::Vec<Resource>,
    #[prost(string, tag = "2")]
    pub tenant_id: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message)]
pub struct Resource {
    #[prost(string, tag = "1")]
    pub name: ::prost::alloc::string::String,
    #[prost(bytes = "vec", tag = "2")]
    pub content: ::prost::alloc::vec::Vec<u8>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeployResourceResponse {
    #[prost(int64, tag = "1")]
    pub key: i64,
    #[prost(message, repeated, tag = "2")]
    pub deployments: ::prost::alloc::vec::Vec<Deployment>,
    #[prost(string, tag = "3")]
    pub tenant_id: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Deployment {
    #[prost(oneof = "deployment::Metadata", tags = "1")]
    pub metadata: ::core::option::Option<deployment::Metadata>,
}
/// Nested message and enum types in `Deployment`.
pub mod deployment {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Metadata {
        #[prost(message, tag = "1")]
        Process(super::ProcessMetadata),
    }
}
#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message)]
pub struct ProcessMetadata {
    #[prost(string, tag = "1")]
    pub bpmn_process_id: ::prost::alloc::string::String,
    #[prost(int32, tag = "2")]
    pub version: i32,
    #[prost(int64, tag = "3")]
    pub process_definition_key: i64,
    #[prost(string, tag = "4")]
    pub resource_name: ::prost::alloc::string::String,
    #[prost(string, tag = "5")]
    pub tenant_id: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message)]
pub struct CreateProcessInstanceRequest {
    #[prost(int64, tag = "1")]
    pub process_definition_key: i64,
    #[prost(string, tag = "2")]
    pub bpmn_process_id: ::prost::alloc::string::String,
    #[prost(int32, tag = "3")]
    pub version: i32,
    #[prost(string, tag = "4")]
    pub variables: ::prost::alloc::string::String,
    #[prost(string, tag = "6")]
    pub tenant_id: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message)]
pub struct CreateProcessInstanceResponse {
    #[prost(int64, tag = "1")]
    pub process_definition_key: i64,
    #[prost(string, tag = "2")]
    pub bpmn_process_id: ::prost::alloc::string::String,
    #[prost(int32, tag = "3")]
    pub version: i32,
    #[prost(int64, tag = "4")]
    pub process_instance_key: i64,
    #[prost(string, tag = "5")]
    pub tenant_id: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message)]
pub struct ActivateJobsRequest {
    #[prost(string, tag = "1")]
    pub r#type: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub worker: ::prost::alloc::string::String,
    #[prost(int64, tag = "3")]
    pub timeout: i64,
    #[prost(int32, tag = "4")]
    pub max_jobs_to_activate: i32,
    #[prost(string, repeated, tag = "5")]
    pub fetch_variable: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
    #[prost(int64, tag = "6")]
    pub request_timeout: i64,
    #[prost(string, repeated, tag = "7")]
    pub tenant_ids: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ActivateJobsResponse {
    #[prost(message, repeated, tag = "1")]
    pub jobs: ::prost::alloc::vec::Vec<ActivatedJob>,
}
#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message)]
pub struct ActivatedJob {
    #[prost(int64, tag = "1")]
    pub key: i64,
    #[prost(string, tag = "2")]
    pub r#type: ::prost::alloc::string::String,
    #[prost(int64, tag = "3")]
    pub process_instance_key: i64,
    #[prost(string, tag = "4")]
    pub bpmn_process_id: ::prost::alloc::string::String,
    #[prost(int32, tag = "5")]
    pub process_definition_version: i32,
    #[prost(int64, tag = "6")]
    pub process_definition_key: i64,
    #[prost(string, tag = "7")]
    pub element_id: ::prost::alloc::string::String,
    #[prost(int64, tag = "8")]
    pub element_instance_key: i64,
    #[prost(string, tag = "9")]
    pub custom_headers: ::prost::alloc::string::String,
    #[prost(string, tag = "10")]
    pub worker: ::prost::alloc::string::String,
    #[prost(int32, tag = "11")]
    pub retries: i32,
    #[prost(int64, tag = "12")]
    pub deadline: i64,
    #[prost(string, tag = "13")]
    pub variables: ::prost::alloc::string::String,
    #[prost(string, tag = "14")]
    pub tenant_id: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message)]
pub struct CompleteJobRequest {
    #[prost(int64, tag = "1")]
    pub job_key: i64,
    #[prost(string, tag = "2")]
    pub variables: ::prost::alloc::string::String,
}
#[derive(Clone, Copy, PartialEq, Eq, Hash, ::prost::Message)]
pub struct CompleteJobResponse {}
#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message)]
pub struct FailJobRequest {
    #[prost(int64, tag = "1")]
    pub job_key: i64,
    #[prost(int32, tag = "2")]
    pub retries: i32,
    #[prost(string, tag = "3")]
    pub error_message: ::prost::alloc::string::String,
    #[prost(int64, tag = "4")]
    pub retry_back_off: i64,
    #[prost(string, tag = "5")]
    pub variables: ::prost::alloc::string::String,
}
#[derive(Clone, Copy, PartialEq, Eq, Hash, ::prost::Message)]
pub struct FailJobResponse {}
