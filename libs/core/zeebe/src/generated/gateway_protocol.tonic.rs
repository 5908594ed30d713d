// Hand-maintained client stubs for the RPCs declared in `gateway_protocol.rs`,
// in the shape tonic-build emits.
/// Gateway client.
pub mod gateway_client {
    #![allow(
        unused_variables,
        dead_code,
        missing_docs,
        clippy::wildcard_imports,
        clippy::let_unit_value,
    )]
    use tonic::codegen::*;
    use tonic::codegen::http::Uri;
    #[derive(Debug, Clone)]
    pub struct GatewayClient<T> {
        inner: tonic::client::Grpc<T>,
    }
    impl GatewayClient<tonic::transport::Channel> {
        /// Attempt to create a new client by connecting to a given endpoint.
        pub async fn connect<D>(dst: D) -> Result<Self, tonic::transport::Error>
        where
            D: TryInto<tonic::transport::Endpoint>,
            D::Error: Into<StdError>,
        {
            let conn = tonic::transport::Endpoint::new(dst)?.connect().await?;
            Ok(Self::new(conn))
        }
    }
    impl<T> GatewayClient<T>
    where
        T: tonic::client::GrpcService<tonic::body::Body>,
        T::Error: Into<StdError>,
        T::ResponseBody: Body<Data = Bytes> + std::marker::Send + 'static,
        <T::ResponseBody as Body>::Error: Into<StdError> + std::marker::Send,
    {
        pub fn new(inner: T) -> Self {
            let inner = tonic::client::Grpc::new(inner);
            Self { inner }
        }
        pub fn with_origin(inner: T, origin: Uri) -> Self {
            let inner = tonic::client::Grpc::with_origin(inner, origin);
            Self { inner }
        }
        /// Compress requests with the given encoding.
        ///
        /// This requires the server to support it otherwise it might respond with an
        /// error.
        #[must_use]
        pub fn send_compressed(mut self, encoding: CompressionEncoding) -> Self {
            self.inner = self.inner.send_compressed(encoding);
            self
        }
        /// Enable decompressing responses.
        #[must_use]
        pub fn accept_compressed(mut self, encoding: CompressionEncoding) -> Self {
            self.inner = self.inner.accept_compressed(encoding);
            self
        }
        /// Limits the maximum size of a decoded message.
        ///
        /// Default: `4MB`
        #[must_use]
        pub fn max_decoding_message_size(mut self, limit: usize) -> Self {
            self.inner = self.inner.max_decoding_message_size(limit);
            self
        }
        /// Iterates through all known partitions round-robin and activates up to the requested
        /// maximum and streams them back to the client as they are activated.
        pub async fn activate_jobs(
            &mut self,
            request: impl tonic::IntoRequest<super::ActivateJobsRequest>,
        ) -> std::result::Result<
            tonic::Response<tonic::codec::Streaming<super::ActivateJobsResponse>>,
            tonic::Status,
        > {
            self.inner
                .ready()
                .await
                .map_err(|e| {
                    tonic::Status::unknown(
                        format!("Service was not ready: {}", e.into()),
                    )
                })?;
            let codec = tonic_prost::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static(
                "/gateway_protocol.Gateway/ActivateJobs",
            );
            let mut req = request.into_request();
            req.extensions_mut()
                .insert(GrpcMethod::new("gateway_protocol.Gateway", "ActivateJobs"));
            self.inner.server_streaming(req, path, codec).await
        }
        /// Completes a job with the given variables, which allows completing the associated service task.
        pub async fn complete_job(
            &mut self,
            request: impl tonic::IntoRequest<super::CompleteJobRequest>,
        ) -> std::result::Result<
            tonic::Response<super::CompleteJobResponse>,
            tonic::Status,
        > {
            self.inner
                .ready()
                .await
                .map_err(|e| {
                    tonic::Status::unknown(
                        format!("Service was not ready: {}", e.into()),
                    )
                })?;
            let codec = tonic_prost::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static(
                "/gateway_protocol.Gateway/CompleteJob",
            );
            let mut req = request.into_request();
            req.extensions_mut()
                .insert(GrpcMethod::new("gateway_protocol.Gateway", "CompleteJob"));
            self.inner.unary(req, path, codec).await
        }
        /// Creates and starts an instance of the specified process.
        pub async fn create_process_instance(
            &mut self,
            request: impl tonic::IntoRequest<super::CreateProcessInstanceRequest>,
        ) -> std::result::Result<
            tonic::Response<super::CreateProcessInstanceResponse>,
            tonic::Status,
        > {
            self.inner
                .ready()
                .await
                .map_err(|e| {
                    tonic::Status::unknown(
                        format!("Service was not ready: {}", e.into()),
                    )
                })?;
            let codec = tonic_prost::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static(
                "/gateway_protocol.Gateway/CreateProcessInstance",
            );
            let mut req = request.into_request();
            req.extensions_mut()
                .insert(GrpcMethod::new("gateway_protocol.Gateway", "CreateProcessInstance"));
            self.inner.unary(req, path, codec).await
        }
        /// Deploys one or more resources (e.g. processes or decision models) to Zeebe.
        pub async fn deploy_resource(
            &mut self,
            request: impl tonic::IntoRequest<super::DeployResourceRequest>,
        ) -> std::result::Result<
            tonic::Response<super::DeployResourceResponse>,
            tonic::Status,
        > {
            self.inner
                .ready()
                .await
                .map_err(|e| {
                    tonic::Status::unknown(
                        format!("Service was not ready: {}", e.into()),
                    )
                })?;
            let codec = tonic_prost::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static(
                "/gateway_protocol.Gateway/DeployResource",
            );
            let mut req = request.into_request();
            req.extensions_mut()
                .insert(GrpcMethod::new("gateway_protocol.Gateway", "DeployResource"));
            self.inner.unary(req, path, codec).await
        }
        /// Marks the job as failed; if the retries argument is positive, then the job will be
        /// immediately activatable again, and a worker could try again to process it.
        pub async fn fail_job(
            &mut self,
            request: impl tonic::IntoRequest<super::FailJobRequest>,
        ) -> std::result::Result<
            tonic::Response<super::FailJobResponse>,
            tonic::Status,
        > {
            self.inner
                .ready()
                .await
                .map_err(|e| {
                    tonic::Status::unknown(
                        format!("Service was not ready: {}", e.into()),
                    )
                })?;
            let codec = tonic_prost::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static(
                "/gateway_protocol.Gateway/FailJob",
            );
            let mut req = request.into_request();
            req.extensions_mut()
                .insert(GrpcMethod::new("gateway_protocol.Gateway", "FailJob"));
            self.inner.unary(req, path, codec).await
        }
        /// Obtains the current topology of the cluster the gateway is part of.
        pub async fn topology(
            &mut self,
            request: impl tonic::IntoRequest<super::TopologyRequest>,
        ) -> std::result::Result<
            tonic::Response<super::TopologyResponse>,
            tonic::Status,
        > {
            self.inner
                .ready()
                .await
                .map_err(|e| {
                    tonic::Status::unknown(
                        format!("Service was not ready: {}", e.into()),
                    )
                })?;
            let codec = tonic_prost::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static(
                "/gateway_protocol.Gateway/Topology",
            );
            let mut req = request.into_request();
            req.extensions_mut()
                .insert(GrpcMethod::new("gateway_protocol.Gateway", "Topology"));
            self.inner.unary(req, path, codec).await
        }
    }
}
