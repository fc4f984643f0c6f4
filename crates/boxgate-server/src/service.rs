//! Lifecycle dispatch
//!
//! Maps each authenticated call onto exactly one container runtime
//! invocation and translates the outcome back into an RPC result. The
//! gateway holds no container state of its own: every handle is
//! reconstructed from the raw id and every reported state comes from the
//! runtime, so there is nothing to go stale and nothing to roll back.

use crate::proto::containers_server::Containers;
use crate::proto::{
    self, CloseRequest, CloseResponse, CreateRequest, CreateResponse, InfoRequest, InfoResponse,
    RunRequest, RunResponse, StartRequest, StartResponse, StopRequest, StopResponse,
    SuspendRequest, SuspendResponse,
};
use boxgate_provider::{
    ContainerHandle, ContainerId, ContainerRuntime, ContainerSpec, ContainerState, Resources,
    RuntimeError,
};
use std::sync::Arc;
use tonic::{Request, Response, Status};

/// The gateway's service implementation
///
/// Constructed once at startup with the injected runtime and immutable
/// afterwards; handlers take `&self` and are safe under arbitrary
/// concurrency, including calls addressing the same container id. The
/// runtime arbitrates conflicting transitions; the gateway does not
/// serialize per id.
pub struct ContainerGateway {
    runtime: Arc<dyn ContainerRuntime>,
}

impl ContainerGateway {
    pub fn new(runtime: Arc<dyn ContainerRuntime>) -> Self {
        Self { runtime }
    }
}

#[tonic::async_trait]
impl Containers for ContainerGateway {
    async fn create(
        &self,
        request: Request<CreateRequest>,
    ) -> Result<Response<CreateResponse>, Status> {
        let spec = spec_from_request(request.into_inner());
        if spec.image.is_empty() {
            return Err(Status::invalid_argument("image must not be empty"));
        }

        let id = self
            .runtime
            .create(&spec)
            .await
            .map_err(status_from_runtime)?;

        tracing::info!(id = %id, image = %spec.image, "container created");

        Ok(Response::new(CreateResponse {
            message: format!("Container created with id {}", id),
            container: Some(proto::Container {
                id: id.to_string(),
                state: proto_state(ContainerState::Created) as i32,
                image: spec.image,
                container_type: self.runtime.info().runtime_type,
            }),
        }))
    }

    async fn start(
        &self,
        request: Request<StartRequest>,
    ) -> Result<Response<StartResponse>, Status> {
        let id = require_id(&request.into_inner().id)?;
        self.runtime
            .start(&id)
            .await
            .map_err(status_from_runtime)?;

        tracing::info!(id = %id, "container started");
        Ok(Response::new(StartResponse {
            message: format!("Container started with id {}", id),
        }))
    }

    async fn suspend(
        &self,
        request: Request<SuspendRequest>,
    ) -> Result<Response<SuspendResponse>, Status> {
        let id = require_id(&request.into_inner().id)?;
        self.runtime
            .suspend(&id)
            .await
            .map_err(status_from_runtime)?;

        tracing::info!(id = %id, "container suspended");
        Ok(Response::new(SuspendResponse {
            message: format!("Container suspended with id {}", id),
        }))
    }

    async fn stop(&self, request: Request<StopRequest>) -> Result<Response<StopResponse>, Status> {
        let id = require_id(&request.into_inner().id)?;
        self.runtime.stop(&id).await.map_err(status_from_runtime)?;

        tracing::info!(id = %id, "container stopped");
        Ok(Response::new(StopResponse {
            message: format!("Container stopped with id {}", id),
        }))
    }

    async fn close(
        &self,
        request: Request<CloseRequest>,
    ) -> Result<Response<CloseResponse>, Status> {
        let id = require_id(&request.into_inner().id)?;
        self.runtime.close(&id).await.map_err(status_from_runtime)?;

        tracing::info!(id = %id, "container closed");
        Ok(Response::new(CloseResponse {
            message: format!("Container closed with id {}", id),
        }))
    }

    async fn info(&self, request: Request<InfoRequest>) -> Result<Response<InfoResponse>, Status> {
        let id = require_id(&request.into_inner().id)?;
        let handle = self
            .runtime
            .inspect(&id)
            .await
            .map_err(status_from_runtime)?;

        Ok(Response::new(InfoResponse {
            container: Some(proto_container(&handle)),
        }))
    }

    async fn run(&self, _request: Request<RunRequest>) -> Result<Response<RunResponse>, Status> {
        Err(Status::unimplemented("method Run is not implemented"))
    }
}

/// Reject empty ids before anything reaches the runtime
fn require_id(id: &str) -> Result<ContainerId, Status> {
    if id.trim().is_empty() {
        return Err(Status::invalid_argument("container id must not be empty"));
    }
    Ok(ContainerId::new(id))
}

/// Map a runtime failure onto the call's status, preserving the message.
/// Never retried here; only the caller knows whether a repeat is safe.
fn status_from_runtime(err: RuntimeError) -> Status {
    match err {
        RuntimeError::ContainerNotFound(msg) | RuntimeError::ImageNotFound(msg) => {
            Status::not_found(msg)
        }
        RuntimeError::InvalidSpec(msg) => Status::invalid_argument(msg),
        other => Status::internal(other.to_string()),
    }
}

fn proto_state(state: ContainerState) -> proto::ContainerState {
    match state {
        ContainerState::Created => proto::ContainerState::Created,
        ContainerState::Running => proto::ContainerState::Running,
        ContainerState::Suspended => proto::ContainerState::Suspended,
        ContainerState::Stopped => proto::ContainerState::Stopped,
        ContainerState::Closed => proto::ContainerState::Closed,
        ContainerState::Unknown => proto::ContainerState::Unspecified,
    }
}

fn proto_container(handle: &ContainerHandle) -> proto::Container {
    proto::Container {
        id: handle.id.to_string(),
        state: proto_state(handle.state) as i32,
        image: handle.image.clone(),
        container_type: handle.container_type.clone(),
    }
}

fn spec_from_request(req: CreateRequest) -> ContainerSpec {
    let resources = req
        .resources
        .map(|r| Resources {
            memory_mb: r.memory_mb,
            cpu: r.cpu,
        })
        .unwrap_or_default();

    ContainerSpec {
        image: req.image,
        env_vars: req.env_vars,
        port_bindings: req.port_bindings,
        labels: req.labels,
        mounts: req.mounts,
        resources,
        cmd: req.cmd,
        dns: req.dns,
        used_ports: req.used_ports,
        use_bridge: req.use_bridge,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boxgate_provider::test_support::{mock_container_handle, MockCall, MockRuntime};

    fn gateway(runtime: Arc<MockRuntime>) -> ContainerGateway {
        ContainerGateway::new(runtime)
    }

    fn create_request(image: &str) -> CreateRequest {
        CreateRequest {
            image: image.to_string(),
            resources: Some(proto::Resources {
                memory_mb: 50,
                cpu: 1.0,
            }),
            use_bridge: true,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_returns_id_and_created_state() {
        let runtime = Arc::new(MockRuntime::new());
        let gw = gateway(runtime.clone());

        let resp = gw
            .create(Request::new(create_request("busybox:latest")))
            .await
            .unwrap()
            .into_inner();

        let container = resp.container.unwrap();
        assert!(!container.id.is_empty());
        assert_eq!(container.state, proto::ContainerState::Created as i32);
        assert_eq!(container.image, "busybox:latest");
        assert!(resp.message.contains(&container.id));
        assert_eq!(runtime.call_count(), 1);
    }

    #[tokio::test]
    async fn test_create_empty_image_never_reaches_runtime() {
        let runtime = Arc::new(MockRuntime::new());
        let gw = gateway(runtime.clone());

        let status = gw
            .create(Request::new(CreateRequest::default()))
            .await
            .unwrap_err();
        assert_eq!(status.code(), tonic::Code::InvalidArgument);
        assert_eq!(runtime.call_count(), 0);
    }

    #[tokio::test]
    async fn test_start_empty_id_never_reaches_runtime() {
        let runtime = Arc::new(MockRuntime::new());
        let gw = gateway(runtime.clone());

        let status = gw
            .start(Request::new(StartRequest { id: "  ".into() }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), tonic::Code::InvalidArgument);
        assert_eq!(runtime.call_count(), 0);
    }

    #[tokio::test]
    async fn test_start_forwards_exactly_once() {
        let runtime = Arc::new(MockRuntime::new());
        let gw = gateway(runtime.clone());

        let resp = gw
            .start(Request::new(StartRequest { id: "c1".into() }))
            .await
            .unwrap()
            .into_inner();

        assert!(resp.message.contains("c1"));
        assert_eq!(
            runtime.get_calls(),
            vec![MockCall::Start {
                id: "c1".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_runtime_not_found_maps_to_not_found() {
        let runtime = Arc::new(MockRuntime::new());
        *runtime.start_result.lock().unwrap() =
            Err(RuntimeError::ContainerNotFound("no such container".into()));
        let gw = gateway(runtime);

        let status = gw
            .start(Request::new(StartRequest { id: "ghost".into() }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), tonic::Code::NotFound);
        assert!(status.message().contains("no such container"));
    }

    #[tokio::test]
    async fn test_runtime_engine_error_maps_to_internal() {
        let runtime = Arc::new(MockRuntime::new());
        *runtime.stop_result.lock().unwrap() =
            Err(RuntimeError::EngineError("engine exploded".into()));
        let gw = gateway(runtime);

        let status = gw
            .stop(Request::new(StopRequest { id: "c1".into() }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), tonic::Code::Internal);
        assert!(status.message().contains("engine exploded"));
    }

    #[tokio::test]
    async fn test_run_is_unimplemented_and_runtime_untouched() {
        let runtime = Arc::new(MockRuntime::new());
        let gw = gateway(runtime.clone());

        let status = gw
            .run(Request::new(RunRequest {
                image: "busybox".into(),
                cmd: vec!["true".into()],
            }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), tonic::Code::Unimplemented);
        assert_eq!(runtime.call_count(), 0);
    }

    #[tokio::test]
    async fn test_info_reports_runtime_state_and_is_idempotent() {
        let runtime = Arc::new(MockRuntime::new());
        *runtime.inspect_result.lock().unwrap() =
            Ok(mock_container_handle("c1", ContainerState::Suspended));
        let gw = gateway(runtime.clone());

        let first = gw
            .info(Request::new(InfoRequest { id: "c1".into() }))
            .await
            .unwrap()
            .into_inner();
        let second = gw
            .info(Request::new(InfoRequest { id: "c1".into() }))
            .await
            .unwrap()
            .into_inner();

        assert_eq!(first.container, second.container);
        assert_eq!(
            first.container.unwrap().state,
            proto::ContainerState::Suspended as i32
        );
        assert_eq!(runtime.call_count(), 2);
    }

    #[tokio::test]
    async fn test_close_forwards_exactly_once() {
        let runtime = Arc::new(MockRuntime::new());
        let gw = gateway(runtime.clone());

        gw.close(Request::new(CloseRequest { id: "c1".into() }))
            .await
            .unwrap();

        assert_eq!(
            runtime.get_calls(),
            vec![MockCall::Close {
                id: "c1".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_concurrent_identical_creates_yield_distinct_ids() {
        // Two racing identical creates are two independent containers; the
        // request shape carries no idempotency key and the gateway must not
        // invent deduplication.
        let runtime = Arc::new(MockRuntime::new());
        let gw = gateway(runtime.clone());

        let (a, b) = tokio::join!(
            gw.create(Request::new(create_request("busybox:latest"))),
            gw.create(Request::new(create_request("busybox:latest"))),
        );

        let id_a = a.unwrap().into_inner().container.unwrap().id;
        let id_b = b.unwrap().into_inner().container.unwrap().id;
        assert_ne!(id_a, id_b);
        assert_eq!(runtime.call_count(), 2);
    }
}
