//! Test support utilities for boxgate
//!
//! Provides MockRuntime and helpers for unit testing the gateway without a
//! real Docker engine.

use crate::{
    ContainerHandle, ContainerId, ContainerRuntime, ContainerSpec, ContainerState, Result,
    RuntimeError, RuntimeInfo,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Records which methods were called on the mock
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    Create { image: String },
    Start { id: String },
    Suspend { id: String },
    Stop { id: String },
    Close { id: String },
    Inspect { id: String },
    Ping,
}

/// Configurable mock container runtime for testing
///
/// Allocates a fresh id per create (mirroring the engine) and records every
/// call so tests can assert exactly which runtime invocations happened.
pub struct MockRuntime {
    pub calls: Arc<Mutex<Vec<MockCall>>>,
    next_id: AtomicU64,
    /// Error returned by create calls instead of a fresh id
    pub create_error: Arc<Mutex<Option<RuntimeError>>>,
    /// Result for start calls
    pub start_result: Arc<Mutex<Result<()>>>,
    /// Result for suspend calls
    pub suspend_result: Arc<Mutex<Result<()>>>,
    /// Result for stop calls
    pub stop_result: Arc<Mutex<Result<()>>>,
    /// Result for close calls
    pub close_result: Arc<Mutex<Result<()>>>,
    /// Result for inspect calls
    pub inspect_result: Arc<Mutex<Result<ContainerHandle>>>,
    /// Result for ping calls
    pub ping_result: Arc<Mutex<Result<()>>>,
}

impl Default for MockRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRuntime {
    /// Create a new mock runtime with default success results
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            next_id: AtomicU64::new(1),
            create_error: Arc::new(Mutex::new(None)),
            start_result: Arc::new(Mutex::new(Ok(()))),
            suspend_result: Arc::new(Mutex::new(Ok(()))),
            stop_result: Arc::new(Mutex::new(Ok(()))),
            close_result: Arc::new(Mutex::new(Ok(()))),
            inspect_result: Arc::new(Mutex::new(Ok(mock_container_handle(
                "mock_container_1",
                ContainerState::Running,
            )))),
            ping_result: Arc::new(Mutex::new(Ok(()))),
        }
    }

    fn record(&self, call: MockCall) {
        self.calls.lock().unwrap().push(call);
    }

    /// Get all recorded calls
    pub fn get_calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls recorded, across all methods
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Check if a specific call was made
    pub fn was_called(&self, call: &MockCall) -> bool {
        self.calls.lock().unwrap().contains(call)
    }
}

/// Helper to clone a Result<T> out of an Arc<Mutex<Result<T>>>
fn clone_result<T: Clone>(r: &Arc<Mutex<Result<T>>>) -> Result<T> {
    let guard = r.lock().unwrap();
    match &*guard {
        Ok(v) => Ok(v.clone()),
        Err(e) => Err(clone_runtime_error(e)),
    }
}

/// Clone a RuntimeError (thiserror types don't implement Clone)
pub fn clone_runtime_error(e: &RuntimeError) -> RuntimeError {
    match e {
        RuntimeError::ConnectionError(s) => RuntimeError::ConnectionError(s.clone()),
        RuntimeError::ContainerNotFound(s) => RuntimeError::ContainerNotFound(s.clone()),
        RuntimeError::ImageNotFound(s) => RuntimeError::ImageNotFound(s.clone()),
        RuntimeError::InvalidSpec(s) => RuntimeError::InvalidSpec(s.clone()),
        RuntimeError::EngineError(s) => RuntimeError::EngineError(s.clone()),
        RuntimeError::IoError(_) => RuntimeError::EngineError("IO error (cloned)".into()),
    }
}

/// Create a mock ContainerHandle
pub fn mock_container_handle(id: &str, state: ContainerState) -> ContainerHandle {
    ContainerHandle {
        id: ContainerId::new(id),
        state,
        image: "mock_image:latest".to_string(),
        container_type: "docker".to_string(),
    }
}

#[async_trait]
impl ContainerRuntime for MockRuntime {
    async fn create(&self, spec: &ContainerSpec) -> Result<ContainerId> {
        self.record(MockCall::Create {
            image: spec.image.clone(),
        });
        if let Some(e) = &*self.create_error.lock().unwrap() {
            return Err(clone_runtime_error(e));
        }
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        Ok(ContainerId::new(format!("mock_container_{}", n)))
    }

    async fn start(&self, id: &ContainerId) -> Result<()> {
        self.record(MockCall::Start { id: id.0.clone() });
        clone_result(&self.start_result)
    }

    async fn suspend(&self, id: &ContainerId) -> Result<()> {
        self.record(MockCall::Suspend { id: id.0.clone() });
        clone_result(&self.suspend_result)
    }

    async fn stop(&self, id: &ContainerId) -> Result<()> {
        self.record(MockCall::Stop { id: id.0.clone() });
        clone_result(&self.stop_result)
    }

    async fn close(&self, id: &ContainerId) -> Result<()> {
        self.record(MockCall::Close { id: id.0.clone() });
        clone_result(&self.close_result)
    }

    async fn inspect(&self, id: &ContainerId) -> Result<ContainerHandle> {
        self.record(MockCall::Inspect { id: id.0.clone() });
        clone_result(&self.inspect_result)
    }

    async fn ping(&self) -> Result<()> {
        self.record(MockCall::Ping);
        clone_result(&self.ping_result)
    }

    fn info(&self) -> RuntimeInfo {
        RuntimeInfo {
            runtime_type: "docker".to_string(),
            api_version: "test".to_string(),
        }
    }
}
