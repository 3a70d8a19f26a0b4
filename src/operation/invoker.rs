//! Resource Action Invoker
//!
//! Runs exactly one action against one resource and folds every possible
//! outcome into an [`OperationResult`]. `invoke` is total: provider errors,
//! transport errors and panics inside the executor all come back as
//! `Failure` values, never as `Err` or an unwinding panic.

use super::action::ResourceAction;
use super::result::{FailureKind, OperationResult};
use crate::gcp::http::ApiError;
use crate::resource::ResourceRef;
use anyhow::Result;
use futures::FutureExt;
use serde_json::Value;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

/// Message for a missing resource handle
pub const MISSING_RESOURCE_MESSAGE: &str = "resource must not be null";

/// Message for HTTP 403, identical for every action type
pub const PERMISSION_DENIED_MESSAGE: &str =
    "permission denied: check your IAM permissions on this project";

/// Message for HTTP 404
pub const NOT_FOUND_MESSAGE: &str = "resource not found";

/// Prefix for errors that did not come from the provider
pub const UNEXPECTED_PREFIX: &str = "unexpected error occurred: ";

/// Markers after which provider messages turn into diagnostic payloads
const DIAGNOSTIC_MARKERS: &[&str] = &[" Details:", "\tDetails:", " Caused by:", " Debug info:"];

/// Performs one provider call for one action on one resource
pub trait ActionExecutor {
    fn execute(
        &self,
        action: &ResourceAction,
        resource: &ResourceRef,
    ) -> impl Future<Output = Result<Value>> + Send;
}

/// Wraps an executor and normalizes its outcome
pub struct ActionInvoker<E> {
    executor: E,
}

impl<E: ActionExecutor> ActionInvoker<E> {
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Invoke `action` on `resource`.
    ///
    /// A missing or empty handle fails before any provider call.
    pub async fn invoke(
        &self,
        action: &ResourceAction,
        resource: Option<&ResourceRef>,
    ) -> OperationResult {
        let Some(resource) = resource.filter(|r| !r.is_empty()) else {
            return OperationResult::failure(FailureKind::InvalidInput, MISSING_RESOURCE_MESSAGE);
        };

        tracing::info!(
            "invoke: action={}, kind={}, project={}, resource={}",
            action.key(),
            resource.kind,
            resource.project,
            resource.name
        );

        let call = AssertUnwindSafe(async { self.executor.execute(action, resource).await });

        let result = match call.catch_unwind().await {
            Ok(Ok(_)) => OperationResult::success(action.success_message(&resource.name)),
            Ok(Err(err)) => normalize_error(&err),
            Err(panic) => OperationResult::failure(
                FailureKind::Unexpected,
                format!("{}{}", UNEXPECTED_PREFIX, panic_message(panic.as_ref())),
            ),
        };

        if let OperationResult::Failure { kind, message } = &result {
            tracing::warn!(
                "{} {} failed ({}): {}",
                action.display_name(),
                resource.name,
                kind,
                message
            );
        }

        result
    }
}

/// Map an executor error to a failed result
pub fn normalize_error(err: &anyhow::Error) -> OperationResult {
    match ApiError::find(err) {
        Some(api) if api.status == 403 => {
            OperationResult::failure(FailureKind::PermissionDenied, PERMISSION_DENIED_MESSAGE)
        },
        Some(api) if api.status == 404 => {
            OperationResult::failure(FailureKind::NotFound, NOT_FOUND_MESSAGE)
        },
        Some(api) => {
            let message = first_segment(&api.message);
            let message = if message.is_empty() {
                format!("request failed with status {}", api.status)
            } else {
                message
            };
            OperationResult::failure(FailureKind::Provider, message)
        },
        None => OperationResult::failure(
            FailureKind::Unexpected,
            format!("{}{}", UNEXPECTED_PREFIX, first_segment(&err.to_string())),
        ),
    }
}

/// First line of a provider message, cut before any verbose diagnostic suffix
pub fn first_segment(message: &str) -> String {
    let line = message.lines().next().unwrap_or("");
    let cut = DIAGNOSTIC_MARKERS
        .iter()
        .filter_map(|marker| line.find(marker))
        .min()
        .unwrap_or(line.len());
    line[..cut].trim().to_string()
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic in action".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::Location;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Behavior {
        Ok,
        Status(u16, &'static str),
        Transport,
        Panic,
    }

    struct CountingExecutor {
        calls: AtomicUsize,
        behavior: Behavior,
    }

    impl CountingExecutor {
        fn new(behavior: Behavior) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                behavior,
            }
        }
    }

    impl ActionExecutor for CountingExecutor {
        fn execute(
            &self,
            _action: &ResourceAction,
            _resource: &ResourceRef,
        ) -> impl Future<Output = Result<Value>> + Send {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let outcome = match self.behavior {
                Behavior::Ok => Some(Ok(Value::Null)),
                Behavior::Status(status, body) => {
                    Some(Err(ApiError::from_body(status, body).into()))
                },
                Behavior::Transport => Some(Err(anyhow::anyhow!("connection reset by peer"))),
                Behavior::Panic => None,
            };
            async move {
                match outcome {
                    Some(outcome) => outcome,
                    None => panic!("executor blew up"),
                }
            }
        }
    }

    fn vm() -> ResourceRef {
        ResourceRef::new(
            "compute-instances",
            "proj-a",
            "web-1",
            Location::Zone("us-central1-a".into()),
        )
    }

    #[tokio::test]
    async fn test_missing_resource_makes_no_call() {
        let invoker = ActionInvoker::new(CountingExecutor::new(Behavior::Ok));
        let result = invoker.invoke(&ResourceAction::Start, None).await;

        assert_eq!(
            result,
            OperationResult::failure(FailureKind::InvalidInput, MISSING_RESOURCE_MESSAGE)
        );
        assert_eq!(invoker.executor().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_name_counts_as_missing() {
        let invoker = ActionInvoker::new(CountingExecutor::new(Behavior::Ok));
        let blank = ResourceRef::new("compute-instances", "proj-a", "  ", Location::Global);
        let result = invoker.invoke(&ResourceAction::Delete, Some(&blank)).await;

        assert_eq!(result.message(), MISSING_RESOURCE_MESSAGE);
        assert_eq!(invoker.executor().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_success_message_names_resource() {
        let invoker = ActionInvoker::new(CountingExecutor::new(Behavior::Ok));
        let result = invoker.invoke(&ResourceAction::Stop, Some(&vm())).await;

        assert_eq!(result, OperationResult::success("Stopped web-1"));
        assert_eq!(invoker.executor().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_403_is_fixed_for_every_action() {
        let actions = [
            ResourceAction::Start,
            ResourceAction::Delete,
            ResourceAction::ApplyTag {
                key: "env".into(),
                value: "prod".into(),
            },
            ResourceAction::Backup { description: None },
        ];
        let invoker = ActionInvoker::new(CountingExecutor::new(Behavior::Status(
            403,
            r#"{"error": {"message": "Required 'compute.instances.start' permission"}}"#,
        )));

        for action in &actions {
            let result = invoker.invoke(action, Some(&vm())).await;
            assert_eq!(result.failure_kind(), Some(FailureKind::PermissionDenied));
            assert_eq!(result.message(), PERMISSION_DENIED_MESSAGE);
        }
    }

    #[tokio::test]
    async fn test_404_is_not_found() {
        let invoker =
            ActionInvoker::new(CountingExecutor::new(Behavior::Status(404, "not here")));
        let result = invoker.invoke(&ResourceAction::Delete, Some(&vm())).await;
        assert_eq!(
            result,
            OperationResult::failure(FailureKind::NotFound, NOT_FOUND_MESSAGE)
        );
    }

    #[tokio::test]
    async fn test_provider_error_keeps_first_segment() {
        let body = r#"{"error": {"message": "The instance is in use. Details: [{\"reason\": \"resourceInUseByAnotherResource\"}]"}}"#;
        let invoker = ActionInvoker::new(CountingExecutor::new(Behavior::Status(400, body)));
        let result = invoker.invoke(&ResourceAction::Delete, Some(&vm())).await;

        assert_eq!(result.failure_kind(), Some(FailureKind::Provider));
        assert_eq!(result.message(), "The instance is in use.");
    }

    #[tokio::test]
    async fn test_transport_error_is_unexpected() {
        let invoker = ActionInvoker::new(CountingExecutor::new(Behavior::Transport));
        let result = invoker.invoke(&ResourceAction::Restart, Some(&vm())).await;

        assert_eq!(result.failure_kind(), Some(FailureKind::Unexpected));
        assert_eq!(
            result.message(),
            "unexpected error occurred: connection reset by peer"
        );
    }

    #[tokio::test]
    async fn test_panic_is_caught() {
        let invoker = ActionInvoker::new(CountingExecutor::new(Behavior::Panic));
        let result = invoker.invoke(&ResourceAction::Start, Some(&vm())).await;

        assert_eq!(result.failure_kind(), Some(FailureKind::Unexpected));
        assert_eq!(result.message(), "unexpected error occurred: executor blew up");
    }

    #[test]
    fn test_first_segment() {
        assert_eq!(first_segment("line one\nline two"), "line one");
        assert_eq!(
            first_segment("Quota exceeded. Caused by: something verbose"),
            "Quota exceeded."
        );
        assert_eq!(first_segment(""), "");
    }
}
