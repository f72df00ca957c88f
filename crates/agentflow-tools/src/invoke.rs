use crate::circuit::CircuitBreaker;
use crate::definition::{FailurePolicy, ToolDefinition};
use crate::error::{Result, ToolError};
use crate::implementations::ToolImplementations;
use agentflow_stream::Emitter;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::warn;

/// Per-run context an [`invoke`] call needs: the ambient emitter (if any —
/// tests may omit it) and the run's circuit breaker.
pub struct ToolContext<'a> {
    pub run_id: String,
    pub emitter: Option<Emitter>,
    pub circuit_breaker: &'a CircuitBreaker,
}

/// The terminal outcome of one [`invoke`] call. `error` is populated
/// instead of an `Err` return when `failure_policy = continue`, per
/// `spec.md` §4.6's failure-handling split.
#[derive(Debug, Clone)]
pub struct ToolOutcome {
    pub output: Option<Value>,
    pub error: Option<String>,
    pub attempt_count: u32,
}

/// Execute `tool_def` against `input`, per `spec.md` §4.6's six-step
/// contract: schema validation, retry-bounded dispatch with per-attempt
/// timeout, output validation, circuit-breaker bookkeeping, and
/// `on_tool_start`/`on_tool_end` emission.
pub async fn invoke(
    tool_def: &ToolDefinition,
    input: Value,
    implementations: &dyn ToolImplementations,
    ctx: &ToolContext<'_>,
) -> Result<ToolOutcome> {
    if ctx
        .circuit_breaker
        .is_open(&tool_def.slug, tool_def.execution_config.circuit_breaker_threshold)
    {
        let err = ToolError::CircuitOpen {
            tool: tool_def.slug.clone(),
            threshold: tool_def.execution_config.circuit_breaker_threshold,
        };
        emit_tool_end_error(ctx, &tool_def.slug, &err);
        return Err(err);
    }

    if let Err(reason) = validate_schema(&tool_def.input_schema, &input) {
        let err = ToolError::SchemaInvalid(reason);
        emit_tool_start(ctx, &tool_def.slug, &input);
        emit_tool_end_error(ctx, &tool_def.slug, &err);
        return Err(err);
    }

    emit_tool_start(ctx, &tool_def.slug, &input);

    let retry = &tool_def.execution_config.retry;
    let timeout = Duration::from_secs(tool_def.execution_config.timeout_s);
    let mut attempt = 1u32;
    let mut last_error = None;

    let outcome = loop {
        if attempt > 1 {
            tokio::time::sleep(retry.delay_for(attempt)).await;
        }

        let call = implementations.invoke(tool_def.implementation.kind, &tool_def.implementation.config, &input);
        let result = tokio::time::timeout(timeout, call).await;

        let attempt_result = match result {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(err)) => Err(err),
            Err(_) => Err(ToolError::Timeout(tool_def.execution_config.timeout_s)),
        };

        match attempt_result {
            Ok(output) => break Ok((output, attempt)),
            Err(err) => {
                last_error = Some(err);
                attempt += 1;
                if !retry.should_attempt(attempt) {
                    break Err(last_error.clone().expect("last_error set on failure path"));
                }
                continue;
            }
        }
    };

    match outcome {
        Ok((output, attempt_count)) => {
            if let Err(reason) = validate_schema(&tool_def.output_schema, &output) {
                let err = ToolError::OutputInvalid(reason);
                ctx.circuit_breaker.record_failure(&tool_def.slug);
                emit_tool_end_error(ctx, &tool_def.slug, &err);
                return Err(err);
            }
            ctx.circuit_breaker.record_success(&tool_def.slug);
            emit_tool_end_ok(ctx, &tool_def.slug, &output, attempt_count);
            Ok(ToolOutcome {
                output: Some(output),
                error: None,
                attempt_count,
            })
        }
        Err(err) => {
            // One invoke() call, however many attempts it took internally,
            // counts as a single consecutive failure against the breaker
            // (spec.md §4.6 step 5) — the breaker tracks invocation
            // outcomes, not per-attempt retries. This call's own error is
            // reported as-is; a *subsequent* invocation short-circuits via
            // the is_open check at the top once the threshold is reached.
            ctx.circuit_breaker.record_failure(&tool_def.slug);
            emit_tool_end_error(ctx, &tool_def.slug, &err);
            match tool_def.execution_config.failure_policy {
                FailurePolicy::FailFast => Err(err),
                FailurePolicy::Continue => Ok(ToolOutcome {
                    output: None,
                    error: Some(err.to_string()),
                    attempt_count: attempt,
                }),
            }
        }
    }
}

fn validate_schema(schema: &Value, instance: &Value) -> std::result::Result<(), String> {
    if schema.is_null() {
        return Ok(());
    }
    let compiled = jsonschema::JSONSchema::compile(schema)
        .map_err(|e| format!("invalid schema: {e}"))?;
    let errors: Vec<String> = compiled
        .validate(instance)
        .err()
        .map(|iter| iter.map(|e| e.to_string()).collect())
        .unwrap_or_default();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors.join("; "))
    }
}

fn emit_tool_start(ctx: &ToolContext<'_>, tool_slug: &str, input: &Value) {
    if let Some(emitter) = &ctx.emitter {
        emitter.emit_tool_start(tool_slug, Some(input.clone()), None);
    }
}

fn emit_tool_end_ok(ctx: &ToolContext<'_>, tool_slug: &str, output: &Value, attempt_count: u32) {
    if let Some(emitter) = &ctx.emitter {
        emitter.emit_tool_end(
            tool_slug,
            Some(json!({"output": output, "attempt_count": attempt_count})),
            None,
        );
    }
}

fn emit_tool_end_error(ctx: &ToolContext<'_>, tool_slug: &str, err: &ToolError) {
    warn!(tool = tool_slug, error = %err, run_id = %ctx.run_id, "tool invocation failed");
    if let Some(emitter) = &ctx.emitter {
        emitter.emit_tool_end(
            tool_slug,
            Some(json!({"error": err.to_string(), "code": err.code()})),
            None,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{ExecutionConfig, Implementation, ImplementationKind, ToolStatus};
    use agentflow_tooling::async_utils::RetryPolicy;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FlakyThenOk {
        calls: AtomicU32,
    }

    #[async_trait]
    impl ToolImplementations for FlakyThenOk {
        async fn invoke(&self, _kind: ImplementationKind, _config: &Value, _input: &Value) -> Result<Value> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call == 0 {
                Err(ToolError::Timeout(1))
            } else {
                Ok(json!({"y": 2}))
            }
        }
    }

    fn test_tool_def() -> ToolDefinition {
        ToolDefinition {
            id: uuid::Uuid::new_v4(),
            slug: "t1".to_string(),
            status: ToolStatus::Published,
            version: 1,
            input_schema: Value::Null,
            output_schema: Value::Null,
            implementation: Implementation {
                kind: ImplementationKind::Builtin,
                config: Value::Null,
            },
            execution_config: ExecutionConfig {
                timeout_s: 1,
                retry: RetryPolicy {
                    max_attempts: 3,
                    initial_delay_ms: 1,
                    max_delay_ms: 5,
                    backoff_multiplier: 1.0,
                    jitter: false,
                },
                failure_policy: FailurePolicy::FailFast,
                circuit_breaker_threshold: 5,
            },
        }
    }

    #[tokio::test]
    async fn retries_then_succeeds() {
        let tool_def = test_tool_def();
        let impls = FlakyThenOk {
            calls: AtomicU32::new(0),
        };
        let breaker = CircuitBreaker::new();
        let ctx = ToolContext {
            run_id: "r1".to_string(),
            emitter: None,
            circuit_breaker: &breaker,
        };
        let outcome = invoke(&tool_def, json!({}), &impls, &ctx).await.unwrap();
        assert_eq!(outcome.output, Some(json!({"y": 2})));
        assert_eq!(outcome.attempt_count, 2);
    }

    struct AlwaysFails;

    #[async_trait]
    impl ToolImplementations for AlwaysFails {
        async fn invoke(&self, _kind: ImplementationKind, _config: &Value, _input: &Value) -> Result<Value> {
            Err(ToolError::ProviderFailure("down".to_string()))
        }
    }

    #[tokio::test]
    async fn circuit_breaker_trips_after_threshold() {
        let mut tool_def = test_tool_def();
        tool_def.execution_config.circuit_breaker_threshold = 2;
        tool_def.execution_config.retry.max_attempts = 1;
        let impls = AlwaysFails;
        let breaker = CircuitBreaker::new();

        for _ in 0..2 {
            let ctx = ToolContext {
                run_id: "r1".to_string(),
                emitter: None,
                circuit_breaker: &breaker,
            };
            let _ = invoke(&tool_def, json!({}), &impls, &ctx).await;
        }

        let ctx = ToolContext {
            run_id: "r1".to_string(),
            emitter: None,
            circuit_breaker: &breaker,
        };
        let result = invoke(&tool_def, json!({}), &impls, &ctx).await;
        assert!(matches!(result, Err(ToolError::CircuitOpen { .. })));
    }

    #[tokio::test]
    async fn continue_policy_returns_error_payload_instead_of_err() {
        let mut tool_def = test_tool_def();
        tool_def.execution_config.failure_policy = FailurePolicy::Continue;
        tool_def.execution_config.retry.max_attempts = 1;
        tool_def.execution_config.circuit_breaker_threshold = 10;
        let impls = AlwaysFails;
        let breaker = CircuitBreaker::new();
        let ctx = ToolContext {
            run_id: "r1".to_string(),
            emitter: None,
            circuit_breaker: &breaker,
        };
        let outcome = invoke(&tool_def, json!({}), &impls, &ctx).await.unwrap();
        assert!(outcome.error.is_some());
        assert!(outcome.output.is_none());
    }
}
