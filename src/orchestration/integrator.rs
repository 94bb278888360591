//! Integration execution orchestration
//!
//! Resolves an integration, authenticates every service, dispatches the
//! caller's request to all of them concurrently and hands the responses,
//! back in declared order, to the flow combiner.

use std::{sync::Arc, time::Duration};

use futures::future::{join_all, try_join_all};
use log::{debug, info, warn};

use crate::{
    auth,
    config::{self, FailureMode, Integration, Service},
    core::{
        CancelSignal, ExecutionContext, IntegrationRegistry, IntegratorError, IntegratorResult,
        Request, RequestSender, Response,
    },
};

use super::combiner::FlowCombiner;

/// Execution options shared by every call made through an `Integrator`.
#[derive(Clone, Copy, Debug, Default)]
pub struct IntegratorOptions {
    /// Deadline for a whole execute call.
    pub timeout: Option<Duration>,
    pub failure_mode: FailureMode,
    /// Propagate response headers in sequential flow.
    pub merge_headers: bool,
}

impl From<&config::Weaver> for IntegratorOptions {
    fn from(cfg: &config::Weaver) -> Self {
        Self {
            timeout: cfg.timeout(),
            failure_mode: cfg.failure_mode,
            merge_headers: cfg.merge_headers,
        }
    }
}

/// Orchestrates integration execution.
///
/// Holds only immutable state, so one instance (or its clones) can serve
/// any number of concurrent execute calls.
#[derive(Clone)]
pub struct Integrator {
    registry: Arc<IntegrationRegistry>,
    sender: Arc<dyn RequestSender>,
    options: IntegratorOptions,
}

/// A service paired with its authenticated target, or the reason it has none.
type Target<'a> = (&'a Service, IntegratorResult<(String, Request)>);

impl Integrator {
    pub fn new(registry: Arc<IntegrationRegistry>, sender: Arc<dyn RequestSender>) -> Self {
        Self {
            registry,
            sender,
            options: IntegratorOptions::default(),
        }
    }

    pub fn with_options(mut self, options: IntegratorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &IntegratorOptions {
        &self.options
    }

    pub fn integration(&self, id: &str) -> IntegratorResult<Arc<Integration>> {
        self.registry.get(id)
    }

    /// Execute an integration and return the combined response.
    pub async fn execute(&self, integration_id: &str, request: &Request) -> IntegratorResult<Response> {
        self.execute_with_cancel(integration_id, request, CancelSignal::never())
            .await
    }

    /// Execute an integration, abandoning all outstanding service calls if
    /// `cancel` fires or the configured deadline passes.
    pub async fn execute_with_cancel(
        &self,
        integration_id: &str,
        request: &Request,
        cancel: CancelSignal,
    ) -> IntegratorResult<Response> {
        let integration = self.registry.get(integration_id)?;
        let mut ctx = ExecutionContext::new(integration_id, self.options.timeout, cancel);

        info!(
            "[{}] Executing integration '{}' ({} services, {} flow)",
            ctx.execution_id,
            ctx.integration_id,
            integration.services.len(),
            integration.flow
        );

        if ctx.cancel.is_cancelled() {
            info!(
                "[{}] Integration '{}' cancelled before dispatch",
                ctx.execution_id, ctx.integration_id
            );
            return Err(IntegratorError::Cancelled);
        }

        // Service futures are polled in place, never spawned, so dropping
        // `guarded` abandons every call still in flight.
        let run = self.run(&integration, request, ctx.execution_id.clone());
        let limit = ctx.timeout;
        let guarded = async move {
            match limit {
                Some(limit) => tokio::time::timeout(limit, run)
                    .await
                    .unwrap_or_else(|_| Err(IntegratorError::Timeout(limit))),
                None => run.await,
            }
        };

        let result = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => Err(IntegratorError::Cancelled),
            outcome = guarded => outcome,
        };

        match &result {
            Ok(response) => info!(
                "[{}] Integration '{}' completed with status {} in {:?}",
                ctx.execution_id,
                ctx.integration_id,
                response.status,
                ctx.elapsed()
            ),
            Err(e) => warn!(
                "[{}] Integration '{}' failed after {:?}: {e}",
                ctx.execution_id,
                ctx.integration_id,
                ctx.elapsed()
            ),
        }

        result
    }

    async fn run(
        &self,
        integration: &Integration,
        request: &Request,
        execution_id: String,
    ) -> IntegratorResult<Response> {
        // Authentication is pure, so it completes for every service before
        // any request leaves.
        let targets = self.authenticate_all(integration, request)?;

        let calls = targets.into_iter().map(|(service, target)| {
            let execution_id = execution_id.as_str();
            async move {
                let (endpoint, authenticated) =
                    target.map_err(|e| IntegratorError::service_failed(&service.id, e))?;
                debug!(
                    "[{execution_id}] Dispatching {} to service '{}' at {endpoint}",
                    authenticated.method, service.id
                );
                self.sender
                    .send(&endpoint, &authenticated)
                    .await
                    .map_err(|e| IntegratorError::service_failed(&service.id, e))
            }
        });

        // Both joins yield results in declared order, whatever order the
        // calls complete in.
        let responses = match self.options.failure_mode {
            FailureMode::FailFast => try_join_all(calls).await?,
            FailureMode::BestEffort => {
                let outcomes = join_all(calls).await;
                Self::keep_successes(&integration.id, outcomes, &execution_id)?
            }
        };

        let combiner = FlowCombiner::new(self.options.merge_headers);
        Ok(combiner.combine(responses, integration.flow))
    }

    /// Resolve and apply every service's authentication, in declared order.
    ///
    /// In fail-fast mode the first failure aborts; in best-effort mode the
    /// failure travels with the service so it can be reported and skipped.
    fn authenticate_all<'a>(
        &self,
        integration: &'a Integration,
        request: &Request,
    ) -> IntegratorResult<Vec<Target<'a>>> {
        let mut targets = Vec::with_capacity(integration.services.len());

        for service in &integration.services {
            match auth::resolve(&service.authentication) {
                Ok(provider) => {
                    debug!(
                        "Authenticating service '{}' with {}",
                        service.id,
                        provider.kind()
                    );
                    let target = provider.authenticate(&service.endpoint, request);
                    targets.push((service, Ok(target)));
                }
                Err(e) => match self.options.failure_mode {
                    FailureMode::FailFast => {
                        return Err(IntegratorError::service_failed(&service.id, e));
                    }
                    FailureMode::BestEffort => targets.push((service, Err(e))),
                },
            }
        }

        Ok(targets)
    }

    /// Drop failed services from a best-effort run.
    ///
    /// If every service failed there is nothing to aggregate, and the first
    /// failure in declared order is returned instead.
    fn keep_successes(
        integration_id: &str,
        outcomes: Vec<IntegratorResult<Response>>,
        execution_id: &str,
    ) -> IntegratorResult<Vec<Response>> {
        let mut responses = Vec::with_capacity(outcomes.len());
        let mut first_failure = None;

        for outcome in outcomes {
            match outcome {
                Ok(response) => responses.push(response),
                Err(e) => {
                    warn!("[{execution_id}] Dropping from integration '{integration_id}': {e}");
                    first_failure.get_or_insert(e);
                }
            }
        }

        match first_failure {
            Some(err) if responses.is_empty() => Err(err),
            _ => Ok(responses),
        }
    }
}
