use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;

use crate::error::{DispatchError, DispatchResult, RequestFailure};
use crate::request::config::{defaults, resolve_configs, OverrideSpec};
use crate::request::executor::{execute_single_request, ReqwestTransport, Transport};
use crate::request::request_item::RequestConfig;
use crate::request::result::{BatchOutcome, Elapsed, RequestResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchPolicy {
    /// Fail the whole batch if any slot task is rejected.
    #[default]
    AllOrSummarize,
    /// Turn a rejected slot task into a synthetic failed result.
    Settled,
}

impl fmt::Display for DispatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchPolicy::AllOrSummarize => f.write_str("ALL_OR_SUMMARIZE"),
            DispatchPolicy::Settled => f.write_str("SETTLED"),
        }
    }
}

/// Fans a batch out as one tokio task per slot and joins them back in slot order.
///
/// There is no concurrency cap and no deadline: `n` slots means `n`
/// in-flight requests.
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
}

impl Dispatcher {
    pub fn new() -> Result<Self, reqwest::Error> {
        Ok(Self::with_transport(Arc::new(ReqwestTransport::new()?)))
    }

    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// All-or-summarize dispatch against the process-wide defaults.
    pub async fn dispatch(&self, n: usize, spec: impl Into<OverrideSpec>) -> DispatchResult<BatchOutcome> {
        self.dispatch_with(DispatchPolicy::AllOrSummarize, &defaults(), n, spec.into())
            .await
    }

    /// Settled dispatch against the process-wide defaults. Only config errors
    /// can come back as `Err`.
    pub async fn dispatch_settled(&self, n: usize, spec: impl Into<OverrideSpec>) -> DispatchResult<BatchOutcome> {
        self.dispatch_with(DispatchPolicy::Settled, &defaults(), n, spec.into())
            .await
    }

    pub async fn dispatch_with(
        &self,
        policy: DispatchPolicy,
        defaults: &RequestConfig,
        n: usize,
        spec: OverrideSpec,
    ) -> DispatchResult<BatchOutcome> {
        let configs = resolve_configs(defaults, n, &spec)?;
        log_batch_start(policy, &configs);

        let start = Instant::now();
        let results = match policy {
            DispatchPolicy::AllOrSummarize => execute_with_join_all(configs, self.transport.clone()).await?,
            DispatchPolicy::Settled => execute_settled(configs, self.transport.clone()).await,
        };
        let outcome = BatchOutcome::new(policy, results, start.elapsed());

        tracing::info!(
            %policy,
            total = outcome.summary.total,
            successful = outcome.summary.successful,
            failed = outcome.summary.failed,
            success_rate = %outcome.summary.success_rate_label(),
            elapsed_ms = outcome.elapsed.as_millis() as u64,
            "batch finished"
        );
        Ok(outcome)
    }
}

fn log_batch_start(policy: DispatchPolicy, configs: &[RequestConfig]) {
    let Some(first) = configs.first() else { return };
    let token = match first.bearer_token() {
        Some(token) => format!("{}...", token.chars().take(20).collect::<String>()),
        None => "none (public endpoint)".to_owned(),
    };
    let payloads: HashSet<String> = configs
        .iter()
        .map(|c| c.body.as_ref().map(|b| b.to_string()).unwrap_or_default())
        .collect();
    tracing::info!(
        %policy,
        count = configs.len(),
        method = %first.method,
        endpoint = %first.endpoint,
        token = %token,
        distinct_payloads = payloads.len(),
        "starting concurrent requests"
    );
}

type SlotHandle = tokio::task::JoinHandle<RequestResult>;

fn spawn_slots(configs: &[RequestConfig], transport: Arc<dyn Transport>) -> Vec<SlotHandle> {
    configs
        .iter()
        .enumerate()
        .map(|(index, config)| {
            let transport = transport.clone();
            let config = config.clone();
            tokio::spawn(async move { execute_single_request(index + 1, &config, transport.as_ref()).await })
        })
        .collect()
}

/// Full fan-out, full fan-in. The first rejected slot fails the batch.
pub async fn execute_with_join_all(
    configs: Vec<RequestConfig>,
    transport: Arc<dyn Transport>,
) -> DispatchResult<Vec<RequestResult>> {
    let handles = spawn_slots(&configs, transport);
    join_all(handles)
        .await
        .into_iter()
        .enumerate()
        .map(|(index, joined)| {
            joined.map_err(|source| DispatchError::SlotRejected { request_id: index + 1, source })
        })
        .collect()
}

/// Full fan-out, full fan-in. A rejected slot becomes a failed result, so the
/// output always has one entry per config.
pub async fn execute_settled(configs: Vec<RequestConfig>, transport: Arc<dyn Transport>) -> Vec<RequestResult> {
    let handles = spawn_slots(&configs, transport);
    join_all(handles)
        .await
        .into_iter()
        .zip(configs.iter())
        .enumerate()
        .map(|(index, (joined, config))| match joined {
            Ok(result) => result,
            Err(err) => {
                let failure = RequestFailure::Rejected { reason: rejection_reason(err) };
                tracing::error!(request_id = index + 1, error = %failure, "slot task rejected");
                RequestResult::failed(index + 1, config, &failure, Elapsed::NotAvailable)
            }
        })
        .collect()
}

fn rejection_reason(err: tokio::task::JoinError) -> String {
    if err.is_panic() {
        let payload = err.into_panic();
        if let Some(message) = payload.downcast_ref::<&str>() {
            return (*message).to_owned();
        }
        if let Some(message) = payload.downcast_ref::<String>() {
            return message.clone();
        }
        return "Unknown error".to_owned();
    }
    err.to_string()
}
