use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use candles_sync_core::{ExchangeAdapter, ExchangeId, FetchParams, RawRecord, SyncError};

/// Computes a response from the endpoint and parameters of a call.
pub type Generator =
    Arc<dyn Fn(&str, &FetchParams) -> Result<Vec<RawRecord>, SyncError> + Send + Sync>;

/// Instruction for how a fetch should behave.
#[derive(Clone)]
pub enum MockBehavior {
    /// Return the provided records.
    Return(Vec<RawRecord>),
    /// Compute the records from the request.
    Generate(Generator),
    /// Fail with the provided error.
    Fail(SyncError),
    /// Hang indefinitely (simulate a stalled connection).
    Hang,
}

/// One logged fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchCall {
    /// Endpoint path as requested.
    pub endpoint: String,
    /// Query parameters as requested.
    pub params: FetchParams,
}

#[derive(Default)]
struct InternalState {
    rules: HashMap<String, MockBehavior>,
    queued: HashMap<String, VecDeque<MockBehavior>>,
    fallback: Option<MockBehavior>,
    calls: Vec<FetchCall>,
}

/// Scriptable exchange adapter.
pub struct MockExchange {
    exchange: ExchangeId,
    state: Arc<Mutex<InternalState>>,
}

/// Controller handle used by tests to drive a [`MockExchange`] from the outside.
#[derive(Clone)]
pub struct MockExchangeController {
    state: Arc<Mutex<InternalState>>,
}

impl MockExchange {
    /// A mock for `exchange` together with its controller.
    #[must_use]
    pub fn new_with_controller(exchange: ExchangeId) -> (Arc<Self>, MockExchangeController) {
        let state = Arc::new(Mutex::new(InternalState::default()));
        let mock = Arc::new(Self {
            exchange,
            state: Arc::clone(&state),
        });
        (mock, MockExchangeController { state })
    }
}

impl MockExchangeController {
    /// Set the behavior for every call to `endpoint`.
    pub async fn set_behavior(&self, endpoint: &str, behavior: MockBehavior) {
        let mut guard = self.state.lock().await;
        guard.rules.insert(endpoint.to_string(), behavior);
    }

    /// Queue a one-shot behavior for the next call to `endpoint`.
    ///
    /// Queued behaviors are consumed in order before the endpoint rule applies.
    pub async fn push_behavior(&self, endpoint: &str, behavior: MockBehavior) {
        let mut guard = self.state.lock().await;
        guard
            .queued
            .entry(endpoint.to_string())
            .or_default()
            .push_back(behavior);
    }

    /// Behavior for endpoints without a rule.
    pub async fn set_fallback(&self, behavior: MockBehavior) {
        let mut guard = self.state.lock().await;
        guard.fallback = Some(behavior);
    }

    /// Copy of the call log.
    pub async fn calls(&self) -> Vec<FetchCall> {
        self.state.lock().await.calls.clone()
    }

    /// Number of fetches issued so far.
    pub async fn call_count(&self) -> usize {
        self.state.lock().await.calls.len()
    }

    /// Clear the call log, keeping behaviors.
    pub async fn clear_calls(&self) {
        self.state.lock().await.calls.clear();
    }

    /// Clear all behaviors and the call log.
    pub async fn clear_all(&self) {
        let mut guard = self.state.lock().await;
        guard.rules.clear();
        guard.queued.clear();
        guard.fallback = None;
        guard.calls.clear();
    }
}

#[async_trait]
impl ExchangeAdapter for MockExchange {
    fn name(&self) -> &'static str {
        "candles-sync-mock"
    }

    fn exchange(&self) -> ExchangeId {
        self.exchange
    }

    async fn fetch(
        &self,
        endpoint: &str,
        params: &FetchParams,
    ) -> Result<Vec<RawRecord>, SyncError> {
        let behavior = {
            let mut guard = self.state.lock().await;
            guard.calls.push(FetchCall {
                endpoint: endpoint.to_string(),
                params: params.clone(),
            });
            let queued = guard
                .queued
                .get_mut(endpoint)
                .and_then(VecDeque::pop_front);
            queued
                .or_else(|| guard.rules.get(endpoint).cloned())
                .or_else(|| guard.fallback.clone())
        };
        match behavior {
            Some(MockBehavior::Return(records)) => Ok(records),
            Some(MockBehavior::Generate(generate)) => generate(endpoint, params),
            Some(MockBehavior::Fail(err)) => Err(err),
            Some(MockBehavior::Hang) => std::future::pending().await,
            None => Err(SyncError::transport(
                self.name(),
                format!("no behavior for endpoint '{endpoint}'"),
            )),
        }
    }
}
