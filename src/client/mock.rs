//! Scripted provider for tests.

use crate::client::{Completion, CompletionProvider};
use crate::models::{ProviderError, ProviderId};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Counts calls in flight and remembers the high-water mark.
#[derive(Debug, Default)]
pub struct InFlightGauge {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl InFlightGauge {
    fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn exit(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

/// Replies with a fixed text, or fails on demand.
#[derive(Clone)]
pub struct MockProvider {
    pub id: ProviderId,
    pub reply: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    /// Fail every call
    pub always_fail: bool,
    /// Fail calls whose prompt contains this marker
    pub fail_when: Option<String>,
    /// Simulated latency per call
    pub delay: Duration,
    pub gauge: Option<Arc<InFlightGauge>>,
    pub calls: Arc<Mutex<Vec<String>>>,
}

impl MockProvider {
    pub fn new(id: ProviderId, reply: &str) -> Self {
        Self {
            id,
            reply: reply.to_string(),
            input_tokens: 1000,
            output_tokens: 500,
            always_fail: false,
            fail_when: None,
            delay: Duration::ZERO,
            gauge: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing(id: ProviderId) -> Self {
        Self {
            always_fail: true,
            ..Self::new(id, "")
        }
    }

    pub fn failing_when(mut self, marker: &str) -> Self {
        self.fail_when = Some(marker.to_string());
        self
    }

    pub fn with_tokens(mut self, input_tokens: u64, output_tokens: u64) -> Self {
        self.input_tokens = input_tokens;
        self.output_tokens = output_tokens;
        self
    }

    /// Sleep `delay` inside every call, reporting to `gauge` while it does.
    pub fn with_delay(mut self, delay: Duration, gauge: Arc<InFlightGauge>) -> Self {
        self.delay = delay;
        self.gauge = Some(gauge);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionProvider for MockProvider {
    fn id(&self) -> ProviderId {
        self.id
    }

    async fn complete(&self, prompt: &str, _model: &str) -> Result<Completion, ProviderError> {
        self.calls.lock().unwrap().push(prompt.to_string());

        if let Some(gauge) = &self.gauge {
            gauge.enter();
            tokio::time::sleep(self.delay).await;
            gauge.exit();
        }

        let triggered = self
            .fail_when
            .as_deref()
            .is_some_and(|marker| prompt.contains(marker));
        if self.always_fail || triggered {
            return Err(ProviderError::Unavailable(format!("{} is down", self.id)));
        }

        Ok(Completion {
            text: self.reply.clone(),
            input_tokens: self.input_tokens,
            output_tokens: self.output_tokens,
        })
    }
}
