use std::{future::Future, time::Instant};

use serde::Serialize;
use serde_json::Value;

/// Record of one upstream call made while building a page.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DebugEntry {
    pub source: String,
    /// Request URL with the API key masked.
    pub url: String,
    pub latency_ms: u64,
    pub response: Value,
}

impl DebugEntry {
    pub fn new<T: Serialize>(
        source: impl Into<String>,
        url: impl Into<String>,
        timed: &Timed<T>,
    ) -> Self {
        let response = serde_json::to_value(&timed.value).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "failed to encode debug response");
            Value::Null
        });
        Self {
            source: source.into(),
            url: url.into(),
            latency_ms: timed.latency_ms,
            response,
        }
    }
}

/// Output of a future together with its wall-clock latency.
#[derive(Debug, Clone)]
pub struct Timed<T> {
    pub value: T,
    pub latency_ms: u64,
}

impl<T> Timed<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Timed<U> {
        Timed {
            value: f(self.value),
            latency_ms: self.latency_ms,
        }
    }
}

pub async fn timed<F: Future>(future: F) -> Timed<F::Output> {
    let started = Instant::now();
    let value = future.await;
    Timed {
        value,
        latency_ms: started.elapsed().as_millis() as u64,
    }
}
