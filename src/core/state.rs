//! Estimator state with URL write-back.
//!
//! [`EstimatorState`] keeps the normalized parameter set, notifies
//! subscribers on change and hands the canonical URL to a debounced
//! [`UrlSync`] task, which forwards it to every registered [`UrlSink`].

use crate::core::params::{
    apply_params_to_url, build_search_from_params, normalize_params, params_to_raw,
    parse_estimate_source, read_params_from_url,
};
use crate::domain::model::EstimateParams;
use crate::domain::ports::UrlSink;
use crate::utils::error::Result;
use serde::{Deserialize, Serialize};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use url::Url;

pub const URL_SYNC_DEBOUNCE: Duration = Duration::from_millis(150);
pub const HARDWARE_ESTIMATE_URL: &str = "HARDWARE_ESTIMATE_URL";

pub type SubscriptionId = u64;
type Subscriber = Box<dyn Fn(&EstimateParams) + Send + Sync>;

/// Cross-window style message announcing the latest estimate URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimateUrlMessage {
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
}

impl EstimateUrlMessage {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            kind: HARDWARE_ESTIMATE_URL.to_string(),
            url: url.into(),
        }
    }

    /// Accepts only well-formed messages of the estimate URL type.
    pub fn parse(json: &str) -> Option<Self> {
        let message: Self = serde_json::from_str(json).ok()?;
        if message.kind == HARDWARE_ESTIMATE_URL && !message.url.is_empty() {
            Some(message)
        } else {
            None
        }
    }
}

/// Shared cell holding the most recent estimate URL.
#[derive(Debug, Clone, Default)]
pub struct LatestEstimateUrl {
    inner: Arc<Mutex<Option<String>>>,
}

impl LatestEstimateUrl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<String> {
        self.inner.lock().ok().and_then(|guard| guard.clone())
    }

    pub fn set(&self, url: impl Into<String>) {
        if let Ok(mut guard) = self.inner.lock() {
            *guard = Some(url.into());
        }
    }

    /// 接收廣播訊息；格式不符時忽略
    pub fn accept_message(&self, json: &str) -> bool {
        match EstimateUrlMessage::parse(json) {
            Some(message) => {
                tracing::debug!("Updated latest estimate URL from message: {}", message.url);
                self.set(message.url);
                true
            }
            None => false,
        }
    }
}

impl UrlSink for LatestEstimateUrl {
    fn replace_url(&self, url: &str) -> Result<()> {
        self.set(url);
        Ok(())
    }
}

/// Writes one JSON broadcast message per canonical URL to a writer.
pub struct BroadcastSink<W: std::io::Write + Send> {
    writer: Mutex<W>,
}

impl<W: std::io::Write + Send> BroadcastSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        match self.writer.into_inner() {
            Ok(w) => w,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: std::io::Write + Send> UrlSink for BroadcastSink<W> {
    fn replace_url(&self, url: &str) -> Result<()> {
        let line = serde_json::to_string(&EstimateUrlMessage::new(url))?;
        let mut writer = match self.writer.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        writeln!(writer, "{}", line)?;
        writer.flush()?;
        Ok(())
    }
}

/// Debounced URL writer running on the tokio runtime.
pub struct UrlSync {
    tx: mpsc::UnboundedSender<String>,
    task: JoinHandle<()>,
}

impl UrlSync {
    pub fn spawn(sinks: Vec<Arc<dyn UrlSink>>, debounce: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_url_sync(rx, sinks, debounce));
        Self { tx, task }
    }

    pub fn schedule(&self, url: String) {
        if self.tx.send(url).is_err() {
            tracing::debug!("URL sync task already stopped");
        }
    }

    /// Flushes any pending URL and waits for the task to finish.
    pub async fn shutdown(self) {
        drop(self.tx);
        if let Err(e) = self.task.await {
            tracing::warn!("URL sync task ended abnormally: {}", e);
        }
    }
}

async fn run_url_sync(
    mut rx: mpsc::UnboundedReceiver<String>,
    sinks: Vec<Arc<dyn UrlSink>>,
    debounce: Duration,
) {
    while let Some(mut latest) = rx.recv().await {
        let mut closed = false;
        // 在靜默期間持續合併新的 URL
        loop {
            match tokio::time::timeout(debounce, rx.recv()).await {
                Ok(Some(next)) => latest = next,
                Ok(None) => {
                    closed = true;
                    break;
                }
                Err(_) => break,
            }
        }

        for sink in &sinks {
            if let Err(e) = sink.replace_url(&latest) {
                tracing::warn!("Failed to write estimate URL: {}", e);
            }
        }

        if closed {
            return;
        }
    }
}

pub struct EstimatorState {
    base_url: Option<Url>,
    params: EstimateParams,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_id: SubscriptionId,
    sync: Option<UrlSync>,
}

impl EstimatorState {
    pub fn new(params: EstimateParams) -> Self {
        Self {
            base_url: None,
            params,
            subscribers: Vec::new(),
            next_id: 0,
            sync: None,
        }
    }

    pub fn from_url(url: Url) -> Self {
        let params = normalize_params(&read_params_from_url(&url));
        let mut state = Self::new(params);
        state.base_url = Some(url);
        state
    }

    /// Full estimator URL or bare query string.
    pub fn from_source(source: &str) -> Result<Self> {
        let (url, raw) = parse_estimate_source(source)?;
        Ok(match url {
            Some(url) => Self::from_url(url),
            None => Self::new(normalize_params(&raw)),
        })
    }

    /// Attaches URL write-back and immediately schedules the canonical URL.
    pub fn with_url_sync(mut self, sync: UrlSync) -> Self {
        sync.schedule(self.current_url());
        self.sync = Some(sync);
        self
    }

    pub fn params(&self) -> EstimateParams {
        self.params.clone()
    }

    pub fn search(&self) -> String {
        build_search_from_params(&self.params)
    }

    /// Canonical URL for the current params (`?query` when no base URL).
    pub fn current_url(&self) -> String {
        match &self.base_url {
            Some(base) => {
                let mut url = base.clone();
                apply_params_to_url(&mut url, &self.params);
                url.to_string()
            }
            None => {
                let search = self.search();
                if search.is_empty() {
                    String::new()
                } else {
                    format!("?{}", search)
                }
            }
        }
    }

    /// Merges raw key/value pairs into the current params. Returns `false`
    /// (and does nothing) when the normalized result is unchanged.
    pub fn update<I, K, V>(&mut self, partial: I) -> bool
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut raw = params_to_raw(&self.params);
        for (key, value) in partial {
            raw.insert(key.into(), value.into());
        }
        let next = normalize_params(&raw);
        if next == self.params {
            return false;
        }

        self.params = next;
        self.notify();
        if let Some(sync) = &self.sync {
            sync.schedule(self.current_url());
        }
        true
    }

    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: Fn(&EstimateParams) + Send + Sync + 'static,
    {
        let id = self.next_id;
        self.next_id += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub_id, _)| *sub_id != id);
        self.subscribers.len() != before
    }

    fn notify(&self) {
        let snapshot = self.params.clone();
        for (id, subscriber) in &self.subscribers {
            // 單一訂閱者失敗不影響狀態更新
            if panic::catch_unwind(AssertUnwindSafe(|| subscriber(&snapshot))).is_err() {
                tracing::warn!("Subscriber {} panicked during state update", id);
            }
        }
    }

    /// Flushes pending URL writes.
    pub async fn close(mut self) {
        if let Some(sync) = self.sync.take() {
            sync.shutdown().await;
        }
    }
}
