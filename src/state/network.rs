//! Network request projection.
//!
//! Aggregates the four `Network.*` lifecycle events into one record per
//! request id, kept in insertion order and capacity-bounded: when the table
//! exceeds `max_requests`, the insertion-oldest record is evicted.

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde::Serialize;
use serde_json::{Value, json};

use crate::identifiers::RequestId;
use crate::pattern::{MatchMode, UrlPattern};

// ============================================================================
// Constants
// ============================================================================

/// Default capacity of the request table.
pub(crate) const DEFAULT_MAX_REQUESTS: usize = 1000;

// ============================================================================
// RequestPhase
// ============================================================================

/// Lifecycle phase of a tracked request, derived from the record fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestPhase {
    /// No end time recorded yet.
    Pending,
    /// Finished loading.
    Completed,
    /// Failed or canceled.
    Failed,
}

// ============================================================================
// NetworkRequest
// ============================================================================

/// Per-request record aggregating the lifecycle events.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkRequest {
    /// Request identifier.
    pub request_id: RequestId,
    /// Request URL.
    pub url: String,
    /// HTTP method.
    pub method: String,
    /// Resource type (`Document`, `Script`, `XHR`, …).
    pub resource_type: String,
    /// Monotonic send timestamp.
    pub start_time: f64,
    /// Monotonic end timestamp, set by finish or failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<f64>,
    /// HTTP status code, once headers arrived.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// HTTP status text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_text: Option<String>,
    /// Response MIME type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Complete response payload, opaque.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
    /// Total encoded bytes received.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoded_data_length: Option<u64>,
    /// Whether the request failed.
    pub failed: bool,
    /// Failure description, when failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_text: Option<String>,
    /// Whether the request was canceled.
    pub canceled: bool,
}

impl NetworkRequest {
    /// Returns the derived lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> RequestPhase {
        if self.failed {
            RequestPhase::Failed
        } else if self.end_time.is_some() {
            RequestPhase::Completed
        } else {
            RequestPhase::Pending
        }
    }

    /// Returns the duration in seconds, once the request ended.
    #[must_use]
    pub fn duration(&self) -> Option<f64> {
        self.end_time.map(|end| end - self.start_time)
    }
}

// ============================================================================
// NetworkState
// ============================================================================

/// Network domain projection.
#[derive(Debug)]
pub struct NetworkState {
    inner: Mutex<Inner>,
}

#[derive(Debug)]
struct Inner {
    enabled: bool,
    max_requests: usize,
    /// Request ids in insertion order; the front is the eviction candidate.
    order: VecDeque<RequestId>,
    requests: FxHashMap<RequestId, NetworkRequest>,
}

impl Default for NetworkState {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REQUESTS)
    }
}

impl NetworkState {
    /// Creates a projection bounded at `max_requests` records.
    #[must_use]
    pub fn new(max_requests: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                enabled: false,
                max_requests: max_requests.max(1),
                order: VecDeque::new(),
                requests: FxHashMap::default(),
            }),
        }
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Mirrors the CDP domain enabled flag. Disabling clears the table.
    pub fn set_enabled(&self, enabled: bool) {
        let mut inner = self.inner.lock();
        inner.enabled = enabled;
        if !enabled {
            inner.order.clear();
            inner.requests.clear();
        }
    }

    /// Returns whether the domain is enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.inner.lock().enabled
    }

    /// Clears the table.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.order.clear();
        inner.requests.clear();
    }

    /// Clears the table and resets the enabled flag.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.order.clear();
        inner.requests.clear();
        inner.enabled = false;
    }

    // ========================================================================
    // Event Handlers
    // ========================================================================

    /// Records a `requestWillBeSent` event, evicting the oldest record when
    /// the table is full.
    pub fn on_request_will_be_sent(
        &self,
        request_id: RequestId,
        url: String,
        method: String,
        resource_type: String,
        timestamp: f64,
    ) {
        let mut inner = self.inner.lock();

        // Redirect chains re-announce the same id; keep its position.
        if !inner.requests.contains_key(&request_id) {
            inner.order.push_back(request_id.clone());
            if inner.order.len() > inner.max_requests
                && let Some(oldest) = inner.order.pop_front()
            {
                inner.requests.remove(&oldest);
            }
        }

        inner.requests.insert(
            request_id.clone(),
            NetworkRequest {
                request_id,
                url,
                method,
                resource_type,
                start_time: timestamp,
                end_time: None,
                status: None,
                status_text: None,
                mime_type: None,
                response: None,
                encoded_data_length: None,
                failed: false,
                error_text: None,
                canceled: false,
            },
        );
    }

    /// Patches a record with `responseReceived` fields.
    pub fn on_response_received(
        &self,
        request_id: &RequestId,
        status: u16,
        status_text: String,
        mime_type: String,
        response: Value,
    ) {
        let mut inner = self.inner.lock();
        if let Some(req) = inner.requests.get_mut(request_id) {
            req.status = Some(status);
            req.status_text = Some(status_text);
            req.mime_type = Some(mime_type);
            req.response = Some(response);
        }
    }

    /// Completes a record with `loadingFinished` fields.
    pub fn on_loading_finished(
        &self,
        request_id: &RequestId,
        timestamp: f64,
        encoded_data_length: u64,
    ) {
        let mut inner = self.inner.lock();
        if let Some(req) = inner.requests.get_mut(request_id) {
            req.end_time = Some(timestamp);
            req.encoded_data_length = Some(encoded_data_length);
        }
    }

    /// Marks a record failed with `loadingFailed` fields.
    pub fn on_loading_failed(
        &self,
        request_id: &RequestId,
        timestamp: f64,
        error_text: String,
        canceled: bool,
    ) {
        let mut inner = self.inner.lock();
        if let Some(req) = inner.requests.get_mut(request_id) {
            req.end_time = Some(timestamp);
            req.failed = true;
            req.error_text = Some(error_text);
            req.canceled = canceled;
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Returns all records in insertion order.
    #[must_use]
    pub fn get_all(&self) -> Vec<NetworkRequest> {
        let inner = self.inner.lock();
        inner
            .order
            .iter()
            .filter_map(|id| inner.requests.get(id))
            .cloned()
            .collect()
    }

    /// Returns records whose URL matches the pattern (substring semantics).
    #[must_use]
    pub fn get_by_url(&self, pattern: &str) -> Vec<NetworkRequest> {
        let matcher = UrlPattern::compile(pattern, MatchMode::Substring);
        self.get_all()
            .into_iter()
            .filter(|r| matcher.matches(&r.url))
            .collect()
    }

    /// Returns records of the given resource type.
    #[must_use]
    pub fn get_by_type(&self, resource_type: &str) -> Vec<NetworkRequest> {
        self.get_all()
            .into_iter()
            .filter(|r| r.resource_type.eq_ignore_ascii_case(resource_type))
            .collect()
    }

    /// Returns failed records.
    #[must_use]
    pub fn get_failed(&self) -> Vec<NetworkRequest> {
        self.get_all().into_iter().filter(|r| r.failed).collect()
    }

    /// Returns records that have neither finished nor failed.
    #[must_use]
    pub fn get_pending(&self) -> Vec<NetworkRequest> {
        self.get_all()
            .into_iter()
            .filter(|r| r.phase() == RequestPhase::Pending)
            .collect()
    }

    /// Returns one record by id.
    #[must_use]
    pub fn get(&self, request_id: &RequestId) -> Option<NetworkRequest> {
        self.inner.lock().requests.get(request_id).cloned()
    }

    /// Returns the number of tracked records.
    #[must_use]
    pub fn count(&self) -> usize {
        self.inner.lock().order.len()
    }

    /// Returns phase counts for tool output.
    #[must_use]
    pub fn get_summary(&self) -> Value {
        let all = self.get_all();
        let failed = all.iter().filter(|r| r.failed).count();
        let pending = all
            .iter()
            .filter(|r| r.phase() == RequestPhase::Pending)
            .count();

        json!({
            "total": all.len(),
            "pending": pending,
            "completed": all.len() - failed - pending,
            "failed": failed,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
