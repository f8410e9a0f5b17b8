//! The lifecycle recorder
//!
//! One `Recorder` instance serves the whole process: it owns the pipeline
//! configuration, the shared append log, and the process-lifetime fault
//! fingerprint set. Per-request state lives in `CaptureState`, created at
//! route-match and consumed at handled time.
//!
//! Failure policy: the recorder sits inside the host's request path, so
//! nothing here may propagate. Storage faults are attempted once, logged,
//! and swallowed; fault recording swallows its own failures outright.

use crate::excerpt;
use crate::hooks::{FaultReport, QueryExecution, RequestSnapshot, ResponseSnapshot};
use crate::memory;
use crate::state::CaptureState;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use traceflow_core::{
    classify, is_excluded_query, mask, mask_sql_bindings, summarize, PipelineConfig,
};
use traceflow_core_types::{AuthPrincipal, Event, EventKind, Level, TraceContext, TraceId};
use traceflow_store::{AppendLog, JsonlSink};

/// Process-wide entry point for the capture lifecycle
pub struct Recorder {
    config: PipelineConfig,
    log: Arc<AppendLog>,
    seen_faults: Mutex<HashSet<String>>,
}

impl Recorder {
    /// Create a recorder with its own append log at the configured path
    pub fn new(config: PipelineConfig) -> Self {
        let sink = JsonlSink::new(&config.log_path);
        let log = Arc::new(AppendLog::new(sink, config.buffer_capacity));
        Self::with_log(config, log)
    }

    /// Create a recorder around an existing shared append log
    pub fn with_log(config: PipelineConfig, log: Arc<AppendLog>) -> Self {
        Self {
            config,
            log,
            seen_faults: Mutex::new(HashSet::new()),
        }
    }

    /// The shared append log this recorder writes through
    pub fn append_log(&self) -> &Arc<AppendLog> {
        &self.log
    }

    /// Route matched: mint the trace id and park the masked request record
    ///
    /// Nothing is persisted yet; the record rides in the returned state
    /// until the request completes.
    pub fn route_matched(&self, request: &RequestSnapshot) -> CaptureState {
        let mut trace = TraceContext::new();
        trace.generate();

        let context = self.request_context(request);
        CaptureState::new(trace, context)
    }

    /// Query executed: append a masked query record to the request's state
    ///
    /// Queries against the excluded operational tables are dropped whole —
    /// no record, no event — so the pipeline never observes its own
    /// storage churn.
    pub fn query_executed(&self, state: &mut CaptureState, query: &QueryExecution) {
        if is_excluded_query(&query.sql, &self.config.excluded_tables) {
            return;
        }

        let bindings = mask_sql_bindings(
            &query.sql,
            &query.bindings,
            &self.config.sensitive_keys,
            &self.config.mask_token,
        );

        state.queries.push(json!({
            "sql": query.sql,
            "bindings": bindings,
            "duration": query.duration_ms,
            "connection": query.connection,
        }));
    }

    /// Fault reported: build and park the fault record, once per fingerprint
    ///
    /// The fingerprint set spans the process lifetime, so a fault storm of
    /// one repeated failure yields a single exception event. Never raises.
    pub fn fault_reported(&self, state: &mut CaptureState, fault: &FaultReport) {
        let fingerprint = fault_fingerprint(fault);

        {
            let mut seen = self.seen_faults.lock().unwrap_or_else(|e| e.into_inner());
            if !seen.insert(fingerprint) {
                return;
            }
        }

        state.fault = Some(excerpt::fault_context(fault));
    }

    /// Request handled: assemble and persist the lifecycle batch
    ///
    /// Returns the trace id for the adapter to set as the response header.
    /// When routing never completed (`state` is `None`) a request record is
    /// synthesized from the raw snapshot so no request yields zero events.
    /// The hand-off buffers and flushes to the local file only — it never
    /// blocks the response on the network.
    pub fn request_handled(
        &self,
        state: Option<CaptureState>,
        request: &RequestSnapshot,
        response: &ResponseSnapshot,
        auth: Option<AuthPrincipal>,
    ) -> TraceId {
        let (mut state, duration_ms) = match state {
            Some(state) => {
                let elapsed = state.started_at.elapsed().as_secs_f64() * 1000.0;
                let rounded = (elapsed * 100.0).round() / 100.0;
                (state, Some(rounded))
            }
            // Routing never completed: synthesize the request record now
            None => (self.route_matched(request), None),
        };

        let trace_id = state.trace.get();
        let level = Level::from_status(response.status);

        let classification = classify(response.content_type.as_deref(), response.is_redirect);
        let summary = summarize(
            &response.body,
            &classification,
            self.config.max_content_length,
        );

        let response_context = json!({
            "status": response.status,
            "duration_ms": duration_ms,
            "type": classification,
            "memory": memory::resident_mb(),
            "headers": self.masked(&response.headers),
            "response": summary,
        });

        let mut events = Vec::with_capacity(4);
        events.push(Event::new(
            trace_id.clone(),
            EventKind::Request,
            level,
            auth.clone(),
            state.request_context,
        ));
        if let Some(fault_context) = state.fault.take() {
            events.push(Event::new(
                trace_id.clone(),
                EventKind::Exception,
                Level::Error,
                auth.clone(),
                fault_context,
            ));
        }
        if !state.queries.is_empty() {
            events.push(Event::new(
                trace_id.clone(),
                EventKind::Query,
                level,
                auth.clone(),
                Value::Array(std::mem::take(&mut state.queries)),
            ));
        }
        events.push(Event::new(
            trace_id.clone(),
            EventKind::Response,
            level,
            auth,
            response_context,
        ));

        tracing::debug!(
            trace_id = %trace_id,
            status = response.status,
            level = level.as_str(),
            events = events.len(),
            "lifecycle batch assembled"
        );

        // Attempted once; a storage fault must not fail the host request
        if let Err(err) = self.log.add_batch(events) {
            tracing::warn!(error = %err, "lifecycle batch could not be persisted");
        }

        trace_id
    }

    /// Drop all remembered fault fingerprints
    ///
    /// The set spans the process lifetime by default; long-lived hosts can
    /// bound its growth at their own boundary.
    pub fn clear_fault_fingerprints(&self) {
        self.seen_faults
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    fn request_context(&self, request: &RequestSnapshot) -> Value {
        json!({
            "uri": request.uri,
            "method": request.method,
            "action": request.action,
            "middleware": request.middleware,
            "session": self.masked(&request.session),
            "memory": memory::resident_mb(),
            "params": self.masked(&request.params),
            "headers": self.masked(&request.headers),
            "payload": self.masked(&request.payload),
        })
    }

    fn masked(&self, data: &Value) -> Value {
        mask(data, &self.config.sensitive_keys, &self.config.mask_token)
    }
}

fn fault_fingerprint(fault: &FaultReport) -> String {
    let mut hasher = Sha256::new();
    hasher.update(fault.kind.as_bytes());
    hasher.update(b"|");
    hasher.update(fault.file.as_bytes());
    hasher.update(b"|");
    hasher.update(fault.line.to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(fault.message.as_bytes());
    hex::encode(hasher.finalize())
}
