//! Scan sessions
//!
//! One `ScanSession` per scan holds everything that belongs to it: the
//! router, the latest snapshot, the reasoning timers and, once the stream
//! completes, the generated tree. Replacing or dropping the session is the
//! only way to cancel a scan, so nothing from an old scan can reach the view.

use crate::component::UiComponent;
use crate::engine::{EngineError, GenerativeEngine};
use crate::router::{ActivePath, RouteError, RouteState, TypeRouter};
use crate::schedule::Scheduler;
use crate::schema::{PartialAnalysis, UserProfile, Variant};
use crate::stream::{ScanRequest, StreamError};
use serde_json::Value;
use std::fmt;
use std::time::{Duration, Instant};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScanId(u64);

impl ScanId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ScanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scan-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Snapshot { seq: u64, value: Value },
    Completed,
    Failed(StreamError),
}

/// A stream event stamped with the scan it belongs to
#[derive(Debug, Clone, PartialEq)]
pub struct StreamMessage {
    pub scan: ScanId,
    pub event: StreamEvent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStatus {
    Streaming,
    Complete,
    Failed,
}

/// Outcome of applying one message
#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    /// Belongs to a scan that is no longer current, or arrived after the
    /// scan ended
    Stale,
    /// Not newer than the snapshot already shown
    OutOfOrder,
    Rejected(RouteError),
    Updated(RouteState),
    Completed { tree: bool },
    Failed(StreamError),
}

fn reasoning_steps(profile: UserProfile) -> Vec<(Duration, String)> {
    vec![
        (Duration::ZERO, "Reading the label".to_string()),
        (
            Duration::from_millis(700),
            format!("Checking ingredients for {}", profile.focus()),
        ),
        (Duration::from_millis(1500), "Weighing the risks".to_string()),
        (Duration::from_millis(2400), "Drafting the verdict".to_string()),
    ]
}

#[derive(Debug)]
pub struct ScanSession {
    id: ScanId,
    request_id: Uuid,
    profile: UserProfile,
    subject: String,
    router: TypeRouter,
    snapshot: PartialAnalysis,
    last_seq: u64,
    reasoning: Scheduler<String>,
    reasoning_log: Vec<String>,
    status: ScanStatus,
    tree: Option<Vec<UiComponent>>,
    error: Option<StreamError>,
}

impl ScanSession {
    fn new(id: ScanId, request: &ScanRequest, now: Instant) -> Self {
        let mut reasoning = Scheduler::new();
        for (offset, line) in reasoning_steps(request.profile) {
            reasoning.schedule(now + offset, line);
        }
        Self {
            id,
            request_id: request.id,
            profile: request.profile,
            subject: request.input.describe(),
            router: TypeRouter::new(),
            snapshot: PartialAnalysis::Pending,
            last_seq: 0,
            reasoning,
            reasoning_log: Vec::new(),
            status: ScanStatus::Streaming,
            tree: None,
            error: None,
        }
    }

    fn teardown(&mut self) {
        let cancelled = self.reasoning.cancel_all();
        tracing::debug!(scan = %self.id, cancelled, "scan torn down");
    }

    pub fn id(&self) -> ScanId {
        self.id
    }

    pub fn profile(&self) -> UserProfile {
        self.profile
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn router(&self) -> &TypeRouter {
        &self.router
    }

    pub fn snapshot(&self) -> &PartialAnalysis {
        &self.snapshot
    }

    pub fn reasoning_log(&self) -> &[String] {
        &self.reasoning_log
    }

    pub fn pending_timers(&self) -> usize {
        self.reasoning.pending()
    }

    pub fn status(&self) -> ScanStatus {
        self.status
    }

    pub fn is_streaming(&self) -> bool {
        self.status == ScanStatus::Streaming
    }

    pub fn tree(&self) -> Option<&[UiComponent]> {
        self.tree.as_deref()
    }

    pub fn error(&self) -> Option<&StreamError> {
        self.error.as_ref()
    }

    /// An empty RISK list stays on its skeletons even once complete.
    pub fn active_path(&self) -> ActivePath {
        match &self.snapshot {
            PartialAnalysis::Risk(risk) if self.tree.is_some() && risk.items().is_empty() => {
                ActivePath::Partial(Variant::Risk)
            }
            _ => self.router.active_path(self.tree.is_some()),
        }
    }

    fn end(&mut self, status: ScanStatus) {
        self.status = status;
        self.router.finish();
        self.reasoning.cancel_all();
    }
}

/// Owns the current scan and applies stream messages to it
#[derive(Debug, Default)]
pub struct ScanController {
    engine: GenerativeEngine,
    next_id: u64,
    current: Option<ScanSession>,
}

impl ScanController {
    pub fn new(engine: GenerativeEngine) -> Self {
        Self {
            engine,
            next_id: 0,
            current: None,
        }
    }

    pub fn engine(&self) -> &GenerativeEngine {
        &self.engine
    }

    pub fn session(&self) -> Option<&ScanSession> {
        self.current.as_ref()
    }

    pub fn active_path(&self) -> ActivePath {
        self.current
            .as_ref()
            .map(ScanSession::active_path)
            .unwrap_or(ActivePath::Thinking)
    }

    /// Replace any running scan with a new one and return its id.
    pub fn start_scan(&mut self, request: &ScanRequest, now: Instant) -> ScanId {
        if let Some(mut previous) = self.current.take() {
            previous.teardown();
        }
        self.next_id += 1;
        let id = ScanId(self.next_id);
        tracing::info!(
            scan = %id,
            request = %request.id,
            profile = %request.profile,
            subject = %request.input.describe(),
            "scan started"
        );
        self.current = Some(ScanSession::new(id, request, now));
        id
    }

    /// Discard the current scan.
    pub fn reset(&mut self) {
        if let Some(mut previous) = self.current.take() {
            previous.teardown();
            tracing::info!(scan = %previous.id, "scan reset");
        }
    }

    pub fn apply(&mut self, message: StreamMessage) -> Applied {
        let engine = &self.engine;
        let Some(session) = self.current.as_mut() else {
            return Applied::Stale;
        };
        if message.scan != session.id {
            tracing::debug!(stale = %message.scan, current = %session.id, "dropping message from old scan");
            return Applied::Stale;
        }
        if !session.is_streaming() {
            return Applied::Stale;
        }

        match message.event {
            StreamEvent::Snapshot { seq, value } => {
                if seq <= session.last_seq {
                    tracing::debug!(scan = %session.id, seq, last = session.last_seq, "out-of-order snapshot");
                    return Applied::OutOfOrder;
                }
                session.last_seq = seq;
                let snapshot = PartialAnalysis::from_value(&value);
                match session.router.observe(&snapshot) {
                    // Once committed, an untagged or unknown-tagged snapshot
                    // never replaces what is already on screen
                    Ok(route)
                        if session.router.committed().is_some()
                            && snapshot.variant().is_none() =>
                    {
                        tracing::debug!(
                            scan = %session.id,
                            request = %session.request_id,
                            seq,
                            "snapshot lost its type; keeping previous"
                        );
                        Applied::Updated(route)
                    }
                    Ok(route) => {
                        tracing::debug!(scan = %session.id, seq, route = ?route, "snapshot applied");
                        session.snapshot = snapshot;
                        Applied::Updated(route)
                    }
                    Err(err) => {
                        tracing::warn!(
                            scan = %session.id,
                            request = %session.request_id,
                            seq,
                            error = %err,
                            "snapshot rejected"
                        );
                        Applied::Rejected(err)
                    }
                }
            }
            StreamEvent::Completed => {
                session.end(ScanStatus::Complete);
                match engine.generate_snapshot(&session.snapshot, session.profile) {
                    Ok(tree) => {
                        tracing::info!(scan = %session.id, nodes = tree.len(), "scan complete");
                        session.tree = Some(tree);
                        Applied::Completed { tree: true }
                    }
                    Err(err) => {
                        log_incomplete(session.id, &err);
                        Applied::Completed { tree: false }
                    }
                }
            }
            StreamEvent::Failed(err) => {
                tracing::warn!(scan = %session.id, error = %err, "scan stream failed");
                session.end(ScanStatus::Failed);
                session.error = Some(err.clone());
                Applied::Failed(err)
            }
        }
    }

    /// Release reasoning lines that are due. Returns true if any were added.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(session) = self.current.as_mut() else {
            return false;
        };
        let due = session.reasoning.drain_due(now);
        let changed = !due.is_empty();
        session.reasoning_log.extend(due);
        changed
    }
}

fn log_incomplete(scan: ScanId, err: &EngineError) {
    tracing::warn!(scan = %scan, error = %err, "stream ended without a complete analysis; keeping partial view");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::ActivePath;
    use crate::schema::Variant;
    use crate::stream::ScanInput;
    use serde_json::json;

    fn request() -> ScanRequest {
        ScanRequest::new(ScanInput::Text("cola".into()), UserProfile::Diabetic)
    }

    fn snapshot(scan: ScanId, seq: u64, value: Value) -> StreamMessage {
        StreamMessage {
            scan,
            event: StreamEvent::Snapshot { seq, value },
        }
    }

    fn completed(scan: ScanId) -> StreamMessage {
        StreamMessage {
            scan,
            event: StreamEvent::Completed,
        }
    }

    #[test]
    fn test_messages_from_replaced_scan_are_dropped() {
        let now = Instant::now();
        let mut controller = ScanController::default();
        let first = controller.start_scan(&request(), now);
        let second = controller.start_scan(&request(), now);
        assert_ne!(first, second);

        let applied = controller.apply(snapshot(first, 1, json!({"type": "SAFE"})));
        assert_eq!(applied, Applied::Stale);
        assert_eq!(
            controller.session().unwrap().snapshot(),
            &PartialAnalysis::Pending
        );

        let applied = controller.apply(snapshot(second, 1, json!({"type": "RISK"})));
        assert_eq!(applied, Applied::Updated(RouteState::Streaming(Variant::Risk)));
    }

    #[test]
    fn test_older_snapshots_never_replace_newer() {
        let now = Instant::now();
        let mut controller = ScanController::default();
        let scan = controller.start_scan(&request(), now);

        controller.apply(snapshot(scan, 2, json!({"type": "SAFE", "summary": "newer"})));
        let applied = controller.apply(snapshot(scan, 1, json!({"type": "SAFE"})));
        assert_eq!(applied, Applied::OutOfOrder);

        match controller.session().unwrap().snapshot() {
            PartialAnalysis::Safe(safe) => assert_eq!(safe.summary.as_deref(), Some("newer")),
            other => panic!("expected SAFE, got {:?}", other),
        }
    }

    #[test]
    fn test_variant_flip_keeps_previous_snapshot() {
        let now = Instant::now();
        let mut controller = ScanController::default();
        let scan = controller.start_scan(&request(), now);
        controller.apply(snapshot(scan, 1, json!({"type": "SAFE", "summary": "ok"})));

        let applied = controller.apply(snapshot(scan, 2, json!({"type": "RISK"})));
        assert!(matches!(applied, Applied::Rejected(RouteError::VariantChanged { .. })));
        assert_eq!(
            controller.session().unwrap().snapshot().variant(),
            Some(Variant::Safe)
        );
    }

    #[test]
    fn test_committed_scan_ignores_untagged_and_unknown_snapshots() {
        let now = Instant::now();
        let mut controller = ScanController::default();
        let scan = controller.start_scan(&request(), now);
        controller.apply(snapshot(
            scan,
            1,
            json!({"type": "RISK", "headline": "Careful sugar"}),
        ));

        let applied = controller.apply(snapshot(scan, 2, json!({"type": "RISKY", "headline": "x"})));
        assert_eq!(applied, Applied::Updated(RouteState::Streaming(Variant::Risk)));
        let applied = controller.apply(snapshot(scan, 3, json!({"headline": "y"})));
        assert_eq!(applied, Applied::Updated(RouteState::Streaming(Variant::Risk)));

        match controller.session().unwrap().snapshot() {
            PartialAnalysis::Risk(risk) => assert_eq!(risk.headline.as_deref(), Some("Careful sugar")),
            other => panic!("expected RISK, got {:?}", other),
        }
        // Older seqs stay rejected after the skipped ones
        assert_eq!(
            controller.apply(snapshot(scan, 3, json!({"type": "RISK"}))),
            Applied::OutOfOrder
        );

        controller.apply(snapshot(
            scan,
            4,
            json!({"type": "RISK", "headline": "Careful sugar", "riskHierarchy": [
                {"ingredient": "Sucrose", "severity": "high", "reason": "Added sugar"}
            ]}),
        ));
        assert_eq!(controller.apply(completed(scan)), Applied::Completed { tree: true });
        assert_eq!(controller.active_path(), ActivePath::Tree);
    }

    #[test]
    fn test_complete_empty_risk_stays_on_partial_path() {
        let now = Instant::now();
        let mut controller = ScanController::default();
        let scan = controller.start_scan(&request(), now);
        controller.apply(snapshot(
            scan,
            1,
            json!({"type": "RISK", "headline": "Nothing listed", "riskHierarchy": []}),
        ));
        assert_eq!(controller.apply(completed(scan)), Applied::Completed { tree: true });
        assert_eq!(controller.active_path(), ActivePath::Partial(Variant::Risk));
    }

    #[test]
    fn test_completion_generates_tree() {
        let now = Instant::now();
        let mut controller = ScanController::default();
        let scan = controller.start_scan(&request(), now);
        controller.apply(snapshot(
            scan,
            1,
            json!({"type": "DECISION", "question": "Q?", "options": ["A", "B"]}),
        ));
        assert_eq!(controller.apply(completed(scan)), Applied::Completed { tree: true });

        let session = controller.session().unwrap();
        assert_eq!(session.status(), ScanStatus::Complete);
        assert_eq!(session.tree().map(<[UiComponent]>::len), Some(2));
        assert_eq!(controller.active_path(), ActivePath::Tree);

        // Nothing applies after the end
        assert_eq!(
            controller.apply(snapshot(scan, 5, json!({"type": "DECISION"}))),
            Applied::Stale
        );
    }

    #[test]
    fn test_incomplete_completion_keeps_partial_path() {
        let now = Instant::now();
        let mut controller = ScanController::default();
        let scan = controller.start_scan(&request(), now);
        controller.apply(snapshot(scan, 1, json!({"type": "RISK", "headline": "h"})));
        assert_eq!(controller.apply(completed(scan)), Applied::Completed { tree: false });
        assert_eq!(controller.active_path(), ActivePath::Partial(Variant::Risk));
    }

    #[test]
    fn test_failure_is_reported_and_ends_scan() {
        let now = Instant::now();
        let mut controller = ScanController::default();
        let scan = controller.start_scan(&request(), now);
        let err = StreamError::transport("boom");
        let applied = controller.apply(StreamMessage {
            scan,
            event: StreamEvent::Failed(err.clone()),
        });
        assert_eq!(applied, Applied::Failed(err.clone()));
        let session = controller.session().unwrap();
        assert_eq!(session.status(), ScanStatus::Failed);
        assert_eq!(session.error(), Some(&err));
        assert_eq!(session.pending_timers(), 0);
    }

    #[test]
    fn test_reasoning_lines_release_over_time() {
        let now = Instant::now();
        let mut controller = ScanController::default();
        controller.start_scan(&request(), now);

        assert!(controller.tick(now));
        assert_eq!(controller.session().unwrap().reasoning_log().len(), 1);

        assert!(!controller.tick(now + Duration::from_millis(100)));
        assert!(controller.tick(now + Duration::from_secs(3)));
        let log = controller.session().unwrap().reasoning_log();
        assert_eq!(log.len(), 4);
        assert!(log[1].contains("sugars"));
    }

    #[test]
    fn test_restart_cancels_previous_timers() {
        let now = Instant::now();
        let mut controller = ScanController::default();
        controller.start_scan(&request(), now);
        controller.tick(now);

        let later = now + Duration::from_secs(10);
        controller.start_scan(&request(), later);
        // Only the new scan's first line is due; the old scan's backlog is gone
        controller.tick(later);
        assert_eq!(controller.session().unwrap().reasoning_log().len(), 1);

        controller.reset();
        assert!(controller.session().is_none());
        assert!(!controller.tick(later + Duration::from_secs(10)));
        assert_eq!(controller.active_path(), ActivePath::Thinking);
    }
}
