//! Per-document check session.
//!
//! [`CheckSession`] is the coordination engine's public surface: it owns the
//! producers registered for one document, their lifecycle states, the
//! diagnostic aggregator, and the scheduler, and it exposes the host-facing
//! entry points (`on_text_changed`, `on_saved`, `tick`, …) plus the consumer
//! interface (`current_diagnostics`, `counts`, `navigate`).
//!
//! # Control loop contract
//!
//! All state transitions happen on the host's control loop. Producers may do
//! their work on threads or external processes, but their reports travel
//! through a queue that the host drains with [`CheckSession::pump`]; nothing
//! races, and no locks are needed. The host is expected to call:
//!
//! - [`CheckSession::pump`] regularly (applies queued producer reports),
//! - [`CheckSession::tick`] from its periodic timer (debounced start),
//! - [`CheckSession::drain_deferred`] at the end of its current operation.
//!
//! # Failure containment
//!
//! A producer that fails during invocation — an error return, a caught panic,
//! an explicit panic report, or a protocol violation — is disabled for the
//! rest of the session and its partition is cleared. Other producers and
//! pending reports are unaffected. The only failure surfaced to the caller is
//! [`SessionError::NoProducersAvailable`] when enabling with nothing
//! registered.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Instant;

use thiserror::Error;

use crate::aggregate::DiagnosticAggregator;
use crate::diagnostics::{Diagnostic, DocumentId, ProducerId};
use crate::lifecycle::{self, Lifecycle, ProducerState, ReportDisposition};
use crate::producer::{CheckContext, Producer, Report, ReportEnvelope, ReportSink, WillCheck};
use crate::region::RegionResolver;
use crate::registry::{TypeKey, TypeRegistry};
use crate::schedule::{CheckScheduler, ScheduleConfig};
use crate::snapshot::DocumentSnapshot;

/// Errors from session-level operations.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    /// Enabling was requested with no producers registered; checking does not
    /// activate for the document.
    #[error("no diagnostic producers are available for this document")]
    NoProducersAvailable,
}

/// Navigation direction for [`CheckSession::navigate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Towards larger range starts, wrapping to the first diagnostic.
    Next,
    /// Towards smaller range starts, wrapping to the last diagnostic.
    Prev,
}

/// Events emitted to session subscribers.
#[derive(Debug, Clone)]
pub enum CheckEvent {
    /// A check cycle started; `started` producers were invoked.
    CycleStarted {
        /// Number of producers that accepted the invocation this cycle.
        started: usize,
    },
    /// A producer delivered its terminal report for the cycle.
    ///
    /// `reported == 0` indicates a clean cycle for that producer.
    ProducerFinished {
        /// The reporting producer.
        producer: ProducerId,
        /// Number of diagnostics in the accepted report.
        reported: usize,
    },
    /// A producer was disabled for the rest of the session.
    ProducerDisabled {
        /// The disabled producer.
        producer: ProducerId,
        /// Why it was disabled.
        explanation: String,
    },
    /// The merged counts changed.
    DiagnosticsChanged {
        /// Error-class diagnostics currently valid.
        errors: usize,
        /// All other diagnostics currently valid.
        others: usize,
    },
}

/// Subscriber callback for [`CheckEvent`]s.
pub type CheckEventCallback = Box<dyn FnMut(&CheckEvent) + Send>;

/// Compact session overview for status-line style consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusSummary {
    /// Whether checking is enabled for the document.
    pub enabled: bool,
    /// Error-class diagnostic count.
    pub errors: usize,
    /// Other diagnostic count.
    pub others: usize,
    /// Producers currently running.
    pub running: usize,
    /// Producers disabled for the session.
    pub disabled: usize,
}

impl fmt::Display for StatusSummary {
    /// Renders `[errors/others]`, with a trailing `*` while producers are
    /// still running, or `[-]` when checking is disabled.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.enabled {
            return f.write_str("[-]");
        }
        write!(f, "[{}/{}]", self.errors, self.others)?;
        if self.running > 0 {
            f.write_str("*")?;
        }
        Ok(())
    }
}

struct ProducerSlot {
    name: String,
    producer: Box<dyn Producer>,
    state: ProducerState,
}

/// Coordinates diagnostic producers for one document.
pub struct CheckSession {
    document: DocumentId,
    snapshot: DocumentSnapshot,
    registry: Arc<TypeRegistry>,
    resolver: Arc<RegionResolver>,
    producers: Vec<ProducerSlot>,
    aggregator: DiagnosticAggregator,
    scheduler: CheckScheduler,
    enabled: bool,
    tx: Sender<ReportEnvelope>,
    rx: Receiver<ReportEnvelope>,
    callbacks: Vec<CheckEventCallback>,
}

impl CheckSession {
    /// Create a session for `document`. Checking starts disabled.
    pub fn new(document: DocumentId, registry: Arc<TypeRegistry>, config: ScheduleConfig) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            document,
            snapshot: DocumentSnapshot::new(),
            registry,
            resolver: Arc::new(RegionResolver::new()),
            producers: Vec::new(),
            aggregator: DiagnosticAggregator::new(),
            scheduler: CheckScheduler::new(config),
            enabled: false,
            tx,
            rx,
            callbacks: Vec::new(),
        }
    }

    /// Replace the region resolver (e.g. to install a language-aware
    /// [`crate::TokenScanner`]).
    pub fn with_resolver(mut self, resolver: RegionResolver) -> Self {
        self.resolver = Arc::new(resolver);
        self
    }

    /// Register a producer. Its id reflects registration order.
    pub fn register_producer(&mut self, producer: Box<dyn Producer>) -> ProducerId {
        let id = ProducerId::new(self.producers.len() as u32);
        let name = producer.name().to_string();
        tracing::debug!(producer = %name, id = id.get(), "check.register");
        self.producers.push(ProducerSlot {
            name,
            producer,
            state: ProducerState::new(),
        });
        id
    }

    /// Subscribe to session events.
    pub fn subscribe(&mut self, callback: CheckEventCallback) {
        self.callbacks.push(callback);
    }

    /// Replace the session's document snapshot with the current text.
    ///
    /// The host calls this whenever the document content changes;
    /// [`CheckSession::on_text_changed`] separately records the change for
    /// scheduling.
    pub fn sync_text(&mut self, text: &str) {
        self.snapshot = DocumentSnapshot::from_text(text);
    }

    /// The snapshot producers will be invoked against.
    pub fn snapshot(&self) -> &DocumentSnapshot {
        &self.snapshot
    }

    /// The document this session coordinates.
    pub fn document(&self) -> DocumentId {
        self.document
    }

    /// The shared type registry.
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// The session's timing state.
    pub fn scheduler(&self) -> &CheckScheduler {
        &self.scheduler
    }

    /// Whether checking is enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Lifecycle state of one producer.
    pub fn producer_state(&self, producer: ProducerId) -> Option<&ProducerState> {
        self.producers.get(producer.index()).map(|slot| &slot.state)
    }

    /// Iterate all producers with their lifecycle states.
    pub fn producer_states(&self) -> impl Iterator<Item = (ProducerId, &ProducerState)> {
        self.producers
            .iter()
            .enumerate()
            .map(|(index, slot)| (ProducerId::new(index as u32), &slot.state))
    }

    // ---------------------------------------------------------------------
    // Host-triggered entry points
    // ---------------------------------------------------------------------

    /// Enable checking for the document.
    ///
    /// Resets every producer to idle (clearing previous disablements) and
    /// queues a deferred first check, drained by the host via
    /// [`CheckSession::drain_deferred`].
    pub fn enable(&mut self) -> Result<(), SessionError> {
        if self.producers.is_empty() {
            return Err(SessionError::NoProducersAvailable);
        }
        for slot in &mut self.producers {
            slot.state.reset();
        }
        self.aggregator.clear_all();
        self.scheduler.reset();
        self.enabled = true;
        self.scheduler.defer();
        tracing::debug!(document = self.document.get(), "check.enable");
        Ok(())
    }

    /// Disable checking: reset all producer states, drop timing state, clear
    /// the aggregator, and discard queued reports.
    ///
    /// A report from an invocation that was in flight when checking was
    /// disabled is rejected as unexpected if it arrives after a re-enable.
    pub fn disable(&mut self) {
        self.enabled = false;
        for slot in &mut self.producers {
            slot.state.reset();
        }
        self.scheduler.reset();
        self.aggregator.clear_all();
        while self.rx.try_recv().is_ok() {}
        tracing::debug!(document = self.document.get(), "check.disable_mode");
        self.emit_counts();
    }

    /// The document changed. Restarts the quiescence window; a newline
    /// insertion additionally queues a deferred check.
    pub fn on_text_changed(&mut self, is_newline_inserted: bool) {
        if !self.enabled {
            return;
        }
        self.scheduler.note_change(Instant::now());
        if is_newline_inserted {
            self.schedule(true);
        }
    }

    /// The document was saved: start a check cycle immediately.
    pub fn on_saved(&mut self) {
        if self.enabled {
            self.schedule(false);
        }
    }

    /// The document was closed: tear the session down.
    pub fn on_closed(&mut self) {
        self.disable();
    }

    /// Periodic timer entry point: starts a cycle when the document has been
    /// quiet for the configured window.
    pub fn tick(&mut self) {
        if self.enabled && self.scheduler.due(Instant::now()) {
            self.start_cycle();
        }
    }

    /// Drain a pending deferred start. The host calls this at the end of its
    /// current operation.
    pub fn drain_deferred(&mut self) {
        if self.scheduler.take_deferred() && self.enabled {
            self.start_cycle();
        }
    }

    /// Request a check cycle, either immediately or deferred until the host's
    /// current operation completes. Deferring while a deferred start is
    /// already pending is a no-op.
    pub fn schedule(&mut self, deferred: bool) {
        if !self.enabled {
            return;
        }
        if deferred {
            if !self.scheduler.defer() {
                tracing::trace!("check.schedule: deferred start already pending");
            }
        } else {
            self.start_cycle();
        }
    }

    /// Apply queued producer reports on the control loop. Returns the number
    /// of reports handled.
    pub fn pump(&mut self) -> usize {
        let mut batch = Vec::new();
        while let Ok(envelope) = self.rx.try_recv() {
            batch.push(envelope);
        }
        let handled = batch.len();
        for envelope in batch {
            self.handle_report(envelope.producer, envelope.report);
        }
        handled
    }

    /// Validate and route one report.
    ///
    /// Reports are normally delivered through [`CheckSession::pump`]; this is
    /// public so hosts with their own delivery mechanism (and tests) can feed
    /// reports directly.
    pub fn handle_report(&mut self, producer: ProducerId, report: Report) {
        let Some(slot) = self.producers.get_mut(producer.index()) else {
            tracing::warn!(producer = producer.get(), "check.report: unknown producer");
            return;
        };
        let name = slot.name.clone();
        let disposition = lifecycle::apply_report(&mut slot.state, self.document, report);
        match disposition {
            ReportDisposition::Unexpected => {
                tracing::warn!(producer = %name, "check.report: unexpected report, producer is not running");
            }
            ReportDisposition::Progress(explanation) => {
                tracing::debug!(
                    producer = %name,
                    explanation = explanation.as_deref().unwrap_or(""),
                    "check.report: progress"
                );
            }
            ReportDisposition::Disable { explanation } => {
                self.disable_producer(producer, explanation);
            }
            ReportDisposition::Accept(diagnostics) => {
                let reported = diagnostics.len();
                self.aggregator.replace_partition(producer, diagnostics);
                tracing::debug!(producer = %name, reported, "check.report: final");
                self.emit(CheckEvent::ProducerFinished { producer, reported });
                self.emit_counts();
            }
        }
    }

    // ---------------------------------------------------------------------
    // Consumer interface
    // ---------------------------------------------------------------------

    /// All currently valid diagnostics, in the aggregator's stable order.
    pub fn current_diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.aggregator.all(&self.registry)
    }

    /// `(error_class, other)` counts across all partitions.
    pub fn counts(&self) -> (usize, usize) {
        self.aggregator.counts(&self.registry)
    }

    /// Compact overview for status indicators.
    pub fn status(&self) -> StatusSummary {
        let (errors, others) = self.counts();
        let mut running = 0;
        let mut disabled = 0;
        for slot in &self.producers {
            match slot.state.lifecycle() {
                Lifecycle::Running => running += 1,
                Lifecycle::Disabled => disabled += 1,
                Lifecycle::Idle => {}
            }
        }
        StatusSummary {
            enabled: self.enabled,
            errors,
            others,
            running,
            disabled,
        }
    }

    /// Next or previous diagnostic by range start relative to `cursor`
    /// (a char offset), wrapping around, optionally filtered to a set of
    /// type keys.
    pub fn navigate(
        &self,
        direction: Direction,
        cursor: usize,
        type_filter: Option<&[TypeKey]>,
    ) -> Option<&Diagnostic> {
        let ordered: Vec<&Diagnostic> = self
            .current_diagnostics()
            .filter(|d| match type_filter {
                Some(keys) => keys.iter().any(|key| key == d.type_key()),
                None => true,
            })
            .collect();
        if ordered.is_empty() {
            return None;
        }
        match direction {
            Direction::Next => ordered
                .iter()
                .find(|d| d.begin() > cursor)
                .copied()
                .or_else(|| ordered.first().copied()),
            Direction::Prev => ordered
                .iter()
                .rev()
                .find(|d| d.begin() < cursor)
                .copied()
                .or_else(|| ordered.last().copied()),
        }
    }

    // ---------------------------------------------------------------------
    // Cycle driving
    // ---------------------------------------------------------------------

    fn start_cycle(&mut self) {
        self.scheduler.note_start(Instant::now());
        let mut started = 0;
        for index in 0..self.producers.len() {
            let id = ProducerId::new(index as u32);
            match self.producers[index].state.lifecycle() {
                Lifecycle::Running => {
                    tracing::debug!(
                        producer = %self.producers[index].name,
                        "check.start: skipped, still running"
                    );
                    continue;
                }
                Lifecycle::Disabled => {
                    tracing::debug!(
                        producer = %self.producers[index].name,
                        "check.start: skipped, disabled"
                    );
                    continue;
                }
                Lifecycle::Idle => {}
            }

            let ctx = CheckContext {
                document: self.document,
                snapshot: self.snapshot.clone(),
                resolver: Arc::clone(&self.resolver),
                sink: ReportSink::new(id, self.tx.clone()),
            };
            let slot = &mut self.producers[index];
            slot.state.set_running();
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| slot.producer.check(ctx)));
            match outcome {
                Ok(Ok(WillCheck::Yes)) => {
                    started += 1;
                    tracing::trace!(producer = %slot.name, "check.start");
                }
                Ok(Ok(WillCheck::NotApplicable)) => {
                    slot.state.set_idle();
                    tracing::debug!(producer = %slot.name, "check.start: not applicable");
                }
                Ok(Err(error)) => {
                    self.disable_producer(id, error.to_string());
                }
                Err(payload) => {
                    self.disable_producer(id, panic_explanation(payload));
                }
            }
        }
        self.emit(CheckEvent::CycleStarted { started });
    }

    fn disable_producer(&mut self, producer: ProducerId, explanation: String) {
        if let Some(slot) = self.producers.get_mut(producer.index()) {
            tracing::error!(
                producer = %slot.name,
                explanation = %explanation,
                "check.disable"
            );
            slot.state.disable(explanation.clone());
        }
        self.aggregator.clear(producer);
        self.emit(CheckEvent::ProducerDisabled {
            producer,
            explanation,
        });
        self.emit_counts();
    }

    fn emit(&mut self, event: CheckEvent) {
        for callback in &mut self.callbacks {
            callback(&event);
        }
    }

    fn emit_counts(&mut self) {
        let (errors, others) = self.aggregator.counts(&self.registry);
        self.emit(CheckEvent::DiagnosticsChanged { errors, others });
    }
}

fn panic_explanation(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "producer panicked".to_string()
    }
}
