//! Producer contract and report channel.
//!
//! A producer is a pluggable source of diagnostics for a document. The
//! coordinator invokes it with a [`CheckContext`] carrying an immutable
//! snapshot and a [`ReportSink`] bound to the producer's identity; the
//! producer answers synchronously whether it will check at all, and later
//! delivers zero or more progress reports followed by exactly one terminal
//! report (a diagnostic list or a panic) through the sink.
//!
//! The sink is `Clone + Send`, so producers that do their work on a thread or
//! an external process can hand it across. Reports land in the session's
//! queue and are applied when the host drains it on its control loop — the
//! coordinator never blocks on a producer.

use std::error::Error;
use std::sync::Arc;
use std::sync::mpsc::Sender;

use crate::diagnostics::{Diagnostic, DocumentId, ProducerId};
use crate::region::RegionResolver;
use crate::snapshot::DocumentSnapshot;

/// Failure raised by a producer during invocation.
///
/// Boxed so backends can surface their own error types; the session records
/// the display form as the producer's disablement explanation.
pub type ProducerError = Box<dyn Error + Send + Sync + 'static>;

/// Synchronous answer from [`Producer::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WillCheck {
    /// The producer started a check and will report through the sink.
    Yes,
    /// The producer is not applicable for this cycle; it returns to idle and
    /// is retried on the next cycle.
    NotApplicable,
}

/// One report message from a producer to the coordinator.
#[derive(Debug, Clone)]
pub enum Report {
    /// The producer is still working. Logged; no state change.
    Progress(Option<String>),
    /// The producer is giving up for the rest of the session.
    Panic(Option<String>),
    /// Terminal report: the complete (possibly empty) diagnostic set for this
    /// cycle. Replaces the producer's previous diagnostics wholesale.
    Final(Vec<Diagnostic>),
}

#[derive(Debug)]
pub(crate) struct ReportEnvelope {
    pub(crate) producer: ProducerId,
    pub(crate) report: Report,
}

/// Report channel handle bound to one producer invocation.
#[derive(Debug, Clone)]
pub struct ReportSink {
    producer: ProducerId,
    tx: Sender<ReportEnvelope>,
}

impl ReportSink {
    pub(crate) fn new(producer: ProducerId, tx: Sender<ReportEnvelope>) -> Self {
        Self { producer, tx }
    }

    /// The producer this sink is bound to.
    pub fn producer(&self) -> ProducerId {
        self.producer
    }

    /// Report progress without ending the running phase.
    pub fn progress(&self, explanation: Option<String>) {
        self.send(Report::Progress(explanation));
    }

    /// Report that the producer cannot continue for this session.
    pub fn panic(&self, explanation: Option<String>) {
        self.send(Report::Panic(explanation));
    }

    /// Deliver the terminal diagnostic list for this cycle.
    pub fn finish(&self, diagnostics: Vec<Diagnostic>) {
        self.send(Report::Final(diagnostics));
    }

    fn send(&self, report: Report) {
        // A closed channel means the session is gone; the report is moot.
        let envelope = ReportEnvelope {
            producer: self.producer,
            report,
        };
        if self.tx.send(envelope).is_err() {
            tracing::trace!(producer = self.producer.get(), "report.send: session closed");
        }
    }
}

/// Everything a producer receives for one invocation.
#[derive(Debug, Clone)]
pub struct CheckContext {
    /// The document being checked.
    pub document: DocumentId,
    /// Immutable snapshot of the document at cycle start.
    pub snapshot: DocumentSnapshot,
    /// Resolver for turning positional hints into ranges against `snapshot`.
    pub resolver: Arc<RegionResolver>,
    /// Report channel bound to this producer.
    pub sink: ReportSink,
}

/// A pluggable diagnostic producer.
///
/// Implementations must not assume they run on the coordinator's thread for
/// anything but `check` itself.
pub trait Producer: Send {
    /// Stable name used in logs and disablement explanations.
    fn name(&self) -> &str;

    /// Begin one check cycle.
    ///
    /// Returning [`WillCheck::NotApplicable`] skips this cycle without
    /// penalty. Returning an error disables the producer for the session.
    /// After returning [`WillCheck::Yes`], the producer owes the sink exactly
    /// one terminal report.
    fn check(&mut self, ctx: CheckContext) -> Result<WillCheck, ProducerError>;
}
