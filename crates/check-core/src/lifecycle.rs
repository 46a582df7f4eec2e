//! Producer lifecycle state machine.
//!
//! Each registered producer carries one [`ProducerState`] per session:
//! `Idle → Running → {Idle | Disabled}`, with `Running → Running` for
//! progress reports. There is no separate "success" state — a producer is
//! eligible to run again as soon as it is idle.
//!
//! [`apply_report`] is the pure transition function over
//! `(state, report) → disposition`; it mutates only the producer's state and
//! returns a [`ReportDisposition`] describing the side effects the session
//! must apply (replace a partition, clear it, or nothing). Keeping the
//! transition pure makes the protocol testable without any real concurrency.

use crate::diagnostics::{Diagnostic, DocumentId};
use crate::producer::Report;

/// Run state of a producer within the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Not currently checking; eligible for the next cycle.
    Idle,
    /// Invoked and expected to deliver a terminal report.
    Running,
    /// Excluded from all future cycles until the mode is re-enabled.
    Disabled,
}

/// Per-producer state tracked by a session.
#[derive(Debug, Clone)]
pub struct ProducerState {
    lifecycle: Lifecycle,
    last_explanation: Option<String>,
}

impl ProducerState {
    pub(crate) fn new() -> Self {
        Self {
            lifecycle: Lifecycle::Idle,
            last_explanation: None,
        }
    }

    /// Current run state.
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Explanation recorded by the most recent disablement, if any.
    pub fn last_explanation(&self) -> Option<&str> {
        self.last_explanation.as_deref()
    }

    pub(crate) fn reset(&mut self) {
        self.lifecycle = Lifecycle::Idle;
        self.last_explanation = None;
    }

    pub(crate) fn set_running(&mut self) {
        self.lifecycle = Lifecycle::Running;
    }

    pub(crate) fn set_idle(&mut self) {
        self.lifecycle = Lifecycle::Idle;
    }

    pub(crate) fn disable(&mut self, explanation: String) {
        self.lifecycle = Lifecycle::Disabled;
        self.last_explanation = Some(explanation);
    }
}

impl Default for ProducerState {
    fn default() -> Self {
        Self::new()
    }
}

/// Side effects the session must apply after a report transition.
#[derive(Debug)]
pub enum ReportDisposition {
    /// The producer was not running; the report is rejected with no state
    /// change and no aggregation effect.
    Unexpected,
    /// Progress note; the producer stays running.
    Progress(Option<String>),
    /// The producer was disabled; its partition must be cleared.
    Disable {
        /// Explanation recorded on the producer state.
        explanation: String,
    },
    /// Terminal report accepted; the producer's partition must be replaced
    /// with these diagnostics.
    Accept(Vec<Diagnostic>),
}

/// Apply one report to a producer's state.
///
/// A report is accepted only while the producer is [`Lifecycle::Running`].
/// Except for progress, every report ends the running phase. A final report
/// carrying a diagnostic for a different document is a protocol violation
/// and disables the producer.
pub fn apply_report(
    state: &mut ProducerState,
    document: DocumentId,
    report: Report,
) -> ReportDisposition {
    if state.lifecycle() != Lifecycle::Running {
        return ReportDisposition::Unexpected;
    }

    match report {
        Report::Progress(explanation) => ReportDisposition::Progress(explanation),
        Report::Panic(explanation) => {
            let explanation = explanation.unwrap_or_else(|| "producer panicked".to_string());
            state.disable(explanation.clone());
            ReportDisposition::Disable { explanation }
        }
        Report::Final(diagnostics) => {
            if let Some(stray) = diagnostics.iter().find(|d| d.document() != document) {
                let explanation = format!(
                    "protocol violation: final report carried a diagnostic for document {}",
                    stray.document().get()
                );
                state.disable(explanation.clone());
                return ReportDisposition::Disable { explanation };
            }
            state.set_idle();
            ReportDisposition::Accept(diagnostics)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TypeKey;

    fn doc() -> DocumentId {
        DocumentId::new(7)
    }

    fn running() -> ProducerState {
        let mut state = ProducerState::new();
        state.set_running();
        state
    }

    #[test]
    fn test_initial_state_is_idle() {
        let state = ProducerState::new();
        assert_eq!(state.lifecycle(), Lifecycle::Idle);
        assert_eq!(state.last_explanation(), None);
    }

    #[test]
    fn test_report_rejected_unless_running() {
        let mut idle = ProducerState::new();
        let disposition = apply_report(&mut idle, doc(), Report::Final(Vec::new()));
        assert!(matches!(disposition, ReportDisposition::Unexpected));
        assert_eq!(idle.lifecycle(), Lifecycle::Idle);

        let mut disabled = ProducerState::new();
        disabled.disable("gone".to_string());
        let disposition = apply_report(&mut disabled, doc(), Report::Panic(None));
        assert!(matches!(disposition, ReportDisposition::Unexpected));
        assert_eq!(disabled.lifecycle(), Lifecycle::Disabled);
        // The rejected panic did not overwrite the original explanation.
        assert_eq!(disabled.last_explanation(), Some("gone"));
    }

    #[test]
    fn test_progress_keeps_running() {
        let mut state = running();
        let disposition =
            apply_report(&mut state, doc(), Report::Progress(Some("parsing".to_string())));
        assert!(matches!(disposition, ReportDisposition::Progress(Some(_))));
        assert_eq!(state.lifecycle(), Lifecycle::Running);
    }

    #[test]
    fn test_panic_disables_and_records_explanation() {
        let mut state = running();
        let disposition =
            apply_report(&mut state, doc(), Report::Panic(Some("toolchain missing".to_string())));
        assert!(matches!(disposition, ReportDisposition::Disable { .. }));
        assert_eq!(state.lifecycle(), Lifecycle::Disabled);
        assert_eq!(state.last_explanation(), Some("toolchain missing"));
    }

    #[test]
    fn test_panic_without_explanation_gets_a_default() {
        let mut state = running();
        apply_report(&mut state, doc(), Report::Panic(None));
        assert_eq!(state.last_explanation(), Some("producer panicked"));
    }

    #[test]
    fn test_final_report_returns_to_idle() {
        let mut state = running();
        let diagnostics = vec![Diagnostic::new(doc(), 0, 3, TypeKey::error(), "bad")];
        let disposition = apply_report(&mut state, doc(), Report::Final(diagnostics));
        assert!(matches!(disposition, ReportDisposition::Accept(d) if d.len() == 1));
        assert_eq!(state.lifecycle(), Lifecycle::Idle);
    }

    #[test]
    fn test_empty_final_report_is_accepted() {
        let mut state = running();
        let disposition = apply_report(&mut state, doc(), Report::Final(Vec::new()));
        assert!(matches!(disposition, ReportDisposition::Accept(d) if d.is_empty()));
        assert_eq!(state.lifecycle(), Lifecycle::Idle);
    }

    #[test]
    fn test_foreign_document_is_a_protocol_violation() {
        let mut state = running();
        let stray = Diagnostic::new(DocumentId::new(99), 0, 1, TypeKey::error(), "stray");
        let disposition = apply_report(&mut state, doc(), Report::Final(vec![stray]));
        assert!(matches!(disposition, ReportDisposition::Disable { .. }));
        assert_eq!(state.lifecycle(), Lifecycle::Disabled);
        assert!(state.last_explanation().unwrap().contains("protocol violation"));
    }

    #[test]
    fn test_reset_clears_disablement() {
        let mut state = running();
        apply_report(&mut state, doc(), Report::Panic(None));
        assert_eq!(state.lifecycle(), Lifecycle::Disabled);

        state.reset();
        assert_eq!(state.lifecycle(), Lifecycle::Idle);
        assert_eq!(state.last_explanation(), None);
    }
}
