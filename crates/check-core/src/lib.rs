#![warn(missing_docs)]
//! Check Core - Headless Diagnostic Coordination Engine
//!
//! # Overview
//!
//! `check-core` coordinates multiple independent, asynchronous diagnostic
//! producers (checkers) that analyze a live document and report problems back
//! to a central session, which maintains a consistent, up-to-date view of all
//! currently valid diagnostics. It is headless: rendering, menus, and the
//! checkers themselves are external collaborators, assumed to sit on a host
//! event loop.
//!
//! # Core Features
//!
//! - **Producer Lifecycle**: per-producer `Idle → Running → {Idle | Disabled}`
//!   state machine with fault containment; one broken checker never corrupts
//!   another's results
//! - **Report Protocol**: out-of-order-tolerant report handling over a bound
//!   sink; progress, panic, and terminal diagnostic-list reports
//! - **Aggregation**: per-producer partitions replaced wholesale, merged into
//!   a stable sorted view with error/other counts
//! - **Debounced Scheduling**: quiescence window after edits, start-on-save,
//!   deferred starts drained at host-defined points
//! - **Region Resolution**: (line, column) hints resolved to exact char
//!   ranges with token extension and whole-line fallbacks
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  CheckSession (entry points & consumers)    │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  Scheduler (debounce, deferred starts)      │  ← Timing
//! ├─────────────────────────────────────────────┤
//! │  Lifecycle State Machine (report protocol)  │  ← Per-producer state
//! ├─────────────────────────────────────────────┤
//! │  Aggregator (partitions, merged view)       │  ← Diagnostic ownership
//! ├─────────────────────────────────────────────┤
//! │  Region Resolver + Document Snapshot        │  ← Positional resolution
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use check_core::{
//!     CheckContext, CheckSession, Diagnostic, DocumentId, Producer, ProducerError,
//!     ScheduleConfig, TypeKey, TypeRegistry, WillCheck,
//! };
//!
//! struct TodoScanner;
//!
//! impl Producer for TodoScanner {
//!     fn name(&self) -> &str {
//!         "todo-scanner"
//!     }
//!
//!     fn check(&mut self, ctx: CheckContext) -> Result<WillCheck, ProducerError> {
//!         let text = ctx.snapshot.text();
//!         let mut found = Vec::new();
//!         if let Some(at) = text.find("TODO") {
//!             let begin = text[..at].chars().count();
//!             found.push(Diagnostic::new(
//!                 ctx.document,
//!                 begin,
//!                 begin + 4,
//!                 TypeKey::warning(),
//!                 "leftover TODO",
//!             ));
//!         }
//!         ctx.sink.finish(found);
//!         Ok(WillCheck::Yes)
//!     }
//! }
//!
//! let registry = Arc::new(TypeRegistry::with_builtin_types());
//! let mut session = CheckSession::new(DocumentId::new(1), registry, ScheduleConfig::default());
//! session.register_producer(Box::new(TodoScanner));
//! session.sync_text("fn main() {} // TODO: tests");
//! session.enable().unwrap();
//!
//! session.on_saved(); // start a cycle immediately
//! session.pump();     // deliver queued reports on the host loop
//! assert_eq!(session.counts(), (0, 1));
//! ```
//!
//! # Module Description
//!
//! - [`session`] - Per-document coordinator and host entry points
//! - [`lifecycle`] - Producer run-state machine and report transitions
//! - [`aggregate`] - Per-producer diagnostic partitions and merged views
//! - [`schedule`] - Debounce, quiescence, and deferred-start timing
//! - [`region`] - Positional hint → char range resolution
//! - [`snapshot`] - Immutable rope-backed document snapshots
//! - [`registry`] - Diagnostic type severities and categories
//! - [`producer`] - Producer contract and report channel
//! - [`diagnostics`] - The diagnostic value type and ids
//!
//! # Concurrency Model
//!
//! Single-threaded and cooperative: every state transition runs on the host's
//! control loop. Producers may work on their own threads — the
//! [`ReportSink`] is `Clone + Send` — but reports queue up until the host
//! calls [`CheckSession::pump`]. The coordinator never blocks on a producer,
//! and a producer that never reports simply stays `Running` and is skipped by
//! later cycles.

pub mod aggregate;
pub mod diagnostics;
pub mod lifecycle;
pub mod producer;
pub mod region;
pub mod registry;
pub mod schedule;
pub mod session;
pub mod snapshot;

pub use aggregate::DiagnosticAggregator;
pub use diagnostics::{Diagnostic, DocumentId, ProducerId};
pub use lifecycle::{Lifecycle, ProducerState, ReportDisposition, apply_report};
pub use producer::{CheckContext, Producer, ProducerError, Report, ReportSink, WillCheck};
pub use region::{RegionError, RegionResolver, TokenScanner, WordScanner};
pub use registry::{
    Category, ERROR_THRESHOLD, SEVERITY_ERROR, SEVERITY_NOTE, SEVERITY_WARNING, TypeKey,
    TypeRegistry,
};
pub use schedule::{CheckScheduler, ScheduleConfig};
pub use session::{
    CheckEvent, CheckEventCallback, CheckSession, Direction, SessionError, StatusSummary,
};
pub use snapshot::{DocumentSnapshot, SnapshotSource};
