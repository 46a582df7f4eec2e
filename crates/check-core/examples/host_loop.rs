//! Minimal host loop example
//!
//! Drives a session with an in-process producer that does its work on a
//! worker thread and reports back through the sink.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use check_core::{
    CheckContext, CheckSession, Diagnostic, DocumentId, Producer, ProducerError, ScheduleConfig,
    TypeKey, TypeRegistry, WillCheck,
};

/// Flags every `.unwrap()` call in the document.
struct UnwrapHunter;

impl Producer for UnwrapHunter {
    fn name(&self) -> &str {
        "unwrap-hunter"
    }

    fn check(&mut self, ctx: CheckContext) -> Result<WillCheck, ProducerError> {
        thread::spawn(move || {
            let text = ctx.snapshot.text();
            let mut found = Vec::new();
            for (at, matched) in text.match_indices(".unwrap()") {
                let begin = text[..at].chars().count();
                found.push(Diagnostic::new(
                    ctx.document,
                    begin,
                    begin + matched.chars().count(),
                    TypeKey::warning(),
                    "unwrap may panic",
                ));
            }
            ctx.sink.progress(Some(format!("{} findings", found.len())));
            ctx.sink.finish(found);
        });
        Ok(WillCheck::Yes)
    }
}

fn main() {
    let registry = Arc::new(TypeRegistry::with_builtin_types());
    let mut session = CheckSession::new(DocumentId::new(1), registry, ScheduleConfig::default());
    session.register_producer(Box::new(UnwrapHunter));
    session.subscribe(Box::new(|event| println!("event: {event:?}")));

    session.sync_text("let x = read().unwrap();\nlet y = x + 1;\n");
    session.enable().unwrap();
    session.drain_deferred();

    // The host loop: pump until the cycle settles.
    for _ in 0..50 {
        if session.pump() > 0 && session.status().running == 0 {
            break;
        }
        thread::sleep(Duration::from_millis(10));
    }

    for diagnostic in session.current_diagnostics() {
        println!(
            "{} [{}..{}] {}",
            diagnostic.type_key(),
            diagnostic.begin(),
            diagnostic.end(),
            diagnostic.text()
        );
    }
    println!("status: {}", session.status());
}
