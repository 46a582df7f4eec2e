//! Runs a scripted shell "checker" over a small document and prints the
//! resolved diagnostics.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use check_core::{CheckSession, DocumentId, ScheduleConfig, TypeKey, TypeRegistry};
use check_core_proc::{CommandChecker, GCC_PATTERN, OutputPattern};

fn main() {
    let registry = Arc::new(TypeRegistry::with_builtin_types());
    let mut session = CheckSession::new(DocumentId::new(1), registry, ScheduleConfig::default());

    let checker = CommandChecker::new("demo-checker", "sh")
        .arg("-c")
        .arg("cat > /dev/null; printf '%s\\n' '<stdin>:2:3: warning: suspicious name'")
        .pattern(OutputPattern::new(GCC_PATTERN, TypeKey::error()).expect("pattern compiles"));
    session.register_producer(Box::new(checker));

    session.sync_text("x = 1\n  y = 2\n");
    session.enable().expect("a producer is registered");
    session.on_saved();

    for _ in 0..100 {
        if session.pump() > 0 {
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
}
