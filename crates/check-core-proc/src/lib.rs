#![warn(missing_docs)]
//! External command producers for `check-core`.
//!
//! [`CommandChecker`] adapts a line-oriented command-line checker into a
//! [`check_core::Producer`]. On invocation it spawns the command, pipes the
//! document text to its stdin, and hands the rest to a worker thread: the
//! thread collects stdout/stderr, parses each line against an ordered
//! [`OutputPattern`] table, resolves the positional hints against the
//! snapshot captured at invocation, and delivers one terminal report through
//! the sink. Hints that cannot be resolved drop that diagnostic (logged);
//! lines matching no pattern are ignored.
//!
//! The coordinator never waits on the child process. A checker that hangs
//! leaves its producer `Running` and later cycles skip it, per the engine's
//! contract.
//!
//! ```rust,no_run
//! use check_core::TypeKey;
//! use check_core_proc::{CommandChecker, GCC_PATTERN, OutputPattern};
//!
//! let checker = CommandChecker::new("c-lint", "gcc")
//!     .args(["-fsyntax-only", "-x", "c", "-"])
//!     .pattern(OutputPattern::new(GCC_PATTERN, TypeKey::error()).unwrap());
//! ```

use std::io::Write;
use std::process::{Child, Command, Stdio};
use std::thread;

use regex::Regex;
use thiserror::Error;

use check_core::{CheckContext, Diagnostic, Producer, ProducerError, TypeKey, WillCheck};

/// Pattern for the classic `file:line:col: kind: message` checker output
/// shape (gcc, clang, and most linters that imitate them).
pub const GCC_PATTERN: &str = r"^[^:\s][^:]*:(?P<line>\d+):(?:(?P<column>\d+):)?\s*(?:(?P<kind>error|warning|note):\s*)?(?P<message>.*)$";

/// Errors building or invoking a [`CommandChecker`].
#[derive(Debug, Error)]
pub enum CommandCheckerError {
    /// An output pattern failed to compile.
    #[error("invalid output pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The offending pattern source.
        pattern: String,
        /// The underlying regex error.
        #[source]
        source: regex::Error,
    },
    /// The checker command could not be spawned.
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        /// The program that failed to start.
        program: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// One line-oriented output pattern.
///
/// The regex addresses captures by name: `line` (required, 1-based),
/// `column` (optional, 1-based), `kind` (optional; becomes the diagnostic
/// type key when present), and `message` (optional). A line that matches a
/// pattern but captures no `kind` gets the pattern's default type.
#[derive(Debug, Clone)]
pub struct OutputPattern {
    regex: Regex,
    default_type: TypeKey,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ParsedLine {
    line: usize,
    column: Option<usize>,
    type_key: TypeKey,
    message: String,
}

impl OutputPattern {
    /// Compile an output pattern.
    pub fn new(pattern: &str, default_type: TypeKey) -> Result<Self, CommandCheckerError> {
        let regex = Regex::new(pattern).map_err(|source| CommandCheckerError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self {
            regex,
            default_type,
        })
    }

    fn parse(&self, output_line: &str) -> Option<ParsedLine> {
        let captures = self.regex.captures(output_line)?;
        let line = captures.name("line")?.as_str().parse().ok()?;
        let column = captures.name("column").and_then(|m| m.as_str().parse().ok());
        let type_key = match captures.name("kind") {
            Some(kind) if !kind.as_str().is_empty() => TypeKey::new(kind.as_str()),
            _ => self.default_type.clone(),
        };
        let message = captures
            .name("message")
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default();
        Some(ParsedLine {
            line,
            column,
            type_key,
            message,
        })
    }
}

/// Adapts an external command-line checker into a [`Producer`].
#[derive(Debug)]
pub struct CommandChecker {
    name: String,
    program: String,
    args: Vec<String>,
    patterns: Vec<OutputPattern>,
}

impl CommandChecker {
    /// Create a checker that runs `program`, identified as `name` in logs.
    pub fn new(name: impl Into<String>, program: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args: Vec::new(),
            patterns: Vec::new(),
        }
    }

    /// Append one command-line argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append command-line arguments.
    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Append an output pattern. Patterns are tried in order per line.
    pub fn pattern(mut self, pattern: OutputPattern) -> Self {
        self.patterns.push(pattern);
        self
    }
}

impl Producer for CommandChecker {
    fn name(&self) -> &str {
        &self.name
    }

    fn check(&mut self, ctx: CheckContext) -> Result<WillCheck, ProducerError> {
        if self.patterns.is_empty() {
            tracing::debug!(checker = %self.name, "proc.check: no patterns configured");
            return Ok(WillCheck::NotApplicable);
        }

        let child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| CommandCheckerError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let text = ctx.snapshot.text();
        let patterns = self.patterns.clone();
        let checker = self.name.clone();
        thread::spawn(move || report_from_child(child, text, patterns, checker, ctx));
        Ok(WillCheck::Yes)
    }
}

fn report_from_child(
    mut child: Child,
    text: String,
    patterns: Vec<OutputPattern>,
    checker: String,
    ctx: CheckContext,
) {
    // Feed the document on its own thread so a checker that interleaves
    // reading and writing cannot deadlock on a full pipe.
    let stdin = child.stdin.take();
    let writer = thread::spawn(move || {
        if let Some(mut stdin) = stdin {
            let _ = stdin.write_all(text.as_bytes());
        }
    });

    let output = match child.wait_with_output() {
        Ok(output) => output,
        Err(error) => {
            ctx.sink
                .panic(Some(format!("waiting for checker output failed: {error}")));
            return;
        }
    };
    let _ = writer.join();

    let mut diagnostics = Vec::new();
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    for output_line in stdout.lines().chain(stderr.lines()) {
        let Some(parsed) = patterns.iter().find_map(|p| p.parse(output_line)) else {
            continue;
        };
        match Diagnostic::at_position(
            ctx.document,
            &ctx.snapshot,
            &ctx.resolver,
            parsed.line,
            parsed.column,
            parsed.type_key,
            parsed.message,
        ) {
            Ok(diagnostic) => diagnostics.push(diagnostic),
            Err(error) => {
                tracing::warn!(
                    checker = %checker,
                    error = %error,
                    line = parsed.line,
                    "proc.parse: dropping unresolvable diagnostic"
                );
            }
        }
    }
    ctx.sink.finish(diagnostics);
}
