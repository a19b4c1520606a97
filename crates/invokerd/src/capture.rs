//! Invocation-scoped console sinks.
//!
//! User code writes its console output through [`stdout`] and [`stderr`].
//! Outside a capture scope both writers forward to the process streams.
//! Inside [`capture`] they append to in-memory buffers owned by the calling
//! thread, so two invocations capturing at the same time on different worker
//! threads never see each other's bytes. The previous sinks are restored when
//! the scope ends, including when the closure panics.
//!
//! Native modules reach the same writers through the host console callback,
//! which runs on the invoking thread. Output from threads spawned by user code
//! is not attributed to the invocation and goes to the process streams.

use std::cell::RefCell;
use std::io::{self, Write};

thread_local! {
    static ACTIVE: RefCell<Option<Sinks>> = const { RefCell::new(None) };
}

/// Console stream selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    /// Standard output.
    Stdout,
    /// Standard error, also used for diagnostics.
    Stderr,
}

#[derive(Debug, Default)]
struct Sinks {
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

impl Sinks {
    fn buffer(&mut self, stream: Stream) -> &mut Vec<u8> {
        match stream {
            Stream::Stdout => &mut self.stdout,
            Stream::Stderr => &mut self.stderr,
        }
    }
}

/// Text collected by one capture scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    stdout: String,
    stderr: String,
}

impl CapturedOutput {
    /// Captured standard output.
    #[must_use]
    pub fn stdout(&self) -> &str {
        self.stdout.as_str()
    }

    /// Captured standard error.
    #[must_use]
    pub fn stderr(&self) -> &str {
        self.stderr.as_str()
    }

    /// Wire form of the capture: stdout, a newline, then stderr.
    #[must_use]
    pub fn render(&self) -> String {
        format!("{}\n{}", self.stdout, self.stderr)
    }
}

impl From<Sinks> for CapturedOutput {
    fn from(sinks: Sinks) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&sinks.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&sinks.stderr).into_owned(),
        }
    }
}

/// Restores the enclosing sinks when dropped.
struct ScopeGuard {
    previous: Option<Option<Sinks>>,
}

impl ScopeGuard {
    fn install() -> Self {
        let previous = ACTIVE.with(|active| active.replace(Some(Sinks::default())));
        Self {
            previous: Some(previous),
        }
    }

    fn finish(mut self) -> CapturedOutput {
        let previous = self.previous.take().unwrap_or_default();
        let captured = ACTIVE.with(|active| active.replace(previous));
        captured.map(CapturedOutput::from).unwrap_or_default()
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            ACTIVE.with(|active| active.replace(previous));
        }
    }
}

/// Runs `body` with this thread's console writers redirected into fresh
/// buffers and returns its result together with the captured text.
pub fn capture<R>(body: impl FnOnce() -> R) -> (R, CapturedOutput) {
    let guard = ScopeGuard::install();
    let result = body();
    (result, guard.finish())
}

/// Returns `true` while the calling thread is inside a capture scope.
#[must_use]
pub fn is_capturing() -> bool {
    ACTIVE.with(|active| active.borrow().is_some())
}

/// Writer for the invocation's standard output.
#[must_use]
pub const fn stdout() -> Console {
    Console {
        stream: Stream::Stdout,
    }
}

/// Writer for the invocation's standard error.
#[must_use]
pub const fn stderr() -> Console {
    Console {
        stream: Stream::Stderr,
    }
}

/// Console writer bound to one stream of the current thread's sinks.
#[derive(Debug, Clone, Copy)]
pub struct Console {
    stream: Stream,
}

impl Console {
    /// Stream this writer targets.
    #[must_use]
    pub const fn stream(&self) -> Stream {
        self.stream
    }

    fn append(&self, buf: &[u8]) -> bool {
        ACTIVE.with(|active| match active.borrow_mut().as_mut() {
            Some(sinks) => {
                sinks.buffer(self.stream).extend_from_slice(buf);
                true
            }
            None => false,
        })
    }
}

impl Write for Console {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.append(buf) {
            return Ok(buf.len());
        }
        match self.stream {
            Stream::Stdout => io::stdout().write(buf),
            Stream::Stderr => io::stderr().write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        if is_capturing() {
            return Ok(());
        }
        match self.stream {
            Stream::Stdout => io::stdout().flush(),
            Stream::Stderr => io::stderr().flush(),
        }
    }
}
