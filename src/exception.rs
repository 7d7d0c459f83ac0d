//! Exception information carried by log records.
//!
//! [`ExceptionInfo`] is the structured equivalent of an error captured at the
//! log call site: a type name, a message, optional stack frames and an
//! optional cause. It can be built by hand or derived from any
//! [`std::error::Error`] by walking its `source()` chain.
//!
//! Rendering follows the classic traceback layout so alert readers see the
//! same shape regardless of where the error came from:
//!
//! ```text
//! Traceback (most recent call last):
//!   File "src/db.rs", line 42, in fetch_user
//! ConnectionError: connection reset
//! ```

use std::error::Error;
use std::fmt::Write as _;

/// Label used for causes whose concrete type is erased behind `dyn Error`.
const ERASED_CAUSE_TYPE: &str = "Error";

/// A single frame in a captured stack.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StackFrame {
    pub filename: String,
    pub lineno: u32,
    pub function: String,
    /// Source text for the line, if it was captured.
    pub source_line: Option<String>,
}

impl StackFrame {
    pub fn new(filename: impl Into<String>, lineno: u32, function: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            lineno,
            function: function.into(),
            source_line: None,
        }
    }

    pub fn with_source_line(mut self, line: impl Into<String>) -> Self {
        self.source_line = Some(line.into());
        self
    }
}

/// Structured description of an error attached to a record.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExceptionInfo {
    pub type_name: String,
    pub message: String,
    /// Frames ordered outermost first.
    pub frames: Vec<StackFrame>,
    /// The error that directly caused this one.
    pub cause: Option<Box<ExceptionInfo>>,
}

impl ExceptionInfo {
    pub fn new(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn with_frames(mut self, frames: Vec<StackFrame>) -> Self {
        self.frames = frames;
        self
    }

    pub fn with_cause(mut self, cause: ExceptionInfo) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Capture `err` and its `source()` chain.
    ///
    /// The outer type name comes from `E`; sources are type-erased and are
    /// labelled `Error`.
    pub fn from_error<E>(err: &E) -> Self
    where
        E: Error + ?Sized,
    {
        let mut info = Self::new(short_type_name(std::any::type_name::<E>()), err.to_string());
        info.cause = err.source().map(|source| Box::new(Self::from_dyn(source)));
        info
    }

    fn from_dyn(err: &(dyn Error + 'static)) -> Self {
        let mut info = Self::new(ERASED_CAUSE_TYPE, err.to_string());
        info.cause = err.source().map(|source| Box::new(Self::from_dyn(source)));
        info
    }

    /// Render the full traceback text, causes first.
    pub fn format_traceback(&self) -> String {
        let mut output = String::new();
        if let Some(cause) = &self.cause {
            output.push_str(&cause.format_traceback());
            output.push_str(
                "\nThe above exception was the direct cause of the following exception:\n\n",
            );
        }
        output.push_str("Traceback (most recent call last):\n");
        for frame in &self.frames {
            write_frame(&mut output, frame);
        }
        let _ = writeln!(output, "{}: {}", self.type_name, self.message);
        output
    }
}

fn write_frame(output: &mut String, frame: &StackFrame) {
    let _ = writeln!(
        output,
        "  File \"{}\", line {}, in {}",
        frame.filename, frame.lineno, frame.function
    );
    if let Some(source) = frame.source_line.as_deref().map(str::trim)
        && !source.is_empty()
    {
        let _ = writeln!(output, "    {source}");
    }
}

/// Strip the module path and generic arguments from a type name.
fn short_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
