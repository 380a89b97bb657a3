//! Parse `jstack` thread dumps and flag threads that are blocked on a lock
//! another thread holds, or stuck deep in a call stack while not runnable.
//!
//! ```ignore
//! use jstack_lens::{analysis::AnalyzerConfig, diagnostic::LogSink, inspect};
//!
//! let dump = inspect(&text, &AnalyzerConfig::default(), &mut LogSink)?;
//! println!("{}", dump.to_json()?);
//! ```

pub mod analysis;
pub mod cli;
pub mod config;
pub mod diagnostic;
pub mod error;
pub mod model;
pub mod parser;
pub mod report;

use analysis::AnalyzerConfig;
use diagnostic::DiagnosticSink;
use error::Result;
use model::ThreadDump;

/// Parses `text` and runs both analysis steps.
pub fn inspect(
    text: &str,
    cfg: &AnalyzerConfig,
    sink: &mut dyn DiagnosticSink,
) -> Result<ThreadDump> {
    let mut dump = parser::parse_jstack(text, sink)?;
    analysis::run(&mut dump, cfg);
    Ok(dump)
}
