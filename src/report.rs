use crate::model::ThreadDump;
use std::fmt::Write;

const HASH_PREVIEW: usize = 12;

/// Plain-text summary of an analyzed dump.
pub fn render(dump: &ThreadDump, top_n: usize) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "date: {}", dump.date);
    let _ = writeln!(out, "version: {}", dump.version_string);
    let _ = writeln!(out, "threads: {}", dump.total_threads);

    if !dump.by_status.is_empty() {
        let _ = writeln!(out, "by_status:");
        for (status, n) in top_counts(&dump.by_status, usize::MAX) {
            let _ = writeln!(out, "  {status}: {n}");
        }
    }

    let stacks = top_counts(&dump.by_stack, top_n);
    if !stacks.is_empty() {
        let _ = writeln!(out, "top_stacks:");
        for (hash, n) in stacks {
            let short = &hash[..hash.len().min(HASH_PREVIEW)];
            match sample_frame(dump, hash) {
                Some(frame) => {
                    let _ = writeln!(out, "  {short} x{n}  {frame}");
                }
                None => {
                    let _ = writeln!(out, "  {short} x{n}");
                }
            }
        }
    }

    let _ = writeln!(out, "problems: {}", dump.problems.len());
    for p in &dump.problems {
        let _ = writeln!(out, "  - {p}");
    }
    out
}

// count desc, then key asc
fn top_counts(counts: &std::collections::BTreeMap<String, usize>, top_n: usize) -> Vec<(&str, usize)> {
    let mut v: Vec<(&str, usize)> = counts.iter().map(|(k, c)| (k.as_str(), *c)).collect();
    v.sort_by(|(ka, ca), (kb, cb)| cb.cmp(ca).then_with(|| ka.cmp(kb)));
    v.truncate(top_n);
    v
}

/// Top frame of the first thread carrying `hash`.
fn sample_frame<'a>(dump: &'a ThreadDump, hash: &str) -> Option<&'a str> {
    dump.threads
        .values()
        .find(|t| t.stack_hash.as_deref() == Some(hash))
        .and_then(|t| {
            t.stack
                .iter()
                .find(|l| l.starts_with(crate::analysis::passes::shape_stacks::FRAME_PREFIX))
        })
        .map(|l| l.trim_start())
}
