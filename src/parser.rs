use crate::{
    diagnostic::{DiagnosticSink, MalformedLine, Severity},
    error::{DumpError, Result},
    model::{JavaThread, ThreadDump},
};
use regex::Regex;
use std::collections::BTreeMap;

pub const DUMP_MARKER: &str = "Full thread dump ";
pub const STATE_PREFIX: &str = "   java.lang.Thread.State:";
pub const LOCKED_PREFIX: &str = "\t- locked ";
pub const WAITING_PREFIX: &str = "\t- waiting to lock ";

struct LinePatterns {
    header: Regex,
    state: Regex,
    locked: Regex,
    waiting: Regex,
}

impl LinePatterns {
    fn new() -> Result<Self> {
        Ok(Self {
            header: Regex::new(
                r#""([^"]+)" (#[0-9]+)( daemon)? prio=([0-9]+)? os_prio=([0-9]+) tid=([a-z0-9]+) nid=([a-z0-9]+) (.*)"#,
            )?,
            state: Regex::new(r"[ ]+java\.lang\.Thread\.State: ([^ ]*)")?,
            locked: Regex::new(r"[\t]+- locked <([^>]+)>")?,
            waiting: Regex::new(r"[\t]+- waiting to lock <([^>]+)>")?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LockRole {
    Owned,
    Waiting,
}

/// Per-line role, decided by prefix alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    Marker,
    Header,
    State,
    Frame,
    Other,
}

fn classify(line: &str) -> LineKind {
    if line.starts_with(DUMP_MARKER) {
        LineKind::Marker
    } else if line.starts_with('"') {
        LineKind::Header
    } else if line.starts_with(STATE_PREFIX) {
        LineKind::State
    } else if line.starts_with('\t') {
        LineKind::Frame
    } else {
        LineKind::Other
    }
}

struct Parser<'s> {
    pats: LinePatterns,
    sink: &'s mut dyn DiagnosticSink,
    threads: BTreeMap<String, JavaThread>,
    /// thread being built; `None` after a header that failed to match
    current: Option<JavaThread>,
}

impl Parser<'_> {
    fn finish_current(&mut self) {
        if let Some(t) = self.current.take() {
            if self.threads.contains_key(&t.tid) {
                self.sink.report(
                    Severity::Warn,
                    &format!("duplicate tid {}, replacing earlier thread record", t.tid),
                );
            }
            self.threads.insert(t.tid.clone(), t);
        }
    }

    fn header(&mut self, line_no: usize, line: &str) {
        self.finish_current();

        let Some(caps) = self.pats.header.captures(line) else {
            // header variants we don't know are skipped without a record
            return;
        };
        let group = |i: usize| caps.get(i).map(|m| m.as_str()).unwrap_or("");

        let prio = match caps.get(4) {
            Some(m) => self.number(line_no, line, m.as_str(), "bad prio value"),
            None => None,
        };
        let os_prio = self
            .number(line_no, line, group(5), "bad os_prio value")
            .unwrap_or(0);
        let nid = group(7);
        let thread_id = match nid.strip_prefix("0x").map(|h| u64::from_str_radix(h, 16)) {
            Some(Ok(id)) => id,
            _ => {
                self.malformed(Severity::Warn, line_no, "Failed to parse nid as hex", line);
                0
            }
        };

        self.current = Some(JavaThread {
            name: group(1).to_string(),
            internal_number: group(2).to_string(),
            is_daemon: caps.get(3).is_some(),
            status: group(8).to_string(),
            prio,
            os_prio,
            thread_id,
            tid: group(6).to_string(),
            nid: nid.to_string(),
            ..Default::default()
        });
    }

    fn state(&mut self, line_no: usize, line: &str) {
        if self.current.is_none() {
            self.orphan(line_no);
            return;
        }
        match self.pats.state.captures(line).and_then(|c| c.get(1)) {
            Some(m) => {
                if let Some(t) = self.current.as_mut() {
                    t.status = m.as_str().to_string();
                }
            }
            None => self.malformed(Severity::Warn, line_no, "Failed to find thread state", line),
        }
    }

    fn frame(&mut self, line_no: usize, line: &str) {
        if self.current.is_none() {
            self.orphan(line_no);
            return;
        }

        let lock = if line.starts_with(LOCKED_PREFIX) {
            let id = self.pats.locked.captures(line).and_then(|c| c.get(1));
            Some((LockRole::Owned, id.map(|m| m.as_str())))
        } else if line.starts_with(WAITING_PREFIX) {
            let id = self.pats.waiting.captures(line).and_then(|c| c.get(1));
            Some((LockRole::Waiting, id.map(|m| m.as_str())))
        } else {
            None
        };

        if let Some(t) = self.current.as_mut() {
            t.stack.push(line.to_string());
            match lock {
                Some((LockRole::Owned, Some(id))) => {
                    t.locks_owned.insert(id.to_string());
                }
                Some((LockRole::Waiting, Some(id))) => {
                    t.locks_waiting.insert(id.to_string());
                }
                _ => {}
            }
        }

        match lock {
            Some((LockRole::Owned, None)) => {
                self.malformed(Severity::Error, line_no, "Failed to find lock ID", line)
            }
            Some((LockRole::Waiting, None)) => {
                self.malformed(Severity::Error, line_no, "Failed to find wait lock ID", line)
            }
            _ => {}
        }
    }

    fn number(&mut self, line_no: usize, line: &str, raw: &str, reason: &'static str) -> Option<u32> {
        match raw.parse::<u32>() {
            Ok(n) => Some(n),
            Err(_) => {
                self.malformed(Severity::Warn, line_no, reason, line);
                None
            }
        }
    }

    fn malformed(&mut self, severity: Severity, line_no: usize, reason: &'static str, line: &str) {
        let m = MalformedLine { line_no, reason, line };
        self.sink.report(severity, &m.to_string());
    }

    fn orphan(&mut self, line_no: usize) {
        self.sink.report(
            Severity::Debug,
            &format!("line {line_no}: no open thread record, line dropped"),
        );
    }
}

/// Parses `jstack` output into a [`ThreadDump`]. Aggregates and problems are
/// left empty; run [`crate::analysis`] afterwards.
///
/// Fails with [`DumpError::InvalidFormat`] when no "Full thread dump" line is
/// found. Every other oddity goes to `sink` and parsing continues.
pub fn parse_jstack(text: &str, sink: &mut dyn DiagnosticSink) -> Result<ThreadDump> {
    let mut p = Parser {
        pats: LinePatterns::new()?,
        sink,
        threads: BTreeMap::new(),
        current: None,
    };
    let mut dump = ThreadDump::default();
    let mut valid = false;

    for (i, raw) in text.split('\n').enumerate() {
        let line = raw.strip_suffix('\r').unwrap_or(raw);
        let line_no = i + 1;

        if i == 0 {
            dump.date = line.to_string();
            continue;
        }

        match classify(line) {
            LineKind::Marker => {
                if valid {
                    log::debug!("second dump marker on line {line_no}, version string replaced");
                }
                valid = true;
                dump.version_string = line[DUMP_MARKER.len()..].to_string();
            }
            _ if !valid => {}
            LineKind::Header => p.header(line_no, line),
            LineKind::State => p.state(line_no, line),
            LineKind::Frame => p.frame(line_no, line),
            LineKind::Other => {}
        }
    }
    p.finish_current();

    if !valid {
        return Err(DumpError::InvalidFormat {
            partial: Box::new(dump),
        });
    }

    dump.threads = p.threads;
    dump.total_threads = dump.threads.len();
    log::debug!("Finished parsing {} threads.", dump.total_threads);
    Ok(dump)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::CollectingSink;
    use rstest::rstest;

    const HEADER_A: &str = "\"worker-1\" #12 daemon prio=5 os_prio=0 tid=0x00007f1c2c0ce000 nid=0x4a03 waiting for monitor entry [0x00007f1c1a2f9000]";
    const HEADER_B: &str = "\"main\" #1 prio=5 os_prio=0 tid=0x00007f1c2c00a800 nid=0x49f1 runnable [0x00007f1c33ffe000]";

    fn dump_text(lines: &[&str]) -> String {
        let mut all = vec![
            "2024-01-02 03:04:05",
            "Full thread dump Java HotSpot(TM) 64-Bit Server VM (25.181-b13 mixed mode):",
            "",
        ];
        all.extend_from_slice(lines);
        all.join("\n")
    }

    fn parse(text: &str) -> (ThreadDump, CollectingSink) {
        let mut sink = CollectingSink::new();
        let dump = parse_jstack(text, &mut sink).unwrap();
        (dump, sink)
    }

    #[rstest]
    #[case::marker("Full thread dump OpenJDK", LineKind::Marker)]
    #[case::header("\"x\" #1 prio=5", LineKind::Header)]
    #[case::state("   java.lang.Thread.State: RUNNABLE", LineKind::State)]
    #[case::frame("\tat a.B.c(B.java:1)", LineKind::Frame)]
    #[case::lock("\t- locked <0x1>", LineKind::Frame)]
    #[case::blank("", LineKind::Other)]
    #[case::jni("JNI global references: 12", LineKind::Other)]
    #[case::indented_state_wrong_width("  java.lang.Thread.State: RUNNABLE", LineKind::Other)]
    fn classifies_by_prefix(#[case] line: &str, #[case] kind: LineKind) {
        assert_eq!(classify(line), kind);
    }

    #[test]
    fn header_fields_are_extracted() {
        let (dump, sink) = parse(&dump_text(&[HEADER_A]));
        assert!(sink.entries.is_empty(), "{:?}", sink.entries);

        let t = &dump.threads["0x00007f1c2c0ce000"];
        assert_eq!(t.name, "worker-1");
        assert_eq!(t.internal_number, "#12");
        assert!(t.is_daemon);
        assert_eq!(t.prio, Some(5));
        assert_eq!(t.os_prio, 0);
        assert_eq!(t.tid, "0x00007f1c2c0ce000");
        assert_eq!(t.nid, "0x4a03");
        assert_eq!(t.thread_id, 0x4a03);
        assert_eq!(t.status, "waiting for monitor entry [0x00007f1c1a2f9000]");
        assert_eq!(t.stack_hash, None);
        assert_eq!(t.stack_depth, None);
    }

    #[test]
    fn metadata_comes_from_first_line_and_marker() {
        let (dump, _) = parse(&dump_text(&[]));
        assert_eq!(dump.date, "2024-01-02 03:04:05");
        assert_eq!(
            dump.version_string,
            "Java HotSpot(TM) 64-Bit Server VM (25.181-b13 mixed mode):"
        );
        assert_eq!(dump.total_threads, 0);
        assert!(dump.problems.is_empty());
    }

    #[test]
    fn missing_prio_field_is_absent() {
        let line = "\"old\" #3 prio= os_prio=0 tid=0x1 nid=0x2 runnable";
        let (dump, _) = parse(&dump_text(&[line]));
        assert_eq!(dump.threads["0x1"].prio, None);
        assert!(!dump.threads["0x1"].is_daemon);
    }

    #[test]
    fn state_line_overrides_header_status() {
        let (dump, _) = parse(&dump_text(&[
            HEADER_A,
            "   java.lang.Thread.State: BLOCKED (on object monitor)",
        ]));
        assert_eq!(dump.threads["0x00007f1c2c0ce000"].status, "BLOCKED");
    }

    #[test]
    fn stack_and_locks_are_collected_in_order() {
        let (dump, sink) = parse(&dump_text(&[
            HEADER_A,
            "   java.lang.Thread.State: BLOCKED (on object monitor)",
            "\tat com.acme.Store.put(Store.java:42)",
            "\t- waiting to lock <0x000000076ab62208> (a java.lang.Object)",
            "\tat com.acme.Worker.run(Worker.java:17)",
            "\t- locked <0x000000076ab62218> (a java.lang.Object)",
            "",
            HEADER_B,
            "   java.lang.Thread.State: RUNNABLE",
            "\tat com.acme.Main.main(Main.java:5)",
        ]));
        assert!(sink.entries.is_empty(), "{:?}", sink.entries);
        assert_eq!(dump.total_threads, 2);

        let a = &dump.threads["0x00007f1c2c0ce000"];
        assert_eq!(a.stack.len(), 4);
        assert_eq!(a.stack[0], "\tat com.acme.Store.put(Store.java:42)");
        assert!(a.locks_waiting.contains("0x000000076ab62208"));
        assert!(a.locks_owned.contains("0x000000076ab62218"));

        let b = &dump.threads["0x00007f1c2c00a800"];
        assert_eq!(b.stack, vec!["\tat com.acme.Main.main(Main.java:5)"]);
        assert!(b.locks_owned.is_empty());
    }

    #[test]
    fn missing_marker_is_invalid_format() {
        let text = ["2024-01-02", HEADER_A, "\tat a.B.c(B.java:1)"].join("\n");
        let mut sink = CollectingSink::new();
        let err = parse_jstack(&text, &mut sink).unwrap_err();
        assert!(matches!(err, DumpError::InvalidFormat { .. }));

        let partial = err.partial_dump().unwrap();
        assert_eq!(partial.date, "2024-01-02");
        assert_eq!(partial.total_threads, 0);
        assert!(partial.threads.is_empty());
    }

    #[test]
    fn lines_before_marker_are_ignored() {
        let text = [
            "2024-01-02",
            HEADER_B,
            "\tat a.B.c(B.java:1)",
            "Full thread dump OpenJDK 64-Bit Server VM (17.0.2+8 mixed mode):",
            HEADER_A,
        ]
        .join("\n");
        let (dump, _) = parse(&text);
        assert_eq!(dump.total_threads, 1);
        assert!(dump.threads.contains_key("0x00007f1c2c0ce000"));
    }

    #[test]
    fn marker_on_first_line_is_only_the_date() {
        let text = ["Full thread dump X", HEADER_A].join("\n");
        let err = parse_jstack(&text, &mut CollectingSink::new()).unwrap_err();
        assert_eq!(err.partial_dump().unwrap().date, "Full thread dump X");
    }

    #[test]
    fn unmatched_header_creates_no_record_and_drops_its_lines() {
        let (dump, sink) = parse(&dump_text(&[
            HEADER_A,
            "\tat a.B.c(B.java:1)",
            "\"VM Thread\" os_prio=0 tid=0x9 nid=0xa runnable",
            "\tat should.not.Land(Anywhere.java:1)",
            HEADER_B,
        ]));
        assert_eq!(dump.total_threads, 2);
        assert_eq!(dump.threads["0x00007f1c2c0ce000"].stack.len(), 1);
        assert!(dump.threads["0x00007f1c2c00a800"].stack.is_empty());
        assert_eq!(sink.at(Severity::Debug).len(), 1);
    }

    #[test]
    fn malformed_lock_line_is_reported_but_kept_in_stack() {
        let (dump, sink) = parse(&dump_text(&[
            HEADER_A,
            "\t- locked 0x1 without brackets",
            "\t- waiting to lock <>",
        ]));
        let t = &dump.threads["0x00007f1c2c0ce000"];
        assert_eq!(t.stack.len(), 2);
        assert!(t.locks_owned.is_empty());
        assert!(t.locks_waiting.is_empty());

        let errors = sink.at(Severity::Error);
        assert_eq!(errors.len(), 2);
        assert!(errors[0].contains("Failed to find lock ID"));
        assert!(errors[1].contains("Failed to find wait lock ID"));
    }

    #[test]
    fn malformed_state_line_keeps_header_status() {
        let (dump, sink) = parse(&dump_text(&[HEADER_B, "   java.lang.Thread.State:RUNNABLE"]));
        assert_eq!(
            dump.threads["0x00007f1c2c00a800"].status,
            "runnable [0x00007f1c33ffe000]"
        );
        assert_eq!(sink.at(Severity::Warn).len(), 1);
    }

    #[test]
    fn nid_without_hex_prefix_reports_and_zeroes_id() {
        let line = "\"t\" #2 prio=5 os_prio=0 tid=0x1 nid=1234 runnable";
        let (dump, sink) = parse(&dump_text(&[line]));
        assert_eq!(dump.threads["0x1"].thread_id, 0);
        assert_eq!(sink.at(Severity::Warn).len(), 1);
    }

    #[test]
    fn duplicate_tid_keeps_the_later_thread() {
        let first = "\"a\" #2 prio=5 os_prio=0 tid=0x1 nid=0x2 runnable";
        let second = "\"b\" #3 prio=5 os_prio=0 tid=0x1 nid=0x3 runnable";
        let (dump, sink) = parse(&dump_text(&[first, second]));
        assert_eq!(dump.total_threads, 1);
        assert_eq!(dump.threads["0x1"].name, "b");
        assert_eq!(sink.at(Severity::Warn).len(), 1);
    }

    #[test]
    fn crlf_input_is_accepted() {
        let text = dump_text(&[HEADER_B, "\tat a.B.c(B.java:1)"]).replace('\n', "\r\n");
        let (dump, _) = parse(&text);
        assert_eq!(dump.date, "2024-01-02 03:04:05");
        let t = &dump.threads["0x00007f1c2c00a800"];
        assert_eq!(t.status, "runnable [0x00007f1c33ffe000]");
        assert_eq!(t.stack, vec!["\tat a.B.c(B.java:1)"]);
    }

    #[test]
    fn total_threads_matches_matched_headers() {
        let headers: Vec<String> = (0..7)
            .map(|i| format!("\"t{i}\" #{i} prio=5 os_prio=0 tid=0x{i:x}0 nid=0x{i:x} runnable"))
            .collect();
        let refs: Vec<&str> = headers.iter().map(String::as_str).collect();
        let (dump, _) = parse(&dump_text(&refs));
        assert_eq!(dump.total_threads, 7);
        assert_eq!(dump.total_threads, dump.threads.len());
    }
}
