use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Everything parsed out of one jstack capture, plus the aggregates the
/// analyzer fills in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadDump {
    /// first line of the input, verbatim
    pub date: String,
    /// text after the "Full thread dump " marker
    pub version_string: String,
    /// stack fingerprint -> number of threads sharing it
    pub by_stack: BTreeMap<String, usize>,
    /// raw status token -> number of threads
    pub by_status: BTreeMap<String, usize>,
    /// lock id -> tid of the thread recorded as holding it (last writer wins)
    pub lock_owners: BTreeMap<String, String>,
    /// tid -> thread
    pub threads: BTreeMap<String, JavaThread>,
    pub total_threads: usize,
    /// sorted; rebuilt on every dump-level analysis
    pub problems: Vec<String>,
}

impl ThreadDump {
    /// Pretty JSON, tab indented.
    pub fn to_json(&self) -> Result<String> {
        to_json_pretty(self)
    }

    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn thread(&self, tid: &str) -> Option<&JavaThread> {
        self.threads.get(tid)
    }

    /// Name of the thread registered under `tid`, empty when unknown.
    pub fn thread_name(&self, tid: &str) -> &str {
        self.threads.get(tid).map(|t| t.name.as_str()).unwrap_or("")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JavaThread {
    pub name: String,
    /// the `#<n>` token, kept opaque
    pub internal_number: String,
    pub is_daemon: bool,
    pub status: String,
    /// missing from older dump formats
    pub prio: Option<u32>,
    pub os_prio: u32,
    /// nid parsed from hex
    pub thread_id: u64,
    pub tid: String,
    pub nid: String,
    pub stack: Vec<String>,
    /// Unset until per-thread analysis runs.
    #[serde(default)]
    pub stack_hash: Option<String>,
    /// Unset until per-thread analysis runs.
    #[serde(default)]
    pub stack_depth: Option<usize>,
    pub locks_owned: BTreeSet<String>,
    pub locks_waiting: BTreeSet<String>,
}

impl JavaThread {
    pub fn is_analyzed(&self) -> bool {
        self.stack_hash.is_some() && self.stack_depth.is_some()
    }

    /// Computes the stack fingerprint and depth, then encodes the thread.
    pub fn to_json(&mut self) -> Result<String> {
        crate::analysis::passes::shape_stacks::apply_shape(self);
        to_json_pretty(self)
    }
}

fn to_json_pretty<T: Serialize>(v: &T) -> Result<String> {
    let mut buf = Vec::new();
    let fmt = serde_json::ser::PrettyFormatter::with_indent(b"\t");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, fmt);
    v.serialize(&mut ser)?;
    // serde_json only ever writes valid UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
