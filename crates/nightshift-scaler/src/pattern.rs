//! Exclusion and sequence pattern grammar
//!
//! Both lists share the same three pattern forms: the catch-all `*`, a
//! prefix glob `foo-*`, and a literal. They differ in how literals match:
//! exclusions use trim-equality, while sequence elements match when the
//! element *contains* the workload name, so one element can name several
//! workloads.

/// Priority assigned when no sequence element matches a workload.
///
/// Unsequenced workloads are scaled last on the way down and first on the
/// way up.
pub const UNSEQUENCED_PRIORITY: usize = 999;

/// A compiled pattern. No regex involved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Pattern {
    /// `*` - matches every name
    Any,
    /// `foo-*` - matches names starting with the prefix
    Prefix(String),
    /// Anything else - a literal
    Literal(String),
}

impl Pattern {
    /// Compile a raw pattern string. No trimming is applied here; callers
    /// decide whether whitespace is significant.
    pub fn compile(raw: &str) -> Pattern {
        if raw == "*" {
            Pattern::Any
        } else if let Some(prefix) = raw.strip_suffix('*') {
            Pattern::Prefix(prefix.to_string())
        } else {
            Pattern::Literal(raw.to_string())
        }
    }

    /// Exclusion-style matching: literals require equality.
    fn matches_exact(&self, name: &str) -> bool {
        match self {
            Pattern::Any => true,
            Pattern::Prefix(prefix) => name.starts_with(prefix),
            Pattern::Literal(literal) => literal == name,
        }
    }

    /// Sequence-style matching: literals match when the element contains
    /// the name, so `"db cache"` covers both `db` and `cache`.
    fn matches_within(&self, name: &str) -> bool {
        match self {
            Pattern::Any => true,
            Pattern::Prefix(prefix) => name.starts_with(prefix),
            Pattern::Literal(literal) => literal.contains(name),
        }
    }
}

/// Whether a workload name is excluded from scaling.
///
/// Name and patterns are compared after trimming; empty patterns are
/// ignored. An excluded workload is never written to.
pub fn is_excluded(name: &str, exclusions: &[String]) -> bool {
    let name = name.trim();
    exclusions.iter().any(|raw| {
        let raw = raw.trim();
        !raw.is_empty() && Pattern::compile(raw).matches_exact(name)
    })
}

/// Scale priority of a workload name: the index of the first sequence
/// element that matches, or [`UNSEQUENCED_PRIORITY`] when none does.
///
/// Lower priorities scale down earlier and scale up later.
pub fn sequence_index(name: &str, sequence: &[String]) -> usize {
    sequence
        .iter()
        .position(|raw| Pattern::compile(raw).matches_within(name))
        .unwrap_or(UNSEQUENCED_PRIORITY)
}
