//! Prompt definitions compiled into the binary.
//!
//! Each pipeline stage has one prompt. A workspace can override any of them
//! by dropping a file with the same id into `.casefile/prompts/`.

/// Relevance gate judge prompt.
pub const GATE: &str = "investigation.gate";

/// Query expansion prompt.
pub const EXPAND: &str = "investigation.expand";

/// Per-document relevance rating prompt.
pub const RERANK: &str = "investigation.rerank";

/// Report synthesis prompt.
pub const REPORT: &str = "investigation.report";

/// Raw YAML sources of the built-in prompts, keyed by id.
pub const BUILTIN_SOURCES: [(&str, &str); 4] = [
    (GATE, include_str!("../prompts/investigation.gate.yml")),
    (EXPAND, include_str!("../prompts/investigation.expand.yml")),
    (RERANK, include_str!("../prompts/investigation.rerank.yml")),
    (REPORT, include_str!("../prompts/investigation.report.yml")),
];
