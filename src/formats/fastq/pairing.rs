use regex::Regex;
use std::sync::OnceLock;

/// Mate templates, tried in order; the first capture is the mate number
const PAIR_PATTERNS: &[&str] = &[
    r"(?i)[._-]R([12])(?:[._-]|$)",
    r"(?i)[._-]read([12])(?:[._-]|$)",
    r"(?i)[._-]([12])\.(?:fastq|fq)(?:\.gz)?$",
];

fn pair_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        PAIR_PATTERNS
            .iter()
            .map(|p| Regex::new(p).expect("static mate pattern"))
            .collect()
    })
}

/// Mate label ("R1"/"R2") implied by a file name, if any
pub fn detect_read_pair(file_name: &str) -> Option<String> {
    pair_patterns().iter().find_map(|re| {
        re.captures(file_name)
            .and_then(|caps| caps.get(1))
            .map(|m| format!("R{}", m.as_str()))
    })
}
