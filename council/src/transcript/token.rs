//! Line tokenizer for raw debate transcripts.

use std::sync::LazyLock;

use regex::Regex;

use crate::roster::Team;

/// Turn header: `[Pro-A] (PRO):` with a case-insensitive team tag.
static HEADER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\[(.*?)\] \((PRO|CON)\):").expect("HEADER_PATTERN regex should compile")
});

/// Prefixes of structural lines (round separators, banners, timestamps).
pub const METADATA_PREFIXES: [&str; 5] = ["--- ROUND", "DEBATE:", "====", "Started:", "Ended:"];

/// One classified transcript line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    /// Start of a new turn.
    Header { name: &'a str, team: Team },
    /// Structural marker, dropped.
    Metadata,
    /// Any other line, kept verbatim.
    Content(&'a str),
}

/// Classify a single line.
pub fn classify_line(line: &str) -> Token<'_> {
    if let Some(caps) = HEADER_PATTERN.captures(line) {
        let name = caps.get(1).map_or("", |m| m.as_str());
        let team = Team::from_tag(caps.get(2).map_or("", |m| m.as_str()));
        return Token::Header { name, team };
    }

    let trimmed = line.trim();
    if METADATA_PREFIXES.iter().any(|p| trimmed.starts_with(p)) {
        return Token::Metadata;
    }

    Token::Content(line)
}

/// Tokenize a whole transcript, one token per `\n`-separated line.
pub fn tokenize(transcript: &str) -> impl Iterator<Item = Token<'_>> {
    transcript.split('\n').map(classify_line)
}
