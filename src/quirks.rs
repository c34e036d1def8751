//! Rewrites between the loose JSON dialect (bare integers) and canonical JSON (integers as
//! quoted decimal strings).
//!
//! The rewrite is textual. Only integer scalars in value position (after `:`, `[` or `,` and
//! before `,`, `]`, `}` or the end of input) are touched, so object keys and hex strings pass
//! through unchanged.

use lazy_static::lazy_static;
use regex::bytes::Regex;

lazy_static! {
    static ref BARE_INTEGER: Regex =
        Regex::new(r"(?P<pre>[:\[,]\s*)(?P<num>-?\d+)(?P<post>\s*[,\]\}])")
            .expect("valid bare integer pattern");
    static ref QUOTED_INTEGER: Regex =
        Regex::new(r#"(?P<pre>[:\[,]\s*)"(?P<num>-?\d+)"(?P<post>\s*[,\]\}])"#)
            .expect("valid quoted integer pattern");
    static ref BARE_DOCUMENT: Regex = Regex::new(r"^(?P<pre>\s*)(?P<num>-?\d+)(?P<post>\s*)$")
        .expect("valid bare document pattern");
    static ref QUOTED_DOCUMENT: Regex =
        Regex::new(r#"^(?P<pre>\s*)"(?P<num>-?\d+)"(?P<post>\s*)$"#)
            .expect("valid quoted document pattern");
}

const QUOTE: &[u8] = br#"${pre}"${num}"${post}"#;
const UNQUOTE: &[u8] = b"${pre}${num}${post}";

/// Loose wire JSON to canonical JSON.
pub fn to_canonical(input: &[u8]) -> Vec<u8> {
    let document = BARE_DOCUMENT.replace(input, QUOTE);
    rewrite_until_stable(&BARE_INTEGER, &document, QUOTE)
}

/// Canonical JSON to the loose wire dialect.
pub fn to_loose(input: &[u8]) -> Vec<u8> {
    let document = QUOTED_DOCUMENT.replace(input, UNQUOTE);
    rewrite_until_stable(&QUOTED_INTEGER, &document, UNQUOTE)
}

// Adjacent matches share a delimiter (`[1,2,3]`), so a single pass only rewrites every other
// element.
fn rewrite_until_stable(pattern: &Regex, input: &[u8], replacement: &[u8]) -> Vec<u8> {
    let mut current = input.to_vec();
    loop {
        let next = pattern.replace_all(&current, replacement).into_owned();
        if next == current {
            return current;
        }
        current = next;
    }
}
