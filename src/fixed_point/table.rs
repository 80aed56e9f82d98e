//! Folded coefficient table interchange.
//!
//! The table is the contract between the quantizer and the streaming engine
//! (or the synthesized hardware): exactly `H` lines, each a sized Verilog hex
//! literal holding the two's-complement word, center tap last. A trailing
//! `//` comment carries the real value for readers and is ignored on parse.
//!
//! ```text
//! 16'hFFF6 // c[0] = -0.039062
//! 16'h0080 // c[1] = 0.500000
//! ```

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::error::{FirError, Result};
use crate::fixed_point::{FixedFormat, FoldedCoefficients};

/// Render the table, one literal per entry
pub fn to_table(folded: &FoldedCoefficients) -> String {
    let format = folded.format();
    let digits = format.total_bits().div_ceil(4) as usize;
    let mut out = String::new();
    for (i, &v) in folded.values().iter().enumerate() {
        let _ = writeln!(
            out,
            "{}'h{:0width$X} // c[{}] = {:.6}",
            format.total_bits(),
            format.to_bits(v),
            i,
            format.to_real(v as i64),
            width = digits
        );
    }
    out
}

/// Parse a table written for `format`
///
/// When `expected_len` is given the entry count must match it exactly.
pub fn parse_table(
    text: &str,
    format: FixedFormat,
    expected_len: Option<usize>,
) -> Result<FoldedCoefficients> {
    let mut values = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        let line_no = line_no + 1;
        let literal = line.split("//").next().unwrap_or("").trim();
        if literal.is_empty() {
            continue;
        }
        values.push(parse_literal(literal, format, line_no)?);
    }

    if let Some(expected) = expected_len
        && values.len() != expected
    {
        return Err(FirError::Interchange {
            line: text.lines().count(),
            reason: format!("expected {} entries, found {}", expected, values.len()),
        });
    }

    FoldedCoefficients::from_raw(format, values)
}

fn parse_literal(literal: &str, format: FixedFormat, line: usize) -> Result<i32> {
    let err = |reason: String| FirError::Interchange { line, reason };

    let (width, hex) = literal
        .split_once("'h")
        .or_else(|| literal.split_once("'H"))
        .ok_or_else(|| err(format!("not a sized hex literal: {:?}", literal)))?;
    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| err(format!("invalid width in {:?}", literal)))?;
    if width != format.total_bits() {
        return Err(err(format!(
            "literal width {} does not match {} ({} bits)",
            width,
            format,
            format.total_bits()
        )));
    }
    let bits = u32::from_str_radix(hex.trim().trim_end_matches(';').replace('_', "").as_str(), 16)
        .map_err(|_| err(format!("invalid hex digits in {:?}", literal)))?;
    format.from_bits(bits).map_err(|e| err(e.to_string()))
}

pub fn save_table(folded: &FoldedCoefficients, path: &Path) -> Result<()> {
    fs::write(path, to_table(folded))?;
    Ok(())
}

pub fn load_table(
    path: &Path,
    format: FixedFormat,
    expected_len: Option<usize>,
) -> Result<FoldedCoefficients> {
    let text = fs::read_to_string(path)?;
    parse_table(&text, format, expected_len)
}
