//! Rank definition documents: one rank per line, `name, colour`.
//!
//! The colour field is either `None` (platform default) or `#RRGGBB`.
//! Parsing is fail-fast: the first bad line aborts the whole load so a
//! half-read definition is never installed.

use crate::colour::Colour;
use crate::error::{ColourFormatError, ColourFormatKind};
use crate::rank::Rank;

/// Parse a whole definition document.
///
/// Blank lines are skipped but still count toward the 1-based line numbers
/// reported in errors, so the number matches the file as edited.
pub fn parse_definition(text: &str) -> Result<Vec<Rank>, ColourFormatError> {
    let mut ranks = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        if raw.trim().is_empty() {
            continue;
        }
        ranks.push(parse_line(index + 1, raw)?);
    }
    Ok(ranks)
}

fn parse_line(line: usize, raw: &str) -> Result<Rank, ColourFormatError> {
    let fail = |kind, text: &str| ColourFormatError { line, text: text.to_owned(), kind };
    let Some((name, colour)) = raw.split_once(',') else {
        return Err(fail(ColourFormatKind::MissingColour, raw.trim()));
    };
    let (name, colour) = (name.trim(), colour.trim());
    let colour = Colour::parse(colour).map_err(|kind| fail(kind, colour))?;
    Ok(Rank::new(name, colour))
}
