//! `--seeds` parsing: single seeds and ranges, separated by commas.
use anyhow::{Context, Result, bail, ensure};

/// Most seeds a single range may expand to.
const MAX_RANGE: u64 = 10_000;

/// Parse a seed list such as `1,5,10..13,20..=21`.
///
/// `a..b` is half-open and `a..=b` inclusive; blank entries are skipped.
///
/// # Errors
///
/// Returns an error for malformed numbers, empty or oversized ranges, or a
/// list with no seeds at all.
pub fn parse_seeds(spec: &str) -> Result<Vec<u64>> {
    let mut seeds = Vec::new();
    for entry in spec.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        match entry.split_once("..") {
            None => seeds.push(parse_one(entry)?),
            Some((start, end)) => {
                let start = parse_one(start)?;
                let end = match end.strip_prefix('=') {
                    Some(last) => parse_one(last)?
                        .checked_add(1)
                        .with_context(|| format!("range '{entry}' overflows"))?,
                    None => parse_one(end)?,
                };
                ensure!(start < end, "range '{entry}' is empty");
                ensure!(
                    end - start <= MAX_RANGE,
                    "range '{entry}' expands past {MAX_RANGE} seeds"
                );
                seeds.extend(start..end);
            }
        }
    }
    if seeds.is_empty() {
        bail!("no seeds given");
    }
    Ok(seeds)
}

fn parse_one(text: &str) -> Result<u64> {
    let text = text.trim();
    text.parse().with_context(|| format!("invalid seed '{text}'"))
}
