//! Loci and natural ordering of QPU component names.
//!
//! Component names such as `QB10` are ordered by their numeric suffix rather than
//! byte-wise, so `QB2 < QB10` and `COMPR1 < QB1`.

use std::cmp::Ordering;

/// Names of the QPU components an instruction acts on, e.g. `["QB1", "QB2"]`.
pub type Locus = Vec<String>;

/// Separator used when a locus is written as a single string key.
pub const LOCUS_SEPARATOR: &str = "__";

/// Build a locus from anything that yields string-like names.
pub fn locus<I, S>(components: I) -> Locus
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    components.into_iter().map(Into::into).collect()
}

/// Iterator over alternating runs of digits and non-digits.
struct Chunks<'a> {
    rest: &'a str,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let first = self.rest.chars().next()?;
        let digits = first.is_ascii_digit();
        let end = self
            .rest
            .char_indices()
            .find(|(_, c)| c.is_ascii_digit() != digits)
            .map_or(self.rest.len(), |(i, _)| i);
        let (chunk, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(chunk)
    }
}

fn compare_chunks(x: &str, y: &str) -> Ordering {
    let x_digits = x.starts_with(|c: char| c.is_ascii_digit());
    let y_digits = y.starts_with(|c: char| c.is_ascii_digit());
    match (x_digits, y_digits) {
        (true, true) => {
            let xt = x.trim_start_matches('0');
            let yt = y.trim_start_matches('0');
            xt.len().cmp(&yt.len()).then_with(|| xt.cmp(yt))
        }
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => x.cmp(y),
    }
}

/// Compare two component names in natural order.
///
/// Names that are equal under natural ordering (`QB01`, `QB1`) fall back to
/// byte-wise comparison so the result is a total order.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut xs = Chunks { rest: a };
    let mut ys = Chunks { rest: b };
    loop {
        match (xs.next(), ys.next()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => match compare_chunks(x, y) {
                Ordering::Equal => {}
                ord => return ord,
            },
        }
    }
}

/// Compare two loci component by component in natural order.
pub fn natural_locus_cmp(a: &[String], b: &[String]) -> Ordering {
    for (x, y) in a.iter().zip(b) {
        match natural_cmp(x, y) {
            Ordering::Equal => {}
            ord => return ord,
        }
    }
    a.len().cmp(&b.len())
}

/// Sort component names in natural order and remove duplicates.
pub fn sort_components(components: &mut Vec<String>) {
    components.sort_by(|a, b| natural_cmp(a, b));
    components.dedup();
}

/// Sort loci in natural order and remove duplicates.
pub fn sort_loci(loci: &mut Vec<Locus>) {
    loci.sort_by(|a, b| natural_locus_cmp(a, b));
    loci.dedup();
}

/// Join a locus into a single string key.
pub fn locus_key(locus: &[String]) -> String {
    locus.join(LOCUS_SEPARATOR)
}

/// Split a string key back into a locus.
pub fn parse_locus_key(key: &str) -> Locus {
    if key.is_empty() {
        return Vec::new();
    }
    key.split(LOCUS_SEPARATOR).map(str::to_string).collect()
}

/// Serde adapter for maps keyed by locus, written as `{"QB1__QB2": value}`.
pub mod locus_keyed {
    use std::collections::BTreeMap;

    use serde::ser::SerializeMap;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::{Locus, locus_key, parse_locus_key};

    pub fn serialize<S>(map: &BTreeMap<Locus, String>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut out = serializer.serialize_map(Some(map.len()))?;
        for (locus, value) in map {
            out.serialize_entry(&locus_key(locus), value)?;
        }
        out.end()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BTreeMap<Locus, String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = BTreeMap::<String, String>::deserialize(deserializer)?;
        Ok(raw
            .into_iter()
            .map(|(key, value)| (parse_locus_key(&key), value))
            .collect())
    }
}
