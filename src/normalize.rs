//! Body text cleanup applied before indexing.
//!
//! Email bodies arrive full of tracking links and invisible formatting
//! characters that add noise to embeddings. [`normalize`] strips both.

use regex::Regex;
use std::sync::LazyLock;

/// Scheme-prefixed URL: `http://…`, `https://…`, `ftp://…`, etc.,
/// up to the next whitespace.
static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z][A-Za-z0-9+.-]*://\S+").expect("valid URL regex"));

/// Unicode "format" characters (category `Cf`): zero-width joiners,
/// directional marks, soft hyphens and friends.
static FORMAT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\p{Cf}").expect("valid Cf regex"));

/// Strip URLs and format control characters from `raw`.
///
/// Deletions insert no placeholder. Pure function, idempotent, safe to
/// call concurrently. Format characters are removed first so that a URL
/// split by a zero-width character is still recognized and deleted.
pub fn normalize(raw: &str) -> String {
    let without_format = FORMAT_RE.replace_all(raw, "");
    URL_RE.replace_all(&without_format, "").into_owned()
}
