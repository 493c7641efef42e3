use once_cell::sync::Lazy;
use regex::Regex;

/// Longest leading decimal literal, e.g. `12.5` in `"12.5 shares"`.
static LEADING_DECIMAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?")
        .expect("leading decimal pattern should be valid")
});

/// Trim whitespace and lowercase, used for header matching.
pub fn normalize_header(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Parse a broker-formatted amount such as `"1,234.50"`.
///
/// Thousands separators are stripped first, then the longest leading decimal
/// literal is taken, so trailing units (`"10 sh"`) are tolerated while text
/// with no leading number yields `None`. Non-finite results are rejected.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned = raw.replace(',', "");
    let literal = LEADING_DECIMAL.find(cleaned.trim_start())?;
    let value: f64 = literal.as_str().parse().ok()?;
    value.is_finite().then_some(value)
}
