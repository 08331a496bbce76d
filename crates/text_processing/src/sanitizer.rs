//! Field-level cleaning of untrusted submissions
//!
//! Nothing in here fails: every function returns a best-effort cleaned value,
//! or an empty string when the input is unusable.
//!
//! `sanitize_string` runs decode / strip passes until the text stops
//! changing, so markup smuggled in as `&amp;lt;script&amp;gt;` is removed just
//! like a literal `<script>`. Every pass that changes the text makes it
//! strictly shorter, which bounds the loop.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use leadflow_config::constants::field_limits;
use leadflow_config::FieldLimits;
use leadflow_core::{Attribution, LeadSubmission, SanitizedLead};

const ELLIPSIS: &str = "...";

/// Minimum digits for a usable phone number
const MIN_PHONE_DIGITS: usize = 7;

/// Names shorter than this are checked for placeholder tokens
const PLACEHOLDER_MAX_LEN: usize = 10;

/// Tokens that mark a short value as junk typed to get past a required field
const PLACEHOLDER_TOKENS: &[&str] = &[
    "test", "asdf", "qwer", "zxcv", "xxx", "aaa", "123", "null", "none", "n/a",
];

static ENTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z][a-zA-Z0-9]{1,31});").unwrap()
});
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^<>]*>").unwrap());
static LINE_BREAK_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\n\s*").unwrap());
static SPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\S\n]+").unwrap());
static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9._%+\-]+@[a-z0-9.\-]+\.[a-z]{2,}$").unwrap());

/// Clean a free-text field and cap it at `max_length` characters
///
/// Line breaks survive as single `\n`; every other whitespace run becomes a
/// single space. Over-long text is cut at the last whitespace before the
/// limit and gets a trailing `...` (counted against the limit).
pub fn sanitize_string(value: &str, max_length: usize) -> String {
    let mut current = value.to_string();
    loop {
        let next = strip_pass(&current);
        if next == current {
            break;
        }
        current = next;
    }

    let collapsed = LINE_BREAK_RUN.replace_all(&current, "\n");
    let collapsed = SPACE_RUN.replace_all(&collapsed, " ");
    truncate_at_word(collapsed.trim(), max_length)
}

fn strip_pass(text: &str) -> String {
    let decoded = ENTITY.replace_all(text, |caps: &Captures| {
        decode_entity(&caps[1]).map(String::from).unwrap_or_default()
    });
    let untagged = TAG.replace_all(&decoded, "");
    untagged
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect()
}

/// Decode the body of an entity (without `&` and `;`); `None` drops it
fn decode_entity(body: &str) -> Option<char> {
    if let Some(num) = body.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        return char::from_u32(code).filter(|c| *c != '\0');
    }

    let c = match body {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        "copy" => '\u{a9}',
        "reg" => '\u{ae}',
        "trade" => '\u{2122}',
        "hellip" => '\u{2026}',
        "ndash" => '\u{2013}',
        "mdash" => '\u{2014}',
        "lsquo" => '\u{2018}',
        "rsquo" => '\u{2019}',
        "ldquo" => '\u{201c}',
        "rdquo" => '\u{201d}',
        "euro" => '\u{20ac}',
        "pound" => '\u{a3}',
        "cent" => '\u{a2}',
        "yen" => '\u{a5}',
        _ => return None,
    };
    Some(c)
}

fn truncate_at_word(text: &str, max_length: usize) -> String {
    if text.chars().count() <= max_length {
        return text.to_string();
    }

    if max_length < ELLIPSIS.len() {
        let head: String = text.chars().take(max_length).collect();
        return head.trim_end().to_string();
    }

    let budget = max_length - ELLIPSIS.len();
    let head: String = text.chars().take(budget).collect();
    let next_is_break = text
        .chars()
        .nth(budget)
        .map(char::is_whitespace)
        .unwrap_or(true);

    let cut = if next_is_break {
        head.as_str()
    } else {
        match head.rfind(char::is_whitespace) {
            Some(idx) if idx > 0 => &head[..idx],
            _ => head.as_str(),
        }
    };

    format!("{}{}", cut.trim_end(), ELLIPSIS)
}

/// Lowercase, drop embedded whitespace, and validate `local@domain.tld`
pub fn sanitize_email(value: &str) -> String {
    let email: String = value
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();

    if email.len() > field_limits::EMAIL || email.contains("..") || !EMAIL.is_match(&email) {
        return String::new();
    }
    email
}

/// Keep digits, `+()-` and spaces; empty unless at least 7 digits remain
pub fn sanitize_phone(value: &str) -> String {
    let kept: String = value
        .chars()
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .filter(|c| c.is_ascii_digit() || matches!(c, '+' | '(' | ')' | '-' | ' '))
        .collect();

    let digits = kept.chars().filter(char::is_ascii_digit).count();
    if digits < MIN_PHONE_DIGITS {
        return String::new();
    }

    SPACE_RUN.replace_all(kept.trim(), " ").into_owned()
}

/// `sanitize_string` with the default name cap, then placeholder rejection
pub fn sanitize_name(value: &str) -> String {
    sanitize_name_with_limit(value, field_limits::NAME)
}

fn sanitize_name_with_limit(value: &str, max_length: usize) -> String {
    let name = sanitize_string(value, max_length);
    if is_placeholder(&name) {
        return String::new();
    }
    name
}

/// Empty, or a short value containing an obvious placeholder token
pub fn is_placeholder(value: &str) -> bool {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return true;
    }
    if trimmed.chars().count() >= PLACEHOLDER_MAX_LEN {
        return false;
    }
    let lower = trimmed.to_lowercase();
    PLACEHOLDER_TOKENS.iter().any(|token| lower.contains(token))
}

/// Clean every field of a raw submission and bind it to `tenant_id`
///
/// The tenant id is taken verbatim from the caller and never from the payload.
pub fn sanitize_lead_data(
    tenant_id: &str,
    raw: &LeadSubmission,
    limits: &FieldLimits,
) -> SanitizedLead {
    let text = |field: &Option<String>, max: usize| {
        field
            .as_deref()
            .map(|v| sanitize_string(v, max))
            .unwrap_or_default()
    };

    SanitizedLead {
        tenant_id: tenant_id.to_string(),
        email: raw.email.as_deref().map(sanitize_email).unwrap_or_default(),
        phone: raw.phone.as_deref().map(sanitize_phone).unwrap_or_default(),
        name: raw
            .name
            .as_deref()
            .map(|v| sanitize_name_with_limit(v, limits.name))
            .unwrap_or_default(),
        company: text(&raw.company, limits.company),
        source: text(&raw.source, limits.source),
        notes: text(&raw.notes, limits.notes),
        deal_value: raw.deal_value.filter(|v| v.is_finite() && *v >= 0.0),
        attribution: Attribution {
            referrer: text(&raw.referrer, limits.attribution),
            utm_source: text(&raw.utm_source, limits.attribution),
            utm_medium: text(&raw.utm_medium, limits.attribution),
            utm_campaign: text(&raw.utm_campaign, limits.attribution),
        },
    }
}
