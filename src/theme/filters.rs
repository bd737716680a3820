//! Tera filters and functions shared by every template
//!
//! - `urlize_blank`: links in text become `<a target="_blank" rel="nofollow">`.
//!   Output is already escaped, pipe it through `safe`.
//! - `hash(key=..)`: dictionary lookup, `null` when missing
//! - `escapejson`: JSON encoding with `/` escaped, safe inside `<script>`
//! - `urljson`: absolute URL of a path or object as a JSON string
//! - `humanize_datetime`: "3 hours ago" style timestamps
//! - `urlfull(path=..)`: `http://www.<domain><path>`

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use tera::Tera;

static URL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:https?://|www\.)[^\s<>]+").expect("valid url pattern")
});

/// Register every filter and function on `tera`
pub fn register(tera: &mut Tera, domain: &str) {
    tera.register_filter("urlize_blank", urlize_blank_filter);
    tera.register_filter("hash", hash_filter);
    tera.register_filter("escapejson", escapejson_filter);
    tera.register_filter("humanize_datetime", humanize_datetime_filter);

    let json_domain = domain.to_string();
    tera.register_filter(
        "urljson",
        move |value: &Value, _: &HashMap<String, Value>| -> tera::Result<Value> {
            let path = match value {
                Value::String(path) => path.as_str(),
                Value::Object(map) => map
                    .get("absolute_url")
                    .and_then(Value::as_str)
                    .ok_or_else(|| tera::Error::msg("urljson: object has no absolute_url"))?,
                _ => return Err(tera::Error::msg("urljson: expected a path or an object")),
            };
            Ok(Value::String(escape_json(&Value::String(format!(
                "http://{}{}",
                json_domain, path
            )))))
        },
    );

    let full_domain = domain.to_string();
    tera.register_function(
        "urlfull",
        move |args: &HashMap<String, Value>| -> tera::Result<Value> {
            let path = args
                .get("path")
                .and_then(Value::as_str)
                .ok_or_else(|| tera::Error::msg("urlfull: missing `path` argument"))?;
            Ok(Value::String(full_url(&full_domain, path)))
        },
    );
}

pub fn full_url(domain: &str, path: &str) -> String {
    format!("http://www.{}{}", domain, path)
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Turn URLs in `text` into links that open in a new window
pub fn urlize_blank(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for found in URL_PATTERN.find_iter(text) {
        let raw = found.as_str();
        let url = raw.trim_end_matches(|c: char| ".,;:!?)'\"".contains(c));
        let end = found.start() + url.len();

        out.push_str(&escape_html(&text[last..found.start()]));
        let href = if url.to_ascii_lowercase().starts_with("www.") {
            format!("http://{}", url)
        } else {
            url.to_string()
        };
        out.push_str(&format!(
            "<a target=\"_blank\" rel=\"nofollow\" href=\"{}\">{}</a>",
            escape_html(&href),
            escape_html(url)
        ));
        last = end;
    }
    out.push_str(&escape_html(&text[last..]));
    out
}

fn urlize_blank_filter(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    match value {
        Value::String(text) => Ok(Value::String(urlize_blank(text))),
        Value::Null => Ok(Value::String(String::new())),
        other => Ok(Value::String(urlize_blank(&other.to_string()))),
    }
}

fn hash_filter(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let key = match args.get("key") {
        Some(Value::String(key)) => key.clone(),
        Some(other) => other.to_string(),
        None => return Err(tera::Error::msg("hash: missing `key` argument")),
    };
    Ok(value
        .as_object()
        .and_then(|map| map.get(&key))
        .cloned()
        .unwrap_or(Value::Null))
}

/// JSON text with `/` escaped so `</script>` cannot close a script block
pub fn escape_json(value: &Value) -> String {
    value.to_string().replace('/', "\\/")
}

fn escapejson_filter(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    Ok(Value::String(escape_json(value)))
}

/// Human readable age of `then` as seen at `now`
pub fn humanize_since(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = now.signed_duration_since(then);
    let days = delta.num_days();

    fn plural(n: i64, unit: &str) -> String {
        if n == 1 {
            format!("{} {} ago", n, unit)
        } else {
            format!("{} {}s ago", n, unit)
        }
    }

    if days / 365 > 0 {
        return plural(days / 365, "year");
    }
    if days / 7 > 0 {
        return plural(days / 7, "week");
    }
    if days > 0 {
        return plural(days, "day");
    }
    let hours = delta.num_hours();
    if hours > 0 {
        return plural(hours, "hour");
    }
    let minutes = delta.num_minutes();
    if minutes > 0 {
        return plural(minutes, "minute");
    }
    "a few moments ago".to_string()
}

fn humanize_datetime_filter(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    let then = match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| tera::Error::msg(format!("humanize_datetime: {}", e)))?,
        Value::Number(n) => n
            .as_i64()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .ok_or_else(|| tera::Error::msg("humanize_datetime: invalid timestamp"))?,
        _ => return Err(tera::Error::msg("humanize_datetime: expected a datetime")),
    };
    Ok(Value::String(humanize_since(then, Utc::now())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;
    use tera::Context;

    fn engine() -> Tera {
        let mut tera = Tera::default();
        register(&mut tera, "example.com");
        tera
    }

    fn render(template: &str, context: &Context) -> String {
        engine().render_str(template, context).unwrap()
    }

    #[test]
    fn test_urlize_blank() {
        assert_eq!(
            urlize_blank("see http://example.com/a."),
            "see <a target=\"_blank\" rel=\"nofollow\" href=\"http://example.com/a\">http://example.com/a</a>."
        );
        assert_eq!(
            urlize_blank("www.example.com"),
            "<a target=\"_blank\" rel=\"nofollow\" href=\"http://www.example.com\">www.example.com</a>"
        );
        assert_eq!(urlize_blank("<b>no links</b>"), "&lt;b&gt;no links&lt;/b&gt;");
    }

    #[test]
    fn test_hash_filter() {
        let mut context = Context::new();
        context.insert("d", &json!({"a": "x", "1": "one"}));
        assert_eq!(render("{{ d | hash(key='a') }}", &context), "x");
        assert_eq!(render("{{ d | hash(key=1) }}", &context), "one");
        assert_eq!(render("{% if d | hash(key='zz') %}y{% else %}n{% endif %}", &context), "n");
    }

    #[test]
    fn test_escape_json() {
        assert_eq!(escape_json(&json!("</script>")), r#""<\/script>""#);
        assert_eq!(escape_json(&json!({"a": 1})), r#"{"a":1}"#);
    }

    #[test]
    fn test_urljson_and_urlfull() {
        let mut context = Context::new();
        context.insert("object", &json!({"absolute_url": "/contents/a"}));
        assert_eq!(
            render("{{ object | urljson | safe }}", &context),
            r#""http:\/\/example.com\/contents\/a""#
        );
        assert_eq!(
            render("{{ urlfull(path='/contents/a') }}", &Context::new()),
            "http://www.example.com/contents/a"
        );
    }

    #[test]
    fn test_humanize_since() {
        let now = Utc::now();
        assert_eq!(humanize_since(now - Duration::seconds(20), now), "a few moments ago");
        assert_eq!(humanize_since(now - Duration::minutes(1), now), "1 minute ago");
        assert_eq!(humanize_since(now - Duration::minutes(5), now), "5 minutes ago");
        assert_eq!(humanize_since(now - Duration::hours(3), now), "3 hours ago");
        assert_eq!(humanize_since(now - Duration::days(2), now), "2 days ago");
        assert_eq!(humanize_since(now - Duration::days(15), now), "2 weeks ago");
        assert_eq!(humanize_since(now - Duration::days(800), now), "2 years ago");
        assert_eq!(humanize_since(now + Duration::hours(1), now), "a few moments ago");
    }

    #[test]
    fn test_humanize_filter_reads_rfc3339() {
        let mut context = Context::new();
        context.insert("when", &(Utc::now() - Duration::hours(2)));
        assert_eq!(render("{{ when | humanize_datetime }}", &context), "2 hours ago");
    }
}
