use serde::{Deserialize, Serialize};

/// A cookie attached to every request of a run.
///
/// Only `name` and `value` go on the wire (as part of the `Cookie` request
/// header); the remaining attributes are kept so a cookie file round-trips
/// what it describes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub path: Option<String>,
    pub domain: Option<String>,
    pub expires: Option<String>,
    pub max_age: Option<i64>,
    pub secure: bool,
    pub http_only: bool,
    pub raw: Option<String>,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            ..Default::default()
        }
    }

    /// Parses one cookie-file line: `~`-separated `attr=value` fields.
    ///
    /// Attribute names are matched case-insensitively. Unknown attributes and
    /// unparsable values are ignored. Returns `None` when no name was given.
    pub fn parse_line(line: &str) -> Option<Self> {
        let mut cookie = Cookie::default();
        for field in line.split('~') {
            let Some((attr, value)) = field.split_once('=') else {
                continue;
            };
            cookie.set_attribute(attr.trim(), value.trim());
        }
        (!cookie.name.is_empty()).then_some(cookie)
    }

    fn set_attribute(&mut self, attr: &str, value: &str) {
        match attr.to_ascii_lowercase().as_str() {
            "name" => self.name = value.to_owned(),
            "value" => self.value = value.to_owned(),
            "path" => self.path = Some(value.to_owned()),
            "domain" => self.domain = Some(value.to_owned()),
            "expires" => self.expires = Some(value.to_owned()),
            "max-age" | "maxage" => self.max_age = value.parse().ok(),
            "secure" => self.secure = parse_flag(value),
            "http-only" | "httponly" => self.http_only = parse_flag(value),
            "raw" => self.raw = Some(value.to_owned()),
            other => tracing::debug!("Ignoring unknown cookie attribute {other:?}"),
        }
    }

    /// The `name=value` pair sent in the `Cookie` header.
    pub fn pair(&self) -> String {
        format!("{}={}", self.name, self.value)
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_recognized_attributes() {
        let cookie = Cookie::parse_line(
            "name=session~value=abc123~path=/~domain=example.com~expires=Wed, 21 Oct 2026 07:28:00 GMT~max-age=3600~secure=true~http-only=1~raw=session=abc123",
        )
        .unwrap();

        assert_eq!(cookie.name, "session");
        assert_eq!(cookie.value, "abc123");
        assert_eq!(cookie.path.as_deref(), Some("/"));
        assert_eq!(cookie.domain.as_deref(), Some("example.com"));
        assert_eq!(
            cookie.expires.as_deref(),
            Some("Wed, 21 Oct 2026 07:28:00 GMT")
        );
        assert_eq!(cookie.max_age, Some(3600));
        assert!(cookie.secure);
        assert!(cookie.http_only);
        assert_eq!(cookie.raw.as_deref(), Some("session=abc123"));
    }

    #[test]
    fn unknown_attributes_are_ignored() {
        let cookie = Cookie::parse_line("Name=id~Value=7~SameSite=Lax~garbage").unwrap();
        assert_eq!(cookie, Cookie::new("id", "7"));
    }

    #[test]
    fn nameless_cookie_is_dropped() {
        assert_eq!(Cookie::parse_line("value=orphan~path=/"), None);
        assert_eq!(Cookie::parse_line(""), None);
    }

    #[test]
    fn pair_renders_name_and_value() {
        assert_eq!(Cookie::new("a", "b").pair(), "a=b");
    }
}
