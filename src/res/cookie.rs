use std::collections::HashMap;

/// Options for the SameSite attribute of cookies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    /// Sets the SameSite attribute to Lax.
    Lax,
    /// Sets the SameSite attribute to Strict.
    Strict,
    /// Sets the SameSite attribute to None. Requires `Secure`; serialisation
    /// emits both.
    None,
}

impl SameSite {
    fn as_str(&self) -> &'static str {
        match self {
            SameSite::Lax => "Lax",
            SameSite::Strict => "Strict",
            SameSite::None => "None",
        }
    }
}

/// Attributes for an outbound cookie.
///
/// Everything defaults to absent so a bare `name=value` pair round-trips
/// through the inbound parser unchanged.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CookieOptions {
    /// Sets the Max-Age attribute (in seconds).
    pub max_age: Option<i64>,
    /// Sets the Expires attribute, as a UNIX timestamp in seconds.
    pub expires: Option<i64>,
    /// Sets the Path attribute.
    pub path: Option<String>,
    /// Sets the Domain attribute.
    pub domain: Option<String>,
    /// Sets the Secure flag.
    pub secure: bool,
    /// Sets the HttpOnly flag.
    pub http_only: bool,
    /// Sets the SameSite attribute.
    pub same_site: Option<SameSite>,
}

/// An outbound cookie: one `Set-Cookie` header value per entry.
#[derive(Debug, Clone, PartialEq)]
pub struct SetCookie {
    /// Cookie name.
    pub name: String,
    /// Cookie value.
    pub value: String,
    /// Attributes appended after the pair.
    pub options: CookieOptions,
}

impl SetCookie {
    pub(crate) fn new<N: Into<String>, V: Into<String>>(
        name: N,
        value: V,
        options: CookieOptions,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            options,
        }
    }

    /// A deletion cookie: empty value, `Max-Age=0`.
    pub(crate) fn expire_now<N: Into<String>>(name: N, path: Option<String>) -> Self {
        Self {
            name: name.into(),
            value: String::new(),
            options: CookieOptions {
                max_age: Some(0),
                path,
                ..CookieOptions::default()
            },
        }
    }

    /// Serialises this cookie into a `Set-Cookie` header value.
    ///
    /// Attributes are emitted in the order Max-Age, Expires, Path, Domain,
    /// Secure, HttpOnly, SameSite. `SameSite=None` forces the Secure flag.
    pub fn to_header_value(&self) -> String {
        let mut out = format!("{}={}", self.name, self.value);

        if let Some(max_age) = self.options.max_age {
            out.push_str("; Max-Age=");
            out.push_str(&max_age.to_string());
        }
        if let Some(timestamp) = self.options.expires {
            if let Ok(when) = cookie::time::OffsetDateTime::from_unix_timestamp(timestamp) {
                if let Ok(formatted) =
                    when.format(&cookie::time::format_description::well_known::Rfc2822)
                {
                    out.push_str("; Expires=");
                    // RFC 6265 wants GMT, Rfc2822 emits a numeric offset.
                    out.push_str(&formatted.replace("+0000", "GMT"));
                }
            }
        }
        if let Some(path) = &self.options.path {
            out.push_str("; Path=");
            out.push_str(path);
        }
        if let Some(domain) = &self.options.domain {
            out.push_str("; Domain=");
            out.push_str(domain);
        }
        let secure = self.options.secure || self.options.same_site == Some(SameSite::None);
        if secure {
            out.push_str("; Secure");
        }
        if self.options.http_only {
            out.push_str("; HttpOnly");
        }
        if let Some(same_site) = self.options.same_site {
            out.push_str("; SameSite=");
            out.push_str(same_site.as_str());
        }

        out
    }
}

/// Parses an inbound `Cookie` request header into name/value pairs.
///
/// Pieces are split on `;` and trimmed, malformed pieces are ignored, and a
/// repeated name keeps the later value.
pub fn parse_cookie_header(raw: &str) -> HashMap<String, String> {
    let mut cookies = HashMap::new();
    for parsed in cookie::Cookie::split_parse(raw.to_string()) {
        if let Ok(parsed) = parsed {
            cookies.insert(parsed.name().to_string(), parsed.value().to_string());
        }
    }
    cookies
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_cookie_round_trips() {
        let cookie = SetCookie::new("session", "abc123", CookieOptions::default());
        let parsed = parse_cookie_header(&cookie.to_header_value());
        assert_eq!(parsed.get("session").map(String::as_str), Some("abc123"));
        assert_eq!(parsed.len(), 1);
    }

    #[test]
    fn attributes_are_emitted_in_order() {
        let cookie = SetCookie::new(
            "id",
            "1",
            CookieOptions {
                max_age: Some(3600),
                path: Some("/app".to_string()),
                domain: Some("example.com".to_string()),
                secure: true,
                http_only: true,
                same_site: Some(SameSite::Lax),
                ..CookieOptions::default()
            },
        );
        assert_eq!(
            cookie.to_header_value(),
            "id=1; Max-Age=3600; Path=/app; Domain=example.com; Secure; HttpOnly; SameSite=Lax"
        );
    }

    #[test]
    fn same_site_none_forces_secure() {
        let cookie = SetCookie::new(
            "id",
            "1",
            CookieOptions {
                same_site: Some(SameSite::None),
                ..CookieOptions::default()
            },
        );
        assert_eq!(cookie.to_header_value(), "id=1; Secure; SameSite=None");
    }

    #[test]
    fn expires_is_formatted_as_http_date() {
        let cookie = SetCookie::new(
            "id",
            "1",
            CookieOptions {
                expires: Some(0),
                ..CookieOptions::default()
            },
        );
        let value = cookie.to_header_value();
        assert!(value.starts_with("id=1; Expires="), "got {}", value);
        assert!(value.contains("1970"), "got {}", value);
        assert!(value.ends_with("GMT"), "got {}", value);
    }

    #[test]
    fn deletion_cookie_has_empty_value_and_zero_max_age() {
        let cookie = SetCookie::expire_now("session", None);
        assert_eq!(cookie.to_header_value(), "session=; Max-Age=0");
    }

    #[test]
    fn parse_trims_and_splits_on_semicolons() {
        let parsed = parse_cookie_header("a=1;  b=2 ; c=3");
        assert_eq!(parsed.get("a").map(String::as_str), Some("1"));
        assert_eq!(parsed.get("b").map(String::as_str), Some("2"));
        assert_eq!(parsed.get("c").map(String::as_str), Some("3"));
    }

    #[test]
    fn parse_keeps_the_later_value_for_repeated_names() {
        let parsed = parse_cookie_header("a=1; a=2");
        assert_eq!(parsed.get("a").map(String::as_str), Some("2"));
    }

    #[test]
    fn parse_ignores_malformed_pieces() {
        let parsed = parse_cookie_header("ok=yes; garbage; =novalue");
        assert_eq!(parsed.get("ok").map(String::as_str), Some("yes"));
        assert_eq!(parsed.len(), 1);
    }
}
