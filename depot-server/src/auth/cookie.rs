//! Session cookie transport

use axum::http::HeaderMap;

use super::session::SessionKind;

/// `Set-Cookie` value carrying a freshly issued session
pub fn session_cookie(kind: SessionKind, token: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        kind.cookie_name(),
        token,
        max_age_secs
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that removes the session cookie
pub fn clear_cookie(kind: SessionKind, secure: bool) -> String {
    session_cookie(kind, "", 0, secure)
}

/// Read one cookie from the request headers
pub fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(axum::http::header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|header| header.split(';'))
        .find_map(|part| {
            let (key, value) = part.trim().split_once('=')?;
            (key == name).then_some(value)
        })
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie(SessionKind::Location, "abc.def.ghi", 43200, false);
        assert_eq!(
            cookie,
            "loc_session=abc.def.ghi; Path=/; HttpOnly; SameSite=Lax; Max-Age=43200"
        );

        let cookie = session_cookie(SessionKind::Admin, "t", 60, true);
        assert!(cookie.ends_with("; Secure"));
    }

    #[test]
    fn test_clear_cookie() {
        let cookie = clear_cookie(SessionKind::Runner, false);
        assert!(cookie.starts_with("runner_session=;"));
        assert!(cookie.contains("Max-Age=0"));
    }

    #[test]
    fn test_read_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            HeaderValue::from_static("theme=dark; loc_session=tok.en.sig; runner_session="),
        );

        assert_eq!(read_cookie(&headers, "loc_session"), Some("tok.en.sig"));
        assert_eq!(read_cookie(&headers, "runner_session"), None);
        assert_eq!(read_cookie(&headers, "admin_session"), None);
    }

    #[test]
    fn test_read_cookie_across_headers() {
        let mut headers = HeaderMap::new();
        headers.append(axum::http::header::COOKIE, HeaderValue::from_static("a=1"));
        headers.append(
            axum::http::header::COOKIE,
            HeaderValue::from_static("admin_session=xyz"),
        );
        assert_eq!(read_cookie(&headers, "admin_session"), Some("xyz"));
    }
}
