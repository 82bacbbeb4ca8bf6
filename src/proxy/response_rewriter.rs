use crate::proxy::rules::RuleSet;
use crate::utils::path::resolve_path;
use hyper::header::{self, HeaderValue};
use hyper::{Response, StatusCode};
use log::{debug, warn};
use regex::Regex;
use std::sync::OnceLock;

const NO_STORE: &str = "no-store";

/// Post-processes upstream responses so the backend stays masked from the client
#[derive(Debug, Clone, Copy)]
pub struct ResponseRewriter<'a> {
    location_rules: Option<&'a RuleSet>,
    auth_cookie_name: Option<&'a str>,
}

/// Purchase confirmations keep their redirect status
pub fn is_purchase_confirmation(path: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)purchase/\d+$").expect("static pattern")).is_match(path)
}

/// Logout flows keep their redirect status
pub fn is_logout(path: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)site/logout$").expect("static pattern")).is_match(path)
}

/// Redirects whose status is about to change must not be cached
fn is_cacheable_redirect(status: StatusCode) -> bool {
    matches!(status, StatusCode::FOUND | StatusCode::SEE_OTHER | StatusCode::TEMPORARY_REDIRECT)
}

/// Canonical directive that expires the auth cookie
pub fn clearing_directive(cookie_name: &str) -> String {
    format!("{}=; max-age=0; path=/; secure; httponly; samesite=lax", cookie_name)
}

impl<'a> ResponseRewriter<'a> {
    pub fn new(location_rules: Option<&'a RuleSet>, auth_cookie_name: Option<&'a str>) -> Self {
        Self { location_rules, auth_cookie_name }
    }

    /// Rewrite headers and status of `response`. `upstream_path` is the path and
    /// query the backend was asked for. The body is never touched.
    pub fn rewrite<B>(&self, mut response: Response<B>, upstream_path: &str) -> Response<B> {
        if let Some(rules) = self.location_rules {
            self.rewrite_location(&mut response, rules, upstream_path);
        }
        if let Some(name) = self.auth_cookie_name {
            sanitize_auth_cookies(&mut response, name);
        }
        response.headers_mut().remove(header::CONTENT_LENGTH);
        response
    }

    fn rewrite_location<B>(&self, response: &mut Response<B>, rules: &RuleSet, upstream_path: &str) {
        let Some(value) = response.headers().get(header::LOCATION) else {
            return;
        };
        // Raw non-ASCII bytes still have to be masked, so they are decoded rather than skipped
        let location = String::from_utf8_lossy(value.as_bytes()).to_lowercase();

        let rewritten = rules.rewrite(&location);
        match HeaderValue::from_str(&rewritten) {
            Ok(value) => {
                debug!("Location rewritten {:?} -> {:?}", location, rewritten);
                response.headers_mut().insert(header::LOCATION, value);
            }
            Err(e) => warn!("Rewritten Location {:?} is not a valid header value, keeping original: {}", rewritten, e),
        }

        let dst = resolve_path(&rewritten).to_lowercase();
        let src = resolve_path(upstream_path).to_lowercase();
        if upstream_path.to_lowercase() == location || is_purchase_confirmation(&dst) || is_logout(&src) {
            return;
        }

        let status = response.status();
        if is_cacheable_redirect(status) {
            response.headers_mut().insert(header::CACHE_CONTROL, HeaderValue::from_static(NO_STORE));
        }
        debug!("Coercing {} with Location to {}", status, StatusCode::ACCEPTED);
        *response.status_mut() = StatusCode::ACCEPTED;
    }
}

/// Replace every clearing form of the auth cookie (`name=;...`) with the canonical directive
pub fn sanitize_auth_cookies<B>(response: &mut Response<B>, cookie_name: &str) {
    let clearing_prefix = format!("{}=;", cookie_name);
    let cookies: Vec<HeaderValue> = response.headers().get_all(header::SET_COOKIE).iter().cloned().collect();
    if !cookies.iter().any(|c| c.as_bytes().starts_with(clearing_prefix.as_bytes())) {
        return;
    }

    let canonical = clearing_directive(cookie_name);
    let headers = response.headers_mut();
    headers.remove(header::SET_COOKIE);
    for cookie in cookies {
        if cookie.as_bytes().starts_with(clearing_prefix.as_bytes()) {
            match HeaderValue::from_str(&canonical) {
                Ok(value) => {
                    debug!("Normalized clearing Set-Cookie for {}", cookie_name);
                    headers.append(header::SET_COOKIE, value);
                }
                Err(e) => {
                    warn!("Cookie name {:?} does not form a valid header value: {}", cookie_name, e);
                    headers.append(header::SET_COOKIE, cookie);
                }
            }
        } else {
            headers.append(header::SET_COOKIE, cookie);
        }
    }
}
