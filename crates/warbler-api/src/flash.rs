//! One-shot notices carried across a redirect in a cookie.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD as B64;
use warbler_types::api::Flash;

pub const FLASH_COOKIE: &str = "flash";

pub fn push(jar: CookieJar, category: &str, message: impl Into<String>) -> CookieJar {
    let mut flashes = read(&jar);
    flashes.push(Flash {
        category: category.to_string(),
        message: message.into(),
    });

    let Ok(json) = serde_json::to_vec(&flashes) else {
        return jar;
    };
    let cookie = Cookie::build((FLASH_COOKIE, B64.encode(json)))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    jar.add(cookie)
}

/// Drain pending flashes and clear the cookie.
pub fn take(jar: CookieJar) -> (CookieJar, Vec<Flash>) {
    let flashes = read(&jar);
    if flashes.is_empty() {
        return (jar, flashes);
    }
    (jar.remove(Cookie::build(FLASH_COOKIE).path("/")), flashes)
}

fn read(jar: &CookieJar) -> Vec<Flash> {
    jar.get(FLASH_COOKIE)
        .and_then(|c| B64.decode(c.value()).ok())
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pushed_flashes_accumulate_and_drain() {
        let jar = push(CookieJar::new(), "danger", "first");
        let jar = push(jar, "success", "second");

        let (jar, flashes) = take(jar);
        assert_eq!(
            flashes,
            vec![
                Flash { category: "danger".into(), message: "first".into() },
                Flash { category: "success".into(), message: "second".into() },
            ]
        );

        let (_, again) = take(jar);
        assert!(again.is_empty());
    }

    #[test]
    fn garbage_cookie_reads_as_empty() {
        let jar = CookieJar::new().add(Cookie::new(FLASH_COOKIE, "%%%"));
        assert!(take(jar).1.is_empty());
    }
}
