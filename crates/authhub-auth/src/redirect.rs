//! Same-site redirect validation.

use url::Url;

/// Accepts `candidate` only if it is an http(s) URL whose host is
/// `root_domain` itself or a subdomain of it.
pub fn is_safe_redirect(candidate: &str, root_domain: &str) -> bool {
    let Ok(url) = Url::parse(candidate) else {
        return false;
    };
    if !matches!(url.scheme(), "http" | "https") {
        return false;
    }
    let Some(host) = url.host_str() else {
        return false;
    };

    let host = host.trim_end_matches('.').to_ascii_lowercase();
    let root = root_domain.trim_matches('.').to_ascii_lowercase();
    if root.is_empty() {
        return false;
    }
    host == root || host.ends_with(&format!(".{root}"))
}

/// Returns `candidate` if it is safe, else `fallback`.
pub fn resolve_redirect(candidate: Option<&str>, root_domain: &str, fallback: &str) -> String {
    match candidate {
        Some(url) if is_safe_redirect(url, root_domain) => url.to_string(),
        _ => fallback.to_string(),
    }
}
