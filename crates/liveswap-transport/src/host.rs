//! Host name lookup for the hostname query.

/// Host name of the machine running this process.
///
/// Falls back to `"localhost"` if the platform lookup fails or yields
/// something that is empty or not valid UTF-8.
pub fn local_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(fallback)
}

fn fallback() -> String {
    "localhost".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hostname_is_non_empty() {
        let name = local_hostname();
        assert!(!name.is_empty());
        assert!(!name.contains('\0'));
    }

    #[test]
    fn matches_platform_lookup() {
        if let Some(expected) = hostname::get()
            .ok()
            .and_then(|name| name.into_string().ok())
            .filter(|name| !name.is_empty())
        {
            assert_eq!(local_hostname(), expected);
        }
    }
}
