use std::collections::HashMap;

/// Retrieves the value of a header, matching the name case-insensitively.
///
/// Header maps keep the caller's casing, so an exact-key lookup would miss
/// `authorization` when looking for `Authorization`.
pub fn get_req_header_value<'a>(headers: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(key))
        .map(|(_, value)| value.as_str())
}

/// Removes every header whose name matches `key` case-insensitively.
///
/// Returns the number of headers removed.
pub fn remove_header(headers: &mut HashMap<String, String>, key: &str) -> usize {
    let before = headers.len();
    headers.retain(|name, _| !name.eq_ignore_ascii_case(key));
    before - headers.len()
}

/// Sets a header, replacing any existing header with the same name in any case.
pub fn set_header(headers: &mut HashMap<String, String>, key: &str, value: String) {
    if get_req_header_value(headers, key).is_some() {
        log::debug!("Replacing caller-supplied header '{key}'");
        remove_header(headers, key);
    }
    headers.insert(key.to_string(), value);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_ignores_case() {
        let mut headers = HashMap::new();
        headers.insert("authorization".to_string(), "Basic abc".to_string());
        assert_eq!(get_req_header_value(&headers, "Authorization"), Some("Basic abc"));
        assert_eq!(get_req_header_value(&headers, "apikey"), None);
    }

    #[test]
    fn test_set_header_replaces_other_casing() {
        let mut headers = HashMap::new();
        headers.insert("AUTHORIZATION".to_string(), "old".to_string());
        headers.insert("Accept".to_string(), "application/json".to_string());

        set_header(&mut headers, "Authorization", "new".to_string());

        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("Authorization").map(String::as_str), Some("new"));
        assert!(!headers.contains_key("AUTHORIZATION"));
    }
}
