//! Tests for the credentials module

use super::*;
use base64::Engine;
use std::collections::BTreeMap;

#[test]
fn test_no_credentials() {
    let creds = Credentials::default();
    assert!(creds.is_none());
    assert!(creds.headers().is_empty());
}

#[test]
fn test_basic_credentials_header() {
    let creds = Credentials::basic("admin@example.com", "api-token-123");
    let headers = creds.headers();

    assert_eq!(headers.len(), 1);
    assert_eq!(headers[0].0, "Authorization");

    let encoded = headers[0].1.strip_prefix("Basic ").unwrap();
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .unwrap();
    assert_eq!(
        String::from_utf8(decoded).unwrap(),
        "admin@example.com:api-token-123"
    );
}

#[test]
fn test_bearer_credentials_header() {
    let creds = Credentials::bearer("tok");
    assert_eq!(
        creds.headers(),
        vec![("Authorization".to_string(), "Bearer tok".to_string())]
    );
}

#[test]
fn test_custom_headers() {
    let mut map = BTreeMap::new();
    map.insert("X-Api-Key".to_string(), "k1".to_string());
    map.insert("X-Tenant".to_string(), "acme".to_string());

    let headers = Credentials::Headers(map).headers();
    assert_eq!(headers.len(), 2);
    assert!(headers.contains(&("X-Api-Key".to_string(), "k1".to_string())));
}

#[test]
fn test_debug_redacts_secrets() {
    let basic = format!("{:?}", Credentials::basic("me", "hunter2"));
    assert!(basic.contains("me"));
    assert!(!basic.contains("hunter2"));

    let bearer = format!("{:?}", Credentials::bearer("s3cret"));
    assert!(!bearer.contains("s3cret"));
}
