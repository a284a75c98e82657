use super::*;

fn credentials() -> Credentials {
    Credentials {
        app_key: "app-123".to_owned(),
        secret: "s3cret".to_owned(),
    }
}

fn test_client(base_url: &str) -> YotpoClient {
    YotpoClient::with_base_url(credentials(), 10, "bottomline-test/0.1", base_url)
        .expect("client construction should not fail")
}

#[test]
fn bottom_lines_url_has_expected_shape() {
    let client = test_client("https://api.yotpo.com/v1");
    let url = client.bottom_lines_url(2, 100).unwrap();
    assert_eq!(
        url.as_str(),
        "https://api.yotpo.com/v1/apps/app-123/bottom_lines?count=100&page=2&utoken=s3cret"
    );
}

#[test]
fn bottom_lines_url_tolerates_trailing_slash() {
    let client = test_client("https://api.yotpo.com/v1/");
    let url = client.bottom_lines_url(1, 100).unwrap();
    assert!(url
        .as_str()
        .starts_with("https://api.yotpo.com/v1/apps/app-123/bottom_lines?"));
}

#[test]
fn bottom_lines_url_encodes_credentials() {
    let client = YotpoClient::with_base_url(
        Credentials {
            app_key: "a/b".to_owned(),
            secret: "x&y=z".to_owned(),
        },
        10,
        "ua",
        "https://api.yotpo.com/v1",
    )
    .unwrap();
    let url = client.bottom_lines_url(1, 100).unwrap();
    assert!(url.path().contains("a%2Fb"), "app key must be one segment: {url}");
    assert!(url.as_str().contains("utoken=x%26y%3Dz"), "secret must be encoded: {url}");
}

#[test]
fn redact_masks_only_the_token() {
    let client = test_client("https://api.yotpo.com/v1");
    let url = client.bottom_lines_url(3, 100).unwrap();
    let redacted = redact(&url);
    assert!(!redacted.contains("s3cret"));
    assert!(redacted.contains("page=3"));
    assert!(redacted.contains("utoken=%5Bredacted%5D"));
}

#[test]
fn invalid_base_url_is_rejected() {
    let result = YotpoClient::with_base_url(credentials(), 10, "ua", "not a url");
    assert!(matches!(result, Err(ProviderError::InvalidBaseUrl { .. })));
}

#[test]
fn debug_output_hides_secret() {
    let client = test_client("https://api.yotpo.com/v1");
    assert!(!format!("{client:?}").contains("s3cret"));
}
