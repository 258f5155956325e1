//! Token lifecycle tests that need no database: signing and verification
//! boundaries, the temporary-token cache, and TOTP enrollment material.

use std::time::Duration;

use uuid::Uuid;

use auth_api::cache::TempTokenCache;
use auth_api::security::{totp, TokenKind, TokenSigner};

fn signer() -> TokenSigner {
    TokenSigner::new("access-secret", "refresh-secret", 900, 7 * 24 * 3600)
}

#[test]
fn access_token_round_trip() {
    let signer = signer();
    let user_id = Uuid::new_v4();

    let token = signer.issue_access(user_id).unwrap();
    let verified = signer.verify(&token, TokenKind::Access).unwrap();

    assert_eq!(verified.user_id, user_id);
}

#[test]
fn refresh_token_is_not_a_valid_access_token() {
    let signer = signer();
    let token = signer.issue_refresh(Uuid::new_v4()).unwrap();

    assert!(signer.verify(&token, TokenKind::Access).is_err());
    assert!(signer.verify(&token, TokenKind::Refresh).is_ok());
}

#[test]
fn access_token_is_not_a_valid_refresh_token() {
    let signer = signer();
    let token = signer.issue_access(Uuid::new_v4()).unwrap();

    assert!(signer.verify(&token, TokenKind::Refresh).is_err());
}

#[test]
fn tokens_signed_with_other_secrets_are_rejected() {
    let token = signer().issue_access(Uuid::new_v4()).unwrap();
    let other = TokenSigner::new("different", "secrets", 900, 7 * 24 * 3600);

    assert!(other.verify(&token, TokenKind::Access).is_err());
}

#[test]
fn expired_access_token_is_rejected() {
    let signer = TokenSigner::new("access-secret", "refresh-secret", -60, 7 * 24 * 3600);
    let token = signer.issue_access(Uuid::new_v4()).unwrap();

    assert!(signer.verify(&token, TokenKind::Access).is_err());
}

#[test]
fn temp_token_resolves_until_consumed() {
    let cache = TempTokenCache::new();
    let user_id = Uuid::new_v4();

    cache.put("challenge-1", user_id, Duration::from_secs(60));

    // Lookup does not consume; a wrong TOTP must leave the challenge
    // available for retry.
    assert_eq!(cache.get("challenge-1"), Some(user_id));
    assert_eq!(cache.get("challenge-1"), Some(user_id));

    cache.remove("challenge-1");
    assert_eq!(cache.get("challenge-1"), None);
}

#[test]
fn temp_token_expires() {
    let cache = TempTokenCache::new();
    cache.put("challenge-2", Uuid::new_v4(), Duration::from_millis(30));

    std::thread::sleep(Duration::from_millis(60));
    assert_eq!(cache.get("challenge-2"), None);
}

#[test]
fn totp_secret_feeds_a_scannable_provisioning_uri() {
    let secret = totp::generate_secret();
    assert_eq!(secret.len(), 32);

    let uri = totp::provisioning_uri("alice@example.com", "auth-api", &secret);
    assert!(uri.starts_with("otpauth://totp/"));
    assert!(uri.contains(&secret));

    let png = totp::qr_png(&uri).unwrap();
    assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
}

#[test]
fn malformed_totp_codes_do_not_verify() {
    let secret = totp::generate_secret();

    assert!(!totp::check("not-digits", &secret).unwrap());
    assert!(!totp::check("", &secret).unwrap());
    assert!(!totp::check("12345", &secret).unwrap());
}
