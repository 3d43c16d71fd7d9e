//! AWS Signature Version 4 helpers for grant issuance.
//!
//! `object_store` moves bytes for us, but issuing browser-facing grants
//! needs raw SigV4: POST policy signatures for upload grants and query
//! presigning for download URLs with a response-content-disposition
//! override. Both derive the same signing key chain.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SERVICE: &str = "s3";

/// AWS uri-encoding: keep only unreserved characters.
const STRICT_ENCODE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Path segments additionally keep `/`.
const PATH_ENCODE: &AsciiSet = &STRICT_ENCODE.remove(b'/');

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// `YYYYMMDD` date stamp used in the credential scope.
pub fn date_stamp(now: DateTime<Utc>) -> String {
    now.format("%Y%m%d").to_string()
}

/// `YYYYMMDDTHHMMSSZ` timestamp carried in `x-amz-date`.
pub fn amz_date(now: DateTime<Utc>) -> String {
    now.format("%Y%m%dT%H%M%SZ").to_string()
}

/// ISO-8601 expiration timestamp for POST policies.
pub fn policy_expiration(expires_at: DateTime<Utc>) -> String {
    expires_at.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Credential scope: `{date}/{region}/s3/aws4_request`.
pub fn scope(date: &str, region: &str) -> String {
    format!("{}/{}/{}/aws4_request", date, region, SERVICE)
}

/// Full credential string: `{access_key}/{scope}`.
pub fn credential(access_key_id: &str, date: &str, region: &str) -> String {
    format!("{}/{}", access_key_id, scope(date, region))
}

/// Derive the SigV4 signing key for the given day and region.
pub fn signing_key(secret_access_key: &str, date: &str, region: &str, service: &str) -> Vec<u8> {
    let k_date = hmac_sha256(format!("AWS4{}", secret_access_key).as_bytes(), date.as_bytes());
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());
    hmac_sha256(&k_service, b"aws4_request")
}

/// Sign a base64-encoded POST policy document.
pub fn sign_policy(
    policy_base64: &str,
    secret_access_key: &str,
    date: &str,
    region: &str,
) -> String {
    let key = signing_key(secret_access_key, date, region, SERVICE);
    hex::encode(hmac_sha256(&key, policy_base64.as_bytes()))
}

/// Build a presigned GET URL with query-string authentication.
///
/// `path` is the absolute request path (`/{key}` for virtual-hosted style,
/// `/{bucket}/{key}` for path style). `extra_params` are signed along with
/// the standard `X-Amz-*` parameters, which is how
/// `response-content-disposition` overrides make it into the grant.
#[allow(clippy::too_many_arguments)]
pub fn presign_get(
    scheme: &str,
    host: &str,
    path: &str,
    region: &str,
    access_key_id: &str,
    secret_access_key: &str,
    now: DateTime<Utc>,
    expires_secs: u64,
    extra_params: &[(&str, &str)],
) -> String {
    let date = date_stamp(now);
    let amz_date = amz_date(now);

    let mut params: Vec<(String, String)> = vec![
        ("X-Amz-Algorithm".to_string(), ALGORITHM.to_string()),
        (
            "X-Amz-Credential".to_string(),
            credential(access_key_id, &date, region),
        ),
        ("X-Amz-Date".to_string(), amz_date.clone()),
        ("X-Amz-Expires".to_string(), expires_secs.to_string()),
        ("X-Amz-SignedHeaders".to_string(), "host".to_string()),
    ];
    for (name, value) in extra_params {
        params.push((name.to_string(), value.to_string()));
    }
    params.sort();

    let canonical_query = params
        .iter()
        .map(|(name, value)| {
            format!(
                "{}={}",
                utf8_percent_encode(name, STRICT_ENCODE),
                utf8_percent_encode(value, STRICT_ENCODE)
            )
        })
        .collect::<Vec<_>>()
        .join("&");

    let canonical_path = utf8_percent_encode(path, PATH_ENCODE).to_string();
    let canonical_request = format!(
        "GET\n{}\n{}\nhost:{}\n\nhost\nUNSIGNED-PAYLOAD",
        canonical_path, canonical_query, host
    );

    let string_to_sign = format!(
        "{}\n{}\n{}\n{}",
        ALGORITHM,
        amz_date,
        scope(&date, region),
        sha256_hex(canonical_request.as_bytes())
    );

    let key = signing_key(secret_access_key, &date, region, SERVICE);
    let signature = hex::encode(hmac_sha256(&key, string_to_sign.as_bytes()));

    format!(
        "{}://{}{}?{}&X-Amz-Signature={}",
        scheme, host, canonical_path, canonical_query, signature
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    // Signing key derivation example from the AWS SigV4 documentation.
    #[test]
    fn test_signing_key_matches_aws_example() {
        let key = signing_key(
            "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
            "20120215",
            "us-east-1",
            "iam",
        );
        assert_eq!(
            hex::encode(key),
            "f4780e2d9f65fa895f9c67b32ce1baf0b0d8a43505a000a1a9e090d414db404d"
        );
    }

    #[test]
    fn test_presign_get_shape() {
        let now = Utc.with_ymd_and_hms(2026, 8, 27, 12, 0, 0).unwrap();
        let url = presign_get(
            "https",
            "docs.s3.us-east-1.amazonaws.com",
            "/merged/abc.pdf",
            "us-east-1",
            "AKIAEXAMPLE",
            "secret",
            now,
            3600,
            &[(
                "response-content-disposition",
                "attachment; filename=\"out.pdf\"",
            )],
        );
        assert!(url.starts_with("https://docs.s3.us-east-1.amazonaws.com/merged/abc.pdf?"));
        assert!(url.contains("X-Amz-Algorithm=AWS4-HMAC-SHA256"));
        assert!(url.contains("X-Amz-Date=20260827T120000Z"));
        assert!(url.contains("X-Amz-Expires=3600"));
        assert!(url.contains("response-content-disposition=attachment"));
        assert!(url.contains("X-Amz-Signature="));
    }

    #[test]
    fn test_policy_signature_is_stable() {
        let a = sign_policy("eyJleHAiOiJwb2xpY3kifQ==", "secret", "20260827", "us-east-1");
        let b = sign_policy("eyJleHAiOiJwb2xpY3kifQ==", "secret", "20260827", "us-east-1");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_credential_scope() {
        assert_eq!(
            credential("AKIAEXAMPLE", "20260827", "eu-west-1"),
            "AKIAEXAMPLE/20260827/eu-west-1/s3/aws4_request"
        );
    }
}
