use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use std::fmt;
use tracing::debug;

// Type alias for HMAC-SHA256
type HmacSha256 = Hmac<Sha256>;

pub const SIGNING_ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Access keys used to sign requests to the meeting provider
#[derive(Clone)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Everything needed to sign a single request
pub struct SigningRequest<'a> {
    pub method: &'a str,
    pub host: &'a str,
    pub path: &'a str,
    pub query: &'a [(String, String)],
    pub body: &'a str,
    pub region: &'a str,
    pub service: &'a str,
}

/// Headers produced by signing, to be attached to the outgoing request
#[derive(Debug, Clone)]
pub struct SignedHeaders {
    pub authorization: String,
    pub amz_date: String,
    pub security_token: Option<String>,
}

/// Signature Version 4 utilities for the meeting provider API
pub struct SigV4Auth;

impl SigV4Auth {
    /// Format a timestamp as `YYYYMMDDTHHMMSSZ`
    pub fn amz_date(now: DateTime<Utc>) -> String {
        now.format("%Y%m%dT%H%M%SZ").to_string()
    }

    pub fn hash_hex(data: &[u8]) -> String {
        hex::encode(Sha256::digest(data))
    }

    fn hmac(key: &[u8], data: &[u8]) -> Vec<u8> {
        let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
        mac.update(data);
        mac.finalize().into_bytes().to_vec()
    }

    /// Derive the signing key for a date, region and service
    pub fn signing_key(secret_access_key: &str, date: &str, region: &str, service: &str) -> Vec<u8> {
        let k_date = Self::hmac(format!("AWS4{}", secret_access_key).as_bytes(), date.as_bytes());
        let k_region = Self::hmac(&k_date, region.as_bytes());
        let k_service = Self::hmac(&k_region, service.as_bytes());
        Self::hmac(&k_service, b"aws4_request")
    }

    /// Sorted, percent-encoded query string
    pub fn canonical_query(query: &[(String, String)]) -> String {
        let mut pairs: Vec<(String, String)> = query
            .iter()
            .map(|(k, v)| (urlencoding::encode(k).into_owned(), urlencoding::encode(v).into_owned()))
            .collect();
        pairs.sort();
        pairs
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Path with every segment percent-encoded
    pub fn canonical_uri(path: &str) -> String {
        if path.is_empty() {
            return "/".to_string();
        }
        path.split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Sign a request and return the headers to send with it
    pub fn sign(
        credentials: &AwsCredentials,
        request: &SigningRequest<'_>,
        now: DateTime<Utc>,
    ) -> SignedHeaders {
        let amz_date = Self::amz_date(now);
        let date = &amz_date[..8];

        let mut canonical_headers = format!("host:{}\nx-amz-date:{}\n", request.host, amz_date);
        let mut signed_headers = String::from("host;x-amz-date");
        if let Some(token) = &credentials.session_token {
            canonical_headers.push_str(&format!("x-amz-security-token:{}\n", token));
            signed_headers.push_str(";x-amz-security-token");
        }

        let canonical_request = format!(
            "{}\n{}\n{}\n{}\n{}\n{}",
            request.method,
            Self::canonical_uri(request.path),
            Self::canonical_query(request.query),
            canonical_headers,
            signed_headers,
            Self::hash_hex(request.body.as_bytes())
        );

        debug!("Canonical request: {}", canonical_request);

        let scope = format!("{}/{}/{}/aws4_request", date, request.region, request.service);
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            SIGNING_ALGORITHM,
            amz_date,
            scope,
            Self::hash_hex(canonical_request.as_bytes())
        );

        let key = Self::signing_key(
            &credentials.secret_access_key,
            date,
            request.region,
            request.service,
        );
        let signature = hex::encode(Self::hmac(&key, string_to_sign.as_bytes()));

        SignedHeaders {
            authorization: format!(
                "{} Credential={}/{}, SignedHeaders={}, Signature={}",
                SIGNING_ALGORITHM, credentials.access_key_id, scope, signed_headers, signature
            ),
            amz_date,
            security_token: credentials.session_token.clone(),
        }
    }
}
