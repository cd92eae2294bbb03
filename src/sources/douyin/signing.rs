use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use md5::{Digest, Md5};
use rand::Rng;
use serde::Serialize;

const SALT_LEN: usize = 11;
const SALT_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Request body for the upstream parse API: the caller parameters plus the
/// derived `ts`/`salt`/`sign` fields, serialized as one flat JSON object.
#[derive(Debug, Clone, Serialize)]
pub struct SignedParams {
    #[serde(flatten)]
    pub params: BTreeMap<String, String>,
    pub ts: u64,
    pub salt: String,
    pub sign: String,
}

impl SignedParams {
    pub fn create(params: BTreeMap<String, String>, secret: &str) -> Self {
        let ts = unix_now();
        let salt = random_salt();
        let sign = generate_signature(&params, &salt, ts, secret);
        Self {
            params,
            ts,
            salt,
            sign,
        }
    }
}

/// Parameter set for one resolution request. A `BTreeMap` keeps the keys in
/// byte-wise ascending order, so the canonical form the signature is
/// computed over is structural rather than re-derived per call.
pub fn request_params(
    request_url: &str,
    captcha_key: &str,
    captcha_input: &str,
) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("requestURL".to_string(), request_url.to_string()),
        ("captchaKey".to_string(), captcha_key.to_string()),
        ("captchaInput".to_string(), captcha_input.to_string()),
    ])
}

pub fn generate_signature(
    params: &BTreeMap<String, String>,
    salt: &str,
    ts: u64,
    secret: &str,
) -> String {
    let query = params
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&");
    let sign_string = format!("{}&salt={}&ts={}&secret={}", query, salt, ts, secret);
    let digest = Md5::digest(sign_string.as_bytes());
    swap_bd(&hex::encode(digest))
}

/// The upstream signer post-processes the hex digest by exchanging every
/// `b` with `d`. The substitution is its own inverse.
pub fn swap_bd(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            'b' => 'd',
            'd' => 'b',
            other => other,
        })
        .collect()
}

fn random_salt() -> String {
    let mut rng = rand::thread_rng();
    (0..SALT_LEN)
        .map(|_| SALT_CHARSET[rng.gen_range(0..SALT_CHARSET.len())] as char)
        .collect()
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "5Q0NvQxD0zdQ5RLQy5xs";

    #[test]
    fn known_signature() {
        let params = request_params("https://v.douyin.com/MPXX7C9U-SU/", "", "");
        let sign = generate_signature(&params, "k3x9pq7m2ab", 1700000000, SECRET);
        assert_eq!(sign, "b60f94ee1f6bce783b09196ec975f1d5");
    }

    #[test]
    fn signature_ignores_insertion_order() {
        let mut forward = BTreeMap::new();
        forward.insert("captchaInput".to_string(), "".to_string());
        forward.insert("captchaKey".to_string(), "".to_string());
        forward.insert("requestURL".to_string(), "https://example.com/".to_string());

        let mut backward = BTreeMap::new();
        backward.insert("requestURL".to_string(), "https://example.com/".to_string());
        backward.insert("captchaKey".to_string(), "".to_string());
        backward.insert("captchaInput".to_string(), "".to_string());

        assert_eq!(
            generate_signature(&forward, "aaaaaaaaaaa", 1, SECRET),
            generate_signature(&backward, "aaaaaaaaaaa", 1, SECRET)
        );
    }

    #[test]
    fn signature_is_deterministic() {
        let params = request_params("https://v.douyin.com/abc/", "k", "1234");
        let first = generate_signature(&params, "saltsaltsal", 42, SECRET);
        let second = generate_signature(&params, "saltsaltsal", 42, SECRET);
        assert_eq!(first, second);
    }

    #[test]
    fn swap_bd_is_involution() {
        let digests = [
            "b60f94ee1f6bce783b09196ec975f1d5",
            "abcdef0123456789abcdef0123456789",
            "",
            "bbbbdddd",
        ];
        for digest in digests {
            assert_eq!(swap_bd(&swap_bd(digest)), digest);
        }
        assert_eq!(swap_bd("bd"), "db");
    }

    #[test]
    fn salt_shape() {
        for _ in 0..32 {
            let salt = random_salt();
            assert_eq!(salt.len(), SALT_LEN);
            assert!(
                salt.bytes()
                    .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
            );
        }
    }

    #[test]
    fn envelope_serializes_flat() {
        let signed = SignedParams {
            params: request_params("https://v.douyin.com/x/", "", ""),
            ts: 1700000000,
            salt: "k3x9pq7m2ab".to_string(),
            sign: "00".to_string(),
        };
        let json = serde_json::to_value(&signed).unwrap();
        assert_eq!(json["requestURL"], "https://v.douyin.com/x/");
        assert_eq!(json["ts"], 1700000000);
        assert_eq!(json["salt"], "k3x9pq7m2ab");
        assert_eq!(json["sign"], "00");
    }
}
