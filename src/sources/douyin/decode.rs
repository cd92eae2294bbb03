use base64::prelude::*;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, KeyIvInit};

use super::info::DecodedVideoInfo;
use crate::error::DecodeError;

type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

const STANDARD_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
const CUSTOM_ALPHABET: &[u8; 64] =
    b"ZYXABCDEFGHIJKLMNOPQRSTUVWzyxabcdefghijklmnopqrstuvw9876543210-_";
const XOR_KEY: u32 = 90;
const BLOCK_SIZE: usize = 8;
const AES_KEY: &[u8; 32] = b"12345678901234567890123456789013";

/// Reverses the five obfuscation layers on an encrypted parse response and
/// parses the recovered plaintext. The layer order is load-bearing: XOR,
/// intra-block reversal, alphabet translation, Base64, AES-CBC. Reordering
/// the first three does not fail loudly, it yields garbage bytes.
pub fn decrypt_response(data: &str, iv: &str) -> Result<DecodedVideoInfo, DecodeError> {
    let data = untranslate_alphabet(&block_reverse(&xor_string(data)?, BLOCK_SIZE));
    let iv = untranslate_alphabet(&block_reverse(&xor_string(iv)?, BLOCK_SIZE));
    let plaintext = aes_decrypt(&data, &iv)?;
    let text = String::from_utf8(plaintext)?;
    Ok(serde_json::from_str(&text)?)
}

/// XOR over decoded code points, not UTF-8 bytes. Inputs are Base64-shaped
/// in practice; a code point whose XOR image is not a valid scalar is
/// rejected rather than passed through silently.
pub fn xor_string(s: &str) -> Result<String, DecodeError> {
    s.chars()
        .map(|c| char::from_u32(c as u32 ^ XOR_KEY).ok_or(DecodeError::CodePoint(c as u32)))
        .collect()
}

/// Reverses each fixed-size chunk of characters in place while keeping the
/// chunks themselves in order. The final partial chunk is reversed too.
pub fn block_reverse(s: &str, block_size: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    chars
        .chunks(block_size)
        .flat_map(|chunk| chunk.iter().rev())
        .collect()
}

/// Maps the upstream's shuffled Base64 alphabet back onto the standard one.
/// Characters outside the custom alphabet (only `=` padding in practice)
/// pass through unchanged.
pub fn untranslate_alphabet(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_ascii() {
                match CUSTOM_ALPHABET.iter().position(|&b| b == c as u8) {
                    Some(i) => STANDARD_ALPHABET[i] as char,
                    None => c,
                }
            } else {
                c
            }
        })
        .collect()
}

fn aes_decrypt(data_b64: &str, iv_b64: &str) -> Result<Vec<u8>, DecodeError> {
    let mut ciphertext = BASE64_STANDARD.decode(data_b64)?;
    let iv = BASE64_STANDARD.decode(iv_b64)?;
    if iv.len() != 16 {
        return Err(DecodeError::IvLength(iv.len()));
    }
    let cipher = Aes256CbcDec::new_from_slices(AES_KEY, &iv)
        .map_err(|_| DecodeError::IvLength(iv.len()))?;
    let plaintext = cipher
        .decrypt_padded_mut::<Pkcs7>(&mut ciphertext)
        .map_err(|_| DecodeError::Padding)?;
    Ok(plaintext.to_vec())
}
