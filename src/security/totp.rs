/// RFC 6238 time-based one-time passwords, plus QR rendering for
/// authenticator-app enrollment.
use hmac::{Hmac, Mac};
use image::codecs::png::PngEncoder;
use image::{ColorType, GrayImage, ImageEncoder, Luma};
use rand::Rng;
use sha1::Sha1;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{AuthError, Result};

type HmacSha1 = Hmac<Sha1>;

const TIME_STEP_SECS: u64 = 30;
const CODE_DIGITS: u32 = 6;
const SECRET_LEN_BYTES: usize = 20;

/// Generate a new shared secret, base32-encoded (RFC 4648) so it can be
/// typed into an authenticator app or embedded in a QR code.
pub fn generate_secret() -> String {
    let mut rng = rand::thread_rng();
    let mut bytes = [0u8; SECRET_LEN_BYTES];
    rng.fill(&mut bytes[..]);
    base32_encode(&bytes)
}

/// `otpauth://` URI understood by authenticator apps.
pub fn provisioning_uri(account: &str, issuer: &str, secret: &str) -> String {
    format!(
        "otpauth://totp/{issuer}:{account}?secret={secret}&issuer={issuer}&algorithm=SHA1&digits={CODE_DIGITS}&period={TIME_STEP_SECS}"
    )
}

/// Check a 6-digit code against the secret, accepting the previous and
/// next time step to tolerate clock skew.
pub fn check(code: &str, secret: &str) -> Result<bool> {
    if code.len() != CODE_DIGITS as usize || !code.chars().all(|c| c.is_ascii_digit()) {
        return Ok(false);
    }

    let secret_bytes = base32_decode(secret)
        .ok_or_else(|| AuthError::Internal("Stored TOTP secret is not valid base32".to_string()))?;

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AuthError::Internal(format!("System clock error: {e}")))?
        .as_secs();
    let current_step = now / TIME_STEP_SECS;

    for offset in [-1i64, 0, 1] {
        let step = current_step.wrapping_add_signed(offset);
        let expected = hotp_code(&secret_bytes, step)?;
        if constant_time_eq(code.as_bytes(), expected.as_bytes()) {
            return Ok(true);
        }
    }

    Ok(false)
}

/// Render a provisioning URI as a PNG image suitable for scanning.
pub fn qr_png(uri: &str) -> Result<Vec<u8>> {
    const SCALE: u32 = 8;
    const QUIET_ZONE: u32 = 4; // modules

    let code = qrcode::QrCode::new(uri.as_bytes())
        .map_err(|e| AuthError::Internal(format!("Failed to build QR code: {e}")))?;

    let modules = code.to_colors();
    let width = code.width() as u32;
    let total = (width + 2 * QUIET_ZONE) * SCALE;

    let mut img = GrayImage::from_pixel(total, total, Luma([255u8]));
    for (i, color) in modules.iter().enumerate() {
        if *color == qrcode::Color::Dark {
            let x = (i as u32 % width + QUIET_ZONE) * SCALE;
            let y = (i as u32 / width + QUIET_ZONE) * SCALE;
            for dy in 0..SCALE {
                for dx in 0..SCALE {
                    img.put_pixel(x + dx, y + dy, Luma([0u8]));
                }
            }
        }
    }

    let mut png = Vec::new();
    PngEncoder::new(&mut png)
        .write_image(img.as_raw(), total, total, ColorType::L8)
        .map_err(|e| AuthError::Internal(format!("Failed to encode QR PNG: {e}")))?;

    Ok(png)
}

/// HOTP value for one counter step (RFC 4226 dynamic truncation).
fn hotp_code(secret: &[u8], step: u64) -> Result<String> {
    let mut mac = HmacSha1::new_from_slice(secret)
        .map_err(|_| AuthError::Internal("Invalid HMAC key length".to_string()))?;
    mac.update(&step.to_be_bytes());
    let digest = mac.finalize().into_bytes();

    let offset = (digest[digest.len() - 1] & 0x0f) as usize;
    let binary = u32::from_be_bytes([
        digest[offset] & 0x7f,
        digest[offset + 1],
        digest[offset + 2],
        digest[offset + 3],
    ]);

    Ok(format!("{:06}", binary % 10u32.pow(CODE_DIGITS)))
}

const BASE32_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

fn base32_encode(data: &[u8]) -> String {
    let mut out = String::new();
    let mut buffer = 0u32;
    let mut bits = 0u32;

    for byte in data {
        buffer = (buffer << 8) | u32::from(*byte);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(BASE32_ALPHABET[((buffer >> bits) & 0x1f) as usize] as char);
        }
    }

    if bits > 0 {
        buffer <<= 5 - bits;
        out.push(BASE32_ALPHABET[(buffer & 0x1f) as usize] as char);
    }

    out
}

fn base32_decode(data: &str) -> Option<Vec<u8>> {
    let mut buffer = 0u32;
    let mut bits = 0u32;
    let mut out = Vec::new();

    for ch in data.trim_end_matches('=').bytes() {
        let value = match ch {
            b'A'..=b'Z' => u32::from(ch - b'A'),
            b'a'..=b'z' => u32::from(ch - b'a'),
            b'2'..=b'7' => u32::from(ch - b'2') + 26,
            _ => return None,
        };

        buffer = (buffer << 5) | value;
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push(((buffer >> bits) & 0xff) as u8);
        }
    }

    Some(out)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
