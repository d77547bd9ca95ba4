use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

fn payment_mac(secret: &str, order_id: &str, payment_id: &str) -> HmacSha256 {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(order_id.as_bytes());
    mac.update(b"|");
    mac.update(payment_id.as_bytes());
    mac
}

/// Signature the gateway attaches to a checkout callback:
/// lower-case hex of HMAC-SHA256(`order_id|payment_id`) keyed by the API secret.
pub fn sign_payment(secret: &str, order_id: &str, payment_id: &str) -> String {
    hex::encode(payment_mac(secret, order_id, payment_id).finalize().into_bytes())
}

/// Check a callback signature in constant time.
///
/// Only the exact lower-case hex form is accepted: no padding, no upper case.
pub fn verify_payment_signature(
    secret: &str,
    order_id: &str,
    payment_id: &str,
    signature: &str,
) -> bool {
    if !is_lower_hex_digest(signature) {
        return false;
    }
    let Ok(received) = hex::decode(signature) else {
        return false;
    };
    payment_mac(secret, order_id, payment_id)
        .verify_slice(&received)
        .is_ok()
}

fn is_lower_hex_digest(signature: &str) -> bool {
    signature.len() == 64
        && signature
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}
