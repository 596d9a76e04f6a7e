//! Wire framing: URL-safe base64 over JSON.
//!
//! Every value that crosses a boundary — file, URL fragment, mailbox body —
//! is one of these frames. The inner structure is a small tagged serde
//! value; byte fields inside it are themselves base64 strings, so a frame
//! is always plain ASCII safe for URLs and list-item bodies.

use serde::{de::DeserializeOwned, Serialize};

/// Encode any serializable value as a URL-safe unpadded base64 frame.
pub fn to_wire<T: Serialize>(value: &T) -> anyhow::Result<String> {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;

    let json = serde_json::to_vec(value).map_err(|e| anyhow::anyhow!("frame encoding: {e}"))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

/// Decode a frame produced by [`to_wire`].
pub fn from_wire<T: DeserializeOwned>(frame: &str) -> anyhow::Result<T> {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;

    let json = URL_SAFE_NO_PAD
        .decode(frame.trim())
        .map_err(|e| anyhow::anyhow!("frame base64: {e}"))?;
    serde_json::from_slice(&json).map_err(|e| anyhow::anyhow!("frame decoding: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sealed::seal;
    use crate::KEY_SIZE;

    #[test]
    fn test_frame_roundtrip() {
        let boxed = seal(&[1u8; KEY_SIZE], b"payload").unwrap();
        let frame = to_wire(&boxed).unwrap();
        let restored: crate::SealedBox = from_wire(&frame).unwrap();
        assert_eq!(restored.iv, boxed.iv);
        assert_eq!(restored.tag, boxed.tag);
        assert_eq!(restored.data, boxed.data);
    }

    #[test]
    fn test_frame_is_url_safe() {
        let boxed = seal(&[1u8; KEY_SIZE], &[0xffu8; 300]).unwrap();
        let frame = to_wire(&boxed).unwrap();
        assert!(frame
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_frame_garbage_rejected() {
        assert!(from_wire::<crate::SealedBox>("not!valid!base64!").is_err());
        // valid base64, bad structure
        assert!(from_wire::<crate::SealedBox>("aGVsbG8").is_err());
    }

    #[test]
    fn test_frame_tolerates_surrounding_whitespace() {
        let frame = to_wire(&vec![1u32, 2, 3]).unwrap();
        let padded = format!("  {frame}\n");
        let restored: Vec<u32> = from_wire(&padded).unwrap();
        assert_eq!(restored, vec![1, 2, 3]);
    }
}
