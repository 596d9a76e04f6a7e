//! Handshake wire messages and the channel addresses they travel on.

use serde::{Deserialize, Serialize};

use vlk_crypto::SealedBox;

use crate::PakeError;

/// Operation component of registration addresses. Registration requests
/// arrive at a well-known address because the server does not yet know
/// the user id.
pub const OP_REGISTER: &str = "register";
pub const TAG_REGISTER_REQUEST: &str = "request";

/// Per-user message tags; the operation component is the user id.
pub const TAG_REGISTER_ACK: &str = "register_ack";
pub const TAG_AUTH_REQUEST: &str = "auth_request";
pub const TAG_AUTH_RESPONSE: &str = "auth_response";
pub const TAG_CLIENT_CONFIRM: &str = "client_confirm";
pub const TAG_AUTH_RESULT: &str = "auth_result";

/// One message per handshake step. Group elements and tags travel as
/// base64 strings inside the JSON wire frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum HandshakeMessage {
    RegisterRequest { user_id: String, alpha: String },
    RegisterAck { ok: bool },
    AuthRequest { alpha: String, client_ephemeral: String },
    AuthResponse {
        beta: String,
        server_ephemeral: String,
        envelope: SealedBox,
        confirm: String,
    },
    ClientConfirm { confirm: String },
    AuthResult { ok: bool },
}

impl HandshakeMessage {
    pub fn tag(&self) -> &'static str {
        match self {
            HandshakeMessage::RegisterRequest { .. } => TAG_REGISTER_REQUEST,
            HandshakeMessage::RegisterAck { .. } => TAG_REGISTER_ACK,
            HandshakeMessage::AuthRequest { .. } => TAG_AUTH_REQUEST,
            HandshakeMessage::AuthResponse { .. } => TAG_AUTH_RESPONSE,
            HandshakeMessage::ClientConfirm { .. } => TAG_CLIENT_CONFIRM,
            HandshakeMessage::AuthResult { .. } => TAG_AUTH_RESULT,
        }
    }

    pub fn to_wire(&self) -> Result<String, PakeError> {
        vlk_crypto::frame::to_wire(self).map_err(|e| PakeError::Wire(e.to_string()))
    }

    pub fn from_wire(frame: &str) -> Result<Self, PakeError> {
        vlk_crypto::frame::from_wire(frame).map_err(|e| PakeError::Wire(e.to_string()))
    }
}

pub(crate) fn b64_encode(bytes: &[u8]) -> String {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    STANDARD.encode(bytes)
}

pub(crate) fn b64_decode(value: &str) -> Result<Vec<u8>, PakeError> {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    STANDARD
        .decode(value)
        .map_err(|e| PakeError::Wire(format!("bad base64 field: {e}")))
}
