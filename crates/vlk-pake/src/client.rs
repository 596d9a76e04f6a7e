//! Client side of the handshake.
//!
//! Registration is send-and-forget: the client publishes its hashed
//! password element and the server builds the credential record. Login
//! runs the full OPRF + triple-DH exchange and ends with a mutually
//! confirmed [`SessionKey`].

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};
use zeroize::Zeroize;

use vlk_channel::Channel;
use vlk_crypto::sealed;

use crate::group;
use crate::messages::{
    b64_decode, b64_encode, HandshakeMessage, OP_REGISTER, TAG_AUTH_REQUEST, TAG_AUTH_RESPONSE,
    TAG_AUTH_RESULT, TAG_CLIENT_CONFIRM, TAG_REGISTER_ACK, TAG_REGISTER_REQUEST,
};
use crate::record::{ClientEnvelope, SessionKey};
use crate::PakeError;

/// Publish a registration request for `user_id`.
///
/// The password element travels unblinded here: the server must evaluate
/// its OPRF key over the same element the client will later reconstruct
/// from the password alone.
pub fn register(
    channel: &Channel,
    user_id: &str,
    password: &SecretString,
) -> Result<(), PakeError> {
    let alpha = group::hash_to_point(password.expose_secret().as_bytes());
    let msg = HandshakeMessage::RegisterRequest {
        user_id: user_id.to_string(),
        alpha: b64_encode(&group::encode_point(&alpha)),
    };
    channel.give(OP_REGISTER, TAG_REGISTER_REQUEST, msg.to_wire()?)?;
    debug!(user_id, "registration request sent");
    Ok(())
}

/// Wait for the server's registration acknowledgement.
pub async fn await_register_ack(
    channel: &Channel,
    user_id: &str,
    wait: Duration,
) -> Result<(), PakeError> {
    let frame = channel.get_within(user_id, TAG_REGISTER_ACK, wait).await?;
    match HandshakeMessage::from_wire(&frame)? {
        HandshakeMessage::RegisterAck { ok: true } => Ok(()),
        HandshakeMessage::RegisterAck { ok: false } => Err(PakeError::Denied),
        other => Err(PakeError::UnexpectedMessage(other.tag())),
    }
}

/// Run the client half of a login handshake.
///
/// `iterations` is the hardening round count and must match the value the
/// server registered with. Any cryptographic failure between the server's
/// response and the final confirmation surfaces as [`PakeError::WrongPassword`];
/// the caller cannot distinguish a mistyped password from a forged envelope,
/// which is the point.
pub async fn authenticate(
    channel: &Channel,
    user_id: &str,
    password: &SecretString,
    iterations: u32,
    wait: Duration,
) -> Result<SessionKey, PakeError> {
    // Blind the password element with a fresh factor and send it with an
    // ephemeral public key.
    let (r, alpha) = group::blind(password.expose_secret().as_bytes());
    let (xu, client_ephemeral) = group::keypair();

    let request = HandshakeMessage::AuthRequest {
        alpha: b64_encode(&group::encode_point(&alpha)),
        client_ephemeral: b64_encode(&group::encode_point(&client_ephemeral)),
    };
    channel.give(user_id, TAG_AUTH_REQUEST, request.to_wire()?)?;
    debug!(user_id, "auth request sent");

    let frame = channel.get_within(user_id, TAG_AUTH_RESPONSE, wait).await?;
    let (beta, server_ephemeral, envelope, server_confirm) =
        match HandshakeMessage::from_wire(&frame)? {
            HandshakeMessage::AuthResponse {
                beta,
                server_ephemeral,
                envelope,
                confirm,
            } => (beta, server_ephemeral, envelope, confirm),
            other => return Err(PakeError::UnexpectedMessage(other.tag())),
        };

    let beta = group::decode_point(&b64_decode(&beta)?).ok_or(PakeError::InvalidGroupElement)?;
    let server_ephemeral = group::decode_point(&b64_decode(&server_ephemeral)?)
        .ok_or(PakeError::InvalidGroupElement)?;

    // Unblind and harden to recover rw, then open the envelope. An AEAD
    // failure here means the password does not match the record.
    let mut rw = group::harden(&group::unblind(&beta, &r), iterations);
    let opened = sealed::open(&rw, &envelope);
    rw.zeroize();
    let plaintext = opened.map_err(|_| PakeError::WrongPassword)?;
    let client_env = ClientEnvelope::from_bytes(&plaintext)?;

    let pu =
        group::decode_scalar(&b64_decode(&client_env.pu)?).ok_or(PakeError::WrongPassword)?;
    let client_static = group::decode_point(&b64_decode(&client_env.client_public)?)
        .ok_or(PakeError::WrongPassword)?;
    let server_static = group::decode_point(&b64_decode(&client_env.server_public)?)
        .ok_or(PakeError::WrongPassword)?;

    // The recovered private key must match the recovered public key, or
    // the envelope contents are inconsistent.
    if !group::ct_eq(
        &group::encode_point(&group::public_key(&pu)),
        &group::encode_point(&client_static),
    ) {
        warn!(user_id, "envelope keypair mismatch");
        return Err(PakeError::WrongPassword);
    }

    // Triple DH: static-ephemeral both ways plus ephemeral-ephemeral.
    let shared = server_static * xu + server_ephemeral * pu + server_ephemeral * xu;
    let schedule = group::derive_schedule(&shared)?;

    let their_confirm: [u8; 32] = b64_decode(&server_confirm)?
        .try_into()
        .map_err(|_| PakeError::Wire("bad confirmation tag length".into()))?;
    if !group::ct_eq(&their_confirm, &schedule.server_confirm) {
        warn!(user_id, "server confirmation tag mismatch");
        return Err(PakeError::ServerConfirmMismatch);
    }

    let confirm = HandshakeMessage::ClientConfirm {
        confirm: b64_encode(&schedule.client_confirm),
    };
    channel.give(user_id, TAG_CLIENT_CONFIRM, confirm.to_wire()?)?;

    let frame = channel.get_within(user_id, TAG_AUTH_RESULT, wait).await?;
    match HandshakeMessage::from_wire(&frame)? {
        HandshakeMessage::AuthResult { ok: true } => {
            debug!(user_id, "handshake complete");
            Ok(SessionKey::from_bytes(schedule.session_key))
        }
        HandshakeMessage::AuthResult { ok: false } => Err(PakeError::Denied),
        other => Err(PakeError::UnexpectedMessage(other.tag())),
    }
}
