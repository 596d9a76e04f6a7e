//! Server side of the handshake.
//!
//! Every cryptographic failure during login is announced to the peer only
//! as `AuthResult { ok: false }`; the specific cause stays in the local
//! error and the logs.

use std::time::Duration;

use tracing::{debug, warn};
use zeroize::Zeroize;

use vlk_channel::Channel;
use vlk_crypto::sealed;

use crate::group;
use crate::messages::{
    b64_decode, b64_encode, HandshakeMessage, OP_REGISTER, TAG_AUTH_REQUEST, TAG_AUTH_RESPONSE,
    TAG_AUTH_RESULT, TAG_CLIENT_CONFIRM, TAG_REGISTER_ACK, TAG_REGISTER_REQUEST,
};
use crate::record::{ClientEnvelope, CredentialRecord, SessionKey};
use crate::PakeError;

/// Wait for one registration request and build the credential record.
///
/// The record holds everything a later login needs: the OPRF key, the
/// server static keypair, the client static public key, and the envelope
/// sealed under the hardened OPRF output.
pub async fn register(
    channel: &Channel,
    iterations: u32,
    wait: Duration,
) -> Result<CredentialRecord, PakeError> {
    let frame = channel
        .get_within(OP_REGISTER, TAG_REGISTER_REQUEST, wait)
        .await?;
    let (user_id, alpha) = match HandshakeMessage::from_wire(&frame)? {
        HandshakeMessage::RegisterRequest { user_id, alpha } => (user_id, alpha),
        other => return Err(PakeError::UnexpectedMessage(other.tag())),
    };

    let alpha = match group::decode_point(&b64_decode(&alpha)?) {
        Some(point) => point,
        None => {
            warn!(user_id, "registration rejected: invalid group element");
            let nack = HandshakeMessage::RegisterAck { ok: false };
            channel.give(&user_id, TAG_REGISTER_ACK, nack.to_wire()?)?;
            return Err(PakeError::InvalidGroupElement);
        }
    };

    // Fresh OPRF key and both static keypairs for this user.
    let ks = group::random_scalar();
    let (ps, server_public) = group::keypair();
    let (pu, client_public) = group::keypair();

    let mut rw = group::harden(&(alpha * ks), iterations);
    let client_env = ClientEnvelope {
        pu: b64_encode(&pu.to_bytes()),
        client_public: b64_encode(&group::encode_point(&client_public)),
        server_public: b64_encode(&group::encode_point(&server_public)),
    };
    let envelope = sealed::seal(&rw, &client_env.to_bytes()?)?;
    rw.zeroize();

    let record = CredentialRecord {
        user_id: user_id.clone(),
        ks: b64_encode(&ks.to_bytes()),
        ps: b64_encode(&ps.to_bytes()),
        server_public: b64_encode(&group::encode_point(&server_public)),
        client_public: b64_encode(&group::encode_point(&client_public)),
        envelope,
    };

    let ack = HandshakeMessage::RegisterAck { ok: true };
    channel.give(&user_id, TAG_REGISTER_ACK, ack.to_wire()?)?;
    debug!(user_id, "registration complete");
    Ok(record)
}

/// Run the server half of a login handshake against a stored record.
pub async fn authenticate(
    channel: &Channel,
    record: &CredentialRecord,
    wait: Duration,
) -> Result<SessionKey, PakeError> {
    let user_id = record.user_id.as_str();

    let ks = group::decode_scalar(&b64_decode(&record.ks)?).ok_or(PakeError::InvalidRecord)?;
    let ps = group::decode_scalar(&b64_decode(&record.ps)?).ok_or(PakeError::InvalidRecord)?;
    let client_static = group::decode_point(&b64_decode(&record.client_public)?)
        .ok_or(PakeError::InvalidRecord)?;

    let frame = channel.get_within(user_id, TAG_AUTH_REQUEST, wait).await?;
    let (alpha, client_ephemeral) = match HandshakeMessage::from_wire(&frame)? {
        HandshakeMessage::AuthRequest {
            alpha,
            client_ephemeral,
        } => (alpha, client_ephemeral),
        other => return Err(PakeError::UnexpectedMessage(other.tag())),
    };

    let decoded = b64_decode(&alpha)
        .ok()
        .and_then(|bytes| group::decode_point(&bytes))
        .zip(
            b64_decode(&client_ephemeral)
                .ok()
                .and_then(|bytes| group::decode_point(&bytes)),
        );
    let (alpha, client_ephemeral) = match decoded {
        Some(pair) => pair,
        None => {
            warn!(user_id, "login rejected: invalid group element");
            announce(channel, user_id, false)?;
            return Err(PakeError::InvalidGroupElement);
        }
    };

    // Evaluate the OPRF over the blinded element and run triple DH with a
    // fresh ephemeral keypair.
    let beta = alpha * ks;
    let (xs, server_ephemeral) = group::keypair();
    let shared = client_ephemeral * ps + client_static * xs + client_ephemeral * xs;
    let schedule = group::derive_schedule(&shared)?;

    let response = HandshakeMessage::AuthResponse {
        beta: b64_encode(&group::encode_point(&beta)),
        server_ephemeral: b64_encode(&group::encode_point(&server_ephemeral)),
        envelope: record.envelope.clone(),
        confirm: b64_encode(&schedule.server_confirm),
    };
    channel.give(user_id, TAG_AUTH_RESPONSE, response.to_wire()?)?;
    debug!(user_id, "auth response sent");

    let frame = channel.get_within(user_id, TAG_CLIENT_CONFIRM, wait).await?;
    let confirm = match HandshakeMessage::from_wire(&frame)? {
        HandshakeMessage::ClientConfirm { confirm } => confirm,
        other => return Err(PakeError::UnexpectedMessage(other.tag())),
    };

    let their_confirm: Option<[u8; 32]> = b64_decode(&confirm)
        .ok()
        .and_then(|bytes| bytes.try_into().ok());
    let confirmed = match their_confirm {
        Some(tag) => group::ct_eq(&tag, &schedule.client_confirm),
        None => false,
    };
    if !confirmed {
        warn!(user_id, "client confirmation tag mismatch");
        announce(channel, user_id, false)?;
        return Err(PakeError::ClientConfirmMismatch);
    }

    announce(channel, user_id, true)?;
    debug!(user_id, "handshake complete");
    Ok(SessionKey::from_bytes(schedule.session_key))
}

fn announce(channel: &Channel, user_id: &str, ok: bool) -> Result<(), PakeError> {
    let msg = HandshakeMessage::AuthResult { ok };
    channel.give(user_id, TAG_AUTH_RESULT, msg.to_wire()?)?;
    Ok(())
}
