// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::dto::{Color, Publicity, Rated, SafeInvite};
use crate::id::{InviteId, Tag};
use serde::de::Error as _;
use serde::{Deserialize, Serialize};

/// Payload of a `createinvite` command.
#[derive(Clone, Debug, Deserialize)]
pub struct CreateInviteParams {
    pub variant: String,
    pub clock: String,
    pub color: Color,
    pub rated: Rated,
    pub publicity: Publicity,
    pub tag: Tag,
}

/// Payload of an `acceptinvite` command.
#[derive(Clone, Debug, Deserialize)]
pub struct AcceptInviteParams {
    pub id: InviteId,
    #[serde(rename = "isPrivate")]
    pub is_private: bool,
}

/// The untyped shape every inbound lobby message arrives in; `value` is interpreted once
/// `action` is known (see [`LobbyRequest::parse`]).
#[derive(Debug, Deserialize)]
pub struct RawLobbyRequest {
    pub action: String,
    #[serde(default)]
    pub value: serde_json::Value,
    pub id: u32,
}

/// A decoded client command, with its client-chosen correlation id (`replyTo`).
#[derive(Clone, Debug)]
pub enum LobbyRequest {
    CreateInvite(CreateInviteParams),
    CancelInvite(InviteId),
    AcceptInvite(AcceptInviteParams),
}

impl LobbyRequest {
    /// Interprets a [`RawLobbyRequest`] per its `action`. A malformed or unrecognized
    /// message is a protocol error: reject without touching any lobby state.
    pub fn parse(raw: RawLobbyRequest) -> Result<(Self, u32), serde_json::Error> {
        let request = match raw.action.as_str() {
            "createinvite" => LobbyRequest::CreateInvite(serde_json::from_value(raw.value)?),
            "cancelinvite" => {
                let id: String = serde_json::from_value(raw.value)?;
                let id = InviteId::parse(&id)
                    .ok_or_else(|| serde_json::Error::custom("invalid invite id"))?;
                LobbyRequest::CancelInvite(id)
            }
            "acceptinvite" => LobbyRequest::AcceptInvite(serde_json::from_value(raw.value)?),
            other => {
                return Err(serde_json::Error::custom(format!(
                    "unknown lobby action {other:?}"
                )))
            }
        };
        Ok((request, raw.id))
    }
}

/// The catalogue snapshot payload of an `inviteslist` message.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct InvitesListValue {
    #[serde(rename = "invitesList")]
    pub invites_list: Vec<SafeInvite>,
    #[serde(rename = "currentGameCount")]
    pub current_game_count: u32,
}

/// Arguments accompanying a `notify` message.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct NotifyArgs {
    #[serde(rename = "customNumber", skip_serializing_if = "Option::is_none")]
    pub custom_number: Option<u32>,
    #[serde(rename = "replyTo", skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<u32>,
}

/// Every message the lobby may push to a client.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "server", derive(actix::Message))]
#[cfg_attr(feature = "server", rtype(result = "()"))]
pub enum LobbyResponse {
    InvitesList {
        value: InvitesListValue,
        reply_to: Option<u32>,
    },
    Notify {
        /// i18n key, resolved client-side (or by the translator for server-rendered text).
        value: String,
        args: Option<NotifyArgs>,
    },
    PrintError {
        value: String,
        reply_to: Option<u32>,
    },
    /// Unblocks a UI latch with no content, e.g. ack for a cancel of a vanished invite.
    /// Per spec.md §6 this is a fourth, untagged wire shape (`{"replyTo": N}`, no `action`
    /// field), unlike the three that precede it — see the manual `Serialize` impl below.
    Ack { reply_to: u32 },
}

/// The three `action`-tagged wire shapes `LobbyResponse` can take. `Ack` has no counterpart
/// here: it's the one response with no `action` field, so it can't share this enum's
/// internally-tagged representation. `LobbyResponse`'s manual `Serialize` impl below
/// delegates to this enum for everything but `Ack`.
#[derive(Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
enum TaggedResponse {
    #[serde(rename = "inviteslist")]
    InvitesList {
        value: InvitesListValue,
        #[serde(rename = "replyTo", skip_serializing_if = "Option::is_none")]
        reply_to: Option<u32>,
    },
    Notify {
        value: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        args: Option<NotifyArgs>,
    },
    #[serde(rename = "printerror")]
    PrintError {
        value: String,
        #[serde(rename = "replyTo", skip_serializing_if = "Option::is_none")]
        reply_to: Option<u32>,
    },
}

impl Serialize for LobbyResponse {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            LobbyResponse::InvitesList { value, reply_to } => TaggedResponse::InvitesList {
                value: value.clone(),
                reply_to: *reply_to,
            }
            .serialize(serializer),
            LobbyResponse::Notify { value, args } => TaggedResponse::Notify {
                value: value.clone(),
                args: args.clone(),
            }
            .serialize(serializer),
            LobbyResponse::PrintError { value, reply_to } => TaggedResponse::PrintError {
                value: value.clone(),
                reply_to: *reply_to,
            }
            .serialize(serializer),
            LobbyResponse::Ack { reply_to } => {
                use serde::ser::SerializeStruct;
                let mut s = serializer.serialize_struct("Ack", 1)?;
                s.serialize_field("replyTo", reply_to)?;
                s.end()
            }
        }
    }
}
