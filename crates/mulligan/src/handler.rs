//! Per-connection handler: the handshake state machine and per-kind
//! dispatch.
//!
//! Each accepted connection gets its own Tokio task running
//! [`handle_connection`]. The flow is:
//!
//! 1. `VersionRequest` → versions must match exactly
//! 2. `LoginRequest` → token validated against the profile store
//! 3. Loop: read one message, fan it out to observers, dispatch to
//!    exactly one handler
//!
//! The handshake is strict: until version and login have both succeeded,
//! any other message kind gets a wire error and the connection closes.
//! After that, validation failures (full lobby, missing privilege, bad
//! card) are reported on the wire and the connection stays open; only
//! framing errors, version/identity failures, and transport errors tear
//! it down.

use std::sync::Arc;

use mulligan_events::ServerEvent;
use mulligan_lobby::{LobbyError, LobbyRegistry};
use mulligan_protocol::{
    CardChoice, CardResult, ChatLine, ChatText, KickOutcome, KickTarget,
    LobbyCreated, LobbyEntry, LobbyId, LobbyList, LobbyName,
    LobbySelector, LobbyUpdate, LoginAck, LoginCredentials, Message,
    MessageKind, PROTOCOL_VERSION, PileContents, PileSelector,
    PlayerEntry, PlayerId, PlayerList, VersionInfo, read_message,
};
use mulligan_session::{ProfileStore, Session};
use mulligan_transport::Connection;
use tokio::net::tcp::OwnedReadHalf;

use crate::engine::GameEngine;
use crate::responses;
use crate::server::ServerState;
use crate::ServerError;

/// Where a connection stands in the mandatory handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    AwaitingVersion,
    AwaitingLogin,
    Active,
}

/// What the dispatcher decided about the connection's future.
enum Flow {
    Continue,
    Close,
}

/// Handles a single connection from accept to teardown.
///
/// Messages are processed strictly in arrival order; this task is the
/// only reader of `read_half`, so no other connection's traffic can
/// interleave here.
pub(crate) async fn handle_connection<P, E>(
    connection: Connection,
    mut read_half: OwnedReadHalf,
    state: Arc<ServerState<P, E>>,
) -> Result<(), ServerError>
where
    P: ProfileStore,
    E: GameEngine,
{
    let conn_id = connection.id();
    let mut phase = Phase::AwaitingVersion;

    loop {
        let message = match read_message(&mut read_half).await {
            Ok(Some(message)) => message,
            Ok(None) => {
                tracing::info!(%conn_id, "connection closed by peer");
                break;
            }
            Err(e) => {
                // Framing and unknown-kind errors land here: fatal for
                // this connection, invisible to every other one.
                tracing::warn!(%conn_id, error = %e, "read failed, tearing down connection");
                break;
            }
        };

        state.events.notify(&ServerEvent::MessageReceived {
            connection: conn_id,
            message: message.clone(),
        });

        match dispatch(&connection, &state, &mut phase, message).await {
            Ok(Flow::Continue) => {}
            Ok(Flow::Close) => break,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "handler failed, tearing down connection");
                break;
            }
        }
    }

    teardown(&connection, &state).await;
    Ok(())
}

/// Removes everything this connection owned: its session, its lobby
/// seat, and finally the socket. Remaining lobby members are told the
/// player left. No other connection's resources are touched.
async fn teardown<P, E>(
    connection: &Connection,
    state: &Arc<ServerState<P, E>>,
) where
    P: ProfileStore,
    E: GameEngine,
{
    let removed = {
        let mut sessions = state.sessions.lock().await;
        sessions.remove_by_connection(connection.id())
    };

    if let Some(session) = removed {
        let left = {
            let mut lobbies = state.lobbies.lock().await;
            lobbies.leave(session.id())
        };
        if let Ok(outcome) = left {
            let update = Message::LeaveLobbyResponse(LobbyUpdate {
                id: outcome.lobby_id,
                name: outcome.lobby_name,
                success: true,
            });
            let recipients = sessions_for(state, &outcome.remaining).await;
            responses::broadcast(&recipients, &update).await;
        }
    }

    state.events.notify(&ServerEvent::Disconnected {
        connection: connection.id(),
    });

    if let Err(e) = connection.close().await {
        tracing::debug!(
            connection = %connection.id(),
            error = %e,
            "close failed"
        );
    }
}

/// Resolves identities to live sessions, skipping any that logged out
/// after the caller took its membership snapshot (benign staleness).
async fn sessions_for<P, E>(
    state: &Arc<ServerState<P, E>>,
    players: &[PlayerId],
) -> Vec<Arc<Session>>
where
    P: ProfileStore,
    E: GameEngine,
{
    let sessions = state.sessions.lock().await;
    players
        .iter()
        .filter_map(|id| sessions.find_by_id(id).ok())
        .collect()
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

async fn dispatch<P, E>(
    connection: &Connection,
    state: &Arc<ServerState<P, E>>,
    phase: &mut Phase,
    message: Message,
) -> Result<Flow, ServerError>
where
    P: ProfileStore,
    E: GameEngine,
{
    // Exit is honored in every phase.
    if matches!(message, Message::Exit) {
        tracing::info!(connection = %connection.id(), "client exited");
        return Ok(Flow::Close);
    }

    match *phase {
        Phase::AwaitingVersion => match message {
            Message::VersionRequest(info) => {
                handle_version(connection, phase, info).await
            }
            other => reject_out_of_order(connection, other.kind()).await,
        },
        Phase::AwaitingLogin => match message {
            Message::LoginRequest(credentials) => {
                handle_login(connection, state, phase, credentials).await
            }
            other => reject_out_of_order(connection, other.kind()).await,
        },
        Phase::Active => handle_active(connection, state, message).await,
    }
}

/// Strict-handshake enforcement: anything out of order closes the
/// connection after a wire error.
async fn reject_out_of_order(
    connection: &Connection,
    kind: MessageKind,
) -> Result<Flow, ServerError> {
    tracing::warn!(
        connection = %connection.id(),
        %kind,
        "message out of handshake order"
    );
    responses::send_error(
        connection,
        "Handshake incomplete: version and login must come first.",
    )
    .await?;
    Ok(Flow::Close)
}

async fn handle_version(
    connection: &Connection,
    phase: &mut Phase,
    info: VersionInfo,
) -> Result<Flow, ServerError> {
    if info.version != PROTOCOL_VERSION {
        tracing::error!(
            connection = %connection.id(),
            client_version = info.version,
            server_version = PROTOCOL_VERSION,
            "protocol version mismatch"
        );
        responses::send_error(connection, "Protocol version mismatch.")
            .await?;
        return Ok(Flow::Close);
    }

    responses::send(
        connection,
        &Message::VersionResponse(VersionInfo {
            version: PROTOCOL_VERSION,
        }),
    )
    .await?;
    *phase = Phase::AwaitingLogin;
    Ok(Flow::Continue)
}

async fn handle_login<P, E>(
    connection: &Connection,
    state: &Arc<ServerState<P, E>>,
    phase: &mut Phase,
    credentials: LoginCredentials,
) -> Result<Flow, ServerError>
where
    P: ProfileStore,
    E: GameEngine,
{
    let profile = match state.profiles.retrieve(&credentials.token).await {
        Ok(profile) => profile,
        Err(e) => {
            tracing::warn!(
                connection = %connection.id(),
                error = %e,
                "login token rejected"
            );
            responses::send_error(connection, "Login failed.").await?;
            return Ok(Flow::Close);
        }
    };

    if profile.id != credentials.id {
        tracing::warn!(
            connection = %connection.id(),
            claimed = %credentials.id,
            resolved = %profile.id,
            "login identity mismatch"
        );
        responses::send_error(connection, "Login failed.").await?;
        return Ok(Flow::Close);
    }

    {
        let mut sessions = state.sessions.lock().await;
        if sessions.contains(&credentials.id) {
            drop(sessions);
            // Validation failure, not a protocol violation: the client
            // may retry with a different identity.
            responses::send_error(
                connection,
                "Player is already logged in.",
            )
            .await?;
            return Ok(Flow::Continue);
        }
        let limit = state.config.max_sessions;
        if limit > 0 && sessions.len() >= limit {
            drop(sessions);
            tracing::warn!(
                connection = %connection.id(),
                limit,
                "login refused, session limit reached"
            );
            responses::send_error(connection, "Server is full.").await?;
            return Ok(Flow::Continue);
        }
        sessions.add(Arc::new(Session::new(
            credentials.id.clone(),
            credentials.name.clone(),
            connection.clone(),
        )));
    }

    responses::send(
        connection,
        &Message::LoginResponse(LoginAck {
            id: credentials.id,
            name: credentials.name,
        }),
    )
    .await?;
    *phase = Phase::Active;
    Ok(Flow::Continue)
}

// ---------------------------------------------------------------------------
// Active-phase handlers
// ---------------------------------------------------------------------------

async fn handle_active<P, E>(
    connection: &Connection,
    state: &Arc<ServerState<P, E>>,
    message: Message,
) -> Result<Flow, ServerError>
where
    P: ProfileStore,
    E: GameEngine,
{
    let session = {
        let sessions = state.sessions.lock().await;
        sessions.find_by_connection(connection.id())
    };
    let session = match session {
        Ok(session) => session,
        Err(e) => {
            tracing::warn!(
                connection = %connection.id(),
                error = %e,
                "active connection lost its session"
            );
            responses::send_error(connection, "No session for this connection.")
                .await?;
            return Ok(Flow::Close);
        }
    };

    match message {
        Message::PlayerListRequest => {
            handle_player_list(connection, state, &session).await?
        }
        Message::GlobalChatRequest(text) => {
            handle_global_chat(state, &session, text).await?
        }
        Message::LobbyChatRequest(text) => {
            handle_lobby_chat(connection, state, &session, text).await?
        }
        Message::CreateLobbyRequest(name) => {
            handle_create_lobby(connection, state, &session, name).await?
        }
        Message::LobbyListRequest => {
            handle_lobby_list(connection, state).await?
        }
        Message::JoinLobbyRequest(selector) => {
            handle_join_lobby(connection, state, &session, selector)
                .await?
        }
        Message::LeaveLobbyRequest(selector) => {
            handle_leave_lobby(connection, state, &session, selector)
                .await?
        }
        Message::LobbyKickRequest(kick) => {
            handle_lobby_kick(connection, state, &session, kick).await?
        }
        Message::CardPileRequest(selector) => {
            handle_card_pile(connection, state, &session, selector)
                .await?
        }
        Message::DrawCardRequest(selector) => {
            handle_draw_card(connection, state, &session, selector)
                .await?
        }
        Message::PlayCardRequest(choice) => {
            handle_play_card(connection, state, &session, choice).await?
        }
        Message::DiscardCardRequest(choice) => {
            handle_discard_card(connection, state, &session, choice)
                .await?
        }
        other => {
            // Server→client kinds and repeated handshake messages end up
            // here; they carry nothing actionable for an active session.
            tracing::debug!(
                connection = %connection.id(),
                kind = %other.kind(),
                "ignoring unexpected message kind"
            );
        }
    }
    Ok(Flow::Continue)
}

async fn handle_player_list<P, E>(
    connection: &Connection,
    state: &Arc<ServerState<P, E>>,
    session: &Arc<Session>,
) -> Result<(), ServerError>
where
    P: ProfileStore,
    E: GameEngine,
{
    let players: Vec<PlayerEntry> = {
        let sessions = state.sessions.lock().await;
        sessions
            .snapshot()
            .iter()
            .map(|s| PlayerEntry {
                id: s.id().clone(),
                name: s.name().to_string(),
            })
            .collect()
    };

    tracing::debug!(player_id = %session.id(), "player list requested");
    let list = PlayerList {
        count: players.len() as u32,
        players,
    };
    responses::send(connection, &Message::PlayerListResponse(list)).await
}

async fn handle_global_chat<P, E>(
    state: &Arc<ServerState<P, E>>,
    session: &Arc<Session>,
    text: ChatText,
) -> Result<(), ServerError>
where
    P: ProfileStore,
    E: GameEngine,
{
    let recipients = { state.sessions.lock().await.snapshot() };

    tracing::info!(
        player_id = %session.id(),
        "(global chat) {}: {}",
        session.name(),
        text.message
    );

    let line = Message::GlobalChatResponse(ChatLine {
        name: session.name().to_string(),
        message: text.message,
    });
    responses::broadcast(&recipients, &line).await;
    Ok(())
}

async fn handle_lobby_chat<P, E>(
    connection: &Connection,
    state: &Arc<ServerState<P, E>>,
    session: &Arc<Session>,
    text: ChatText,
) -> Result<(), ServerError>
where
    P: ProfileStore,
    E: GameEngine,
{
    let members = {
        let lobbies = state.lobbies.lock().await;
        match lobbies.find_by_member(session.id()) {
            Ok(lobby) => lobby.members().to_vec(),
            Err(e) => {
                return responses::send_error(connection, &e.to_string())
                    .await;
            }
        }
    };

    let line = Message::LobbyChatResponse(ChatLine {
        name: session.name().to_string(),
        message: text.message,
    });
    let recipients = sessions_for(state, &members).await;
    responses::broadcast(&recipients, &line).await;
    Ok(())
}

async fn handle_create_lobby<P, E>(
    connection: &Connection,
    state: &Arc<ServerState<P, E>>,
    session: &Arc<Session>,
    name: LobbyName,
) -> Result<(), ServerError>
where
    P: ProfileStore,
    E: GameEngine,
{
    let created = {
        let mut lobbies = state.lobbies.lock().await;
        let limit = state.config.max_lobbies;
        if limit > 0 && lobbies.len() >= limit {
            drop(lobbies);
            tracing::debug!(
                player_id = %session.id(),
                limit,
                "create refused, lobby limit reached"
            );
            return responses::send_error(
                connection,
                "Lobby limit reached.",
            )
            .await;
        }
        lobbies
            .create(session.id().clone(), &name.name)
            .map(|lobby| lobby.id().clone())
    };

    match created {
        Ok(id) => {
            responses::send(
                connection,
                &Message::CreateLobbyResponse(LobbyCreated { id }),
            )
            .await
        }
        Err(e) => responses::send_error(connection, &e.to_string()).await,
    }
}

async fn handle_lobby_list<P, E>(
    connection: &Connection,
    state: &Arc<ServerState<P, E>>,
) -> Result<(), ServerError>
where
    P: ProfileStore,
    E: GameEngine,
{
    let lobbies: Vec<LobbyEntry> = {
        let registry = state.lobbies.lock().await;
        registry
            .list()
            .iter()
            .map(|lobby| LobbyEntry {
                id: lobby.id().clone(),
                name: lobby.name().to_string(),
            })
            .collect()
    };

    let list = LobbyList {
        count: lobbies.len() as u32,
        lobbies,
    };
    responses::send(connection, &Message::LobbyListResponse(list)).await
}

/// Resolves a join/leave selector to a lobby id: by id first, then by
/// name, matching the original service's lookup order.
fn resolve_selector(
    registry: &LobbyRegistry,
    selector: &LobbySelector,
) -> Result<LobbyId, LobbyError> {
    match (&selector.id, &selector.name) {
        (Some(id), Some(name)) => registry
            .find(id)
            .or_else(|_| registry.find_by_name(name))
            .map(|lobby| lobby.id().clone()),
        (Some(id), None) => {
            registry.find(id).map(|lobby| lobby.id().clone())
        }
        (None, Some(name)) => registry
            .find_by_name(name)
            .map(|lobby| lobby.id().clone()),
        (None, None) => Err(LobbyError::NameNotFound(String::new())),
    }
}

async fn handle_join_lobby<P, E>(
    connection: &Connection,
    state: &Arc<ServerState<P, E>>,
    session: &Arc<Session>,
    selector: LobbySelector,
) -> Result<(), ServerError>
where
    P: ProfileStore,
    E: GameEngine,
{
    if selector.id.is_none() && selector.name.is_none() {
        return responses::send_error(
            connection,
            "Join request named no lobby.",
        )
        .await;
    }

    // Resolve and join under one registry lock so the seat count can't
    // change between the lookup and the join.
    let result = {
        let mut lobbies = state.lobbies.lock().await;
        match resolve_selector(&lobbies, &selector) {
            Err(e) => Err((None, e)),
            Ok(id) => {
                let name = lobbies
                    .find(&id)
                    .map(|lobby| lobby.name().to_string())
                    .unwrap_or_default();
                match lobbies.join(&id, session.id().clone()) {
                    Ok(lobby) => Ok((
                        lobby.id().clone(),
                        lobby.name().to_string(),
                        lobby.members().to_vec(),
                    )),
                    Err(e) => Err((Some((id, name)), e)),
                }
            }
        }
    };

    match result {
        Ok((id, name, members)) => {
            let update = Message::JoinLobbyResponse(LobbyUpdate {
                id,
                name,
                success: true,
            });
            let recipients = sessions_for(state, &members).await;
            responses::broadcast(&recipients, &update).await;
            Ok(())
        }
        Err((Some((id, name)), e)) => {
            tracing::debug!(
                player_id = %session.id(),
                error = %e,
                "join rejected"
            );
            responses::send(
                connection,
                &Message::JoinLobbyResponse(LobbyUpdate {
                    id,
                    name,
                    success: false,
                }),
            )
            .await
        }
        Err((None, e)) => {
            responses::send_error(connection, &e.to_string()).await
        }
    }
}

async fn handle_leave_lobby<P, E>(
    connection: &Connection,
    state: &Arc<ServerState<P, E>>,
    session: &Arc<Session>,
    _selector: LobbySelector,
) -> Result<(), ServerError>
where
    P: ProfileStore,
    E: GameEngine,
{
    // The selector is advisory: a session sits in at most one lobby, so
    // a leave can only mean that one.
    let left = { state.lobbies.lock().await.leave(session.id()) };

    match left {
        Ok(outcome) => {
            let update = Message::LeaveLobbyResponse(LobbyUpdate {
                id: outcome.lobby_id,
                name: outcome.lobby_name,
                success: true,
            });
            responses::send(connection, &update).await?;
            let recipients = sessions_for(state, &outcome.remaining).await;
            responses::broadcast(&recipients, &update).await;
            Ok(())
        }
        Err(e) => responses::send_error(connection, &e.to_string()).await,
    }
}

async fn handle_lobby_kick<P, E>(
    connection: &Connection,
    state: &Arc<ServerState<P, E>>,
    session: &Arc<Session>,
    kick: KickTarget,
) -> Result<(), ServerError>
where
    P: ProfileStore,
    E: GameEngine,
{
    // Host privilege is checked inside the registry on every attempt,
    // never cached from an earlier message.
    let result = {
        let mut lobbies = state.lobbies.lock().await;
        lobbies.kick(session.id(), &kick.target).map(|_| ())
    };

    match result {
        Ok(()) => {
            let response = Message::LobbyKickResponse(KickOutcome {
                target: kick.target.clone(),
                success: true,
            });
            responses::send(connection, &response).await?;
            let kicked =
                sessions_for(state, std::slice::from_ref(&kick.target))
                    .await;
            responses::broadcast(&kicked, &response).await;
            Ok(())
        }
        Err(e) => {
            tracing::debug!(
                player_id = %session.id(),
                target = %kick.target,
                error = %e,
                "kick rejected"
            );
            responses::send(
                connection,
                &Message::LobbyKickResponse(KickOutcome {
                    target: kick.target,
                    success: false,
                }),
            )
            .await
        }
    }
}

// ---------------------------------------------------------------------------
// Card operations — pass-through to the game engine
// ---------------------------------------------------------------------------

async fn handle_card_pile<P, E>(
    connection: &Connection,
    state: &Arc<ServerState<P, E>>,
    session: &Arc<Session>,
    selector: PileSelector,
) -> Result<(), ServerError>
where
    P: ProfileStore,
    E: GameEngine,
{
    match state.engine.card_pile(session.id(), selector.pile).await {
        Ok(cards) => {
            responses::send(
                connection,
                &Message::CardPileResponse(PileContents {
                    pile: selector.pile,
                    cards,
                }),
            )
            .await
        }
        Err(e) => responses::send_error(connection, &e.to_string()).await,
    }
}

async fn handle_draw_card<P, E>(
    connection: &Connection,
    state: &Arc<ServerState<P, E>>,
    session: &Arc<Session>,
    selector: PileSelector,
) -> Result<(), ServerError>
where
    P: ProfileStore,
    E: GameEngine,
{
    match state.engine.draw_card(session.id(), selector.pile).await {
        Ok(card) => {
            responses::send(
                connection,
                &Message::DrawCardResponse(CardResult { card }),
            )
            .await
        }
        Err(e) => responses::send_error(connection, &e.to_string()).await,
    }
}

async fn handle_play_card<P, E>(
    connection: &Connection,
    state: &Arc<ServerState<P, E>>,
    session: &Arc<Session>,
    choice: CardChoice,
) -> Result<(), ServerError>
where
    P: ProfileStore,
    E: GameEngine,
{
    match state.engine.play_card(session.id(), &choice.card).await {
        Ok(card) => {
            responses::send(
                connection,
                &Message::PlayCardResponse(CardResult { card }),
            )
            .await
        }
        Err(e) => responses::send_error(connection, &e.to_string()).await,
    }
}

async fn handle_discard_card<P, E>(
    connection: &Connection,
    state: &Arc<ServerState<P, E>>,
    session: &Arc<Session>,
    choice: CardChoice,
) -> Result<(), ServerError>
where
    P: ProfileStore,
    E: GameEngine,
{
    match state.engine.discard_card(session.id(), &choice.card).await {
        Ok(card) => {
            responses::send(
                connection,
                &Message::DiscardCardResponse(CardResult { card }),
            )
            .await
        }
        Err(e) => responses::send_error(connection, &e.to_string()).await,
    }
}
