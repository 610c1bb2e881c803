//! WebSocket connection handlers.
//!
//! 接続ごとに 2 つのタスクを起動します。
//!
//! - 受信タスク: クライアントからのフレームを 1 つずつ順に処理する
//! - 送信タスク（`pusher_loop`）: MessagePusher から届いたフレームをクライアントに書き込む
//!
//! どちらかが終了した時点で接続を閉じ、切断処理（Presence からの削除と
//! `user-left` の通知）を行います。

use std::sync::Arc;

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::{
    domain::{CollaborationEvent, ConnectionId, Role, RoomEvent, RoomId, SignalKind, UserId, UserName},
    infrastructure::dto::websocket::ClientMessage,
    ui::state::AppState,
    usecase::JoinRoomInput,
};

/// Query parameters for WebSocket connection
///
/// 認証は上流で済んでいる前提です。`user_id` が指定された接続では、
/// その ID が接続の身元として優先されます。
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    pub role: Option<String>,
}

/// 接続時に申告された身元
#[derive(Debug, Clone)]
struct ConnectionIdentity {
    user_id: Option<UserId>,
    user_name: Option<UserName>,
    role: Role,
}

impl TryFrom<ConnectQuery> for ConnectionIdentity {
    type Error = String;

    fn try_from(query: ConnectQuery) -> Result<Self, Self::Error> {
        let user_id = query
            .user_id
            .filter(|id| !id.is_empty())
            .map(UserId::try_from)
            .transpose()
            .map_err(|e| e.to_string())?;
        let user_name = query
            .user_name
            .filter(|name| !name.trim().is_empty())
            .map(UserName::new)
            .transpose()
            .map_err(|e| e.to_string())?;
        let role = match query.role {
            Some(role) => role.parse::<Role>().map_err(|e| e.to_string())?,
            None => Role::Candidate,
        };
        Ok(Self {
            user_id,
            user_name,
            role,
        })
    }
}

impl ConnectionIdentity {
    /// `join-room` で申告された ID・表示名を接続の身元と突き合わせる
    ///
    /// 接続時に `user_id` が指定されていれば、それが唯一有効な ID です。
    /// 申告された ID が異なる場合は参加を拒否します。
    fn resolve_join(
        &self,
        claimed_user_id: Option<String>,
        claimed_user_name: Option<String>,
    ) -> Result<(UserId, Option<UserName>), String> {
        let claimed_user_id = claimed_user_id
            .filter(|id| !id.is_empty())
            .map(UserId::try_from)
            .transpose()
            .map_err(|e| format!("Invalid user id: {}", e))?;
        let claimed_user_name = claimed_user_name
            .filter(|name| !name.trim().is_empty())
            .map(UserName::new)
            .transpose()
            .map_err(|e| format!("Invalid user name: {}", e))?;

        let user_id = match (&self.user_id, claimed_user_id) {
            (Some(own), Some(claimed)) if own != &claimed => {
                return Err(format!(
                    "User id '{}' does not match this connection",
                    claimed.as_str()
                ));
            }
            (Some(own), _) => own.clone(),
            (None, Some(claimed)) => claimed,
            (None, None) => return Err("User id is required to join a room".to_string()),
        };
        let user_name = claimed_user_name.or_else(|| self.user_name.clone());
        Ok((user_id, user_name))
    }
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let identity = match ConnectionIdentity::try_from(query) {
        Ok(identity) => identity,
        Err(e) => {
            tracing::warn!("Rejecting WebSocket connection: {}", e);
            return Err(StatusCode::BAD_REQUEST);
        }
    };

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, identity)))
}

/// Spawns a task that receives frames from the rx channel and pushes them to the WebSocket sender.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sender.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, identity: ConnectionIdentity) {
    let (sender, mut receiver) = socket.split();

    let (tx, rx) = mpsc::unbounded_channel();
    let connection_id = state.connect_participant_usecase.execute(tx).await;
    tracing::info!(
        "Connection '{}' opened (user: {:?}, role: {})",
        connection_id.as_str(),
        identity.user_id.as_ref().map(|id| id.as_str()),
        identity.role
    );

    let state_clone = state.clone();
    let connection_id_clone = connection_id.clone();

    // Spawn a task to receive frames from this client
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::error!("WebSocket error: {}", e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    dispatch(&state_clone, &connection_id_clone, &identity, text.as_str()).await;
                }
                Message::Ping(_) => {
                    tracing::debug!("Received ping");
                }
                Message::Close(_) => {
                    tracing::info!(
                        "Connection '{}' requested close",
                        connection_id_clone.as_str()
                    );
                    break;
                }
                _ => {}
            }
        }
    });

    // Spawn a task to send frames pushed by the MessagePusher to this client
    let mut send_task = pusher_loop(rx, sender);

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    match state
        .disconnect_participant_usecase
        .execute(&connection_id)
        .await
    {
        Some((room_id, members)) => tracing::info!(
            "Connection '{}' closed, left room '{}' ({} remaining)",
            connection_id.as_str(),
            room_id.as_str(),
            members.len()
        ),
        None => tracing::info!("Connection '{}' closed", connection_id.as_str()),
    }
}

/// 受信したフレームを 1 つ処理する
async fn dispatch(
    state: &AppState,
    connection_id: &ConnectionId,
    identity: &ConnectionIdentity,
    text: &str,
) {
    tracing::debug!("Received from '{}': {}", connection_id.as_str(), text);

    let message = match serde_json::from_str::<ClientMessage>(text) {
        Ok(message) => message,
        Err(e) => {
            tracing::warn!("Failed to parse frame: {}", e);
            reply_error(state, connection_id, format!("Invalid message: {}", e)).await;
            return;
        }
    };

    let room_id = match RoomId::try_from(message.room_id().to_string()) {
        Ok(room_id) => room_id,
        Err(e) => {
            reply_error(state, connection_id, format!("Invalid room id: {}", e)).await;
            return;
        }
    };

    match message {
        ClientMessage::JoinRoom(payload) => {
            let (user_id, user_name) =
                match identity.resolve_join(payload.user_id, payload.user_name) {
                    Ok(resolved) => resolved,
                    Err(e) => {
                        tracing::warn!("Rejecting join-room from '{}': {}", connection_id.as_str(), e);
                        reply_error(state, connection_id, e).await;
                        return;
                    }
                };

            state
                .join_room_usecase
                .execute(JoinRoomInput {
                    room_id,
                    connection_id: connection_id.clone(),
                    user_id,
                    user_name,
                    role: identity.role,
                })
                .await;
        }
        ClientMessage::CodeChange(payload) => {
            collaborate(
                state,
                &room_id,
                connection_id,
                CollaborationEvent::CodeChange { code: payload.code },
            )
            .await;
        }
        ClientMessage::CursorUpdate(payload) => {
            collaborate(
                state,
                &room_id,
                connection_id,
                CollaborationEvent::CursorUpdate {
                    cursor: payload.cursor,
                },
            )
            .await;
        }
        ClientMessage::Typing(payload) => {
            collaborate(
                state,
                &room_id,
                connection_id,
                CollaborationEvent::Typing {
                    typing: payload.typing,
                },
            )
            .await;
        }
        ClientMessage::LanguageChange(payload) => {
            collaborate(
                state,
                &room_id,
                connection_id,
                CollaborationEvent::LanguageChange {
                    language: payload.language,
                },
            )
            .await;
        }
        ClientMessage::ChatMessage(payload) => {
            if let Err(e) = state
                .send_chat_usecase
                .execute(room_id, connection_id, payload.message)
                .await
            {
                tracing::warn!("Failed to send chat message: {}", e);
                reply_error(state, connection_id, e.to_string()).await;
            }
        }
        ClientMessage::Offer(payload) => {
            relay(state, &room_id, connection_id, SignalKind::Offer, payload.offer).await;
        }
        ClientMessage::Answer(payload) => {
            relay(state, &room_id, connection_id, SignalKind::Answer, payload.answer).await;
        }
        ClientMessage::IceCandidate(payload) => {
            relay(
                state,
                &room_id,
                connection_id,
                SignalKind::IceCandidate,
                payload.candidate,
            )
            .await;
        }
        ClientMessage::EndInterview(_) => {
            if let Err(e) = state
                .end_interview_usecase
                .execute(&room_id, connection_id)
                .await
            {
                tracing::warn!("Failed to end interview '{}': {}", room_id.as_str(), e);
                reply_error(state, connection_id, e.to_string()).await;
            }
        }
    }
}

async fn collaborate(
    state: &AppState,
    room_id: &RoomId,
    connection_id: &ConnectionId,
    event: CollaborationEvent,
) {
    if let Err(e) = state
        .broadcast_collaboration_usecase
        .execute(room_id, connection_id, event)
        .await
    {
        tracing::warn!("Failed to broadcast collaboration event: {}", e);
    }
}

async fn relay(
    state: &AppState,
    room_id: &RoomId,
    connection_id: &ConnectionId,
    kind: SignalKind,
    payload: serde_json::Value,
) {
    if let Err(e) = state
        .relay_signal_usecase
        .execute(room_id, connection_id, kind, payload)
        .await
    {
        tracing::warn!("Failed to relay {:?}: {}", kind, e);
    }
}

/// リクエスト元の接続にだけエラーを返す
async fn reply_error(state: &AppState, connection_id: &ConnectionId, message: impl Into<String>) {
    let event = RoomEvent::Error {
        message: message.into(),
    };
    if let Err(e) = state.message_pusher.push_to(connection_id, &event).await {
        tracing::warn!("Failed to push error to '{}': {}", connection_id.as_str(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(user_id: Option<&str>, user_name: Option<&str>, role: Option<&str>) -> ConnectQuery {
        ConnectQuery {
            user_id: user_id.map(str::to_string),
            user_name: user_name.map(str::to_string),
            role: role.map(str::to_string),
        }
    }

    #[test]
    fn test_identity_defaults_to_candidate() {
        // テスト項目: ロールを申告しない接続は候補者として扱う
        // given (前提条件):
        let query = query(Some("u-1"), None, None);

        // when (操作):
        let identity = ConnectionIdentity::try_from(query).unwrap();

        // then (期待する結果):
        assert_eq!(identity.role, Role::Candidate);
        assert_eq!(identity.user_id, Some(UserId::new("u-1".to_string()).unwrap()));
        assert_eq!(identity.user_name, None);
    }

    #[test]
    fn test_identity_with_interviewer_role() {
        // テスト項目: ロールは大文字小文字を区別せずに解釈する
        // given (前提条件):
        let query = query(Some("I"), Some("Ivy"), Some("Interviewer"));

        // when (操作):
        let identity = ConnectionIdentity::try_from(query).unwrap();

        // then (期待する結果):
        assert_eq!(identity.role, Role::Interviewer);
        assert_eq!(identity.user_name, Some(UserName::new("Ivy".to_string()).unwrap()));
    }

    #[test]
    fn test_identity_rejects_unknown_role() {
        // テスト項目: 未知のロールは接続を拒否する
        // given (前提条件):
        let query = query(Some("u-1"), None, Some("admin"));

        // when (操作):
        let result = ConnectionIdentity::try_from(query);

        // then (期待する結果):
        assert!(result.is_err());
    }

    fn claim(user_id: Option<&str>, user_name: Option<&str>) -> (Option<String>, Option<String>) {
        (user_id.map(str::to_string), user_name.map(str::to_string))
    }

    #[test]
    fn test_join_uses_connection_user_id() {
        // テスト項目: 接続時の user_id がある場合、join-room の ID 省略はその ID で参加する
        // given (前提条件):
        let identity = ConnectionIdentity::try_from(query(Some("M"), Some("Mia"), None)).unwrap();
        let (user_id, user_name) = claim(None, None);

        // when (操作):
        let resolved = identity.resolve_join(user_id, user_name).unwrap();

        // then (期待する結果):
        assert_eq!(resolved.0, UserId::new("M".to_string()).unwrap());
        assert_eq!(resolved.1, Some(UserName::new("Mia".to_string()).unwrap()));
    }

    #[test]
    fn test_join_rejects_user_id_different_from_connection() {
        // テスト項目: 接続時と異なる user_id で join-room すると拒否される
        // given (前提条件):
        let identity = ConnectionIdentity::try_from(query(Some("M"), None, Some("interviewer")))
            .unwrap();
        let (user_id, user_name) = claim(Some("I"), None);

        // when (操作):
        let result = identity.resolve_join(user_id, user_name);

        // then (期待する結果):
        assert!(result.unwrap_err().contains("does not match"));
    }

    #[test]
    fn test_join_accepts_matching_user_id() {
        // テスト項目: 接続時と同じ user_id の申告は受け付ける
        // given (前提条件):
        let identity = ConnectionIdentity::try_from(query(Some("M"), None, None)).unwrap();
        let (user_id, user_name) = claim(Some("M"), Some("Mia"));

        // when (操作):
        let resolved = identity.resolve_join(user_id, user_name).unwrap();

        // then (期待する結果):
        assert_eq!(resolved.0, UserId::new("M".to_string()).unwrap());
        assert_eq!(resolved.1, Some(UserName::new("Mia".to_string()).unwrap()));
    }

    #[test]
    fn test_join_uses_claimed_user_id_without_connection_user_id() {
        // テスト項目: 接続時に user_id がない場合は join-room で申告された ID を使う
        // given (前提条件):
        let identity = ConnectionIdentity::try_from(query(None, None, None)).unwrap();

        // when (操作):
        let (user_id, user_name) = claim(Some("C"), None);
        let resolved = identity.resolve_join(user_id, user_name).unwrap();
        let (user_id, user_name) = claim(None, None);
        let missing = identity.resolve_join(user_id, user_name);

        // then (期待する結果):
        assert_eq!(resolved.0, UserId::new("C".to_string()).unwrap());
        assert!(missing.is_err());
    }

    #[test]
    fn test_join_rejects_invalid_user_name() {
        // テスト項目: 不正な表示名は user_id と同様にエラーとして拒否される
        // given (前提条件):
        let identity = ConnectionIdentity::try_from(query(Some("M"), None, None)).unwrap();
        let (user_id, user_name) = claim(None, Some("x".repeat(1_000).as_str()));

        // when (操作):
        let result = identity.resolve_join(user_id, user_name);

        // then (期待する結果):
        assert!(result.unwrap_err().starts_with("Invalid user name"));
    }
}
