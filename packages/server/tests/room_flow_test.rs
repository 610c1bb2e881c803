//! Integration tests for the room coordinator.
//!
//! サーバーをプロセス内で起動し、WebSocket（tokio-tungstenite）と HTTP（reqwest）で
//! クライアントとして操作します。永続化はインメモリのフォールバックを使います。

use std::{net::SocketAddr, sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use pairroom_server::{
    infrastructure::repository::PersistenceGateway,
    ui::{Server, state::AppState},
    usecase::LifecyclePolicy,
};
use pairroom_shared::time::SystemClock;
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const RECV_TIMEOUT: Duration = Duration::from_secs(2);

// ========================================
// テスト作業記録
// ========================================
// 【何をテストするか】
// - HTTP: ヘルスチェック、ルーム作成、ルーム詳細
// - WebSocket: 参加・候補者登録・シグナリング・共同編集・チャット・面接終了・切断
//
// 【どのようなシナリオをテストするか】
// 1. I, C, D の順に参加すると候補者は C のまま
// 2. シグナリングは送信者に戻らない
// 3. チャットは送信者を含む全員に届く
// 4. 候補者は面接を終了できず、面接官の終了は全員に通知される
// 5. 切断すると残りのメンバーに user-left が届く
// 6. 接続時と異なる userId では参加できない
// ========================================

/// Start a server on an ephemeral port backed by the in-memory fallback
async fn start_server() -> SocketAddr {
    let gateway = Arc::new(PersistenceGateway::fallback());
    let state = AppState::new(gateway, Arc::new(SystemClock), LifecyclePolicy::default());
    let app = Server::new(state).router();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn connect(addr: SocketAddr, user_id: &str, role: &str) -> Client {
    let url = format!(
        "ws://{}/ws?user_id={}&user_name={}&role={}",
        addr, user_id, user_id, role
    );
    let (client, _) = connect_async(url).await.unwrap();
    client
}

async fn send(client: &mut Client, frame: Value) {
    client
        .send(Message::Text(frame.to_string().into()))
        .await
        .unwrap();
}

/// 次のテキストフレームを受信する
async fn recv(client: &mut Client) -> Value {
    loop {
        let msg = tokio::time::timeout(RECV_TIMEOUT, client.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("connection closed")
            .unwrap();
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

/// 指定したイベントが届くまで読み進める
async fn recv_event(client: &mut Client, event: &str) -> Value {
    loop {
        let frame = recv(client).await;
        if frame["event"] == event {
            return frame;
        }
    }
}

async fn join(client: &mut Client, room_id: &str) -> Value {
    send(
        client,
        json!({"event": "join-room", "data": {"roomId": room_id}}),
    )
    .await;
    recv_event(client, "room-joined").await
}

async fn create_room(addr: SocketAddr, interviewer_id: &str) -> String {
    let response = reqwest::Client::new()
        .post(format!("http://{}/api/rooms", addr))
        .json(&json!({"interviewerId": interviewer_id}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::CREATED);
    let body: Value = response.json().await.unwrap();
    body["roomId"].as_str().unwrap().to_string()
}

async fn room_detail(addr: SocketAddr, room_id: &str) -> (reqwest::StatusCode, Value) {
    let response = reqwest::get(format!("http://{}/api/rooms/{}", addr, room_id))
        .await
        .unwrap();
    let status = response.status();
    let body = response.json().await.unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_health_reports_fallback_backend() {
    // テスト項目: ヘルスチェックが選択されたバックエンドを返す
    // given (前提条件):
    let addr = start_server().await;

    // when (操作):
    let body: Value = reqwest::get(format!("http://{}/api/health", addr))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // then (期待する結果):
    assert_eq!(body, json!({"status": "ok", "backend": "fallback"}));
}

#[tokio::test]
async fn test_unknown_room_is_not_found() {
    // テスト項目: 接続も Interview もないルームは 404
    // given (前提条件):
    let addr = start_server().await;

    // when (操作):
    let (status, _) = room_detail(addr, "nowhere").await;

    // then (期待する結果):
    assert_eq!(status, reqwest::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_first_candidate_keeps_the_seat() {
    // テスト項目: I, C, D の順に参加すると候補者は C のまま、D はメンバーに加わる
    // given (前提条件):
    let addr = start_server().await;
    let room_id = create_room(addr, "I").await;
    let mut interviewer = connect(addr, "I", "interviewer").await;
    let mut candidate = connect(addr, "C", "candidate").await;
    let mut observer = connect(addr, "D", "candidate").await;

    // when (操作):
    join(&mut interviewer, &room_id).await;
    join(&mut candidate, &room_id).await;
    let joined = join(&mut observer, &room_id).await;

    // then (期待する結果):
    let users: Vec<&str> = joined["data"]["users"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["userId"].as_str().unwrap())
        .collect();
    assert_eq!(users, vec!["I", "C", "D"]);
    assert_eq!(joined["data"]["message"], "D joined");

    let (status, detail) = room_detail(addr, &room_id).await;
    assert_eq!(status, reqwest::StatusCode::OK);
    assert_eq!(detail["interview"]["candidateId"], "C");
    assert_eq!(detail["interview"]["status"], "active");
    assert_eq!(detail["members"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_signaling_is_not_echoed_to_sender() {
    // テスト項目: offer は相手にだけ届き、送信者には戻らない
    // given (前提条件):
    let addr = start_server().await;
    let mut interviewer = connect(addr, "I", "interviewer").await;
    let mut candidate = connect(addr, "C", "candidate").await;
    join(&mut interviewer, "r1").await;
    join(&mut candidate, "r1").await;
    recv_event(&mut interviewer, "room-joined").await;

    // when (操作):
    let offer = json!({"type": "offer", "sdp": "v=0"});
    send(
        &mut interviewer,
        json!({"event": "offer", "data": {"roomId": "r1", "offer": offer}}),
    )
    .await;
    send(
        &mut interviewer,
        json!({"event": "chat-message", "data": {"roomId": "r1", "message": "ping"}}),
    )
    .await;

    // then (期待する結果):
    assert_eq!(
        recv(&mut candidate).await,
        json!({"event": "offer", "data": {"offer": offer}})
    );
    // 送信者が次に受け取るのは自分のチャットで、offer ではない
    assert_eq!(recv(&mut interviewer).await["event"], "chat-message");
}

#[tokio::test]
async fn test_code_change_and_chat() {
    // テスト項目: code-change は相手に receive-code として届き、チャットは全員に届く
    // given (前提条件):
    let addr = start_server().await;
    let mut interviewer = connect(addr, "I", "interviewer").await;
    let mut candidate = connect(addr, "C", "candidate").await;
    join(&mut interviewer, "r1").await;
    join(&mut candidate, "r1").await;
    recv_event(&mut interviewer, "room-joined").await;

    // when (操作):
    send(
        &mut candidate,
        json!({"event": "code-change", "data": {"roomId": "r1", "code": "print(1)"}}),
    )
    .await;
    send(
        &mut candidate,
        json!({"event": "chat-message", "data": {"roomId": "r1", "message": "hello"}}),
    )
    .await;

    // then (期待する結果):
    assert_eq!(
        recv(&mut interviewer).await,
        json!({"event": "receive-code", "data": {"code": "print(1)", "userId": "C"}})
    );
    for client in [&mut interviewer, &mut candidate] {
        let chat = recv_event(client, "chat-message").await;
        assert_eq!(chat["data"]["message"], "hello");
        assert_eq!(chat["data"]["senderName"], "C");
        assert_eq!(chat["data"]["roomId"], "r1");
    }
}

#[tokio::test]
async fn test_end_interview_lifecycle() {
    // テスト項目: 候補者の終了はエラーになり、面接官の終了は全員に通知される
    // given (前提条件):
    let addr = start_server().await;
    let room_id = create_room(addr, "I").await;
    let mut interviewer = connect(addr, "I", "interviewer").await;
    let mut candidate = connect(addr, "C", "candidate").await;
    join(&mut interviewer, &room_id).await;
    join(&mut candidate, &room_id).await;
    recv_event(&mut interviewer, "room-joined").await;

    // when (操作): 候補者が終了を試みる
    send(
        &mut candidate,
        json!({"event": "end-interview", "data": {"roomId": room_id}}),
    )
    .await;

    // then (期待する結果): 候補者にだけエラーが返り、状態は active のまま
    let error = recv(&mut candidate).await;
    assert_eq!(error["event"], "error");
    let (_, detail) = room_detail(addr, &room_id).await;
    assert_eq!(detail["interview"]["status"], "active");

    // when (操作): 面接官が終了する
    send(
        &mut interviewer,
        json!({"event": "end-interview", "data": {"roomId": room_id}}),
    )
    .await;

    // then (期待する結果): 全員に interview-ended が届き、completed になる
    for client in [&mut interviewer, &mut candidate] {
        assert_eq!(
            recv(client).await,
            json!({"event": "interview-ended", "data": {"message": "Interview has ended"}})
        );
    }
    let (_, detail) = room_detail(addr, &room_id).await;
    assert_eq!(detail["interview"]["status"], "completed");
    assert!(detail["interview"]["endTime"].is_string());
}

#[tokio::test]
async fn test_join_cannot_take_over_another_user_id() {
    // テスト項目: 接続時と異なる userId で参加できず、面接官になりすまして終了できない
    // given (前提条件):
    let addr = start_server().await;
    let room_id = create_room(addr, "I").await;
    let mut impostor = connect(addr, "M", "interviewer").await;

    // when (操作): 面接官の ID を申告して参加を試みる
    send(
        &mut impostor,
        json!({"event": "join-room", "data": {"roomId": room_id, "userId": "I"}}),
    )
    .await;

    // then (期待する結果): 参加は拒否され、メンバーにもならない
    assert_eq!(recv(&mut impostor).await["event"], "error");
    let (_, detail) = room_detail(addr, &room_id).await;
    assert_eq!(detail["members"], json!([]));

    // when (操作): 自分の ID で参加し、面接の終了を試みる
    let joined = join(&mut impostor, &room_id).await;
    send(
        &mut impostor,
        json!({"event": "end-interview", "data": {"roomId": room_id}}),
    )
    .await;

    // then (期待する結果): 終了はエラーになり、状態は active のまま
    assert_eq!(joined["data"]["users"][0]["userId"], "M");
    assert_eq!(recv(&mut impostor).await["event"], "error");
    let (_, detail) = room_detail(addr, &room_id).await;
    assert_eq!(detail["interview"]["status"], "active");
}

#[tokio::test]
async fn test_disconnect_notifies_remaining_members() {
    // テスト項目: 切断すると残りのメンバーに退出後の一覧が届く
    // given (前提条件):
    let addr = start_server().await;
    let mut interviewer = connect(addr, "I", "interviewer").await;
    let mut candidate = connect(addr, "C", "candidate").await;
    join(&mut interviewer, "r1").await;
    join(&mut candidate, "r1").await;
    recv_event(&mut interviewer, "room-joined").await;

    // when (操作):
    candidate.close(None).await.unwrap();

    // then (期待する結果):
    let left = recv_event(&mut interviewer, "user-left").await;
    let users = left["data"]["users"].as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["userId"], "I");
}

#[tokio::test]
async fn test_invalid_frame_returns_error_to_sender() {
    // テスト項目: 解釈できないフレームには送信者にだけ error が返る
    // given (前提条件):
    let addr = start_server().await;
    let mut client = connect(addr, "I", "interviewer").await;

    // when (操作):
    client
        .send(Message::Text("not json".to_string().into()))
        .await
        .unwrap();

    // then (期待する結果):
    assert_eq!(recv(&mut client).await["event"], "error");
}
