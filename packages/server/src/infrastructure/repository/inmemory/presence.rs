//! InMemory Presence Repository 実装
//!
//! 接続 ID → ルーム ID の索引と、ルーム ID → 参加順のメンバー一覧を保持します。
//! ルームはメンバー一覧から導出されるだけで、メンバーが 0 人になると消えます。
//!
//! 全ての変更は 1 つのロックで直列化されます。ロック区間はメモリ操作のみで、
//! 永続化 I/O を待つことはありません。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ConnectionId, Member, PresenceRepository, RoomId};

#[derive(Default)]
struct PresenceTable {
    rooms: HashMap<RoomId, Vec<Member>>,
    connections: HashMap<ConnectionId, RoomId>,
}

impl PresenceTable {
    fn remove(&mut self, connection_id: &ConnectionId) -> Option<(RoomId, Vec<Member>)> {
        let room_id = self.connections.remove(connection_id)?;
        let remaining = match self.rooms.get_mut(&room_id) {
            Some(members) => {
                members.retain(|m| &m.connection_id != connection_id);
                members.clone()
            }
            None => Vec::new(),
        };
        if remaining.is_empty() {
            self.rooms.remove(&room_id);
        }
        Some((room_id, remaining))
    }
}

/// インメモリ Presence Repository 実装
#[derive(Default)]
pub struct InMemoryPresenceRepository {
    table: Mutex<PresenceTable>,
}

impl InMemoryPresenceRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 現在存在する（メンバーが 1 人以上いる）ルーム数
    pub async fn count_rooms(&self) -> usize {
        self.table.lock().await.rooms.len()
    }
}

#[async_trait]
impl PresenceRepository for InMemoryPresenceRepository {
    async fn join(&self, room_id: RoomId, member: Member) -> Vec<Member> {
        let mut table = self.table.lock().await;
        let connection_id = member.connection_id.clone();

        // 同じルームへの再参加は位置を保ったまま置き換える
        if table.connections.get(&connection_id) == Some(&room_id) {
            let members = table.rooms.entry(room_id.clone()).or_default();
            if let Some(slot) = members
                .iter_mut()
                .find(|m| m.connection_id == connection_id)
            {
                *slot = member;
            } else {
                members.push(member);
            }
            return members.clone();
        }

        if let Some((previous, _)) = table.remove(&connection_id) {
            tracing::debug!(
                "Connection '{}' moved from room '{}' to '{}'",
                connection_id,
                previous,
                room_id
            );
        }

        table.connections.insert(connection_id, room_id.clone());
        let members = table.rooms.entry(room_id).or_default();
        members.push(member);
        members.clone()
    }

    async fn leave(&self, connection_id: &ConnectionId) -> Option<(RoomId, Vec<Member>)> {
        let mut table = self.table.lock().await;
        table.remove(connection_id)
    }

    async fn members_of(&self, room_id: &RoomId) -> Vec<Member> {
        let table = self.table.lock().await;
        table.rooms.get(room_id).cloned().unwrap_or_default()
    }

    async fn find_member(&self, connection_id: &ConnectionId) -> Option<(RoomId, Member)> {
        let table = self.table.lock().await;
        let room_id = table.connections.get(connection_id)?;
        let member = table
            .rooms
            .get(room_id)?
            .iter()
            .find(|m| &m.connection_id == connection_id)?
            .clone();
        Some((room_id.clone(), member))
    }
}
