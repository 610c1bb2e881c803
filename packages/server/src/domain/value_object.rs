//! Value objects
//!
//! 生成時にバリデーションを行い、不正な値を持つインスタンスが存在しないことを保証します。

use std::{fmt, str::FromStr};

use uuid::Uuid;

use super::error::ValueObjectError;

const ROOM_ID_MAX_LEN: usize = 64;
const GENERATED_ROOM_ID_LEN: usize = 12;
const USER_ID_MAX_LEN: usize = 128;
const USER_NAME_MAX_LEN: usize = 64;
const MESSAGE_MAX_LEN: usize = 2000;

/// ルーム ID
///
/// 英数字・`-`・`_` のみ、1〜64 文字。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoomId(String);

impl RoomId {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.is_empty() {
            return Err(ValueObjectError::Empty("room id"));
        }
        if value.len() > ROOM_ID_MAX_LEN {
            return Err(ValueObjectError::TooLong {
                field: "room id",
                len: value.len(),
                max: ROOM_ID_MAX_LEN,
            });
        }
        if !value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ValueObjectError::InvalidCharacters {
                field: "room id",
                value,
            });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for RoomId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// ルーム ID の生成
pub struct RoomIdFactory;

impl RoomIdFactory {
    /// 12 文字の小文字英数字からなる新しいルーム ID を生成
    pub fn generate() -> Result<RoomId, ValueObjectError> {
        let simple = Uuid::new_v4().simple().to_string();
        RoomId::new(simple.chars().take(GENERATED_ROOM_ID_LEN).collect())
    }
}

/// 接続 ID（WebSocket 接続ごとに一意）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.trim().is_empty() {
            return Err(ValueObjectError::Empty("connection id"));
        }
        Ok(Self(value))
    }

    /// UUID v4 から新しい接続 ID を生成
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for ConnectionId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// ユーザー ID（認証済みの上流レイヤーから渡される）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(String);

impl UserId {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.trim().is_empty() {
            return Err(ValueObjectError::Empty("user id"));
        }
        if value.len() > USER_ID_MAX_LEN {
            return Err(ValueObjectError::TooLong {
                field: "user id",
                len: value.len(),
                max: USER_ID_MAX_LEN,
            });
        }
        Ok(Self(value))
    }

    /// UUID v4 から新しいユーザー ID を生成
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for UserId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 表示名
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserName(String);

impl UserName {
    /// 前後の空白を除去して生成
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValueObjectError::Empty("user name"));
        }
        let len = trimmed.chars().count();
        if len > USER_NAME_MAX_LEN {
            return Err(ValueObjectError::TooLong {
                field: "user name",
                len,
                max: USER_NAME_MAX_LEN,
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    /// 表示名が解決できなかった接続に使う名前
    pub fn anonymous() -> Self {
        Self("Anonymous".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for UserName {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// 接続時に申告されたロール
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Interviewer,
    Candidate,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Interviewer => "interviewer",
            Role::Candidate => "candidate",
        }
    }
}

impl FromStr for Role {
    type Err = ValueObjectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "interviewer" => Ok(Role::Interviewer),
            "candidate" => Ok(Role::Candidate),
            other => Err(ValueObjectError::UnknownRole(other.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// メールアドレス（小文字に正規化）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Email(String);

impl Email {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        let normalized = value.trim().to_lowercase();
        match normalized.split_once('@') {
            Some((local, domain)) if !local.is_empty() && domain.contains('.') => {
                Ok(Self(normalized))
            }
            _ => Err(ValueObjectError::InvalidEmail(value)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// チャットメッセージ本文（空白のみは不可）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageText(String);

impl MessageText {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.trim().is_empty() {
            return Err(ValueObjectError::Empty("message"));
        }
        let len = value.chars().count();
        if len > MESSAGE_MAX_LEN {
            return Err(ValueObjectError::TooLong {
                field: "message",
                len,
                max: MESSAGE_MAX_LEN,
            });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for MessageText {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// 面接評価（1〜10）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rating(u8);

impl Rating {
    pub fn new(value: i64) -> Result<Self, ValueObjectError> {
        match u8::try_from(value) {
            Ok(v) if (1..=10).contains(&v) => Ok(Self(v)),
            _ => Err(ValueObjectError::RatingOutOfRange(value)),
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

/// タイムスタンプ（Unix epoch ミリ秒, UTC）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(millis: i64) -> Self {
        Self(millis)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}
