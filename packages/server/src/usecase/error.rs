//! UseCase 層のエラー定義

use thiserror::Error;

use crate::domain::{RepositoryError, RoomError, ValueObjectError};

/// ルーム参加時のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JoinRoomError {
    #[error(transparent)]
    Room(#[from] RoomError),
}

/// メッセージ送信時のエラー
///
/// モデレーションによる拒否と危機対応はエラーではなく
/// [`SendOutcome`](super::SendOutcome) で表現します。
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SendMessageError {
    /// 内容が空、または長すぎる
    #[error("Invalid message: {0}")]
    Validation(#[from] ValueObjectError),

    /// 送信先のルームに参加していない
    #[error("Not joined to room '{0}'")]
    NotJoined(String),

    /// ペイロードの sender_id が接続のユーザーと一致しない
    #[error("Sender '{actual}' does not match the connection user '{expected}'")]
    SenderMismatch { expected: String, actual: String },

    /// ルーム ID に対応するチャットセッションがない
    #[error("Chat session not found: {0}")]
    SessionNotFound(String),

    /// 送信者がセッションの参加者ではない
    #[error("User '{0}' is not a participant of this session")]
    NotSessionParticipant(String),

    /// セッションは終了している
    #[error("Chat session has ended: {0}")]
    SessionEnded(String),

    /// ストレージ障害
    #[error("Failed to store message: {0}")]
    Storage(RepositoryError),
}

/// マッチング時のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MatchError {
    #[error("Failed to match chat: {0}")]
    Storage(#[from] RepositoryError),
}

/// セッション操作（終了・履歴取得）時のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Chat session not found: {0}")]
    NotFound(String),

    #[error("User '{0}' is not a participant of this session")]
    NotParticipant(String),

    #[error("Storage error: {0}")]
    Storage(RepositoryError),
}

impl From<RepositoryError> for SessionError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::SessionNotFound(id) => Self::NotFound(id),
            other => Self::Storage(other),
        }
    }
}

/// 感情分析時のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnalyzeError {
    #[error("Invalid content length: {0}")]
    Validation(#[from] ValueObjectError),
}

/// 慰めメッセージ生成時のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ComfortError {
    #[error("Emotion is required")]
    EmotionMissing,
}
