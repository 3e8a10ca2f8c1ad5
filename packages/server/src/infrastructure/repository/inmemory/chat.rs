//! InMemory Chat Repository 実装
//!
//! ドメイン層が定義する ChatRepository trait の具体的な実装。
//! Vec をインメモリ DB として使用します。
//!
//! セッションのバインドは 1 つのロックの中で「まだ相手が空いているか」を
//! 確認してから書き込むため、同じセッションへの同時バインドは 1 件だけ成功します。

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    ChatMessage, ChatRepository, ChatSession, MessageId, NewChatMessage, RepositoryError,
    SessionId, SessionIdFactory, Timestamp, UserId,
};

#[derive(Default)]
struct Store {
    /// 作成順に並んだセッション
    sessions: Vec<ChatSession>,
    /// 追加順に並んだメッセージ
    messages: Vec<ChatMessage>,
}

/// インメモリ Chat Repository 実装
#[derive(Default)]
pub struct InMemoryChatRepository {
    store: Mutex<Store>,
}

impl InMemoryChatRepository {
    /// 新しい InMemoryChatRepository を作成
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChatRepository for InMemoryChatRepository {
    async fn find_available_session(
        &self,
        exclude: &UserId,
    ) -> Result<Option<ChatSession>, RepositoryError> {
        let store = self.store.lock().await;
        Ok(store
            .sessions
            .iter()
            .find(|s| s.is_available_for(exclude))
            .cloned())
    }

    async fn bind_session(
        &self,
        id: &SessionId,
        user: &UserId,
    ) -> Result<Option<ChatSession>, RepositoryError> {
        let mut store = self.store.lock().await;
        let session = store
            .sessions
            .iter_mut()
            .find(|s| &s.id == id)
            .ok_or_else(|| RepositoryError::SessionNotFound(id.to_string()))?;

        // 条件付き更新: participant_b が空のときだけ書き込む
        if session.bind(user.clone()) {
            Ok(Some(session.clone()))
        } else {
            Ok(None)
        }
    }

    async fn create_session(&self, owner: &UserId) -> Result<ChatSession, RepositoryError> {
        let session = ChatSession::awaiting(SessionIdFactory::generate(), owner.clone(), Timestamp::now());
        let mut store = self.store.lock().await;
        store.sessions.push(session.clone());
        Ok(session)
    }

    async fn get_session(&self, id: &SessionId) -> Result<Option<ChatSession>, RepositoryError> {
        let store = self.store.lock().await;
        Ok(store.sessions.iter().find(|s| &s.id == id).cloned())
    }

    async fn end_session(&self, id: &SessionId) -> Result<Option<ChatSession>, RepositoryError> {
        let mut store = self.store.lock().await;
        Ok(store.sessions.iter_mut().find(|s| &s.id == id).map(|s| {
            s.end(Timestamp::now());
            s.clone()
        }))
    }

    async fn expire_awaiting_sessions(
        &self,
        created_before: Timestamp,
    ) -> Result<usize, RepositoryError> {
        let now = Timestamp::now();
        let mut store = self.store.lock().await;
        let mut expired = 0;
        for session in store
            .sessions
            .iter_mut()
            .filter(|s| s.is_awaiting() && s.created_at < created_before)
        {
            session.end(now);
            expired += 1;
        }
        Ok(expired)
    }

    async fn append_message(
        &self,
        message: NewChatMessage,
    ) -> Result<ChatMessage, RepositoryError> {
        let mut store = self.store.lock().await;
        if !store.sessions.iter().any(|s| s.id == message.session_id) {
            return Err(RepositoryError::SessionNotFound(
                message.session_id.to_string(),
            ));
        }

        let is_ai_message = message.is_ai_message();
        let stored = ChatMessage {
            id: MessageId::new(uuid::Uuid::new_v4()),
            session_id: message.session_id,
            sender_id: message.sender_id,
            content: message.content,
            is_ai_message,
            ai_kind: message.ai_kind,
            created_at: Timestamp::now(),
        };
        store.messages.push(stored.clone());
        Ok(stored)
    }

    async fn list_messages(
        &self,
        id: &SessionId,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let store = self.store.lock().await;
        // 追加順に保存されているので、逆順にたどれば新しい順になる
        Ok(store
            .messages
            .iter()
            .rev()
            .filter(|m| &m.session_id == id)
            .take(limit)
            .cloned()
            .collect())
    }
}
