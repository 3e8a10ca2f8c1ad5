//! UseCase: メッセージ履歴の取得

use std::sync::Arc;

use crate::domain::{ChatMessage, ChatRepository, SessionId};

use super::error::SessionError;

pub const DEFAULT_MESSAGE_LIMIT: usize = 50;
pub const MAX_MESSAGE_LIMIT: usize = 200;

/// メッセージ履歴取得のユースケース（新しい順）
pub struct ListMessagesUseCase {
    repository: Arc<dyn ChatRepository>,
}

impl ListMessagesUseCase {
    pub fn new(repository: Arc<dyn ChatRepository>) -> Self {
        Self { repository }
    }

    /// `limit` は省略時 50、1..=200 に丸める
    pub async fn execute(
        &self,
        session_id: &SessionId,
        limit: Option<usize>,
    ) -> Result<Vec<ChatMessage>, SessionError> {
        let limit = limit
            .unwrap_or(DEFAULT_MESSAGE_LIMIT)
            .clamp(1, MAX_MESSAGE_LIMIT);
        if self.repository.get_session(session_id).await?.is_none() {
            return Err(SessionError::NotFound(session_id.to_string()));
        }
        Ok(self.repository.list_messages(session_id, limit).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{
            ChatSession, MessageContent, MockChatRepository, NewChatMessage, SessionIdFactory,
            Timestamp, UserId,
        },
        infrastructure::InMemoryChatRepository,
    };

    #[tokio::test]
    async fn test_list_messages_newest_first() {
        // テスト項目: メッセージが新しい順に返される
        // given (前提条件):
        let repository = Arc::new(InMemoryChatRepository::new());
        let alice = UserId::new("alice".to_string()).unwrap();
        let session = repository.create_session(&alice).await.unwrap();
        for text in ["first", "second"] {
            repository
                .append_message(NewChatMessage::from_user(
                    session.id.clone(),
                    alice.clone(),
                    MessageContent::new(text.to_string()).unwrap(),
                ))
                .await
                .unwrap();
        }
        let usecase = ListMessagesUseCase::new(repository);

        // when (操作):
        let messages = usecase.execute(&session.id, None).await.unwrap();

        // then (期待する結果):
        let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["second", "first"]);
    }

    #[tokio::test]
    async fn test_limit_is_clamped() {
        // テスト項目: limit は省略時 50、上限 200、下限 1 に丸められてリポジトリに渡される
        // given (前提条件):
        let session = ChatSession::awaiting(
            SessionIdFactory::generate(),
            UserId::new("alice".to_string()).unwrap(),
            Timestamp::now(),
        );
        let mut repository = MockChatRepository::new();
        repository
            .expect_get_session()
            .returning(move |_| Ok(Some(session.clone())));
        let mut seq = mockall::Sequence::new();
        for expected in [DEFAULT_MESSAGE_LIMIT, MAX_MESSAGE_LIMIT, 1] {
            repository
                .expect_list_messages()
                .withf(move |_, limit| *limit == expected)
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_, _| Ok(vec![]));
        }
        let usecase = ListMessagesUseCase::new(Arc::new(repository));
        let id = SessionIdFactory::generate();

        // when (操作) / then (期待する結果):
        usecase.execute(&id, None).await.unwrap();
        usecase.execute(&id, Some(10_000)).await.unwrap();
        usecase.execute(&id, Some(0)).await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        // テスト項目: 存在しないセッションの履歴取得は NotFound になる
        // given (前提条件):
        let usecase = ListMessagesUseCase::new(Arc::new(InMemoryChatRepository::new()));
        let id = SessionIdFactory::generate();

        // when (操作):
        let result = usecase.execute(&id, Some(10)).await;

        // then (期待する結果):
        assert_eq!(result, Err(SessionError::NotFound(id.to_string())));
    }
}
