//! UseCase: チャット相手のマッチング
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - RequestMatchUseCase::execute() メソッド
//!
//! ### なぜこのテストが必要か
//! - 自分自身とはマッチしないこと、1 つのセッションに 2 人目は 1 人しか入れないことを保証する
//! - バインドの競合に負けた場合もエラーにならず、新しいセッションで待機することを確認する
//!
//! ### どのような状況を想定しているか
//! - 正常系：待機中のセッションなし → 待機、待機中のセッションあり → マッチ
//! - エッジケース：自分の待機セッションしかない、バインド競合、期限切れの待機セッション
//! - 異常系：ストレージ障害

use std::{sync::Arc, time::Duration};

use crate::{
    domain::{ChatRepository, ChatSession, Timestamp, UserId},
    infrastructure::{
        RoomRelay,
        dto::{http::SessionDto, websocket::ServerEvent},
    },
};

use super::error::MatchError;

/// マッチング結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    /// 待機中のセッションに 2 人目として入った
    Matched(ChatSession),
    /// 新しいセッションを作成して相手を待っている
    Waiting(ChatSession),
}

impl MatchOutcome {
    pub fn session(&self) -> &ChatSession {
        match self {
            Self::Matched(session) | Self::Waiting(session) => session,
        }
    }
}

/// マッチングのユースケース
pub struct RequestMatchUseCase {
    repository: Arc<dyn ChatRepository>,
    relay: Arc<RoomRelay>,
    /// 待機中セッションの有効期限（None なら無期限）
    match_ttl: Option<Duration>,
}

impl RequestMatchUseCase {
    pub fn new(
        repository: Arc<dyn ChatRepository>,
        relay: Arc<RoomRelay>,
        match_ttl: Option<Duration>,
    ) -> Self {
        Self {
            repository,
            relay,
            match_ttl,
        }
    }

    pub async fn execute(&self, user_id: &UserId) -> Result<MatchOutcome, MatchError> {
        // 1. 期限切れの待機セッションを終了
        if let Some(ttl) = self.match_ttl {
            let ttl_millis = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
            let cutoff = Timestamp::now().saturating_sub_millis(ttl_millis);
            let expired = self.repository.expire_awaiting_sessions(cutoff).await?;
            if expired > 0 {
                tracing::info!("Expired {} awaiting chat sessions", expired);
            }
        }

        // 2. 待機中のセッションを探してバインド
        if let Some(candidate) = self.repository.find_available_session(user_id).await? {
            match self.repository.bind_session(&candidate.id, user_id).await? {
                Some(session) => {
                    tracing::info!(
                        "User '{}' matched into session {} with '{}'",
                        user_id,
                        session.id,
                        session.participant_a
                    );
                    let event = ServerEvent::Matched {
                        session: SessionDto::from(&session),
                    };
                    self.relay
                        .notify_user(&session.participant_a, &event)
                        .await;
                    return Ok(MatchOutcome::Matched(session));
                }
                None => {
                    tracing::info!(
                        "User '{}' lost the bind race for session {}, creating a new one",
                        user_id,
                        candidate.id
                    );
                }
            }
        }

        // 3. 見つからない、または競合に負けた場合は新しいセッションで待機
        let session = self.repository.create_session(user_id).await?;
        tracing::info!("User '{}' is waiting in session {}", user_id, session.id);
        Ok(MatchOutcome::Waiting(session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{
            DisplayName, MockChatRepository, RepositoryError, SessionIdFactory,
        },
        infrastructure::InMemoryChatRepository,
    };
    use tokio::sync::mpsc;

    fn user(id: &str) -> UserId {
        UserId::new(id.to_string()).unwrap()
    }

    fn usecase(repository: Arc<dyn ChatRepository>) -> RequestMatchUseCase {
        RequestMatchUseCase::new(repository, Arc::new(RoomRelay::default()), None)
    }

    #[tokio::test]
    async fn test_first_user_waits_second_user_matches() {
        // テスト項目: 最初のユーザーは待機し、次のユーザーがそのセッションにマッチする
        // given (前提条件):
        let repository = Arc::new(InMemoryChatRepository::new());
        let relay = Arc::new(RoomRelay::default());
        let usecase = RequestMatchUseCase::new(repository.clone(), relay.clone(), None);
        let (alice_tx, mut alice_rx) = mpsc::unbounded_channel();
        relay
            .connect(
                user("alice"),
                DisplayName::new("조용한 고양이".to_string()).unwrap(),
                alice_tx,
            )
            .await;

        // when (操作):
        let first = usecase.execute(&user("alice")).await.unwrap();
        let second = usecase.execute(&user("bob")).await.unwrap();

        // then (期待する結果):
        let MatchOutcome::Waiting(waiting) = first else {
            panic!("expected waiting");
        };
        let MatchOutcome::Matched(matched) = second else {
            panic!("expected matched");
        };
        assert_eq!(waiting.id, matched.id);
        assert_eq!(matched.participant_a, user("alice"));
        assert_eq!(matched.participant_b, Some(user("bob")));
        match alice_rx.try_recv().unwrap() {
            ServerEvent::Matched { session } => {
                assert_eq!(session.id, matched.id.to_string());
                assert_eq!(session.participant_b_id, Some("bob".to_string()));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_user_never_matches_own_session() {
        // テスト項目: 自分の待機セッションしかない場合は新しいセッションで待機する
        // given (前提条件):
        let repository = Arc::new(InMemoryChatRepository::new());
        let usecase = usecase(repository.clone());

        // when (操作):
        let first = usecase.execute(&user("alice")).await.unwrap();
        let second = usecase.execute(&user("alice")).await.unwrap();

        // then (期待する結果):
        assert!(matches!(first, MatchOutcome::Waiting(_)));
        assert!(matches!(second, MatchOutcome::Waiting(_)));
        assert_ne!(first.session().id, second.session().id);
        assert!(second.session().participant_b.is_none());
    }

    #[tokio::test]
    async fn test_lost_bind_race_creates_new_session() {
        // テスト項目: バインド競合に負けた場合はエラーにならず、新しいセッションで待機する
        // given (前提条件):
        let candidate = ChatSession::awaiting(
            SessionIdFactory::generate(),
            user("alice"),
            Timestamp::now(),
        );
        let own = ChatSession::awaiting(SessionIdFactory::generate(), user("charlie"), Timestamp::now());
        let mut repository = MockChatRepository::new();
        let found = candidate.clone();
        repository
            .expect_find_available_session()
            .returning(move |_| Ok(Some(found.clone())));
        repository
            .expect_bind_session()
            .times(1)
            .returning(|_, _| Ok(None));
        let created = own.clone();
        repository
            .expect_create_session()
            .times(1)
            .returning(move |_| Ok(created.clone()));

        // when (操作):
        let outcome = usecase(Arc::new(repository))
            .execute(&user("charlie"))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(outcome, MatchOutcome::Waiting(own));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_requests_bind_once() {
        // テスト項目: 同じ待機セッションに同時にマッチを要求しても、マッチするのは 1 人だけ
        // given (前提条件):
        let repository = Arc::new(InMemoryChatRepository::new());
        let usecase = Arc::new(usecase(repository.clone()));
        let waiting = usecase.execute(&user("alice")).await.unwrap();

        // when (操作):
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let usecase = usecase.clone();
                tokio::spawn(async move { usecase.execute(&user(&format!("u{i}"))).await })
            })
            .collect();
        let mut matched = Vec::new();
        for handle in handles {
            if let MatchOutcome::Matched(session) = handle.await.unwrap().unwrap() {
                matched.push(session);
            }
        }

        // then (期待する結果):
        let into_alice: Vec<_> = matched
            .iter()
            .filter(|s| s.id == waiting.session().id)
            .collect();
        assert_eq!(into_alice.len(), 1);
        let session = repository
            .get_session(&waiting.session().id)
            .await
            .unwrap()
            .unwrap();
        assert!(session.participant_b.is_some());
    }

    #[tokio::test]
    async fn test_expired_awaiting_session_is_not_offered() {
        // テスト項目: 有効期限を過ぎた待機セッションは終了され、マッチ対象にならない
        // given (前提条件):
        let repository = Arc::new(InMemoryChatRepository::new());
        let stale = repository.create_session(&user("alice")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        let usecase = RequestMatchUseCase::new(
            repository.clone(),
            Arc::new(RoomRelay::default()),
            Some(Duration::from_millis(5)),
        );

        // when (操作):
        let outcome = usecase.execute(&user("bob")).await.unwrap();

        // then (期待する結果):
        assert!(matches!(outcome, MatchOutcome::Waiting(_)));
        let stale = repository.get_session(&stale.id).await.unwrap().unwrap();
        assert!(!stale.is_active);
    }

    #[tokio::test]
    async fn test_storage_outage_is_an_error() {
        // テスト項目: ストレージ障害はエラーとして返される
        // given (前提条件):
        let mut repository = MockChatRepository::new();
        repository
            .expect_find_available_session()
            .returning(|_| Err(RepositoryError::Unavailable("db down".to_string())));

        // when (操作):
        let result = usecase(Arc::new(repository)).execute(&user("alice")).await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(MatchError::Storage(RepositoryError::Unavailable(
                "db down".to_string()
            )))
        );
    }
}
