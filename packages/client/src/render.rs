//! Turn server events into terminal lines.

use maeum_server::infrastructure::dto::websocket::ServerEvent;

fn clock(rfc3339: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(rfc3339)
        .map(|at| at.format("%H:%M").to_string())
        .unwrap_or_else(|_| rfc3339.to_string())
}

/// Line to print for `event`, as seen by `me`. `None` means nothing to show.
pub fn render(event: &ServerEvent, me: &str) -> Option<String> {
    let line = match event {
        ServerEvent::RoomJoined { participants, .. } => {
            let others: Vec<&str> = participants
                .iter()
                .filter(|p| p.user_id != me)
                .map(|p| p.display_name.as_str())
                .collect();
            if others.is_empty() {
                "* 방에 입장했습니다. 상대방을 기다리는 중...".to_string()
            } else {
                format!("* 방에 입장했습니다. 함께 있는 사람: {}", others.join(", "))
            }
        }
        ServerEvent::RoomLeft { .. } => "* 방에서 나왔습니다.".to_string(),
        ServerEvent::ReceiveMessage {
            display_name,
            message,
            ..
        } => {
            let marker = if message.is_ai_message { "🤖 " } else { "" };
            format!(
                "[{}] {}{}: {}",
                clock(&message.created_at),
                marker,
                display_name,
                message.content
            )
        }
        ServerEvent::UserTyping { display_name, .. } => format!("* {display_name} 님이 입력 중..."),
        ServerEvent::StopTyping { .. } => return None,
        ServerEvent::MessageRejected {
            reason,
            filtered_content,
            ..
        } => format!("! 전송되지 않았습니다: {reason} ({filtered_content})"),
        ServerEvent::CrisisResources { crisis, .. } => {
            let mut lines = vec![format!("! {}", crisis.message)];
            lines.extend(crisis.resources.iter().map(|r| format!("  - {r}")));
            lines.join("\n")
        }
        ServerEvent::Matched { .. } => "* 대화 상대가 연결되었습니다.".to_string(),
        ServerEvent::SessionEnded { .. } => "* 대화가 종료되었습니다.".to_string(),
        ServerEvent::Error { message } => format!("! 오류: {message}"),
    };
    Some(line)
}

#[cfg(test)]
mod tests {
    use maeum_server::infrastructure::dto::{
        http::{CrisisResponseDto, MessageDto},
        websocket::ParticipantInfo,
    };

    use super::*;

    fn message(content: &str, is_ai_message: bool) -> MessageDto {
        MessageDto {
            id: "m1".to_string(),
            session_id: "s1".to_string(),
            sender_id: "alice".to_string(),
            content: content.to_string(),
            is_ai_message,
            ai_kind: None,
            created_at: "2026-01-02T15:04:05+09:00".to_string(),
        }
    }

    #[test]
    fn test_render_received_message() {
        // テスト項目: 受信メッセージは時刻・表示名・本文で表示される
        // given (前提条件):
        let event = ServerEvent::ReceiveMessage {
            room_id: "s1".to_string(),
            display_name: "따뜻한 고양이".to_string(),
            message: message("안녕", false),
        };

        // when (操作):
        let line = render(&event, "bob");

        // then (期待する結果):
        assert_eq!(line.as_deref(), Some("[15:04] 따뜻한 고양이: 안녕"));
    }

    #[test]
    fn test_render_ai_message_is_marked() {
        // テスト項目: AI メッセージには印が付く
        // given (前提条件):
        let event = ServerEvent::ReceiveMessage {
            room_id: "s1".to_string(),
            display_name: "마음 AI".to_string(),
            message: message("힘내요", true),
        };

        // when (操作):
        let line = render(&event, "bob").unwrap();

        // then (期待する結果):
        assert!(line.contains("🤖 마음 AI: 힘내요"));
    }

    #[test]
    fn test_render_room_joined_lists_others_only() {
        // テスト項目: 入室時の表示には自分以外の参加者だけが含まれる
        // given (前提条件):
        let participant = |user_id: &str, name: &str| ParticipantInfo {
            user_id: user_id.to_string(),
            display_name: name.to_string(),
            joined_at: 0,
        };
        let alone = ServerEvent::RoomJoined {
            room_id: "s1".to_string(),
            participants: vec![participant("bob", "조용한 여우")],
        };
        let together = ServerEvent::RoomJoined {
            room_id: "s1".to_string(),
            participants: vec![
                participant("alice", "따뜻한 고양이"),
                participant("bob", "조용한 여우"),
            ],
        };

        // when (操作):
        let alone = render(&alone, "bob").unwrap();
        let together = render(&together, "bob").unwrap();

        // then (期待する結果):
        assert!(alone.contains("기다리는 중"));
        assert!(together.contains("따뜻한 고양이"));
        assert!(!together.contains("조용한 여우"));
    }

    #[test]
    fn test_render_crisis_lists_resources() {
        // テスト項目: 危機対応のイベントは相談窓口を一行ずつ表示する
        // given (前提条件):
        let event = ServerEvent::CrisisResources {
            room_id: "s1".to_string(),
            crisis: CrisisResponseDto {
                is_crisis: true,
                severity: 9,
                resources: vec!["생명의전화: 1393".to_string(), "청소년전화: 1388".to_string()],
                message: "도움을 받을 수 있어요".to_string(),
            },
        };

        // when (操作):
        let line = render(&event, "bob").unwrap();

        // then (期待する結果):
        assert_eq!(line.lines().count(), 3);
        assert!(line.contains("  - 생명의전화: 1393"));
    }

    #[test]
    fn test_render_stop_typing_is_silent() {
        // テスト項目: 入力終了の通知は表示しない
        // given (前提条件):
        let event = ServerEvent::StopTyping {
            room_id: "s1".to_string(),
            sender_id: "alice".to_string(),
        };

        // then (期待する結果):
        assert_eq!(render(&event, "bob"), None);
    }
}
