//! UseCase 層
//!
//! ビジネスロジックを実装するレイヤー。
//! UI 層から呼び出され、Domain 層を操作します。

pub mod analyze_emotion;
pub mod comfort;
pub mod comfort_message;
pub mod crisis;
pub mod end_session;
pub mod error;
pub mod join_room;
pub mod leave_room;
pub mod list_messages;
pub mod request_match;
pub mod send_message;
pub mod typing;

pub use analyze_emotion::{AnalyzeEmotionUseCase, AnalyzeOutcome};
pub use comfort::{ComfortResponder, ComfortTrigger};
pub use comfort_message::ComfortMessageUseCase;
pub use crisis::{CrisisPolicy, CrisisResponse};
pub use end_session::EndSessionUseCase;
pub use error::{
    AnalyzeError, ComfortError, JoinRoomError, MatchError, SendMessageError, SessionError,
};
pub use join_room::JoinRoomUseCase;
pub use leave_room::LeaveRoomUseCase;
pub use list_messages::ListMessagesUseCase;
pub use request_match::{MatchOutcome, RequestMatchUseCase};
pub use send_message::{SendMessageUseCase, SendOutcome};
pub use typing::TypingUseCase;
