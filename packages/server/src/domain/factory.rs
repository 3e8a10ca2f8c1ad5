//! Domain factories for identifiers and anonymous identities.

use rand::{Rng, distr::Alphanumeric, seq::IndexedRandom};

use super::{DisplayName, SessionId};

/// Length of generated session tokens.
pub const SESSION_TOKEN_LENGTH: usize = 24;

const ADJECTIVES: [&str; 32] = [
    "따뜻한", "상냥한", "밝은", "친근한", "다정한", "순수한", "귀여운", "포근한",
    "평화로운", "조용한", "신비로운", "우아한", "당당한", "씩씩한", "활발한", "유쾌한",
    "지혜로운", "차분한", "용감한", "친절한", "웃는", "반짝이는", "말랑한", "고요한",
    "빛나는", "산뜻한", "수줍은", "작은", "커다란", "날렵한", "느긋한", "꿈꾸는",
];

const NOUNS: [&str; 32] = [
    "고양이", "강아지", "토끼", "햄스터", "다람쥐", "여우", "판다", "코알라",
    "펭귄", "돌고래", "나비", "참새", "물고기", "거북이", "달팽이", "꿀벌",
    "사슴", "아기양", "염소", "조랑말", "호랑이", "사자", "곰", "늑대",
    "독수리", "올빼미", "수달", "비둘기", "까치", "고래", "백조", "오리",
];

/// Factory for generating SessionId instances.
pub struct SessionIdFactory;

impl SessionIdFactory {
    /// Generate a new SessionId with a random UUID v4.
    pub fn generate() -> SessionId {
        SessionId::from_uuid(uuid::Uuid::new_v4())
    }
}

/// Anonymous identity generator.
///
/// Pure functions over a random source; the `*_with` variants take the RNG
/// explicitly so callers can seed them.
pub struct IdentityFactory;

impl IdentityFactory {
    /// "adjective noun", both picked uniformly and independently.
    pub fn generate_display_name() -> DisplayName {
        Self::generate_display_name_with(&mut rand::rng())
    }

    pub fn generate_display_name_with<R: Rng + ?Sized>(rng: &mut R) -> DisplayName {
        let adjective = ADJECTIVES.choose(rng).copied().unwrap_or(ADJECTIVES[0]);
        let noun = NOUNS.choose(rng).copied().unwrap_or(NOUNS[0]);
        // Both word lists are non-empty and short, so this always validates.
        DisplayName::new(format!("{adjective} {noun}"))
            .unwrap_or_else(|_| unreachable!("word lists produce valid display names"))
    }

    /// Random opaque alphanumeric token. Uniqueness is left to randomness.
    pub fn generate_session_token() -> String {
        Self::generate_session_token_with(&mut rand::rng())
    }

    pub fn generate_session_token_with<R: Rng + ?Sized>(rng: &mut R) -> String {
        rng.sample_iter(&Alphanumeric)
            .take(SESSION_TOKEN_LENGTH)
            .map(char::from)
            .collect()
    }
}
