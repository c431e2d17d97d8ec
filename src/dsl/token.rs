//! Token types for the scene DSL lexer.

use super::ast::{AnimationAction, AudioCue, CameraAction, ElementType, OptionKey};

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub col: usize,
}

/// The kind of token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Structural keywords
    Scene,
    Let,
    For,
    In,
    While,
    If,
    Else,
    Parallel,
    True,
    False,
    At,
    Wait,
    Pause,
    Camera,
    Play,

    // Vocabulary keywords
    ElementType(ElementType),
    Action(AnimationAction),
    CameraAction(CameraAction),
    Cue(AudioCue),
    OptionName(OptionKey),

    // Literals
    Ident(String),
    Number(f64),
    /// Duration literal, already normalized to seconds.
    Duration(f64),
    Str(String),

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    EqEq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    AndAnd,
    OrOr,
    Eq,

    // Delimiters
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Colon,
    Comma,
    Semicolon,
    Dot,
    DotDot,

    Eof,
}

impl TokenKind {
    /// Classify a word scanned by the lexer. Returns `Ident` for anything
    /// that is not reserved.
    pub fn from_word(word: &str) -> TokenKind {
        match word {
            "scene" => TokenKind::Scene,
            "let" => TokenKind::Let,
            "for" => TokenKind::For,
            "in" => TokenKind::In,
            "while" => TokenKind::While,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "parallel" => TokenKind::Parallel,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "at" => TokenKind::At,
            "wait" => TokenKind::Wait,
            "pause" => TokenKind::Pause,
            "camera" => TokenKind::Camera,
            "play" => TokenKind::Play,
            _ => {
                if let Some(t) = ElementType::from_keyword(word) {
                    TokenKind::ElementType(t)
                } else if let Some(a) = AnimationAction::from_keyword(word) {
                    TokenKind::Action(a)
                } else if let Some(a) = CameraAction::from_keyword(word) {
                    TokenKind::CameraAction(a)
                } else if let Some(c) = AudioCue::from_keyword(word) {
                    TokenKind::Cue(c)
                } else if let Some(o) = OptionKey::from_keyword(word) {
                    TokenKind::OptionName(o)
                } else {
                    TokenKind::Ident(word.to_string())
                }
            }
        }
    }

    /// The source spelling of a keyword token, if this token is one.
    pub fn keyword_text(&self) -> Option<&'static str> {
        let text = match self {
            TokenKind::Scene => "scene",
            TokenKind::Let => "let",
            TokenKind::For => "for",
            TokenKind::In => "in",
            TokenKind::While => "while",
            TokenKind::If => "if",
            TokenKind::Else => "else",
            TokenKind::Parallel => "parallel",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::At => "at",
            TokenKind::Wait => "wait",
            TokenKind::Pause => "pause",
            TokenKind::Camera => "camera",
            TokenKind::Play => "play",
            TokenKind::ElementType(t) => t.as_str(),
            TokenKind::Action(a) => a.as_str(),
            TokenKind::CameraAction(a) => a.as_str(),
            TokenKind::Cue(c) => c.as_str(),
            TokenKind::OptionName(o) => o.as_str(),
            _ => return None,
        };
        Some(text)
    }

    /// Human-readable description used in parse error messages.
    pub fn describe(&self) -> String {
        if let Some(word) = self.keyword_text() {
            return format!("keyword `{word}`");
        }
        match self {
            TokenKind::Ident(name) => format!("identifier `{name}`"),
            TokenKind::Number(n) => format!("number `{n}`"),
            TokenKind::Duration(s) => format!("duration `{s}s`"),
            TokenKind::Str(s) => format!("string \"{s}\""),
            TokenKind::Plus => "`+`".to_string(),
            TokenKind::Minus => "`-`".to_string(),
            TokenKind::Star => "`*`".to_string(),
            TokenKind::Slash => "`/`".to_string(),
            TokenKind::Percent => "`%`".to_string(),
            TokenKind::Bang => "`!`".to_string(),
            TokenKind::EqEq => "`==`".to_string(),
            TokenKind::NotEq => "`!=`".to_string(),
            TokenKind::Lt => "`<`".to_string(),
            TokenKind::LtEq => "`<=`".to_string(),
            TokenKind::Gt => "`>`".to_string(),
            TokenKind::GtEq => "`>=`".to_string(),
            TokenKind::AndAnd => "`&&`".to_string(),
            TokenKind::OrOr => "`||`".to_string(),
            TokenKind::Eq => "`=`".to_string(),
            TokenKind::LBrace => "`{`".to_string(),
            TokenKind::RBrace => "`}`".to_string(),
            TokenKind::LBracket => "`[`".to_string(),
            TokenKind::RBracket => "`]`".to_string(),
            TokenKind::LParen => "`(`".to_string(),
            TokenKind::RParen => "`)`".to_string(),
            TokenKind::Colon => "`:`".to_string(),
            TokenKind::Comma => "`,`".to_string(),
            TokenKind::Semicolon => "`;`".to_string(),
            TokenKind::Dot => "`.`".to_string(),
            TokenKind::DotDot => "`..`".to_string(),
            TokenKind::Eof => "end of input".to_string(),
            _ => format!("{self:?}"),
        }
    }
}
