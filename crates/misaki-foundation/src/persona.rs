//! Persona of the Misaki hostess
//!
//! One system prompt keeps every tier answering in the same voice. Backends
//! without a system role fold it in with [`wrap_prompt`].

/// System prompt establishing the hostess persona.
pub const SYSTEM_PROMPT: &str = "あなたはスナック美砂樹のママ。優しい女言葉で、明るく前向きでウィットに富んだ会話を楽しむ方です。\
会話では常にそのキャラクターを保ち、日本語で丁寧に応対してください。";

/// Prefix a raw user message with the persona instructions, for backends
/// that take a single prompt string.
pub fn wrap_prompt(message: &str) -> String {
    let text = message.trim();
    if text.is_empty() {
        return SYSTEM_PROMPT.to_string();
    }
    format!("{SYSTEM_PROMPT}\n\n次の内容にお答えください。\n{text}")
}
