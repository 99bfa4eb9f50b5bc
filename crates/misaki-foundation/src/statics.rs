//! Static response tier
//!
//! Canned replies for inputs the rule table recognises, plus the designated
//! degraded-mode reply served when every generative tier has failed.
//!
//! Matching policy: normalized exact match — trim, casefold, strip trailing
//! punctuation (including 。！？). Lookup is pure; a match is terminal and no
//! inference adapter runs for it.

/// One canned-response rule: any normalized pattern maps to the reply.
#[derive(Debug, Clone)]
pub struct StaticRule {
    patterns: Vec<String>,
    reply: String,
}

/// The static tier: ordered rules, a reply for blank input, and the
/// designated fallback string.
#[derive(Debug, Clone)]
pub struct StaticResponder {
    rules: Vec<StaticRule>,
    blank_reply: Option<String>,
    fallback: String,
}

const TRAILING_PUNCTUATION: &[char] = &['.', ',', '!', '?', '。', '、', '！', '？', '～'];

fn normalize(input: &str) -> String {
    input
        .trim()
        .to_lowercase()
        .trim_end_matches(TRAILING_PUNCTUATION)
        .trim()
        .to_string()
}

impl StaticResponder {
    /// Empty rule table with the given fallback reply.
    pub fn new(fallback: impl Into<String>) -> Self {
        Self {
            rules: Vec::new(),
            blank_reply: None,
            fallback: fallback.into(),
        }
    }

    /// The built-in table: greetings in the hostess voice.
    pub fn standard() -> Self {
        Self::new(
            "申し訳ありません、ただいま少し立て込んでおりまして。また少し経ってからお声がけくださいね。",
        )
        .with_blank_reply("本日はどのようにお手伝いしましょうか？")
        .with_rule(&["こんばんは"], "こんばんは！")
        .with_rule(&["こんにちは"], "こんにちは！")
        .with_rule(&["おはよう", "おはようございます"], "おはようございます！")
        .with_rule(&["hello", "hi", "hey"], "こんばんは！いらっしゃいませ。")
        .with_rule(
            &["ありがとう", "ありがとうございます", "thank you", "thanks"],
            "どういたしまして。また何でもお申し付けくださいね。",
        )
    }

    /// Add a rule; patterns are normalized once at registration.
    pub fn with_rule(mut self, patterns: &[&str], reply: impl Into<String>) -> Self {
        self.rules.push(StaticRule {
            patterns: patterns.iter().map(|p| normalize(p)).collect(),
            reply: reply.into(),
        });
        self
    }

    /// Reply served when the input is blank.
    pub fn with_blank_reply(mut self, reply: impl Into<String>) -> Self {
        self.blank_reply = Some(reply.into());
        self
    }

    /// Match `input` against the rule table.
    pub fn lookup(&self, input: &str) -> Option<&str> {
        let key = normalize(input);

        if key.is_empty() {
            return self.blank_reply.as_deref();
        }

        self.rules
            .iter()
            .find(|rule| rule.patterns.iter().any(|p| *p == key))
            .map(|rule| rule.reply.as_str())
    }

    /// The designated degraded-mode reply.
    pub fn fallback_reply(&self) -> &str {
        &self.fallback
    }
}

impl Default for StaticResponder {
    fn default() -> Self {
        Self::standard()
    }
}
