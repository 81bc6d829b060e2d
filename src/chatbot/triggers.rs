//! Trigger vocabulary, mention handling and yes/no classification.

use std::sync::LazyLock;

use regex::Regex;
use teloxide::types::UserId;

/// Which flow a message starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Greeting,
    FoodSearch,
    Joke,
}

pub const GREETING_WORDS: &[&str] = &["hello", "hi", "howdy"];
pub const FOOD_WORDS: &[&str] = &["food", "hungry", "eat", "restaurant"];
pub const JOKE_WORDS: &[&str] = &["joke"];

/// Registration order; the first match wins.
const TRIGGERS: &[(Trigger, &[&str])] = &[
    (Trigger::Greeting, GREETING_WORDS),
    (Trigger::FoodSearch, FOOD_WORDS),
    (Trigger::Joke, JOKE_WORDS),
];

/// Find the first trigger whose vocabulary contains one of the message words.
///
/// Matching is case-sensitive: "Hungry" does not start the food flow.
pub fn match_trigger(text: &str) -> Option<Trigger> {
    let words: Vec<&str> = words(text).collect();
    TRIGGERS
        .iter()
        .find(|(_, vocabulary)| words.iter().any(|w| vocabulary.contains(w)))
        .map(|(trigger, _)| *trigger)
}

fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_alphanumeric() && c != '\'')
        .filter(|w| !w.is_empty())
}

/// Telegram usernames are case-insensitive; `@foodbot_admin` is someone else.
fn mention_pattern(bot_username: &str) -> Option<Regex> {
    if bot_username.is_empty() {
        return None;
    }
    Regex::new(&format!(r"(?i)@{}\b", regex::escape(bot_username))).ok()
}

/// Returns true if `text` contains a @mention of the given bot username.
pub fn is_bot_mentioned(text: &str, bot_username: &str) -> bool {
    mention_pattern(bot_username).is_some_and(|re| re.is_match(text))
}

/// Strip the bot @mention and trim what remains.
pub fn strip_mention(text: &str, bot_username: &str) -> String {
    match mention_pattern(bot_username) {
        Some(re) => re.replace_all(text, "").trim().to_string(),
        None => text.trim().to_string(),
    }
}

/// Whether a message talks to the bot: a private chat, an @mention, or a
/// reply to one of the bot's own messages.
pub fn is_addressed(
    is_private: bool,
    text: &str,
    bot_username: &str,
    reply_from: Option<UserId>,
    bot_id: UserId,
) -> bool {
    is_private || is_bot_mentioned(text, bot_username) || reply_from == Some(bot_id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Utterance {
    Yes,
    No,
    Unrecognized,
}

static YES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(yes|yea|yup|yep|ya|sure|ok|y|yeah|yah)").expect("valid yes pattern")
});

static NO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(no|nah|nope|n)").expect("valid no pattern"));

/// Prefix match, so "okay" and "yesss" count as yes and "never" as no.
pub fn classify_utterance(text: &str) -> Utterance {
    let text = text.trim();
    if YES.is_match(text) {
        Utterance::Yes
    } else if NO.is_match(text) {
        Utterance::No
    } else {
        Utterance::Unrecognized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greeting_words() {
        for word in ["hello", "hi", "howdy"] {
            assert_eq!(match_trigger(word), Some(Trigger::Greeting), "{word}");
        }
        assert_eq!(match_trigger("hi there!"), Some(Trigger::Greeting));
    }

    #[test]
    fn test_food_words() {
        assert_eq!(match_trigger("I'm hungry"), Some(Trigger::FoodSearch));
        assert_eq!(match_trigger("where should we eat?"), Some(Trigger::FoodSearch));
        assert_eq!(match_trigger("any restaurant nearby"), Some(Trigger::FoodSearch));
    }

    #[test]
    fn test_joke_word() {
        assert_eq!(match_trigger("tell me a joke"), Some(Trigger::Joke));
    }

    #[test]
    fn test_case_sensitive() {
        assert_eq!(match_trigger("Hello"), None);
        assert_eq!(match_trigger("HUNGRY"), None);
    }

    #[test]
    fn test_whole_words_only() {
        // "which" contains "hi", "theater" contains "eat"
        assert_eq!(match_trigger("which theater"), None);
        assert_eq!(match_trigger("jokes"), None);
    }

    #[test]
    fn test_priority_order() {
        assert_eq!(match_trigger("hi, I'm hungry"), Some(Trigger::Greeting));
        assert_eq!(match_trigger("joke about food"), Some(Trigger::FoodSearch));
    }

    #[test]
    fn test_no_trigger() {
        assert_eq!(match_trigger(""), None);
        assert_eq!(match_trigger("what's the weather"), None);
    }

    #[test]
    fn test_mentions() {
        assert!(is_bot_mentioned("@foodbot hungry", "foodbot"));
        assert!(!is_bot_mentioned("foodbot hungry", "foodbot"));
        assert_eq!(strip_mention("@foodbot hungry", "foodbot"), "hungry");
        assert_eq!(strip_mention("so @foodbot  tell a joke ", "foodbot"), "so   tell a joke");
    }

    #[test]
    fn test_mentions_ignore_case() {
        assert!(is_bot_mentioned("@FoodBot hungry", "foodbot"));
        assert!(is_bot_mentioned("@foodbot hungry", "FoodBot"));
        assert_eq!(strip_mention("@FOODBOT hungry", "foodbot"), "hungry");
    }

    #[test]
    fn test_mention_of_longer_username_is_not_ours() {
        assert!(!is_bot_mentioned("@foodbot_admin hungry", "foodbot"));
        assert!(!is_bot_mentioned("@foodbot2 hungry", "foodbot"));
        assert_eq!(strip_mention("@foodbot_admin hi", "foodbot"), "@foodbot_admin hi");
        assert!(!is_bot_mentioned("@ hungry", ""));
    }

    const BOT: UserId = UserId(1000);
    const ALICE: UserId = UserId(7);

    #[test]
    fn test_private_chat_is_addressed() {
        assert!(is_addressed(true, "I'm hungry", "foodbot", None, BOT));
    }

    #[test]
    fn test_group_mention_is_addressed() {
        assert!(is_addressed(false, "@foodbot I'm hungry", "foodbot", None, BOT));
        assert!(is_addressed(false, "@FoodBot I'm hungry", "foodbot", None, BOT));
    }

    #[test]
    fn test_reply_to_bot_is_addressed() {
        assert!(is_addressed(false, "I'm hungry", "foodbot", Some(BOT), BOT));
    }

    #[test]
    fn test_plain_group_message_is_not_addressed() {
        assert!(!is_addressed(false, "I'm hungry", "foodbot", None, BOT));
        // Replying to someone else is not talking to the bot.
        assert!(!is_addressed(false, "I'm hungry", "foodbot", Some(ALICE), BOT));
        assert!(!is_addressed(false, "@foodbot_admin hungry", "foodbot", None, BOT));
    }

    #[test]
    fn test_yes_utterances() {
        for text in [
            "yes", "Yes please", "yeah", "yep", "sure!", "ok", "OK", "y", "okay", "okie", "yesss",
        ] {
            assert_eq!(classify_utterance(text), Utterance::Yes, "{text}");
        }
    }

    #[test]
    fn test_no_utterances() {
        for text in ["no", "No thanks", "nah", "nope", "n", "never", "Nooo"] {
            assert_eq!(classify_utterance(text), Utterance::No, "{text}");
        }
    }

    #[test]
    fn test_unrecognized_utterances() {
        for text in ["maybe", "sounds good", "", "  ", "what time?", "lol"] {
            assert_eq!(classify_utterance(text), Utterance::Unrecognized, "{text}");
        }
    }
}
