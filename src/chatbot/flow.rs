//! Conversation flows as a pure state machine.
//!
//! `start` and `advance` never touch the network. They return the successor
//! session (or `None` when the flow is over) together with the effects the
//! engine has to perform, in order.

use crate::chatbot::session::{FlowState, Session, SessionKey};
use crate::chatbot::triggers::{classify_utterance, Trigger, Utterance};

pub const FOOD_CONFIRM: &str = "Can I help you find a place to eat?";
pub const FOOD_ACCEPTED: &str = "Okay! Let me help!";
pub const FOOD_ASK_FOOD: &str = "What are you hungry for?";
pub const FOOD_ASK_LOCATION: &str = "Okay! And where do you want to eat?";
pub const FOOD_SEARCHING: &str = "Okay! Let me look for a place for you!";
pub const FOOD_NOT_FOUND: &str = "Sorry, I couldn't find a place for you.";

pub const JOKE_CONFIRM: &str = "Do you want to hear a joke?";
pub const JOKE_ASK_KIND: &str = "Would you like to hear a knock knock or a dirty joke?";
pub const JOKE_KNOCK_KNOCK: &str = "knock knock";
pub const JOKE_KNOCK: &str = "Knock knock";
pub const JOKE_TANK: &str = "Tank";
pub const JOKE_PUNCHLINE: &str = "You are welcome!";
pub const JOKE_ONE_LINER: &str =
    "What do you call someone who refuses to fart in public? A private tutor.";

pub const GOODBYE: &str = "bye bye";
pub const GENERIC_GREETING: &str = "Hello there!";

pub fn greeting_for(name: &str) -> String {
    format!("Hello, {}!", name)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub term: String,
    pub location: String,
}

/// Side effect requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Say(String),
    /// Look up the sender's display name and greet them.
    Greet,
    Search(SearchQuery),
}

#[derive(Debug)]
pub struct Transition {
    pub session: Option<Session>,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn stay(session: Session, effects: Vec<Effect>) -> Self {
        Self { session: Some(session), effects }
    }

    fn end(effects: Vec<Effect>) -> Self {
        Self { session: None, effects }
    }
}

fn say(text: &str) -> Effect {
    Effect::Say(text.to_string())
}

/// Enter the flow for `trigger`.
pub fn start(trigger: Trigger, key: SessionKey) -> Transition {
    match trigger {
        Trigger::Greeting => Transition::end(vec![Effect::Greet]),
        Trigger::FoodSearch => Transition::stay(
            Session::new(key, FlowState::FoodConfirm),
            vec![say(FOOD_CONFIRM)],
        ),
        Trigger::Joke => Transition::stay(
            Session::new(key, FlowState::JokeConfirm),
            vec![say(JOKE_CONFIRM)],
        ),
    }
}

/// Feed one user answer into a session.
pub fn advance(mut session: Session, answer: &str) -> Transition {
    let answer = answer.trim();
    match session.state {
        FlowState::FoodConfirm => match classify_utterance(answer) {
            Utterance::Yes => {
                session.state = FlowState::FoodAskFood;
                Transition::stay(session, vec![say(FOOD_ACCEPTED), say(FOOD_ASK_FOOD)])
            }
            Utterance::No => Transition::end(vec![say(GOODBYE)]),
            // Wait quietly for a yes or a no.
            Utterance::Unrecognized => Transition::stay(session, Vec::new()),
        },
        FlowState::FoodAskFood => {
            session.answers.push(answer.to_string());
            session.state = FlowState::FoodAskLocation;
            Transition::stay(session, vec![say(FOOD_ASK_LOCATION)])
        }
        FlowState::FoodAskLocation => {
            session.answers.push(answer.to_string());
            match session.answers.as_slice() {
                [term, location] => Transition::end(vec![
                    say(FOOD_SEARCHING),
                    Effect::Search(SearchQuery {
                        term: term.clone(),
                        location: location.clone(),
                    }),
                ]),
                // Only reachable if a session was built by hand with stray answers.
                _ => Transition::end(vec![say(FOOD_NOT_FOUND)]),
            }
        }
        FlowState::JokeConfirm => match classify_utterance(answer) {
            Utterance::Yes => {
                session.state = FlowState::JokeChooseKind;
                Transition::stay(session, vec![say(JOKE_ASK_KIND)])
            }
            Utterance::No => Transition::end(vec![say(GOODBYE)]),
            Utterance::Unrecognized => Transition::stay(session, Vec::new()),
        },
        FlowState::JokeChooseKind => {
            session.answers.push(answer.to_string());
            if answer == JOKE_KNOCK_KNOCK {
                session.state = FlowState::JokeKnockKnock;
                Transition::stay(session, vec![say(JOKE_KNOCK)])
            } else {
                Transition::end(vec![say(JOKE_ONE_LINER)])
            }
        }
        FlowState::JokeKnockKnock => {
            session.answers.push(answer.to_string());
            session.state = FlowState::JokeWho;
            Transition::stay(session, vec![say(JOKE_TANK)])
        }
        FlowState::JokeWho => Transition::end(vec![say(JOKE_PUNCHLINE)]),
    }
}
