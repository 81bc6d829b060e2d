//! Chatbot engine - routes inbound messages through the conversation flows.

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::chatbot::directory::DirectorySearch;
use crate::chatbot::flow::{self, Effect, SearchQuery, Transition};
use crate::chatbot::gateway::MessagingGateway;
use crate::chatbot::message::{Attachment, InboundMessage};
use crate::chatbot::session::{SessionKey, SessionRegistry};
use crate::chatbot::triggers::match_trigger;

/// The chatbot engine.
pub struct ChatbotEngine {
    gateway: Arc<dyn MessagingGateway>,
    directory: Arc<dyn DirectorySearch>,
    sessions: Mutex<SessionRegistry>,
}

impl ChatbotEngine {
    pub fn new(gateway: Arc<dyn MessagingGateway>, directory: Arc<dyn DirectorySearch>) -> Self {
        Self {
            gateway,
            directory,
            sessions: Mutex::new(SessionRegistry::new()),
        }
    }

    /// Handle an incoming message.
    ///
    /// An open session for the sender consumes the message as its next
    /// answer, trigger words included. Otherwise an addressed message may
    /// start a new flow.
    pub async fn handle_message(&self, msg: InboundMessage) {
        let key = SessionKey {
            user_id: msg.user_id,
            chat_id: msg.chat_id,
        };

        let effects = {
            let mut sessions = self.sessions.lock().await;
            let transition = if let Some(session) = sessions.take(&key) {
                let from = session.state;
                let age = session.elapsed_secs();
                let transition = flow::advance(session, &msg.text);
                match &transition.session {
                    Some(next) => info!("💬 {} ({}): {:?} -> {:?}", msg.username, msg.user_id, from, next.state),
                    None => info!(
                        "💬 {} ({}): {:?} -> done after {}s ({} sessions open)",
                        msg.username,
                        msg.user_id,
                        from,
                        age,
                        sessions.len()
                    ),
                }
                transition
            } else if msg.addressed {
                let Some(trigger) = match_trigger(&msg.text) else {
                    return;
                };
                info!("📨 {} ({}) triggered {:?} in chat {}", msg.username, msg.user_id, trigger, msg.chat_id);
                flow::start(trigger, key)
            } else {
                return;
            };

            let Transition { session, effects } = transition;
            if let Some(session) = session {
                sessions.insert(session);
            }
            effects
        };

        for effect in effects {
            self.perform(&msg, effect).await;
        }
    }

    /// Whether the user currently has a conversation open in the chat.
    #[cfg(test)]
    pub async fn has_session(&self, user_id: i64, chat_id: i64) -> bool {
        self.sessions.lock().await.contains(&SessionKey { user_id, chat_id })
    }

    async fn perform(&self, msg: &InboundMessage, effect: Effect) {
        match effect {
            Effect::Say(text) => self.say(msg.chat_id, &text).await,
            Effect::Greet => self.greet(msg).await,
            Effect::Search(query) => self.search(msg.chat_id, &query).await,
        }
    }

    async fn say(&self, chat_id: i64, text: &str) {
        if let Err(e) = self.gateway.send_text(chat_id, text).await {
            warn!("Reply to chat {} dropped: {}", chat_id, e);
        }
    }

    async fn greet(&self, msg: &InboundMessage) {
        let reply = match self.gateway.display_name(msg.chat_id, msg.user_id).await {
            Ok(Some(name)) => flow::greeting_for(&name),
            Ok(None) => flow::GENERIC_GREETING.to_string(),
            Err(e) => {
                warn!("Name lookup for {} failed: {}", msg.user_id, e);
                flow::GENERIC_GREETING.to_string()
            }
        };
        self.say(msg.chat_id, &reply).await;
    }

    async fn search(&self, chat_id: i64, query: &SearchQuery) {
        let businesses = match self.directory.search(query).await {
            Ok(businesses) => businesses,
            Err(e) => {
                warn!("Search for \"{}\" near \"{}\" failed: {}", query.term, query.location, e);
                self.say(chat_id, flow::FOOD_NOT_FOUND).await;
                return;
            }
        };

        let Some(best) = businesses.first() else {
            warn!("Search for \"{}\" near \"{}\" returned nothing", query.term, query.location);
            self.say(chat_id, flow::FOOD_NOT_FOUND).await;
            return;
        };

        info!("🍽️ Suggesting {} to chat {}", best.name, chat_id);
        self.say(chat_id, &best.name).await;
        if let Err(e) = self.gateway.send_attachment(chat_id, &Attachment::from(best)).await {
            warn!("Attachment to chat {} dropped: {}", chat_id, e);
        }
    }
}
