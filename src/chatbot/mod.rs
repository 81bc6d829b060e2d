//! Chatbot module - keyword-triggered conversations and the restaurant search.

pub mod directory;
pub mod engine;
pub mod flow;
pub mod gateway;
pub mod message;
pub mod session;
pub mod telegram;
pub mod triggers;
pub mod yelp;


pub use engine::ChatbotEngine;
pub use message::InboundMessage;
pub use telegram::TelegramClient;
pub use yelp::YelpClient;
