//! Message types exchanged with the engine.

use serde::{Deserialize, Serialize};

/// A platform message reduced to what the conversation engine needs.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub chat_id: i64,
    pub user_id: i64,
    pub username: String,
    /// Message text with any bot mention already stripped.
    pub text: String,
    /// Direct message, @mention of the bot, or reply to the bot.
    pub addressed: bool,
}

/// Rich reply describing one business.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub title: String,
    pub title_link: String,
    pub text: String,
    pub image_url: String,
}

impl Attachment {
    /// Render as Telegram HTML: linked title, then the rating line.
    pub fn to_html(&self) -> String {
        let title = html_escape(&self.title);
        let title = if self.title_link.is_empty() {
            format!("<b>{}</b>", title)
        } else {
            format!("<a href=\"{}\">{}</a>", html_escape_attr(&self.title_link), title)
        };
        if self.text.is_empty() {
            title
        } else {
            format!("{}\nRating: {}", title, html_escape(&self.text))
        }
    }
}

fn html_escape(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '&' => result.push_str("&amp;"),
            _ => result.push(c),
        }
    }
    result
}

fn html_escape_attr(s: &str) -> String {
    html_escape(s).replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attachment() -> Attachment {
        Attachment {
            title: "Joe's Pizza".to_string(),
            title_link: "https://www.yelp.com/biz/joes-pizza-new-york".to_string(),
            text: "4.5".to_string(),
            image_url: "https://s3-media.fl.yelpcdn.com/bphoto/abc/o.jpg".to_string(),
        }
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape("Joe's"), "Joe's");
        assert_eq!(html_escape("Fish & Chips"), "Fish &amp; Chips");
        assert_eq!(html_escape("<b>"), "&lt;b&gt;");
        assert_eq!(html_escape_attr(r#"a"b"#), "a&quot;b");
    }

    #[test]
    fn test_attachment_html() {
        assert_eq!(
            attachment().to_html(),
            "<a href=\"https://www.yelp.com/biz/joes-pizza-new-york\">Joe's Pizza</a>\nRating: 4.5"
        );
    }

    #[test]
    fn test_attachment_html_without_link_or_rating() {
        let a = Attachment {
            title: "A & W".to_string(),
            title_link: String::new(),
            text: String::new(),
            image_url: String::new(),
        };
        assert_eq!(a.to_html(), "<b>A &amp; W</b>");
    }

    #[test]
    fn test_attachment_serializes_field_names() {
        let json = serde_json::to_value(attachment()).unwrap();
        assert_eq!(json["title"], "Joe's Pizza");
        assert_eq!(json["title_link"], "https://www.yelp.com/biz/joes-pizza-new-york");
        assert_eq!(json["text"], "4.5");
        assert!(json["image_url"].as_str().unwrap().ends_with("o.jpg"));
    }
}
