// grocer/src/services/mailer.rs

//! Outgoing mail. The transport sits behind the `Mailer` trait; the shipped
//! implementation only logs, which is what development and tests need.

use crate::error::Result;
use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct OutgoingEmail {
  pub to: String,
  pub from: String,
  pub subject: String,
  pub html_body: String,
}

#[derive(Debug, Clone)]
pub struct SentEmail {
  pub to: String,
  pub subject: String,
  pub body_preview: String, // First N chars of body
  pub message_id: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
  async fn send(&self, email: OutgoingEmail) -> Result<SentEmail>;
}

/// Writes each message to the log instead of delivering it.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
  async fn send(&self, email: OutgoingEmail) -> Result<SentEmail> {
    info!(
      "Logging email instead of sending: To='{}', From='{}', Subject='{}'",
      email.to, email.from, email.subject
    );

    let body_preview = email.html_body.chars().take(50).collect::<String>() + "...";
    let message_id = format!("log_email_{}", Uuid::new_v4());
    info!(%message_id, "Email logged.");

    Ok(SentEmail {
      to: email.to,
      subject: email.subject,
      body_preview,
      message_id,
    })
  }
}

/// Escapes text for use inside an HTML element or quoted attribute.
pub fn escape_html(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  for c in text.chars() {
    match c {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#x27;"),
      _ => out.push(c),
    }
  }
  out
}

pub fn welcome_email(sender: &str, to: &str, name: &str) -> OutgoingEmail {
  OutgoingEmail {
    to: to.to_string(),
    from: sender.to_string(),
    subject: format!("Welcome to Grocer, {}!", name),
    html_body: format!(
      "<p>Hi {},</p><p>Thanks for signing up to Grocer!</p>",
      escape_html(name)
    ),
  }
}

pub fn reset_code_email(sender: &str, to: &str, code: &str, ttl_minutes: i64) -> OutgoingEmail {
  OutgoingEmail {
    to: to.to_string(),
    from: sender.to_string(),
    subject: "Your Grocer password reset code".to_string(),
    html_body: format!(
      "<p>Your password reset code is <strong>{}</strong>.</p><p>It expires in {} minutes.</p>",
      code, ttl_minutes
    ),
  }
}
