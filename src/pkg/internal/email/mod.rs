use lettre::message::{Mailbox, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

pub mod invite;

use crate::{
    conf::settings,
    prelude::{AppError, Result},
};

pub trait SendEmail {
    fn send(&self, email: &str) -> Result<()>;
}

pub fn build_message(to_name: &str, email: &str, subject: &str, body: &str, is_html: bool) -> Result<Message> {
    let content_type = if is_html {
        ContentType::TEXT_HTML
    } else {
        ContentType::TEXT_PLAIN
    };
    let from = format!("{} <{}>", &settings.service_name, &settings.from_email)
        .parse::<Mailbox>()
        .map_err(|e| AppError::Email(format!("sender: {e}")))?;
    let to = format!("{} <{}>", to_name, email)
        .parse::<Mailbox>()
        .map_err(|e| AppError::Email(format!("recipient {email}: {e}")))?;
    Message::builder()
        .from(from)
        .to(to)
        .subject(subject)
        .header(content_type)
        .body(body.to_string())
        .map_err(|e| AppError::Email(e.to_string()))
}

/// Validates and builds the message up front, then relays it in the background.
pub fn send_email(to_name: &str, email: &str, subject: &str, body: &str, is_html: bool) -> Result<()> {
    let message = build_message(to_name, email, subject, body, is_html)?;
    let recipient = email.to_string();
    tracing::debug!("sending email to {}", &recipient);
    tokio::spawn(async move {
        let result = tokio::task::spawn_blocking(move || {
            let creds = Credentials::new(settings.smtp_user.clone(), settings.smtp_pass.clone());
            let mailer = SmtpTransport::relay(&settings.smtp_server)?
                .port(settings.smtp_port)
                .credentials(creds)
                .build();
            mailer.send(&message)
        })
        .await;

        match result {
            Ok(Ok(_)) => tracing::info!("email sent to {}", &recipient),
            Ok(Err(e)) => tracing::error!("could not send email to {}: {:?}", &recipient, e),
            Err(e) => tracing::error!("email task failed to execute: {:?}", e),
        }
    });
    Ok(())
}
