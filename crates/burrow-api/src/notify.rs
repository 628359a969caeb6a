use serde::Serialize;
use tracing::{info, warn};

/// Outbound mail payload handed to the notification sink.
#[derive(Debug, Clone, Serialize)]
pub struct Mail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Fire-and-forget notification sender. Mails are POSTed to an optional
/// webhook (a relay service owns actual delivery); without one they are
/// only logged. Either way the send is spawned off the request path and
/// a failure never affects the mutation that triggered it.
#[derive(Clone)]
pub struct Notifier {
    webhook: Option<String>,
    client: reqwest::Client,
}

impl Notifier {
    pub fn new(webhook: Option<String>) -> Self {
        Self {
            webhook,
            client: reqwest::Client::new(),
        }
    }

    pub fn send(&self, mail: Mail) {
        let Some(url) = self.webhook.clone() else {
            info!("mail (no webhook configured): to={} subject={}", mail.to, mail.subject);
            return;
        };

        let client = self.client.clone();
        tokio::spawn(async move {
            match client.post(&url).json(&mail).send().await {
                Ok(resp) if resp.status().is_success() => {
                    info!("mail relayed: to={} subject={}", mail.to, mail.subject);
                }
                Ok(resp) => {
                    warn!("mail relay returned {}: to={}", resp.status(), mail.to);
                }
                Err(e) => {
                    warn!("mail relay failed: {e}");
                }
            }
        });
    }
}

/// Ownership-transfer notice sent to the incoming owner.
pub fn transfer_mail(to: &str, first_name: &str, group_title: &str, from_email: &str) -> Mail {
    Mail {
        to: to.to_string(),
        subject: format!("You are now the owner of {group_title}"),
        body: format!(
            "Hi {first_name},\n\n{from_email} transferred ownership of the group \
             \"{group_title}\" to you.",
        ),
    }
}

/// Notice for an existing account that was granted the admin role.
pub fn admin_granted_mail(to: &str, first_name: &str) -> Mail {
    Mail {
        to: to.to_string(),
        subject: "You have been made an administrator".to_string(),
        body: format!("Hi {first_name},\n\nYour account now has administrator access."),
    }
}

/// Credentials mail for a freshly created admin account.
pub fn admin_created_mail(to: &str, first_name: &str, password: &str) -> Mail {
    Mail {
        to: to.to_string(),
        subject: "Your administrator account".to_string(),
        body: format!(
            "Hi {first_name},\n\nAn administrator account was created for you.\n\
             Temporary password: {password}\n\nPlease change it after signing in.",
        ),
    }
}
