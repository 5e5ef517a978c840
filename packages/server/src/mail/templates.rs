use chrono::{DateTime, Utc};

use super::EmailMessage;

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Wrap already-escaped paragraphs in the shared email chrome.
fn layout(heading: &str, paragraphs: &[String], action: Option<(&str, &str)>) -> String {
    let body: String = paragraphs
        .iter()
        .map(|p| {
            format!(
                r#"<p style="margin: 0 0 20px; font-size: 16px; line-height: 1.6; color: #d4d4d4;">{p}</p>"#
            )
        })
        .collect();

    let button = match action {
        Some((label, url)) => format!(
            r#"<div style="text-align: center; margin: 32px 0;">
    <a href="{url}" style="display: inline-block; background: #e11d48; color: white; text-decoration: none; font-size: 16px; font-weight: 600; padding: 14px 28px; border-radius: 10px;">{label}</a>
</div>"#,
            url = escape(url),
            label = escape(label),
        ),
        None => String::new(),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{heading}</title>
</head>
<body style="margin: 0; padding: 0; font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Arial, sans-serif; background-color: #0a0a0a; color: #ffffff;">
    <table role="presentation" style="width: 100%; border-collapse: collapse;">
        <tr>
            <td style="padding: 40px 20px;">
                <table role="presentation" style="max-width: 600px; margin: 0 auto; background: #171717; border-radius: 16px; border: 1px solid #262626;">
                    <tr>
                        <td style="padding: 40px;">
                            <h1 style="margin: 0 0 24px; font-size: 26px; font-weight: 700;">{heading}</h1>
                            {body}
                            {button}
                        </td>
                    </tr>
                </table>
            </td>
        </tr>
    </table>
</body>
</html>"#,
        heading = escape(heading),
    )
}

pub fn email_verification(to: &str, display_name: &str, link: &str) -> EmailMessage {
    let html = layout(
        "Confirm your email",
        &[
            format!("Hi {},", escape(display_name)),
            "Thanks for signing up. Confirm your email address to start entering contests and giveaways.".into(),
        ],
        Some(("Verify email", link)),
    );
    let text = format!(
        "Hi {display_name},\n\nThanks for signing up. Confirm your email address here:\n{link}\n"
    );
    EmailMessage {
        to: to.to_string(),
        subject: "Confirm your email".into(),
        body_html: Some(html),
        body_text: Some(text),
    }
}

pub fn password_reset(to: &str, display_name: &str, link: &str, ttl_minutes: i64) -> EmailMessage {
    let html = layout(
        "Reset your password",
        &[
            format!("Hi {},", escape(display_name)),
            format!(
                "Someone asked to reset the password for this account. The link below is valid for {ttl_minutes} minutes."
            ),
            "If this wasn't you, ignore this email and your password stays the same.".into(),
        ],
        Some(("Choose a new password", link)),
    );
    let text = format!(
        "Hi {display_name},\n\nReset your password here (valid for {ttl_minutes} minutes):\n{link}\n\nIf this wasn't you, ignore this email.\n"
    );
    EmailMessage {
        to: to.to_string(),
        subject: "Reset your password".into(),
        body_html: Some(html),
        body_text: Some(text),
    }
}

pub fn application_decision(
    to: &str,
    display_name: &str,
    contest_title: &str,
    approved: bool,
    notes: Option<&str>,
    link: &str,
) -> EmailMessage {
    let (subject, verdict) = if approved {
        (
            format!("You're in: {contest_title}"),
            "Your application was approved. You can now upload your submission before the deadline.",
        )
    } else {
        (
            format!("Your application to {contest_title}"),
            "Unfortunately your application was not accepted this time.",
        )
    };

    let mut paragraphs = vec![
        format!("Hi {},", escape(display_name)),
        format!("{} ({})", verdict, escape(contest_title)),
    ];
    if let Some(notes) = notes {
        paragraphs.push(format!("Notes from the team: {}", escape(notes)));
    }
    let html = layout(&subject, &paragraphs, Some(("View contest", link)));

    let mut text = format!("Hi {display_name},\n\n{verdict} ({contest_title})\n");
    if let Some(notes) = notes {
        text.push_str(&format!("\nNotes from the team: {notes}\n"));
    }
    text.push_str(&format!("\n{link}\n"));

    EmailMessage {
        to: to.to_string(),
        subject,
        body_html: Some(html),
        body_text: Some(text),
    }
}

pub fn giveaway_won(
    to: &str,
    display_name: &str,
    giveaway_title: &str,
    prize: &str,
    claim_deadline: DateTime<Utc>,
    link: &str,
) -> EmailMessage {
    let deadline = claim_deadline.format("%B %-d, %Y");
    let html = layout(
        "You won!",
        &[
            format!("Hi {},", escape(display_name)),
            format!(
                "You were drawn as a winner of <strong>{}</strong>. Your prize: {}.",
                escape(giveaway_title),
                escape(prize)
            ),
            format!("Claim it before {deadline} or it will go to waste."),
        ],
        Some(("Claim prize", link)),
    );
    let text = format!(
        "Hi {display_name},\n\nYou were drawn as a winner of {giveaway_title}. Your prize: {prize}.\nClaim it before {deadline}:\n{link}\n"
    );
    EmailMessage {
        to: to.to_string(),
        subject: format!("You won {giveaway_title}!"),
        body_html: Some(html),
        body_text: Some(text),
    }
}

pub fn contest_won(to: &str, display_name: &str, contest_title: &str, prize: &str) -> EmailMessage {
    let html = layout(
        "Congratulations!",
        &[
            format!("Hi {},", escape(display_name)),
            format!(
                "Your submission won <strong>{}</strong>. Prize: {}.",
                escape(contest_title),
                escape(prize)
            ),
            "We'll be in touch about next steps.".into(),
        ],
        None,
    );
    let text = format!(
        "Hi {display_name},\n\nYour submission won {contest_title}. Prize: {prize}.\nWe'll be in touch about next steps.\n"
    );
    EmailMessage {
        to: to.to_string(),
        subject: format!("Your entry won {contest_title}"),
        body_html: Some(html),
        body_text: Some(text),
    }
}

pub fn contact_form(
    inbox: &str,
    name: &str,
    email: &str,
    subject: &str,
    message: &str,
) -> EmailMessage {
    let html = layout(
        "New contact request",
        &[
            format!("From: {} &lt;{}&gt;", escape(name), escape(email)),
            format!("Subject: {}", escape(subject)),
            escape(message).replace('\n', "<br>"),
        ],
        None,
    );
    let text = format!("From: {name} <{email}>\nSubject: {subject}\n\n{message}\n");
    EmailMessage {
        to: inbox.to_string(),
        subject: format!("[Contact] {subject}"),
        body_html: Some(html),
        body_text: Some(text),
    }
}
