use std::fmt::{self, Display};

use super::{SendEmail, send_email};

#[derive(Debug)]
pub struct BcqInvite {
    pub candidate_name: String,
    pub job_title: String,
    pub link: String,
}

impl Display for BcqInvite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let html_template = format!(
            r#"
            <!DOCTYPE html>
            <html>
            <head>
                <meta charset="UTF-8">
                <meta name="viewport" content="width=device-width, initial-scale=1.0">
                <title>Business Case Questions</title>
                <style>
                    body {{
                        font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, 'Helvetica Neue', Arial, sans-serif;
                        line-height: 1.6;
                        color: #333;
                        margin: 0;
                        padding: 0;
                    }}
                    .container {{
                        max-width: 600px;
                        margin: 0 auto;
                        padding: 20px;
                    }}
                    .header {{
                        text-align: center;
                        padding: 20px 0;
                        background-color: #0d9488;
                        color: white;
                    }}
                    .button {{
                        display: inline-block;
                        padding: 12px 24px;
                        background-color: #0d9488;
                        color: white;
                        text-decoration: none;
                        border-radius: 6px;
                        margin: 20px 0;
                    }}
                    .note {{
                        background-color: #f3f4f6;
                        padding: 15px;
                        border-radius: 6px;
                    }}
                </style>
            </head>
            <body>
                <div class="container">
                    <div class="header">
                        <h1>{}</h1>
                    </div>
                    <p>Hi {},</p>
                    <p>Thanks for applying. The next step is a short set of business case questions answered on video.</p>
                    <div class="note">
                        <p>Each answer is recorded in your browser. You can re-record before submitting, and you can close
                        the page and come back later with the same link. Please finish within 24 hours of first opening it.</p>
                    </div>
                    <div style="text-align: center;">
                        <a href="{}" class="button">Start the business case</a>
                    </div>
                    <p>This link is personal. Do not share it.</p>
                </div>
            </body>
            </html>
            "#,
            self.job_title, self.candidate_name, self.link
        );
        write!(f, "{}", html_template)
    }
}

impl SendEmail for BcqInvite {
    fn send(&self, email: &str) -> crate::prelude::Result<()> {
        send_email(
            &self.candidate_name,
            email,
            &format!("Business case questions for {}", &self.job_title),
            &format!("{}", &self),
            true,
        )
    }
}

#[cfg(test)]
pub mod tests {
    use tracing_test::traced_test;

    use super::*;
    use crate::{pkg::internal::email::build_message, prelude::Result};

    fn invite() -> BcqInvite {
        BcqInvite {
            candidate_name: "Ada".into(),
            job_title: "Strategy Analyst".into(),
            link: "http://ats.test/business-case/j?applicationId=a&token=t".into(),
        }
    }

    #[test]
    #[traced_test]
    fn test_invite_template() -> Result<()> {
        let html = invite().to_string();
        assert!(html.contains("href=\"http://ats.test/business-case/j?applicationId=a&token=t\""));
        assert!(html.contains("Hi Ada,"));
        build_message("Ada", "ada@example.com", "subject", &html, true)?;
        Ok(())
    }

    #[test]
    fn test_bad_recipient_is_an_email_error() {
        let err = build_message("Ada", "not an address", "s", "b", false).unwrap_err();
        assert_eq!(err.code(), "ERR-MAIL-001");
    }
}
