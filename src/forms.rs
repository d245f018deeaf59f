//! Submitted forms and the field rules they must satisfy.
//!
//! Each `validate` returns the first failing rule's message so a page
//! shows one problem at a time.

use serde::Deserialize;
use std::fmt;

pub const PASSWORD_MIN: usize = 8;
pub const PASSWORD_SYMBOLS: &str = "!@#$%^&*(),.?\":{}|<>";

const EMPTY_FIELD: &str = "Do not leave this field empty";
const BAD_EMAIL: &str = "You seem to be missing @ or .";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordRule {
    MinLength,
    Lowercase,
    Uppercase,
    Digit,
    Symbol,
}

impl fmt::Display for PasswordRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PasswordRule::MinLength => write!(f, "Password must be {} characters minimum", PASSWORD_MIN),
            PasswordRule::Lowercase => f.write_str("Password must contain at least one lowercase letter."),
            PasswordRule::Uppercase => f.write_str("Password must contain at least one uppercase letter."),
            PasswordRule::Digit => f.write_str("Password must contain at least one digit."),
            PasswordRule::Symbol => f.write_str("Password must contain at least one special character."),
        }
    }
}

/// First complexity rule the password breaks, if any.
pub fn check_password_complexity(password: &str) -> Result<(), PasswordRule> {
    if password.chars().count() < PASSWORD_MIN {
        return Err(PasswordRule::MinLength);
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(PasswordRule::Lowercase);
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(PasswordRule::Uppercase);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(PasswordRule::Digit);
    }
    if !password.chars().any(|c| PASSWORD_SYMBOLS.contains(c)) {
        return Err(PasswordRule::Symbol);
    }
    Ok(())
}

/// Loose shape check: something before an `@`, and a dot somewhere after it.
pub fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !email.contains(char::is_whitespace)
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        }
        None => false,
    }
}

fn required(value: &str, message: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(message.to_string());
    }
    Ok(())
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    /// Checkbox: present only when ticked.
    pub agree_to_terms: Option<String>,
}

impl RegisterForm {
    pub fn agreed(&self) -> bool {
        self.agree_to_terms.is_some()
    }

    /// Presence and shape only; the ordered business rules live in `accounts`.
    pub fn validate(&self) -> Result<(), String> {
        required(&self.username, "Please enter a username")?;
        required(&self.email, EMPTY_FIELD)?;
        if !looks_like_email(self.email.trim()) {
            return Err(BAD_EMAIL.to_string());
        }
        required(&self.password, EMPTY_FIELD)?;
        required(&self.confirm_password, EMPTY_FIELD)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), String> {
        required(&self.email, EMPTY_FIELD)?;
        if !looks_like_email(self.email.trim()) {
            return Err(BAD_EMAIL.to_string());
        }
        required(&self.password, EMPTY_FIELD)?;
        if self.password.chars().count() < PASSWORD_MIN {
            return Err(PasswordRule::MinLength.to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PostForm {
    pub title: String,
    pub subtitle: String,
    pub img_url: String,
    pub body: String,
}

impl PostForm {
    pub fn validate(&self) -> Result<(), String> {
        required(&self.title, "Please enter a title")?;
        required(&self.subtitle, "Please enter a subtitle")?;
        required(&self.img_url, "Please enter an image URL")?;
        match url::Url::parse(self.img_url.trim()) {
            Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {}
            _ => return Err("Invalid URL.".to_string()),
        }
        required(&self.body, "Please enter the post content")?;
        Ok(())
    }
}

/// The post page posts either the "leave a comment" button or the comment itself.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PostPageForm {
    pub comment_button: Option<String>,
    pub body: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ManageAdminForm {
    pub email: String,
    pub make_admin: Option<String>,
    pub remove_admin: Option<String>,
}

impl ManageAdminForm {
    pub fn validate(&self) -> Result<(), String> {
        required(&self.email, EMPTY_FIELD)?;
        if !looks_like_email(self.email.trim()) {
            return Err("Invalid email address.".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
}
