use serde::Deserialize;

pub const MIN_PASSWORD_LENGTH: usize = 6;
pub const MAX_MESSAGE_LENGTH: usize = 140;

#[derive(Debug, Default, Clone, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub image_url: String,
}

impl SignupForm {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        required(&mut errors, "Username", &self.username);
        email(&mut errors, &self.email);
        password(&mut errors, &self.password);
        errors
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        required(&mut errors, "Username", &self.username);
        password(&mut errors, &self.password);
        errors
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct MessageForm {
    #[serde(default)]
    pub text: String,
}

impl MessageForm {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        required(&mut errors, "Text", &self.text);
        if self.text.chars().count() > MAX_MESSAGE_LENGTH {
            errors.push(format!("Text must be at most {MAX_MESSAGE_LENGTH} characters."));
        }
        errors
    }
}

/// Profile edit; `password` confirms the change and is never stored.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ProfileForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub header_image_url: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub password: String,
}

impl ProfileForm {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        required(&mut errors, "Username", &self.username);
        email(&mut errors, &self.email);
        required(&mut errors, "Password", &self.password);
        errors
    }
}

fn required(errors: &mut Vec<String>, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(format!("{field} is required."));
    }
}

fn password(errors: &mut Vec<String>, value: &str) {
    if value.chars().count() < MIN_PASSWORD_LENGTH {
        errors.push(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters."
        ));
    }
}

fn email(errors: &mut Vec<String>, value: &str) {
    if value.trim().is_empty() {
        errors.push("E-mail is required.".to_string());
    } else if !looks_like_email(value.trim()) {
        errors.push("Invalid email address.".to_string());
    }
}

fn looks_like_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !value.contains(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signup_form_reports_each_problem() {
        let form = SignupForm {
            username: " ".into(),
            email: "not-an-email".into(),
            password: "short".into(),
            image_url: String::new(),
        };
        assert_eq!(
            form.validate(),
            vec![
                "Username is required.",
                "Invalid email address.",
                "Password must be at least 6 characters.",
            ]
        );
    }

    #[test]
    fn valid_signup_form_passes() {
        let form = SignupForm {
            username: "test".into(),
            email: "test@test.com".into(),
            password: "password".into(),
            image_url: String::new(),
        };
        assert!(form.validate().is_empty());
    }

    #[test]
    fn message_length_counts_characters() {
        let ok = MessageForm { text: "é".repeat(140) };
        assert!(ok.validate().is_empty());

        let long = MessageForm { text: "a".repeat(141) };
        assert_eq!(long.validate().len(), 1);

        let empty = MessageForm { text: String::new() };
        assert_eq!(empty.validate(), vec!["Text is required."]);
    }

    #[test]
    fn email_shape() {
        assert!(looks_like_email("a@b.co"));
        assert!(!looks_like_email("a@b"));
        assert!(!looks_like_email("@b.co"));
        assert!(!looks_like_email("a b@c.de"));
    }
}
