use serde::Deserialize;
use std::collections::HashMap;

/// Field name to error message, shown next to the offending input.
pub type FormErrors = HashMap<String, String>;

const REQUIRED: &str = "This field is required.";
const INVALID_EMAIL: &str = "Enter a valid email address.";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmailPostForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchForm {
    pub query: Option<String>,
}

impl CommentForm {
    /// Trimmed copy of the form, or the errors to redisplay.
    pub fn clean(&self) -> Result<Self, FormErrors> {
        let cleaned = Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            body: self.body.trim().to_string(),
        };

        let mut errors = FormErrors::new();
        check_text(&mut errors, "name", &cleaned.name, 80);
        check_email(&mut errors, "email", &cleaned.email);
        if cleaned.body.is_empty() {
            errors.insert("body".to_string(), REQUIRED.to_string());
        }

        if errors.is_empty() { Ok(cleaned) } else { Err(errors) }
    }
}

impl EmailPostForm {
    pub fn clean(&self) -> Result<Self, FormErrors> {
        let cleaned = Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            to: self.to.trim().to_string(),
            comment: self.comment.trim().to_string(),
        };

        let mut errors = FormErrors::new();
        check_text(&mut errors, "name", &cleaned.name, 25);
        check_email(&mut errors, "email", &cleaned.email);
        check_email(&mut errors, "to", &cleaned.to);

        if errors.is_empty() { Ok(cleaned) } else { Err(errors) }
    }
}

impl SearchForm {
    /// `None` when no search was submitted, otherwise the trimmed query or
    /// the errors for an empty one.
    pub fn clean(&self) -> Option<Result<String, FormErrors>> {
        let query = self.query.as_deref()?.trim();
        if query.is_empty() {
            let mut errors = FormErrors::new();
            errors.insert("query".to_string(), REQUIRED.to_string());
            return Some(Err(errors));
        }
        Some(Ok(query.to_string()))
    }
}

fn check_text(errors: &mut FormErrors, field: &str, value: &str, max_chars: usize) {
    let len = value.chars().count();
    if len == 0 {
        errors.insert(field.to_string(), REQUIRED.to_string());
    } else if len > max_chars {
        errors.insert(
            field.to_string(),
            format!("Ensure this value has at most {max_chars} characters (it has {len})."),
        );
    }
}

fn check_email(errors: &mut FormErrors, field: &str, value: &str) {
    if value.is_empty() {
        errors.insert(field.to_string(), REQUIRED.to_string());
    } else if value.parse::<lettre::Address>().is_err() {
        errors.insert(field.to_string(), INVALID_EMAIL.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(name: &str, email: &str, body: &str) -> CommentForm {
        CommentForm {
            name: name.to_string(),
            email: email.to_string(),
            body: body.to_string(),
        }
    }

    #[test]
    fn valid_comment_is_trimmed() {
        let cleaned = comment("  Ann ", " ann@example.com ", " Nice post\n").clean().unwrap();
        assert_eq!(cleaned.name, "Ann");
        assert_eq!(cleaned.email, "ann@example.com");
        assert_eq!(cleaned.body, "Nice post");
    }

    #[test]
    fn comment_missing_email_is_required() {
        let errors = comment("Ann", "", "Nice post").clean().unwrap_err();
        assert_eq!(errors.get("email").map(String::as_str), Some("This field is required."));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn comment_name_length_is_limited() {
        let errors = comment(&"a".repeat(81), "ann@example.com", "x").clean().unwrap_err();
        assert_eq!(
            errors.get("name").map(String::as_str),
            Some("Ensure this value has at most 80 characters (it has 81).")
        );
    }

    #[test]
    fn share_form_checks_both_addresses() {
        let form = EmailPostForm {
            name: "Ann".to_string(),
            email: "not-an-address".to_string(),
            to: String::new(),
            comment: String::new(),
        };
        let errors = form.clean().unwrap_err();
        assert_eq!(errors.get("email").map(String::as_str), Some("Enter a valid email address."));
        assert_eq!(errors.get("to").map(String::as_str), Some("This field is required."));
        assert!(!errors.contains_key("comment"));
    }

    #[test]
    fn share_form_name_limit_is_25() {
        let form = EmailPostForm {
            name: "b".repeat(26),
            email: "ann@example.com".to_string(),
            to: "bob@example.com".to_string(),
            comment: String::new(),
        };
        assert!(form.clean().unwrap_err().contains_key("name"));
    }

    #[test]
    fn search_form_states() {
        assert!(SearchForm { query: None }.clean().is_none());
        assert!(matches!(
            SearchForm { query: Some("  ".to_string()) }.clean(),
            Some(Err(_))
        ));
        assert_eq!(
            SearchForm { query: Some(" rust ".to_string()) }.clean(),
            Some(Ok("rust".to_string()))
        );
    }

    #[test]
    fn email_fields_reject_what_the_mailer_rejects() {
        for bad in ["ann", "@example.com", "ann lee@example.com", "a,b@example.com", "a(b)@example.com", "a[b@example.com"] {
            let errors = comment("Ann", bad, "Nice post").clean().unwrap_err();
            assert_eq!(
                errors.get("email").map(String::as_str),
                Some("Enter a valid email address."),
                "{bad}"
            );
        }
        assert!(comment("Ann", "ann.lee+blog@mail.example.co", "Nice post").clean().is_ok());
    }
}
