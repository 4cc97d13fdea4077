//! Form-style validation for user input.
//!
//! Each validator collects every problem it finds into [`FieldErrors`] so a
//! client can show them next to the offending field.

use once_cell::sync::Lazy;
use regex::Regex;

use monotext_types::{FieldErrors, DEFAULT_POST_TITLE};

pub const TEXT_MAX_CHARS: usize = 2048;
pub const TEXT_MIN_CHARS: usize = 2;
pub const TITLE_MAX_CHARS: usize = 128;
pub const USERNAME_MAX_CHARS: usize = 150;
pub const PASSWORD_MIN_CHARS: usize = 8;
/// Avatar indices run from 0 to this value inclusive
pub const MAX_PICTURE_INDEX: i64 = 1;

pub const REQUIRED: &str = "This field is required.";

/// Names that collide with fixed routes under `/monotext/profile/`
pub const RESERVED_USERNAMES: [&str; 1] = ["picture"];

static USERNAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.@+-]+$").expect("Failed to compile username regex"));

/// Validated post fields, ready to store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostForm {
    pub title: String,
    pub text: String,
}

/// Validated registration fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationForm {
    pub username: String,
    pub password: String,
}

fn max_length_message(limit: usize, actual: usize) -> String {
    format!(
        "Ensure this value has at most {} characters (it has {}).",
        limit, actual
    )
}

/// Shared rules for post and comment bodies
fn check_text(errors: &mut FieldErrors, text: &str, too_short: &str) {
    let trimmed = text.trim();
    let chars = trimmed.chars().count();
    if chars == 0 {
        errors.add("text", REQUIRED);
    } else if chars < TEXT_MIN_CHARS {
        errors.add("text", too_short);
    } else if chars > TEXT_MAX_CHARS {
        errors.add("text", max_length_message(TEXT_MAX_CHARS, chars));
    }
}

pub fn validate_post(title: Option<&str>, text: &str) -> Result<PostForm, FieldErrors> {
    let mut errors = FieldErrors::new();
    check_text(&mut errors, text, "Post must have at least 2 characters!");

    let title = title.map(str::trim).unwrap_or_default();
    let title_chars = title.chars().count();
    if title_chars > TITLE_MAX_CHARS {
        errors.add("title", max_length_message(TITLE_MAX_CHARS, title_chars));
    }

    errors.into_result()?;
    Ok(PostForm {
        title: if title.is_empty() {
            DEFAULT_POST_TITLE.to_string()
        } else {
            title.to_string()
        },
        text: text.trim().to_string(),
    })
}

pub fn validate_comment(text: &str) -> Result<String, FieldErrors> {
    let mut errors = FieldErrors::new();
    check_text(&mut errors, text, "Comment must have at least 2 characters!");
    errors.into_result()?;
    Ok(text.trim().to_string())
}

/// Check username shape and password strength.
///
/// Username uniqueness needs the database and is checked by the caller.
pub fn validate_registration(
    username: &str,
    password: &str,
    password_confirm: &str,
) -> Result<RegistrationForm, FieldErrors> {
    let mut errors = FieldErrors::new();

    let username = username.trim();
    let username_chars = username.chars().count();
    if username.is_empty() {
        errors.add("username", REQUIRED);
    } else if username_chars > USERNAME_MAX_CHARS {
        errors.add(
            "username",
            max_length_message(USERNAME_MAX_CHARS, username_chars),
        );
    } else if !USERNAME_REGEX.is_match(username) {
        errors.add(
            "username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        );
    } else if RESERVED_USERNAMES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(username))
    {
        errors.add("username", "This username is reserved.");
    }

    if password.is_empty() {
        errors.add("password", REQUIRED);
    } else {
        if password.chars().count() < PASSWORD_MIN_CHARS {
            errors.add(
                "password",
                format!(
                    "This password is too short. It must contain at least {} characters.",
                    PASSWORD_MIN_CHARS
                ),
            );
        }
        if password.chars().all(|c| c.is_ascii_digit()) {
            errors.add("password", "This password is entirely numeric.");
        }
    }

    if password_confirm.is_empty() {
        errors.add("password_confirm", REQUIRED);
    } else if password != password_confirm {
        errors.add("password_confirm", "The two password fields didn't match.");
    }

    errors.into_result()?;
    Ok(RegistrationForm {
        username: username.to_string(),
        password: password.to_string(),
    })
}

pub fn validate_picture(picture: Option<i64>) -> Result<i32, FieldErrors> {
    let mut errors = FieldErrors::new();
    let Some(picture) = picture else {
        errors.add("picture", REQUIRED);
        return Err(errors);
    };

    if picture < 0 {
        errors.add("picture", "Something wrong, negative values not allowed!");
    } else if picture > MAX_PICTURE_INDEX {
        errors.add(
            "picture",
            format!(
                "Something wrong, greater than {} values not allowed!",
                MAX_PICTURE_INDEX
            ),
        );
    }
    errors.into_result()?;
    // Range checked above
    Ok(picture as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_short_post_text() {
        let errors = validate_post(Some(""), "A").unwrap_err();
        assert_eq!(
            errors.get("text").unwrap()[0],
            "Post must have at least 2 characters!"
        );
        assert!(!errors.contains("title"));
    }

    #[test]
    fn test_blank_title_gets_default() {
        let form = validate_post(None, "Nice post!").unwrap();
        assert_eq!(form.title, "Untitled Post");

        let form = validate_post(Some("   "), "Nice post!").unwrap();
        assert_eq!(form.title, "Untitled Post");

        let form = validate_post(Some(" New Post "), "Nice post!").unwrap();
        assert_eq!(form.title, "New Post");
    }

    #[test]
    fn test_long_title_and_text() {
        let title = "t".repeat(129);
        let text = "x".repeat(2049);
        let errors = validate_post(Some(&title), &text).unwrap_err();
        assert_eq!(
            errors.get("title").unwrap()[0],
            "Ensure this value has at most 128 characters (it has 129)."
        );
        assert_eq!(
            errors.get("text").unwrap()[0],
            "Ensure this value has at most 2048 characters (it has 2049)."
        );
    }

    #[test]
    fn test_text_limits_count_characters_not_bytes() {
        let text = "é".repeat(TEXT_MAX_CHARS);
        assert!(validate_post(None, &text).is_ok());
    }

    #[test]
    fn test_empty_comment_is_required() {
        let errors = validate_comment("").unwrap_err();
        assert_eq!(errors.get("text").unwrap()[0], "This field is required.");

        let errors = validate_comment("k").unwrap_err();
        assert_eq!(
            errors.get("text").unwrap()[0],
            "Comment must have at least 2 characters!"
        );
        assert_eq!(validate_comment("  Nice post!  ").unwrap(), "Nice post!");
    }

    #[test]
    fn test_registration_rules() {
        assert!(validate_registration("Jack", "pass1234", "pass1234").is_ok());

        let errors = validate_registration("bad name", "1234", "4321").unwrap_err();
        assert!(errors.contains("username"));
        let password_errors = errors.get("password").unwrap();
        assert_eq!(password_errors.len(), 2);
        assert_eq!(
            errors.get("password_confirm").unwrap()[0],
            "The two password fields didn't match."
        );

        let errors = validate_registration("", "", "").unwrap_err();
        assert_eq!(errors.get("username").unwrap()[0], REQUIRED);
        assert_eq!(errors.get("password").unwrap()[0], REQUIRED);
    }

    #[test]
    fn test_reserved_usernames() {
        for name in ["picture", "Picture"] {
            let errors = validate_registration(name, "pass1234", "pass1234").unwrap_err();
            assert_eq!(
                errors.get("username").unwrap()[0],
                "This username is reserved."
            );
        }
        assert!(validate_registration("pictures", "pass1234", "pass1234").is_ok());
    }

    #[test]
    fn test_picture_range() {
        assert_eq!(validate_picture(Some(0)), Ok(0));
        assert_eq!(validate_picture(Some(1)), Ok(1));
        assert_eq!(
            validate_picture(None).unwrap_err().get("picture").unwrap()[0],
            REQUIRED
        );
        assert_eq!(
            validate_picture(Some(-1)).unwrap_err().get("picture").unwrap()[0],
            "Something wrong, negative values not allowed!"
        );
        assert_eq!(
            validate_picture(Some(2)).unwrap_err().get("picture").unwrap()[0],
            "Something wrong, greater than 1 values not allowed!"
        );
    }

    proptest! {
        #[test]
        fn prop_post_text_within_bounds_is_accepted(text in "[a-zA-Z0-9 ]{0,2100}") {
            let chars = text.trim().chars().count();
            let result = validate_post(None, &text);
            prop_assert_eq!(result.is_ok(), (TEXT_MIN_CHARS..=TEXT_MAX_CHARS).contains(&chars));
        }

        #[test]
        fn prop_valid_usernames_pass(name in "[a-zA-Z0-9@.+_-]{1,150}") {
            prop_assume!(!RESERVED_USERNAMES.iter().any(|r| r.eq_ignore_ascii_case(&name)));
            prop_assert!(validate_registration(&name, "pass1234", "pass1234").is_ok());
        }

        #[test]
        fn prop_picture_accepts_only_known_indices(picture in -10i64..10) {
            prop_assert_eq!(validate_picture(Some(picture)).is_ok(), (0..=MAX_PICTURE_INDEX).contains(&picture));
        }
    }
}
