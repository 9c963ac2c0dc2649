//! Tests for the user identity primitives.

use super::*;
use rstest::rstest;
use serde_json::json;

const VALID_ID: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";

#[rstest]
#[case("", UserValidationError::EmptyId)]
#[case("not-a-uuid", UserValidationError::InvalidId)]
#[case(" 3fa85f64-5717-4562-b3fc-2c963f66afa6", UserValidationError::InvalidId)]
fn user_id_rejects_malformed_input(#[case] raw: &str, #[case] expected: UserValidationError) {
    let err = UserId::new(raw).expect_err("malformed id must fail");
    assert_eq!(err, expected);
}

#[rstest]
fn user_id_round_trips_through_serde() {
    let id: UserId = serde_json::from_value(json!(VALID_ID)).expect("id decodes");
    assert_eq!(id.as_ref(), VALID_ID);
    assert_eq!(serde_json::to_value(&id).expect("id encodes"), json!(VALID_ID));
}

#[rstest]
#[case("", UserValidationError::EmptyEmail)]
#[case("   ", UserValidationError::EmptyEmail)]
#[case("no-at-sign", UserValidationError::InvalidEmail)]
#[case("two@@example.com", UserValidationError::InvalidEmail)]
#[case("missing@tld", UserValidationError::InvalidEmail)]
fn email_rejects_malformed_input(#[case] raw: &str, #[case] expected: UserValidationError) {
    let err = Email::new(raw).expect_err("malformed email must fail");
    assert_eq!(err, expected);
}

#[rstest]
fn email_is_trimmed() {
    let email = Email::new("  vet@clinic.example  ").expect("valid email");
    assert_eq!(email.as_ref(), "vet@clinic.example");
}

#[rstest]
#[case("María José")]
#[case("Ana")]
#[case("O'Brien-Smith")]
fn display_name_accepts_any_script(#[case] raw: &str) {
    let name = DisplayName::new(raw).expect("valid display name");
    assert_eq!(name.as_ref(), raw);
}

#[rstest]
fn display_name_rejects_blank_and_overlong_values() {
    assert_eq!(
        DisplayName::new("   ").expect_err("blank"),
        UserValidationError::EmptyDisplayName
    );
    assert_eq!(
        DisplayName::new("x".repeat(DISPLAY_NAME_MAX + 1)).expect_err("too long"),
        UserValidationError::DisplayNameTooLong {
            max: DISPLAY_NAME_MAX
        }
    );
}

#[rstest]
#[case("owner", Role::Owner)]
#[case(" Staff ", Role::Staff)]
#[case("ADMIN", Role::Admin)]
#[case("groomer", Role::Other("groomer".to_owned()))]
fn role_parses_known_and_unknown_names(#[case] raw: &str, #[case] expected: Role) {
    assert_eq!(Role::from(raw), expected);
}

#[rstest]
fn role_serialises_as_plain_string() {
    let role: Role = serde_json::from_value(json!("owner")).expect("role decodes");
    assert_eq!(role, Role::Owner);
    assert_eq!(
        serde_json::to_value(Role::Other("groomer".to_owned())).expect("role encodes"),
        json!("groomer")
    );
}

#[rstest]
fn authority_values_bypass_input_checks() {
    assert_eq!(Email::issued("admin@localhost").as_ref(), "admin@localhost");
    let long = "x".repeat(DISPLAY_NAME_MAX + 1);
    assert_eq!(DisplayName::stored(long.clone()).as_ref(), long);
}
