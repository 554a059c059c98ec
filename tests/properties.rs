use pgstate::model::{Flag, Password};
use pgstate::password::postgresql_password;
use proptest::prelude::*;

proptest! {
    #[test]
    fn hash_is_md5_prefixed_lowercase_hex(username in ".{0,32}", password in ".{0,64}") {
        let hash = postgresql_password(&username, &password);
        prop_assert_eq!(hash.len(), 35);
        prop_assert!(hash.starts_with("md5"));
        prop_assert!(hash[3..].chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')));
    }

    #[test]
    fn every_generated_hash_is_a_valid_password(username in "[a-z_]{1,16}", password in ".{0,64}") {
        let hash = postgresql_password(&username, &password);
        prop_assert_eq!(Password::parse(&hash).unwrap(), Password::Hash(hash));
    }

    #[test]
    fn plain_text_passwords_are_refused(password in "[^m].{0,31}") {
        prop_assume!(password != "absent");
        prop_assert!(Password::parse(&password).is_err());
    }

    #[test]
    fn only_boolean_tokens_parse(token in "[a-zA-Z0-9]{0,8}") {
        let parsed = Flag::parse("login", &token);
        match token.as_str() {
            "true" | "yes" => prop_assert_eq!(parsed.unwrap(), Flag::True),
            "false" | "no" => prop_assert_eq!(parsed.unwrap(), Flag::False),
            _ => prop_assert!(parsed.is_err()),
        }
    }
}
