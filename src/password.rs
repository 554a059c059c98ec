//! PostgreSQL `md5` password hashing for authoring manifests.

use md5::{Digest, Md5};

/// Computes the salted hash PostgreSQL stores for `username`'s `password`.
///
/// The digest input is the password followed by the username, hex encoded and
/// prefixed with `md5`.
pub fn postgresql_password(username: &str, password: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(password.as_bytes());
    hasher.update(username.as_bytes());
    format!("md5{}", hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Password;

    #[test]
    fn returns_the_salted_hash() {
        assert_eq!(
            postgresql_password("postgres", "foobar"),
            "md5d5d2b7621f9dfa5d09376c9c966bf109"
        );
        assert_eq!(
            postgresql_password("puppetdbuser", "puppetdb"),
            "md5f73f3746cf0e20f69818d85e3908e7e3"
        );
    }

    #[test]
    fn hash_is_accepted_as_desired_password() {
        let hash = postgresql_password("app", "s3cret");
        assert_eq!(Password::parse(&hash).unwrap(), Password::Hash(hash));
    }

    #[test]
    fn username_salts_the_digest() {
        assert_ne!(
            postgresql_password("alice", "same"),
            postgresql_password("bob", "same")
        );
    }
}
