use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("Password hashing failed: {0}")]
pub struct PasswordHashError(String);

/// Argon2id PHC string for storage
pub fn hash_password(password: &str) -> Result<String, PasswordHashError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordHashError(e.to_string()))
}

/// False for a wrong password and for anything that is not a PHC hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok(),
        Err(_) => false,
    }
}

const MAX_SIMILARITY: f64 = 0.7;

/// User attributes a password must not resemble
#[derive(Debug, Default, Clone, Copy)]
pub struct UserAttributes<'a> {
    pub username: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
}

impl<'a> UserAttributes<'a> {
    fn labelled(&self) -> [(&'static str, &'a str); 4] {
        [
            ("username", self.username),
            ("first name", self.first_name),
            ("last name", self.last_name),
            ("email address", self.email),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    pub min_length: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self { min_length: 8 }
    }
}

impl PasswordPolicy {
    pub fn new(min_length: usize) -> Self {
        Self { min_length }
    }

    /// Every rule the password breaks, in check order
    pub fn validate(&self, password: &str, user: &UserAttributes<'_>) -> Result<(), Vec<String>> {
        let mut problems = Vec::new();

        if let Some(attribute) = too_similar(password, user) {
            problems.push(format!("The password is too similar to the {}.", attribute));
        }
        if password.chars().count() < self.min_length {
            problems.push(format!(
                "This password is too short. It must contain at least {} characters.",
                self.min_length
            ));
        }
        if is_common(password) {
            problems.push("This password is too common.".to_string());
        }
        if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
            problems.push("This password is entirely numeric.".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems)
        }
    }
}

fn too_similar(password: &str, user: &UserAttributes<'_>) -> Option<&'static str> {
    let password: Vec<char> = password.to_lowercase().chars().collect();

    for (label, value) in user.labelled() {
        if value.is_empty() {
            continue;
        }
        let value = value.to_lowercase();
        let mut parts: Vec<&str> = value
            .split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .filter(|p| !p.is_empty())
            .collect();
        parts.push(&value);

        for part in parts {
            let part: Vec<char> = part.chars().collect();
            if exceeds_length_ratio(password.len(), part.len()) {
                continue;
            }
            if similarity_ratio(&password, &part) >= MAX_SIMILARITY {
                return Some(label);
            }
        }
    }
    None
}

// Short attribute parts can't meaningfully match a much longer password
fn exceeds_length_ratio(password_len: usize, part_len: usize) -> bool {
    let bound = MAX_SIMILARITY / 2.0 * password_len as f64;
    password_len >= 10 * part_len && (part_len as f64) < bound
}

/// Ratcliff/Obershelp ratio: 2*M / T over recursively matched blocks
pub fn similarity_ratio(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_characters(a, b) as f64 / total as f64
}

fn matching_characters(a: &[char], b: &[char]) -> usize {
    let mut positions: HashMap<char, Vec<usize>> = HashMap::new();
    for (j, c) in b.iter().enumerate() {
        positions.entry(*c).or_default().push(j);
    }

    let mut matched = 0;
    let mut queue = vec![(0, a.len(), 0, b.len())];
    while let Some((alo, ahi, blo, bhi)) = queue.pop() {
        let (i, j, k) = longest_match(a, &positions, alo, ahi, blo, bhi);
        if k == 0 {
            continue;
        }
        matched += k;
        if alo < i && blo < j {
            queue.push((alo, i, blo, j));
        }
        if i + k < ahi && j + k < bhi {
            queue.push((i + k, ahi, j + k, bhi));
        }
    }
    matched
}

// Leftmost longest common block of a[alo..ahi] and b[blo..bhi]
fn longest_match(
    a: &[char],
    positions: &HashMap<char, Vec<usize>>,
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_k) = (alo, blo, 0);
    let mut run: HashMap<usize, usize> = HashMap::new();

    for (i, c) in a.iter().enumerate().take(ahi).skip(alo) {
        let mut next_run = HashMap::new();
        if let Some(js) = positions.get(c) {
            for &j in js.iter().filter(|&&j| j >= blo && j < bhi) {
                let k = j.checked_sub(1).and_then(|p| run.get(&p)).copied().unwrap_or(0) + 1;
                next_run.insert(j, k);
                if k > best_k {
                    best_i = i + 1 - k;
                    best_j = j + 1 - k;
                    best_k = k;
                }
            }
        }
        run = next_run;
    }
    (best_i, best_j, best_k)
}

fn is_common(password: &str) -> bool {
    let lowered = password.trim().to_lowercase();
    COMMON_PASSWORDS.contains(&lowered.as_str())
}

static COMMON_PASSWORDS: &[&str] = &[
    "123456", "password", "12345678", "qwerty", "123456789", "12345", "1234", "111111",
    "1234567", "dragon", "123123", "baseball", "abc123", "football", "monkey", "letmein",
    "696969", "shadow", "master", "666666", "qwertyuiop", "123321", "mustang", "1234567890",
    "michael", "654321", "superman", "1qaz2wsx", "7777777", "121212", "000000", "qazwsx",
    "123qwe", "killer", "trustno1", "jordan", "jennifer", "zxcvbnm", "asdfgh", "hunter",
    "buster", "soccer", "harley", "batman", "andrew", "tigger", "sunshine", "iloveyou",
    "2000", "charlie", "robert", "thomas", "hockey", "ranger", "daniel", "starwars",
    "klaster", "112233", "george", "computer", "michelle", "jessica", "pepper", "1111",
    "zxcvbn", "555555", "11111111", "131313", "freedom", "777777", "pass", "maggie",
    "159753", "aaaaaa", "ginger", "princess", "joshua", "cheese", "amanda", "summer",
    "love", "ashley", "nicole", "chelsea", "biteme", "matthew", "access", "yankees",
    "987654321", "dallas", "austin", "thunder", "taylor", "matrix", "mobilemail", "mom",
    "monitor", "monitoring", "montana", "moon", "moscow", "passw0rd", "password1",
    "password123", "welcome", "welcome1", "admin", "admin123", "administrator", "qwerty123",
    "qwerty1", "1q2w3e4r", "1q2w3e4r5t", "zaq12wsx", "q1w2e3r4", "asdfghjkl", "asdf1234",
    "abcd1234", "abcdef", "abcdefg", "abcdefgh", "football1", "baseball1", "iloveyou1",
    "princess1", "sunshine1", "letmein1", "changeme", "secret", "default", "guest",
    "login", "test", "test123", "testing", "root", "toor", "p@ssw0rd", "p@ssword",
    "samsung", "whatever", "starwars1", "dragon1", "master1", "hello", "hello123",
    "freedom1", "trustme", "superman1", "batman1", "letmein123", "00000000", "88888888",
    "99999999", "12341234", "11223344", "87654321", "qwer1234", "1234qwer", "indonesia",
    "jakarta", "bismillah", "sayang", "rahasia", "katasandi",
];

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    fn attrs() -> UserAttributes<'static> {
        UserAttributes {
            username: "budi.santoso",
            first_name: "Budi",
            last_name: "Santoso",
            email: "budi@example.co.id",
        }
    }

    #[test]
    fn hashes_and_verifies() {
        let hash = hash_password("Str0ng-Passphrase").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("Str0ng-Passphrase", &hash));
        assert!(!verify_password("wrong", &hash));
        assert!(!verify_password("anything", "not-a-hash"));
    }

    #[test]
    fn ratio_matches_sequence_matcher() {
        assert_eq!(similarity_ratio(&chars("abcd"), &chars("bcde")), 0.75);
        assert_eq!(similarity_ratio(&chars(""), &chars("")), 1.0);
        assert_eq!(similarity_ratio(&chars("abc"), &chars("xyz")), 0.0);
        assert_eq!(similarity_ratio(&chars("santoso"), &chars("santoso")), 1.0);
    }

    #[test]
    fn accepts_a_strong_password() {
        assert!(PasswordPolicy::default().validate("Kopi-Tubruk-2025", &attrs()).is_ok());
    }

    #[test]
    fn rejects_short_numeric_and_common() {
        let policy = PasswordPolicy::default();
        let errors = policy.validate("1234567", &attrs()).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("too short")));
        assert!(errors.iter().any(|e| e.contains("too common")));
        assert!(errors.iter().any(|e| e.contains("entirely numeric")));

        let errors = policy.validate("PassWord", &attrs()).unwrap_err();
        assert_eq!(errors, vec!["This password is too common.".to_string()]);
    }

    #[test]
    fn rejects_passwords_close_to_user_attributes() {
        let errors = PasswordPolicy::default().validate("santoso1", &attrs()).unwrap_err();
        assert_eq!(errors, vec!["The password is too similar to the username.".to_string()]);
    }

    #[test]
    fn skips_short_parts_against_long_passwords() {
        // "co" and "id" from the email are too short to count against this password
        assert!(exceeds_length_ratio(30, 2));
        assert!(!exceeds_length_ratio(8, 2));
        assert!(PasswordPolicy::default()
            .validate("correct-horse-battery-staple-id", &attrs())
            .is_ok());
    }

    #[test]
    fn min_length_is_configurable() {
        let policy = PasswordPolicy::new(12);
        let errors = policy.validate("Kopi-Tubruk", &UserAttributes::default()).unwrap_err();
        assert_eq!(
            errors,
            vec!["This password is too short. It must contain at least 12 characters.".to_string()]
        );
    }
}
