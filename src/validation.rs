//! Input validators shared by the API and the CLI.
//!
//! Validators return the client-facing message on failure; callers collect
//! them per field in [`FieldErrors`], which converts into a 400 response.

use std::collections::HashMap;
use std::path::Path;

pub const REQUIRED: &str = "This field is required.";
pub const MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;
pub const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Field length limits
pub mod limits {
    pub const DIVISION_NAME: usize = 100;
    pub const DIVISION_CODE: usize = 20;
    pub const EMPLOYEE_ID: usize = 20;
    pub const PHONE: usize = 15;
    pub const USERNAME: usize = 150;
    pub const PERSON_NAME: usize = 150;
    pub const EMAIL: usize = 254;
}

/// Per-field validation messages; the first message recorded for a field wins.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FieldErrors {
    errors: HashMap<String, String>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors.entry(field.to_string()).or_insert_with(|| message.into());
    }

    pub fn has(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Record a required-field error when the value is missing or blank.
    /// Returns the trimmed value when present.
    pub fn require<'a>(&mut self, field: &str, value: Option<&'a str>) -> Option<&'a str> {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => Some(v),
            _ => {
                self.add(field, REQUIRED);
                None
            }
        }
    }

    pub fn check_max_length(&mut self, field: &str, value: &str, max: usize) {
        if value.chars().count() > max {
            self.add(field, format!("Ensure this field has no more than {} characters.", max));
        }
    }

    pub fn check(&mut self, field: &str, result: Result<(), String>) {
        if let Err(message) = result {
            self.add(field, message);
        }
    }

    pub fn merge(&mut self, other: FieldErrors) {
        for (field, message) in other.errors {
            self.errors.entry(field).or_insert(message);
        }
    }

    /// Top-level message: the lone field message, or a generic one for several.
    pub fn summary(&self) -> String {
        match self.errors.len() {
            1 => self.errors.values().next().cloned().unwrap_or_default(),
            _ => "Validation failed".to_string(),
        }
    }

    pub fn into_map(self) -> HashMap<String, String> {
        self.errors
    }

    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl From<(&str, String)> for FieldErrors {
    fn from((field, message): (&str, String)) -> Self {
        let mut errors = FieldErrors::new();
        errors.add(field, message);
        errors
    }
}

/// Empty is accepted; otherwise 10-15 digits starting with 08 or 62.
pub fn validate_phone(phone: &str) -> Result<(), String> {
    if phone.trim().is_empty() {
        return Ok(());
    }

    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    if !(10..=15).contains(&digits.len()) {
        return Err("Phone number must be 10-15 digits".to_string());
    }
    if !(digits.starts_with("08") || digits.starts_with("62")) {
        return Err("Phone number must start with 08 or 62".to_string());
    }
    Ok(())
}

pub fn validate_image(file_name: &str, size: u64) -> Result<(), String> {
    if size > MAX_IMAGE_BYTES {
        return Err("File size cannot exceed 5MB".to_string());
    }

    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    if !IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        return Err("Only JPG, JPEG, PNG allowed".to_string());
    }
    Ok(())
}

/// Uppercased division code; hyphens and underscores are the only separators allowed.
pub fn normalize_division_code(code: &str) -> Result<String, String> {
    let code = code.trim();
    let stripped: String = code.chars().filter(|c| *c != '-' && *c != '_').collect();

    if stripped.is_empty() || !stripped.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err("Code may only contain letters, numbers, hyphens and underscores".to_string());
    }
    Ok(code.to_ascii_uppercase())
}

pub fn validate_email(email: &str) -> Result<(), String> {
    const INVALID: &str = "Enter a valid email address.";

    let email = email.trim();
    let (local, domain) = email.split_once('@').ok_or_else(|| INVALID.to_string())?;

    if local.is_empty() || domain.contains('@') || local.chars().any(char::is_whitespace) {
        return Err(INVALID.to_string());
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|label| label.is_empty() || label.chars().any(char::is_whitespace)) {
        return Err(INVALID.to_string());
    }
    Ok(())
}
