pub mod jwt;
pub mod password;

pub use jwt::{bearer_token, Claims, JwtManager, TokenError, TokenType};
pub use password::{hash_password, verify_password, PasswordHashError, PasswordPolicy, UserAttributes};
