use std::sync::Arc;
use carpool_shared::Masked;
use chrono::Utc;
use tracing::{info, instrument, warn};
use crate::hashing::PasswordHasher;
use crate::repository::UserRepository;
use crate::user::{LoginRequest, RegisterRequest, UserProfile, UserRecord};
use crate::validate::Required;
use crate::{CoreError, CoreResult};

/// Registration and password login.
#[derive(Clone)]
pub struct CredentialService {
    users: Arc<dyn UserRepository>,
    hasher: PasswordHasher,
}

impl CredentialService {
    pub fn new(users: Arc<dyn UserRepository>, hasher: PasswordHasher) -> Self {
        Self { users, hasher }
    }

    #[instrument(name = "credentials::register", skip_all, err(Display))]
    pub async fn register(&self, req: RegisterRequest) -> CoreResult<UserProfile> {
        let mut required = Required::new();
        let student_id = required.take("studentId", req.student_id);
        let full_name = required.take("fullName", req.full_name);
        let phone_number = required.take("phoneNumber", req.phone_number.map(Masked::into_inner));
        let email = required.take("email", req.email);
        // Passwords are not trimmed; only blankness counts as missing.
        let password = req.password.map(Masked::into_inner);
        required.take("password", password.clone());
        required.finish()?;
        let password = Masked(password.unwrap_or_default());

        let password_hash = self.hasher.hash(password).await?;
        let record = UserRecord {
            student_id,
            full_name,
            phone_number,
            email,
            password_hash: Masked(password_hash),
            created_at: Utc::now(),
        };

        self.users.insert_user(&record).await?;
        info!(student_id = %record.student_id, "User registered");

        Ok(record.into())
    }

    /// Unknown email and wrong password fail identically, in similar time.
    #[instrument(name = "credentials::login", skip_all, err(Display))]
    pub async fn login(&self, req: LoginRequest) -> CoreResult<UserProfile> {
        let mut required = Required::new();
        let email = required.take("email", req.email);
        let password = req.password.map(Masked::into_inner);
        required.take("password", password.clone());
        required.finish()?;
        let password = Masked(password.unwrap_or_default());

        let Some(record) = self.users.find_user_by_email(&email).await? else {
            self.hasher.verify_decoy(password).await?;
            warn!("Login attempt for unknown email");
            return Err(CoreError::InvalidCredentials);
        };

        if !self.hasher.verify(password, record.password_hash.clone()).await? {
            warn!(student_id = %record.student_id, "Login with wrong password");
            return Err(CoreError::InvalidCredentials);
        }

        info!(student_id = %record.student_id, "User logged in");
        Ok(record.into())
    }
}
