//! Owner accounts: signup and credential checks.

use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use rand_core::OsRng;
use sqlx::SqlitePool;

use crate::{
    error::{AppError, AppResult},
    models::{BarbershopSize, Owner, OwnerRow, Plan, PlanStatus},
    store,
};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    pub username: String,
    pub barbershop_size: BarbershopSize,
    pub plan: Plan,
}

pub fn hash_password(password: &str) -> Result<String, password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(hash) => Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok(),
        Err(_) => false,
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub async fn create_account(pool: &SqlitePool, account: NewAccount) -> AppResult<Owner> {
    let email = normalize_email(&account.email);
    if find_row_by_email(pool, &email).await?.is_some() {
        return Err(AppError::Auth(
            "An account with this email already exists".to_string(),
        ));
    }

    let password_hash = hash_password(&account.password)
        .map_err(|err| AppError::Auth(format!("Could not secure password: {err}")))?;
    let row = OwnerRow {
        id: store::new_id(),
        email,
        username: account.username.trim().to_string(),
        barbershop_size: account.barbershop_size.as_str().to_string(),
        plan: account.plan.as_str().to_string(),
        plan_status: PlanStatus::Inactive.as_str().to_string(),
        password_hash,
        created_at: store::timestamp(&Utc::now()),
    };

    let inserted = sqlx::query(
        r#"INSERT INTO owners
           (id, email, username, barbershop_size, plan, plan_status, password_hash, created_at)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&row.id)
    .bind(&row.email)
    .bind(&row.username)
    .bind(&row.barbershop_size)
    .bind(&row.plan)
    .bind(&row.plan_status)
    .bind(&row.password_hash)
    .bind(&row.created_at)
    .execute(pool)
    .await;

    match inserted {
        Ok(_) => {}
        // Lost a race with a concurrent signup for the same email.
        Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
            return Err(AppError::Auth(
                "An account with this email already exists".to_string(),
            ));
        }
        Err(err) => return Err(err.into()),
    }

    log::info!("Created account {} ({})", row.id, row.email);
    Owner::try_from(&row)
}

pub async fn sign_in(pool: &SqlitePool, email: &str, password: &str) -> AppResult<Owner> {
    let row = find_row_by_email(pool, &normalize_email(email))
        .await?
        .ok_or_else(|| AppError::Auth(INVALID_CREDENTIALS.to_string()))?;
    if !verify_password(password, &row.password_hash) {
        return Err(AppError::Auth(INVALID_CREDENTIALS.to_string()));
    }
    Owner::try_from(&row)
}

pub async fn find_owner(pool: &SqlitePool, id: &str) -> AppResult<Option<Owner>> {
    let row = sqlx::query_as::<_, OwnerRow>(
        r#"SELECT id, email, username, barbershop_size, plan, plan_status, password_hash, created_at
           FROM owners
           WHERE id = ?
           LIMIT 1"#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    row.as_ref().map(Owner::try_from).transpose()
}

async fn find_row_by_email(pool: &SqlitePool, email: &str) -> Result<Option<OwnerRow>, sqlx::Error> {
    sqlx::query_as::<_, OwnerRow>(
        r#"SELECT id, email, username, barbershop_size, plan, plan_status, password_hash, created_at
           FROM owners
           WHERE email = ?
           LIMIT 1"#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await
}

#[cfg(test)]
pub(crate) fn sample_account(email: &str) -> NewAccount {
    NewAccount {
        email: email.to_string(),
        password: "s3cret-pass".to_string(),
        username: "navalha".to_string(),
        barbershop_size: BarbershopSize::Small,
        plan: Plan::Cloud,
    }
}
