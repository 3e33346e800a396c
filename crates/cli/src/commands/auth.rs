//! Authentication commands.

use motoparts_storefront::AppState;
use motoparts_storefront::models::User;
use motoparts_storefront::store::{RegisterInput, RegisterOutcome};

use super::{CliError, field};

fn print_user(user: &User) {
    println!("{} <{}>", user.name, user.email);
    field("id", Some(user.id.as_str()));
    field("phone", user.phone.as_deref());
    field("tier", user.membership_tier.as_deref());
    if let Some(points) = user.points {
        println!("  points: {points}");
    }
    if !user.is_verified {
        println!("  (email not verified)");
    }
}

/// Log in and persist the token.
pub async fn login(state: &AppState, email: &str, password: &str) -> Result<(), CliError> {
    match state.auth().login(email, password).await? {
        Some(user) => print_user(&user),
        None => println!("Logged in"),
    }
    Ok(())
}

/// Create an account.
pub async fn register(
    state: &AppState,
    name: String,
    email: String,
    password: String,
    phone: Option<String>,
) -> Result<(), CliError> {
    let input = RegisterInput {
        name,
        email,
        password,
        phone,
    };
    match state.auth().register(&input).await? {
        RegisterOutcome::SignedIn(user) => {
            println!("Account created and logged in");
            if let Some(user) = user {
                print_user(&user);
            }
        }
        RegisterOutcome::VerificationRequired(message) => {
            println!(
                "{}",
                message.unwrap_or_else(|| "Account created, check your inbox".to_string())
            );
        }
    }
    Ok(())
}

/// Forget the persisted session.
pub async fn logout(state: &AppState) {
    state.logout().await;
    println!("Logged out");
}

/// Show the customer behind the stored token.
pub async fn me(state: &AppState) -> Result<(), CliError> {
    let user = state
        .auth()
        .fetch_current_user()
        .await?
        .ok_or(CliError::NotFound("User"))?;
    print_user(&user);
    Ok(())
}

/// Verify an email address.
pub async fn verify(state: &AppState, token: &str) -> Result<(), CliError> {
    let message = state.auth().verify_email(token).await?;
    println!("{}", message.unwrap_or_else(|| "Email verified".to_string()));
    Ok(())
}

/// Request a password-reset mail.
pub async fn forgot(state: &AppState, email: &str) -> Result<(), CliError> {
    let message = state.auth().forgot_password(email).await?;
    println!(
        "{}",
        message.unwrap_or_else(|| "If the address exists, a reset link is on its way".to_string())
    );
    Ok(())
}

/// Set a new password with a reset token.
pub async fn reset(state: &AppState, token: &str, password: &str) -> Result<(), CliError> {
    let message = state.auth().reset_password(token, password).await?;
    println!("{}", message.unwrap_or_else(|| "Password updated".to_string()));
    Ok(())
}
