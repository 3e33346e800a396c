//! Profile and address book commands.

use std::path::Path;

use motoparts_core::AddressId;
use motoparts_storefront::AppState;
use motoparts_storefront::models::{Address, AddressInput};
use motoparts_storefront::store::ProfileInput;

use super::{CliError, field};

fn print_address(address: &Address) {
    let marker = if address.is_default { "*" } else { " " };
    let postal = address.postal_code.as_deref().unwrap_or_default();
    println!(
        "{marker} {:>6}  {:<12} {}, {} {postal}, {}",
        address.id, address.label, address.street, address.city, address.country
    );
}

/// Show or update the profile.
pub async fn profile(
    state: &AppState,
    name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
) -> Result<(), CliError> {
    let user = if name.is_none() && email.is_none() && phone.is_none() {
        state.user().fetch_profile().await?
    } else {
        state
            .user()
            .update_profile(&ProfileInput { name, email, phone })
            .await?
    };

    let user = user.ok_or(CliError::NotFound("Profile"))?;
    println!("{} <{}>", user.name, user.email);
    field("phone", user.phone.as_deref());
    println!("  avatar: {}", state.image_url(user.avatar.as_deref()));
    Ok(())
}

/// List saved addresses; `*` marks the default.
pub async fn addresses(state: &AppState) -> Result<(), CliError> {
    let addresses = state.user().fetch_addresses().await?;
    if addresses.is_empty() {
        println!("No saved addresses");
    }
    for address in &addresses {
        print_address(address);
    }
    Ok(())
}

/// Save a new address.
pub async fn add_address(state: &AppState, input: &AddressInput) -> Result<(), CliError> {
    let created = state.user().add_address(input).await?;
    if let Some(address) = &created {
        print_address(address);
    }

    // The address was created but clearing an old default failed.
    if let Some(error) = state.user().snapshot().await.request.error {
        return Err(CliError::Incomplete(error));
    }
    Ok(())
}

/// Make an address the only default.
pub async fn default_address(state: &AppState, id: String) -> Result<(), CliError> {
    let outcome = state
        .user()
        .set_default_address(&AddressId::new(id))
        .await;

    for address in &state.user().snapshot().await.addresses {
        print_address(address);
    }

    match outcome.error_message() {
        None => Ok(()),
        Some(message) => Err(CliError::Incomplete(message)),
    }
}

/// Delete an address.
pub async fn delete_address(state: &AppState, id: String) -> Result<(), CliError> {
    state.user().delete_address(&AddressId::new(id)).await?;
    println!("Address deleted");
    Ok(())
}

/// Change the password.
pub async fn password(state: &AppState, current: &str, new: &str) -> Result<(), CliError> {
    state.user().change_password(current, new).await?;
    println!("Password changed");
    Ok(())
}

/// Upload an avatar image from disk.
pub async fn avatar(state: &AppState, path: &Path) -> Result<(), CliError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let file_name = path
        .file_name()
        .map_or_else(|| "avatar".to_string(), |n| n.to_string_lossy().into_owned());

    let avatar = state.user().upload_avatar(&file_name, bytes).await?;
    println!("Avatar: {}", state.image_url(avatar.as_deref()));
    Ok(())
}
