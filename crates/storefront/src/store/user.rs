//! User profile and address book store.
//!
//! # Default address
//!
//! The server keeps one `is_default` flag per address and offers no atomic
//! "make this the default" call. Changing the default is a two-phase
//! workflow:
//!
//! 1. every other address currently flagged default is unset, concurrently;
//! 2. once all of those have resolved, the target is set.
//!
//! The addresses to unset come from the server's list: when this store has
//! not loaded it yet, it is fetched before phase 1.
//!
//! Each call can fail on its own. The [`DefaultAddressOutcome`] reports what
//! went wrong, and when the change could not be confirmed the address list
//! is re-fetched so the local view follows the server instead of guessing.

use futures::future::join_all;
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{info, instrument, warn};

use motoparts_core::AddressId;

use crate::api::decode::{ResponseShape, ShapeKeys, decode_item, decode_list, decode_value};
use crate::api::{ApiClient, ApiError, Endpoint};
use crate::models::{Address, AddressInput, User};

use super::{Reducer, RequestStatus, Store};

const PROFILE_KEYS: ShapeKeys = ShapeKeys::items(&["user", "profile"]);
const ADDRESS_KEYS: ShapeKeys = ShapeKeys::both(&["addresses"], &["address"]);
const ADDRESSES_ENDPOINT: &str = "/users/addresses";

/// Profile and address slice.
#[derive(Debug, Clone, Default)]
pub struct UserState {
    pub profile: Option<User>,
    pub addresses: Vec<Address>,
    /// Whether `addresses` holds the server's list rather than only the
    /// addresses written from this session.
    pub addresses_loaded: bool,
    pub request: RequestStatus,
}

impl UserState {
    /// The address currently flagged default, if exactly one is.
    #[must_use]
    pub fn default_address(&self) -> Option<&Address> {
        let mut defaults = self.addresses.iter().filter(|a| a.is_default);
        match (defaults.next(), defaults.next()) {
            (Some(address), None) => Some(address),
            _ => None,
        }
    }

    fn default_ids_except(&self, keep: Option<&AddressId>) -> Vec<AddressId> {
        self.addresses
            .iter()
            .filter(|a| a.is_default && Some(&a.id) != keep)
            .map(|a| a.id.clone())
            .collect()
    }

    fn upsert(&mut self, address: Address) {
        match self.addresses.iter_mut().find(|a| a.id == address.id) {
            Some(existing) => *existing = address,
            None => self.addresses.push(address),
        }
    }
}

/// Actions understood by [`UserState`].
#[derive(Debug)]
pub enum UserAction {
    Pending,
    Rejected(String),
    ProfileLoaded(Option<User>),
    AvatarUpdated(Option<String>),
    AddressesLoaded(Vec<Address>),
    /// Address list fetched inside the default workflow; does not settle
    /// the request.
    AddressesSynced(Vec<Address>),
    /// Upsert; a saved default clears the flag on every other address.
    AddressSaved(Option<Address>),
    AddressRemoved(AddressId),
    /// The server confirmed these addresses are no longer default.
    ///
    /// Intermediate step of the default workflow; does not settle the request.
    DefaultsUnset(Vec<AddressId>),
    /// Every call of the default workflow succeeded.
    DefaultConfirmed(AddressId),
    /// The default workflow could not be confirmed.
    DefaultFailed {
        /// Server view of the addresses, when the re-fetch succeeded.
        resynced: Option<Vec<Address>>,
        /// Address written by the workflow, applied when not resynced.
        saved: Option<Address>,
        /// Address the server accepted as default, applied when not resynced.
        newly_default: Option<AddressId>,
        message: String,
    },
    Settled,
    Reset,
}

impl Reducer for UserState {
    type Action = UserAction;

    fn pending() -> Self::Action {
        UserAction::Pending
    }

    fn rejected(message: String) -> Self::Action {
        UserAction::Rejected(message)
    }

    fn reduce(&mut self, action: Self::Action) {
        match action {
            UserAction::Pending => self.request.start(),
            UserAction::Rejected(message) => self.request.fail(message),
            UserAction::ProfileLoaded(profile) => {
                if profile.is_some() {
                    self.profile = profile;
                }
                self.request.succeed();
            }
            UserAction::AvatarUpdated(avatar) => {
                if let (Some(profile), Some(avatar)) = (self.profile.as_mut(), avatar) {
                    profile.avatar = Some(avatar);
                }
                self.request.succeed();
            }
            UserAction::AddressesLoaded(addresses) => {
                self.addresses = addresses;
                self.addresses_loaded = true;
                self.request.succeed();
            }
            UserAction::AddressesSynced(addresses) => {
                self.addresses = addresses;
                self.addresses_loaded = true;
            }
            UserAction::AddressSaved(address) => {
                if let Some(address) = address {
                    if address.is_default {
                        for other in &mut self.addresses {
                            other.is_default = false;
                        }
                    }
                    self.upsert(address);
                }
                self.request.succeed();
            }
            UserAction::AddressRemoved(id) => {
                self.addresses.retain(|a| a.id != id);
                self.request.succeed();
            }
            UserAction::DefaultsUnset(ids) => {
                for address in &mut self.addresses {
                    if ids.contains(&address.id) {
                        address.is_default = false;
                    }
                }
            }
            UserAction::DefaultConfirmed(id) => {
                for address in &mut self.addresses {
                    address.is_default = address.id == id;
                }
                self.request.succeed();
            }
            UserAction::DefaultFailed {
                resynced,
                saved,
                newly_default,
                message,
            } => {
                if let Some(addresses) = resynced {
                    self.addresses = addresses;
                    self.addresses_loaded = true;
                } else {
                    if let Some(address) = saved {
                        self.upsert(address);
                    }
                    if let Some(id) = newly_default {
                        if let Some(address) = self.addresses.iter_mut().find(|a| a.id == id) {
                            address.is_default = true;
                        }
                    }
                }
                self.request.fail(message);
            }
            UserAction::Settled => self.request.succeed(),
            UserAction::Reset => *self = Self::default(),
        }
    }
}

/// Profile fields that may be changed. `None` fields are left as they are.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Result of [`UserStore::set_default_address`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultAddressOutcome {
    /// The address that was to become default.
    pub address_id: AddressId,
    /// Previous defaults that could not be unset, with the error message.
    pub unset_failures: Vec<(AddressId, String)>,
    /// Why setting the target failed, if it did.
    pub set_error: Option<String>,
}

impl DefaultAddressOutcome {
    /// Whether every call of the workflow succeeded.
    #[must_use]
    pub fn is_confirmed(&self) -> bool {
        self.unset_failures.is_empty() && self.set_error.is_none()
    }

    /// Combined human-readable failure, `None` when confirmed.
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        combined_error(&self.unset_failures, self.set_error.as_deref())
    }
}

fn combined_error(unset_failures: &[(AddressId, String)], set_error: Option<&str>) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();
    if let Some(error) = set_error {
        parts.push(format!("Could not set default address: {error}"));
    }
    parts.extend(
        unset_failures
            .iter()
            .map(|(id, error)| format!("Could not unset default on address {id}: {error}")),
    );
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("; "))
    }
}

// =============================================================================
// UserStore
// =============================================================================

/// Profile and address triggers.
#[derive(Clone)]
pub struct UserStore {
    api: ApiClient,
    store: Store<UserState>,
}

impl UserStore {
    /// Create an empty user store.
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            store: Store::new(UserState::default()),
        }
    }

    /// The underlying state container.
    #[must_use]
    pub const fn store(&self) -> &Store<UserState> {
        &self.store
    }

    /// Clone of the current state.
    pub async fn snapshot(&self) -> UserState {
        self.store.snapshot().await
    }

    /// Drop all local profile state without contacting the server.
    pub async fn reset_local(&self) {
        self.store.dispatch(UserAction::Reset).await;
    }

    // -------------------------------------------------------------------------
    // Profile
    // -------------------------------------------------------------------------

    /// Load the customer's profile.
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    #[instrument(skip(self))]
    pub async fn fetch_profile(&self) -> Result<Option<User>, ApiError> {
        let api = &self.api;
        let request = async {
            let body = api.get("/users/profile").await?;
            Ok(decode_item::<User>(&body, PROFILE_KEYS, "user.profile"))
        };
        self.store
            .run("user.profile", request, |user| {
                UserAction::ProfileLoaded(user.clone())
            })
            .await
    }

    /// Update name, email or phone.
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    #[instrument(skip_all)]
    pub async fn update_profile(&self, input: &ProfileInput) -> Result<Option<User>, ApiError> {
        let api = &self.api;
        let request = async {
            let body = api
                .put("/users/profile", to_json(input))
                .await?;
            Ok(decode_item::<User>(&body, PROFILE_KEYS, "user.update_profile"))
        };
        self.store
            .run("user.update_profile", request, |user| {
                UserAction::ProfileLoaded(user.clone())
            })
            .await
    }

    /// Change the account password.
    ///
    /// # Errors
    ///
    /// Returns the gateway error (for example a wrong current password).
    #[instrument(skip_all)]
    pub async fn change_password(&self, current: &str, new: &str) -> Result<(), ApiError> {
        let api = &self.api;
        let request = async {
            api.put(
                "/users/password",
                json!({ "current_password": current, "new_password": new }),
            )
            .await
            .map(|_| ())
        };
        self.store
            .run("user.change_password", request, |_| UserAction::Settled)
            .await
    }

    /// Upload a new avatar image as `multipart/form-data`.
    ///
    /// Returns the new avatar path when the server reports one.
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload_avatar(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<Option<String>, ApiError> {
        let form = Form::new().part("avatar", Part::bytes(bytes).file_name(file_name.to_string()));
        let api = &self.api;
        let request = async {
            let body = api.upload("/users/avatar", form).await?;
            Ok(avatar_from_body(&body))
        };
        self.store
            .run("user.upload_avatar", request, |avatar| {
                UserAction::AvatarUpdated(avatar.clone())
            })
            .await
    }

    // -------------------------------------------------------------------------
    // Addresses
    // -------------------------------------------------------------------------

    /// Load the address book.
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    #[instrument(skip(self))]
    pub async fn fetch_addresses(&self) -> Result<Vec<Address>, ApiError> {
        let api = &self.api;
        let request = async {
            let body = api.get(ADDRESSES_ENDPOINT).await?;
            Ok(decode_list::<Address>(&body, ADDRESS_KEYS, "user.addresses"))
        };
        self.store
            .run("user.addresses", request, |addresses| {
                UserAction::AddressesLoaded(addresses.clone())
            })
            .await
    }

    /// Create an address.
    ///
    /// With `is_default` set, current defaults are unset first. If any unset
    /// fails the created address is still returned, the address list is
    /// re-fetched, and the slice's `error` describes the failure.
    ///
    /// # Errors
    ///
    /// Returns the gateway error of the create call.
    #[instrument(skip_all, fields(is_default = input.is_default))]
    pub async fn add_address(&self, input: &AddressInput) -> Result<Option<Address>, ApiError> {
        self.write_address("user.add_address", None, input).await
    }

    /// Update an address. Setting `is_default` behaves as in
    /// [`UserStore::add_address`].
    ///
    /// # Errors
    ///
    /// Returns the gateway error of the update call.
    #[instrument(skip_all, fields(id = %id, is_default = input.is_default))]
    pub async fn update_address(
        &self,
        id: &AddressId,
        input: &AddressInput,
    ) -> Result<Option<Address>, ApiError> {
        self.write_address("user.update_address", Some(id), input)
            .await
    }

    /// Delete an address.
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    #[instrument(skip_all, fields(id = %id))]
    pub async fn delete_address(&self, id: &AddressId) -> Result<(), ApiError> {
        let api = &self.api;
        let endpoint = address_path(id);
        let request = async { api.delete(&endpoint).await.map(|_| ()) };
        self.store
            .run("user.delete_address", request, |_| {
                UserAction::AddressRemoved(id.clone())
            })
            .await
    }

    /// Make `id` the only default address.
    ///
    /// Never returns an error: the outcome lists every failed call, and the
    /// slice's `error` carries the combined message when not confirmed.
    #[instrument(skip_all, fields(id = %id))]
    pub async fn set_default_address(&self, id: &AddressId) -> DefaultAddressOutcome {
        self.store.dispatch(UserAction::Pending).await;

        if let Err(e) = self.sync_addresses().await {
            let outcome = DefaultAddressOutcome {
                address_id: id.clone(),
                unset_failures: Vec::new(),
                set_error: Some(e.to_string()),
            };
            self.store
                .dispatch(UserAction::Rejected(
                    outcome.error_message().unwrap_or_default(),
                ))
                .await;
            return outcome;
        }

        let others = self.store.read(|s| s.default_ids_except(Some(id))).await;
        let unset_failures = self.unset_defaults(&others).await;

        let set_error = match self
            .api
            .put(&address_path(id), json!({ "is_default": true }))
            .await
        {
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "Failed to set default address");
                Some(e.to_string())
            }
        };

        let outcome = DefaultAddressOutcome {
            address_id: id.clone(),
            unset_failures,
            set_error,
        };

        match outcome.error_message() {
            None => {
                self.store
                    .dispatch(UserAction::DefaultConfirmed(id.clone()))
                    .await;
                info!("Default address changed");
            }
            Some(message) => {
                let newly_default = outcome.set_error.is_none().then(|| id.clone());
                self.settle_unconfirmed(message, None, newly_default).await;
            }
        }

        outcome
    }

    async fn write_address(
        &self,
        operation: &'static str,
        id: Option<&AddressId>,
        input: &AddressInput,
    ) -> Result<Option<Address>, ApiError> {
        if !input.is_default {
            let request = self.send_address(operation, id, input);
            return self
                .store
                .run(operation, request, |address| {
                    UserAction::AddressSaved(address.clone())
                })
                .await;
        }

        self.store.dispatch(UserAction::Pending).await;

        if let Err(e) = self.sync_addresses().await {
            self.store.dispatch(UserAction::Rejected(e.to_string())).await;
            return Err(e);
        }

        let current = self.store.read(|s| s.default_ids_except(id)).await;
        let unset_failures = self.unset_defaults(&current).await;

        let saved = match self.send_address(operation, id, input).await {
            Ok(saved) => saved,
            Err(e) => {
                warn!(operation, error = %e, "Request rejected");
                self.store.dispatch(UserAction::Rejected(e.to_string())).await;
                return Err(e);
            }
        };

        match combined_error(&unset_failures, None) {
            None => {
                self.store
                    .dispatch(UserAction::AddressSaved(saved.clone()))
                    .await;
            }
            Some(message) => {
                let newly_default = saved.as_ref().map(|a| a.id.clone());
                self.settle_unconfirmed(message, saved.clone(), newly_default)
                    .await;
            }
        }

        Ok(saved)
    }

    async fn send_address(
        &self,
        operation: &'static str,
        id: Option<&AddressId>,
        input: &AddressInput,
    ) -> Result<Option<Address>, ApiError> {
        let body = to_json(input);
        let response = match id {
            Some(id) => self.api.put(&address_path(id), body).await?,
            None => self.api.post(ADDRESSES_ENDPOINT, body).await?,
        };
        Ok(decode_item::<Address>(&response, ADDRESS_KEYS, operation))
    }

    /// Load the server's address list unless this store already has it.
    async fn sync_addresses(&self) -> Result<(), ApiError> {
        if self.store.read(|s| s.addresses_loaded).await {
            return Ok(());
        }

        let body = self.api.get(ADDRESSES_ENDPOINT).await.inspect_err(|e| {
            warn!(error = %e, "Could not load addresses before changing the default");
        })?;
        let addresses = decode_list::<Address>(&body, ADDRESS_KEYS, "user.addresses");
        self.store
            .dispatch(UserAction::AddressesSynced(addresses))
            .await;
        Ok(())
    }

    /// Phase 1: unset every listed default concurrently.
    ///
    /// Successes are applied locally as soon as all calls resolve; failures
    /// are returned.
    async fn unset_defaults(&self, ids: &[AddressId]) -> Vec<(AddressId, String)> {
        if ids.is_empty() {
            return Vec::new();
        }

        let results = join_all(ids.iter().map(|other| async move {
            let result = self
                .api
                .put(&address_path(other), json!({ "is_default": false }))
                .await;
            (other.clone(), result)
        }))
        .await;

        let mut unset = Vec::new();
        let mut failures = Vec::new();
        for (other, result) in results {
            match result {
                Ok(_) => unset.push(other),
                Err(e) => {
                    warn!(address_id = %other, error = %e, "Failed to unset default address");
                    failures.push((other, e.to_string()));
                }
            }
        }

        if !unset.is_empty() {
            self.store.dispatch(UserAction::DefaultsUnset(unset)).await;
        }
        failures
    }

    /// Close an unconfirmed default workflow, preferring the server's view.
    async fn settle_unconfirmed(
        &self,
        message: String,
        saved: Option<Address>,
        newly_default: Option<AddressId>,
    ) {
        warn!(message = %message, "Default address change not confirmed, re-fetching addresses");

        let resynced = match self.api.get(ADDRESSES_ENDPOINT).await {
            Ok(body) => Some(decode_list::<Address>(&body, ADDRESS_KEYS, "user.addresses")),
            Err(e) => {
                warn!(error = %e, "Address re-fetch failed, keeping confirmed changes only");
                None
            }
        };

        self.store
            .dispatch(UserAction::DefaultFailed {
                resynced,
                saved,
                newly_default,
                message,
            })
            .await;
    }
}

fn address_path(id: &AddressId) -> Endpoint {
    Endpoint::new(ADDRESSES_ENDPOINT).push(id)
}

fn to_json<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_default()
}

/// The avatar path from an upload response: either a full user record or
/// a bare `{ "avatar": "..." }` / `{ "avatar_url": "..." }`.
fn avatar_from_body(body: &Value) -> Option<String> {
    let shape = ResponseShape::classify(body, PROFILE_KEYS);
    if let Some(user) = shape.as_item().and_then(|v| decode_value::<User>(v, "user.avatar")) {
        return user.avatar;
    }
    let inner = crate::api::decode::unwrap_envelope(body);
    ["avatar", "avatar_url", "url"]
        .iter()
        .find_map(|key| inner.get(key).and_then(Value::as_str))
        .map(str::to_string)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn address(id: &str, is_default: bool) -> Address {
        Address {
            id: AddressId::new(id),
            label: id.to_uppercase(),
            street: "1 Main St".to_string(),
            city: "Leeds".to_string(),
            country: "GB".to_string(),
            postal_code: None,
            is_default,
        }
    }

    fn defaults(state: &UserState) -> Vec<&str> {
        state
            .addresses
            .iter()
            .filter(|a| a.is_default)
            .map(|a| a.id.as_str())
            .collect()
    }

    #[test]
    fn test_default_confirmed_leaves_exactly_one() {
        let mut state = UserState {
            addresses: vec![address("a", true), address("b", false), address("c", true)],
            ..UserState::default()
        };
        state.reduce(UserAction::Pending);
        state.reduce(UserAction::DefaultsUnset(vec![AddressId::new("a")]));
        assert!(state.request.is_loading);
        state.reduce(UserAction::DefaultConfirmed(AddressId::new("b")));

        assert_eq!(defaults(&state), vec!["b"]);
        assert_eq!(state.default_address().map(|a| a.id.as_str()), Some("b"));
        assert!(!state.request.is_loading);
    }

    #[test]
    fn test_default_failed_without_resync_applies_only_successes() {
        let mut state = UserState {
            addresses: vec![address("a", true), address("b", false), address("c", true)],
            ..UserState::default()
        };
        state.reduce(UserAction::Pending);
        // "a" unset succeeded, "c" failed, the set on "b" succeeded.
        state.reduce(UserAction::DefaultsUnset(vec![AddressId::new("a")]));
        state.reduce(UserAction::DefaultFailed {
            resynced: None,
            saved: None,
            newly_default: Some(AddressId::new("b")),
            message: "Could not unset default on address c: Conflict".to_string(),
        });

        assert_eq!(defaults(&state), vec!["b", "c"]);
        assert!(state.default_address().is_none());
        assert!(state.request.error.is_some());
    }

    #[test]
    fn test_default_failed_with_resync_uses_server_view() {
        let mut state = UserState {
            addresses: vec![address("a", true), address("b", false)],
            ..UserState::default()
        };
        state.reduce(UserAction::DefaultFailed {
            resynced: Some(vec![address("a", true), address("b", false)]),
            saved: None,
            newly_default: None,
            message: "Could not set default address: Address not found".to_string(),
        });
        assert_eq!(defaults(&state), vec!["a"]);
        assert_eq!(
            state.request.error.as_deref(),
            Some("Could not set default address: Address not found")
        );
    }

    #[test]
    fn test_address_list_loaded_flag() {
        let mut state = UserState::default();
        assert!(!state.addresses_loaded);

        // A write alone does not make the list the server's.
        state.reduce(UserAction::AddressSaved(Some(address("a", false))));
        assert!(!state.addresses_loaded);

        state.reduce(UserAction::Pending);
        state.reduce(UserAction::AddressesSynced(vec![address("a", true), address("b", false)]));
        assert!(state.addresses_loaded);
        assert!(state.request.is_loading);
        assert_eq!(state.default_ids_except(Some(&AddressId::new("b"))), vec![AddressId::new("a")]);

        state.reduce(UserAction::Reset);
        assert!(!state.addresses_loaded);

        state.reduce(UserAction::AddressesLoaded(Vec::new()));
        assert!(state.addresses_loaded);
    }

    #[test]
    fn test_saved_default_clears_others() {
        let mut state = UserState {
            addresses: vec![address("a", true)],
            ..UserState::default()
        };
        state.reduce(UserAction::AddressSaved(Some(address("b", true))));
        assert_eq!(defaults(&state), vec!["b"]);
        assert_eq!(state.addresses.len(), 2);
    }

    #[test]
    fn test_outcome_message() {
        let confirmed = DefaultAddressOutcome {
            address_id: AddressId::new("b"),
            unset_failures: Vec::new(),
            set_error: None,
        };
        assert!(confirmed.is_confirmed());
        assert!(confirmed.error_message().is_none());

        let partial = DefaultAddressOutcome {
            address_id: AddressId::new("b"),
            unset_failures: vec![(AddressId::new("a"), "Conflict".to_string())],
            set_error: Some("Address not found".to_string()),
        };
        assert!(!partial.is_confirmed());
        assert_eq!(
            partial.error_message().unwrap(),
            "Could not set default address: Address not found; \
             Could not unset default on address a: Conflict"
        );
    }

    #[test]
    fn test_avatar_from_body() {
        assert_eq!(
            avatar_from_body(&json!({"user": {"id": 1, "avatar": "/uploads/a.png"}})),
            Some("/uploads/a.png".to_string())
        );
        assert_eq!(
            avatar_from_body(&json!({"avatar_url": "b.png"})),
            Some("b.png".to_string())
        );
        assert_eq!(avatar_from_body(&json!({"success": true})), None);
    }
}
