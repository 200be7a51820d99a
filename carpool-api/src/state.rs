use std::sync::Arc;
use carpool_core::repository::StoreHealth;
use carpool_core::{
    BookingEngine, CredentialService, ListingService, PasswordHasher, Repositories, RideCatalog,
};

/// Services shared by every handler. Cloning is cheap; all members hold `Arc`s.
#[derive(Clone)]
pub struct AppState {
    pub credentials: CredentialService,
    pub catalog: RideCatalog,
    pub bookings: BookingEngine,
    pub listing: ListingService,
    pub health: Arc<dyn StoreHealth>,
}

impl AppState {
    pub fn new(repos: Repositories, hasher: PasswordHasher) -> Self {
        Self {
            credentials: CredentialService::new(repos.users.clone(), hasher),
            catalog: RideCatalog::new(repos.rides.clone()),
            bookings: BookingEngine::new(repos.rides.clone(), repos.bookings.clone()),
            listing: ListingService::new(repos.bookings),
            health: repos.health,
        }
    }
}
