use std::sync::Arc;

use sqlx::PgPool;

use crate::geo::Geocoder;
use crate::mail::MailboxStore;
use crate::uploads::PhotoStore;

/// Shared handler dependencies. The geocoder and mailbox sit behind trait
/// objects so tests can swap them without a network or a database.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub geocoder: Arc<dyn Geocoder>,
    pub mailbox: Arc<dyn MailboxStore>,
    pub photos: PhotoStore,
}
