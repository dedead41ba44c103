use axum::{routing::get, Router};

use petclinic_core::OwnerId;
use petclinic_owners::Owner;

use crate::app::errors::AppError;
use crate::app::services::AppServices;

pub mod owners;
pub mod pets;
pub mod system;
pub mod vets;
pub mod visits;

/// Router for every endpoint.
pub fn router() -> Router {
    Router::new()
        .route("/", get(system::welcome))
        .route("/health", get(system::health))
        .route("/owners", get(owners::process_find_form))
        .route("/owners/find", get(owners::init_find_form))
        .route(
            "/owners/new",
            get(owners::init_creation_form).post(owners::process_creation_form),
        )
        .route("/owners/:owner_id", get(owners::show_owner))
        .route(
            "/owners/:owner_id/edit",
            get(owners::init_update_form).post(owners::process_update_form),
        )
        .route(
            "/owners/:owner_id/pets/new",
            get(pets::init_creation_form).post(pets::process_creation_form),
        )
        .route(
            "/owners/:owner_id/pets/:pet_id/edit",
            get(pets::init_update_form).post(pets::process_update_form),
        )
        .route(
            "/owners/:owner_id/pets/:pet_id/visits/new",
            get(visits::init_new_visit_form).post(visits::process_new_visit_form),
        )
        .route("/vets.html", get(vets::show_vet_list))
        .route("/vets", get(vets::show_resources_vet_list))
}

/// Load the owner named by a path segment, or answer 404.
pub(crate) async fn load_owner(services: &AppServices, raw_id: &str) -> Result<Owner, AppError> {
    let id: OwnerId = raw_id.parse()?;
    services
        .owners
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("owner {id}")))
}
