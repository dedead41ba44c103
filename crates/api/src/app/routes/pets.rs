use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    response::Response,
    Form,
};

use petclinic_core::validation::codes;
use petclinic_core::{Entity, Errors, PetId, Validate};
use petclinic_owners::{Owner, Pet, PetType};

use crate::app::dto::{self, PetForm};
use crate::app::errors::AppError;
use crate::app::routes::load_owner;
use crate::app::services::AppServices;
use crate::app::view::{Outcome, View};

const CREATE_OR_UPDATE_PET_FORM: &str = "pets/createOrUpdatePetForm";

fn pet_form(owner: &Owner, pet: &Pet, types: &[PetType], errors: Errors) -> Outcome {
    View::new(CREATE_OR_UPDATE_PET_FORM)
        .with("owner", dto::owner_to_json(owner))
        .with("pet", dto::pet_to_json(pet))
        .with(
            "types",
            types.iter().map(dto::pet_type_to_json).collect::<Vec<_>>(),
        )
        .with_errors(errors)
        .into()
}

fn back_to_owner(owner_id: &str) -> Outcome {
    Outcome::redirect(format!("/owners/{owner_id}"))
}

/// Hand `pet` to `owner` and read back the copy the owner now holds.
fn attach_to(owner: &mut Owner, pet: Pet) -> Result<Pet, AppError> {
    let pet_id = pet.id;
    owner
        .add_pet(pet)
        .map(|held| held.clone())
        .ok_or_else(|| match pet_id {
            Some(id) => AppError::not_found(format!("pet {id}")),
            None => AppError::not_found("pet"),
        })
}

/// Resolve a pet of `owner` from a path segment, or answer 404.
fn owned_pet<'a>(owner: &'a Owner, raw_id: &str) -> Result<&'a Pet, AppError> {
    let pet_id: PetId = raw_id.parse()?;
    owner
        .pet_by_id(pet_id)
        .ok_or_else(|| AppError::not_found(format!("pet {pet_id}")))
}

pub async fn init_creation_form(
    Extension(services): Extension<Arc<AppServices>>,
    Path(owner_id): Path<String>,
) -> Result<Response, AppError> {
    let mut owner = load_owner(&services, &owner_id).await?;
    let types = services.pets.find_pet_types().await?;

    let pet = attach_to(&mut owner, Pet::new())?;
    Ok(services.respond(pet_form(&owner, &pet, &types, Errors::new())))
}

/// Add a pet to an owner. A name already used by one of the owner's saved
/// pets is rejected before the regular field rules run.
pub async fn process_creation_form(
    Extension(services): Extension<Arc<AppServices>>,
    Path(owner_id): Path<String>,
    Form(form): Form<PetForm>,
) -> Result<Response, AppError> {
    let mut owner = load_owner(&services, &owner_id).await?;
    let types = services.pets.find_pet_types().await?;

    let mut errors = Errors::new();
    let pet = attach_to(&mut owner, form.bind(&types, &mut errors))?;

    if !pet.name.is_empty() && pet.is_new() && owner.get_pet_ignore_new(&pet.name, true).is_some() {
        errors.reject_value("name", codes::DUPLICATE, "already exists");
    }
    pet.validate(&mut errors);

    if errors.has_errors() {
        tracing::debug!(owner_id = %owner_id, errors = errors.len(), "pet form rejected");
        return Ok(services.respond(pet_form(&owner, &pet, &types, errors)));
    }

    let saved = services.owners.save(owner).await?;
    tracing::info!(owner_id = ?saved.id, pets = saved.nr_of_pets(), "pet added");
    Ok(services.respond(back_to_owner(&owner_id)))
}

pub async fn init_update_form(
    Extension(services): Extension<Arc<AppServices>>,
    Path((owner_id, pet_id)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let owner = load_owner(&services, &owner_id).await?;
    let pet = owned_pet(&owner, &pet_id)?;
    let types = services.pets.find_pet_types().await?;
    Ok(services.respond(pet_form(&owner, pet, &types, Errors::new())))
}

/// Rename or re-date a pet. No duplicate-name check runs on edit.
pub async fn process_update_form(
    Extension(services): Extension<Arc<AppServices>>,
    Path((owner_id, pet_id)): Path<(String, String)>,
    Form(form): Form<PetForm>,
) -> Result<Response, AppError> {
    let mut owner = load_owner(&services, &owner_id).await?;
    let existing_id = owned_pet(&owner, &pet_id)?.id;
    let types = services.pets.find_pet_types().await?;

    let mut errors = Errors::new();
    let mut bound = form.bind(&types, &mut errors);
    bound.id = existing_id;
    let pet = attach_to(&mut owner, bound)?;
    pet.validate(&mut errors);

    if errors.has_errors() {
        tracing::debug!(owner_id = %owner_id, pet_id = %pet_id, errors = errors.len(), "pet form rejected");
        return Ok(services.respond(pet_form(&owner, &pet, &types, errors)));
    }

    // Visits already on file are left untouched by the pet update.
    let saved = services.pets.save(pet).await?;
    tracing::info!(pet_id = ?saved.id, "pet updated");
    Ok(services.respond(back_to_owner(&owner_id)))
}
