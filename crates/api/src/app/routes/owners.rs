use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    response::Response,
    Form,
};

use petclinic_core::validation::codes;
use petclinic_core::{Errors, Validate};
use petclinic_infra::RepositoryError;
use petclinic_owners::Owner;

use crate::app::dto::{self, FindOwnersQuery, OwnerForm};
use crate::app::errors::AppError;
use crate::app::routes::load_owner;
use crate::app::services::AppServices;
use crate::app::view::{Outcome, View};

const CREATE_OR_UPDATE_OWNER_FORM: &str = "owners/createOrUpdateOwnerForm";
const FIND_OWNERS: &str = "owners/findOwners";
const OWNERS_LIST: &str = "owners/ownersList";
const OWNER_DETAILS: &str = "owners/ownerDetails";

fn owner_form(owner: &Owner, errors: Errors) -> Outcome {
    View::new(CREATE_OR_UPDATE_OWNER_FORM)
        .with("owner", dto::owner_to_json(owner))
        .with_errors(errors)
        .into()
}

fn owner_location(owner: &Owner) -> Result<Outcome, AppError> {
    let id = owner.id.ok_or_else(|| {
        RepositoryError::InvalidRecord("owner saved without an id".to_string())
    })?;
    Ok(Outcome::redirect(format!("/owners/{id}")))
}

pub async fn init_creation_form(Extension(services): Extension<Arc<AppServices>>) -> Response {
    services.respond(owner_form(&Owner::new(), Errors::new()))
}

pub async fn process_creation_form(
    Extension(services): Extension<Arc<AppServices>>,
    Form(form): Form<OwnerForm>,
) -> Result<Response, AppError> {
    let owner = form.into_owner();
    let errors = owner.validated();
    if errors.has_errors() {
        tracing::debug!(errors = errors.len(), "owner form rejected");
        return Ok(services.respond(owner_form(&owner, errors)));
    }

    let saved = services.owners.save(owner).await?;
    tracing::info!(owner_id = ?saved.id, "owner created");
    Ok(services.respond(owner_location(&saved)?))
}

pub async fn init_find_form(Extension(services): Extension<Arc<AppServices>>) -> Response {
    services.respond(
        View::new(FIND_OWNERS)
            .with("owner", dto::owner_to_json(&Owner::new()))
            .into(),
    )
}

/// Search by last-name prefix: no match re-renders the search form, a single
/// match redirects to it, several render the list.
pub async fn process_find_form(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<FindOwnersQuery>,
) -> Result<Response, AppError> {
    // A missing parameter searches for everyone.
    let last_name = query.last_name.unwrap_or_default();
    let results = services.owners.find_by_last_name(&last_name).await?;
    tracing::debug!(last_name = %last_name, matches = results.len(), "owner search");

    let outcome = match results.as_slice() {
        [] => {
            let mut owner = Owner::new();
            owner.person.last_name = last_name;
            let mut errors = Errors::new();
            errors.reject_value("lastName", codes::NOT_FOUND, "not found");
            View::new(FIND_OWNERS)
                .with("owner", dto::owner_to_json(&owner))
                .with_errors(errors)
                .into()
        }
        [owner] => owner_location(owner)?,
        _ => View::new(OWNERS_LIST)
            .with(
                "selections",
                results.iter().map(dto::owner_to_json).collect::<Vec<_>>(),
            )
            .into(),
    };
    Ok(services.respond(outcome))
}

pub async fn init_update_form(
    Extension(services): Extension<Arc<AppServices>>,
    Path(owner_id): Path<String>,
) -> Result<Response, AppError> {
    let owner = load_owner(&services, &owner_id).await?;
    Ok(services.respond(owner_form(&owner, Errors::new())))
}

/// Save contact details under the id from the path; pets already on file are
/// kept.
pub async fn process_update_form(
    Extension(services): Extension<Arc<AppServices>>,
    Path(owner_id): Path<String>,
    Form(form): Form<OwnerForm>,
) -> Result<Response, AppError> {
    let existing = load_owner(&services, &owner_id).await?;

    let mut owner = form.into_owner();
    owner.id = existing.id;
    let errors = owner.validated();
    if errors.has_errors() {
        tracing::debug!(owner_id = %owner_id, errors = errors.len(), "owner form rejected");
        return Ok(services.respond(owner_form(&owner, errors)));
    }

    owner.adopt_pets_from(existing);
    let saved = services.owners.save(owner).await?;
    tracing::info!(owner_id = ?saved.id, "owner updated");
    Ok(services.respond(owner_location(&saved)?))
}

pub async fn show_owner(
    Extension(services): Extension<Arc<AppServices>>,
    Path(owner_id): Path<String>,
) -> Result<Response, AppError> {
    let owner = load_owner(&services, &owner_id).await?;
    Ok(services.respond(
        View::new(OWNER_DETAILS)
            .with("owner", dto::owner_to_json(&owner))
            .into(),
    ))
}
