use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    response::Response,
    Form,
};

use petclinic_core::{Errors, PetId, Validate};
use petclinic_owners::{Owner, Pet};
use petclinic_visits::Visit;

use crate::app::dto::{self, VisitForm};
use crate::app::errors::AppError;
use crate::app::routes::load_owner;
use crate::app::services::AppServices;
use crate::app::view::{Outcome, View};

const CREATE_OR_UPDATE_VISIT_FORM: &str = "pets/createOrUpdateVisitForm";

struct VisitTarget {
    owner: Owner,
    pet: Pet,
    previous: Vec<Visit>,
}

async fn load_target(
    services: &AppServices,
    owner_id: &str,
    pet_id: &str,
) -> Result<VisitTarget, AppError> {
    let owner = load_owner(services, owner_id).await?;
    let pet_id: PetId = pet_id.parse()?;
    let pet = owner
        .pet_by_id(pet_id)
        .cloned()
        .ok_or_else(|| AppError::not_found(format!("pet {pet_id}")))?;
    let mut previous = services.visits.find_by_pet_id(pet_id).await?;
    previous.sort_by(|a, b| b.date.cmp(&a.date));
    Ok(VisitTarget {
        owner,
        pet,
        previous,
    })
}

fn visit_form(target: &VisitTarget, visit: &Visit, errors: Errors) -> Outcome {
    View::new(CREATE_OR_UPDATE_VISIT_FORM)
        .with("owner", dto::owner_to_json(&target.owner))
        .with("pet", dto::pet_to_json(&target.pet))
        .with("visit", dto::visit_to_json(visit))
        .with(
            "previousVisits",
            target.previous.iter().map(dto::visit_to_json).collect::<Vec<_>>(),
        )
        .with_errors(errors)
        .into()
}

pub async fn init_new_visit_form(
    Extension(services): Extension<Arc<AppServices>>,
    Path((owner_id, pet_id)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let mut target = load_target(&services, &owner_id, &pet_id).await?;
    let visit = target.pet.add_visit(Visit::new()).clone();
    Ok(services.respond(visit_form(&target, &visit, Errors::new())))
}

pub async fn process_new_visit_form(
    Extension(services): Extension<Arc<AppServices>>,
    Path((owner_id, pet_id)): Path<(String, String)>,
    Form(form): Form<VisitForm>,
) -> Result<Response, AppError> {
    let mut target = load_target(&services, &owner_id, &pet_id).await?;

    let mut errors = Errors::new();
    let visit = target.pet.add_visit(form.bind(&mut errors)).clone();
    visit.validate(&mut errors);

    if errors.has_errors() {
        tracing::debug!(pet_id = %pet_id, errors = errors.len(), "visit form rejected");
        return Ok(services.respond(visit_form(&target, &visit, errors)));
    }

    let saved = services.visits.save(visit).await?;
    tracing::info!(visit_id = ?saved.id, pet_id = ?saved.pet_id, "visit booked");
    Ok(services.respond(Outcome::redirect(format!("/owners/{owner_id}"))))
}
