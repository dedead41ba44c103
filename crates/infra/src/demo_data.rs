//! Demo dataset loaded into a fresh store (owners around Madison, WI).

use chrono::NaiveDate;

use petclinic_core::{OwnerId, Person, PetId, PetTypeId, SpecialtyId, VetId, VisitId};
use petclinic_owners::{Owner, Pet, PetType};
use petclinic_vets::{Specialty, Vet};
use petclinic_visits::Visit;

/// Fully identified demo records, in dependency order.
#[derive(Debug, Clone)]
pub struct DemoData {
    pub pet_types: Vec<PetType>,
    pub specialties: Vec<Specialty>,
    pub vets: Vec<Vet>,
    pub owners: Vec<Owner>,
}

const PET_TYPES: &[(i32, &str)] = &[
    (1, "cat"),
    (2, "dog"),
    (3, "lizard"),
    (4, "snake"),
    (5, "bird"),
    (6, "hamster"),
];

const SPECIALTIES: &[(i32, &str)] = &[(1, "radiology"), (2, "surgery"), (3, "dentistry")];

const VETS: &[(i32, &str, &str, &[i32])] = &[
    (1, "James", "Carter", &[]),
    (2, "Helen", "Leary", &[1]),
    (3, "Linda", "Douglas", &[2, 3]),
    (4, "Rafael", "Ortega", &[2]),
    (5, "Henry", "Stevens", &[1]),
    (6, "Sharon", "Jenkins", &[]),
];

const OWNERS: &[(i32, &str, &str, &str, &str, &str)] = &[
    (1, "George", "Franklin", "110 W. Liberty St.", "Madison", "6085551023"),
    (2, "Betty", "Davis", "638 Cardinal Ave.", "Sun Prairie", "6085551749"),
    (3, "Eduardo", "Rodriquez", "2693 Commerce St.", "McFarland", "6085558763"),
    (4, "Harold", "Davis", "563 Friendly St.", "Windsor", "6085553198"),
    (5, "Peter", "McTavish", "2387 S. Fair Way", "Madison", "6085552765"),
    (6, "Jean", "Coleman", "105 N. Lake St.", "Monona", "6085552654"),
    (7, "Jeff", "Black", "1450 Oak Blvd.", "Monona", "6085555387"),
    (8, "Maria", "Escobito", "345 Maple St.", "Madison", "6085557683"),
    (9, "David", "Schroeder", "2749 Blackhawk Trail", "Madison", "6085559435"),
    (10, "Carlos", "Estaban", "2335 Independence La.", "Waunakee", "6085555487"),
];

/// (id, name, birth date, type id, owner id)
const PETS: &[(i32, &str, (i32, u32, u32), i32, i32)] = &[
    (1, "Leo", (2010, 9, 7), 1, 1),
    (2, "Basil", (2012, 8, 6), 6, 2),
    (3, "Rosy", (2011, 4, 17), 2, 3),
    (4, "Jewel", (2010, 3, 7), 2, 3),
    (5, "Iggy", (2010, 11, 30), 3, 4),
    (6, "George", (2010, 1, 20), 4, 5),
    (7, "Samantha", (2012, 9, 4), 1, 6),
    (8, "Max", (2012, 9, 4), 1, 6),
    (9, "Lucky", (2011, 8, 6), 5, 7),
    (10, "Mulligan", (2007, 2, 24), 2, 8),
    (11, "Freddy", (2010, 3, 9), 5, 9),
    (12, "Lucky", (2010, 6, 24), 2, 10),
    (13, "Sly", (2012, 6, 8), 1, 10),
];

/// (id, pet id, date, description)
const VISITS: &[(i32, i32, (i32, u32, u32), &str)] = &[
    (1, 7, (2013, 1, 1), "rabies shot"),
    (2, 8, (2013, 1, 2), "rabies shot"),
    (3, 8, (2013, 1, 3), "neutered"),
    (4, 7, (2013, 1, 4), "spayed"),
];

fn date((y, m, d): (i32, u32, u32)) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

/// Build the demo dataset.
pub fn demo_data() -> DemoData {
    let pet_types: Vec<PetType> = PET_TYPES
        .iter()
        .map(|(id, name)| PetType::new(PetTypeId::new(*id), *name))
        .collect();

    let specialties: Vec<Specialty> = SPECIALTIES
        .iter()
        .map(|(id, name)| Specialty::new(SpecialtyId::new(*id), *name))
        .collect();

    let vets = VETS
        .iter()
        .map(|(id, first, last, specs)| {
            let mut vet = Vet::new(Person::new(*first, *last));
            vet.id = Some(VetId::new(*id));
            for spec in specialties.iter().filter(|s| {
                s.id.is_some_and(|sid| specs.contains(&sid.get()))
            }) {
                vet.add_specialty(spec.clone());
            }
            vet
        })
        .collect();

    let owners = OWNERS
        .iter()
        .map(|(id, first, last, address, city, telephone)| {
            let mut owner = Owner::new();
            owner.id = Some(OwnerId::new(*id));
            owner.person = Person::new(*first, *last);
            owner.address = address.to_string();
            owner.city = city.to_string();
            owner.telephone = telephone.to_string();

            for (pet_id, name, birth, type_id, _) in PETS.iter().filter(|p| p.4 == *id) {
                let mut pet = Pet::named(*name);
                pet.id = Some(PetId::new(*pet_id));
                pet.birth_date = Some(date(*birth));
                pet.pet_type = pet_types
                    .iter()
                    .find(|t| t.id == Some(PetTypeId::new(*type_id)))
                    .cloned();
                for (visit_id, _, on, description) in VISITS.iter().filter(|v| v.1 == *pet_id) {
                    let mut visit = Visit::on(date(*on), *description);
                    visit.id = Some(VisitId::new(*visit_id));
                    pet.add_visit(visit);
                }
                owner.attach_loaded_pet(pet);
            }
            owner
        })
        .collect();

    DemoData {
        pet_types,
        specialties,
        vets,
        owners,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_data_is_fully_linked() {
        let data = demo_data();
        assert_eq!(data.owners.len(), 10);
        assert_eq!(data.vets.len(), 6);

        let coleman = &data.owners[5];
        assert_eq!(coleman.last_name(), "Coleman");
        let names: Vec<&str> = coleman.pets().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Max", "Samantha"]);

        let samantha = coleman.get_pet("samantha").unwrap();
        assert_eq!(samantha.owner_id, Some(OwnerId::new(6)));
        assert_eq!(samantha.visits()[0].description, "spayed");
        assert!(samantha.visits().iter().all(|v| v.pet_id == Some(PetId::new(7))));

        let douglas = &data.vets[2];
        let specs: Vec<&str> = douglas.specialties().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(specs, vec!["dentistry", "surgery"]);
    }
}
