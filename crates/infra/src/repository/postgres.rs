//! Postgres-backed store.
//!
//! Aggregates are loaded eagerly: an owner query is followed by one query for
//! the owners' pets (joined with their type) and one for the pets' visits.
//! Cascading saves run inside a single transaction.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgConnection, PgPool, Row};
use tracing::instrument;

use petclinic_core::{OwnerId, Person, PetId, PetTypeId, SpecialtyId, VetId, VisitId};
use petclinic_owners::{Owner, Pet, PetType};
use petclinic_vets::{Specialty, Vet};
use petclinic_visits::Visit;

use super::{like_prefix, OwnerRepository, PetRepository, VetRepository, VisitRepository};
use crate::demo_data::DemoData;
use crate::error::{RepositoryError, RepositoryResult};

const SCHEMA: &str = include_str!("../../migrations/0001_schema.sql");

const OWNER_COLUMNS: &str = "id, first_name, last_name, address, city, telephone";

const PET_SELECT: &str = r#"
    SELECT p.id, p.name, p.birth_date, p.owner_id, t.id AS type_id, t.name AS type_name
    FROM pets p
    LEFT JOIN types t ON t.id = p.type_id
"#;

/// Postgres implementation of every repository contract.
///
/// `PgPool` is internally reference-counted; cloning the store shares the
/// pool.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> RepositoryResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(RepositoryError::database("connect"))?;
        Ok(Self::new(pool))
    }

    /// Create the schema if it does not exist yet.
    pub async fn migrate(&self) -> RepositoryResult<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(RepositoryError::database("migrate"))?;
        Ok(())
    }

    /// Load `data` into an empty database. Returns `false` (and writes
    /// nothing) when owners already exist.
    pub async fn seed(&self, data: &DemoData) -> RepositoryResult<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(RepositoryError::database("begin_seed"))?;

        let owners: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM owners")
            .fetch_one(&mut *tx)
            .await
            .map_err(RepositoryError::database("count_owners"))?;
        if owners > 0 {
            return Ok(false);
        }

        for pet_type in &data.pet_types {
            sqlx::query("INSERT INTO types (id, name) VALUES ($1, $2) ON CONFLICT (id) DO NOTHING")
                .bind(pet_type.id.map(|id| id.get()))
                .bind(&pet_type.name)
                .execute(&mut *tx)
                .await
                .map_err(RepositoryError::database("seed_types"))?;
        }
        for specialty in &data.specialties {
            sqlx::query(
                "INSERT INTO specialties (id, name) VALUES ($1, $2) ON CONFLICT (id) DO NOTHING",
            )
            .bind(specialty.id.map(|id| id.get()))
            .bind(&specialty.name)
            .execute(&mut *tx)
            .await
            .map_err(RepositoryError::database("seed_specialties"))?;
        }
        for vet in &data.vets {
            sqlx::query(
                "INSERT INTO vets (id, first_name, last_name) VALUES ($1, $2, $3) ON CONFLICT (id) DO NOTHING",
            )
            .bind(vet.id.map(|id| id.get()))
            .bind(vet.first_name())
            .bind(vet.last_name())
            .execute(&mut *tx)
            .await
            .map_err(RepositoryError::database("seed_vets"))?;
            for specialty in vet.specialties() {
                sqlx::query(
                    "INSERT INTO vet_specialties (vet_id, specialty_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
                )
                .bind(vet.id.map(|id| id.get()))
                .bind(specialty.id.map(|id| id.get()))
                .execute(&mut *tx)
                .await
                .map_err(RepositoryError::database("seed_vet_specialties"))?;
            }
        }
        for owner in &data.owners {
            seed_owner_on(&mut *tx, owner).await?;
        }
        for table in ["types", "specialties", "vets", "owners", "pets", "visits"] {
            sqlx::query(&format!(
                "SELECT setval(pg_get_serial_sequence('{table}', 'id'), COALESCE((SELECT MAX(id) FROM {table}), 1))"
            ))
            .execute(&mut *tx)
            .await
            .map_err(RepositoryError::database("reset_sequence"))?;
        }

        tx.commit()
            .await
            .map_err(RepositoryError::database("commit_seed"))?;
        Ok(true)
    }

    /// Pets of the given owners, each with type and visits loaded.
    async fn load_pets_of(&self, owner_ids: &[i32]) -> RepositoryResult<Vec<Pet>> {
        let rows: Vec<PetRow> = sqlx::query_as(&format!(
            "{PET_SELECT} WHERE p.owner_id = ANY($1) ORDER BY p.id"
        ))
        .bind(owner_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(RepositoryError::database("load_pets"))?;
        self.attach_visits(rows).await
    }

    async fn attach_visits(&self, rows: Vec<PetRow>) -> RepositoryResult<Vec<Pet>> {
        let pet_ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
        let mut visits_by_pet: HashMap<i32, Vec<Visit>> = HashMap::new();
        for visit in self.load_visits_of(&pet_ids).await? {
            if let Some(pet_id) = visit.pet_id {
                visits_by_pet.entry(pet_id.get()).or_default().push(visit);
            }
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let visits = visits_by_pet.remove(&row.id).unwrap_or_default();
                let mut pet = row.into_pet();
                for visit in visits {
                    pet.add_visit(visit);
                }
                pet
            })
            .collect())
    }

    async fn load_visits_of(&self, pet_ids: &[i32]) -> RepositoryResult<Vec<Visit>> {
        let rows: Vec<VisitRow> = sqlx::query_as(
            "SELECT id, pet_id, visit_date, description FROM visits WHERE pet_id = ANY($1) ORDER BY id",
        )
        .bind(pet_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(RepositoryError::database("load_visits"))?;
        Ok(rows.into_iter().map(VisitRow::into_visit).collect())
    }

    async fn assemble_owners(&self, rows: Vec<OwnerRow>) -> RepositoryResult<Vec<Owner>> {
        let owner_ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
        let mut pets_by_owner: HashMap<i32, Vec<Pet>> = HashMap::new();
        for pet in self.load_pets_of(&owner_ids).await? {
            if let Some(owner_id) = pet.owner_id {
                pets_by_owner.entry(owner_id.get()).or_default().push(pet);
            }
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let pets = pets_by_owner.remove(&row.id).unwrap_or_default();
                let mut owner = row.into_owner();
                for pet in pets {
                    owner.attach_loaded_pet(pet);
                }
                owner
            })
            .collect())
    }
}

#[async_trait]
impl OwnerRepository for PostgresStore {
    #[instrument(skip(self))]
    async fn find_by_last_name(&self, last_name: &str) -> RepositoryResult<Vec<Owner>> {
        let rows: Vec<OwnerRow> = sqlx::query_as(&format!(
            "SELECT {OWNER_COLUMNS} FROM owners WHERE last_name LIKE $1 ORDER BY id"
        ))
        .bind(like_prefix(last_name))
        .fetch_all(&self.pool)
        .await
        .map_err(RepositoryError::database("find_owners_by_last_name"))?;
        self.assemble_owners(rows).await
    }

    #[instrument(skip(self), fields(owner_id = %id))]
    async fn find_by_id(&self, id: OwnerId) -> RepositoryResult<Option<Owner>> {
        let row: Option<OwnerRow> =
            sqlx::query_as(&format!("SELECT {OWNER_COLUMNS} FROM owners WHERE id = $1"))
                .bind(id.get())
                .fetch_optional(&self.pool)
                .await
                .map_err(RepositoryError::database("find_owner_by_id"))?;
        match row {
            Some(row) => Ok(self.assemble_owners(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, owner), fields(owner_id = ?owner.id))]
    async fn save(&self, mut owner: Owner) -> RepositoryResult<Owner> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(RepositoryError::database("begin_save_owner"))?;
        save_owner_on(&mut *tx, &mut owner).await?;
        tx.commit()
            .await
            .map_err(RepositoryError::database("commit_save_owner"))?;
        Ok(owner)
    }
}

#[async_trait]
impl PetRepository for PostgresStore {
    async fn find_pet_types(&self) -> RepositoryResult<Vec<PetType>> {
        let rows = sqlx::query("SELECT id, name FROM types ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(RepositoryError::database("find_pet_types"))?;
        rows.iter()
            .map(|row| -> Result<PetType, sqlx::Error> {
                Ok(PetType {
                    id: Some(PetTypeId::new(row.try_get("id")?)),
                    name: row.try_get::<Option<String>, _>("name")?.unwrap_or_default(),
                })
            })
            .collect::<Result<_, sqlx::Error>>()
            .map_err(RepositoryError::database("decode_pet_types"))
    }

    #[instrument(skip(self), fields(pet_id = %id))]
    async fn find_by_id(&self, id: PetId) -> RepositoryResult<Option<Pet>> {
        let row: Option<PetRow> = sqlx::query_as(&format!("{PET_SELECT} WHERE p.id = $1"))
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(RepositoryError::database("find_pet_by_id"))?;
        match row {
            Some(row) => Ok(self.attach_visits(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, pet), fields(pet_id = ?pet.id))]
    async fn save(&self, mut pet: Pet) -> RepositoryResult<Pet> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(RepositoryError::database("begin_save_pet"))?;
        save_pet_on(&mut *tx, &mut pet).await?;
        tx.commit()
            .await
            .map_err(RepositoryError::database("commit_save_pet"))?;
        Ok(pet)
    }
}

#[async_trait]
impl VisitRepository for PostgresStore {
    async fn find_by_pet_id(&self, pet_id: PetId) -> RepositoryResult<Vec<Visit>> {
        self.load_visits_of(&[pet_id.get()]).await
    }

    async fn save(&self, mut visit: Visit) -> RepositoryResult<Visit> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(RepositoryError::database("acquire"))?;
        save_visit_on(&mut *conn, &mut visit).await?;
        Ok(visit)
    }
}

#[async_trait]
impl VetRepository for PostgresStore {
    async fn find_all(&self) -> RepositoryResult<Vec<Vet>> {
        let vet_rows = sqlx::query("SELECT id, first_name, last_name FROM vets ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(RepositoryError::database("find_vets"))?;
        let spec_rows = sqlx::query(
            r#"
            SELECT vs.vet_id, s.id, s.name
            FROM vet_specialties vs
            JOIN specialties s ON s.id = vs.specialty_id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(RepositoryError::database("find_vet_specialties"))?;

        let decode = || -> Result<Vec<Vet>, sqlx::Error> {
            let mut vets = Vec::with_capacity(vet_rows.len());
            for row in &vet_rows {
                let id: i32 = row.try_get("id")?;
                let mut vet = Vet::new(Person::new(
                    row.try_get::<Option<String>, _>("first_name")?.unwrap_or_default(),
                    row.try_get::<Option<String>, _>("last_name")?.unwrap_or_default(),
                ));
                vet.id = Some(VetId::new(id));
                for spec in &spec_rows {
                    if spec.try_get::<i32, _>("vet_id")? == id {
                        vet.add_specialty(Specialty::new(
                            SpecialtyId::new(spec.try_get("id")?),
                            spec.try_get::<Option<String>, _>("name")?.unwrap_or_default(),
                        ));
                    }
                }
                vets.push(vet);
            }
            Ok(vets)
        };
        decode().map_err(RepositoryError::database("decode_vets"))
    }
}

async fn save_owner_on(conn: &mut PgConnection, owner: &mut Owner) -> RepositoryResult<()> {
    let id = match owner.id {
        None => sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO owners (first_name, last_name, address, city, telephone)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&owner.person.first_name)
        .bind(&owner.person.last_name)
        .bind(&owner.address)
        .bind(&owner.city)
        .bind(&owner.telephone)
        .fetch_one(&mut *conn)
        .await
        .map_err(RepositoryError::database("insert_owner"))?,
        Some(id) => {
            let done = sqlx::query(
                r#"
                UPDATE owners
                SET first_name = $1, last_name = $2, address = $3, city = $4, telephone = $5
                WHERE id = $6
                "#,
            )
            .bind(&owner.person.first_name)
            .bind(&owner.person.last_name)
            .bind(&owner.address)
            .bind(&owner.city)
            .bind(&owner.telephone)
            .bind(id.get())
            .execute(&mut *conn)
            .await
            .map_err(RepositoryError::database("update_owner"))?;
            if done.rows_affected() == 0 {
                return Err(RepositoryError::NotFound(format!("owner {id}")));
            }
            id.get()
        }
    };

    let owner_id = Some(OwnerId::new(id));
    owner.id = owner_id;
    for pet in owner.pets_mut() {
        pet.owner_id = owner_id;
        save_pet_on(&mut *conn, pet).await?;
    }
    Ok(())
}

async fn save_pet_on(conn: &mut PgConnection, pet: &mut Pet) -> RepositoryResult<()> {
    let type_id = match &pet.pet_type {
        Some(t) => Some(
            t.id.ok_or_else(|| {
                RepositoryError::InvalidRecord("pet type must be saved before use".to_string())
            })?
            .get(),
        ),
        None => None,
    };
    let owner_id = pet.owner_id.map(|id| id.get());

    let id = match pet.id {
        None => {
            let type_id = type_id.ok_or_else(|| {
                RepositoryError::InvalidRecord("a new pet needs a type".to_string())
            })?;
            sqlx::query_scalar::<_, i32>(
                r#"
                INSERT INTO pets (name, birth_date, type_id, owner_id)
                VALUES ($1, $2, $3, $4)
                RETURNING id
                "#,
            )
            .bind(&pet.name)
            .bind(pet.birth_date)
            .bind(type_id)
            .bind(owner_id)
            .fetch_one(&mut *conn)
            .await
            .map_err(RepositoryError::database("insert_pet"))?
        }
        Some(id) => {
            let done = sqlx::query(
                r#"
                UPDATE pets
                SET name = $1,
                    birth_date = $2,
                    type_id = COALESCE($3, type_id),
                    owner_id = COALESCE($4, owner_id)
                WHERE id = $5
                "#,
            )
            .bind(&pet.name)
            .bind(pet.birth_date)
            .bind(type_id)
            .bind(owner_id)
            .bind(id.get())
            .execute(&mut *conn)
            .await
            .map_err(RepositoryError::database("update_pet"))?;
            if done.rows_affected() == 0 {
                return Err(RepositoryError::NotFound(format!("pet {id}")));
            }
            id.get()
        }
    };

    let pet_id = Some(PetId::new(id));
    pet.id = pet_id;
    for visit in pet.visits_mut() {
        visit.pet_id = pet_id;
        save_visit_on(&mut *conn, visit).await?;
    }
    Ok(())
}

async fn save_visit_on(conn: &mut PgConnection, visit: &mut Visit) -> RepositoryResult<()> {
    let pet_id = visit
        .pet_id
        .ok_or_else(|| RepositoryError::InvalidRecord("visit has no pet".to_string()))?
        .get();

    match visit.id {
        None => {
            let id = sqlx::query_scalar::<_, i32>(
                "INSERT INTO visits (pet_id, visit_date, description) VALUES ($1, $2, $3) RETURNING id",
            )
            .bind(pet_id)
            .bind(visit.date)
            .bind(&visit.description)
            .fetch_one(&mut *conn)
            .await
            .map_err(RepositoryError::database("insert_visit"))?;
            visit.id = Some(VisitId::new(id));
        }
        Some(id) => {
            let done = sqlx::query(
                "UPDATE visits SET pet_id = $1, visit_date = $2, description = $3 WHERE id = $4",
            )
            .bind(pet_id)
            .bind(visit.date)
            .bind(&visit.description)
            .bind(id.get())
            .execute(&mut *conn)
            .await
            .map_err(RepositoryError::database("update_visit"))?;
            if done.rows_affected() == 0 {
                return Err(RepositoryError::NotFound(format!("visit {id}")));
            }
        }
    }
    Ok(())
}

/// Insert a demo owner, its pets and visits with their identifiers.
async fn seed_owner_on(conn: &mut PgConnection, owner: &Owner) -> RepositoryResult<()> {
    sqlx::query(&format!(
        "INSERT INTO owners ({OWNER_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6)"
    ))
    .bind(owner.id.map(|id| id.get()))
    .bind(owner.first_name())
    .bind(owner.last_name())
    .bind(&owner.address)
    .bind(&owner.city)
    .bind(&owner.telephone)
    .execute(&mut *conn)
    .await
    .map_err(RepositoryError::database("seed_owner"))?;

    for pet in owner.pets() {
        sqlx::query(
            "INSERT INTO pets (id, name, birth_date, type_id, owner_id) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(pet.id.map(|id| id.get()))
        .bind(&pet.name)
        .bind(pet.birth_date)
        .bind(pet.pet_type.as_ref().and_then(|t| t.id).map(|id| id.get()))
        .bind(owner.id.map(|id| id.get()))
        .execute(&mut *conn)
        .await
        .map_err(RepositoryError::database("seed_pet"))?;

        for visit in pet.visits() {
            sqlx::query(
                "INSERT INTO visits (id, pet_id, visit_date, description) VALUES ($1, $2, $3, $4)",
            )
            .bind(visit.id.map(|id| id.get()))
            .bind(pet.id.map(|id| id.get()))
            .bind(visit.date)
            .bind(&visit.description)
            .execute(&mut *conn)
            .await
            .map_err(RepositoryError::database("seed_visit"))?;
        }
    }
    Ok(())
}

// SQLx row types

#[derive(Debug)]
struct OwnerRow {
    id: i32,
    first_name: Option<String>,
    last_name: Option<String>,
    address: Option<String>,
    city: Option<String>,
    telephone: Option<String>,
}

impl<'r> sqlx::FromRow<'r, PgRow> for OwnerRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(OwnerRow {
            id: row.try_get("id")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            address: row.try_get("address")?,
            city: row.try_get("city")?,
            telephone: row.try_get("telephone")?,
        })
    }
}

impl OwnerRow {
    fn into_owner(self) -> Owner {
        let mut owner = Owner::new();
        owner.id = Some(OwnerId::new(self.id));
        owner.person = Person::new(
            self.first_name.unwrap_or_default(),
            self.last_name.unwrap_or_default(),
        );
        owner.address = self.address.unwrap_or_default();
        owner.city = self.city.unwrap_or_default();
        owner.telephone = self.telephone.unwrap_or_default();
        owner
    }
}

#[derive(Debug)]
struct PetRow {
    id: i32,
    name: Option<String>,
    birth_date: Option<NaiveDate>,
    owner_id: Option<i32>,
    type_id: Option<i32>,
    type_name: Option<String>,
}

impl<'r> sqlx::FromRow<'r, PgRow> for PetRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(PetRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            birth_date: row.try_get("birth_date")?,
            owner_id: row.try_get("owner_id")?,
            type_id: row.try_get("type_id")?,
            type_name: row.try_get("type_name")?,
        })
    }
}

impl PetRow {
    fn into_pet(self) -> Pet {
        let mut pet = Pet::named(self.name.unwrap_or_default());
        pet.id = Some(PetId::new(self.id));
        pet.birth_date = self.birth_date;
        pet.owner_id = self.owner_id.map(OwnerId::new);
        pet.pet_type = self
            .type_id
            .map(|id| PetType::new(PetTypeId::new(id), self.type_name.unwrap_or_default()));
        pet
    }
}

#[derive(Debug)]
struct VisitRow {
    id: i32,
    pet_id: i32,
    visit_date: Option<NaiveDate>,
    description: Option<String>,
}

impl<'r> sqlx::FromRow<'r, PgRow> for VisitRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(VisitRow {
            id: row.try_get("id")?,
            pet_id: row.try_get("pet_id")?,
            visit_date: row.try_get("visit_date")?,
            description: row.try_get("description")?,
        })
    }
}

impl VisitRow {
    fn into_visit(self) -> Visit {
        let mut visit = Visit::on(
            self.visit_date.unwrap_or_default(),
            self.description.unwrap_or_default(),
        );
        visit.id = Some(VisitId::new(self.id));
        visit.pet_id = Some(PetId::new(self.pet_id));
        visit
    }
}
