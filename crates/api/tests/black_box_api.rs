use petclinic_api::app::services::AppServices;
use reqwest::{header, StatusCode};
use serde_json::Value;

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        petclinic_observability::tracing::init_for_tests();

        // Same router as prod over the in-memory store with demo data, bound to an ephemeral port.
        let services = AppServices::with_demo_data().expect("demo data loads");
        let app = petclinic_api::app::build_app(services);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Redirects are part of the contract under test.
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap();

        Self {
            base_url,
            client,
            handle,
        }
    }

    async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .unwrap()
    }

    async fn post_form(&self, path: &str, fields: &[(&str, &str)]) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .form(fields)
            .send()
            .await
            .unwrap()
    }

    async fn view(&self, path: &str) -> Value {
        let res = self.get(path).await;
        assert_eq!(res.status(), StatusCode::OK, "GET {path}");
        res.json().await.unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn location(res: &reqwest::Response) -> &str {
    res.headers()[header::LOCATION].to_str().unwrap()
}

fn pet_names(owner: &Value) -> Vec<&str> {
    owner["pets"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect()
}

const VALID_OWNER: &[(&str, &str)] = &[
    ("firstName", "Sam"),
    ("lastName", "Schultz"),
    ("address", "4, Evans Street"),
    ("city", "Wollongong"),
    ("telephone", "4444444444"),
];

#[tokio::test]
async fn health_and_welcome_carry_request_id() {
    let srv = TestServer::spawn().await;

    let res = srv.get("/health").await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("x-request-id"));

    let res = srv
        .client
        .get(format!("{}/", srv.base_url))
        .header("x-request-id", "req-42")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["x-request-id"], "req-42");
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["view"], "welcome");
}

#[tokio::test]
async fn empty_search_lists_every_owner() {
    let srv = TestServer::spawn().await;

    let body = srv.view("/owners?lastName=").await;
    assert_eq!(body["view"], "owners/ownersList");
    assert_eq!(body["model"]["selections"].as_array().unwrap().len(), 10);

    let body = srv.view("/owners").await;
    assert_eq!(body["model"]["selections"].as_array().unwrap().len(), 10);
}

#[tokio::test]
async fn unique_search_match_redirects_to_owner() {
    let srv = TestServer::spawn().await;

    let res = srv.get("/owners?lastName=Franklin").await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/owners/1");

    let body = srv.view("/owners?lastName=Davis").await;
    assert_eq!(body["view"], "owners/ownersList");
    assert_eq!(body["model"]["selections"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn unmatched_search_reports_last_name_not_found() {
    let srv = TestServer::spawn().await;

    let body = srv.view("/owners?lastName=Nobody").await;
    assert_eq!(body["view"], "owners/findOwners");
    assert_eq!(body["errors"]["lastName"][0], "not found");
    assert_eq!(body["model"]["owner"]["lastName"], "Nobody");
}

#[tokio::test]
async fn owner_details_sort_pets_and_visits() {
    let srv = TestServer::spawn().await;

    let body = srv.view("/owners/6").await;
    assert_eq!(body["view"], "owners/ownerDetails");
    let owner = &body["model"]["owner"];
    assert_eq!(pet_names(owner), vec!["Max", "Samantha"]);

    let samantha = &owner["pets"][1];
    assert_eq!(samantha["visits"][0]["date"], "2013-01-04");
    assert_eq!(samantha["visits"][1]["date"], "2013-01-01");
}

#[tokio::test]
async fn create_owner_redirects_to_new_owner() {
    let srv = TestServer::spawn().await;

    let body = srv.view("/owners/new").await;
    assert_eq!(body["view"], "owners/createOrUpdateOwnerForm");
    assert_eq!(body["model"]["owner"]["new"], true);

    let res = srv.post_form("/owners/new", VALID_OWNER).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/owners/11");

    let body = srv.view("/owners/11").await;
    assert_eq!(body["model"]["owner"]["lastName"], "Schultz");
    assert_eq!(body["model"]["owner"]["pets"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn invalid_owner_form_is_re_rendered_with_field_errors() {
    let srv = TestServer::spawn().await;

    let res = srv
        .post_form(
            "/owners/new",
            &[
                ("firstName", "Joe"),
                ("lastName", "Bloggs"),
                ("address", "123 Caramel Street"),
                ("city", ""),
                ("telephone", "12345678901"),
            ],
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["view"], "owners/createOrUpdateOwnerForm");
    assert!(body["errors"]["city"].is_array());
    assert!(body["errors"]["telephone"].is_array());
    assert!(body["errors"]["firstName"].is_null());

    let body = srv.view("/owners?lastName=Bloggs").await;
    assert_eq!(body["view"], "owners/findOwners");
}

#[tokio::test]
async fn editing_owner_keeps_pets() {
    let srv = TestServer::spawn().await;

    let body = srv.view("/owners/6/edit").await;
    assert_eq!(body["model"]["owner"]["firstName"], "Jean");

    let res = srv
        .post_form(
            "/owners/6/edit",
            &[
                ("firstName", "Jean"),
                ("lastName", "Coleman"),
                ("address", "105 N. Lake St."),
                ("city", "Madison"),
                ("telephone", "6085552654"),
            ],
        )
        .await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/owners/6");

    let owner = srv.view("/owners/6").await["model"]["owner"].clone();
    assert_eq!(owner["city"], "Madison");
    assert_eq!(pet_names(&owner), vec!["Max", "Samantha"]);
}

#[tokio::test]
async fn new_pet_with_duplicate_name_is_rejected() {
    let srv = TestServer::spawn().await;

    let res = srv
        .post_form(
            "/owners/1/pets/new",
            &[("name", "leo"), ("birthDate", "2015/02/01"), ("type", "dog")],
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["view"], "pets/createOrUpdatePetForm");
    assert_eq!(body["errors"]["name"][0], "already exists");

    let owner = srv.view("/owners/1").await["model"]["owner"].clone();
    assert_eq!(pet_names(&owner), vec!["Leo"]);
}

#[tokio::test]
async fn new_pet_is_attached_and_listed_by_name() {
    let srv = TestServer::spawn().await;

    let body = srv.view("/owners/1/pets/new").await;
    assert_eq!(body["model"]["types"].as_array().unwrap().len(), 6);
    assert_eq!(body["model"]["pet"]["ownerId"], 1);

    let res = srv
        .post_form(
            "/owners/1/pets/new",
            &[("name", "Basil"), ("birthDate", "2015-02-01"), ("type", "hamster")],
        )
        .await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/owners/1");

    let owner = srv.view("/owners/1").await["model"]["owner"].clone();
    assert_eq!(pet_names(&owner), vec!["Basil", "Leo"]);
    assert_eq!(owner["pets"][0]["type"], "hamster");
    assert_eq!(owner["pets"][0]["birthDate"], "2015-02-01");
}

#[tokio::test]
async fn pet_form_reports_binding_and_required_errors() {
    let srv = TestServer::spawn().await;

    let body: Value = srv
        .post_form(
            "/owners/1/pets/new",
            &[("name", ""), ("birthDate", "tomorrow"), ("type", "dragon")],
        )
        .await
        .json()
        .await
        .unwrap();

    assert_eq!(body["view"], "pets/createOrUpdatePetForm");
    assert_eq!(body["errors"]["name"][0], "required");
    assert!(body["errors"]["type"].as_array().is_some_and(|e| !e.is_empty()));
    assert!(body["errors"]["birthDate"].as_array().is_some_and(|e| !e.is_empty()));
}

#[tokio::test]
async fn editing_pet_may_reuse_a_sibling_name() {
    let srv = TestServer::spawn().await;

    let body = srv.view("/owners/3/pets/4/edit").await;
    assert_eq!(body["model"]["pet"]["name"], "Jewel");

    let res = srv
        .post_form(
            "/owners/3/pets/4/edit",
            &[("name", "rosy"), ("birthDate", "2010/03/07"), ("type", "")],
        )
        .await;
    assert_eq!(res.status(), StatusCode::FOUND);

    let owner = srv.view("/owners/3").await["model"]["owner"].clone();
    assert_eq!(pet_names(&owner), vec!["Rosy", "rosy"]);
    assert!(owner["pets"].as_array().unwrap().iter().all(|p| p["type"] == "dog"));
}

#[tokio::test]
async fn booking_a_visit_adds_it_to_the_pet() {
    let srv = TestServer::spawn().await;

    let body = srv.view("/owners/6/pets/8/visits/new").await;
    assert_eq!(body["view"], "pets/createOrUpdateVisitForm");
    assert_eq!(body["model"]["previousVisits"].as_array().unwrap().len(), 2);

    let res = srv
        .post_form(
            "/owners/6/pets/8/visits/new",
            &[("date", "2013/02/01"), ("description", "dental check")],
        )
        .await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/owners/6");

    let owner = srv.view("/owners/6").await["model"]["owner"].clone();
    let max = &owner["pets"][0];
    assert_eq!(max["name"], "Max");
    assert_eq!(max["visits"][0]["description"], "dental check");
    assert_eq!(max["visits"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn booked_visit_is_stamped_with_the_pet_it_was_added_to() {
    let srv = TestServer::spawn().await;

    let body = srv.view("/owners/6/pets/7/visits/new").await;
    assert_eq!(body["model"]["visit"]["petId"], 7);

    let res = srv
        .post_form(
            "/owners/6/pets/7/visits/new",
            &[("date", "2013-03-04"), ("description", "ear infection")],
        )
        .await;
    assert_eq!(res.status(), StatusCode::FOUND);

    let owner = srv.view("/owners/6").await["model"]["owner"].clone();
    let samantha = owner["pets"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["id"] == 7)
        .unwrap();
    let booked: Vec<&Value> = samantha["visits"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|v| v["description"] == "ear infection")
        .collect();
    assert_eq!(booked.len(), 1);
    assert_eq!(booked[0]["petId"], 7);
    assert!(booked[0]["id"].is_number());
}

#[tokio::test]
async fn visit_without_description_is_rejected() {
    let srv = TestServer::spawn().await;

    let body: Value = srv
        .post_form("/owners/6/pets/8/visits/new", &[("date", "2013/02/01")])
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["view"], "pets/createOrUpdateVisitForm");
    assert!(body["errors"]["description"].is_array());
}

#[tokio::test]
async fn vets_are_listed_as_view_and_json() {
    let srv = TestServer::spawn().await;

    let body = srv.view("/vets.html").await;
    assert_eq!(body["view"], "vets/vetList");
    assert_eq!(body["model"]["vets"].as_array().unwrap().len(), 6);

    let body = srv.view("/vets").await;
    let vets = body["vetList"].as_array().unwrap();
    assert_eq!(vets.len(), 6);
    let douglas = vets.iter().find(|v| v["lastName"] == "Douglas").unwrap();
    assert_eq!(douglas["specialties"][0]["name"], "dentistry");
    assert_eq!(douglas["specialties"][1]["name"], "surgery");
}

#[tokio::test]
async fn unknown_ids_answer_not_found() {
    let srv = TestServer::spawn().await;

    for path in [
        "/owners/99",
        "/owners/abc",
        "/owners/99/edit",
        "/owners/1/pets/2/edit",
        "/owners/1/pets/99/visits/new",
    ] {
        let res = srv.get(path).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND, "GET {path}");
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["error"], "not_found");
    }
}
