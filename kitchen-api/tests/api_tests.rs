//! Integration tests for kitchen-api endpoints
//!
//! Tests cover:
//! - Health endpoint (no auth required) and Basic auth on everything else
//! - Catalog merge confirmation flow and delete guard
//! - Recipe save with unknown ingredient names, stock flags
//! - Listing caps and the `all` bypass
//! - Location reorder
//! - Image upload, size cap, fridge photo lifecycle, image serving
//! - CSV import/export
//! - Error payloads for malformed input and missing rows

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use kitchen_api::{build_router, AppState};
use kitchen_common::config::TomlConfig;
use kitchen_common::Store;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot` method

const BOUNDARY: &str = "kitchen-test-boundary";

/// Test harness: temp data folder, store and router built from `config`
struct TestApp {
    dir: TempDir,
    app: Router,
}

impl TestApp {
    async fn with_config(config: TomlConfig) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let images = dir.path().join("images");
        std::fs::create_dir_all(&images).unwrap();

        let store = Store::open(&dir.path().join("kitchen.db")).await.unwrap();
        let app = build_router(AppState::new(store, &config, images));
        Self { dir, app }
    }

    async fn new() -> Self {
        Self::with_config(TomlConfig::default()).await
    }

    fn images_dir(&self) -> std::path::PathBuf {
        self.dir.path().join("images")
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Should read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    async fn json(&self, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(json_request(method, uri, body)).await
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(empty_request("GET", uri)).await
    }
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn multipart_request(field: &str, filename: &str, content: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"{f}\"; filename=\"{n}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
            b = BOUNDARY,
            f = field,
            n = filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn seed_catalog(app: &TestApp, items: Value) {
    let (status, _) = app.json("POST", "/api/catalog", items).await;
    assert_eq!(status, StatusCode::OK);
}

// =============================================================================
// Health and authentication
// =============================================================================

#[tokio::test]
async fn test_health_endpoint_no_auth_required() {
    let mut config = TomlConfig::default();
    config.auth.username = "cook".to_string();
    config.auth.password = "secret".to_string();
    let app = TestApp::with_config(config).await;

    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "kitchen-api");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_basic_auth_required_when_configured() {
    let mut config = TomlConfig::default();
    config.auth.username = "cook".to_string();
    config.auth.password = "secret".to_string();
    let app = TestApp::with_config(config).await;

    let response = app
        .app
        .clone()
        .oneshot(empty_request("GET", "/api/catalog"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));

    let with_credentials = |pair: &str| {
        Request::builder()
            .uri("/api/catalog")
            .header(header::AUTHORIZATION, format!("Basic {}", STANDARD.encode(pair)))
            .body(Body::empty())
            .unwrap()
    };

    let (status, body) = app.send(with_credentials("cook:wrong")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (status, body) = app.send(with_credentials("cook:secret")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_api_path_is_json_404() {
    let app = TestApp::new().await;
    let (status, body) = app.get("/api/pantry").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("/api/pantry"));
}

#[tokio::test]
async fn test_front_end_served_from_static_dir() {
    let static_dir = tempfile::tempdir().unwrap();
    std::fs::write(static_dir.path().join("index.html"), "<h1>kitchen</h1>").unwrap();
    std::fs::write(static_dir.path().join("app.js"), "console.log(1)").unwrap();

    let mut config = TomlConfig::default();
    config.static_dir = Some(static_dir.path().to_path_buf());
    config.auth.username = "cook".to_string();
    config.auth.password = "secret".to_string();
    let app = TestApp::with_config(config).await;

    // Same credentials as the API
    let (status, _) = app.send(empty_request("GET", "/")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let authorized = |uri: &str| {
        Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Basic {}", STANDARD.encode("cook:secret")))
            .body(Body::empty())
            .unwrap()
    };

    let response = app.app.clone().oneshot(authorized("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"<h1>kitchen</h1>");

    let response = app.app.clone().oneshot(authorized("/app.js")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // API routes still take precedence
    let response = app.app.clone().oneshot(authorized("/api/catalog")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_no_front_end_without_static_dir() {
    let app = TestApp::new().await;
    let (status, _) = app.get("/").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Catalog
// =============================================================================

#[tokio::test]
async fn test_catalog_merge_confirmation_flow() {
    let app = TestApp::new().await;
    seed_catalog(
        &app,
        json!([
            {"name": "Negi", "kana": "ねぎ"},
            {"name": "Green onion", "classification": "ingredient"}
        ]),
    )
    .await;
    let (status, _) = app
        .json("POST", "/api/ingredients", json!({"catalog_id": 1, "amount": 2}))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .json("PUT", "/api/catalog", json!({"id": 1, "name": "Green onion"}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error_code"], "merge_confirmation_required");
    assert_eq!(body["target_id"], 2);
    assert!(body["message"].is_string());

    let (status, body) = app
        .json(
            "PUT",
            "/api/catalog",
            json!({"id": 1, "name": "Green onion", "force_merge": true}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "merged");
    assert_eq!(body["target_id"], 2);

    let (_, inventory) = app.get("/api/ingredients").await;
    assert_eq!(inventory[0]["catalog_id"], 2);
    assert_eq!(inventory[0]["name"], "Green onion");

    let (_, catalog) = app.get("/api/catalog").await;
    assert_eq!(catalog.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_catalog_rename_in_place() {
    let app = TestApp::new().await;
    seed_catalog(&app, json!([{"name": "Tomatoe"}])).await;

    let (status, body) = app
        .json(
            "PUT",
            "/api/catalog",
            json!({"id": 1, "name": "Tomato", "classification": "ingredient", "default_unit": "pc"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");

    let (_, catalog) = app.get("/api/catalog").await;
    assert_eq!(catalog[0]["name"], "Tomato");
    assert_eq!(catalog[0]["default_unit"], "pc");
}

#[tokio::test]
async fn test_catalog_delete_guard_and_usage() {
    let app = TestApp::new().await;
    seed_catalog(&app, json!([{"name": "Rice"}, {"name": "Spare"}])).await;
    let (status, _) = app
        .json("POST", "/api/recipes", json!({"name": "Onigiri", "ingredients_text": "Rice,1 cup"}))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.send(empty_request("DELETE", "/api/catalog?id=1")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("recipes"));

    let (status, body) = app.get("/api/catalog/usage?id=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["recipe_count"], 1);
    assert_eq!(body["recipe_names"][0], "Onigiri");

    let (status, body) = app.send(empty_request("DELETE", "/api/catalog?id=2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "deleted");

    let (status, _) = app.send(empty_request("DELETE", "/api/catalog?id=2")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_catalog_csv_import_and_export() {
    let app = TestApp::new().await;
    seed_catalog(&app, json!([{"name": "Onion", "category": "Vegetable"}])).await;

    let csv = "\u{FEFF}Onion,seasoning\nMirin,seasoning,Sweet,ml,みりん\nLeek,,Vegetable\n";
    let request = Request::builder()
        .method("POST")
        .uri("/api/catalog/import")
        .header(header::CONTENT_TYPE, "text/csv")
        .body(Body::from(csv))
        .unwrap();
    let (status, report) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["added"], 2);
    assert_eq!(report["skipped"], 1);

    let response = app
        .app
        .clone()
        .oneshot(empty_request("GET", "/api/catalog/export"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap().to_string();
    assert!(disposition.contains("catalog_export_"));

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "name,classification,category,default_unit,kana");
    assert_eq!(lines[1], "Leek,ingredient,Vegetable,,");
    assert_eq!(lines[2], "Onion,ingredient,Vegetable,,");
    assert_eq!(lines[3], "Mirin,seasoning,,ml,みりん");
}

// =============================================================================
// Recipes
// =============================================================================

#[tokio::test]
async fn test_recipe_missing_ingredients_payload() {
    let app = TestApp::new().await;
    seed_catalog(&app, json!([{"name": "Onion"}])).await;

    let (status, body) = app
        .json(
            "POST",
            "/api/recipes",
            json!({"name": "Curry", "ingredients_text": "Onion,1\nCurry roux,1 box\nPork…200g"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "missing_ingredients");
    assert_eq!(body["items"], json!(["Curry roux", "Pork"]));

    let (_, recipes) = app.get("/api/recipes").await;
    assert!(recipes.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_recipe_flags_and_ingredient_view() {
    let app = TestApp::new().await;
    seed_catalog(
        &app,
        json!([
            {"name": "Onion", "kana": "たまねぎ"},
            {"name": "Pork"},
            {"name": "Soy sauce", "classification": "seasoning"}
        ]),
    )
    .await;
    app.json("POST", "/api/ingredients", json!({"catalog_id": 1})).await;
    app.json("POST", "/api/ingredients", json!({"catalog_id": 3})).await;

    let (status, created) = app
        .json(
            "POST",
            "/api/recipes",
            json!({
                "name": "Shogayaki",
                "yield": "2 servings",
                "csv_data": "たまねぎ…1/2\nPork,200g\n= Sauce =\nSoy sauce,2 tbsp"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_i64().unwrap();

    let (_, recipes) = app.get("/api/recipes").await;
    assert_eq!(recipes[0]["name"], "Shogayaki");
    assert_eq!(recipes[0]["yield"], "2 servings");
    assert_eq!(recipes[0]["has_ingredients"], false);
    assert_eq!(recipes[0]["has_seasonings"], true);

    let (_, filtered) = app.get("/api/recipes?ingredient_id=2").await;
    assert_eq!(filtered.as_array().unwrap().len(), 1);
    let (_, none) = app.get("/api/recipes?ingredient_id=99").await;
    assert!(none.as_array().unwrap().is_empty());

    let (status, lines) = app.get(&format!("/api/recipes/ingredients?id={}", id)).await;
    assert_eq!(status, StatusCode::OK);
    let lines = lines.as_array().unwrap();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0]["name"], "Onion");
    assert_eq!(lines[0]["in_stock"], true);
    assert_eq!(lines[1]["in_stock"], false);
    assert_eq!(lines[2]["group_name"], "Sauce");

    let (status, _) = app
        .json(
            "PUT",
            &format!("/api/recipes?id={}", id),
            json!({"name": "Shogayaki", "ingredients_text": "Onion,1"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let (_, recipes) = app.get("/api/recipes").await;
    assert_eq!(recipes[0]["has_ingredients"], true);
}

#[tokio::test]
async fn test_recipe_update_unknown_id_is_not_found() {
    let app = TestApp::new().await;
    let (status, body) = app
        .json("PUT", "/api/recipes?id=12", json!({"name": "Ghost"}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

// =============================================================================
// Inventory, locations
// =============================================================================

#[tokio::test]
async fn test_listing_caps_and_all_bypass() {
    let mut config = TomlConfig::default();
    config.listing.constrained = true;
    config.listing.inventory_row_cap = 1;
    config.listing.recipe_row_cap = 1;
    let app = TestApp::with_config(config).await;

    seed_catalog(&app, json!([{"name": "Egg"}, {"name": "Milk"}])).await;
    app.json("POST", "/api/ingredients", json!({"catalog_id": 1})).await;
    app.json("POST", "/api/ingredients", json!({"catalog_id": 2})).await;
    app.json("POST", "/api/recipes", json!({"name": "A", "ingredients_text": "Egg"})).await;
    app.json("POST", "/api/recipes", json!({"name": "B", "ingredients_text": "Milk"})).await;

    let (_, capped) = app.get("/api/ingredients").await;
    assert_eq!(capped.as_array().unwrap().len(), 1);
    let (_, all) = app.get("/api/ingredients?all=true").await;
    assert_eq!(all.as_array().unwrap().len(), 2);

    let (_, capped) = app.get("/api/recipes").await;
    assert_eq!(capped.as_array().unwrap().len(), 1);
    let (_, all) = app.get("/api/recipes?all=true").await;
    assert_eq!(all.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_inventory_update_and_errors() {
    let app = TestApp::new().await;
    seed_catalog(&app, json!([{"name": "Tofu", "default_unit": "block"}])).await;

    let (status, created) = app
        .json("POST", "/api/ingredients", json!({"catalog_id": 1, "amount": 1}))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_i64().unwrap();

    let (_, inventory) = app.get("/api/ingredients").await;
    assert_eq!(inventory[0]["location"], "Other");
    assert_eq!(inventory[0]["unit"], "block");

    let (status, body) = app
        .json(
            "PUT",
            "/api/ingredients",
            json!({"id": id, "amount": 0.5, "expiration_date": "2026-10-30", "location_id": 1}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "updated");
    let (_, inventory) = app.get("/api/ingredients").await;
    assert_eq!(inventory[0]["location"], "Fridge");

    // Dangling catalog reference
    let (status, _) = app.json("POST", "/api/ingredients", json!({"catalog_id": 99})).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Malformed body
    let request = Request::builder()
        .method("POST")
        .uri("/api/ingredients")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    // Missing id parameter
    let (status, body) = app.send(empty_request("DELETE", "/api/ingredients")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = app.send(empty_request("DELETE", "/api/ingredients?id=999")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_location_add_reorder_delete() {
    let app = TestApp::new().await;

    let (status, created) = app.json("POST", "/api/locations", json!({"name": "Pantry"})).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["priority"], 7);

    let (status, _) = app.json("POST", "/api/locations", json!({"name": "Pantry"})).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, locations) = app.get("/api/locations").await;
    let mut order: Vec<Value> = locations.as_array().unwrap().clone();
    order.reverse();
    let (status, body) = app.json("PUT", "/api/locations", Value::Array(order)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");

    let (_, locations) = app.get("/api/locations").await;
    assert_eq!(locations[0]["name"], "Pantry");
    assert_eq!(locations[0]["priority"], 1);
    assert_eq!(locations[6]["name"], "Fridge");

    let pantry = created["id"].as_i64().unwrap();
    let (status, _) = app
        .send(empty_request("DELETE", &format!("/api/locations?id={}", pantry)))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_seasoning_list_endpoints() {
    let app = TestApp::new().await;
    seed_catalog(&app, json!([{"name": "Miso", "classification": "seasoning"}])).await;

    let (status, created) = app.json("POST", "/api/seasonings", json!({"catalog_id": 1})).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, list) = app.get("/api/seasonings").await;
    assert_eq!(list[0]["name"], "Miso");
    assert_eq!(list[0]["status"], "present");

    let (status, _) = app.send(empty_request("DELETE", "/api/catalog?id=1")).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let uri = format!("/api/seasonings?id={}", created["id"]);
    let (status, _) = app.send(empty_request("DELETE", &uri)).await;
    assert_eq!(status, StatusCode::OK);
}

// =============================================================================
// Upload and fridge photos
// =============================================================================

#[tokio::test]
async fn test_upload_and_photo_lifecycle() {
    let app = TestApp::new().await;

    let (status, body) = app.send(multipart_request("photo", "fridge.PNG", b"\x89PNG fake")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    let filename = body["filename"].as_str().unwrap().to_string();
    assert!(filename.starts_with("img_") && filename.ends_with(".png"));
    assert!(app.images_dir().join(&filename).exists());

    // Served back under /images
    let response = app
        .app
        .clone()
        .oneshot(empty_request("GET", &format!("/images/{}", filename)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"\x89PNG fake");

    let (status, photo) = app
        .json(
            "POST",
            "/api/fridge_photos",
            json!({"image_path": format!("images/{}", filename)}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(photo["location"], "Other");

    let (_, photos) = app.get("/api/fridge_photos").await;
    assert_eq!(photos.as_array().unwrap().len(), 1);

    let uri = format!("/api/fridge_photos?id={}", photo["id"]);
    let (status, body) = app.send(empty_request("DELETE", &uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "deleted");
    assert!(!app.images_dir().join(&filename).exists());
}

#[tokio::test]
async fn test_upload_requires_photo_field() {
    let app = TestApp::new().await;
    let (status, body) = app.send(multipart_request("document", "a.jpg", b"data")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_upload_over_cap_is_rejected() {
    let mut config = TomlConfig::default();
    config.upload.max_bytes = 64;
    let app = TestApp::with_config(config).await;

    let (status, body) = app.send(multipart_request("photo", "big.jpg", &[0u8; 4096])).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(body["error"].is_string());
    assert_eq!(std::fs::read_dir(app.images_dir()).unwrap().count(), 0);
}
