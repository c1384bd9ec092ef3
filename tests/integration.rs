use std::sync::Arc;

use ambulance_dispatch::api::rest::router;
use ambulance_dispatch::auth::{Claims, Role};
use ambulance_dispatch::config::Config;
use ambulance_dispatch::geo::{GeoPoint, EARTH_RADIUS_M};
use ambulance_dispatch::models::driver::NewDriver;
use ambulance_dispatch::models::hospital::NewHospital;
use ambulance_dispatch::models::user::NewUser;
use ambulance_dispatch::state::AppState;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

const BOUNDARY: &str = "dispatch-test-boundary";

struct TestApp {
    app: axum::Router,
    state: Arc<AppState>,
    uploads: TempDir,
}

fn setup() -> TestApp {
    let uploads = tempfile::tempdir().unwrap();
    let config = Config {
        upload_dir: uploads.path().to_path_buf(),
        max_upload_bytes: 1024,
        bcrypt_cost: 4,
        ..Config::default()
    };
    let state = Arc::new(AppState::new(&config));

    TestApp {
        app: router(state.clone()),
        state,
        uploads,
    }
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post_empty(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn driver_signup_request(phone: &str, image: Option<(&str, &[u8])>) -> Request<Body> {
    let mut body = Vec::new();
    let fields = [
        ("name", "Ravi Kumar"),
        ("phone", phone),
        ("password", "pw-123456"),
        ("vehicleNumber", "DL01AB1234"),
        ("drivingLicense", "DL-0420110012345"),
        ("longitude", "77.0"),
        ("latitude", "28.0"),
    ];
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((content_type, bytes)) = image {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"licenseImage\"; filename=\"license\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/auth/driver/signup")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn on_duty_driver(state: &AppState, phone: &str, lng: f64, lat: f64) -> Uuid {
    let driver = state
        .drivers
        .register(NewDriver {
            name: format!("Driver {phone}"),
            phone: phone.to_string(),
            password_hash: "unused".to_string(),
            vehicle_number: "DL01AB1234".to_string(),
            driving_license: "DL-0420110012345".to_string(),
            license_image: "license.png".to_string(),
            location: GeoPoint::new(lng, lat).unwrap(),
        })
        .unwrap();
    state.drivers.set_availability(driver.id, true).unwrap();
    driver.id
}

fn user_at(state: &AppState, phone: &str, lng: f64, lat: f64) -> Uuid {
    state
        .users
        .register(NewUser {
            name: format!("User {phone}"),
            phone: phone.to_string(),
            password_hash: "unused".to_string(),
            location: Some(GeoPoint::new(lng, lat).unwrap()),
        })
        .unwrap()
        .id
}

#[tokio::test]
async fn health_returns_ok() {
    let test = setup();
    let response = test.app.oneshot(get_request("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["drivers"], 0);
    assert_eq!(body["availableDrivers"], 0);
    assert_eq!(body["bookings"], 0);
}

#[tokio::test]
async fn metrics_returns_prometheus_format() {
    let test = setup();
    let response = test.app.oneshot(get_request("/metrics")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.contains("text/plain"));

    let body = body_string(response).await;
    assert!(body.contains("available_drivers"));
    assert!(body.contains("booking_compensations_total"));
}

#[tokio::test]
async fn find_ambulances_requires_coordinates() {
    let test = setup();

    let missing = test
        .app
        .clone()
        .oneshot(get_request("/api/ambulance/find?lat=28.0"))
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

    let non_numeric = test
        .app
        .clone()
        .oneshot(get_request("/api/ambulance/find?lat=north&lng=77.0"))
        .await
        .unwrap();
    assert_eq!(non_numeric.status(), StatusCode::BAD_REQUEST);

    let out_of_range = test
        .app
        .clone()
        .oneshot(get_request("/api/ambulance/find?lat=-95.0&lng=77.0"))
        .await
        .unwrap();
    assert_eq!(out_of_range.status(), StatusCode::BAD_REQUEST);

    let negative_radius = test
        .app
        .oneshot(get_request("/api/ambulance/find?lat=28.0&lng=77.0&radius=-1"))
        .await
        .unwrap();
    assert_eq!(negative_radius.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn find_ambulances_with_no_hits_returns_404() {
    let test = setup();
    on_duty_driver(&test.state, "9000000001", 77.3, 28.3);

    let response = test
        .app
        .oneshot(get_request("/api/ambulance/find?lat=28.0&lng=77.0"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"], "no ambulances found nearby");
}

#[tokio::test]
async fn find_ambulances_lists_nearby_available_drivers() {
    let test = setup();
    let driver_id = on_duty_driver(&test.state, "9000000001", 77.0, 28.0);

    let response = test
        .app
        .oneshot(get_request(
            "/api/ambulance/find?lat=28.001&lng=77.001&radius=2",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["id"], driver_id.to_string());
    assert_eq!(list[0]["name"], "Driver 9000000001");
    assert_eq!(list[0]["phone"], "9000000001");
    assert!(list[0]["distanceMeters"].as_f64().unwrap() < 200.0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn simultaneous_bookings_have_exactly_one_winner() {
    let test = setup();
    let driver_id = on_duty_driver(&test.state, "9000000001", 77.0, 28.0);
    let users: Vec<Uuid> = (0..8)
        .map(|i| user_at(&test.state, &format!("98{i:08}"), 77.001, 28.001))
        .collect();

    let tasks: Vec<_> = users
        .iter()
        .map(|user_id| {
            let app = test.app.clone();
            let request = json_request(
                "POST",
                "/api/ambulance/book",
                json!({ "userId": user_id, "driverId": driver_id }),
            );
            tokio::spawn(async move { app.oneshot(request).await.unwrap() })
        })
        .collect();

    let mut created = 0;
    let mut already_booked = 0;
    for task in tasks {
        let response = task.await.unwrap();
        match response.status() {
            StatusCode::CREATED => {
                let body = body_json(response).await;
                assert_eq!(body["status"], "booked");
                assert_eq!(body["driverId"], driver_id.to_string());
                created += 1;
            }
            StatusCode::BAD_REQUEST => {
                let body = body_json(response).await;
                assert_eq!(body["error"], "ambulance already booked");
                already_booked += 1;
            }
            other => panic!("unexpected status {other}"),
        }
    }

    assert_eq!(created, 1);
    assert_eq!(already_booked, users.len() - 1);
    assert!(!test.state.drivers.get(driver_id).unwrap().available);

    let response = test
        .app
        .oneshot(get_request(&format!(
            "/api/bookings?driverId={driver_id}&status=booked"
        )))
        .await
        .unwrap();
    let open = body_json(response).await;
    assert_eq!(open.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn booking_unknown_driver_or_user_returns_404() {
    let test = setup();
    let driver_id = on_duty_driver(&test.state, "9000000001", 77.0, 28.0);
    let user_id = user_at(&test.state, "9811111111", 77.001, 28.001);

    let unknown_driver = test
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/ambulance/book",
            json!({ "userId": user_id, "driverId": Uuid::new_v4() }),
        ))
        .await
        .unwrap();
    assert_eq!(unknown_driver.status(), StatusCode::NOT_FOUND);

    let unknown_user = test
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/ambulance/book",
            json!({ "userId": Uuid::new_v4(), "driverId": driver_id }),
        ))
        .await
        .unwrap();
    assert_eq!(unknown_user.status(), StatusCode::NOT_FOUND);
    let body = body_json(unknown_user).await;
    assert_eq!(body["error"], "user not found");

    let malformed = test
        .app
        .oneshot(json_request(
            "POST",
            "/api/ambulance/book",
            json!({ "userId": "not-a-uuid", "driverId": driver_id }),
        ))
        .await
        .unwrap();
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn completing_a_booking_returns_driver_to_search_results() {
    let test = setup();
    let driver_id = on_duty_driver(&test.state, "9000000001", 77.0, 28.0);
    let user_id = user_at(&test.state, "9811111111", 77.001, 28.001);

    let res = test
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/ambulance/book",
            json!({ "userId": user_id, "driverId": driver_id }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let booking = body_json(res).await;
    let booking_id = booking["id"].as_str().unwrap().to_string();
    assert_eq!(booking["location"]["coordinates"], json!([77.001, 28.001]));

    let res = test
        .app
        .clone()
        .oneshot(get_request("/api/ambulance/find?lat=28.001&lng=77.001"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = test
        .app
        .clone()
        .oneshot(post_empty(&format!("/api/bookings/{booking_id}/complete")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["status"], "completed");

    let res = test
        .app
        .clone()
        .oneshot(get_request("/api/ambulance/find?lat=28.001&lng=77.001"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = test
        .app
        .oneshot(post_empty(&format!("/api/bookings/{booking_id}/cancel")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn update_availability_is_idempotent_and_404s_for_unknown_driver() {
    let test = setup();
    let driver_id = on_duty_driver(&test.state, "9000000001", 77.0, 28.0);
    let uri = format!("/api/ambulance/drivers/{driver_id}/availability");

    for _ in 0..2 {
        let res = test
            .app
            .clone()
            .oneshot(json_request("PATCH", &uri, json!({ "available": true })))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = body_json(res).await;
        assert_eq!(body["available"], true);
        assert_eq!(body["id"], driver_id.to_string());
    }

    let res = test
        .app
        .clone()
        .oneshot(json_request("PATCH", &uri, json!({ "available": false })))
        .await
        .unwrap();
    assert_eq!(body_json(res).await["available"], false);

    let res = test
        .app
        .oneshot(json_request(
            "PATCH",
            &format!("/api/ambulance/drivers/{}/availability", Uuid::new_v4()),
            json!({ "available": true }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn nearest_hospitals_are_capped_at_ten_km_and_sorted() {
    let test = setup();
    let center = GeoPoint::new(72.8777, 19.0760).unwrap();
    for km in [20.0, 9.0, 11.0, 1.0, 3.0] {
        let delta_deg = (km * 1_000.0 / EARTH_RADIUS_M).to_degrees();
        test.state
            .hospitals
            .register(NewHospital {
                name: format!("{km}km"),
                registration_number: format!("REG-{km}"),
                password_hash: "unused".to_string(),
                location: GeoPoint::new(center.lng, center.lat + delta_deg).unwrap(),
                bed_availability: 10,
            })
            .unwrap();
    }

    let res = test
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/hospital/nearest",
            json!({ "longitude": center.lng, "latitude": center.lat }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|hospital| hospital["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["1km", "3km", "9km"]);

    let res = test
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/hospital/nearest",
            json!({ "longitude": 0.0, "latitude": 0.0 }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await, json!([]));

    let res = test
        .app
        .oneshot(json_request(
            "POST",
            "/api/hospital/nearest",
            json!({ "longitude": 72.8 }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn hospital_signup_then_bed_update() {
    let test = setup();

    let res = test
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/hospital/signup",
            json!({
                "name": "City General",
                "registrationNumber": "REG-001",
                "password": "hospital-pw",
                "location": { "type": "Point", "coordinates": [77.2, 28.6] },
                "bedAvailability": 12
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let session = body_json(res).await;
    assert_eq!(session["registrationNumber"], "REG-001");
    assert_eq!(session["role"], "hospital");
    let hospital_id = session["id"].as_str().unwrap().to_string();

    let uri = format!("/api/hospital/bed-availability/{hospital_id}");
    let res = test
        .app
        .clone()
        .oneshot(json_request("PUT", &uri, json!({ "bedAvailability": 3 })))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let hospital = body_json(res).await;
    assert_eq!(hospital["bedAvailability"], 3);
    assert!(hospital.get("passwordHash").is_none());

    let res = test
        .app
        .clone()
        .oneshot(json_request("PUT", &uri, json!({ "bedAvailability": -2 })))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = test
        .app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/hospital/bed-availability/{}", Uuid::new_v4()),
            json!({ "bedAvailability": 1 }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = test
        .app
        .oneshot(json_request(
            "POST",
            "/api/auth/hospital/login",
            json!({ "registrationNumber": "REG-001", "password": "hospital-pw" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn user_signup_login_and_duplicate_phone() {
    let test = setup();
    let signup = json!({ "name": "Asha", "phone": "9811111111", "password": "pw-654321" });

    let res = test
        .app
        .clone()
        .oneshot(json_request("POST", "/api/auth/user/signup", signup.clone()))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let session = body_json(res).await;
    assert_eq!(session["phone"], "9811111111");
    let user_id: Uuid = session["id"].as_str().unwrap().parse().unwrap();
    let claims = jsonwebtoken::decode::<Claims>(
        session["token"].as_str().unwrap(),
        &DecodingKey::from_secret(Config::default().jwt_secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .unwrap()
    .claims;
    assert_eq!(claims.sub, user_id);
    assert_eq!(claims.role, Role::User);

    let res = test
        .app
        .clone()
        .oneshot(json_request("POST", "/api/auth/user/signup", signup))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(res).await["error"], "user already exists");

    let res = test
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/user/login",
            json!({ "phone": "9811111111", "password": "pw-654321" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = test
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/user/login",
            json!({ "phone": "9811111111", "password": "wrong" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(res).await["error"], "invalid credentials");

    let res = test
        .app
        .oneshot(json_request(
            "PUT",
            &format!("/api/users/{user_id}/location"),
            json!({ "location": { "type": "Point", "coordinates": [77.001, 28.001] } }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        body_json(res).await["location"]["coordinates"],
        json!([77.001, 28.001])
    );
}

#[tokio::test]
async fn driver_signup_stores_license_and_starts_off_duty() {
    let test = setup();

    let res = test
        .app
        .clone()
        .oneshot(driver_signup_request(
            "9000000009",
            Some(("image/png", b"\x89PNG fake image")),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let session = body_json(res).await;
    assert_eq!(session["vehicleNumber"], "DL01AB1234");
    let driver_id: Uuid = session["id"].as_str().unwrap().parse().unwrap();

    let driver = test.state.drivers.get(driver_id).unwrap();
    assert!(!driver.available);
    assert!(test.uploads.path().join(&driver.license_image).exists());

    let res = test
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/driver/login",
            json!({ "phone": "9000000009", "password": "pw-123456" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = test
        .app
        .oneshot(driver_signup_request(
            "9000000009",
            Some(("image/png", b"\x89PNG fake image")),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(res).await["error"], "driver already exists");
}

#[tokio::test]
async fn driver_signup_rejects_missing_or_unsupported_license() {
    let test = setup();

    let missing = test
        .app
        .clone()
        .oneshot(driver_signup_request("9000000010", None))
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

    let pdf = test
        .app
        .clone()
        .oneshot(driver_signup_request(
            "9000000010",
            Some(("application/pdf", b"%PDF-1.7")),
        ))
        .await
        .unwrap();
    assert_eq!(pdf.status(), StatusCode::BAD_REQUEST);

    let not_multipart = test
        .app
        .oneshot(json_request(
            "POST",
            "/api/auth/driver/signup",
            json!({ "name": "Ravi" }),
        ))
        .await
        .unwrap();
    assert_eq!(not_multipart.status(), StatusCode::BAD_REQUEST);

    assert!(test.state.drivers.is_empty());
    assert_eq!(std::fs::read_dir(test.uploads.path()).unwrap().count(), 0);
}
