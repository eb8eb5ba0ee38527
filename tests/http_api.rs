//! Full-stack tests: middleware chain, router, views and the in-memory store.

use assert_json_diff::assert_json_include;
use chrono::{Duration, TimeZone, Utc};
use hyper::header::AUTHORIZATION;
use hyper::{Method, StatusCode};
use serde_json::json;
use std::sync::Arc;
use wingz_admin::auth::StaticTokenBackend;
use wingz_admin::geo::Coordinates;
use wingz_admin::http::{Handler, MiddlewareChain, Request, Response};
use wingz_admin::middleware::{AuthenticationMiddleware, LoggingMiddleware};
use wingz_admin::models::{Ride, RideEvent, RideStatus, User, UserRole};
use wingz_admin::routes::Router;
use wingz_admin::store::MemoryRideStore;

fn user(id: i64, role: UserRole, email: &str) -> User {
	User {
		id,
		username: format!("user{id}"),
		email: email.to_string(),
		role,
		phone_number: None,
		first_name: "Test".to_string(),
		last_name: "User".to_string(),
	}
}

fn ride(id: i64, id_rider: i64, status: RideStatus, pickup: Coordinates) -> Ride {
	let t = Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap() + Duration::minutes(id);
	Ride {
		id_ride: id,
		status,
		id_rider,
		id_driver: None,
		pickup_latitude: pickup.latitude,
		pickup_longitude: pickup.longitude,
		dropoff_latitude: 0.0,
		dropoff_longitude: 0.0,
		pickup_time: t,
		created_at: t,
		updated_at: t,
	}
}

fn app() -> (MiddlewareChain, Arc<MemoryRideStore>) {
	let store = Arc::new(MemoryRideStore::new());
	store.add_user(user(1, UserRole::Rider, "alice@example.com"));
	store.add_ride(ride(
		1,
		1,
		RideStatus::Completed,
		// San Francisco.
		Coordinates::new(37.7749, -122.4194),
	));
	store.add_ride(ride(
		2,
		1,
		RideStatus::EnRoute,
		// Los Angeles.
		Coordinates::new(34.0522, -118.2437),
	));
	store.add_event(RideEvent {
		id_ride_event: 1,
		id_ride: 1,
		description: "Status changed to completed".to_string(),
		created_at: Utc::now() - Duration::hours(2),
	});

	let backend = StaticTokenBackend::new()
		.with_token("admin-token", user(100, UserRole::Admin, "admin@example.com"))
		.with_token("rider-token", user(101, UserRole::Rider, "rider@example.com"));

	let chain = MiddlewareChain::new(Arc::new(Router::new(store.clone())))
		.with_middleware(Arc::new(LoggingMiddleware))
		.with_middleware(Arc::new(AuthenticationMiddleware::new(Arc::new(backend))));
	(chain, store)
}

async fn send(app: &MiddlewareChain, method: Method, uri: &str, token: Option<&str>) -> Response {
	let mut request = Request::new(method, uri.parse().unwrap());
	if let Some(token) = token {
		request = request.with_header(AUTHORIZATION, &format!("Bearer {token}"));
	}
	app.handle(request).await.expect("logging middleware renders errors")
}

async fn get(app: &MiddlewareChain, uri: &str, token: Option<&str>) -> Response {
	send(app, Method::GET, uri, token).await
}

#[tokio::test]
async fn test_health_check_needs_no_credentials() {
	let (app, _) = app();
	let response = get(&app, "/health-check", None).await;
	assert_eq!(response.status, StatusCode::OK);
	assert_eq!(response.json_body().unwrap(), json!({"status": "ok"}));
}

#[tokio::test]
async fn test_missing_credentials_are_401() {
	let (app, _) = app();
	let response = get(&app, "/rides", None).await;
	assert_eq!(response.status, StatusCode::UNAUTHORIZED);
	assert_eq!(
		response.json_body().unwrap(),
		json!({"detail": "Authentication credentials were not provided."})
	);
}

#[tokio::test]
async fn test_bad_token_is_401() {
	let (app, _) = app();
	let response = get(&app, "/rides", Some("wrong")).await;
	assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_non_admin_is_403() {
	let (app, _) = app();
	let response = get(&app, "/rides", Some("rider-token")).await;
	assert_eq!(response.status, StatusCode::FORBIDDEN);
	assert_eq!(
		response.json_body().unwrap(),
		json!({"detail": "You do not have permission to perform this action."})
	);
}

#[tokio::test]
async fn test_list_envelope_shape() {
	let (app, _) = app();
	let response = get(&app, "/rides", Some("admin-token")).await;
	assert_eq!(response.status, StatusCode::OK);

	let body = response.json_body().unwrap();
	assert_eq!(body["count"], 2);
	assert!(body["next"].is_null());
	assert!(body["previous"].is_null());
	assert_json_include!(
		actual: body["results"][1].clone(),
		expected: json!({
			"id_ride": 1,
			"status": "completed",
			"rider": {"email": "alice@example.com"},
			"driver": null,
		})
	);
	assert_eq!(
		body["results"][1]["todays_ride_events"][0]["description"],
		"Status changed to completed"
	);
}

#[tokio::test]
async fn test_lat_without_lng_is_400() {
	let (app, _) = app();
	let response = get(&app, "/rides?lat=37.7749", Some("admin-token")).await;
	assert_eq!(response.status, StatusCode::BAD_REQUEST);
	assert_eq!(
		response.json_body().unwrap(),
		json!({"coordinates": "Both lat and lng are required together"})
	);
}

#[tokio::test]
async fn test_out_of_range_coordinates_are_400() {
	let (app, _) = app();
	for uri in ["/rides?lat=91&lng=0", "/rides?lat=0&lng=181"] {
		let response = get(&app, uri, Some("admin-token")).await;
		assert_eq!(response.status, StatusCode::BAD_REQUEST, "{uri}");
		assert_eq!(
			response.json_body().unwrap(),
			json!({"coordinates": "Invalid coordinates. Lat: -90 to 90, Lng: -180 to 180"}),
			"{uri}"
		);
	}
}

#[tokio::test]
async fn test_unparsable_coordinates_are_400() {
	let (app, _) = app();
	let response = get(&app, "/rides?lat=abc&lng=0", Some("admin-token")).await;
	assert_eq!(response.status, StatusCode::BAD_REQUEST);
	assert_eq!(
		response.json_body().unwrap(),
		json!({"coordinates": "Invalid coordinate format"})
	);
}

#[tokio::test]
async fn test_distance_ordering_without_coordinates_is_400() {
	let (app, _) = app();
	let response = get(&app, "/rides?ordering=distance", Some("admin-token")).await;
	assert_eq!(response.status, StatusCode::BAD_REQUEST);
	assert_eq!(
		response.json_body().unwrap(),
		json!({"ordering": "Ordering by distance requires lat and lng"})
	);
}

#[tokio::test]
async fn test_unknown_status_is_400() {
	let (app, _) = app();
	let response = get(&app, "/rides?status=parked", Some("admin-token")).await;
	assert_eq!(response.status, StatusCode::BAD_REQUEST);
	let body = response.json_body().unwrap();
	assert!(body["status"]
		.as_str()
		.unwrap()
		.contains("en-route, pickup, dropoff, completed, cancelled"));
}

#[tokio::test]
async fn test_invalid_page_is_400() {
	let (app, _) = app();
	for uri in ["/rides?page=0", "/rides?page=abc"] {
		let response = get(&app, uri, Some("admin-token")).await;
		assert_eq!(response.status, StatusCode::BAD_REQUEST, "{uri}");
		assert_eq!(response.json_body().unwrap(), json!({"page": "Invalid page."}));
	}
}

#[tokio::test]
async fn test_distance_annotation_and_ordering() {
	let (app, _) = app();
	let response = get(
		&app,
		"/rides?lat=37.7749&lng=-122.4194&ordering=distance",
		Some("admin-token"),
	)
	.await;
	assert_eq!(response.status, StatusCode::OK);

	let body = response.json_body().unwrap();
	assert_eq!(body["results"][0]["id_ride"], 1);
	assert!(body["results"][0]["distance"].as_f64().unwrap() < 1.0);
	// SF to LA is roughly 559 km.
	let la = body["results"][1]["distance"].as_f64().unwrap();
	assert!((la - 559.0).abs() < 5.0, "got {la}");
}

#[tokio::test]
async fn test_distance_is_absent_without_coordinates() {
	let (app, _) = app();
	let response = get(&app, "/rides", Some("admin-token")).await;
	let body = response.json_body().unwrap();
	assert!(body["results"][0].get("distance").is_none());
}

#[tokio::test]
async fn test_retrieve_and_not_found() {
	let (app, _) = app();
	let response = get(&app, "/rides/1", Some("admin-token")).await;
	assert_eq!(response.status, StatusCode::OK);
	assert_eq!(response.json_body().unwrap()["id_ride"], 1);

	let response = get(&app, "/rides/999", Some("admin-token")).await;
	assert_eq!(response.status, StatusCode::NOT_FOUND);
	assert_eq!(response.json_body().unwrap(), json!({"detail": "Not found."}));
}

#[tokio::test]
async fn test_unknown_route_is_404_and_wrong_method_is_405() {
	let (app, _) = app();
	let response = get(&app, "/fares", Some("admin-token")).await;
	assert_eq!(response.status, StatusCode::NOT_FOUND);

	let response = send(&app, Method::POST, "/rides", Some("admin-token")).await;
	assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);

	// Without credentials the wrong method still answers 401 first.
	let response = send(&app, Method::POST, "/rides", None).await;
	assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_pagination_links_preserve_filters() {
	let (app, store) = app();
	for i in 3..=30 {
		store.add_ride(ride(
			i,
			1,
			RideStatus::Completed,
			Coordinates::new(37.0, -122.0),
		));
	}

	let response = get(&app, "/rides?status=completed&page=2", Some("admin-token")).await;
	assert_eq!(response.status, StatusCode::OK);
	let body = response.json_body().unwrap();
	assert_eq!(body["count"], 29);
	assert_eq!(body["results"].as_array().unwrap().len(), 10);
	assert_eq!(body["next"], "/rides?status=completed&page=3");
	assert_eq!(body["previous"], "/rides?status=completed&page=1");

	// Beyond the last page: empty results, not an error.
	let response = get(&app, "/rides?page=9", Some("admin-token")).await;
	assert_eq!(response.status, StatusCode::OK);
	let body = response.json_body().unwrap();
	assert!(body["results"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_astronomical_page_number_is_still_an_empty_page() {
	let (app, _) = app();
	let response = get(
		&app,
		"/rides?page=18446744073709551615",
		Some("admin-token"),
	)
	.await;
	assert_eq!(response.status, StatusCode::OK);
	let body = response.json_body().unwrap();
	assert_eq!(body["count"], 2);
	assert!(body["results"].as_array().unwrap().is_empty());
	assert!(body["next"].is_null());
}

#[tokio::test]
async fn test_user_and_event_endpoints() {
	let (app, _) = app();
	let response = get(&app, "/users", Some("admin-token")).await;
	assert_eq!(response.status, StatusCode::OK);
	assert_eq!(response.json_body().unwrap()["count"], 1);

	let response = get(&app, "/ride-events/1", Some("admin-token")).await;
	assert_eq!(response.status, StatusCode::OK);
	let body = response.json_body().unwrap();
	assert_eq!(body["id"], 1);
	assert_eq!(body["ride_id"], 1);
}
