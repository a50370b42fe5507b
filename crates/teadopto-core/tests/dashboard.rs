//! Home and admin figures with their failure tolerance.


use fixtures::{can_bind_localhost, client_for};
use serde_json::json;
use teadopto_core::resources::dashboard::{AdminOverview, admin_overview, featured_pets, home_stats};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn page(count: u64) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "count": count, "next": null, "previous": null, "results": []
    }))
}

/// Test: page counts and raw arrays both count; adoptions only when signed in.
#[tokio::test]
async fn test_home_stats_counts() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/pets/"))
        .respond_with(page(23))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/shelters/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}, {"id": 2}])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/adoptions/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1, "pet": 2}])))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _storage) = client_for(&server);

    let anonymous = home_stats(&client, false).await;
    assert_eq!(anonymous.pets, 23);
    assert_eq!(anonymous.shelters, 2);
    assert_eq!(anonymous.adoptions, None);
    assert_eq!(anonymous.error(), None);

    let signed_in = home_stats(&client, true).await;
    assert_eq!(signed_in.adoptions, Some(1));
}

/// Test: an adoptions failure is swallowed; a primary failure is recorded.
#[tokio::test]
async fn test_home_stats_tolerance() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/pets/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/shelters/"))
        .respond_with(page(4))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/adoptions/"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let (client, _storage) = client_for(&server);
    let stats = home_stats(&client, true).await;

    assert_eq!(stats.pets, 0);
    assert_eq!(stats.shelters, 4);
    assert_eq!(stats.adoptions, None);
    assert_eq!(stats.failed, vec!["pets"]);
    // Shelters loaded, so no page-level error.
    assert_eq!(stats.error(), None);
}

/// Test: every admin figure that fails counts as zero.
#[tokio::test]
async fn test_admin_overview_zeroes_failures() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/users/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}, {"id": 2}, {"id": 3}])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/pets/"))
        .respond_with(page(10))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/shelters/"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/adoptions/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let (client, _storage) = client_for(&server);
    assert_eq!(
        admin_overview(&client).await,
        AdminOverview {
            users: 3,
            pets: 10,
            shelters: 0,
            adoptions: 0,
        }
    );
}

/// Test: the showcase keeps only available pets.
#[tokio::test]
async fn test_featured_pets_only_available() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/pets/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 3,
            "next": null,
            "previous": null,
            "results": [
                {"id": 1, "name": "Rex", "status": "available"},
                {"id": 2, "name": "Mia", "status": "adopted"},
                {"id": 3, "name": "Tom"}
            ]
        })))
        .mount(&server)
        .await;

    let (client, _storage) = client_for(&server);
    let names: Vec<String> = featured_pets(&client)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, vec!["Rex", "Tom"]);
}
