use chrono::{NaiveDate, NaiveTime};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::{
    Appointment, AppointmentStatus, AppointmentStore, CommitOutcome, Requester, SupabaseAppointmentStore,
};
use shared_config::AppConfig;
use shared_utils::test_utils::{MockSupabaseResponses, TestConfig};

fn store_for(server: &MockServer) -> SupabaseAppointmentStore {
    let config: AppConfig = TestConfig {
        supabase_url: server.uri(),
        ..TestConfig::default()
    }
    .to_app_config();
    SupabaseAppointmentStore::new(&config)
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
}

fn batch() -> Vec<Appointment> {
    let requester = Requester {
        user_id: "user-1".to_string(),
        email: None,
        is_admin: false,
    };
    ["09:00", "09:30"]
        .iter()
        .map(|time| {
            Appointment::new(
                day(),
                NaiveTime::parse_from_str(time, "%H:%M").unwrap(),
                "dr-ana",
                "Maria",
                &requester,
                None,
            )
        })
        .collect()
}

#[tokio::test]
async fn test_free_keys_are_inserted_in_one_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("select", "id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .and(header("Prefer", "return=minimal"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = store_for(&server).create_all(&batch()).await.unwrap();
    assert_eq!(outcome, CommitOutcome::Committed);

    let requests = server.received_requests().await.unwrap();
    let insert = requests.iter().find(|r| r.method.as_str() == "POST").unwrap();
    let rows: serde_json::Value = serde_json::from_slice(&insert.body).unwrap();
    assert_eq!(rows.as_array().unwrap().len(), 2);
    assert_eq!(rows[1]["id"], "2025-03-10_dr-ana_09:30");
    assert_eq!(rows[1]["status"], "confirmed");
}

#[tokio::test]
async fn test_existing_key_is_a_conflict_without_writing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "2025-03-10_dr-ana_09:30" }
        ])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let outcome = store_for(&server).create_all(&batch()).await.unwrap();
    assert_eq!(
        outcome,
        CommitOutcome::Conflict {
            key: "2025-03-10_dr-ana_09:30".to_string()
        }
    );
}

#[tokio::test]
async fn test_lost_race_is_reported_as_conflict() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "2025-03-10_dr-ana_09:00" }
        ])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(409).set_body_json(
            MockSupabaseResponses::error_response("duplicate key value violates unique constraint", "23505"),
        ))
        .mount(&server)
        .await;

    let outcome = store_for(&server).create_all(&batch()).await.unwrap();
    assert_eq!(
        outcome,
        CommitOutcome::Conflict {
            key: "2025-03-10_dr-ana_09:00".to_string()
        }
    );
}

#[tokio::test]
async fn test_insert_outage_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    assert!(store_for(&server).create_all(&batch()).await.is_err());
}

#[tokio::test]
async fn test_reads_normalize_times_and_skip_bad_rows() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("date", "eq.2025-03-10"))
        .and(query_param("professional_id", "eq.dr-ana"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_response("2025-03-10", "dr-ana", "9:00", "Maria"),
            MockSupabaseResponses::appointment_response("2025-03-10", "dr-ana", "10:00:00", "João"),
            { "id": "junk", "date": "2025-03-10" }
        ])))
        .mount(&server)
        .await;

    let appointments = store_for(&server).get_appointments(day(), "dr-ana").await.unwrap();

    assert_eq!(appointments.len(), 2);
    assert_eq!(appointments[0].time, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
    assert_eq!(appointments[1].time, NaiveTime::from_hms_opt(10, 0, 0).unwrap());
    assert_eq!(appointments[0].status, AppointmentStatus::Confirmed);
}

#[tokio::test]
async fn test_update_status_patches_by_id_and_expected_status() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", "eq.2025-03-10_dr-ana_09:00"))
        .and(query_param("status", "eq.confirmed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_response("2025-03-10", "dr-ana", "09:00", "Maria")
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let updated = store_for(&server)
        .update_status(
            "2025-03-10_dr-ana_09:00",
            AppointmentStatus::Confirmed,
            AppointmentStatus::Completed,
        )
        .await
        .unwrap();
    assert!(updated);
}

#[tokio::test]
async fn test_update_status_reports_moved_on_row_as_not_updated() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("status", "eq.confirmed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let updated = store_for(&server)
        .update_status(
            "2025-03-10_dr-ana_09:00",
            AppointmentStatus::Confirmed,
            AppointmentStatus::Cancelled,
        )
        .await
        .unwrap();
    assert!(!updated);
}
