use chrono::{Duration as Days, Local};
use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Deserialize)]
struct DraftSet {
    exercise_name: String,
    set_no: u32,
    reps: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct WorkoutSet {
    exercise_name: String,
    set_no: u32,
}

#[derive(Debug, Deserialize)]
struct WorkoutSession {
    id: u64,
    sets: Vec<WorkoutSet>,
}

struct TestServer {
    base_url: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

static TEST_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));
static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));

#[cfg(unix)]
mod cleanup {
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Once;

    static REGISTER: Once = Once::new();
    static PID: AtomicI32 = AtomicI32::new(0);

    pub fn register(pid: u32) {
        REGISTER.call_once(|| {
            PID.store(pid as i32, Ordering::SeqCst);
            unsafe {
                libc::atexit(on_exit);
            }
        });
    }

    extern "C" fn on_exit() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn unique_data_path() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("fitness_tracker_http_{}_{}.json", std::process::id(), nanos));
    path.to_string_lossy().to_string()
}

fn today() -> String {
    Local::now().date_naive().to_string()
}

fn days_ago(days: i64) -> String {
    (Local::now().date_naive() - Days::days(days)).to_string()
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server() -> TestServer {
    let port = pick_free_port();
    let data_path = unique_data_path();
    let child = Command::new(env!("CARGO_BIN_EXE_fitness_tracker"))
        .env("PORT", port.to_string())
        .env("APP_DATA_PATH", data_path)
        .env("DASHBOARD_REFRESH_SECS", "30")
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer { base_url, child }
}

async fn shared_server() -> Arc<TestServer> {
    let mut guard = SERVER.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let server = Arc::new(spawn_server().await);
    *guard = Some(Arc::clone(&server));
    server
}

async fn ensure_profile(client: &Client, base_url: &str) {
    let response = client
        .put(format!("{base_url}/api/profile"))
        .json(&json!({
            "sex": "female",
            "age": 34,
            "height_cm": 165.0,
            "activity_level": 1.4,
        }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
}

#[tokio::test]
async fn http_summary_merges_logged_series() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    ensure_profile(&client, &server.base_url).await;

    let weigh_in = days_ago(2);
    let response = client
        .post(format!("{}/api/body-logs", server.base_url))
        .json(&json!({ "date": weigh_in, "weight_kg": 61.5, "bodyfat_pct": 24.0 }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let meal_day = days_ago(1);
    let response = client
        .post(format!("{}/api/meal-logs", server.base_url))
        .json(&json!({
            "date": meal_day,
            "meal_type": "dinner",
            "calories_kcal": 850,
            "protein_g": 42.0,
        }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let view: Value = client
        .get(format!("{}/api/dashboard/charts", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(view["has_series_data"], json!(true));
    let body = view["charts"]["body"].as_array().unwrap();
    let weigh_point = body.iter().find(|p| p["date"] == json!(weigh_in)).expect("weigh-in");
    assert_eq!(weigh_point["weight"], json!(61.5));
    assert_eq!(weigh_point["bodyfat"], json!(24.0));

    let nutrition = view["charts"]["nutrition"].as_array().unwrap();
    let meal_point = nutrition.iter().find(|p| p["date"] == json!(meal_day)).expect("meal day");
    assert!(meal_point["calories"].as_f64().unwrap() >= 850.0);
    assert!(meal_point["tdee"].as_f64().unwrap() > 0.0);
    assert!(nutrition.windows(2).all(|w| w[0]["date"].as_str() < w[1]["date"].as_str()));
}

#[tokio::test]
async fn http_live_dashboard_refreshes_after_mutation() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    ensure_profile(&client, &server.base_url).await;

    let date = today();
    let response = client
        .post(format!("{}/api/body-logs", server.base_url))
        .json(&json!({ "date": date, "weight_kg": 63.25 }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        let live: Value = client
            .get(format!("{}/api/dashboard/live", server.base_url))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let refreshed = live["status"] == json!("ready")
            && live["view"]["charts"]["body"]
                .as_array()
                .is_some_and(|points| {
                    points
                        .iter()
                        .any(|p| p["date"] == json!(date) && p["weight"] == json!(63.25))
                });
        if refreshed {
            break;
        }
        if Instant::now() > deadline {
            panic!("live dashboard never picked up the new body log: {live}");
        }
        sleep(Duration::from_millis(50)).await;
    }
}

#[tokio::test]
async fn http_template_expands_and_session_renumbers() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let template: Value = client
        .post(format!("{}/api/workouts/templates", server.base_url))
        .json(&json!({
            "name": "Upper A",
            "items": [
                { "exercise_name": "Overhead press", "target_sets": 1, "order_index": 1 },
                { "exercise_name": "Bench press", "target_sets": 2, "target_reps": "8-12", "order_index": 0 },
                { "exercise_name": "  " },
            ],
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let template_id = template["id"].as_u64().unwrap();
    assert_eq!(template["items"].as_array().unwrap().len(), 2);

    let draft: Vec<DraftSet> = client
        .get(format!("{}/api/workouts/templates/{template_id}/draft", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let numbering: Vec<(&str, u32)> = draft
        .iter()
        .map(|s| (s.exercise_name.as_str(), s.set_no))
        .collect();
    assert_eq!(
        numbering,
        [("Bench press", 1), ("Bench press", 2), ("Overhead press", 1)]
    );
    assert_eq!(draft[0].reps, Some(812));

    let session: WorkoutSession = client
        .post(format!("{}/api/workouts/sessions", server.base_url))
        .json(&json!({
            "date": today(),
            "template_id": template_id,
            "sets": [
                { "exercise_name": "Bench press", "set_no": 1, "reps": 10 },
                { "exercise_name": "", "set_no": 2 },
                { "exercise_name": "Bench press", "set_no": 2, "reps": 9 },
                { "exercise_name": "Overhead press", "set_no": 1 },
            ],
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(session.sets.iter().map(|s| s.set_no).collect::<Vec<_>>(), [1, 2, 3]);
    assert_eq!(session.sets[2].exercise_name, "Overhead press");

    let stored: WorkoutSession = client
        .get(format!("{}/api/workouts/sessions/{}", server.base_url, session.id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stored.sets.len(), 3);
}

#[tokio::test]
async fn http_rejects_invalid_input() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let sessions_before: Vec<Value> = client
        .get(format!("{}/api/workouts/sessions", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let response = client
        .post(format!("{}/api/workouts/sessions", server.base_url))
        .json(&json!({ "date": today(), "sets": [{ "exercise_name": "   " }] }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let sessions_after: Vec<Value> = client
        .get(format!("{}/api/workouts/sessions", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(sessions_after.len(), sessions_before.len());

    let response = client
        .post(format!("{}/api/workouts/templates", server.base_url))
        .json(&json!({ "name": "Legs", "items": [{ "exercise_name": "Squat", "target_sets": 0 }] }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .post(format!("{}/api/workouts/templates", server.base_url))
        .json(&json!({
            "name": "Calves",
            "items": [{ "exercise_name": "Calf raise", "target_sets": i64::MAX }],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .post(format!("{}/api/meal-logs", server.base_url))
        .json(&json!({ "date": today(), "meal_type": "snack", "calories_kcal": 20000 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .get(format!("{}/api/dashboard/summary?from=yesterday", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .get(format!("{}/api/dashboard/summary?to=-262143-01-02", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
