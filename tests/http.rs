use once_cell::sync::Lazy;
use reqwest::Client;
use serde::Deserialize;
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Deserialize)]
struct UserResponse {
    id: String,
    email: String,
}

#[derive(Debug, Deserialize)]
struct HabitResponse {
    id: String,
    name: String,
    target_value: u32,
}

#[derive(Debug, Deserialize)]
struct ToggleResponse {
    completed: bool,
}

#[derive(Debug, Deserialize)]
struct ProgressResponse {
    progress: u32,
    completed: bool,
}

#[derive(Debug, Deserialize)]
struct DayStatsResponse {
    completed: u32,
    total: u32,
    rate: u8,
}

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    total_habits: u32,
    completed_today: u32,
    current_streak: u32,
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

fn unique_suffix() -> u128 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos()
}

fn unique_data_path() -> String {
    let mut path = std::env::temp_dir();
    path.push(format!(
        "habitflow_http_{}_{}.json",
        std::process::id(),
        unique_suffix()
    ));
    path.to_string_lossy().to_string()
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client
            .post(format!("{base_url}/api/auth/login"))
            .json(&serde_json::json!({ "email": "probe", "password": "probe" }))
            .send()
            .await
        {
            if resp.status().as_u16() < 500 {
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
    let child = Command::new(env!("CARGO_BIN_EXE_habitflow"))
        .env("PORT", port.to_string())
        .env("APP_DATA_PATH", data_path)
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

async fn register_user(client: &Client, base_url: &str) -> UserResponse {
    let email = format!("user_{}@example.com", unique_suffix());
    let response = client
        .post(format!("{base_url}/api/auth/register"))
        .json(&serde_json::json!({
            "name": "Test User",
            "email": email,
            "password": "secret"
        }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    response.json().await.unwrap()
}

async fn create_habit(
    client: &Client,
    base_url: &str,
    user_id: &str,
    name: &str,
    goal: Option<&str>,
) -> HabitResponse {
    let response = client
        .post(format!("{base_url}/api/habits"))
        .header("user-id", user_id)
        .json(&serde_json::json!({
            "name": name,
            "category": "health",
            "goal": goal
        }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    response.json().await.unwrap()
}

#[tokio::test]
async fn http_register_then_login() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let user = register_user(&client, &server.base_url).await;

    let login = client
        .post(format!("{}/api/auth/login", server.base_url))
        .json(&serde_json::json!({ "email": user.email, "password": "secret" }))
        .send()
        .await
        .unwrap();
    assert!(login.status().is_success());
    let logged_in: UserResponse = login.json().await.unwrap();
    assert_eq!(logged_in.id, user.id);

    let bad_login = client
        .post(format!("{}/api/auth/login", server.base_url))
        .json(&serde_json::json!({ "email": user.email, "password": "wrong" }))
        .send()
        .await
        .unwrap();
    assert_eq!(bad_login.status().as_u16(), 401);
}

#[tokio::test]
async fn http_toggle_updates_day_stats_and_summary() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let user = register_user(&client, &server.base_url).await;
    let habit = create_habit(&client, &server.base_url, &user.id, "Walk", None).await;
    assert_eq!(habit.name, "Walk");

    let toggled: ToggleResponse = client
        .post(format!("{}/api/habits/{}/toggle", server.base_url, habit.id))
        .header("user-id", &user.id)
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(toggled.completed);

    let day: DayStatsResponse = client
        .get(format!("{}/api/stats/day", server.base_url))
        .header("user-id", &user.id)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(day.completed, 1);
    assert_eq!(day.total, 1);
    assert_eq!(day.rate, 100);

    let summary: SummaryResponse = client
        .get(format!("{}/api/stats/summary", server.base_url))
        .header("user-id", &user.id)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(summary.total_habits, 1);
    assert_eq!(summary.completed_today, 1);
    assert_eq!(summary.current_streak, 1);

    // Toggling again flips the completion back off.
    let untoggled: ToggleResponse = client
        .post(format!("{}/api/habits/{}/toggle", server.base_url, habit.id))
        .header("user-id", &user.id)
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(!untoggled.completed);
}

#[tokio::test]
async fn http_progress_reaching_target_completes_the_day() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let user = register_user(&client, &server.base_url).await;
    let habit = create_habit(
        &client,
        &server.base_url,
        &user.id,
        "Read",
        Some("30 minutes of reading"),
    )
    .await;
    assert_eq!(habit.target_value, 30);

    let partial: ProgressResponse = client
        .post(format!(
            "{}/api/habits/{}/progress",
            server.base_url, habit.id
        ))
        .header("user-id", &user.id)
        .json(&serde_json::json!({ "value": 20, "add": true }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(partial.progress, 20);
    assert!(!partial.completed);

    let full: ProgressResponse = client
        .post(format!(
            "{}/api/habits/{}/progress",
            server.base_url, habit.id
        ))
        .header("user-id", &user.id)
        .json(&serde_json::json!({ "value": 10, "add": true }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(full.progress, 30);
    assert!(full.completed);

    let reduced: ProgressResponse = client
        .post(format!(
            "{}/api/habits/{}/progress",
            server.base_url, habit.id
        ))
        .header("user-id", &user.id)
        .json(&serde_json::json!({ "value": 5, "add": false }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(reduced.progress, 25);
    assert!(!reduced.completed);
}

#[tokio::test]
async fn http_rejects_missing_user_and_malformed_date() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let unauthorized = client
        .get(format!("{}/api/habits", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(unauthorized.status().as_u16(), 401);

    let user = register_user(&client, &server.base_url).await;
    let malformed = client
        .get(format!("{}/api/stats/day?date=not-a-date", server.base_url))
        .header("user-id", &user.id)
        .send()
        .await
        .unwrap();
    assert_eq!(malformed.status().as_u16(), 400);
}

#[tokio::test]
async fn http_calendar_views_have_expected_shape() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let user = register_user(&client, &server.base_url).await;
    create_habit(&client, &server.base_url, &user.id, "Stretch", None).await;

    let week: serde_json::Value = client
        .get(format!("{}/api/calendar/week", server.base_url))
        .header("user-id", &user.id)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(week["cells"].as_array().unwrap().len(), 7);
    let today_cells = week["cells"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|cell| cell["is_today"].as_bool() == Some(true))
        .count();
    assert_eq!(today_cells, 1);

    let month: serde_json::Value = client
        .get(format!("{}/api/calendar/month", server.base_url))
        .header("user-id", &user.id)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let cells = month["cells"].as_array().unwrap();
    assert!(cells.len() >= 28 && cells.len() <= 31);
    assert!(month["leading_blanks"].as_u64().unwrap() < 7);
}
