//! Integration tests for the session-based web console.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use concert_hub::config::Config;
use concert_hub::db::ConcertFilter;
use http_body_util::BodyExt;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower::ServiceExt;

const ADMIN_FORM: &str = "email=admin%40concert-hub.local&password=password";
const BOUNDARY: &str = "concert-hub-test-boundary";

struct Browser {
    app: Router,
    cookie: Option<String>,
}

struct Reply {
    status: StatusCode,
    location: Option<String>,
    json: Value,
}

impl Browser {
    fn new(app: &Router) -> Self {
        Self {
            app: app.clone(),
            cookie: None,
        }
    }

    async fn send(&mut self, mut request: Request<Body>) -> Reply {
        if let Some(cookie) = &self.cookie {
            request
                .headers_mut()
                .insert(header::COOKIE, cookie.parse().unwrap());
        }

        let response = self.app.clone().oneshot(request).await.unwrap();

        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let pair = set_cookie.to_str().unwrap().split(';').next().unwrap();
            self.cookie = Some(pair.to_string());
        }

        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .map(|l| l.to_str().unwrap().to_string());
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&body).unwrap_or(Value::Null);

        Reply {
            status,
            location,
            json,
        }
    }

    async fn get(&mut self, uri: &str) -> Reply {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    async fn post_form(&mut self, uri: &str, form: &str) -> Reply {
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(form.to_string()))
                .unwrap(),
        )
        .await
    }

    async fn post_multipart(&mut self, uri: &str, body: Vec<u8>) -> Reply {
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }
}

fn assert_redirect(reply: &Reply, to: &str) {
    assert_eq!(reply.status, StatusCode::SEE_OTHER, "body: {}", reply.json);
    assert_eq!(reply.location.as_deref(), Some(to));
}

struct FilePart<'a> {
    field: &'a str,
    file_name: &'a str,
    content_type: &'a str,
    bytes: &'a [u8],
}

fn multipart_body(fields: &[(&str, &str)], files: &[FilePart<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    for file in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                file.field, file.file_name, file.content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(file.bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn concert_fields(title: &'static str) -> Vec<(&'static str, &'static str)> {
    vec![
        ("title", title),
        ("artist", "Band Kota"),
        ("genre", "pop"),
        ("date", "2026-05-01"),
        ("time", "20:00"),
        ("location", "Bandung"),
        ("price", "75000"),
        ("description", ""),
    ]
}

fn files_in(dir: &Path) -> usize {
    std::fs::read_dir(dir).map_or(0, |entries| entries.count())
}

async fn spawn_app() -> (Arc<concert_hub::api::AppState>, Router, PathBuf) {
    let id = uuid::Uuid::new_v4();
    let db_path = std::env::temp_dir().join(format!("concert-hub-web-test-{id}.db"));
    let upload_root = std::env::temp_dir().join(format!("concert-hub-web-uploads-{id}"));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config.uploads.root_path = upload_root.display().to_string();
    config.server.secure_cookies = false;

    let state = concert_hub::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");

    let router = concert_hub::api::router(state.clone());
    (state, router, upload_root)
}

async fn register_user(browser: &mut Browser, email: &str) {
    let form = format!(
        "name=Rina&email={}&password=rahasia1&confirmPassword=rahasia1",
        email.replace('@', "%40")
    );
    let reply = browser.post_form("/auth/register", &form).await;
    assert_redirect(&reply, "/auth/login");

    let form = format!("email={}&password=rahasia1", email.replace('@', "%40"));
    let reply = browser.post_form("/auth/login", &form).await;
    assert_redirect(&reply, "/user/dashboard");
}

#[tokio::test]
async fn test_login_redirects_admin_to_dashboard() {
    let (_, app, _) = spawn_app().await;
    let mut browser = Browser::new(&app);

    let reply = browser.get("/").await;
    assert_redirect(&reply, "/auth/login");

    let reply = browser.post_form("/auth/login", ADMIN_FORM).await;
    assert_redirect(&reply, "/admin/dashboard");

    let reply = browser.get("/admin/dashboard").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json["page"], "admin/dashboard");
    assert_eq!(reply.json["name"], "Administrator");
    assert_eq!(reply.json["data"]["concerts"], serde_json::json!([]));

    let reply = browser.get("/auth/login").await;
    assert_redirect(&reply, "/admin/dashboard");

    let reply = browser.post_form("/auth/logout", "").await;
    assert_redirect(&reply, "/auth/login");

    let reply = browser.get("/admin/dashboard").await;
    assert_redirect(&reply, "/auth/login");
}

#[tokio::test]
async fn test_failed_login_flash_is_shown_once() {
    let (_, app, _) = spawn_app().await;
    let mut browser = Browser::new(&app);

    let reply = browser
        .post_form(
            "/auth/login",
            "email=admin%40concert-hub.local&password=wrong-one",
        )
        .await;
    assert_redirect(&reply, "/auth/login");

    let reply = browser.get("/auth/login").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(
        reply.json["flash"]["error"],
        serde_json::json!(["Email atau password salah"])
    );

    let reply = browser.get("/auth/login").await;
    assert_eq!(reply.json["flash"]["error"], serde_json::json!([]));
}

#[tokio::test]
async fn test_admin_pages_reject_regular_users() {
    let (_, app, _) = spawn_app().await;

    let mut anonymous = Browser::new(&app);
    let reply = anonymous.get("/admin/users").await;
    assert_redirect(&reply, "/auth/login");

    let mut user = Browser::new(&app);
    register_user(&mut user, "rina@example.com").await;

    let reply = user.get("/admin/dashboard").await;
    assert_redirect(&reply, "/auth/login");

    let reply = user.get("/auth/login").await;
    assert_eq!(
        reply.json["flash"]["error"],
        serde_json::json!(["Akses ditolak. Halaman ini hanya untuk admin."])
    );
}

#[tokio::test]
async fn test_admin_concert_lifecycle_with_uploads() {
    let (state, app, upload_root) = spawn_app().await;
    let mut admin = Browser::new(&app);
    admin.post_form("/auth/login", ADMIN_FORM).await;

    let image_dir = upload_root.join("concerts");
    let music_dir = upload_root.join("music");

    let body = multipart_body(
        &concert_fields("Pop Fest"),
        &[
            FilePart {
                field: "image",
                file_name: "poster.png",
                content_type: "image/png",
                bytes: b"\x89PNG fake image",
            },
            FilePart {
                field: "music",
                file_name: "preview.mp3",
                content_type: "audio/mpeg",
                bytes: b"ID3 fake audio",
            },
        ],
    );
    let reply = admin.post_multipart("/admin/concerts/add", body).await;
    assert_redirect(&reply, "/admin/dashboard");
    assert_eq!(files_in(&image_dir), 1);
    assert_eq!(files_in(&music_dir), 1);

    let concerts = state
        .concerts()
        .list(ConcertFilter::default())
        .await
        .unwrap();
    assert_eq!(concerts.len(), 1);
    let created = concerts[0].clone();
    assert_eq!(created.name, "Pop Fest");
    assert!(created.image_url.starts_with("/uploads/concerts/"));
    assert!(created.image_url.ends_with(".png"));
    let music_url = created.music_url.clone().unwrap();
    assert!(music_url.starts_with("/uploads/music/"));

    let reply = admin.get("/admin/dashboard").await;
    assert_eq!(
        reply.json["flash"]["success"],
        serde_json::json!(["Konser berhasil ditambahkan"])
    );

    // Edit without new files keeps both references.
    let mut fields = concert_fields("Pop Fest Reloaded");
    fields.retain(|(k, _)| *k != "price");
    fields.push(("price", "0"));
    let reply = admin
        .post_multipart(
            &format!("/admin/concerts/edit/{}", created.id),
            multipart_body(&fields, &[]),
        )
        .await;
    assert_redirect(&reply, "/admin/dashboard");

    let updated = state.concerts().get(created.id).await.unwrap();
    assert_eq!(updated.name, "Pop Fest Reloaded");
    assert!(updated.price.abs() < f64::EPSILON);
    assert_eq!(updated.image_url, created.image_url);
    assert_eq!(updated.music_url, created.music_url);

    let reply = admin.get(&format!("/admin/concerts/edit/{}", created.id)).await;
    assert_eq!(reply.json["page"], "admin/edit-concert");
    assert_eq!(reply.json["data"]["concert"]["name"], "Pop Fest Reloaded");

    let reply = admin
        .post_form(&format!("/admin/concerts/delete/{}", created.id), "")
        .await;
    assert_redirect(&reply, "/admin/dashboard");
    assert!(state.concerts().get(created.id).await.is_err());
}

#[tokio::test]
async fn test_deleting_missing_concert_is_not_an_error() {
    let (_, app, _) = spawn_app().await;
    let mut admin = Browser::new(&app);
    admin.post_form("/auth/login", ADMIN_FORM).await;

    for id in ["9999", "not-a-number"] {
        let reply = admin
            .post_form(&format!("/admin/concerts/delete/{id}"), "")
            .await;
        assert_redirect(&reply, "/admin/dashboard");

        let reply = admin.get("/admin/dashboard").await;
        assert_eq!(reply.json["flash"]["error"], serde_json::json!([]));
        assert_eq!(
            reply.json["flash"]["success"],
            serde_json::json!(["Konser berhasil dihapus"])
        );
    }
}

#[tokio::test]
async fn test_rejected_uploads_leave_no_files() {
    let (state, app, upload_root) = spawn_app().await;
    let mut admin = Browser::new(&app);
    admin.post_form("/auth/login", ADMIN_FORM).await;

    let image_dir = upload_root.join("concerts");

    let body = multipart_body(
        &concert_fields("Bad Upload"),
        &[FilePart {
            field: "image",
            file_name: "notes.txt",
            content_type: "text/plain",
            bytes: b"not an image",
        }],
    );
    let reply = admin.post_multipart("/admin/concerts/add", body).await;
    assert_redirect(&reply, "/admin/concerts/add");

    let reply = admin.get("/admin/concerts/add").await;
    assert_eq!(
        reply.json["flash"]["error"],
        serde_json::json!(["Hanya file JPG/PNG/GIF dan MP3 yang diperbolehkan"])
    );

    // Valid image, invalid genre: the stored image must be removed again.
    let mut fields = concert_fields("Bad Genre");
    fields.retain(|(k, _)| *k != "genre");
    fields.push(("genre", "metal"));
    let body = multipart_body(
        &fields,
        &[FilePart {
            field: "image",
            file_name: "poster.jpg",
            content_type: "image/jpeg",
            bytes: b"fake jpeg",
        }],
    );
    let reply = admin.post_multipart("/admin/concerts/add", body).await;
    assert_redirect(&reply, "/admin/concerts/add");

    assert_eq!(files_in(&image_dir), 0);
    assert!(
        state
            .concerts()
            .list(ConcertFilter::default())
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_user_portal_key_flow() {
    let (state, app, _) = spawn_app().await;
    let mut user = Browser::new(&app);
    register_user(&mut user, "portal@example.com").await;

    let reply = user.get("/user/dashboard").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.json["data"]["apiKey"].is_null());

    let reply = user.get("/user/concerts").await;
    assert_redirect(&reply, "/user/dashboard");

    let reply = user.post_form("/user/api-key/generate", "").await;
    assert_redirect(&reply, "/user/dashboard");

    let reply = user.get("/user/dashboard").await;
    assert_eq!(
        reply.json["flash"]["success"],
        serde_json::json!(["API Key berhasil di-generate!"])
    );
    let key = reply.json["data"]["apiKey"]["apiKey"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(key.starts_with("ck_"));

    let reply = user
        .post_form("/user/api-key/validate", "api_key=ck_wrong")
        .await;
    assert_redirect(&reply, "/user/dashboard");

    let reply = user
        .post_form("/user/api-key/validate", &format!("api_key={key}"))
        .await;
    assert_redirect(&reply, "/user/concerts");

    let reply = user.get("/user/concerts").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json["page"], "user/concerts");

    let reply = user.get("/user/concerts/9999").await;
    assert_redirect(&reply, "/user/concerts");

    let stored = state.store().get_user_by_email("portal@example.com").await;
    let user_id = stored.unwrap().unwrap().id;
    assert_eq!(state.store().count_active_api_keys(user_id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_admin_user_management() {
    let (state, app, _) = spawn_app().await;

    let mut member = Browser::new(&app);
    register_user(&mut member, "member@example.com").await;
    let member_id = state
        .store()
        .get_user_by_email("member@example.com")
        .await
        .unwrap()
        .unwrap()
        .id;

    let mut admin = Browser::new(&app);
    admin.post_form("/auth/login", ADMIN_FORM).await;

    let reply = admin.get("/admin/users").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json["data"]["users"].as_array().unwrap().len(), 2);

    let reply = admin
        .post_form(
            &format!("/admin/users/edit/{member_id}"),
            "name=Member+Baru&email=member%40example.com&role=admin",
        )
        .await;
    assert_redirect(&reply, "/admin/users");

    // The promotion takes effect on the member's next request.
    let reply = member.get("/admin/dashboard").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json["name"], "Member Baru");

    let admin_id = state
        .store()
        .get_user_by_email("admin@concert-hub.local")
        .await
        .unwrap()
        .unwrap()
        .id;
    let reply = admin
        .post_form(&format!("/admin/users/delete/{admin_id}"), "")
        .await;
    assert_redirect(&reply, "/admin/users");
    let reply = admin.get("/admin/users").await;
    assert_eq!(
        reply.json["flash"]["error"],
        serde_json::json!(["Anda tidak dapat menghapus akun sendiri"])
    );

    let reply = admin
        .post_form(&format!("/admin/users/delete/{member_id}"), "")
        .await;
    assert_redirect(&reply, "/admin/users");
    assert!(state.store().get_user(member_id).await.unwrap().is_none());

    // A deleted principal's session no longer opens pages.
    let reply = member.get("/user/dashboard").await;
    assert_redirect(&reply, "/auth/login");
}
