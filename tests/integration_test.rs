// Integration tests for user-admin-tui

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::StatusCode;
use user_admin_tui::api::{NewUser, Role, User, UserService, UserUpdate};
use user_admin_tui::app::dispatch::{ApiCall, ApiEvent, Dispatcher, Request, execute};
use user_admin_tui::app::keymap::Keymap;
use user_admin_tui::app::panels::{PanelForm, PanelKind};
use user_admin_tui::app::{Action, AppState, InputMode, Theme};
use user_admin_tui::error::{ApiError, ApiOp};

fn mk_user(id: u64, name: &str, role: Role) -> User {
    User {
        id,
        username: name.to_string(),
        email: format!("{name}@example.test"),
        role,
        password: format!("{name}-pw"),
    }
}

/// In-memory stand-in for the REST service.
#[derive(Default)]
struct FakeService {
    users: Mutex<Vec<User>>,
    calls: Mutex<Vec<ApiCall>>,
    reject_writes: bool,
}

impl FakeService {
    fn with_users(users: Vec<User>) -> Self {
        Self {
            users: Mutex::new(users),
            ..Default::default()
        }
    }

    fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().unwrap().clone()
    }

    fn log(&self, call: ApiCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl UserService for FakeService {
    async fn list_all(&self) -> Result<Vec<User>, ApiError> {
        self.log(ApiCall::ListAll);
        Ok(self.users.lock().unwrap().clone())
    }

    async fn find_by_id(&self, id: u64) -> Result<User, ApiError> {
        self.log(ApiCall::FindById(id));
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or(ApiError::NotFound {
                op: ApiOp::FindById,
                what: format!("user {id}"),
                status: StatusCode::NOT_FOUND,
            })
    }

    async fn find_by_role(&self, role: &Role) -> Result<Vec<String>, ApiError> {
        self.log(ApiCall::FindByRole(role.clone()));
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| &u.role == role)
            .map(|u| u.username.clone())
            .collect())
    }

    async fn create(&self, user: &NewUser) -> Result<(), ApiError> {
        self.log(ApiCall::Create(user.clone()));
        if self.reject_writes {
            return Err(ApiError::Rejected {
                op: ApiOp::Create,
                status: StatusCode::BAD_REQUEST,
            });
        }
        let mut users = self.users.lock().unwrap();
        let id = users.iter().map(|u| u.id).max().unwrap_or(0) + 1;
        users.push(User {
            id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role.clone(),
            password: user.password.clone(),
        });
        Ok(())
    }

    async fn update(&self, update: &UserUpdate) -> Result<(), ApiError> {
        self.log(ApiCall::Update(update.clone()));
        let mut users = self.users.lock().unwrap();
        match users.iter_mut().find(|u| u.id == update.id) {
            Some(u) => {
                u.username = update.username.clone();
                Ok(())
            }
            None => Err(ApiError::Rejected {
                op: ApiOp::Update,
                status: StatusCode::NOT_FOUND,
            }),
        }
    }

    async fn delete_by_id(&self, id: u64) -> Result<(), ApiError> {
        self.log(ApiCall::DeleteById(id));
        // The server accepts deletes of unknown ids.
        self.users.lock().unwrap().retain(|u| u.id != id);
        Ok(())
    }
}

fn new_app() -> AppState {
    AppState::new("http://localhost:8080", Theme::dark(), Keymap::default())
}

/// Run a request and everything it triggers, the way the event loop would.
async fn settle(app: &mut AppState, svc: &FakeService, request: Option<Request>) {
    let mut next = request;
    while let Some(req) = next {
        let reply = execute(svc, req.call).await;
        next = app.apply(ApiEvent {
            ticket: req.ticket,
            reply,
        });
    }
}

async fn fetched(svc: &FakeService) -> AppState {
    let mut app = new_app();
    let req = app.update(Action::Fetch);
    settle(&mut app, svc, req).await;
    app
}

fn type_text(app: &mut AppState, s: &str) {
    for c in s.chars() {
        app.update(Action::PanelInput(c));
    }
}

fn sample() -> Vec<User> {
    vec![
        mk_user(1, "alice", Role::Developer),
        mk_user(2, "bob", Role::Manager),
    ]
}

#[tokio::test]
async fn create_with_missing_email_issues_no_request() {
    let svc = FakeService::with_users(sample());
    let mut app = fetched(&svc).await;
    app.update(Action::OpenPanel(PanelKind::Create));
    type_text(&mut app, "carol");
    app.update(Action::PanelFocusNext);
    app.update(Action::PanelFocusNext);
    app.update(Action::PanelCycle { forward: true });
    app.update(Action::PanelFocusNext);
    type_text(&mut app, "pw");

    assert!(!app.panel.as_ref().unwrap().can_submit());
    assert!(app.update(Action::Submit).is_none());
    assert_eq!(svc.calls(), vec![ApiCall::ListAll]);
    let panel = app.panel.as_ref().expect("panel stays open");
    assert_eq!(panel.error.as_deref(), Some("Please enter the email"));
}

#[tokio::test]
async fn create_closes_panel_and_refetches() {
    let svc = FakeService::with_users(sample());
    let mut app = fetched(&svc).await;
    app.update(Action::OpenPanel(PanelKind::Create));
    type_text(&mut app, "carol");
    app.update(Action::PanelFocusNext);
    type_text(&mut app, "carol@example.test");
    app.update(Action::PanelFocusNext);
    app.update(Action::PanelCycle { forward: true });
    app.update(Action::PanelFocusNext);
    type_text(&mut app, "s3cret");

    let req = app.update(Action::Submit);
    assert!(app.panel.as_ref().unwrap().is_pending());
    settle(&mut app, &svc, req).await;

    assert!(app.panel.is_none());
    assert_eq!(app.input_mode, InputMode::Normal);
    assert_eq!(svc.calls().last(), Some(&ApiCall::ListAll));
    let carol = app.store.records().iter().find(|u| u.username == "carol").expect("carol cached");
    assert_eq!(carol.role, Role::Developer);
    assert_eq!(carol.id, 3);
}

#[tokio::test]
async fn rejected_create_keeps_panel_and_input() {
    let svc = FakeService {
        users: Mutex::new(sample()),
        reject_writes: true,
        ..Default::default()
    };
    let mut app = fetched(&svc).await;
    app.update(Action::OpenPanel(PanelKind::Create));
    type_text(&mut app, "dave");
    app.update(Action::PanelFocusNext);
    type_text(&mut app, "dave@example.test");
    app.update(Action::PanelFocusNext);
    app.update(Action::PanelCycle { forward: false });
    app.update(Action::PanelFocusNext);
    type_text(&mut app, "pw");
    let req = app.update(Action::Submit);
    settle(&mut app, &svc, req).await;

    let panel = app.panel.as_ref().expect("panel stays open");
    assert!(!panel.is_pending());
    assert_eq!(panel.error.as_deref(), Some("Failed to create user."));
    match &panel.form {
        PanelForm::Create(f) => assert_eq!(f.username, "dave"),
        other => panic!("unexpected form {other:?}"),
    }
    assert_eq!(app.store.len(), 2);
}

#[tokio::test]
async fn update_loads_then_sends_only_id_and_username() {
    let svc = FakeService::with_users(sample());
    let mut app = fetched(&svc).await;
    app.update(Action::OpenPanel(PanelKind::Update));
    type_text(&mut app, "2");
    let load = app.update(Action::LoadUserData);
    settle(&mut app, &svc, load).await;
    match &app.panel.as_ref().unwrap().form {
        PanelForm::Update(f) => assert_eq!(f.username, "bob"),
        other => panic!("unexpected form {other:?}"),
    }

    app.update(Action::PanelFocusNext);
    for _ in 0.."bob".len() {
        app.update(Action::PanelBackspace);
    }
    type_text(&mut app, "robert");
    let req = app.update(Action::Submit);
    settle(&mut app, &svc, req).await;

    assert!(app.panel.is_none());
    assert!(svc.calls().contains(&ApiCall::Update(UserUpdate {
        id: 2,
        username: "robert".into()
    })));
    assert_eq!(app.store.get(2).map(|u| u.username.as_str()), Some("robert"));
    assert_eq!(app.store.get(2).map(|u| u.email.as_str()), Some("bob@example.test"));
}

#[tokio::test]
async fn delete_patches_cache_without_refetch() {
    let svc = FakeService::with_users(sample());
    let mut app = fetched(&svc).await;

    app.update(Action::OpenPanel(PanelKind::Delete));
    type_text(&mut app, "2");
    let req = app.update(Action::Submit).expect("delete request");
    let reply = execute(&svc, req.call.clone()).await;
    let follow_up = app.apply(ApiEvent {
        ticket: req.ticket,
        reply,
    });
    assert!(follow_up.is_none());
    assert_eq!(app.store.records(), &[mk_user(1, "alice", Role::Developer)]);
    assert!(app.panel.is_none());

    app.update(Action::OpenPanel(PanelKind::Delete));
    type_text(&mut app, "99");
    let req = app.update(Action::Submit);
    settle(&mut app, &svc, req).await;
    assert_eq!(app.store.records(), &[mk_user(1, "alice", Role::Developer)]);
    assert_eq!(
        svc.calls(),
        vec![ApiCall::ListAll, ApiCall::DeleteById(2), ApiCall::DeleteById(99)]
    );
}

#[tokio::test]
async fn delete_blocks_non_positive_ids() {
    let svc = FakeService::with_users(sample());
    let mut app = fetched(&svc).await;
    app.update(Action::OpenPanel(PanelKind::Delete));
    type_text(&mut app, "0");
    assert!(app.update(Action::Submit).is_none());
    app.update(Action::PanelBackspace);
    type_text(&mut app, "-1");
    assert!(app.update(Action::Submit).is_none());
    assert_eq!(svc.calls(), vec![ApiCall::ListAll]);
}

#[tokio::test]
async fn stale_lookup_does_not_fill_reopened_panel() {
    let svc = FakeService::with_users(sample());
    let mut app = fetched(&svc).await;
    app.update(Action::OpenPanel(PanelKind::FindById));
    type_text(&mut app, "1");
    let slow = app.update(Action::Submit).expect("lookup request");

    app.update(Action::ClosePanel);
    app.update(Action::OpenPanel(PanelKind::FindById));

    let reply = execute(&svc, slow.call.clone()).await;
    app.apply(ApiEvent {
        ticket: slow.ticket,
        reply,
    });
    match &app.panel.as_ref().unwrap().form {
        PanelForm::FindById(f) => {
            assert!(f.found.is_none());
            assert!(f.id.is_empty());
        }
        other => panic!("unexpected form {other:?}"),
    }
}

#[tokio::test]
async fn delete_confirmed_after_close_still_updates_cache() {
    let svc = FakeService::with_users(sample());
    let mut app = fetched(&svc).await;
    app.update(Action::OpenPanel(PanelKind::Delete));
    type_text(&mut app, "1");
    let req = app.update(Action::Submit).expect("delete request");
    app.update(Action::ClosePanel);
    app.update(Action::OpenPanel(PanelKind::FindByRole));

    settle(&mut app, &svc, Some(req)).await;
    assert_eq!(app.store.len(), 1);
    assert_eq!(app.panel.as_ref().map(|p| p.kind()), Some(PanelKind::FindByRole));
}

#[tokio::test]
async fn find_by_id_and_role_show_results() {
    let svc = FakeService::with_users(sample());
    let mut app = fetched(&svc).await;

    app.update(Action::OpenPanel(PanelKind::FindById));
    type_text(&mut app, "2");
    let req = app.update(Action::Submit);
    settle(&mut app, &svc, req).await;
    match &app.panel.as_ref().unwrap().form {
        PanelForm::FindById(f) => assert_eq!(f.found.as_ref().map(|u| u.id), Some(2)),
        other => panic!("unexpected form {other:?}"),
    }

    app.update(Action::PanelBackspace);
    type_text(&mut app, "42");
    let req = app.update(Action::Submit);
    settle(&mut app, &svc, req).await;
    let panel = app.panel.as_ref().unwrap();
    match &panel.form {
        PanelForm::FindById(f) => assert!(f.found.is_none()),
        other => panic!("unexpected form {other:?}"),
    }
    assert_eq!(panel.error.as_deref(), Some("Failed to find user."));

    app.update(Action::ClosePanel);
    app.update(Action::OpenPanel(PanelKind::FindByRole));
    assert!(app.update(Action::Submit).is_none());
    app.update(Action::PanelCycle { forward: true });
    app.update(Action::PanelCycle { forward: true });
    let req = app.update(Action::Submit);
    settle(&mut app, &svc, req).await;
    match &app.panel.as_ref().unwrap().form {
        PanelForm::FindByRole(f) => {
            assert_eq!(f.found, Some((Role::Manager, vec!["bob".to_string()])));
        }
        other => panic!("unexpected form {other:?}"),
    }
}

#[tokio::test]
async fn dispatcher_delivers_replies_on_channel() {
    let svc = Arc::new(FakeService::with_users(sample()));
    let (dispatcher, mut rx) = Dispatcher::new(svc.clone(), tokio::runtime::Handle::current());
    let mut app = new_app();
    let req = app.update(Action::Fetch).expect("fetch request");
    let ticket = req.ticket;
    dispatcher.dispatch(req);

    let event = rx.recv().await.expect("reply");
    assert_eq!(event.ticket, ticket);
    app.apply(event);
    assert_eq!(app.store.len(), 2);
    assert!(app.store.has_fetched());
}

mod http {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;
    use url::Url;
    use user_admin_tui::api::HttpUserService;

    /// Serve one canned response and hand back the raw request text.
    async fn serve_once(status: u16, body: &'static str) -> (Url, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let handle = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.expect("accept");
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            loop {
                let n = sock.read(&mut chunk).await.expect("read");
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&buf).to_string();
                if let Some(end) = text.find("\r\n\r\n") {
                    let content_length = text[..end]
                        .lines()
                        .find_map(|l| {
                            let (k, v) = l.split_once(':')?;
                            k.eq_ignore_ascii_case("content-length")
                                .then(|| v.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if buf.len() >= end + 4 + content_length {
                        break;
                    }
                }
            }
            let response = format!(
                "HTTP/1.1 {status} Status\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            sock.write_all(response.as_bytes()).await.expect("write");
            sock.shutdown().await.ok();
            String::from_utf8_lossy(&buf).to_string()
        });
        let base = Url::parse(&format!("http://{addr}")).expect("url");
        (base, handle)
    }

    fn request_body(raw: &str) -> serde_json::Value {
        let (_, body) = raw.split_once("\r\n\r\n").expect("body");
        serde_json::from_str(body).expect("json body")
    }

    fn client(base: Url) -> HttpUserService {
        HttpUserService::new(base, None).expect("client")
    }

    #[tokio::test]
    async fn list_all_parses_records() {
        let (base, server) = serve_once(
            200,
            r#"[{"id":1,"username":"alice","email":"a@x.io","role":"Developer","password":"pw"},
                {"id":2,"username":"bob","email":"b@x.io","role":"Intern","password":"pw2"}]"#,
        )
        .await;
        let users = client(base).list_all().await.expect("list");
        assert_eq!(users.len(), 2);
        assert_eq!(users[1].role, Role::Other("Intern".into()));
        let raw = server.await.unwrap();
        assert!(raw.starts_with("GET /api/findAll HTTP/1.1"), "{raw}");
    }

    #[tokio::test]
    async fn find_by_id_maps_failure_to_not_found() {
        let (base, server) = serve_once(404, "{}").await;
        let err = client(base).find_by_id(7).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound { op: ApiOp::FindById, .. }), "{err:?}");
        let raw = server.await.unwrap();
        assert!(raw.starts_with("GET /api/findById?id=7 HTTP/1.1"), "{raw}");
    }

    #[tokio::test]
    async fn find_by_role_encodes_role_name() {
        let (base, server) = serve_once(200, r#"["ops1","ops2"]"#).await;
        let names = client(base).find_by_role(&Role::DevOpsEngineer).await.expect("role");
        assert_eq!(names, vec!["ops1", "ops2"]);
        let raw = server.await.unwrap();
        assert!(raw.starts_with("GET /api/findByRole?role=DevOps+Engineer HTTP/1.1"), "{raw}");
    }

    #[tokio::test]
    async fn create_posts_json_and_reports_rejection() {
        let (base, server) = serve_once(500, "{}").await;
        let user = NewUser {
            username: "carol".into(),
            email: "c@x.io".into(),
            role: Role::JuniorDev,
            password: "pw".into(),
        };
        let err = client(base).create(&user).await.unwrap_err();
        assert!(matches!(err, ApiError::Rejected { op: ApiOp::Create, .. }), "{err:?}");
        let raw = server.await.unwrap();
        assert!(raw.starts_with("POST /api/save HTTP/1.1"), "{raw}");
        assert_eq!(
            request_body(&raw),
            serde_json::json!({"username":"carol","email":"c@x.io","role":"Junior Dev","password":"pw"})
        );
    }

    #[tokio::test]
    async fn update_puts_id_and_username() {
        let (base, server) = serve_once(200, r#"{"id":3,"username":"neo"}"#).await;
        client(base)
            .update(&UserUpdate { id: 3, username: "neo".into() })
            .await
            .expect("update");
        let raw = server.await.unwrap();
        assert!(raw.starts_with("PUT /api/update HTTP/1.1"), "{raw}");
        assert_eq!(request_body(&raw), serde_json::json!({"id":3,"username":"neo"}));
    }

    #[tokio::test]
    async fn delete_uses_query_and_maps_failure() {
        let (base, server) = serve_once(500, "").await;
        let err = client(base).delete_by_id(2).await.unwrap_err();
        assert!(matches!(err, ApiError::DeleteFailed { id: 2, .. }), "{err:?}");
        let raw = server.await.unwrap();
        assert!(raw.starts_with("DELETE /api/deleteById?id=2 HTTP/1.1"), "{raw}");
    }

    #[tokio::test]
    async fn empty_success_body_is_fine_for_delete() {
        let (base, server) = serve_once(200, "").await;
        client(base).delete_by_id(5).await.expect("delete");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn malformed_list_is_a_decode_error() {
        let (base, server) = serve_once(200, "not json").await;
        let err = client(base).list_all().await.unwrap_err();
        assert!(matches!(err, ApiError::Decode { op: ApiOp::ListAll, .. }), "{err:?}");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn unreachable_service_is_a_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let base = Url::parse(&format!("http://{addr}")).unwrap();
        let err = client(base).list_all().await.unwrap_err();
        assert!(matches!(err, ApiError::Transport { op: ApiOp::ListAll, .. }), "{err:?}");
        assert_eq!(err.user_message(), "Failed to fetch users.");
    }
}
