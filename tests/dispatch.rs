//! End-to-end dispatch: routing, binding, invocation and rendering through
//! `Dispatcher::handle`.

use std::fs;
use std::path::PathBuf;

use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use switchyard::{
    ActionError, ActionHandle, BoundArguments, Data, Descriptor, Dispatcher, FilePart, ModelView,
    Outcome, ParameterSpec, Reply, Request, Router, SESSION_DATA_KEY, ScalarType, Session,
    UploadCollector,
};

// ── Fixtures ──────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Users;

impl Users {
    fn show(&mut self, args: BoundArguments) -> Result<String, ActionError> {
        Ok(format!("id={}", args.int(0)?.unwrap_or(-1)))
    }

    fn fresh(&mut self, _: BoundArguments) -> &'static str {
        "new-form"
    }

    fn lookup(&mut self, args: BoundArguments) -> Result<String, ActionError> {
        Ok(format!(
            "name={:?} nick={:?}",
            args.str(0)?.unwrap_or("<none>"),
            args.str(1)?.unwrap_or("<none>"),
        ))
    }
}

#[derive(Default)]
struct Api;

impl Api {
    fn three(&mut self, _: BoundArguments) -> Data<Vec<&'static str>> {
        Data(vec!["a", "b", "c"])
    }

    fn nothing(&mut self, _: BoundArguments) {}

    fn single(&mut self, _: BoundArguments) -> Data<Value> {
        Data(json!({ "id": 1 }))
    }

    fn unsupported(&mut self, _: BoundArguments) -> Data<u32> {
        Data(7)
    }

    fn crash(&mut self, _: BoundArguments) -> String {
        panic!("controller blew up")
    }
}

#[derive(Default)]
struct Auth;

impl Auth {
    fn login(&mut self, _: BoundArguments) -> ModelView {
        ModelView::new("home")
            .with(SESSION_DATA_KEY, json!({ "user": "alice", "role": "admin" }))
            .with("flash", "welcome")
    }

    fn whoami(&mut self, args: BoundArguments) -> Result<Reply, ActionError> {
        Ok(Reply::data(args.map(0)?.cloned().unwrap_or_default()))
    }
}

#[derive(Debug, Default)]
struct Filter {
    colors: Vec<String>,
    limit: i64,
}

#[derive(Default)]
struct Search;

impl Search {
    fn run(&mut self, mut args: BoundArguments) -> Result<String, ActionError> {
        let filter = args.take_object::<Filter>(0)?.unwrap_or_default();
        Ok(format!("{}|{}", filter.colors.join(","), filter.limit))
    }
}

#[derive(Default)]
struct Files;

impl Files {
    fn store(&mut self, args: BoundArguments) -> Result<Reply, ActionError> {
        let names: Vec<String> = args.files(0)?.into_iter().flatten().map(|(k, _)| k.clone()).collect();
        Ok(Reply::data(names))
    }
}

fn scratch_dir() -> PathBuf {
    std::env::temp_dir().join(format!("switchyard-it-{}", uuid::Uuid::new_v4().simple()))
}

fn dispatcher_with(uploads: PathBuf) -> Dispatcher {
    let routes = Router::new()
        .controller("/users", |c| c
            .get("/new", ActionHandle::new("fresh", Users::fresh))
            .get("/{id}", ActionHandle::new("show", Users::show)
                .param(ParameterSpec::path_var("id", ScalarType::Int)))
            .get("/lookup/q", ActionHandle::new("lookup", Users::lookup)
                .param(ParameterSpec::request_param("name", ScalarType::Str))
                .param(ParameterSpec::path_var("name", ScalarType::Str))))
        .controller("/api", |c| c
            .get("/three", ActionHandle::new("three", Api::three).json())
            .get("/nothing", ActionHandle::new("nothing", Api::nothing).json())
            .get("/single", ActionHandle::new("single", Api::single).json())
            .get("/unsupported", ActionHandle::new("unsupported", Api::unsupported))
            .get("/crash", ActionHandle::new("crash", Api::crash)))
        .post("/login", ActionHandle::new("login", Auth::login))
        .get("/whoami", ActionHandle::new("whoami", Auth::whoami).param(ParameterSpec::session()).json())
        .get("/search", ActionHandle::new("run", Search::run).param(ParameterSpec::object(
            Descriptor::<Filter>::new("Filter")
                .list("colors", |f, v| f.colors = v)
                .int("limit", |f, v| f.limit = v),
        )))
        .post("/upload", ActionHandle::new("store", Files::store).param(ParameterSpec::uploads()).json())
        .build()
        .unwrap();
    Dispatcher::new(routes, UploadCollector::new(uploads))
}

fn dispatcher() -> Dispatcher {
    dispatcher_with(std::env::temp_dir().join("switchyard-it-unused"))
}

fn respond(outcome: &Outcome) -> (u16, String) {
    let resp = outcome.response().expect("a response");
    (resp.status_code(), resp.text_body())
}

fn json_body(outcome: &Outcome) -> Value {
    serde_json::from_slice(outcome.response().expect("a response").body()).unwrap()
}

// ── Routing and binding ───────────────────────────────────────────────────────

#[test]
fn path_variable_binds_as_integer() {
    let (status, body) = respond(&dispatcher().handle(&mut Request::new("GET", "/users/42")));
    assert_eq!(status, 200);
    assert!(body.contains("Returned: id=42"), "{body}");
}

#[test]
fn unconvertible_path_variable_is_a_bad_request() {
    let (status, body) = respond(&dispatcher().handle(&mut Request::new("GET", "/users/abc")));
    assert_eq!(status, 400);
    assert_eq!(body, "Bad Request: a request value could not be converted");
}

#[test]
fn earlier_literal_route_wins() {
    let (_, body) = respond(&dispatcher().handle(&mut Request::new("GET", "/users/new")));
    assert!(body.contains("Action: fresh"), "{body}");
}

#[test]
fn wrong_method_is_unrouted() {
    assert!(dispatcher().handle(&mut Request::new("POST", "/users/42")).is_unrouted());
    assert!(dispatcher().handle(&mut Request::new("GET", "/users/42/edit")).is_unrouted());
}

#[test]
fn missing_request_param_is_empty_but_missing_path_var_is_none() {
    let (_, body) = respond(&dispatcher().handle(&mut Request::new("GET", "/users/lookup/q")));
    assert!(body.contains(r#"name="" nick="<none>""#), "{body}");
}

#[test]
fn array_parameters_drop_empty_values() {
    let mut req = Request::new("GET", "/search")
        .with_param("colors[]", "red")
        .with_param("colors[]", "")
        .with_param("colors[]", "blue")
        .with_param("limit", "5");
    let (_, body) = respond(&dispatcher().handle(&mut req));
    assert!(body.contains("Returned: red,blue|5"), "{body}");
}

// ── Rendering ─────────────────────────────────────────────────────────────────

#[test]
fn envelope_counts() {
    let d = dispatcher();
    assert_eq!(json_body(&d.handle(&mut Request::new("GET", "/api/three")))["count"], 3);
    assert_eq!(json_body(&d.handle(&mut Request::new("GET", "/api/nothing")))["count"], 0);

    let single = json_body(&d.handle(&mut Request::new("GET", "/api/single")));
    assert_eq!(single, json!({ "status": "success", "code": 200, "data": { "id": 1 }, "count": 1 }));
}

#[test]
fn unsupported_return_type_is_reported_as_text() {
    let (status, body) = respond(&dispatcher().handle(&mut Request::new("GET", "/api/unsupported")));
    assert_eq!(status, 200);
    assert!(body.starts_with("Unsupported return type"), "{body}");
}

#[test]
fn panicking_action_is_a_500() {
    let (status, body) = respond(&dispatcher().handle(&mut Request::new("GET", "/api/crash")));
    assert_eq!(status, 500);
    assert!(!body.contains("blew up"));
}

#[test]
fn session_data_replaces_the_session_and_forwards() {
    let mut stale = Session::new();
    stale.set("cart", json!([1, 2]));
    let mut req = Request::new("POST", "/login").with_session(stale);

    let outcome = dispatcher().handle(&mut req);
    let forward = outcome.forward().expect("a forward");

    assert_eq!(forward.path(), "/home");
    let mut keys: Vec<_> = req.session().keys().collect();
    keys.sort_unstable();
    assert_eq!(keys, ["role", "user"]);
    assert_eq!(req.attribute("flash"), Some(&json!("welcome")));
    assert_eq!(req.attribute(SESSION_DATA_KEY), Some(&json!({ "user": "alice", "role": "admin" })));

    // The next request of the same client sees the new session.
    let mut next = Request::new("GET", "/whoami").with_session(req.into_session());
    let body = json_body(&dispatcher().handle(&mut next));
    assert_eq!(body["data"], json!({ "user": "alice", "role": "admin" }));
}

// ── Uploads ───────────────────────────────────────────────────────────────────

#[test]
fn uploads_are_collected_and_stored_by_base_name() {
    let dir = scratch_dir();
    let mut req = Request::new("POST", "/upload")
        .with_part(FilePart::file("doc", "../../evil.txt", &b"payload"[..]))
        .with_part(FilePart::file("empty", "", &b""[..]));

    let body = json_body(&dispatcher_with(dir.clone()).handle(&mut req));

    assert_eq!(body["data"], json!(["doc", "empty"]));
    assert_eq!(body["count"], 2);
    assert_eq!(fs::read(dir.join("evil.txt")).unwrap(), b"payload");
    assert_eq!(fs::read_dir(&dir).unwrap().count(), 1);
    fs::remove_dir_all(&dir).unwrap();
}
