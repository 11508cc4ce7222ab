//! A small switchyard app: text, JSON, views, sessions, forms and uploads.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl http://localhost:8080/hello?name=alice
//!   curl http://localhost:8080/users/42
//!   curl http://localhost:8080/users/abc                       # 400
//!   curl -c jar -X POST -d 'user=alice' http://localhost:8080/login
//!   curl -b jar http://localhost:8080/me
//!   curl 'http://localhost:8080/orders/preview?quantity=2&colors[]=red&colors[]=blue&shipping.city=Oslo'
//!   curl -F 'avatar=@Cargo.toml' http://localhost:8080/upload

use serde::Serialize;
use serde_json::json;
use switchyard::{
    ActionError, ActionHandle, BoundArguments, Config, Data, Descriptor, ModelView, ParameterSpec,
    Reply, Router, ScalarType, Server, SESSION_DATA_KEY,
};

#[tokio::main]
async fn main() -> Result<(), switchyard::Error> {
    let config = Config::load()?;
    switchyard::logging::init(&config.logging);

    let routes = Router::new()
        .get("/hello", ActionHandle::new("hello", Greeter::hello)
            .param(ParameterSpec::request_param("name", ScalarType::Str)))
        .controller("/users", |c| c
            .get("/{id}", ActionHandle::new("show", Users::show)
                .param(ParameterSpec::path_var("id", ScalarType::Int))
                .json())
            .get("/", ActionHandle::new("list", Users::list).json()))
        .post("/login", ActionHandle::new("login", Account::login)
            .param(ParameterSpec::request_param("user", ScalarType::Str)))
        .get("/me", ActionHandle::new("me", Account::me)
            .param(ParameterSpec::session())
            .json()
            .authorized(["user"]))
        .get("/orders/preview", ActionHandle::new("preview", Orders::preview)
            .param(ParameterSpec::object(order_descriptor()))
            .json())
        .post("/upload", ActionHandle::new("upload", Files::upload)
            .param(ParameterSpec::uploads())
            .json())
        .build()?;

    Server::from_config(config)?.serve(routes).await
}

// ── Controllers ───────────────────────────────────────────────────────────────

#[derive(Default)]
struct Greeter;

impl Greeter {
    // GET /hello?name=…  → text echo
    fn hello(&mut self, args: BoundArguments) -> Result<String, ActionError> {
        let name = args.str(0)?.unwrap_or_default();
        Ok(if name.is_empty() { "hello, stranger".to_owned() } else { format!("hello, {name}") })
    }
}

#[derive(Default)]
struct Users;

#[derive(Serialize)]
struct User {
    id: i64,
    name: String,
}

impl Users {
    fn show(&mut self, args: BoundArguments) -> Result<Data<User>, ActionError> {
        let id = args.int(0)?.ok_or("missing id")?;
        Ok(Data(User { id, name: format!("user-{id}") }))
    }

    fn list(&mut self, _: BoundArguments) -> Data<Vec<User>> {
        Data((1..=3).map(|id| User { id, name: format!("user-{id}") }).collect())
    }
}

#[derive(Default)]
struct Account;

impl Account {
    // Replaces the session, then forwards to views/welcome.html.
    fn login(&mut self, args: BoundArguments) -> Result<ModelView, ActionError> {
        let user = args.str(0)?.unwrap_or_default().to_owned();
        Ok(ModelView::new("welcome")
            .with(SESSION_DATA_KEY, json!({ "user": user }))
            .with("greeting", format!("welcome back, {user}")))
    }

    fn me(&mut self, args: BoundArguments) -> Result<Reply, ActionError> {
        let session = args.map(0)?.cloned().unwrap_or_default();
        Ok(Reply::data(session))
    }
}

#[derive(Debug, Default, Serialize)]
struct Address {
    city: String,
}

#[derive(Debug, Default, Serialize)]
struct Order {
    quantity: i64,
    colors: Vec<String>,
    shipping: Option<Address>,
}

fn order_descriptor() -> Descriptor<Order> {
    let address = Descriptor::<Address>::new("Address").string("city", |a, v| a.city = v);
    Descriptor::<Order>::new("Order")
        .int("quantity", |o, v| o.quantity = v)
        .list("colors", |o, v| o.colors = v)
        .nested("shipping", |o| &mut o.shipping, address)
}

#[derive(Default)]
struct Orders;

impl Orders {
    fn preview(&mut self, mut args: BoundArguments) -> Result<Data<Order>, ActionError> {
        Ok(Data(args.take_object::<Order>(0)?.unwrap_or_default()))
    }
}

#[derive(Default)]
struct Files;

impl Files {
    // Stored files land in `paths.uploads`; the reply lists part sizes.
    fn upload(&mut self, args: BoundArguments) -> Result<Reply, ActionError> {
        let sizes: serde_json::Map<_, _> = args
            .files(0)?
            .into_iter()
            .flatten()
            .map(|(name, bytes)| (name.clone(), json!(bytes.len())))
            .collect();
        Ok(Reply::data(sizes))
    }
}
