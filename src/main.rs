use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use switchyard::config::Config;
use switchyard::http::request::{Method, Request};
use switchyard::http::response::Response;
use switchyard::json::Value;
use switchyard::server::App;

#[derive(Parser, Debug)]
#[command(name = "switchyard", about = "Express-style HTTP server demo")]
struct Args {
    /// YAML config file (overrides SWITCHYARD_CONFIG)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to bind
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Debug, Clone)]
struct User {
    id: u64,
    name: String,
    email: String,
}

impl User {
    fn to_json(&self) -> Value {
        Value::object([
            ("id", Value::from(self.id)),
            ("name", Value::from(self.name.as_str())),
            ("email", Value::from(self.email.as_str())),
        ])
    }
}

type Users = Arc<Mutex<Vec<User>>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut cfg = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };
    if let Some(host) = args.host {
        cfg.server.host = host;
    }
    if let Some(port) = args.port {
        cfg.server.port = port;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cfg.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true)
        .init();

    let mut app = App::with_config(cfg);
    if app.config().static_files.is_empty() {
        app.static_files("/static", "./static");
    }
    register_middleware(&mut app);
    register_routes(&mut app);

    let mut server = app.start().await?;

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");
    server.stop().await?;

    Ok(())
}

fn register_middleware(app: &mut App) {
    app.use_middleware(|req, res, next| {
        tracing::info!(method = %req.method, path = %req.path, "incoming request");
        next.run(req, res);
    });

    app.use_middleware(|req, res, next| {
        res.set("Access-Control-Allow-Origin", "*")
            .set("Access-Control-Allow-Methods", "GET, POST, PUT, DELETE, OPTIONS")
            .set("Access-Control-Allow-Headers", "Content-Type, Authorization");

        if req.method == Method::OPTIONS {
            res.ok().send("");
            return;
        }
        next.run(req, res);
    });
}

fn register_routes(app: &mut App) {
    let users: Users = Arc::new(Mutex::new(vec![
        User {
            id: 1,
            name: "John Doe".into(),
            email: "john@example.com".into(),
        },
        User {
            id: 2,
            name: "Jane Smith".into(),
            email: "jane@example.com".into(),
        },
        User {
            id: 3,
            name: "Bob Johnson".into(),
            email: "bob@example.com".into(),
        },
    ]));

    app.get("/", |_req, res| {
        res.json(&Value::object([
            ("message", "Welcome to Switchyard"),
            ("version", env!("CARGO_PKG_VERSION")),
        ]));
    });

    app.get("/hello", |_req, res| {
        res.send("Hello, World!");
    });

    app.get("/hello/:name", |req, res| {
        let name = req.param("name").unwrap_or_default();
        res.send(format!("Hello, {name}!"));
    });

    let store = Arc::clone(&users);
    app.get("/api/users", move |_req, res| {
        let users = lock(&store);
        res.json(&users.iter().map(User::to_json).collect::<Value>());
    });

    let store = Arc::clone(&users);
    app.get("/api/users/:id", move |req, res| {
        let users = lock(&store);
        match user_id(req).and_then(|id| users.iter().find(|u| u.id == id)) {
            Some(user) => res.json(&user.to_json()),
            None => user_not_found(res),
        };
    });

    let store = Arc::clone(&users);
    app.post("/api/users", move |req, res| {
        let Some((name, email)) = name_and_email(req) else {
            res.bad_request()
                .json(&Value::object([("error", "Name and email are required")]));
            return;
        };

        let mut users = lock(&store);
        let id = users.iter().map(|u| u.id).max().unwrap_or(0) + 1;
        let user = User { id, name, email };
        res.created().json(&user.to_json());
        users.push(user);
    });

    let store = Arc::clone(&users);
    app.put("/api/users/:id", move |req, res| {
        let mut users = lock(&store);
        let Some(user) = user_id(req).and_then(|id| users.iter_mut().find(|u| u.id == id)) else {
            user_not_found(res);
            return;
        };

        let Some((name, email)) = name_and_email(req) else {
            res.bad_request()
                .json(&Value::object([("error", "Name and email are required")]));
            return;
        };

        user.name = name;
        user.email = email;
        res.json(&user.to_json());
    });

    let store = Arc::clone(&users);
    app.delete("/api/users/:id", move |req, res| {
        let mut users = lock(&store);
        let before = users.len();
        if let Some(id) = user_id(req) {
            users.retain(|u| u.id != id);
        }

        if users.len() < before {
            res.no_content().send("");
        } else {
            user_not_found(res);
        }
    });

    app.get("/search", |req, res| {
        let query = req.query("q").unwrap_or_default();
        if query.is_empty() {
            res.bad_request()
                .json(&Value::object([("error", "Query parameter 'q' is required")]));
            return;
        }

        let page = req.query("page").and_then(|p| p.parse::<i64>().ok()).unwrap_or(1);
        res.json(&Value::object([
            ("query", Value::from(query)),
            ("page", Value::from(page)),
            ("results", ["result1", "result2", "result3"].into_iter().collect()),
        ]));
    });

    app.post("/upload", |req, res| {
        if req.is("multipart/form-data") {
            res.json(&Value::object([
                ("message", Value::from("File upload simulation")),
                ("files", Value::from(1)),
            ]));
        } else {
            res.bad_request()
                .json(&Value::object([("error", "Invalid content type")]));
        }
    });

    app.get("/error", |_req, res| {
        res.internal_server_error()
            .json(&Value::object([("error", "Internal server error simulation")]));
    });

    app.get("/old-page", |_req, res| {
        res.redirect("/new-page");
    });

    app.get("/new-page", |_req, res| {
        res.send("This is the new page!");
    });
}

fn lock(users: &Users) -> std::sync::MutexGuard<'_, Vec<User>> {
    users.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn user_id(req: &Request) -> Option<u64> {
    req.param("id")?.parse().ok()
}

fn name_and_email(req: &Request) -> Option<(String, String)> {
    let body = req.json().ok()?;
    let name = body.get("name")?.as_str()?.to_string();
    let email = body.get("email")?.as_str()?.to_string();
    Some((name, email))
}

fn user_not_found(res: &mut Response) -> &mut Response {
    res.not_found().json(&Value::object([("error", "User not found")]))
}
