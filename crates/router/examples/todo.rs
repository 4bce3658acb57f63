use futures::FutureExt;
use http::StatusCode;
use micro_router::{
    Body, BodyType, BoxError, Json, Params, Query, RequestBody, RequestSchema, Response, Router, RouterError,
    RouterInput, RouterOptions, Schema, fields, handler_fn, middleware_fn,
};
use serde::{Deserialize, Serialize};
use tracing::{Level, debug, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Deserialize, Serialize, Debug)]
struct Todo {
    id: u64,
    title: String,
    done: bool,
}

#[derive(Deserialize)]
struct Id {
    id: u64,
}

#[derive(Deserialize)]
struct Page {
    page: Option<u32>,
}

#[derive(Deserialize)]
struct NewTodo {
    title: String,
}

async fn list(Query(Page { page }): Query<Page>) -> Json<Vec<Todo>> {
    let page = u64::from(page.unwrap_or(1));
    Json(vec![Todo { id: page, title: "write the router".into(), done: true }])
}

async fn show(Params(Id { id }): Params<Id>) -> Json<Todo> {
    Json(Todo { id, title: format!("todo #{id}"), done: false })
}

async fn create(Body(NewTodo { title }): Body<NewTodo>) -> (StatusCode, Json<Todo>) {
    (StatusCode::CREATED, Json(Todo { id: 3, title, done: false }))
}

fn todo_routers() -> Result<Vec<Router>, BoxError> {
    let mut list_router = Router::new(
        RequestSchema::new("/todos").method("GET").query(fields! { "page" => Schema::nullable(Schema::Int) }),
        RouterOptions::default(),
    )?;
    list_router.use_middleware(handler_fn(list));

    let mut show_router = Router::new(
        RequestSchema::new("/todos/:id").method("GET").params(fields! { "id" => Schema::Int }),
        RouterOptions::default(),
    )?;
    show_router.use_middleware(handler_fn(show));

    let mut create_router = Router::new(
        RequestSchema::new("/todos").method("POST").body(fields! { "title" => Schema::String }),
        RouterOptions::strict(),
    )?;
    create_router.use_middleware(handler_fn(create));

    Ok(vec![list_router, show_router, create_router])
}

fn fallback_router() -> Result<Router, BoxError> {
    let mut assets = Router::new(RequestSchema::new("/:rest*"), RouterOptions::default())?;
    assets.serve("/", std::env::temp_dir());

    let mut app = Router::new(RequestSchema::new("/:rest*"), RouterOptions::default())?;
    app.use_middleware(middleware_fn(|req, next| {
        async move {
            let pathname = req.pathname().to_string();
            let response = next.run(req).await;
            debug!(pathname, ok = response.is_ok(), "fallback request");
            response
        }
        .boxed()
    }))
    .route("/assets", assets)
    .match_body(BodyType::Text, |text: String| async move { Response::text(text.to_uppercase()) });
    Ok(app)
}

/// Tries each router in turn; a rejection moves on to the next one.
async fn dispatch(routers: &[Router], input: RouterInput) -> Result<Response, RouterError> {
    for router in routers {
        match router.handle(input.clone()).await {
            Err(e) if e.is_rejection() => debug!(pattern = router.pattern(), cause = %e, "router skipped"),
            other => return other,
        }
    }
    Ok(Response::unset())
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::DEBUG).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut routers = todo_routers()?;
    routers.push(fallback_router()?);

    let inputs = [
        RouterInput::new("/todos").with_method("GET").with_query("page", "2"),
        RouterInput::new("/todos/7").with_method("GET"),
        RouterInput::new("/todos/seven").with_method("GET"),
        RouterInput::new("/todos")
            .with_method("POST")
            .with_body(RequestBody::Json(serde_json::json!({ "title": "ship it" }))),
        RouterInput::new("/echo").with_body(RequestBody::Text("hello".into())),
        RouterInput::new("/assets/missing.txt"),
    ];

    for input in inputs {
        let pathname = input.pathname().to_string();
        match dispatch(&routers, input).await {
            Ok(response) => {
                let response = response.into_http().await?;
                info!(pathname, status = %response.status(), "handled");
            }
            Err(e) => info!(pathname, cause = %e, "failed"),
        }
    }

    Ok(())
}
