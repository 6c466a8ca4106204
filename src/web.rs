use crate::counter::{Counter, CounterAction};
use crate::pages::{CategoryOutcome, CategoryView, DailyWords, WordOfTheDay};
use crate::{HistoryEntry, WordEntry};
use askama::Html as HtmlEscaper;
use askama::{MarkupDisplay, Template};
use axum::{
    Form, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use parking_lot::Mutex;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::compression::CompressionLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{info, warn};

type SharedState = Arc<AppState>;

const SUGGESTED_TOPICS: [&str; 6] = ["animals", "food", "music", "science", "sports", "travel"];

pub struct AppState {
    pub app: Arc<WordOfTheDay>,
    pub base_url: String,
    counter: Mutex<Counter>,
}

impl AppState {
    pub fn new(app: Arc<WordOfTheDay>, base_url: impl Into<String>) -> Self {
        Self {
            app,
            base_url: base_url.into(),
            counter: Mutex::new(Counter::default()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Chrome {
    body_class: &'static str,
    main_class: &'static str,
    nav_class: &'static str,
    headline_class: &'static str,
    button_class: &'static str,
}

impl Chrome {
    fn new(dark_mode: bool) -> Self {
        Self {
            body_class: if dark_mode {
                "dark-mode bg-slate-900 text-slate-100"
            } else {
                "bg-slate-50 text-slate-900"
            },
            main_class: "min-h-screen flex flex-col items-center justify-start py-10 px-4",
            nav_class: "flex flex-wrap gap-3 text-sm font-semibold mb-6",
            headline_class: "text-4xl font-extrabold tracking-tight mb-4",
            button_class: "inline-flex items-center rounded-md bg-slate-900 px-4 py-2 text-white font-semibold shadow hover:bg-slate-800 transition-colors",
        }
    }
}

#[derive(Clone)]
pub struct WebConfig {
    pub addr: SocketAddr,
    pub base_url: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            base_url: "http://127.0.0.1:8080".to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WebError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub async fn serve(config: WebConfig, app: WordOfTheDay) -> Result<(), WebError> {
    let state = Arc::new(AppState::new(Arc::new(app), config.base_url.clone()));
    let router = build_router(state);
    info!(%config.addr, base = %config.base_url, "Binding HTTP listener");
    let listener = TcpListener::bind(config.addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("HTTP server exited");
    Ok(())
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let payload = json!({ "error": self.message });
        (self.status, Json(payload)).into_response()
    }
}

fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(daily_html))
        .route("/history", get(history_html))
        .route("/favorites", get(favorites_html).post(add_favorite_form))
        .route("/categories", get(category_html))
        .route("/categories/refresh", get(refresh_category_html))
        .route("/settings", get(settings_html).post(update_settings_form))
        .route("/counter", get(counter_html))
        .route("/counter/:action", post(counter_action))
        .route("/api/today", get(api_today))
        .route("/api/history", get(api_history))
        .route("/api/favorites", get(api_favorites).post(api_add_favorite))
        .route("/api/category", get(api_category))
        .route("/healthz", get(health))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_response(DefaultOnResponse::new().include_headers(true)),
        )
        .layer(CompressionLayer::new())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        if let Ok(mut stream) = signal(SignalKind::terminate()) {
            let _ = stream.recv().await;
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok", "service": "daily-words" }))
}

async fn daily_html(State(state): State<SharedState>) -> impl IntoResponse {
    let fragment = match state.app.load_words().await {
        Ok(DailyWords::Unavailable) => CardsFragment {
            container_id: "wordContainer",
            notice: Some("⚠ Could not load daily words. Try again.".to_string()),
            cards: &[],
            empty_message: None,
            favorite_button: true,
        }
        .render(),
        Ok(daily) => CardsFragment {
            container_id: "wordContainer",
            notice: None,
            cards: daily.words(),
            empty_message: Some("Nothing to show."),
            favorite_button: true,
        }
        .render(),
        Err(err) => return Html(render_error_page(&state, err.to_string())),
    };
    Html(render_page(&state, "Today's words", fragment))
}

async fn history_html(State(state): State<SharedState>) -> impl IntoResponse {
    let entries = state.app.load_history();
    let fragment = HistoryFragment { entries: &entries }.render();
    Html(render_page(&state, "History", fragment))
}

#[derive(Debug, Deserialize)]
struct FavoritesParams {
    added: Option<String>,
}

async fn favorites_html(
    State(state): State<SharedState>,
    Query(params): Query<FavoritesParams>,
) -> impl IntoResponse {
    let favorites = state.app.load_favorites();
    let fragment = CardsFragment {
        container_id: "favoritesContainer",
        notice: params
            .added
            .filter(|word| !word.trim().is_empty())
            .map(|word| format!("Added \"{word}\" to favorites!")),
        cards: &favorites,
        empty_message: Some("No favorites yet."),
        favorite_button: false,
    }
    .render();
    Html(render_page(&state, "Favorites", fragment))
}

#[derive(Debug, Deserialize)]
struct FavoriteForm {
    word: String,
    meaning: String,
    example: Option<String>,
}

async fn add_favorite_form(
    State(state): State<SharedState>,
    Form(form): Form<FavoriteForm>,
) -> Response {
    let entry = WordEntry::new(
        form.word,
        form.meaning,
        form.example.filter(|e| !e.is_empty()),
    );
    if entry.word().trim().is_empty() || entry.meaning().trim().is_empty() {
        return Html(render_error_page(&state, "A favorite needs a word and a meaning.")).into_response();
    }
    if let Err(err) = state.app.add_favorite(&entry) {
        return Html(render_error_page(&state, err.to_string())).into_response();
    }
    let target = format!("/favorites?added={}", encode_component(entry.word()));
    Redirect::to(&target).into_response()
}

#[derive(Debug, Deserialize)]
struct CategoryParams {
    topic: Option<String>,
}

async fn category_html(
    State(state): State<SharedState>,
    Query(params): Query<CategoryParams>,
) -> impl IntoResponse {
    let topic = params
        .topic
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());
    let view = match topic {
        Some(topic) => Some(state.app.load_category(&topic).await),
        None => None,
    };
    Html(render_category_page(&state, view.as_ref()))
}

async fn refresh_category_html(State(state): State<SharedState>) -> Response {
    match state.app.refresh_category().await {
        Some(view) => Html(render_category_page(&state, Some(&view))).into_response(),
        None => Redirect::to("/categories").into_response(),
    }
}

fn render_category_page(state: &AppState, view: Option<&CategoryView>) -> String {
    let (notice, cards): (Option<String>, &[WordEntry]) = match view.map(|v| &v.outcome) {
        Some(CategoryOutcome::Found { words }) => (None, words.as_slice()),
        Some(CategoryOutcome::Fallback { words }) => (
            view.map(|v| {
                format!(
                    "⚠ No valid words found for {}, showing random instead.",
                    v.topic
                )
            }),
            words.as_slice(),
        ),
        Some(CategoryOutcome::Failed { message }) => (Some(message.clone()), &[][..]),
        None => (None, &[][..]),
    };
    let cards_html = CardsFragment {
        container_id: "categoryContainer",
        notice,
        cards,
        empty_message: None,
        favorite_button: true,
    }
    .render();
    let fragment = CategoryFragment {
        chrome: Chrome::new(state.app.dark_mode()),
        topic: view.map(|v| v.topic.as_str()).unwrap_or_default(),
        has_topic: view.is_some(),
        suggestions: &SUGGESTED_TOPICS,
        cards: cards_html.unwrap_or_default(),
    }
    .render();
    render_page(state, "Categories", fragment)
}

async fn settings_html(State(state): State<SharedState>) -> impl IntoResponse {
    Html(render_settings_page(&state, None))
}

#[derive(Debug, Deserialize)]
struct SettingsForm {
    dark_mode: Option<String>,
    daily_word_count: usize,
}

async fn update_settings_form(
    State(state): State<SharedState>,
    Form(form): Form<SettingsForm>,
) -> impl IntoResponse {
    let result = state
        .app
        .set_dark_mode(form.dark_mode.is_some())
        .and_then(|_| state.app.set_daily_word_count(form.daily_word_count));
    match result {
        Ok(_) => Html(render_settings_page(&state, Some("Settings saved."))),
        Err(err) => Html(render_error_page(&state, err.to_string())),
    }
}

fn render_settings_page(state: &AppState, notice: Option<&str>) -> String {
    let fragment = SettingsFragment {
        chrome: Chrome::new(state.app.dark_mode()),
        dark_mode: state.app.dark_mode(),
        daily_word_count: state.app.daily_word_count(),
        notice,
    }
    .render();
    render_page(state, "Settings", fragment)
}

async fn counter_html(State(state): State<SharedState>) -> impl IntoResponse {
    let value = state.counter.lock().value();
    Html(render_counter_page(&state, value))
}

async fn counter_action(
    State(state): State<SharedState>,
    Path(action): Path<String>,
) -> Response {
    let action = match action.as_str() {
        "increment" => CounterAction::Increment,
        "decrement" => CounterAction::Decrement,
        "reset" => CounterAction::Reset,
        _ => return StatusCode::NOT_FOUND.into_response(),
    };
    let value = state.counter.lock().apply(action);
    Html(render_counter_page(&state, value)).into_response()
}

fn render_counter_page(state: &AppState, value: i64) -> String {
    let fragment = CounterFragment {
        chrome: Chrome::new(state.app.dark_mode()),
        value,
    }
    .render();
    render_page(state, "Counter", fragment)
}

async fn api_today(State(state): State<SharedState>) -> Result<Json<DailyWords>, ApiError> {
    let daily = state
        .app
        .load_words()
        .await
        .map_err(|err| ApiError::internal(err.to_string()))?;
    Ok(Json(daily))
}

async fn api_history(State(state): State<SharedState>) -> Json<Vec<HistoryEntry>> {
    Json(state.app.load_history())
}

async fn api_favorites(State(state): State<SharedState>) -> Json<Vec<WordEntry>> {
    Json(state.app.load_favorites())
}

async fn api_add_favorite(
    State(state): State<SharedState>,
    Json(entry): Json<WordEntry>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if entry.word().trim().is_empty() || entry.meaning().trim().is_empty() {
        return Err(ApiError::bad_request("`word` and `meaning` are required"));
    }
    let added = state
        .app
        .add_favorite(&entry)
        .map_err(|err| ApiError::internal(err.to_string()))?;
    Ok(Json(json!({ "added": added })))
}

async fn api_category(
    State(state): State<SharedState>,
    Query(params): Query<CategoryParams>,
) -> Result<Json<CategoryView>, ApiError> {
    let topic = params
        .topic
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::bad_request("Query parameter `topic` is required"))?;
    Ok(Json(state.app.load_category(topic).await))
}

fn render_page(state: &AppState, title: &str, body: askama::Result<String>) -> String {
    let body = match body {
        Ok(body) => body,
        Err(err) => return render_error_page(state, err.to_string()),
    };
    let template = LayoutTemplate {
        chrome: Chrome::new(state.app.dark_mode()),
        title,
        body,
        base_url: &state.base_url,
    };
    template.render().unwrap_or_else(|err| {
        warn!(error = %err, "page render failed");
        format!("<!DOCTYPE html><p>{}</p>", escape_html(&err.to_string()))
    })
}

fn render_error_page(state: &AppState, message: impl Into<String>) -> String {
    let message = message.into();
    warn!(%message, "rendering error page");
    let body = ErrorFragment {
        chrome: Chrome::new(state.app.dark_mode()),
        message: &message,
    }
    .render();
    match body {
        Ok(body) => render_page(state, "Error", Ok(body)),
        Err(_) => format!("<!DOCTYPE html><p>{}</p>", escape_html(&message)),
    }
}

fn escape_html(input: &str) -> String {
    MarkupDisplay::new_unsafe(input, HtmlEscaper).to_string()
}

fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, NON_ALPHANUMERIC).to_string()
}

#[derive(Template)]
#[template(
    source = r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>Daily Words • {{ title }}</title>
    <script src="https://cdn.jsdelivr.net/npm/@tailwindcss/browser@4"></script>
    <link rel="canonical" href="{{ base_url }}">
  </head>
  <body class="{{ chrome.body_class }}">
    <main class="{{ chrome.main_class }}">
      <div class="max-w-3xl w-full">
        <nav class="{{ chrome.nav_class }}" aria-label="Primary">
          <a href="/">Today</a>
          <a href="/history">History</a>
          <a href="/favorites">Favorites</a>
          <a href="/categories">Categories</a>
          <a href="/settings">Settings</a>
          <a href="/counter">Counter</a>
        </nav>
        <h1 class="{{ chrome.headline_class }}">{{ title }}</h1>
        {{ body|safe }}
      </div>
    </main>
  </body>
</html>"#,
    ext = "html"
)]
struct LayoutTemplate<'a> {
    chrome: Chrome,
    title: &'a str,
    body: String,
    base_url: &'a str,
}

#[derive(Template)]
#[template(
    source = r#"<div id="{{ container_id }}" class="space-y-4">
  {% if let Some(notice) = notice %}
  <div class="card rounded bg-amber-50 text-amber-900 p-4"><p>{{ notice }}</p></div>
  {% endif %}
  {% if cards.is_empty() %}
    {% if let Some(empty) = empty_message %}
  <div class="card rounded bg-white shadow p-4"><p>{{ empty }}</p></div>
    {% endif %}
  {% endif %}
  {% for card in cards %}
  <div class="card rounded bg-white text-slate-900 shadow p-4 space-y-2">
    <h2 class="text-2xl font-bold">{{ card.word() }}</h2>
    {% if favorite_button %}
    <p><strong>Meaning:</strong> {{ card.meaning() }}</p>
    <p><strong>Example:</strong> {{ card.example() }}</p>
    <form method="post" action="/favorites">
      <input type="hidden" name="word" value="{{ card.word() }}">
      <input type="hidden" name="meaning" value="{{ card.meaning() }}">
      <input type="hidden" name="example" value="{{ card.example() }}">
      <button class="fav-btn rounded bg-amber-400 px-3 py-1 font-semibold" type="submit">⭐ Add to Favorites</button>
    </form>
    {% else %}
    <p>{{ card.meaning() }}</p>
    <p><em>{{ card.example() }}</em></p>
    {% endif %}
  </div>
  {% endfor %}
</div>"#,
    ext = "html"
)]
struct CardsFragment<'a> {
    container_id: &'a str,
    notice: Option<String>,
    cards: &'a [WordEntry],
    empty_message: Option<&'a str>,
    favorite_button: bool,
}

#[derive(Template)]
#[template(
    source = r#"<div id="historyContainer" class="space-y-4">
  {% if entries.is_empty() %}
  <div class="card rounded bg-white shadow p-4"><p>No history yet.</p></div>
  {% endif %}
  {% for entry in entries %}
  <div class="card rounded bg-white text-slate-900 shadow p-4">
    <h3 class="text-xl font-semibold">{{ entry.date }}</h3>
    {% for w in entry.words %}
    <p><strong>{{ w.word() }}:</strong> {{ w.meaning() }}</p>
    {% endfor %}
  </div>
  {% endfor %}
</div>"#,
    ext = "html"
)]
struct HistoryFragment<'a> {
    entries: &'a [HistoryEntry],
}

#[derive(Template)]
#[template(
    source = r#"<form method="get" action="/categories" class="flex flex-wrap gap-2 mb-4">
  <input type="text" name="topic" value="{{ topic }}" placeholder="Pick a topic" class="rounded border px-3 py-2 text-slate-900">
  <button type="submit" class="{{ chrome.button_class }}">Load words</button>
  {% if has_topic %}
  <a href="/categories/refresh" class="{{ chrome.button_class }}">Refresh</a>
  {% endif %}
</form>
<div class="flex flex-wrap gap-2 mb-6">
  {% for suggestion in suggestions %}
  <a href="/categories?topic={{ suggestion }}" class="px-3 py-1 rounded-full border">{{ suggestion }}</a>
  {% endfor %}
</div>
{{ cards|safe }}"#,
    ext = "html"
)]
struct CategoryFragment<'a> {
    chrome: Chrome,
    topic: &'a str,
    has_topic: bool,
    suggestions: &'a [&'a str],
    cards: String,
}

#[derive(Template)]
#[template(
    source = r#"{% if let Some(notice) = notice %}<p class="mb-4">{{ notice }}</p>{% endif %}
<form method="post" action="/settings" class="space-y-4">
  <label class="block">
    <input type="checkbox" name="dark_mode" {% if dark_mode %}checked{% endif %}>
    Dark mode
  </label>
  <label class="block">
    Words per day
    <input type="number" name="daily_word_count" min="1" max="10" value="{{ daily_word_count }}" class="rounded border px-2 py-1 text-slate-900">
  </label>
  <button type="submit" class="{{ chrome.button_class }}">Save</button>
</form>"#,
    ext = "html"
)]
struct SettingsFragment<'a> {
    chrome: Chrome,
    dark_mode: bool,
    daily_word_count: usize,
    notice: Option<&'a str>,
}

#[derive(Template)]
#[template(
    source = r#"<div class="text-center mt-12">
  <h2 class="text-3xl font-bold mb-4">Counter: {{ value }}</h2>
  <form method="post" action="/counter/increment" class="inline"><button class="{{ chrome.button_class }}">Increment</button></form>
  <form method="post" action="/counter/decrement" class="inline mx-2"><button class="{{ chrome.button_class }}">Decrement</button></form>
  <form method="post" action="/counter/reset" class="inline"><button class="{{ chrome.button_class }}">Reset</button></form>
</div>"#,
    ext = "html"
)]
struct CounterFragment {
    chrome: Chrome,
    value: i64,
}

#[derive(Template)]
#[template(
    source = r#"<div class="space-y-4">
  <p class="text-lg">{{ message }}</p>
  <a href="/" class="{{ chrome.button_class }}">Back to today</a>
</div>"#,
    ext = "html"
)]
struct ErrorFragment<'a> {
    chrome: Chrome,
    message: &'a str,
}
