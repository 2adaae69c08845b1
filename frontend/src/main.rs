mod api;
mod components;

use api::ApiError;
use components::batch_table::{encode_csv, render_batch_table};
use components::header::render_header;
use components::history_panel::render_history_panel;
use components::prediction::render_prediction;
use components::theme_toggle::render_theme_toggle;
use gloo_file::{Blob, ObjectUrl};
use gloo_storage::{LocalStorage, Storage};
use gloo_timers::callback::Timeout;
use serde::{Deserialize, Serialize};
use shared::{BatchResponse, HistoryResponse, PredictResponse, EMPTY_TEXT_WARNING};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen_futures::spawn_local;
use web_sys::{File, HtmlInputElement, HtmlTextAreaElement};
use yew::prelude::*;

const THEME_KEY: &str = "sentiment-theme";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Theme {
    Light,
    Dark,
}

pub enum Msg {
    // Single prediction
    SetText(String),
    SetLangHint(String),
    Predict,
    Predicted(PredictResponse),

    // Batch
    SelectBatchFile(Option<File>),
    UploadBatch,
    BatchScored(BatchResponse),

    // History
    RefreshHistory,
    HistoryLoaded(HistoryResponse),
    ClearHistory,

    // UI states
    SetError(Option<String>),
    ToggleTheme,
}

pub struct Model {
    text: String,
    lang_hint: String,
    prediction: Option<PredictResponse>,
    predicting: bool,
    batch_file: Option<File>,
    batch: Option<BatchResponse>,
    batch_download: Option<ObjectUrl>,
    uploading: bool,
    history: HistoryResponse,
    error: Option<String>,
    theme: Theme,
}

fn debounce<F>(duration: u32, callback: F) -> Callback<MouseEvent>
where
    F: Fn() + Clone + 'static,
{
    let timeout = Rc::new(RefCell::new(None::<Timeout>));

    Callback::from(move |_| {
        let mut pending = timeout.borrow_mut();
        if let Some(old) = pending.take() {
            old.cancel();
        }
        let inner = callback.clone();
        *pending = Some(Timeout::new(duration, move || inner()));
    })
}

fn apply_theme(theme: Theme) {
    let Some(body) = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.body())
    else {
        return;
    };
    let result = match theme {
        Theme::Dark => body.class_list().add_1("dark-mode"),
        Theme::Light => body.class_list().remove_1("dark-mode"),
    };
    if let Err(e) = result {
        log::warn!("Failed to apply theme: {:?}", e);
    }
}

/// Runs `request` and forwards its result to the component, errors as `Msg::SetError`.
fn send_request<T, Fut, F>(ctx: &Context<Model>, request: Fut, on_success: F)
where
    T: 'static,
    Fut: std::future::Future<Output = Result<T, ApiError>> + 'static,
    F: FnOnce(T) -> Msg + 'static,
{
    let link = ctx.link().clone();
    spawn_local(async move {
        match request.await {
            Ok(value) => link.send_message(on_success(value)),
            Err(e) => {
                log::error!("{}", e);
                let message = match e {
                    ApiError::Server { message, .. } => message,
                    other => other.to_string(),
                };
                link.send_message(Msg::SetError(Some(message)));
            }
        }
    });
}

impl Component for Model {
    type Message = Msg;
    type Properties = ();

    fn create(ctx: &Context<Self>) -> Self {
        let theme = LocalStorage::get(THEME_KEY).unwrap_or(Theme::Light);
        apply_theme(theme);
        ctx.link().send_message(Msg::RefreshHistory);

        Self {
            text: String::new(),
            lang_hint: String::new(),
            prediction: None,
            predicting: false,
            batch_file: None,
            batch: None,
            batch_download: None,
            uploading: false,
            history: HistoryResponse {
                entries: Vec::new(),
                summary: Default::default(),
            },
            error: None,
            theme,
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Msg::SetText(text) => {
                self.text = text;
                false
            }
            Msg::SetLangHint(hint) => {
                self.lang_hint = hint;
                false
            }
            Msg::Predict => self.handle_predict(ctx),
            Msg::Predicted(result) => {
                self.predicting = false;
                self.prediction = Some(result);
                ctx.link().send_message(Msg::RefreshHistory);
                true
            }

            Msg::SelectBatchFile(file) => {
                self.batch_file = file;
                true
            }
            Msg::UploadBatch => self.handle_upload_batch(ctx),
            Msg::BatchScored(batch) => {
                self.uploading = false;
                let blob = Blob::new_with_options(encode_csv(&batch).as_str(), Some("text/csv"));
                self.batch_download = Some(ObjectUrl::from(blob));
                self.batch = Some(batch);
                ctx.link().send_message(Msg::RefreshHistory);
                true
            }

            Msg::RefreshHistory => {
                send_request(ctx, api::fetch_history(), Msg::HistoryLoaded);
                false
            }
            Msg::HistoryLoaded(history) => {
                self.history = history;
                true
            }
            Msg::ClearHistory => {
                send_request(ctx, api::clear_history(), |_| Msg::RefreshHistory);
                false
            }

            Msg::SetError(error) => {
                self.error = error;
                self.predicting = false;
                self.uploading = false;
                true
            }
            Msg::ToggleTheme => self.handle_toggle_theme(),
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        html! {
            <div class="container">
                { render_header() }
                { render_theme_toggle(self.theme, ctx.link()) }

                <main class="main-content">
                    { self.render_text_input(ctx) }
                    { self.render_error_message() }
                    { self.prediction.as_ref().map(render_prediction).unwrap_or_default() }
                    { self.render_batch_upload(ctx) }
                    { self.batch.as_ref().map(|batch| {
                        render_batch_table(batch, self.batch_download.as_deref())
                    }).unwrap_or_default() }
                    { render_history_panel(&self.history, ctx.link()) }
                </main>

                <footer class="app-footer">
                    <p>{"Election Sentiment Dashboard | Fullstack Rust WASM"}</p>
                </footer>
            </div>
        }
    }
}

// Handler methods
impl Model {
    fn handle_predict(&mut self, ctx: &Context<Self>) -> bool {
        if self.text.trim().is_empty() {
            self.error = Some(EMPTY_TEXT_WARNING.to_string());
            return true;
        }
        if self.predicting {
            return false;
        }

        self.error = None;
        self.predicting = true;
        let hint = Some(self.lang_hint.trim().to_string()).filter(|h| !h.is_empty());
        send_request(ctx, api::predict(self.text.clone(), hint), Msg::Predicted);
        true
    }

    fn handle_upload_batch(&mut self, ctx: &Context<Self>) -> bool {
        let Some(file) = self.batch_file.clone() else {
            self.error = Some("Choose a CSV file first.".to_string());
            return true;
        };

        self.error = None;
        self.uploading = true;
        self.batch = None;
        self.batch_download = None;
        log::info!("Uploading batch file {}", file.name());
        send_request(ctx, api::upload_batch(file), Msg::BatchScored);
        true
    }

    fn handle_toggle_theme(&mut self) -> bool {
        self.theme = match self.theme {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        };
        apply_theme(self.theme);
        if let Err(e) = LocalStorage::set(THEME_KEY, self.theme) {
            log::warn!("Failed to persist theme: {}", e);
        }
        true
    }
}

// Rendering methods
impl Model {
    fn render_text_input(&self, ctx: &Context<Self>) -> Html {
        let link = ctx.link();
        let predict = {
            let link = link.clone();
            debounce(250, move || link.send_message(Msg::Predict))
        };

        html! {
            <section class="predict-section">
                <label for="tweet-text">{"Type or paste a tweet here:"}</label>
                <textarea
                    id="tweet-text"
                    rows="5"
                    value={self.text.clone()}
                    oninput={link.callback(|e: InputEvent| {
                        Msg::SetText(e.target_unchecked_into::<HtmlTextAreaElement>().value())
                    })}
                />
                <div class="predict-controls">
                    <input
                        type="text"
                        class="lang-hint"
                        placeholder="Language (optional, e.g. hi)"
                        value={self.lang_hint.clone()}
                        oninput={link.callback(|e: InputEvent| {
                            Msg::SetLangHint(e.target_unchecked_into::<HtmlInputElement>().value())
                        })}
                    />
                    <button class="button primary" onclick={predict} disabled={self.predicting}>
                        { if self.predicting { "Analyzing..." } else { "Predict Sentiment" } }
                    </button>
                </div>
            </section>
        }
    }

    fn render_batch_upload(&self, ctx: &Context<Self>) -> Html {
        let link = ctx.link();
        html! {
            <section class="batch-section">
                <h3>{"Batch prediction"}</h3>
                <p class="hint">{"Upload a CSV file with a \"text\" column."}</p>
                <div class="batch-controls">
                    <input
                        type="file"
                        accept=".csv,text/csv"
                        onchange={link.callback(|e: Event| {
                            let input = e.target_unchecked_into::<HtmlInputElement>();
                            Msg::SelectBatchFile(input.files().and_then(|files| files.get(0)))
                        })}
                    />
                    <button
                        class="button"
                        onclick={link.callback(|_| Msg::UploadBatch)}
                        disabled={self.uploading || self.batch_file.is_none()}
                    >
                        { if self.uploading { "Scoring..." } else { "Analyze CSV" } }
                    </button>
                </div>
            </section>
        }
    }

    fn render_error_message(&self) -> Html {
        if let Some(error_msg) = &self.error {
            html! {
                <div class="error-message">
                    <p>{ error_msg.clone() }</p>
                </div>
            }
        } else {
            html! {}
        }
    }
}

fn main() {
    wasm_logger::init(wasm_logger::Config::default());
    log::info!("App starting...");
    yew::Renderer::<Model>::new().render();
}
