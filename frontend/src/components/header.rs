use yew::prelude::*;

/// Renders the application header
pub fn render_header() -> Html {
    html! {
        <header class="app-header">
            <h1>{"Election Tweet Sentiment Analyzer"}</h1>
            <p class="subtitle">{"Paste a tweet or upload a CSV of tweets to classify them as positive or negative"}</p>
        </header>
    }
}
