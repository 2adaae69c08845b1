use super::pie_chart::render_pie_chart;
use crate::api::{HISTORY_CSV_URL, HISTORY_PDF_URL};
use crate::{Model, Msg};
use shared::HistoryResponse;
use yew::html::Scope;
use yew::prelude::*;

pub fn render_history_panel(history: &HistoryResponse, link: &Scope<Model>) -> Html {
    if history.entries.is_empty() {
        return html! {
            <section class="history">
                <h3>{"Session history"}</h3>
                <p class="no-results-message">{"Predictions you make will show up here."}</p>
            </section>
        };
    }

    html! {
        <section class="history">
            <div class="section-header">
                <h3>{ format!("Session history ({})", history.summary.total) }</h3>
                <div class="history-actions">
                    <a class="button" href={HISTORY_CSV_URL}>{"Export CSV"}</a>
                    <a class="button" href={HISTORY_PDF_URL}>{"Export PDF"}</a>
                    <button class="button secondary" onclick={link.callback(|_| Msg::ClearHistory)}>
                        {"Clear"}
                    </button>
                </div>
            </div>
            { render_pie_chart(&history.summary) }
            <div class="table-scroll">
                <table>
                    <thead>
                        <tr><th>{"Text"}</th><th>{"Sentiment"}</th><th>{"Confidence"}</th></tr>
                    </thead>
                    <tbody>
                        { for history.entries.iter().rev().map(|entry| html! {
                            <tr>
                                <td>{ entry.text.clone() }</td>
                                <td>{ entry.label.to_string() }</td>
                                <td>{ entry.confidence.clone() }</td>
                            </tr>
                        }) }
                    </tbody>
                </table>
            </div>
        </section>
    }
}
