use shared::BatchResponse;
use yew::prelude::*;

fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// CSV rendition of a batch result, offered as a client-side download.
pub fn encode_csv(batch: &BatchResponse) -> String {
    let mut out = String::new();
    for row in std::iter::once(&batch.columns).chain(batch.rows.iter()) {
        let line: Vec<String> = row.iter().map(|field| escape_field(field)).collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }
    out
}

pub fn render_batch_table(batch: &BatchResponse, download_url: Option<&str>) -> Html {
    html! {
        <section class="batch-results">
            <div class="section-header">
                <h3>{ format!("Batch results: {} scored, {} skipped", batch.scored, batch.skipped) }</h3>
                if let Some(url) = download_url {
                    <a class="button" href={url.to_string()} download="sentiment_predictions.csv">
                        {"Download CSV"}
                    </a>
                }
            </div>
            <div class="table-scroll">
                <table>
                    <thead>
                        <tr>{ for batch.columns.iter().map(|c| html! { <th>{ c.clone() }</th> }) }</tr>
                    </thead>
                    <tbody>
                        { for batch.rows.iter().map(|row| html! {
                            <tr>{ for row.iter().map(|cell| html! { <td>{ cell.clone() }</td> }) }</tr>
                        }) }
                    </tbody>
                </table>
            </div>
        </section>
    }
}
