use shared::{format_confidence, PredictResponse, SentimentLabel};
use yew::prelude::*;

pub fn render_prediction(result: &PredictResponse) -> Html {
    let (class, icon) = match result.label {
        SentimentLabel::Positive => ("positive", "😀"),
        SentimentLabel::Negative => ("negative", "😡"),
    };
    let confidence = result.confidence.unwrap_or(0.0);

    html! {
        <div class={classes!("results-container", class)}>
            <div class="result-header">
                <h2>{ format!("{} {}", result.label, icon) }</h2>
                <div class="confidence-meter">
                    <div class="meter-label">{"Confidence:"}</div>
                    if result.confidence.is_some() {
                        <div class="meter">
                            <div class="meter-fill" style={format!("width: {:.1}%", confidence)}></div>
                        </div>
                    }
                    <div class="meter-value">{ format_confidence(result.confidence) }</div>
                </div>
            </div>
            if result.translated {
                <p class="translated-note">{ format!("Scored translation: \"{}\"", result.scored_text) }</p>
            }
        </div>
    }
}
