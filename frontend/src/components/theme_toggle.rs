use crate::{Model, Msg, Theme};
use yew::html::Scope;
use yew::prelude::*;

pub fn render_theme_toggle(theme: Theme, link: &Scope<Model>) -> Html {
    let (title, icon, alt) = match theme {
        Theme::Light => (
            "Switch to Dark Mode",
            "https://cdnjs.cloudflare.com/ajax/libs/twemoji/14.0.2/svg/2600.svg",
            "Sun Icon",
        ),
        Theme::Dark => (
            "Switch to Light Mode",
            "https://cdnjs.cloudflare.com/ajax/libs/twemoji/14.0.2/svg/1f319.svg",
            "Moon Icon",
        ),
    };
    html! {
        <div class="top-right">
            <button
                id="theme-toggle"
                class="theme-toggle"
                onclick={link.callback(|_| Msg::ToggleTheme)}
                title={title}
            >
                <img src={icon} alt={alt} class="toggle-icon" />
            </button>
        </div>
    }
}
