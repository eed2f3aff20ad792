use memorludo_core as game;
use serde::{Deserialize, Serialize};
use yew::prelude::*;

use crate::theme::Theme;
use crate::utils::*;

/// Player options that survive reloads.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct Settings {
    pub difficulty: game::Difficulty,
    pub sound_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            difficulty: game::Difficulty::default(),
            sound_enabled: true,
        }
    }
}

impl StorageKey for Settings {
    const KEY: &'static str = "memorludo:settings";
}

#[derive(Properties, PartialEq)]
pub(crate) struct SettingsProps {
    #[prop_or_default]
    pub open: bool,
    pub on_theme: Callback<Option<Theme>>,
    pub on_close: Callback<()>,
}

#[function_component]
pub(crate) fn SettingsView(props: &SettingsProps) -> Html {
    const THEMES: [(&str, Option<Theme>); 4] = [
        ("Auto", None),
        ("Classic", Some(Theme::Classic)),
        ("Dark", Some(Theme::Dark)),
        ("Retro", Some(Theme::Retro)),
    ];

    let on_close = {
        let on_close = props.on_close.clone();
        Callback::from(move |_: MouseEvent| on_close.emit(()))
    };

    html! {
        <dialog id="settings" open={props.open}>
            <article>
                <h2>{"Settings"}</h2>
                <ul>
                    {
                        for THEMES.into_iter().map(|(label, theme)| {
                            let on_theme = props.on_theme.clone();
                            let onclick = Callback::from(move |_: MouseEvent| on_theme.emit(theme));
                            html! {
                                <li><a href="#" {onclick}>{label}</a></li>
                            }
                        })
                    }
                </ul>
                <footer>
                    <button onclick={on_close}>{"Close"}</button>
                </footer>
            </article>
        </dialog>
    }
}
