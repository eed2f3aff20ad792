use memorludo_core as game;
use yew::prelude::*;

use crate::utils::{format_clock, StorageKey};

impl StorageKey for game::Leaderboard {
    const KEY: &'static str = "memorludo:leaderboard";
}

#[derive(Properties, PartialEq)]
pub(crate) struct LeaderboardProps {
    pub board: game::Leaderboard,
}

#[function_component]
pub(crate) fn LeaderboardView(props: &LeaderboardProps) -> Html {
    html! {
        <aside class="leaderboard">
            <h2>{"Top scores"}</h2>
            if props.board.is_empty() {
                <p>{"No scores yet"}</p>
            } else {
                <ol>
                    {
                        for props.board.entries().iter().map(|entry| html! {
                            <li>
                                <span class="score">{entry.score}</span>
                                <span class="time">{format_clock(entry.time)}</span>
                                <span class="difficulty">{entry.difficulty.label()}</span>
                            </li>
                        })
                    }
                </ol>
            }
        </aside>
    }
}
