use clap::Args;
use gloo::timers::callback::{Interval, Timeout};
use memorludo_core as game;
use serde::{Deserialize, Serialize};
use yew::prelude::*;

use game::{DeckGenerator, RandomDeckGenerator};

use crate::faces;
use crate::leaderboard::LeaderboardView;
use crate::settings::{Settings, SettingsView};
use crate::sounds::SoundCue;
use crate::theme::Theme;
use crate::utils::*;

/// How long a mismatched pair stays up before flipping back.
const MISMATCH_REVEAL_MS: u32 = 1_000;
/// How long a hint keeps its pair exposed.
const HINT_REVEAL_MS: u32 = 1_000;
/// Breathing room between the last match and the victory fanfare.
const VICTORY_CUE_MS: u32 = 500;

impl StorageKey for game::PlayEngine {
    const KEY: &'static str = "memorludo:game";
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) enum Msg {
    CardClicked(game::CardId),
    Tick,
    ApplyDeferred(game::Deferred),
    VictoryReached(game::Generation),
    UseHint,
    NewGame,
    SetDifficulty(game::Difficulty),
    ToggleSound,
    ToggleSettings,
    SetTheme(Option<Theme>),
}

#[derive(Properties, Clone, PartialEq)]
struct CardProps {
    id: game::CardId,
    glyph: &'static str,
    state: game::CardState,
    callback: Callback<game::CardId>,
}

#[function_component(CardView)]
fn card_component(props: &CardProps) -> Html {
    use game::CardState::*;

    let CardProps {
        id,
        glyph,
        state,
        callback,
    } = props.clone();

    let class = classes!(
        "card",
        match state {
            FaceDown => classes!(),
            Revealed => classes!("flipped"),
            Matched => classes!("flipped", "matched"),
        }
    );

    let onclick = Callback::from(move |_: MouseEvent| {
        callback.emit(id);
        log::trace!("card {} clicked", id);
    });

    html! {
        <td {class} {onclick}>
            <span class="face">{ if state.is_face_down() { "?" } else { glyph } }</span>
        </td>
    }
}

#[derive(Args, Properties, Debug, Clone, Default, PartialEq)]
pub(crate) struct GameProps {
    /// Force a seed instead of random
    #[arg(short, long)]
    pub seed: Option<String>,
}

fn fresh_engine(seed: u64, difficulty: game::Difficulty) -> game::PlayEngine {
    let deck = RandomDeckGenerator::new(seed).generate(difficulty);
    game::PlayEngine::new(difficulty, deck).expect("generated decks always match their difficulty")
}

#[derive(Debug)]
pub(crate) struct GameView {
    engine: game::PlayEngine,
    settings: Settings,
    leaderboard: game::Leaderboard,
    seed: u64,
    settings_open: bool,
    game_over_open: bool,
    _timer_interval: Interval,
}

impl GameView {
    fn create_timer(ctx: &Context<Self>) -> Interval {
        let link = ctx.link().clone();
        Interval::new(1_000, move || link.send_message(Msg::Tick))
    }

    fn schedule_deferred(ctx: &Context<Self>, deferred: game::Deferred, delay_ms: u32) {
        let link = ctx.link().clone();
        Timeout::new(delay_ms, move || {
            link.send_message(Msg::ApplyDeferred(deferred))
        })
        .forget();
    }

    fn play_cue(&self, cue: SoundCue) {
        if self.settings.sound_enabled {
            cue.play();
        }
    }

    fn new_game(&mut self) {
        self.seed = js_random_seed();
        let difficulty = self.settings.difficulty;
        let deck = RandomDeckGenerator::new(self.seed).generate(difficulty);
        if let Err(err) = self.engine.reset(difficulty, deck) {
            log::error!("could not reset the session: {}", err);
        }
        self.game_over_open = false;
    }

    fn record_win(&mut self) {
        let entry = game::ScoreEntry {
            score: self.engine.score(),
            time: self.engine.elapsed_secs(),
            difficulty: self.engine.difficulty(),
        };
        self.leaderboard.record(entry);
        self.leaderboard.local_save();
    }

    fn flip_card(&mut self, ctx: &Context<Self>, id: game::CardId) -> bool {
        use game::FlipOutcome::*;

        let was_idle = self.engine.state().is_idle();
        let outcome = match self.engine.flip(id) {
            Ok(outcome) => outcome,
            Err(err) => {
                log::debug!("flip rejected: {}", err);
                return false;
            }
        };
        if was_idle && !self.engine.state().is_idle() {
            self.play_cue(SoundCue::GameStart);
        }

        match outcome {
            NoChange => was_idle,
            Revealed => {
                self.play_cue(SoundCue::Flip);
                true
            }
            Matched => {
                self.play_cue(SoundCue::Flip);
                self.play_cue(SoundCue::Match);
                true
            }
            Mismatched(deferred) => {
                self.play_cue(SoundCue::Flip);
                Self::schedule_deferred(ctx, deferred, MISMATCH_REVEAL_MS);
                true
            }
            Won => {
                self.play_cue(SoundCue::Flip);
                self.play_cue(SoundCue::Match);
                self.record_win();

                let link = ctx.link().clone();
                let generation = self.engine.generation();
                Timeout::new(VICTORY_CUE_MS, move || {
                    link.send_message(Msg::VictoryReached(generation))
                })
                .forget();
                true
            }
        }
    }

    fn state_class(&self) -> &'static str {
        use game::SessionState::*;
        match self.engine.state() {
            Idle => "not-started",
            Running => "in-progress",
            Won => "won",
            Lost => "lost",
        }
    }
}

impl Component for GameView {
    type Message = Msg;
    type Properties = GameProps;

    fn create(ctx: &Context<Self>) -> Self {
        let settings: Settings = LocalOrDefault::local_or_default();
        let seed = ctx
            .props()
            .seed
            .as_deref()
            .and_then(|seed| seed.parse().ok())
            .unwrap_or_else(js_random_seed);
        let engine =
            game::PlayEngine::local_load().unwrap_or_else(|| fresh_engine(seed, settings.difficulty));

        // a reload can land mid-resolution; reschedule what the page lost
        for deferred in engine.pending_deferred() {
            Self::schedule_deferred(ctx, deferred, MISMATCH_REVEAL_MS);
        }

        Self {
            engine,
            settings,
            leaderboard: LocalOrDefault::local_or_default(),
            seed,
            settings_open: false,
            game_over_open: false,
            _timer_interval: Self::create_timer(ctx),
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        use Msg::*;

        let updated = match msg {
            CardClicked(id) => self.flip_card(ctx, id),
            Tick => match self.engine.tick() {
                game::TickOutcome::NoChange => false,
                game::TickOutcome::Advanced => true,
                game::TickOutcome::TimedOut => {
                    self.play_cue(SoundCue::GameOver);
                    self.game_over_open = true;
                    true
                }
            },
            ApplyDeferred(deferred) => self.engine.apply_deferred(deferred).has_update(),
            VictoryReached(generation) => {
                if generation == self.engine.generation() && self.engine.is_finished() {
                    self.play_cue(SoundCue::Victory);
                    self.game_over_open = true;
                    true
                } else {
                    log::debug!("victory cue from a stale session ignored");
                    false
                }
            }
            UseHint => match self.engine.use_hint() {
                Err(err) => {
                    log::debug!("hint rejected: {}", err);
                    false
                }
                Ok(game::HintOutcome::NoChange) => false,
                Ok(game::HintOutcome::Spent) => true,
                Ok(game::HintOutcome::Exposed(deferred)) => {
                    Self::schedule_deferred(ctx, deferred, HINT_REVEAL_MS);
                    true
                }
            },
            NewGame => {
                self.new_game();
                true
            }
            SetDifficulty(difficulty) => {
                self.settings.difficulty = difficulty;
                self.settings.local_save();
                self.new_game();
                true
            }
            ToggleSound => {
                self.settings.sound_enabled = !self.settings.sound_enabled;
                self.settings.local_save();
                true
            }
            ToggleSettings => {
                self.settings_open = !self.settings_open;
                true
            }
            SetTheme(theme) => {
                Theme::apply(theme);
                true
            }
        };

        self.engine.local_save();
        updated
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        use Msg::*;

        let columns = self.engine.difficulty().columns() as usize;
        let cards: Vec<&game::Card> = self.engine.cards().collect();
        let elapsed = format_clock(self.engine.elapsed_secs());
        let hint_label = format!("Hint ({})", self.engine.hints_remaining());
        let sound_icon = if self.settings.sound_enabled {
            "🔊"
        } else {
            "🔇"
        };

        let cb_card = ctx.link().callback(CardClicked);
        let cb_hint = ctx.link().callback(|_| UseHint);
        let cb_sound = ctx.link().callback(|_| ToggleSound);
        let cb_show_settings = ctx.link().callback(|_| ToggleSettings);
        let cb_theme = ctx.link().callback(SetTheme);
        let cb_close_settings = ctx.link().callback(|_| ToggleSettings);
        let cb_new_game = ctx.link().callback(|e: MouseEvent| {
            e.stop_propagation();
            NewGame
        });
        let cb_play_again = ctx.link().callback(|_| NewGame);

        html! {
            <div class={classes!("memorludo", self.state_class())}>
                <small onclick={cb_show_settings}>{"···"}</small>
                <nav>
                    <aside>{"Score "}{self.engine.score()}</aside>
                    <aside>{"Moves "}{self.engine.moves()}</aside>
                    <aside>{elapsed}</aside>
                </nav>
                <menu>
                    {
                        for game::Difficulty::ALL.into_iter().map(|difficulty| {
                            let onclick = ctx.link().callback(move |_| SetDifficulty(difficulty));
                            let selected = (difficulty == self.settings.difficulty).then_some("selected");
                            html! {
                                <button class={classes!(selected)} {onclick}>{difficulty.label()}</button>
                            }
                        })
                    }
                    <button onclick={cb_hint}>{hint_label}</button>
                    <button onclick={cb_new_game}>{"Restart"}</button>
                    <button onclick={cb_sound}>{sound_icon}</button>
                </menu>
                <table>
                    {
                        for cards.chunks(columns).map(|row| html! {
                            <tr>
                                {
                                    for row.iter().map(|card| html! {
                                        <CardView
                                            id={card.id}
                                            glyph={faces::glyph(card.face)}
                                            state={card.state()}
                                            callback={cb_card.clone()}
                                        />
                                    })
                                }
                            </tr>
                        })
                    }
                </table>
                <LeaderboardView board={self.leaderboard.clone()} />
                if self.game_over_open {
                    <Modal>
                        <dialog class="game-over" open={true}>
                            <article>
                                <h2>{
                                    if self.engine.state() == game::SessionState::Won {
                                        "You win!"
                                    } else {
                                        "Time's up"
                                    }
                                }</h2>
                                <p>{"Final score: "}{self.engine.score()}</p>
                                <p>{"Time: "}{format_clock(self.engine.elapsed_secs())}</p>
                                <footer>
                                    <button onclick={cb_play_again}>{"Play again"}</button>
                                </footer>
                            </article>
                        </dialog>
                    </Modal>
                }
                <SettingsView open={self.settings_open} on_theme={cb_theme} on_close={cb_close_settings} />
            </div>
        }
    }
}
