use web_sys::HtmlAudioElement;

/// Discrete audio cues the game emits. Playback is fire-and-forget and never
/// gates the game logic.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) enum SoundCue {
    Flip,
    Match,
    Victory,
    GameStart,
    GameOver,
}

impl SoundCue {
    const VOLUME: f64 = 0.5;

    const fn url(self) -> &'static str {
        use SoundCue::*;
        match self {
            Flip => "https://assets.mixkit.co/sfx/preview/mixkit-interface-click-1126.mp3",
            Match => "https://assets.mixkit.co/sfx/preview/mixkit-achievement-bell-600.mp3",
            Victory => "https://assets.mixkit.co/sfx/preview/mixkit-winning-chimes-2015.mp3",
            GameStart => "https://assets.mixkit.co/sfx/preview/mixkit-game-level-music-689.mp3",
            GameOver => "https://assets.mixkit.co/sfx/preview/mixkit-game-over-trombone-1940.mp3",
        }
    }

    /// The browser may reject autoplay or fail to fetch the asset; either
    /// way the game carries on.
    pub(crate) fn play(self) {
        match HtmlAudioElement::new_with_src(self.url()) {
            Ok(audio) => {
                audio.set_volume(Self::VOLUME);
                if audio.play().is_err() {
                    log::warn!("could not start playback for {:?}", self);
                }
            }
            Err(err) => log::warn!("could not create audio element for {:?}: {:?}", self, err),
        }
    }
}
