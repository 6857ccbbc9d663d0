//! Operating mode of the trackball, derived from the highest active layer
use crate::config::LayerModeConfig;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InputMode {
    /// Pointer motion
    #[default]
    Move,
    /// Wheel motion
    Scroll,
    /// Pointer motion with reduced CPI
    Snipe,
    /// Directional actions of the ball action group at the index
    BallAction(usize),
}

impl InputMode {
    /// Resolve the mode of a layer.
    ///
    /// Layer lists are checked in priority order: scroll, snipe, then the ball action groups
    /// in configuration order. A layer in none of them is a move layer.
    pub fn resolve(layer: u8, config: &LayerModeConfig) -> InputMode {
        if config.scroll_layers.contains(&layer) {
            return InputMode::Scroll;
        }
        if config.snipe_layers.contains(&layer) {
            return InputMode::Snipe;
        }
        config
            .ball_actions
            .iter()
            .position(|group| group.layers.contains(&layer))
            .map_or(InputMode::Move, InputMode::BallAction)
    }
}
