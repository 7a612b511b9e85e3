use crate::api::ChatApi;
use crate::client::ChatClient;
use crate::events::UiEvent;
use crate::scroll::{ScrollCommand, Viewport};

impl<A: ChatApi> ChatClient<A> {
    /// Feed a scroll event from the renderer. Returns whether the list is
    /// anchored to the bottom afterwards.
    pub fn on_scroll(&self, viewport: Viewport) -> bool {
        let (anchored, before, after) = {
            let mut state = self.core.state();
            let before = state.scroll().shows_jump_affordance();
            let anchored = state.scroll_mut().on_scroll(viewport);
            (anchored, before, state.scroll().shows_jump_affordance())
        };
        if before != after {
            self.core.events.emit(UiEvent::JumpAffordance(after));
        }
        anchored
    }

    pub fn jump_to_bottom(&self) -> ScrollCommand {
        let (command, was_shown) = {
            let mut state = self.core.state();
            let was_shown = state.scroll().shows_jump_affordance();
            (state.scroll_mut().jump_to_bottom(), was_shown)
        };
        if was_shown {
            self.core.events.emit(UiEvent::JumpAffordance(false));
        }
        command
    }
}
