//! Loading bar.
//!
//! The bar is a horizontal scale of the loading ratio. On the web it drives the
//! `.loading-bar` element through its `transform` style; natively the overlay
//! pipeline draws it (see [`crate::pipelines::overlay`]).

use crate::loading::Progress;

/// Horizontal scale for a progress snapshot.
pub fn scale_x(progress: Progress) -> f32 {
    progress.ratio()
}

/// CSS transform for a horizontal scale.
pub fn transform(scale: f32) -> String {
    format!("scaleX({})", scale)
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProgressBar {
    scale: f32,
    ended: bool,
}

impl ProgressBar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a progress snapshot and returns the displayed scale. The bar
    /// never shrinks and ignores updates once it has ended.
    pub fn update(&mut self, progress: Progress) -> f32 {
        if !self.ended {
            self.scale = self.scale.max(scale_x(progress));
        }
        self.scale
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// One-time switch to the ended look; the transform is cleared.
    pub fn finish(&mut self) {
        self.ended = true;
    }

    /// Current CSS transform, empty once ended.
    pub fn transform(&self) -> String {
        if self.ended {
            String::new()
        } else {
            transform(self.scale)
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use dom::DomLoadingBar;

#[cfg(target_arch = "wasm32")]
mod dom {
    use wasm_bindgen::JsCast;

    use super::ProgressBar;

    /// The `.loading-bar` element of the host page.
    pub struct DomLoadingBar {
        element: web_sys::HtmlElement,
    }

    impl DomLoadingBar {
        pub fn find(selector: &str) -> Option<Self> {
            let document = web_sys::window()?.document()?;
            let element = document.query_selector(selector).ok()??;
            let element = element.dyn_into::<web_sys::HtmlElement>().ok()?;
            Some(Self { element })
        }

        pub fn show(&self, bar: &ProgressBar) {
            if bar.is_ended() {
                if let Err(e) = self.element.class_list().add_1("ended") {
                    log::warn!("Could not mark the loading bar as ended: {:?}", e);
                }
            }
            if let Err(e) = self
                .element
                .style()
                .set_property("transform", &bar.transform())
            {
                log::warn!("Could not update the loading bar: {:?}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_follows_the_loading_ratio() {
        assert_eq!(scale_x(Progress::new(0, 6)), 0.0);
        assert_eq!(scale_x(Progress::new(3, 6)), 0.5);
        assert_eq!(scale_x(Progress::new(6, 6)), 1.0);
        assert_eq!(transform(0.5), "scaleX(0.5)");
        assert_eq!(transform(1.0), "scaleX(1)");
    }

    #[test]
    fn bar_never_shrinks() {
        let mut bar = ProgressBar::new();
        assert_eq!(bar.update(Progress::new(1, 2)), 0.5);
        // A late registration lowers the ratio but not the bar.
        assert_eq!(bar.update(Progress::new(1, 3)), 0.5);
        assert_eq!(bar.update(Progress::new(3, 3)), 1.0);
    }

    #[test]
    fn finishing_clears_the_transform() {
        let mut bar = ProgressBar::new();
        bar.update(Progress::new(2, 4));
        assert_eq!(bar.transform(), "scaleX(0.5)");

        bar.finish();
        assert!(bar.is_ended());
        assert_eq!(bar.transform(), "");
        assert_eq!(bar.update(Progress::new(4, 4)), 0.5);
    }
}
