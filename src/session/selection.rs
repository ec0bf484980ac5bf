//! The filter/background selection pair.

use crate::backgrounds::NO_BACKGROUND;
use crate::filters::PhotoFilter;

/// The booth's current cosmetic choices.
///
/// One instance per session, overwritten by selection events. The reset
/// behavior is asymmetric on purpose: returning to live view clears the
/// filter but keeps the background, so a party can keep their scenery
/// across photos while each photo starts unfiltered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Active display filter
    pub filter: PhotoFilter,
    /// Active background id ("none" for no background)
    pub background: String,
}

impl Selection {
    /// Reset for a fresh live view: filter clears, background persists.
    pub fn reset_for_live(&mut self) {
        self.filter = PhotoFilter::None;
    }
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            filter: PhotoFilter::None,
            background: NO_BACKGROUND.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_selection() {
        let selection = Selection::default();
        assert_eq!(selection.filter, PhotoFilter::None);
        assert_eq!(selection.background, "none");
    }

    #[test]
    fn test_reset_keeps_background() {
        let mut selection = Selection {
            filter: PhotoFilter::Sepia,
            background: "beach".to_string(),
        };
        selection.reset_for_live();
        assert_eq!(selection.filter, PhotoFilter::None);
        assert_eq!(selection.background, "beach");
    }
}
