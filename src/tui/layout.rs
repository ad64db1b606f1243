/// Width thresholds for the TUI layout.
///
/// Render code asks for a breakpoint instead of comparing widths inline.

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Breakpoint {
    /// < 60 cols: tab captions lose their badges' padding, short help
    Compact,
    /// 60-119 cols
    Normal,
    /// 120+ cols: logs pane docks to the right instead of the bottom
    Wide,
}

impl Breakpoint {
    pub fn from_width(width: u16) -> Self {
        match width {
            0..=59 => Breakpoint::Compact,
            60..=119 => Breakpoint::Normal,
            _ => Breakpoint::Wide,
        }
    }

    pub fn at_least(&self, min: Breakpoint) -> bool {
        *self >= min
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn breakpoint_thresholds() {
        assert_eq!(Breakpoint::from_width(40), Breakpoint::Compact);
        assert_eq!(Breakpoint::from_width(60), Breakpoint::Normal);
        assert_eq!(Breakpoint::from_width(119), Breakpoint::Normal);
        assert_eq!(Breakpoint::from_width(120), Breakpoint::Wide);
    }

    #[test]
    fn at_least_comparisons() {
        assert!(Breakpoint::Normal.at_least(Breakpoint::Compact));
        assert!(Breakpoint::Normal.at_least(Breakpoint::Normal));
        assert!(!Breakpoint::Normal.at_least(Breakpoint::Wide));
    }
}
