use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::filter::RecordFilter;
use crate::records::FilterOptions;

/// Free-text comment attached to the next decision.
#[derive(Default, Clone)]
pub(crate) struct CommentForm {
    pub(crate) text: String,
}

impl CommentForm {
    pub(crate) fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
        }
    }

    /// Append a printable character. Returns whether the text changed.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        self.text.push(ch);
        true
    }

    pub(crate) fn backspace(&mut self) {
        self.text.pop();
    }

    pub(crate) fn clear(&mut self) {
        self.text.clear();
    }

    /// Render the single input line.
    pub(crate) fn build_line(&self) -> Line<'static> {
        let (display, style) = if self.text.is_empty() {
            ("<optional>".to_string(), Style::default().fg(Color::DarkGray))
        } else {
            (self.text.clone(), Style::default().fg(Color::Yellow))
        };
        Line::from(vec![
            Span::raw(COMMENT_PREFIX),
            Span::styled(display, style),
        ])
    }

    pub(crate) fn value_len(&self) -> usize {
        self.text.chars().count()
    }
}

pub(crate) const COMMENT_PREFIX: &str = "Comment: ";

/// The two multi-select columns of the filter panel.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub(crate) enum FilterSection {
    #[default]
    Nature,
    Etat,
}

/// Working copy of the filters while the panel is open. Nothing is applied
/// until the reviewer confirms.
#[derive(Clone)]
pub(crate) struct FilterPanel {
    pub(crate) draft: RecordFilter,
    pub(crate) section: FilterSection,
    pub(crate) nature_selected: usize,
    pub(crate) etat_selected: usize,
}

impl FilterPanel {
    pub(crate) fn new(current: &RecordFilter) -> Self {
        Self {
            draft: current.clone(),
            section: FilterSection::Nature,
            nature_selected: 0,
            etat_selected: 0,
        }
    }

    pub(crate) fn toggle_section(&mut self) {
        self.section = match self.section {
            FilterSection::Nature => FilterSection::Etat,
            FilterSection::Etat => FilterSection::Nature,
        };
    }

    /// Move within the focused column, clamping at both ends.
    pub(crate) fn move_selection(&mut self, offset: isize, options: &FilterOptions) {
        let (selected, len) = match self.section {
            FilterSection::Nature => (&mut self.nature_selected, options.natures.len()),
            FilterSection::Etat => (&mut self.etat_selected, options.etats.len()),
        };
        if len == 0 {
            *selected = 0;
            return;
        }
        let new = (*selected as isize + offset).clamp(0, len as isize - 1);
        *selected = new as usize;
    }

    /// Flip the highlighted value in or out of the draft selection.
    pub(crate) fn toggle_current(&mut self, options: &FilterOptions) -> Option<bool> {
        match self.section {
            FilterSection::Nature => {
                let value = options.natures.get(self.nature_selected)?;
                Some(self.draft.toggle_nature(value))
            }
            FilterSection::Etat => {
                let value = options.etats.get(self.etat_selected)?;
                Some(self.draft.toggle_etat(value))
            }
        }
    }

    /// Clear the focused column so it no longer restricts anything.
    pub(crate) fn clear_section(&mut self) {
        match self.section {
            FilterSection::Nature => self.draft.natures.clear(),
            FilterSection::Etat => self.draft.etats.clear(),
        }
    }

    /// Checkbox lines for one column.
    pub(crate) fn build_lines(
        &self,
        section: FilterSection,
        options: &FilterOptions,
    ) -> Vec<Line<'static>> {
        let (values, chosen, selected) = match section {
            FilterSection::Nature => (&options.natures, &self.draft.natures, self.nature_selected),
            FilterSection::Etat => (&options.etats, &self.draft.etats, self.etat_selected),
        };
        if values.is_empty() {
            return vec![Line::from(Span::styled(
                "No values in the input file.",
                Style::default().fg(Color::DarkGray),
            ))];
        }

        let focused = self.section == section;
        values
            .iter()
            .enumerate()
            .map(|(idx, value)| {
                let mark = if chosen.contains(value) { "[x]" } else { "[ ]" };
                let mut style = Style::default();
                if focused && idx == selected {
                    style = style.fg(Color::Yellow).add_modifier(Modifier::BOLD);
                }
                Line::from(Span::styled(format!("{mark} {value}"), style))
            })
            .collect()
    }
}
