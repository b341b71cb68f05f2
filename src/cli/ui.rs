use crate::core::convert::group_thousands;
use crate::core::session::{EditDirection, Form};
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;

/// Defines different styles for text elements.
pub enum StyleType {
    Title,
    Label,
    Value,
    Error,
    Subtle,
}

/// Applies a consistent style to a string.
pub fn style_text(text: &str, style_type: StyleType) -> String {
    let styled = match style_type {
        StyleType::Title => style(text).bold().underlined(),
        StyleType::Label => style(text).bold(),
        StyleType::Value => style(text).green().bold(),
        StyleType::Error => style(text).red(),
        StyleType::Subtle => style(text).dim(),
    };
    styled.to_string()
}

/// Creates a new `comfy_table::Table` with standard styling.
pub fn new_styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Creates a styled header cell for a table.
pub fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

/// Formats an `Option<f64>` amount with grouping. `None` is displayed as "N/A".
pub fn amount_cell(value: Option<f64>) -> Cell {
    value.map_or(
        Cell::new("N/A")
            .fg(Color::DarkGrey)
            .set_alignment(CellAlignment::Right),
        |v| Cell::new(group_thousands(&format!("{v:.2}"))).set_alignment(CellAlignment::Right),
    )
}

fn display_field(text: &str) -> String {
    if text.is_empty() {
        "—".to_string()
    } else {
        group_thousands(&text.replace(',', ""))
    }
}

/// One-line rendering of the form, marking the field being edited.
pub fn render_form(form: &Form) -> String {
    let marker = |field: EditDirection| {
        if form.direction == field { "*" } else { " " }
    };
    let mut line = format!(
        "{} {}{} {}  ⇄  {}{} {}",
        style_text(&format!("[{} · {}]", form.metal, form.currency), StyleType::Subtle),
        marker(EditDirection::Mithqals),
        style_text("mithqals:", StyleType::Label),
        style_text(&display_field(&form.mithqals), StyleType::Value),
        marker(EditDirection::Money),
        style_text("money:", StyleType::Label),
        style_text(&display_field(&form.money), StyleType::Value),
    );
    if form.custom_rate_visible() {
        line.push_str(&format!(
            "  {} {}",
            style_text("rate:", StyleType::Label),
            display_field(&form.custom_rate)
        ));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::quote::{Currency, MetalType};

    #[test]
    fn test_render_form_groups_amounts() {
        console::set_colors_enabled(false);
        let mut form = Form::new(MetalType::Gold, Currency::usd());
        form.mithqals = "10".to_string();
        form.money = "2809.97".to_string();

        let line = render_form(&form);
        assert!(line.contains("[gold · USD]"));
        assert!(line.contains("*mithqals: 10"));
        assert!(line.contains("money: 2,809.97"));
        assert!(!line.contains("rate:"));
    }

    #[test]
    fn test_render_form_shows_custom_rate() {
        console::set_colors_enabled(false);
        let mut form = Form::new(MetalType::Silver, Currency::Custom);
        form.custom_rate = "42000".to_string();
        form.direction = EditDirection::Money;

        let line = render_form(&form);
        assert!(line.contains("*money: —"));
        assert!(line.contains("rate: 42,000"));
    }
}
