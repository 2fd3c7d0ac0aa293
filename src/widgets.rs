use egui::{Color32, Stroke};

/// Drag-or-type editor for a length in centimeters. Typing accepts a bare
/// number or a number followed by `cm`.
pub struct CentimeterDragValue<'a> {
    value: &'a mut f64,
    speed: f64,
}

impl<'a> CentimeterDragValue<'a> {
    pub fn new(value: &'a mut f64) -> Self {
        Self { value, speed: 0.5 }
    }

    pub fn speed(mut self, speed_cm: f64) -> Self {
        self.speed = speed_cm;
        self
    }

    fn format_value(value: f64) -> String {
        crate::frame::format_cm(value)
    }

    fn parse_value(s: &str) -> Option<f64> {
        let s = s.trim();
        let number = s.strip_suffix("cm").unwrap_or(s).trim_end();
        if number.is_empty() {
            return None;
        }
        number.parse::<f64>().ok().filter(|v| v.is_finite())
    }

    pub fn ui(self, ui: &mut egui::Ui) -> egui::Response {
        ui.scope(|ui| {
            ui.spacing_mut().item_spacing.x = 2.0;

            ui.horizontal(|ui| {
                let mut display_value = *self.value;

                let response = ui.add(
                    egui::DragValue::new(&mut display_value)
                        .speed(self.speed)
                        .custom_formatter(|v, _| Self::format_value(v))
                        .custom_parser(Self::parse_value),
                );

                if response.changed() {
                    *self.value = display_value;
                }

                ui.label("cm");
                response
            })
            .inner
        })
        .inner
    }
}

/// Round color button used for the preset palette.
pub fn swatch(ui: &mut egui::Ui, color: Color32, selected: bool) -> egui::Response {
    let size = egui::vec2(22.0, 22.0);
    let (rect, response) = ui.allocate_exact_size(size, egui::Sense::click());
    let painter = ui.painter();
    let radius = rect.width() / 2.0;
    painter.circle(
        rect.center(),
        radius - 2.0,
        color,
        Stroke::new(1.0, Color32::GRAY),
    );
    if selected {
        painter.circle_stroke(
            rect.center(),
            radius,
            Stroke::new(2.0, Color32::from_rgb(59, 130, 246)),
        );
    } else if response.hovered() {
        painter.circle_stroke(rect.center(), radius, Stroke::new(1.0, Color32::LIGHT_GRAY));
    }
    response
}

#[cfg(test)]
mod tests {
    use super::CentimeterDragValue;

    #[test]
    fn parses_plain_and_suffixed_numbers() {
        assert_eq!(CentimeterDragValue::parse_value("120"), Some(120.0));
        assert_eq!(CentimeterDragValue::parse_value(" 120.5 "), Some(120.5));
        assert_eq!(CentimeterDragValue::parse_value("90 cm"), Some(90.0));
        assert_eq!(CentimeterDragValue::parse_value("90cm"), Some(90.0));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(CentimeterDragValue::parse_value(""), None);
        assert_eq!(CentimeterDragValue::parse_value("cm"), None);
        assert_eq!(CentimeterDragValue::parse_value("1 m"), None);
        assert_eq!(CentimeterDragValue::parse_value("inf"), None);
    }

    #[test]
    fn formats_whole_and_fractional() {
        assert_eq!(CentimeterDragValue::format_value(100.0), "100");
        assert_eq!(CentimeterDragValue::format_value(12.34), "12.3");
    }
}
