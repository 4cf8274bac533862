use crate::api::types::{Appointment, Booking, Business};
use crate::listing::Identified;
use ratatui::layout::Constraint;

const MISSING: &str = "\u{2014}";

/// How an item is laid out as a table row and in the detail pane.
pub trait ListRow: Identified {
    fn columns() -> Vec<(&'static str, Constraint)>;
    fn cells(&self) -> Vec<String>;
    fn detail(&self) -> Vec<(&'static str, String)>;
}

fn or_missing(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.to_string(),
        _ => MISSING.to_string(),
    }
}

fn when(parsed: Option<chrono::NaiveDateTime>, raw: Option<&str>) -> String {
    match parsed {
        Some(dt) => dt.format("%b %d %H:%M").to_string(),
        None => or_missing(raw),
    }
}

fn rating(avg: Option<f64>) -> String {
    avg.map(|r| format!("{:.1}", r)).unwrap_or_else(|| MISSING.to_string())
}

impl ListRow for Business {
    fn columns() -> Vec<(&'static str, Constraint)> {
        vec![
            ("Name", Constraint::Min(16)),
            ("Category", Constraint::Length(14)),
            ("City", Constraint::Length(14)),
            ("Rating", Constraint::Length(6)),
        ]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            or_missing(self.category.as_deref()),
            or_missing(self.city.as_deref()),
            rating(self.average_rating),
        ]
    }

    fn detail(&self) -> Vec<(&'static str, String)> {
        let reviews = match (self.average_rating, self.review_count) {
            (Some(r), Some(n)) => format!("{:.1} ({} reviews)", r, n),
            (Some(r), None) => format!("{:.1}", r),
            _ => "not rated yet".to_string(),
        };
        let services = if self.services.is_empty() {
            MISSING.to_string()
        } else {
            self.services
                .iter()
                .map(|s| {
                    let mut line = s.name.clone();
                    if let Some(price) = s.price {
                        line.push_str(&format!(" ${:.2}", price));
                    }
                    if let Some(mins) = s.duration_minutes {
                        line.push_str(&format!(" {}m", mins));
                    }
                    line
                })
                .collect::<Vec<_>>()
                .join(", ")
        };
        let image = match (&self.image_data, self.image()) {
            (None, _) => "none".to_string(),
            (Some(_), Some(info)) => format!("{}, {}", info.format, info.size_label()),
            (Some(_), None) => "unreadable".to_string(),
        };
        vec![
            ("Name", self.name.clone()),
            ("Category", or_missing(self.category.as_deref())),
            ("Address", or_missing(self.address.as_deref())),
            ("City", or_missing(self.city.as_deref())),
            ("Phone", or_missing(self.phone.as_deref())),
            ("Rating", reviews),
            ("Services", services),
            ("Image", image),
            ("About", or_missing(self.description.as_deref())),
        ]
    }
}

impl ListRow for Appointment {
    fn columns() -> Vec<(&'static str, Constraint)> {
        vec![
            ("When", Constraint::Length(13)),
            ("Business", Constraint::Min(14)),
            ("Service", Constraint::Length(16)),
            ("Status", Constraint::Length(10)),
        ]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            when(self.scheduled_at(), self.appointment_time.as_deref()),
            or_missing(self.business_name.as_deref()),
            or_missing(self.service_name.as_deref()),
            or_missing(self.status.as_deref()),
        ]
    }

    fn detail(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Appointment", format!("#{}", self.id)),
            ("When", when(self.scheduled_at(), self.appointment_time.as_deref())),
            ("Business", or_missing(self.business_name.as_deref())),
            ("Service", or_missing(self.service_name.as_deref())),
            ("Status", or_missing(self.status.as_deref())),
            ("Notes", or_missing(self.notes.as_deref())),
        ]
    }
}

impl ListRow for Booking {
    fn columns() -> Vec<(&'static str, Constraint)> {
        vec![
            ("When", Constraint::Length(13)),
            ("Customer", Constraint::Min(14)),
            ("Service", Constraint::Length(16)),
            ("Status", Constraint::Length(10)),
        ]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            when(self.scheduled_at(), self.appointment_time.as_deref()),
            or_missing(self.customer_name.as_deref()),
            or_missing(self.service_name.as_deref()),
            or_missing(self.status.as_deref()),
        ]
    }

    fn detail(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Booking", format!("#{}", self.id)),
            ("When", when(self.scheduled_at(), self.appointment_time.as_deref())),
            ("Customer", or_missing(self.customer_name.as_deref())),
            ("Email", or_missing(self.customer_email.as_deref())),
            ("Service", or_missing(self.service_name.as_deref())),
            ("Status", or_missing(self.status.as_deref())),
        ]
    }
}
