use crate::listing::{Identified, ListPage};
use base64::Engine as _;
use chrono::NaiveDateTime;
use serde::Deserialize;

/// Spring Data page envelope returned by every listing endpoint.
/// Only `content` and `last` are read; the counters are ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageEnvelope<T> {
    pub content: Vec<T>,
    pub last: bool,
}

impl<T> From<PageEnvelope<T>> for ListPage<T> {
    fn from(env: PageEnvelope<T>) -> Self {
        ListPage::new(env.content, env.last)
    }
}

/// Error body shapes the backend uses. Any of the fields may carry the text.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Business {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub average_rating: Option<f64>,
    #[serde(default)]
    pub review_count: Option<u32>,
    /// Base64 image, optionally as a `data:` URL.
    #[serde(default)]
    pub image_data: Option<String>,
    #[serde(default)]
    pub services: Vec<Service>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
}

/// A customer's own appointment.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: i64,
    #[serde(default)]
    pub business_name: Option<String>,
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default)]
    pub appointment_time: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// An appointment as seen by the business that receives it.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: i64,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default)]
    pub appointment_time: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl Identified for Business {
    type Id = i64;
    fn id(&self) -> i64 {
        self.id
    }
}

impl Identified for Appointment {
    type Id = i64;
    fn id(&self) -> i64 {
        self.id
    }
}

impl Identified for Booking {
    type Id = i64;
    fn id(&self) -> i64 {
        self.id
    }
}

impl Appointment {
    pub fn scheduled_at(&self) -> Option<NaiveDateTime> {
        self.appointment_time.as_deref().and_then(parse_local_datetime)
    }
}

impl Booking {
    pub fn scheduled_at(&self) -> Option<NaiveDateTime> {
        self.appointment_time.as_deref().and_then(parse_local_datetime)
    }
}

impl Business {
    pub fn image(&self) -> Option<ImageInfo> {
        self.image_data.as_deref().and_then(decode_image)
    }
}

/// Parse the backend's `LocalDateTime` text ("2024-05-01T10:30:00", with or
/// without seconds or fractional seconds).
pub fn parse_local_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .ok()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInfo {
    pub format: &'static str,
    pub bytes: Vec<u8>,
}

impl ImageInfo {
    pub fn size_label(&self) -> String {
        let len = self.bytes.len();
        if len >= 1024 * 1024 {
            format!("{:.1} MB", len as f64 / (1024.0 * 1024.0))
        } else if len >= 1024 {
            format!("{:.1} KB", len as f64 / 1024.0)
        } else {
            format!("{} B", len)
        }
    }
}

/// Decode a base64 image (raw or `data:image/...;base64,` URL) and sniff its
/// format from the magic bytes. `None` when the payload is not valid base64.
pub fn decode_image(data: &str) -> Option<ImageInfo> {
    let payload = match data.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => data,
    };
    let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return None;
    }
    let bytes = base64::engine::general_purpose::STANDARD.decode(cleaned).ok()?;
    let format = sniff_format(&bytes);
    Some(ImageInfo { format, bytes })
}

fn sniff_format(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        "png"
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "jpeg"
    } else if bytes.starts_with(b"GIF8") {
        "gif"
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        "webp"
    } else {
        "unknown"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_business_page() {
        let json = r#"{
            "content": [
                {"id": 1, "name": "Fade Masters", "category": "Barber", "city": "Austin",
                 "averageRating": 4.6, "reviewCount": 12,
                 "services": [{"id": 9, "name": "Cut", "price": 25.0, "durationMinutes": 30}]},
                {"id": 2, "name": "Glow Spa"}
            ],
            "last": false,
            "number": 0,
            "size": 2,
            "totalElements": 5,
            "totalPages": 3,
            "pageable": {"pageNumber": 0}
        }"#;
        let env: PageEnvelope<Business> = serde_json::from_str(json).unwrap();
        let page: ListPage<Business> = env.into();
        assert!(!page.is_last_page);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].services[0].duration_minutes, Some(30));
        assert_eq!(page.items[1].category, None);
    }

    #[test]
    fn test_envelope_requires_last() {
        let json = r#"{"content": []}"#;
        assert!(serde_json::from_str::<PageEnvelope<Business>>(json).is_err());
    }

    #[test]
    fn test_appointment_time_parsing() {
        let appt: Appointment = serde_json::from_str(
            r#"{"id": 3, "businessName": "Glow Spa", "appointmentTime": "2024-05-01T10:30:00", "status": "CONFIRMED"}"#,
        )
        .unwrap();
        let at = appt.scheduled_at().unwrap();
        assert_eq!(at.format("%Y-%m-%d %H:%M").to_string(), "2024-05-01 10:30");

        assert!(parse_local_datetime("2024-05-01T10:30").is_some());
        assert!(parse_local_datetime("2024-05-01T10:30:00.123").is_some());
        assert!(parse_local_datetime("tomorrow").is_none());
    }

    #[test]
    fn test_decode_png_data_url() {
        // 1x1 transparent PNG header bytes
        let b64 = base64::engine::general_purpose::STANDARD.encode([0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
        let info = decode_image(&format!("data:image/png;base64,{}", b64)).unwrap();
        assert_eq!(info.format, "png");
        assert_eq!(info.bytes.len(), 8);
        assert_eq!(info.size_label(), "8 B");
    }

    #[test]
    fn test_decode_raw_jpeg_and_garbage() {
        let b64 = base64::engine::general_purpose::STANDARD.encode([0xFF, 0xD8, 0xFF, 0xE0]);
        assert_eq!(decode_image(&b64).unwrap().format, "jpeg");
        assert!(decode_image("not base64 at all!").is_none());
        assert!(decode_image("").is_none());
    }
}
