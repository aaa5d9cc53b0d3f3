use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A geotagged observation submitted by one user
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageLocation {
    pub id: u32,
    pub user_id: u32,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(with = "crate::models::bytes")]
    pub image: Vec<u8>,
    pub created_at: DateTime<Utc>,
}

/// Observation as received, before it is bound to an owner
#[derive(Clone, Debug, PartialEq)]
pub struct NewImageLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub image: Vec<u8>,
}

impl NewImageLocation {
    /// Coordinates must be finite decimal degrees within range
    pub fn validate(&self) -> Result<(), String> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(format!("latitude {} out of range", self.latitude));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(format!("longitude {} out of range", self.longitude));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location(latitude: f64, longitude: f64) -> NewImageLocation {
        NewImageLocation {
            latitude,
            longitude,
            image: vec![],
        }
    }

    #[test]
    fn test_validate_accepts_bounds() {
        assert!(location(90.0, -180.0).validate().is_ok());
        assert!(location(1.0, 2.0).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        assert!(location(90.5, 0.0).validate().is_err());
        assert!(location(0.0, 181.0).validate().is_err());
        assert!(location(f64::NAN, 0.0).validate().is_err());
    }

    #[test]
    fn test_image_bytes_serialize_as_base64() {
        let image = ImageLocation {
            id: 1,
            user_id: 2,
            latitude: 1.0,
            longitude: 2.0,
            image: b"hi".to_vec(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&image).unwrap();
        assert_eq!(json["image"], "aGk=");
    }
}
